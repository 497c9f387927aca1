//! HTTP surface: shared state, router assembly and the listener
//! lifecycle, including TLS and graceful shutdown.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod tls;

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::get;
use axum::Router;
use axum_server::Handle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{AccessConfig, Config};
use crate::files::DirectoryBrowser;

pub use auth::BasicCredentials;
pub use error::HttpError;

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
    /// Path resolution and listing, confined beneath the served root.
    pub browser: DirectoryBrowser,
    /// Operation toggles.
    pub access: AccessConfig,
    /// Basic-auth credentials; `None` serves unauthenticated.
    pub credentials: Option<BasicCredentials>,
}

/// Assemble the application router.
///
/// Both the root and every deeper path share the same two handlers:
/// `GET` views, `POST` mutates. The auth middleware wraps all of it.
pub fn router(state: AppState, max_body_size: usize) -> Router {
    let state = Arc::new(state);
    Router::new()
        .route("/", get(handlers::view_root).post(handlers::mutate_root))
        .route("/{*path}", get(handlers::view).post(handlers::mutate))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the configured directory until SIGINT or SIGTERM.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let browser = DirectoryBrowser::new(&config.server.root).with_context(|| {
        format!(
            "Failed to open root directory {}",
            config.server.root.display()
        )
    })?;
    info!(root = %browser.root().display(), "Serving directory");

    let credentials = match &config.auth.basic_auth {
        Some(raw) => {
            let creds = BasicCredentials::parse(raw)
                .context("basic_auth must be <user>:<password> with both parts non-empty")?;
            info!(user = %creds.username, "Basic authentication enabled");
            Some(creds)
        }
        None => None,
    };

    let state = AppState {
        browser,
        access: config.access.clone(),
        credentials,
    };
    let app = router(state, config.server.max_body_size as usize);

    let ip: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid bind host {:?}", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);

    let handle = Handle::new();
    tokio::spawn(wait_for_shutdown(handle.clone()));

    let scheme = if config.tls.enabled { "https" } else { "http" };
    for url in display_urls(scheme, &config.server.host, config.server.port) {
        info!("Listening on {}", url);
    }

    if config.tls.enabled {
        // The temp dir holding a generated certificate must outlive the
        // listener.
        let (rustls_config, _cert_dir) =
            tls::build_rustls_config(&config.tls, &config.server.host).await?;
        axum_server::bind_rustls(addr, rustls_config)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .context("HTTPS server error")?;
    } else {
        axum_server::bind(addr)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .context("HTTP server error")?;
    }

    info!("Server stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM, then start a graceful shutdown that
/// gives in-flight requests ten seconds to finish.
async fn wait_for_shutdown(handle: Handle) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to create SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to create SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("Received SIGINT, shutting down"),
    }

    handle.graceful_shutdown(Some(Duration::from_secs(10)));
}

/// URLs worth printing for a bind host. Wildcard binds list the
/// loopback form first; IPv6 hosts are bracketed.
fn display_urls(scheme: &str, host: &str, port: u16) -> Vec<String> {
    let mut urls = Vec::new();
    match host {
        "0.0.0.0" => urls.push(format!("{scheme}://127.0.0.1:{port}")),
        "::" => urls.push(format!("{scheme}://[::1]:{port}")),
        _ => {}
    }
    let display_host = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    };
    urls.push(format!("{scheme}://{display_host}:{port}"));
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_urls_wildcard_v4() {
        assert_eq!(
            display_urls("http", "0.0.0.0", 9999),
            ["http://127.0.0.1:9999", "http://0.0.0.0:9999"]
        );
    }

    #[test]
    fn test_display_urls_wildcard_v6() {
        assert_eq!(
            display_urls("https", "::", 8443),
            ["https://[::1]:8443", "https://[::]:8443"]
        );
    }

    #[test]
    fn test_display_urls_plain_host() {
        assert_eq!(
            display_urls("http", "192.168.1.5", 80),
            ["http://192.168.1.5:80"]
        );
    }

    #[test]
    fn test_display_urls_brackets_v6_hosts() {
        assert_eq!(
            display_urls("http", "fe80::1", 9999),
            ["http://[fe80::1]:9999"]
        );
    }
}
