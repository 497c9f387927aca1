//! Listing presentation: size/date/name formatting and the HTML page.

pub mod format;
pub mod page;

pub use page::{encode_href, html_escape, render_listing};
