//! HTML rendering for directory listings.
//!
//! One self-contained page per listing: inline CSS, a breadcrumb header,
//! a control row, the entry table, and the vanilla-JS behavior for
//! filtering, sorting, selection, and the mutation forms. No template
//! engine; the page is assembled by string building and everything
//! user-controlled goes through [`html_escape`].

use crate::files::DirectoryEntry;
use crate::ui::format;

/// Escape text for safe embedding in HTML content and attribute values.
pub fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Percent-encode a web path into an href, one segment at a time.
/// The root maps to `/`. Mutation handlers reuse this for redirect
/// targets so that Location headers match the page's own links.
pub fn encode_href(web_path: &str) -> String {
    if web_path.is_empty() {
        return "/".to_string();
    }
    let encoded: Vec<String> = web_path
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("/{}", encoded.join("/"))
}

fn entry_href(web_path: &str, name: &str) -> String {
    let encoded = urlencoding::encode(name);
    if web_path.is_empty() {
        format!("/{encoded}")
    } else {
        format!("{}/{encoded}", encode_href(web_path))
    }
}

fn parent_web_path(web_path: &str) -> &str {
    match web_path.rfind('/') {
        Some(idx) => &web_path[..idx],
        None => "",
    }
}

/// `Home`-rooted breadcrumb links, one per path token, joined with `/`.
fn breadcrumbs(web_path: &str) -> String {
    let mut links = vec![r#"<a href="/">Home</a>"#.to_string()];
    let mut href = String::new();
    for token in web_path.split('/').filter(|t| !t.is_empty()) {
        href.push('/');
        href.push_str(&urlencoding::encode(token));
        links.push(format!(
            r#"<a href="{href}">{}</a>"#,
            html_escape(token)
        ));
    }
    links.join("/")
}

fn render_row(web_path: &str, entry: &DirectoryEntry, order: usize) -> String {
    let display_name = format::display_name(entry);
    let display_size = format::display_size(entry);
    let display_perm = format::display_permissions(entry);
    let display_ctime = format::format_timestamp(entry.created);
    let display_mtime = format::format_timestamp(entry.modified);
    let display_atime = format::format_timestamp(entry.accessed);
    let escaped_display = html_escape(&display_name);

    // unreadable entries keep their name but get no link
    let name_link = if entry.readable {
        format!(
            r#"<a class="name" href="{}">{escaped_display}</a>"#,
            entry_href(web_path, &entry.name)
        )
    } else {
        format!(r#"<a class="name">{escaped_display}</a>"#)
    };

    format!(
        concat!(
            r#"<tr class="table-row" id="{id}" data-sort-type="{type_rank}" data-sort-name="{id}" "#,
            r#"data-sort-perm="{perm}" data-sort-ctime="{ctime}" data-sort-mtime="{mtime}" "#,
            r#"data-sort-atime="{atime}" data-sort-size="{size}" data-sort-order="{order}">"#,
            r#"<td class="table-cell-checkbox">"#,
            r#"<input class="table-row-checkbox" type="checkbox" data-entry-name="{entry_name}"/></td>"#,
            r#"<td class="table-cell-normal">{name_link}</td>"#,
            r#"<td class="table-cell-normal">{size_text}</td>"#,
            r#"<td class="table-cell-normal">{perm}</td>"#,
            r#"<td class="table-cell-normal">{ctime}</td>"#,
            r#"<td class="table-cell-normal">{mtime}</td>"#,
            r#"<td class="table-cell-normal">{atime}</td>"#,
            "</tr>"
        ),
        id = escaped_display,
        type_rank = entry.entry_type.rank(),
        perm = display_perm,
        ctime = display_ctime,
        mtime = display_mtime,
        atime = display_atime,
        size = entry.size,
        order = order,
        entry_name = html_escape(&entry.name),
        name_link = name_link,
        size_text = display_size,
    )
}

/// Render the full listing page for a directory.
///
/// `web_path` is the `/`-joined path relative to the root (empty for the
/// root itself). When `dir_writable` is false the Upload and New folder
/// buttons render disabled and locked, since creating anything in this
/// directory would be refused anyway. The Delete button starts disabled
/// and enables with row selection.
pub fn render_listing(web_path: &str, entries: &[DirectoryEntry], dir_writable: bool) -> String {
    let title = html_escape(&format!("/{web_path}"));
    let parent_href = encode_href(parent_web_path(web_path));
    let locked = if dir_writable {
        ""
    } else {
        " disabled data-locked=\"\""
    };

    let mut page = String::with_capacity(16 * 1024);
    page.push_str("<!DOCTYPE html><html><head>");
    page.push_str(&format!("<title>{title}</title>"));
    page.push_str(r#"<meta charset="utf-8"/>"#);
    page.push_str(r#"<meta name="viewport" content="width=device-width, initial-scale=1"/>"#);
    page.push_str("<style>");
    page.push_str(PAGE_STYLE);
    page.push_str("</style></head><body>");
    page.push_str(r#"<div class="container">"#);

    page.push_str(r#"<div class="section"><h2>"#);
    page.push_str(&breadcrumbs(web_path));
    page.push_str("</h2></div>");

    page.push_str(r#"<div class="section">"#);
    page.push_str(&format!(
        r#"<button type="button" onclick="location.href = &quot;{parent_href}&quot;">..</button> "#
    ));
    page.push_str(
        r#"<input class="name-filter" type="text" placeholder="RegExp name filter" autofocus=""/> "#,
    );
    page.push_str(&format!(
        r#"<button id="upload" type="button"{locked}>Upload</button> "#
    ));
    page.push_str(&format!(
        r#"<button id="new-folder" type="button"{locked}>New folder</button> "#
    ));
    page.push_str(r#"<button id="delete" type="button" disabled>Delete</button>"#);
    page.push_str("</div>");

    page.push_str(r#"<div class="section"><table class="table">"#);
    page.push_str(
        r#"<tr class="table-header"><td class="table-cell-checkbox"><input class="table-row-checkbox-all" type="checkbox"/></td>"#,
    );
    for (key, label) in [
        ("name", "name"),
        ("size", "size"),
        ("perm", "permission"),
        ("ctime", "created at"),
        ("mtime", "modified at"),
        ("atime", "accessed at"),
    ] {
        page.push_str(&format!(
            r##"<td class="table-cell-normal"><a class="table-header-link" href="#" data-sort-key="{key}">{label}</a></td>"##
        ));
    }
    page.push_str("</tr>");

    if entries.is_empty() {
        page.push_str(r#"<tr><td class="table-cell-normal" colspan="7"><i>empty</i></td></tr>"#);
    } else {
        for (order, entry) in entries.iter().enumerate() {
            page.push_str(&render_row(web_path, entry, order));
        }
    }
    page.push_str("</table></div>");

    page.push_str("</div>");
    page.push_str("<script>");
    page.push_str(PAGE_SCRIPT);
    page.push_str("</script></body></html>");
    page
}

const PAGE_STYLE: &str = r#"
* {
    font-family: monospace;
}
body,div,span,table,tr,tbody,thead,td,th {
    padding: 0px;
    margin: 0px;
    border: 0px;
}
.container {
    padding-top: 1em;
    padding-left: 1em;
    padding-right: 1em;
}
.section {
    padding-bottom: 1em;
}
.table-header-link {
    font-weight: bold;
    font-style: italic;
}
.table-cell-checkbox {
    padding: 0.25em 0.25em;
}
.table-cell-normal {
    padding: 0.25em 0.5em;
}
.menu-item {
    display: inline-block;
    margin-right: 0.5em;
}
.table-header {
    border-bottom: 1px solid black;
}
.table {
    border-collapse: collapse;
    display: block;
    white-space: nowrap;
}
.hidden {
    display: none;
}
.mark {
    background-color: yellow;
}
"#;

const PAGE_SCRIPT: &str = r#"
function refreshFilterResult(filterRegex) {
    let regex;
    try {
        regex = new RegExp(filterRegex);
    } catch (e) {
        regex = new RegExp(/.*/);
    }
    document.querySelectorAll('.table-row').forEach(function (el) {
        let entryName = el.getAttribute('data-sort-name');
        if (regex.test(entryName)) {
            el.classList.remove('hidden');
        } else {
            el.classList.add('hidden');
        }
    });
}

document.querySelector('input.name-filter').addEventListener('input', function (e) {
    e.preventDefault();
    refreshFilterResult(e.target.value);
});

function refreshButtons() {
    let checkboxes = [...document.querySelectorAll('input.table-row-checkbox')];
    let selected = checkboxes.filter(el => el.checked);
    let uploadButton = document.querySelector('button#upload');
    if (selected.length > 0 || uploadButton.hasAttribute('data-locked')) {
        uploadButton.setAttribute('disabled', '');
    } else {
        uploadButton.removeAttribute('disabled');
    }
    let deleteButton = document.querySelector('button#delete');
    if (selected.length > 0) {
        deleteButton.removeAttribute('disabled');
    } else {
        deleteButton.setAttribute('disabled', '');
    }
}

function refreshCheckboxState(changedCheckBox) {
    let checkboxAll = document.querySelector('input.table-row-checkbox-all');
    let checkboxes = document.querySelectorAll('input.table-row-checkbox');
    if (changedCheckBox === checkboxAll) {
        checkboxes.forEach(function (checkbox) {
            checkbox.checked = checkboxAll.checked;
        });
    } else {
        let allChecked = true;
        for (let checkbox of checkboxes) {
            if (!checkbox.checked) {
                allChecked = false;
                break;
            }
        }
        checkboxAll.checked = allChecked;
    }
}

document.querySelectorAll('input.table-row-checkbox-all,input.table-row-checkbox').forEach(function (checkbox) {
    checkbox.addEventListener('input', function (e) {
        e.preventDefault();
        refreshCheckboxState(e.target);
        refreshButtons();
    });
});

function refreshTableRowOrder(criterion, sign) {
    criterion ||= x => x.getAttribute('data-sort-order');
    sign = Math.sign(sign || 1);
    let table = document.querySelector('table.table');
    let container = table.tBodies.length > 0 ? table.tBodies[0] : table;
    let rows = [...document.querySelectorAll('table.table .table-row')];
    let value = el => {
        let raw = criterion(el);
        let num = Number(raw);
        return Number.isNaN(num) ? raw : num;
    };
    rows.sort((a, b) => (value(a) > value(b) ? sign : -sign));
    for (let el of rows) {
        el.remove();
        container.appendChild(el);
    }
}

let sortState = { key: null, sign: 1 };
document.querySelectorAll('a.table-header-link').forEach(function (link) {
    link.addEventListener('click', function (e) {
        e.preventDefault();
        let key = link.getAttribute('data-sort-key');
        sortState.sign = (sortState.key === key) ? -sortState.sign : 1;
        sortState.key = key;
        refreshTableRowOrder(x => x.getAttribute('data-sort-' + key), sortState.sign);
    });
});

function uploadFiles(action = '') {

    let form = document.createElement('form');
    form.setAttribute('action', action);
    form.setAttribute('method', 'post');
    form.setAttribute('enctype', 'multipart/form-data');
    form.style.display = 'none';

    form.appendChild(function () {
        let action = document.createElement('input');
        action.setAttribute('type', 'hidden');
        action.setAttribute('name', 'action');
        action.setAttribute('value', 'upload');
        return action;
    }());

    let file = document.createElement('input');
    file.setAttribute('type', 'file');
    file.setAttribute('name', 'file');
    file.setAttribute('multiple', '');
    file.addEventListener('change', function fileChangeListener(e) {
        e.target.removeEventListener('change', fileChangeListener);
        if (e.target.files.length > 0) {
            document.body.appendChild(form);
            form.submit();
        }
    });

    form.appendChild(file);
    file.click();
}

document.querySelector('button#upload').addEventListener('click', function (e) {
    uploadFiles();
})

function newFolder(action = '') {
    let name = prompt('New folder name');
    if (!name) {
        return;
    }

    let form = document.createElement('form');
    form.setAttribute('action', action);
    form.setAttribute('method', 'post');
    form.style.display = 'none';

    form.appendChild(function () {
        let action = document.createElement('input');
        action.setAttribute('type', 'hidden');
        action.setAttribute('name', 'action');
        action.setAttribute('value', 'new_folder');
        return action;
    }());

    let input = document.createElement('input');
    input.setAttribute('type', 'hidden');
    input.setAttribute('name', 'name');
    input.setAttribute('value', name);
    form.appendChild(input);

    document.body.appendChild(form);
    form.submit();
}

document.querySelector('button#new-folder').addEventListener('click', function (e) {
    newFolder();
})

function deleteFiles(action = '') {
    let form = document.createElement('form');
    form.setAttribute('action', action);
    form.setAttribute('method', 'post');
    form.style.display = 'none';

    form.appendChild(function () {
        let action = document.createElement('input');
        action.setAttribute('type', 'hidden');
        action.setAttribute('name', 'action');
        action.setAttribute('value', 'delete');
        return action;
    }());

    let selected = [...document.querySelectorAll('input.table-row-checkbox')].filter(el => el.checked);

    if (selected.length > 1) {
        let result = confirm('Are you sure to delete multiple files?');
        if (!result) {
            return;
        }
    } else if (selected.length == 0) {
        return;
    }

    for (let el of selected) {
        let input = document.createElement('input');
        input.setAttribute('type', 'hidden');
        input.setAttribute('name', 'file');
        input.setAttribute('value', el.getAttribute('data-entry-name'));
        form.appendChild(input);
    }

    document.body.appendChild(form);
    form.submit();
}

document.querySelector('button#delete').addEventListener('click', function (e) {
    deleteFiles();
})

refreshButtons();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::EntryType;
    use std::path::PathBuf;

    fn entry(name: &str, entry_type: EntryType, readable: bool) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_string(),
            path: PathBuf::from("/srv").join(name),
            entry_type,
            readable,
            writable: true,
            size: 1024,
            created: 1_700_000_000,
            modified: 1_700_000_100,
            accessed: 1_700_000_200,
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<b a="1">&'"#),
            "&lt;b a=&quot;1&quot;&gt;&amp;&#39;"
        );
        assert_eq!(html_escape("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_encode_href_segments() {
        assert_eq!(encode_href(""), "/");
        assert_eq!(encode_href("a/b"), "/a/b");
        assert_eq!(encode_href("with space/sub"), "/with%20space/sub");
    }

    #[test]
    fn test_parent_web_path() {
        assert_eq!(parent_web_path(""), "");
        assert_eq!(parent_web_path("a"), "");
        assert_eq!(parent_web_path("a/b/c"), "a/b");
    }

    #[test]
    fn test_render_one_row_per_entry() {
        let entries = vec![
            entry("docs", EntryType::Directory, true),
            entry("a.txt", EntryType::File, true),
            entry("b.txt", EntryType::File, true),
        ];
        let page = render_listing("", &entries, true);

        assert_eq!(page.matches(r#"<tr class="table-row""#).count(), 3);
        // listing order is preserved in the markup
        let dir_pos = page.find("docs/").unwrap();
        let file_pos = page.find("a.txt").unwrap();
        assert!(dir_pos < file_pos);
    }

    #[test]
    fn test_render_empty_directory() {
        let page = render_listing("sub", &[], true);
        assert!(page.contains(r#"colspan="7""#));
        assert!(page.contains("<i>empty</i>"));
        assert_eq!(page.matches(r#"<tr class="table-row""#).count(), 0);
    }

    #[test]
    fn test_readable_entries_are_linked() {
        let entries = vec![
            entry("open.txt", EntryType::File, true),
            entry("locked.txt", EntryType::File, false),
        ];
        let page = render_listing("", &entries, true);

        assert!(page.contains(r#"<a class="name" href="/open.txt">open.txt</a>"#));
        assert!(page.contains(r#"<a class="name">locked.txt</a>"#));
    }

    #[test]
    fn test_entry_names_are_escaped() {
        let entries = vec![entry("<script>.txt", EntryType::File, true)];
        let page = render_listing("", &entries, true);

        assert!(page.contains("&lt;script&gt;.txt"));
        assert!(!page.contains("<script>.txt"));
    }

    #[test]
    fn test_entry_hrefs_are_percent_encoded() {
        let entries = vec![entry("my file.txt", EntryType::File, true)];
        let page = render_listing("docs", &entries, true);

        assert!(page.contains(r#"href="/docs/my%20file.txt""#));
    }

    #[test]
    fn test_breadcrumbs_accumulate() {
        let page = render_listing("docs/reports", &[], true);

        assert!(page.contains(r#"<a href="/">Home</a>"#));
        assert!(page.contains(r#"<a href="/docs">docs</a>"#));
        assert!(page.contains(r#"<a href="/docs/reports">reports</a>"#));
    }

    #[test]
    fn test_parent_button_targets_parent() {
        let page = render_listing("a/b", &[], true);
        assert!(page.contains("location.href = &quot;/a&quot;"));

        let root_page = render_listing("", &[], true);
        assert!(root_page.contains("location.href = &quot;/&quot;"));
    }

    #[test]
    fn test_creation_buttons_locked_when_directory_unwritable() {
        let locked_page = render_listing("", &[], false);
        assert_eq!(locked_page.matches("data-locked").count(), 2);

        let open_page = render_listing("", &[], true);
        assert!(!open_page.contains("data-locked"));
        // delete always starts disabled until rows are selected
        assert!(open_page.contains(r#"<button id="delete" type="button" disabled>"#));
    }

    #[test]
    fn test_title_is_the_web_path() {
        let page = render_listing("docs/reports", &[], true);
        assert!(page.contains("<title>/docs/reports</title>"));

        let root = render_listing("", &[], true);
        assert!(root.contains("<title>/</title>"));
    }

    #[test]
    fn test_rows_carry_sort_attributes() {
        let entries = vec![entry("a.txt", EntryType::File, true)];
        let page = render_listing("", &entries, true);

        assert!(page.contains(r#"data-sort-name="a.txt""#));
        assert!(page.contains(r#"data-sort-size="1024""#));
        assert!(page.contains(r#"data-sort-order="0""#));
        assert!(page.contains(r#"data-sort-type="1""#));
    }
}
