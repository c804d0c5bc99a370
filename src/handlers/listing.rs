//! Directory listing pages.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::handlers::source::Entry;
use crate::http::response::escape_html;

/// Bytes escaped when a file name is used as a relative link.
pub(crate) const HREF: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Render a listing page. Entries are expected in display order.
pub fn render(entries: &[Entry]) -> String {
    let mut page = String::from("<!doctype html>\n<meta name=\"viewport\" content=\"width=device-width\">\n<pre>\n");
    for entry in entries {
        let mut name = entry.name.clone();
        if entry.is_dir {
            name.push('/');
        }
        let mut href = utf8_percent_encode(&name, HREF).to_string();
        // A colon in the first segment would be read as a scheme.
        if href.contains(':') {
            href.insert_str(0, "./");
        }
        page.push_str(&format!("<a href=\"{}\">{}</a>\n", escape_html(&href), escape_html(&name)));
    }
    page.push_str("</pre>\n");
    page
}
