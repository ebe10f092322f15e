//! Rendering of translated text according to its content policy.
//!
//! - Plain text is returned unchanged.
//! - Linked text is HTML-escaped and bare `http(s)://` URLs become anchors.
//! - Sanitized text keeps a small allow-list of formatting tags (attributes
//!   stripped), escapes everything else, and linkifies the text between tags.
//!
//! URLs are found in the raw text, before escaping, so quotes and brackets
//! around a URL never end up inside its `href`.

use crate::translation::TranslationKind;
use regex::Regex;
use std::sync::OnceLock;

/// Formatting tags that survive sanitizing.
const ALLOWED_TAGS: &[&str] = &[
    "abbr",
    "acronym",
    "b",
    "blockquote",
    "code",
    "em",
    "i",
    "li",
    "ol",
    "strong",
    "ul",
];

/// Characters that end a sentence rather than a URL.
const URL_TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(r#"https?://[^\s<>"']+"#).unwrap())
}

fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)\b[^>]*>").unwrap())
}

/// Render `text` for display under the given row kind.
pub fn render(kind: TranslationKind, text: &str) -> String {
    match kind {
        TranslationKind::Plain => text.to_string(),
        TranslationKind::Linked => linkify(text),
        TranslationKind::Sanitized => clean(text, linkify),
    }
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape raw `text` and wrap bare URLs in `<a rel="nofollow">` anchors.
///
/// Trailing sentence punctuation is left outside the link.
pub fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for found in url_regex().find_iter(text) {
        let url = found.as_str().trim_end_matches(URL_TRAILING);
        if url.len() <= "https://".len() {
            continue;
        }
        let end = found.start() + url.len();
        let url = escape_html(url);

        out.push_str(&escape_html(&text[last..found.start()]));
        out.push_str(&format!(r#"<a href="{url}" rel="nofollow">{url}</a>"#));
        last = end;
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

/// Keep allow-listed tags without attributes and escape everything else.
pub fn sanitize(text: &str) -> String {
    clean(text, escape_html)
}

/// Walk the tags of `text`, passing the text between them through `segment`.
fn clean(text: &str, segment: fn(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for caps in tag_regex().captures_iter(text) {
        let whole = caps.get(0).expect("group 0 always matches");
        out.push_str(&segment(&text[last..whole.start()]));

        let closing = &caps[1];
        let name = caps[2].to_lowercase();
        if ALLOWED_TAGS.contains(&name.as_str()) {
            out.push('<');
            out.push_str(closing);
            out.push_str(&name);
            out.push('>');
        } else {
            out.push_str(&escape_html(whole.as_str()));
        }
        last = whole.end();
    }
    out.push_str(&segment(&text[last..]));
    out
}
