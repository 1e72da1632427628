//! Read-only preview rendering of a document value.
//!
//! Stored markup is kept exactly as the user wrote it; sanitization happens
//! here, on the way to display. Under [`SanitizePolicy::Sanitize`] unknown
//! elements are unwrapped (their content survives), script-like elements are
//! dropped along with their content, and only allowlisted attributes with safe
//! values are kept.

use crate::config::SanitizePolicy;
use crate::markup::{NodeId, NodeKind, Tree, escape_attr, escape_text, is_void};

pub const EMPTY_PREVIEW: &str = "<p class=\"preview-empty\">Nothing to preview</p>";

const ALLOWED_TAGS: &[&str] = &[
    "p", "div", "span", "br", "hr", "b", "strong", "i", "em", "s", "strike", "del", "u", "sub",
    "sup", "code", "pre", "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "a",
    "img",
];

const DROPPED_WITH_CONTENT: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "template", "noscript", "frame", "frameset",
];

const ALLOWED_STYLE_PROPERTIES: &[&str] = &["text-align", "max-width", "width", "height"];

/// Render `value` for the preview pane.
pub fn render_preview(value: &str, policy: SanitizePolicy) -> String {
    let tree = Tree::parse(value);
    if !tree.has_visible_content() {
        return EMPTY_PREVIEW.to_owned();
    }
    match policy {
        SanitizePolicy::Trusted => value.to_owned(),
        SanitizePolicy::Sanitize => sanitize(&tree),
    }
}

/// Re-serialize `tree` keeping only allowlisted markup.
pub fn sanitize(tree: &Tree) -> String {
    let mut out = String::new();
    for &child in tree.children(tree.root()) {
        write_sanitized(tree, child, &mut out);
    }
    out
}

fn write_sanitized(tree: &Tree, node: NodeId, out: &mut String) {
    let el = match tree.kind(node) {
        Some(NodeKind::Text(text)) => {
            out.push_str(&escape_text(text));
            return;
        }
        Some(NodeKind::Element(el)) => el,
        None => return,
    };
    let tag = el.tag.as_str();
    if DROPPED_WITH_CONTENT.contains(&tag) {
        tracing::debug!(target: "stackit::preview", tag, "dropped element");
        return;
    }
    if !ALLOWED_TAGS.contains(&tag) {
        for &child in tree.children(node) {
            write_sanitized(tree, child, out);
        }
        return;
    }

    out.push('<');
    out.push_str(tag);
    for attr in &el.attrs {
        if let Some(value) = sanitize_attr(tag, &attr.name, &attr.value) {
            out.push(' ');
            out.push_str(&attr.name);
            out.push_str("=\"");
            out.push_str(&escape_attr(&value));
            out.push('"');
        }
    }
    out.push('>');
    if is_void(tag) {
        return;
    }
    for &child in tree.children(node) {
        write_sanitized(tree, child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn sanitize_attr(tag: &str, name: &str, value: &str) -> Option<String> {
    match (tag, name) {
        (_, "style") => sanitize_style(value),
        (_, "title") => Some(value.to_owned()),
        ("a", "href") => is_safe_url(value, false).then(|| value.trim().to_owned()),
        ("a", "target") => Some(value.to_owned()),
        ("a", "rel") => Some(value.to_owned()),
        ("img", "src") => is_safe_url(value, true).then(|| value.trim().to_owned()),
        ("img", "alt" | "width" | "height") => Some(value.to_owned()),
        _ => None,
    }
}

fn sanitize_style(style: &str) -> Option<String> {
    let kept: Vec<String> = style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            let lowered = value.to_ascii_lowercase();
            let safe = ALLOWED_STYLE_PROPERTIES.contains(&name.as_str())
                && !lowered.contains("url(")
                && !lowered.contains("expression");
            safe.then(|| format!("{name}: {value};"))
        })
        .collect();
    (!kept.is_empty()).then(|| kept.join(" "))
}

/// http, https, mailto, relative references, and for images `data:image/`.
fn is_safe_url(url: &str, image: bool) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let scheme_end = cleaned.find(':');
    let path_start = cleaned.find(['/', '?', '#']);
    let scheme = match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => return true,
        (Some(colon), _) => &cleaned[..colon],
        (None, _) => return true,
    };
    match scheme {
        "http" | "https" => true,
        "mailto" => !image,
        "data" => image && cleaned.starts_with("data:image/"),
        _ => false,
    }
}
