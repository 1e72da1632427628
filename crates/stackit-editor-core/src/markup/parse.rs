//! Tolerant parser for the markup subset.
//!
//! Unmatched closing tags are ignored, unclosed elements close at the end of
//! input, and a `<` that does not start a tag is kept as text. No implied end
//! tags are synthesized, so the tree mirrors the nesting that was written and
//! serializing it again is stable.

use smol_str::SmolStr;

use super::{Attribute, Element, NodeId, Tree, is_void};

pub(super) fn parse_into(tree: &mut Tree, parent: NodeId, markup: &str) {
    let mut stack: Vec<NodeId> = vec![parent];
    let mut text = String::new();
    let mut rest = markup;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            text.push_str(rest);
            break;
        };
        text.push_str(&rest[..lt]);
        let tail = &rest[lt..];

        if let Some(after) = tail.strip_prefix("<!--") {
            flush_text(tree, &stack, &mut text);
            rest = match after.find("-->") {
                Some(end) => &after[end + 3..],
                None => "",
            };
        } else if tail.starts_with("<!") || tail.starts_with("<?") {
            flush_text(tree, &stack, &mut text);
            rest = match tail.find('>') {
                Some(end) => &tail[end + 1..],
                None => "",
            };
        } else if let Some(after) = tail.strip_prefix("</") {
            if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
                text.push('<');
                rest = &tail[1..];
                continue;
            }
            flush_text(tree, &stack, &mut text);
            let name_len = tag_name_len(after);
            let name = after[..name_len].to_ascii_lowercase();
            rest = match after.find('>') {
                Some(end) => &after[end + 1..],
                None => "",
            };
            close_element(tree, &mut stack, &name);
        } else if tail[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            flush_text(tree, &stack, &mut text);
            let (element, self_closing, remaining) = parse_start_tag(&tail[1..]);
            rest = remaining;
            let void = is_void(&element.tag);
            let node = tree.create_element(element);
            if let Some(&top) = stack.last() {
                tree.append_child(top, node);
            }
            if !void && !self_closing {
                stack.push(node);
            }
        } else {
            text.push('<');
            rest = &tail[1..];
        }
    }

    flush_text(tree, &stack, &mut text);
}

fn flush_text(tree: &mut Tree, stack: &[NodeId], text: &mut String) {
    if text.is_empty() {
        return;
    }
    let decoded = decode_entities(text);
    text.clear();
    let Some(&top) = stack.last() else {
        return;
    };
    if let Some(&last) = tree.children(top).last() {
        if let Some(existing) = tree.text_mut(last) {
            existing.push_str(&decoded);
            return;
        }
    }
    let node = tree.create_text(decoded);
    tree.append_child(top, node);
}

fn close_element(tree: &Tree, stack: &mut Vec<NodeId>, name: &str) {
    // Index 0 is the container being parsed into; it is never closed.
    let found = stack
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .find(|(_, node)| tree.tag(**node) == Some(name))
        .map(|(idx, _)| idx);
    if let Some(idx) = found {
        stack.truncate(idx);
    }
}

fn tag_name_len(s: &str) -> usize {
    s.find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(s.len())
}

fn is_attr_name_char(c: char) -> bool {
    !(c.is_whitespace() || matches!(c, '/' | '>' | '=' | '"' | '\'' | '<'))
}

/// Parse `name attr="v" ...>` (the leading `<` already consumed).
fn parse_start_tag(s: &str) -> (Element, bool, &str) {
    let name_len = tag_name_len(s);
    let mut element = Element::new(SmolStr::new(s[..name_len].to_ascii_lowercase()));
    let mut rest = &s[name_len..];

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return (element, false, rest);
        }
        if let Some(after) = rest.strip_prefix("/>") {
            return (element, true, after);
        }
        if let Some(after) = rest.strip_prefix('>') {
            return (element, false, after);
        }

        let name_len = rest
            .find(|c: char| !is_attr_name_char(c))
            .unwrap_or(rest.len());
        if name_len == 0 {
            // Stray character such as a lone `/` or a quote; skip it.
            let skip = rest.chars().next().map(char::len_utf8).unwrap_or(1);
            rest = &rest[skip..];
            continue;
        }
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (raw, remaining) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    match body.find(quote) {
                        Some(end) => (&body[..end], &body[end + 1..]),
                        None => (body, ""),
                    }
                }
                _ => {
                    let end = after_eq
                        .find(|c: char| c.is_whitespace() || c == '>')
                        .unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            rest = remaining;
            decode_entities(raw)
        } else {
            String::new()
        };

        if element.attr(&name).is_none() {
            element.attrs.push(Attribute::new(name, value));
        }
    }
}

/// Decode the character references the serializer emits, plus numeric ones.
/// Unknown references are left as written.
pub(crate) fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .get(1..tail.len().min(12))
            .and_then(|window| window.find(';'))
            .and_then(|semi| decode_reference(&tail[1..semi + 1]).map(|c| (c, semi + 2)));
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code).filter(|&c| c != '\0')
        }
    }
}
