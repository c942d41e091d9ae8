//! # Fixture markup reader
//!
//! Reads the strict markup written by [`crate::serializer`] back into a
//! [`Dom`]. It is not an HTML parser: every non-void tag must be closed,
//! attribute values must be double-quoted and only a handful of entities
//! are understood.
//!
//! `[` marks the selection anchor and `]` the focus. Both are optional but
//! must appear together. A marker inside text lands in that text node; a
//! marker between tags lands on the parent at the child index.

use crate::classify::is_void_tag;
use crate::error::{DomError, DomResult};
use crate::node::NodeId;
use crate::position::{Position, Selection};
use crate::tokenizer::{tokenize, MarkupToken};
use crate::tree::Dom;
use tracing::debug;

/// Result of reading markup into a fresh fragment
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMarkup {
    /// Detached fragment holding the parsed nodes
    pub root: NodeId,
    pub selection: Option<Selection>,
}

#[derive(Default)]
struct Markers {
    anchor: Option<Position>,
    focus: Option<Position>,
}

/// Parse `source` into a new fragment of `dom`
pub fn parse_fragment(dom: &mut Dom, source: &str) -> DomResult<ParsedMarkup> {
    let root = dom.create_fragment();
    let mut stack = vec![root];
    let mut markers = Markers::default();

    for (token, span) in tokenize(source)? {
        let top = stack.last().copied().unwrap_or(root);
        match token {
            MarkupToken::Open {
                name,
                attributes,
                self_closing,
            } => {
                let element = dom.create_element(name);
                for (key, value) in attributes {
                    dom.set_attribute(element, key, decode_entities(value))?;
                }
                dom.append_child(top, element)?;
                if !self_closing && !is_void_tag(name) {
                    stack.push(element);
                }
            }
            MarkupToken::Close(name) => {
                if top == root || !dom.has_tag(top, name) {
                    let open = dom.tag(top).unwrap_or("fragment").to_string();
                    return Err(DomError::markup(
                        span.start,
                        format!("closing </{}> does not match <{}>", name, open),
                    ));
                }
                stack.pop();
            }
            MarkupToken::Text(raw) => {
                let text = decode_entities(raw);
                match dom.last_child(top).filter(|&last| dom.is_text(last)) {
                    Some(last) => {
                        let merged = format!("{}{}", dom.text(last).unwrap_or_default(), text);
                        dom.set_text(last, merged)?;
                    }
                    None => {
                        let node = dom.create_text(text);
                        let index = dom.child_count(top);
                        dom.append_child(top, node)?;
                        markers.move_into_text(top, index, node);
                    }
                }
            }
            MarkupToken::SelectionStart => {
                let position = marker_position(dom, top);
                if markers.anchor.replace(position).is_some() {
                    return Err(DomError::markup(span.start, "duplicate '[' marker"));
                }
            }
            MarkupToken::SelectionEnd => {
                let position = marker_position(dom, top);
                if markers.focus.replace(position).is_some() {
                    return Err(DomError::markup(span.start, "duplicate ']' marker"));
                }
            }
        }
    }

    if let Some(&open) = stack.last().filter(|&&open| open != root) {
        let tag = dom.tag(open).unwrap_or_default().to_string();
        return Err(DomError::markup(source.len(), format!("unclosed <{}>", tag)));
    }

    let selection = match (markers.anchor, markers.focus) {
        (Some(anchor), Some(focus)) => Some(Selection::new(anchor, focus)),
        (None, None) => None,
        _ => {
            return Err(DomError::markup(
                source.len(),
                "selection needs both '[' and ']' markers",
            ))
        }
    };
    debug!(nodes = dom.descendants(root).len(), has_selection = selection.is_some(), "parsed markup");
    Ok(ParsedMarkup { root, selection })
}

/// Parse `source` and append its nodes to `parent`
pub fn parse_into(dom: &mut Dom, parent: NodeId, source: &str) -> DomResult<Option<Selection>> {
    let parsed = parse_fragment(dom, source)?;
    let base = dom.child_count(parent);
    let remap = |position: Position| {
        if position.node == parsed.root {
            Position::new(parent, base + position.offset)
        } else {
            position
        }
    };
    let selection = parsed
        .selection
        .map(|s| Selection::new(remap(s.anchor), remap(s.focus)));
    dom.move_children(parsed.root, parent)?;
    dom.destroy(parsed.root)?;
    Ok(selection)
}

fn marker_position(dom: &Dom, top: NodeId) -> Position {
    match dom.last_child(top).filter(|&last| dom.is_text(last)) {
        Some(text) => Position::new(text, dom.text_len(text)),
        None => Position::new(top, dom.child_count(top)),
    }
}

impl Markers {
    /// Markers set right before a new text node belong to that text
    fn move_into_text(&mut self, parent: NodeId, index: usize, text: NodeId) {
        for marker in [&mut self.anchor, &mut self.focus].into_iter().flatten() {
            if *marker == Position::new(parent, index) {
                *marker = Position::new(text, 0);
            }
        }
    }
}

/// Decode the entities the serializer writes, plus numeric references
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate
            .find(';')
            .and_then(|end| decode_entity(&candidate[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
