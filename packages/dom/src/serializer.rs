use crate::classify::is_void_tag;
use crate::node::NodeId;
use crate::position::{Position, Selection};
use crate::tree::Dom;
use crate::visitor::Visitor;

/// Options for [`Serializer`]
#[derive(Debug, Clone, Default)]
pub struct SerializeOptions {
    /// Write `[` at the anchor and `]` at the focus
    pub selection: Option<Selection>,
    /// Classes left out of the output (system classes)
    pub strip_classes: Vec<String>,
}

/// Writes a subtree back to fixture markup.
///
/// The output is what [`crate::markup::parse_fragment`] reads: void tags
/// have no closing tag, text escapes `& < > [ ]` and attribute values
/// escape `& "`.
pub struct Serializer<'a> {
    options: &'a SerializeOptions,
    output: String,
}

impl<'a> Serializer<'a> {
    pub fn new(options: &'a SerializeOptions) -> Self {
        Self {
            options,
            output: String::new(),
        }
    }

    /// Serialize `id` itself, tag included
    pub fn outer(mut self, dom: &Dom, id: NodeId) -> String {
        self.visit_node(dom, id);
        self.output
    }

    /// Serialize the children of `id`
    pub fn inner(mut self, dom: &Dom, id: NodeId) -> String {
        self.write_children(dom, id);
        self.output
    }

    fn write_markers(&mut self, position: Position) {
        let Some(selection) = self.options.selection else {
            return;
        };
        if selection.anchor == position {
            self.output.push('[');
        }
        if selection.focus == position {
            self.output.push(']');
        }
    }

    fn write_children(&mut self, dom: &Dom, id: NodeId) {
        let children = dom.children(id);
        for (index, &child) in children.iter().enumerate() {
            self.write_markers(Position::new(id, index));
            self.visit_node(dom, child);
        }
        self.write_markers(Position::new(id, children.len()));
    }

    fn write_attributes(&mut self, dom: &Dom, id: NodeId) {
        for (name, value) in dom.attributes(id) {
            let value = if name == "class" && !self.options.strip_classes.is_empty() {
                let kept: Vec<&str> = value
                    .split_ascii_whitespace()
                    .filter(|class| !self.options.strip_classes.iter().any(|s| s == class))
                    .collect();
                if kept.is_empty() {
                    continue;
                }
                kept.join(" ")
            } else {
                value.clone()
            };
            self.output.push(' ');
            self.output.push_str(name);
            self.output.push_str("=\"");
            escape_into(&mut self.output, &value, &['&', '"']);
            self.output.push('"');
        }
    }
}

impl Visitor for Serializer<'_> {
    fn visit_element(&mut self, dom: &Dom, id: NodeId) {
        let tag = dom.tag(id).unwrap_or_default();
        self.output.push('<');
        self.output.push_str(tag);
        self.write_attributes(dom, id);
        self.output.push('>');
        if is_void_tag(tag) && !dom.has_children(id) {
            return;
        }
        self.write_children(dom, id);
        self.output.push_str("</");
        self.output.push_str(tag);
        self.output.push('>');
    }

    fn visit_text(&mut self, dom: &Dom, id: NodeId) {
        let text = dom.text(id).unwrap_or_default();
        for (index, c) in text.chars().enumerate() {
            self.write_markers(Position::new(id, index));
            escape_into(&mut self.output, c.encode_utf8(&mut [0; 4]), &['&', '<', '>', '[', ']']);
        }
        self.write_markers(Position::new(id, text.chars().count()));
    }

    fn visit_fragment(&mut self, dom: &Dom, id: NodeId) {
        self.write_children(dom, id);
    }
}

fn escape_into(output: &mut String, raw: &str, special: &[char]) {
    for c in raw.chars() {
        if !special.contains(&c) {
            output.push(c);
            continue;
        }
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '[' => output.push_str("&#91;"),
            ']' => output.push_str("&#93;"),
            other => output.push(other),
        }
    }
}

/// Markup of the children of `id`
pub fn inner_markup(dom: &Dom, id: NodeId) -> String {
    Serializer::new(&SerializeOptions::default()).inner(dom, id)
}

/// Markup of the children of `id` with selection markers
pub fn inner_markup_with_selection(dom: &Dom, id: NodeId, selection: Option<Selection>) -> String {
    let options = SerializeOptions {
        selection,
        ..SerializeOptions::default()
    };
    Serializer::new(&options).inner(dom, id)
}

/// Markup of `id` itself
pub fn outer_markup(dom: &Dom, id: NodeId) -> String {
    Serializer::new(&SerializeOptions::default()).outer(dom, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse_fragment;

    #[test]
    fn test_markup_survives_a_read_write_cycle() {
        let source = r#"<div class="a">x &amp; &lt;y&gt; &#91;z&#93;<br><b data-x="&quot;">[q]</b></div>"#;
        let mut dom = Dom::new();
        let parsed = parse_fragment(&mut dom, source).unwrap();
        let options = SerializeOptions {
            selection: parsed.selection,
            ..SerializeOptions::default()
        };
        assert_eq!(Serializer::new(&options).inner(&dom, parsed.root), source);
    }

    #[test]
    fn test_strip_classes() {
        let mut dom = Dom::new();
        let parsed = parse_fragment(&mut dom, r#"<p class="o_sys keep">a</p><p class="o_sys">b</p>"#)
            .unwrap();
        let options = SerializeOptions {
            strip_classes: vec!["o_sys".to_string()],
            ..SerializeOptions::default()
        };
        assert_eq!(
            Serializer::new(&options).inner(&dom, parsed.root),
            r#"<p class="keep">a</p><p>b</p>"#
        );
    }

    #[test]
    fn test_element_level_markers() {
        let mut dom = Dom::new();
        let parsed = parse_fragment(&mut dom, "<p><br>[]</p>").unwrap();
        assert_eq!(
            inner_markup_with_selection(&dom, parsed.root, parsed.selection),
            "<p><br>[]</p>"
        );
        assert_eq!(inner_markup(&dom, parsed.root), "<p><br></p>");
    }
}
