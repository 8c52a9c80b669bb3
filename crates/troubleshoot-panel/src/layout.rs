//! Line layout of the conversation region.
//!
//! Turns are flattened into display lines for a given width. The same
//! layout measures the scrollable extent and drives drawing, so the two
//! always agree.

use unicode_width::UnicodeWidthStr;

use crate::element::{Document, NodeId};

/// Columns between two controls on the same line.
const CONTROL_GAP: usize = 2;

/// A run of text on a line, attributed to the node it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub node: NodeId,
    pub text: String,
}

/// One display line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutLine {
    /// The conversation turn this line belongs to.
    pub turn: NodeId,
    pub segments: Vec<Segment>,
}

impl LayoutLine {
    /// Plain text of the line.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && self.is_control_row() {
                out.push_str(&" ".repeat(CONTROL_GAP));
            }
            out.push_str(&segment.text);
        }
        out
    }

    fn is_control_row(&self) -> bool {
        self.segments.iter().any(|s| s.node != self.turn)
    }
}

/// Label of a control as drawn.
pub fn control_label(label: &str) -> String {
    format!("[ {label} ]")
}

/// Lay out every visible turn under `region` at the given width.
pub fn layout_region(doc: &Document, region: NodeId, width: usize) -> Vec<LayoutLine> {
    layout_turns(doc, doc.children(region), width)
}

/// Lay out the given turns in order.
///
/// Turns are laid out independently, so the lines of a region can be
/// extended one appended turn at a time.
pub fn layout_turns(doc: &Document, turns: &[NodeId], width: usize) -> Vec<LayoutLine> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for &turn in turns {
        let Some(node) = doc.get(turn) else {
            continue;
        };
        if node.hidden {
            continue;
        }

        if node.children().is_empty() {
            let content = node.content.as_deref().unwrap_or_default();
            let wrapped = textwrap::wrap(content, width);
            if wrapped.is_empty() {
                lines.push(LayoutLine {
                    turn,
                    segments: vec![Segment {
                        node: turn,
                        text: String::new(),
                    }],
                });
            }
            for text in wrapped {
                lines.push(LayoutLine {
                    turn,
                    segments: vec![Segment {
                        node: turn,
                        text: text.into_owned(),
                    }],
                });
            }
        } else {
            layout_controls(doc, turn, width, &mut lines);
        }
    }

    lines
}

/// Controls share a line while they fit, then wrap one per line.
fn layout_controls(doc: &Document, turn: NodeId, width: usize, lines: &mut Vec<LayoutLine>) {
    let mut current: Vec<Segment> = Vec::new();
    let mut used = 0usize;

    for &control in doc.children(turn) {
        let Some(node) = doc.get(control) else {
            continue;
        };
        if node.hidden {
            continue;
        }
        let label = control_label(node.content.as_deref().unwrap_or_default());
        let label_width = label.width();
        let needed = if current.is_empty() {
            label_width
        } else {
            used + CONTROL_GAP + label_width
        };

        if !current.is_empty() && needed > width {
            lines.push(LayoutLine {
                turn,
                segments: std::mem::take(&mut current),
            });
            used = label_width;
        } else {
            used = needed;
        }
        current.push(Segment {
            node: control,
            text: label,
        });
    }

    if !current.is_empty() {
        lines.push(LayoutLine {
            turn,
            segments: current,
        });
    }
}

/// Height of the region's content in lines.
pub fn content_height(doc: &Document, region: NodeId, width: usize) -> usize {
    layout_region(doc, region, width).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, Tag};

    fn region_with(turns: Vec<Element>) -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let region = doc.append(root, Element::new(Tag::Section)).unwrap();
        for turn in turns {
            doc.append(region, turn);
        }
        (doc, region)
    }

    #[test]
    fn test_text_turns_wrap_to_width() {
        let (doc, region) = region_with(vec![
            Element::new(Tag::Div).content("short"),
            Element::new(Tag::Div).content("one two three four"),
        ]);
        let lines = layout_region(&doc, region, 9);
        let texts: Vec<String> = lines.iter().map(LayoutLine::text).collect();
        assert_eq!(texts, vec!["short", "one two", "three", "four"]);
        assert_eq!(content_height(&doc, region, 9), 4);
    }

    #[test]
    fn test_markup_is_kept_verbatim() {
        let (doc, region) = region_with(vec![Element::new(Tag::Div).content("<b>disk</b>")]);
        assert_eq!(layout_region(&doc, region, 80)[0].text(), "<b>disk</b>");
    }

    #[test]
    fn test_empty_turn_takes_one_line() {
        let (doc, region) = region_with(vec![Element::new(Tag::Div).content("")]);
        assert_eq!(content_height(&doc, region, 10), 1);
    }

    #[test]
    fn test_controls_share_a_line() {
        let (doc, region) = region_with(vec![Element::new(Tag::Div)
            .child(Element::new(Tag::Button).content("Yes"))
            .child(Element::new(Tag::Button).content("No"))]);
        let lines = layout_region(&doc, region, 40);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "[ Yes ]  [ No ]");
        assert_eq!(lines[0].segments.len(), 2);
    }

    #[test]
    fn test_controls_wrap_when_narrow() {
        let (doc, region) = region_with(vec![Element::new(Tag::Div)
            .child(Element::new(Tag::Button).content("Yes"))
            .child(Element::new(Tag::Button).content("No"))]);
        let lines = layout_region(&doc, region, 10);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text(), "[ No ]");
    }

    #[test]
    fn test_turns_lay_out_independently() {
        let (doc, region) = region_with(vec![
            Element::new(Tag::Div).content("alpha beta"),
            Element::new(Tag::Div).content("gamma"),
            Element::new(Tag::Div).content("delta epsilon"),
        ]);
        let turns = doc.children(region);
        let mut lines = layout_turns(&doc, &turns[..1], 6);
        lines.extend(layout_turns(&doc, &turns[1..], 6));
        assert_eq!(lines, layout_region(&doc, region, 6));
    }

    #[test]
    fn test_hidden_turns_are_skipped() {
        let mut hidden = Element::new(Tag::Div).content("secret");
        hidden.hidden = true;
        let (doc, region) = region_with(vec![hidden, Element::new(Tag::Div).content("shown")]);
        let lines = layout_region(&doc, region, 20);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text(), "shown");
    }
}
