//! "Label: Value" pairs with the label in the regular weight and the value
//! in bold.

use super::canvas::OverlayDocument;
use super::font::{width_of_text_at_size, FontWeight};
use super::layout::{LabelLayout, LabeledBlock, Rect};
use super::sanitize::sanitize_for_win_ansi;
use super::values::FormValues;
use super::RenderError;

const SEPARATOR: &str = ": ";

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPair {
    pub label: String,
    pub value: String,
    pub x: f32,
    pub y: f32,
    pub label_width: f32,
    pub width: f32,
    pub highlighted: bool,
}

fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

/// Positions each pair of the block. Pure, so the layout can be checked
/// without a document. Widths are measured on the sanitized text that is
/// actually drawn.
///
/// Inline rows wrap when the pair itself would cross the right margin; the
/// gap only separates a pair from the next one and is not counted.
pub fn layout_pairs(block: &LabeledBlock, pairs: &[(String, String)]) -> Vec<PlacedPair> {
    let keyword = block.highlight.as_ref().map(|h| normalize(&h.keyword));
    let mut placed = Vec::with_capacity(pairs.len());
    let mut cursor_x = block.x;
    let mut cursor_y = block.y;

    for (index, (label, value)) in pairs.iter().enumerate() {
        let label_text = sanitize_for_win_ansi(&format!("{}{}", label, SEPARATOR));
        let value = sanitize_for_win_ansi(value);
        let label_width = width_of_text_at_size(&label_text, block.size, FontWeight::Regular);
        let width = label_width + width_of_text_at_size(&value, block.size, FontWeight::Bold);

        let (x, y) = match &block.layout {
            LabelLayout::Stacked => (block.x, block.y - index as f32 * block.line_height),
            LabelLayout::Inline { gap, max_width } => {
                let right_margin = block.x + max_width;
                if cursor_x > block.x && cursor_x + width > right_margin {
                    cursor_x = block.x;
                    cursor_y -= block.line_height;
                }
                let at = (cursor_x, cursor_y);
                cursor_x += width + gap;
                at
            }
        };

        placed.push(PlacedPair {
            label: label_text,
            value,
            x,
            y,
            label_width,
            width,
            highlighted: keyword.as_deref() == Some(normalize(label).as_str()),
        });
    }

    placed
}

/// Draws the block's non-empty pairs and returns the y of the row below the
/// last one drawn.
pub fn draw_labeled_block(
    canvas: &mut OverlayDocument,
    block: &LabeledBlock,
    values: &FormValues,
) -> Result<f32, RenderError> {
    let pairs: Vec<(String, String)> = block
        .entries
        .iter()
        .map(|entry| (entry.label.clone(), values.text(&entry.field)))
        .filter(|(_, value)| !value.trim().is_empty())
        .collect();

    let placed = layout_pairs(block, &pairs);
    let mut bottom = block.y;

    for pair in &placed {
        let fill = if pair.highlighted {
            block.highlight.as_ref().map(|h| h.color)
        } else {
            block.background
        };
        if let Some(color) = fill {
            let rect = Rect::new(
                pair.x - block.padding,
                pair.y - block.size * 0.25 - block.padding,
                pair.width + 2.0 * block.padding,
                block.size + 2.0 * block.padding,
            );
            canvas.fill_rect(block.page, rect, color)?;
        }
        canvas.draw_text(block.page, &pair.label, pair.x, pair.y, block.size, FontWeight::Regular)?;
        canvas.draw_text(
            block.page,
            &pair.value,
            pair.x + pair.label_width,
            pair.y,
            block.size,
            FontWeight::Bold,
        )?;
        bottom = bottom.min(pair.y);
    }

    Ok(if placed.is_empty() { bottom } else { bottom - block.line_height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::layout::{Highlight, LabeledEntry, Rgb};

    fn block(layout: LabelLayout) -> LabeledBlock {
        LabeledBlock {
            page: 0,
            x: 50.0,
            y: 400.0,
            size: 10.0,
            line_height: 14.0,
            layout,
            entries: vec![],
            background: None,
            highlight: Some(Highlight {
                keyword: " Canone ".into(),
                color: Rgb::new(1.0, 0.9, 0.2),
            }),
            padding: 2.0,
        }
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(l, v)| (l.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_stacked_one_pair_per_line() {
        let placed = layout_pairs(
            &block(LabelLayout::Stacked),
            &pairs(&[("Cliente", "Acme"), ("Canone", "0"), ("IBAN", "IT00")]),
        );
        let ys: Vec<f32> = placed.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![400.0, 386.0, 372.0]);
        assert!(placed.iter().all(|p| p.x == 50.0));
    }

    #[test]
    fn test_inline_wraps_at_right_margin() {
        let inline = block(LabelLayout::Inline { gap: 10.0, max_width: 150.0 });
        let placed = layout_pairs(
            &inline,
            &pairs(&[("Cliente", "Acme Srl"), ("Canone", "29"), ("Citta", "Milano")]),
        );
        // "Cliente: Acme Srl" is ~80pt and "Canone: 29" ~52pt, so the third pair wraps.
        assert_eq!((placed[0].x, placed[0].y), (50.0, 400.0));
        assert!((placed[1].x - (50.0 + placed[0].width + 10.0)).abs() < 1e-3);
        assert_eq!(placed[1].y, 400.0);
        assert_eq!((placed[2].x, placed[2].y), (50.0, 386.0));
    }

    #[test]
    fn test_oversized_first_pair_stays_on_row() {
        let inline = block(LabelLayout::Inline { gap: 10.0, max_width: 20.0 });
        let placed = layout_pairs(&inline, &pairs(&[("Ragione sociale", "Acme Srl")]));
        assert_eq!((placed[0].x, placed[0].y), (50.0, 400.0));
    }

    #[test]
    fn test_highlight_matches_normalized_label() {
        let placed = layout_pairs(
            &block(LabelLayout::Stacked),
            &pairs(&[("CANONE", "0"), ("canone zero", "1"), ("Cliente", "x")]),
        );
        let flags: Vec<bool> = placed.iter().map(|p| p.highlighted).collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_value_offset_by_label_width() {
        let placed = layout_pairs(&block(LabelLayout::Stacked), &pairs(&[("A", "B")]));
        let expected = width_of_text_at_size("A: ", 10.0, FontWeight::Regular);
        assert!((placed[0].label_width - expected).abs() < 1e-4);
        assert_eq!(placed[0].label, "A: ");
    }

    #[test]
    fn test_widths_measured_on_drawn_text() {
        let placed = layout_pairs(
            &block(LabelLayout::Stacked),
            &pairs(&[("Canone \u{2192} mensile", "29 \u{1F600}")]),
        );
        assert_eq!(placed[0].label, "Canone -> mensile: ");
        assert_eq!(placed[0].value, "29 ");
        let label_width = width_of_text_at_size("Canone -> mensile: ", 10.0, FontWeight::Regular);
        let value_width = width_of_text_at_size("29 ", 10.0, FontWeight::Bold);
        assert!((placed[0].label_width - label_width).abs() < 1e-4);
        assert!((placed[0].width - (label_width + value_width)).abs() < 1e-4);
    }

    #[test]
    fn test_inline_gap_not_counted_against_margin() {
        let first = width_of_text_at_size("A: ", 10.0, FontWeight::Regular)
            + width_of_text_at_size("B", 10.0, FontWeight::Bold);
        let second = width_of_text_at_size("C: ", 10.0, FontWeight::Regular)
            + width_of_text_at_size("D", 10.0, FontWeight::Bold);
        // both pairs and the gap between them fit with half a point to spare
        let max_width = first + 10.0 + second + 0.5;
        let placed = layout_pairs(
            &block(LabelLayout::Inline { gap: 10.0, max_width }),
            &pairs(&[("A", "B"), ("C", "D"), ("E", "F")]),
        );
        assert_eq!(placed[1].y, 400.0);
        assert_eq!((placed[2].x, placed[2].y), (50.0, 386.0));
    }

    #[test]
    fn test_entries_without_value_are_skipped() {
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let mut canvas = OverlayDocument::load(&bytes, 1).unwrap();
        let mut labeled = block(LabelLayout::Stacked);
        labeled.entries = vec![
            LabeledEntry { label: "Cliente".into(), field: "ragione".into() },
            LabeledEntry { label: "Canone".into(), field: "canone".into() },
        ];
        let mut values = FormValues::default();
        values.insert_text("ragione", "Acme");
        values.insert_text("canone", "   ");

        let bottom = draw_labeled_block(&mut canvas, &labeled, &values).unwrap();
        assert_eq!(bottom, 386.0);
        // label + value, five operators each
        assert_eq!(canvas.queued_operations(0), 10);
    }
}
