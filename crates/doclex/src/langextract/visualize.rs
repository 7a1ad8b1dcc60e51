//! Self-contained HTML rendering of an annotated document.

use super::data::AnnotatedDocument;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

const PALETTE: &[&str] = &[
    "#D2E3FC", "#C8E6C9", "#FEF0C3", "#F9DEDC", "#FFDDBE", "#EADDFF", "#C4E9E4", "#FCE4EC", "#E8EAED", "#DDE8BB",
];

const STYLE: &str = "\
body{font-family:-apple-system,Segoe UI,Roboto,sans-serif;margin:24px;color:#202124}\
.lx-legend span{display:inline-block;padding:2px 8px;margin:0 6px 6px 0;border-radius:4px}\
.lx-text{white-space:pre-wrap;line-height:1.6;border:1px solid #dadce0;border-radius:8px;padding:16px}\
.lx-text mark{border-radius:3px;padding:0 1px}\
table{border-collapse:collapse;margin-top:16px}\
th,td{border:1px solid #dadce0;padding:4px 8px;text-align:left;vertical-align:top}";

/// Colour per class, in order of first appearance.
fn class_colours(document: &AnnotatedDocument) -> Vec<(String, &'static str)> {
    let mut colours: Vec<(String, &'static str)> = Vec::new();
    for extraction in &document.extractions {
        if !colours.iter().any(|(class, _)| *class == extraction.extraction_class) {
            let colour = PALETTE[colours.len() % PALETTE.len()];
            colours.push((extraction.extraction_class.clone(), colour));
        }
    }
    colours
}

fn colour_for<'a>(colours: &'a [(String, &'static str)], class: &str) -> &'a str {
    colours
        .iter()
        .find(|(name, _)| name == class)
        .map(|(_, colour)| *colour)
        .unwrap_or(PALETTE[0])
}

/// Render `document` as an HTML page.
///
/// Aligned extractions are highlighted in the text; when spans overlap only the
/// earliest one is highlighted. Every extraction appears in the table.
pub fn render_html(document: &AnnotatedDocument) -> String {
    let colours = class_colours(document);
    let mut html = String::with_capacity(document.text.len() * 2 + 2048);

    html.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Extraction results</title><style>");
    html.push_str(STYLE);
    html.push_str("</style></head><body>\n<h2>Extraction results</h2>\n<div class=\"lx-legend\">");
    for (class, colour) in &colours {
        let _ = write!(html, "<span style=\"background:{}\">{}</span>", colour, encode_text(class));
    }
    html.push_str("</div>\n<div class=\"lx-text\">");
    render_highlighted_text(document, &colours, &mut html);
    html.push_str("</div>\n");

    html.push_str("<table><thead><tr><th>#</th><th>Class</th><th>Text</th><th>Position</th><th>Attributes</th></tr></thead><tbody>");
    for (i, extraction) in document.extractions.iter().enumerate() {
        let position = extraction
            .span()
            .map(|(start, end)| format!("{}-{}", start, end))
            .unwrap_or_else(|| "unaligned".to_string());
        let attributes = serde_json::Value::Object(extraction.attributes.clone()).to_string();
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            i + 1,
            encode_text(&extraction.extraction_class),
            encode_text(&extraction.extraction_text),
            position,
            encode_text(&attributes)
        );
    }
    html.push_str("</tbody></table>\n</body></html>\n");
    html
}

fn render_highlighted_text(document: &AnnotatedDocument, colours: &[(String, &'static str)], html: &mut String) {
    let text = &document.text;
    let mut boundaries: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
    let total_chars = boundaries.len();
    boundaries.push(text.len());

    let mut spans: Vec<(usize, usize, &str)> = document
        .extractions
        .iter()
        .filter_map(|e| e.span().map(|(start, end)| (start, end, e.extraction_class.as_str())))
        .filter(|(start, end, _)| start < end && *end <= total_chars)
        .collect();
    spans.sort_by_key(|(start, end, _)| (*start, std::cmp::Reverse(*end)));

    let mut cursor = 0;
    for (start, end, class) in spans {
        if start < cursor {
            continue;
        }
        html.push_str(&encode_text(&text[boundaries[cursor]..boundaries[start]]));
        let _ = write!(
            html,
            "<mark style=\"background:{}\" title=\"{}\">{}</mark>",
            colour_for(colours, class),
            encode_double_quoted_attribute(class),
            encode_text(&text[boundaries[start]..boundaries[end]])
        );
        cursor = end;
    }
    html.push_str(&encode_text(&text[boundaries[cursor]..]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::langextract::data::Extraction;

    fn document() -> AnnotatedDocument {
        let mut doc = AnnotatedDocument::new("Alice paid <b>$5</b> to Bob.");
        doc.extractions = vec![
            Extraction::new("person", "Alice").with_interval(0, 5),
            Extraction::new("money", "$5").with_interval(14, 16),
            Extraction::new("person", "Bob").with_interval(24, 27),
            Extraction::new("person", "Zed"),
        ];
        doc
    }

    #[test]
    fn test_marks_and_escaping() {
        let html = render_html(&document());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert_eq!(html.matches("<mark ").count(), 3);
        assert!(html.contains(">Alice</mark>"));
        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("unaligned"));
    }

    #[test]
    fn test_legend_has_one_entry_per_class() {
        let html = render_html(&document());
        let legend_start = html.find("<div class=\"lx-legend\">").unwrap();
        let legend_end = html[legend_start..].find("</div>").unwrap() + legend_start;
        let legend = &html[legend_start..legend_end];
        assert_eq!(legend.matches("<span").count(), 2);
    }

    #[test]
    fn test_overlapping_and_out_of_range_spans_are_skipped() {
        let mut doc = AnnotatedDocument::new("New York City");
        doc.extractions = vec![
            Extraction::new("place", "New York City").with_interval(0, 13),
            Extraction::new("place", "York").with_interval(4, 8),
            Extraction::new("place", "beyond").with_interval(20, 26),
        ];
        let html = render_html(&doc);
        assert_eq!(html.matches("<mark ").count(), 1);
        assert_eq!(html.matches("<tr><td>").count(), 3);
    }
}
