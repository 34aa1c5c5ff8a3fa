//! HTML rendering of block text with highlighted spans.

use std::collections::BTreeSet;

use gst_indexer_shared::Span;
use tracing::debug;

use crate::processor::flattener::normalize_whitespace;

/// CSS class put on highlighted regions.
pub const HIGHLIGHT_CLASS: &str = "span_highlight";

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `text` as HTML, wrapping the regions covered by partial-passage spans.
///
/// Offsets are in characters. Where spans overlap, the text is cut at every
/// span boundary and each piece is wrapped once with the labels of all spans
/// covering it, so tags never interleave. Spans without a valid range are
/// left out.
pub fn highlight_html(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let ranges: Vec<(usize, usize, &str)> = spans
        .iter()
        .filter(|s| !s.is_full_passage())
        .filter_map(|s| match (s.start_idx, s.end_idx) {
            (Some(start), Some(end)) if start < end && end <= len => {
                Some((start, end, s.span_type.as_str()))
            }
            (start, end) => {
                debug!(
                    span_id = %s.id,
                    start = ?start,
                    end = ?end,
                    text_len = len,
                    "Span range outside block text, not highlighted"
                );
                None
            }
        })
        .collect();

    if ranges.is_empty() {
        return normalize_whitespace(&escape_html(text));
    }

    let mut boundaries: BTreeSet<usize> = BTreeSet::from([0, len]);
    for &(start, end, _) in &ranges {
        boundaries.insert(start);
        boundaries.insert(end);
    }
    let boundaries: Vec<usize> = boundaries.into_iter().collect();

    let mut html = String::with_capacity(text.len() * 2);
    for window in boundaries.windows(2) {
        let (from, to) = (window[0], window[1]);
        let piece: String = chars[from..to].iter().collect();

        let labels: BTreeSet<&str> = ranges
            .iter()
            .filter(|&&(start, end, _)| start <= from && to <= end)
            .map(|&(_, _, label)| label)
            .collect();

        if labels.is_empty() {
            html.push_str(&escape_html(&piece));
        } else {
            let types = labels.into_iter().collect::<Vec<_>>().join(";");
            html.push_str(&format!(
                "<span class=\"{}\" data-span-types=\"{}\">{}</span>",
                HIGHLIGHT_CLASS,
                escape_html(&types),
                escape_html(&piece)
            ));
        }
    }

    normalize_whitespace(&html)
}
