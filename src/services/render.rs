use crate::models::DocumentSummary;
use std::fmt::Write;

const PREVIEW_CHARS: usize = 100;

/// Collapses content onto a single line, cut at `max_chars`.
pub fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

/// Indented outline of a summary, one entry per chunk.
pub fn render_outline(summary: &DocumentSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} seções)",
        summary.document_name, summary.total_chunks
    );

    for chunk in &summary.structure {
        let indent = "  ".repeat(chunk.level.saturating_sub(1) as usize);
        let _ = writeln!(out, "{indent}- [{}] {}", chunk.level, chunk.title);
        let _ = writeln!(out, "{indent}    {}", preview(&chunk.content, PREVIEW_CHARS));
    }

    out
}
