//! Greedy word wrap for multi-line fields.

use super::canvas::OverlayDocument;
use super::font::{width_of_text_at_size, FontWeight};
use super::sanitize::sanitize_for_win_ansi;
use super::RenderError;

/// Breaks text into lines no wider than `max_width`.
///
/// Explicit newlines start a new block; an empty block yields an empty
/// line, which only consumes vertical space. Words are packed greedily and
/// a word wider than `max_width` occupies a line on its own.
pub fn wrap_lines(text: &str, size: f32, weight: FontWeight, max_width: f32) -> Vec<String> {
    let clean = sanitize_for_win_ansi(text);
    let mut lines = Vec::new();

    for block in clean.split('\n') {
        let mut words = block.split_whitespace().peekable();
        if words.peek().is_none() {
            lines.push(String::new());
            continue;
        }

        let mut line = String::new();
        for word in words {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", line, word);
            if width_of_text_at_size(&candidate, size, weight) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            }
        }
        lines.push(line);
    }

    lines
}

/// Draws wrapped text starting at baseline `y` and returns the cursor one
/// line below the last line drawn.
#[allow(clippy::too_many_arguments)]
pub fn draw_wrapped(
    canvas: &mut OverlayDocument,
    page: usize,
    text: &str,
    x: f32,
    y: f32,
    size: f32,
    weight: FontWeight,
    max_width: f32,
    line_height: f32,
) -> Result<f32, RenderError> {
    let mut cursor = y;
    for line in wrap_lines(text, size, weight, max_width) {
        if !line.is_empty() {
            canvas.draw_text(page, &line, x, cursor, size, weight)?;
        }
        cursor -= line_height;
    }
    Ok(cursor)
}
