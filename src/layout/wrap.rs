use crate::error::{Error, Result};
use crate::fonts::FontEntry;

use super::PT_TO_MM;

/// One output line of a wrapped text block. Widths are millimetres.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct WrappedLine {
    pub(crate) text: String,
    pub(crate) width: f32,
}

impl WrappedLine {
    fn empty() -> Self {
        Self {
            text: String::new(),
            width: 0.0,
        }
    }
}

struct LineBuilder {
    lines: Vec<WrappedLine>,
    current: String,
    current_w: f32,
}

impl LineBuilder {
    fn finish_line(&mut self) {
        self.lines.push(WrappedLine {
            text: std::mem::take(&mut self.current),
            width: self.current_w,
        });
        self.current_w = 0.0;
    }

    fn push_word(&mut self, word: &str, width: f32, space_w: f32) {
        if !self.current.is_empty() {
            self.current.push(' ');
            self.current_w += space_w;
        }
        self.current.push_str(word);
        self.current_w += width;
    }
}

/// Word-wrap `text` at `font_size` points so that no line is wider than `max_width` mm.
///
/// Newlines are hard breaks and each produces a line even when empty. Runs of other
/// whitespace collapse to a single space. A word wider than `max_width` on its own is
/// broken between characters. Empty input yields a single empty line.
pub(crate) fn wrap_text(
    text: &str,
    font: &FontEntry,
    font_size: f32,
    max_width: f32,
) -> Result<Vec<WrappedLine>> {
    let space_w = font.space_width(font_size)? * PT_TO_MM;
    let mut builder = LineBuilder {
        lines: Vec::new(),
        current: String::new(),
        current_w: 0.0,
    };

    for hard_line in text.split('\n') {
        for word in hard_line.split_whitespace() {
            let ww = font.text_width(word, font_size)? * PT_TO_MM;
            let proposed = if builder.current.is_empty() {
                ww
            } else {
                builder.current_w + space_w + ww
            };
            if proposed <= max_width {
                builder.push_word(word, ww, space_w);
                continue;
            }
            if !builder.current.is_empty() {
                builder.finish_line();
            }
            if ww <= max_width {
                builder.push_word(word, ww, space_w);
            } else {
                break_long_word(&mut builder, word, font, font_size, max_width)?;
            }
        }
        builder.finish_line();
    }

    if builder.lines.is_empty() {
        builder.lines.push(WrappedLine::empty());
    }
    Ok(builder.lines)
}

/// Spread a word over as many lines as it needs. The last fragment stays open so the next
/// word can join it.
fn break_long_word(
    builder: &mut LineBuilder,
    word: &str,
    font: &FontEntry,
    font_size: f32,
    max_width: f32,
) -> Result<()> {
    for ch in word.chars() {
        let mut buf = [0u8; 4];
        let cw = font.text_width(ch.encode_utf8(&mut buf), font_size)? * PT_TO_MM;
        if cw > max_width {
            return Err(Error::InvalidGeometry(format!(
                "character {ch:?} at {font_size}pt is wider than the {max_width:.1}mm content width"
            )));
        }
        if builder.current_w + cw > max_width {
            builder.finish_line();
        }
        builder.current.push(ch);
        builder.current_w += cw;
    }
    Ok(())
}
