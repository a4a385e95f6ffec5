// Copyright 2025 Memsynth (https://github.com/memsynth)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Box-drawing primitives for generated diagrams.

use crate::text::{center, fit};

/// Corner and edge glyphs of one box style.
#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub top_left: char,
    pub top_right: char,
    pub bottom_left: char,
    pub bottom_right: char,
    pub horizontal: char,
    pub vertical: char,
}

pub const LIGHT: Glyphs = Glyphs {
    top_left: '┌',
    top_right: '┐',
    bottom_left: '└',
    bottom_right: '┘',
    horizontal: '─',
    vertical: '│',
};

pub const ROUNDED: Glyphs = Glyphs {
    top_left: '╭',
    top_right: '╮',
    bottom_left: '╰',
    bottom_right: '╯',
    horizontal: '─',
    vertical: '│',
};

/// Highlight style for chosen options.
pub const DOUBLE: Glyphs = Glyphs {
    top_left: '╔',
    top_right: '╗',
    bottom_left: '╚',
    bottom_right: '╝',
    horizontal: '═',
    vertical: '║',
};

/// Draw `lines` inside a box whose content area is `inner` characters wide.
///
/// The box is `inner + 4` characters wide.
pub fn frame(lines: &[String], inner: usize, glyphs: Glyphs) -> Vec<String> {
    let edge: String = std::iter::repeat(glyphs.horizontal).take(inner + 2).collect();
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(format!("{}{}{}", glyphs.top_left, edge, glyphs.top_right));
    for line in lines {
        out.push(format!(
            "{} {} {}",
            glyphs.vertical,
            fit(line, inner),
            glyphs.vertical
        ));
    }
    out.push(format!("{}{}{}", glyphs.bottom_left, edge, glyphs.bottom_right));
    out
}

/// Center every line of a block within `width`.
pub fn center_block(block: &[String], width: usize) -> Vec<String> {
    block.iter().map(|line| center(line, width)).collect()
}

/// A downward connector centered in `width`.
pub fn arrow_down(width: usize) -> Vec<String> {
    vec![center("│", width), center("▼", width)]
}

/// A line of `width` spaces with glyphs placed at the given columns.
pub fn glyph_line(width: usize, marks: &[(usize, char)]) -> String {
    let mut chars = vec![' '; width];
    for &(col, glyph) in marks {
        if col < width {
            chars[col] = glyph;
        }
    }
    chars.into_iter().collect()
}

/// A horizontal rule from `from` to `to` (inclusive) with end and joint glyphs.
pub fn branch_line(width: usize, from: usize, to: usize, ends: (char, char), joint: (usize, char)) -> String {
    let mut marks: Vec<(usize, char)> = (from + 1..to).map(|c| (c, '─')).collect();
    marks.push((from, ends.0));
    marks.push((to, ends.1));
    marks.push(joint);
    glyph_line(width, &marks)
}

/// Join rendered lines, trimming trailing padding.
pub fn join(lines: &[String]) -> String {
    lines
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_dimensions() {
        let boxed = frame(&["hello".to_string()], 10, LIGHT);
        assert_eq!(boxed.len(), 3);
        assert!(boxed.iter().all(|l| l.chars().count() == 14));
        assert!(boxed[0].starts_with('┌'));
        assert_eq!(boxed[1], "│ hello      │");
    }

    #[test]
    fn test_branch_line() {
        let line = branch_line(9, 1, 7, ('┌', '┐'), (4, '┴'));
        assert_eq!(line, " ┌──┴──┐ ");
    }

    #[test]
    fn test_join_trims_padding() {
        let text = join(&["ab  ".to_string(), " c ".to_string()]);
        assert_eq!(text, "ab\n c");
    }
}
