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

//! Small text helpers shared by the extractors.

/// Truncate to at most `max` characters, appending "..." when cut.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str("...");
    out
}

/// Take the first `max` characters without any ellipsis.
pub fn prefix_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Split text into trimmed, non-empty sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace, or at a
/// newline.
pub fn sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            push_sentence(&mut out, &mut current);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |n| n.is_whitespace()) {
            push_sentence(&mut out, &mut current);
        }
    }
    push_sentence(&mut out, &mut current);
    out
}

fn push_sentence(out: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
    current.clear();
}

/// Cut over-width text to at most `width` characters.
fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut = truncate_chars(text, width);
    if cut.chars().count() > width {
        prefix_chars(&cut, width)
    } else {
        cut
    }
}

/// Pad or cut `text` to exactly `width` characters.
pub fn fit(text: &str, width: usize) -> String {
    let mut out = clip(text, width);
    let count = out.chars().count();
    out.extend(std::iter::repeat(' ').take(width - count));
    out
}

/// Center `text` in `width` characters.
pub fn center(text: &str, width: usize) -> String {
    let text = clip(text, width);
    let count = text.chars().count();
    let left = (width - count) / 2;
    let right = width - count - left;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

/// Word-wrap text into lines of at most `width` characters.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let word = if word.chars().count() > width {
            truncate_chars(word, width)
        } else {
            word.to_string()
        };
        let needed = if line.is_empty() {
            word.chars().count()
        } else {
            line.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghijkl", 8), "abcde...");
        assert_eq!(truncate_chars("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_sentences() {
        let s = sentences("First one. Second one! v1.2 stays\nThird line");
        assert_eq!(s, vec!["First one.", "Second one!", "v1.2 stays", "Third line"]);
    }

    #[test]
    fn test_fit_and_center() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("abcdefgh", 6).chars().count(), 6);
        assert_eq!(center("ab", 6), "  ab  ");
        assert_eq!(center("abc", 6).chars().count(), 6);
    }

    #[test]
    fn test_fit_keeps_width_for_padded_text() {
        assert_eq!(fit("   abcdefgh   ", 10), "abcdefgh  ");
        assert_eq!(fit("abcdef", 2), "..");
        assert_eq!(center("   abcdefgh   ", 10).chars().count(), 10);
        assert_eq!(center("abcdef", 2).chars().count(), 2);
    }

    #[test]
    fn test_wrap() {
        let lines = wrap("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 9));
    }
}
