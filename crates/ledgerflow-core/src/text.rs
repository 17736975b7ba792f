//! Label measuring and wrapping.
//!
//! Measurements are deterministic (character-width estimates, no font loading) so layouts are
//! reproducible across machines.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use unicode_width::UnicodeWidthChar;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: Option<String>,
    pub font_size: f64,
    pub font_weight: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: None,
            font_size: 12.0,
            font_weight: None,
        }
    }
}

impl TextStyle {
    pub fn sized(font_size: f64) -> Self {
        Self {
            font_size,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub line_count: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

#[derive(Debug, Clone, Default)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub line_height_factor: f64,
}

impl DeterministicTextMeasurer {
    fn char_width_factor(&self) -> f64 {
        if self.char_width_factor == 0.0 {
            0.6
        } else {
            self.char_width_factor
        }
    }

    fn line_height_factor(&self) -> f64 {
        if self.line_height_factor == 0.0 {
            1.2
        } else {
            self.line_height_factor
        }
    }

    /// Width of a single line in em units. Wide (CJK) glyphs count double.
    pub fn line_width_em(&self, line: &str) -> f64 {
        line.chars()
            .map(|ch| ch.width().unwrap_or(0) as f64 * self.char_width_factor())
            .sum()
    }

    /// Splits a line into words and single-space separators, keeping the separators so wrapping can
    /// reassemble the original spacing.
    pub fn split_line_to_words(line: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut cur = String::new();
        for ch in line.chars() {
            if ch == ' ' {
                if !cur.is_empty() {
                    out.push(std::mem::take(&mut cur));
                }
                out.push(" ".to_string());
            } else {
                cur.push(ch);
            }
        }
        if !cur.is_empty() {
            out.push(cur);
        }
        out
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let lines = text.split('\n').collect::<Vec<_>>();
        let font_size = style.font_size.max(1.0);
        let width = lines
            .iter()
            .map(|line| self.line_width_em(line) * font_size)
            .fold(0.0, f64::max);
        let height = lines.len() as f64 * font_size * self.line_height_factor();
        TextMetrics {
            width,
            height,
            line_count: lines.len(),
        }
    }
}

/// Greedy word wrapping against `measurer`. Explicit `\n` breaks are preserved; words longer than
/// the line budget are split by characters.
pub fn wrap_text_lines(
    text: &str,
    measurer: &dyn TextMeasurer,
    style: &TextStyle,
    max_width_px: Option<f64>,
) -> Vec<String> {
    fn wrap_line(
        line: &str,
        measurer: &dyn TextMeasurer,
        style: &TextStyle,
        max_width_px: f64,
    ) -> Vec<String> {
        let mut tokens = VecDeque::from(DeterministicTextMeasurer::split_line_to_words(line));
        let mut out: Vec<String> = Vec::new();
        let mut cur = String::new();

        while let Some(tok) = tokens.pop_front() {
            if cur.is_empty() && tok == " " {
                continue;
            }

            let candidate = format!("{cur}{tok}");
            if measurer.measure(candidate.trim_end(), style).width <= max_width_px {
                cur = candidate;
                continue;
            }

            if !cur.trim().is_empty() {
                out.push(cur.trim_end().to_string());
                cur.clear();
                tokens.push_front(tok);
                continue;
            }

            if tok == " " {
                continue;
            }

            let chars = tok.chars().collect::<Vec<_>>();
            let mut cut = 1usize;
            while cut < chars.len() {
                let head: String = chars[..cut].iter().collect();
                if measurer.measure(&head, style).width > max_width_px {
                    break;
                }
                cut += 1;
            }
            cut = cut.saturating_sub(1).max(1);
            out.push(chars[..cut].iter().collect());
            let tail: String = chars[cut..].iter().collect();
            if !tail.is_empty() {
                tokens.push_front(tail);
            }
        }

        if !cur.trim().is_empty() {
            out.push(cur.trim_end().to_string());
        }
        if out.is_empty() {
            vec![String::new()]
        } else {
            out
        }
    }

    let max_width_px = max_width_px.filter(|w| w.is_finite() && *w > 0.0);
    let mut out = Vec::new();
    for line in text.split('\n') {
        match max_width_px {
            Some(w) => out.extend(wrap_line(line, measurer, style, w)),
            None => out.push(line.to_string()),
        }
    }
    if out.is_empty() {
        vec![String::new()]
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_labels_stay_on_one_line() {
        let m = DeterministicTextMeasurer::default();
        let lines = wrap_text_lines("Revenue", &m, &TextStyle::sized(12.0), Some(140.0));
        assert_eq!(lines, vec!["Revenue"]);
    }

    #[test]
    fn long_labels_break_on_word_boundaries() {
        let m = DeterministicTextMeasurer::default();
        // 12px * 0.6 = 7.2px per char, so 60px fits 8 characters.
        let lines = wrap_text_lines(
            "Selling General and Administrative",
            &m,
            &TextStyle::sized(12.0),
            Some(60.0),
        );
        assert_eq!(lines, vec!["Selling", "General", "and", "Administ", "rative"]);
        for line in &lines {
            assert!(m.measure(line, &TextStyle::sized(12.0)).width <= 60.0);
        }
    }

    #[test]
    fn explicit_breaks_are_kept() {
        let m = DeterministicTextMeasurer::default();
        let metrics = m.measure("Net\nIncome", &TextStyle::sized(10.0));
        assert_eq!(metrics.line_count, 2);
        assert!((metrics.width - 36.0).abs() < 1e-9);
        assert!((metrics.height - 24.0).abs() < 1e-9);
    }
}
