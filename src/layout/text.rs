use serde::Serialize;

use crate::config::CharWidths;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

pub(crate) fn is_wide_char(ch: char) -> bool {
    ch as u32 > 255
}

/// Rough rendered width: one advance per character, wider for anything
/// outside Latin-1.
pub(crate) fn estimate_text_width(text: &str, widths: &CharWidths) -> f32 {
    text.chars()
        .map(|ch| {
            if ch == ' ' {
                widths.space
            } else if is_wide_char(ch) {
                widths.wide
            } else {
                widths.latin
            }
        })
        .sum()
}

/// Shortens `text` with a trailing ellipsis until it fits `max_width`.
pub(crate) fn fit_text_to_width(text: &str, max_width: f32, widths: &CharWidths) -> String {
    if estimate_text_width(text, widths) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + ELLIPSIS;
        if estimate_text_width(&candidate, widths) <= max_width {
            return candidate;
        }
    }
    ELLIPSIS.to_string()
}

pub(crate) fn contains_persian(text: &str) -> bool {
    text.chars()
        .any(|ch| ('\u{0600}'..='\u{06FF}').contains(&ch))
}

pub(crate) fn text_direction(text: &str) -> TextDirection {
    if contains_persian(text) {
        TextDirection::Rtl
    } else {
        TextDirection::Ltr
    }
}
