// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Selections

use crate::chars;
use crate::conv::{to_u32, to_usize};
use crate::Text;

/// A selected range of the text buffer, `from..to` in bytes
///
/// `to` may exceed the text length; it is clamped where used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextSelection {
    pub from: u32,
    pub to: u32,
}

impl TextSelection {
    /// Selects everything
    pub const ALL: TextSelection = TextSelection {
        from: 0,
        to: u32::MAX,
    };

    #[inline]
    pub const fn new(from: u32, to: u32) -> Self {
        TextSelection { from, to }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.from >= self.to
    }

    /// True if `[start, end)` intersects the selection
    #[inline]
    pub(crate) fn intersects(self, start: u32, end: u32) -> bool {
        start < self.to && end > self.from
    }
}

/// Granularity of [`Text::adjust_selection`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelectType {
    #[default]
    Letters,
    Words,
    Paragraphs,
}

impl Text {
    /// Expand `selection` to word or paragraph boundaries
    ///
    /// The start moves back to just after the preceding separator unless it
    /// is itself on a separator. The end moves forward to the next separator;
    /// if it is on a separator that separator is included.
    pub fn adjust_selection(&self, selection: TextSelection, kind: SelectType) -> TextSelection {
        let text = self.text.as_str();
        let len = text.len();
        let mut from = to_usize(selection.from);
        let mut to = to_usize(selection.to);
        if from >= len || from > to || !text.is_char_boundary(from) {
            return selection;
        }
        to = to.min(len);
        while !text.is_char_boundary(to) {
            to += 1;
        }

        let is_separator: fn(char) -> bool = match kind {
            SelectType::Letters => return TextSelection::new(selection.from, to_u32(to)),
            SelectType::Words => chars::is_word_separator,
            SelectType::Paragraphs => chars::is_paragraph_separator,
        };

        if !text[from..].chars().next().is_some_and(is_separator) {
            for (index, c) in text[..from].char_indices().rev() {
                if is_separator(c) {
                    break;
                }
                from = index;
            }
        }
        if let Some(c) = text[to..].chars().next() {
            if is_separator(c) {
                to += c.len_utf8();
            } else {
                to = text[to..]
                    .char_indices()
                    .find(|(_, c)| is_separator(*c))
                    .map_or(len, |(index, _)| to + index);
            }
        }
        TextSelection::new(to_u32(from), to_u32(to))
    }
}
