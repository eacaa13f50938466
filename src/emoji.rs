// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Emoji sequence matching
//!
//! The parser asks an [`EmojiSource`] at every char whether an emoji sequence
//! starts there. Bitmaps are not our concern: an emoji is identified by an
//! opaque [`EmojiId`] handed back to the painter.

use crate::chars::EMOJI_POSTFIX;
use crate::conv::to_u32;
use std::fmt::Debug;

/// Opaque emoji identifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmojiId(pub u32);

/// A successful match
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmojiMatch {
    pub id: EmojiId,
    /// Length of the matched sequence, in bytes
    pub len: u32,
    /// If true, the sequence should be stored with an appended `U+FE0F`
    pub postfix: bool,
}

/// A source of emoji sequences
pub trait EmojiSource: Debug + Send + Sync {
    /// Match the longest emoji sequence at the start of `text`
    fn find(&self, text: &str) -> Option<EmojiMatch>;
}

/// Matches nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEmoji;

impl EmojiSource for NoEmoji {
    fn find(&self, _: &str) -> Option<EmojiMatch> {
        None
    }
}

const ZWJ: char = '\u{200D}';
const KEYCAP: char = '\u{20E3}';

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_skin_tone(c: char) -> bool {
    ('\u{1F3FB}'..='\u{1F3FF}').contains(&c)
}

/// Chars with emoji presentation by default
fn is_emoji_presentation(c: char) -> bool {
    let u = u32::from(c);
    (0x1F000..=0x1FAFF).contains(&u) && !is_regional_indicator(c) && !is_skin_tone(c)
}

/// Chars which are emoji only when followed by `U+FE0F`
fn is_text_default(c: char) -> bool {
    let u = u32::from(c);
    matches!(u, 0x00A9 | 0x00AE | 0x203C | 0x2049 | 0x2122 | 0x2139)
        || (0x2194..=0x21AA).contains(&u)
        || (0x2300..=0x23FF).contains(&u)
        || (0x25AA..=0x27BF).contains(&u)
        || (0x2934..=0x2935).contains(&u)
        || (0x2B05..=0x2B55).contains(&u)
        || matches!(u, 0x3030 | 0x303D | 0x3297 | 0x3299)
}

/// Built-in sequence matcher
///
/// Recognises flags (regional indicator pairs), keycaps, emoji-presentation
/// chars with optional skin tone modifiers and `ZWJ` continuations, and
/// text-default chars followed by `U+FE0F`. The identifier is the first
/// scalar value of the sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinEmoji;

impl BuiltinEmoji {
    /// Extend a matched base at `pos` with modifiers and `ZWJ` sequences
    fn extend(text: &str, mut pos: usize) -> usize {
        loop {
            let mut chars = text[pos..].chars();
            match chars.next() {
                Some(c) if c == EMOJI_POSTFIX || is_skin_tone(c) => pos += c.len_utf8(),
                Some(ZWJ) => match chars.next() {
                    Some(c) if is_emoji_presentation(c) || is_text_default(c) => {
                        pos += ZWJ.len_utf8() + c.len_utf8();
                    }
                    _ => return pos,
                },
                _ => return pos,
            }
        }
    }
}

impl EmojiSource for BuiltinEmoji {
    fn find(&self, text: &str) -> Option<EmojiMatch> {
        let mut chars = text.chars();
        let first = chars.next()?;
        let id = EmojiId(u32::from(first));
        let second = chars.next();
        let after_first = first.len_utf8();

        if is_regional_indicator(first) {
            let second = second.filter(|c| is_regional_indicator(*c))?;
            let len = after_first + second.len_utf8();
            return Some(EmojiMatch {
                id,
                len: to_u32(len),
                postfix: false,
            });
        }

        if first.is_ascii_digit() || first == '#' || first == '*' {
            return match (second, chars.next()) {
                (Some(EMOJI_POSTFIX), Some(KEYCAP)) => Some(EmojiMatch {
                    id,
                    len: to_u32(after_first + EMOJI_POSTFIX.len_utf8() + KEYCAP.len_utf8()),
                    postfix: false,
                }),
                (Some(KEYCAP), _) => Some(EmojiMatch {
                    id,
                    len: to_u32(after_first + KEYCAP.len_utf8()),
                    postfix: true,
                }),
                _ => None,
            };
        }

        if is_emoji_presentation(first) {
            let len = Self::extend(text, after_first);
            return Some(EmojiMatch {
                id,
                len: to_u32(len),
                postfix: false,
            });
        }

        if is_text_default(first) && second == Some(EMOJI_POSTFIX) {
            let len = Self::extend(text, after_first);
            return Some(EmojiMatch {
                id,
                len: to_u32(len),
                postfix: false,
            });
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(s: &str) -> Option<EmojiMatch> {
        BuiltinEmoji.find(s)
    }

    #[test]
    fn plain_text() {
        assert_eq!(find("abc"), None);
        assert_eq!(find("1"), None);
        assert_eq!(find("\u{2764}"), None);
        assert_eq!(find(""), None);
    }

    #[test]
    fn sequences() {
        let m = find("\u{1F600}x").unwrap();
        assert_eq!(m.len, 4);
        assert!(!m.postfix);

        let m = find("\u{1F44D}\u{1F3FD}!").unwrap();
        assert_eq!(m.len, 8);

        // man + ZWJ + laptop
        let m = find("\u{1F468}\u{200D}\u{1F4BB}").unwrap();
        assert_eq!(m.len, 11);

        let m = find("\u{2764}\u{FE0F}").unwrap();
        assert_eq!(m.len, 6);

        let m = find("\u{1F1FA}\u{1F1F8}").unwrap();
        assert_eq!(m.len, 8);
        assert_eq!(find("\u{1F1FA}a"), None);
    }

    #[test]
    fn keycap_postfix() {
        let m = find("1\u{20E3}").unwrap();
        assert_eq!(m.len, 4);
        assert!(m.postfix);

        let m = find("#\u{FE0F}\u{20E3}").unwrap();
        assert_eq!(m.len, 7);
        assert!(!m.postfix);
    }
}
