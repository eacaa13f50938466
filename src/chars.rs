// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Character classification
//!
//! The parser, the selection snapping and the trimming of input all share
//! these predicates so that word and paragraph boundaries agree everywhere.

use crate::BlockFlags;
use smallvec::SmallVec;
use unicode_bidi::{bidi_class, BidiClass};

/// Introduces (and terminates) an inline control command
pub const TEXT_COMMAND: char = '\u{10}';

/// Emoji presentation selector
pub const EMOJI_POSTFIX: char = '\u{FE0F}';

/// Characters which are dropped from input entirely
pub fn is_bad(c: char) -> bool {
    let u = u32::from(c);
    u == 0
        || (8232..8237).contains(&u)
        || ((65024..65040).contains(&u) && u != 65039)
        || ((127..160).contains(&u) && u != 156)
}

/// Whitespace, as normalised to `' '` by the parser
///
/// With `rich` set, [`TEXT_COMMAND`] is not considered whitespace.
pub fn is_space(c: char, rich: bool) -> bool {
    c.is_whitespace()
        || (u32::from(c) < 32 && !(rich && c == TEXT_COMMAND))
        || matches!(
            c,
            '\u{2029}' | '\u{2028}' | '\u{FFFC}' | '\u{AD}' | '\r' | '\t' | '\u{200B}'
        )
}

/// Paragraph break in input
pub fn is_newline(c: char) -> bool {
    c == '\n' || c == '\u{9C}'
}

/// Non-spacing combining mark
pub fn is_diacritic(c: char) -> bool {
    let u = u32::from(c);
    bidi_class(c) == BidiClass::NSM || u == 1652 || (64606..=64611).contains(&u)
}

/// Characters trimmed from both ends of the input
pub fn is_trimmed(c: char, rich: bool) -> bool {
    (!rich || c != TEXT_COMMAND) && (is_space(c, false) || is_bad(c))
}

/// Word boundaries used by double-click selection
pub fn is_word_separator(c: char) -> bool {
    matches!(
        c,
        ' ' | '\n'
            | '.'
            | ','
            | '?'
            | '!'
            | '@'
            | '#'
            | '$'
            | ':'
            | ';'
            | '-'
            | '<'
            | '>'
            | '['
            | ']'
            | '('
            | ')'
            | '{'
            | '}'
            | '='
            | '/'
            | '+'
            | '%'
            | '&'
            | '^'
            | '*'
            | '\''
            | '"'
            | '`'
            | '~'
            | '|'
    )
}

/// Paragraph boundaries used by triple-click selection
#[inline]
pub fn is_paragraph_separator(c: char) -> bool {
    c == '\n'
}

/// Character-level input policy
///
/// Encodes font-specific workarounds as data: how many combining marks may
/// follow a base character, and which characters are forced into a style of
/// their own (for example a `'~'` rendered from a different face).
#[derive(Clone, Debug, PartialEq)]
pub struct CharPolicy {
    /// Diacritics beyond this many after one base character are dropped
    pub max_diacritics: usize,
    /// Characters which always get these extra block flags
    pub forced_styles: SmallVec<[(char, BlockFlags); 1]>,
}

impl Default for CharPolicy {
    fn default() -> Self {
        CharPolicy {
            max_diacritics: 2,
            forced_styles: SmallVec::new(),
        }
    }
}

impl CharPolicy {
    /// Policy substituting `'~'` from the tilde-fix face
    pub fn with_tilde_fix() -> Self {
        let mut policy = CharPolicy::default();
        policy.forced_styles.push(('~', BlockFlags::TILDE_FIX));
        policy
    }

    /// Flags forced for `c`, if any
    pub fn forced_style(&self, c: char) -> Option<BlockFlags> {
        self.forced_styles
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, flags)| *flags)
    }
}
