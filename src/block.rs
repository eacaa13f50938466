// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Blocks: styled, contiguous runs of the text buffer

use crate::conv::{to_u32, to_usize};
use crate::emoji::EmojiId;
use crate::{Direction, TextStyle};
use unicode_segmentation::UnicodeSegmentation;
use xi_unicode::LineBreakIterator;

bitflags::bitflags! {
    /// Style flags of a block
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct BlockFlags: u8 {
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        /// Forced substitute style (see [`crate::chars::CharPolicy`])
        const TILDE_FIX = 1 << 3;
        const SEMIBOLD = 1 << 4;
        const CODE = 1 << 5;
        const PRE = 1 << 6;
        const STRIKE_OUT = 1 << 7;
    }
}

impl BlockFlags {
    /// True if rendered in the monospace face
    #[inline]
    pub fn is_mono(self) -> bool {
        self.intersects(BlockFlags::CODE | BlockFlags::PRE)
    }
}

/// A unit of line breaking within a text block
///
/// A word covers its text and any spaces following it; the advance of those
/// spaces is the word's `rpadding`. Words wider than the style's
/// `min_resize_width` are split into one piece per grapheme so that they may
/// be broken anywhere; all pieces but the last have `ends_word == false`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Word {
    pub from: u32,
    pub width: f32,
    pub rbearing: f32,
    pub rpadding: f32,
    pub ends_word: bool,
}

/// Variant payload of a [`Block`]
#[derive(Clone, Debug, PartialEq)]
pub enum BlockKind {
    /// Shaped text, pre-split into words
    ///
    /// The word list is empty if the block contains only spaces.
    Text { words: Vec<Word> },
    /// A paragraph separator
    Newline {
        /// Resolved direction of the following paragraph
        next_dir: Direction,
    },
    /// An emoji sequence (plus any trailing spaces)
    Emoji { emoji: EmojiId },
    /// Reserved space of explicit size
    Skip { height: f32 },
}

/// A styled run of text
///
/// The length of a block is implied by the start of the next block (or the
/// end of the text).
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub from: u32,
    pub flags: BlockFlags,
    /// Index into the owning text's link table
    pub link: Option<u16>,
    /// Advance, excluding right padding
    pub width: f32,
    /// Right bearing (`<= 0`)
    pub rbearing: f32,
    /// Advance of trailing spaces
    pub rpadding: f32,
    pub kind: BlockKind,
}

impl Block {
    /// Construct a text block over `text[from..to]`
    pub fn text(
        style: &TextStyle,
        text: &str,
        from: usize,
        to: usize,
        flags: BlockFlags,
        link: Option<u16>,
    ) -> Block {
        let mut parser = WordParser {
            style,
            text,
            flags,
            words: Vec::new(),
            lead: None,
        };
        parser.parse(from, to);
        let words = parser.words;

        let mut block = Block {
            from: to_u32(from),
            flags,
            link,
            width: 0.0,
            rbearing: 0.0,
            rpadding: 0.0,
            kind: BlockKind::Text { words: vec![] },
        };
        if let Some(last) = words.last() {
            block.width = words.iter().map(|w| w.width + w.rpadding).sum::<f32>() - last.rpadding;
            block.rbearing = last.rbearing;
            block.rpadding = last.rpadding;
        } else if let Some(lead) = parser.lead {
            block.rpadding = lead.1;
        }
        block.kind = BlockKind::Text { words };
        block
    }

    /// Construct a zero-width paragraph separator
    pub fn newline(from: usize, flags: BlockFlags, link: Option<u16>) -> Block {
        Block {
            from: to_u32(from),
            flags,
            link,
            width: 0.0,
            rbearing: 0.0,
            rpadding: 0.0,
            kind: BlockKind::Newline {
                next_dir: Direction::Auto,
            },
        }
    }

    /// Construct an emoji block over `text[from..to]`
    ///
    /// Any spaces at the end of the range become right padding.
    pub fn emoji(
        style: &TextStyle,
        text: &str,
        from: usize,
        to: usize,
        emoji: EmojiId,
        flags: BlockFlags,
        link: Option<u16>,
    ) -> Block {
        let slice = &text[from..to];
        let spaces = slice.len() - slice.trim_end_matches(' ').len();
        let rpadding = if spaces > 0 {
            style.shaper.width(&slice[slice.len() - spaces..], flags)
        } else {
            0.0
        };
        Block {
            from: to_u32(from),
            flags,
            link,
            width: style.emoji_size + 2.0 * style.emoji_padding,
            rbearing: 0.0,
            rpadding,
            kind: BlockKind::Emoji { emoji },
        }
    }

    /// Construct a block reserving `width × height`
    pub fn skip(from: usize, width: f32, height: f32, link: Option<u16>) -> Block {
        Block {
            from: to_u32(from),
            flags: BlockFlags::empty(),
            link,
            width,
            rbearing: 0.0,
            rpadding: 0.0,
            kind: BlockKind::Skip { height },
        }
    }

    /// A zero-length text block at `from`, with the style of `self`
    pub(crate) fn stand_in(&self, from: u32) -> Block {
        Block {
            from,
            flags: self.flags,
            link: self.link,
            width: 0.0,
            rbearing: 0.0,
            rpadding: 0.0,
            kind: BlockKind::Text { words: vec![] },
        }
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, BlockKind::Text { .. })
    }

    #[inline]
    pub fn is_newline(&self) -> bool {
        matches!(self.kind, BlockKind::Newline { .. })
    }

    #[inline]
    pub fn is_emoji(&self) -> bool {
        matches!(self.kind, BlockKind::Emoji { .. })
    }

    #[inline]
    pub fn is_skip(&self) -> bool {
        matches!(self.kind, BlockKind::Skip { .. })
    }

    /// True for blocks laid out as one opaque object (emoji and skip)
    #[inline]
    pub fn is_object(&self) -> bool {
        self.is_emoji() || self.is_skip()
    }

    /// Words of a text block (empty for other kinds)
    pub fn words(&self) -> &[Word] {
        match &self.kind {
            BlockKind::Text { words } => words,
            _ => &[],
        }
    }
}

struct WordParser<'a> {
    style: &'a TextStyle,
    text: &'a str,
    flags: BlockFlags,
    words: Vec<Word>,
    /// Spaces before the first word: start and advance
    lead: Option<(usize, f32)>,
}

impl<'a> WordParser<'a> {
    fn parse(&mut self, from: usize, to: usize) {
        let slice = &self.text[from..to];
        let mut start = 0;
        for (pos, _) in LineBreakIterator::new(slice) {
            if pos <= start {
                continue;
            }
            let segment = &slice[start..pos];
            let word_len = segment.trim_end_matches(' ').len();
            if word_len > 0 {
                self.push_word(from + start, from + start + word_len);
            }
            if word_len < segment.len() {
                let spaces = self.style.shaper.width(&segment[word_len..], self.flags);
                self.add_spaces(from + start + word_len, spaces);
            }
            start = pos;
        }
    }

    fn add_spaces(&mut self, at: usize, width: f32) {
        if let Some(word) = self.words.last_mut() {
            word.rpadding += width;
        } else {
            let lead = self.lead.get_or_insert((at, 0.0));
            lead.1 += width;
        }
    }

    fn piece(&self, from: usize, to: usize, ends_word: bool) -> Word {
        let run = self
            .style
            .shaper
            .shape(&self.text[from..to], self.flags, false);
        Word {
            from: to_u32(from),
            width: run.advance,
            rbearing: run.rbearing.min(0.0),
            rpadding: 0.0,
            ends_word,
        }
    }

    fn push_word(&mut self, from: usize, to: usize) {
        if self.words.is_empty() {
            if let Some((at, width)) = self.lead {
                self.words.push(Word {
                    from: to_u32(at),
                    width: 0.0,
                    rbearing: 0.0,
                    rpadding: width,
                    ends_word: true,
                });
            }
        }

        let word = self.piece(from, to, true);
        if word.width <= self.style.min_resize_width {
            self.words.push(word);
            return;
        }

        // Too wide: allow breaking at grapheme boundaries
        let slice = &self.text[from..to];
        let run = self.style.shaper.shape(slice, self.flags, false);
        let prefix_width = |end: usize| -> f32 {
            run.glyphs
                .iter()
                .filter(|g| to_usize(g.index) < end)
                .map(|g| g.advance)
                .sum()
        };

        let mut start = 0;
        let mut each_grapheme = false;
        let mut last_boundary = None;
        let boundaries: Vec<usize> = slice
            .grapheme_indices(true)
            .skip(1)
            .map(|(index, _)| index)
            .collect();
        for boundary in boundaries {
            if !each_grapheme
                && prefix_width(boundary) - prefix_width(start) > self.style.min_resize_width
            {
                if let Some(last) = last_boundary {
                    self.words.push(self.piece(from + start, from + last, false));
                    start = last;
                }
                each_grapheme = true;
            }
            if each_grapheme {
                self.words
                    .push(self.piece(from + start, from + boundary, false));
                start = boundary;
            } else {
                last_boundary = Some(boundary);
            }
        }
        self.words.push(self.piece(from + start, to, true));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaper::MonoShaper;
    use std::sync::Arc;

    fn style(min_resize_width: f32) -> TextStyle {
        let mut style = TextStyle::new(Arc::new(MonoShaper::new(10.0, 20.0)));
        style.min_resize_width = min_resize_width;
        style
    }

    #[test]
    fn words_and_padding() {
        let style = style(1000.0);
        let text = "aaaa bb  c";
        let block = Block::text(&style, text, 0, text.len(), BlockFlags::empty(), None);
        let words = block.words();
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].from, 0);
        assert_eq!(words[0].width, 40.0);
        assert_eq!(words[0].rpadding, 10.0);
        assert_eq!(words[1].from, 5);
        assert_eq!(words[1].rpadding, 20.0);
        assert_eq!(words[2].from, 9);
        assert_eq!(block.width, 100.0);
        assert_eq!(block.rpadding, 0.0);
    }

    #[test]
    fn trailing_spaces() {
        let style = style(1000.0);
        let text = "ab  ";
        let block = Block::text(&style, text, 0, text.len(), BlockFlags::empty(), None);
        assert_eq!(block.width, 20.0);
        assert_eq!(block.rpadding, 20.0);

        let text = "   ";
        let block = Block::text(&style, text, 0, text.len(), BlockFlags::empty(), None);
        assert!(block.words().is_empty());
        assert_eq!(block.width, 0.0);
        assert_eq!(block.rpadding, 30.0);
    }

    #[test]
    fn long_word_pieces() {
        let style = style(25.0);
        let text = "abcdef";
        let block = Block::text(&style, text, 0, text.len(), BlockFlags::empty(), None);
        let words = block.words();
        // "ab" fits; then one piece per grapheme, the last ending the word
        let froms: Vec<u32> = words.iter().map(|w| w.from).collect();
        assert_eq!(froms, vec![0, 2, 3, 4, 5]);
        assert!(words[..4].iter().all(|w| !w.ends_word));
        assert!(words[4].ends_word);
        assert_eq!(block.width, 60.0);
    }

    #[test]
    fn objects() {
        let style = style(0.0);
        let block = Block::skip(0, 30.0, 40.0, None);
        assert!(block.is_skip() && block.is_object());
        assert_eq!(style.block_height(&block), 40.0);

        let text = "\u{1F600}  ";
        let block = Block::emoji(
            &style,
            text,
            0,
            text.len(),
            EmojiId(1),
            BlockFlags::empty(),
            None,
        );
        assert_eq!(block.width, style.emoji_size + 2.0 * style.emoji_padding);
        assert_eq!(block.rpadding, 20.0);
    }
}
