// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Text object

use crate::conv::{to_u32, to_usize};
use crate::entity::TextWithEntities;
use crate::link::ClickHandlerPtr;
use crate::parser::{self, rich::CustomTags, SKIP_CHAR};
use crate::{Block, BlockKind, Direction, ParseFlags, ParseOptions, Range, TextStyle};
use std::sync::Arc;

/// A parsed rich text
///
/// This is the document type of the library: a text buffer, the [`Block`]s
/// covering it and a table of link handlers. A `Text` is constructed by one
/// of the `set_*` methods and afterwards only modified by the skip-block
/// methods. Layout, painting and hit-testing are computed on demand, see
/// [`Text::draw`] and [`Text::get_state`].
///
/// Cloning copies blocks and shares link handlers.
#[derive(Clone, Debug)]
pub struct Text {
    pub(crate) style: Arc<TextStyle>,
    pub(crate) text: String,
    pub(crate) blocks: Vec<Block>,
    pub(crate) links: Vec<Option<ClickHandlerPtr>>,
    pub(crate) max_width: f32,
    pub(crate) min_height: f32,
    /// Direction of the first paragraph
    pub(crate) start_dir: Direction,
    /// Direction forced by [`ParseOptions::dir`]
    pub(crate) forced_dir: Direction,
}

impl Text {
    /// Construct an empty text
    pub fn new(style: Arc<TextStyle>) -> Self {
        Text {
            style,
            text: String::new(),
            blocks: Vec::new(),
            links: Vec::new(),
            max_width: 0.0,
            min_height: 0.0,
            start_dir: Direction::Auto,
            forced_dir: Direction::Auto,
        }
    }

    /// Construct from plain text
    pub fn with_text(style: Arc<TextStyle>, text: &str, options: &ParseOptions) -> Self {
        let mut result = Text::new(style);
        result.set_text(text, options);
        result
    }

    /// Set plain text
    ///
    /// With [`ParseFlags::LINKS`] the text is scanned for links (and, as
    /// enabled, mentions, hashtags and bot commands). With
    /// [`ParseFlags::RICH_TEXT`] inline commands are interpreted.
    pub fn set_text(&mut self, text: &str, options: &ParseOptions) {
        let source = parser::prepare_plain(text, options);
        self.build(&source, options);
    }

    /// Set text with entities
    pub fn set_marked_text(&mut self, text: TextWithEntities, options: &ParseOptions) {
        let source = parser::prepare_marked(text, options);
        self.build(&source, options);
    }

    /// Set rich text, with `[b]`, `[i]`, `[u]` and `[a href="…"]` tags
    ///
    /// `custom` maps further tag letters to replacement strings.
    pub fn set_rich_text(&mut self, text: &str, options: &ParseOptions, custom: &CustomTags) {
        let expanded = parser::rich::expand(text, custom);
        let mut options = *options;
        options.flags.insert(ParseFlags::RICH_TEXT);
        self.set_text(&expanded, &options);
    }

    fn build(&mut self, source: &TextWithEntities, options: &ParseOptions) {
        let parsed = parser::parse(&self.style, source, options);
        self.text = parsed.text;
        self.blocks = parsed.blocks;
        self.links = parsed.links;
        self.forced_dir = options.dir;
        self.recount_natural_size(true);
    }

    /// Access the style
    #[inline]
    pub fn style(&self) -> &Arc<TextStyle> {
        &self.style
    }

    /// Access the text buffer
    ///
    /// This is the parsed text: trimmed, with normalised whitespace and one
    /// `'_'` per skip block.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the text buffer in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// True if there is nothing to display
    ///
    /// A text consisting only of a skip block is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.first().map_or(true, Block::is_skip)
    }

    /// Access the block list
    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// End of block `index`: the start of the next block or the text end
    pub(crate) fn block_end(&self, index: usize) -> u32 {
        self.blocks
            .get(index + 1)
            .map_or(to_u32(self.text.len()), |b| b.from)
    }

    /// Text range covered by block `index`
    pub fn block_range(&self, index: usize) -> Range {
        let start = self.blocks.get(index).map_or(0, |b| b.from);
        Range {
            start,
            end: self.block_end(index),
        }
    }

    /// Width of the longest line when only paragraph breaks wrap
    #[inline]
    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    /// Height when laid out at [`Self::max_width`]
    #[inline]
    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    /// Resolved direction of the first paragraph
    ///
    /// This is [`Direction::Auto`] if the paragraph has no strong char.
    #[inline]
    pub fn start_dir(&self) -> Direction {
        self.start_dir
    }

    /// Direction of the paragraph following block `index`
    pub(crate) fn paragraph_dir(&self, newline: Option<usize>) -> Direction {
        let dir = match newline.and_then(|i| self.blocks.get(i)) {
            Some(Block {
                kind: BlockKind::Newline { next_dir },
                ..
            }) => *next_dir,
            _ => self.start_dir,
        };
        self.style.resolve(dir)
    }

    /// Access the link table
    #[inline]
    pub fn links(&self) -> &[Option<ClickHandlerPtr>] {
        &self.links
    }

    /// True if the text has any link slot
    #[inline]
    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }

    /// Get the handler of link `index`
    pub fn link(&self, index: u16) -> Option<&ClickHandlerPtr> {
        match self.links.get(usize::from(index)) {
            Some(link) => link.as_ref(),
            None => {
                log::warn!(
                    "Text::link: index {index} exceeds link table of length {}",
                    self.links.len()
                );
                None
            }
        }
    }

    /// Set the handler of link `index`
    ///
    /// Slots exist for each link of the text, including indices reserved by
    /// link commands. Returns false if `index` is out of range.
    pub fn set_link(&mut self, index: u16, handler: Option<ClickHandlerPtr>) -> bool {
        match self.links.get_mut(usize::from(index)) {
            Some(slot) => {
                *slot = handler;
                true
            }
            None => false,
        }
    }

    /// True if the text ends with a skip block
    #[inline]
    pub fn has_skip_block(&self) -> bool {
        self.blocks.last().is_some_and(Block::is_skip)
    }

    /// Set the trailing skip block
    ///
    /// A skip block reserves `width × height` at the end of the text, e.g. for
    /// a timestamp drawn by the caller. Returns false if a skip block of this
    /// size already exists.
    pub fn update_skip_block(&mut self, width: f32, height: f32) -> bool {
        if let Some(last) = self.blocks.last() {
            if let BlockKind::Skip { height: h } = last.kind {
                if last.width == width && h == height {
                    return false;
                }
                self.text.truncate(to_usize(last.from));
                self.blocks.pop();
            }
        }
        let from = self.text.len();
        self.text.push(SKIP_CHAR);
        self.blocks.push(Block::skip(from, width, height, None));
        self.recount_natural_size(false);
        true
    }

    /// Remove the trailing skip block, if any
    ///
    /// Returns true if a block was removed.
    pub fn remove_skip_block(&mut self) -> bool {
        match self.blocks.last() {
            Some(last) if last.is_skip() => {
                self.text.truncate(to_usize(last.from));
                self.blocks.pop();
                self.recount_natural_size(false);
                true
            }
            _ => false,
        }
    }
}
