// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Text style configuration

use crate::chars::CharPolicy;
use crate::emoji::{BuiltinEmoji, EmojiSource};
use crate::link::{DefaultLinkFactory, LinkFactory};
use crate::shaper::Shaper;
use crate::{Block, BlockFlags, BlockKind, Direction};
use std::sync::Arc;

/// The ellipsis appended to elided lines
pub const ELLIPSIS: &str = "...";

/// Shared style and environment of a [`crate::Text`]
///
/// A style is shared (via `Arc`) by every text using it. Changing a style
/// does not affect texts already parsed with it: block metrics are computed
/// at parse time.
#[derive(Clone, Debug)]
pub struct TextStyle {
    pub shaper: Arc<dyn Shaper>,
    pub emoji: Arc<dyn EmojiSource>,
    pub links: Arc<dyn LinkFactory>,
    /// Line height; if less than the font height, the font height is used
    pub line_height: f32,
    /// Words wider than this may be broken between graphemes
    pub min_resize_width: f32,
    pub emoji_size: f32,
    /// Horizontal padding either side of an emoji
    pub emoji_padding: f32,
    /// URLs longer than this many chars are displayed shortened
    pub link_crop_limit: Option<usize>,
    /// Direction used for paragraphs without strong characters
    pub default_direction: Direction,
    pub policy: CharPolicy,
}

impl TextStyle {
    /// Construct with the given shaper and default settings
    pub fn new(shaper: Arc<dyn Shaper>) -> Self {
        let height = shaper.metrics().height;
        TextStyle {
            shaper,
            emoji: Arc::new(BuiltinEmoji),
            links: Arc::new(DefaultLinkFactory::default()),
            line_height: 0.0,
            min_resize_width: 0.0,
            emoji_size: (height - 2.0).max(0.0),
            emoji_padding: 1.0,
            link_crop_limit: None,
            default_direction: Direction::Ltr,
            policy: CharPolicy::default(),
        }
    }

    /// Height of one line of the font
    #[inline]
    pub fn font_height(&self) -> f32 {
        self.shaper.metrics().height
    }

    #[inline]
    pub fn ascent(&self) -> f32 {
        self.shaper.metrics().ascent
    }

    /// Height of a line of text: the larger of `line_height` and the font height
    #[inline]
    pub fn row_height(&self) -> f32 {
        self.line_height.max(self.font_height())
    }

    /// Height of a line containing only `block`
    pub fn block_height(&self, block: &Block) -> f32 {
        match block.kind {
            BlockKind::Skip { height } => height,
            _ => self.row_height(),
        }
    }

    /// Advance of [`ELLIPSIS`]
    pub fn ellipsis_width(&self) -> f32 {
        self.shaper.width(ELLIPSIS, BlockFlags::empty())
    }

    /// Resolve [`Direction::Auto`] against the default direction
    #[inline]
    pub fn resolve(&self, dir: Direction) -> Direction {
        match dir.or(self.default_direction) {
            Direction::Auto => Direction::Ltr,
            dir => dir,
        }
    }
}
