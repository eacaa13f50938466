// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Parse options

use crate::Direction;

bitflags::bitflags! {
    /// Parser feature flags
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ParseFlags: u8 {
        /// Link entities are honoured; plain text is scanned for URLs
        const LINKS = 1 << 0;
        /// Line breaks create paragraphs (otherwise they become spaces)
        const MULTILINE = 1 << 1;
        /// Inline control commands are interpreted
        const RICH_TEXT = 1 << 2;
        const MENTIONS = 1 << 3;
        const HASHTAGS = 1 << 4;
        const BOT_COMMANDS = 1 << 5;
        /// Formatting entities (bold, italic, code, ...) are honoured
        const MARKDOWN = 1 << 6;
    }
}

/// Options controlling the parser
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseOptions {
    pub flags: ParseFlags,
    /// Width budget: with `max_h`, parsing stops once the text cannot be
    /// shown within `max_h` at width `max_w`
    pub max_w: f32,
    pub max_h: f32,
    /// Forced direction of all paragraphs; `Auto` detects per paragraph
    pub dir: Direction,
}

impl ParseOptions {
    /// Construct from flags, without a width budget
    pub const fn new(flags: ParseFlags) -> Self {
        ParseOptions {
            flags,
            max_w: 0.0,
            max_h: 0.0,
            dir: Direction::Auto,
        }
    }

    /// Set the width budget
    pub fn with_budget(mut self, max_w: f32, max_h: f32) -> Self {
        self.max_w = max_w;
        self.max_h = max_h;
        self
    }

    /// Force a direction
    pub fn with_dir(mut self, dir: Direction) -> Self {
        self.dir = dir;
        self
    }

    /// The width after which parsing stops, if any
    pub(crate) fn stop_after_width(&self, font_height: f32) -> Option<f32> {
        (self.max_w > 0.0 && self.max_h > 0.0 && font_height > 0.0)
            .then(|| ((self.max_h / font_height).floor() + 1.0) * self.max_w)
    }
}

/// Links and paragraphs
pub const DEFAULT_OPTIONS: ParseOptions =
    ParseOptions::new(ParseFlags::LINKS.union(ParseFlags::MULTILINE));

/// Paragraphs only
pub const PLAIN_OPTIONS: ParseOptions = ParseOptions::new(ParseFlags::MULTILINE);

/// Everything a chat message may contain
pub const MESSAGE_OPTIONS: ParseOptions = ParseOptions::new(
    ParseFlags::LINKS
        .union(ParseFlags::MULTILINE)
        .union(ParseFlags::MENTIONS)
        .union(ParseFlags::HASHTAGS)
        .union(ParseFlags::BOT_COMMANDS)
        .union(ParseFlags::MARKDOWN),
);
