// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Painter interface

use crate::emoji::EmojiId;
use crate::link::LinkHighlight;
use crate::shaper::GlyphRun;
use crate::{BlockFlags, Rect, Vec2};

/// Style of a painted item
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pen {
    pub flags: BlockFlags,
    /// Link index, if the item is part of a link
    pub link: Option<u16>,
    pub highlight: LinkHighlight,
}

/// A paint target
///
/// [`crate::Text::draw`] calls these methods in visual order, left to right
/// within each line. Coordinates are absolute.
pub trait Painter {
    /// Current clip rectangle
    ///
    /// Lines entirely outside the clip rectangle are skipped.
    fn clip(&self) -> Option<Rect> {
        None
    }

    /// Fill the background of selected content
    fn fill_selection(&mut self, rect: Rect);

    /// Draw a run of glyphs
    ///
    /// `baseline` is the left end of the baseline. Glyphs are in logical
    /// order; if `run.rtl` they are to be placed right-to-left. `selected`
    /// is the horizontal extent, if any, to be drawn with the selected pen.
    fn draw_glyphs(
        &mut self,
        baseline: Vec2,
        text: &str,
        run: &GlyphRun,
        pen: Pen,
        selected: Option<(f32, f32)>,
    );

    /// Draw an emoji of `size × size` with top-left corner `pos`
    fn draw_emoji(&mut self, pos: Vec2, size: f32, emoji: EmojiId, pen: Pen);
}
