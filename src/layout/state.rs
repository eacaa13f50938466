// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Hit-testing requests and results

use crate::conv::{to_u32, to_usize};
use crate::link::ClickHandlerPtr;
use crate::Align;

bitflags::bitflags! {
    /// Hit-test modes
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct StateFlags: u8 {
        /// Lay out as [`crate::DrawOptions::break_everywhere`]
        const BREAK_EVERYWHERE = 1 << 0;
        /// Find the nearest symbol, even outside the text
        const LOOKUP_SYMBOL = 1 << 1;
        /// Find the link under the point
        const LOOKUP_LINK = 1 << 2;
    }
}

/// Input of [`crate::Text::get_state`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StateRequest {
    pub align: Align,
    pub flags: StateFlags,
}

/// Input of [`crate::Text::get_state_elided`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StateRequestElided {
    pub request: StateRequest,
    /// Maximum number of lines
    pub lines: usize,
    /// Width reserved at the end of the last line
    pub remove_from_end: f32,
}

/// Result of hit-testing
#[derive(Clone, Debug, Default)]
pub struct StateResult {
    /// Handler of the link under the point
    pub link: Option<ClickHandlerPtr>,
    /// Index of the link under the point
    pub link_index: Option<u16>,
    /// True if the point is over a symbol (not padding or reserved space)
    pub upon_symbol: bool,
    /// True if the position is after `symbol` rather than before
    pub after_symbol: bool,
    /// Byte offset of the symbol nearest the point
    pub symbol: u32,
}

impl StateResult {
    /// Cursor position: `symbol`, or the end of the symbol if `after_symbol`
    pub fn position(&self, text: &str) -> u32 {
        if !self.after_symbol {
            return self.symbol;
        }
        let len = text
            .get(to_usize(self.symbol)..)
            .and_then(|s| s.chars().next())
            .map_or(0, char::len_utf8);
        self.symbol + to_u32(len)
    }
}
