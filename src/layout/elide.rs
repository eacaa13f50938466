// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Elision of the last visible line

use crate::conv::{to_u32, to_usize};
use crate::{Block, BlockFlags, BlockKind, Text};

/// Retries before a cut is accepted as is
const MAX_RETRIES: u32 = 3;

/// A read-only overlay of a text's blocks, truncated at `cut`
///
/// Blocks starting at or after the cut are shadowed by a zero-length
/// `stand_in` carrying the style of the last visible block; the ellipsis is
/// drawn with this style. The underlying [`Text`] is never modified.
#[derive(Clone, Debug, PartialEq)]
pub struct ElidedView {
    /// End of visible content
    pub cut: u32,
    /// Index of the first shadowed block
    pub index: usize,
    pub stand_in: Block,
    /// Width left over after content
    pub w_left: f32,
}

impl ElidedView {
    /// Block `i` as seen through the overlay
    pub fn block<'a>(&'a self, text: &'a Text, i: usize) -> Option<&'a Block> {
        if i < self.index {
            text.blocks.get(i)
        } else if i == self.index {
            Some(&self.stand_in)
        } else {
            None
        }
    }
}

/// Find where the line `line_start..end` must be cut to fit `avail`
///
/// Returns the cut and the width left over. Objects and paragraph breaks are
/// kept or dropped whole; text is cut between glyph clusters.
fn fit(text: &Text, line_start: u32, start_block: usize, end: u32, avail: f32) -> (u32, f32) {
    let shaper = &text.style.shaper;
    let mut w_left = avail;
    for (i, block) in text.blocks.iter().enumerate().skip(start_block) {
        if block.from >= end {
            break;
        }
        let from = block.from.max(line_start);
        let block_end = text.block_end(i);
        let to = block_end.min(end);
        if from >= to {
            continue;
        }

        match block.kind {
            BlockKind::Text { .. } => {
                let slice = &text.text[to_usize(from)..to_usize(to)];
                let run = shaper.shape(slice, block.flags, false);
                for cluster in run.clusters(to_u32(slice.len())) {
                    if w_left < cluster.advance {
                        return (from + cluster.start, w_left);
                    }
                    w_left -= cluster.advance;
                }
            }
            _ => {
                let mut width = block.width;
                if block_end <= end {
                    width += block.rpadding;
                }
                if w_left < width {
                    return (from, w_left);
                }
                w_left -= width;
            }
        }
    }
    (end, w_left)
}

/// Elide the line `line_start..end` to fit `avail`
///
/// `start_block` is the block containing `line_start`. Cutting is repeated
/// on the shortened line (at most a few times) until the content fits.
pub fn elide_line(
    text: &Text,
    line_start: u32,
    start_block: usize,
    end: u32,
    avail: f32,
) -> ElidedView {
    let mut end = end;
    let mut retries = 0;
    let (cut, w_left) = loop {
        let (cut, w_left) = fit(text, line_start, start_block, end, avail);
        if cut >= end {
            break (cut, w_left);
        } else if retries >= MAX_RETRIES {
            log::debug!("elide_line: accepting cut at {cut} after {retries} retries");
            break (cut, w_left);
        }
        end = cut;
        retries += 1;
    };

    let index = text.blocks[start_block..]
        .iter()
        .position(|b| b.from >= cut && b.from > line_start)
        .map_or(text.blocks.len(), |i| start_block + i);
    let style_index = index.saturating_sub(1).max(start_block);
    let stand_in = match text.blocks.get(style_index) {
        Some(block) => block.stand_in(cut),
        None => Block::newline(to_usize(cut), BlockFlags::empty(), None).stand_in(cut),
    };

    ElidedView {
        cut,
        index,
        stand_in,
        w_left,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaper::MonoShaper;
    use crate::{TextStyle, PLAIN_OPTIONS};
    use std::sync::Arc;

    fn text(s: &str) -> Text {
        let style = Arc::new(TextStyle::new(Arc::new(MonoShaper::new(10.0, 20.0))));
        Text::with_text(style, s, &PLAIN_OPTIONS)
    }

    #[test]
    fn cut_text() {
        let t = text("hello world");
        let view = elide_line(&t, 0, 0, 11, 75.0);
        assert_eq!(view.cut, 7);
        assert_eq!(view.w_left, 5.0);
        assert_eq!(view.stand_in.from, 7);
        assert!(view.block(&t, 0).is_some());

        let view = elide_line(&t, 0, 0, 11, 200.0);
        assert_eq!(view.cut, 11);
        assert_eq!(view.index, t.blocks().len());
    }

    #[test]
    fn nothing_fits() {
        let t = text("hello");
        let view = elide_line(&t, 0, 0, 5, 5.0);
        assert_eq!(view.cut, 0);
        assert_eq!(view.w_left, 5.0);
        assert_eq!(view.index, 1);
        assert_eq!(view.block(&t, 1).map(|b| b.from), Some(0));
        assert!(view.block(&t, 2).is_none());
    }

    #[test]
    fn cut_is_stable() {
        let t = text("ab \u{1F600} cd efgh");
        let end = t.as_str().len() as u32;
        for avail in [5.0, 25.0, 45.0, 65.0, 85.0, 105.0] {
            let view = elide_line(&t, 0, 0, end, avail);
            let again = elide_line(&t, 0, 0, view.cut, avail);
            assert_eq!(again, view, "avail {avail}");
        }
    }

    #[test]
    fn objects_whole() {
        let mut t = text("ab");
        t.update_skip_block(30.0, 20.0);
        let view = elide_line(&t, 0, 0, 3, 40.0);
        assert_eq!(view.cut, 2);
        assert_eq!(view.index, 1);
        assert_eq!(view.block(&t, 1).map(|b| b.from), Some(2));
    }
}
