// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Natural size

use crate::conv::to_usize;
use crate::{BlockKind, Direction, Text};
use unicode_bidi::{bidi_class, BidiClass};

/// Direction of the first strong char of `text`
///
/// Returns [`Direction::Auto`] if there is no strong char.
pub fn string_direction(text: &str) -> Direction {
    for c in text.chars() {
        match bidi_class(c) {
            BidiClass::L => return Direction::Ltr,
            BidiClass::R | BidiClass::AL => return Direction::Rtl,
            _ => (),
        }
    }
    Direction::Auto
}

impl Text {
    /// Compute `max_width` and `min_height`
    ///
    /// If `initial`, paragraph directions are also resolved (unless forced
    /// by the parse options) and stored on the preceding newline block.
    pub(crate) fn recount_natural_size(&mut self, initial: bool) {
        let style = self.style.clone();
        let mut max_width: f32 = 0.0;
        let mut min_height = 0.0;
        let mut line_height: f32 = 0.0;
        let mut width: f32 = 0.0;
        let mut last_rbearing = 0.0;
        let mut last_rpadding = 0.0;
        let mut last_newline: Option<usize> = None;
        let mut par_start = 0;

        for index in 0..self.blocks.len() {
            let b = &self.blocks[index];
            let block_height = style.block_height(b);
            if b.is_newline() {
                if line_height == 0.0 {
                    line_height = block_height;
                }
                let from = to_usize(b.from);
                if initial {
                    self.set_paragraph_dir(last_newline, par_start, from);
                }
                par_start = from;
                last_newline = Some(index);

                let b = &self.blocks[index];
                min_height += line_height;
                line_height = 0.0;
                last_rbearing = b.rbearing;
                last_rpadding = b.rpadding;

                max_width = max_width.max(width);
                width = b.width - last_rbearing;
                continue;
            }

            // A block may be narrower than the preceding negative bearing,
            // thus the maximum is taken before each block
            max_width = max_width.max(width);

            width += last_rbearing + (last_rpadding + b.width - b.rbearing);
            line_height = line_height.max(block_height);

            last_rbearing = b.rbearing;
            last_rpadding = b.rpadding;
        }
        if initial {
            self.set_paragraph_dir(last_newline, par_start, self.text.len());
        }
        if width > 0.0 {
            if line_height == 0.0 {
                line_height = self.blocks.last().map_or(0.0, |b| style.block_height(b));
            }
            min_height += line_height;
            max_width = max_width.max(width);
        }

        self.max_width = max_width;
        self.min_height = min_height;
    }

    fn set_paragraph_dir(&mut self, newline: Option<usize>, start: usize, end: usize) {
        let dir = match self.forced_dir {
            Direction::Auto => string_direction(&self.text[start..end]),
            dir => dir,
        };
        match newline.and_then(|i| self.blocks.get_mut(i)) {
            Some(block) => {
                if let BlockKind::Newline { next_dir } = &mut block.kind {
                    *next_dir = dir;
                }
            }
            None => self.start_dir = dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaper::MonoShaper;
    use crate::{Block, BlockFlags, TextStyle, PLAIN_OPTIONS};
    use std::sync::Arc;

    fn style() -> Arc<TextStyle> {
        Arc::new(TextStyle::new(Arc::new(MonoShaper::new(10.0, 20.0))))
    }

    #[test]
    fn directions() {
        assert_eq!(string_direction("123 abc"), Direction::Ltr);
        assert_eq!(string_direction("12 \u{5D0}bc"), Direction::Rtl);
        assert_eq!(string_direction("12 ..."), Direction::Auto);

        let text = Text::with_text(style(), "abc\n\u{5D0}\u{5D1}\n12", &PLAIN_OPTIONS);
        assert_eq!(text.start_dir(), Direction::Ltr);
        let dirs: Vec<_> = text
            .blocks()
            .iter()
            .filter_map(|b| match b.kind {
                BlockKind::Newline { next_dir } => Some(next_dir),
                _ => None,
            })
            .collect();
        assert_eq!(dirs, vec![Direction::Rtl, Direction::Auto]);

        let options = PLAIN_OPTIONS.with_dir(Direction::Rtl);
        let text = Text::with_text(style(), "abc", &options);
        assert_eq!(text.start_dir(), Direction::Rtl);
    }

    #[test]
    fn natural_size() {
        let text = Text::with_text(style(), "aaaa bb\nccc", &PLAIN_OPTIONS);
        assert_eq!(text.max_width(), 70.0);
        assert_eq!(text.min_height(), 40.0);
    }

    #[test]
    fn bearing_carry() {
        let mut shaper = MonoShaper::new(10.0, 20.0);
        shaper.italic_overhang = 3.0;
        let style = Arc::new(TextStyle::new(Arc::new(shaper)));
        let mut text = Text::new(style.clone());
        text.text = "ab cd".into();
        text.blocks = vec![
            Block::text(&style, &text.text, 0, 3, BlockFlags::ITALIC, None),
            Block::text(&style, &text.text, 3, 5, BlockFlags::empty(), None),
        ];
        text.recount_natural_size(true);
        // "ab" overhangs by 3, but the overhang is hidden by what follows
        assert_eq!(text.max_width(), 50.0);

        text.text = "ab".into();
        text.blocks = vec![Block::text(&style, "ab", 0, 2, BlockFlags::ITALIC, None)];
        text.recount_natural_size(true);
        assert_eq!(text.max_width(), 23.0);
    }
}
