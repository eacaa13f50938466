// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Measurement of wrapped text

use super::render::{DrawOptions, Renderer};
use crate::{Text, Vec2};

impl Text {
    /// Call `f(width, height)` for each line when wrapped at `width`
    ///
    /// Lines are broken exactly as [`Text::draw`] breaks them.
    pub fn enumerate_lines(&self, width: f32, break_everywhere: bool, mut f: impl FnMut(f32, f32)) {
        let options = DrawOptions {
            break_everywhere,
            ..Default::default()
        };
        let mut renderer = Renderer::new(self, Vec2::ZERO, width, &options).with_measure(&mut f);
        renderer.run();
    }

    /// Width needed to display the text when wrapped at `width`
    ///
    /// This is at most `width` unless a single unbreakable unit is wider.
    pub fn count_width(&self, width: f32, break_everywhere: bool) -> f32 {
        if width >= self.max_width {
            return self.max_width.ceil();
        }
        let mut max_line_width: f32 = 0.0;
        self.enumerate_lines(width, break_everywhere, |line_width, _| {
            max_line_width = max_line_width.max(line_width);
        });
        max_line_width.ceil()
    }

    /// Height of the text when wrapped at `width`
    pub fn count_height(&self, width: f32, break_everywhere: bool) -> f32 {
        if width >= self.max_width {
            return self.min_height;
        }
        let mut height = 0.0;
        self.enumerate_lines(width, break_everywhere, |_, line_height| {
            height += line_height;
        });
        height
    }

    /// Width of each line when wrapped at `width`, rounded up
    pub fn count_line_widths(&self, width: f32, break_everywhere: bool) -> Vec<f32> {
        let mut widths = Vec::new();
        self.enumerate_lines(width, break_everywhere, |line_width, _| {
            widths.push(line_width.ceil());
        });
        widths
    }
}

#[cfg(test)]
mod tests {
    use crate::shaper::MonoShaper;
    use crate::{Text, TextStyle, PLAIN_OPTIONS};
    use std::sync::Arc;

    fn text(s: &str) -> Text {
        let style = Arc::new(TextStyle::new(Arc::new(MonoShaper::new(10.0, 20.0))));
        Text::with_text(style, s, &PLAIN_OPTIONS)
    }

    #[test]
    fn wrap_words() {
        let t = text("aaaa bbbb cccc");
        assert_eq!(t.max_width(), 140.0);
        assert_eq!(t.count_line_widths(90.0, false), vec![90.0, 40.0]);
        assert_eq!(t.count_height(90.0, false), 40.0);
        assert_eq!(t.count_width(90.0, false), 90.0);
        assert_eq!(t.count_height(140.0, false), 20.0);
        assert_eq!(t.count_width(500.0, false), 140.0);
    }

    #[test]
    fn paragraphs() {
        let t = text("aa\nbbbb bbbb");
        assert_eq!(t.count_line_widths(50.0, false), vec![20.0, 40.0, 40.0]);
        assert_eq!(t.count_height(50.0, false), 60.0);
    }

    #[test]
    fn long_word() {
        // no empty lines when a word is wider than the line
        let t = text("a bcdefgh");
        let widths = t.count_line_widths(50.0, false);
        assert_eq!(widths, vec![10.0, 50.0, 20.0]);
        assert!(widths.iter().all(|w| *w > 0.0));

        // a word is only broken at its start unless breaking everywhere
        let widths = t.count_line_widths(50.0, true);
        assert_eq!(widths, vec![50.0, 40.0]);
    }

    #[test]
    fn height_monotonic() {
        let t = text("one two three four five six seven eight nine ten");
        let mut last = 0.0;
        for width in [500.0, 200.0, 120.0, 80.0, 50.0, 30.0] {
            let height = t.count_height(width, false);
            assert!(height >= last);
            assert!(height >= t.min_height());
            last = height;
        }
    }
}
