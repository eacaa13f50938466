// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Line breaking, painting and hit-testing
//!
//! All three are one traversal, [`Renderer::run`]: blocks are consumed in
//! logical order and broken into lines (rolling back to the start of a word
//! where one does not fit); each completed line is then passed to
//! [`Renderer::draw_line`] which either measures it, paints it or hit-tests
//! against it. Since painting and hit-testing share the traversal they agree
//! on every position.

use super::bidi;
use super::elide::{self, ElidedView};
use super::{Painter, Pen, StateFlags, StateRequest, StateRequestElided, StateResult};
use crate::conv::{to_u32, to_usize};
use crate::emoji::EmojiId;
use crate::link::{LinkHighlight, LinkState};
use crate::selection::TextSelection;
use crate::shaper::GlyphRun;
use crate::{Align, Block, BlockKind, Rect, Text, Vec2, ELLIPSIS};
use smallvec::SmallVec;
use std::ops::Range;

/// Options of [`Text::draw`]
#[derive(Clone, Copy, Debug)]
pub struct DrawOptions<'a> {
    pub align: Align,
    /// Lines ending above this (relative to the top of the text) are skipped
    pub y_from: f32,
    /// Lines starting at or below this are not drawn
    pub y_to: Option<f32>,
    pub selection: TextSelection,
    /// Extend the selection background to the edges of lines
    pub full_width_selection: bool,
    /// Break long words anywhere instead of at their start
    pub break_everywhere: bool,
    /// Link hover state, for link pens
    pub links: Option<&'a LinkState>,
}

impl<'a> Default for DrawOptions<'a> {
    fn default() -> Self {
        DrawOptions {
            align: Align::Default,
            y_from: 0.0,
            y_to: None,
            selection: TextSelection::default(),
            full_width_selection: true,
            break_everywhere: false,
            links: None,
        }
    }
}

/// Position immediately before `pos`
fn prev_char(text: &str, pos: u32) -> u32 {
    text[..to_usize(pos)]
        .char_indices()
        .next_back()
        .map_or(0, |(index, _)| to_u32(index))
}

/// Symbol at the end of the line `start..end`
fn line_end_symbol(text: &str, start: u32, end: u32) -> (u32, bool) {
    if end > start {
        (prev_char(text, end), true)
    } else {
        (start, false)
    }
}

/// A paragraph and its lazily resolved embedding levels
struct Paragraph {
    rtl: bool,
    start: u32,
    end: u32,
    first_block: usize,
    levels: Option<Vec<u8>>,
}

impl Paragraph {
    /// The paragraph following the newline block `newline` (or the first)
    fn new(text: &Text, newline: Option<usize>) -> Self {
        let first_block = newline.map_or(0, |i| i + 1);
        let start = newline.map_or(0, |i| text.block_end(i));
        let end = text
            .blocks
            .get(first_block..)
            .and_then(|blocks| blocks.iter().find(|b| b.is_newline()))
            .map_or(to_u32(text.text.len()), |b| b.from);
        Paragraph {
            rtl: text.paragraph_dir(newline).is_rtl(),
            start,
            end,
            first_block,
            levels: None,
        }
    }

    #[inline]
    fn base_level(&self) -> u8 {
        u8::from(self.rtl)
    }

    /// Embedding level at `pos`
    fn level(&mut self, text: &Text, pos: u32) -> u8 {
        let (start, end, first_block, rtl) = (self.start, self.end, self.first_block, self.rtl);
        let levels = self.levels.get_or_insert_with(|| {
            let mut objects: SmallVec<[Range<usize>; 4]> = SmallVec::new();
            for (i, block) in text.blocks.iter().enumerate().skip(first_block) {
                if block.from >= end {
                    break;
                }
                if block.is_object() {
                    let from = to_usize(block.from - start);
                    objects.push(from..to_usize(text.block_end(i).min(end) - start));
                }
            }
            let slice = &text.text[to_usize(start)..to_usize(end)];
            bidi::paragraph_levels(slice, &objects, rtl)
        });
        pos.checked_sub(start)
            .and_then(|i| levels.get(to_usize(i)))
            .copied()
            .unwrap_or(u8::from(rtl))
    }
}

#[derive(Clone, Debug)]
enum ItemKind {
    Text(GlyphRun),
    Emoji(EmojiId),
    Skip,
    Ellipsis(GlyphRun),
}

/// A unit of one line in visual reordering
struct Item<'b> {
    block: &'b Block,
    start: u32,
    end: u32,
    level: u8,
    width: f32,
    kind: ItemKind,
}

impl<'b> Item<'b> {
    #[inline]
    fn rtl(&self) -> bool {
        self.level % 2 == 1
    }
}

#[derive(Clone, Copy, Debug)]
struct Lookup {
    x: f32,
    y: f32,
    symbol: bool,
    link: bool,
}

/// Line breaking and drawing state
pub(crate) struct Renderer<'a, 'p> {
    t: &'a Text,
    painter: Option<&'p mut dyn Painter>,
    measure: Option<&'p mut dyn FnMut(f32, f32)>,
    links: Option<&'a LinkState>,
    lookup: Option<Lookup>,
    state: StateResult,

    align: Align,
    selection: TextSelection,
    full_width_selection: bool,
    break_everywhere: bool,

    x: f32,
    y: f32,
    w: f32,
    w_left: f32,
    lh: f32,
    fh: f32,
    ascent: f32,
    y_from: f32,
    y_to: Option<f32>,
    bottom: f32,

    elide_last: bool,
    y_to_elide: f32,
    remove_from_end: f32,
    elide_w: f32,

    line_start: u32,
    line_start_block: usize,
    last_rbearing: f32,
    last_rpadding: f32,
    paragraph: Paragraph,
}

impl<'a, 'p> Renderer<'a, 'p> {
    /// Construct at `pos` (the top-left corner) with line width `w`
    ///
    /// Vertical bounds in `options` are relative to `pos`.
    pub(crate) fn new(t: &'a Text, pos: Vec2, w: f32, options: &DrawOptions<'a>) -> Self {
        let style = &t.style;
        let w = w.max(style.min_resize_width);
        Renderer {
            t,
            painter: None,
            measure: None,
            links: options.links,
            lookup: None,
            state: StateResult::default(),
            align: options.align,
            selection: options.selection,
            full_width_selection: options.full_width_selection,
            break_everywhere: options.break_everywhere,
            x: pos.0,
            y: pos.1,
            w,
            w_left: w,
            lh: 0.0,
            fh: style.font_height(),
            ascent: style.ascent(),
            y_from: pos.1 + options.y_from,
            y_to: options.y_to.map(|y| pos.1 + y),
            bottom: pos.1,
            elide_last: false,
            y_to_elide: 0.0,
            remove_from_end: 0.0,
            elide_w: style.ellipsis_width(),
            line_start: 0,
            line_start_block: 0,
            last_rbearing: 0.0,
            last_rpadding: 0.0,
            paragraph: Paragraph::new(t, None),
        }
    }

    /// Paint onto `painter`, narrowing vertical bounds to its clip
    pub(crate) fn with_painter(mut self, painter: &'p mut dyn Painter) -> Self {
        if let Some(clip) = painter.clip() {
            self.y_from = self.y_from.max(clip.top());
            self.y_to = Some(self.y_to.map_or(clip.bottom(), |y| y.min(clip.bottom())));
        }
        self.painter = Some(painter);
        self
    }

    /// Report `(width, height)` of each line instead of drawing
    pub(crate) fn with_measure(mut self, measure: &'p mut dyn FnMut(f32, f32)) -> Self {
        self.measure = Some(measure);
        self
    }

    /// Elide the last of `lines` lines, reserving `remove_from_end` there
    ///
    /// Does nothing if `y_to` already ends drawing within the first
    /// `lines - 1` lines.
    pub(crate) fn with_line_limit(mut self, lines: usize, remove_from_end: f32) -> Self {
        let rows = self.t.style.row_height();
        let top = self.y;
        let limit = top + lines as f32 * rows;
        if self.y_to.map_or(true, |y_to| top + (lines - 1) as f32 * rows < y_to) {
            self.y_to = Some(self.y_to.map_or(limit, |y_to| y_to.min(limit)));
            self.elide_last = true;
            self.y_to_elide = limit;
            self.remove_from_end = remove_from_end;
        }
        self
    }

    fn with_lookup(mut self, point: Vec2, flags: StateFlags) -> Self {
        self.lookup = Some(Lookup {
            x: point.0,
            y: point.1,
            symbol: flags.contains(StateFlags::LOOKUP_SYMBOL),
            link: flags.contains(StateFlags::LOOKUP_LINK),
        });
        self
    }

    fn reserve_for_elision(&mut self, block_height: f32) {
        if self.elide_last
            && self.remove_from_end > 0.0
            && self.y + block_height >= self.y_to_elide
        {
            self.w_left -= self.remove_from_end;
        }
    }

    /// Start a new line with `(width, rbearing, rpadding)` of its first unit
    fn start_line(&mut self, width: f32, rbearing: f32, rpadding: f32, block_height: f32) {
        self.last_rbearing = rbearing;
        self.last_rpadding = rpadding;
        self.w_left = self.w - (width - rbearing);
        self.reserve_for_elision(block_height);
    }

    /// Break lines, calling [`Self::draw_line`] for each
    pub(crate) fn run(&mut self) {
        let t = self.t;
        let blocks = &t.blocks;
        let Some(first) = blocks.first() else {
            return;
        };
        let style = &t.style;
        let len = to_u32(t.text.len());
        self.reserve_for_elision(style.block_height(first));

        let mut long_word_line = true;
        for (i, b) in blocks.iter().enumerate() {
            let block_height = style.block_height(b);

            if b.is_newline() {
                if self.lh == 0.0 {
                    self.lh = block_height;
                }
                if !self.draw_line(b.from, Some(i)) {
                    return;
                }
                self.y += self.lh;
                self.lh = 0.0;
                self.line_start = t.block_end(i);
                self.line_start_block = i + 1;
                self.start_line(b.width, b.rbearing, b.rpadding, block_height);
                self.paragraph = Paragraph::new(t, Some(i));
                long_word_line = true;
                continue;
            }

            let w_left = self.w_left
                - self.last_rbearing
                - (self.last_rpadding + b.width - b.rbearing);
            if w_left >= 0.0 || (b.is_object() && b.from == self.line_start) {
                self.last_rbearing = b.rbearing;
                self.last_rpadding = b.rpadding;
                self.w_left = w_left;
                self.lh = self.lh.max(block_height);
                long_word_line = false;
                continue;
            }

            if b.is_object() {
                let elided = self.elide_last && self.y + self.lh >= self.y_to_elide;
                if elided {
                    self.lh = self.lh.max(block_height);
                }
                let end = if elided { t.block_end(i) } else { b.from };
                if !self.draw_line(end, Some(i)) {
                    return;
                }
                self.y += self.lh;
                self.lh = block_height;
                self.line_start = b.from;
                self.line_start_block = i;
                self.start_line(b.width, b.rbearing, b.rpadding, block_height);
                long_word_line = true;
                continue;
            }

            let words = b.words();
            if words.is_empty() {
                self.last_rpadding += b.rpadding;
                self.lh = self.lh.max(block_height);
                continue;
            }

            // State at the last position where the line may be broken
            let mut f = 0;
            let mut f_w_left = self.w_left;
            let mut f_lh = self.lh;
            let mut j = 0;
            while j < words.len() {
                let word = &words[j];
                let w_left = self.w_left
                    - self.last_rbearing
                    - (self.last_rpadding + word.width - word.rbearing);
                if w_left >= 0.0 || word.from == self.line_start {
                    self.last_rbearing = word.rbearing;
                    self.last_rpadding = word.rpadding;
                    self.w_left = w_left;
                    self.lh = self.lh.max(block_height);
                    if word.ends_word {
                        long_word_line = false;
                    }
                    if word.ends_word || long_word_line {
                        f = j + 1;
                        f_w_left = self.w_left;
                        f_lh = self.lh;
                    }
                    j += 1;
                    continue;
                }

                let elided = self.elide_last && self.y + self.lh >= self.y_to_elide;
                if elided {
                    self.lh = self.lh.max(block_height);
                } else if f != j && !self.break_everywhere && words[f].from > self.line_start {
                    // Roll back to the start of the word
                    j = f;
                    self.w_left = f_w_left;
                    self.lh = f_lh;
                }
                let word = &words[j];
                let end = if elided {
                    words.get(j + 1).map_or(t.block_end(i), |w| w.from)
                } else {
                    word.from
                };
                if !self.draw_line(end, Some(i)) {
                    return;
                }
                self.y += self.lh;
                self.lh = block_height;
                self.line_start = word.from;
                self.line_start_block = i;
                self.start_line(word.width, word.rbearing, word.rpadding, block_height);

                long_word_line = !word.ends_word;
                j += 1;
                f = j;
                f_w_left = self.w_left;
                f_lh = self.lh;
            }
        }

        if self.line_start < len && !self.draw_line(len, None) {
            return;
        }
        if self.painter.is_none() && self.lookup.is_some_and(|l| l.symbol) {
            self.state.symbol = len;
            self.state.after_symbol = false;
        }
    }

    /// Process the line `line_start..end`
    ///
    /// `end_block` is the block at which the line was broken, if any.
    /// Returns false when no further lines should be processed.
    fn draw_line(&mut self, end: u32, end_block: Option<usize>) -> bool {
        let t = self.t;
        let text = t.text.as_str();
        let line_start = self.line_start;

        if let Some(measure) = self.measure.as_deref_mut() {
            measure(self.w - self.w_left, self.lh);
            return true;
        }

        let y_delta = (self.lh - self.fh) / 2.0;
        if let Some(y_to) = self.y_to {
            if self.y + y_delta >= y_to || self.y >= y_to {
                return false;
            }
        }
        self.bottom = self.y + self.lh;
        // hit-testing covers the whole line height, drawing only the text row
        let line_bottom = match self.lookup {
            Some(_) => self.y + self.lh,
            None => self.y + y_delta + self.fh,
        };
        if line_bottom <= self.y_from {
            if self.lookup.is_some_and(|l| l.symbol) {
                let (symbol, after) = line_end_symbol(text, line_start, end);
                self.state.symbol = symbol;
                self.state.after_symbol = after;
            }
            return true;
        }

        let mut trimmed = end;
        while trimmed > line_start && matches!(text.as_bytes()[to_usize(trimmed) - 1], b' ' | b'\n')
        {
            trimmed -= 1;
        }

        // A line broken before a skip block is drawn in full: the skip block
        // is replaced by `remove_from_end` on elided lines
        let end_is_skip = end_block.is_some_and(|i| t.blocks[i].is_skip());
        let elided = self.elide_last
            && self.y + self.lh >= self.y_to_elide
            && end_block.is_some()
            && !end_is_skip;
        let view = elided.then(|| {
            let avail = self.w - self.elide_w - self.remove_from_end;
            elide::elide_line(t, line_start, self.line_start_block, trimmed, avail)
        });
        let line_end = view.as_ref().map_or(trimmed, |v| v.cut);
        let w_left = view.as_ref().map_or(self.w_left, |v| v.w_left);

        // Selection is clamped to the visible content; the ellipsis is
        // selected when the selection continues past the cut
        let mut selection = self.selection;
        let mut ellipsis_selected = false;
        if let Some(view) = view.as_ref() {
            ellipsis_selected = selection.from <= view.cut && selection.to > view.cut;
            selection.to = selection.to.min(view.cut);
        }

        let rtl = self.paragraph.rtl;
        let mut x = self.x;
        match self.align {
            Align::Center => x += w_left / 2.0,
            Align::Default | Align::TL if rtl => x += w_left,
            Align::BR if !rtl => x += w_left,
            _ => (),
        }

        let items = if line_end > line_start || elided {
            self.line_items(line_end, trimmed, view.as_ref())
        } else {
            Vec::new()
        };
        let line_width: f32 = items.iter().map(|item| item.width).sum();

        if self.painter.is_none() {
            if let Some(lookup) = self.lookup {
                let left = lookup.x < x;
                if left || lookup.x >= x + line_width {
                    let (symbol, after) = if left == rtl {
                        line_end_symbol(text, line_start, line_end)
                    } else {
                        (line_start, false)
                    };
                    self.state.symbol = symbol;
                    self.state.after_symbol = after;
                    self.state.link = None;
                    self.state.link_index = None;
                    self.state.upon_symbol = false;
                    return false;
                }
            }
        }

        let top = self.y + y_delta;
        if self.full_width_selection && !elided {
            let from_start =
                selection.to > line_start && line_start > 0 && selection.from <= line_start;
            let till_end = selection.to > trimmed
                && to_usize(trimmed) < text.len()
                && selection.from <= trimmed
                && !end_is_skip;
            let (left, right) = (self.x, self.x + self.w);
            let (fh, content_end) = (self.fh, x + line_width);
            if let Some(painter) = self.painter.as_deref_mut() {
                if ((from_start && !rtl) || (till_end && rtl)) && x > left {
                    painter.fill_selection(Rect::new(Vec2(left, top), Vec2(x - left, fh)));
                }
                if ((till_end && !rtl) || (from_start && rtl)) && content_end < right {
                    painter.fill_selection(Rect::new(
                        Vec2(content_end, top),
                        Vec2(right - content_end, fh),
                    ));
                }
            }
        }

        if items.is_empty() {
            return true;
        }

        let levels: SmallVec<[u8; 16]> = items.iter().map(|item| item.level).collect();
        let mut order = bidi::visual_order(&levels);
        let last = items.len() - 1;
        if rtl && matches!(items[last].kind, ItemKind::Skip) {
            if let Some(pos) = order.iter().position(|&i| i == last) {
                order.remove(pos);
                order.insert(0, last);
            }
        }

        for index in order {
            let item = &items[index];
            if let Some(lookup) = self.lookup {
                if lookup.x >= x && lookup.x < x + item.width {
                    self.hit_item(item, x, top, lookup);
                    return false;
                }
            } else {
                let selected = if matches!(item.kind, ItemKind::Ellipsis(_)) {
                    ellipsis_selected
                } else {
                    false
                };
                self.paint_item(item, x, top, selection, selected);
            }
            x += item.width;
        }

        if self.lookup.is_some() {
            let (symbol, after) = line_end_symbol(text, line_start, line_end);
            self.state.symbol = symbol;
            self.state.after_symbol = after;
            return false;
        }
        true
    }

    /// Collect the items of the current line, up to `line_end`
    fn line_items<'v>(
        &mut self,
        line_end: u32,
        trimmed: u32,
        view: Option<&'v ElidedView>,
    ) -> Vec<Item<'v>>
    where
        'a: 'v,
    {
        let t = self.t;
        let shaper = &t.style.shaper;
        let mut items = Vec::new();
        let mut i = self.line_start_block;
        loop {
            let block = match view {
                Some(view) => view.block(t, i),
                None => t.blocks.get(i),
            };
            let Some(block) = block else {
                break;
            };
            if block.from >= line_end {
                break;
            }
            let block_end = t.block_end(i);
            let start = block.from.max(self.line_start);
            let end = block_end.min(line_end);
            i += 1;
            if start >= end {
                continue;
            }

            match &block.kind {
                BlockKind::Newline { .. } => (),
                BlockKind::Skip { .. } => items.push(Item {
                    block,
                    start,
                    end,
                    level: 0,
                    width: block.width,
                    kind: ItemKind::Skip,
                }),
                BlockKind::Emoji { emoji } => {
                    let mut width = block.width;
                    if block_end < trimmed {
                        width += block.rpadding;
                    }
                    items.push(Item {
                        block,
                        start,
                        end,
                        level: self.paragraph.level(t, start),
                        width,
                        kind: ItemKind::Emoji(*emoji),
                    });
                }
                BlockKind::Text { .. } => {
                    let mut push = |from: u32, to: u32, level: u8| {
                        let slice = &t.text[to_usize(from)..to_usize(to)];
                        let run = shaper.shape(slice, block.flags, level % 2 == 1);
                        items.push(Item {
                            block,
                            start: from,
                            end: to,
                            level,
                            width: run.advance,
                            kind: ItemKind::Text(run),
                        });
                    };
                    let slice = &t.text[to_usize(start)..to_usize(end)];
                    let mut run_start = start;
                    let mut run_level = None;
                    for (index, _) in slice.char_indices() {
                        let pos = start + to_u32(index);
                        let level = self.paragraph.level(t, pos);
                        match run_level {
                            Some(l) if l != level => {
                                push(run_start, pos, l);
                                run_start = pos;
                                run_level = Some(level);
                            }
                            Some(_) => (),
                            None => run_level = Some(level),
                        }
                    }
                    if let Some(level) = run_level {
                        push(run_start, end, level);
                    }
                }
            }
        }

        if let Some(view) = view {
            let level = self.paragraph.base_level();
            let run = shaper.shape(ELLIPSIS, view.stand_in.flags, self.paragraph.rtl);
            items.push(Item {
                block: &view.stand_in,
                start: view.cut,
                end: view.cut,
                level,
                width: run.advance,
                kind: ItemKind::Ellipsis(run),
            });
        }
        items
    }

    fn pen(&self, block: &Block) -> Pen {
        let highlight = match (block.link, self.links) {
            (Some(index), Some(links)) => self
                .t
                .links
                .get(usize::from(index))
                .and_then(Option::as_ref)
                .map_or(LinkHighlight::Normal, |handler| links.highlight(handler)),
            _ => LinkHighlight::Normal,
        };
        Pen {
            flags: block.flags,
            link: block.link,
            highlight,
        }
    }

    fn paint_item(
        &mut self,
        item: &Item,
        x: f32,
        top: f32,
        selection: TextSelection,
        ellipsis_selected: bool,
    ) {
        let pen = self.pen(item.block);
        let t = self.t;
        let style = &t.style;
        let text = t.text.as_str();
        let (fh, text_y) = (self.fh, top + self.ascent);
        let Some(painter) = self.painter.as_deref_mut() else {
            return;
        };

        match &item.kind {
            ItemKind::Text(run) => {
                let slice = &text[to_usize(item.start)..to_usize(item.end)];
                let mut selected = None;
                if selection.intersects(item.start, item.end) {
                    let (from, width) = selected_extent(slice, run, item.start, selection);
                    let sel_x = if item.rtl() {
                        x + item.width - from - width
                    } else {
                        x + from
                    };
                    if width > 0.0 {
                        painter.fill_selection(Rect::new(Vec2(sel_x, top), Vec2(width, fh)));
                        selected = Some((sel_x, sel_x + width));
                    }
                }
                painter.draw_glyphs(Vec2(x, text_y), slice, run, pen, selected);
            }
            ItemKind::Emoji(emoji) => {
                let glyph_w = item.block.width;
                let spaces_w = item.width - glyph_w;
                let rtl = item.rtl();
                let glyph_x = if rtl { x + spaces_w } else { x };
                let emoji_end = emoji_end(text, item);

                let glyph_selected = item.start >= selection.from && item.start < selection.to;
                let spaces_selected =
                    spaces_w > 0.0 && selection.intersects(emoji_end, item.end);
                let fill = if glyph_selected && (spaces_w <= 0.0 || selection.to >= item.end) {
                    Some((x, item.width))
                } else if glyph_selected {
                    Some((glyph_x, glyph_w))
                } else if spaces_selected {
                    Some((if rtl { x } else { x + glyph_w }, spaces_w))
                } else {
                    None
                };
                if let Some((from, width)) = fill {
                    painter.fill_selection(Rect::new(Vec2(from, top), Vec2(width, fh)));
                }

                let emoji_y = top + (fh - style.emoji_size) / 2.0;
                let pos = Vec2(glyph_x + style.emoji_padding, emoji_y);
                painter.draw_emoji(pos, style.emoji_size, *emoji, pen);
            }
            ItemKind::Skip => (),
            ItemKind::Ellipsis(run) => {
                let mut selected = None;
                if ellipsis_selected {
                    painter.fill_selection(Rect::new(Vec2(x, top), Vec2(item.width, fh)));
                    selected = Some((x, x + item.width));
                }
                painter.draw_glyphs(Vec2(x, text_y), ELLIPSIS, run, pen, selected);
            }
        }
    }

    fn hit_item(&mut self, item: &Item, x: f32, top: f32, lookup: Lookup) {
        let t = self.t;
        let text = t.text.as_str();

        self.state.link = None;
        self.state.link_index = None;
        if lookup.link && lookup.y >= top && lookup.y < top + self.fh {
            if let Some(index) = item.block.link {
                let handler = t.links.get(usize::from(index)).cloned().flatten();
                if handler.is_some() {
                    self.state.link_index = Some(index);
                }
                self.state.link = handler;
            }
        }

        let (symbol, after) = match &item.kind {
            ItemKind::Skip => {
                self.state.upon_symbol = false;
                if self.paragraph.rtl {
                    (self.line_start, false)
                } else {
                    line_end_symbol(text, self.line_start, item.start)
                }
            }
            ItemKind::Ellipsis(_) => {
                self.state.upon_symbol = true;
                (item.start, false)
            }
            ItemKind::Emoji(_) => {
                self.state.upon_symbol = true;
                let rtl = item.rtl();
                let glyph_w = item.block.width;
                let spaces_w = item.width - glyph_w;
                let emoji_end = emoji_end(text, item);
                let in_spaces = if rtl {
                    lookup.x < x + spaces_w
                } else {
                    lookup.x >= x + glyph_w
                };
                if spaces_w > 0.0 && in_spaces {
                    let after = if rtl {
                        lookup.x < x + spaces_w / 2.0
                    } else {
                        lookup.x >= x + glyph_w + spaces_w / 2.0
                    };
                    (emoji_end, after)
                } else {
                    let glyph_x = if rtl { x + spaces_w } else { x };
                    let left_half = lookup.x < glyph_x + glyph_w / 2.0;
                    if left_half != rtl {
                        (item.start, false)
                    } else {
                        (prev_char(text, emoji_end), true)
                    }
                }
            }
            ItemKind::Text(run) => {
                self.state.upon_symbol = true;
                hit_text(text, item, run, x, lookup.x)
            }
        };
        self.state.symbol = symbol;
        self.state.after_symbol = after;
    }
}

/// End of the emoji sequence of `item`, excluding trailing spaces
fn emoji_end(text: &str, item: &Item) -> u32 {
    let slice = &text[to_usize(item.start)..to_usize(item.end)];
    item.start + to_u32(slice.trim_end_matches(' ').len())
}

/// Find the symbol of text `item` at `x_l`, given the item's left edge `x`
///
/// Each cluster is divided equally between its chars.
fn hit_text(text: &str, item: &Item, run: &GlyphRun, x: f32, x_l: f32) -> (u32, bool) {
    let slice = &text[to_usize(item.start)..to_usize(item.end)];
    let rtl = item.rtl();
    let before = |edge: f32, shift: f32| {
        if rtl {
            x_l >= edge - shift
        } else {
            x_l < edge + shift
        }
    };

    let mut edge = if rtl { x + item.width } else { x };
    for cluster in run.clusters(to_u32(slice.len())) {
        let chars = &slice[to_usize(cluster.start)..to_usize(cluster.end)];
        let n = chars.chars().count().max(1) as f32;
        let advance = cluster.advance;
        for (k, (index, _)) in chars.char_indices().enumerate() {
            let k = k as f32;
            if before(edge, (2.0 * k + 2.0) * advance / (2.0 * n)) {
                let after = !before(edge, (2.0 * k + 1.0) * advance / (2.0 * n));
                return (item.start + cluster.start + to_u32(index), after);
            }
        }
        if rtl {
            edge -= advance;
        } else {
            edge += advance;
        }
    }
    line_end_symbol(text, item.start, item.end)
}

/// Offset and width of the selected part of a text item, in logical order
///
/// Clusters partially selected contribute in proportion to their chars.
fn selected_extent(
    slice: &str,
    run: &GlyphRun,
    start: u32,
    selection: TextSelection,
) -> (f32, f32) {
    let mut pos = 0.0;
    let mut from = None;
    let mut width = 0.0;
    for cluster in run.clusters(to_u32(slice.len())) {
        let chars = &slice[to_usize(cluster.start)..to_usize(cluster.end)];
        let mut n = 0;
        let mut lead = 0;
        let mut selected = 0;
        for (index, _) in chars.char_indices() {
            let offset = start + cluster.start + to_u32(index);
            n += 1;
            if offset < selection.from {
                lead += 1;
            } else if offset < selection.to {
                selected += 1;
            }
        }
        if selected > 0 {
            let per_char = cluster.advance / n as f32;
            from.get_or_insert(pos + per_char * lead as f32);
            width += per_char * selected as f32;
        }
        pos += cluster.advance;
    }
    (from.unwrap_or(0.0), width)
}

impl Text {
    /// Draw the text
    ///
    /// `pos` is the top-left corner and `width` the line width. Returns the
    /// bottom of the last line laid out, relative to `pos`.
    pub fn draw(
        &self,
        painter: &mut dyn Painter,
        pos: Vec2,
        width: f32,
        options: &DrawOptions,
    ) -> f32 {
        let mut renderer = Renderer::new(self, pos, width, options).with_painter(painter);
        renderer.run();
        renderer.bottom - pos.1
    }

    /// Draw at most `lines` lines, eliding the last
    ///
    /// The last line ends with [`ELLIPSIS`] if text remains, and is shortened
    /// by `remove_from_end` (e.g. to make room for a skip block's content).
    pub fn draw_elided(
        &self,
        painter: &mut dyn Painter,
        pos: Vec2,
        width: f32,
        lines: usize,
        remove_from_end: f32,
        options: &DrawOptions,
    ) -> f32 {
        if lines == 0 {
            return 0.0;
        }
        let mut renderer = Renderer::new(self, pos, width, options)
            .with_painter(painter)
            .with_line_limit(lines, remove_from_end);
        renderer.run();
        renderer.bottom - pos.1
    }

    /// Find what is at `point` (relative to the top-left corner)
    ///
    /// Without [`StateFlags::LOOKUP_SYMBOL`], points outside `0..width`
    /// horizontally find nothing.
    pub fn get_state(&self, point: Vec2, width: f32, request: StateRequest) -> StateResult {
        self.lookup(point, width, request, None)
    }

    /// As [`Self::get_state`], for text drawn by [`Self::draw_elided`]
    pub fn get_state_elided(
        &self,
        point: Vec2,
        width: f32,
        request: StateRequestElided,
    ) -> StateResult {
        if request.lines == 0 {
            return StateResult::default();
        }
        self.lookup(
            point,
            width,
            request.request,
            Some((request.lines, request.remove_from_end)),
        )
    }

    fn lookup(
        &self,
        point: Vec2,
        width: f32,
        request: StateRequest,
        limit: Option<(usize, f32)>,
    ) -> StateResult {
        if self.blocks.is_empty() || point.1 < 0.0 {
            return StateResult::default();
        }
        let flags = request.flags;
        if !flags.contains(StateFlags::LOOKUP_SYMBOL) && !(point.0 >= 0.0 && point.0 < width) {
            return StateResult::default();
        }

        let options = DrawOptions {
            align: request.align,
            y_from: point.1,
            break_everywhere: flags.contains(StateFlags::BREAK_EVERYWHERE),
            ..Default::default()
        };
        let mut renderer = Renderer::new(self, Vec2::ZERO, width, &options);
        if let Some((lines, remove_from_end)) = limit {
            renderer = renderer.with_line_limit(lines, remove_from_end);
        }
        let mut renderer = renderer.with_lookup(point, flags);
        renderer.run();
        renderer.state
    }
}
