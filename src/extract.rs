// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Extraction of source text and entities

use crate::conv::{to_u32, to_usize};
use crate::emoji::EmojiId;
use crate::entity::{EntityInText, EntityType, TextForMimeData, TextWithEntities};
use crate::link::ClickHandlerPtr;
use crate::selection::TextSelection;
use crate::{BlockFlags, BlockKind, Text};
use smallvec::SmallVec;
use std::fmt;

/// How links are written by [`Text::original_text`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExpandLinks {
    /// Links are written as displayed
    #[default]
    None,
    /// URLs not displayed in full are replaced by their target
    Shortened,
    /// URLs and e-mails are written in full; links with custom text are
    /// followed by their target in parentheses
    All,
}

/// Receives the parts of a selection, in order
trait Visitor {
    /// Selected text, including the text of links
    fn part(&mut self, part: &str);

    /// A link starts
    fn link_start(&mut self) {}

    /// A fully selected link ends; its text `part` was already reported
    fn link(&mut self, part: &str, handler: &ClickHandlerPtr);

    /// Formatting changes
    fn flags(&mut self, _old: BlockFlags, _new: BlockFlags) {}
}

/// Widen `selection` to char boundaries of `text`
fn snap_to_chars(text: &str, selection: TextSelection) -> (usize, usize) {
    let mut from = to_usize(selection.from).min(text.len());
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = to_usize(selection.to).min(text.len());
    while !text.is_char_boundary(to) {
        to += 1;
    }
    (from, to)
}

impl Text {
    /// Walk `selection`, reporting text, links and formatting to `visitor`
    ///
    /// Links are reported as one unit if fully selected. Skip blocks are
    /// omitted.
    fn enumerate(&self, selection: TextSelection, visitor: &mut impl Visitor) {
        let len = to_u32(self.text.len());
        let (from, to) = snap_to_chars(&self.text, selection);
        let (from, to) = (to_u32(from), to_u32(to));
        if self.blocks.is_empty() || from >= to {
            return;
        }

        let mut link: Option<u16> = None;
        let mut link_start = 0;
        let mut flags = BlockFlags::empty();
        for i in 0..=self.blocks.len() {
            let block = self.blocks.get(i);
            let block_from = block.map_or(len, |b| b.from);
            // links without a handler are plain text
            let block_link = block
                .and_then(|b| b.link)
                .filter(|&index| self.link_handler(index).is_some());

            if block_link != link {
                if let Some(handler) = link.and_then(|index| self.link_handler(index)) {
                    if from <= link_start && block_from <= to {
                        let part = &self.text[to_usize(link_start)..to_usize(block_from)];
                        visitor.link(part, handler);
                    }
                }
                link = block_link;
                if link.is_some() {
                    link_start = block_from;
                    visitor.link_start();
                }
            }

            let Some(block) = block else {
                break;
            };
            if block_from >= to {
                break;
            }
            if block.is_skip() {
                continue;
            }

            let block_end = self.block_end(i);
            if block_end > from && block.flags != flags {
                visitor.flags(flags, block.flags);
                flags = block.flags;
            }
            let range_from = from.max(block_from);
            let range_to = to.min(block_end);
            if range_to > range_from {
                visitor.part(&self.text[to_usize(range_from)..to_usize(range_to)]);
            }
        }
        visitor.flags(flags, BlockFlags::empty());
    }

    fn link_handler(&self, index: u16) -> Option<&ClickHandlerPtr> {
        self.links.get(usize::from(index)).and_then(Option::as_ref)
    }

    /// Get the source text of `selection`
    pub fn original_text(&self, selection: TextSelection, expand: ExpandLinks) -> String {
        let mut visitor = PlainText {
            result: String::with_capacity(self.text.len()),
            expand,
            link_start: 0,
        };
        self.enumerate(selection, &mut visitor);
        visitor.result
    }

    /// Get the source text of `selection` with its entities
    ///
    /// Re-parsing the result with the options this text was parsed with
    /// reproduces the same blocks.
    pub fn original_text_with_entities(&self, selection: TextSelection) -> TextWithEntities {
        self.to_text_for_mime_data(selection).rich
    }

    /// Get `selection` for the clipboard
    pub fn to_text_for_mime_data(&self, selection: TextSelection) -> TextForMimeData {
        let mut visitor = MimeData::default();
        self.enumerate(selection, &mut visitor);
        visitor.finish()
    }

    /// The emoji of this text, if it consists of one to three emoji only
    ///
    /// Spaces between emoji and a trailing skip block are allowed; links are
    /// not.
    pub fn to_isolated_emoji(&self) -> Option<SmallVec<[EmojiId; 3]>> {
        let mut result = SmallVec::new();
        for (i, block) in self.blocks.iter().enumerate() {
            if block.link.is_some() {
                return None;
            }
            match block.kind {
                BlockKind::Emoji { emoji } if result.len() < 3 => result.push(emoji),
                BlockKind::Skip { .. } if i + 1 == self.blocks.len() => (),
                _ => return None,
            }
        }
        (!result.is_empty()).then_some(result)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original_text(TextSelection::ALL, ExpandLinks::None))
    }
}

struct PlainText {
    result: String,
    expand: ExpandLinks,
    link_start: usize,
}

impl Visitor for PlainText {
    fn part(&mut self, part: &str) {
        self.result.push_str(part);
    }

    fn link_start(&mut self) {
        self.link_start = self.result.len();
    }

    fn link(&mut self, part: &str, handler: &ClickHandlerPtr) {
        let entity = handler.entity();
        if entity.data.is_empty() {
            return;
        }
        match (self.expand, entity.kind) {
            (ExpandLinks::Shortened, EntityType::Url) if !handler.displayed_full() => {
                self.result.truncate(self.link_start);
                self.result.push_str(&entity.data);
            }
            (ExpandLinks::All, EntityType::Url | EntityType::Email) => {
                self.result.truncate(self.link_start);
                self.result.push_str(&entity.data);
            }
            (ExpandLinks::All, EntityType::CustomUrl) if entity.data != part => {
                self.result.push_str(" (");
                self.result.push_str(&entity.data);
                self.result.push(')');
            }
            _ => (),
        }
    }
}

/// Formatting flags written as entities
const TRACKED: [(BlockFlags, EntityType); 6] = [
    (BlockFlags::ITALIC, EntityType::Italic),
    (BlockFlags::SEMIBOLD.union(BlockFlags::BOLD), EntityType::Bold),
    (BlockFlags::UNDERLINE, EntityType::Underline),
    (BlockFlags::STRIKE_OUT, EntityType::StrikeOut),
    (BlockFlags::CODE, EntityType::Code),
    (BlockFlags::PRE, EntityType::Pre),
];

#[derive(Default)]
struct MimeData {
    rich: TextWithEntities,
    expanded: String,
    link_start: usize,
    expanded_link_start: usize,
    /// Start of each open entity of [`TRACKED`]
    open: [usize; 6],
}

impl MimeData {
    fn push_entity(&mut self, kind: EntityType, start: usize, data: String) {
        let length = self.rich.text.len() - start;
        if length > 0 {
            let entity = EntityInText::with_data(kind, start, length, data);
            self.rich.entities.push(entity);
        }
    }

    fn finish(mut self) -> TextForMimeData {
        self.rich.entities.sort_by_key(|e| e.offset);
        TextForMimeData {
            rich: self.rich,
            expanded: self.expanded,
        }
    }
}

impl Visitor for MimeData {
    fn part(&mut self, part: &str) {
        self.rich.text.push_str(part);
        self.expanded.push_str(part);
    }

    fn link_start(&mut self) {
        self.link_start = self.rich.text.len();
        self.expanded_link_start = self.expanded.len();
    }

    fn link(&mut self, part: &str, handler: &ClickHandlerPtr) {
        let entity = handler.entity();
        let plain_url = matches!(entity.kind, EntityType::Url | EntityType::Email);
        if !entity.data.is_empty() && entity.data != part {
            if plain_url {
                self.expanded.truncate(self.expanded_link_start);
                self.expanded.push_str(&entity.data);
            } else if entity.kind == EntityType::CustomUrl {
                self.expanded.push_str(" (");
                self.expanded.push_str(&entity.data);
                self.expanded.push(')');
            }
        }
        let data = if plain_url { String::new() } else { entity.data };
        self.push_entity(entity.kind, self.link_start, data);
    }

    fn flags(&mut self, old: BlockFlags, new: BlockFlags) {
        let pos = self.rich.text.len();
        for (i, (flags, kind)) in TRACKED.iter().enumerate() {
            let (was, is) = (old.intersects(*flags), new.intersects(*flags));
            if was && !is {
                self.push_entity(*kind, self.open[i], String::new());
            } else if is && !was {
                self.open[i] = pos;
            }
        }
    }
}
