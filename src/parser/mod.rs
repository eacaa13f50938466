// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Parsers
//!
//! The block parser turns text plus entities (and, with
//! [`ParseFlags::RICH_TEXT`], inline [`command`]s) into the buffer, block
//! list and link table of a [`crate::Text`]. Rich text tags are expanded to
//! commands by [`rich`]; Markdown input is converted to entities by
//! `markdown` (feature-gated).

pub mod command;
#[cfg(feature = "markdown")]
pub mod markdown;
pub mod rich;

use crate::chars::{self, EMOJI_POSTFIX, TEXT_COMMAND};
use crate::conv::{to_u16, to_usize};
use crate::emoji::EmojiId;
use crate::entity::{self, EntityInText, EntityType, TextWithEntities};
use crate::link::{ClickHandlerPtr, LinkData};
use crate::{Block, BlockFlags, ParseFlags, ParseOptions, TextStyle};
use command::{Command, MAX_LINKS};
use std::collections::BTreeMap;

/// Hard cap on the number of chars produced
pub const MAX_CHARS: usize = 0x8000;

/// Skip block placeholder char
pub(crate) const SKIP_CHAR: char = '_';

/// Parser output
#[derive(Debug, Default)]
pub(crate) struct Parsed {
    pub text: String,
    pub blocks: Vec<Block>,
    pub links: Vec<Option<ClickHandlerPtr>>,
}

/// Prepare plain text: detect links if enabled
pub(crate) fn prepare_plain(text: &str, options: &ParseOptions) -> TextWithEntities {
    let mut result = TextWithEntities::plain(text);
    if options.flags.contains(ParseFlags::LINKS) {
        entity::parse_entities(&mut result, options.flags);
    }
    result
}

/// Prepare marked text: drop entities of disabled kinds
pub(crate) fn prepare_marked(mut text: TextWithEntities, options: &ParseOptions) -> TextWithEntities {
    let flags = options.flags;
    if flags.contains(ParseFlags::LINKS) {
        text.entities.retain(|e| match e.kind {
            EntityType::Mention | EntityType::MentionName => flags.contains(ParseFlags::MENTIONS),
            EntityType::Hashtag | EntityType::Cashtag => flags.contains(ParseFlags::HASHTAGS),
            EntityType::BotCommand => flags.contains(ParseFlags::BOT_COMMANDS),
            kind if !kind.flags().is_empty() => flags.contains(ParseFlags::MARKDOWN),
            _ => true,
        });
    }
    text
}

/// Link of the block being built
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LinkRef {
    None,
    /// External link set by command (1-based)
    External(u16),
    /// Index into the parsed link list
    Parsed(usize),
}

#[derive(Clone, Copy, Debug)]
enum Started {
    Flags(BlockFlags),
    Link(usize),
}

struct Parser<'a> {
    style: &'a TextStyle,
    source: &'a str,
    entities: &'a [EntityInText],
    waiting: usize,
    rich: bool,
    multiline: bool,
    stop_after: Option<f32>,
    ptr: usize,
    end: usize,

    text: String,
    chars: usize,
    blocks: Vec<Block>,
    block_links: Vec<LinkRef>,
    links: Vec<LinkData>,
    max_external: u16,

    flags: BlockFlags,
    forced: BlockFlags,
    link: LinkRef,
    emoji: Option<EmojiId>,
    block_start: usize,
    last_skipped: bool,
    diacs: usize,
    newline_awaited: bool,
    sum_width: f32,
    sum_finished: bool,
    started: BTreeMap<usize, Vec<Started>>,
}

/// Parse `source` into blocks
pub(crate) fn parse(style: &TextStyle, source: &TextWithEntities, options: &ParseOptions) -> Parsed {
    let parser = Parser {
        style,
        source: &source.text,
        entities: &source.entities,
        waiting: 0,
        rich: options.flags.contains(ParseFlags::RICH_TEXT),
        multiline: options.flags.contains(ParseFlags::MULTILINE),
        stop_after: options.stop_after_width(style.font_height()),
        ptr: 0,
        end: source.text.len(),
        text: String::with_capacity(source.text.len()),
        chars: 0,
        blocks: Vec::new(),
        block_links: Vec::new(),
        links: Vec::new(),
        max_external: 0,
        flags: BlockFlags::empty(),
        forced: BlockFlags::empty(),
        link: LinkRef::None,
        emoji: None,
        block_start: 0,
        last_skipped: false,
        diacs: 0,
        newline_awaited: false,
        sum_width: 0.0,
        sum_finished: false,
        started: BTreeMap::new(),
    };
    parser.run(source.first_monospace_offset())
}

impl<'a> Parser<'a> {
    fn run(mut self, first_monospace: usize) -> Parsed {
        self.skip_bad_entities();
        self.trim(first_monospace);

        loop {
            while self.check_entities() || (self.rich && self.check_command()) {}
            if self.ptr >= self.end {
                break;
            }
            self.parse_current_char();
            if self.sum_finished {
                log::debug!("parse: width budget reached at byte {}", self.ptr);
                break;
            }
            if self.chars >= MAX_CHARS {
                log::debug!("parse: text truncated to {MAX_CHARS} chars");
                break;
            }
        }
        self.create_block();
        self.check_for_elided_skip_block();
        self.finalize()
    }

    fn trim(&mut self, first_monospace: usize) {
        let rich = self.rich;
        while let Some(c) = self.source[self.ptr..self.end].chars().next() {
            if self.ptr == first_monospace || !chars::is_trimmed(c, rich) {
                break;
            }
            self.ptr += c.len_utf8();
        }
        while let Some(c) = self.source[self.ptr..self.end].chars().next_back() {
            if !chars::is_trimmed(c, rich) {
                break;
            }
            self.end -= c.len_utf8();
        }
    }

    #[inline]
    fn can_link(&self) -> bool {
        self.links.len() + usize::from(self.max_external) < usize::from(MAX_LINKS)
    }

    fn push(&mut self, c: char) {
        self.text.push(c);
        self.chars += 1;
    }

    fn push_block(&mut self, block: Block) {
        self.sum_width += block.width;
        if self.stop_after.is_some_and(|stop| self.sum_width.floor() > stop) {
            self.sum_finished = true;
        }
        self.blocks.push(block);
        self.block_links.push(self.link);
    }

    /// Create a block from pending text, excluding the last `skip_back` bytes
    fn create_block_before(&mut self, skip_back: usize) {
        if let LinkRef::External(index) = self.link {
            self.max_external = self.max_external.max(index);
        }
        let end = self.text.len() - skip_back;
        if end <= self.block_start {
            return;
        }
        let newline = self.emoji.is_none() && &self.text[self.block_start..end] == "\n";
        let mut end = end;
        if self.newline_awaited {
            self.newline_awaited = false;
            if !newline {
                self.text.insert(self.block_start, '\n');
                self.chars += 1;
                self.push_block(Block::newline(self.block_start, self.flags, None));
                self.block_start += 1;
                end += 1;
            }
        }

        self.last_skipped = false;
        let (from, flags) = (self.block_start, self.flags);
        let block = if let Some(id) = self.emoji.take() {
            self.last_skipped = true;
            Block::emoji(self.style, &self.text, from, end, id, flags, None)
        } else if newline {
            Block::newline(from, flags, None)
        } else {
            Block::text(self.style, &self.text, from, end, flags, None)
        };
        self.push_block(block);
        self.block_start = end;
    }

    #[inline]
    fn create_block(&mut self) {
        self.create_block_before(0);
    }

    fn create_skip_block(&mut self, width: f32, height: f32) {
        self.create_block();
        self.push(SKIP_CHAR);
        self.push_block(Block::skip(self.block_start, width, height, None));
        self.block_start += SKIP_CHAR.len_utf8();
    }

    fn create_newline_block(&mut self) {
        self.create_block();
        self.push('\n');
        self.create_block();
    }

    fn set_flag(&mut self, flag: BlockFlags, value: bool) {
        if self.flags.contains(flag) != value {
            self.create_block();
            self.flags.set(flag, value);
        }
    }

    fn finish_entities(&mut self) {
        while let Some(entry) = self.started.first_entry() {
            if self.ptr < *entry.key() && self.ptr < self.end {
                break;
            }
            let list = entry.remove();
            for started in list.into_iter().rev() {
                match started {
                    Started::Flags(flags) => {
                        if self.flags.intersects(flags) {
                            if let Some(end) = self.continued_at(flags) {
                                self.started.entry(end).or_default().push(Started::Flags(flags));
                                continue;
                            }
                            self.create_block();
                            self.flags.remove(flags);
                            if flags.contains(BlockFlags::PRE)
                                && self.blocks.last().is_some_and(|b| !b.is_newline())
                            {
                                self.newline_awaited = true;
                            }
                        }
                    }
                    Started::Link(index) => {
                        if self.link == LinkRef::Parsed(index) {
                            self.create_block();
                            self.link = LinkRef::None;
                        }
                    }
                }
            }
        }
    }

    /// End of an entity with the same `flags` starting at the current position
    ///
    /// Formatting continued by such an entity stays open, so adjacent entities
    /// of one kind produce a single block.
    fn continued_at(&self, flags: BlockFlags) -> Option<usize> {
        if self.ptr >= self.end || flags.contains(BlockFlags::PRE) {
            return None;
        }
        let pending = self.entities.get(self.waiting..).unwrap_or_default();
        pending
            .iter()
            .take_while(|e| to_usize(e.offset) <= self.ptr)
            .find(|e| {
                to_usize(e.offset) == self.ptr
                    && e.kind.flags() == flags
                    && !self.is_invalid_entity(e)
            })
            .map(EntityInText::end)
    }

    fn is_invalid_entity(&self, entity: &EntityInText) -> bool {
        let range = entity.range();
        range.is_empty()
            || range.end > self.source.len()
            || !self.source.is_char_boundary(range.start)
            || !self.source.is_char_boundary(range.end)
    }

    fn skip_bad_entities(&mut self) {
        let skip_links = !self.can_link();
        let entities = self.entities;
        while let Some(entity) = entities.get(self.waiting) {
            if self.is_invalid_entity(entity) {
                log::debug!("parse: skipping invalid entity {entity:?}");
            } else if !(skip_links && entity.kind.is_link()) {
                break;
            }
            self.waiting += 1;
        }
    }

    fn skip_passed_entities(&mut self) {
        loop {
            self.skip_bad_entities();
            match self.entities.get(self.waiting) {
                Some(entity) if entity.end() <= self.ptr => self.waiting += 1,
                _ => break,
            }
        }
    }

    /// Returns true if an entity was started at the current position
    fn check_entities(&mut self) -> bool {
        self.finish_entities();
        self.skip_passed_entities();
        if self.ptr >= self.end {
            return false;
        }
        let (source, entities) = (self.source, self.entities);
        let Some(entity) = entities.get(self.waiting) else {
            return false;
        };
        let begin = to_usize(entity.offset);
        if self.ptr < begin {
            return false;
        }
        let end = entity.end();
        let kind = entity.kind;

        if kind == EntityType::Pre {
            self.create_block();
            if self.blocks.last().is_some_and(|b| !b.is_newline()) {
                self.create_newline_block();
            }
        }

        if kind.is_link() {
            let source_text = &source[begin..end];
            let (data, displayed_full) = match kind {
                EntityType::CustomUrl | EntityType::MentionName => (entity.data.clone(), true),
                EntityType::Url => (source_text.to_string(), self.displayed_full(source_text)),
                _ => (source_text.to_string(), true),
            };
            self.create_block();
            self.links.push(LinkData {
                kind,
                text: source_text.to_string(),
                data,
                displayed_full,
            });
            let index = self.links.len() - 1;
            self.link = LinkRef::Parsed(index);
            self.started.entry(end).or_default().push(Started::Link(index));
        } else {
            let flags = kind.flags();
            if !flags.is_empty() && !self.flags.contains(flags) {
                self.create_block();
                self.flags.insert(flags);
                self.started.entry(end).or_default().push(Started::Flags(flags));
            }
        }

        self.waiting += 1;
        self.skip_bad_entities();
        true
    }

    fn displayed_full(&self, url: &str) -> bool {
        self.style
            .link_crop_limit
            .map_or(true, |limit| url.chars().count() <= limit)
    }

    fn check_command(&mut self) -> bool {
        let mut result = false;
        while self.source[self.ptr..self.end].starts_with(TEXT_COMMAND) {
            if !self.read_command() {
                break;
            }
            result = true;
        }
        result
    }

    fn read_command(&mut self) -> bool {
        let source: &'a str = &self.source[..self.end];
        let Some((cmd, after)) = command::read_command(source, self.ptr, self.can_link()) else {
            return false;
        };

        match cmd {
            Command::Bold => self.set_flag(BlockFlags::BOLD, true),
            Command::NoBold => self.set_flag(BlockFlags::BOLD, false),
            Command::Semibold => self.set_flag(BlockFlags::SEMIBOLD, true),
            Command::NoSemibold => self.set_flag(BlockFlags::SEMIBOLD, false),
            Command::Italic => self.set_flag(BlockFlags::ITALIC, true),
            Command::NoItalic => self.set_flag(BlockFlags::ITALIC, false),
            Command::Underline => self.set_flag(BlockFlags::UNDERLINE, true),
            Command::NoUnderline => self.set_flag(BlockFlags::UNDERLINE, false),
            Command::StrikeOut => self.set_flag(BlockFlags::STRIKE_OUT, true),
            Command::NoStrikeOut => self.set_flag(BlockFlags::STRIKE_OUT, false),
            Command::LinkIndex(index) => {
                let link = match index {
                    0 => LinkRef::None,
                    index => LinkRef::External(index),
                };
                if link != self.link {
                    self.create_block();
                    self.link = link;
                }
            }
            Command::LinkText(url) => {
                self.create_block();
                self.links.push(LinkData {
                    kind: EntityType::CustomUrl,
                    text: String::new(),
                    data: url.to_string(),
                    displayed_full: true,
                });
                self.link = LinkRef::Parsed(self.links.len() - 1);
            }
            Command::SkipBlock { width, height } => {
                self.create_skip_block(f32::from(width), f32::from(height));
            }
            Command::LangTag(_) | Command::Other(_) => (),
        }

        self.ptr = after;
        true
    }

    fn parse_current_char(&mut self) {
        let Some(c) = self.source[self.ptr..self.end].chars().next() else {
            return;
        };
        let start = self.ptr;
        self.ptr += c.len_utf8();

        let is_newline = self.multiline && chars::is_newline(c);
        let is_space = chars::is_space(c, false);
        let is_diac = chars::is_diacritic(c);
        let skip = if chars::is_bad(c) {
            true
        } else if is_diac {
            if self.last_skipped || self.emoji.is_some() {
                true
            } else {
                self.diacs += 1;
                self.diacs > self.style.policy.max_diacritics
            }
        } else {
            false
        };

        self.last_skipped = skip;
        if skip {
            return;
        }

        let forced = self.style.policy.forced_style(c).unwrap_or_default();
        if forced != self.forced {
            self.create_block();
            self.flags.remove(self.forced);
            self.flags.insert(forced);
            self.forced = forced;
        }

        if is_newline {
            self.create_newline_block();
        } else if is_space {
            self.push(' ');
        } else {
            if self.emoji.is_some() || (self.stop_after.is_some() && self.text.ends_with(' ')) {
                // with a width budget, blocks also end before each word
                self.create_block();
            }
            self.push(c);
            self.parse_emoji(start, c);
        }
        if !is_diac {
            self.diacs = 0;
        }
    }

    /// Match an emoji starting at `start`, whose first char is already pushed
    fn parse_emoji(&mut self, start: usize, first: char) {
        let source = self.source;
        let Some(found) = self.style.emoji.find(&source[start..self.end]) else {
            return;
        };
        let end = start + to_usize(found.len);
        if end < self.ptr || end > self.end || !source.is_char_boundary(end) {
            return;
        }
        let mut len = first.len_utf8();
        for c in source[self.ptr..end].chars() {
            self.push(c);
            len += c.len_utf8();
        }
        if found.postfix && !self.text.ends_with(EMOJI_POSTFIX) {
            self.push(EMOJI_POSTFIX);
            len += EMOJI_POSTFIX.len_utf8();
        }
        self.ptr = end;

        self.create_block_before(len);
        self.emoji = Some(found.id);
    }

    fn check_for_elided_skip_block(&mut self) {
        if !self.sum_finished || !self.rich {
            return;
        }
        let source: &'a str = &self.source[..self.end];
        while let Some(offset) = source[self.ptr..].find(TEXT_COMMAND) {
            let at = self.ptr + offset;
            if let Some((cmd, _)) = command::read_command(source, at, self.can_link()) {
                if let Command::SkipBlock { width, height } = cmd {
                    self.create_skip_block(f32::from(width), f32::from(height));
                }
                break;
            }
            self.ptr = at + TEXT_COMMAND.len_utf8();
        }
    }

    fn finalize(self) -> Parsed {
        let mut table: Vec<Option<ClickHandlerPtr>> = vec![None; usize::from(self.max_external)];
        let mut assigned: Vec<Option<u16>> = vec![None; self.links.len()];
        let mut blocks = self.blocks;
        for (block, link) in blocks.iter_mut().zip(&self.block_links) {
            block.link = match *link {
                LinkRef::None => None,
                LinkRef::External(index) => Some(index - 1),
                LinkRef::Parsed(i) => {
                    let index = match assigned[i] {
                        Some(index) => index,
                        None => {
                            let index = to_u16(table.len());
                            table.push(create_handler(self.style, &self.links[i]));
                            assigned[i] = Some(index);
                            index
                        }
                    };
                    Some(index)
                }
            };
        }
        Parsed {
            text: self.text,
            blocks,
            links: table,
        }
    }
}

fn create_handler(style: &TextStyle, link: &LinkData) -> Option<ClickHandlerPtr> {
    match style.links.create(link) {
        Ok(handler) => handler,
        Err(err) => {
            log::warn!("parse: no handler for {:?} link: {err}", link.kind);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaper::MonoShaper;
    use crate::{BlockKind, DEFAULT_OPTIONS, PLAIN_OPTIONS};
    use std::sync::Arc;

    fn style() -> TextStyle {
        TextStyle::new(Arc::new(MonoShaper::new(10.0, 20.0)))
    }

    fn parse_str(text: &str, options: ParseOptions) -> Parsed {
        let style = style();
        parse(&style, &prepare_plain(text, &options), &options)
    }

    fn kinds(parsed: &Parsed) -> Vec<&'static str> {
        parsed
            .blocks
            .iter()
            .map(|b| match b.kind {
                BlockKind::Text { .. } => "text",
                BlockKind::Newline { .. } => "newline",
                BlockKind::Emoji { .. } => "emoji",
                BlockKind::Skip { .. } => "skip",
            })
            .collect()
    }

    #[test]
    fn trim_and_newlines() {
        let parsed = parse_str("  ab\ncd \n ", PLAIN_OPTIONS);
        assert_eq!(parsed.text, "ab\ncd");
        assert_eq!(kinds(&parsed), vec!["text", "newline", "text"]);
        assert_eq!(parsed.blocks[1].from, 2);
        assert_eq!(parsed.blocks[2].from, 3);

        let single = ParseOptions::new(ParseFlags::empty());
        let parsed = parse_str("ab\ncd", single);
        assert_eq!(parsed.text, "ab cd");
        assert_eq!(kinds(&parsed), vec!["text"]);
    }

    #[test]
    fn bad_chars_and_diacritics() {
        let parsed = parse_str("a\u{0}b", PLAIN_OPTIONS);
        assert_eq!(parsed.text, "ab");

        let text = "e\u{301}\u{301}\u{301}\u{301}";
        let parsed = parse_str(text, PLAIN_OPTIONS);
        assert_eq!(parsed.text, "e\u{301}\u{301}");
    }

    #[test]
    fn emoji_blocks() {
        let parsed = parse_str("hi \u{1F600}  there", PLAIN_OPTIONS);
        assert_eq!(kinds(&parsed), vec!["text", "emoji", "text"]);
        assert_eq!(parsed.blocks[1].from, 3);
        assert_eq!(parsed.blocks[2].from, 9);
        assert_eq!(parsed.blocks[1].rpadding, 20.0);

        let parsed = parse_str("1\u{20E3}", PLAIN_OPTIONS);
        assert_eq!(parsed.text, "1\u{20E3}\u{FE0F}");
        assert_eq!(kinds(&parsed), vec!["emoji"]);
    }

    #[test]
    fn entities_and_links() {
        let style = style();
        let text = TextWithEntities {
            text: "bold link".into(),
            entities: vec![
                EntityInText::new(EntityType::Bold, 0, 4),
                EntityInText::with_data(EntityType::CustomUrl, 5, 4, "https://x.y".into()),
            ],
        };
        let options = crate::MESSAGE_OPTIONS;
        let parsed = parse(&style, &prepare_marked(text, &options), &options);
        assert_eq!(parsed.blocks.len(), 3);
        assert_eq!(parsed.blocks[0].flags, BlockFlags::SEMIBOLD);
        assert_eq!(parsed.blocks[1].flags, BlockFlags::empty());
        assert_eq!(parsed.blocks[2].link, Some(0));
        assert_eq!(parsed.links.len(), 1);
        assert!(parsed.links[0].is_some());
    }

    fn parse_marked(text: &str, entities: Vec<EntityInText>) -> Parsed {
        let style = style();
        let source = TextWithEntities {
            text: text.into(),
            entities,
        };
        let options = crate::MESSAGE_OPTIONS;
        parse(&style, &prepare_marked(source, &options), &options)
    }

    #[test]
    fn invalid_entities_after_trim() {
        // the url splits 'é'; it follows an entity passed by trimming
        let entities = vec![
            EntityInText::new(EntityType::Bold, 0, 1),
            EntityInText::new(EntityType::Url, 1, 1),
        ];
        let parsed = parse_marked(" \u{e9}x", entities);
        assert_eq!(parsed.text, "\u{e9}x");
        assert!(parsed.links.is_empty());
        assert_eq!(parsed.blocks.len(), 1);
        assert_eq!(parsed.blocks[0].link, None);
    }

    #[test]
    fn entities_past_trimmed_end() {
        let entities = vec![
            EntityInText::new(EntityType::Bold, 1, 3),
            EntityInText::new(EntityType::Pre, 3, 1),
        ];
        let parsed = parse_marked("c d ", entities);
        assert_eq!(parsed.text, "c d");
        assert_eq!(kinds(&parsed), vec!["text", "text"]);
        assert_eq!(parsed.blocks[1].flags, BlockFlags::SEMIBOLD);
    }

    #[test]
    fn adjacent_entities_merge() {
        let entities = vec![
            EntityInText::new(EntityType::Italic, 1, 1),
            EntityInText::new(EntityType::Italic, 2, 4),
        ];
        let parsed = parse_marked("abcdefg", entities);
        assert_eq!(parsed.blocks.len(), 3);
        assert_eq!(parsed.blocks[1].from, 1);
        assert_eq!(parsed.blocks[1].flags, BlockFlags::ITALIC);
        assert_eq!(parsed.blocks[2].from, 6);
        assert_eq!(parsed.blocks[2].flags, BlockFlags::empty());

        // pre blocks stay separate paragraphs
        let entities = vec![
            EntityInText::new(EntityType::Pre, 0, 2),
            EntityInText::new(EntityType::Pre, 2, 2),
        ];
        let parsed = parse_marked("abcd", entities);
        assert_eq!(parsed.text, "ab\ncd");
    }

    #[test]
    fn char_limit() {
        let text = "a".repeat(MAX_CHARS + 100);
        let parsed = parse_str(&text, PLAIN_OPTIONS);
        assert_eq!(parsed.text.chars().count(), MAX_CHARS);

        let text = "\u{e9} ".repeat(MAX_CHARS);
        let parsed = parse_str(&text, PLAIN_OPTIONS);
        assert!(parsed.text.chars().count() <= MAX_CHARS);
    }

    #[test]
    fn blocks_cover_text() {
        let entities = vec![
            EntityInText::new(EntityType::Bold, 0, 3),
            EntityInText::with_data(EntityType::CustomUrl, 4, 7, "https://x.y".into()),
            EntityInText::new(EntityType::Pre, 16, 4),
        ];
        let parsed = parse_marked("one \u{1F600}two\nsix code end", entities);
        assert_eq!(parsed.blocks[0].from, 0);
        for (i, block) in parsed.blocks.iter().enumerate() {
            let end = parsed
                .blocks
                .get(i + 1)
                .map_or(parsed.text.len(), |next| to_usize(next.from));
            assert!(to_usize(block.from) < end, "empty block {i}");
            if block.is_newline() {
                assert_eq!(&parsed.text[to_usize(block.from)..end], "\n");
            }
        }
    }

    #[test]
    fn markdown_filtered() {
        let style = style();
        let text = TextWithEntities {
            text: "bold".into(),
            entities: vec![EntityInText::new(EntityType::Bold, 0, 4)],
        };
        let parsed = parse(&style, &prepare_marked(text, &DEFAULT_OPTIONS), &DEFAULT_OPTIONS);
        assert_eq!(parsed.blocks[0].flags, BlockFlags::empty());
    }

    #[test]
    fn pre_forces_paragraphs() {
        let style = style();
        let text = TextWithEntities {
            text: "a code b".into(),
            entities: vec![EntityInText::new(EntityType::Pre, 2, 4)],
        };
        let options = crate::MESSAGE_OPTIONS;
        let parsed = parse(&style, &prepare_marked(text, &options), &options);
        assert_eq!(parsed.text, "a \ncode\n b");
        assert_eq!(kinds(&parsed), vec!["text", "newline", "text", "newline", "text"]);
        assert_eq!(parsed.blocks[2].flags, BlockFlags::PRE);
    }

    #[test]
    fn commands() {
        let source = format!(
            "{}x{} y{}",
            command::start_semibold(),
            command::stop_semibold(),
            command::skip_block(30, 14)
        );
        let options = ParseOptions::new(ParseFlags::RICH_TEXT);
        let parsed = parse_str(&source, options);
        assert_eq!(parsed.text, "x y_");
        assert_eq!(kinds(&parsed), vec!["text", "text", "skip"]);
        assert_eq!(parsed.blocks[0].flags, BlockFlags::SEMIBOLD);
        assert_eq!(parsed.blocks[2].width, 30.0);

        // Without RICH_TEXT commands are whitespace
        let parsed = parse_str(&command::skip_block(1, 1), PLAIN_OPTIONS);
        assert!(!parsed.text.contains('_'));
    }

    #[test]
    fn external_links() {
        let source = format!("a {} b", command::link(2, "link"));
        let options = ParseOptions::new(ParseFlags::RICH_TEXT);
        let parsed = parse_str(&source, options);
        assert_eq!(parsed.text, "a link b");
        assert_eq!(parsed.links.len(), 2);
        assert_eq!(parsed.blocks[1].link, Some(1));
        assert_eq!(parsed.blocks[2].link, None);
    }

    #[test]
    fn width_budget() {
        let text = "word ".repeat(100);
        let options = PLAIN_OPTIONS.with_budget(100.0, 20.0);
        let parsed = parse_str(&text, options);
        assert!(parsed.text.len() < text.len());

        // the trailing skip block survives the early stop
        let source = format!("{}{}", text, command::skip_block(30, 14));
        let options = ParseOptions::new(ParseFlags::RICH_TEXT).with_budget(100.0, 20.0);
        let parsed = parse_str(&source, options);
        assert!(parsed.blocks.last().unwrap().is_skip());
    }

    #[test]
    fn forced_style() {
        let mut style = style();
        style.policy = crate::chars::CharPolicy::with_tilde_fix();
        let options = PLAIN_OPTIONS;
        let parsed = parse(&style, &prepare_plain("a~b", &options), &options);
        assert_eq!(parsed.blocks.len(), 3);
        assert_eq!(parsed.blocks[1].flags, BlockFlags::TILDE_FIX);
        assert_eq!(parsed.blocks[2].flags, BlockFlags::empty());
    }
}
