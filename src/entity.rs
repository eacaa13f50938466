// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Entities: formatting and link annotations over text ranges
//!
//! Entities are the common input format of server-formatted messages and the
//! output of text extraction. This module also contains the entity finder
//! used to detect links in plain text.

use crate::chars::TEXT_COMMAND;
use crate::conv::{to_u32, to_usize};
use crate::parser::command;
use crate::{BlockFlags, ParseFlags};
use regex_lite::Regex;
use std::ops::Range;
use std::sync::OnceLock;

/// Type of an entity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntityType {
    Url,
    /// A link with custom text; `data` is the target URL
    CustomUrl,
    Email,
    Hashtag,
    Cashtag,
    Mention,
    /// A mention by user id; `data` is `"user_id.access_hash"`
    MentionName,
    BotCommand,
    Bold,
    Italic,
    Underline,
    StrikeOut,
    Code,
    Pre,
}

impl EntityType {
    /// True for types which create a link
    pub fn is_link(self) -> bool {
        use EntityType::*;
        matches!(
            self,
            Url | CustomUrl | Email | Hashtag | Cashtag | Mention | MentionName | BotCommand
        )
    }

    /// Block flags applied by formatting types
    pub fn flags(self) -> BlockFlags {
        match self {
            EntityType::Bold => BlockFlags::SEMIBOLD,
            EntityType::Italic => BlockFlags::ITALIC,
            EntityType::Underline => BlockFlags::UNDERLINE,
            EntityType::StrikeOut => BlockFlags::STRIKE_OUT,
            EntityType::Code => BlockFlags::CODE,
            EntityType::Pre => BlockFlags::PRE,
            _ => BlockFlags::empty(),
        }
    }

    /// True for monospace types
    #[inline]
    pub fn is_mono(self) -> bool {
        matches!(self, EntityType::Code | EntityType::Pre)
    }
}

/// An entity: `kind` applied over `offset..offset + length` (in bytes)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityInText {
    pub kind: EntityType,
    pub offset: u32,
    pub length: u32,
    /// Extra payload (custom URL target, mention-by-id fields)
    #[cfg_attr(feature = "serde", serde(default))]
    pub data: String,
}

impl EntityInText {
    /// Construct without data
    pub fn new(kind: EntityType, offset: usize, length: usize) -> Self {
        EntityInText {
            kind,
            offset: to_u32(offset),
            length: to_u32(length),
            data: String::new(),
        }
    }

    /// Construct with data
    pub fn with_data(kind: EntityType, offset: usize, length: usize, data: String) -> Self {
        EntityInText {
            data,
            ..EntityInText::new(kind, offset, length)
        }
    }

    /// The covered byte range
    #[inline]
    pub fn range(&self) -> Range<usize> {
        to_usize(self.offset)..to_usize(self.offset) + to_usize(self.length)
    }

    #[inline]
    pub fn end(&self) -> usize {
        to_usize(self.offset) + to_usize(self.length)
    }
}

/// Text with a list of entities (in ascending offset order)
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextWithEntities {
    pub text: String,
    pub entities: Vec<EntityInText>,
}

impl TextWithEntities {
    /// Plain text without entities
    pub fn plain(text: impl Into<String>) -> Self {
        TextWithEntities {
            text: text.into(),
            entities: vec![],
        }
    }

    /// Offset of the first code or pre entity, or the text length
    pub fn first_monospace_offset(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| e.kind.is_mono())
            .map(|e| to_usize(e.offset))
            .min()
            .unwrap_or(self.text.len())
    }
}

impl From<&str> for TextWithEntities {
    fn from(text: &str) -> Self {
        TextWithEntities::plain(text)
    }
}

/// Extraction result for clipboard use
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextForMimeData {
    /// Text plus entities, suitable for re-parsing
    pub rich: TextWithEntities,
    /// Plain text with custom link targets expanded as `"text (url)"`
    pub expanded: String,
}

impl TextForMimeData {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rich.text.is_empty()
    }
}

const PROTOCOLS: &[&str] = &["itmss", "http", "https", "ftp", "tg"];

const GENERIC_DOMAINS: &[&str] = &[
    "aero", "app", "art", "asia", "biz", "blog", "cat", "cloud", "com", "coop", "dev", "edu",
    "gov", "info", "int", "io", "jobs", "mil", "mobi", "museum", "name", "net", "online", "org",
    "page", "pro", "shop", "site", "store", "tech", "tel", "travel", "xxx", "xyz",
];

fn is_valid_protocol(protocol: &str) -> bool {
    PROTOCOLS.contains(&protocol)
}

fn is_valid_top_domain(domain: &str) -> bool {
    (domain.len() == 2 && domain.bytes().all(|b| b.is_ascii_alphabetic()))
        || GENERIC_DOMAINS.contains(&domain)
}

fn domain_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:([a-zA-Z]+)://)?((?:[A-Za-z0-9\-_]+\.){1,10}([A-Za-z0-9\-]{2,22})(?::[0-9]+)?)").ok()
    })
    .as_ref()
}

fn explicit_domain_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-zA-Z]+)://((?:[A-Za-z0-9\-_]+\.){0,10}([A-Za-z0-9\-]{2,22})(?::[0-9]+)?)").ok()
    })
    .as_ref()
}

fn is_quote(c: char) -> bool {
    matches!(
        c,
        '\u{AB}' | '\u{BB}' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}' | '\u{2026}'
    )
}

/// Chars which may precede a mention, hashtag or bot command
fn is_separator(c: char, additional: &str) -> bool {
    c.is_whitespace()
        || c == TEXT_COMMAND
        || is_quote(c)
        || ".,:;<>|'\"[]{}~!?%^()-+=".contains(c)
        || additional.contains(c)
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Chars which a domain may not follow directly
fn blocks_domain(c: char) -> bool {
    is_word_char(c) || matches!(c, '$' | '-' | '%' | '=' | '.')
}

fn is_link_end(c: char) -> bool {
    c == TEXT_COMMAND
        || crate::chars::is_bad(c)
        || crate::chars::is_space(c, false)
        || crate::chars::is_newline(c)
}

fn is_almost_link_end(c: char) -> bool {
    matches!(c, '?' | ',' | '.' | '"' | ':' | '!' | '\'')
}

/// Length of the run of chars matching `pred` (at most `max` chars)
fn run_len(text: &str, max: usize, pred: impl Fn(char) -> bool) -> (usize, usize) {
    let mut bytes = 0;
    let mut count = 0;
    for c in text.chars() {
        if count == max || !pred(c) {
            break;
        }
        bytes += c.len_utf8();
        count += 1;
    }
    (bytes, count)
}

fn ends_word(text: &str) -> bool {
    text.chars().next().map_or(true, |c| !is_word_char(c))
}

struct Finder<'a> {
    text: &'a str,
    flags: ParseFlags,
    /// Last found entity end (matches are non-overlapping)
    consumed: usize,
}

impl<'a> Finder<'a> {
    fn prev_char(&self, pos: usize) -> Option<char> {
        self.text[..pos].chars().next_back()
    }

    fn after_separator(&self, pos: usize, additional: &str) -> bool {
        self.prev_char(pos)
            .map_or(true, |c| is_separator(c, additional))
    }

    fn mention(&self, pos: usize) -> Option<EntityInText> {
        if !self.flags.contains(ParseFlags::MENTIONS) || !self.after_separator(pos, "`*/") {
            return None;
        }
        let rest = &self.text[pos + 1..];
        let (len, _) = run_len(rest, 32, |c| c.is_ascii_alphanumeric() || c == '_');
        let name = &rest[..len];
        if len == 0 || !ends_word(&rest[len..]) {
            return None;
        }
        let first = name.chars().next()?;
        let last = name.chars().next_back()?;
        if !first.is_alphabetic() || !last.is_alphanumeric() {
            return None;
        }
        Some(EntityInText::new(EntityType::Mention, pos, len + 1))
    }

    fn hashtag(&self, pos: usize) -> Option<EntityInText> {
        if !self.flags.contains(ParseFlags::HASHTAGS) || !self.after_separator(pos, "`*/") {
            return None;
        }
        let rest = &self.text[pos + 1..];
        let (len, count) = run_len(rest, 64, is_word_char);
        if count < 2 || !ends_word(&rest[len..]) {
            return None;
        }
        if rest[..len].chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(EntityInText::new(EntityType::Hashtag, pos, len + 1))
    }

    fn cashtag(&self, pos: usize) -> Option<EntityInText> {
        if !self.flags.contains(ParseFlags::HASHTAGS) || !self.after_separator(pos, "`*/") {
            return None;
        }
        let rest = &self.text[pos + 1..];
        let (len, _) = run_len(rest, 8, |c| c.is_ascii_uppercase());
        if len == 0 || !ends_word(&rest[len..]) {
            return None;
        }
        Some(EntityInText::new(EntityType::Cashtag, pos, len + 1))
    }

    fn bot_command(&self, pos: usize) -> Option<EntityInText> {
        if !self.flags.contains(ParseFlags::BOT_COMMANDS) || !self.after_separator(pos, "`*") {
            return None;
        }
        let ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
        let rest = &self.text[pos + 1..];
        let (mut len, _) = run_len(rest, 64, ident);
        if len == 0 {
            return None;
        }
        if rest[len..].starts_with('@') {
            let (bot, count) = run_len(&rest[len + 1..], 32, ident);
            if count >= 5 {
                len += 1 + bot;
            }
        }
        if !ends_word(&rest[len..]) {
            return None;
        }
        Some(EntityInText::new(EntityType::BotCommand, pos, len + 1))
    }

    /// Match a URL or e-mail whose domain (or protocol) starts at `pos`
    fn link(&self, pos: usize) -> Option<(EntityInText, usize)> {
        if self.prev_char(pos).is_some_and(blocks_domain) {
            return None;
        }
        let rest = &self.text[pos..];
        let caps = explicit_domain_regex()
            .and_then(|re| re.captures(rest))
            .or_else(|| domain_regex().and_then(|re| re.captures(rest)))?;
        let domain_end = pos + caps.get(0)?.end();
        let protocol = caps
            .get(1)
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_default();
        let top_domain = caps.get(3)?.as_str().to_ascii_lowercase();

        if protocol.is_empty() && self.prev_char(pos) == Some('@') {
            let at = pos - 1;
            let name_start = self.text[..at]
                .char_indices()
                .rev()
                .take_while(|(i, c)| {
                    *i >= self.consumed && (c.is_ascii_alphanumeric() || "-_.".contains(*c))
                })
                .last()
                .map(|(i, _)| i);
            if let Some(start) = name_start {
                let email = EntityInText::new(EntityType::Email, start, domain_end - start);
                return Some((email, domain_end));
            }
        }

        let protocol_valid = protocol.is_empty() || is_valid_protocol(&protocol);
        let top_domain_valid = !protocol.is_empty() || is_valid_top_domain(&top_domain);
        if !protocol_valid || !top_domain_valid {
            return None;
        }

        let end = self.link_end(domain_end);
        if end > domain_end && !matches!(self.text[domain_end..].chars().next(), Some('/' | '?')) {
            return None;
        }
        Some((EntityInText::new(EntityType::Url, pos, end - pos), end))
    }

    /// Extend a link over its path, balancing brackets
    fn link_end(&self, domain_end: usize) -> usize {
        let mut brackets: Vec<(usize, char)> = Vec::new();
        let mut iter = self.text[domain_end..].char_indices().peekable();
        let mut p = domain_end;
        while let Some((i, c)) = iter.next() {
            p = domain_end + i;
            if is_link_end(c) {
                return p;
            }
            let mut c = c;
            if is_almost_link_end(c) {
                // Trailing punctuation is not part of a link
                let mut next = None;
                while let Some(&(j, d)) = iter.peek() {
                    if !is_almost_link_end(d) {
                        next = Some((j, d));
                        break;
                    }
                    iter.next();
                }
                match next {
                    Some((j, d)) if !is_link_end(d) => {
                        iter.next();
                        p = domain_end + j;
                        c = d;
                    }
                    _ => return p,
                }
            }
            match c {
                '(' | '[' | '{' | '<' => brackets.push((p, c)),
                ')' | ']' | '}' | '>' => {
                    let Some((q, open)) = brackets.pop() else {
                        return p;
                    };
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        '}' => '{',
                        _ => '<',
                    };
                    if open != expected {
                        return q;
                    }
                }
                _ => (),
            }
            p += c.len_utf8();
        }
        p.max(domain_end)
    }

    fn find(&mut self, protected: &[Range<usize>]) -> Vec<EntityInText> {
        let mut found = Vec::new();
        let mut pos = 0;
        while pos < self.text.len() {
            if let Some(range) = protected.iter().find(|r| r.contains(&pos)) {
                pos = range.end;
                continue;
            }
            let Some(c) = self.text[pos..].chars().next() else {
                break;
            };
            let entity = match c {
                '@' => self.mention(pos).map(|e| {
                    let end = e.end();
                    (e, end)
                }),
                '#' => self.hashtag(pos).map(|e| {
                    let end = e.end();
                    (e, end)
                }),
                '$' => self.cashtag(pos).map(|e| {
                    let end = e.end();
                    (e, end)
                }),
                '/' => self.bot_command(pos).map(|e| {
                    let end = e.end();
                    (e, end)
                }),
                c if c.is_ascii_alphanumeric() => self.link(pos),
                _ => None,
            };
            match entity {
                Some((entity, end)) if !protected.iter().any(|r| r.start < end && pos < r.end) => {
                    self.consumed = end;
                    found.push(entity);
                    pos = end;
                }
                _ => pos += c.len_utf8(),
            }
        }
        found
    }
}

/// Find link entities in `text`
///
/// Recognised: URLs and e-mails, plus mentions, hashtags, cashtags and bot
/// commands as enabled by `flags`. With [`ParseFlags::RICH_TEXT`], inline
/// commands and links started by commands are skipped.
pub fn find_entities(text: &str, flags: ParseFlags) -> Vec<EntityInText> {
    let protected = if flags.contains(ParseFlags::RICH_TEXT) {
        command::protected_ranges(text)
    } else {
        vec![]
    };
    let mut finder = Finder {
        text,
        flags,
        consumed: 0,
    };
    finder.find(&protected)
}

/// Add entities found in `text.text` which do not overlap existing entities
pub fn parse_entities(text: &mut TextWithEntities, flags: ParseFlags) {
    let found = find_entities(&text.text, flags);
    if found.is_empty() {
        return;
    }
    let existing = std::mem::take(&mut text.entities);
    let mut merged: Vec<EntityInText> = found
        .into_iter()
        .filter(|e| {
            !existing
                .iter()
                .any(|x| x.range().start < e.end() && to_usize(e.offset) < x.end())
        })
        .collect();
    merged.extend(existing);
    merged.sort_by_key(|e| e.offset);
    text.entities = merged;
}
