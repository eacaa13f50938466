// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Inline control commands
//!
//! A command is [`TEXT_COMMAND`], a code char, zero or more arguments and a
//! closing [`TEXT_COMMAND`]. Numeric arguments are stored as the char
//! `U+10000 + value` so that every value in `0..=0xFFFF` is a valid scalar.
//! Commands are honoured only when parsing with
//! [`crate::ParseFlags::RICH_TEXT`]; a sequence which does not form a valid
//! command is parsed as ordinary text.

use crate::chars::TEXT_COMMAND;
use std::ops::Range;

const BOLD: u32 = 0x01;
const NO_BOLD: u32 = 0x02;
const ITALIC: u32 = 0x03;
const NO_ITALIC: u32 = 0x04;
const UNDERLINE: u32 = 0x05;
const NO_UNDERLINE: u32 = 0x06;
const SEMIBOLD: u32 = 0x07;
const NO_SEMIBOLD: u32 = 0x08;
const LINK_INDEX: u32 = 0x09;
const LINK_TEXT: u32 = 0x0A;
const SKIP_BLOCK: u32 = 0x0D;
const STRIKE_OUT: u32 = 0x0E;
const NO_STRIKE_OUT: u32 = 0x0F;
const LANG_TAG: u32 = 0x20;

const ARG_BASE: u32 = 0x10000;

/// Maximum link index (and link table size)
pub const MAX_LINKS: u16 = 0x7FFF;

/// Maximum length (in chars) of a URL in a link command
pub const MAX_URL_LEN: usize = 4096;

/// A decoded command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Bold,
    NoBold,
    Italic,
    NoItalic,
    Underline,
    NoUnderline,
    Semibold,
    NoSemibold,
    StrikeOut,
    NoStrikeOut,
    /// Start an external link (`0` stops the current link)
    LinkIndex(u16),
    /// Start a link to a URL
    LinkText(&'a str),
    /// Reserve space of the given size
    SkipBlock { width: u16, height: u16 },
    /// Language hint (ignored)
    LangTag(u16),
    /// Any other code without arguments (ignored)
    Other(u32),
}

fn arg(c: char) -> Option<u16> {
    u32::from(c)
        .checked_sub(ARG_BASE)
        .and_then(|v| u16::try_from(v).ok())
}

fn arg_char(value: u16) -> char {
    // ARG_BASE + u16 is always a valid scalar value
    char::from_u32(ARG_BASE + u32::from(value)).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Read the command starting at `pos`
///
/// Returns the command and the byte position following it, or `None` if
/// `text[pos..]` does not start with a valid command. URL links are only
/// valid if `can_link`.
pub fn read_command(text: &str, pos: usize, can_link: bool) -> Option<(Command<'_>, usize)> {
    let rest = text.get(pos..)?;
    let mut iter = rest.char_indices();
    if iter.next()?.1 != TEXT_COMMAND {
        return None;
    }
    let code = u32::from(iter.next()?.1);

    let cmd = match code {
        LINK_INDEX => Command::LinkIndex(arg(iter.next()?.1).filter(|i| *i <= MAX_LINKS)?),
        LINK_TEXT => {
            let len = usize::from(arg(iter.next()?.1)?);
            if len >= MAX_URL_LEN || !can_link {
                return None;
            }
            let start = iter.offset();
            for _ in 0..len {
                iter.next()?;
            }
            Command::LinkText(&rest[start..iter.offset()])
        }
        SKIP_BLOCK => {
            let width = arg(iter.next()?.1)?;
            let height = arg(iter.next()?.1)?;
            Command::SkipBlock { width, height }
        }
        LANG_TAG => Command::LangTag(arg(iter.next()?.1)?),
        BOLD => Command::Bold,
        NO_BOLD => Command::NoBold,
        ITALIC => Command::Italic,
        NO_ITALIC => Command::NoItalic,
        UNDERLINE => Command::Underline,
        NO_UNDERLINE => Command::NoUnderline,
        SEMIBOLD => Command::Semibold,
        NO_SEMIBOLD => Command::NoSemibold,
        STRIKE_OUT => Command::StrikeOut,
        NO_STRIKE_OUT => Command::NoStrikeOut,
        code => Command::Other(code),
    };
    let (index, c) = iter.next()?;
    (c == TEXT_COMMAND).then_some((cmd, pos + index + c.len_utf8()))
}

/// Position after the command at `pos`, or `pos` if there is none
pub fn skip_command(text: &str, pos: usize, can_link: bool) -> usize {
    read_command(text, pos, can_link).map_or(pos, |(_, end)| end)
}

/// Encode a command
pub fn encode(cmd: Command) -> String {
    let mut s = String::with_capacity(8);
    s.push(TEXT_COMMAND);
    let code = match cmd {
        Command::Bold => BOLD,
        Command::NoBold => NO_BOLD,
        Command::Italic => ITALIC,
        Command::NoItalic => NO_ITALIC,
        Command::Underline => UNDERLINE,
        Command::NoUnderline => NO_UNDERLINE,
        Command::Semibold => SEMIBOLD,
        Command::NoSemibold => NO_SEMIBOLD,
        Command::StrikeOut => STRIKE_OUT,
        Command::NoStrikeOut => NO_STRIKE_OUT,
        Command::LinkIndex(_) => LINK_INDEX,
        Command::LinkText(_) => LINK_TEXT,
        Command::SkipBlock { .. } => SKIP_BLOCK,
        Command::LangTag(_) => LANG_TAG,
        Command::Other(code) => code,
    };
    s.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
    match cmd {
        Command::LinkIndex(index) => s.push(arg_char(index)),
        Command::LinkText(url) => {
            let len = u16::try_from(url.chars().count()).unwrap_or(u16::MAX);
            s.push(arg_char(len));
            s.push_str(url);
        }
        Command::SkipBlock { width, height } => {
            s.push(arg_char(width));
            s.push(arg_char(height));
        }
        Command::LangTag(tag) => s.push(arg_char(tag)),
        _ => (),
    }
    s.push(TEXT_COMMAND);
    s
}

/// Reserve `width × height` at this point
pub fn skip_block(width: u16, height: u16) -> String {
    encode(Command::SkipBlock { width, height })
}

/// Start external link `index` (1-based; `0` stops a link)
pub fn start_link(index: u16) -> String {
    encode(Command::LinkIndex(index.min(MAX_LINKS)))
}

/// Start a link to `url`; `None` if the URL is too long
pub fn start_link_url(url: &str) -> Option<String> {
    (url.chars().count() < MAX_URL_LEN).then(|| encode(Command::LinkText(url)))
}

/// Stop the current link
pub fn stop_link() -> String {
    start_link(0)
}

/// `text` as external link `index`
pub fn link(index: u16, text: &str) -> String {
    let mut s = start_link(index);
    s.push_str(text);
    s.push_str(&stop_link());
    s
}

/// `text` as a link to `url`; `None` if the URL is too long
pub fn link_url(url: &str, text: &str) -> Option<String> {
    let mut s = start_link_url(url)?;
    s.push_str(text);
    s.push_str(&stop_link());
    Some(s)
}

pub fn start_semibold() -> String {
    encode(Command::Semibold)
}

pub fn stop_semibold() -> String {
    encode(Command::NoSemibold)
}

/// Byte ranges of `text` where no entity may be detected
///
/// Covers every valid command and the text of links started by commands.
pub fn protected_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    let mut link_start = None;
    let mut pos = 0;
    while let Some(offset) = text[pos..].find(TEXT_COMMAND) {
        let at = pos + offset;
        match read_command(text, at, true) {
            Some((cmd, end)) => {
                match cmd {
                    Command::LinkIndex(0) => {
                        if let Some(start) = link_start.take() {
                            ranges.push(start..at);
                        }
                    }
                    Command::LinkIndex(_) | Command::LinkText(_) => {
                        if link_start.is_none() {
                            link_start = Some(at);
                        }
                    }
                    _ => (),
                }
                if link_start.is_none() {
                    ranges.push(at..end);
                }
                pos = end;
            }
            None => pos = at + TEXT_COMMAND.len_utf8(),
        }
    }
    if let Some(start) = link_start {
        ranges.push(start..text.len());
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_read() {
        let cmd = skip_block(30, 14);
        assert_eq!(
            read_command(&cmd, 0, false),
            Some((
                Command::SkipBlock {
                    width: 30,
                    height: 14
                },
                cmd.len()
            ))
        );

        let cmd = start_link_url("https://a.b/é").unwrap();
        assert_eq!(
            read_command(&cmd, 0, true),
            Some((Command::LinkText("https://a.b/é"), cmd.len()))
        );
        assert_eq!(read_command(&cmd, 0, false), None);

        let text = format!("ab{}cd", start_semibold());
        assert_eq!(skip_command(&text, 2, true), 2 + start_semibold().len());
        assert_eq!(skip_command(&text, 0, true), 0);
    }

    #[test]
    fn invalid() {
        assert_eq!(read_command("\u{10}", 0, true), None);
        assert_eq!(read_command("\u{10}\u{1}", 0, true), None);
        assert_eq!(read_command("\u{10}\u{1}x", 0, true), None);
        // argument not in the argument range
        assert_eq!(read_command("\u{10}\u{9}a\u{10}", 0, true), None);
        assert!(start_link_url(&"x".repeat(MAX_URL_LEN)).is_none());
    }

    #[test]
    fn protected() {
        let text = format!("a {} b.com {} c", start_link(1), stop_link());
        let ranges = protected_ranges(&text);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].start, 2);
        assert!(ranges[0].contains(&text.find("b.com").unwrap()));
        assert_eq!(ranges[1].end, text.len() - 2);
    }
}
