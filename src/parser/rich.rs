// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Rich text tags
//!
//! Supported tags are `[b]`, `[i]`, `[u]` and `[a href="url"]` with their
//! closing forms, plus caller-defined single-letter tags. `\` escapes the
//! following char. Tags are expanded to inline commands; anything which is
//! not a well-formed tag stays as literal text.

use super::command::{self, Command};
use crate::chars::TEXT_COMMAND;
use std::collections::HashMap;

/// Custom tags: tag letter to (opening, closing) replacement
pub type CustomTags = HashMap<char, (String, String)>;

/// Escape `text` for inclusion in rich text
///
/// Command chars become spaces; `\` and `[` are escaped.
pub fn escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            TEXT_COMMAND => result.push(' '),
            '\\' | '[' => {
                result.push('\\');
                result.push(c);
            }
            c => result.push(c),
        }
    }
    result
}

/// Expand rich text tags to inline commands
pub fn expand(text: &str, custom: &CustomTags) -> String {
    let mut parsed = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(c) = text[pos..].chars().next() {
        pos += c.len_utf8();
        match c {
            '\\' => {
                if let Some(next) = text[pos..].chars().next() {
                    parsed.push(next);
                    pos += next.len_utf8();
                }
            }
            '[' => match read_tag(text, pos, custom) {
                Some((replacement, end)) => {
                    parsed.push_str(&replacement);
                    pos = end;
                }
                None => parsed.push('['),
            },
            c => parsed.push(c),
        }
    }
    parsed
}

/// Read a tag whose name starts at `pos` (after `'['`)
///
/// Returns the replacement and the position after the closing `']'`.
fn read_tag(text: &str, pos: usize, custom: &CustomTags) -> Option<(String, usize)> {
    let rest = &text[pos..];
    let (closing, rest, pos) = match rest.strip_prefix('/') {
        Some(rest) => (true, rest, pos + 1),
        None => (false, rest, pos),
    };
    let tag = rest.chars().next()?;
    let after = &rest[tag.len_utf8()..];
    let end_of_simple = pos + tag.len_utf8() + 1;

    let simple = match (tag, closing) {
        ('b', false) => Some(Command::Bold),
        ('b', true) => Some(Command::NoBold),
        ('i', false) => Some(Command::Italic),
        ('i', true) => Some(Command::NoItalic),
        ('u', false) => Some(Command::Underline),
        ('u', true) => Some(Command::NoUnderline),
        _ => None,
    };
    if let Some(cmd) = simple {
        return after
            .starts_with(']')
            .then(|| (command::encode(cmd), end_of_simple));
    }

    if tag != 'a' {
        let (open, close) = custom.get(&tag)?;
        let replacement = if closing { close } else { open };
        return after
            .starts_with(']')
            .then(|| (replacement.clone(), end_of_simple));
    }

    if closing {
        return after
            .starts_with(']')
            .then(|| (command::stop_link(), end_of_simple));
    }

    // [a href="url"]
    if !after.starts_with(' ') {
        return None;
    }
    let attrs = after.trim_start_matches(' ');
    let url_start = attrs.strip_prefix("href=\"")?;
    let url_len = url_start.find('"')?;
    if !url_start[url_len + 1..].starts_with(']') {
        return None;
    }
    let url = &url_start[..url_len];
    let end = text.len() - url_start.len() + url_len + 2;
    Some((command::start_link_url(url)?, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::command::read_command;

    #[test]
    fn simple_tags() {
        let out = expand("[b]x[/b]", &CustomTags::new());
        assert_eq!(
            out,
            format!(
                "{}x{}",
                command::encode(Command::Bold),
                command::encode(Command::NoBold)
            )
        );
    }

    #[test]
    fn link_tag() {
        let out = expand("see [a href=\"https://a.b\"]here[/a]!", &CustomTags::new());
        let start = out.find(TEXT_COMMAND).unwrap();
        let (cmd, end) = read_command(&out, start, true).unwrap();
        assert_eq!(cmd, Command::LinkText("https://a.b"));
        assert!(out[end..].starts_with("here"));
        assert!(out.ends_with(&format!("{}!", command::stop_link())));
    }

    #[test]
    fn literal() {
        let tags = CustomTags::new();
        assert_eq!(expand("[x] [b [a href=x]", &tags), "[x] [b [a href=x]");
        assert_eq!(expand("\\[b]", &tags), "[b]");
        assert_eq!(expand("a\\\\b", &tags), "a\\b");
        assert_eq!(expand(&escape("[b]\\"), &tags), "[b]\\");
    }

    #[test]
    fn custom() {
        let mut tags = CustomTags::new();
        tags.insert('c', ("<".to_string(), ">".to_string()));
        assert_eq!(expand("[c]x[/c]", &tags), "<x>");
    }
}
