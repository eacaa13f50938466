// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Markdown parsing

use crate::conv::{to_u32, to_usize};
use crate::entity::{EntityInText, EntityType, TextWithEntities};
use pulldown_cmark::{Event, Tag, TagEnd};
use thiserror::Error;

/// Markdown parsing errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not supported by Markdown parser: {0}")]
    NotSupported(&'static str),
}

/// Convert Markdown to text with entities
///
/// Supported:
///
/// -   Text paragraphs and explicit line breaks
/// -   Bold (strong), italic (emphasis), strike-through
/// -   Inline code and code blocks
/// -   Links (as custom URLs, or plain URLs if the text is the target)
/// -   Headings (as bold paragraphs)
///
/// Not supported: block quotes, lists, footnotes, HTML, horizontal rules,
/// images, tables, task lists, math.
pub fn parse(input: &str) -> Result<TextWithEntities, Error> {
    let mut text = String::with_capacity(input.len());
    let mut entities: Vec<EntityInText> = Vec::new();
    let mut state = State::None;
    // Open spans: kind, start and link target
    let mut stack: Vec<(EntityType, usize, String)> = Vec::with_capacity(16);

    let options = pulldown_cmark::Options::ENABLE_STRIKETHROUGH;
    for ev in pulldown_cmark::Parser::new_ext(input, options) {
        match ev {
            Event::Start(tag) => {
                if let Some((kind, data)) = start_tag(&mut text, &mut state, tag)? {
                    stack.push((kind, text.len(), data));
                }
            }
            Event::End(tag) => {
                if end_tag(&mut state, tag)? {
                    if let Some((kind, start, data)) = stack.pop() {
                        push_entity(&mut entities, &text, kind, start, data);
                    }
                }
            }
            Event::Text(part) => {
                state.part(&mut text);
                text.push_str(&part);
            }
            Event::Code(part) => {
                state.part(&mut text);
                let start = text.len();
                text.push_str(&part);
                push_entity(&mut entities, &text, EntityType::Code, start, String::new());
            }
            Event::InlineMath(_) | Event::DisplayMath(_) => {
                return Err(Error::NotSupported("math expressions"))
            }
            Event::Html(_) | Event::InlineHtml(_) => {
                return Err(Error::NotSupported("embedded HTML"))
            }
            Event::FootnoteReference(_) => return Err(Error::NotSupported("footnote")),
            Event::SoftBreak => state.soft_break(&mut text),
            Event::HardBreak => state.hard_break(&mut text),
            Event::Rule => return Err(Error::NotSupported("horizontal rule")),
            Event::TaskListMarker(_) => return Err(Error::NotSupported("task list")),
        }
    }

    // Code blocks end with a line break which belongs outside the entity
    while text.ends_with('\n') {
        text.pop();
    }
    let len = text.len();
    for entity in &mut entities {
        let end = entity.end().min(len);
        entity.length = to_u32(end.saturating_sub(to_usize(entity.offset)));
    }
    entities.retain(|e| e.length > 0);
    entities.sort_by_key(|e| e.offset);
    Ok(TextWithEntities { text, entities })
}

fn push_entity(
    entities: &mut Vec<EntityInText>,
    text: &str,
    kind: EntityType,
    start: usize,
    data: String,
) {
    let mut end = text.len();
    if kind == EntityType::Pre {
        end = text[..end].trim_end_matches('\n').len().max(start);
    }
    if end <= start {
        return;
    }
    let kind = match kind {
        EntityType::CustomUrl if text[start..end] == data => EntityType::Url,
        kind => kind,
    };
    let data = if kind == EntityType::CustomUrl {
        data
    } else {
        String::new()
    };
    entities.push(EntityInText::with_data(kind, start, end - start, data));
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum State {
    None,
    BlockStart,
    BlockEnd,
    Part,
}

impl State {
    fn start_block(&mut self, text: &mut String) {
        match *self {
            State::None | State::BlockStart => (),
            State::BlockEnd | State::Part => text.push_str("\n\n"),
        }
        *self = State::BlockStart;
    }
    fn end_block(&mut self) {
        *self = State::BlockEnd;
    }
    fn part(&mut self, text: &mut String) {
        match *self {
            State::None | State::BlockStart | State::Part => (),
            State::BlockEnd => text.push_str("\n\n"),
        }
        *self = State::Part;
    }
    fn soft_break(&mut self, text: &mut String) {
        text.push(' ');
    }
    fn hard_break(&mut self, text: &mut String) {
        text.push('\n');
    }
}

// process a tag; returns the entity to open, if any
fn start_tag(
    text: &mut String,
    state: &mut State,
    tag: Tag,
) -> Result<Option<(EntityType, String)>, Error> {
    Ok(match tag {
        Tag::Paragraph => {
            state.start_block(text);
            None
        }
        Tag::Heading { .. } => {
            state.start_block(text);
            Some((EntityType::Bold, String::new()))
        }
        Tag::CodeBlock(_) => {
            state.start_block(text);
            Some((EntityType::Pre, String::new()))
        }
        Tag::BlockQuote(_) => return Err(Error::NotSupported("block quote")),
        Tag::List(_) | Tag::Item => return Err(Error::NotSupported("list")),
        Tag::HtmlBlock => return Err(Error::NotSupported("embedded HTML")),
        Tag::Emphasis => Some((EntityType::Italic, String::new())),
        Tag::Strong => Some((EntityType::Bold, String::new())),
        Tag::Strikethrough => Some((EntityType::StrikeOut, String::new())),
        Tag::Link { dest_url, .. } => Some((EntityType::CustomUrl, dest_url.to_string())),
        Tag::FootnoteDefinition(_) => return Err(Error::NotSupported("footnote")),
        Tag::DefinitionList | Tag::DefinitionListTitle | Tag::DefinitionListDefinition => {
            return Err(Error::NotSupported("definition"))
        }
        Tag::Table(_) | Tag::TableHead | Tag::TableRow | Tag::TableCell => {
            return Err(Error::NotSupported("table"))
        }
        Tag::Image { .. } => return Err(Error::NotSupported("image")),
        Tag::MetadataBlock(_) => return Err(Error::NotSupported("metadata block")),
    })
}

// returns true if the stack must be popped
fn end_tag(state: &mut State, tag: TagEnd) -> Result<bool, Error> {
    Ok(match tag {
        TagEnd::Paragraph => {
            state.end_block();
            false
        }
        TagEnd::Heading(_) | TagEnd::CodeBlock => {
            state.end_block();
            true
        }
        TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => true,
        _ => return Err(Error::NotSupported("block element")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline() {
        let t = parse("*a* **b** `c` ~~d~~").unwrap();
        assert_eq!(t.text, "a b c d");
        let kinds: Vec<_> = t.entities.iter().map(|e| (e.kind, e.offset)).collect();
        assert_eq!(
            kinds,
            vec![
                (EntityType::Italic, 0),
                (EntityType::Bold, 2),
                (EntityType::Code, 4),
                (EntityType::StrikeOut, 6)
            ]
        );
    }

    #[test]
    fn links_and_blocks() {
        let t = parse("[here](https://a.b) and <https://c.d>\n\n```\nx\n```").unwrap();
        assert_eq!(t.text, "here and https://c.d\n\nx");
        assert_eq!(t.entities[0].kind, EntityType::CustomUrl);
        assert_eq!(t.entities[0].data, "https://a.b");
        assert_eq!(t.entities[1].kind, EntityType::Url);
        assert_eq!(t.entities[2].kind, EntityType::Pre);
        assert_eq!(t.entities[2].length, 1);
    }

    #[test]
    fn unsupported() {
        assert!(parse("<b>x</b>").is_err());
        assert!(parse("- a\n- b").is_err());
    }
}
