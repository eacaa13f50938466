// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Link handlers
//!
//! A [`crate::Text`] stores one [`ClickHandlerPtr`] per link. The engine
//! never activates a handler itself: it only reports which link is under a
//! point. Activation returns a [`LinkAction`] describing what the caller
//! should do.

use crate::entity::EntityType;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// What activating a link asks the caller to do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LinkAction {
    /// Open a URL; if `confirm`, ask the user first
    OpenUrl { url: String, confirm: bool },
    /// Compose an e-mail
    Mail { address: String },
    /// Search for a hashtag (including `'#'`)
    SearchHashtag(String),
    /// Search for a cashtag (including `'$'`)
    SearchCashtag(String),
    /// Open a peer by username (without `'@'`)
    OpenUsername(String),
    /// Open a user by identifier
    OpenUser { user_id: u64, access_hash: u64 },
    /// Send a bot command (including `'/'`)
    SendCommand(String),
}

/// Entity data describing a link for extraction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkEntity {
    pub kind: EntityType,
    /// Full target (URL or encoded id); may be empty
    pub data: String,
}

/// A link handler
pub trait ClickHandler: Debug + Send + Sync {
    /// Activate the link
    fn activate(&self) -> LinkAction;

    /// The entity this link was created from
    fn entity(&self) -> LinkEntity;

    /// True if the link text displays the whole target
    fn displayed_full(&self) -> bool {
        true
    }

    /// Tooltip text, if any
    fn tooltip(&self) -> Option<String> {
        None
    }

    /// Text to place on the clipboard by "copy link"
    fn copy_text(&self) -> Option<String> {
        let entity = self.entity();
        (!entity.data.is_empty()).then_some(entity.data)
    }
}

/// Shared link handle
pub type ClickHandlerPtr = Arc<dyn ClickHandler>;

/// True if `a` and `b` are the same handler
#[inline]
pub fn same_handler(a: &ClickHandlerPtr, b: &ClickHandlerPtr) -> bool {
    Arc::ptr_eq(a, b)
}

fn with_protocol(url: &str) -> String {
    if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// A URL found in the text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlLink {
    pub url: String,
    /// False if the readable form of the URL is longer than the crop limit
    pub displayed_full: bool,
}

impl ClickHandler for UrlLink {
    fn activate(&self) -> LinkAction {
        LinkAction::OpenUrl {
            url: with_protocol(&self.url),
            confirm: false,
        }
    }

    fn entity(&self) -> LinkEntity {
        LinkEntity {
            kind: EntityType::Url,
            data: self.url.clone(),
        }
    }

    fn displayed_full(&self) -> bool {
        self.displayed_full
    }

    fn tooltip(&self) -> Option<String> {
        (!self.displayed_full).then(|| self.url.clone())
    }
}

/// An e-mail address
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailLink {
    pub address: String,
}

impl ClickHandler for EmailLink {
    fn activate(&self) -> LinkAction {
        LinkAction::Mail {
            address: self.address.clone(),
        }
    }

    fn entity(&self) -> LinkEntity {
        LinkEntity {
            kind: EntityType::Email,
            data: self.address.clone(),
        }
    }
}

/// A link whose text differs from its target
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HiddenUrlLink {
    pub url: String,
}

impl ClickHandler for HiddenUrlLink {
    fn activate(&self) -> LinkAction {
        LinkAction::OpenUrl {
            url: with_protocol(&self.url),
            confirm: true,
        }
    }

    fn entity(&self) -> LinkEntity {
        LinkEntity {
            kind: EntityType::CustomUrl,
            data: self.url.clone(),
        }
    }

    fn displayed_full(&self) -> bool {
        false
    }

    fn tooltip(&self) -> Option<String> {
        Some(self.url.clone())
    }
}

/// `#hashtag`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashtagLink {
    pub tag: String,
}

impl ClickHandler for HashtagLink {
    fn activate(&self) -> LinkAction {
        LinkAction::SearchHashtag(self.tag.clone())
    }

    fn entity(&self) -> LinkEntity {
        LinkEntity {
            kind: EntityType::Hashtag,
            data: self.tag.clone(),
        }
    }
}

/// `$CASHTAG`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CashtagLink {
    pub tag: String,
}

impl ClickHandler for CashtagLink {
    fn activate(&self) -> LinkAction {
        LinkAction::SearchCashtag(self.tag.clone())
    }

    fn entity(&self) -> LinkEntity {
        LinkEntity {
            kind: EntityType::Cashtag,
            data: self.tag.clone(),
        }
    }
}

/// `@username`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionLink {
    pub tag: String,
}

impl ClickHandler for MentionLink {
    fn activate(&self) -> LinkAction {
        let name = self.tag.strip_prefix('@').unwrap_or(&self.tag);
        LinkAction::OpenUsername(name.to_string())
    }

    fn entity(&self) -> LinkEntity {
        LinkEntity {
            kind: EntityType::Mention,
            data: self.tag.clone(),
        }
    }
}

/// A mention by user identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MentionNameLink {
    pub text: String,
    pub user_id: u64,
    pub access_hash: u64,
}

impl ClickHandler for MentionNameLink {
    fn activate(&self) -> LinkAction {
        LinkAction::OpenUser {
            user_id: self.user_id,
            access_hash: self.access_hash,
        }
    }

    fn entity(&self) -> LinkEntity {
        LinkEntity {
            kind: EntityType::MentionName,
            data: encode_mention_name(self.user_id, self.access_hash),
        }
    }

    fn copy_text(&self) -> Option<String> {
        None
    }
}

/// `/command` or `/command@bot`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotCommandLink {
    pub command: String,
}

impl ClickHandler for BotCommandLink {
    fn activate(&self) -> LinkAction {
        LinkAction::SendCommand(self.command.clone())
    }

    fn entity(&self) -> LinkEntity {
        LinkEntity {
            kind: EntityType::BotCommand,
            data: self.command.clone(),
        }
    }
}

/// Mention-by-id payload decoding error
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MentionNameError {
    #[error("expected \"user_id.access_hash\", found {0:?}")]
    Format(String),
    #[error("invalid number in mention data")]
    Number(#[from] std::num::ParseIntError),
}

/// Decode a `"user_id.access_hash"` mention payload
pub fn decode_mention_name(data: &str) -> Result<(u64, u64), MentionNameError> {
    let (user_id, access_hash) = data
        .split_once('.')
        .ok_or_else(|| MentionNameError::Format(data.to_string()))?;
    let user_id = user_id.parse()?;
    let access_hash = access_hash.parse()?;
    Ok((user_id, access_hash))
}

/// Encode a mention payload
pub fn encode_mention_name(user_id: u64, access_hash: u64) -> String {
    format!("{user_id}.{access_hash}")
}

/// Data collected by the parser for one link
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkData {
    pub kind: EntityType,
    /// The link's text as it appears in the buffer
    pub text: String,
    /// Target data: the URL for custom links, the id payload for mentions by
    /// id, otherwise equal to `text`
    pub data: String,
    /// False for URLs longer than the style's crop limit
    pub displayed_full: bool,
}

/// Where hashtags and mentions lead
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TagRedirect {
    /// Handled by the application
    #[default]
    Internal,
    /// Open on twitter.com
    Twitter,
    /// Open on instagram.com
    Instagram,
}

/// Constructs link handlers for parsed links
pub trait LinkFactory: Debug + Send + Sync {
    /// Create a handler, or `None` if the link is invalid
    fn create(&self, link: &LinkData) -> Result<Option<ClickHandlerPtr>, MentionNameError>;
}

/// The standard link factory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DefaultLinkFactory {
    pub redirect: TagRedirect,
}

impl LinkFactory for DefaultLinkFactory {
    fn create(&self, link: &LinkData) -> Result<Option<ClickHandlerPtr>, MentionNameError> {
        let data = link.data.clone();
        let handler: ClickHandlerPtr = match link.kind {
            EntityType::Url => Arc::new(UrlLink {
                url: data,
                displayed_full: link.displayed_full,
            }),
            EntityType::CustomUrl => {
                if data.is_empty() {
                    return Ok(None);
                }
                Arc::new(HiddenUrlLink { url: data })
            }
            EntityType::Email => Arc::new(EmailLink { address: data }),
            EntityType::Hashtag => {
                let tag = data.strip_prefix('#').unwrap_or(&data);
                match self.redirect {
                    TagRedirect::Internal => Arc::new(HashtagLink { tag: data.clone() }),
                    TagRedirect::Twitter => Arc::new(UrlLink {
                        url: format!("https://twitter.com/hashtag/{tag}?src=hash"),
                        displayed_full: true,
                    }),
                    TagRedirect::Instagram => Arc::new(UrlLink {
                        url: format!("https://instagram.com/explore/tags/{tag}/"),
                        displayed_full: true,
                    }),
                }
            }
            EntityType::Cashtag => Arc::new(CashtagLink { tag: data }),
            EntityType::Mention => {
                let name = data.strip_prefix('@').unwrap_or(&data);
                match self.redirect {
                    TagRedirect::Internal => Arc::new(MentionLink { tag: data.clone() }),
                    TagRedirect::Twitter => Arc::new(UrlLink {
                        url: format!("https://twitter.com/{name}"),
                        displayed_full: true,
                    }),
                    TagRedirect::Instagram => Arc::new(UrlLink {
                        url: format!("https://instagram.com/{name}/"),
                        displayed_full: true,
                    }),
                }
            }
            EntityType::MentionName => {
                let (user_id, access_hash) = decode_mention_name(&data)?;
                Arc::new(MentionNameLink {
                    text: link.text.clone(),
                    user_id,
                    access_hash,
                })
            }
            EntityType::BotCommand => Arc::new(BotCommandLink { command: data }),
            _ => return Ok(None),
        };
        Ok(Some(handler))
    }
}

/// Hover and press state of links
///
/// Owned by the caller (typically one per window) and passed to drawing so
/// that active and pressed links may be styled.
#[derive(Clone, Debug, Default)]
pub struct LinkState {
    active: Option<ClickHandlerPtr>,
    pressed: Option<ClickHandlerPtr>,
}

/// How a link should be drawn
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LinkHighlight {
    #[default]
    Normal,
    /// Under the pointer
    Active,
    /// Under the pointer and pressed
    Pressed,
}

impl LinkState {
    /// Set the link under the pointer
    ///
    /// Returns true if the active link changed.
    pub fn set_active(&mut self, link: Option<ClickHandlerPtr>) -> bool {
        let changed = match (&self.active, &link) {
            (Some(a), Some(b)) => !same_handler(a, b),
            (None, None) => false,
            _ => true,
        };
        self.active = link;
        changed
    }

    #[inline]
    pub fn active(&self) -> Option<&ClickHandlerPtr> {
        self.active.as_ref()
    }

    #[inline]
    pub fn pressed(&self) -> Option<&ClickHandlerPtr> {
        self.pressed.as_ref()
    }

    /// Press the active link
    pub fn press(&mut self) {
        self.pressed = self.active.clone();
    }

    /// Release; returns the link to activate, if press and release match
    pub fn release(&mut self) -> Option<ClickHandlerPtr> {
        let pressed = self.pressed.take()?;
        let active = self.active.as_ref()?;
        same_handler(&pressed, active).then_some(pressed)
    }

    /// Highlight for `link`
    pub fn highlight(&self, link: &ClickHandlerPtr) -> LinkHighlight {
        let is = |x: &Option<ClickHandlerPtr>| x.as_ref().is_some_and(|x| same_handler(x, link));
        if is(&self.pressed) {
            LinkHighlight::Pressed
        } else if is(&self.active) {
            LinkHighlight::Active
        } else {
            LinkHighlight::Normal
        }
    }
}
