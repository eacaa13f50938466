// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Chat rich-text library
//!
//! A [`Text`] is built from plain text, text with entities or inline rich
//! markup. It is parsed into [`Block`]s which are wrapped, reordered for
//! bidirectional display, elided, painted and hit-tested on demand:
//! ```
//! # use chat_text::{shaper::MonoShaper, Text, TextStyle, PLAIN_OPTIONS};
//! # use std::sync::Arc;
//! let style = Arc::new(TextStyle::new(Arc::new(MonoShaper::new(10.0, 20.0))));
//! let text = Text::with_text(style, "hello world", &PLAIN_OPTIONS);
//! assert_eq!(text.count_height(60.0, false), 40.0);
//! ```

#![cfg_attr(doc_cfg, feature(doc_cfg))]

mod data;
pub use data::*;

pub(crate) mod conv;

pub mod chars;
pub mod emoji;
pub mod entity;
pub mod layout;
pub mod link;
pub mod parser;
pub mod shaper;

mod block;
pub use block::{Block, BlockFlags, BlockKind, Word};

mod style;
pub use style::{TextStyle, ELLIPSIS};

mod options;
pub use options::{ParseFlags, ParseOptions, DEFAULT_OPTIONS, MESSAGE_OPTIONS, PLAIN_OPTIONS};

mod text;
pub use text::Text;

mod metrics;
pub use metrics::string_direction;

mod selection;
pub use selection::{SelectType, TextSelection};

mod extract;
pub use extract::ExpandLinks;

pub use layout::{
    DrawOptions, Painter, Pen, StateFlags, StateRequest, StateRequestElided, StateResult,
};
