// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Layout: line breaking, bidirectional reordering, elision, painting and
//! hit-testing
//!
//! Nothing here is cached: each call to [`crate::Text::draw`],
//! [`crate::Text::get_state`] or the measurement methods lays out the text
//! anew from its blocks.

pub mod bidi;
mod elide;
mod lines;
mod painter;
mod render;
mod state;

pub use painter::{Painter, Pen};
pub use render::DrawOptions;
pub use state::{StateFlags, StateRequest, StateRequestElided, StateResult};
