// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Simple data types

use crate::conv::{to_u32, to_usize};
use std::ops::{Add, AddAssign, Sub};

/// 2D vector (position or size), in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2(pub f32, pub f32);

impl Vec2 {
    /// Zero
    pub const ZERO: Vec2 = Vec2(0.0, 0.0);
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Vec2(self.0 + rhs.0, self.1 + rhs.1)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
        self.1 += rhs.1;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Vec2(self.0 - rhs.0, self.1 - rhs.1)
    }
}

/// Axis-aligned rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    /// Construct from position and size
    #[inline]
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Rect { pos, size }
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.1
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.1 + self.size.1
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.0 + self.size.0
    }

    /// True if `p` lies within the rect (right and bottom edges excluded)
    pub fn contains(&self, p: Vec2) -> bool {
        p.0 >= self.left() && p.0 < self.right() && p.1 >= self.top() && p.1 < self.bottom()
    }
}

/// Range type
///
/// Essentially this is just a `std::ops::Range<u32>`, but with convenient
/// implementations.
///
/// Note that we consider `u32` large enough for any text we wish to display
/// and the library is too complex to be useful on 16-bit CPUs, so conversion
/// between `u32` and `usize` is always possible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub start: u32,
    pub end: u32,
}

impl Range {
    /// The start, as `usize`
    #[inline]
    pub fn start(self) -> usize {
        to_usize(self.start)
    }

    /// The end, as `usize`
    #[inline]
    pub fn end(self) -> usize {
        to_usize(self.end)
    }

    /// True if the range is empty
    #[inline]
    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// The number of iterable items, as `usize`
    #[inline]
    pub fn len(self) -> usize {
        to_usize(self.end.saturating_sub(self.start))
    }

    /// True if the given value is contained, inclusive of end points
    #[inline]
    pub fn includes(self, value: usize) -> bool {
        to_usize(self.start) <= value && value <= to_usize(self.end)
    }

    /// Convert to a standard range
    #[inline]
    pub fn to_std(self) -> std::ops::Range<usize> {
        to_usize(self.start)..to_usize(self.end)
    }
}

impl From<Range> for std::ops::Range<usize> {
    fn from(range: Range) -> std::ops::Range<usize> {
        range.to_std()
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(range: std::ops::Range<usize>) -> Range {
        Range {
            start: to_u32(range.start),
            end: to_u32(range.end),
        }
    }
}

/// Horizontal alignment of lines
///
/// Alignment is relative to the paragraph direction: for right-to-left
/// paragraphs [`Align::TL`] places text against the right edge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    /// Default alignment: align-to-start
    #[default]
    Default,
    /// Align to the start of the paragraph
    TL,
    /// Align to centre
    Center,
    /// Align to the end of the paragraph
    BR,
}

/// Paragraph direction
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Resolved from the first strong character of the paragraph
    #[default]
    Auto,
    /// Left-to-right
    Ltr,
    /// Right-to-left
    Rtl,
}

impl Direction {
    /// True if explicitly right-to-left
    #[inline]
    pub fn is_rtl(self) -> bool {
        self == Direction::Rtl
    }

    /// Replace [`Direction::Auto`] with `fallback`
    #[inline]
    pub fn or(self, fallback: Direction) -> Direction {
        match self {
            Direction::Auto => fallback,
            dir => dir,
        }
    }
}
