// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Type conversion utilities
//!
//! Text offsets are stored as `u32` instead of `usize` in order to save space
//! (message bodies are capped far below `u32::MAX` bytes, so `u32` is always
//! an appropriate index type).

use easy_cast::Cast;

/// Convert `usize` → `u32`
///
/// This is a "safer" wrapper around `as` ensuring (on debug builds) that the
/// input value may be represented correctly by `u32`.
#[inline]
pub fn to_u32(x: usize) -> u32 {
    x.cast()
}

/// Convert `u32` → `usize`
///
/// This is a "safer" wrapper around `as` ensuring that the operation is
/// zero-extension.
#[inline]
pub fn to_usize(x: u32) -> usize {
    x.cast()
}

/// Convert `usize` → `u16` (link indices)
#[inline]
pub fn to_u16(x: usize) -> u16 {
    x.cast()
}

/// Scale factor: pixels per font unit
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DPU(pub f32);

impl DPU {
    pub(crate) fn i16_to_px(self, x: i16) -> f32 {
        f32::from(x) * self.0
    }
    pub(crate) fn u16_to_px(self, x: u16) -> f32 {
        f32::from(x) * self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpu_scaling() {
        let dpu = DPU(0.5);
        assert_eq!(dpu.i16_to_px(-10), -5.0);
        assert_eq!(dpu.u16_to_px(1000), 500.0);
        assert_eq!(to_usize(to_u32(77)), 77);
    }
}
