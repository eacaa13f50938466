// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Text shaping
//!
//! To quote the HarfBuzz manual:
//!
//! > Text shaping is the process of translating a string of character codes
//! > (such as Unicode codepoints) into a properly arranged sequence of glyphs
//! > that can be rendered onto a screen or into final output form for
//! > inclusion in a document.
//!
//! The engine never shapes text itself; it asks a [`Shaper`] for a
//! [`GlyphRun`] over a slice of one block and works with the advances, right
//! bearing and cluster map of the result. Two implementations are provided:
//! [`MonoShaper`] (fixed advances, deterministic and font-free) and
//! [`FaceShaper`] (advances and bearings read from a font via `ttf-parser`).
//!
//! This module *does not* perform line-breaking, wrapping or text reversal.

use crate::conv::{to_u32, DPU};
use crate::BlockFlags;
use smallvec::SmallVec;
use std::fmt::Debug;
use thiserror::Error;
use ttf_parser::Face;
use unicode_bidi::{bidi_class, BidiClass};

/// Font loading errors
#[derive(Error, Debug)]
pub enum FontError {
    #[error("font load error")]
    TtfParser(#[from] ttf_parser::FaceParsingError),
    #[error("font has no units-per-em value")]
    NoUnitsPerEm,
}

/// Vertical font metrics, in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    /// Distance from the top of a line to the baseline
    pub ascent: f32,
    /// Distance from the baseline to the bottom of a line (positive)
    pub descent: f32,
    /// Height of one line of text
    pub height: f32,
}

/// Glyph identifier (font-specific)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GlyphId(pub u32);

/// A shaped glyph
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Glyph {
    /// Glyph identifier in font
    pub id: GlyphId,
    /// Byte offset (within the shaped slice) of the cluster this glyph belongs to
    pub index: u32,
    /// Horizontal advance
    pub advance: f32,
}

/// A glyph cluster: the smallest unit which may be cut or hit-tested
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cluster {
    /// Start of the cluster's source text (byte offset within the slice)
    pub start: u32,
    /// End of the cluster's source text
    pub end: u32,
    /// Total advance of the cluster's glyphs
    pub advance: f32,
    /// Number of glyphs in the cluster
    pub glyphs: u32,
}

/// Output of [`Shaper::shape`]
///
/// Glyphs are stored in logical order; painters reverse right-to-left runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphRun {
    pub glyphs: SmallVec<[Glyph; 16]>,
    /// Sum of advances
    pub advance: f32,
    /// Right bearing of the last non-space glyph, clamped to `<= 0`
    ///
    /// A negative bearing means the ink extends beyond the advance.
    pub rbearing: f32,
    pub flags: BlockFlags,
    pub rtl: bool,
}

impl GlyphRun {
    /// Iterate over clusters, in logical order
    ///
    /// `len` is the length of the shaped slice.
    pub fn clusters(&self, len: u32) -> impl Iterator<Item = Cluster> + '_ {
        let mut i = 0;
        std::iter::from_fn(move || {
            let first = self.glyphs.get(i)?;
            let mut cluster = Cluster {
                start: first.index,
                end: len,
                advance: 0.0,
                glyphs: 0,
            };
            while let Some(glyph) = self.glyphs.get(i) {
                if glyph.index != cluster.start {
                    cluster.end = glyph.index;
                    break;
                }
                cluster.advance += glyph.advance;
                cluster.glyphs += 1;
                i += 1;
            }
            Some(cluster)
        })
    }
}

/// A text shaping engine
///
/// Implementations must be deterministic: the engine shapes the same slices
/// in its metrics, layout and paint passes and relies on identical results.
pub trait Shaper: Debug + Send + Sync {
    /// Vertical metrics of the font
    fn metrics(&self) -> FontMetrics;

    /// Shape `text` with the given style `flags`
    ///
    /// `text` never contains a line break.
    fn shape(&self, text: &str, flags: BlockFlags, rtl: bool) -> GlyphRun;

    /// Advance of `text` (convenience)
    fn width(&self, text: &str, flags: BlockFlags) -> f32 {
        self.shape(text, flags, false).advance
    }
}

/// True for chars which attach to the previous cluster with no advance
fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200D}' | '\u{20E3}' | '\u{FE00}'..='\u{FE0F}')
        || matches!(c, '\u{1F3FB}'..='\u{1F3FF}')
        || bidi_class(c) == BidiClass::NSM
}

fn mirrored(c: char, rtl: bool) -> char {
    if rtl {
        unicode_bidi_mirroring::get_mirrored(c).unwrap_or(c)
    } else {
        c
    }
}

/// A fixed-advance shaper
///
/// Every char gets the same advance except combining marks, joiners and
/// variation selectors, which join the previous cluster. Italic runs report
/// a negative right bearing (the slant overhang) unless they end in a space.
/// Semibold and bold runs may be wider.
#[derive(Clone, Debug, PartialEq)]
pub struct MonoShaper {
    pub advance: f32,
    pub bold_advance: f32,
    pub italic_overhang: f32,
    pub metrics: FontMetrics,
}

impl MonoShaper {
    /// Construct with a uniform `advance` and line `height`
    pub fn new(advance: f32, height: f32) -> Self {
        MonoShaper {
            advance,
            bold_advance: advance,
            italic_overhang: 0.0,
            metrics: FontMetrics {
                ascent: (height * 0.8).round(),
                descent: height - (height * 0.8).round(),
                height,
            },
        }
    }

    fn advance_for(&self, flags: BlockFlags) -> f32 {
        if flags.intersects(BlockFlags::BOLD | BlockFlags::SEMIBOLD) {
            self.bold_advance
        } else {
            self.advance
        }
    }
}

impl Shaper for MonoShaper {
    fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn shape(&self, text: &str, flags: BlockFlags, rtl: bool) -> GlyphRun {
        let advance = self.advance_for(flags);
        let mut run = GlyphRun {
            flags,
            rtl,
            ..Default::default()
        };
        let mut cluster = 0;
        let mut last = None;
        for (index, c) in text.char_indices() {
            let joins = is_zero_width(c) && !run.glyphs.is_empty();
            if !joins {
                cluster = to_u32(index);
            }
            let glyph_advance = if joins { 0.0 } else { advance };
            run.glyphs.push(Glyph {
                id: GlyphId(u32::from(mirrored(c, rtl))),
                index: cluster,
                advance: glyph_advance,
            });
            run.advance += glyph_advance;
            if !joins {
                last = Some(c);
            }
        }
        if flags.contains(BlockFlags::ITALIC) && last.is_some_and(|c| !c.is_whitespace()) {
            run.rbearing = -self.italic_overhang;
        }
        run
    }
}

/// A shaper reading horizontal metrics from a font face
///
/// Each char maps to one glyph via the `cmap` table (no ligatures). Pairs
/// are kerned from the `kern` table. Combining marks join the previous
/// cluster. The right bearing
/// is taken from the glyph bounding box of the last non-space glyph.
#[derive(Clone, Debug)]
pub struct FaceShaper {
    face: Face<'static>,
    dpu: DPU,
    dpem: f32,
}

impl FaceShaper {
    /// Parse a face from font `data`
    ///
    /// `dpem` is the font size in pixels per Em.
    pub fn from_data(data: &'static [u8], index: u32, dpem: f32) -> Result<Self, FontError> {
        let face = Face::parse(data, index)?;
        let upem = face.units_per_em();
        if upem == 0 {
            return Err(FontError::NoUnitsPerEm);
        }
        let dpu = DPU(dpem / f32::from(upem));
        Ok(FaceShaper { face, dpu, dpem })
    }

    /// Font size in pixels per Em
    #[inline]
    pub fn dpem(&self) -> f32 {
        self.dpem
    }

    fn glyph_id(&self, c: char) -> ttf_parser::GlyphId {
        // GlyphId 0 is the 'missing glyph'
        self.face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0))
    }

    fn h_advance(&self, id: ttf_parser::GlyphId) -> f32 {
        let x = self.face.glyph_hor_advance(id).unwrap_or(0);
        self.dpu.u16_to_px(x)
    }

    /// Horizontal kerning of `left` followed by `right`
    fn kerning(&self, left: GlyphId, right: GlyphId) -> f32 {
        let Some(kern) = self.face.tables().kern else {
            return 0.0;
        };
        let (Ok(left), Ok(right)) = (u16::try_from(left.0), u16::try_from(right.0)) else {
            return 0.0;
        };
        let (left, right) = (ttf_parser::GlyphId(left), ttf_parser::GlyphId(right));
        let units = kern
            .subtables
            .into_iter()
            .filter(|table| table.horizontal && !table.variable && !table.has_cross_stream)
            .find_map(|table| table.glyphs_kerning(left, right))
            .unwrap_or(0);
        self.dpu.i16_to_px(units)
    }

    fn rbearing(&self, id: ttf_parser::GlyphId, advance: f32) -> f32 {
        match self.face.glyph_bounding_box(id) {
            Some(bbox) => (advance - self.dpu.i16_to_px(bbox.x_max)).min(0.0),
            None => 0.0,
        }
    }
}

impl Shaper for FaceShaper {
    fn metrics(&self) -> FontMetrics {
        let ascent = self.dpu.i16_to_px(self.face.ascender());
        let descent = -self.dpu.i16_to_px(self.face.descender());
        let height = self.dpu.i16_to_px(self.face.height()).ceil();
        FontMetrics {
            ascent,
            descent,
            height,
        }
    }

    fn shape(&self, text: &str, flags: BlockFlags, rtl: bool) -> GlyphRun {
        let mut run = GlyphRun {
            flags,
            rtl,
            ..Default::default()
        };
        let mut cluster = 0;
        for (index, c) in text.char_indices() {
            let id = self.glyph_id(mirrored(c, rtl));
            let joins = is_zero_width(c) && !run.glyphs.is_empty();
            if !joins {
                cluster = to_u32(index);
            }
            let advance = if joins { 0.0 } else { self.h_advance(id) };
            run.glyphs.push(Glyph {
                id: GlyphId(u32::from(id.0)),
                index: cluster,
                advance,
            });
            run.advance += advance;
            if !joins && !c.is_whitespace() {
                run.rbearing = self.rbearing(id, advance);
            } else if !joins {
                run.rbearing = 0.0;
            }
        }
        if self.face.tables().kern.is_some() {
            apply_kerning(&mut run, |left, right| self.kerning(left, right));
        }
        run
    }
}

/// Add pair kerning to the advance of the logically first glyph of each pair
///
/// Pairs are passed to `kerning` in visual order. Glyphs joined to a cluster
/// do not form pairs.
fn apply_kerning(run: &mut GlyphRun, kerning: impl Fn(GlyphId, GlyphId) -> f32) {
    let mut prev: Option<usize> = None;
    for i in 0..run.glyphs.len() {
        let glyph = run.glyphs[i];
        if let Some(p) = prev {
            if run.glyphs[p].index == glyph.index {
                continue;
            }
            let (left, right) = if run.rtl {
                (glyph.id, run.glyphs[p].id)
            } else {
                (run.glyphs[p].id, glyph.id)
            };
            let kern = kerning(left, right);
            run.glyphs[p].advance += kern;
            run.advance += kern;
        }
        prev = Some(i);
    }
}
