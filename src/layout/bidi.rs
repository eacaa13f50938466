// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Bidirectional text: embedding levels and visual reordering
//!
//! Levels come from [`BidiInfo`] (UAX #9, isolates included, explicit depth
//! bounded by [`MAX_DEPTH`]). Objects take part as common separators; rule
//! L1 is applied per paragraph and L2 per line by [`visual_order`].

use smallvec::SmallVec;
use std::ops::Range;
use unicode_bidi::{BidiClass, BidiInfo, Level};

/// Maximum explicit embedding level; implicit rules may add one
pub const MAX_DEPTH: u8 = 125;

/// Chars below this never have right-to-left class
const RTL_THRESHOLD: char = '\u{590}';

/// Stand-in for an object during analysis, of class CS
const OBJECT_CHAR: char = ',';

/// Copy `text` with each of `objects` replaced by [`OBJECT_CHAR`]
///
/// `objects` are sorted, disjoint byte ranges on char boundaries.
fn substitute(text: &str, objects: &[Range<usize>]) -> String {
    let mut result = String::with_capacity(text.len());
    let mut pos = 0;
    for object in objects {
        result.push_str(&text[pos..object.start]);
        result.push(OBJECT_CHAR);
        pos = object.end;
    }
    result.push_str(&text[pos..]);
    result
}

/// Rule L1: separators and trailing whitespace take the paragraph level
fn reset_whitespace(levels: &mut [u8], classes: &[BidiClass], para: u8) {
    use BidiClass::*;
    let mut trailing = true;
    for (level, class) in levels.iter_mut().zip(classes).rev() {
        match class {
            S | B => {
                *level = para;
                trailing = true;
            }
            WS | FSI | LRI | RLI | PDI | BN | LRE | RLE | LRO | RLO | PDF if trailing => {
                *level = para
            }
            _ => trailing = false,
        }
    }
}

/// Resolve embedding levels of a paragraph, one per byte of `text`
///
/// `objects` are byte ranges relative to `text`; they are classified as
/// common separators. If the paragraph is left-to-right and no char outside
/// `objects` may be right-to-left, all levels are zero without further
/// analysis.
pub fn paragraph_levels(text: &str, objects: &[Range<usize>], rtl: bool) -> Vec<u8> {
    if !rtl
        && !text
            .char_indices()
            .any(|(index, c)| c >= RTL_THRESHOLD && !objects.iter().any(|r| r.contains(&index)))
    {
        return vec![0; text.len()];
    }

    let objects: SmallVec<[Range<usize>; 4]> = objects
        .iter()
        .filter(|r| r.start < r.end && r.end <= text.len())
        .cloned()
        .collect();
    let analysed = substitute(text, &objects);
    let para = if rtl { Level::rtl() } else { Level::ltr() };
    let info = BidiInfo::new(&analysed, Some(para));
    let mut resolved: Vec<u8> = info.levels.iter().map(|level| level.number()).collect();
    reset_whitespace(&mut resolved, &info.original_classes, para.number());

    let mut levels = Vec::with_capacity(text.len());
    let (mut pos, mut at) = (0, 0);
    for object in &objects {
        let n = object.start - pos;
        levels.extend_from_slice(&resolved[at..at + n]);
        at += n;
        levels.extend(std::iter::repeat(resolved[at]).take(object.len()));
        at += OBJECT_CHAR.len_utf8();
        pos = object.end;
    }
    levels.extend_from_slice(&resolved[at..]);
    levels
}

/// Visual order of items with the given levels (rule L2)
///
/// Returns logical indices in left-to-right order: from the highest level
/// down to the lowest odd level, each maximal sequence of items at that
/// level or higher is reversed.
pub fn visual_order(levels: &[u8]) -> SmallVec<[usize; 16]> {
    let mut order: SmallVec<[usize; 16]> = (0..levels.len()).collect();
    let (Some(&max), Some(&min)) = (levels.iter().max(), levels.iter().min()) else {
        return order;
    };
    let lowest_odd = min | 1;
    let mut level = max;
    while level >= lowest_odd {
        let mut start = None;
        for i in 0..order.len() {
            if levels[order[i]] >= level {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                order[s..i].reverse();
            }
        }
        if let Some(s) = start {
            order[s..].reverse();
        }
        level -= 1;
    }
    order
}


#[cfg(test)]
mod tests {
    use super::*;

    fn char_levels(text: &str, objects: &[Range<usize>], rtl: bool) -> Vec<u8> {
        let levels = paragraph_levels(text, objects, rtl);
        assert_eq!(levels.len(), text.len());
        text.char_indices().map(|(i, _)| levels[i]).collect()
    }

    fn visual(text: &str, rtl: bool) -> String {
        let chars: Vec<char> = text.chars().collect();
        let levels = char_levels(text, &[], rtl);
        visual_order(&levels).iter().map(|&i| chars[i]).collect()
    }

    #[test]
    fn ltr_identity() {
        assert_eq!(visual("abc def", false), "abc def");
        assert_eq!(paragraph_levels("abc def", &[], false), vec![0; 7]);
    }

    #[test]
    fn rtl_reversal() {
        let text = "\u{5D0}\u{5D1}\u{5D2} \u{5D3}";
        let reversed: String = text.chars().rev().collect();
        assert_eq!(visual(text, true), reversed);
        assert_eq!(visual(text, false), reversed);
    }

    #[test]
    fn mixed() {
        let text = "abc \u{627}\u{628}\u{62C} def";
        assert_eq!(
            char_levels(text, &[], false),
            vec![0, 0, 0, 0, 1, 1, 1, 0, 0, 0, 0]
        );
        assert_eq!(visual(text, false), "abc \u{62C}\u{628}\u{627} def");

        // in a right-to-left paragraph the Latin runs are embedded
        let levels = char_levels(text, &[], true);
        assert_eq!(levels, vec![2, 2, 2, 1, 1, 1, 1, 1, 2, 2, 2]);
        assert_eq!(visual(text, true), "def \u{62C}\u{628}\u{627} abc");
    }

    #[test]
    fn numbers() {
        // numbers in right-to-left text keep their order
        let text = "\u{5D0} 123";
        assert_eq!(char_levels(text, &[], true), vec![1, 1, 2, 2, 2]);
        assert_eq!(visual(text, true), "123 \u{5D0}");

        // European digits after Arabic letters become Arabic numbers
        assert_eq!(char_levels("\u{627}12", &[], false), vec![1, 2, 2]);
    }

    #[test]
    fn trailing_whitespace() {
        let levels = char_levels("\u{5D0}\u{5D1}  ", &[], false);
        assert_eq!(levels, vec![1, 1, 0, 0]);
    }

    #[test]
    fn embeddings() {
        // RLO forces right-to-left order
        let text = "a\u{202E}bc\u{202C}d";
        let shown: String = visual(text, false)
            .chars()
            .filter(|c| !matches!(c, '\u{202E}' | '\u{202C}'))
            .collect();
        assert_eq!(shown, "acbd");

        // the level stack is bounded
        let mut deep = "\u{202B}".repeat(200);
        deep.push('a');
        let levels = char_levels(&deep, &[], false);
        assert!(levels.iter().all(|&l| l <= MAX_DEPTH + 1));
    }

    #[test]
    fn isolates() {
        let text = "a \u{2067}bc de\u{2069} f";
        let levels = char_levels(text, &[], false);
        let chars: Vec<char> = text.chars().collect();
        for (c, level) in chars.iter().zip(&levels) {
            match c {
                'b' | 'c' | 'd' | 'e' => assert_eq!(*level, 2, "{c:?}"),
                'a' | 'f' => assert_eq!(*level, 0, "{c:?}"),
                _ => (),
            }
        }
        // the space inside the isolate is resolved within it
        assert_eq!(levels[5], 2);
    }

    #[test]
    fn objects() {
        // objects are separators: one between two numbers joins them
        let text = "\u{5D0} 1x2";
        assert_eq!(char_levels(text, &[4..5], true), vec![1, 1, 2, 2, 2]);

        // multi-byte objects take one level for all their bytes
        let text = "\u{5D0}1\u{1F600}2";
        let levels = paragraph_levels(text, &[3..7], true);
        assert_eq!(levels.len(), text.len());
        assert!(levels[3..7].iter().all(|&l| l == 2));

        // objects do not trigger analysis
        assert_eq!(paragraph_levels("a\u{5D0}", &[1..3], false), vec![0; 3]);
    }
}
