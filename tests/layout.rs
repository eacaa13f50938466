// Test drawing and hit-testing through a recording painter

use chat_text::emoji::EmojiId;
use chat_text::shaper::{GlyphRun, MonoShaper};
use chat_text::*;
use std::sync::Arc;

#[derive(Debug, PartialEq)]
enum Op {
    Fill(Rect),
    Glyphs {
        x: f32,
        y: f32,
        text: String,
        rtl: bool,
        selected: Option<(f32, f32)>,
    },
    Emoji(Vec2, f32, EmojiId),
}

#[derive(Default)]
struct Recorder {
    ops: Vec<Op>,
}

impl Recorder {
    fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Glyphs { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn fills(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Fill(rect) => Some(*rect),
                _ => None,
            })
            .collect()
    }
}

impl Painter for Recorder {
    fn fill_selection(&mut self, rect: Rect) {
        self.ops.push(Op::Fill(rect));
    }

    fn draw_glyphs(
        &mut self,
        baseline: Vec2,
        text: &str,
        run: &GlyphRun,
        _: Pen,
        selected: Option<(f32, f32)>,
    ) {
        self.ops.push(Op::Glyphs {
            x: baseline.0,
            y: baseline.1,
            text: text.to_string(),
            rtl: run.rtl,
            selected,
        });
    }

    fn draw_emoji(&mut self, pos: Vec2, size: f32, emoji: EmojiId, _: Pen) {
        self.ops.push(Op::Emoji(pos, size, emoji));
    }
}

fn style() -> Arc<TextStyle> {
    Arc::new(TextStyle::new(Arc::new(MonoShaper::new(10.0, 20.0))))
}

fn text(s: &str, options: &ParseOptions) -> Text {
    Text::with_text(style(), s, options)
}

fn symbol_request() -> StateRequest {
    StateRequest {
        flags: StateFlags::LOOKUP_SYMBOL,
        ..Default::default()
    }
}

#[test]
fn wrap() {
    let t = text("aaaa bbbb cccc", &PLAIN_OPTIONS);
    let mut painter = Recorder::default();
    let bottom = t.draw(&mut painter, Vec2(5.0, 10.0), 90.0, &Default::default());
    assert_eq!(bottom, 40.0);
    assert_eq!(painter.texts(), vec!["aaaa bbbb", "cccc"]);
    assert_eq!(
        painter.ops[1],
        Op::Glyphs {
            x: 5.0,
            y: 46.0,
            text: "cccc".into(),
            rtl: false,
            selected: None,
        }
    );
}

#[test]
fn clipped() {
    let t = text("aaaa bbbb cccc", &PLAIN_OPTIONS);
    let mut painter = Recorder::default();
    let options = DrawOptions {
        y_from: 20.0,
        ..Default::default()
    };
    t.draw(&mut painter, Vec2::ZERO, 50.0, &options);
    assert_eq!(painter.texts(), vec!["bbbb", "cccc"]);

    let mut painter = Recorder::default();
    let options = DrawOptions {
        y_to: Some(20.0),
        ..Default::default()
    };
    let bottom = t.draw(&mut painter, Vec2::ZERO, 50.0, &options);
    assert_eq!(painter.texts(), vec!["aaaa"]);
    assert_eq!(bottom, 20.0);
}

#[test]
fn alignment() {
    let t = text("abc", &PLAIN_OPTIONS);
    let mut painter = Recorder::default();
    let options = DrawOptions {
        align: Align::BR,
        ..Default::default()
    };
    t.draw(&mut painter, Vec2::ZERO, 100.0, &options);
    assert!(matches!(painter.ops[0], Op::Glyphs { x, .. } if x == 70.0));

    let mut painter = Recorder::default();
    let options = DrawOptions {
        align: Align::Center,
        ..Default::default()
    };
    t.draw(&mut painter, Vec2::ZERO, 100.0, &options);
    assert!(matches!(painter.ops[0], Op::Glyphs { x, .. } if x == 35.0));
}

#[test]
fn elided() {
    let t = text("hello world foo", &PLAIN_OPTIONS);
    let mut painter = Recorder::default();
    let bottom = t.draw_elided(&mut painter, Vec2::ZERO, 60.0, 1, 0.0, &Default::default());
    assert_eq!(bottom, 20.0);
    assert_eq!(painter.texts(), vec!["hel", ELLIPSIS]);
    assert!(matches!(painter.ops[1], Op::Glyphs { x, .. } if x == 30.0));

    // Text which fits is not elided
    let mut painter = Recorder::default();
    t.draw_elided(&mut painter, Vec2::ZERO, 200.0, 1, 0.0, &Default::default());
    assert_eq!(painter.texts(), vec!["hello world foo"]);

    let mut painter = Recorder::default();
    assert_eq!(t.draw_elided(&mut painter, Vec2::ZERO, 60.0, 0, 0.0, &Default::default()), 0.0);
    assert!(painter.ops.is_empty());
}

#[test]
fn elided_repeatable() {
    let t = text("hello \u{1F600} world foo bar", &PLAIN_OPTIONS);
    let options = DrawOptions {
        selection: TextSelection::new(2, 12),
        ..Default::default()
    };
    for width in [35.0, 60.0, 95.0] {
        let mut first = Recorder::default();
        let mut second = Recorder::default();
        let a = t.draw_elided(&mut first, Vec2::ZERO, width, 1, 0.0, &options);
        let b = t.draw_elided(&mut second, Vec2::ZERO, width, 1, 0.0, &options);
        assert_eq!(a, b);
        assert_eq!(first.ops, second.ops);
        assert_eq!(first.texts().last().copied(), Some(ELLIPSIS));
    }
}

#[test]
fn elided_selection() {
    let t = text("hello world foo", &PLAIN_OPTIONS);
    let mut painter = Recorder::default();
    let options = DrawOptions {
        selection: TextSelection::new(1, 10),
        ..Default::default()
    };
    t.draw_elided(&mut painter, Vec2::ZERO, 60.0, 1, 0.0, &options);
    // selection is clamped to the cut and the ellipsis shows it continues
    assert_eq!(
        painter.fills(),
        vec![
            Rect::new(Vec2(10.0, 0.0), Vec2(20.0, 20.0)),
            Rect::new(Vec2(30.0, 0.0), Vec2(30.0, 20.0)),
        ]
    );
}

#[test]
fn selection_fills() {
    let t = text("hello world", &PLAIN_OPTIONS);
    let mut painter = Recorder::default();
    let options = DrawOptions {
        selection: TextSelection::new(0, 5),
        ..Default::default()
    };
    t.draw(&mut painter, Vec2::ZERO, 200.0, &options);
    assert_eq!(painter.fills(), vec![Rect::new(Vec2::ZERO, Vec2(50.0, 20.0))]);
    assert!(matches!(
        painter.ops[1],
        Op::Glyphs { selected, .. } if selected == Some((0.0, 50.0))
    ));

    let t = text("aaaa bbbb", &PLAIN_OPTIONS);
    let mut painter = Recorder::default();
    let options = DrawOptions {
        selection: TextSelection::new(0, 9),
        ..Default::default()
    };
    t.draw(&mut painter, Vec2::ZERO, 50.0, &options);
    let fills = painter.fills();
    assert_eq!(fills.len(), 3);
    // the first line's selection extends to the right edge
    assert!(fills.contains(&Rect::new(Vec2(40.0, 0.0), Vec2(10.0, 20.0))));
    assert!(fills.contains(&Rect::new(Vec2(0.0, 0.0), Vec2(40.0, 20.0))));
    assert!(fills.contains(&Rect::new(Vec2(0.0, 20.0), Vec2(40.0, 20.0))));

    let mut painter = Recorder::default();
    let options = DrawOptions {
        selection: TextSelection::new(0, 9),
        full_width_selection: false,
        ..Default::default()
    };
    t.draw(&mut painter, Vec2::ZERO, 50.0, &options);
    assert_eq!(painter.fills().len(), 2);
}

#[test]
fn hit_test() {
    let t = text("hello world", &PLAIN_OPTIONS);
    let state = t.get_state(Vec2(25.0, 5.0), 200.0, symbol_request());
    assert!(state.upon_symbol);
    assert_eq!(state.symbol, 2);
    assert!(state.after_symbol);
    assert_eq!(state.position(t.as_str()), 3);

    let state = t.get_state(Vec2(21.0, 5.0), 200.0, symbol_request());
    assert_eq!(state.position(t.as_str()), 2);

    // right of the line: the end of the line
    let state = t.get_state(Vec2(150.0, 5.0), 200.0, symbol_request());
    assert!(!state.upon_symbol);
    assert_eq!(state.position(t.as_str()), 11);

    // below the text: the end of the text
    let state = t.get_state(Vec2(10.0, 100.0), 200.0, symbol_request());
    assert_eq!(state.position(t.as_str()), 11);

    // outside without symbol lookup: nothing
    let state = t.get_state(Vec2(250.0, 5.0), 200.0, StateRequest::default());
    assert_eq!(state.symbol, 0);
    assert!(!state.upon_symbol);
}

#[test]
fn hit_test_matches_wrap() {
    let t = text("aaaa bbbb cccc", &PLAIN_OPTIONS);
    let state = t.get_state(Vec2(1.0, 25.0), 50.0, symbol_request());
    assert_eq!(state.symbol, 5);
    assert!(!state.after_symbol);

    let state = t.get_state(Vec2(1.0, 45.0), 50.0, symbol_request());
    assert_eq!(state.symbol, 10);
}

#[test]
fn links() {
    let t = text("visit https://example.com now", &DEFAULT_OPTIONS);
    assert_eq!(t.links().len(), 1);
    let request = StateRequest {
        flags: StateFlags::LOOKUP_LINK,
        ..Default::default()
    };
    let state = t.get_state(Vec2(100.0, 5.0), 400.0, request);
    assert_eq!(state.link_index, Some(0));
    assert!(state.link.is_some());

    let state = t.get_state(Vec2(20.0, 5.0), 400.0, request);
    assert_eq!(state.link_index, None);
    assert!(state.link.is_none());

    assert_eq!(
        t.original_text(TextSelection::ALL, ExpandLinks::All),
        "visit https://example.com now"
    );
}

#[test]
fn bidi() {
    let t = text("ab \u{5E9}\u{5DC}\u{5D5}\u{5DD} cd", &PLAIN_OPTIONS);
    let mut painter = Recorder::default();
    t.draw(&mut painter, Vec2::ZERO, 200.0, &Default::default());
    assert_eq!(
        painter.texts(),
        vec!["ab ", "\u{5E9}\u{5DC}\u{5D5}\u{5DD}", " cd"]
    );
    assert!(matches!(painter.ops[1], Op::Glyphs { x, rtl: true, .. } if x == 30.0));

    // a right-to-left paragraph is aligned right and reversed
    let t = text("\u{5E9}\u{5DC}\u{5D5}\u{5DD} ab", &PLAIN_OPTIONS);
    let mut painter = Recorder::default();
    t.draw(&mut painter, Vec2::ZERO, 100.0, &Default::default());
    assert_eq!(painter.texts(), vec!["ab", "\u{5E9}\u{5DC}\u{5D5}\u{5DD} "]);
    assert!(matches!(painter.ops[0], Op::Glyphs { x, rtl: false, .. } if x == 30.0));
    assert!(matches!(painter.ops[1], Op::Glyphs { x, rtl: true, .. } if x == 50.0));

    // hit-testing the right-to-left run: the rightmost char comes first
    let state = t.get_state(Vec2(98.0, 5.0), 100.0, symbol_request());
    assert_eq!(state.symbol, 0);
    assert!(!state.after_symbol);
}

#[test]
fn emoji() {
    let t = text("a \u{1F600}", &PLAIN_OPTIONS);
    let mut painter = Recorder::default();
    t.draw(&mut painter, Vec2::ZERO, 200.0, &Default::default());
    assert_eq!(
        painter.ops[1],
        Op::Emoji(Vec2(21.0, 1.0), 18.0, EmojiId(0x1F600))
    );
    assert_eq!(t.to_isolated_emoji(), None);

    let t = text("\u{1F600}", &PLAIN_OPTIONS);
    assert_eq!(t.to_isolated_emoji().as_deref(), Some(&[EmojiId(0x1F600)][..]));
}

#[test]
fn skip_block() {
    let mut t = text("ab", &PLAIN_OPTIONS);
    assert!(t.update_skip_block(30.0, 40.0));
    let mut painter = Recorder::default();
    let bottom = t.draw(&mut painter, Vec2::ZERO, 200.0, &Default::default());
    assert_eq!(bottom, 40.0);
    assert_eq!(painter.texts(), vec!["ab"]);

    // the reserved space maps to the position before it
    let state = t.get_state(Vec2(40.0, 5.0), 200.0, symbol_request());
    assert!(!state.upon_symbol);
    assert_eq!(state.position(t.as_str()), 2);

    // an object wider than the remaining space starts a new line
    assert_eq!(t.count_line_widths(40.0, false), vec![20.0, 30.0]);
    assert_eq!(t.count_height(40.0, false), 60.0);
}

#[test]
fn skip_block_rtl() {
    let mut t = text("\u{5E9}\u{5DC}", &PLAIN_OPTIONS);
    assert!(t.update_skip_block(30.0, 40.0));

    // the reserved space is left of the text; it maps to the line start
    let state = t.get_state(Vec2(60.0, 5.0), 100.0, symbol_request());
    assert!(!state.upon_symbol);
    assert_eq!(state.symbol, 0);
    assert!(!state.after_symbol);
    assert_eq!(state.position(t.as_str()), 0);

    let state = t.get_state(Vec2(98.0, 5.0), 100.0, symbol_request());
    assert!(state.upon_symbol);
    assert_eq!(state.symbol, 0);
}
