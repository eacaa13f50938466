// Extracted text with entities re-parses to the same blocks

use chat_text::entity::{EntityInText, EntityType, TextWithEntities};
use chat_text::shaper::MonoShaper;
use chat_text::*;
use std::sync::Arc;

fn style() -> Arc<TextStyle> {
    Arc::new(TextStyle::new(Arc::new(MonoShaper::new(10.0, 20.0))))
}

fn reparse(t: &Text, options: &ParseOptions) -> Text {
    let rich = t.original_text_with_entities(TextSelection::ALL);
    let mut copy = Text::new(t.style().clone());
    copy.set_marked_text(rich, options);
    copy
}

#[test]
fn detected_links() {
    let t = Text::with_text(style(), "visit example.com now", &DEFAULT_OPTIONS);
    let copy = reparse(&t, &DEFAULT_OPTIONS);
    assert_eq!(copy.as_str(), t.as_str());
    assert_eq!(copy.blocks(), t.blocks());
    assert_eq!(copy.links().len(), 1);
    assert_eq!(copy.to_string(), "visit example.com now");
}

#[test]
fn formatted_message() {
    let source = TextWithEntities {
        text: "bold and italic\nsee link \u{1F600}".into(),
        entities: vec![
            EntityInText::new(EntityType::Bold, 0, 4),
            EntityInText::new(EntityType::Italic, 9, 6),
            EntityInText::with_data(EntityType::CustomUrl, 20, 4, "https://x.y".into()),
        ],
    };
    let mut t = Text::new(style());
    t.set_marked_text(source, &MESSAGE_OPTIONS);

    let rich = t.original_text_with_entities(TextSelection::ALL);
    assert_eq!(rich.entities.len(), 3);
    assert_eq!(rich.entities[2].data, "https://x.y");

    let copy = reparse(&t, &MESSAGE_OPTIONS);
    assert_eq!(copy.as_str(), t.as_str());
    assert_eq!(copy.blocks(), t.blocks());
    assert_eq!(copy.links().len(), t.links().len());
}

#[test]
fn plain_selection() {
    let t = Text::with_text(style(), "one two\nthree", &PLAIN_OPTIONS);
    let sel = TextSelection::new(4, 10);
    assert_eq!(t.original_text(sel, ExpandLinks::None), "two\nth");
    let rich = t.original_text_with_entities(sel);
    assert_eq!(rich.text, "two\nth");
    assert!(rich.entities.is_empty());
}

/// Deterministic xorshift generator
struct Rng(u64);

impl Rng {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

fn generate(rng: &mut Rng) -> TextWithEntities {
    const CHARS: [char; 7] = ['a', 'b', 'c', ' ', '\n', '\u{e9}', '\u{1F600}'];
    const KINDS: [EntityType; 5] = [
        EntityType::Bold,
        EntityType::Italic,
        EntityType::Underline,
        EntityType::StrikeOut,
        EntityType::CustomUrl,
    ];

    let len = 2 + rng.below(20);
    let mut text = String::from("a");
    for _ in 2..len {
        text.push(CHARS[rng.below(CHARS.len())]);
    }
    text.push('b');
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    let mut entities = Vec::new();
    let mut has_link = false;
    for _ in 0..rng.below(6) {
        let kind = KINDS[rng.below(KINDS.len())];
        if kind == EntityType::CustomUrl && has_link {
            continue;
        }
        let a = rng.below(bounds.len() - 1);
        let b = a + 1 + rng.below(bounds.len() - 1 - a);
        let (offset, length) = (bounds[a], bounds[b] - bounds[a]);
        entities.push(if kind == EntityType::CustomUrl {
            has_link = true;
            EntityInText::with_data(kind, offset, length, "https://x.y".into())
        } else {
            EntityInText::new(kind, offset, length)
        });
    }
    entities.sort_by_key(|e| e.offset);
    TextWithEntities { text, entities }
}

#[test]
fn generated_messages() {
    let mut rng = Rng(0x2545_F491_4F6C_DD1D);
    for _ in 0..300 {
        let source = generate(&mut rng);
        let mut t = Text::new(style());
        t.set_marked_text(source.clone(), &MESSAGE_OPTIONS);

        let copy = reparse(&t, &MESSAGE_OPTIONS);
        assert_eq!(copy.as_str(), t.as_str(), "{source:?}");
        assert_eq!(copy.blocks(), t.blocks(), "{source:?}");
        assert_eq!(copy.links().len(), t.links().len(), "{source:?}");
    }
}
