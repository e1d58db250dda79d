//! Card partitioner.
//!
//! Splits a token stream into cards. Each heading opens a card: the heading
//! itself is the front, everything up to the next heading is the back.
//!
//! ```markdown
//! # Ownership            <- front of card 1
//! Every value has one    <- back of card 1
//! owner.
//!
//! ## Moves               <- front of card 2 (parent: card 1)
//! Why does this fail?    <- back of card 2, promoted to the front by `%`
//! %
//! The value was moved.   <- back of card 2
//! ```
//!
//! The scan is a two-state machine (`Front`, `Back`). A `heading_close` in
//! `Front` switches to `Back`; a `heading_open` in `Back` finishes the card.

use tracing::debug;

use crate::token::Token;
use crate::types::Card;

/// Marker comment that promotes the back collected so far to the front.
pub const SPLIT_MARKER: &str = "<!-- md2apkg split -->";

/// Short form of [`SPLIT_MARKER`]: a paragraph holding only `%`.
pub const SPLIT_SHORTHAND: &str = "%";

/// Partition tokens into cards, in document order, with parents resolved.
pub fn partition(tokens: Vec<Token>) -> Vec<Card> {
    let mut partitioner = Partitioner::new();
    for token in tokens {
        partitioner.process_token(token);
    }
    let cards = partitioner.finalize();
    debug!(cards = cards.len(), "partitioned token stream");
    cards
}

/// Find the parent of `card`: the latest finished card with a strictly
/// shallower heading.
pub fn resolve_parent<'a>(finished: &'a [Card], card: &Card) -> Option<&'a Card> {
    finished
        .iter()
        .rev()
        .find(|candidate| candidate.heading_level < card.heading_level)
}

/// Whether `token` asks for the back collected so far to move to the front.
pub fn is_split_marker(token: &Token) -> bool {
    if !token.is_inline() {
        return false;
    }
    let content = token.content.trim();
    content == SPLIT_SHORTHAND || content.contains(SPLIT_MARKER)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Front,
    Back,
}

#[derive(Default)]
struct CardBuilder {
    front: Vec<Token>,
    back: Vec<Token>,
}

impl CardBuilder {
    fn is_empty(&self) -> bool {
        self.front.is_empty() && self.back.is_empty()
    }

    fn split(&mut self) {
        self.front.append(&mut self.back);
    }
}

struct Partitioner {
    finished: Vec<Card>,
    current: CardBuilder,
    side: Side,
}

impl Partitioner {
    fn new() -> Self {
        Self {
            finished: Vec::new(),
            current: CardBuilder::default(),
            side: Side::Front,
        }
    }

    fn process_token(&mut self, token: Token) {
        if self.side == Side::Back && token.is_heading_open() {
            self.finish_card();
        }

        match self.side {
            Side::Front => {
                let ends_front = token.is_heading_close();
                self.current.front.push(token);
                if ends_front {
                    self.side = Side::Back;
                }
            }
            Side::Back if is_split_marker(&token) => self.current.split(),
            Side::Back => self.current.back.push(token),
        }
    }

    fn finish_card(&mut self) {
        let builder = std::mem::take(&mut self.current);
        self.side = Side::Front;
        if builder.is_empty() {
            return;
        }

        let mut card = Card::new(self.finished.len(), builder.front, builder.back);
        if let Some(parent) = resolve_parent(&self.finished, &card) {
            card.attach_to(parent);
        }
        self.finished.push(card);
    }

    fn finalize(mut self) -> Vec<Card> {
        self.finish_card();
        self.finished
    }
}
