//! Card filtering.

use tracing::debug;

use crate::token::Token;
use crate::types::{Card, DeckOptions};

/// Marker comment that excludes the card it appears in.
pub const IGNORE_MARKER: &str = "<!-- md2apkg ignore-card -->";

/// Remove cards by policy: empty backs (unless `include_empty`), cards
/// carrying the ignore marker on their back, and cards on ignored levels.
pub fn filter(cards: Vec<Card>, options: &DeckOptions) -> Vec<Card> {
    let before = cards.len();
    let cards: Vec<Card> = cards
        .into_iter()
        .filter(|card| options.include_empty || !has_empty_back(card))
        .filter(|card| !is_ignored(card))
        .filter(|card| !options.ignore_levels.contains(&card.heading_level))
        .collect();
    debug!(kept = cards.len(), dropped = before - cards.len(), "filtered cards");
    cards
}

/// A back holding nothing but closing tags left over from a split is empty.
///
/// This is stricter than a plain `back.is_empty()` check: a trailing split
/// marker leaves the paragraph's `</p>` on the back, and such a card is
/// dropped here instead of shipping a blank answer.
fn has_empty_back(card: &Card) -> bool {
    card.back.iter().all(Token::is_block_end)
}

fn is_ignored(card: &Card) -> bool {
    card.back
        .iter()
        .any(|token| token.is_inline() && token.content.trim().contains(IGNORE_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::partition;
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Event, TagEnd};
    use std::collections::BTreeSet;

    fn sample() -> Vec<Card> {
        partition(vec![
            Token::heading_open(1),
            Token::heading_close(1),
            Token::heading_open(2),
            Token::heading_close(2),
            Token::inline("A1"),
            Token::inline("%"),
            Token::inline("A2"),
            Token::heading_open(2),
            Token::heading_close(2),
            Token::inline("skip me"),
            Token::inline(IGNORE_MARKER),
            Token::heading_open(3),
            Token::heading_close(3),
            Token::inline("deep"),
        ])
    }

    fn ids(cards: &[Card]) -> Vec<usize> {
        cards.iter().map(|c| c.id).collect()
    }

    #[test]
    fn drops_empty_backs_by_default() {
        let cards = filter(sample(), &DeckOptions::default());
        assert_eq!(ids(&cards), vec![1, 3]);
    }

    #[test]
    fn include_empty_keeps_empty_backs() {
        let options = DeckOptions {
            include_empty: true,
            ..Default::default()
        };
        let cards = filter(sample(), &options);
        assert_eq!(ids(&cards), vec![0, 1, 3]);
    }

    #[test]
    fn ignore_marker_drops_card_even_with_include_empty() {
        let options = DeckOptions {
            include_empty: true,
            ..Default::default()
        };
        let cards = filter(sample(), &options);
        assert!(!ids(&cards).contains(&2));
    }

    #[test]
    fn ignored_levels_are_removed() {
        let options = DeckOptions {
            ignore_levels: BTreeSet::from([2]),
            ..Default::default()
        };
        let cards = filter(sample(), &options);
        assert_eq!(ids(&cards), vec![3]);
    }

    #[test]
    fn ignoring_every_level_empties_the_deck() {
        let options = DeckOptions {
            ignore_levels: BTreeSet::from([2]),
            ..Default::default()
        };
        let cards = partition(vec![
            Token::heading_open(1),
            Token::heading_close(1),
            Token::heading_open(2),
            Token::heading_close(2),
            Token::inline("A1"),
            Token::inline("%"),
            Token::inline("A2"),
        ]);
        assert!(filter(cards, &options).is_empty());
    }

    #[test]
    fn split_leftovers_count_as_empty() {
        let cards = partition(vec![
            Token::heading_open(1),
            Token::heading_close(1),
            Token::inline("front"),
            Token::inline("%"),
            Token::other(vec![Event::End(TagEnd::Paragraph)]),
        ]);
        assert!(filter(cards, &DeckOptions::default()).is_empty());

        let cards = partition(tokenize("# Q\n\nfront only\n\n%\n"));
        assert!(filter(cards, &DeckOptions::default()).is_empty());
    }

    #[test]
    fn filter_is_idempotent() {
        for options in [
            DeckOptions::default(),
            DeckOptions {
                include_empty: true,
                ignore_levels: BTreeSet::from([3]),
                ..Default::default()
            },
        ] {
            let once = filter(sample(), &options);
            let twice = filter(once.clone(), &options);
            assert_eq!(once, twice);
        }
    }
}
