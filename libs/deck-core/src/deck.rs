//! Document-to-deck pipeline.

use std::path::Path;

use tracing::info;

use crate::error::{DeckError, Result};
use crate::filter::filter;
use crate::images::extract_images;
use crate::partition::partition;
use crate::tokenizer::tokenize;
use crate::types::{Card, DeckOptions, Image};

/// Cards and media produced from one document.
#[derive(Debug, Clone)]
pub struct Deck {
    pub name: String,
    pub cards: Vec<Card>,
    pub images: Vec<Image>,
}

/// Build a deck from markdown source.
///
/// `document_dir` is the directory the document lives in; local image paths
/// are resolved against it. Returns [`DeckError::EmptyDeck`] when no card
/// survives filtering.
pub fn build_deck(source: &str, document_dir: &Path, options: &DeckOptions) -> Result<Deck> {
    let mut tokens = tokenize(source);
    let images = extract_images(&mut tokens, document_dir);
    let cards = partition(tokens);

    let name = options
        .deck_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| cards.first().map(|card| card.heading_str.clone()))
        .unwrap_or_default();

    let cards = filter(cards, options);
    if cards.is_empty() {
        return Err(DeckError::EmptyDeck);
    }

    info!(
        deck = %name,
        cards = cards.len(),
        images = images.len(),
        "built deck"
    );

    Ok(Deck {
        name,
        cards,
        images,
    })
}
