//! Core library for turning markdown notes into flashcard decks.
//!
//! Provides:
//! - Markdown tokenizer producing a flat token stream
//! - Card partitioner with split markers and heading hierarchy
//! - Card filter (empty backs, ignore markers, heading levels)
//! - Local image collection with media-name rewriting
//! - HTML rendering of cards

pub mod deck;
pub mod error;
pub mod filter;
pub mod images;
pub mod partition;
pub mod render;
pub mod token;
pub mod tokenizer;
pub mod types;

pub use deck::{build_deck, Deck};
pub use error::{DeckError, Result};
pub use filter::{filter, IGNORE_MARKER};
pub use images::extract_images;
pub use partition::{is_split_marker, partition, resolve_parent, SPLIT_MARKER};
pub use render::{render_card, render_tokens, RenderedCard};
pub use token::{Token, TokenKind};
pub use tokenizer::tokenize;
pub use types::{Card, CardId, DeckOptions, Image, NO_HEADING};
