//! Error types for deck-core.

use thiserror::Error;

/// Result type alias using DeckError.
pub type Result<T> = std::result::Result<T, DeckError>;

/// Errors that can occur while building a deck.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Every card was filtered out; nothing should be written.
    #[error("no cards left after filtering, refusing to generate an empty deck")]
    EmptyDeck,

    /// A token lacks an attribute it needs. Recovered per token.
    #[error("malformed {kind} token: {reason}")]
    MalformedToken {
        kind: &'static str,
        reason: &'static str,
    },
}
