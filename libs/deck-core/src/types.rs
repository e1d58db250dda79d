//! Core types for deck generation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::token::{Token, TokenKind};

/// Position of a card in partition order. Parents are looked up by id.
pub type CardId = usize;

/// Heading level of a card that does not start with a heading.
pub const NO_HEADING: u8 = 0;

/// One flashcard.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: CardId,
    /// Question side. Starts with the card's heading, except for content
    /// preceding the first heading.
    pub front: Vec<Token>,
    /// Answer side.
    pub back: Vec<Token>,
    pub heading_level: u8,
    pub heading_str: String,
    /// Nearest earlier card with a shallower heading.
    pub parent: Option<CardId>,
    /// Heading strings of all ancestors, root first.
    pub breadcrumb: Vec<String>,
    pub tags: BTreeSet<String>,
}

impl Card {
    /// Build a card from its token slices. Parent linkage is filled in by the
    /// partitioner.
    pub fn new(id: CardId, front: Vec<Token>, back: Vec<Token>) -> Self {
        let heading_level = match front.first().map(|t| t.kind) {
            Some(TokenKind::HeadingOpen { level }) => level,
            _ => NO_HEADING,
        };
        let heading_str = front
            .iter()
            .skip_while(|t| !t.is_heading_open())
            .find(|t| t.is_inline())
            .map(|t| t.plain_text().trim().to_string())
            .unwrap_or_default();

        Self {
            id,
            front,
            back,
            heading_level,
            heading_str,
            parent: None,
            breadcrumb: Vec::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Link this card below `parent` and derive its tags from the ancestry.
    pub fn attach_to(&mut self, parent: &Card) {
        self.parent = Some(parent.id);
        self.breadcrumb = parent.breadcrumb.clone();
        if !parent.heading_str.is_empty() {
            self.breadcrumb.push(parent.heading_str.clone());
        }
        self.tags = self.breadcrumb.iter().filter_map(|h| tag_from(h)).collect();
    }
}

/// Turn a heading into an Anki tag (tags may not contain whitespace).
fn tag_from(heading: &str) -> Option<String> {
    let tag = heading.split_whitespace().collect::<Vec<_>>().join("_");
    (!tag.is_empty()).then_some(tag)
}

/// A local image referenced by the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    /// Path relative to the working directory, `/`-separated and normalized.
    pub file_path: String,
    /// Unique media name used inside the package.
    pub filtered_path: String,
}

impl Image {
    pub fn new(file_path: String) -> Self {
        let filtered_path = filtered_name(&file_path);
        Self {
            file_path,
            filtered_path,
        }
    }
}

impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        self.file_path == other.file_path
    }
}

impl Eq for Image {}

/// Media name: short hash of the full path plus the sanitized file name.
fn filtered_name(file_path: &str) -> String {
    let hash = format!("{:x}", Sha256::digest(file_path.as_bytes()));
    let file_name = file_path.rsplit('/').next().unwrap_or_default();
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}", &hash[..8], sanitized)
}

/// Options controlling deck generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeckOptions {
    /// Keep cards whose back is empty.
    pub include_empty: bool,
    /// Heading levels whose cards are dropped.
    pub ignore_levels: BTreeSet<u8>,
    /// Deck title. Defaults to the first card's heading.
    pub deck_name: Option<String>,
    /// Accepted for compatibility with existing option files; dollar-delimited
    /// LaTeX is passed through unchanged either way.
    pub ignore_latex_dollar_syntax: bool,
    /// Stylesheet file for code blocks.
    pub code_style: Option<String>,
}
