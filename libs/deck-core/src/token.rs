//! Flat document token stream.
//!
//! A [`Token`] is the unit the partitioner works on. Block structure is kept
//! flat (`HeadingOpen`, `Inline`, `HeadingClose`, ...) and inline content is
//! grouped into a single `Inline` token whose children hold the individual
//! inline pieces. Every token remembers the markdown events it was built from
//! so a card can be rendered back to HTML from nothing but its tokens.

use pulldown_cmark::{CowStr, Event, HeadingLevel, LinkType, Tag, TagEnd};

/// Token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    HeadingOpen { level: u8 },
    HeadingClose { level: u8 },
    /// A run of inline content (paragraph text, heading text, raw html block).
    Inline,
    /// Text or code span inside an `Inline` token.
    Text,
    /// Image reference inside an `Inline` token.
    Image,
    /// Anything else; passed through untouched.
    Other,
}

/// One entry of the token stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw source text for `Inline` tokens, literal text for `Text` tokens.
    pub content: String,
    /// Inline pieces, only populated for `Inline` tokens.
    pub children: Vec<Token>,
    /// Image source. The image extractor rewrites this in place.
    pub src: Option<String>,
    pub(crate) events: Vec<Event<'static>>,
}

impl Token {
    pub(crate) fn from_events(kind: TokenKind, events: Vec<Event<'static>>) -> Self {
        Self {
            kind,
            content: String::new(),
            children: Vec::new(),
            src: None,
            events,
        }
    }

    pub fn heading_open(level: u8) -> Self {
        Self::from_events(
            TokenKind::HeadingOpen { level },
            vec![Event::Start(Tag::Heading {
                level: heading_level(level),
                id: None,
                classes: Vec::new(),
                attrs: Vec::new(),
            })],
        )
    }

    pub fn heading_close(level: u8) -> Self {
        Self::from_events(
            TokenKind::HeadingClose { level },
            vec![Event::End(TagEnd::Heading(heading_level(level)))],
        )
    }

    /// Inline token holding a single text child.
    pub fn inline(content: &str) -> Self {
        Self::inline_with_children(content, vec![Self::text(content)])
    }

    pub fn inline_with_children(content: &str, children: Vec<Token>) -> Self {
        Self {
            kind: TokenKind::Inline,
            content: content.to_string(),
            children,
            src: None,
            events: Vec::new(),
        }
    }

    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            ..Self::from_events(
                TokenKind::Text,
                vec![Event::Text(CowStr::from(content.to_string()))],
            )
        }
    }

    /// Image with empty alt text. `None` produces a token without a source.
    pub fn image(src: Option<&str>) -> Self {
        let dest = src.unwrap_or_default().to_string();
        Self {
            src: src.map(str::to_string),
            ..Self::from_events(
                TokenKind::Image,
                vec![
                    Event::Start(Tag::Image {
                        link_type: LinkType::Inline,
                        dest_url: CowStr::from(dest),
                        title: CowStr::Borrowed(""),
                        id: CowStr::Borrowed(""),
                    }),
                    Event::End(TagEnd::Image),
                ],
            )
        }
    }

    /// Opaque pass-through token.
    pub fn other(events: Vec<Event<'static>>) -> Self {
        Self::from_events(TokenKind::Other, events)
    }

    pub fn is_heading_open(&self) -> bool {
        matches!(self.kind, TokenKind::HeadingOpen { .. })
    }

    pub fn is_heading_close(&self) -> bool {
        matches!(self.kind, TokenKind::HeadingClose { .. })
    }

    pub fn is_inline(&self) -> bool {
        self.kind == TokenKind::Inline
    }

    /// Pass-through token that only closes blocks, e.g. the `</p>` left
    /// behind a split marker.
    pub fn is_block_end(&self) -> bool {
        self.kind == TokenKind::Other && self.events.iter().all(|e| matches!(e, Event::End(_)))
    }

    /// Plain text of this token and its children (text and code spans only).
    pub fn plain_text(&self) -> String {
        match self.kind {
            TokenKind::Text => self.content.clone(),
            TokenKind::Inline => self.children.iter().map(Token::plain_text).collect(),
            _ => String::new(),
        }
    }

    /// Append the events needed to render this token.
    ///
    /// Image tokens are emitted with their current `src`, so rewrites done by
    /// the image extractor show up in the rendered output.
    pub fn push_events(&self, out: &mut Vec<Event<'static>>) {
        match self.kind {
            TokenKind::Inline => {
                for child in &self.children {
                    child.push_events(out);
                }
            }
            TokenKind::Image => {
                for event in &self.events {
                    match (event, &self.src) {
                        (
                            Event::Start(Tag::Image {
                                link_type,
                                title,
                                id,
                                ..
                            }),
                            Some(src),
                        ) => out.push(Event::Start(Tag::Image {
                            link_type: *link_type,
                            dest_url: CowStr::from(src.clone()),
                            title: title.clone(),
                            id: id.clone(),
                        })),
                        _ => out.push(event.clone()),
                    }
                }
            }
            _ => out.extend(self.events.iter().cloned()),
        }
    }
}

fn heading_level(level: u8) -> HeadingLevel {
    HeadingLevel::try_from(level as usize).unwrap_or(HeadingLevel::H6)
}
