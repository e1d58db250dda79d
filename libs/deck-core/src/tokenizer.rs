//! Markdown tokenizer.
//!
//! Turns `pulldown-cmark` events into the flat token stream the partitioner
//! consumes:
//!
//! ```text
//! # Rust          HeadingOpen(1), Inline("Rust"), HeadingClose(1)
//! Ownership.      Other(<p>), Inline("Ownership."), Other(</p>)
//! ```
//!
//! Raw HTML blocks become `Inline` tokens so that marker comments written on
//! their own line (`<!-- md2apkg split -->`) are seen by the splitter and the
//! card filter. Code blocks are kept whole as a single `Other` token.

use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::token::{Token, TokenKind};

/// Tokenize markdown source.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut builder = StreamBuilder::new(source);
    for (event, range) in Parser::new_ext(source, options()).into_offset_iter() {
        builder.process_event(event.into_static(), range);
    }
    builder.finalize()
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlockKind {
    Code,
    Html,
}

/// Block whose events are collected whole before becoming a token.
struct RawBlock {
    kind: BlockKind,
    events: Vec<Event<'static>>,
    range: Range<usize>,
}

/// Run of consecutive inline events.
struct InlineRun {
    children: Vec<Token>,
    range: Range<usize>,
    image: Option<ImageSpan>,
}

/// Events between `Start(Image)` and its matching `End(Image)`.
struct ImageSpan {
    src: Option<String>,
    events: Vec<Event<'static>>,
    depth: usize,
}

enum EventClass {
    HeadingOpen(u8),
    HeadingClose(u8),
    BlockStart(BlockKind),
    Inline,
    Other,
}

struct StreamBuilder<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    run: Option<InlineRun>,
    block: Option<RawBlock>,
}

impl<'a> StreamBuilder<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            run: None,
            block: None,
        }
    }

    fn process_event(&mut self, event: Event<'static>, range: Range<usize>) {
        if let Some(block) = self.block.as_mut() {
            let closes = matches!(
                (block.kind, &event),
                (BlockKind::Code, Event::End(TagEnd::CodeBlock))
                    | (BlockKind::Html, Event::End(TagEnd::HtmlBlock))
            );
            block.range.end = block.range.end.max(range.end);
            block.events.push(event);
            if closes {
                self.finish_block();
            }
            return;
        }

        match classify(&event) {
            EventClass::HeadingOpen(level) => {
                self.flush_run();
                self.tokens
                    .push(Token::from_events(TokenKind::HeadingOpen { level }, vec![event]));
            }
            EventClass::HeadingClose(level) => {
                self.flush_run();
                self.tokens
                    .push(Token::from_events(TokenKind::HeadingClose { level }, vec![event]));
            }
            EventClass::BlockStart(kind) => {
                self.flush_run();
                self.block = Some(RawBlock {
                    kind,
                    events: vec![event],
                    range,
                });
            }
            EventClass::Inline => self.push_inline(event, range),
            EventClass::Other => {
                self.flush_run();
                self.tokens.push(Token::other(vec![event]));
            }
        }
    }

    fn push_inline(&mut self, event: Event<'static>, range: Range<usize>) {
        let run = self.run.get_or_insert_with(|| InlineRun {
            children: Vec::new(),
            range: range.clone(),
            image: None,
        });
        run.range.start = run.range.start.min(range.start);
        run.range.end = run.range.end.max(range.end);

        if let Some(span) = run.image.as_mut() {
            match &event {
                Event::Start(Tag::Image { .. }) => span.depth += 1,
                Event::End(TagEnd::Image) => span.depth -= 1,
                _ => {}
            }
            span.events.push(event);
            if span.depth == 0 {
                if let Some(span) = run.image.take() {
                    run.children.push(Token {
                        src: span.src,
                        ..Token::from_events(TokenKind::Image, span.events)
                    });
                }
            }
            return;
        }

        let image_src = match &event {
            Event::Start(Tag::Image { dest_url, .. }) => {
                Some((!dest_url.is_empty()).then(|| dest_url.to_string()))
            }
            _ => None,
        };
        let text = match &event {
            Event::Text(text) | Event::Code(text) => Some(text.to_string()),
            _ => None,
        };

        if let Some(src) = image_src {
            run.image = Some(ImageSpan {
                src,
                events: vec![event],
                depth: 1,
            });
        } else if let Some(content) = text {
            run.children.push(Token {
                content,
                ..Token::from_events(TokenKind::Text, vec![event])
            });
        } else {
            run.children.push(Token::other(vec![event]));
        }
    }

    fn flush_run(&mut self) {
        let Some(mut run) = self.run.take() else {
            return;
        };
        // Unterminated image span: keep its events as they are.
        if let Some(span) = run.image.take() {
            run.children.push(Token {
                src: span.src,
                ..Token::from_events(TokenKind::Image, span.events)
            });
        }
        let content = self.slice(&run.range);
        self.tokens
            .push(Token::inline_with_children(&content, run.children));
    }

    fn finish_block(&mut self) {
        let Some(block) = self.block.take() else {
            return;
        };
        match block.kind {
            BlockKind::Code => self.tokens.push(Token::other(block.events)),
            BlockKind::Html => {
                let content = self.slice(&block.range);
                self.tokens.push(Token::inline_with_children(
                    &content,
                    vec![Token::other(block.events)],
                ));
            }
        }
    }

    fn slice(&self, range: &Range<usize>) -> String {
        self.source
            .get(range.clone())
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    fn finalize(mut self) -> Vec<Token> {
        self.flush_run();
        if let Some(block) = self.block.take() {
            self.tokens.push(Token::other(block.events));
        }
        self.tokens
    }
}

fn classify(event: &Event<'_>) -> EventClass {
    match event {
        Event::Start(Tag::Heading { level, .. }) => EventClass::HeadingOpen(*level as u8),
        Event::End(TagEnd::Heading(level)) => EventClass::HeadingClose(*level as u8),
        Event::Start(Tag::CodeBlock(_)) => EventClass::BlockStart(BlockKind::Code),
        Event::Start(Tag::HtmlBlock) => EventClass::BlockStart(BlockKind::Html),
        Event::Text(_)
        | Event::Code(_)
        | Event::InlineHtml(_)
        | Event::SoftBreak
        | Event::HardBreak
        | Event::FootnoteReference(_)
        | Event::TaskListMarker(_) => EventClass::Inline,
        Event::Start(
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. },
        ) => EventClass::Inline,
        Event::End(
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image,
        ) => EventClass::Inline,
        _ => EventClass::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn heading_and_paragraph() {
        let tokens = tokenize("# Rust\n\nOwnership rules.\n");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::HeadingOpen { level: 1 },
                TokenKind::Inline,
                TokenKind::HeadingClose { level: 1 },
                TokenKind::Other,
                TokenKind::Inline,
                TokenKind::Other,
            ]
        );
        assert_eq!(tokens[1].content, "Rust");
        assert_eq!(tokens[4].content, "Ownership rules.");
    }

    #[test]
    fn heading_level_is_kept() {
        let tokens = tokenize("### Deep\n");
        assert_eq!(tokens[0].kind, TokenKind::HeadingOpen { level: 3 });
        assert_eq!(tokens[2].kind, TokenKind::HeadingClose { level: 3 });
    }

    #[test]
    fn inline_children_split_text_and_markup() {
        let tokens = tokenize("some **bold** text\n");
        let inline = &tokens[1];
        assert_eq!(inline.content, "some **bold** text");
        assert_eq!(inline.plain_text(), "some bold text");
        assert_eq!(inline.children.len(), 5);
    }

    #[test]
    fn image_becomes_single_child() {
        let tokens = tokenize("before ![alt *text*](img/a.png) after\n");
        let inline = &tokens[1];
        let images: Vec<&Token> = inline
            .children
            .iter()
            .filter(|t| t.kind == TokenKind::Image)
            .collect();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].src.as_deref(), Some("img/a.png"));
    }

    #[test]
    fn html_comment_line_is_inline() {
        let tokens = tokenize("# Q\n\nA\n\n<!-- md2apkg split -->\n\nB\n");
        let comment = tokens
            .iter()
            .find(|t| t.is_inline() && t.content.contains("md2apkg split"))
            .expect("marker token");
        assert_eq!(comment.content, "<!-- md2apkg split -->");
    }

    #[test]
    fn code_block_is_one_token() {
        let tokens = tokenize("```rust\nlet x = 1;\nlet y = 2;\n```\n");
        assert_eq!(kinds(&tokens), vec![TokenKind::Other]);
    }

    #[test]
    fn empty_source() {
        assert!(tokenize("").is_empty());
    }
}
