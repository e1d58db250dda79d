//! HTML rendering of cards.

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Tag, TagEnd};
use serde::Serialize;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;
use tracing::warn;

use crate::token::Token;
use crate::types::Card;

/// Separator between ancestor headings in the breadcrumb.
const BREADCRUMB_SEPARATOR: &str = " \u{203a} ";

/// Prefix for highlight classes, so highlight.js themes apply to the
/// scopes they share names with (`keyword`, `string`, `comment`, ...).
const HIGHLIGHT_CLASS_PREFIX: &str = "hljs-";

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// A card rendered to HTML, ready for packaging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedCard {
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
}

/// Render a card. The front is prefixed with the headings of its ancestors.
pub fn render_card(card: &Card) -> RenderedCard {
    let mut front_events = breadcrumb_events(&card.breadcrumb);
    for token in &card.front {
        token.push_events(&mut front_events);
    }

    RenderedCard {
        front: to_html(front_events),
        back: render_tokens(&card.back),
        tags: card.tags.iter().cloned().collect(),
    }
}

/// Render a token slice to HTML.
pub fn render_tokens(tokens: &[Token]) -> String {
    let mut events = Vec::new();
    for token in tokens {
        token.push_events(&mut events);
    }
    to_html(events)
}

fn to_html(events: Vec<Event<'static>>) -> String {
    let mut out = String::new();
    html::push_html(&mut out, highlight_code_blocks(balance(events)).into_iter());
    out
}

/// Replace fenced code blocks in a known language with class-highlighted
/// HTML. Other code blocks are left as they are.
fn highlight_code_blocks(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    let mut out = Vec::with_capacity(events.len());
    let mut events = events.into_iter();
    while let Some(event) = events.next() {
        let lang = match &event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                info.split_whitespace().next().map(str::to_string)
            }
            _ => None,
        };
        let Some(lang) = lang else {
            out.push(event);
            continue;
        };

        let mut block = vec![event];
        let mut code = String::new();
        for inner in events.by_ref() {
            let closes = matches!(inner, Event::End(TagEnd::CodeBlock));
            if let Event::Text(text) = &inner {
                code.push_str(text);
            }
            block.push(inner);
            if closes {
                break;
            }
        }

        match highlight(&code, &lang) {
            Some(highlighted) => out.push(Event::Html(CowStr::from(format!(
                "<pre><code class=\"hljs language-{}\">{}</code></pre>\n",
                lang, highlighted
            )))),
            None => out.extend(block),
        }
    }
    out
}

fn highlight(code: &str, lang: &str) -> Option<String> {
    let syntax = SYNTAXES.find_syntax_by_token(lang)?;
    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        &SYNTAXES,
        ClassStyle::SpacedPrefixed {
            prefix: HIGHLIGHT_CLASS_PREFIX,
        },
    );
    for line in LinesWithEndings::from(code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            warn!("highlighting {} block failed: {}", lang, e);
            return None;
        }
    }
    Some(generator.finalize())
}

/// Drop block ends whose start lives on the other side of a card boundary or
/// split marker, and trailing starts whose content went to the other side.
fn balance(events: Vec<Event<'static>>) -> Vec<Event<'static>> {
    let mut depth = 0usize;
    let mut out = Vec::with_capacity(events.len());
    for event in events {
        match event {
            Event::Start(_) => {
                depth += 1;
                out.push(event);
            }
            Event::End(_) if depth == 0 => {}
            Event::End(_) => {
                depth -= 1;
                out.push(event);
            }
            _ => out.push(event),
        }
    }
    while matches!(out.last(), Some(Event::Start(_))) {
        out.pop();
    }
    out
}

fn breadcrumb_events(breadcrumb: &[String]) -> Vec<Event<'static>> {
    if breadcrumb.is_empty() {
        return Vec::new();
    }

    let mut events = vec![Event::Html(CowStr::Borrowed("<div class=\"breadcrumb\">"))];
    for (i, heading) in breadcrumb.iter().enumerate() {
        if i > 0 {
            events.push(Event::Html(CowStr::Borrowed(BREADCRUMB_SEPARATOR)));
        }
        events.push(Event::Text(CowStr::from(heading.clone())));
    }
    events.push(Event::Html(CowStr::Borrowed("</div>\n")));
    events
}
