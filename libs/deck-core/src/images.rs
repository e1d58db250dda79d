//! Local image collection.
//!
//! Walks the token stream, collects every local image reference and points
//! the image token at the media name it will have inside the package.

use std::collections::HashSet;
use std::path::{Component, Path};

use tracing::warn;

use crate::error::{DeckError, Result};
use crate::token::{Token, TokenKind};
use crate::types::Image;

/// Collect local images and rewrite their tokens' `src` to the media name.
///
/// Remote images (`scheme://...`) are left alone. A token without a usable
/// source is skipped with a warning. The result holds each path once, in
/// first-seen order.
pub fn extract_images(tokens: &mut [Token], document_dir: &Path) -> Vec<Image> {
    let mut found = Vec::new();
    collect(tokens, document_dir, &mut found);

    let mut seen = HashSet::new();
    found.retain(|image| !image.file_path.is_empty() && seen.insert(image.file_path.clone()));
    found
}

fn collect(tokens: &mut [Token], document_dir: &Path, found: &mut Vec<Image>) {
    for token in tokens {
        match token.kind {
            TokenKind::Image => match rewrite_image(token, document_dir) {
                Ok(Some(image)) => found.push(image),
                Ok(None) => {}
                Err(e) => warn!("skipping image: {}", e),
            },
            TokenKind::Inline => collect(&mut token.children, document_dir, found),
            _ => {}
        }
    }
}

fn rewrite_image(token: &mut Token, document_dir: &Path) -> Result<Option<Image>> {
    let src = token
        .src
        .as_deref()
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .ok_or(DeckError::MalformedToken {
            kind: "image",
            reason: "missing src attribute",
        })?;

    if src.contains("://") {
        return Ok(None);
    }

    let image = Image::new(normalize_path(&document_dir.join(src.replace('\\', "/"))));
    token.src = Some(image.filtered_path.clone());
    Ok(Some(image))
}

/// Lexically normalize a path: drop `.`, fold `..`, join with `/`.
pub fn normalize_path(path: &Path) -> String {
    let mut prefix = String::new();
    let mut parts: Vec<String> = Vec::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => prefix.push_str(&p.as_os_str().to_string_lossy()),
            Component::RootDir => prefix.push('/'),
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(last) if last != ".." => {
                    parts.pop();
                }
                // `..` above the root stays at the root.
                _ if prefix.ends_with('/') => {}
                _ => parts.push("..".to_string()),
            },
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
        }
    }

    format!("{}{}", prefix, parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn inline_with_images(sources: &[Option<&str>]) -> Token {
        let children = sources.iter().map(|src| Token::image(*src)).collect();
        Token::inline_with_children("images", children)
    }

    #[test]
    fn collects_and_rewrites_local_images() {
        let mut tokens = vec![inline_with_images(&[Some("img/a.png")])];
        let images = extract_images(&mut tokens, Path::new("notes"));

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_path, "notes/img/a.png");
        assert_eq!(
            tokens[0].children[0].src.as_deref(),
            Some(images[0].filtered_path.as_str())
        );
    }

    #[test]
    fn different_spellings_are_deduplicated() {
        let mut tokens = vec![
            inline_with_images(&[Some("img/a.png"), Some("./img/a.png")]),
            inline_with_images(&[Some("img/../img//a.png"), Some("img\\a.png")]),
        ];
        let images = extract_images(&mut tokens, Path::new("notes"));

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_path, "notes/img/a.png");
        for inline in &tokens {
            for child in &inline.children {
                assert_eq!(child.src.as_deref(), Some(images[0].filtered_path.as_str()));
            }
        }
    }

    #[test]
    fn remote_images_are_untouched() {
        let mut tokens = vec![inline_with_images(&[Some("https://example.com/a.png")])];
        let images = extract_images(&mut tokens, Path::new("notes"));

        assert!(images.is_empty());
        assert_eq!(
            tokens[0].children[0].src.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn malformed_image_is_skipped() {
        let mut tokens = vec![inline_with_images(&[None, Some("b.png")])];
        let images = extract_images(&mut tokens, Path::new(""));

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].file_path, "b.png");
        assert_eq!(tokens[0].children[0].src, None);
    }

    #[test]
    fn top_level_image_tokens_are_collected() {
        let mut tokens = vec![Token::image(Some("c.png"))];
        let images = extract_images(&mut tokens, Path::new("dir"));
        assert_eq!(images[0].file_path, "dir/c.png");
    }

    #[test]
    fn keeps_first_seen_order() {
        let mut tokens = vec![inline_with_images(&[
            Some("b.png"),
            Some("a.png"),
            Some("b.png"),
        ])];
        let images = extract_images(&mut tokens, Path::new(""));
        let paths: Vec<&str> = images.iter().map(|i| i.file_path.as_str()).collect();
        assert_eq!(paths, vec!["b.png", "a.png"]);
    }

    #[test]
    fn normalize_handles_parent_and_root() {
        assert_eq!(normalize_path(Path::new("a/./b/../c.png")), "a/c.png");
        assert_eq!(normalize_path(Path::new("../x/y.png")), "../x/y.png");
        assert_eq!(normalize_path(Path::new("/a/../../b.png")), "/b.png");
    }
}
