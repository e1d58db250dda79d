//! Card stylesheet.

use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;

/// Stylesheet every deck ships with.
pub const BASE_CSS: &str = include_str!("style.css");

static CSS_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid comment regex"));

/// Build the deck stylesheet, prepending the code style file if one is given.
pub async fn load_stylesheet(code_style: Option<&Path>) -> anyhow::Result<String> {
    let Some(path) = code_style else {
        return Ok(BASE_CSS.to_string());
    };

    let code_css = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading code style {}", path.display()))?;
    Ok(format!("{}\n{}", strip_comments(&code_css).trim(), BASE_CSS))
}

/// Remove `/* ... */` comments. Anki's template renderer trips over them.
pub fn strip_comments(css: &str) -> String {
    CSS_COMMENT.replace_all(css, "").into_owned()
}
