//! Command-line configuration.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use deck_core::DeckOptions;

/// Convert a markdown document into an Anki deck.
#[derive(Debug, Clone, Parser)]
#[command(name = "md2deck", version, about)]
pub struct Args {
    /// Markdown file to convert
    pub input: PathBuf,

    /// Output package path (defaults to the input with an .apkg extension)
    #[arg(short, long, env = "MD2DECK_OUTPUT")]
    pub output: Option<PathBuf>,

    /// JSON file with deck options; flags given on the command line win
    #[arg(long, env = "MD2DECK_OPTIONS")]
    pub options: Option<PathBuf>,

    /// Deck name (defaults to the first heading, then the file name)
    #[arg(short = 'n', long, env = "MD2DECK_DECK_NAME")]
    pub deck_name: Option<String>,

    /// Keep cards whose answer side is empty
    #[arg(long, env = "MD2DECK_INCLUDE_EMPTY")]
    pub include_empty: bool,

    /// Drop cards whose heading has this level (repeatable)
    #[arg(
        long = "ignore-level",
        value_name = "LEVEL",
        value_parser = clap::value_parser!(u8).range(0..=6)
    )]
    pub ignore_levels: Vec<u8>,

    /// Accepted for compatibility; `$...$` is always passed through as text
    #[arg(long)]
    pub ignore_latex_dollar_syntax: bool,

    /// CSS file prepended to the card stylesheet, e.g. a highlight.js theme
    #[arg(long, env = "MD2DECK_CODE_STYLE")]
    pub code_style: Option<String>,
}

impl Args {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("apkg"))
    }

    /// Merge the flags over `base`. Only flags that were actually given
    /// override the base options.
    pub fn deck_options(&self, base: DeckOptions) -> DeckOptions {
        let mut options = base;
        if self.deck_name.is_some() {
            options.deck_name = self.deck_name.clone();
        }
        if self.include_empty {
            options.include_empty = true;
        }
        if !self.ignore_levels.is_empty() {
            options.ignore_levels = self.ignore_levels.iter().copied().collect::<BTreeSet<_>>();
        }
        if self.ignore_latex_dollar_syntax {
            options.ignore_latex_dollar_syntax = true;
        }
        if self.code_style.is_some() {
            options.code_style = self.code_style.clone();
        }
        options
    }
}

/// Read deck options from a JSON file.
pub async fn load_options(path: &Path) -> anyhow::Result<DeckOptions> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading options file {}", path.display()))?;
    let options = serde_json::from_str(&raw)
        .with_context(|| format!("parsing options file {}", path.display()))?;
    Ok(options)
}
