//! `.apkg` archive writer.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use deck_core::{render_card, Deck, RenderedCard};
use serde::Serialize;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::collection::Collection;
use super::error::PackageError;

/// Archive entry holding the collection database.
pub const COLLECTION_ENTRY: &str = "collection.anki2";

/// Archive entry mapping numbered media entries to their file names.
pub const MEDIA_ENTRY: &str = "media";

/// A media file to ship inside the package.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Name the cards reference it by.
    pub name: String,
    pub data: Vec<u8>,
}

/// Counts of what went into a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    pub cards: usize,
    pub media: usize,
}

/// Write `deck` as an Anki package to `out_path`.
///
/// The archive is staged next to `out_path` and moved into place only once
/// it is complete, so a failed write never leaves a truncated package.
pub fn write_apkg(
    deck: &Deck,
    css: &str,
    media: &[MediaFile],
    out_path: &Path,
) -> Result<PackageSummary, PackageError> {
    let rendered: Vec<RenderedCard> = deck.cards.iter().map(render_card).collect();

    let workdir = tempfile::tempdir()?;
    let collection_path = workdir.path().join(COLLECTION_ENTRY);
    let mut collection = Collection::open(&collection_path, &deck.name, css)?;
    for card in &rendered {
        collection.add_card(card)?;
    }
    let cards = collection.note_count()?;
    collection.close()?;
    debug!(cards, path = %collection_path.display(), "wrote collection");

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let out_dir = out_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let staged = tempfile::NamedTempFile::new_in(out_dir)?;
    let mut zip = ZipWriter::new(staged.as_file());

    zip.start_file(COLLECTION_ENTRY, options)?;
    zip.write_all(&fs::read(&collection_path)?)?;

    zip.start_file(MEDIA_ENTRY, options)?;
    zip.write_all(serde_json::to_string(&media_manifest(media))?.as_bytes())?;

    for (index, file) in media.iter().enumerate() {
        zip.start_file(index.to_string(), options)?;
        zip.write_all(&file.data)?;
    }
    zip.finish()?;
    staged.persist(out_path).map_err(|e| e.error)?;

    Ok(PackageSummary {
        cards,
        media: media.len(),
    })
}

fn media_manifest(media: &[MediaFile]) -> BTreeMap<String, &str> {
    media
        .iter()
        .enumerate()
        .map(|(index, file)| (index.to_string(), file.name.as_str()))
        .collect()
}
