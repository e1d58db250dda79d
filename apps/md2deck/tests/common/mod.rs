//! Common test utilities for integration tests.
//!
//! Each test gets its own scratch directory holding the input document,
//! any media it references and the generated package.

pub mod fixtures;

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use md2deck::config::Args;
use md2deck::package::{COLLECTION_ENTRY, MEDIA_ENTRY};

/// Scratch directory with a document to convert.
pub struct TestContext {
    dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file below the scratch directory, creating parents.
    pub fn write(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, contents).expect("Failed to write file");
        path
    }

    /// Command-line arguments for converting `input` with extra flags.
    pub fn args(&self, input: &Path, extra: &[&str]) -> Args {
        let input = input.to_string_lossy().into_owned();
        let argv = ["md2deck", input.as_str()].into_iter().chain(extra.iter().copied());
        Args::try_parse_from(argv).expect("Failed to parse args")
    }
}

/// Contents of a written `.apkg`.
pub struct Package {
    pub entries: HashMap<String, Vec<u8>>,
    collection: TempDir,
}

impl Package {
    pub fn open(path: &Path) -> Self {
        let mut archive =
            zip::ZipArchive::new(File::open(path).expect("Failed to open package"))
                .expect("Failed to read package");

        let mut entries = HashMap::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).expect("Failed to read entry");
            let mut data = Vec::new();
            file.read_to_end(&mut data).expect("Failed to read entry data");
            entries.insert(file.name().to_string(), data);
        }

        let collection = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::write(
            collection.path().join(COLLECTION_ENTRY),
            &entries[COLLECTION_ENTRY],
        )
        .expect("Failed to extract collection");

        Self {
            entries,
            collection,
        }
    }

    pub fn media_manifest(&self) -> HashMap<String, String> {
        serde_json::from_slice(&self.entries[MEDIA_ENTRY]).expect("Invalid media manifest")
    }

    pub fn connection(&self) -> rusqlite::Connection {
        rusqlite::Connection::open(self.collection.path().join(COLLECTION_ENTRY))
            .expect("Failed to open collection")
    }

    /// Note fields as (front, back) pairs, in insertion order.
    pub fn notes(&self) -> Vec<(String, String)> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare("SELECT flds FROM notes ORDER BY id")
            .expect("Failed to prepare query");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .expect("Failed to query notes");
        let notes = rows
            .map(|flds| {
                let flds = flds.expect("Failed to read row");
                let (front, back) = flds.split_once('\u{1f}').expect("Two fields");
                (front.to_string(), back.to_string())
            })
            .collect();
        notes
    }

    pub fn tags(&self) -> Vec<String> {
        let conn = self.connection();
        let mut stmt = conn
            .prepare("SELECT tags FROM notes ORDER BY id")
            .expect("Failed to prepare query");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .expect("Failed to query tags");
        let tags = rows.map(|tags| tags.expect("Failed to read row")).collect();
        tags
    }
}
