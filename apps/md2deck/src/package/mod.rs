//! Anki package output.

pub mod collection;
pub mod error;
pub mod schema;
pub mod writer;

pub use collection::{Collection, MODEL_NAME};
pub use error::PackageError;
pub use writer::{write_apkg, MediaFile, PackageSummary, COLLECTION_ENTRY, MEDIA_ENTRY};
