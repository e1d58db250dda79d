//! Sample documents used by the integration tests.

/// A small deck: a root heading, two questions, one split card, one
/// ignored card and a local image.
pub const RUST_NOTES: &str = r#"# Rust

Notes on the language.

## What is ownership?

Each value has a single owner.

## Why does this not compile?

```rust
let a = String::new();
let b = a;
println!("{}", a);
```

%

`a` was moved into `b`.

## Draft

<!-- md2apkg ignore-card -->

## What does the borrow checker draw?

![regions](img/regions.png)
"#;

/// A document with headings only.
pub const HEADINGS_ONLY: &str = "# Only\n\n## Headings\n";

/// A document referencing a remote image.
pub const REMOTE_IMAGE: &str = "# Remote\n\n![logo](https://example.com/logo.png)\n";

/// Bytes standing in for an image file.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";
