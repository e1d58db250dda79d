//! Anki collection database.

use chrono::{DateTime, Utc};
use deck_core::RenderedCard;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection};
use serde_json::{json, Map, Value};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

use super::error::PackageError;
use super::schema::{FIELD_SEPARATOR, LATEX_POST, LATEX_PRE, SCHEMA, SCHEMA_VERSION};

type Result<T> = std::result::Result<T, PackageError>;

/// Name of the note type every card uses.
pub const MODEL_NAME: &str = "md2deck Basic";

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// A single-deck Anki collection being filled with cards.
pub struct Collection {
    conn: Connection,
    deck_name: String,
    deck_id: i64,
    model_id: i64,
    now: DateTime<Utc>,
    next_id: i64,
    position: i64,
}

impl Collection {
    /// Create a collection file at path with one deck and one note type.
    pub fn open<P: AsRef<Path>>(path: P, deck_name: &str, css: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, deck_name, css)
    }

    /// Open in-memory collection (for testing).
    pub fn open_in_memory(deck_name: &str, css: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, deck_name, css)
    }

    fn with_connection(conn: Connection, deck_name: &str, css: &str) -> Result<Self> {
        let now = Utc::now();
        let collection = Self {
            conn,
            deck_name: deck_name.to_string(),
            deck_id: stable_id(&format!("deck:{}", deck_name)),
            model_id: stable_id(&format!("model:{}", MODEL_NAME)),
            now,
            next_id: now.timestamp_millis(),
            position: 0,
        };
        collection.initialize(css)?;
        Ok(collection)
    }

    fn initialize(&self, css: &str) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;

        let now_ms = self.now.timestamp_millis();
        let mut models = Map::new();
        models.insert(self.model_id.to_string(), self.model_json(css));
        let mut decks = Map::new();
        decks.insert("1".to_string(), self.deck_json(1, "Default"));
        decks.insert(self.deck_id.to_string(), self.deck_json(self.deck_id, &self.deck_name));

        self.conn.execute(
            "INSERT INTO col (id, crt, mod, scm, ver, dty, usn, ls, conf, models, decks, dconf, tags)
             VALUES (1, ?1, ?2, ?3, ?4, 0, 0, 0, ?5, ?6, ?7, ?8, '{}')",
            params![
                self.now.timestamp(),
                now_ms,
                now_ms,
                SCHEMA_VERSION,
                self.conf_json().to_string(),
                Value::Object(models).to_string(),
                Value::Object(decks).to_string(),
                dconf_json().to_string(),
            ],
        )?;
        Ok(())
    }

    /// Add one note and its card. Returns the note id.
    pub fn add_card(&mut self, card: &RenderedCard) -> Result<i64> {
        let note_id = self.allocate_id();
        let card_id = self.allocate_id();
        self.position += 1;

        let sort_field = strip_html(&card.front);
        let tags = if card.tags.is_empty() {
            String::new()
        } else {
            format!(" {} ", card.tags.join(" "))
        };
        let fields = format!("{}{}{}", card.front, FIELD_SEPARATOR, card.back);
        let guid = Uuid::new_v5(
            &Uuid::NAMESPACE_OID,
            format!("{}{}{}", self.deck_name, FIELD_SEPARATOR, card.front).as_bytes(),
        );
        let modified = self.now.timestamp();

        self.conn.execute(
            "INSERT INTO notes (id, guid, mid, mod, usn, tags, flds, sfld, csum, flags, data)
             VALUES (?1, ?2, ?3, ?4, -1, ?5, ?6, ?7, ?8, 0, '')",
            params![
                note_id,
                guid.to_string(),
                self.model_id,
                modified,
                tags,
                fields,
                sort_field,
                checksum(&sort_field),
            ],
        )?;
        self.conn.execute(
            "INSERT INTO cards (id, nid, did, ord, mod, usn, type, queue, due, ivl, factor, reps, lapses, left, odue, odid, flags, data)
             VALUES (?1, ?2, ?3, 0, ?4, -1, 0, 0, ?5, 0, 0, 0, 0, 0, 0, 0, 0, '')",
            params![card_id, note_id, self.deck_id, modified, self.position],
        )?;

        Ok(note_id)
    }

    /// Number of notes written so far.
    pub fn note_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Flush and close the database file.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn conf_json(&self) -> Value {
        json!({
            "activeDecks": [self.deck_id],
            "curDeck": self.deck_id,
            "newSpread": 0,
            "collapseTime": 1200,
            "timeLim": 0,
            "estTimes": true,
            "dueCounts": true,
            "curModel": self.model_id.to_string(),
            "nextPos": self.position + 1,
            "sortType": "noteFld",
            "sortBackwards": false,
            "addToCur": true
        })
    }

    fn model_json(&self, css: &str) -> Value {
        json!({
            "id": self.model_id,
            "name": MODEL_NAME,
            "type": 0,
            "mod": self.now.timestamp(),
            "usn": -1,
            "sortf": 0,
            "did": self.deck_id,
            "tmpls": [{
                "name": "Card 1",
                "ord": 0,
                "qfmt": "{{Front}}",
                "afmt": "{{FrontSide}}\n\n<hr id=\"answer\">\n\n{{Back}}",
                "did": null,
                "bqfmt": "",
                "bafmt": ""
            }],
            "flds": [
                field_json("Front", 0),
                field_json("Back", 1)
            ],
            "css": css,
            "latexPre": LATEX_PRE,
            "latexPost": LATEX_POST,
            "latexsvg": false,
            "req": [[0, "any", [0]]],
            "tags": [],
            "vers": []
        })
    }

    fn deck_json(&self, id: i64, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "mod": self.now.timestamp(),
            "usn": -1,
            "lrnToday": [0, 0],
            "revToday": [0, 0],
            "newToday": [0, 0],
            "timeToday": [0, 0],
            "collapsed": false,
            "browserCollapsed": false,
            "desc": "",
            "dyn": 0,
            "conf": 1,
            "extendNew": 10,
            "extendRev": 50
        })
    }
}

fn field_json(name: &str, ord: u32) -> Value {
    json!({
        "name": name,
        "ord": ord,
        "sticky": false,
        "rtl": false,
        "font": "Arial",
        "size": 20,
        "media": []
    })
}

fn dconf_json() -> Value {
    json!({
        "1": {
            "id": 1,
            "name": "Default",
            "mod": 0,
            "usn": 0,
            "maxTaken": 60,
            "autoplay": true,
            "timer": 0,
            "replayq": true,
            "dyn": false,
            "new": {
                "bury": true,
                "delays": [1.0, 10.0],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true
            },
            "lapse": {
                "delays": [10.0],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0.0
            },
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1.0,
                "maxIvl": 36500,
                "minSpace": 1,
                "perDay": 100
            }
        }
    })
}

/// Positive id derived from a name, so re-imports hit the same deck.
fn stable_id(name: &str) -> i64 {
    let hash = format!("{:x}", Sha256::digest(name.as_bytes()));
    // 48 bits keeps the id well inside JavaScript's safe integer range.
    i64::from_str_radix(&hash[..12], 16).unwrap_or(1)
}

fn strip_html(html: &str) -> String {
    HTML_TAG.replace_all(html, "").trim().to_string()
}

/// Duplicate-detection checksum: the first 32 bits of the SHA-1 of the
/// stripped sort field, as Anki computes it.
fn checksum(sort_field: &str) -> i64 {
    let hash = format!("{:x}", Sha1::digest(sort_field.as_bytes()));
    i64::from_str_radix(&hash[..8], 16).unwrap_or(0)
}
