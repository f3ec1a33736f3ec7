//! `NeDB` datafile replay.
//!
//! A datafile is append-only newline-delimited JSON: a later line with the
//! same `_id` replaces the document, `$$deleted` lines remove it, and
//! `$$indexCreated` / `$$indexRemoved` lines only describe indexes.

use std::collections::HashMap;
use std::io;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::warn;

use super::{StoreError, StoreResult};

const KEY_ID: &str = "_id";
const KEY_DELETED: &str = "$$deleted";
const INDEX_KEYS: [&str; 2] = ["$$indexCreated", "$$indexRemoved"];

/// Live documents of a datafile, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Datafile {
    pub documents: Vec<Value>,
    pub corrupt_lines: usize,
    pub total_lines: usize,
}

/// Reads and replays a datafile. A missing file is an empty collection.
///
/// # Errors
/// Returns `StoreError::Io` if the file cannot be read and
/// `StoreError::Datafile` if more than a tenth of its lines are corrupt.
pub async fn load_datafile(path: &Path) -> StoreResult<Datafile> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => parse_datafile(&contents),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "datafile not found, starting with an empty collection");
            Ok(Datafile::default())
        }
        Err(err) => Err(StoreError::from(err)),
    }
}

/// Replays datafile contents.
///
/// # Errors
/// Returns `StoreError::Datafile` if more than a tenth of the lines are
/// corrupt.
pub fn parse_datafile(contents: &str) -> StoreResult<Datafile> {
    let mut slots: Vec<Option<Map<String, Value>>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut corrupt = 0;
    let mut total = 0;

    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        total += 1;

        let doc = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(doc)) => doc,
            Ok(_) => {
                corrupt += 1;
                warn!(line = number + 1, "skipping datafile line: not an object");
                continue;
            }
            Err(err) => {
                corrupt += 1;
                warn!(line = number + 1, error = %err, "skipping corrupt datafile line");
                continue;
            }
        };

        if INDEX_KEYS.iter().any(|key| doc.contains_key(*key)) {
            continue;
        }

        let deleted = doc.get(KEY_DELETED).and_then(Value::as_bool).unwrap_or(false);
        let key = doc.get(KEY_ID).and_then(Value::as_str).map(str::to_owned);
        match (key, deleted) {
            (Some(key), true) => {
                if let Some(position) = positions.remove(&key) {
                    slots[position] = None;
                }
            }
            (Some(key), false) => {
                if let Some(&position) = positions.get(&key) {
                    slots[position] = Some(doc);
                } else {
                    positions.insert(key, slots.len());
                    slots.push(Some(doc));
                }
            }
            (None, true) => {}
            (None, false) => slots.push(Some(doc)),
        }
    }

    if corrupt * 10 > total {
        return Err(StoreError::Datafile { corrupt, total });
    }

    Ok(Datafile {
        documents: slots.into_iter().flatten().map(Value::Object).collect(),
        corrupt_lines: corrupt,
        total_lines: total,
    })
}
