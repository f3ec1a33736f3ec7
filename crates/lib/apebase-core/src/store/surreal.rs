use std::{error::Error, fmt, io, sync::Arc};

use apebase_store::models::{Record, StoredToken};
use apebase_store::schema::{
    FIELD_BODY, FIELD_DOC, FIELD_SEQ, INDEX_TOKEN_ID, INDEX_TOKEN_SEQ, TABLE_TOKEN,
};
use serde::Serialize;
use serde_json::{Map, Value, json};
use surrealdb::{Connection, Surreal, sql};

use crate::query::CompiledFilter;

/// Rows per `INSERT` statement when loading documents.
const INSERT_BATCH: usize = 500;

#[derive(Debug)]
pub enum StoreError {
    Surreal(Box<surrealdb::Error>),
    InvalidInput(String),
    Decode(serde_json::Error),
    Io(io::Error),
    Datafile { corrupt: usize, total: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Surreal(err) => write!(f, "SurrealDB error: {err}"),
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
            Self::Decode(err) => write!(f, "Stored document could not be decoded: {err}"),
            Self::Io(err) => write!(f, "Datafile I/O error: {err}"),
            Self::Datafile { corrupt, total } => write!(
                f,
                "Datafile is corrupt: {corrupt} of {total} lines could not be parsed"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Surreal(err) => Some(err.as_ref()),
            Self::Decode(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::InvalidInput(_) | Self::Datafile { .. } => None,
        }
    }
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Surreal(Box::new(err))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err)
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Token collection backed by a `SurrealDB` connection.
pub struct SurrealTokenStore<C: Connection> {
    db: Arc<Surreal<C>>,
}

impl<C: Connection> Clone for SurrealTokenStore<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealTokenStore<C> {
    #[must_use]
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            db: Arc::new(db),
        }
    }

    #[must_use]
    pub const fn from_arc(db: Arc<Surreal<C>>) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn db(&self) -> &Surreal<C> {
        &self.db
    }

    /// Defines the indexes used by the listing and detail lookups.
    ///
    /// # Errors
    /// Returns `StoreError` if the database rejects the definitions.
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let query = format!(
            "DEFINE INDEX IF NOT EXISTS {INDEX_TOKEN_SEQ} ON TABLE {TABLE_TOKEN} FIELDS {FIELD_SEQ};\
             DEFINE INDEX IF NOT EXISTS {INDEX_TOKEN_ID} ON TABLE {TABLE_TOKEN} FIELDS {FIELD_DOC}.id;"
        );
        self.db.query(query).await?.check()?;
        Ok(())
    }

    /// Appends documents in order, continuing the insertion sequence.
    ///
    /// # Errors
    /// Returns `StoreError` if a document is not an object or the database
    /// write fails.
    pub async fn insert_documents(&self, documents: Vec<Value>) -> StoreResult<usize> {
        if documents.is_empty() {
            return Ok(0);
        }
        if let Some(position) = documents.iter().position(|doc| !doc.is_object()) {
            return Err(StoreError::InvalidInput(format!(
                "document at position {position} is not an object"
            )));
        }
        let start = self.next_seq().await?;
        let total = documents.len();
        let query = format!("INSERT INTO {TABLE_TOKEN} $rows;");
        let mut pending = documents.into_iter().zip(start..).peekable();
        while pending.peek().is_some() {
            let rows = pending
                .by_ref()
                .take(INSERT_BATCH)
                .map(|(doc, seq)| stored_row(seq, doc))
                .collect::<StoreResult<Vec<Value>>>()?;
            self.db
                .query(query.as_str())
                .bind(surreal_value(&json!({ "rows": rows }))?)
                .await?
                .check()?;
        }
        Ok(total)
    }

    /// Fetches one window of matching documents, newest first.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails or a stored document
    /// cannot be decoded.
    pub async fn find_page(
        &self,
        filter: &CompiledFilter,
        offset: u64,
        limit: u64,
    ) -> StoreResult<Vec<Record>> {
        let query = format!(
            "SELECT {FIELD_SEQ}, {FIELD_BODY} FROM {TABLE_TOKEN}{} ORDER BY {FIELD_SEQ} DESC LIMIT $limit START $start;",
            filter.where_clause()
        );
        let mut response = self
            .db
            .query(query)
            .bind(surreal_value(filter.bindings())?)
            .bind(("limit", clamp_to_i64(limit)))
            .bind(("start", clamp_to_i64(offset)))
            .await?;
        let rows: Vec<StoredToken> = response.take(0)?;
        decode_rows(rows)
    }

    /// Fetches a document by its `id` field. The newest document wins when
    /// ids repeat.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails or the stored
    /// document cannot be decoded.
    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Record>> {
        let id = id.to_string();
        let query = format!(
            "SELECT {FIELD_SEQ}, {FIELD_BODY} FROM {TABLE_TOKEN} WHERE {FIELD_DOC}.id = $id ORDER BY {FIELD_SEQ} DESC LIMIT 1;"
        );
        let mut response = self.db.query(query).bind(("id", id)).await?;
        let mut rows: Vec<StoredToken> = response.take(0)?;
        rows.pop().map(StoredToken::into_record).transpose().map_err(StoreError::from)
    }

    /// Counts stored documents.
    ///
    /// # Errors
    /// Returns `StoreError` if the database query fails.
    pub async fn count(&self) -> StoreResult<u64> {
        let query = format!("SELECT count() AS total FROM {TABLE_TOKEN} GROUP ALL;");
        let mut response = self.db.query(query).await?;
        let rows: Vec<CountRow> = response.take(0)?;
        Ok(rows.first().map_or(0, |row| row.total))
    }

    async fn next_seq(&self) -> StoreResult<u64> {
        let query = format!(
            "SELECT {FIELD_SEQ} FROM {TABLE_TOKEN} ORDER BY {FIELD_SEQ} DESC LIMIT 1;"
        );
        let mut response = self.db.query(query).await?;
        let rows: Vec<SeqRow> = response.take(0)?;
        Ok(rows.first().map_or(0, |row| row.seq.saturating_add(1)))
    }
}

#[derive(serde::Deserialize)]
struct SeqRow {
    seq: u64,
}

#[derive(serde::Deserialize)]
struct CountRow {
    total: u64,
}

/// Builds a `token` row: the document for filtering plus its JSON text.
fn stored_row(seq: u64, doc: Value) -> StoreResult<Value> {
    let mut row = Map::new();
    row.insert(FIELD_SEQ.to_string(), Value::from(seq));
    row.insert(FIELD_BODY.to_string(), Value::String(serde_json::to_string(&doc)?));
    row.insert(FIELD_DOC.to_string(), doc);
    Ok(Value::Object(row))
}

/// Converts JSON into a SurrealQL value with `null` kept as `NULL`.
///
/// Values bound through serde turn `null` into `NONE`, which drops the key.
fn surreal_value<T: Serialize + ?Sized>(value: &T) -> StoreResult<sql::Value> {
    let text = serde_json::to_string(value)?;
    surrealdb::syn::json(&text).map_err(|err| StoreError::from(surrealdb::Error::from(err)))
}

fn decode_rows(rows: Vec<StoredToken>) -> StoreResult<Vec<Record>> {
    rows.into_iter()
        .map(|row| row.into_record().map_err(StoreError::from))
        .collect()
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
