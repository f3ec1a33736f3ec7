pub const TABLE_TOKEN: &str = "token";

pub const FIELD_SEQ: &str = "seq";
pub const FIELD_DOC: &str = "doc";
pub const FIELD_BODY: &str = "body";

pub const INDEX_TOKEN_SEQ: &str = "token_seq";
pub const INDEX_TOKEN_ID: &str = "token_doc_id";

/// Number of records in one listing page.
pub const PAGE_SIZE: u64 = 20;

/// Canonical serving prefix for content-addressed images.
pub const IPFS_PATH_PREFIX: &str = "/ipfs/";

#[must_use]
pub fn ipfs_path(cid: &str) -> String {
    format!("{IPFS_PATH_PREFIX}{cid}")
}
