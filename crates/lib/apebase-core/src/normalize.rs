//! Image reference normalization.
//!
//! Stored token images use several legacy reference formats. Every format
//! that points into the local content store is rewritten to the canonical
//! `/ipfs/<cid>` serving path. The rewrite only touches the in-memory copy
//! handed to the caller.

use apebase_store::models::Record;
use apebase_store::schema::ipfs_path;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// The whole value is a bare CID.
    Prepend,
    /// Drop this many leading characters and keep the remainder.
    StripChars(usize),
}

/// One `(prefix, rewrite)` entry of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRule {
    pub prefix: &'static str,
    pub rewrite: Rewrite,
}

/// Evaluated in order; the first matching prefix wins.
pub const IMAGE_RULES: [ImageRule; 4] = [
    ImageRule {
        prefix: "Qm",
        rewrite: Rewrite::Prepend,
    },
    ImageRule {
        prefix: "/ipfs",
        rewrite: Rewrite::StripChars(5),
    },
    ImageRule {
        prefix: "ipfs://ipfs",
        rewrite: Rewrite::StripChars(12),
    },
    ImageRule {
        prefix: "ipfs://",
        rewrite: Rewrite::StripChars(7),
    },
];

impl ImageRule {
    /// Applies the rule, or returns `None` when the prefix does not match.
    #[must_use]
    pub fn apply(&self, image: &str) -> Option<String> {
        if !image.starts_with(self.prefix) {
            return None;
        }
        let cid = match self.rewrite {
            Rewrite::Prepend => image,
            Rewrite::StripChars(count) => image
                .char_indices()
                .nth(count)
                .map_or("", |(start, _)| &image[start..]),
        };
        // leading slashes are dropped so `/ipfs/<cid>` maps onto itself
        Some(ipfs_path(cid.trim_start_matches('/')))
    }
}

/// Rewrites an image reference, or `None` when no rule applies.
#[must_use]
pub fn normalize_image(image: &str) -> Option<String> {
    if image.is_empty() {
        return None;
    }
    IMAGE_RULES.iter().find_map(|rule| rule.apply(image))
}

/// Normalizes `metadata.image` of the record in place.
pub fn normalize_in_place(record: &mut Record) {
    let Some(metadata) = record.metadata.as_mut() else {
        return;
    };
    let Some(Value::String(image)) = metadata.image.as_mut() else {
        return;
    };
    if let Some(rewritten) = normalize_image(image) {
        *image = rewritten;
    }
}

/// Returns the record with `metadata.image` normalized.
#[must_use]
pub fn normalize(mut record: Record) -> Record {
    normalize_in_place(&mut record);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use apebase_store::models::Metadata;
    use serde_json::json;

    fn record_with_image(image: &str) -> Record {
        Record::new("1").with_metadata(Metadata::with_image(image))
    }

    fn normalized_image(image: &str) -> Option<String> {
        normalize(record_with_image(image))
            .image()
            .map(str::to_string)
    }

    #[test]
    fn rewrites_known_formats() {
        let cases = [
            ("QmAbc123", "/ipfs/QmAbc123"),
            ("/ipfs/QmAbc123", "/ipfs/QmAbc123"),
            ("ipfs://ipfs/QmAbc123", "/ipfs/QmAbc123"),
            ("ipfs://QmAbc123", "/ipfs/QmAbc123"),
            ("https://example.com/x.png", "https://example.com/x.png"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalized_image(input).as_deref(), Some(expected), "{input}");
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        // `ipfs://ipfs` must win over the shorter `ipfs://`
        assert_eq!(
            normalize_image("ipfs://ipfs/QmZ/1.png").as_deref(),
            Some("/ipfs/QmZ/1.png")
        );
        assert_eq!(normalize_image("/ipfsQmZ").as_deref(), Some("/ipfs/QmZ"));
        assert_eq!(normalize_image("ar://abc"), None);
    }

    #[test]
    fn short_values_do_not_panic() {
        assert_eq!(normalize_image("ipfs://ipfs").as_deref(), Some("/ipfs/"));
        assert_eq!(normalize_image("/ipfs").as_deref(), Some("/ipfs/"));
        assert_eq!(normalize_image("Qm").as_deref(), Some("/ipfs/Qm"));
        assert_eq!(normalize_image(""), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "QmAbc123",
            "/ipfs/QmAbc123",
            "/ipfs//QmAbc123",
            "/ipfsQmAbc123",
            "ipfs://ipfs/QmAbc123",
            "ipfs://ipfs",
            "ipfs://QmAbc123",
            "ipfs:///QmAbc123",
            "https://example.com/x.png",
            "",
            "/ipfs/",
            "ipfs://ipfs/ünïcode",
        ];
        for input in inputs {
            let once = normalize(record_with_image(input));
            let twice = normalize(once.clone());
            assert_eq!(once, twice, "{input}");
        }
    }

    #[test]
    fn leaves_other_shapes_alone() {
        let bare = Record::new("1");
        assert_eq!(normalize(bare.clone()), bare);

        let metadata: Metadata =
            serde_json::from_value(json!({ "image": 42, "name": "QmNotAnImage" }))
                .expect("metadata");
        let record = Record::new("2").with_metadata(metadata);
        assert_eq!(normalize(record.clone()), record);

        let record = Record::new("3").with_metadata(Metadata::default());
        assert_eq!(normalize(record.clone()), record);
    }

    #[test]
    fn only_image_is_touched() {
        let mut record = record_with_image("QmAbc");
        record.extra.insert("image".to_string(), json!("QmOther"));
        let normalized = normalize(record);
        assert_eq!(normalized.image(), Some("/ipfs/QmAbc"));
        assert_eq!(normalized.extra.get("image"), Some(&json!("QmOther")));
    }
}
