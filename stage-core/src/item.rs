//! Performance item types exchanged between the record store, the
//! recommender and the HTTP layer.
//!
//! Field names on the wire follow the performance catalogue columns
//! (`mt20id`, `prfnm`, `sty`, `poster`, `relateurl1`).

use serde::{Deserialize, Serialize};

/// Presentational fields of a performance
///
/// The recommender never inspects these, it only carries them from the
/// candidate row into the match result.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayFields {
    /// Performance title
    #[serde(rename = "prfnm")]
    pub name: String,
    /// Genre / category
    #[serde(rename = "sty", default)]
    pub genre: Option<String>,
    /// Poster image URL
    #[serde(default)]
    pub poster: Option<String>,
    /// Related (booking) URL
    #[serde(rename = "relateurl1", default)]
    pub related_url: Option<String>,
}

impl DisplayFields {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Raw row as supplied by the record store
///
/// `embedding` is the serialized literal list (`"[0.12, -0.04, ...]"`),
/// decoded only inside the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRow {
    #[serde(rename = "mt20id")]
    pub id: String,
    #[serde(flatten)]
    pub display: DisplayFields,
    pub embedding: String,
}

impl ItemRow {
    pub fn new(id: impl Into<String>, display: DisplayFields, embedding: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display,
            embedding: embedding.into(),
        }
    }

    /// Strip the embedding, keeping what the client is allowed to see
    pub fn summary(&self) -> ItemSummary {
        ItemSummary {
            id: self.id.clone(),
            display: self.display.clone(),
        }
    }
}

/// Item id plus display fields, without any embedding or score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    #[serde(rename = "mt20id")]
    pub id: String,
    #[serde(flatten)]
    pub display: DisplayFields,
}

/// A recommended item. Similarity scores are a ranking signal only and are
/// never part of the result.
pub type MatchResult = ItemSummary;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_catalogue_keys() {
        let row = ItemRow::new(
            "PF000001",
            DisplayFields {
                name: "Hamlet".to_string(),
                genre: Some("연극".to_string()),
                poster: Some("http://example.com/p.gif".to_string()),
                related_url: None,
            },
            "[0.1, 0.2]",
        );

        let json = serde_json::to_value(row.summary()).unwrap();
        assert_eq!(json["mt20id"], "PF000001");
        assert_eq!(json["prfnm"], "Hamlet");
        assert_eq!(json["sty"], "연극");
        assert!(json["relateurl1"].is_null());
        assert!(json.get("embedding").is_none());
    }

    #[test]
    fn test_row_deserializes_with_missing_optional_fields() {
        let json = r#"{"mt20id": "PF2", "prfnm": "Cats", "embedding": "[1, 0]"}"#;
        let row: ItemRow = serde_json::from_str(json).unwrap();

        assert_eq!(row.id, "PF2");
        assert_eq!(row.display, DisplayFields::new("Cats"));
        assert_eq!(row.embedding, "[1, 0]");
    }
}
