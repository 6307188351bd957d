//! Column metadata.
//!
//! Declarative and never mutated at runtime. The closed [`ColumnType`]
//! enumeration is what the rendering engine matches exhaustively; adding a
//! variant is a compile-checked change that touches only the dispatch, never
//! the call sites.

use serde::{Deserialize, Serialize};

/// The column type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Badge,
    Date,
    Chiplist,
}

/// Which edge a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pinned {
    Left,
    Right,
}

/// Declarative description of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Field key into the row payload.
    pub key: String,

    /// Header label.
    pub header: String,

    #[serde(rename = "type")]
    pub column_type: ColumnType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned: Option<Pinned>,

    #[serde(default)]
    pub sorting: bool,

    /// Renderer-specific format hint (the date renderer understands
    /// `YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// The column set for the users table.
pub fn user_columns() -> Vec<ColumnMetadata> {
    vec![
        ColumnMetadata {
            key: "name".to_string(),
            header: "Name".to_string(),
            column_type: ColumnType::String,
            width: Some(220),
            pinned: Some(Pinned::Left),
            sorting: true,
            format: None,
        },
        ColumnMetadata {
            key: "email".to_string(),
            header: "Email".to_string(),
            column_type: ColumnType::String,
            width: Some(260),
            pinned: None,
            sorting: true,
            format: None,
        },
        ColumnMetadata {
            key: "status".to_string(),
            header: "Status".to_string(),
            column_type: ColumnType::Badge,
            width: Some(120),
            pinned: None,
            sorting: false,
            format: None,
        },
        ColumnMetadata {
            key: "createdAt".to_string(),
            header: "Joined".to_string(),
            column_type: ColumnType::Date,
            width: Some(140),
            pinned: None,
            sorting: false,
            format: Some("YYYY-MM-DD".to_string()),
        },
        ColumnMetadata {
            key: "groups".to_string(),
            header: "Groups".to_string(),
            column_type: ColumnType::Chiplist,
            width: Some(280),
            pinned: None,
            sorting: false,
            format: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_wire_format() {
        let columns = user_columns();
        let value = serde_json::to_value(&columns).expect("serialize");

        assert_eq!(value[0]["key"], "name");
        assert_eq!(value[0]["type"], "string");
        assert_eq!(value[0]["pinned"], "left");
        assert_eq!(value[3]["type"], "date");
        assert_eq!(value[3]["format"], "YYYY-MM-DD");
        assert_eq!(value[4]["type"], "chiplist");
    }

    #[test]
    fn test_metadata_roundtrip() {
        let columns = user_columns();
        let json = serde_json::to_string(&columns).expect("serialize");
        let back: Vec<ColumnMetadata> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, columns);
    }
}
