//! Cell rendering.
//!
//! `render` is pure and total: it produces a display value for every declared
//! column type and any raw payload shape, malformed included. The raw side is
//! `serde_json::Value` so heterogeneous rows coming off the wire never need
//! to be trusted before they are displayed.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::model::User;
use crate::render::column::{ColumnMetadata, ColumnType};

/// Placeholder for an empty or absent chiplist.
pub const NO_ITEMS_PLACEHOLDER: &str = "No items";

/// Placeholder for a timestamp that does not parse.
pub const INVALID_DATE_PLACEHOLDER: &str = "Invalid date";

/// Placeholder for a value the column type cannot represent.
pub const MISSING_VALUE_PLACEHOLDER: &str = "n/a";

/// Visual tone of a badge token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Positive,
    Muted,
}

/// A labeled, styleable status token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeToken {
    pub label: String,
    pub tone: BadgeTone,
}

/// One discrete token of a chiplist, keyed by the element's stable
/// identifier and labeled by its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipToken {
    pub id: String,
    pub label: String,
}

/// The display form a cell renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayValue {
    Text(String),
    Badge(BadgeToken),
    Chips(Vec<ChipToken>),
    Placeholder(&'static str),
}

/// Render a raw cell value according to its column metadata.
pub fn render(meta: &ColumnMetadata, value: &Value) -> DisplayValue {
    match meta.column_type {
        ColumnType::String => render_string(value),
        ColumnType::Badge => render_badge(value),
        ColumnType::Date => render_date(meta.format.as_deref(), value),
        ColumnType::Chiplist => render_chiplist(value),
    }
}

/// Render one user row across a column set.
pub fn render_row(user: &User, columns: &[ColumnMetadata]) -> Vec<DisplayValue> {
    let row = serde_json::to_value(user).unwrap_or(Value::Null);
    columns
        .iter()
        .map(|meta| render(meta, row.get(&meta.key).unwrap_or(&Value::Null)))
        .collect()
}

/// Scalar-to-text coercion. Structured values yield `None`: a cell never
/// displays a stringified object or array.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    }
}

fn render_string(value: &Value) -> DisplayValue {
    match scalar_text(value) {
        Some(text) => DisplayValue::Text(text),
        None => DisplayValue::Placeholder(MISSING_VALUE_PLACEHOLDER),
    }
}

fn render_badge(value: &Value) -> DisplayValue {
    match value.as_str() {
        Some("active") => DisplayValue::Badge(BadgeToken {
            label: "active".to_string(),
            tone: BadgeTone::Positive,
        }),
        Some("inactive") => DisplayValue::Badge(BadgeToken {
            label: "inactive".to_string(),
            tone: BadgeTone::Muted,
        }),
        // Unrecognized values fall back to their literal form.
        Some(other) => DisplayValue::Text(other.to_string()),
        None => match scalar_text(value) {
            Some(text) => DisplayValue::Text(text),
            None => DisplayValue::Placeholder(MISSING_VALUE_PLACEHOLDER),
        },
    }
}

fn render_date(format: Option<&str>, value: &Value) -> DisplayValue {
    let Some(raw) = value.as_str() else {
        return DisplayValue::Placeholder(INVALID_DATE_PLACEHOLDER);
    };
    let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) else {
        return DisplayValue::Placeholder(INVALID_DATE_PLACEHOLDER);
    };

    let formatted = match format {
        Some("YYYY-MM-DD") => parsed.format(format_description!("[year]-[month]-[day]")),
        // Default short form, e.g. "Mar 5, 2023".
        _ => parsed.format(format_description!(
            "[month repr:short] [day padding:none], [year]"
        )),
    };

    match formatted {
        Ok(text) => DisplayValue::Text(text),
        Err(_) => DisplayValue::Placeholder(INVALID_DATE_PLACEHOLDER),
    }
}

/// One token per element, keyed by the element's identifier and labeled by
/// its display name. The element structure itself is never stringified.
fn render_chiplist(value: &Value) -> DisplayValue {
    let Some(elements) = value.as_array() else {
        return DisplayValue::Placeholder(NO_ITEMS_PLACEHOLDER);
    };
    if elements.is_empty() {
        return DisplayValue::Placeholder(NO_ITEMS_PLACEHOLDER);
    }

    let chips = elements
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let id = field_str(element, &["groupId", "id"])
                .unwrap_or_else(|| format!("item-{index}"));
            let label = field_str(element, &["groupName", "name"]).unwrap_or_else(|| id.clone());
            ChipToken { id, label }
        })
        .collect();

    DisplayValue::Chips(chips)
}

fn field_str(element: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| element.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::column::user_columns;
    use serde_json::json;

    fn meta(column_type: ColumnType, format: Option<&str>) -> ColumnMetadata {
        ColumnMetadata {
            key: "field".to_string(),
            header: "Field".to_string(),
            column_type,
            width: None,
            pinned: None,
            sorting: false,
            format: format.map(str::to_string),
        }
    }

    #[test]
    fn test_string_passthrough() {
        let rendered = render(&meta(ColumnType::String, None), &json!("Jane Doe"));
        assert_eq!(rendered, DisplayValue::Text("Jane Doe".to_string()));
    }

    #[test]
    fn test_string_never_stringifies_structures() {
        let rendered = render(&meta(ColumnType::String, None), &json!({"oops": true}));
        assert_eq!(rendered, DisplayValue::Placeholder(MISSING_VALUE_PLACEHOLDER));
    }

    #[test]
    fn test_badge_tones() {
        let active = render(&meta(ColumnType::Badge, None), &json!("active"));
        assert_eq!(
            active,
            DisplayValue::Badge(BadgeToken {
                label: "active".to_string(),
                tone: BadgeTone::Positive,
            })
        );

        let inactive = render(&meta(ColumnType::Badge, None), &json!("inactive"));
        assert_eq!(
            inactive,
            DisplayValue::Badge(BadgeToken {
                label: "inactive".to_string(),
                tone: BadgeTone::Muted,
            })
        );
    }

    #[test]
    fn test_badge_unknown_value_is_literal() {
        let rendered = render(&meta(ColumnType::Badge, None), &json!("suspended"));
        assert_eq!(rendered, DisplayValue::Text("suspended".to_string()));
    }

    #[test]
    fn test_date_formats() {
        let ymd = render(
            &meta(ColumnType::Date, Some("YYYY-MM-DD")),
            &json!("2023-03-05T08:15:00Z"),
        );
        assert_eq!(ymd, DisplayValue::Text("2023-03-05".to_string()));

        let short = render(&meta(ColumnType::Date, None), &json!("2023-03-05T08:15:00Z"));
        assert_eq!(short, DisplayValue::Text("Mar 5, 2023".to_string()));
    }

    #[test]
    fn test_date_invalid_renders_placeholder() {
        for bad in [json!("not a date"), json!(42), json!(null)] {
            let rendered = render(&meta(ColumnType::Date, None), &bad);
            assert_eq!(rendered, DisplayValue::Placeholder(INVALID_DATE_PLACEHOLDER));
        }
    }

    #[test]
    fn test_chiplist_extracts_id_and_name() {
        let groups = json!([
            {"groupId": "g1", "groupName": "Admin", "roles": []},
            {"groupId": "g2", "groupName": "Editor", "roles": []},
        ]);
        let rendered = render(&meta(ColumnType::Chiplist, None), &groups);

        assert_eq!(
            rendered,
            DisplayValue::Chips(vec![
                ChipToken {
                    id: "g1".to_string(),
                    label: "Admin".to_string(),
                },
                ChipToken {
                    id: "g2".to_string(),
                    label: "Editor".to_string(),
                },
            ])
        );
    }

    #[test]
    fn test_chiplist_empty_renders_placeholder() {
        let rendered = render(&meta(ColumnType::Chiplist, None), &json!([]));
        assert_eq!(rendered, DisplayValue::Placeholder(NO_ITEMS_PLACEHOLDER));

        let absent = render(&meta(ColumnType::Chiplist, None), &Value::Null);
        assert_eq!(absent, DisplayValue::Placeholder(NO_ITEMS_PLACEHOLDER));
    }

    #[test]
    fn test_chiplist_malformed_element_never_stringified() {
        let groups = json!([{"unexpected": {"nested": true}}]);
        let rendered = render(&meta(ColumnType::Chiplist, None), &groups);

        let DisplayValue::Chips(chips) = rendered else {
            panic!("expected chips");
        };
        assert_eq!(chips.len(), 1);
        assert_eq!(chips[0].id, "item-0");
        assert_eq!(chips[0].label, "item-0");
        assert!(!chips[0].label.contains('{'));
    }

    #[test]
    fn test_render_row_over_user_columns() {
        let users = crate::transport::mock::seed_users(1);
        let row = render_row(&users[0], &user_columns());

        assert_eq!(row.len(), 5);
        assert_eq!(row[0], DisplayValue::Text(users[0].name.clone()));
        assert_eq!(row[1], DisplayValue::Text(users[0].email.clone()));
        assert!(matches!(row[2], DisplayValue::Badge(_)));
        assert!(matches!(row[3], DisplayValue::Text(_)));
        assert!(matches!(row[4], DisplayValue::Chips(_)));
    }
}
