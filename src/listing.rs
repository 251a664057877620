use itertools::Itertools;
use serde_json::Value;

/// Identifier and audit columns the summaries table never displays.
pub const AUDIT_COLUMNS: &[&str] = &["id", "uuid", "created_at", "updated_at", "inserted_at"];

pub fn is_audit_column(name: &str) -> bool {
    AUDIT_COLUMNS.iter().any(|c| c.eq_ignore_ascii_case(name))
}

/// Filters for the pre-aggregated summaries listing.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    /// Equality filter on the `app` column, compared trimmed and lowercased.
    pub app: Option<String>,
    /// Free-text needle matched against every displayed cell.
    pub search: Option<String>,
}

fn normalize_app(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Column order for display: `app` first, the rest alphabetical, audit
/// columns dropped. The union over all rows keeps ragged collections whole.
pub fn display_columns(rows: &[Value]) -> Vec<String> {
    let mut columns: Vec<String> = rows
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|obj| obj.keys())
        .filter(|k| !is_audit_column(k))
        .cloned()
        .sorted()
        .dedup()
        .collect();
    if let Some(pos) = columns.iter().position(|c| c == "app") {
        let app = columns.remove(pos);
        columns.insert(0, app);
    }
    columns
}

/// Distinct trimmed app names, sorted.
pub fn app_names(rows: &[Value]) -> Vec<String> {
    rows.iter()
        .filter_map(|r| r.get("app"))
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .sorted()
        .dedup()
        .collect()
}

/// Cell rendering for arbitrary summary values. Strings pass through,
/// nulls blank out, everything else keeps its JSON form.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn row_matches(row: &Value, query: &ListingQuery) -> bool {
    let Some(obj) = row.as_object() else {
        return query.app.is_none() && query.search.is_none();
    };
    if let Some(app) = &query.app {
        let row_app = obj.get("app").and_then(Value::as_str).unwrap_or_default();
        if normalize_app(row_app) != normalize_app(app) {
            return false;
        }
    }
    if let Some(search) = &query.search {
        let needle = search.trim().to_lowercase();
        if !needle.is_empty() {
            let hit = obj
                .iter()
                .filter(|(k, _)| !is_audit_column(k))
                .any(|(_, v)| cell_text(v).to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
    }
    true
}

/// Applies the app and free-text filters, keeping store order.
pub fn filter_rows(rows: &[Value], query: &ListingQuery) -> Vec<Value> {
    rows.iter()
        .filter(|r| row_matches(r, query))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({"id": 1, "app": "HBL", "category": "ATM Service", "count": 42, "created_at": "2025-01-01"}),
            json!({"id": 2, "app": " hbl ", "category": "Charges & Fees", "count": 7}),
            json!({"id": 3, "app": "Sunwai", "category": "Others", "note": null}),
        ]
    }

    #[test]
    fn display_columns_exclude_audit_and_put_app_first() {
        let cols = display_columns(&rows());
        assert_eq!(cols, vec!["app", "category", "count", "note"]);
    }

    #[test]
    fn app_filter_trims_and_folds_case() {
        let query = ListingQuery {
            app: Some("hbl".into()),
            search: None,
        };
        let hits = filter_rows(&rows(), &query);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn search_spans_every_displayed_cell() {
        let query = ListingQuery {
            app: None,
            search: Some("charges".into()),
        };
        let hits = filter_rows(&rows(), &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["app"], " hbl ");

        let numeric = ListingQuery {
            app: None,
            search: Some("42".into()),
        };
        assert_eq!(filter_rows(&rows(), &numeric).len(), 1);
    }

    #[test]
    fn search_ignores_audit_columns() {
        let query = ListingQuery {
            app: None,
            search: Some("2025-01-01".into()),
        };
        assert!(filter_rows(&rows(), &query).is_empty());
    }

    #[test]
    fn filters_combine() {
        let query = ListingQuery {
            app: Some("HBL".into()),
            search: Some("atm".into()),
        };
        let hits = filter_rows(&rows(), &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["id"], 1);
    }

    #[test]
    fn app_names_are_distinct_and_sorted() {
        assert_eq!(app_names(&rows()), vec!["HBL", "Sunwai", "hbl"]);
    }

    #[test]
    fn cell_text_blanks_nulls_and_keeps_strings() {
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!("plain")), "plain");
        assert_eq!(cell_text(&json!(3.5)), "3.5");
        assert_eq!(cell_text(&json!(["a", "b"])), "[\"a\",\"b\"]");
    }
}
