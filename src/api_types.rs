use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One raw review row as the store returns it. Every column is optional:
/// CSV-loaded tables carry nulls, and the exact column set varies between
/// imports, so unknown columns are kept aside for the detail tables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiReview {
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub sentiments: Option<String>,       // "['positive', 'negative']"
    #[serde(default)]
    pub mapped_categories: Option<String>, // "['app#performance', 'fees_hidden']"
    #[serde(default)]
    pub aspects: Option<String>,          // "login, fingerprint, UI"
    #[serde(default)]
    pub opinions: Option<String>,
    #[serde(default)]
    pub score: Option<serde_json::Value>, // numeric column in some imports, text in others
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}
