use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Overall sentiment of one review, resolved from its per-aspect tag list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn parse(s: &str) -> Option<Sentiment> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed complaint taxonomy. Raw category tokens always land in exactly one
/// group; anything the rule table misses falls into `Others`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CategoryGroup {
    #[serde(rename = "App Experience")]
    AppExperience,
    #[serde(rename = "Customer Support")]
    CustomerSupport,
    #[serde(rename = "Branch Service")]
    BranchService,
    #[serde(rename = "ATM Service")]
    AtmService,
    #[serde(rename = "Biometric Issues")]
    BiometricIssues,
    #[serde(rename = "System Performance")]
    SystemPerformance,
    #[serde(rename = "UI/Screen Issues")]
    UiScreenIssues,
    #[serde(rename = "Design/UX")]
    DesignUx,
    #[serde(rename = "Charges & Fees")]
    ChargesFees,
    #[serde(rename = "Location Issues")]
    LocationIssues,
    #[serde(rename = "Digital Services")]
    DigitalServices,
    #[serde(rename = "Account & Transactions")]
    AccountTransactions,
    #[serde(rename = "Others")]
    Others,
}

impl CategoryGroup {
    pub const ALL: [CategoryGroup; 13] = [
        CategoryGroup::AppExperience,
        CategoryGroup::CustomerSupport,
        CategoryGroup::BranchService,
        CategoryGroup::AtmService,
        CategoryGroup::BiometricIssues,
        CategoryGroup::SystemPerformance,
        CategoryGroup::UiScreenIssues,
        CategoryGroup::DesignUx,
        CategoryGroup::ChargesFees,
        CategoryGroup::LocationIssues,
        CategoryGroup::DigitalServices,
        CategoryGroup::AccountTransactions,
        CategoryGroup::Others,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CategoryGroup::AppExperience => "App Experience",
            CategoryGroup::CustomerSupport => "Customer Support",
            CategoryGroup::BranchService => "Branch Service",
            CategoryGroup::AtmService => "ATM Service",
            CategoryGroup::BiometricIssues => "Biometric Issues",
            CategoryGroup::SystemPerformance => "System Performance",
            CategoryGroup::UiScreenIssues => "UI/Screen Issues",
            CategoryGroup::DesignUx => "Design/UX",
            CategoryGroup::ChargesFees => "Charges & Fees",
            CategoryGroup::LocationIssues => "Location Issues",
            CategoryGroup::DigitalServices => "Digital Services",
            CategoryGroup::AccountTransactions => "Account & Transactions",
            CategoryGroup::Others => "Others",
        }
    }

    pub fn from_label(label: &str) -> Option<CategoryGroup> {
        let wanted = label.trim();
        CategoryGroup::ALL
            .iter()
            .copied()
            .find(|g| g.label().eq_ignore_ascii_case(wanted))
    }
}

impl std::fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which free-text item list a top-N view or drill-down reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Aspects,
    Opinions,
}

impl ItemField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemField::Aspects => "aspects",
            ItemField::Opinions => "opinions",
        }
    }
}

/// The selected aggregation/report type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Bank,
    Review,
    Category,
    BankCategory,
    TopAspects,
    TopOpinions,
    CategoriesPerBank,
    SentimentCategory,
    NetScore,
}

impl ViewMode {
    pub const ALL: [ViewMode; 9] = [
        ViewMode::Bank,
        ViewMode::Review,
        ViewMode::Category,
        ViewMode::BankCategory,
        ViewMode::TopAspects,
        ViewMode::TopOpinions,
        ViewMode::CategoriesPerBank,
        ViewMode::SentimentCategory,
        ViewMode::NetScore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Bank => "bank",
            ViewMode::Review => "review",
            ViewMode::Category => "category",
            ViewMode::BankCategory => "bankCategory",
            ViewMode::TopAspects => "topAspects",
            ViewMode::TopOpinions => "topOpinions",
            ViewMode::CategoriesPerBank => "categoriesPerBank",
            ViewMode::SentimentCategory => "sentimentCategory",
            ViewMode::NetScore => "netScore",
        }
    }

    /// Snake-case form used for export file names.
    pub fn slug(&self) -> &'static str {
        match self {
            ViewMode::Bank => "bank",
            ViewMode::Review => "review",
            ViewMode::Category => "category",
            ViewMode::BankCategory => "bank_category",
            ViewMode::TopAspects => "top_aspects",
            ViewMode::TopOpinions => "top_opinions",
            ViewMode::CategoriesPerBank => "categories_per_bank",
            ViewMode::SentimentCategory => "sentiment_category",
            ViewMode::NetScore => "net_score",
        }
    }
}

/// One ingested review. List fields are already parsed; `detail` keeps the
/// raw column texts (audit columns dropped) for drill-down tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub app: String,
    pub sentiment_tags: Vec<String>,  // raw tags, case preserved
    pub category_tokens: Vec<String>, // raw taxonomy tokens, e.g. "app#performance"
    pub aspects: Vec<String>,
    pub opinions: Vec<String>,
    pub score: Option<f64>,
    pub posted_at: Option<NaiveDateTime>,
    pub detail: Vec<(String, String)>,
}

impl Review {
    pub fn items(&self, field: ItemField) -> &[String] {
        match field {
            ItemField::Aspects => &self.aspects,
            ItemField::Opinions => &self.opinions,
        }
    }
}

/// Tolerant parse of a single-quote pseudo-JSON list ("['a', 'b']").
/// Anything that still fails strict JSON after quote normalization is an
/// empty list, never an error.
pub fn parse_quoted_list(raw: &str) -> Vec<String> {
    let strict = raw.replace('\'', "\"");
    serde_json::from_str::<Vec<String>>(&strict).unwrap_or_default()
}

/// Comma-split for the free-text aspect/opinion fields. Pieces are trimmed
/// but otherwise untouched; display-time normalization happens at the tally.
pub fn split_items(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

/// Numeric score from whatever the store column holds.
pub fn parse_score(raw: &serde_json::Value) -> Option<f64> {
    match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Timestamps arrive in whatever format the source export used. Walk a small
/// ladder of known shapes; anything unparseable is simply absent.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%b %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// App names as logged in diagnostics: inner whitespace collapsed, trimmed,
/// lowercased. Aggregation itself keeps names exactly as stored.
pub fn collapse_app_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_list_accepts_single_quote_style() {
        assert_eq!(
            parse_quoted_list("['positive', 'negative']"),
            vec!["positive".to_string(), "negative".to_string()]
        );
    }

    #[test]
    fn quoted_list_accepts_strict_json() {
        assert_eq!(parse_quoted_list(r#"["neutral"]"#), vec!["neutral".to_string()]);
    }

    #[test]
    fn quoted_list_degrades_to_empty_on_garbage() {
        assert!(parse_quoted_list("not json").is_empty());
        assert!(parse_quoted_list("").is_empty());
        assert!(parse_quoted_list("[1, 2]").is_empty());
        // An embedded apostrophe breaks the quote swap; that row degrades too.
        assert!(parse_quoted_list("['don't care']").is_empty());
    }

    #[test]
    fn quoted_list_empty_list_is_empty() {
        assert!(parse_quoted_list("[]").is_empty());
        assert!(parse_quoted_list("['']").iter().all(|s| s.is_empty()));
    }

    #[test]
    fn score_parses_numbers_and_numeric_text() {
        assert_eq!(parse_score(&serde_json::json!(4.5)), Some(4.5));
        assert_eq!(parse_score(&serde_json::json!("3")), Some(3.0));
        assert_eq!(parse_score(&serde_json::json!(" 2.75 ")), Some(2.75));
        assert_eq!(parse_score(&serde_json::json!("4.5 stars")), None);
        assert_eq!(parse_score(&serde_json::Value::Null), None);
    }

    #[test]
    fn timestamp_ladder_handles_common_shapes() {
        assert!(parse_timestamp("2023-05-14 10:22:01").is_some());
        assert!(parse_timestamp("2023-05-14T10:22:01.123").is_some());
        assert!(parse_timestamp("2023-05-14").is_some());
        assert!(parse_timestamp("14/05/2023").is_some());
        assert!(parse_timestamp("2023-05-14T10:22:01+05:00").is_some());
        assert!(parse_timestamp("May 14, 2023").is_some());
        assert!(parse_timestamp("soon").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn group_labels_round_trip() {
        for g in CategoryGroup::ALL {
            assert_eq!(CategoryGroup::from_label(g.label()), Some(g));
        }
        assert_eq!(CategoryGroup::from_label("atm service"), Some(CategoryGroup::AtmService));
        assert_eq!(CategoryGroup::from_label("No Such Group"), None);
    }

    #[test]
    fn app_name_collapse_matches_diagnostics_rule() {
        assert_eq!(collapse_app_name("  UBL   Digital "), "ubl digital");
        assert_eq!(collapse_app_name("HBL"), "hbl");
    }
}
