use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::models::{CategoryGroup, Sentiment};

fn group_or_na<S: Serializer>(g: &Option<CategoryGroup>, ser: S) -> Result<S::Ok, S::Error> {
    match g {
        Some(g) => ser.serialize_str(g.label()),
        None => ser.serialize_str("N/A"),
    }
}

/// Per-app sentiment mix: row total plus a count per observed sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct BankBreakdown {
    pub total: u64,
    pub types: BTreeMap<Sentiment, u64>,
}

/// One overall-sentiment bucket across the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentCount {
    #[serde(rename = "type")]
    pub kind: Sentiment,
    pub count: u64,
}

/// Share of one category group among all category-token occurrences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRatio {
    pub category: CategoryGroup,
    pub ratio: f64, // percent, 2 dp
}

/// An app's single most frequent complaint group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopComplaint {
    pub app: String,
    #[serde(rename = "topCategory", serialize_with = "group_or_na")]
    pub top_category: Option<CategoryGroup>,
    pub count: u64,
}

/// One entry of a top-aspects/top-opinions list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem {
    pub item: String,
    pub count: u64,
}

/// An app's category membership as "Group (count)" strings, most frequent
/// first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankCategories {
    pub app: String,
    pub categories: Vec<String>,
}

/// Category × sentiment cross-tab row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySentiment {
    pub category: CategoryGroup,
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

/// Net sentiment (positive minus negative contributions) per category group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNet {
    pub category: CategoryGroup,
    #[serde(rename = "netScore")]
    pub net: i64,
}

/// Stats card for one app.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppOverview {
    pub app: String,
    pub total_reviews: u64,
    pub avg_score: Option<f64>,        // 2 dp; absent when no row has a numeric score
    pub review_period: Option<String>, // "May 2022 - Jan 2024"
    #[serde(serialize_with = "group_or_na")]
    pub top_complaint_category: Option<CategoryGroup>,
    pub top_complaint_count: u64,
    pub sentiment_breakdown: Vec<CategorySentiment>,
}

/// Every report view computed from one fetched collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllViews {
    pub bank: BTreeMap<String, BankBreakdown>,
    pub sentiments: Vec<SentimentCount>,
    pub category_ratios: Vec<CategoryRatio>,
    pub top_complaints: Vec<TopComplaint>,
    pub top_aspects: Vec<RankedItem>,
    pub top_opinions: Vec<RankedItem>,
    pub categories_per_bank: Vec<BankCategories>,
    pub sentiment_by_category: Vec<CategorySentiment>,
    pub net_scores: Vec<CategoryNet>,
}

/// The shape a single view mode produces; serializes as the bare map/array
/// the downstream chart consumers expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SummaryView {
    Bank(BTreeMap<String, BankBreakdown>),
    Sentiments(Vec<SentimentCount>),
    CategoryRatios(Vec<CategoryRatio>),
    TopComplaints(Vec<TopComplaint>),
    RankedItems(Vec<RankedItem>),
    CategoriesPerBank(Vec<BankCategories>),
    SentimentByCategory(Vec<CategorySentiment>),
    NetScores(Vec<CategoryNet>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_complaint_serializes_missing_group_as_na() {
        let filled = TopComplaint {
            app: "HBL".into(),
            top_category: Some(CategoryGroup::AppExperience),
            count: 3,
        };
        let empty = TopComplaint {
            app: "Sunwai".into(),
            top_category: None,
            count: 0,
        };
        assert_eq!(
            serde_json::to_value(&filled).unwrap(),
            serde_json::json!({"app": "HBL", "topCategory": "App Experience", "count": 3})
        );
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            serde_json::json!({"app": "Sunwai", "topCategory": "N/A", "count": 0})
        );
    }

    #[test]
    fn sentiment_count_uses_the_type_key() {
        let c = SentimentCount {
            kind: Sentiment::Negative,
            count: 7,
        };
        assert_eq!(
            serde_json::to_value(&c).unwrap(),
            serde_json::json!({"type": "negative", "count": 7})
        );
    }
}
