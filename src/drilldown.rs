use anyhow::{anyhow, bail, Error, Result};
use std::str::FromStr;

use crate::models::{CategoryGroup, ItemField, Review, Sentiment};
use crate::sentiment::resolve_from_tags;
use crate::taxonomy::{classify, normalize, title_case};

/// One clicked summary entry, parsed from `mode:key[:series]`.
///
///   bank:HBL                    all HBL rows
///   bank:HBL:negative           HBL rows resolving negative
///   review:positive             rows resolving positive
///   category:ATM Service        rows with a token in the group
///   bank-category:HBL:Charges & Fees
///   top-aspects:Login           rows whose aspects contain "Login"
///   top-opinions:Slow
///   categories-per-bank:HBL
///   sentiment-category:Design/UX:negative
#[derive(Debug, Clone, PartialEq)]
pub enum DrillSelection {
    Bank {
        app: String,
        series: Option<Sentiment>,
    },
    Sentiment {
        sentiment: Sentiment,
    },
    Category {
        group: CategoryGroup,
    },
    BankCategory {
        app: String,
        group: CategoryGroup,
    },
    Item {
        field: ItemField,
        item: String,
    },
    BankMembership {
        app: String,
    },
    CategorySentiment {
        group: CategoryGroup,
        series: Sentiment,
    },
}

impl DrillSelection {
    /// The app name when the selection is app-scoped; those filters can be
    /// pushed to the store as an equality query.
    pub fn app_scope(&self) -> Option<&str> {
        match self {
            DrillSelection::Bank { app, .. }
            | DrillSelection::BankCategory { app, .. }
            | DrillSelection::BankMembership { app } => Some(app),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DrillSelection::Bank { app, series: None } => format!("bank {app}"),
            DrillSelection::Bank {
                app,
                series: Some(s),
            } => format!("bank {app}, {s} reviews"),
            DrillSelection::Sentiment { sentiment } => format!("{sentiment} reviews"),
            DrillSelection::Category { group } => format!("category {group}"),
            DrillSelection::BankCategory { app, group } => format!("bank {app}, category {group}"),
            DrillSelection::Item { field, item } => format!("{} \"{item}\"", field.as_str()),
            DrillSelection::BankMembership { app } => format!("bank {app}"),
            DrillSelection::CategorySentiment { group, series } => {
                format!("category {group}, {series} reviews")
            }
        }
    }
}

fn parse_sentiment(raw: &str) -> Result<Sentiment> {
    Sentiment::parse(raw)
        .ok_or_else(|| anyhow!("unknown sentiment {raw:?} (positive, neutral or negative)"))
}

fn parse_group(raw: &str) -> Result<CategoryGroup> {
    CategoryGroup::from_label(raw)
        .ok_or_else(|| anyhow!("unknown category group {raw:?} (e.g. \"App Experience\")"))
}

impl FromStr for DrillSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let mode = parts.next().unwrap_or_default().trim();
        let key = parts.next().map(str::trim);
        let series = parts.next().map(str::trim);

        // accept bank-category, bankCategory and bank_category alike
        let mode_key: String = mode
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        let key = match key {
            Some(k) if !k.is_empty() => k,
            _ => bail!("drill selection {s:?} needs the form mode:key[:series]"),
        };

        match mode_key.as_str() {
            "bank" => Ok(DrillSelection::Bank {
                app: key.to_string(),
                series: series.map(parse_sentiment).transpose()?,
            }),
            "review" => Ok(DrillSelection::Sentiment {
                sentiment: parse_sentiment(key)?,
            }),
            "category" => Ok(DrillSelection::Category {
                group: parse_group(key)?,
            }),
            "bankcategory" => {
                let group = series
                    .ok_or_else(|| anyhow!("bank-category needs app and group, e.g. bank-category:HBL:ATM Service"))?;
                Ok(DrillSelection::BankCategory {
                    app: key.to_string(),
                    group: parse_group(group)?,
                })
            }
            "topaspects" => Ok(DrillSelection::Item {
                field: ItemField::Aspects,
                item: title_case(&normalize(key)),
            }),
            "topopinions" => Ok(DrillSelection::Item {
                field: ItemField::Opinions,
                item: title_case(&normalize(key)),
            }),
            "categoriesperbank" => Ok(DrillSelection::BankMembership {
                app: key.to_string(),
            }),
            "sentimentcategory" => {
                let series = series.ok_or_else(|| {
                    anyhow!("sentiment-category needs group and sentiment, e.g. sentiment-category:Design/UX:negative")
                })?;
                Ok(DrillSelection::CategorySentiment {
                    group: parse_group(key)?,
                    series: parse_sentiment(series)?,
                })
            }
            _ => bail!(
                "unknown drill mode {mode:?} (bank, review, category, bank-category, \
                 top-aspects, top-opinions, categories-per-bank, sentiment-category)"
            ),
        }
    }
}

fn has_group(review: &Review, group: CategoryGroup) -> bool {
    review.category_tokens.iter().any(|t| classify(t) == group)
}

fn has_item(review: &Review, field: ItemField, item: &str) -> bool {
    review
        .items(field)
        .iter()
        .any(|raw| title_case(&normalize(raw)) == item)
}

/// The complete predicate for one selection. Store-delegated paths re-apply
/// it after the equality fetch, so both routes return identical rows.
pub fn matches(review: &Review, sel: &DrillSelection) -> bool {
    match sel {
        DrillSelection::Bank { app, series } => {
            review.app == *app
                && series.map_or(true, |s| resolve_from_tags(&review.sentiment_tags) == s)
        }
        DrillSelection::Sentiment { sentiment } => {
            resolve_from_tags(&review.sentiment_tags) == *sentiment
        }
        DrillSelection::Category { group } => has_group(review, *group),
        DrillSelection::BankCategory { app, group } => {
            review.app == *app && has_group(review, *group)
        }
        DrillSelection::Item { field, item } => has_item(review, *field, item),
        DrillSelection::BankMembership { app } => review.app == *app,
        DrillSelection::CategorySentiment { group, series } => {
            has_group(review, *group) && resolve_from_tags(&review.sentiment_tags) == *series
        }
    }
}

/// Local scan: the detail rows behind one summary entry.
pub fn drill_down(rows: &[Review], sel: &DrillSelection) -> Vec<Review> {
    rows.iter().filter(|r| matches(r, sel)).cloned().collect()
}
