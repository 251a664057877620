use std::collections::{BTreeMap, HashMap};

use crate::models::{CategoryGroup, ItemField, Review, Sentiment, ViewMode};
use crate::out_models::*;
use crate::sentiment::resolve_from_tags;
use crate::taxonomy::{classify, normalize, title_case};

const TOP_ITEMS_LIMIT: usize = 15;

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Per-app sentiment mix. Map iteration order is not part of the contract;
/// a sorted map keeps reruns byte-identical.
pub fn bank_breakdown(rows: &[Review]) -> BTreeMap<String, BankBreakdown> {
    let mut stats: BTreeMap<String, BankBreakdown> = BTreeMap::new();
    for r in rows {
        let overall = resolve_from_tags(&r.sentiment_tags);
        let entry = stats.entry(r.app.clone()).or_default();
        entry.total += 1;
        *entry.types.entry(overall).or_insert(0) += 1;
    }
    stats
}

/// Overall-sentiment counts across the collection, first-seen order.
pub fn sentiment_totals(rows: &[Review]) -> Vec<SentimentCount> {
    let mut tally: Vec<SentimentCount> = Vec::new();
    for r in rows {
        let overall = resolve_from_tags(&r.sentiment_tags);
        match tally.iter_mut().find(|c| c.kind == overall) {
            Some(c) => c.count += 1,
            None => tally.push(SentimentCount {
                kind: overall,
                count: 1,
            }),
        }
    }
    tally
}

/// Category shares. The denominator is total token occurrences, not rows:
/// a row with three categories contributes three to it.
pub fn category_ratios(rows: &[Review]) -> Vec<CategoryRatio> {
    let mut tally: Vec<(CategoryGroup, u64)> = Vec::new();
    let mut total = 0u64;
    for r in rows {
        for token in &r.category_tokens {
            let group = classify(token);
            match tally.iter_mut().find(|(g, _)| *g == group) {
                Some((_, c)) => *c += 1,
                None => tally.push((group, 1)),
            }
            total += 1;
        }
    }
    tally
        .into_iter()
        .map(|(category, count)| CategoryRatio {
            category,
            ratio: round2(count as f64 / total as f64 * 100.0),
        })
        .collect()
}

/// Each app's single most frequent complaint group. Ties go to the group
/// encountered first during the tally; an app with no parseable category
/// keeps the N/A placeholder.
pub fn top_complaints(rows: &[Review]) -> Vec<TopComplaint> {
    let mut stats: Vec<(String, Vec<(CategoryGroup, u64)>)> = Vec::new();
    for r in rows {
        let idx = match stats.iter().position(|(app, _)| *app == r.app) {
            Some(i) => i,
            None => {
                stats.push((r.app.clone(), Vec::new()));
                stats.len() - 1
            }
        };
        for token in &r.category_tokens {
            let group = classify(token);
            match stats[idx].1.iter_mut().find(|(g, _)| *g == group) {
                Some((_, c)) => *c += 1,
                None => stats[idx].1.push((group, 1)),
            }
        }
    }

    stats
        .into_iter()
        .map(|(app, groups)| {
            let mut best: Option<(CategoryGroup, u64)> = None;
            for (g, c) in groups {
                if best.map_or(true, |(_, bc)| c > bc) {
                    best = Some((g, c));
                }
            }
            TopComplaint {
                app,
                top_category: best.map(|(g, _)| g),
                count: best.map_or(0, |(_, c)| c),
            }
        })
        .collect()
}

/// Top aspects/opinions by row frequency: comma-split, normalized,
/// title-cased, empty and literal "null" dropped. A row counts an item once
/// however often it repeats the token. Capped at 15, ties kept in first-seen
/// order.
pub fn top_items(rows: &[Review], field: ItemField) -> Vec<RankedItem> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut tally: Vec<RankedItem> = Vec::new();
    for r in rows {
        let mut row_items: Vec<String> = Vec::new();
        for raw in r.items(field) {
            let cleaned = title_case(&normalize(raw));
            if cleaned.is_empty() || cleaned.eq_ignore_ascii_case("null") {
                continue;
            }
            if !row_items.contains(&cleaned) {
                row_items.push(cleaned);
            }
        }
        for cleaned in row_items {
            match index.get(&cleaned) {
                Some(&i) => tally[i].count += 1,
                None => {
                    index.insert(cleaned.clone(), tally.len());
                    tally.push(RankedItem {
                        item: cleaned,
                        count: 1,
                    });
                }
            }
        }
    }
    // stable sort preserves first-seen order inside equal counts
    tally.sort_by_key(|e| std::cmp::Reverse(e.count));
    tally.truncate(TOP_ITEMS_LIMIT);
    tally
}

/// Every app's category membership as "Group (count)" strings, most frequent
/// first.
pub fn categories_per_bank(rows: &[Review]) -> Vec<BankCategories> {
    let mut stats: Vec<(String, Vec<(CategoryGroup, u64)>)> = Vec::new();
    for r in rows {
        let idx = match stats.iter().position(|(app, _)| *app == r.app) {
            Some(i) => i,
            None => {
                stats.push((r.app.clone(), Vec::new()));
                stats.len() - 1
            }
        };
        for token in &r.category_tokens {
            let group = classify(token);
            match stats[idx].1.iter_mut().find(|(g, _)| *g == group) {
                Some((_, c)) => *c += 1,
                None => stats[idx].1.push((group, 1)),
            }
        }
    }

    stats
        .into_iter()
        .map(|(app, mut groups)| {
            groups.sort_by_key(|(_, c)| std::cmp::Reverse(*c));
            BankCategories {
                app,
                categories: groups
                    .into_iter()
                    .map(|(g, c)| format!("{} ({})", g.label(), c))
                    .collect(),
            }
        })
        .collect()
}

/// Category × sentiment cross-tab. A row increments a group once per token
/// occurrence, so duplicate tokens count twice; groups appear in first-token
/// order.
pub fn sentiment_by_category(rows: &[Review]) -> Vec<CategorySentiment> {
    let mut tally: Vec<CategorySentiment> = Vec::new();
    for r in rows {
        let overall = resolve_from_tags(&r.sentiment_tags);
        for token in &r.category_tokens {
            let group = classify(token);
            let idx = match tally.iter().position(|e| e.category == group) {
                Some(i) => i,
                None => {
                    tally.push(CategorySentiment {
                        category: group,
                        positive: 0,
                        neutral: 0,
                        negative: 0,
                    });
                    tally.len() - 1
                }
            };
            match overall {
                Sentiment::Positive => tally[idx].positive += 1,
                Sentiment::Neutral => tally[idx].neutral += 1,
                Sentiment::Negative => tally[idx].negative += 1,
            }
        }
    }
    tally
}

/// Net sentiment per group: positive minus negative token contributions.
/// Neutral rows still register the group, so an all-neutral group shows 0.
pub fn net_score_by_category(rows: &[Review]) -> Vec<CategoryNet> {
    let mut tally: Vec<CategoryNet> = Vec::new();
    for r in rows {
        let overall = resolve_from_tags(&r.sentiment_tags);
        for token in &r.category_tokens {
            let group = classify(token);
            let idx = match tally.iter().position(|e| e.category == group) {
                Some(i) => i,
                None => {
                    tally.push(CategoryNet {
                        category: group,
                        net: 0,
                    });
                    tally.len() - 1
                }
            };
            match overall {
                Sentiment::Positive => tally[idx].net += 1,
                Sentiment::Negative => tally[idx].net -= 1,
                Sentiment::Neutral => {}
            }
        }
    }
    tally
}

/// One view mode, one summary shape.
pub fn aggregate(rows: &[Review], mode: ViewMode) -> SummaryView {
    match mode {
        ViewMode::Bank => SummaryView::Bank(bank_breakdown(rows)),
        ViewMode::Review => SummaryView::Sentiments(sentiment_totals(rows)),
        ViewMode::Category => SummaryView::CategoryRatios(category_ratios(rows)),
        ViewMode::BankCategory => SummaryView::TopComplaints(top_complaints(rows)),
        ViewMode::TopAspects => SummaryView::RankedItems(top_items(rows, ItemField::Aspects)),
        ViewMode::TopOpinions => SummaryView::RankedItems(top_items(rows, ItemField::Opinions)),
        ViewMode::CategoriesPerBank => SummaryView::CategoriesPerBank(categories_per_bank(rows)),
        ViewMode::SentimentCategory => {
            SummaryView::SentimentByCategory(sentiment_by_category(rows))
        }
        ViewMode::NetScore => SummaryView::NetScores(net_score_by_category(rows)),
    }
}

/// All report views in one pass over the collection.
pub fn build_all_views(rows: &[Review]) -> AllViews {
    AllViews {
        bank: bank_breakdown(rows),
        sentiments: sentiment_totals(rows),
        category_ratios: category_ratios(rows),
        top_complaints: top_complaints(rows),
        top_aspects: top_items(rows, ItemField::Aspects),
        top_opinions: top_items(rows, ItemField::Opinions),
        categories_per_bank: categories_per_bank(rows),
        sentiment_by_category: sentiment_by_category(rows),
        net_scores: net_score_by_category(rows),
    }
}

/// Stats card for one app (exact name match, like the source rows store it).
/// Top complaint counts only each row's first category token; rows without a
/// parseable list contribute nothing to it.
pub fn app_overview(rows: &[Review], app: &str) -> AppOverview {
    let filtered: Vec<&Review> = rows.iter().filter(|r| r.app == app).collect();

    let scores: Vec<f64> = filtered.iter().filter_map(|r| r.score).collect();
    let avg_score = if scores.is_empty() {
        None
    } else {
        Some(round2(scores.iter().sum::<f64>() / scores.len() as f64))
    };

    let dates: Vec<_> = filtered.iter().filter_map(|r| r.posted_at).collect();
    let review_period = match (dates.iter().min(), dates.iter().max()) {
        (Some(min), Some(max)) => Some(format!(
            "{} - {}",
            min.format("%b %Y"),
            max.format("%b %Y")
        )),
        _ => None,
    };

    let mut complaint_tally: Vec<(CategoryGroup, u64)> = Vec::new();
    for r in &filtered {
        if let Some(first) = r.category_tokens.first() {
            let group = classify(first);
            match complaint_tally.iter_mut().find(|(g, _)| *g == group) {
                Some((_, c)) => *c += 1,
                None => complaint_tally.push((group, 1)),
            }
        }
    }
    let mut top: Option<(CategoryGroup, u64)> = None;
    for (g, c) in complaint_tally {
        if top.map_or(true, |(_, tc)| c > tc) {
            top = Some((g, c));
        }
    }

    let owned: Vec<Review> = filtered.iter().map(|r| (*r).clone()).collect();
    AppOverview {
        app: app.to_string(),
        total_reviews: owned.len() as u64,
        avg_score,
        review_period,
        top_complaint_category: top.map(|(g, _)| g),
        top_complaint_count: top.map_or(0, |(_, c)| c),
        sentiment_breakdown: sentiment_by_category(&owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn review(app: &str, sentiments: &[&str], categories: &[&str]) -> Review {
        Review {
            app: app.to_string(),
            sentiment_tags: sentiments.iter().map(|s| s.to_string()).collect(),
            category_tokens: categories.iter().map(|s| s.to_string()).collect(),
            aspects: Vec::new(),
            opinions: Vec::new(),
            score: None,
            posted_at: None,
            detail: Vec::new(),
        }
    }

    fn with_aspects(mut r: Review, aspects: &[&str]) -> Review {
        r.aspects = aspects.iter().map(|s| s.to_string()).collect();
        r
    }

    #[test]
    fn bank_breakdown_tallies_per_app_and_sentiment() {
        let rows = vec![
            review("HBL", &["positive"], &[]),
            review("HBL", &["negative"], &[]),
            review("HBL", &["positive", "negative"], &[]),
            review("Sunwai", &[], &[]),
        ];
        let stats = bank_breakdown(&rows);
        assert_eq!(stats["HBL"].total, 3);
        assert_eq!(stats["HBL"].types[&Sentiment::Positive], 1);
        assert_eq!(stats["HBL"].types[&Sentiment::Negative], 2);
        assert_eq!(stats["Sunwai"].total, 1);
        assert_eq!(stats["Sunwai"].types[&Sentiment::Neutral], 1);
    }

    #[test]
    fn sentiment_totals_keep_first_seen_order() {
        let rows = vec![
            review("A", &["negative"], &[]),
            review("A", &["positive"], &[]),
            review("A", &["negative"], &[]),
        ];
        let totals = sentiment_totals(&rows);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].kind, Sentiment::Negative);
        assert_eq!(totals[0].count, 2);
        assert_eq!(totals[1].kind, Sentiment::Positive);
        assert_eq!(totals[1].count, 1);
    }

    #[test]
    fn category_ratios_divide_by_token_occurrences() {
        // 4 occurrences total, App Experience twice → 50.00
        let rows = vec![
            review("A", &[], &["app#speed", "app#design"]),
            review("B", &[], &["atm_queue", "fees_high"]),
        ];
        let ratios = category_ratios(&rows);
        assert_eq!(ratios[0].category, CategoryGroup::AppExperience);
        assert_eq!(ratios[0].ratio, 50.0);
        let sum: f64 = ratios.iter().map(|r| r.ratio).sum();
        assert!((sum - 100.0).abs() < 0.05, "ratios sum to ~100, got {sum}");
    }

    #[test]
    fn category_ratios_empty_when_nothing_parses() {
        let rows = vec![review("A", &[], &[])];
        assert!(category_ratios(&rows).is_empty());
    }

    #[test]
    fn top_complaints_match_documented_example() {
        let mut rows = Vec::new();
        for _ in 0..3 {
            rows.push(review("A", &[], &["app#design"]));
        }
        rows.push(review("A", &[], &["branch_wait"]));
        rows.push(review("B", &[], &["atm_down"]));
        rows.push(review("B", &[], &["atm_down"]));

        let tops = top_complaints(&rows);
        assert_eq!(tops.len(), 2);
        assert_eq!(tops[0].app, "A");
        assert_eq!(tops[0].top_category, Some(CategoryGroup::AppExperience));
        assert_eq!(tops[0].count, 3);
        assert_eq!(tops[1].app, "B");
        assert_eq!(tops[1].top_category, Some(CategoryGroup::AtmService));
        assert_eq!(tops[1].count, 2);
    }

    #[test]
    fn top_complaints_tie_goes_to_first_encountered() {
        let rows = vec![
            review("A", &[], &["branch_wait", "atm_down"]),
            review("A", &[], &["atm_down", "branch_wait"]),
        ];
        let tops = top_complaints(&rows);
        assert_eq!(tops[0].top_category, Some(CategoryGroup::BranchService));
        assert_eq!(tops[0].count, 2);
    }

    #[test]
    fn top_complaints_without_categories_fall_back_to_na() {
        let rows = vec![review("A", &["positive"], &[])];
        let tops = top_complaints(&rows);
        assert_eq!(tops[0].top_category, None);
        assert_eq!(tops[0].count, 0);
    }

    #[test]
    fn top_items_fold_case_drop_null_and_count_rows_once() {
        let rows = vec![
            with_aspects(review("A", &[], &[]), &["UI", "null", "ui"]),
            with_aspects(review("B", &[], &[]), &["UI"]),
        ];
        let items = top_items(&rows, ItemField::Aspects);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item, "Ui");
        // "UI" and "ui" fold to one item per row, "null" never counts
        assert_eq!(items[0].count, 2);
    }

    #[test]
    fn top_items_cap_at_fifteen_with_stable_ties() {
        let mut rows = Vec::new();
        for i in 0..20 {
            let label = format!("aspect {i}");
            rows.push(with_aspects(review("A", &[], &[]), &[label.as_str()]));
        }
        let items = top_items(&rows, ItemField::Aspects);
        assert_eq!(items.len(), 15);
        // all counts equal, so the first fifteen by insertion survive
        assert_eq!(items[0].item, "Aspect 0");
        assert_eq!(items[14].item, "Aspect 14");
    }

    #[test]
    fn categories_per_bank_formats_sorted_membership() {
        let rows = vec![
            review("A", &[], &["branch_wait"]),
            review("A", &[], &["app#speed", "app#crash"]),
        ];
        let per_bank = categories_per_bank(&rows);
        assert_eq!(per_bank.len(), 1);
        assert_eq!(
            per_bank[0].categories,
            vec!["App Experience (2)".to_string(), "Branch Service (1)".to_string()]
        );
    }

    #[test]
    fn sentiment_by_category_counts_each_token_occurrence() {
        let rows = vec![
            review("A", &["negative"], &["app#crash", "app#crash"]),
            review("A", &["positive"], &["app#speed"]),
            review("B", &["neutral"], &["branch_wait"]),
        ];
        let tab = sentiment_by_category(&rows);
        assert_eq!(tab[0].category, CategoryGroup::AppExperience);
        assert_eq!(tab[0].negative, 2); // duplicate token counts twice
        assert_eq!(tab[0].positive, 1);
        assert_eq!(tab[1].category, CategoryGroup::BranchService);
        assert_eq!(tab[1].neutral, 1);
    }

    #[test]
    fn net_score_registers_all_neutral_groups_at_zero() {
        let rows = vec![
            review("A", &["neutral"], &["branch_wait"]),
            review("A", &["positive"], &["app#speed"]),
            review("A", &["negative"], &["app#crash", "app#lag"]),
        ];
        let nets = net_score_by_category(&rows);
        assert_eq!(nets[0].category, CategoryGroup::BranchService);
        assert_eq!(nets[0].net, 0);
        assert_eq!(nets[1].category, CategoryGroup::AppExperience);
        assert_eq!(nets[1].net, 1 - 2);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let rows = vec![
            review("HBL", &["positive", "negative"], &["app#crash", "fees_high"]),
            review("Sunwai", &["neutral"], &["branch_wait"]),
        ];
        for mode in ViewMode::ALL {
            let a = serde_json::to_string(&aggregate(&rows, mode)).unwrap();
            let b = serde_json::to_string(&aggregate(&rows, mode)).unwrap();
            assert_eq!(a, b, "mode {}", mode.as_str());
        }
    }

    #[test]
    fn app_overview_summarizes_one_app() {
        let mut r1 = review("HBL", &["negative"], &["app#crash", "fees_high"]);
        r1.score = Some(2.0);
        r1.posted_at = NaiveDate::from_ymd_opt(2022, 5, 10)
            .and_then(|d| d.and_hms_opt(0, 0, 0));
        let mut r2 = review("HBL", &["positive"], &["app#speed"]);
        r2.score = Some(5.0);
        r2.posted_at = NaiveDate::from_ymd_opt(2024, 1, 3)
            .and_then(|d| d.and_hms_opt(12, 30, 0));
        let other = review("Sunwai", &["positive"], &["branch_wait"]);

        let ov = app_overview(&[r1, r2, other], "HBL");
        assert_eq!(ov.total_reviews, 2);
        assert_eq!(ov.avg_score, Some(3.5));
        assert_eq!(ov.review_period.as_deref(), Some("May 2022 - Jan 2024"));
        // only the first token of each row counts toward the top complaint
        assert_eq!(ov.top_complaint_category, Some(CategoryGroup::AppExperience));
        assert_eq!(ov.top_complaint_count, 2);
        assert_eq!(ov.sentiment_breakdown.len(), 2);
    }

    #[test]
    fn app_overview_handles_unknown_app() {
        let rows = vec![review("HBL", &["positive"], &[])];
        let ov = app_overview(&rows, "Missing");
        assert_eq!(ov.total_reviews, 0);
        assert_eq!(ov.avg_score, None);
        assert_eq!(ov.review_period, None);
        assert_eq!(ov.top_complaint_category, None);
    }
}
