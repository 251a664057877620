// src/render.rs
use serde_json::Value;

use crate::drilldown::DrillSelection;
use crate::listing::{self, ListingQuery};
use crate::models::{Review, Sentiment};
use crate::out_models::{AllViews, AppOverview, BankCategories};
use crate::taxonomy::title_case;

fn md_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", headers.join(" | ")));
    out.push_str(&format!(
        "|{}\n",
        headers.iter().map(|_| " --- |").collect::<String>()
    ));
    for row in rows {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    out
}

fn header_row(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// Free-form cell text must not break the table grid.
fn clean_cell(raw: &str) -> String {
    raw.replace('\n', " ").replace('|', "/")
}

fn column_title(name: &str) -> String {
    title_case(&name.replace('_', " "))
}

/// One `"Label (count)"` membership entry, split back into its parts.
fn split_membership(entry: &str) -> (String, u64) {
    match entry.rsplit_once(" (") {
        Some((label, rest)) => {
            let count = rest.trim_end_matches(')').parse().unwrap_or(0);
            (label.to_string(), count)
        }
        None => (entry.to_string(), 0),
    }
}

/// Category rows against app columns, rebuilt from the membership strings.
/// Categories sort alphabetically, apps keep their data order.
fn category_matrix(data: &[BankCategories]) -> (Vec<String>, Vec<Vec<String>>) {
    let apps: Vec<&str> = data.iter().map(|d| d.app.as_str()).collect();
    let parsed: Vec<Vec<(String, u64)>> = data
        .iter()
        .map(|d| d.categories.iter().map(|c| split_membership(c)).collect())
        .collect();

    let mut categories: Vec<String> = parsed
        .iter()
        .flatten()
        .map(|(label, _)| label.clone())
        .collect();
    categories.sort();
    categories.dedup();

    let mut headers = vec!["Category".to_string()];
    headers.extend(apps.iter().map(|a| a.to_string()));

    let rows = categories
        .iter()
        .map(|category| {
            let mut row = vec![category.clone()];
            for entries in &parsed {
                let count = entries
                    .iter()
                    .find(|(label, _)| label == category)
                    .map(|(_, n)| *n)
                    .unwrap_or(0);
                row.push(count.to_string());
            }
            row
        })
        .collect();

    (headers, rows)
}

pub fn render_report(date: &str, review_count: usize, views: &AllViews) -> String {
    let mut md = String::new();
    md.push_str("# Bank Review Pulse\n\n");
    md.push_str(&format!(
        "{} reviews across {} apps, generated {}.\n\n",
        review_count,
        views.bank.len(),
        date
    ));

    if !views.bank.is_empty() {
        md.push_str("## Review Volume by App\n");
        let rows: Vec<Vec<String>> = views
            .bank
            .iter()
            .map(|(app, b)| {
                vec![
                    app.clone(),
                    b.types.get(&Sentiment::Positive).copied().unwrap_or(0).to_string(),
                    b.types.get(&Sentiment::Neutral).copied().unwrap_or(0).to_string(),
                    b.types.get(&Sentiment::Negative).copied().unwrap_or(0).to_string(),
                    b.total.to_string(),
                ]
            })
            .collect();
        md.push_str(&md_table(
            &header_row(&["App", "Positive", "Neutral", "Negative", "Total"]),
            &rows,
        ));
        md.push('\n');
    }

    if !views.sentiments.is_empty() {
        md.push_str("## Sentiment Mix\n");
        let rows: Vec<Vec<String>> = views
            .sentiments
            .iter()
            .map(|s| vec![s.kind.to_string(), s.count.to_string()])
            .collect();
        md.push_str(&md_table(&header_row(&["Review Type", "Count"]), &rows));
        md.push('\n');
    }

    if !views.category_ratios.is_empty() {
        md.push_str("## Complaint Share by Category\n");
        let rows: Vec<Vec<String>> = views
            .category_ratios
            .iter()
            .map(|r| vec![r.category.to_string(), format!("{:.2}", r.ratio)])
            .collect();
        md.push_str(&md_table(&header_row(&["Category", "Ratio (%)"]), &rows));
        md.push('\n');
    }

    if !views.top_complaints.is_empty() {
        md.push_str("## Top Complaint per App\n");
        let rows: Vec<Vec<String>> = views
            .top_complaints
            .iter()
            .map(|t| {
                let category = t
                    .top_category
                    .map(|g| g.to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                vec![t.app.clone(), category, t.count.to_string()]
            })
            .collect();
        md.push_str(&md_table(
            &header_row(&["App", "Top Complaint Category", "Count"]),
            &rows,
        ));
        md.push('\n');
    }

    for (title, items) in [
        ("## Top Aspects\n", &views.top_aspects),
        ("## Top Opinions\n", &views.top_opinions),
    ] {
        if !items.is_empty() {
            md.push_str(title);
            let rows: Vec<Vec<String>> = items
                .iter()
                .map(|i| vec![clean_cell(&i.item), i.count.to_string()])
                .collect();
            md.push_str(&md_table(&header_row(&["Item", "Count"]), &rows));
            md.push('\n');
        }
    }

    if !views.categories_per_bank.is_empty() {
        md.push_str("## Complaint Categories vs Apps\n");
        let (headers, rows) = category_matrix(&views.categories_per_bank);
        md.push_str(&md_table(&headers, &rows));
        md.push('\n');
    }

    if !views.sentiment_by_category.is_empty() {
        md.push_str("## Sentiment by Category\n");
        let rows: Vec<Vec<String>> = views
            .sentiment_by_category
            .iter()
            .map(|c| {
                vec![
                    c.category.to_string(),
                    c.positive.to_string(),
                    c.neutral.to_string(),
                    c.negative.to_string(),
                ]
            })
            .collect();
        md.push_str(&md_table(
            &header_row(&["Category", "Positive", "Neutral", "Negative"]),
            &rows,
        ));
        md.push('\n');
    }

    if !views.net_scores.is_empty() {
        md.push_str("## Net Score by Category\n");
        let rows: Vec<Vec<String>> = views
            .net_scores
            .iter()
            .map(|c| vec![c.category.to_string(), c.net.to_string()])
            .collect();
        md.push_str(&md_table(&header_row(&["Category", "Net Score"]), &rows));
        md.push('\n');
    }

    md
}

pub fn render_overview(o: &AppOverview) -> String {
    let mut md = String::new();
    md.push_str(&format!("## App Overview: {}\n\n", o.app));
    md.push_str(&format!("- Total reviews: {}\n", o.total_reviews));
    match o.avg_score {
        Some(score) => md.push_str(&format!("- Average score: {score:.2}\n")),
        None => md.push_str("- Average score: N/A\n"),
    }
    match &o.review_period {
        Some(period) => md.push_str(&format!("- Review period: {period}\n")),
        None => md.push_str("- Review period: N/A\n"),
    }
    match o.top_complaint_category {
        Some(group) => md.push_str(&format!(
            "- Top complaint: {} ({})\n",
            group, o.top_complaint_count
        )),
        None => md.push_str("- Top complaint: N/A\n"),
    }
    md.push('\n');

    if !o.sentiment_breakdown.is_empty() {
        let rows: Vec<Vec<String>> = o
            .sentiment_breakdown
            .iter()
            .map(|c| {
                vec![
                    c.category.to_string(),
                    c.positive.to_string(),
                    c.neutral.to_string(),
                    c.negative.to_string(),
                ]
            })
            .collect();
        md.push_str(&md_table(
            &header_row(&["Category", "Positive", "Neutral", "Negative"]),
            &rows,
        ));
        md.push('\n');
    }

    md
}

pub fn render_drilldown(sel: &DrillSelection, rows: &[Review]) -> String {
    let mut md = String::new();
    md.push_str(&format!("## Drill-down: {}\n\n", sel.describe()));
    md.push_str(&format!("{} matching reviews.\n\n", rows.len()));
    if rows.is_empty() {
        return md;
    }

    let mut columns: Vec<&str> = Vec::new();
    for review in rows {
        for (key, _) in &review.detail {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let headers: Vec<String> = columns.iter().map(|c| column_title(c)).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|review| {
            columns
                .iter()
                .map(|col| {
                    review
                        .detail
                        .iter()
                        .find(|(k, _)| k == col)
                        .map(|(_, v)| clean_cell(v))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    md.push_str(&md_table(&headers, &body));
    md.push('\n');
    md
}

pub fn render_listing(query: &ListingQuery, rows: &[Value]) -> String {
    let mut md = String::new();
    md.push_str("## Summaries\n\n");
    match (&query.app, &query.search) {
        (Some(app), Some(search)) => {
            md.push_str(&format!("App {app:?}, search {search:?}: {} rows.\n\n", rows.len()))
        }
        (Some(app), None) => md.push_str(&format!("App {app:?}: {} rows.\n\n", rows.len())),
        (None, Some(search)) => {
            md.push_str(&format!("Search {search:?}: {} rows.\n\n", rows.len()))
        }
        (None, None) => md.push_str(&format!("{} rows.\n\n", rows.len())),
    }
    if rows.is_empty() {
        return md;
    }
    if query.app.is_none() {
        let apps = listing::app_names(rows);
        if !apps.is_empty() {
            md.push_str(&format!("Apps: {}.\n\n", apps.join(", ")));
        }
    }

    let columns = listing::display_columns(rows);
    let headers: Vec<String> = columns.iter().map(|c| column_title(c)).collect();
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|col| {
                    row.get(col)
                        .map(|v| clean_cell(&listing::cell_text(v)))
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();
    md.push_str(&md_table(&headers, &body));
    md.push('\n');
    md
}
