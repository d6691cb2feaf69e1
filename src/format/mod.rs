//! Output formatting for analysis results (table, JSON, markdown, CSV).

use crate::amazon::models::{Review, PRICE_NOT_FOUND};
use crate::analysis::AnalyticsResult;
use crate::config::OutputFormat;

const TEXT_WIDTH: usize = 70;
const KEYWORDS_SHOWN: usize = 10;

/// Formats analysis results for output.
pub struct Formatter {
    format: OutputFormat,
    filters: Vec<String>,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format, filters: Vec::new() }
    }

    /// Attaches the descriptions of the filters that selected the shown reviews.
    pub fn with_filters(mut self, filters: Vec<String>) -> Self {
        self.filters = filters;
        self
    }

    /// Formats a result, listing `shown` as its reviews.
    pub fn format_result(&self, result: &AnalyticsResult, shown: &[&Review]) -> String {
        match self.format {
            OutputFormat::Json => self.json_result(result, shown),
            OutputFormat::Table => self.table_result(result, shown),
            OutputFormat::Markdown => self.markdown_result(result, shown),
            OutputFormat::Csv => self.csv_reviews(shown),
        }
    }

    // JSON formatting

    fn json_result(&self, result: &AnalyticsResult, shown: &[&Review]) -> String {
        let Ok(mut value) = serde_json::to_value(result) else {
            return "{}".to_string();
        };
        if let (Some(obj), Ok(reviews)) = (value.as_object_mut(), serde_json::to_value(shown)) {
            obj.insert("reviews".to_string(), reviews);
            if !self.filters.is_empty() {
                obj.insert("filters".to_string(), serde_json::json!(self.filters));
            }
        }
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    // Table formatting

    fn table_result(&self, result: &AnalyticsResult, shown: &[&Review]) -> String {
        let mut lines = summary_lines(result);

        if !self.filters.is_empty() {
            lines.push(format!("Filters:   {}", self.filters.join("; ")));
        }

        lines.push(String::new());
        if shown.is_empty() {
            lines.push("No reviews match.".to_string());
            return lines.join("\n");
        }

        let date_width = 10;
        let label_width = 9;
        lines.push(format!(
            "{:<5}  {:<label_width$}  {:<date_width$}  {}",
            "Stars", "Sentiment", "Date", "Review"
        ));
        lines.push(format!(
            "{:-<5}  {:-<label_width$}  {:-<date_width$}  {:-<TEXT_WIDTH$}",
            "", "", "", ""
        ));

        for review in shown {
            let date = review.date.map(|d| d.to_string()).unwrap_or_else(|| "N/A".to_string());
            lines.push(format!(
                "{:<5}  {:<label_width$}  {:<date_width$}  {}",
                review.rating,
                review.sentiment.to_string(),
                date,
                truncate(&review.text, TEXT_WIDTH)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Showing: {} of {} reviews", shown.len(), result.reviews.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_result(&self, result: &AnalyticsResult, shown: &[&Review]) -> String {
        let product = &result.product;
        let counts = &result.sentiment_counts;
        let mut lines = Vec::new();

        lines.push(format!("## {}", product.title));
        lines.push(String::new());

        if let Some(asin) = &product.asin {
            lines.push(format!("- **ASIN:** {}", asin));
        }
        if let Some(url) = &product.url {
            lines.push(format!("- **URL:** [View on Amazon]({})", url));
        }
        if let Some(rating) = product.global_rating {
            lines.push(format!("- **Rating:** {:.1}/5", rating));
        }
        if let Some(count) = product.global_review_count {
            lines.push(format!("- **Ratings:** {}", count));
        }
        lines.push(format!(
            "- **Sentiment ({}):** {} positive, {} neutral, {} negative",
            result.confidence, counts.positive, counts.neutral, counts.negative
        ));
        if !result.top_keywords.is_empty() {
            let terms: Vec<&str> =
                result.top_keywords.iter().take(KEYWORDS_SHOWN).map(|k| k.term.as_str()).collect();
            lines.push(format!("- **Keywords:** {}", terms.join(", ")));
        }
        if !self.filters.is_empty() {
            lines.push(format!("- **Filters:** {}", self.filters.join("; ")));
        }

        lines.push(String::new());
        lines.push("| Stars | Sentiment | Date | Review |".to_string());
        lines.push("|-------|-----------|------|--------|".to_string());

        for review in shown {
            let date = review.date.map(|d| d.to_string()).unwrap_or_default();
            lines.push(format!(
                "| {} | {} | {} | {} |",
                review.rating,
                review.sentiment,
                date,
                truncate(&review.text, TEXT_WIDTH).replace('|', "\\|")
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} reviews shown*", shown.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_reviews(&self, reviews: &[&Review]) -> String {
        let mut lines = Vec::with_capacity(reviews.len() + 1);
        lines.push(Self::csv_header().to_string());
        lines.extend(reviews.iter().map(|r| Self::csv_row(r)));
        lines.join("\n")
    }

    /// Header of the review CSV layout.
    pub fn csv_header() -> &'static str {
        "rating,title,text,date,sentiment,polarity"
    }

    /// One review as a CSV row.
    pub fn csv_row(review: &Review) -> String {
        format!(
            "{},{},{},{},{},{:.4}",
            review.rating,
            review.title.as_deref().map(Self::csv_escape).unwrap_or_default(),
            Self::csv_escape(&review.text),
            review.date.map(|d| d.to_string()).unwrap_or_default(),
            review.sentiment,
            review.polarity
        )
    }

    pub(crate) fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

/// Plain-text summary of a result, shared by the table output and `summary.txt`.
pub fn summary_lines(result: &AnalyticsResult) -> Vec<String> {
    let product = &result.product;
    let counts = &result.sentiment_counts;
    let diagnostics = &result.diagnostics;
    let mut lines = Vec::new();

    lines.push(format!("Query:     {}", result.query));
    lines.push(format!("Product:   {}", product.title));
    if let Some(asin) = &product.asin {
        lines.push(format!("ASIN:      {}", asin));
    }
    if let Some(url) = &product.url {
        lines.push(format!("URL:       {}", url));
    }
    lines.push(format!("Price:     {}", product.price.as_deref().unwrap_or(PRICE_NOT_FOUND)));

    match (product.global_rating, product.global_review_count) {
        (Some(rating), Some(count)) => {
            lines.push(format!("Rating:    {:.1}/5 ({} ratings)", rating, count))
        }
        (Some(rating), None) => lines.push(format!("Rating:    {:.1}/5", rating)),
        (None, Some(count)) => lines.push(format!("Rating:    N/A ({} ratings)", count)),
        (None, None) => lines.push("Rating:    N/A".to_string()),
    }

    if !product.histogram.is_empty() {
        let bars: Vec<String> =
            (1..=5).rev().map(|star| format!("{}* {}%", star, product.histogram.percent(star))).collect();
        lines.push(format!("Histogram: {}", bars.join(" | ")));
    }

    lines.push(format!(
        "Sentiment: {} positive, {} neutral, {} negative ({})",
        counts.positive, counts.neutral, counts.negative, result.confidence
    ));

    let average = result
        .sample_average_rating()
        .map(|avg| format!(", average {:.2}", avg))
        .unwrap_or_default();
    lines.push(format!(
        "Sample:    {} reviews from {} pages{}",
        result.reviews.len(),
        diagnostics.pages_visited,
        average
    ));

    if !result.top_keywords.is_empty() {
        let terms: Vec<&str> =
            result.top_keywords.iter().take(KEYWORDS_SHOWN).map(|k| k.term.as_str()).collect();
        lines.push(format!("Keywords:  {}", terms.join(", ")));
    }

    if let (Some(first), Some(last)) = (result.rating_trend.first(), result.rating_trend.last()) {
        lines.push(format!(
            "Trend:     {} {:.2} -> {} {:.2}",
            first.month, first.average_rating, last.month, last.average_rating
        ));
    }

    if let Some(reason) = &diagnostics.stop_reason {
        lines.push(format!("Stopped:   {}", reason));
    }

    let mut warnings = Vec::new();
    warnings.extend(diagnostics.obstacles.unresolved.iter().cloned());
    if !diagnostics.defaulted_fields.is_empty() {
        let fields: Vec<String> = diagnostics.defaulted_fields.iter().map(|f| f.to_string()).collect();
        warnings.push(format!("defaulted: {}", fields.join(", ")));
    }
    if diagnostics.skipped_blocks > 0 {
        warnings.push(format!("{} review blocks skipped", diagnostics.skipped_blocks));
    }
    warnings.extend(diagnostics.notes.iter().cloned());
    if !warnings.is_empty() {
        lines.push(format!("Warnings:  {}", warnings.join("; ")));
    }

    lines
}

fn truncate(s: &str, width: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > width {
        let cut: String = flat.chars().take(width - 3).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}
