//! Persistence of analysis runs to an output directory.

use crate::amazon::models::Review;
use crate::analysis::AnalyticsResult;
use crate::format::{summary_lines, Formatter};
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const REVIEWS_FILE: &str = "reviews.csv";
pub const DOCUMENT_FILE: &str = "analysis.json";
pub const SUMMARY_FILE: &str = "summary.txt";
pub const AUDIT_FILE: &str = "audit_log.csv";

const AUDIT_HEADER: &str = "query,timestamp";

/// Destination for scraped reviews and finished analyses.
pub trait Sink {
    /// Appends review rows.
    fn append_reviews(&mut self, reviews: &[Review]) -> Result<()>;

    /// Writes the whole analysis document.
    fn write_document(&mut self, result: &AnalyticsResult) -> Result<()>;
}

/// Writes CSV, JSON and text files into one directory.
///
/// `reviews.csv` and `audit_log.csv` are appended to across runs; the header is
/// written only when the file is new. `analysis.json` and `summary.txt` hold the
/// latest run.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Creates the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn append_lines(&self, name: &str, header: &str, lines: &[String]) -> Result<()> {
        let path = self.dir.join(name);
        let is_new = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let mut out = BufWriter::new(file);

        if is_new {
            writeln!(out, "{}", header)?;
        }
        for line in lines {
            writeln!(out, "{}", line)?;
        }
        out.flush().with_context(|| format!("Failed to write {}", path.display()))?;

        debug!("Appended {} rows to {}", lines.len(), path.display());
        Ok(())
    }

    fn write_file(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.dir.join(name);
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }
}

impl Sink for FileSink {
    fn append_reviews(&mut self, reviews: &[Review]) -> Result<()> {
        let rows: Vec<String> = reviews.iter().map(Formatter::csv_row).collect();
        self.append_lines(REVIEWS_FILE, Formatter::csv_header(), &rows)
    }

    fn write_document(&mut self, result: &AnalyticsResult) -> Result<()> {
        let json = serde_json::to_string_pretty(result).context("Failed to serialize analysis")?;
        self.write_file(DOCUMENT_FILE, &json)?;

        let mut summary = summary_lines(result).join("\n");
        summary.push('\n');
        self.write_file(SUMMARY_FILE, &summary)?;

        let audit = format!(
            "{},{}",
            Formatter::csv_escape(&result.query),
            result.generated_at.to_rfc3339()
        );
        self.append_lines(AUDIT_FILE, AUDIT_HEADER, &[audit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::models::{Histogram, Product, ReviewCollection};
    use crate::analysis::{build_result, Diagnostics};
    use tempfile::TempDir;

    fn make_result(query: &str) -> AnalyticsResult {
        let product = Product {
            title: "Test Earbuds".to_string(),
            asin: Some("B0TEST0001".to_string()),
            url: None,
            price: None,
            global_rating: Some(4.0),
            global_review_count: Some(10),
            histogram: Histogram::new(),
        };
        let mut reviews = ReviewCollection::new(5);
        reviews.push(Review::new(Some(4), "Solid bass, comfy fit", None, 0.5));
        build_result(query, product, reviews, Diagnostics::default(), 20)
    }

    #[test]
    fn test_creates_output_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("out");
        let sink = FileSink::new(&dir).unwrap();
        assert!(sink.dir().is_dir());
    }

    #[test]
    fn test_append_reviews_writes_header_once() {
        let tmp = TempDir::new().unwrap();
        let mut sink = FileSink::new(tmp.path()).unwrap();
        let reviews = vec![
            Review::new(Some(5), "Love it, works great", None, 0.6),
            Review::new(Some(2), "Meh", None, -0.1),
        ];

        sink.append_reviews(&reviews).unwrap();
        sink.append_reviews(&reviews[..1]).unwrap();

        let content = fs::read_to_string(tmp.path().join(REVIEWS_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], Formatter::csv_header());
        assert!(lines[1].starts_with("5,,\"Love it, works great\","));
        assert_eq!(content.matches("rating,title").count(), 1);
    }

    #[test]
    fn test_write_document() {
        let tmp = TempDir::new().unwrap();
        let mut sink = FileSink::new(tmp.path()).unwrap();
        let result = make_result("test earbuds");

        sink.write_document(&result).unwrap();

        let json = fs::read_to_string(tmp.path().join(DOCUMENT_FILE)).unwrap();
        let parsed: AnalyticsResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.query, "test earbuds");
        assert_eq!(parsed.reviews.len(), 1);
        assert_eq!(parsed.sentiment_counts, result.sentiment_counts);

        let summary = fs::read_to_string(tmp.path().join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("Product:   Test Earbuds"));
        assert!(summary.contains("Price:     Price not found"));
    }

    #[test]
    fn test_audit_log_appends_per_run() {
        let tmp = TempDir::new().unwrap();
        let mut sink = FileSink::new(tmp.path()).unwrap();

        sink.write_document(&make_result("first, query")).unwrap();
        sink.write_document(&make_result("second")).unwrap();

        let audit = fs::read_to_string(tmp.path().join(AUDIT_FILE)).unwrap();
        let lines: Vec<&str> = audit.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "query,timestamp");
        assert!(lines[1].starts_with("\"first, query\","));
        assert!(lines[2].starts_with("second,"));
    }
}
