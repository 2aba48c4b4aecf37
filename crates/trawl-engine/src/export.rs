//! CSV and JSON rendering of a result view.

use std::io::Write;
use std::str::FromStr;

use trawl_core::CoreError;
use trawl_core::entities::{PlatformMetrics, ScrapeResult};

use crate::error::EngineError;

const CSV_HEADER: [&str; 14] = [
    "id",
    "task_id",
    "platform",
    "business_name",
    "description",
    "phone",
    "website",
    "address",
    "rating",
    "review_count",
    "followers",
    "employees",
    "industry",
    "category",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(CoreError::ValidationRejected(format!(
                "unsupported export format: {other}"
            ))),
        }
    }
}

/// Write `results` to `writer` in the given format.
///
/// # Errors
///
/// Returns [`EngineError::Io`] or [`EngineError::Serialize`] if writing fails.
pub fn write_results<W: Write>(
    writer: W,
    format: ExportFormat,
    results: &[ScrapeResult],
) -> Result<(), EngineError> {
    match format {
        ExportFormat::Csv => write_csv(writer, results),
        ExportFormat::Json => write_json(writer, results),
    }
}

/// One header row then one row per result. Platform-specific columns are
/// empty for platforms that do not carry them.
///
/// # Errors
///
/// Returns [`EngineError::Io`] if the writer fails.
pub fn write_csv<W: Write>(mut writer: W, results: &[ScrapeResult]) -> Result<(), EngineError> {
    write_row(&mut writer, &CSV_HEADER.map(str::to_string))?;
    for result in results {
        write_row(&mut writer, &csv_row(result))?;
    }
    writer.flush()?;
    Ok(())
}

/// Pretty-printed JSON array of results.
///
/// # Errors
///
/// Returns [`EngineError::Serialize`] if serialization or the writer fails.
pub fn write_json<W: Write>(mut writer: W, results: &[ScrapeResult]) -> Result<(), EngineError> {
    serde_json::to_writer_pretty(&mut writer, results)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn csv_row(result: &ScrapeResult) -> [String; 14] {
    let (rating, review_count, followers, employees, industry, category) = match &result.metrics
    {
        PlatformMetrics::Google(m) | PlatformMetrics::Facebook(m) => (
            m.rating.map(|r| r.to_string()),
            m.review_count.map(|c| c.to_string()),
            None,
            None,
            None,
            m.category.clone(),
        ),
        PlatformMetrics::Instagram(m) => {
            (None, None, m.followers.clone(), None, None, m.category.clone())
        }
        PlatformMetrics::Linkedin(m) => {
            (None, None, None, m.employees.clone(), m.industry.clone(), None)
        }
    };
    [
        result.id.clone(),
        result.task_id.clone(),
        result.platform().to_string(),
        result.business_name.clone(),
        result.description.clone(),
        result.phone.clone().unwrap_or_default(),
        result.website.clone().unwrap_or_default(),
        result.address.clone().unwrap_or_default(),
        rating.unwrap_or_default(),
        review_count.unwrap_or_default(),
        followers.unwrap_or_default(),
        employees.unwrap_or_default(),
        industry.unwrap_or_default(),
        category.unwrap_or_default(),
    ]
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn write_row<W: Write>(writer: &mut W, row: &[String]) -> std::io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        if needs_quotes(cell) {
            write!(writer, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            writer.write_all(cell.as_bytes())?;
        }
    }
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trawl_core::entities::{CompanyMetrics, ReviewMetrics};

    fn google() -> ScrapeResult {
        ScrapeResult {
            id: "r1".into(),
            task_id: "task_001".into(),
            business_name: "Joe's \"Famous\" Pizza".into(),
            description: "Pizza, pasta".into(),
            phone: Some("+1 212-555-0100".into()),
            website: None,
            address: None,
            metrics: PlatformMetrics::Google(ReviewMetrics {
                rating: Some(4.5),
                review_count: Some(234),
                category: Some("Pizza".into()),
            }),
        }
    }

    fn linkedin() -> ScrapeResult {
        ScrapeResult {
            id: "r2".into(),
            task_id: "task_001".into(),
            business_name: "Acme".into(),
            description: "Line one\nline two".into(),
            phone: None,
            website: Some("https://acme.example.com".into()),
            address: None,
            metrics: PlatformMetrics::Linkedin(CompanyMetrics {
                employees: Some("201-500".into()),
                industry: Some("Manufacturing".into()),
            }),
        }
    }

    #[test]
    fn csv_quotes_and_blanks_foreign_columns() {
        let mut out = Vec::new();
        write_csv(&mut out, &[google(), linkedin()]).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = "\
id,task_id,platform,business_name,description,phone,website,address,rating,review_count,followers,employees,industry,category
r1,task_001,google,\"Joe's \"\"Famous\"\" Pizza\",\"Pizza, pasta\",+1 212-555-0100,,,4.5,234,,,,Pizza
r2,task_001,linkedin,Acme,\"Line one\nline two\",,https://acme.example.com,,,,,201-500,Manufacturing,
";
        assert_eq!(text, expected);
    }

    #[test]
    fn json_export_keeps_platform_tag() {
        let mut out = Vec::new();
        write_results(&mut out, ExportFormat::Json, &[linkedin()]).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["platform"], "linkedin");
        assert_eq!(value[0]["employees"], "201-500");
        assert!(value[0].get("rating").is_none());
    }

    #[test]
    fn empty_view_is_header_only() {
        let mut out = Vec::new();
        write_csv(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
