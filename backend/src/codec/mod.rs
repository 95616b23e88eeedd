//! CSV conversion between lead lists and text.
//!
//! Wire format:
//!
//! ```text
//! name,role,company,domain,email,source,country,industry,score,flags
//! Jane Doe,CEO,"Acme, Inc",acme.io,jane@acme.io,mock_data,,,85,no_mx;generic
//! ```
//!
//! - `flags` is a `;`-joined list.
//! - Values containing `,`, `"` or a newline are quoted, `"` doubled.
//!
//! Reading has two levels of strictness. [`parse_csv`] silently skips rows
//! whose column count differs from the header; [`validate_csv_format`]
//! reports every such row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CodecError, CodecResult};
use crate::models::Lead;

/// Column order of exported files.
pub const HEADERS: [&str; 10] = [
    "name", "role", "company", "domain", "email", "source", "country", "industry", "score", "flags",
];

const MISSING_ROWS: &str = "CSV must have at least a header row and one data row";

/// Structural check result for a CSV document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    /// Number of lines after trimming the document.
    pub line_count: usize,
}

// =============================================================================
// Writing
// =============================================================================

fn render_score(score: Option<f64>) -> String {
    score.map(|s| s.to_string()).unwrap_or_default()
}

fn lead_record(lead: &Lead) -> [String; 10] {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    [
        text(&lead.name),
        text(&lead.role),
        text(&lead.company),
        text(&lead.domain),
        text(&lead.email),
        text(&lead.source),
        text(&lead.country),
        text(&lead.industry),
        render_score(lead.score),
        lead.flags.join(";"),
    ]
}

/// Serialize leads to CSV text.
///
/// Returns `""` for an empty list. Rows are separated by `\n` with no
/// trailing newline.
pub fn to_csv(leads: &[Lead]) -> String {
    if leads.is_empty() {
        return String::new();
    }
    // Writing into a Vec cannot fail on I/O; csv errors here would be a bug.
    match write_csv(leads) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "in-memory CSV write failed");
            String::new()
        }
    }
}

fn write_csv(leads: &[Lead]) -> CodecResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADERS)?;
    for lead in leads {
        writer.write_record(lead_record(lead))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CodecError::Io(e.into_error()))?;
    let mut text = String::from_utf8(bytes).map_err(|e| CodecError::Encoding(e.to_string()))?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

// =============================================================================
// Reading
// =============================================================================

/// Split one CSV line into cells.
///
/// Double quotes toggle quoting, `""` inside quotes is a literal quote and
/// commas only separate cells outside quotes. Quote characters themselves are
/// never part of the output.
pub fn split_record(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

fn lines(content: &str) -> Vec<&str> {
    content.trim().split('\n').collect()
}

/// Parse CSV text into leads.
///
/// Column order comes from the header; unknown columns are ignored. Rows with
/// the wrong number of cells are skipped, empty cells leave the field unset,
/// an unparseable score becomes `None`.
pub fn parse_csv(content: &str) -> Vec<Lead> {
    let lines = lines(content);
    if lines.len() < 2 {
        return Vec::new();
    }

    let headers: Vec<String> = lines[0]
        .split(',')
        .map(|h| h.trim().replace('"', ""))
        .collect();

    let mut leads = Vec::new();
    let mut skipped = 0usize;

    for line in &lines[1..] {
        let values = split_record(line);
        if values.len() != headers.len() {
            skipped += 1;
            continue;
        }

        let mut lead = Lead::default();
        for (header, value) in headers.iter().zip(&values) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            apply_cell(&mut lead, header, value);
        }
        leads.push(lead);
    }

    if skipped > 0 {
        tracing::debug!(skipped, "skipped CSV rows with mismatched column count");
    }
    leads
}

fn apply_cell(lead: &mut Lead, header: &str, value: &str) {
    let text = Some(value.to_string());
    match header {
        "name" => lead.name = text,
        "role" => lead.role = text,
        "company" => lead.company = text,
        "domain" => lead.domain = text,
        "email" => lead.email = text,
        "source" => lead.source = text,
        "country" => lead.country = text,
        "industry" => lead.industry = text,
        "score" => lead.score = value.parse::<f64>().ok().filter(|s| s.is_finite()),
        "flags" => lead.flags = value.split(';').map(|f| f.trim().to_string()).collect(),
        _ => {}
    }
}

/// Report every data line whose cell count differs from the header's.
pub fn validate_csv_format(content: &str) -> CsvValidation {
    let lines = lines(content);

    if lines.len() < 2 {
        return CsvValidation {
            is_valid: false,
            errors: vec![MISSING_ROWS.to_string()],
            line_count: lines.len(),
        };
    }

    let expected = split_record(lines[0]).len();
    let errors: Vec<String> = lines
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(i, line)| {
            let got = split_record(line).len();
            (got != expected)
                .then(|| format!("Line {}: Expected {} columns, got {}", i + 1, expected, got))
        })
        .collect();

    CsvValidation {
        is_valid: errors.is_empty(),
        errors,
        line_count: lines.len(),
    }
}

// =============================================================================
// Uploads and files
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // UTF-8 and anything unknown: lossy UTF-8
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Decode an uploaded CSV file, stripping a UTF-8 byte order mark.
pub fn decode_upload(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let encoding = detect_encoding(bytes);
            tracing::debug!(%encoding, "upload is not UTF-8, decoding with detected charset");
            decode_content(bytes, &encoding)
        }
    };
    text.replace("\r\n", "\n")
}

/// Read and parse a CSV file.
pub fn read_csv_file(path: impl AsRef<Path>) -> CodecResult<Vec<Lead>> {
    let bytes = std::fs::read(path.as_ref())?;
    Ok(parse_csv(&decode_upload(&bytes)))
}

/// Write leads to a CSV file.
pub fn write_csv_file(path: impl AsRef<Path>, leads: &[Lead]) -> CodecResult<()> {
    std::fs::write(path.as_ref(), to_csv(leads))?;
    Ok(())
}

/// `{prefix}-{YYYY-MM-DDTHH-MM-SS}.csv`
pub fn export_filename(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}.csv", prefix, now.format("%Y-%m-%dT%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn jane() -> Lead {
        Lead {
            name: Some("Jane Doe".into()),
            role: Some("CEO".into()),
            company: Some("Acme".into()),
            domain: Some("acme.io".into()),
            email: Some("jane@acme.io".into()),
            source: Some("mock_data".into()),
            country: Some("Canada".into()),
            industry: Some("SaaS".into()),
            score: Some(85.0),
            flags: vec!["no_mx".into(), "generic".into()],
        }
    }

    #[test]
    fn test_to_csv_empty() {
        assert_eq!(to_csv(&[]), "");
    }

    #[test]
    fn test_to_csv_header_and_row() {
        let csv = to_csv(&[jane()]);
        assert_eq!(
            csv,
            "name,role,company,domain,email,source,country,industry,score,flags\n\
             Jane Doe,CEO,Acme,acme.io,jane@acme.io,mock_data,Canada,SaaS,85,no_mx;generic"
        );
    }

    #[test]
    fn test_to_csv_missing_fields_are_empty() {
        let csv = to_csv(&[Lead::with_email("a@x.com")]);
        assert_eq!(csv.lines().nth(1), Some(",,,,a@x.com,,,,,"));
    }

    #[test]
    fn test_to_csv_quoting() {
        let lead = Lead {
            company: Some("Acme, Inc".into()),
            name: Some(r#"Jane "JD" Doe"#.into()),
            industry: Some("line\nbreak".into()),
            ..Lead::default()
        };
        let csv = to_csv(&[lead]);

        assert!(csv.contains(r#""Acme, Inc""#));
        assert!(csv.contains(r#""Jane ""JD"" Doe""#));
        assert!(csv.contains("\"line\nbreak\""));
    }

    #[test]
    fn test_fractional_score_written_as_is() {
        let lead = Lead { score: Some(72.5), ..Lead::default() };
        assert!(to_csv(&[lead]).ends_with(",72.5,"));
    }

    #[test]
    fn test_split_record() {
        assert_eq!(split_record("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(split_record(r#""a,b",c"#), vec!["a,b", "c"]);
        assert_eq!(split_record(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
        assert_eq!(split_record(""), vec![""]);
        assert_eq!(split_record("a,"), vec!["a", ""]);
    }

    #[test]
    fn test_round_trip() {
        let leads = vec![
            jane(),
            Lead::with_email("a@x.com"),
            Lead {
                name: Some("Bob".into()),
                score: Some(0.0),
                flags: vec!["duplicate".into()],
                ..Lead::default()
            },
        ];
        assert_eq!(parse_csv(&to_csv(&leads)), leads);
    }

    #[test]
    fn test_round_trip_with_quoted_commas() {
        let lead = Lead {
            company: Some("Acme, Inc".into()),
            name: Some(r#"Jane "JD" Doe"#.into()),
            ..Lead::default()
        };
        assert_eq!(parse_csv(&to_csv(&[lead.clone()])), vec![lead]);
    }

    #[test]
    fn test_parse_flags_trimmed_and_unparseable_score() {
        let csv = "email,score,flags\na@x.com,high, no_mx ; generic";
        let leads = parse_csv(csv);

        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].score, None);
        assert_eq!(leads[0].flags, vec!["no_mx", "generic"]);
    }

    #[test]
    fn test_parse_header_order_and_unknown_columns() {
        let csv = "\"email\", Name ,phone\nx@y.com,Jane,555\n";
        let leads = parse_csv(csv);

        assert_eq!(leads[0].email.as_deref(), Some("x@y.com"));
        // Header matching is case-sensitive: "Name" is not a lead field.
        assert_eq!(leads[0].name, None);
    }

    #[test]
    fn test_parse_skips_mismatched_rows() {
        let csv = "name,email\nJane,j@x.com\nBob,b@x.com,extra\nAmy\nZoe,z@x.com";
        let leads = parse_csv(csv);
        let names: Vec<_> = leads.iter().map(|l| l.name.as_deref().unwrap()).collect();

        assert_eq!(names, vec!["Jane", "Zoe"]);
    }

    #[test]
    fn test_parse_needs_header_and_row() {
        assert!(parse_csv("").is_empty());
        assert!(parse_csv("name,email\n").is_empty());
    }

    #[test]
    fn test_validate_reports_column_mismatch() {
        let result = validate_csv_format("name,role\na,b,c");

        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Line 2: Expected 2 columns, got 3"]);
        assert_eq!(result.line_count, 2);
    }

    #[test]
    fn test_validate_ok() {
        let result = validate_csv_format(&to_csv(&[jane(), jane()]));
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.line_count, 3);
    }

    #[test]
    fn test_validate_too_short() {
        let result = validate_csv_format("name,email");
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec![MISSING_ROWS]);
        assert_eq!(result.line_count, 1);
    }

    #[test]
    fn test_validate_and_parse_leniency_differ() {
        let csv = "name,email\nJane,j@x.com\nbroken";

        assert!(!validate_csv_format(csv).is_valid);
        assert_eq!(parse_csv(csv).len(), 1);
    }

    #[test]
    fn test_decode_upload_strips_bom_and_crlf() {
        let bytes = b"\xEF\xBB\xBFname,email\r\nJane,j@x.com\r\n";
        assert_eq!(decode_upload(bytes), "name,email\nJane,j@x.com\n");
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        assert!(decode_content(bytes, "iso-8859-1").contains("Soci"));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");

        write_csv_file(&path, &[jane()]).unwrap();
        assert_eq!(read_csv_file(&path).unwrap(), vec![jane()]);
        assert!(read_csv_file(dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_export_filename() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(export_filename("leads-export", now), "leads-export-2024-03-05T14-07-09.csv");
    }
}
