//! Minimal CSV parsing for replay sources.
//!
//! Expected layout: a header row followed by one record per line, e.g.
//! `ts,machine_id,actuator_id,motor_temp_c,motor_rpm,motor_vibration_rms`.
//! Double-quoted fields with `""` escapes are supported; embedded newlines
//! are not.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::reading::RawReading;

/// One data row, keyed by header name.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRecord {
    /// 1-based line number in the source (the header is line 1).
    pub line: usize,
    pub fields: HashMap<String, String>,
}

impl CsvRecord {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// View the record as an untyped reading. Blank cells count as missing.
    pub fn to_raw_reading(&self) -> RawReading {
        RawReading::from_text(|name| self.get(name).filter(|v| !v.trim().is_empty()))
    }
}

/// Parse CSV text into records keyed by the header row.
///
/// Blank lines are skipped. Rows shorter than the header leave the missing
/// columns absent; extra cells are ignored.
pub fn parse_csv(text: &str) -> Result<Vec<CsvRecord>, CoreError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.lines().enumerate();

    let header_line = lines
        .by_ref()
        .find(|(_, l)| !l.trim().is_empty())
        .map(|(_, l)| l)
        .ok_or_else(|| CoreError::Validation("CSV is empty".into()))?;

    let headers: Vec<String> = parse_csv_line(header_line)
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CoreError::Validation("CSV header row is empty".into()));
    }

    let mut records = Vec::new();

    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let values = parse_csv_line(line);
        let fields = headers
            .iter()
            .zip(values)
            .filter(|(h, _)| !h.is_empty())
            .map(|(h, v)| (h.clone(), v))
            .collect();

        records.push(CsvRecord {
            line: idx + 1,
            fields,
        });
    }

    Ok(records)
}

/// Split a single CSV line, honouring double quotes.
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == ',' {
            result.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    result.push(current);
    result
}
