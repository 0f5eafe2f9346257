//! Delimited-text encoding of job database files
//!
//! Every file starts with the fixed header from [`jobdb::HEADER`] followed by one
//! comma separated record per job. Fields containing a comma, a quote or a line
//! break are wrapped in double quotes with inner quotes doubled.

use std::path::Path;

use crate::app::models::{JobRecord, JobStatus};
use crate::constants::jobdb;
use crate::errors::{JobDbError, JobDbResult};

const DELIMITER: char = ',';
const QUOTE: char = '"';

/// Render a full file body for the given records
pub fn render(records: &[JobRecord]) -> String {
    let mut out = String::with_capacity(jobdb::HEADER.len() + records.len() * 96);
    out.push_str(jobdb::HEADER);
    out.push('\n');
    for record in records {
        let fields = [
            record.request_id.as_str(),
            record.status.as_str(),
            record.created.as_str(),
            record.updated.as_str(),
            record.year.as_str(),
            record.variable.as_str(),
        ];
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                out.push(DELIMITER);
            }
            push_field(&mut out, field);
        }
        out.push('\n');
    }
    out
}

fn push_field(out: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|c| c == DELIMITER || c == QUOTE || c == '\n' || c == '\r');
    if !needs_quotes {
        out.push_str(field);
        return;
    }
    out.push(QUOTE);
    for c in field.chars() {
        if c == QUOTE {
            out.push(QUOTE);
        }
        out.push(c);
    }
    out.push(QUOTE);
}

/// Parse a full file body; `path` is only used for error reporting
pub fn parse(path: &Path, content: &str) -> JobDbResult<Vec<JobRecord>> {
    let rows = split_rows(path, content)?;
    let mut rows = rows.into_iter();

    match rows.next() {
        Some((_, header)) if header.join(",") == jobdb::HEADER => {}
        Some((line, header)) => {
            return Err(corrupt(
                path,
                line,
                format!("unexpected header '{}'", header.join(",")),
            ))
        }
        None => return Err(corrupt(path, 1, "missing header".to_string())),
    }

    let mut records = Vec::new();
    for (line, fields) in rows {
        if fields.len() != jobdb::COLUMN_COUNT {
            return Err(corrupt(
                path,
                line,
                format!(
                    "expected {} fields, found {}",
                    jobdb::COLUMN_COUNT,
                    fields.len()
                ),
            ));
        }
        let mut fields = fields.into_iter();
        let mut next = || fields.next().unwrap_or_default();
        let request_id = next();
        let status_text = next();
        let status = status_text
            .parse::<JobStatus>()
            .map_err(|reason| corrupt(path, line, reason))?;
        if request_id.is_empty() {
            return Err(corrupt(path, line, "empty request_id".to_string()));
        }
        records.push(JobRecord {
            request_id,
            status,
            created: next(),
            updated: next(),
            year: next(),
            variable: next(),
        });
    }

    Ok(records)
}

/// Split content into rows of fields, keeping the starting line of each row.
/// Blank lines outside quotes are skipped.
fn split_rows(path: &Path, content: &str) -> JobDbResult<Vec<(usize, Vec<String>)>> {
    let mut rows = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // A closed quoted field may only be followed by a delimiter or line end
    let mut quote_closed = false;
    let mut field_started = false;
    let mut line = 1;
    let mut row_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    field.push(QUOTE);
                }
                QUOTE => {
                    in_quotes = false;
                    quote_closed = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        if quote_closed && !matches!(c, DELIMITER | '\r' | '\n') {
            return Err(corrupt(
                path,
                line,
                "unexpected character after quoted field".to_string(),
            ));
        }

        match c {
            QUOTE if field.is_empty() => {
                in_quotes = true;
                field_started = true;
            }
            QUOTE => return Err(corrupt(path, line, "unexpected quote".to_string())),
            DELIMITER => {
                fields.push(std::mem::take(&mut field));
                field_started = true;
                quote_closed = false;
            }
            '\r' => {}
            '\n' => {
                quote_closed = false;
                if field_started || !field.is_empty() {
                    fields.push(std::mem::take(&mut field));
                    rows.push((row_line, std::mem::take(&mut fields)));
                }
                field_started = false;
                line += 1;
                row_line = line;
            }
            _ => {
                field.push(c);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(corrupt(path, row_line, "unterminated quoted field".to_string()));
    }
    if field_started || !field.is_empty() {
        fields.push(field);
        rows.push((row_line, fields));
    }

    Ok(rows)
}

fn corrupt(path: &Path, line: usize, reason: String) -> JobDbError {
    JobDbError::Corrupt {
        path: path.to_path_buf(),
        line,
        reason,
    }
}
