//! Interactive job selection
//!
//! Prints cached job rows with their index and reads the user's choice. Input
//! is a list of zero-based indices separated by spaces or commas, inclusive
//! ranges such as `2-4`, or `all`. Anything invalid is a hard error; there is
//! no re-prompt.

use std::io::{BufRead, Write};

use crate::app::models::JobRecord;
use crate::errors::{SelectionError, SelectionResult};

/// Print `rows`, ask which to `task`, and return the chosen indices
pub fn prompt_selection<R, W>(
    rows: &[JobRecord],
    task: &str,
    input: &mut R,
    output: &mut W,
) -> SelectionResult<Vec<usize>>
where
    R: BufRead,
    W: Write,
{
    if rows.is_empty() {
        return Err(SelectionError::NothingToSelect {
            task: task.to_string(),
        });
    }

    let status = rows[0].status;
    writeln!(output)?;
    writeln!(output, "The following jobs are marked as {}:", status)?;
    for (i, row) in rows.iter().enumerate() {
        writeln!(output, "\t{}", format_row(i, row))?;
    }
    writeln!(
        output,
        "Which job(s) would you like to {}? (Enter numbers, ranges like 0-2, or 'all')",
        task
    )?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    parse_selection(&line, rows.len())
}

/// One displayed row
pub fn format_row(index: usize, row: &JobRecord) -> String {
    format!(
        "[{}] RID: {}\tYEAR: {}\tVAR: {}",
        index, row.request_id, row.year, row.variable
    )
}

/// Parse a selection line against `count` rows.
///
/// Returns indices in the order entered, without duplicates.
pub fn parse_selection(line: &str, count: usize) -> SelectionResult<Vec<usize>> {
    let line = line.trim();
    if line.is_empty() {
        return Err(SelectionError::EmptyInput);
    }
    if count == 0 {
        return Err(SelectionError::NothingToSelect {
            task: "select".to_string(),
        });
    }
    let max = count - 1;

    if line.eq_ignore_ascii_case("all") {
        return Ok((0..count).collect());
    }

    let mut selected = Vec::new();
    for token in line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        let (start, end) = match token.split_once('-') {
            Some((a, b)) => (parse_index(a, token)?, parse_index(b, token)?),
            None => {
                let i = parse_index(token, token)?;
                (i, i)
            }
        };
        if start > end {
            return Err(SelectionError::InvalidInput {
                input: token.to_string(),
            });
        }
        if end > max {
            return Err(SelectionError::OutOfRange { index: end, max });
        }
        for i in start..=end {
            if !selected.contains(&i) {
                selected.push(i);
            }
        }
    }

    Ok(selected)
}

fn parse_index(text: &str, token: &str) -> SelectionResult<usize> {
    text.trim()
        .parse::<usize>()
        .map_err(|_| SelectionError::InvalidInput {
            input: token.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::JobStatus;
    use std::io::Cursor;

    fn rows(n: usize) -> Vec<JobRecord> {
        (0..n)
            .map(|i| JobRecord {
                request_id: format!("rid-{}", i),
                status: JobStatus::Successful,
                created: String::new(),
                updated: String::new(),
                year: format!("{}", 2000 + i),
                variable: "2m_temperature".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_single_index() {
        assert_eq!(parse_selection("2\n", 3).unwrap(), vec![2]);
        assert_eq!(parse_selection("0", 1).unwrap(), vec![0]);
    }

    #[test]
    fn test_lists_and_ranges() {
        assert_eq!(parse_selection("0, 2 4", 5).unwrap(), vec![0, 2, 4]);
        assert_eq!(parse_selection("1-3", 5).unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_selection("3 1-3 0", 5).unwrap(), vec![3, 1, 2, 0]);
        assert_eq!(parse_selection("ALL", 3).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_out_of_range() {
        let err = parse_selection("3", 3).unwrap_err();
        assert!(matches!(err, SelectionError::OutOfRange { index: 3, max: 2 }));

        let err = parse_selection("1-7", 3).unwrap_err();
        assert!(matches!(err, SelectionError::OutOfRange { index: 7, .. }));
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(
            parse_selection("two", 3).unwrap_err(),
            SelectionError::InvalidInput { .. }
        ));
        assert!(matches!(
            parse_selection("-1", 3).unwrap_err(),
            SelectionError::InvalidInput { .. }
        ));
        assert!(matches!(
            parse_selection("2-1", 3).unwrap_err(),
            SelectionError::InvalidInput { .. }
        ));
        assert!(matches!(
            parse_selection("   \n", 3).unwrap_err(),
            SelectionError::EmptyInput
        ));
    }

    #[test]
    fn test_prompt_prints_rows_and_reads_choice() {
        let rows = rows(2);
        let mut input = Cursor::new("1\n");
        let mut output = Vec::new();

        let chosen = prompt_selection(&rows, "download", &mut input, &mut output).unwrap();
        assert_eq!(chosen, vec![1]);

        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("marked as successful"));
        assert!(printed.contains("[0] RID: rid-0\tYEAR: 2000\tVAR: 2m_temperature"));
        assert!(printed.contains("[1] RID: rid-1"));
        assert!(printed.contains("like to download?"));
    }

    #[test]
    fn test_prompt_with_no_rows() {
        let mut input = Cursor::new("0\n");
        let mut output = Vec::new();
        let err = prompt_selection(&[], "delete", &mut input, &mut output).unwrap_err();
        assert_eq!(err.to_string(), "No jobs available to delete");
    }
}
