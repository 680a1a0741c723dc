//! The shared tabular parsing algorithm.
//!
//! 1. Split the output into lines and drop the schema's fixed header count.
//! 2. Discard blank lines and lines carrying a known noise marker - progress
//!    and scanner chatter, not data.
//! 3. Split each surviving line on whitespace runs.
//! 4. Reconcile the token count against the schema: extra tokens are merged
//!    (space-joined) into the final column, missing tokens are padded with
//!    empty strings. Lines are never dropped for having the wrong width.
//! 5. Emit one row per surviving line, preserving output order.

use super::schema::TableSchema;
use super::Table;

/// Substrings marking tool chatter rather than tabular data.
pub const NOISE_MARKERS: &[&str] = &[
    "Progress",
    "Scanning",
    "Error",
    "Stacking attempts",
    "PDB scanning finished",
];

/// Returns true for lines that are tool chatter rather than data.
fn is_noise_line(line: &str) -> bool {
    NOISE_MARKERS.iter().any(|marker| line.contains(marker))
}

/// Reconciles a token list against the expected column count.
fn adjust_columns(mut tokens: Vec<String>, expected: usize) -> Vec<String> {
    if tokens.len() > expected {
        let tail = tokens.split_off(expected - 1);
        tokens.push(tail.join(" "));
    } else {
        while tokens.len() < expected {
            tokens.push(String::new());
        }
    }
    tokens
}

/// Parses raw command output into a table per the given schema.
///
/// This is a pure function: the same input always yields the same rows.
/// Zero surviving lines produce an empty row set, not an error.
pub(super) fn parse_table(schema: &TableSchema, raw: &str) -> Table {
    let expected = schema.columns.len();
    let rows = raw
        .lines()
        .skip(schema.header_lines)
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_noise_line(line))
        .map(|line| {
            let tokens = line
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>();
            adjust_columns(tokens, expected)
        })
        .collect();

    Table {
        columns: schema.columns.clone(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(columns: &[&str]) -> TableSchema {
        TableSchema::new("test.cmd", 1, columns)
    }

    #[test]
    fn exact_token_count_is_unchanged() {
        let s = schema(&["A", "B", "C"]);
        let table = parse_table(&s, "header\n1 2 3\n");
        assert_eq!(table.rows, vec![vec!["1", "2", "3"]]);
    }

    #[test]
    fn extra_tokens_merge_into_final_column() {
        // N+2 tokens: the trailing 3 tokens join into the last column.
        let s = schema(&["A", "B", "C"]);
        let table = parse_table(&s, "header\n1 2 three with spaces\n");
        assert_eq!(table.rows, vec![vec!["1", "2", "three with spaces"]]);
    }

    #[test]
    fn missing_tokens_pad_with_empty_strings() {
        let s = schema(&["A", "B", "C"]);
        let table = parse_table(&s, "header\n1 2\n");
        assert_eq!(table.rows, vec![vec!["1", "2", ""]]);
    }

    #[test]
    fn noise_and_blank_lines_are_discarded() {
        // 3 data lines + 1 "Scanning..." line + 1 blank line => 3 rows.
        let s = schema(&["PID", "Name"]);
        let raw = "header\n1 init\nScanning...\n2 sshd\n\n3 bash\n";
        let table = parse_table(&s, raw);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[2], vec!["3", "bash"]);
    }

    #[test]
    fn stderr_section_is_filtered_as_noise() {
        let s = schema(&["PID", "Name"]);
        let raw = "header\n1 init\nError:\nvolatility: unable to read layer\n";
        let table = parse_table(&s, raw);
        // The "Error:" marker line is dropped; the stderr body line carries
        // no marker and survives with its tail merged into the last column.
        assert_eq!(table.rows[0], vec!["1", "init"]);
        assert_eq!(table.rows[1], vec!["volatility:", "unable to read layer"]);
    }

    #[test]
    fn zero_surviving_lines_is_an_empty_row_set() {
        let s = schema(&["A", "B"]);
        let table = parse_table(&s, "header\nProgress: 100.00\n\n");
        assert!(table.rows.is_empty());
    }

    #[test]
    fn parsing_is_pure() {
        let s = schema(&["A", "B", "C"]);
        let raw = "header\n1 2 3\n4 5 6 7 8\n";
        assert_eq!(parse_table(&s, raw), parse_table(&s, raw));
    }

    #[test]
    fn order_is_preserved() {
        let s = schema(&["PID"]);
        let table = parse_table(&s, "header\n3\n1\n2\n");
        let pids: Vec<_> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(pids, ["3", "1", "2"]);
    }
}
