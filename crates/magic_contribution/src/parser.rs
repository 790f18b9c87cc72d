//! Tab-delimited contribution text parser.
//!
//! # Format
//!
//! ```text
//! MagIC upload file                     <- first line, ignored
//! tab<TAB>er_sites                      <- table definition
//! er_site_name<TAB>site_lat             <- column names
//! site_A<TAB>1.1                        <- data rows ...
//! >>>>>>>>>>                            <- end of table
//! tab<TAB>er_samples
//! ...
//! ```
//!
//! Malformed content never fails the parse. A bad table definition or column
//! line skips the rest of that table block; a row with too many values is
//! dropped. Every problem is recorded in the parser's [`Diagnostics`].

use crate::contribution::Contribution;
use crate::diagnostics::{Diagnostic, DiagnosticContext, Diagnostics};
use crate::row::Row;
use std::collections::BTreeSet;
use tracing::debug;

/// Where the parser is within the current table block.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ParserState {
    AwaitingTableName,
    AwaitingColumnNames { table: String },
    ReadingRows { table: String, columns: Vec<String> },
    /// The block was rejected; ignore lines until the next terminator.
    SkippingTable,
}

/// Parses contribution text, accumulating diagnostics across calls.
#[derive(Debug, Default)]
pub struct ContributionParser {
    diagnostics: Diagnostics,
}

impl ContributionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` into a fresh contribution.
    pub fn parse(&mut self, text: &str) -> Contribution {
        let mut contribution = Contribution::new();

        if text.trim().is_empty() {
            self.diagnostics
                .push(Diagnostic::warning("Contribution text is empty."));
            return contribution;
        }

        let mut state = ParserState::AwaitingTableName;
        for (line_number, line) in content_lines(text).skip(1) {
            state = if is_terminator(line) {
                ParserState::AwaitingTableName
            } else {
                self.advance(state, line, line_number, &mut contribution)
            };
        }

        for (table, rows) in contribution.tables() {
            if rows.is_empty() {
                self.diagnostics.warn(
                    format!("No data values were found in the {} table.", table),
                    Some(DiagnosticContext::table(table)),
                );
            }
        }

        debug!(
            tables = contribution.len(),
            rows = contribution.row_count(),
            errors = self.diagnostics.errors().len(),
            "parsed contribution"
        );
        contribution
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        self.diagnostics.warnings()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        self.diagnostics.errors()
    }

    fn advance(
        &mut self,
        state: ParserState,
        line: &str,
        line_number: usize,
        contribution: &mut Contribution,
    ) -> ParserState {
        match state {
            ParserState::AwaitingTableName => match self.read_table_name(line, line_number) {
                Some(table) => {
                    contribution.ensure_table(&table);
                    ParserState::AwaitingColumnNames { table }
                }
                None => ParserState::SkippingTable,
            },
            ParserState::AwaitingColumnNames { table } => {
                match self.read_column_names(&table, line, line_number) {
                    Some(columns) => ParserState::ReadingRows { table, columns },
                    None => ParserState::SkippingTable,
                }
            }
            ParserState::ReadingRows { table, columns } => {
                if let Some(row) = self.read_row(&table, &columns, line, line_number) {
                    contribution.push_row(&table, row);
                }
                ParserState::ReadingRows { table, columns }
            }
            ParserState::SkippingTable => ParserState::SkippingTable,
        }
    }

    fn read_table_name(&mut self, line: &str, line_number: usize) -> Option<String> {
        let fields = split_fields(line);
        let ctx = Some(DiagnosticContext::line(line_number));

        if fields.len() < 2 {
            self.diagnostics.error(
                "Invalid table definition. Expected something like \"tab[tab]measurements\".",
                ctx,
            );
            return None;
        }

        if !fields[0].to_ascii_lowercase().starts_with("tab") {
            self.diagnostics.error(
                format!(
                    "Unrecognized column delimiter \"{}\". Expected \"tab\".",
                    fields[0]
                ),
                ctx,
            );
            return None;
        }

        if fields[1].is_empty() {
            self.diagnostics
                .error("No table name following tab delimiter.", ctx);
            return None;
        }

        Some(fields[1].to_string())
    }

    fn read_column_names(
        &mut self,
        table: &str,
        line: &str,
        line_number: usize,
    ) -> Option<Vec<String>> {
        let columns = split_fields(line);
        let ctx = Some(DiagnosticContext::table(table).with_line(line_number));

        if columns.iter().all(|c| c.is_empty()) {
            self.diagnostics.error("No column names found.", ctx);
            return None;
        }

        if columns.iter().any(|c| c.is_empty()) {
            self.diagnostics
                .error("Empty column names are not allowed.", ctx);
            return None;
        }

        let mut seen = BTreeSet::new();
        let duplicates: BTreeSet<&str> = columns
            .iter()
            .copied()
            .filter(|c| !seen.insert(*c))
            .collect();
        if !duplicates.is_empty() {
            let names: Vec<&str> = duplicates.into_iter().collect();
            self.diagnostics.error(
                format!("Found duplicate column names: {}.", names.join(", ")),
                ctx,
            );
            return None;
        }

        Some(columns.into_iter().map(str::to_string).collect())
    }

    fn read_row(
        &mut self,
        table: &str,
        columns: &[String],
        line: &str,
        line_number: usize,
    ) -> Option<Row> {
        let values = split_fields(line);

        if values.len() > columns.len() {
            self.diagnostics.error(
                format!(
                    "More values found than columns. Expected at most {} but found {}.",
                    columns.len(),
                    values.len()
                ),
                Some(DiagnosticContext::table(table).with_line(line_number)),
            );
            return None;
        }

        Some(columns.iter().cloned().zip(values).collect())
    }
}

/// Parse `text` with a fresh parser.
pub fn parse_contribution(text: &str) -> (Contribution, Diagnostics) {
    let mut parser = ContributionParser::new();
    let contribution = parser.parse(text);
    (contribution, parser.into_diagnostics())
}

/// Non-empty lines with their 1-based physical line numbers.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .flat_map(|(idx, line)| line.split('\r').map(move |part| (idx + 1, part)))
        .filter(|(_, line)| !line.is_empty())
}

fn is_terminator(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c == '>')
}

fn split_fields(line: &str) -> Vec<&str> {
    line.split('\t').map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANNER: &str = "tab delimited\tMagIC upload\n";

    fn parse(body: &str) -> (Contribution, Diagnostics) {
        parse_contribution(&format!("{}{}", BANNER, body))
    }

    #[test]
    fn test_single_table() {
        let (c, d) = parse("tab\ter_sites\ner_site_name\tsite_lat\nsite_A\t1.1\nsite_B\t\n");
        assert!(d.is_empty(), "unexpected diagnostics: {:?}", d);
        let rows = c.table("er_sites").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Row::from([("er_site_name", "site_A"), ("site_lat", "1.1")]));
        // Empty values are omitted, not stored as ""
        assert_eq!(rows[1], Row::from([("er_site_name", "site_B")]));
    }

    #[test]
    fn test_first_line_is_always_discarded() {
        let (c, d) = parse_contribution("tab\tfirst\ntab\ter_sites\nname\nx\n");
        assert!(!c.contains_table("first"));
        assert_eq!(c.table("er_sites").unwrap().len(), 1);
        assert!(d.is_empty());
    }

    #[test]
    fn test_terminator_starts_new_table() {
        let (c, d) = parse(
            "tab\ter_sites\ner_site_name\nsite_A\n>>>>>>>>>>\ntab\ter_samples\ner_sample_name\nsample_A\n",
        );
        assert!(d.is_empty());
        assert_eq!(c.table_names().collect::<Vec<_>>(), vec!["er_sites", "er_samples"]);
    }

    #[test]
    fn test_short_values_and_whitespace() {
        let (c, _) = parse("tab\tt\n a \t b \t c \n 1 \t 2 \n");
        assert_eq!(c.table("t").unwrap()[0], Row::from([("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_too_many_values_drops_row() {
        let (c, d) = parse("tab\tt\na\tb\n1\t2\t3\n4\t5\n");
        assert_eq!(c.table("t").unwrap(), &[Row::from([("a", "4"), ("b", "5")])]);
        assert_eq!(d.errors().len(), 1);
        assert!(d.errors()[0].message.starts_with("More values found than columns."));
        assert_eq!(d.errors()[0].context.as_ref().unwrap().line, Some(4));
    }

    #[test]
    fn test_invalid_table_definition_skips_block() {
        let (c, d) = parse("measurements\na\tb\n1\t2\n>>>\ntab\tt\nx\n1\n");
        assert_eq!(d.errors().len(), 1);
        assert!(d.errors()[0].message.starts_with("Invalid table definition."));
        assert_eq!(c.table_names().collect::<Vec<_>>(), vec!["t"]);
    }

    #[test]
    fn test_unrecognized_delimiter() {
        let (c, d) = parse("comma\tsites\na\n1\n");
        assert!(c.is_empty());
        assert_eq!(
            d.errors()[0].message,
            "Unrecognized column delimiter \"comma\". Expected \"tab\"."
        );
    }

    #[test]
    fn test_delimiter_is_case_insensitive() {
        let (c, d) = parse("TAB\tsites\na\n1\n");
        assert!(d.is_empty());
        assert!(c.contains_table("sites"));
    }

    #[test]
    fn test_missing_table_name() {
        let (c, d) = parse("tab\t \na\n1\n");
        assert!(c.is_empty());
        assert_eq!(d.errors()[0].message, "No table name following tab delimiter.");
    }

    #[test]
    fn test_bad_column_names() {
        let (_, d) = parse("tab\tt\na\t\tb\n1\t2\t3\n");
        assert_eq!(d.errors()[0].message, "Empty column names are not allowed.");

        let (c, d) = parse("tab\tt\na\tb\ta\n1\t2\t3\n");
        assert_eq!(d.errors()[0].message, "Found duplicate column names: a.");
        // The table was registered before its columns were rejected
        assert_eq!(c.table("t").map(|rows| rows.len()), Some(0));
        assert_eq!(d.warnings().len(), 1);
    }

    #[test]
    fn test_blank_header_has_no_column_names() {
        for header in ["   ", " \t \t"] {
            let (_, d) = parse(&format!("tab\tt\n{}\n1\n", header));
            assert_eq!(d.errors().len(), 1, "header {:?}: {:?}", header, d);
            assert_eq!(d.errors()[0].message, "No column names found.");
            assert_eq!(
                d.errors()[0].context.as_ref().and_then(|c| c.line),
                Some(3)
            );
        }
    }

    #[test]
    fn test_empty_table_warning() {
        let (c, d) = parse("tab\tsites\nsite\tlat\n");
        assert_eq!(c.table("sites").map(|rows| rows.len()), Some(0));
        assert!(d.errors().is_empty());
        assert_eq!(d.warnings().len(), 1);
        assert_eq!(d.warnings()[0].message, "No data values were found in the sites table.");
        assert_eq!(
            d.warnings()[0].context.as_ref().and_then(|c| c.table.as_deref()),
            Some("sites")
        );
    }

    #[test]
    fn test_empty_text() {
        let (c, d) = parse_contribution("");
        assert!(c.is_empty());
        assert_eq!(d.warnings()[0].message, "Contribution text is empty.");
        assert!(d.errors().is_empty());
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let (c, d) = parse_contribution("banner\r\n\r\ntab\tt\r\na\r\n\r\n1\r\n2\r\n");
        assert!(d.is_empty());
        assert_eq!(c.table("t").unwrap().len(), 2);
    }

    #[test]
    fn test_repeated_table_blocks_append() {
        let (c, _) = parse("tab\tt\na\n1\n>>>>\ntab\tt\nb\n2\n");
        assert_eq!(
            c.table("t").unwrap(),
            &[Row::from([("a", "1")]), Row::from([("b", "2")])]
        );
    }

    #[test]
    fn test_skipping_ignores_table_definitions() {
        let mut parser = ContributionParser::new();
        let state = parser.advance(
            ParserState::SkippingTable,
            "tab\tt",
            2,
            &mut Contribution::new(),
        );
        assert_eq!(state, ParserState::SkippingTable);
        assert!(is_terminator(">"));
        assert!(is_terminator(">>>>>>>>>>"));
        assert!(!is_terminator(">> "));
    }
}
