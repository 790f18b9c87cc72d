//! Walks a contribution up the data model version chain.

use crate::reconcile::{stage_row, ReconciledTables};
use crate::rules::{RowDirective, StepRuleSet};
use magic_contribution::{Contribution, Diagnostic, DiagnosticContext, Diagnostics, Row};
use magic_protocol::{DataModelVersion, METADATA_TABLE, VERSION_COLUMN};
use magic_schema::{build_upgrade_map, SchemaRegistry, SchemaVersion, TableUpgradeMap};
use tracing::{debug, info, info_span};

/// Upgrades contributions, one release at a time, up to a target release.
///
/// Problems with individual tables, columns and rows are recorded as
/// diagnostics and the offending element is dropped. Only an unreadable
/// version tag or an unusable target release stops an upgrade; the input is
/// then returned untouched.
#[derive(Debug)]
pub struct ContributionUpgrader<'a> {
    registry: &'a SchemaRegistry,
    rules: StepRuleSet,
    diagnostics: Diagnostics,
}

impl<'a> ContributionUpgrader<'a> {
    /// An upgrader with the default step rules.
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self {
            registry,
            rules: StepRuleSet::defaults(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Replace the step rules
    pub fn with_rules(mut self, rules: StepRuleSet) -> Self {
        self.rules = rules;
        self
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

    /// Upgrade to the newest registered release.
    pub fn upgrade_to_latest(&mut self, contribution: Contribution) -> Contribution {
        match self.registry.latest() {
            Some(latest) => {
                let latest = latest.as_str().to_string();
                self.upgrade(contribution, &latest)
            }
            None => {
                self.diagnostics
                    .error("No MagIC data model versions are available.", None);
                contribution
            }
        }
    }

    /// Upgrade `contribution` through every release after its own, stopping
    /// at `max_version`.
    pub fn upgrade(&mut self, contribution: Contribution, max_version: &str) -> Contribution {
        let Some(current) = self.current_version(&contribution) else {
            return contribution;
        };

        let max = match self.registry.resolve(max_version) {
            Some(max) if *max >= current => max.clone(),
            _ => {
                let known: Vec<&str> = self
                    .registry
                    .versions()
                    .filter(|v| **v >= current)
                    .map(|v| v.as_str())
                    .collect();
                self.diagnostics.error(
                    format!(
                        "The second argument (maximum version \"{}\") is invalid. Expected one of: {}.",
                        max_version,
                        known.join(", ")
                    ),
                    None,
                );
                return contribution;
            }
        };

        let steps: Vec<DataModelVersion> = self
            .registry
            .steps(&current, &max)
            .into_iter()
            .cloned()
            .collect();

        let registry = self.registry;
        let mut from = current;
        let mut working = contribution;
        for next in steps {
            let Some(next_schema) = registry.get(&next) else {
                continue;
            };
            let _span = info_span!("upgrade_step", from = %from, to = %next).entered();
            working = self.upgrade_step(&working, &from, &next, next_schema);
            info!(
                tables = working.len(),
                rows = working.row_count(),
                "upgraded contribution"
            );
            from = next;
        }
        working
    }

    /// The registered release named by the metadata row, or a recorded error.
    fn current_version(&mut self, contribution: &Contribution) -> Option<DataModelVersion> {
        let rows = match contribution.table(METADATA_TABLE) {
            Some(rows) if !rows.is_empty() => rows,
            _ => {
                self.diagnostics.error(
                    format!(
                        "Failed to find the \"{}\" table. Expected one row with a \"{}\" column.",
                        METADATA_TABLE, VERSION_COLUMN
                    ),
                    None,
                );
                return None;
            }
        };

        if rows.len() > 1 {
            self.diagnostics.error(
                format!(
                    "The \"{}\" table has {} rows. Expected exactly one.",
                    METADATA_TABLE,
                    rows.len()
                ),
                Some(DiagnosticContext::table(METADATA_TABLE)),
            );
            return None;
        }

        let Some(tag) = rows[0].get(VERSION_COLUMN) else {
            self.diagnostics.error(
                format!(
                    "Failed to find the \"{}\" column in the \"{}\" table.",
                    VERSION_COLUMN, METADATA_TABLE
                ),
                Some(DiagnosticContext::table(METADATA_TABLE).with_column(VERSION_COLUMN)),
            );
            return None;
        };

        match self.registry.resolve(tag) {
            Some(version) => Some(version.clone()),
            None => {
                self.diagnostics.error(
                    format!("MagIC data model version \"{}\" is not supported.", tag),
                    Some(DiagnosticContext::table(METADATA_TABLE).with_column(VERSION_COLUMN)),
                );
                None
            }
        }
    }

    /// One release step: `working` is at `from`, the result is at `next`.
    fn upgrade_step(
        &mut self,
        working: &Contribution,
        from: &DataModelVersion,
        next: &DataModelVersion,
        next_schema: &SchemaVersion,
    ) -> Contribution {
        let registry = self.registry;
        let map = build_upgrade_map(next_schema);
        let from_schema = registry.get(from);
        let no_routes = TableUpgradeMap::default();

        let mut output = ReconciledTables::new();
        output.reserve(METADATA_TABLE);

        for (table, rows) in working.tables() {
            let is_metadata = table == METADATA_TABLE;
            let table_map = match map.table(table) {
                Some(table_map) => table_map,
                None if is_metadata => &no_routes,
                None => {
                    self.report_missing_table(table, next);
                    continue;
                }
            };

            for (index, row) in rows.iter().enumerate() {
                self.upgrade_row(table, index + 1, row, table_map, from, next, from_schema, &mut output);
            }
        }

        match output.table_mut(METADATA_TABLE) {
            Some(rows) if !rows.is_empty() => {
                for row in rows.iter_mut() {
                    row.insert(VERSION_COLUMN, next.as_str());
                }
            }
            _ => {
                output.add(METADATA_TABLE, Row::from([(VERSION_COLUMN, next.as_str())]));
            }
        }

        output.into_contribution()
    }

    #[allow(clippy::too_many_arguments)]
    fn upgrade_row(
        &mut self,
        table: &str,
        row_number: usize,
        row: &Row,
        table_map: &TableUpgradeMap,
        from: &DataModelVersion,
        next: &DataModelVersion,
        from_schema: Option<&SchemaVersion>,
        output: &mut ReconciledTables,
    ) {
        let is_metadata = table == METADATA_TABLE;

        let only_table = match self.rules.apply(from, next, table, row) {
            RowDirective::Keep => None,
            RowDirective::RouteTo { table } => Some(table),
            RowDirective::Delete { .. } => {
                self.report_deleted_row(table, row_number, next);
                return;
            }
        };

        let staged = if is_metadata {
            let mut row = row.clone();
            row.remove(VERSION_COLUMN);
            stage_row(&row, table_map, only_table.as_deref())
        } else {
            stage_row(row, table_map, only_table.as_deref())
        };

        for column in &staged.unmapped {
            self.report_missing_column(table, column, from_schema, next);
        }
        if staged.dropped > 0 {
            debug!(
                table,
                row = row_number,
                dropped = staged.dropped,
                "destinations outside the row's level dropped"
            );
        }

        if staged.is_deleted() {
            if !is_metadata {
                self.report_deleted_row(table, row_number, next);
            }
            return;
        }

        for (new_table, draft) in staged.drafts {
            let placement = output.add(&new_table, draft);
            debug!(table, row = row_number, new_table = %new_table, ?placement, "row routed");
        }
    }

    /// A table the next release does not route is an error, even when the
    /// previous release defined it.
    fn report_missing_table(&mut self, table: &str, next: &DataModelVersion) {
        self.diagnostics.error(
            format!(
                "Table \"{}\" is not defined in MagIC data model version {}.",
                table, next
            ),
            Some(DiagnosticContext::table(table)),
        );
    }

    fn report_missing_column(
        &mut self,
        table: &str,
        column: &str,
        from_schema: Option<&SchemaVersion>,
        next: &DataModelVersion,
    ) {
        let ctx = Some(DiagnosticContext::table(table).with_column(column));
        if from_schema.is_some_and(|s| s.has_column(table, column)) {
            self.diagnostics.warn(
                format!(
                    "Column \"{}\" in table \"{}\" was deleted in MagIC data model version {}.",
                    column, table, next
                ),
                ctx,
            );
        } else {
            self.diagnostics.error(
                format!(
                    "Column \"{}\" in table \"{}\" is not defined in MagIC data model version {}.",
                    column, table, next
                ),
                ctx,
            );
        }
    }

    fn report_deleted_row(&mut self, table: &str, row_number: usize, next: &DataModelVersion) {
        self.diagnostics.warn(
            format!(
                "Row {} in table \"{}\" was deleted in MagIC data model version {}.",
                row_number, table, next
            ),
            Some(DiagnosticContext::table(table).with_row(row_number)),
        );
    }
}

/// Upgrade with a fresh upgrader and the default step rules.
pub fn upgrade_contribution(
    registry: &SchemaRegistry,
    contribution: Contribution,
    max_version: &str,
) -> (Contribution, Diagnostics) {
    let mut upgrader = ContributionUpgrader::new(registry);
    let upgraded = upgrader.upgrade(contribution, max_version);
    (upgraded, upgrader.into_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;
    use magic_schema::{ColumnDef, ColumnRef, TableDef};

    fn v(tag: &str) -> DataModelVersion {
        DataModelVersion::parse(tag).unwrap()
    }

    /// 1.0: `things {name, size}` and `legacy {x}`; 2.0: `items {name}` and a
    /// new `extras` table.
    fn registry() -> SchemaRegistry {
        let v1 = SchemaVersion::new(v("1.0"))
            .with_table(
                METADATA_TABLE,
                TableDef::new().with_column(VERSION_COLUMN, ColumnDef::new()),
            )
            .with_table(
                "things",
                TableDef::new()
                    .with_column("name", ColumnDef::new())
                    .with_column("size", ColumnDef::new()),
            )
            .with_table("legacy", TableDef::new().with_column("x", ColumnDef::new()));
        let v2 = SchemaVersion::new(v("2.0"))
            .with_table(
                "items",
                TableDef::new().with_column(
                    "name",
                    ColumnDef::from_previous([ColumnRef::new("things", "name")]),
                ),
            )
            .with_table("extras", TableDef::new().with_column("note", ColumnDef::new()));
        SchemaRegistry::new()
            .with_schema(v1)
            .and_then(|r| r.with_schema(v2))
            .unwrap()
    }

    fn contribution(tag: &str, things: &[&[(&str, &str)]]) -> Contribution {
        let mut c = Contribution::new();
        c.push_row(METADATA_TABLE, Row::from([(VERSION_COLUMN, tag)]));
        for pairs in things {
            c.push_row("things", pairs.iter().copied().collect());
        }
        c
    }

    #[test]
    fn test_metadata_row_is_retagged_and_first() {
        let registry = registry();
        let (out, diagnostics) =
            upgrade_contribution(&registry, contribution("1.0", &[&[("name", "a")]]), "2.0");

        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        assert_eq!(out.table_names().collect::<Vec<_>>(), vec![METADATA_TABLE, "items"]);
        assert_eq!(out.version_tag(), Some("2.0"));
    }

    #[test]
    fn test_deleted_column_and_row() {
        let registry = registry();
        let input = contribution("1.0", &[&[("name", "a"), ("size", "3")], &[("size", "4")]]);
        let mut upgrader = ContributionUpgrader::new(&registry);
        let out = upgrader.upgrade(input, "2.0");

        assert!(upgrader.errors().is_empty());
        let messages: Vec<&str> = upgrader.warnings().iter().map(|w| w.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Column \"size\" in table \"things\" was deleted in MagIC data model version 2.0.",
                "Row 2 in table \"things\" was deleted in MagIC data model version 2.0.",
            ]
        );
        assert_eq!(out.table("items").unwrap(), &[Row::from([("name", "a")])]);
    }

    #[test]
    fn test_undefined_table_reported_once() {
        let registry = registry();
        let mut input = contribution("1.0", &[]);
        input.push_row("gadgets", Row::from([("x", "1")]));
        input.push_row("gadgets", Row::from([("y", "2")]));

        let (out, diagnostics) = upgrade_contribution(&registry, input, "2.0");
        assert_eq!(diagnostics.errors().len(), 1);
        assert_eq!(
            diagnostics.errors()[0].message,
            "Table \"gadgets\" is not defined in MagIC data model version 2.0."
        );
        assert!(diagnostics.warnings().is_empty());
        assert!(!out.contains_table("gadgets"));
    }

    #[test]
    fn test_unrouted_table_of_previous_release_is_an_error() {
        let registry = registry();
        let mut input = contribution("1.0", &[&[("name", "a")]]);
        input.push_row("legacy", Row::from([("x", "1")]));

        let (out, diagnostics) = upgrade_contribution(&registry, input, "2.0");
        let errors: Vec<&str> = diagnostics.errors().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            errors,
            vec!["Table \"legacy\" is not defined in MagIC data model version 2.0."]
        );
        assert!(diagnostics.warnings().is_empty());
        assert!(!out.contains_table("legacy"));
        assert_eq!(out.table("items").unwrap(), &[Row::from([("name", "a")])]);
    }

    #[test]
    fn test_fatal_conditions_return_input() {
        let registry = registry();

        let input = contribution("1.0", &[&[("name", "a")]]);
        let (out, d) = upgrade_contribution(&registry, input.clone(), "0.5");
        assert_eq!(out, input);
        assert!(d.errors()[0].message.starts_with("The second argument (maximum version \"0.5\") is invalid."));

        let (out, d) = upgrade_contribution(&registry, input.clone(), "latest");
        assert_eq!(out, input);
        assert_eq!(d.errors().len(), 1);

        let unknown = contribution("9.9", &[]);
        let (out, d) = upgrade_contribution(&registry, unknown.clone(), "2.0");
        assert_eq!(out, unknown);
        assert_eq!(d.errors()[0].message, "MagIC data model version \"9.9\" is not supported.");

        let mut doubled = contribution("1.0", &[]);
        doubled.push_row(METADATA_TABLE, Row::from([(VERSION_COLUMN, "1.0")]));
        let (out, d) = upgrade_contribution(&registry, doubled.clone(), "2.0");
        assert_eq!(out, doubled);
        assert_eq!(d.errors().len(), 1);

        let untagged: Contribution = [(METADATA_TABLE, vec![Row::from([("id", "1")])])]
            .into_iter()
            .collect();
        let (_, d) = upgrade_contribution(&registry, untagged, "2.0");
        assert!(d.errors()[0].message.contains("magic_version"));

        let (_, d) = upgrade_contribution(&registry, Contribution::new(), "2.0");
        assert!(d.errors()[0].message.starts_with("Failed to find the \"contribution\" table."));
    }

    #[test]
    fn test_upgrade_to_latest() {
        let registry = registry();
        let mut upgrader = ContributionUpgrader::new(&registry);
        let out = upgrader.upgrade_to_latest(contribution("1.0", &[]));
        assert_eq!(out.version_tag(), Some("2.0"));

        let empty = SchemaRegistry::new();
        let mut upgrader = ContributionUpgrader::new(&empty);
        upgrader.upgrade_to_latest(contribution("1.0", &[]));
        assert_eq!(upgrader.errors().len(), 1);
    }
}
