//! Row transforms bound to a single version step.
//!
//! Lineage alone cannot express every upgrade. Going from 2.5 to 3.0, result
//! tables lose their contribution-level rows and each remaining result row
//! belongs to exactly one of the new `locations`/`sites`/`samples`/`specimens`
//! tables, chosen by which name columns it carries. Those decisions live here
//! as [`StepRule`]s, consulted before a row's columns are routed.

use magic_contribution::Row;
use magic_protocol::DataModelVersion;
use std::fmt;
use tracing::debug;

/// What to do with one old row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowDirective {
    /// Route the row normally.
    Keep,
    /// Drop the row.
    Delete { reason: String },
    /// Route the row, keeping only destinations in `table`.
    RouteTo { table: String },
}

/// A named row transform for one version step.
pub trait StepRule: Send + Sync {
    fn name(&self) -> &str;

    /// Release the step starts from.
    fn from_version(&self) -> &str;

    /// Release the step produces.
    fn to_version(&self) -> &str;

    /// Old tables the rule looks at.
    fn tables(&self) -> &[&str];

    fn apply(&self, table: &str, row: &Row) -> RowDirective;

    fn applies(&self, from: &DataModelVersion, to: &DataModelVersion, table: &str) -> bool {
        self.tables().iter().any(|t| *t == table)
            && DataModelVersion::parse(self.from_version()).is_ok_and(|v| &v == from)
            && DataModelVersion::parse(self.to_version()).is_ok_and(|v| &v == to)
    }
}

/// Ordered rules for all steps.
#[derive(Default)]
pub struct StepRuleSet {
    rules: Vec<Box<dyn StepRule>>,
}

impl StepRuleSet {
    /// No rules: upgrades follow lineage only.
    pub fn new() -> Self {
        Self::default()
    }

    /// The rules MagIC releases need.
    pub fn defaults() -> Self {
        Self::new()
            .with_rule(ContributionLevelResults)
            .with_rule(ResultLevel)
    }

    pub fn with_rule(mut self, rule: impl StepRule + 'static) -> Self {
        self.push(rule);
        self
    }

    pub fn push(&mut self, rule: impl StepRule + 'static) {
        self.rules.push(Box::new(rule));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|rule| rule.name())
    }

    /// Run every rule for this step and table, in order.
    ///
    /// The first `Delete` wins outright. Otherwise the first `RouteTo` picks
    /// the table; later routes are ignored.
    pub fn apply(
        &self,
        from: &DataModelVersion,
        to: &DataModelVersion,
        table: &str,
        row: &Row,
    ) -> RowDirective {
        let mut route = None;
        for rule in self.rules.iter().filter(|r| r.applies(from, to, table)) {
            match rule.apply(table, row) {
                RowDirective::Keep => {}
                RowDirective::Delete { reason } => {
                    debug!(rule = rule.name(), table, reason = %reason, "row deleted by step rule");
                    return RowDirective::Delete { reason };
                }
                RowDirective::RouteTo { table: target } => {
                    if route.is_none() {
                        debug!(rule = rule.name(), table, target = %target, "row routed by step rule");
                        route = Some(target);
                    }
                }
            }
        }
        match route {
            Some(table) => RowDirective::RouteTo { table },
            None => RowDirective::Keep,
        }
    }
}

impl fmt::Debug for StepRuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

const RESULT_TABLES: &[&str] = &["pmag_results", "rmag_results"];

/// Name columns of a 2.5 result row, finest level first, with the 3.0 table
/// for a single name and for several names.
const RESULT_LEVELS: &[(&str, &str, &str)] = &[
    ("er_specimen_names", "specimens", "samples"),
    ("er_sample_names", "samples", "sites"),
    ("er_site_names", "sites", "locations"),
    ("er_location_names", "locations", "locations"),
];

/// Number of colon-separated names in a `*_names` value.
fn name_count(value: Option<&str>) -> usize {
    value.map_or(0, |v| {
        v.split(':').filter(|name| !name.trim().is_empty()).count()
    })
}

/// 2.5 -> 3.0: results not tied to any location, site, sample or specimen
/// have no place in 3.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContributionLevelResults;

impl StepRule for ContributionLevelResults {
    fn name(&self) -> &str {
        "contribution_level_results"
    }

    fn from_version(&self) -> &str {
        "2.5"
    }

    fn to_version(&self) -> &str {
        "3.0"
    }

    fn tables(&self) -> &[&str] {
        RESULT_TABLES
    }

    fn apply(&self, _table: &str, row: &Row) -> RowDirective {
        let named = RESULT_LEVELS
            .iter()
            .any(|&(column, _, _)| name_count(row.get(column)) > 0);
        if named {
            RowDirective::Keep
        } else {
            RowDirective::Delete {
                reason: "contribution level result".to_string(),
            }
        }
    }
}

/// 2.5 -> 3.0: a result row goes to the table of its finest named level.
///
/// One specimen name makes a specimen result; several specimen names make a
/// result for their sample. The same holds one level up for samples and
/// sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultLevel;

impl ResultLevel {
    pub fn level(row: &Row) -> &'static str {
        for &(column, single, plural) in RESULT_LEVELS {
            match name_count(row.get(column)) {
                0 => continue,
                1 => return single,
                _ => return plural,
            }
        }
        "locations"
    }
}

impl StepRule for ResultLevel {
    fn name(&self) -> &str {
        "result_level"
    }

    fn from_version(&self) -> &str {
        "2.5"
    }

    fn to_version(&self) -> &str {
        "3.0"
    }

    fn tables(&self) -> &[&str] {
        RESULT_TABLES
    }

    fn apply(&self, _table: &str, row: &Row) -> RowDirective {
        RowDirective::RouteTo {
            table: Self::level(row).to_string(),
        }
    }
}
