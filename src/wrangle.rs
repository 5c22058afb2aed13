//! The reshape engine: per-file column plans, the one-to-one merge of every
//! selected table, and the grouped unpivot into long form.
//!
//! The flow for one run is
//!
//! 1. [`ColumnPlan::build`] resolves every config row of a table's file code
//!    into an output column name (naming mode, then affix).
//! 2. [`project`] keeps the key column plus the planned columns and renames them.
//! 3. [`merge`] joins the projected tables left to right on the key, rejecting
//!    duplicate keys.
//! 4. [`group_columns`] folds the recorded [`ColumnDetail`]s into ordered groups
//!    and [`pivot`] melts each group before concatenating them row-wise.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    cli::{AffixMode, NamingMode},
    error::WrangleError,
    frame::Frame,
    mapping::MappingRow,
};

/// `"{geo_type}_CODE_{year}"`, the geography identifier shared by every table.
pub fn primary_key_column(geo_type: &str, year: i32) -> String {
    format!("{geo_type}_CODE_{year}")
}

pub fn resolve_column_name(
    row: &MappingRow,
    file_code: &str,
    naming: NamingMode,
    affix: AffixMode,
) -> String {
    let base = match naming {
        NamingMode::Short => &row.field_short,
        NamingMode::Long => &row.field_long,
    };
    match affix {
        AffixMode::Prefix => format!("{file_code}_{base}"),
        AffixMode::Suffix => format!("{base}_{file_code}"),
        AffixMode::None => base.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDetail {
    pub old_col: String,
    pub new_col: String,
    pub group: String,
    pub value_desc: String,
}

/// Source column → output column renames for one datapack table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPlan {
    pub file_code: String,
    renames: Vec<(String, String)>,
    details: Vec<ColumnDetail>,
}

impl ColumnPlan {
    pub fn build(
        file_code: &str,
        rows: &[&MappingRow],
        naming: NamingMode,
        affix: AffixMode,
    ) -> Self {
        let mut renames: Vec<(String, String)> = Vec::with_capacity(rows.len());
        let mut details = Vec::with_capacity(rows.len());
        for row in rows.iter().filter(|r| r.data_file_code == file_code) {
            // A source column is renamed once; later rows for it reuse that name.
            let new_col = match renames.iter().find(|(old, _)| old == &row.field_short) {
                Some((_, existing)) => existing.clone(),
                None => {
                    let resolved = resolve_column_name(row, file_code, naming, affix);
                    renames.push((row.field_short.clone(), resolved.clone()));
                    resolved
                }
            };
            details.push(ColumnDetail {
                old_col: row.field_short.clone(),
                new_col,
                group: row.group.clone(),
                value_desc: row.value_desc.clone(),
            });
        }
        Self {
            file_code: file_code.to_string(),
            renames,
            details,
        }
    }

    pub fn renames(&self) -> &[(String, String)] {
        &self.renames
    }

    pub fn details(&self) -> &[ColumnDetail] {
        &self.details
    }

    pub fn resolved_name(&self, old_col: &str) -> Option<&str> {
        self.renames
            .iter()
            .find(|(old, _)| old == old_col)
            .map(|(_, new)| new.as_str())
    }

    pub fn original_name(&self, new_col: &str) -> Option<&str> {
        self.renames
            .iter()
            .find(|(_, new)| new == new_col)
            .map(|(old, _)| old.as_str())
    }
}

/// Keeps `key` and the planned columns of `frame`, renamed per `plan`.
pub fn project(frame: &Frame, source: &Path, key: &str, plan: &ColumnPlan) -> Result<Frame> {
    let key_idx = frame
        .column_index(key)
        .ok_or_else(|| WrangleError::MissingKeyColumn {
            path: source.to_path_buf(),
            column: key.to_string(),
        })?;
    let mut columns = vec![(key_idx, key.to_string())];
    for (old, new) in plan.renames() {
        let idx = frame
            .column_index(old)
            .ok_or_else(|| WrangleError::MissingSourceColumn {
                path: source.to_path_buf(),
                column: old.clone(),
            })?;
        if columns.iter().any(|(_, existing)| existing == new) {
            return Err(WrangleError::ColumnCollision {
                path: source.to_path_buf(),
                column: new.clone(),
            }
            .into());
        }
        columns.push((idx, new.clone()));
    }
    let projected = frame.select(&columns);
    projected.ensure_unique_key(key, source)?;
    Ok(projected)
}

/// Joins the projected tables left to right on `key`; the first seeds the result.
pub fn merge(tables: &[(PathBuf, Frame)], key: &str) -> Result<Frame> {
    let mut iter = tables.iter();
    let (first_path, first) = iter
        .next()
        .ok_or_else(|| anyhow!("No projected tables to merge"))?;
    first.ensure_unique_key(key, first_path)?;
    let mut merged = first.clone();
    for (path, table) in iter {
        merged = merged.join_one_to_one(table, key, path)?;
    }
    info!(
        "Merged {} table(s) into {} row(s) x {} column(s)",
        tables.len(),
        merged.row_count(),
        merged.headers().len()
    );
    Ok(merged)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup {
    pub name: String,
    pub columns: Vec<String>,
}

/// Groups resolved column names by their config group, both in first-seen
/// order, with repeats of a column inside one group dropped.
pub fn group_columns(details: &[ColumnDetail]) -> Vec<ColumnGroup> {
    details.iter().fold(Vec::new(), |mut groups, detail| {
        match groups.iter_mut().find(|g: &&mut ColumnGroup| g.name == detail.group) {
            Some(group) => {
                if !group.columns.contains(&detail.new_col) {
                    group.columns.push(detail.new_col.clone());
                }
            }
            None => groups.push(ColumnGroup {
                name: detail.group.clone(),
                columns: vec![detail.new_col.clone()],
            }),
        }
        groups
    })
}

/// The category label for `column` within `group`: the value description of
/// the first matching detail. A different label on a later detail is ignored.
pub fn value_label<'a>(details: &'a [ColumnDetail], group: &str, column: &str) -> Option<&'a str> {
    let mut matching = details
        .iter()
        .filter(|d| d.group == group && d.new_col == column);
    let first = matching.next()?;
    for other in matching {
        if other.value_desc != first.value_desc {
            warn!(
                "Column '{}' in group '{}' has conflicting labels '{}' and '{}'; keeping '{}'",
                column, group, first.value_desc, other.value_desc, first.value_desc
            );
        }
    }
    Some(first.value_desc.as_str())
}

/// Melts each group of `merged` into `(key, group, "{group} Value")` and
/// concatenates the results row-wise. Within a group the columns unpivot in
/// label order; equal labels keep their config order.
pub fn pivot(merged: &Frame, key: &str, details: &[ColumnDetail]) -> Result<Frame> {
    let groups = group_columns(details);
    let mut melted = Vec::with_capacity(groups.len());
    for group in &groups {
        let mut value_columns = group
            .columns
            .iter()
            .map(|column| {
                let label = value_label(details, &group.name, column).unwrap_or(column.as_str());
                (column.clone(), label.to_string())
            })
            .collect::<Vec<_>>();
        value_columns.sort_by(|a, b| a.1.cmp(&b.1));
        let value_name = format!("{} Value", group.name);
        let long = merged.melt(key, &value_columns, &group.name, &value_name)?;
        debug!(
            "Group '{}' unpivoted {} column(s) into {} row(s)",
            group.name,
            group.columns.len(),
            long.row_count()
        );
        melted.push(long);
    }
    let pivoted = Frame::concat(&melted);
    info!(
        "Pivoted {} group(s) into {} row(s)",
        groups.len(),
        pivoted.row_count()
    );
    Ok(pivoted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, short: &str, long: &str, desc: &str, group: &str) -> MappingRow {
        MappingRow::new(code, short, long, desc, group)
    }

    fn detail(new_col: &str, group: &str, desc: &str) -> ColumnDetail {
        ColumnDetail {
            old_col: new_col.to_string(),
            new_col: new_col.to_string(),
            group: group.to_string(),
            value_desc: desc.to_string(),
        }
    }

    #[test]
    fn resolve_column_name_applies_naming_then_affix() {
        let mapping = row("G01", "Age_0_4", "Persons aged 0-4", "0-4 years", "Age");
        assert_eq!(
            resolve_column_name(&mapping, "G01", NamingMode::Short, AffixMode::Prefix),
            "G01_Age_0_4"
        );
        assert_eq!(
            resolve_column_name(&mapping, "G01", NamingMode::Long, AffixMode::Suffix),
            "Persons aged 0-4_G01"
        );
        assert_eq!(
            resolve_column_name(&mapping, "G01", NamingMode::Short, AffixMode::None),
            "Age_0_4"
        );
    }

    #[test]
    fn column_plan_records_pairs_that_round_trip() {
        let a = row("G01", "Tot_P_M", "Total_Males", "Males", "Sex");
        let b = row("G01", "Tot_P_F", "Total_Females", "Females", "Sex");
        let other = row("G02", "Median_age", "Median age", "Median", "Age");
        let plan = ColumnPlan::build("G01", &[&a, &b, &other], NamingMode::Long, AffixMode::Prefix);
        assert_eq!(plan.renames().len(), 2);
        for (old, new) in plan.renames() {
            assert_eq!(plan.original_name(new), Some(old.as_str()));
            assert_eq!(plan.resolved_name(old), Some(new.as_str()));
        }
        assert_eq!(plan.resolved_name("Tot_P_F"), Some("G01_Total_Females"));
        assert_eq!(plan.details().len(), 2);
        assert_eq!(plan.details()[0].group, "Sex");
    }

    #[test]
    fn project_requires_the_key_column() {
        let frame = Frame::new(
            vec!["STE_CODE_2021".to_string(), "Tot_P_P".to_string()],
            vec![vec!["1".to_string(), "10".to_string()]],
        );
        let mapping = row("G01", "Tot_P_P", "Total", "Persons", "Total");
        let plan = ColumnPlan::build("G01", &[&mapping], NamingMode::Short, AffixMode::None);
        let err = project(&frame, Path::new("g01.csv"), "LGA_CODE_2021", &plan).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WrangleError>(),
            Some(WrangleError::MissingKeyColumn { column, .. }) if column == "LGA_CODE_2021"
        ));
    }

    #[test]
    fn project_reports_missing_mapped_columns() {
        let frame = Frame::new(
            vec!["LGA_CODE_2021".to_string()],
            vec![vec!["LGA10050".to_string()]],
        );
        let mapping = row("G01", "Tot_P_P", "Total", "Persons", "Total");
        let plan = ColumnPlan::build("G01", &[&mapping], NamingMode::Short, AffixMode::None);
        let err = project(&frame, Path::new("g01.csv"), "LGA_CODE_2021", &plan).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WrangleError>(),
            Some(WrangleError::MissingSourceColumn { column, .. }) if column == "Tot_P_P"
        ));
    }

    #[test]
    fn group_columns_preserves_order_and_dedups_within_group() {
        let details = vec![
            detail("a", "Sex", "Males"),
            detail("b", "Age", "0-4"),
            detail("a", "Sex", "Males"),
            detail("c", "Sex", "Females"),
            detail("a", "Age", "All"),
        ];
        let groups = group_columns(&details);
        assert_eq!(
            groups,
            vec![
                ColumnGroup {
                    name: "Sex".to_string(),
                    columns: vec!["a".to_string(), "c".to_string()],
                },
                ColumnGroup {
                    name: "Age".to_string(),
                    columns: vec!["b".to_string(), "a".to_string()],
                },
            ]
        );
    }

    #[test]
    fn value_label_is_scoped_to_the_group_and_first_seen() {
        let details = vec![
            detail("a", "Sex", "Males"),
            detail("a", "Age", "All ages"),
            detail("a", "Sex", "Men"),
        ];
        assert_eq!(value_label(&details, "Sex", "a"), Some("Males"));
        assert_eq!(value_label(&details, "Age", "a"), Some("All ages"));
        assert_eq!(value_label(&details, "Other", "a"), None);
    }

    #[test]
    fn pivot_row_count_is_rows_times_group_width() {
        let merged = Frame::new(
            vec!["K".into(), "a".into(), "b".into(), "c".into()],
            vec![
                vec!["1".into(), "1".into(), "2".into(), "3".into()],
                vec!["2".into(), "4".into(), "5".into(), "6".into()],
                vec!["3".into(), "7".into(), "8".into(), "9".into()],
            ],
        );
        let details = vec![
            detail("a", "Sex", "Males"),
            detail("b", "Sex", "Females"),
            detail("c", "Age", "0-4 years"),
        ];
        let pivoted = pivot(&merged, "K", &details).unwrap();
        assert_eq!(pivoted.row_count(), 3 * 2 + 3);
        assert_eq!(
            pivoted.headers(),
            &["K", "Sex", "Sex Value", "Age", "Age Value"]
        );
        assert_eq!(pivoted.rows()[0], vec!["1", "Females", "2", "", ""]);
        assert_eq!(pivoted.rows()[3], vec!["1", "Males", "1", "", ""]);
        assert_eq!(pivoted.rows()[6], vec!["1", "", "", "0-4 years", "3"]);
    }

    #[test]
    fn pivot_orders_group_columns_by_label() {
        let merged = Frame::new(
            vec!["K".into(), "x".into(), "y".into(), "z".into()],
            vec![vec!["1".into(), "11".into(), "10".into(), "12".into()]],
        );
        let details = vec![
            detail("x", "Age", "5-9 years"),
            detail("y", "Age", "0-4 years"),
            detail("z", "Age", "0-4 years"),
        ];
        let pivoted = pivot(&merged, "K", &details).unwrap();
        assert_eq!(
            pivoted.rows(),
            &[
                vec!["1", "0-4 years", "10"],
                vec!["1", "0-4 years", "12"],
                vec!["1", "5-9 years", "11"],
            ]
        );
    }
}
