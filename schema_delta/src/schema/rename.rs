//! Table rename detection
//!
//! Only one naming convention is recognized: a source table whose name ends
//! with a fixed suffix (e.g. `archivetable`) is taken to be the target table
//! with the suffix removed (`archive`). Arbitrary renames show up as a drop
//! plus a create.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::schema::types::SchemaSnapshot;
use crate::utils::naming::{fold_case, strip_name_suffix};

/// A proposed `RENAME TABLE from TO to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOp {
    pub from: String,
    pub to: String,
}

/// Propose renames and return the source snapshot as it would look after them
pub fn detect_renames(
    source: &SchemaSnapshot,
    target: &SchemaSnapshot,
    suffix: &str,
) -> Result<(Vec<RenameOp>, SchemaSnapshot)> {
    let mut renames = Vec::new();
    let mut claimed: HashMap<String, String> = HashMap::new();

    for table in source.tables() {
        if target.contains_table(&table.name) {
            continue;
        }

        let Some(stripped) = strip_name_suffix(&table.name, suffix) else {
            continue;
        };

        if !target.contains_table(stripped) || source.contains_table(stripped) {
            continue;
        }

        claim_candidate(&mut claimed, stripped, &table.name)?;

        tracing::debug!(from = %table.name, to = stripped, "Detected table rename");
        renames.push(RenameOp {
            from: table.name.clone(),
            to: stripped.to_string(),
        });
    }

    let mut revised = source.clone();
    for rename in &renames {
        revised = revised.with_table_renamed(&rename.from, &rename.to)?;
    }

    Ok((renames, revised))
}

/// Record `table` as the rename source for `candidate`. A second claim on the
/// same candidate is an `AmbiguousRename`.
///
/// Source names are unique ignoring case and the suffix is matched literally,
/// so `detect_renames` cannot currently produce two claims on one candidate.
fn claim_candidate(
    claimed: &mut HashMap<String, String>,
    candidate: &str,
    table: &str,
) -> Result<()> {
    match claimed.insert(fold_case(candidate), table.to_string()) {
        Some(previous) => Err(Error::AmbiguousRename {
            candidate: candidate.to_string(),
            tables: vec![previous, table.to_string()],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{Column, Table};
    use pretty_assertions::assert_eq;

    fn snapshot(names: &[&str]) -> SchemaSnapshot {
        SchemaSnapshot::from_tables(
            names
                .iter()
                .map(|name| Table::new(name).with_column(Column::new("id", "int"))),
        )
        .unwrap()
    }

    #[test]
    fn suffixed_table_is_renamed_to_target_name() {
        let source = snapshot(&["users", "archivetable"]);
        let target = snapshot(&["users", "archive"]);

        let (renames, revised) = detect_renames(&source, &target, "table").unwrap();

        assert_eq!(
            renames,
            vec![RenameOp {
                from: "archivetable".to_string(),
                to: "archive".to_string(),
            }]
        );
        assert_eq!(revised.table_names(), vec!["users", "archive"]);
        assert_eq!(source.table_names(), vec!["users", "archivetable"]);
    }

    #[test]
    fn target_match_is_case_insensitive() {
        let source = snapshot(&["archivetable"]);
        let target = snapshot(&["Archive"]);

        let (renames, _) = detect_renames(&source, &target, "table").unwrap();

        assert_eq!(renames.len(), 1);
        assert_eq!(renames[0].to, "archive");
    }

    #[test]
    fn no_rename_when_stripped_name_already_in_source() {
        let source = snapshot(&["archive", "archivetable"]);
        let target = snapshot(&["archive"]);

        let (renames, revised) = detect_renames(&source, &target, "table").unwrap();

        assert!(renames.is_empty());
        assert_eq!(revised, source);
    }

    #[test]
    fn no_rename_when_table_already_matches_target() {
        let source = snapshot(&["archivetable"]);
        let target = snapshot(&["archivetable", "archive"]);

        let (renames, _) = detect_renames(&source, &target, "table").unwrap();

        assert!(renames.is_empty());
    }

    #[test]
    fn no_rename_without_target_candidate() {
        let source = snapshot(&["logtable", "table"]);
        let target = snapshot(&["events"]);

        let (renames, _) = detect_renames(&source, &target, "table").unwrap();

        assert!(renames.is_empty());
    }

    #[test]
    fn suffix_is_configurable() {
        let source = snapshot(&["orders_old"]);
        let target = snapshot(&["orders"]);

        let (renames, revised) = detect_renames(&source, &target, "_old").unwrap();

        assert_eq!(renames[0].from, "orders_old");
        assert!(revised.contains_table("orders"));
    }

    #[test]
    fn second_claim_on_a_candidate_is_ambiguous() {
        let mut claimed = HashMap::new();

        claim_candidate(&mut claimed, "archive", "archivetable").unwrap();
        let err = claim_candidate(&mut claimed, "Archive", "Archivetable").unwrap_err();

        match err {
            Error::AmbiguousRename { candidate, tables } => {
                assert_eq!(candidate, "Archive");
                assert_eq!(tables, vec!["archivetable".to_string(), "Archivetable".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn distinct_candidates_do_not_conflict() {
        let mut claimed = HashMap::new();

        claim_candidate(&mut claimed, "archive", "archivetable").unwrap();
        claim_candidate(&mut claimed, "audit", "audittable").unwrap();

        assert_eq!(claimed.len(), 2);
    }
}
