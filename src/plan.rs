//! The change plan handed from `detect` to `migrate`.
//!
//! The plan is persisted as YAML so an operator can review and hand-edit it
//! between the two runs. All maps are `BTreeMap`s and every section defaults
//! to empty, so a plan loaded and saved again without edits is byte-for-byte
//! identical, and a hand-trimmed plan missing whole sections still loads.
//!
//! Internally each table is described by exactly one [`TableChange`]; the
//! YAML sections are a projection of that classification.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::{error::DriftError, manifest::Manifest};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangePlan {
    pub renamed_tables: BTreeMap<String, String>,
    pub moved_tables: BTreeMap<String, MovedTable>,
    pub new_tables: BTreeMap<String, NewTable>,
    pub column_changes: BTreeMap<String, ColumnChange>,
    pub scenario_changes: ScenarioChanges,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovedTable {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTable {
    #[serde(default = "NewTable::default_create_empty")]
    pub create_empty: bool,
}

impl NewTable {
    const fn default_create_empty() -> bool {
        true
    }
}

impl Default for NewTable {
    fn default() -> Self {
        Self { create_empty: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnChange {
    pub renamed_columns: BTreeMap<String, String>,
    pub dropped_columns: Vec<String>,
    pub added_columns: Vec<String>,
}

impl ColumnChange {
    pub fn is_empty(&self) -> bool {
        self.renamed_columns.is_empty()
            && self.dropped_columns.is_empty()
            && self.added_columns.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioChanges {
    pub renamed_keys: BTreeMap<String, String>,
    pub new_rows: Vec<String>,
}

impl ScenarioChanges {
    pub fn is_empty(&self) -> bool {
        self.renamed_keys.is_empty() && self.new_rows.is_empty()
    }
}

/// What happened to one table between the two versions.
///
/// Keyed by the table's OLD name for `Renamed` and by its (shared) name
/// otherwise. Tables that exist only in the old version and were not matched
/// have no entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableChange {
    Unchanged { from: String, to: String },
    Moved { from: String, to: String },
    Renamed { new_name: String, from: String, to: String },
    New { path: String },
}

impl TableChange {
    pub fn label(&self) -> &'static str {
        match self {
            TableChange::Unchanged { .. } => "unchanged",
            TableChange::Moved { .. } => "moved",
            TableChange::Renamed { .. } => "renamed",
            TableChange::New { .. } => "new",
        }
    }

    /// Old storage path the data comes from; `None` for new tables.
    pub fn source(&self) -> Option<&str> {
        match self {
            TableChange::Unchanged { from, .. }
            | TableChange::Moved { from, .. }
            | TableChange::Renamed { from, .. } => Some(from),
            TableChange::New { .. } => None,
        }
    }

    /// New storage path the table lives at.
    pub fn target(&self) -> &str {
        match self {
            TableChange::Unchanged { to, .. }
            | TableChange::Moved { to, .. }
            | TableChange::Renamed { to, .. } => to,
            TableChange::New { path } => path,
        }
    }
}

impl ChangePlan {
    /// Projects a table classification into the plan's YAML sections.
    pub fn from_table_changes(
        tables: &BTreeMap<String, TableChange>,
        column_changes: BTreeMap<String, ColumnChange>,
        scenario_changes: ScenarioChanges,
    ) -> Self {
        let mut plan = ChangePlan {
            column_changes,
            scenario_changes,
            ..ChangePlan::default()
        };
        for (name, change) in tables {
            match change {
                TableChange::Unchanged { .. } => {}
                TableChange::Moved { from, to } => {
                    plan.moved_tables.insert(
                        name.clone(),
                        MovedTable {
                            from: from.clone(),
                            to: to.clone(),
                        },
                    );
                }
                TableChange::Renamed { new_name, .. } => {
                    plan.renamed_tables.insert(name.clone(), new_name.clone());
                }
                TableChange::New { .. } => {
                    plan.new_tables.insert(name.clone(), NewTable::default());
                }
            }
        }
        plan
    }

    /// Replays the plan against both manifests, assigning every table exactly
    /// one [`TableChange`]. Entries that refer to tables missing from the
    /// manifests are skipped with a warning; a name listed under two
    /// categories is an error.
    pub fn classify(
        &self,
        old: &Manifest,
        new: &Manifest,
    ) -> Result<BTreeMap<String, TableChange>, DriftError> {
        let mut tables: BTreeMap<String, TableChange> = BTreeMap::new();
        let mut insert = |name: &str, change: TableChange| match tables.get(name) {
            Some(existing) => Err(DriftError::ConflictingTableChange {
                table: name.to_string(),
                first: existing.label(),
                second: change.label(),
            }),
            None => {
                tables.insert(name.to_string(), change);
                Ok(())
            }
        };

        for (old_name, new_name) in &self.renamed_tables {
            match (old.path(old_name), new.path(new_name)) {
                (Some(from), Some(to)) => insert(
                    old_name.as_str(),
                    TableChange::Renamed {
                        new_name: new_name.clone(),
                        from: from.to_string(),
                        to: to.to_string(),
                    },
                )?,
                _ => warn!(
                    "Skipping rename '{old_name}' -> '{new_name}': table missing from a manifest"
                ),
            }
        }
        for (name, moved) in &self.moved_tables {
            insert(
                name.as_str(),
                TableChange::Moved {
                    from: moved.from.clone(),
                    to: moved.to.clone(),
                },
            )?;
        }
        for name in self.new_tables.keys() {
            match new.path(name) {
                Some(path) => insert(
                    name.as_str(),
                    TableChange::New {
                        path: path.to_string(),
                    },
                )?,
                None => warn!("Skipping new table '{name}': not in the new manifest"),
            }
        }

        let listed = self
            .renamed_tables
            .keys()
            .chain(self.moved_tables.keys())
            .chain(self.new_tables.keys())
            .map(String::as_str)
            .collect::<BTreeSet<_>>();
        for (name, from) in old.entries() {
            if listed.contains(name) {
                continue;
            }
            if let Some(to) = new.path(name) {
                insert(
                    name,
                    TableChange::Unchanged {
                        from: from.to_string(),
                        to: to.to_string(),
                    },
                )?;
            }
        }
        Ok(tables)
    }

    /// `column_changes` keys that are not storage paths of the new manifest.
    pub fn unknown_column_change_paths<'a>(&'a self, new: &Manifest) -> Vec<&'a str> {
        let paths = new.paths();
        self.column_changes
            .keys()
            .map(String::as_str)
            .filter(|path| !paths.contains(path))
            .collect()
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing change plan to YAML")
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        serde_yaml::from_str(input).context("Parsing change plan YAML")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating plan file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing change plan YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening plan file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).context("Parsing change plan YAML")
    }
}
