#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Course roster lookups.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One roster line: a member and the group they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRow {
    /// Group name, as used for submission labels.
    pub group_name:  String,
    /// Group identifier.
    pub group_id:    String,
    /// Member display name.
    pub member_name: String,
    /// Member identifier.
    pub member_id:   String,
}

/// Who is in which group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    /// Group id to group name.
    groups:  BTreeMap<String, String>,
    /// Member id to member name.
    members: BTreeMap<String, String>,
    /// Group id to member ids, in listing order.
    rosters: BTreeMap<String, Vec<String>>,
}

impl Roster {
    /// Builds a roster from rows.
    pub fn from_rows(rows: impl IntoIterator<Item = RosterRow>) -> Self {
        rows.into_iter().fold(Self::default(), |mut roster, row| {
            roster
                .groups
                .entry(row.group_id.clone())
                .or_insert(row.group_name);
            roster
                .members
                .insert(row.member_id.clone(), row.member_name);
            let listed = roster.rosters.entry(row.group_id).or_default();
            if !listed.contains(&row.member_id) {
                listed.push(row.member_id);
            }
            roster
        })
    }

    /// Parses a JSON array of rows.
    pub fn from_json(json: &str) -> Result<Self> {
        let rows: Vec<RosterRow> = serde_json::from_str(json).context("Failed to parse roster")?;
        Ok(Self::from_rows(rows))
    }

    /// First listed member of the group named `group_label`.
    ///
    /// Names are compared ignoring case and surrounding whitespace.
    pub fn representative(&self, group_label: &str) -> Option<&str> {
        let label = group_label.trim();
        let (group_id, _) = self
            .groups
            .iter()
            .find(|(_, name)| name.trim().eq_ignore_ascii_case(label))?;

        let member_id = self.rosters.get(group_id)?.first()?;
        self.members.get(member_id).map(String::as_str)
    }
}
