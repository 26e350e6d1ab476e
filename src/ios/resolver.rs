#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Matching submitted files to device roles.

use std::collections::BTreeMap;

use super::{
    device::{DeviceRecord, Role, SubmissionFile},
    parser::ParseOptions,
    query::Pattern,
};
use crate::{constants::MIN_RESOLVED_ROLES, error::GradeError};

/// Devices of one group, keyed by role.
pub type DeviceMap = BTreeMap<Role, DeviceRecord>;

/// Maps a group's files onto device roles.
#[derive(Debug, Clone)]
pub struct DeviceResolver {
    /// Roles that must resolve for the group to be graded.
    min_roles: usize,
    /// Options handed to each record's parser.
    options:   ParseOptions,
    /// `hostname <token>` matcher.
    hostname:  Pattern,
}

impl DeviceResolver {
    /// A resolver requiring `min_roles` devices.
    pub fn new(min_roles: usize, options: ParseOptions) -> Self {
        Self {
            min_roles,
            options,
            hostname: hostname_pattern(),
        }
    }

    /// Number of roles that must resolve.
    pub fn min_roles(&self) -> usize {
        self.min_roles
    }

    /// First `hostname` directive in `text`.
    pub fn extract_hostname<'t>(&self, text: &'t str) -> Option<&'t str> {
        text.lines()
            .find_map(|line| self.hostname.capture(line.trim(), 1))
    }

    /// Resolves `files` to roles.
    ///
    /// File names are tried first; files whose names carry no keyword fall
    /// back to their `hostname` line. A later file for an already assigned
    /// role replaces the earlier one.
    pub fn resolve(&self, files: Vec<SubmissionFile>) -> Result<DeviceMap, GradeError> {
        let mut devices = DeviceMap::new();
        let mut unmatched = Vec::new();

        for file in files {
            match Role::from_keywords(file.name()) {
                Some(role) => {
                    tracing::info!("Matched {} to {role} using filename keywords.", file.name());
                    self.assign(&mut devices, role, file);
                }
                None => unmatched.push(file),
            }
        }

        for file in unmatched {
            let Some(text) = file.text() else {
                tracing::warn!("Could not read {} to look for a hostname.", file.name());
                continue;
            };

            let Some(hostname) = self.extract_hostname(text) else {
                tracing::warn!("Could not extract hostname from {}.", file.name());
                continue;
            };

            match Role::from_keywords(hostname) {
                Some(role) => {
                    tracing::info!("Matched {} to {role} using hostname {hostname}.", file.name());
                    self.assign(&mut devices, role, file);
                }
                None => {
                    tracing::warn!(
                        "Hostname '{hostname}' from {} did not match any device.",
                        file.name()
                    );
                }
            }
        }

        if devices.len() < self.min_roles {
            tracing::warn!(
                "Detected only {} devices, {} required. Skipping this group.",
                devices.len(),
                self.min_roles
            );
            return Err(GradeError::InsufficientDevices {
                found:    devices.len(),
                required: self.min_roles,
            });
        }

        Ok(devices)
    }

    /// Inserts `file` for `role`, logging any replacement.
    fn assign(&self, devices: &mut DeviceMap, role: Role, file: SubmissionFile) {
        let record = file.into_record(role, self.options);
        if let Some(previous) = devices.insert(role, record) {
            tracing::warn!(
                "Overwriting existing file for device {role}: {} with {}",
                previous.source(),
                devices[&role].source()
            );
        }
    }
}

impl Default for DeviceResolver {
    fn default() -> Self {
        Self::new(MIN_RESOLVED_ROLES, ParseOptions::default())
    }
}

/// Matcher for `hostname <token>` lines.
fn hostname_pattern() -> Pattern {
    Pattern::case_insensitive(r"hostname\s+(\S+)").expect("hostname pattern is a valid regex")
}
