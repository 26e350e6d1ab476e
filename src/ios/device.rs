#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Device roles and the per-device records built from submitted files.

use std::{fmt, sync::OnceLock};

use serde::{Deserialize, Serialize};

use super::parser::{ConfigDocument, ParseOptions};
use crate::error::GradeError;

/// A logical device in the case-study topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Toronto edge router (DMVPN hub).
    Toronto,
    /// Service provider router.
    #[serde(rename = "ISP")]
    Isp,
    /// Ottawa branch router.
    Ottawa,
    /// Oshawa branch router.
    Oshawa,
    /// Toronto access switch 1.
    #[serde(rename = "TOR-A1")]
    TorA1,
    /// Toronto access switch 2.
    #[serde(rename = "TOR-A2")]
    TorA2,
    /// Toronto distribution switch 1.
    #[serde(rename = "TOR-D1")]
    TorD1,
    /// Toronto distribution switch 2.
    #[serde(rename = "TOR-D2")]
    TorD2,
}

impl Role {
    /// Every role, in keyword-table order.
    pub const ALL: [Role; 8] = [
        Role::Toronto,
        Role::Isp,
        Role::Ottawa,
        Role::Oshawa,
        Role::TorA1,
        Role::TorA2,
        Role::TorD1,
        Role::TorD2,
    ];
    /// Layer 3 routers.
    pub const ROUTERS: [Role; 4] = [Role::Toronto, Role::Isp, Role::Ottawa, Role::Oshawa];
    /// Campus switches.
    pub const SWITCHES: [Role; 4] = [Role::TorD1, Role::TorD2, Role::TorA1, Role::TorA2];
    /// Routers terminating the DMVPN overlay.
    pub const SITES: [Role; 3] = [Role::Toronto, Role::Ottawa, Role::Oshawa];
    /// Distribution switches.
    pub const DISTRIBUTION: [Role; 2] = [Role::TorD1, Role::TorD2];
    /// Access switches.
    pub const ACCESS: [Role; 2] = [Role::TorA1, Role::TorA2];

    /// Display name used in comments and reports.
    pub fn name(self) -> &'static str {
        match self {
            Role::Toronto => "Toronto",
            Role::Isp => "ISP",
            Role::Ottawa => "Ottawa",
            Role::Oshawa => "Oshawa",
            Role::TorA1 => "TOR-A1",
            Role::TorA2 => "TOR-A2",
            Role::TorD1 => "TOR-D1",
            Role::TorD2 => "TOR-D2",
        }
    }

    /// Lowercase keywords identifying this role in file names and hostnames.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            Role::Toronto => &["toronto"],
            Role::Isp => &["isp"],
            Role::Ottawa => &["ottawa", "ott"],
            Role::Oshawa => &["oshawa", "osh"],
            Role::TorA1 => &["tor-a1", "a1"],
            Role::TorA2 => &["tor-a2", "a2"],
            Role::TorD1 => &["tor-d1", "d1"],
            Role::TorD2 => &["tor-d2", "d2"],
        }
    }

    /// First role, in table order, with a keyword present in `text`.
    ///
    /// Matching ignores case and requires the keyword to start a word, so
    /// `unnamed1.txt` does not count as a `d1` file.
    pub fn from_keywords(text: &str) -> Option<Role> {
        let text = text.to_lowercase();
        Role::ALL.into_iter().find(|role| {
            role.keywords()
                .iter()
                .any(|keyword| starts_word(&text, keyword))
        })
    }
}

/// Whether `needle` occurs in `haystack` at the start of a word.
fn starts_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(at, _)| {
        haystack[..at]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    })
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One submitted file, as handed over by whatever fetched the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFile {
    /// File name, without directories.
    name:    String,
    /// Text content, or the reason it could not be read.
    content: Result<String, String>,
}

impl SubmissionFile {
    /// A readable file.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name:    name.into(),
            content: Ok(content.into()),
        }
    }

    /// A file from raw bytes; invalid UTF-8 makes it unreadable.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name:    name.into(),
            content: String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {e}")),
        }
    }

    /// A file the collaborator failed to read.
    pub fn unreadable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name:    name.into(),
            content: Err(reason.into()),
        }
    }

    /// File name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text content, if readable.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().ok()
    }

    /// Turns this file into the record for `role`.
    pub fn into_record(self, role: Role, options: ParseOptions) -> DeviceRecord {
        DeviceRecord {
            role,
            source: self.name,
            content: self.content,
            options,
            document: OnceLock::new(),
        }
    }
}

/// A submitted configuration bound to a role, parsed on first use.
#[derive(Debug)]
pub struct DeviceRecord {
    /// Role this file was resolved to.
    role:     Role,
    /// Name of the file it came from.
    source:   String,
    /// Text content, or the reason it could not be read.
    content:  Result<String, String>,
    /// Parser options for the lazy parse.
    options:  ParseOptions,
    /// Parsed tree, built once.
    document: OnceLock<ConfigDocument>,
}

impl DeviceRecord {
    /// Builds a record directly from text.
    pub fn new(role: Role, source: impl Into<String>, text: impl Into<String>) -> Self {
        SubmissionFile::new(source, text).into_record(role, ParseOptions::default())
    }

    /// Role of this device.
    pub fn role(&self) -> Role {
        self.role
    }

    /// File the record was read from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Raw text, if it was readable.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().ok()
    }

    /// The parsed configuration.
    pub fn document(&self) -> Result<&ConfigDocument, GradeError> {
        match &self.content {
            Ok(text) => Ok(self
                .document
                .get_or_init(|| ConfigDocument::parse_with(text, &self.options))),
            Err(reason) => Err(GradeError::Unreadable {
                source_file: self.source.clone(),
                reason:      reason.clone(),
            }),
        }
    }
}
