#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    str::FromStr,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{COMMENT_SEPARATOR, MIN_RESOLVED_ROLES},
    ios::{CommentPolicy, ParseOptions},
};

/// Runtime settings for a grading run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraderConfig {
    /// Options handed to the configuration parser.
    parse_options: ParseOptions,
    /// Roles that must resolve before a group is graded.
    min_roles:     usize,
    /// Groups graded at once by the concurrent runner.
    concurrency:   usize,
    /// Separator placed between comments in output records.
    separator:     String,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            min_roles:     MIN_RESOLVED_ROLES,
            concurrency:   default_concurrency(),
            separator:     COMMENT_SEPARATOR.to_string(),
        }
    }
}

impl GraderConfig {
    /// Reads `CFGRADE_SKIP_COMMENTS`, `CFGRADE_MIN_ROLES` and
    /// `CFGRADE_CONCURRENCY`, keeping defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`GraderConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let read = |name: &str| lookup(name).map(|value| (name.to_string(), value));

        let skip_comments = read_env(read("CFGRADE_SKIP_COMMENTS"), false, parse_flag)?;
        let comments = if skip_comments {
            CommentPolicy::Skip
        } else {
            CommentPolicy::Keep
        };

        Ok(Self {
            parse_options: defaults.parse_options.with_comments(comments),
            min_roles: read_env(read("CFGRADE_MIN_ROLES"), defaults.min_roles, usize::from_str)?,
            concurrency: read_env(read("CFGRADE_CONCURRENCY"), defaults.concurrency, usize::from_str)?,
            separator: defaults.separator,
        })
    }

    /// Parser options.
    pub fn parse_options(&self) -> ParseOptions {
        self.parse_options
    }

    /// Roles that must resolve.
    pub fn min_roles(&self) -> usize {
        self.min_roles
    }

    /// Groups graded at once, never less than one.
    pub fn concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    /// Comment separator.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Returns a copy requiring `min_roles` resolved roles.
    pub fn with_min_roles(mut self, min_roles: usize) -> Self {
        self.min_roles = min_roles;
        self
    }

    /// Returns a copy grading `concurrency` groups at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}

/// One group per available core.
fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(1, usize::from)
}

/// Accepts the usual spellings of a boolean switch.
fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("expected a boolean, found `{other}`"),
    }
}

/// Parses a looked-up `(name, value)` pair, falling back to `default` when
/// the variable is missing.
fn read_env<T, E>(
    entry: Option<(String, String)>,
    default: T,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<T>
where
    E: Into<anyhow::Error>,
{
    match entry {
        Some((name, value)) => parse(value.trim())
            .map_err(Into::<anyhow::Error>::into)
            .with_context(|| format!("Invalid value for {name}: `{value}`")),
        None => Ok(default),
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone)]
pub struct ConfigHandle(Arc<GraderConfig>);

impl std::ops::Deref for ConfigHandle {
    type Target = GraderConfig;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<GraderConfig>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<GraderConfig>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Ensure the global configuration has been initialized and return a handle.
///
/// A malformed `CFGRADE_*` value is returned as an error and leaves the slot
/// empty.
pub fn ensure_initialized() -> Result<ConfigHandle> {
    let slot = slot();
    let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(cfg) = guard.as_ref() {
        return Ok(ConfigHandle(Arc::clone(cfg)));
    }

    let cfg = Arc::new(GraderConfig::from_env()?);
    *guard = Some(Arc::clone(&cfg));
    Ok(ConfigHandle(cfg))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<GraderConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        GraderConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("Yes").expect("valid flag"));
        assert!(!parse_flag("0").expect("valid flag"));
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn concurrency_never_drops_to_zero() {
        assert_eq!(GraderConfig::default().with_concurrency(0).concurrency(), 1);
    }

    #[test]
    fn unset_variables_keep_defaults() {
        assert_eq!(from_vars(&[]).expect("defaults"), GraderConfig::default());
    }

    #[test]
    fn each_variable_overrides_its_setting() {
        let skip = from_vars(&[("CFGRADE_SKIP_COMMENTS", "yes")]).expect("skip comments");
        assert_eq!(skip.parse_options().comments(), CommentPolicy::Skip);
        assert_eq!(skip.min_roles(), MIN_RESOLVED_ROLES);

        let roles = from_vars(&[("CFGRADE_MIN_ROLES", " 6 ")]).expect("min roles");
        assert_eq!(roles.min_roles(), 6);
        assert_eq!(roles.parse_options().comments(), CommentPolicy::Keep);

        let jobs = from_vars(&[("CFGRADE_CONCURRENCY", "3")]).expect("concurrency");
        assert_eq!(jobs.concurrency(), 3);
        assert_eq!(jobs.separator(), COMMENT_SEPARATOR);
    }

    #[test]
    fn malformed_values_are_errors_naming_the_variable() {
        for (name, value) in [
            ("CFGRADE_MIN_ROLES", "many"),
            ("CFGRADE_CONCURRENCY", "-2"),
            ("CFGRADE_SKIP_COMMENTS", "maybe"),
        ] {
            let err = from_vars(&[(name, value)]).expect_err("malformed value");
            let message = format!("{err:#}");
            assert!(message.contains(name), "{message}");
            assert!(message.contains(value), "{message}");
        }
    }
}
