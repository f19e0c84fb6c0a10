// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Verbosity and per-crate debug flags
//!
//! The tools accept an optional positional `debug` / `info` argument that
//! controls how much discovery detail is printed. On top of that,
//! `--debug-{crate}` or `--debug-all` (or `RANGELINK_DEBUG`) turn on debug
//! logging for individual crates.

use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::KNOWN_CRATES;

/// Environment variable listing crates to debug (comma-separated or `all`)
pub const DEBUG_ENV: &str = "RANGELINK_DEBUG";

/// Console verbosity selected by the positional CLI argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// No argument: warnings and errors only
    #[default]
    Quiet,
    /// `info`: which sensors were found and where
    Info,
    /// `debug`: every probe, start and stop
    Debug,
}

impl Verbosity {
    /// Filter directive for this verbosity
    pub fn as_directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        })
    }
}

/// Unknown verbosity word
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown verbosity '{0}' (expected 'debug' or 'info')")]
pub struct ParseVerbosityError(String);

impl FromStr for Verbosity {
    type Err = ParseVerbosityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Verbosity::Debug),
            "info" => Ok(Verbosity::Info),
            "quiet" => Ok(Verbosity::Quiet),
            other => Err(ParseVerbosityError(other.to_string())),
        }
    }
}

/// Parsed verbosity plus per-crate debug flags
#[derive(Debug, Clone, Default)]
pub struct DebugFlags {
    pub verbosity: Verbosity,
    pub enabled_crates: BTreeSet<String>,
}

impl DebugFlags {
    /// Flags with just a verbosity level
    pub fn from_verbosity(verbosity: Option<Verbosity>) -> Self {
        Self {
            verbosity: verbosity.unwrap_or_default(),
            enabled_crates: BTreeSet::new(),
        }
    }

    /// Parse raw command-line arguments
    ///
    /// Recognises a bare `debug` / `info` word, `--debug-all` and
    /// `--debug-{crate}`. Everything else is ignored so this can run next to a
    /// real argument parser.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = DebugFlags::default();

        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string());
            } else if let Ok(verbosity) = arg.parse::<Verbosity>() {
                flags.verbosity = flags.verbosity.max(verbosity);
            }
        }

        flags
    }

    /// Merge crates named in `RANGELINK_DEBUG`
    pub fn with_env(mut self) -> Self {
        if let Ok(env_var) = env::var(DEBUG_ENV) {
            self.merge_env_value(&env_var);
        }
        self
    }

    fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Log level for a crate
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) || self.verbosity == Verbosity::Debug {
            tracing::Level::DEBUG
        } else if self.verbosity == Verbosity::Info {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }

    /// Build an `EnvFilter` directive string
    ///
    /// `default_level` is used when no verbosity word was given. Crate names
    /// are converted to their tracing target form (`rangelink-hal` ->
    /// `rangelink_hal`).
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let base = match self.verbosity {
            Verbosity::Quiet => default_level,
            other => other.as_directive(),
        };

        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_")))
            .collect();
        filters.push(base.to_string());
        filters.join(",")
    }
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Verbosity:
  info                           Report which sensors were found
  debug                          Report every probe, start and stop

Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for one crate

Available crates:
  {}

Environment Variable:
  {}={{crate-name}}[,{{crate-name}}]  or  {}=all
  RUST_LOG overrides all of the above
"#,
        KNOWN_CRATES.join(", "),
        DEBUG_ENV,
        DEBUG_ENV
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_verbosity() {
        assert_eq!(DebugFlags::from_args(args(&["debug"])).verbosity, Verbosity::Debug);
        assert_eq!(DebugFlags::from_args(args(&["info"])).verbosity, Verbosity::Info);
        assert_eq!(DebugFlags::from_args(args(&["stream"])).verbosity, Verbosity::Quiet);
    }

    #[test]
    fn test_debug_wins_over_info() {
        let flags = DebugFlags::from_args(args(&["info", "debug"]));
        assert_eq!(flags.verbosity, Verbosity::Debug);
    }

    #[test]
    fn test_single_crate_flag() {
        let flags = DebugFlags::from_args(args(&["--debug-rangelink-hal"]));
        assert!(flags.is_enabled("rangelink-hal"));
        assert!(!flags.is_enabled("rangelink-acquisition"));
        assert_eq!(flags.log_level("rangelink-hal"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("rangelink-acquisition"), tracing::Level::WARN);
    }

    #[test]
    fn test_debug_all() {
        let flags = DebugFlags::from_args(args(&["--debug-all"]));
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_env_value_merge() {
        let mut flags = DebugFlags::default();
        flags.merge_env_value(" rangelink-smoothing , ,rangelink-transports");
        assert!(flags.is_enabled("rangelink-smoothing"));
        assert!(flags.is_enabled("rangelink-transports"));
        assert_eq!(flags.enabled_crates.len(), 2);
    }

    #[test]
    fn test_filter_string() {
        let flags = DebugFlags::from_args(args(&["--debug-rangelink-hal"]));
        assert_eq!(flags.to_filter_string("warn"), "rangelink_hal=debug,warn");

        let flags = DebugFlags::from_verbosity(Some(Verbosity::Info));
        assert_eq!(flags.to_filter_string("warn"), "info");
    }

    #[test]
    fn test_verbosity_parse_error() {
        assert!("loud".parse::<Verbosity>().is_err());
        assert_eq!("INFO".parse::<Verbosity>().unwrap(), Verbosity::Info);
    }
}
