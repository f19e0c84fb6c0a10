// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers are applied in order:
//! 1. TOML file (or built-in defaults when no file exists)
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, RangelinkConfig, CONFIG_FILE_NAME};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "RANGELINK_CONFIG_PATH";

/// Find the rangelink configuration file
///
/// Search order:
/// 1. `RANGELINK_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if `RANGELINK_CONFIG_PATH` points at a
/// missing file or no file is found in any location.
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "{} points at a missing file: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");
    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration
///
/// With an explicit `config_path` the file must exist. Without one the file is
/// searched for; if none is found the built-in defaults are used. Overrides are
/// applied afterwards in any case.
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<RangelinkConfig> {
    let config_file = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => match find_config_file() {
            Ok(path) => Some(path),
            Err(err) if env::var(CONFIG_PATH_ENV).is_ok() => return Err(err),
            Err(_) => None,
        },
    };

    let mut config = match config_file {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => {
            debug!("No {} found, using defaults", CONFIG_FILE_NAME);
            RangelinkConfig::default()
        }
    };

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `RANGELINK_STREAM_HOST` -> `stream.target_host`
/// - `RANGELINK_STREAM_PORT` -> `stream.target_port`
/// - `RANGELINK_RECEIVER_PORT` -> `receiver.port`
/// - `RANGELINK_PROFILE` -> `bus.profile`
/// - `RANGELINK_WINDOW_WIDTH` -> `receiver.window_width`
/// - `RANGELINK_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut RangelinkConfig) {
    if let Ok(value) = env::var("RANGELINK_STREAM_HOST") {
        config.stream.target_host = value;
    }
    if let Some(port) = env_parse::<u16>("RANGELINK_STREAM_PORT") {
        config.stream.target_port = port;
    }
    if let Some(port) = env_parse::<u16>("RANGELINK_RECEIVER_PORT") {
        config.receiver.port = port;
    }
    if let Ok(value) = env::var("RANGELINK_PROFILE") {
        config.bus.profile = value;
    }
    if let Some(width) = env_parse::<usize>("RANGELINK_WINDOW_WIDTH") {
        config.receiver.window_width = width;
    }
    if let Ok(value) = env::var("RANGELINK_LOG_LEVEL") {
        config.logging.level = value;
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Apply CLI argument overrides to configuration
///
/// Recognised keys: `target`, `profile`, `filter_before_send`, `bind`,
/// `window_width`, `cardinality_policy`, `log_level`. `target` and `bind` are
/// `host:port` pairs; values that fail to parse are ignored.
pub fn apply_cli_overrides(config: &mut RangelinkConfig, cli_args: &HashMap<String, String>) {
    if let Some((host, port)) = cli_args.get("target").and_then(|v| split_host_port(v)) {
        config.stream.target_host = host;
        config.stream.target_port = port;
    }
    if let Some(value) = cli_args.get("profile") {
        config.bus.profile = value.clone();
    }
    if let Some(value) = cli_args.get("filter_before_send") {
        config.sampling.filter_before_send = value == "true" || value == "1";
    }
    if let Some((host, port)) = cli_args.get("bind").and_then(|v| split_host_port(v)) {
        config.receiver.bind_host = host;
        config.receiver.port = port;
    }
    if let Some(width) = cli_args.get("window_width").and_then(|v| v.parse().ok()) {
        config.receiver.window_width = width;
    }
    if let Some(value) = cli_args.get("cardinality_policy") {
        config.receiver.cardinality_policy = value.clone();
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
}

fn split_host_port(value: &str) -> Option<(String, u16)> {
    let (host, port) = value.rsplit_once(':')?;
    let port = port.parse().ok()?;
    Some((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_an_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var(CONFIG_PATH_ENV, "/definitely/not/here/rangelink.toml");
        let result = load_config(None, None);
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_partial_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[bus]").unwrap();
        writeln!(file, "channel_count = 4").unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "present_channels = [0, 2, 5]").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.bus.channel_count, 4);
        assert_eq!(config.bus.sensor_address, 0x29);
        assert_eq!(config.simulation.present_channels, vec![0, 2, 5]);
        assert_eq!(config.receiver.window_width, 100);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[bus\nchannel_count = ").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = RangelinkConfig::default();

        env::set_var("RANGELINK_STREAM_HOST", "169.254.210.175");
        env::set_var("RANGELINK_STREAM_PORT", "6006");
        env::set_var("RANGELINK_WINDOW_WIDTH", "not-a-number");

        apply_environment_overrides(&mut config);

        env::remove_var("RANGELINK_STREAM_HOST");
        env::remove_var("RANGELINK_STREAM_PORT");
        env::remove_var("RANGELINK_WINDOW_WIDTH");

        assert_eq!(config.stream.target_host, "169.254.210.175");
        assert_eq!(config.stream.target_port, 6006);
        assert_eq!(config.receiver.window_width, 100);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = RangelinkConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("target".to_string(), "10.0.0.1:7777".to_string());
        cli_args.insert("profile".to_string(), "high_speed".to_string());
        cli_args.insert("bind".to_string(), "bogus".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.stream.target_host, "10.0.0.1");
        assert_eq!(config.stream.target_port, 7777);
        assert_eq!(config.bus.profile, "high_speed");
        assert_eq!(config.receiver.bind(), "0.0.0.0:5005");
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &config_path,
            "[stream]\ntarget_host = \"file-host\"\ntarget_port = 5000\n",
        )
        .unwrap();

        env::set_var("RANGELINK_STREAM_HOST", "env-host");
        env::set_var("RANGELINK_STREAM_PORT", "6000");

        let mut cli_args = HashMap::new();
        cli_args.insert("profile".to_string(), "long_range".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("RANGELINK_STREAM_HOST");
        env::remove_var("RANGELINK_STREAM_PORT");

        assert_eq!(config.stream.target(), "env-host:6000");
        assert_eq!(config.bus.profile, "long_range");
    }
}
