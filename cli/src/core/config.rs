//! # clapi Configuration System
//!
//! File: cli/src/core/config.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module loads, merges and validates the configuration that supplies
//! defaults for wrapper instances created by the `clapi` binary: the line
//! prefix, the execution mode, the working directory of wrapped commands,
//! the shell used for one-shot exec, and the disconnect grace period.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. Project-specific `.clapi.toml` in the current directory or an ancestor
//!    (the search stops at the first directory containing `.git`)
//! 2. User-specific `config.toml` in the platform config directory
//!    (e.g. `~/.config/clapi/config.toml` on Linux)
//! 3. Default values defined in the code
//!
//! Paths are expanded (`~` to the home directory) and the merged result is
//! validated before use. Command-line flags override the loaded values.
//!
//! ## Examples
//!
//! ```toml
//! [wrapper]
//! prefix = "git: "
//! persistent = false
//! working_dir = "~/code/project"
//! shell = "bash"
//! shell_args = ["-c"]
//! disconnect_grace_ms = 500
//! ```
//!
//! ```rust,ignore
//! let cfg = config::load_config()?;
//! let host = NativeHost::new(cfg.host_options());
//! let git = Wrapper::with_host("git", cfg.wrapper_options(), Arc::new(host));
//! let status = git.send("status", ["--short"]).await?;
//! ```
//!
use crate::common::process::HostOptions;
use crate::core::error::{ClapiError, Result};
use crate::wrapper::WrapperOptions;
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub wrapper: WrapperConfig,
}

/// Defaults applied to every wrapper instance created by the CLI.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WrapperConfig {
    /// String prepended to every captured line.
    #[serde(default)]
    pub prefix: String,
    /// Reuse one long-lived process instead of exec-per-call.
    #[serde(default)]
    pub persistent: bool,
    /// Working directory for wrapped commands (can use ~). Will be expanded.
    #[serde(default)]
    pub working_dir: Option<String>,
    /// Shell used to run one-shot command lines.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Arguments passed to the shell before the command line.
    #[serde(default = "default_shell_args")]
    pub shell_args: Vec<String>,
    /// Time a persistent process gets to exit after its input is closed.
    #[serde(default = "default_disconnect_grace_ms")]
    pub disconnect_grace_ms: u64,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            persistent: false,
            working_dir: None,
            shell: default_shell(),
            shell_args: default_shell_args(),
            disconnect_grace_ms: default_disconnect_grace_ms(),
        }
    }
}

fn default_shell() -> String {
    if cfg!(windows) {
        "cmd".to_string()
    } else {
        "sh".to_string()
    }
}
fn default_shell_args() -> Vec<String> {
    if cfg!(windows) {
        vec!["/C".to_string()]
    } else {
        vec!["-c".to_string()]
    }
}
fn default_disconnect_grace_ms() -> u64 {
    2000
}

impl Config {
    /// Options for the native process host built from this configuration.
    pub fn host_options(&self) -> HostOptions {
        HostOptions {
            shell: self.wrapper.shell.clone(),
            shell_args: self.wrapper.shell_args.clone(),
            disconnect_grace: Duration::from_millis(self.wrapper.disconnect_grace_ms),
        }
    }

    /// Wrapper options built from this configuration.
    pub fn wrapper_options(&self) -> WrapperOptions {
        WrapperOptions {
            persistent: self.wrapper.persistent,
            prefix: self.wrapper.prefix.clone(),
            working_dir: self.wrapper.working_dir.as_ref().map(PathBuf::from),
            ..WrapperOptions::default()
        }
    }
}

const PROJECT_CONFIG_FILENAME: &str = ".clapi.toml";

pub fn load_config() -> Result<Config> {
    let user_config = load_user_config()?;
    let project_config = load_project_config()?;
    let mut merged_config = merge_configs(user_config.unwrap_or_default(), project_config);
    expand_config_paths(&mut merged_config).context("Failed to expand paths in configuration")?;
    validate_config(&merged_config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", merged_config);
    Ok(merged_config)
}

fn load_user_config() -> Result<Option<Config>> {
    if let Some(proj_dirs) = ProjectDirs::from("dev", "clapi", "clapi") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_config_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<Config>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    if let Some(project_config_path) = find_project_config_path(&current_dir) {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_config_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.clapi.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

fn find_project_config_path(start: &Path) -> Option<PathBuf> {
    let mut path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Some(project_config);
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return None;
        }
        path = path.parent()?;
    }
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Project values win wherever they differ from the built-in defaults.
fn merge_configs(user: Config, project: Option<Config>) -> Config {
    let project = match project {
        Some(p) => p.wrapper,
        None => return user,
    };
    let user = user.wrapper;
    let defaults = WrapperConfig::default();
    Config {
        wrapper: WrapperConfig {
            prefix: if project.prefix != defaults.prefix {
                project.prefix
            } else {
                user.prefix
            },
            persistent: project.persistent || user.persistent,
            working_dir: project.working_dir.or(user.working_dir),
            shell: if project.shell != defaults.shell {
                project.shell
            } else {
                user.shell
            },
            shell_args: if project.shell_args != defaults.shell_args {
                project.shell_args
            } else {
                user.shell_args
            },
            disconnect_grace_ms: if project.disconnect_grace_ms != defaults.disconnect_grace_ms {
                project.disconnect_grace_ms
            } else {
                user.disconnect_grace_ms
            },
        },
    }
}

fn expand_config_paths(config: &mut Config) -> Result<()> {
    if let Some(dir) = config.wrapper.working_dir.as_mut() {
        *dir = shellexpand::tilde(dir.as_str()).into_owned();
        debug!("Expanded working directory: {}", dir);
    }
    Ok(())
}

fn validate_config(config: &Config) -> Result<()> {
    info!("Validating final configuration...");
    if config.wrapper.shell.trim().is_empty() {
        return Err(anyhow!(ClapiError::Config(
            "Shell cannot be empty.".to_string()
        )));
    }
    if let Some(dir) = &config.wrapper.working_dir {
        let dir = PathBuf::from(dir);
        if !dir.exists() {
            return Err(anyhow!(ClapiError::Config(format!(
                "Configured working directory '{}' does not exist.",
                dir.display()
            ))));
        }
        if !dir.is_dir() {
            return Err(anyhow!(ClapiError::Config(format!(
                "Configured working directory '{}' exists but is not a directory.",
                dir.display()
            ))));
        }
    }
    info!("Configuration validation successful.");
    Ok(())
}
