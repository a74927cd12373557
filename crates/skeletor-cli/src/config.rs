//! Settings loading for the CLI.
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults of [`MigrationSettings`]
//! 2. TOML file (`--config`, default `./skeletor.toml`), optional
//! 3. Environment variables prefixed with `SKELETOR_`, `__` between
//!    sections (e.g. `SKELETOR_GITHUB__TOKEN`)
//!
//! `[users]` mappings are read from the file only. Environment keys are
//! lowercased on the way in, which would lose the case of GitLab usernames.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use skeletor_migrate::MigrationSettings;
use std::path::Path;

/// Default settings file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "skeletor.toml";

const ENV_PREFIX: &str = "SKELETOR";

/// Environment keys that would land in the `users` table.
const USERS_ENV_PREFIX: &str = "SKELETOR_USERS__";

/// Load settings from `path` (if it exists) and the process environment.
pub fn load(path: &Path) -> Result<MigrationSettings> {
    load_with_env(path, None)
}

fn load_with_env(
    path: &Path,
    env: Option<config::Map<String, String>>,
) -> Result<MigrationSettings> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "Loading settings file");
    }

    let mut env = env.unwrap_or_else(|| std::env::vars().collect());
    env.retain(|key, _| {
        let user_key = key.to_ascii_uppercase().starts_with(USERS_ENV_PREFIX);
        if user_key {
            tracing::warn!(key = key.as_str(), "Ignoring user mapping from environment");
        }
        !user_key
    });

    let settings = Config::builder()
        .add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(env)),
        )
        .build()
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;

    settings
        .try_deserialize::<MigrationSettings>()
        .context("Invalid settings")
}
