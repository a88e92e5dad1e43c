//! Configuration for the skip list generator.
//!
//! Every setting has a built-in default matching the upstream AM32 layout,
//! so running without flags compares `Inc/targets.h` against the pinned
//! release tag. Each setting can be overridden, in order of precedence, by
//! a CLI flag, an environment variable, or an optional TOML config file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::release::release_api_url;

/// Upstream repository publishing the official firmware images.
pub const DEFAULT_REPO: &str = "am32-firmware/AM32";

/// Release tag compared against when nothing else is configured.
pub const DEFAULT_TAG: &str = "v2.20";

/// Local header declaring the build targets, relative to the working directory.
pub const DEFAULT_TARGETS_FILE: &str = "Inc/targets.h";

const RELEASE_URL_ENV_VAR: &str = "AM32_RELEASE_URL";
const RELEASE_TAG_ENV_VAR: &str = "AM32_RELEASE_TAG";
const TARGETS_FILE_ENV_VAR: &str = "AM32_TARGETS_FILE";
const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Optional settings persisted in a TOML file passed with `--config`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipConfig {
    /// Repository in `owner/name` form.
    pub repo: Option<String>,
    /// Release tag, e.g. "v2.20".
    pub tag: Option<String>,
    /// Full release-metadata endpoint. Takes precedence over `repo`/`tag`.
    pub release_url: Option<String>,
    /// Path to the local targets header.
    pub targets_file: Option<String>,
}

/// Values supplied on the command line for this invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub repo: Option<String>,
    pub tag: Option<String>,
    pub release_url: Option<String>,
    pub targets_file: Option<String>,
}

/// Environment values consulted during resolution.
///
/// Captured up front so resolution itself stays a pure function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvValues {
    pub release_url: Option<String>,
    pub tag: Option<String>,
    pub targets_file: Option<String>,
    pub token: Option<String>,
}

impl EnvValues {
    /// Read the supported variables from the process environment.
    pub fn from_process() -> Self {
        Self {
            release_url: std::env::var(RELEASE_URL_ENV_VAR).ok(),
            tag: std::env::var(RELEASE_TAG_ENV_VAR).ok(),
            targets_file: std::env::var(TARGETS_FILE_ENV_VAR).ok(),
            token: std::env::var(TOKEN_ENV_VAR).ok(),
        }
    }
}

/// Fully resolved settings handed to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Release-metadata endpoint to query.
    pub release_url: String,
    /// Local targets header to scan.
    pub targets_file: PathBuf,
    /// Optional bearer token for the GitHub API.
    pub token: Option<String>,
    /// Whether `release_url` uses a non-HTTPS scheme (user should be warned).
    pub is_non_https: bool,
}

impl ResolvedConfig {
    /// Build a config pointing at explicit locations, with no token.
    pub fn new(release_url: impl Into<String>, targets_file: impl Into<PathBuf>) -> Self {
        let release_url = release_url.into();
        let is_non_https = !release_url.starts_with("https://");
        Self {
            release_url,
            targets_file: targets_file.into(),
            token: None,
            is_non_https,
        }
    }
}

impl SkipConfig {
    /// Load a config file. Unlike the built-in defaults, an explicitly
    /// requested file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))
    }

    /// Resolve the effective settings using layered precedence.
    ///
    /// Priority (highest wins): CLI flag, environment variable, config file,
    /// built-in default. The repository has no environment variable. Empty
    /// or whitespace-only values at any layer fall through to the next.
    pub fn resolve(&self, cli: &CliOverrides, env: EnvValues) -> ResolvedConfig {
        let release_url = first_non_empty([
            cli.release_url.clone(),
            env.release_url,
            self.release_url.clone(),
        ])
        .unwrap_or_else(|| {
            let tag = first_non_empty([cli.tag.clone(), env.tag, self.tag.clone()])
                .unwrap_or_else(|| DEFAULT_TAG.to_string());
            let repo = first_non_empty([cli.repo.clone(), self.repo.clone()])
                .unwrap_or_else(|| DEFAULT_REPO.to_string());
            release_api_url(&repo, &tag)
        });

        let targets_file = first_non_empty([
            cli.targets_file.clone(),
            env.targets_file,
            self.targets_file.clone(),
        ])
        .unwrap_or_else(|| DEFAULT_TARGETS_FILE.to_string());

        let mut resolved = ResolvedConfig::new(release_url, targets_file);
        resolved.token = non_empty_trimmed(env.token);
        resolved
    }
}

/// Return the first layer holding a non-empty value.
fn first_non_empty<const N: usize>(layers: [Option<String>; N]) -> Option<String> {
    layers.into_iter().find_map(non_empty_trimmed)
}

/// Return the trimmed value if non-empty after trimming, otherwise `None`.
fn non_empty_trimmed(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
