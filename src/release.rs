//! Remote target listing from a GitHub release.
//!
//! Fetches the release metadata for a single tag, keeps the `.hex` firmware
//! images, and reduces each file name to the target identifier used by the
//! `#ifdef` blocks in `targets.h`.
//!
//! The production endpoint is derived from the configured repository and tag.
//! Tests inject a local HTTP server URL via `fetch_remote_targets()`.

use anyhow::{Context, Result, bail};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::output;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Base URL of the GitHub REST API.
const GITHUB_API_BASE: &str = "https://api.github.com";

/// User-Agent header sent with GitHub API requests (required by GitHub).
const USER_AGENT: &str = concat!("am32-release-skip/", env!("CARGO_PKG_VERSION"));

/// Media type recommended by the GitHub REST API.
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Extension of published firmware images.
const FIRMWARE_EXTENSION: &str = ".hex";

/// Prefix carried by every official artifact name.
const ARTIFACT_PREFIX: &str = "AM32_";

/// Trailing version suffix: `_2.20.hex`, `_v2.20.hex`, `_V2.20.HEX`.
static VERSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)_v?[0-9]+\.[0-9]+\.hex$").expect("version suffix pattern is valid")
});

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// The subset of a GitHub release response this tool reads.
///
/// `assets` tolerates absence; everything else in the payload is ignored.
#[derive(Debug, Deserialize)]
pub struct Release {
    /// The git tag for this release, when the payload carries one.
    #[serde(default)]
    pub tag_name: Option<String>,

    /// Files attached to the release.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A single file attached to a GitHub release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Filename of the asset (e.g., "AM32_NEUTRON_2_6S_AIO_F421_2.20.hex").
    pub name: String,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Builds the REST endpoint for a release tag.
pub fn release_api_url(repo: &str, tag: &str) -> String {
    format!("{GITHUB_API_BASE}/repos/{repo}/releases/tags/{tag}")
}

/// Reduces a published artifact name to its target identifier.
///
/// Returns `None` for anything that is not a `.hex` image. The `AM32_`
/// prefix and the trailing `_<major>.<minor>.hex` version are removed and
/// the rest is uppercased:
///
/// ```
/// use am32_release_skip::release::normalize_asset_name;
/// assert_eq!(
///     normalize_asset_name("AM32_NEUTRON_2_6S_AIO_F421_2.20.hex").as_deref(),
///     Some("NEUTRON_2_6S_AIO_F421")
/// );
/// assert_eq!(normalize_asset_name("checksums.txt"), None);
/// ```
pub fn normalize_asset_name(name: &str) -> Option<String> {
    if !name.ends_with(FIRMWARE_EXTENSION) {
        return None;
    }

    let unprefixed = name.strip_prefix(ARTIFACT_PREFIX).unwrap_or(name);
    let bare = VERSION_SUFFIX.replace(unprefixed, "");
    Some(bare.to_uppercase())
}

/// Collects the identifiers of every firmware image in a release.
pub fn remote_targets(release: &Release) -> BTreeSet<String> {
    release
        .assets
        .iter()
        .filter_map(|asset| normalize_asset_name(&asset.name))
        .collect()
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Builds the HTTP client with standard headers.
///
/// No request timeout is set; a slow release server is waited on.
fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Fetches and decodes the release metadata at `url`.
///
/// Non-success statuses, connection failures, and undecodable bodies are all
/// errors. A bearer token is attached when provided.
pub fn fetch_release(url: &str, token: Option<&str>) -> Result<Release> {
    let client = build_http_client()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime for HTTP request")?;

    runtime.block_on(async move {
        let mut request = client
            .get(url)
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT);
        if let Some(token) = token {
            request = request.header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request to release server at {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Release server returned HTTP {status} for {url}");
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read release metadata body")?;

        serde_json::from_slice(&body).context("Failed to decode release metadata")
    })
}

/// Fetches a release and returns the set of published target identifiers.
pub fn fetch_remote_targets(url: &str, token: Option<&str>) -> Result<BTreeSet<String>> {
    output::action("Fetching", &format!("release info from {url}"));

    let release = fetch_release(url, token)?;
    let targets = remote_targets(&release);

    let tag = release.tag_name.as_deref().unwrap_or("(untagged)");
    output::success(
        "Found",
        &format!("{} targets in release {tag}", targets.len()),
    );
    for target in &targets {
        output::detail(target);
    }

    Ok(targets)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- normalize_asset_name ------------------------------------------------

    #[test]
    fn normalize_strips_prefix_and_version() {
        assert_eq!(
            normalize_asset_name("AM32_NEUTRON_2_6S_AIO_F421_2.20.hex").as_deref(),
            Some("NEUTRON_2_6S_AIO_F421")
        );
    }

    #[test]
    fn normalize_accepts_v_prefixed_version() {
        assert_eq!(
            normalize_asset_name("AM32_TEKKO32_F051_v2.19.hex").as_deref(),
            Some("TEKKO32_F051")
        );
    }

    #[test]
    fn normalize_version_suffix_is_case_insensitive() {
        assert_eq!(
            normalize_asset_name("AM32_FOO_F421_V2.20.hex").as_deref(),
            Some("FOO_F421")
        );
        assert_eq!(
            normalize_asset_name("AM32_Bar_G071_V10.3.hex").as_deref(),
            Some("BAR_G071")
        );
    }

    #[test]
    fn normalize_uppercases_remainder() {
        assert_eq!(
            normalize_asset_name("AM32_mamba_f40_2.20.hex").as_deref(),
            Some("MAMBA_F40")
        );
    }

    #[test]
    fn normalize_without_prefix_keeps_name() {
        assert_eq!(
            normalize_asset_name("REPEAT_DRIVE_F051_2.20.hex").as_deref(),
            Some("REPEAT_DRIVE_F051")
        );
    }

    #[test]
    fn normalize_prefix_is_case_sensitive() {
        assert_eq!(
            normalize_asset_name("am32_FOO_2.20.hex").as_deref(),
            Some("AM32_FOO")
        );
    }

    #[test]
    fn normalize_without_version_keeps_extension() {
        assert_eq!(normalize_asset_name("AM32_FOO.hex").as_deref(), Some("FOO.HEX"));
    }

    #[test]
    fn normalize_only_strips_trailing_version() {
        assert_eq!(
            normalize_asset_name("AM32_FOO_1.2_BAR_2.20.hex").as_deref(),
            Some("FOO_1.2_BAR")
        );
    }

    #[test]
    fn normalize_rejects_non_hex() {
        assert_eq!(normalize_asset_name("AM32_FOO_2.20.bin"), None);
        assert_eq!(normalize_asset_name("AM32_FOO_2.20.hex.zip"), None);
        assert_eq!(normalize_asset_name("checksums-sha256.txt"), None);
    }

    #[test]
    fn normalize_extension_check_is_case_sensitive() {
        assert_eq!(normalize_asset_name("AM32_FOO_2.20.HEX"), None);
    }

    // -- remote_targets ------------------------------------------------------

    fn release_from(json: &str) -> Release {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn remote_targets_collects_and_dedupes() {
        let release = release_from(
            r#"{
                "tag_name": "v2.20",
                "assets": [
                    {"name": "AM32_NEUTRON_2_6S_AIO_F421_2.20.hex", "size": 1},
                    {"name": "AM32_neutron_2_6s_aio_f421_v2.20.hex"},
                    {"name": "AM32_MAMBA_F40_2.20.hex"},
                    {"name": "AM32_Bootloaders.zip"}
                ]
            }"#,
        );
        let targets = remote_targets(&release);
        assert_eq!(
            targets.into_iter().collect::<Vec<_>>(),
            vec!["MAMBA_F40".to_string(), "NEUTRON_2_6S_AIO_F421".to_string()]
        );
    }

    #[test]
    fn release_without_assets_is_empty() {
        let release = release_from(r#"{"tag_name": "v2.20"}"#);
        assert!(release.assets.is_empty());
        assert!(remote_targets(&release).is_empty());
    }

    #[test]
    fn asset_without_name_fails_to_decode() {
        let result = serde_json::from_str::<Release>(r#"{"assets": [{"size": 10}]}"#);
        assert!(result.is_err());
    }

    // -- release_api_url -----------------------------------------------------

    #[test]
    fn api_url_for_tag() {
        assert_eq!(
            release_api_url("am32-firmware/AM32", "v2.20"),
            "https://api.github.com/repos/am32-firmware/AM32/releases/tags/v2.20"
        );
    }
}
