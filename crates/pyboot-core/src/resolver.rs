//! Installer resolution against a listing-only mirror.
//!
//! The mirror has no availability API. Versions come from scraping the root
//! index page, and whether a given `(version, arch)` build exists is only
//! known by trying to download it. A failed or empty download is a miss,
//! not an error: scanning moves on to the next candidate and stops at the
//! first one that produces a non-empty file.

use std::path::Path;
use std::sync::LazyLock;

use pyboot_schema::{DownloadedArtifact, HostArch, RuntimeVersion, VersionCandidate};
use regex::Regex;

use crate::Reporter;
use crate::error::ResolutionError;
use crate::io::MirrorClient;

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*?href\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static VERSION_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.\d+\.\d+)/$").unwrap());

/// Extract release versions from a directory listing, newest first.
///
/// Only anchors whose href is exactly `N.N.N/` count; everything else in
/// the page is ignored.
pub fn parse_listing(html: &str) -> Vec<RuntimeVersion> {
    let mut versions: Vec<RuntimeVersion> = HREF
        .captures_iter(html)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)))
        .filter_map(|href| VERSION_DIR.captures(href.as_str()))
        .filter_map(|c| c[1].parse().ok())
        .collect();

    versions.sort_by(|a, b| b.cmp(a));
    versions.dedup();
    versions
}

/// Lazily enumerate the search space: each version newest first, each with
/// its architecture tags in host preference order.
pub fn candidates<'a>(
    mirror_root: &'a str,
    versions: &'a [RuntimeVersion],
    arch: HostArch,
) -> impl Iterator<Item = VersionCandidate> + 'a {
    versions.iter().flat_map(move |version| {
        arch.candidate_tags()
            .into_iter()
            .map(move |tag| VersionCandidate::new(mirror_root, version.clone(), tag))
    })
}

/// Listing URL for a mirror root (always with a trailing slash).
pub fn listing_url(mirror_root: &str) -> String {
    format!("{}/", mirror_root.trim_end_matches('/'))
}

/// Fetch the listing and the available versions, newest first.
///
/// # Errors
///
/// Returns [`ResolutionError::Listing`] if the listing cannot be fetched.
pub async fn fetch_versions(
    mirror: &dyn MirrorClient,
    mirror_root: &str,
) -> Result<Vec<RuntimeVersion>, ResolutionError> {
    let url = listing_url(mirror_root);
    let html = mirror
        .fetch_listing(&url)
        .await
        .map_err(|source| ResolutionError::Listing { url, source })?;

    let versions = parse_listing(&html);
    tracing::debug!("Mirror lists {} release versions", versions.len());
    Ok(versions)
}

/// Download the newest installer that exists for this host.
///
/// # Errors
///
/// Returns an error if the listing cannot be fetched, the scratch directory
/// cannot be created, or no candidate downloads with a non-zero size.
pub async fn resolve_latest_installer(
    mirror: &dyn MirrorClient,
    mirror_root: &str,
    arch: HostArch,
    scratch_dir: &Path,
    reporter: &dyn Reporter,
) -> Result<DownloadedArtifact, ResolutionError> {
    let versions = fetch_versions(mirror, mirror_root).await?;

    std::fs::create_dir_all(scratch_dir).map_err(|source| ResolutionError::Scratch {
        path: scratch_dir.to_path_buf(),
        source,
    })?;

    let mut tried = 0;
    for candidate in candidates(mirror_root, &versions, arch) {
        tried += 1;
        let dest = scratch_dir.join(&candidate.file_name);
        tracing::debug!("Trying {}", candidate.url);

        match mirror.download(&candidate.url, &dest, reporter).await {
            Ok(size) => {
                if let Some(artifact) =
                    DownloadedArtifact::new(candidate.version, candidate.arch_tag, dest.clone(), size)
                {
                    reporter.success(&format!(
                        "Downloaded {} ({} bytes)",
                        candidate.file_name, size
                    ));
                    return Ok(artifact);
                }
                tracing::warn!("{} downloaded empty, skipping", candidate.file_name);
                reporter.candidate_missed(&candidate.file_name, "empty download");
            }
            Err(e) => {
                tracing::warn!("{} unavailable: {e}", candidate.file_name);
                reporter.candidate_missed(&candidate.file_name, &e.to_string());
            }
        }
        tokio::fs::remove_file(&dest).await.ok();
    }

    Err(ResolutionError::NoUsableInstaller {
        mirror: mirror_root.to_string(),
        tried,
    })
}
