//! Release retention window.
//!
//! An object tagged with release `r` survives while `r + keep > current`.
//! Both orphan cleanup and the release refresh of still-served objects ask
//! [`is_evictable`]; nothing else decides retention.

use assetsync_core::Release;

/// True when an object recorded at `object_release` falls outside the
/// `keep`-release window ending at `current`.
pub fn is_evictable(object_release: Release, current: Release, keep: u64) -> bool {
    object_release.0.saturating_add(keep) <= current.0
}
