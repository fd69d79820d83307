//! Reserved identifiers shared across the worker.

/// URL the deployment manifest is served from.
pub const MANIFEST_URL: &str = "/manifest.appcache";

/// Cache holding the manifest text of the version currently serving traffic.
pub const CACHE_ACTIVE: &str = "ngsw.active";

/// Cache staging the manifest text of a version being installed.
pub const CACHE_INSTALLING: &str = "ngsw.installing";

/// Prefix of every per-group content cache.
pub const GROUP_CACHE_PREFIX: &str = "ngsw.cache.";
