// Build-time version from Cargo.toml and the build environment

/// Package version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name (from Cargo.toml).
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Commit the binary was built from; set SMBMETRICS_COMMIT_ID when building.
pub const COMMIT_ID: &str = match option_env!("SMBMETRICS_COMMIT_ID") {
    Some(id) => id,
    None => "(unset)",
};
