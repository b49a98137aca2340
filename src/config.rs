//! Crate-wide defaults.
//!
//! [`VirtualTree::new`](crate::vfs::VirtualTree::new) and
//! [`Syncer::new`](crate::sync::Syncer::new) read these; both can be
//! overridden per instance. Use [`ConfigBuilder`] at application startup to
//! change them for the whole process.

use std::sync::OnceLock;

use crate::sync::StampKind;

/// Global configuration, initialized via [`ConfigBuilder::init`].
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Runtime defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Permission bits for files created by sync.
    pub file_mode: u32,
    /// How sync detects changed files.
    pub stamp: StampKind,
    /// Whether virtual trees memoize generated files.
    pub cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file_mode: 0o644,
            stamp: StampKind::Metadata,
            cache: true,
        }
    }
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    file_mode: Option<u32>,
    stamp: Option<StampKind>,
    cache: Option<bool>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the permission bits for created files.
    ///
    /// Default: `0o644`
    pub fn file_mode(mut self, mode: u32) -> Self {
        self.file_mode = Some(mode);
        self
    }

    /// Set the default stamp strategy.
    ///
    /// Default: [`StampKind::Metadata`]
    pub fn stamp(mut self, stamp: StampKind) -> Self {
        self.stamp = Some(stamp);
        self
    }

    /// Enable or disable caching of generated files.
    ///
    /// Default: `true`
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }

    /// Build a configuration without installing it.
    pub fn build(self) -> Config {
        let default = Config::default();
        Config {
            file_mode: self.file_mode.unwrap_or(default.file_mode),
            stamp: self.stamp.unwrap_or(default.stamp),
            cache: self.cache.unwrap_or(default.cache),
        }
    }

    /// Build and initialize the global configuration.
    ///
    /// This can only be called once, before the first [`get`]. Returns `true`
    /// if configuration was set, `false` if already initialized.
    ///
    /// # Example
    ///
    /// ```
    /// use genfs::config::ConfigBuilder;
    /// use genfs::sync::StampKind;
    ///
    /// ConfigBuilder::new()
    ///     .stamp(StampKind::Content)
    ///     .file_mode(0o600)
    ///     .init();
    /// ```
    pub fn init(self) -> bool {
        CONFIG.set(self.build()).is_ok()
    }
}

/// Get the current configuration, or default if not initialized.
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.file_mode, 0o644);
        assert_eq!(config.stamp, StampKind::Metadata);
        assert!(config.cache);
    }

    #[test]
    fn test_builder() {
        let config = ConfigBuilder::new().file_mode(0o600).cache(false).build();
        assert_eq!(config.file_mode, 0o600);
        assert_eq!(config.stamp, StampKind::Metadata);
        assert!(!config.cache);
    }
}
