//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and
//! then passed into core services. The intent is to avoid reading process-wide
//! environment variables during request handling, which can lead to inconsistent
//! behaviour in multi-threaded runtimes and test harnesses.

use crate::constants::CONVERSIONS_DIR_NAME;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    conversion_data_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` rooted at the given data directory.
    ///
    /// The directory does not need to exist yet; repositories create their
    /// subdirectories on first write.
    pub fn new(conversion_data_dir: PathBuf) -> Self {
        Self {
            conversion_data_dir,
        }
    }

    /// The root directory for all durable conversion data.
    pub fn conversion_data_dir(&self) -> &Path {
        &self.conversion_data_dir
    }

    /// The directory holding sharded conversion record directories.
    pub fn conversions_dir(&self) -> PathBuf {
        self.conversion_data_dir.join(CONVERSIONS_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_dir_is_under_data_dir() {
        let cfg = CoreConfig::new(PathBuf::from("/srv/bridge"));
        assert_eq!(cfg.conversion_data_dir(), Path::new("/srv/bridge"));
        assert_eq!(cfg.conversions_dir(), PathBuf::from("/srv/bridge/conversions"));
    }
}
