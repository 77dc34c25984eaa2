//! Test configuration loader for launch scenarios.

use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::OrthoError;
use tempfile::TempDir;

use conductor_config::Config;

use crate::bootstrap::ConfigLoader;

/// Loader pointing the daemon at a properties file in a temporary directory.
pub struct TestConfigLoader {
    _dir: TempDir,
    properties: Utf8PathBuf,
}

impl TestConfigLoader {
    /// Writes `contents` as the properties file.
    #[must_use]
    pub fn with_properties(contents: &str) -> Self {
        let loader = Self::missing_properties();
        std::fs::write(&loader.properties, contents).expect("write properties file");
        loader
    }

    /// Points at a properties file that does not exist.
    #[must_use]
    pub fn missing_properties() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory");
        let path = dir.path().join("conductor.properties");
        let properties = Utf8PathBuf::from_path_buf(path).expect("temporary path was not UTF-8");
        Self {
            _dir: dir,
            properties,
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(Config {
            properties_path: Some(self.properties.clone()),
            ..Config::default()
        })
    }
}
