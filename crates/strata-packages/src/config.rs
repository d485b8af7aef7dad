use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PackageDiffError, PackageDiffResult};
use crate::overlay::PackageListFile;
use crate::remote::{RemoteServiceConfig, RepositoryConfig};

/// Top-level configuration file. Every section and key is optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    pub image: ImageConfig,
    pub differ: DifferConfig,
    pub repository: RepositorySection,
    pub overlay: OverlayConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub name: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            name: "ghcr.io/vanilla-os/desktop".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifferConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for DifferConfig {
    fn default() -> Self {
        Self {
            url: "https://differ.vanillaos.org".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySection {
    /// Must contain `{packageName}`.
    pub package_url: String,
    pub timeout_secs: u64,
}

impl Default for RepositorySection {
    fn default() -> Self {
        Self {
            package_url: "https://packages.vanillaos.org/api/pkg/{packageName}".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub packages_add: PathBuf,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            packages_add: PathBuf::from("/etc/abroot/packages.add"),
        }
    }
}

impl StrataConfig {
    pub fn from_toml_str(s: &str) -> PackageDiffResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| PackageDiffError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> PackageDiffResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            PackageDiffError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> PackageDiffResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(PackageDiffError::Config(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    fn validate(&self) -> PackageDiffResult<()> {
        if self.differ.timeout_secs == 0 || self.repository.timeout_secs == 0 {
            return Err(PackageDiffError::Config("timeout_secs must be positive".into()));
        }
        if !self
            .repository
            .package_url
            .contains(crate::remote::PACKAGE_NAME_PLACEHOLDER)
        {
            return Err(PackageDiffError::Config(format!(
                "repository.package_url must contain {}",
                crate::remote::PACKAGE_NAME_PLACEHOLDER
            )));
        }
        Ok(())
    }

    pub fn remote_service(&self) -> RemoteServiceConfig {
        RemoteServiceConfig::new(&self.image.name, &self.differ.url)
            .with_timeout(Duration::from_secs(self.differ.timeout_secs))
    }

    pub fn repository(&self) -> RepositoryConfig {
        RepositoryConfig::new(&self.repository.package_url)
            .with_timeout(Duration::from_secs(self.repository.timeout_secs))
    }

    pub fn package_list(&self) -> PackageListFile {
        PackageListFile::new(&self.overlay.packages_add)
    }
}
