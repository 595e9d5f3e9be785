//! Layered configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. `luxi.toml` in the platform configuration directory, if present.
//! 3. An explicitly requested file (TOML, YAML or JSON by extension), which
//!    must exist.
//! 4. Environment variables prefixed `LUXI_`. Nested keys are separated by a
//!    double underscore, e.g. `LUXI_LOOKUP__DELAY_MS=0`.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_PREFIX: &str = "LUXI_";
pub const CONFIG_FILE_NAME: &str = "luxi.toml";
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 480;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite catalog file.
    pub database_path: PathBuf,
    /// Root of generated assets: `previews/` and `series/` live beneath it.
    pub assets_path: PathBuf,
    pub debug: bool,
    pub lookup: LookupConfig,
    pub thumbnail: ThumbnailConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    pub base_url: String,
    /// Skip metadata enrichment altogether.
    pub enabled: bool,
    /// Pause after each enrichment, in milliseconds.
    pub delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    pub width: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9024,
            database_path: PathBuf::from("library.db"),
            assets_path: PathBuf::from("./assets"),
            debug: false,
            lookup: LookupConfig::default(),
            thumbnail: ThumbnailConfig::default(),
        }
    }
}
impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.jikan.moe/v4".to_string(),
            enabled: true,
            delay_ms: 1000,
        }
    }
}
impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self { width: DEFAULT_THUMBNAIL_WIDTH }
    }
}

impl LookupConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Config {
    /// Load configuration from every layer, with an optional explicit file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user_file = Self::user_file();
        Self::from_figment(Self::figment(user_file.as_deref(), explicit)?)
    }

    /// `luxi.toml` in the platform configuration directory.
    pub fn user_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "luxi").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Assemble the layered provider without extracting it.
    pub fn figment(user_file: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = user_file {
            debug!(path = %path.display(), "merging user configuration file");
            // Missing user files are silently skipped by the provider.
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::MissingFile(path.to_path_buf()));
            }
            debug!(path = %path.display(), "merging explicit configuration file");
            figment = match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.thumbnail.width == 0 {
            exn::bail!(ErrorKind::Invalid("thumbnail.width must be greater than zero"));
        }
        if self.port == 0 {
            exn::bail!(ErrorKind::Invalid("port must be non-zero"));
        }
        if self.lookup.enabled && self.lookup.base_url.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("lookup.base_url is required when lookup is enabled"));
        }
        Ok(())
    }

    /// Where issue thumbnails are written.
    pub fn previews_dir(&self) -> PathBuf {
        self.assets_path.join("previews")
    }

    /// Where downloaded series covers are written.
    pub fn covers_dir(&self) -> PathBuf {
        self.assets_path.join("series")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;
    use std::fs;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::from_figment(Figment::from(Serialized::defaults(Config::default()))).unwrap();
        assert_eq!(config.port, 9024);
        assert_eq!(config.thumbnail.width, 480);
        assert_eq!(config.lookup.delay(), Duration::from_secs(1));
        assert_eq!(config.previews_dir(), PathBuf::from("./assets/previews"));
    }

    #[test]
    fn test_explicit_file_overrides_user_file() {
        let dir = tempfile::tempdir().unwrap();
        let user = dir.path().join("user.toml");
        let explicit = dir.path().join("explicit.toml");
        fs::write(&user, "port = 1000\ndebug = true\n").unwrap();
        fs::write(&explicit, "port = 2000\n[lookup]\nenabled = false\n").unwrap();

        let figment = Config::figment(Some(&user), Some(&explicit)).unwrap();
        let config = Config::from_figment(figment).unwrap();
        assert_eq!(config.port, 2000);
        assert!(config.debug);
        assert!(!config.lookup.enabled);
        assert_eq!(config.lookup.delay_ms, 1000);
    }

    #[test]
    fn test_missing_user_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let figment = Config::figment(Some(&dir.path().join("absent.toml")), None).unwrap();
        assert!(Config::from_figment(figment).is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = Config::figment(None, Some(&missing)).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingFile(missing));
    }

    #[rstest]
    #[case("[thumbnail]\nwidth = 0\n")]
    #[case("port = 0\n")]
    fn test_invalid_values_rejected(#[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("luxi.toml");
        fs::write(&path, contents).unwrap();
        let err = Config::from_figment(Config::figment(None, Some(&path)).unwrap()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_environment_has_highest_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file("luxi.toml", "port = 2000\n")?;
            jail.set_env("LUXI_PORT", "3000");
            jail.set_env("LUXI_LOOKUP__DELAY_MS", "0");
            let figment = Config::figment(None, Some(Path::new("luxi.toml"))).map_err(|e| e.to_string())?;
            let config = Config::from_figment(figment).map_err(|e| e.to_string())?;
            assert_eq!(config.port, 3000);
            assert_eq!(config.lookup.delay_ms, 0);
            Ok(())
        });
    }
}
