// Loading and saving the settings file

mod settings;

pub use settings::Settings;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FoamError, Result};

/// Environment variable that overrides the settings file location.
pub const CONFIG_ENV: &str = "GAFOAM_CONFIG";

/// Default location: `<user config dir>/gafoam/settings.toml`, or
/// `.config/settings.toml` relative to the working directory when no home is known.
pub fn default_config_path() -> PathBuf {
    if let Ok(p) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(p);
    }
    directories::ProjectDirs::from("org", "gafoam", "gafoam")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from(".config").join("settings.toml"))
}

/// Owns the settings file path and the settings loaded from it.
pub struct ConfigManager {
    path: PathBuf,
    settings: Settings,
    /// Cleared when the file on disk failed to parse
    writable: bool,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: Settings::default(),
            writable: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Whether [`save`](Self::save) will write to the file.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Loads the file, or writes the defaults when it does not exist yet.
    ///
    /// A file that exists but does not parse keeps the defaults in memory and
    /// marks the manager read-only, so the user's file is never replaced.
    pub fn load_or_create(&mut self) -> Result<()> {
        if self.path.exists() {
            let content =
                fs::read_to_string(&self.path).map_err(|e| FoamError::io(&self.path, e))?;
            match toml::from_str(&content) {
                Ok(settings) => {
                    self.settings = settings;
                    self.writable = true;
                }
                Err(e) => {
                    self.settings = Settings::default();
                    self.writable = false;
                    return Err(e.into());
                }
            }
        } else {
            self.settings = Settings::default();
            self.save()?;
        }
        Ok(())
    }

    /// Writes the settings through a temporary file and a rename.
    pub fn save(&self) -> Result<()> {
        if !self.writable {
            return Err(FoamError::ConfigReadOnly(self.path.clone()));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| FoamError::io(parent, e))?;
            }
        }

        let content = toml::to_string_pretty(&self.settings)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content).map_err(|e| FoamError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| FoamError::io(&self.path, e))?;

        tracing::debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();

        assert!(path.exists());
        assert_eq!(manager.settings(), &Settings::default());
        assert_eq!(manager.settings().foam.processors, 6);
        assert_eq!(manager.settings().foam.version, "openfoam9");
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "[foam]\nversion = \"openfoam11\"\nprocessors = 4\n\n[case]\ndirectory = \"/tmp/case\"\n",
        )
        .unwrap();

        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();

        let s = manager.settings();
        assert_eq!(s.foam.version, "openfoam11");
        assert_eq!(s.foam.processors, 4);
        assert_eq!(s.foam.solver, "twoLiquidMixingFoam");
        assert_eq!(s.case.directory, Some(PathBuf::from("/tmp/case")));
        assert_eq!(s.ui.monitor_interval_ms, 2000);
    }

    #[test]
    fn saved_changes_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");

        let mut manager = ConfigManager::new(&path);
        manager.load_or_create().unwrap();
        manager.settings_mut().foam.solver = "interFoam".to_string();
        manager.save().unwrap();

        let mut reloaded = ConfigManager::new(&path);
        reloaded.load_or_create().unwrap();
        assert_eq!(reloaded.settings().foam.solver, "interFoam");
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[foam\nversion = ").unwrap();

        let mut manager = ConfigManager::new(&path);
        assert!(matches!(
            manager.load_or_create(),
            Err(FoamError::ConfigParse(_))
        ));
    }

    #[test]
    fn broken_file_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let original = "[foam]\ninstall_root = \"/usr/lib/openfoam\"\nprocessors = 12\nbad line here\n";
        fs::write(&path, original).unwrap();

        let mut manager = ConfigManager::new(&path);
        assert!(manager.load_or_create().is_err());
        assert!(!manager.is_writable());
        assert_eq!(manager.settings(), &Settings::default());

        manager.settings_mut().foam.version = "openfoam11".to_string();
        assert!(matches!(manager.save(), Err(FoamError::ConfigReadOnly(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn fixed_file_becomes_writable_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[foam\n").unwrap();

        let mut manager = ConfigManager::new(&path);
        assert!(manager.load_or_create().is_err());

        fs::write(&path, "[foam]\nprocessors = 12\n").unwrap();
        manager.load_or_create().unwrap();
        assert!(manager.is_writable());
        assert_eq!(manager.settings().foam.processors, 12);
        manager.save().unwrap();
    }
}
