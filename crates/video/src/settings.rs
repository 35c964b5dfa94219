//! Contains [ProviderSettings], the user-facing options for how frames are
//! acquired, and the [BackendPreference] trait the
//! [BackendSelector](crate::selector::BackendSelector) reads the preferred
//! backend through.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The number of frames cached when the settings file doesn't say otherwise.
pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Anything that can name a preferred backend.
///
/// The name is compared to registered backend names ignoring ASCII case.
pub trait BackendPreference {
    /// The name of the backend to try first, if any.
    fn preferred_backend(&self) -> Option<&str>;
}

impl BackendPreference for str {
    fn preferred_backend(&self) -> Option<&str> {
        Some(self)
    }
}

impl BackendPreference for Option<String> {
    fn preferred_backend(&self) -> Option<&str> {
        self.as_deref()
    }
}

/// Options for opening frame sources, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// The backend to try before any other.
    pub preferred_backend: Option<String>,

    /// How many decoded frames to keep around. `0` disables caching.
    pub cache_capacity: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            preferred_backend: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl BackendPreference for ProviderSettings {
    fn preferred_backend(&self) -> Option<&str> {
        self.preferred_backend.as_deref()
    }
}

impl ProviderSettings {
    /// Read settings from the JSON file at `path`. If the file doesn't exist
    /// yet, it's created with the [default](Self::default) settings.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        Self::load_impl(path.as_ref())
    }

    fn load_impl(path: &Path) -> Result<Self, SettingsError> {
        match File::open(path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))
                .inspect_err(|e| log::error!("Failed to read `{}`: {e}", path.display()))
                .map_err(Into::into),

            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No settings at `{}`, writing defaults.", path.display());
                let settings = Self::default();
                settings.save(path)?;
                Ok(settings)
            }

            Err(e) => Err(e.into()),
        }
    }

    /// Write these settings to the JSON file at `path`, replacing anything
    /// that was there.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SettingsError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        let mut writer = BufWriter::new(file);

        // We'll pretty print if we're in debug mode.
        if cfg!(debug_assertions) {
            serde_json::to_writer_pretty(&mut writer, self)
        } else {
            serde_json::to_writer(&mut writer, self)
        }?;

        writer.flush().map_err(Into::into)
    }
}

/// Indicates that settings couldn't be read or written.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    BadData(serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            SettingsError::Io(e.into())
        } else {
            SettingsError::BadData(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "video-settings-{}-{name}.json",
            std::process::id()
        ));
        _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn missing_fields_use_defaults() {
        let settings: ProviderSettings =
            serde_json::from_str(r#"{ "preferred_backend": "ffmpeg" }"#).unwrap();

        assert_eq!(settings.preferred_backend(), Some("ffmpeg"));
        assert_eq!(settings.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = scratch_path("missing");

        let settings = ProviderSettings::load(&path).unwrap();
        assert_eq!(settings, ProviderSettings::default());
        assert!(path.exists());

        _ = fs::remove_file(&path);
    }

    #[test]
    fn saved_settings_load_back() {
        let path = scratch_path("saved");
        let settings = ProviderSettings {
            preferred_backend: Some("image".to_string()),
            cache_capacity: 4,
        };

        settings.save(&path).unwrap();
        assert_eq!(ProviderSettings::load(&path).unwrap(), settings);

        _ = fs::remove_file(&path);
    }

    #[test]
    fn bad_json_is_bad_data() {
        let path = scratch_path("bad");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ProviderSettings::load(&path),
            Err(SettingsError::BadData(_))
        ));

        _ = fs::remove_file(&path);
    }
}
