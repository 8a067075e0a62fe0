use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::warn;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "footseq";
const APPLICATION: &str = "footseq";
const SETTINGS_FILE_NAME: &str = "settings.toml";

pub const DEFAULT_DEBOUNCE_MS: u64 = 1500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Renumber footnotes when the document changes
    pub resequence_footnotes: bool,
    /// Report which bracketed spans are real links
    pub classify_links: bool,
    /// Quiet period before a changed document is rechecked
    pub debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            resequence_footnotes: true,
            classify_links: true,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl Settings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

pub fn settings_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(SETTINGS_FILE_NAME))
}

/// Load settings from `path`, falling back to defaults when the file is
/// missing or unreadable.
pub fn load_settings(path: &Path) -> Settings {
    let Ok(contents) = fs::read_to_string(path) else {
        return Settings::default();
    };
    match toml::from_str::<Settings>(&contents) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("Failed to parse settings file {}: {err}", path.display());
            Settings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &Settings) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let toml = toml::to_string_pretty(settings).map_err(|err| {
        io::Error::new(ErrorKind::Other, format!("toml serialization error: {err}"))
    })?;

    fs::write(path, toml)
}
