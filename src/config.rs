use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "allergy-check";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration bundle file name (allergies, synonyms, brands, groups).
pub const CONFIG_FILE: &str = "data.json";
/// License table, relative to the data directory.
pub const LICENSE_DB_FILE: &str = "db/license_to_actives.json";
/// Stored personal allergy list.
pub const USER_LIST_FILE: &str = "my_allergies.json";

/// Bounded wait on an in-flight license table load: 150 × 100 ms = 15 s.
pub const LICENSE_WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const LICENSE_WAIT_MAX_POLLS: u32 = 150;

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> String {
    "allergy_check=info".to_string()
}

/// Get the application data directory (~/.allergy-check/).
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".allergy-check")
}

/// Data file locations under one root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::new(app_data_dir())
    }
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn config(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn license_db(&self) -> PathBuf {
        self.root.join(LICENSE_DB_FILE)
    }

    pub fn user_list(&self) -> PathBuf {
        self.root.join(USER_LIST_FILE)
    }
}
