use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem layout for the process: where the public config lives, where
/// user data (secrets, logs) goes, and where the sample corpus sits.
///
/// `ATLAS_ROOT` pins the project root and `ATLAS_DATA_DIR` pins the data
/// directory; without them the root is discovered from the manifest dir and
/// the data dir follows the platform convention (debug builds write next to
/// the project instead).
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = env::var("ATLAS_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| discover_project_root());
        let user_data_dir = env::var("ATLAS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| platform_data_dir(&project_root));
        let log_dir = user_data_dir.join("logs");
        let secrets_path = user_data_dir.join("secrets.yaml");

        let _ = fs::create_dir_all(&user_data_dir);
        let _ = fs::create_dir_all(&log_dir);

        AppPaths {
            project_root,
            user_data_dir,
            log_dir,
            secrets_path,
        }
    }

    /// Default corpus location for the ingest binary.
    pub fn corpus_path(&self) -> PathBuf {
        self.project_root.join("data").join("jupiter_moons.tsv")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        manifest_dir
    } else {
        env::current_dir().unwrap_or(manifest_dir)
    }
}

fn platform_data_dir(project_root: &Path) -> PathBuf {
    // Debug builds keep everything next to the checkout.
    if cfg!(debug_assertions) {
        return project_root.to_path_buf();
    }

    if cfg!(target_os = "windows") {
        let base = env::var("LOCALAPPDATA")
            .or_else(|_| env::var("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        base.join("JupiterAtlas")
    } else if cfg!(target_os = "macos") {
        home_dir()
            .join("Library")
            .join("Application Support")
            .join("JupiterAtlas")
    } else {
        let base = env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_dir().join(".local").join("share"));
        base.join("jupiter-atlas")
    }
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
