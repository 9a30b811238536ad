use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub config_path: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        Self::from_data_dir(discover_user_data_dir())
    }

    pub fn from_data_dir(user_data_dir: PathBuf) -> Self {
        let log_dir = user_data_dir.join("logs");
        let config_path = env::var("LOSTFOUND_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| user_data_dir.join("config.yml"));
        let secrets_path = user_data_dir.join("secrets.yaml");

        let _ = fs::create_dir_all(&log_dir);

        AppPaths {
            user_data_dir,
            log_dir,
            config_path,
            secrets_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_user_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("LOSTFOUND_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir()
            .join(".local/share")
            .to_string_lossy()
            .to_string()
    });
    PathBuf::from(xdg).join("lostfound")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
