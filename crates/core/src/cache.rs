use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use tokio::fs;

use crate::{error::Result, types::SessionData};

/// Root of the local session cache.
pub fn root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("surgview")
}

/// Cache directory for one session, keyed by deployment and session name so
/// identically named sessions on different servers never collide.
pub fn session_cache_dir(base_url: &str, session_name: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    base_url.hash(&mut hasher);
    session_name.hash(&mut hasher);
    root_cache_dir().join(hasher.finish().to_string())
}

/// Path of the cached aggregate inside a session cache directory.
pub fn session_data_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("session.json")
}

pub async fn load_cached_session(path: &Path) -> Result<SessionData> {
    let json_content = fs::read_to_string(path).await?;
    let data: SessionData = serde_json::from_str(&json_content)?;
    Ok(data)
}

pub async fn save_cached_session(data: &SessionData, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let pretty_json = serde_json::to_string_pretty(data)?;
    fs::write(path, &pretty_json).await?;
    Ok(())
}
