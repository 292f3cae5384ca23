use std::path::PathBuf;

/// Root directory for durable chat data, under the platform data dir.
#[must_use]
pub fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sonar-chat")
}

/// Default location of the transcript database.
#[must_use]
pub fn default_db_path() -> PathBuf {
    data_root().join("history.db")
}
