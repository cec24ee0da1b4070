use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Turns a bare path or `sqlite:` path into an absolute `sqlite://` URL.
/// In-memory URLs pass through untouched.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || is_memory_url(raw) {
        return raw.to_owned();
    }

    let path = Path::new(raw.strip_prefix("sqlite:").unwrap_or(raw));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Creates the database file and its directory so the pool can open it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" || is_memory_url(db_url) {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

fn is_memory_url(url: &str) -> bool {
    url.starts_with("sqlite:") && url.contains("mode=memory")
}
