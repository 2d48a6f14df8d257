//! `StaticContentCache`: path → (bytes, content-type, expiry) with periodic
//! refresh (spec.md §4.8).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex as StdMutex, RwLock};
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use netcore_core::{Error, Result};
use tracing::{debug, warn};

/// Default re-walk interval (spec.md §4.8: "re-walk on timer (default 60 s)").
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// One cached static file.
#[derive(Debug, Clone)]
pub struct StaticEntry {
    /// File contents at last refresh.
    pub bytes: Bytes,
    /// Inferred MIME type from the file extension.
    pub content_type: String,
    /// Modification time at last refresh.
    pub mtime: SystemTime,
    /// When this entry should next be revalidated.
    pub expiry: SystemTime,
}

/// A directory registered via [`StaticContentCache::add_static_content`],
/// remembered so periodic refresh can re-walk it.
#[derive(Debug, Clone)]
struct Registration {
    dir: PathBuf,
    url_prefix: String,
}

/// URL-path-keyed cache of static file content, refreshed by re-walking
/// each registered directory on a timer.
#[derive(Debug)]
pub struct StaticContentCache {
    entries: RwLock<HashMap<String, StaticEntry>>,
    registrations: StdMutex<Vec<Registration>>,
    refresh_interval: Duration,
}

impl Default for StaticContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}

impl StaticContentCache {
    /// Construct an empty cache with a custom refresh interval.
    #[must_use]
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            registrations: StdMutex::new(Vec::new()),
            refresh_interval,
        }
    }

    /// Walk `dir` recursively, publishing every file under `url_prefix`.
    /// Remembers the registration so [`StaticContentCache::refresh_all`]
    /// can re-walk it later.
    pub fn add_static_content(&self, dir: impl AsRef<Path>, url_prefix: &str) -> Result<()> {
        let dir = dir.as_ref().to_path_buf();
        self.walk_into(&dir, url_prefix)?;
        self.registrations
            .lock()
            .expect("registrations mutex poisoned")
            .push(Registration { dir, url_prefix: url_prefix.to_string() });
        Ok(())
    }

    /// Look up a previously registered URL path.
    #[must_use]
    pub fn get(&self, url_path: &str) -> Option<StaticEntry> {
        self.entries.read().expect("entries lock poisoned").get(url_path).cloned()
    }

    /// Re-walk every registered directory, replacing stale entries.
    pub fn refresh_all(&self) {
        let registrations = self.registrations.lock().expect("registrations mutex poisoned").clone();
        for reg in registrations {
            if let Err(e) = self.walk_into(&reg.dir, &reg.url_prefix) {
                warn!(dir = %reg.dir.display(), error = %e, "static content refresh failed");
            }
        }
    }

    /// Spawn a background task that calls [`StaticContentCache::refresh_all`]
    /// every `refresh_interval`.
    pub fn spawn_refresh_task(self: std::sync::Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = self.refresh_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                self.refresh_all();
            }
        })
    }

    fn walk_into(&self, dir: &Path, url_prefix: &str) -> Result<()> {
        let mut found = Vec::new();
        walk_recursive(dir, dir, url_prefix, &mut found)?;
        let mut entries = self.entries.write().expect("entries lock poisoned");
        let expiry = SystemTime::now() + self.refresh_interval;
        for (url_path, path) in found {
            let bytes = std::fs::read(&path).map_err(Error::from)?;
            let mtime = std::fs::metadata(&path).and_then(|m| m.modified()).unwrap_or(SystemTime::UNIX_EPOCH);
            let content_type = content_type_for(&path).to_string();
            debug!(url = %url_path, bytes = bytes.len(), "static content cached");
            entries.insert(
                url_path,
                StaticEntry { bytes: Bytes::from(bytes), content_type, mtime, expiry },
            );
        }
        Ok(())
    }
}

fn walk_recursive(root: &Path, dir: &Path, url_prefix: &str, out: &mut Vec<(String, PathBuf)>) -> Result<()> {
    let read_dir = std::fs::read_dir(dir).map_err(Error::from)?;
    for entry in read_dir {
        let entry = entry.map_err(Error::from)?;
        let path = entry.path();
        if path.is_dir() {
            walk_recursive(root, &path, url_prefix, out)?;
        } else {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            let relative = relative.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
            let url_path = format!("{}/{relative}", url_prefix.trim_end_matches('/'));
            out.push((url_path, path));
        }
    }
    Ok(())
}

/// Infer a MIME type from a file extension; unknown extensions fall back to
/// `application/octet-stream`.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=UTF-8",
        "css" => "text/css; charset=UTF-8",
        "js" => "application/javascript; charset=UTF-8",
        "json" => "application/json",
        "txt" => "text/plain; charset=UTF-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn walks_directory_and_serves_by_url_path() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("index.html");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(b"<html></html>").unwrap();

        let cache = StaticContentCache::new(Duration::from_secs(60));
        cache.add_static_content(dir.path(), "/static").unwrap();

        let entry = cache.get("/static/index.html").expect("entry present");
        assert_eq!(&entry.bytes[..], b"<html></html>");
        assert_eq!(entry.content_type, "text/html; charset=UTF-8");
    }

    #[test]
    fn refresh_all_picks_up_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StaticContentCache::new(Duration::from_secs(60));
        cache.add_static_content(dir.path(), "/static").unwrap();
        assert!(cache.get("/static/new.txt").is_none());

        std::fs::write(dir.path().join("new.txt"), b"hi").unwrap();
        cache.refresh_all();
        assert_eq!(&cache.get("/static/new.txt").unwrap().bytes[..], b"hi");
    }
}
