use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Terminal progress line shared by every binary: rewrites one stderr line
/// and ends it once the download is complete.
pub fn report_download_progress(downloaded: u64, total: u64) {
    eprint!("\r{}", progress_message(downloaded, total));
    if total > 0 && downloaded >= total {
        eprintln!();
    }
}

fn progress_message(downloaded: u64, total: u64) -> String {
    if total > 0 {
        let pct = (downloaded.min(total) as f64 / total as f64 * 100.0) as u32;
        format!("Downloading face detection model... {pct}%")
    } else {
        format!("Downloading face detection model... {downloaded} bytes")
    }
}

/// Resolve the face model weights.
///
/// Resolution order:
/// 1. Explicitly configured path (must exist, never downloaded over)
/// 2. User cache directory (platform-specific)
/// 3. Download from URL to cache
pub fn resolve(
    explicit: Option<&Path>,
    name: &str,
    url: &str,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = explicit {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::NotFound(path.to_path_buf()))
        };
    }

    let cache_dir = model_cache_dir()?;
    resolve_in(&cache_dir, name, url, progress)
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    log::info!("Model {name} not cached, downloading from {url}");
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Proctor/models/`
/// - Linux: `$XDG_CACHE_HOME/Proctor/models/` or `~/.cache/Proctor/models/`
/// - Windows: `%LOCALAPPDATA%/Proctor/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Proctor").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Proctor").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

const DOWNLOAD_CHUNK: usize = 256 * 1024;

/// Streams `url` into `<dest>.part`, then renames it over `dest`. Any failure
/// removes the partial file.
fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |source: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let total = response.content_length().unwrap_or(0);

    let part_path = dest.with_extension("part");
    let result = stream_to_file(&mut response, &part_path, total, progress.as_deref())
        .and_then(|()| fs::rename(&part_path, dest));

    result.map_err(|source| {
        let _ = fs::remove_file(&part_path);
        ModelResolveError::Write {
            path: dest.to_path_buf(),
            source,
        }
    })
}

fn stream_to_file(
    reader: &mut impl Read,
    path: &Path,
    total: u64,
    progress: Option<&(dyn Fn(u64, u64) + Send)>,
) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    let mut buf = vec![0u8; DOWNLOAD_CHUNK];
    let mut written: u64 = 0;
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        written += n as u64;
        if let Some(report) = progress {
            report(written, total);
        }
    }
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path_is_returned() {
        let tmp = TempDir::new().unwrap();
        let model = tmp.path().join("face.onnx");
        fs::write(&model, b"weights").unwrap();

        let resolved = resolve(Some(&model), "unused.onnx", "http://invalid", None).unwrap();
        assert_eq!(resolved, model);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let model = tmp.path().join("missing.onnx");

        let err = resolve(Some(&model), "unused.onnx", "http://invalid", None).unwrap_err();
        assert!(matches!(err, ModelResolveError::NotFound(p) if p == model));
    }

    #[test]
    fn test_cached_file_skips_download() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("face.onnx"), b"cached").unwrap();

        let resolved = resolve_in(
            tmp.path(),
            "face.onnx",
            "http://invalid.nonexistent.example.com/face.onnx",
            None,
        )
        .unwrap();
        assert_eq!(fs::read(resolved).unwrap(), b"cached");
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Proctor"));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_progress_message_shows_percentage() {
        assert_eq!(
            progress_message(250, 1000),
            "Downloading face detection model... 25%"
        );
        assert_eq!(
            progress_message(1000, 1000),
            "Downloading face detection model... 100%"
        );
    }

    #[test]
    fn test_progress_message_without_length_shows_bytes() {
        assert_eq!(
            progress_message(4096, 0),
            "Downloading face detection model... 4096 bytes"
        );
    }

    #[test]
    fn test_progress_message_caps_at_hundred() {
        assert_eq!(
            progress_message(1500, 1000),
            "Downloading face detection model... 100%"
        );
    }

    #[test]
    fn test_stream_reports_progress() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::sync::Arc;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("model.part");
        let payload = vec![7u8; DOWNLOAD_CHUNK + 10];
        let seen = Arc::new(AtomicU64::new(0));
        let seen_cb = seen.clone();
        let report = move |done: u64, _total: u64| seen_cb.store(done, Ordering::Relaxed);

        stream_to_file(&mut payload.as_slice(), &path, payload.len() as u64, Some(&report))
            .unwrap();

        assert_eq!(fs::read(&path).unwrap(), payload);
        assert_eq!(seen.load(Ordering::Relaxed), payload.len() as u64);
    }

    #[test]
    fn test_download_failure_leaves_nothing_behind() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
