//! # pdfium-locate
//!
//! Find the native [PDFium](https://pdfium.googlesource.com/pdfium/) library
//! that `pdfium-render` binds to at runtime, and bind it from an explicit
//! path.
//!
//! ## Search order
//!
//! [`locate`] returns the first existing library file from:
//!
//! 1. `PDFIUM_LIB_PATH`: the library file, or a directory holding it.
//! 2. Directories relative to the running executable:
//!    `pdfium/lib/`, `pdfium/bin/`, `pdfium/`, and the executable's own
//!    directory. A packaged build ships the engine in one of these.
//! 3. The per-user cache directory populated by [`fetch`]
//!    (`~/.cache/pdfjpg/pdfium-{VERSION}/` on Linux).
//!
//! Nothing is downloaded implicitly. [`fetch`] is an explicit, separate step.
//!
//! ```rust,no_run
//! let path = pdfium_locate::locate().expect("PDFium not installed");
//! let pdfium = pdfium_locate::bind(&path).expect("bind failed");
//! ```
//!
//! ## Platform support
//!
//! | OS      | Arch    | Library               |
//! |---------|---------|-----------------------|
//! | macOS   | arm64   | `libpdfium.dylib`     |
//! | macOS   | x86_64  | `libpdfium.dylib`     |
//! | Linux   | x86_64  | `libpdfium.so`        |
//! | Linux   | aarch64 | `libpdfium.so`        |
//! | Windows | x86_64  | `pdfium.dll`          |
//! | Windows | aarch64 | `pdfium.dll`          |
//! | Windows | x86     | `pdfium.dll`          |

use std::io::Read;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info};

// ── Public constants ─────────────────────────────────────────────────────────

/// The pdfium-binaries release tag used by [`fetch`].
pub const PDFIUM_VERSION: &str = "7690";

/// Environment variable naming the library file directly.
pub const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Environment variable overriding the cache root used by [`cache_dir`].
pub const CACHE_DIR_ENV: &str = "PDFIUM_LOCATE_CACHE_DIR";

const BASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by pdfium-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// The current OS/architecture combination has no known library name.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// No candidate location holds the library.
    #[error("PDFium library `{lib_name}` not found (searched: {})", join_paths(.searched))]
    NotFound {
        lib_name: String,
        searched: Vec<PathBuf>,
    },

    /// Could not create the local cache directory.
    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    /// Network download failed.
    #[error("Download failed: {0}")]
    Download(String),

    /// gzip/tar extraction failed.
    #[error("Archive extraction failed: {0}")]
    Extract(String),

    /// `pdfium-render` could not load the library.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

fn join_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ── Platform metadata ────────────────────────────────────────────────────────

struct PlatformInfo {
    /// Asset filename in the GitHub release, e.g. `pdfium-mac-arm64.tgz`.
    archive_name: &'static str,
    /// Relative path inside the archive, e.g. `lib/libpdfium.dylib`.
    lib_path_in_archive: &'static str,
    /// Library filename on disk.
    lib_name: &'static str,
}

fn detect_platform() -> Result<PlatformInfo, LocateError> {
    let platform = |archive_name: &'static str, lib_path_in_archive: &'static str, lib_name: &'static str| PlatformInfo {
        archive_name,
        lib_path_in_archive,
        lib_name,
    };

    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("macos", "aarch64") => Ok(platform("pdfium-mac-arm64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib")),
        ("macos", "x86_64") => Ok(platform("pdfium-mac-x64.tgz", "lib/libpdfium.dylib", "libpdfium.dylib")),
        ("linux", "x86_64") => Ok(platform("pdfium-linux-x64.tgz", "lib/libpdfium.so", "libpdfium.so")),
        ("linux", "aarch64") => Ok(platform("pdfium-linux-arm64.tgz", "lib/libpdfium.so", "libpdfium.so")),
        ("windows", "x86_64") => Ok(platform("pdfium-win-x64.tgz", "bin/pdfium.dll", "pdfium.dll")),
        ("windows", "aarch64") => Ok(platform("pdfium-win-arm64.tgz", "bin/pdfium.dll", "pdfium.dll")),
        ("windows", "x86") => Ok(platform("pdfium-win-x86.tgz", "bin/pdfium.dll", "pdfium.dll")),
        (os, arch) => Err(LocateError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        }),
    }
}

/// File name of the PDFium shared library on this platform.
pub fn library_file_name() -> Result<&'static str, LocateError> {
    detect_platform().map(|info| info.lib_name)
}

// ── Search locations ─────────────────────────────────────────────────────────

/// Per-version cache directory written by [`fetch`].
///
/// Default locations:
/// - **macOS**: `~/Library/Caches/pdfjpg/pdfium-{VERSION}/`
/// - **Linux**: `~/.cache/pdfjpg/pdfium-{VERSION}/`
/// - **Windows**: `%LOCALAPPDATA%\pdfjpg\pdfium-{VERSION}\`
///
/// Override the root with `PDFIUM_LOCATE_CACHE_DIR`.
pub fn cache_dir() -> PathBuf {
    if let Ok(root) = std::env::var(CACHE_DIR_ENV) {
        return PathBuf::from(root).join(format!("pdfium-{PDFIUM_VERSION}"));
    }

    let base = dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir);

    base.join("pdfjpg").join(format!("pdfium-{PDFIUM_VERSION}"))
}

/// Directory holding the running executable, if it can be determined.
pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Candidate directories in search order, excluding the env-var override.
pub fn search_dirs(exe_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::with_capacity(5);
    if let Some(exe) = exe_dir {
        dirs.push(exe.join("pdfium").join("lib"));
        dirs.push(exe.join("pdfium").join("bin"));
        dirs.push(exe.join("pdfium"));
        dirs.push(exe.to_path_buf());
    }
    dirs.push(cache_dir());
    dirs
}

/// First directory in `dirs` that contains `lib_name`.
pub fn locate_in(dirs: &[PathBuf], lib_name: &str) -> Option<PathBuf> {
    dirs.iter()
        .map(|d| d.join(lib_name))
        .find(|candidate| candidate.is_file())
}

/// Find the PDFium library using the documented search order.
///
/// Returns [`LocateError::NotFound`] listing every location tried. The list
/// depends only on the environment and executable location, so repeated calls
/// produce the same diagnostic.
pub fn locate() -> Result<PathBuf, LocateError> {
    let lib_name = library_file_name()?;
    let mut searched = Vec::new();

    if let Ok(env_path) = std::env::var(LIB_PATH_ENV) {
        let mut p = PathBuf::from(env_path);
        if p.is_dir() {
            p.push(lib_name);
        }
        if p.is_file() {
            debug!("PDFium from {}: {}", LIB_PATH_ENV, p.display());
            return Ok(p);
        }
        searched.push(p);
    }

    let dirs = search_dirs(executable_dir().as_deref());
    if let Some(found) = locate_in(&dirs, lib_name) {
        debug!("PDFium located at {}", found.display());
        return Ok(found);
    }

    searched.extend(dirs.into_iter().map(|d| d.join(lib_name)));
    Err(LocateError::NotFound {
        lib_name: lib_name.to_string(),
        searched,
    })
}

/// Bind to a PDFium library at an explicit `path`.
pub fn bind(path: &Path) -> Result<Pdfium, LocateError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| LocateError::Bind {
            path: path.to_path_buf(),
            reason: format!("{e:?}"),
        })
}

// ── Fetch ────────────────────────────────────────────────────────────────────

/// Download the platform PDFium build into [`cache_dir`] and return the
/// library path. Returns immediately if the library is already cached.
///
/// `on_progress` receives `(bytes_downloaded, total_size_option)`.
pub fn fetch(on_progress: Option<&dyn Fn(u64, Option<u64>)>) -> Result<PathBuf, LocateError> {
    let info = detect_platform()?;
    let dir = cache_dir();
    let lib_path = dir.join(info.lib_name);

    if lib_path.is_file() {
        return Ok(lib_path);
    }

    let url = format!("{BASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", info.archive_name);
    info!("Fetching PDFium from {}", url);

    std::fs::create_dir_all(&dir).map_err(LocateError::CacheDir)?;

    let archive = download_bytes(&url, on_progress)?;
    extract_library(&archive, info.lib_path_in_archive, &lib_path)?;

    info!("PDFium installed at {}", lib_path.display());
    Ok(lib_path)
}

fn download_bytes(
    url: &str,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<Vec<u8>, LocateError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-locate/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| LocateError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| LocateError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(LocateError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(32 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(LocateError::Download(format!("Read error: {e}"))),
        }
    }

    Ok(buf)
}

/// Extracts the single library file from a gzipped tar archive.
fn extract_library(
    archive_bytes: &[u8],
    lib_path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), LocateError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let mut archive = Archive::new(GzDecoder::new(archive_bytes));
    let entries = archive
        .entries()
        .map_err(|e| LocateError::Extract(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| LocateError::Extract(e.to_string()))?;
        let is_lib = entry
            .path()
            .map_err(|e| LocateError::Extract(e.to_string()))?
            .to_string_lossy()
            == lib_path_in_archive;

        if is_lib {
            entry
                .unpack(dest_path)
                .map_err(|e| LocateError::Extract(format!("Unpack failed: {e}")))?;
            return Ok(());
        }
    }

    Err(LocateError::Extract(format!(
        "Library '{lib_path_in_archive}' not found in archive"
    )))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_platform_has_a_library_name() {
        let name = library_file_name().expect("current platform should be supported");
        assert!(name.contains("pdfium"));
    }

    #[test]
    fn cache_dir_is_versioned() {
        let d = cache_dir();
        assert_eq!(d, cache_dir());
        assert!(d.to_string_lossy().contains(PDFIUM_VERSION));
    }

    #[test]
    fn search_dirs_put_executable_locations_first() {
        let exe = Path::new("/opt/pdfjpg");
        let dirs = search_dirs(Some(exe));
        assert_eq!(dirs[0], exe.join("pdfium").join("lib"));
        assert_eq!(dirs[1], exe.join("pdfium").join("bin"));
        assert_eq!(dirs[2], exe.join("pdfium"));
        assert_eq!(dirs[3], exe.to_path_buf());
        assert_eq!(dirs.len(), 5);
    }

    #[test]
    fn search_dirs_without_executable_is_cache_only() {
        assert_eq!(search_dirs(None), vec![cache_dir()]);
    }

    #[test]
    fn locate_in_picks_first_directory_holding_the_file() {
        let root = tempfile::tempdir().unwrap();
        let empty = root.path().join("empty");
        let full = root.path().join("full");
        std::fs::create_dir_all(&empty).unwrap();
        std::fs::create_dir_all(&full).unwrap();
        std::fs::write(full.join("libfake.so"), b"not really").unwrap();

        let found = locate_in(&[empty, full.clone()], "libfake.so");
        assert_eq!(found, Some(full.join("libfake.so")));
        assert_eq!(locate_in(&[root.path().to_path_buf()], "libfake.so"), None);
    }

    #[test]
    fn not_found_lists_searched_paths() {
        let err = LocateError::NotFound {
            lib_name: "libpdfium.so".into(),
            searched: vec![PathBuf::from("/a/libpdfium.so"), PathBuf::from("/b/libpdfium.so")],
        };
        let msg = err.to_string();
        assert!(msg.contains("/a/libpdfium.so, /b/libpdfium.so"), "got: {msg}");
    }

    #[test]
    fn extract_rejects_garbage() {
        let err = extract_library(b"definitely not gzip", "lib/libpdfium.so", Path::new("/tmp/x"))
            .unwrap_err();
        assert!(matches!(err, LocateError::Extract(_)));
    }
}
