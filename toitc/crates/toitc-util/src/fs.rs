//! Filesystem capability used by the source manager.
//!
//! The front-end never touches the host filesystem directly; everything goes
//! through the [`Filesystem`] trait so hosts (tests, editors) can substitute
//! their own implementation. Paths are plain strings; absolute paths begin
//! with `/`, virtual paths begin with `///`.

use std::io;
use std::path::Path;

/// Host filesystem access.
pub trait Filesystem {
    /// Whether the path exists.
    fn exists(&self, path: &str) -> bool;

    /// Whether the path is a regular file.
    fn is_regular_file(&self, path: &str) -> bool;

    /// Whether the path is a directory.
    fn is_directory(&self, path: &str) -> bool;

    /// Reads the full content of the file.
    fn read_content(&self, path: &str) -> io::Result<Vec<u8>>;

    /// The current working directory.
    fn cwd(&self) -> String;

    /// The root of the bundled core library.
    fn library_root(&self) -> String;

    /// Directories that may contain downloaded packages.
    fn package_cache_paths(&self) -> Vec<String>;

    /// Invokes `callback` for every `.toit` file (without the extension) and
    /// every subdirectory in `path`. The second argument is true for
    /// directories.
    fn list_toit_directory_entries(&self, path: &str, callback: &mut dyn FnMut(&str, bool));
}

/// [`Filesystem`] backed by `std::fs`.
#[derive(Default)]
pub struct StdFilesystem;

impl StdFilesystem {
    /// Creates a new std-backed filesystem.
    pub fn new() -> Self {
        Self
    }
}

impl Filesystem for StdFilesystem {
    fn exists(&self, path: &str) -> bool {
        Path::new(path).exists()
    }

    fn is_regular_file(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn is_directory(&self, path: &str) -> bool {
        Path::new(path).is_dir()
    }

    fn read_content(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn cwd(&self) -> String {
        std::env::current_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| String::from("."))
    }

    fn library_root(&self) -> String {
        std::env::var("TOITC_LIB_ROOT").unwrap_or_else(|_| String::from("lib"))
    }

    fn package_cache_paths(&self) -> Vec<String> {
        match std::env::var("HOME") {
            Ok(home) => vec![format!("{}/.cache/toitc/packages", home)],
            Err(_) => Vec::new(),
        }
    }

    fn list_toit_directory_entries(&self, path: &str, callback: &mut dyn FnMut(&str, bool)) {
        let Ok(entries) = std::fs::read_dir(path) else { return };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Ok(file_type) = entry.file_type() else { continue };
            if file_type.is_dir() {
                callback(name, true);
            } else if let Some(stem) = name.strip_suffix(".toit") {
                callback(stem, false);
            }
        }
    }
}

/// Identity of the package a source belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Package {
    id: String,
}

impl Package {
    /// The id used for the entry package (the application itself).
    pub const ENTRY_PACKAGE_ID: &'static str = "<entry>";

    /// Creates a package with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The entry package.
    pub fn entry() -> Self {
        Self::new(Self::ENTRY_PACKAGE_ID)
    }

    /// An invalid package (no identity known).
    pub fn invalid() -> Self {
        Self { id: String::new() }
    }

    /// Whether the package has a valid identity.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty()
    }

    /// The package id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The path to show in error messages for a file of this package.
    pub fn build_error_path(&self, path: &str) -> String {
        if !self.is_valid() || self.id == Self::ENTRY_PACKAGE_ID {
            path.to_string()
        } else {
            let file = path.rsplit('/').next().unwrap_or(path);
            format!("<pkg:{}>/{}", self.id, file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_entry() {
        let package = Package::entry();
        assert!(package.is_valid());
        assert_eq!(package.id(), Package::ENTRY_PACKAGE_ID);
        assert_eq!(package.build_error_path("/src/main.toit"), "/src/main.toit");
    }

    #[test]
    fn test_package_invalid() {
        assert!(!Package::invalid().is_valid());
    }

    #[test]
    fn test_package_error_path() {
        let package = Package::new("host");
        assert_eq!(package.build_error_path("/cache/host/src/file.toit"), "<pkg:host>/file.toit");
    }

    #[test]
    fn test_std_filesystem_missing_file() {
        let fs = StdFilesystem::new();
        assert!(!fs.exists("/definitely/not/a/real/path.toit"));
        assert!(fs.read_content("/definitely/not/a/real/path.toit").is_err());
    }
}
