// Copyright 2025 bakri (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Host editor integration
//!
//! The scanner never looks packages up on its own. Everything it needs from
//! the editor goes through `PackageSource`:
//! - **list_packages**: names of installed packages
//! - **list_package_files**: file names inside one package
//! - **read_file**: contents of one package file, or `None`
//! - **current_platform**: which platform-qualified keymaps apply
//!
//! Two sources ship with the crate: `DirectorySource` reads an unpacked
//! packages directory, `MemorySource` holds everything in memory.
//!
//! # Example
//! ```
//! use find_key_conflicts::host::{MemorySource, PackageSource, Platform};
//!
//! let source = MemorySource::new(Platform::Linux)
//!     .with_file("Default", "Default.sublime-keymap", r#"[{"keys": ["ctrl+c"], "command": "copy"}]"#);
//!
//! assert_eq!(source.list_packages().unwrap(), vec!["Default".to_string()]);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Operating system family as reported by the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    Osx,
}

#[derive(Debug, Error, PartialEq)]
#[error("Unknown platform '{0}': expected windows, linux or osx")]
pub struct UnknownPlatform(pub String);

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::Osx
        } else {
            Platform::Linux
        }
    }

    /// Identifier used in platform-qualified keymap names
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::Linux => "Linux",
            Platform::Osx => "OSX",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            "osx" | "macos" => Ok(Platform::Osx),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// Data source for packages and their files
///
/// Listing order matters: packages and files are processed in the order
/// returned here.
pub trait PackageSource {
    /// Names of all installed packages
    fn list_packages(&self) -> io::Result<Vec<String>>;

    /// File names (relative to the package) inside one package
    fn list_package_files(&self, package: &str) -> io::Result<Vec<String>>;

    /// Contents of one file, `Ok(None)` if it does not exist
    fn read_file(&self, package: &str, file: &str) -> io::Result<Option<Vec<u8>>>;

    fn current_platform(&self) -> Platform;
}

/// Packages unpacked on disk, one sub-directory per package
///
/// Packages and files are listed in lexicographic order.
#[derive(Clone, Debug)]
pub struct DirectorySource {
    root: PathBuf,
    platform: Platform,
}

impl DirectorySource {
    pub fn new(root: PathBuf, platform: Platform) -> Self {
        Self { root, platform }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sorted_names(dir: &Path, want_dirs: bool) -> io::Result<Vec<String>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() != want_dirs {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

impl PackageSource for DirectorySource {
    fn list_packages(&self) -> io::Result<Vec<String>> {
        Self::sorted_names(&self.root, true)
    }

    fn list_package_files(&self, package: &str) -> io::Result<Vec<String>> {
        let dir = self.root.join(package);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        Self::sorted_names(&dir, false)
    }

    fn read_file(&self, package: &str, file: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.root.join(package).join(file)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn current_platform(&self) -> Platform {
        self.platform
    }
}

/// In-memory packages, listed in insertion order
#[derive(Clone, Debug)]
pub struct MemorySource {
    packages: Vec<(String, BTreeMap<String, Vec<u8>>)>,
    platform: Platform,
}

impl MemorySource {
    pub fn new(platform: Platform) -> Self {
        Self {
            packages: Vec::new(),
            platform,
        }
    }

    /// Registers a package with no files.
    pub fn with_package(mut self, package: &str) -> Self {
        self.package_mut(package);
        self
    }

    /// Adds a file, registering the package on first use.
    pub fn with_file(mut self, package: &str, file: &str, content: impl Into<Vec<u8>>) -> Self {
        self.package_mut(package)
            .insert(file.to_string(), content.into());
        self
    }

    fn package_mut(&mut self, package: &str) -> &mut BTreeMap<String, Vec<u8>> {
        let index = match self.packages.iter().position(|(name, _)| name == package) {
            Some(index) => index,
            None => {
                self.packages.push((package.to_string(), BTreeMap::new()));
                self.packages.len() - 1
            }
        };
        &mut self.packages[index].1
    }

    fn files(&self, package: &str) -> Option<&BTreeMap<String, Vec<u8>>> {
        self.packages
            .iter()
            .find(|(name, _)| name == package)
            .map(|(_, files)| files)
    }
}

impl PackageSource for MemorySource {
    fn list_packages(&self) -> io::Result<Vec<String>> {
        Ok(self.packages.iter().map(|(name, _)| name.clone()).collect())
    }

    fn list_package_files(&self, package: &str) -> io::Result<Vec<String>> {
        Ok(self
            .files(package)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn read_file(&self, package: &str, file: &str) -> io::Result<Option<Vec<u8>>> {
        Ok(self
            .files(package)
            .and_then(|files| files.get(file))
            .cloned())
    }

    fn current_platform(&self) -> Platform {
        self.platform
    }
}
