//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Ji.
//! The Ji project belongs to the Dunimd Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Archive Expander
//!
//! Loads precompiled units without invoking the compiler: either a single
//! `.class` artifact, or every unit packaged in a `.jar`/`.zip` archive.
//! Archive entries are resolved one by one; a failing entry is recorded and
//! the batch goes on.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::classfile::{JiFParseClassFile, JiFQualifiedNameFromEntry};
use crate::errors::{JiError, Result};
use crate::introspect::JiCLoadUnit;
use crate::loader::JiCLoader;
use crate::namespace::JiCNamespace;
use crate::path::JiCNamespaceRoot;
use crate::session::JiCLoadSession;

const JI_SKIPPED_STEMS: [&str; 2] = ["module-info", "package-info"];

impl JiCLoader {
    /// Loads a `.class` file or every unit of a `.jar`/`.zip` archive.
    #[allow(non_snake_case)]
    pub fn JiFLoadPackage(&self, path: impl AsRef<Path>) -> Result<JiCLoadSession> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("class") => self.load_class_artifact(path),
            Some("jar") | Some("zip") => self.load_archive(path),
            _ => Err(JiError::validation(format!(
                "unsupported package '{}': expected .class, .jar or .zip",
                path.display()
            ))),
        }
    }

    fn load_class_artifact(&self, path: &Path) -> Result<JiCLoadSession> {
        let located = self.locate_class_artifact(path)?;
        let class = JiFParseClassFile(&fs::read(&located)?)?;

        let mut package_root = located.parent();
        for _ in 0..class.JiFPackageDepth() {
            package_root = package_root.and_then(Path::parent);
        }
        let package_root = package_root.ok_or_else(|| {
            JiError::malformed_path(
                located.display().to_string(),
                format!("too shallow for package of '{}'", class.name),
            )
        })?;
        self.JiFAddExecutionPath(package_root)?;

        let mut session = JiCLoadSession::JiFNew();
        match self.resolve(&class.name) {
            Ok(unit) => {
                session.JiFPushUnit(unit);
            }
            Err(err) => {
                log::warn!("failed to load '{}': {}", located.display(), err);
                session.JiFPushFailure(located.display().to_string(), err);
            }
        }
        Ok(session)
    }

    fn locate_class_artifact(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return if path.is_file() {
                Ok(path.to_path_buf())
            } else {
                Err(JiError::malformed_path(path.display().to_string(), "no such file"))
            };
        }
        self.JiFExecutionPath()
            .JiFRoots()
            .iter()
            .filter_map(|root| match root {
                JiCNamespaceRoot::Directory(dir) => Some(dir.join(path)),
                JiCNamespaceRoot::Archive(_) => None,
            })
            .find(|candidate| candidate.is_file())
            .or_else(|| path.is_file().then(|| path.to_path_buf()))
            .ok_or_else(|| {
                JiError::malformed_path(
                    path.display().to_string(),
                    "not found under any execution path root",
                )
            })
    }

    fn load_archive(&self, path: &Path) -> Result<JiCLoadSession> {
        let located = self.locate_archive(path)?;
        let entries = {
            let archive = ZipArchive::new(File::open(&located)?)?;
            class_entries(&archive)
        };
        log::info!(
            "expanding '{}': {} class entr{}",
            located.display(),
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" }
        );

        let mut session = JiCLoadSession::JiFNew();
        for entry in entries {
            match resolve_entry(&located, &entry) {
                Ok(unit) => {
                    session.JiFPushUnit(unit);
                }
                Err(err) => {
                    log::warn!("archive entry '{}' failed: {}", entry, err);
                    session.JiFPushFailure(entry, err);
                }
            }
        }
        self.JiFAddExecutionPath(&located)?;

        if !session.JiFFailures().is_empty() {
            log::warn!(
                "'{}': {} of {} entries failed",
                located.display(),
                session.JiFFailures().len(),
                session.JiFSlots().len()
            );
        }
        Ok(session)
    }

    /// Absolute path, else the first root under which the archive opens,
    /// else the path as given.
    fn locate_archive(&self, path: &Path) -> Result<PathBuf> {
        if !path.is_absolute() {
            let found = self
                .JiFExecutionPath()
                .JiFRoots()
                .iter()
                .filter_map(|root| match root {
                    JiCNamespaceRoot::Directory(dir) => Some(dir.join(path)),
                    JiCNamespaceRoot::Archive(_) => None,
                })
                .find(|candidate| opens_as_archive(candidate));
            if let Some(found) = found {
                return Ok(fs::canonicalize(found)?);
            }
        }
        fs::canonicalize(path)
            .map_err(|e| JiError::malformed_path(path.display().to_string(), e.to_string()))
    }
}

fn opens_as_archive(path: &Path) -> bool {
    File::open(path)
        .ok()
        .map(|file| ZipArchive::new(file).is_ok())
        .unwrap_or(false)
}

/// `*.class` entries in name order, without directories, `META-INF/` and
/// module/package descriptors.
fn class_entries(archive: &ZipArchive<File>) -> Vec<String> {
    let mut entries: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/') && name.ends_with(".class"))
        .filter(|name| !name.starts_with("META-INF/"))
        .filter(|name| {
            let stem = name
                .rsplit('/')
                .next()
                .and_then(|file| file.strip_suffix(".class"))
                .unwrap_or("");
            !JI_SKIPPED_STEMS.contains(&stem)
        })
        .map(String::from)
        .collect();
    entries.sort();
    entries
}

fn resolve_entry(archive: &Path, entry: &str) -> Result<JiCLoadUnit> {
    let name = JiFQualifiedNameFromEntry(entry)
        .ok_or_else(|| JiError::malformed_path(entry, "not a class entry"))?;
    let namespace = JiCNamespace::JiFNew(vec![JiCNamespaceRoot::Archive(archive.to_path_buf())]);
    let resolved = namespace.JiFResolve(&name)?;
    JiCLoadUnit::JiFFromClass(&resolved.class, resolved.root, resolved.namespace_id)
}
