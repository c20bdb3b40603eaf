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

//! # Execution Path Registry
//!
//! Process-wide, append-only, ordered set of search roots. Roots are
//! canonicalized on insertion so the same location reached through different
//! spellings is stored once. Search order is insertion order.
//!
//! The compiler class path is derived from the same list on demand, so the
//! runtime's own resolution configuration never drifts from the registry.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::errors::{JiError, Result};

/// A single search root as seen by a namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JiCNamespaceRoot {
    Directory(PathBuf),
    /// A packaged container backing its own entries.
    Archive(PathBuf),
}

impl JiCNamespaceRoot {
    /// Classifies a canonical location: `.jar`/`.zip` files are archives,
    /// everything else is a directory root.
    #[allow(non_snake_case)]
    pub fn JiFClassify(path: PathBuf) -> Self {
        if path.is_file() && JiFIsArchivePath(&path) {
            JiCNamespaceRoot::Archive(path)
        } else {
            JiCNamespaceRoot::Directory(path)
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFPath(&self) -> &Path {
        match self {
            JiCNamespaceRoot::Directory(p) | JiCNamespaceRoot::Archive(p) => p,
        }
    }

    /// URL-style locator: `file:<dir>/` or `jar:file:<archive>!/`.
    #[allow(non_snake_case)]
    pub fn JiFLocator(&self) -> String {
        match self {
            JiCNamespaceRoot::Directory(p) => format!("file:{}/", p.display()),
            JiCNamespaceRoot::Archive(p) => format!("jar:file:{}!/", p.display()),
        }
    }
}

impl fmt::Display for JiCNamespaceRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.JiFLocator())
    }
}

#[allow(non_snake_case)]
pub fn JiFIsArchivePath(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Ordered, append-only registry of search roots.
#[derive(Debug, Default)]
pub struct JiCExecutionPath {
    roots: RwLock<Vec<PathBuf>>,
}

static JI_GLOBAL_EXECUTION_PATH: OnceLock<Arc<JiCExecutionPath>> = OnceLock::new();

impl JiCExecutionPath {
    #[allow(non_snake_case)]
    pub fn JiFNew() -> Self {
        JiCExecutionPath {
            roots: RwLock::new(Vec::new()),
        }
    }

    /// The process-wide registry shared by loaders built from the environment.
    #[allow(non_snake_case)]
    pub fn JiFGlobal() -> Arc<JiCExecutionPath> {
        JI_GLOBAL_EXECUTION_PATH
            .get_or_init(|| Arc::new(JiCExecutionPath::JiFNew()))
            .clone()
    }

    /// Adds a root. Returns `Ok(true)` when it was new, `Ok(false)` when it
    /// was already registered.
    #[allow(non_snake_case)]
    pub fn JiFAdd(&self, location: impl AsRef<Path>) -> Result<bool> {
        let location = location.as_ref();
        if location.as_os_str().is_empty() {
            return Err(JiError::malformed_path("", "empty location"));
        }
        let canonical = fs::canonicalize(location)
            .map_err(|e| JiError::malformed_path(location.display().to_string(), e.to_string()))?;

        let mut roots = self.roots.write().unwrap_or_else(PoisonError::into_inner);
        if roots.contains(&canonical) {
            log::debug!("execution path '{}' already registered", canonical.display());
            return Ok(false);
        }
        log::info!("execution path '{}' registered", canonical.display());
        roots.push(canonical);
        Ok(true)
    }

    /// Best-effort batch registration. Malformed locations are reported and
    /// skipped; the remaining locations are still added.
    #[allow(non_snake_case)]
    pub fn JiFAddAll<I, P>(&self, locations: I) -> Vec<JiError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut errors = Vec::new();
        for location in locations {
            if let Err(err) = self.JiFAdd(location) {
                log::warn!("skipping execution path: {}", err);
                errors.push(err);
            }
        }
        errors
    }

    /// Snapshot of the roots in insertion order.
    #[allow(non_snake_case)]
    pub fn JiFRoots(&self) -> Vec<JiCNamespaceRoot> {
        self.read_paths()
            .into_iter()
            .map(JiCNamespaceRoot::JiFClassify)
            .collect()
    }

    #[allow(non_snake_case)]
    pub fn JiFLen(&self) -> usize {
        self.roots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[allow(non_snake_case)]
    pub fn JiFIsEmpty(&self) -> bool {
        self.JiFLen() == 0
    }

    #[allow(non_snake_case)]
    pub fn JiFContains(&self, location: impl AsRef<Path>) -> bool {
        match fs::canonicalize(location.as_ref()) {
            Ok(canonical) => self.read_paths().contains(&canonical),
            Err(_) => false,
        }
    }

    /// Roots joined with the platform path-list separator, suitable for a
    /// compiler `-cp` argument.
    #[allow(non_snake_case)]
    pub fn JiFClassPath(&self) -> OsString {
        env::join_paths(self.read_paths()).unwrap_or_default()
    }

    fn read_paths(&self) -> Vec<PathBuf> {
        self.roots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
