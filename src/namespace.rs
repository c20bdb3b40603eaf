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

//! # Single-Use Namespaces
//!
//! A namespace is built over a snapshot of roots, resolves exactly one
//! qualified name, and is consumed by doing so. Nothing it read survives into
//! the next resolution, so two loads of the same name never share a unit.
//!
//! Each root is tried in order. A root either does not contain the unit
//! (`NotFound`, try the next one) or fails for another reason (`Failed`:
//! permissions, corrupt archive, declared name differs from the requested
//! one). Both advance to the next root and both are kept, in order, in the
//! failure report.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use zip::result::ZipError;
use zip::ZipArchive;

use crate::classfile::{JiCClassFile, JiFArtifactPath, JiFParseClassFile};
use crate::errors::JiError;
use crate::path::JiCNamespaceRoot;

static JI_NEXT_NAMESPACE: AtomicU64 = AtomicU64::new(1);

/// Upper bound on the buffer reserved from an archive entry's stated size.
const JI_ENTRY_PREALLOC_LIMIT: u64 = 1 << 20;

/// Outcome of looking for a unit under one root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JiCAttemptOutcome {
    NotFound,
    Failed(String),
}

/// One root tried during a resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiCRootAttempt {
    pub root: String,
    pub outcome: JiCAttemptOutcome,
}

impl fmt::Display for JiCRootAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            JiCAttemptOutcome::NotFound => write!(f, "{}: not found", self.root),
            JiCAttemptOutcome::Failed(reason) => write!(f, "{}: {}", self.root, reason),
        }
    }
}

/// A unit resolved by a namespace, with the root that produced it.
#[derive(Clone, Debug)]
pub struct JiCResolvedUnit {
    pub class: JiCClassFile,
    pub root: JiCNamespaceRoot,
    /// Roots tried (and skipped) before the winning one.
    pub skipped: Vec<JiCRootAttempt>,
    pub namespace_id: u64,
}

/// Every root was tried without success.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JiCResolutionFailure {
    pub name: String,
    pub attempts: Vec<JiCRootAttempt>,
}

impl JiCResolutionFailure {
    /// True when no root reported anything other than "not found".
    #[allow(non_snake_case)]
    pub fn JiFNotFoundAnywhere(&self) -> bool {
        self.attempts
            .iter()
            .all(|a| a.outcome == JiCAttemptOutcome::NotFound)
    }
}

impl From<JiCResolutionFailure> for JiError {
    fn from(failure: JiCResolutionFailure) -> Self {
        JiError::ResolutionFailed {
            name: failure.name,
            attempts: failure.attempts,
        }
    }
}

/// Fresh namespace over a fixed list of roots. Consumed by `JiFResolve`.
#[derive(Debug)]
pub struct JiCNamespace {
    id: u64,
    roots: Vec<JiCNamespaceRoot>,
}

impl JiCNamespace {
    #[allow(non_snake_case)]
    pub fn JiFNew(roots: Vec<JiCNamespaceRoot>) -> Self {
        JiCNamespace {
            id: JI_NEXT_NAMESPACE.fetch_add(1, Ordering::Relaxed),
            roots,
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFId(&self) -> u64 {
        self.id
    }

    #[allow(non_snake_case)]
    pub fn JiFRoots(&self) -> &[JiCNamespaceRoot] {
        &self.roots
    }

    /// Resolves `qualified_name` against the roots in order. The first root
    /// that yields a well-formed unit with the requested declared name wins.
    #[allow(non_snake_case)]
    pub fn JiFResolve(
        self,
        qualified_name: &str,
    ) -> std::result::Result<JiCResolvedUnit, JiCResolutionFailure> {
        let artifact = JiFArtifactPath(qualified_name);
        let mut attempts = Vec::with_capacity(self.roots.len());

        for root in &self.roots {
            let outcome = match read_artifact(root, &artifact) {
                Ok(Some(bytes)) => match JiFParseClassFile(&bytes) {
                    Ok(class) if class.name == qualified_name => {
                        log::debug!(
                            "namespace {} resolved '{}' from {}",
                            self.id,
                            qualified_name,
                            root
                        );
                        return Ok(JiCResolvedUnit {
                            class,
                            root: root.clone(),
                            skipped: attempts,
                            namespace_id: self.id,
                        });
                    }
                    Ok(class) => JiCAttemptOutcome::Failed(format!(
                        "wrong name: declares '{}'",
                        class.name
                    )),
                    Err(err) => JiCAttemptOutcome::Failed(err.to_string()),
                },
                Ok(None) => JiCAttemptOutcome::NotFound,
                Err(err) => JiCAttemptOutcome::Failed(err),
            };

            if let JiCAttemptOutcome::Failed(reason) = &outcome {
                log::warn!(
                    "namespace {}: '{}' failed under {}: {}",
                    self.id,
                    qualified_name,
                    root,
                    reason
                );
            }
            attempts.push(JiCRootAttempt {
                root: root.JiFLocator(),
                outcome,
            });
        }

        Err(JiCResolutionFailure {
            name: qualified_name.to_string(),
            attempts,
        })
    }
}

/// Reads `artifact` under `root`. `Ok(None)` means the root does not contain
/// it; `Err` carries any other failure.
fn read_artifact(
    root: &JiCNamespaceRoot,
    artifact: &str,
) -> std::result::Result<Option<Vec<u8>>, String> {
    match root {
        JiCNamespaceRoot::Directory(dir) => match fs::read(dir.join(artifact)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.to_string()),
        },
        JiCNamespaceRoot::Archive(path) => {
            let file = match File::open(path) {
                Ok(file) => file,
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(err.to_string()),
            };
            let mut archive = ZipArchive::new(file).map_err(|e| e.to_string())?;
            let mut entry = match archive.by_name(artifact) {
                Ok(entry) => entry,
                Err(ZipError::FileNotFound) => return Ok(None),
                Err(err) => return Err(err.to_string()),
            };
            let mut bytes = Vec::with_capacity(entry.size().min(JI_ENTRY_PREALLOC_LIMIT) as usize);
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| e.to_string())?;
            Ok(Some(bytes))
        }
    }
}
