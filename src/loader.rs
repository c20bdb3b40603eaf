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

//! # Isolated Loader
//!
//! Compiles sources into the output root and resolves each primary unit
//! through its own single-use namespace. One call produces one session; an
//! input that fails leaves its slot empty and its error in the session's
//! failure list, and the remaining inputs are still loaded.
//!
//! Compiling, publishing and resolving a source happen under one lock per
//! output root, so a load never resolves a unit another load published over
//! its own.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::compiler::{JiCCompilationResult, JiCCompileGateway, JiCCompiler, JiCJavacCompiler, JiFCompilerClassPath};
use crate::config::JiCLoaderConfig;
use crate::errors::{JiError, Result};
use crate::introspect::JiCLoadUnit;
use crate::namespace::JiCNamespace;
use crate::path::JiCExecutionPath;
use crate::session::JiCLoadSession;

#[derive(Debug)]
pub struct JiCLoader {
    config: JiCLoaderConfig,
    output_root: PathBuf,
    paths: Arc<JiCExecutionPath>,
    gateway: JiCCompileGateway,
    publish_lock: Arc<Mutex<()>>,
}

/// Lock shared by every loader publishing into `output_root`.
fn publish_lock(output_root: &Path) -> Arc<Mutex<()>> {
    static JI_PUBLISH_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    let mut locks = JI_PUBLISH_LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    locks.entry(output_root.to_path_buf()).or_default().clone()
}

impl JiCLoader {
    /// Builds a loader over `paths`. The output root is created if needed and
    /// registered as a search root.
    #[allow(non_snake_case)]
    pub fn JiFNew(
        config: JiCLoaderConfig,
        paths: Arc<JiCExecutionPath>,
        compiler: Box<dyn JiCCompiler>,
    ) -> Result<Self> {
        config.JiFValidate()?;
        fs::create_dir_all(&config.output_root)?;
        let output_root = fs::canonicalize(&config.output_root)?;
        paths.JiFAdd(&output_root)?;

        log::info!(
            "loader ready: output root '{}', compiler '{}'",
            output_root.display(),
            compiler.name()
        );

        Ok(JiCLoader {
            config,
            publish_lock: publish_lock(&output_root),
            output_root,
            paths,
            gateway: JiCCompileGateway::JiFNew(compiler),
        })
    }

    /// Loader configured from the environment, sharing the process-wide
    /// registry and running `javac`.
    #[allow(non_snake_case)]
    pub fn JiFFromEnv() -> Result<Self> {
        let config = JiCLoaderConfig::JiFFromEnv()?;
        let compiler = Box::new(JiCJavacCompiler::JiFFromConfig(&config));
        JiCLoader::JiFNew(config, JiCExecutionPath::JiFGlobal(), compiler)
    }

    #[allow(non_snake_case)]
    pub fn JiFConfig(&self) -> &JiCLoaderConfig {
        &self.config
    }

    /// Canonical output root.
    #[allow(non_snake_case)]
    pub fn JiFOutputRoot(&self) -> &Path {
        &self.output_root
    }

    #[allow(non_snake_case)]
    pub fn JiFExecutionPath(&self) -> &Arc<JiCExecutionPath> {
        &self.paths
    }

    #[allow(non_snake_case)]
    pub fn JiFAddExecutionPath(&self, location: impl AsRef<Path>) -> Result<bool> {
        self.paths.JiFAdd(location)
    }

    /// Compiles and loads each source. The session has exactly one slot per
    /// input, in input order.
    #[allow(non_snake_case)]
    pub fn JiFLoadFromFile<I, P>(&self, sources: I) -> Result<JiCLoadSession>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut session = JiCLoadSession::JiFNew();
        for source in sources {
            let source = source.as_ref();
            match self.load_source(&mut session, source) {
                Ok(unit) => {
                    session.JiFPushUnit(unit);
                }
                Err(err) => {
                    log::warn!("failed to load '{}': {}", source.display(), err);
                    session.JiFPushFailure(source.display().to_string(), err);
                }
            }
        }
        Ok(session)
    }

    /// Writes `source` to `<scratch>/<name>.java` under the output root and
    /// loads it. The scratch directory is removed before returning.
    #[allow(non_snake_case)]
    pub fn JiFLoadFromMemory(&self, name: &str, source: &str) -> Result<JiCLoadSession> {
        let file_name = scratch_file_name(name)?;
        let scratch = tempfile::Builder::new()
            .prefix(".ji-src-")
            .tempdir_in(&self.output_root)?;
        let path = scratch.path().join(file_name);
        fs::write(&path, source)?;
        log::debug!("in-memory source '{}' written to '{}'", name, path.display());

        self.JiFLoadFromFile([path.as_path()])
    }

    fn load_source(&self, session: &mut JiCLoadSession, source: &Path) -> Result<JiCLoadUnit> {
        let class_path = JiFCompilerClassPath(&self.paths.JiFClassPath(), &self.output_root);
        let _published = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let result = match self
            .gateway
            .JiFCompile(source, &self.output_root, &class_path)
        {
            Ok(result) => result,
            Err(err) => {
                session.JiFRecordCompilation(JiCCompilationResult::JiFInterrupted(source, &err));
                return Err(err);
            }
        };
        session.JiFRecordCompilation(result.clone());

        let primary = match result.JiFPrimaryUnit() {
            Some(unit) => unit.name.clone(),
            None => return Err(result.JiFIntoError()),
        };
        self.resolve(&primary)
    }

    /// Resolves `name` through a fresh namespace over the current roots.
    pub(crate) fn resolve(&self, name: &str) -> Result<JiCLoadUnit> {
        let namespace = JiCNamespace::JiFNew(self.paths.JiFRoots());
        let resolved = namespace.JiFResolve(name)?;
        JiCLoadUnit::JiFFromClass(&resolved.class, resolved.root, resolved.namespace_id)
    }
}

fn scratch_file_name(name: &str) -> Result<String> {
    let stem = name.strip_suffix(".java").unwrap_or(name);
    if stem.is_empty() {
        return Err(JiError::malformed_path(name, "empty unit name"));
    }
    if stem.contains(|c: char| c == '/' || c == '\\') || stem == "." || stem == ".." {
        return Err(JiError::malformed_path(name, "unit name must not contain path separators"));
    }
    Ok(format!("{}.java", stem))
}
