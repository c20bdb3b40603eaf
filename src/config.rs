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

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{JiError, Result};

/// Environment variable naming the output directory for compiled artifacts.
pub const JI_OUTPUT_ROOT_ENV: &str = "LOADER_SCRIPT_PATH";
/// Environment variable overriding the compiler command.
pub const JI_COMPILER_ENV: &str = "JI_JAVAC";
/// Environment variable overriding the compile timeout in seconds.
pub const JI_COMPILE_TIMEOUT_ENV: &str = "JI_COMPILE_TIMEOUT_SECS";

/// Loader configuration. The output root is the only state written to disk;
/// the registry and loaded units live in memory.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct JiCLoaderConfig {
    /// Directory receiving compiled artifacts and scratch sources.
    pub output_root: PathBuf,
    /// Compiler command, resolved through `PATH` when not absolute.
    pub compiler: String,
    /// Extra arguments passed before the source file.
    pub compiler_args: Vec<String>,
    /// Deadline for one compiler invocation.
    pub compile_timeout_secs: u64,
}

impl Default for JiCLoaderConfig {
    fn default() -> Self {
        JiCLoaderConfig {
            output_root: env::temp_dir().join("ji-classes"),
            compiler: "javac".to_string(),
            compiler_args: vec!["-encoding".to_string(), "UTF-8".to_string()],
            compile_timeout_secs: 120,
        }
    }
}

impl JiCLoaderConfig {
    #[allow(non_snake_case)]
    pub fn JiFNew(output_root: impl Into<PathBuf>) -> Self {
        JiCLoaderConfig {
            output_root: output_root.into(),
            ..Default::default()
        }
    }

    /// Reads the configuration from the process environment.
    /// `LOADER_SCRIPT_PATH` is required.
    #[allow(non_snake_case)]
    pub fn JiFFromEnv() -> Result<Self> {
        let output_root = env::var_os(JI_OUTPUT_ROOT_ENV)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| JiError::Config(format!("{} is not set", JI_OUTPUT_ROOT_ENV)))?;

        let mut config = JiCLoaderConfig::JiFNew(PathBuf::from(output_root));

        if let Ok(compiler) = env::var(JI_COMPILER_ENV) {
            if !compiler.trim().is_empty() {
                config.compiler = compiler;
            }
        }

        if let Ok(raw) = env::var(JI_COMPILE_TIMEOUT_ENV) {
            config.compile_timeout_secs = raw.trim().parse::<u64>().map_err(|_| {
                JiError::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    JI_COMPILE_TIMEOUT_ENV, raw
                ))
            })?;
        }

        config.JiFValidate()?;
        Ok(config)
    }

    #[allow(non_snake_case)]
    pub fn JiFFromJsonFile(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: JiCLoaderConfig = serde_json::from_str(&text)?;
        config.JiFValidate()?;
        Ok(config)
    }

    #[allow(non_snake_case)]
    pub fn JiFValidate(&self) -> Result<()> {
        if self.output_root.as_os_str().is_empty() {
            return Err(JiError::Config("output_root must not be empty".into()));
        }
        if self.compiler.trim().is_empty() {
            return Err(JiError::Config("compiler must not be empty".into()));
        }
        if self.compile_timeout_secs == 0 {
            return Err(JiError::Config(
                "compile_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    #[allow(non_snake_case)]
    pub fn JiFCompileTimeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }
}
