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

//! # Compile Gateway
//!
//! Turns a source file into binary units under a fixed output root.
//!
//! The compiler writes into a private staging directory. The gateway then
//! reads each produced artifact, takes the unit name the artifact itself
//! declares, and moves it to `<output_root>/<package path>/<Name>.class`.
//! File names are never used to guess unit names: a source file may declare
//! several units, none of which needs to match the file name.
//!
//! Diagnostics are collected on every outcome. A failed compilation moves
//! nothing into the output root.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::OnceLock;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classfile::{JiFArtifactPath, JiFParseClassFile};
use crate::config::JiCLoaderConfig;
use crate::errors::{JiError, Result};

const JI_POLL_INTERVAL: Duration = Duration::from_millis(20);
const JI_DRAIN_GRACE: Duration = Duration::from_millis(200);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JiCSeverity {
    Error,
    Warning,
    Note,
}

impl JiCSeverity {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "error" => Some(JiCSeverity::Error),
            "warning" => Some(JiCSeverity::Warning),
            "note" => Some(JiCSeverity::Note),
            _ => None,
        }
    }
}

/// One compiler message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiCDiagnostic {
    pub severity: JiCSeverity,
    pub line: Option<u32>,
    pub message: String,
    pub source_name: String,
}

impl fmt::Display for JiCDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(
                f,
                "{}:{}: {:?}: {}",
                self.source_name, line, self.severity, self.message
            ),
            None => write!(f, "{}: {:?}: {}", self.source_name, self.severity, self.message),
        }
    }
}

/// Raw outcome of running a compiler into a staging directory.
#[derive(Clone, Debug, Default)]
pub struct JiCCompilerOutput {
    pub success: bool,
    pub diagnostics: Vec<JiCDiagnostic>,
}

/// A unit produced by a compilation, placed under the output root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiCCompiledUnit {
    /// Declared qualified name read from the artifact.
    pub name: String,
    pub artifact: PathBuf,
    pub nested: bool,
}

/// Immutable result of one compile invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiCCompilationResult {
    pub source: PathBuf,
    pub success: bool,
    pub diagnostics: Vec<JiCDiagnostic>,
    /// Primary unit first, when the compilation succeeded.
    pub units: Vec<JiCCompiledUnit>,
}

impl JiCCompilationResult {
    #[allow(non_snake_case)]
    pub fn JiFPrimaryUnit(&self) -> Option<&JiCCompiledUnit> {
        if self.success {
            self.units.first()
        } else {
            None
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFErrors(&self) -> impl Iterator<Item = &JiCDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == JiCSeverity::Error)
    }

    /// Converts a failed result into `CompileFailed`.
    #[allow(non_snake_case)]
    pub fn JiFIntoError(self) -> JiError {
        JiError::CompileFailed {
            unit: self.source.display().to_string(),
            diagnostics: self.diagnostics,
        }
    }

    /// Failed result for a compile attempt that ended in `err` before the
    /// compiler gave a verdict. Output captured before a timeout is kept.
    #[allow(non_snake_case)]
    pub fn JiFInterrupted(source: &Path, err: &JiError) -> Self {
        let mut diagnostics = match err {
            JiError::Timeout { diagnostics, .. } => diagnostics.clone(),
            _ => Vec::new(),
        };
        diagnostics.push(JiCDiagnostic {
            severity: JiCSeverity::Error,
            line: None,
            message: err.to_string(),
            source_name: source.display().to_string(),
        });
        JiCCompilationResult {
            source: source.to_path_buf(),
            success: false,
            diagnostics,
            units: Vec::new(),
        }
    }
}

/// A source-to-binary compiler writing into a staging directory.
pub trait JiCCompiler: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn invoke(&self, source: &Path, staging: &Path, class_path: &OsStr) -> Result<JiCCompilerOutput>;
}

/// Runs a `javac`-compatible command with a deadline.
#[derive(Clone, Debug)]
pub struct JiCJavacCompiler {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl JiCJavacCompiler {
    #[allow(non_snake_case)]
    pub fn JiFNew(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        JiCJavacCompiler {
            program: program.into(),
            args,
            timeout,
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFFromConfig(config: &JiCLoaderConfig) -> Self {
        JiCJavacCompiler::JiFNew(
            config.compiler.clone(),
            config.compiler_args.clone(),
            config.JiFCompileTimeout(),
        )
    }

    fn wait_with_deadline(&self, mut child: Child, source: &Path) -> Result<(bool, String)> {
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        let deadline = Instant::now() + self.timeout;

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                log::warn!("'{}' exceeded {:?}, killing it", self.program, self.timeout);
                let _ = child.kill();
                let _ = child.wait();
                let text = join_output(stderr, Some(JI_DRAIN_GRACE), stdout);
                return Err(JiError::Timeout {
                    command: self.program.clone(),
                    seconds: self.timeout.as_secs(),
                    diagnostics: JiFParseDiagnostics(&text, &source.display().to_string()),
                });
            }
            thread::sleep(JI_POLL_INTERVAL);
        };

        Ok((status.success(), join_output(stderr, None, stdout)))
    }
}

impl JiCCompiler for JiCJavacCompiler {
    fn name(&self) -> &str {
        &self.program
    }

    fn invoke(&self, source: &Path, staging: &Path, class_path: &OsStr) -> Result<JiCCompilerOutput> {
        let mut command = Command::new(&self.program);
        command.arg("-d").arg(staging);
        if !class_path.is_empty() {
            command.arg("-cp").arg(class_path);
        }
        command
            .args(&self.args)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command
            .spawn()
            .map_err(|e| JiError::Io(format!("failed to start '{}': {}", self.program, e)))?;
        let (success, text) = self.wait_with_deadline(child, source)?;

        Ok(JiCCompilerOutput {
            success,
            diagnostics: JiFParseDiagnostics(&text, &source.display().to_string()),
        })
    }
}

/// Output of one child pipe, read chunk by chunk on its own thread.
struct JiCOutputPipe {
    chunks: Receiver<Vec<u8>>,
    reader: JoinHandle<()>,
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JiCOutputPipe {
    let (tx, chunks) = mpsc::channel();
    let reader = thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match pipe.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });
    JiCOutputPipe { chunks, reader }
}

impl JiCOutputPipe {
    /// Collects the pipe's text. Without a grace period this blocks until the
    /// pipe closes. With one, it stops when the grace period elapses; children
    /// of a killed compiler can keep the pipe open.
    fn collect(self, grace: Option<Duration>) -> String {
        let mut bytes = Vec::new();
        let closed = match grace {
            None => {
                bytes.extend(self.chunks.iter().flatten());
                true
            }
            Some(grace) => {
                let until = Instant::now() + grace;
                loop {
                    let left = until.saturating_duration_since(Instant::now());
                    match self.chunks.recv_timeout(left) {
                        Ok(chunk) => bytes.extend(chunk),
                        Err(RecvTimeoutError::Disconnected) => break true,
                        Err(RecvTimeoutError::Timeout) => break false,
                    }
                }
            }
        };
        if closed {
            let _ = self.reader.join();
        } else {
            log::debug!("compiler output pipe still open after kill, leaving reader detached");
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Stderr text followed by any stdout text.
fn join_output(
    stderr: Option<JiCOutputPipe>,
    grace: Option<Duration>,
    stdout: Option<JiCOutputPipe>,
) -> String {
    let mut text = stderr.map(|p| p.collect(grace)).unwrap_or_default();
    let out = stdout.map(|p| p.collect(grace)).unwrap_or_default();
    if !out.is_empty() {
        text.push('\n');
        text.push_str(&out);
    }
    text
}

fn located_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<file>.+?):(?P<line>\d+): (?P<sev>error|warning|note): (?P<msg>.*)$")
            .expect("valid diagnostic pattern")
    })
}

fn unlocated_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<sev>error|warning|Note|note): (?P<msg>.*)$")
            .expect("valid diagnostic pattern")
    })
}

/// Extracts diagnostics from `javac`-style output. Source excerpts, carets
/// and summary lines are ignored.
#[allow(non_snake_case)]
pub fn JiFParseDiagnostics(output: &str, default_source: &str) -> Vec<JiCDiagnostic> {
    let mut diagnostics = Vec::new();
    for line in output.lines() {
        let line = line.trim_end();
        if let Some(caps) = located_pattern().captures(line) {
            if let Some(severity) = JiCSeverity::parse(&caps["sev"]) {
                diagnostics.push(JiCDiagnostic {
                    severity,
                    line: caps["line"].parse().ok(),
                    message: caps["msg"].to_string(),
                    source_name: caps["file"].to_string(),
                });
            }
        } else if let Some(caps) = unlocated_pattern().captures(line) {
            if let Some(severity) = JiCSeverity::parse(&caps["sev"]) {
                diagnostics.push(JiCDiagnostic {
                    severity,
                    line: None,
                    message: caps["msg"].to_string(),
                    source_name: default_source.to_string(),
                });
            }
        }
    }
    diagnostics
}

/// Drives a compiler and publishes its artifacts under the output root.
#[derive(Debug)]
pub struct JiCCompileGateway {
    compiler: Box<dyn JiCCompiler>,
}

impl JiCCompileGateway {
    #[allow(non_snake_case)]
    pub fn JiFNew(compiler: Box<dyn JiCCompiler>) -> Self {
        JiCCompileGateway { compiler }
    }

    #[allow(non_snake_case)]
    pub fn JiFCompilerName(&self) -> &str {
        self.compiler.name()
    }

    #[allow(non_snake_case)]
    pub fn JiFCompile(
        &self,
        source: &Path,
        output_root: &Path,
        class_path: &OsStr,
    ) -> Result<JiCCompilationResult> {
        fs::create_dir_all(output_root)?;
        let staging = tempfile::Builder::new()
            .prefix(".ji-stage-")
            .tempdir_in(output_root)?;

        log::info!(
            "compiling '{}' with '{}'",
            source.display(),
            self.compiler.name()
        );
        let output = self.compiler.invoke(source, staging.path(), class_path)?;
        let mut diagnostics = output.diagnostics;

        if !output.success {
            log::warn!(
                "compilation of '{}' failed with {} diagnostic(s)",
                source.display(),
                diagnostics.len()
            );
            return Ok(JiCCompilationResult {
                source: source.to_path_buf(),
                success: false,
                diagnostics,
                units: Vec::new(),
            });
        }

        let mut artifacts = Vec::new();
        collect_artifacts(staging.path(), &mut artifacts)?;
        if artifacts.is_empty() {
            diagnostics.push(JiCDiagnostic {
                severity: JiCSeverity::Error,
                line: None,
                message: "compiler reported success but produced no artifacts".to_string(),
                source_name: source.display().to_string(),
            });
            return Ok(JiCCompilationResult {
                source: source.to_path_buf(),
                success: false,
                diagnostics,
                units: Vec::new(),
            });
        }

        let mut staged = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let class = JiFParseClassFile(&fs::read(&artifact)?)?;
            staged.push((artifact, class));
        }
        staged.sort_by(|a, b| a.1.name.cmp(&b.1.name));

        let primary = staged
            .iter()
            .position(|(_, c)| !c.JiFIsNested() && c.JiFIsPublic())
            .or_else(|| staged.iter().position(|(_, c)| !c.JiFIsNested()))
            .unwrap_or(0);

        let mut units = Vec::with_capacity(staged.len());
        for (from, class) in &staged {
            let to = output_root.join(JiFArtifactPath(&class.name));
            publish(from, &to)?;
            units.push(JiCCompiledUnit {
                name: class.name.clone(),
                artifact: to,
                nested: class.JiFIsNested(),
            });
        }
        let primary_unit = units.remove(primary);
        units.insert(0, primary_unit);

        log::info!(
            "compiled '{}': primary unit '{}', {} unit(s), {} diagnostic(s)",
            source.display(),
            units[0].name,
            units.len(),
            diagnostics.len()
        );

        Ok(JiCCompilationResult {
            source: source.to_path_buf(),
            success: true,
            diagnostics,
            units,
        })
    }
}

fn collect_artifacts(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_artifacts(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("class") {
            out.push(path);
        }
    }
    Ok(())
}

fn publish(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::rename(from, to)?;
    Ok(())
}

/// Class path argument for a compiler, including the output root itself.
#[allow(non_snake_case)]
pub fn JiFCompilerClassPath(registry_path: &OsStr, output_root: &Path) -> OsString {
    let mut paths: Vec<PathBuf> = std::env::split_paths(registry_path)
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    if !paths.iter().any(|p| p == output_root) {
        paths.push(output_root.to_path_buf());
    }
    std::env::join_paths(paths).unwrap_or_else(|_| registry_path.to_os_string())
}
