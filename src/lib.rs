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

//! # Ji Core Library
//!
//! Ji compiles JVM source files at runtime, loads the resulting units in
//! isolation from each other, and exposes their shape to a host dispatcher
//! that calls into them from another language.
//!
//! ## Module Overview
//!
//! - **path**: Execution Path registry, the ordered set of search roots
//! - **compiler**: Compile gateway and the `javac` process driver
//! - **classfile**: Class file reader and static initializer evaluation
//! - **namespace**: Single-use namespaces resolving one unit each
//! - **loader**: Isolated loading from source files and in-memory text
//! - **package**: Loading precompiled `.class` files and `.jar`/`.zip` archives
//! - **session**: Per-call arena of loaded units and their handles
//! - **introspect**: Member descriptors and static field accessors
//! - **signature** / **value**: Type descriptors and typed static values
//! - **config**: Loader configuration from the environment or JSON
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ji::{JiCLoader, JiCValueKind};
//!
//! // LOADER_SCRIPT_PATH names the output root
//! let loader = JiCLoader::JiFFromEnv()?;
//! let session = loader.JiFLoadFromMemory(
//!     "Calc",
//!     "public class Calc { public static int LIMIT = 3; public static int add(int a, int b) { return a + b; } }",
//! )?;
//!
//! let calc = session.JiFSlots()[0].expect("Calc loaded");
//! for method in session.JiFDiscoverMethods(calc)? {
//!     println!("{} {}", method.name, method.JiFSignatureString()); // add (II)I
//! }
//! let limit = session.JiFGetStaticField(calc, "LIMIT", JiCValueKind::Int)?;
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, JiError>`. Per-input failures of a load
//! call do not fail the call: they leave an empty slot and are listed in
//! `JiCLoadSession::JiFFailures`.

#![allow(non_snake_case)]

pub mod classfile;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod introspect;
pub mod loader;
pub mod namespace;
pub mod package;
pub mod path;
pub mod session;
pub mod signature;
pub mod value;

pub use errors::{JiError, Result};

pub use classfile::{JiCClassFile, JiFParseClassFile};
pub use compiler::{
    JiCCompilationResult, JiCCompileGateway, JiCCompiledUnit, JiCCompiler, JiCCompilerOutput,
    JiCDiagnostic, JiCJavacCompiler, JiCSeverity,
};
pub use config::JiCLoaderConfig;
pub use introspect::{
    JiCLoadUnit, JiCMemberDescriptor, JiCMemberKind, JiCMemberSignature, JiCStaticness,
    JiCVisibility,
};
pub use loader::JiCLoader;
pub use namespace::{JiCAttemptOutcome, JiCNamespace, JiCRootAttempt};
pub use path::{JiCExecutionPath, JiCNamespaceRoot};
pub use session::{JiCHandle, JiCLoadFailure, JiCLoadSession};
pub use signature::{JiCMethodSignature, JiCScalar, JiCTypeSignature};
pub use value::{JiCValue, JiCValueKind};
