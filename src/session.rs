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

//! # Load Sessions
//!
//! Every load call returns its own session: an arena holding the units that
//! call loaded, one slot per input, and the failures met along the way.
//! Handles are arena indices tagged with the session id, so a handle from
//! one session is rejected by every other session even when both hold a
//! unit with the same qualified name.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::compiler::JiCCompilationResult;
use crate::errors::{JiError, Result};
use crate::introspect::{JiCLoadUnit, JiCMemberDescriptor};
use crate::value::{JiCValue, JiCValueKind};

static JI_NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Opaque reference to a unit inside its owning session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JiCHandle {
    session: u64,
    index: usize,
}

impl JiCHandle {
    #[allow(non_snake_case)]
    pub fn JiFSession(&self) -> u64 {
        self.session
    }
}

impl fmt::Display for JiCHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.session, self.index)
    }
}

/// An input of a load call that produced no unit, or a packaged entry that
/// failed to resolve.
#[derive(Debug)]
pub struct JiCLoadFailure {
    pub input: String,
    pub error: JiError,
}

/// Arena of the units loaded by one call.
#[derive(Debug)]
pub struct JiCLoadSession {
    id: u64,
    units: Vec<JiCLoadUnit>,
    names: HashMap<String, usize>,
    slots: Vec<Option<JiCHandle>>,
    failures: Vec<JiCLoadFailure>,
    compilations: Vec<JiCCompilationResult>,
}

impl JiCLoadSession {
    #[allow(non_snake_case)]
    pub fn JiFNew() -> Self {
        JiCLoadSession {
            id: JI_NEXT_SESSION.fetch_add(1, Ordering::Relaxed),
            units: Vec::new(),
            names: HashMap::new(),
            slots: Vec::new(),
            failures: Vec::new(),
            compilations: Vec::new(),
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFId(&self) -> u64 {
        self.id
    }

    /// Adds a unit to the arena and fills the next slot with its handle.
    #[allow(non_snake_case)]
    pub(crate) fn JiFPushUnit(&mut self, unit: JiCLoadUnit) -> JiCHandle {
        let handle = JiCHandle {
            session: self.id,
            index: self.units.len(),
        };
        self.names.insert(unit.JiFName().to_string(), handle.index);
        self.units.push(unit);
        self.slots.push(Some(handle));
        handle
    }

    /// Leaves the next slot absent and records why.
    #[allow(non_snake_case)]
    pub(crate) fn JiFPushFailure(&mut self, input: impl Into<String>, error: JiError) {
        self.slots.push(None);
        self.JiFRecordFailure(input, error);
    }

    /// Records a failure without consuming a slot.
    #[allow(non_snake_case)]
    pub(crate) fn JiFRecordFailure(&mut self, input: impl Into<String>, error: JiError) {
        self.failures.push(JiCLoadFailure {
            input: input.into(),
            error,
        });
    }

    #[allow(non_snake_case)]
    pub(crate) fn JiFRecordCompilation(&mut self, result: JiCCompilationResult) {
        self.compilations.push(result);
    }

    /// One entry per input, `None` where nothing was loaded.
    #[allow(non_snake_case)]
    pub fn JiFSlots(&self) -> &[Option<JiCHandle>] {
        &self.slots
    }

    /// Handles of every loaded unit, in load order.
    #[allow(non_snake_case)]
    pub fn JiFHandles(&self) -> Vec<JiCHandle> {
        self.slots.iter().flatten().copied().collect()
    }

    #[allow(non_snake_case)]
    pub fn JiFFailures(&self) -> &[JiCLoadFailure] {
        &self.failures
    }

    #[allow(non_snake_case)]
    pub fn JiFCompilations(&self) -> &[JiCCompilationResult] {
        &self.compilations
    }

    #[allow(non_snake_case)]
    pub fn JiFLen(&self) -> usize {
        self.units.len()
    }

    #[allow(non_snake_case)]
    pub fn JiFIsEmpty(&self) -> bool {
        self.units.is_empty()
    }

    /// Qualified names of the loaded units, in load order.
    #[allow(non_snake_case)]
    pub fn JiFClassNames(&self) -> Vec<String> {
        self.units.iter().map(|u| u.JiFName().to_string()).collect()
    }

    #[allow(non_snake_case)]
    pub fn JiFFindByName(&self, name: &str) -> Option<JiCHandle> {
        self.names.get(name).map(|&index| JiCHandle {
            session: self.id,
            index,
        })
    }

    #[allow(non_snake_case)]
    pub fn JiFUnit(&self, handle: JiCHandle) -> Result<&JiCLoadUnit> {
        if handle.session != self.id {
            return Err(JiError::InvalidHandle(format!(
                "handle {} belongs to session {}, not {}",
                handle, handle.session, self.id
            )));
        }
        self.units
            .get(handle.index)
            .ok_or_else(|| JiError::InvalidHandle(format!("handle {} is out of range", handle)))
    }

    #[allow(non_snake_case)]
    pub fn JiFDiscoverFields(&self, handle: JiCHandle) -> Result<&[JiCMemberDescriptor]> {
        Ok(self.JiFUnit(handle)?.JiFFields())
    }

    #[allow(non_snake_case)]
    pub fn JiFDiscoverMethods(&self, handle: JiCHandle) -> Result<&[JiCMemberDescriptor]> {
        Ok(self.JiFUnit(handle)?.JiFMethods())
    }

    #[allow(non_snake_case)]
    pub fn JiFDiscoverConstructors(&self, handle: JiCHandle) -> Result<&[JiCMemberDescriptor]> {
        Ok(self.JiFUnit(handle)?.JiFConstructors())
    }

    #[allow(non_snake_case)]
    pub fn JiFGetStaticField(
        &self,
        handle: JiCHandle,
        key: &str,
        kind: JiCValueKind,
    ) -> Result<JiCValue> {
        self.JiFUnit(handle)?.JiFGetStatic(key, kind)
    }

    #[allow(non_snake_case)]
    pub fn JiFSetStaticField(&self, handle: JiCHandle, key: &str, value: JiCValue) -> Result<()> {
        self.JiFUnit(handle)?.JiFSetStatic(key, value)
    }

    #[allow(non_snake_case)]
    pub fn JiFGetInt(&self, handle: JiCHandle, key: &str) -> Result<i32> {
        self.JiFUnit(handle)?.JiFGetInt(key)
    }

    #[allow(non_snake_case)]
    pub fn JiFGetChar(&self, handle: JiCHandle, key: &str) -> Result<char> {
        self.JiFUnit(handle)?.JiFGetChar(key)
    }

    #[allow(non_snake_case)]
    pub fn JiFGetString(&self, handle: JiCHandle, key: &str) -> Result<Option<String>> {
        self.JiFUnit(handle)?.JiFGetString(key)
    }

    #[allow(non_snake_case)]
    pub fn JiFGetBoolean(&self, handle: JiCHandle, key: &str) -> Result<bool> {
        self.JiFUnit(handle)?.JiFGetBoolean(key)
    }

    #[allow(non_snake_case)]
    pub fn JiFGetLong(&self, handle: JiCHandle, key: &str) -> Result<i64> {
        self.JiFUnit(handle)?.JiFGetLong(key)
    }

    #[allow(non_snake_case)]
    pub fn JiFGetDouble(&self, handle: JiCHandle, key: &str) -> Result<f64> {
        self.JiFUnit(handle)?.JiFGetDouble(key)
    }

    #[allow(non_snake_case)]
    pub fn JiFSetInt(&self, handle: JiCHandle, key: &str, value: i32) -> Result<()> {
        self.JiFUnit(handle)?.JiFSetInt(key, value)
    }

    #[allow(non_snake_case)]
    pub fn JiFFieldTypeName(&self, handle: JiCHandle, key: &str) -> Result<String> {
        self.JiFUnit(handle)?.JiFFieldTypeName(key)
    }
}

impl Default for JiCLoadSession {
    fn default() -> Self {
        JiCLoadSession::JiFNew()
    }
}
