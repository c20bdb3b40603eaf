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

//! # Metadata Introspector
//!
//! A loaded unit carries member tables built once, at load time, from its
//! class file. The tables are plain data and never change afterwards; repeated
//! discovery calls on one handle always observe the same shape.
//!
//! Static slots are the only mutable part of a unit. They start from
//! `ConstantValue` attributes and the constant stores of the static
//! initializer, and are read and written through typed accessors that report
//! unknown names and kind mismatches as distinct errors.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::classfile::{
    JiCClassFile, JiFEvaluateStaticInitializer, ACC_FINAL, ACC_PRIVATE, ACC_PROTECTED,
    ACC_STATIC,
};
use crate::errors::{JiError, Result};
use crate::path::JiCNamespaceRoot;
use crate::signature::{JiCMethodSignature, JiCTypeSignature};
use crate::value::{JiCValue, JiCValueKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JiCMemberKind {
    Field,
    Method,
    Constructor,
}

/// Package-private members are reported as `Public`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JiCVisibility {
    Public,
    Protected,
    Private,
}

impl JiCVisibility {
    #[allow(non_snake_case)]
    pub fn JiFFromFlags(flags: u16) -> Self {
        if flags & ACC_PRIVATE != 0 {
            JiCVisibility::Private
        } else if flags & ACC_PROTECTED != 0 {
            JiCVisibility::Protected
        } else {
            JiCVisibility::Public
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JiCStaticness {
    Static,
    Instance,
}

impl JiCStaticness {
    #[allow(non_snake_case)]
    pub fn JiFFromFlags(flags: u16) -> Self {
        if flags & ACC_STATIC != 0 {
            JiCStaticness::Static
        } else {
            JiCStaticness::Instance
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JiCMemberSignature {
    Field(JiCTypeSignature),
    Callable(JiCMethodSignature),
}

/// Structural description of one field, method or constructor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiCMemberDescriptor {
    pub name: String,
    pub kind: JiCMemberKind,
    pub visibility: JiCVisibility,
    pub staticness: JiCStaticness,
    pub signature: JiCMemberSignature,
}

impl JiCMemberDescriptor {
    /// Descriptor string: the field type, or `(<params>)<return>`.
    #[allow(non_snake_case)]
    pub fn JiFSignatureString(&self) -> String {
        match &self.signature {
            JiCMemberSignature::Field(sig) => sig.JiFEncode(),
            JiCMemberSignature::Callable(sig) => sig.JiFEncode(),
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFIsStatic(&self) -> bool {
        self.staticness == JiCStaticness::Static
    }

    #[allow(non_snake_case)]
    pub fn JiFParameterCount(&self) -> usize {
        match &self.signature {
            JiCMemberSignature::Field(_) => 0,
            JiCMemberSignature::Callable(sig) => sig.parameters.len(),
        }
    }
}

#[derive(Clone, Debug)]
struct JiCStaticSlot {
    kind: JiCValueKind,
    read_only: bool,
    value: JiCValue,
}

/// One loaded binary unit. Owned by the session whose load created it.
#[derive(Debug)]
pub struct JiCLoadUnit {
    name: String,
    origin: JiCNamespaceRoot,
    namespace_id: u64,
    fields: Vec<JiCMemberDescriptor>,
    methods: Vec<JiCMemberDescriptor>,
    constructors: Vec<JiCMemberDescriptor>,
    statics: RwLock<HashMap<String, JiCStaticSlot>>,
}

impl JiCLoadUnit {
    /// Builds the member tables and initial static slots of a class.
    #[allow(non_snake_case)]
    pub fn JiFFromClass(
        class: &JiCClassFile,
        origin: JiCNamespaceRoot,
        namespace_id: u64,
    ) -> Result<Self> {
        let mut fields = Vec::with_capacity(class.fields.len());
        let mut statics = HashMap::new();

        for field in &class.fields {
            let signature = JiCTypeSignature::JiFParse(&field.descriptor).map_err(|e| {
                JiError::class_format(format!(
                    "field '{}.{}': {}",
                    class.name, field.name, e
                ))
            })?;
            let staticness = JiCStaticness::JiFFromFlags(field.access_flags);

            if staticness == JiCStaticness::Static {
                let kind = JiCValueKind::JiFForSignature(&signature);
                let value = field
                    .constant_value
                    .clone()
                    .and_then(|v| v.JiFCoerceTo(kind))
                    .unwrap_or_else(|| JiCValue::JiFDefault(kind));
                statics.insert(
                    field.name.clone(),
                    JiCStaticSlot {
                        kind,
                        read_only: field.access_flags & ACC_FINAL != 0,
                        value,
                    },
                );
            }

            fields.push(JiCMemberDescriptor {
                name: field.name.clone(),
                kind: JiCMemberKind::Field,
                visibility: JiCVisibility::JiFFromFlags(field.access_flags),
                staticness,
                signature: JiCMemberSignature::Field(signature),
            });
        }

        for (name, value) in JiFEvaluateStaticInitializer(class) {
            if let Some(slot) = statics.get_mut(&name) {
                if let Some(coerced) = value.JiFCoerceTo(slot.kind) {
                    slot.value = coerced;
                }
            }
        }

        let mut methods = Vec::new();
        let mut constructors = Vec::new();
        for method in &class.methods {
            if method.name == "<clinit>" {
                continue;
            }
            let signature = JiCMethodSignature::JiFParse(&method.descriptor).map_err(|e| {
                JiError::class_format(format!(
                    "method '{}.{}': {}",
                    class.name, method.name, e
                ))
            })?;
            let visibility = JiCVisibility::JiFFromFlags(method.access_flags);

            if method.name == "<init>" {
                constructors.push(JiCMemberDescriptor {
                    name: class.name.clone(),
                    kind: JiCMemberKind::Constructor,
                    visibility,
                    staticness: JiCStaticness::Instance,
                    signature: JiCMemberSignature::Callable(signature),
                });
            } else {
                methods.push(JiCMemberDescriptor {
                    name: method.name.clone(),
                    kind: JiCMemberKind::Method,
                    visibility,
                    staticness: JiCStaticness::JiFFromFlags(method.access_flags),
                    signature: JiCMemberSignature::Callable(signature),
                });
            }
        }

        Ok(JiCLoadUnit {
            name: class.name.clone(),
            origin,
            namespace_id,
            fields,
            methods,
            constructors,
            statics: RwLock::new(statics),
        })
    }

    #[allow(non_snake_case)]
    pub fn JiFName(&self) -> &str {
        &self.name
    }

    /// Root the unit was resolved from.
    #[allow(non_snake_case)]
    pub fn JiFOrigin(&self) -> &JiCNamespaceRoot {
        &self.origin
    }

    #[allow(non_snake_case)]
    pub fn JiFNamespaceId(&self) -> u64 {
        self.namespace_id
    }

    #[allow(non_snake_case)]
    pub fn JiFFields(&self) -> &[JiCMemberDescriptor] {
        &self.fields
    }

    #[allow(non_snake_case)]
    pub fn JiFMethods(&self) -> &[JiCMemberDescriptor] {
        &self.methods
    }

    #[allow(non_snake_case)]
    pub fn JiFConstructors(&self) -> &[JiCMemberDescriptor] {
        &self.constructors
    }

    #[allow(non_snake_case)]
    pub fn JiFField(&self, key: &str) -> Result<&JiCMemberDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name == key)
            .ok_or_else(|| JiError::member_not_found(&self.name, key))
    }

    /// Source-level type name of a field, e.g. `java.lang.String[]`.
    #[allow(non_snake_case)]
    pub fn JiFFieldTypeName(&self, key: &str) -> Result<String> {
        match &self.JiFField(key)?.signature {
            JiCMemberSignature::Field(sig) => Ok(sig.JiFTypeName()),
            JiCMemberSignature::Callable(_) => Err(JiError::internal(format!(
                "field '{}' carries a callable signature",
                key
            ))),
        }
    }

    /// Reads a static slot as `kind`.
    #[allow(non_snake_case)]
    pub fn JiFGetStatic(&self, key: &str, kind: JiCValueKind) -> Result<JiCValue> {
        let statics = self
            .statics
            .read()
            .map_err(|_| JiError::internal("static slot lock poisoned"))?;
        let slot = statics
            .get(key)
            .ok_or_else(|| JiError::member_not_found(&self.name, key))?;
        if slot.kind != kind {
            return Err(JiError::TypeMismatch {
                member: format!("{}.{}", self.name, key),
                expected: kind.to_string(),
                actual: slot.kind.to_string(),
            });
        }
        Ok(slot.value.clone())
    }

    /// Writes a static slot. The value must fit the declared kind; `Null`
    /// fits reference slots only.
    #[allow(non_snake_case)]
    pub fn JiFSetStatic(&self, key: &str, value: JiCValue) -> Result<()> {
        let mut statics = self
            .statics
            .write()
            .map_err(|_| JiError::internal("static slot lock poisoned"))?;
        let slot = statics
            .get_mut(key)
            .ok_or_else(|| JiError::member_not_found(&self.name, key))?;
        if !value.JiFFits(slot.kind) {
            return Err(JiError::TypeMismatch {
                member: format!("{}.{}", self.name, key),
                expected: slot.kind.to_string(),
                actual: value.JiFKindName().to_string(),
            });
        }
        if slot.read_only {
            return Err(JiError::ReadOnly {
                member: format!("{}.{}", self.name, key),
            });
        }
        slot.value = value;
        Ok(())
    }

    #[allow(non_snake_case)]
    pub fn JiFGetInt(&self, key: &str) -> Result<i32> {
        match self.JiFGetStatic(key, JiCValueKind::Int)? {
            JiCValue::Int(v) => Ok(v),
            other => Err(self.unexpected(key, JiCValueKind::Int, &other)),
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFGetLong(&self, key: &str) -> Result<i64> {
        match self.JiFGetStatic(key, JiCValueKind::Long)? {
            JiCValue::Long(v) => Ok(v),
            other => Err(self.unexpected(key, JiCValueKind::Long, &other)),
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFGetDouble(&self, key: &str) -> Result<f64> {
        match self.JiFGetStatic(key, JiCValueKind::Double)? {
            JiCValue::Double(v) => Ok(v),
            other => Err(self.unexpected(key, JiCValueKind::Double, &other)),
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFGetBoolean(&self, key: &str) -> Result<bool> {
        match self.JiFGetStatic(key, JiCValueKind::Boolean)? {
            JiCValue::Boolean(v) => Ok(v),
            other => Err(self.unexpected(key, JiCValueKind::Boolean, &other)),
        }
    }

    /// Unpaired surrogates decode as U+FFFD.
    #[allow(non_snake_case)]
    pub fn JiFGetChar(&self, key: &str) -> Result<char> {
        match self.JiFGetStatic(key, JiCValueKind::Char)? {
            JiCValue::Char(unit) => Ok(char::decode_utf16([unit])
                .next()
                .and_then(|r| r.ok())
                .unwrap_or(char::REPLACEMENT_CHARACTER)),
            other => Err(self.unexpected(key, JiCValueKind::Char, &other)),
        }
    }

    /// `None` when the slot holds null.
    #[allow(non_snake_case)]
    pub fn JiFGetString(&self, key: &str) -> Result<Option<String>> {
        match self.JiFGetStatic(key, JiCValueKind::String)? {
            JiCValue::String(v) => Ok(Some(v)),
            JiCValue::Null => Ok(None),
            other => Err(self.unexpected(key, JiCValueKind::String, &other)),
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFSetInt(&self, key: &str, value: i32) -> Result<()> {
        self.JiFSetStatic(key, JiCValue::Int(value))
    }

    fn unexpected(&self, key: &str, kind: JiCValueKind, value: &JiCValue) -> JiError {
        JiError::TypeMismatch {
            member: format!("{}.{}", self.name, key),
            expected: kind.to_string(),
            actual: value.JiFKindName().to_string(),
        }
    }
}
