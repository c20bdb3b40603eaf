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

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::signature::{JiCScalar, JiCTypeSignature};

/// Kinds a static slot can be read or written as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JiCValueKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    /// Any other reference or array type. Only `Null` is representable.
    Reference,
}

impl JiCValueKind {
    #[allow(non_snake_case)]
    pub fn JiFForSignature(signature: &JiCTypeSignature) -> Self {
        match signature {
            JiCTypeSignature::Scalar(scalar) => match scalar {
                JiCScalar::Boolean => JiCValueKind::Boolean,
                JiCScalar::Byte => JiCValueKind::Byte,
                JiCScalar::Char => JiCValueKind::Char,
                JiCScalar::Short => JiCValueKind::Short,
                JiCScalar::Int => JiCValueKind::Int,
                JiCScalar::Long => JiCValueKind::Long,
                JiCScalar::Float => JiCValueKind::Float,
                JiCScalar::Double => JiCValueKind::Double,
                JiCScalar::Void => JiCValueKind::Reference,
            },
            sig if sig.JiFIsString() => JiCValueKind::String,
            _ => JiCValueKind::Reference,
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFIsReference(&self) -> bool {
        matches!(self, JiCValueKind::String | JiCValueKind::Reference)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JiCValueKind::Boolean => "boolean",
            JiCValueKind::Byte => "byte",
            JiCValueKind::Char => "char",
            JiCValueKind::Short => "short",
            JiCValueKind::Int => "int",
            JiCValueKind::Long => "long",
            JiCValueKind::Float => "float",
            JiCValueKind::Double => "double",
            JiCValueKind::String => "java.lang.String",
            JiCValueKind::Reference => "reference",
        }
    }
}

impl fmt::Display for JiCValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value held in a static slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JiCValue {
    Boolean(bool),
    Byte(i8),
    /// UTF-16 code unit.
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Null,
}

impl JiCValue {
    /// JVM default value for a slot of the given kind.
    #[allow(non_snake_case)]
    pub fn JiFDefault(kind: JiCValueKind) -> Self {
        match kind {
            JiCValueKind::Boolean => JiCValue::Boolean(false),
            JiCValueKind::Byte => JiCValue::Byte(0),
            JiCValueKind::Char => JiCValue::Char(0),
            JiCValueKind::Short => JiCValue::Short(0),
            JiCValueKind::Int => JiCValue::Int(0),
            JiCValueKind::Long => JiCValue::Long(0),
            JiCValueKind::Float => JiCValue::Float(0.0),
            JiCValueKind::Double => JiCValue::Double(0.0),
            JiCValueKind::String | JiCValueKind::Reference => JiCValue::Null,
        }
    }

    /// Kind of this value, `None` for `Null`.
    #[allow(non_snake_case)]
    pub fn JiFKind(&self) -> Option<JiCValueKind> {
        let kind = match self {
            JiCValue::Boolean(_) => JiCValueKind::Boolean,
            JiCValue::Byte(_) => JiCValueKind::Byte,
            JiCValue::Char(_) => JiCValueKind::Char,
            JiCValue::Short(_) => JiCValueKind::Short,
            JiCValue::Int(_) => JiCValueKind::Int,
            JiCValue::Long(_) => JiCValueKind::Long,
            JiCValue::Float(_) => JiCValueKind::Float,
            JiCValue::Double(_) => JiCValueKind::Double,
            JiCValue::String(_) => JiCValueKind::String,
            JiCValue::Null => return None,
        };
        Some(kind)
    }

    /// Whether this value may be stored in a slot of `kind`.
    #[allow(non_snake_case)]
    pub fn JiFFits(&self, kind: JiCValueKind) -> bool {
        match self.JiFKind() {
            Some(own) => own == kind,
            None => kind.JiFIsReference(),
        }
    }

    /// Narrows an int-category constant to the slot kind, the way the JVM
    /// stores `iconst`/`bipush` results into boolean, byte, char and short
    /// fields.
    #[allow(non_snake_case)]
    pub fn JiFCoerceTo(self, kind: JiCValueKind) -> Option<Self> {
        match (self, kind) {
            (JiCValue::Int(v), JiCValueKind::Boolean) => Some(JiCValue::Boolean(v != 0)),
            (JiCValue::Int(v), JiCValueKind::Byte) => Some(JiCValue::Byte(v as i8)),
            (JiCValue::Int(v), JiCValueKind::Char) => Some(JiCValue::Char(v as u16)),
            (JiCValue::Int(v), JiCValueKind::Short) => Some(JiCValue::Short(v as i16)),
            (value, kind) if value.JiFFits(kind) => Some(value),
            _ => None,
        }
    }

    /// Human-readable kind name for mismatch reporting.
    #[allow(non_snake_case)]
    pub fn JiFKindName(&self) -> &'static str {
        self.JiFKind().map(|k| k.as_str()).unwrap_or("null")
    }
}
