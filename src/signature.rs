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

//! # Type Signatures
//!
//! Canonical, marshalling-ready encodings of types and call signatures.
//!
//! - Scalars map to one character: `Z B C S I J F D`, plus `V` for void.
//! - Arrays are prefixed with `[` once per dimension.
//! - References are `L` + the qualified name with `/` separators + `;`.
//!
//! ```text
//! int add(int, int)          -> (II)I
//! String[] f(String[])       -> ([Ljava/lang/String;)[Ljava/lang/String;
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{JiError, Result};

/// Scalar types with their fixed one-character codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JiCScalar {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl JiCScalar {
    #[allow(non_snake_case)]
    pub fn JiFCode(&self) -> char {
        match self {
            JiCScalar::Boolean => 'Z',
            JiCScalar::Byte => 'B',
            JiCScalar::Char => 'C',
            JiCScalar::Short => 'S',
            JiCScalar::Int => 'I',
            JiCScalar::Long => 'J',
            JiCScalar::Float => 'F',
            JiCScalar::Double => 'D',
            JiCScalar::Void => 'V',
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFFromCode(code: char) -> Option<Self> {
        let scalar = match code {
            'Z' => JiCScalar::Boolean,
            'B' => JiCScalar::Byte,
            'C' => JiCScalar::Char,
            'S' => JiCScalar::Short,
            'I' => JiCScalar::Int,
            'J' => JiCScalar::Long,
            'F' => JiCScalar::Float,
            'D' => JiCScalar::Double,
            'V' => JiCScalar::Void,
            _ => return None,
        };
        Some(scalar)
    }

    /// Source-level keyword, e.g. `int`.
    #[allow(non_snake_case)]
    pub fn JiFKeyword(&self) -> &'static str {
        match self {
            JiCScalar::Boolean => "boolean",
            JiCScalar::Byte => "byte",
            JiCScalar::Char => "char",
            JiCScalar::Short => "short",
            JiCScalar::Int => "int",
            JiCScalar::Long => "long",
            JiCScalar::Float => "float",
            JiCScalar::Double => "double",
            JiCScalar::Void => "void",
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFFromKeyword(keyword: &str) -> Option<Self> {
        [
            JiCScalar::Boolean,
            JiCScalar::Byte,
            JiCScalar::Char,
            JiCScalar::Short,
            JiCScalar::Int,
            JiCScalar::Long,
            JiCScalar::Float,
            JiCScalar::Double,
            JiCScalar::Void,
        ]
        .into_iter()
        .find(|s| s.JiFKeyword() == keyword)
    }
}

/// Classification of a type signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JiCTypeClass {
    Scalar,
    Reference,
    Array,
}

/// Canonical descriptor for a type. Pure value; no identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JiCTypeSignature {
    Scalar(JiCScalar),
    /// Qualified name with `.` separators, e.g. `java.lang.String`.
    Reference(String),
    Array(Box<JiCTypeSignature>),
}

impl JiCTypeSignature {
    #[allow(non_snake_case)]
    pub fn JiFReference(name: impl Into<String>) -> Self {
        JiCTypeSignature::Reference(name.into().replace('/', "."))
    }

    #[allow(non_snake_case)]
    pub fn JiFArrayOf(element: JiCTypeSignature) -> Self {
        JiCTypeSignature::Array(Box::new(element))
    }

    #[allow(non_snake_case)]
    pub fn JiFClassification(&self) -> JiCTypeClass {
        match self {
            JiCTypeSignature::Scalar(_) => JiCTypeClass::Scalar,
            JiCTypeSignature::Reference(_) => JiCTypeClass::Reference,
            JiCTypeSignature::Array(_) => JiCTypeClass::Array,
        }
    }

    /// Number of array dimensions; zero for non-arrays.
    #[allow(non_snake_case)]
    pub fn JiFDimensions(&self) -> usize {
        match self {
            JiCTypeSignature::Array(inner) => 1 + inner.JiFDimensions(),
            _ => 0,
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFIsString(&self) -> bool {
        matches!(self, JiCTypeSignature::Reference(name) if name == "java.lang.String")
    }

    /// Flattened descriptor encoding.
    #[allow(non_snake_case)]
    pub fn JiFEncode(&self) -> String {
        let mut out = String::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut String) {
        match self {
            JiCTypeSignature::Scalar(s) => out.push(s.JiFCode()),
            JiCTypeSignature::Reference(name) => {
                out.push('L');
                out.push_str(&name.replace('.', "/"));
                out.push(';');
            }
            JiCTypeSignature::Array(inner) => {
                out.push('[');
                inner.encode_into(out);
            }
        }
    }

    /// Source-level name such as `int`, `java.lang.String[]`.
    #[allow(non_snake_case)]
    pub fn JiFTypeName(&self) -> String {
        match self {
            JiCTypeSignature::Scalar(s) => s.JiFKeyword().to_string(),
            JiCTypeSignature::Reference(name) => name.clone(),
            JiCTypeSignature::Array(inner) => format!("{}[]", inner.JiFTypeName()),
        }
    }

    /// Parses a source-level name (`int`, `String[][]`, `java.util.List`).
    /// Unqualified `String` and `Object` are taken from `java.lang`.
    #[allow(non_snake_case)]
    pub fn JiFFromTypeName(name: &str) -> Result<Self> {
        let name = name.trim();
        if let Some(element) = name.strip_suffix("[]") {
            return Ok(Self::JiFArrayOf(Self::JiFFromTypeName(element)?));
        }
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(JiError::validation(format!("invalid type name '{}'", name)));
        }
        if let Some(scalar) = JiCScalar::JiFFromKeyword(name) {
            return Ok(JiCTypeSignature::Scalar(scalar));
        }
        let qualified = match name {
            "String" | "Object" | "Class" => format!("java.lang.{}", name),
            other => other.to_string(),
        };
        Ok(JiCTypeSignature::JiFReference(qualified))
    }

    /// Parses one complete field descriptor.
    #[allow(non_snake_case)]
    pub fn JiFParse(descriptor: &str) -> Result<Self> {
        let (sig, rest) = Self::parse_prefix(descriptor)?;
        if !rest.is_empty() {
            return Err(JiError::validation(format!(
                "trailing characters in descriptor '{}'",
                descriptor
            )));
        }
        Ok(sig)
    }

    fn parse_prefix(input: &str) -> Result<(Self, &str)> {
        let mut chars = input.chars();
        let head = chars
            .next()
            .ok_or_else(|| JiError::validation("empty type descriptor"))?;
        match head {
            '[' => {
                let (inner, rest) = Self::parse_prefix(chars.as_str())?;
                if inner == JiCTypeSignature::Scalar(JiCScalar::Void) {
                    return Err(JiError::validation("array of void in descriptor"));
                }
                Ok((Self::JiFArrayOf(inner), rest))
            }
            'L' => {
                let body = chars.as_str();
                let end = body.find(';').ok_or_else(|| {
                    JiError::validation(format!("unterminated reference in '{}'", input))
                })?;
                if end == 0 {
                    return Err(JiError::validation("empty reference name in descriptor"));
                }
                Ok((Self::JiFReference(&body[..end]), &body[end + 1..]))
            }
            code => match JiCScalar::JiFFromCode(code) {
                Some(scalar) => Ok((JiCTypeSignature::Scalar(scalar), chars.as_str())),
                None => Err(JiError::validation(format!(
                    "unknown descriptor code '{}' in '{}'",
                    code, input
                ))),
            },
        }
    }
}

impl fmt::Display for JiCTypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.JiFTypeName())
    }
}

/// Parameter list plus return type of a method or constructor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JiCMethodSignature {
    pub parameters: Vec<JiCTypeSignature>,
    pub return_type: JiCTypeSignature,
}

impl JiCMethodSignature {
    /// Canonical call signature `(<params>)<return>`.
    #[allow(non_snake_case)]
    pub fn JiFEncode(&self) -> String {
        let mut out = String::from("(");
        for param in &self.parameters {
            param.encode_into(&mut out);
        }
        out.push(')');
        self.return_type.encode_into(&mut out);
        out
    }

    #[allow(non_snake_case)]
    pub fn JiFParse(descriptor: &str) -> Result<Self> {
        let body = descriptor.strip_prefix('(').ok_or_else(|| {
            JiError::validation(format!("method descriptor '{}' must start with '('", descriptor))
        })?;

        let mut parameters = Vec::new();
        let mut rest = body;
        loop {
            if let Some(after) = rest.strip_prefix(')') {
                rest = after;
                break;
            }
            let (param, tail) = JiCTypeSignature::parse_prefix(rest)?;
            if param == JiCTypeSignature::Scalar(JiCScalar::Void) {
                return Err(JiError::validation("void parameter in method descriptor"));
            }
            parameters.push(param);
            rest = tail;
        }

        let return_type = JiCTypeSignature::JiFParse(rest)?;
        Ok(JiCMethodSignature {
            parameters,
            return_type,
        })
    }
}

impl fmt::Display for JiCMethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.JiFEncode())
    }
}
