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

use crate::classfile::JiCByteReader;
use crate::errors::{JiError, Result};
use crate::value::JiCValue;

#[derive(Clone, Debug, PartialEq)]
pub enum JiCConstant {
    /// Slot 0 and the upper half of long/double entries.
    Unused,
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { utf8_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

/// A symbolic reference to a field: owner, name and descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JiCFieldRef {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

#[derive(Clone, Debug, Default)]
pub struct JiCConstantPool {
    entries: Vec<JiCConstant>,
}

impl JiCConstantPool {
    #[allow(non_snake_case)]
    pub(crate) fn JiFParse(reader: &mut JiCByteReader<'_>) -> Result<Self> {
        let count = reader.u2()? as usize;
        let mut entries = Vec::with_capacity(count.max(1));
        entries.push(JiCConstant::Unused);

        while entries.len() < count {
            let tag = reader.u1()?;
            let entry = match tag {
                1 => {
                    let len = reader.u2()? as usize;
                    JiCConstant::Utf8(decode_modified_utf8(reader.take(len)?))
                }
                3 => JiCConstant::Integer(reader.u4()? as i32),
                4 => JiCConstant::Float(f32::from_bits(reader.u4()?)),
                5 => JiCConstant::Long(reader.u8()? as i64),
                6 => JiCConstant::Double(f64::from_bits(reader.u8()?)),
                7 => JiCConstant::Class {
                    name_index: reader.u2()?,
                },
                8 => JiCConstant::String {
                    utf8_index: reader.u2()?,
                },
                9 => JiCConstant::FieldRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                10 => JiCConstant::MethodRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                11 => JiCConstant::InterfaceMethodRef {
                    class_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                12 => JiCConstant::NameAndType {
                    name_index: reader.u2()?,
                    descriptor_index: reader.u2()?,
                },
                15 => JiCConstant::MethodHandle {
                    kind: reader.u1()?,
                    reference_index: reader.u2()?,
                },
                16 => JiCConstant::MethodType {
                    descriptor_index: reader.u2()?,
                },
                17 => JiCConstant::Dynamic {
                    bootstrap_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                18 => JiCConstant::InvokeDynamic {
                    bootstrap_index: reader.u2()?,
                    name_and_type_index: reader.u2()?,
                },
                19 => JiCConstant::Module {
                    name_index: reader.u2()?,
                },
                20 => JiCConstant::Package {
                    name_index: reader.u2()?,
                },
                other => {
                    return Err(JiError::class_format(format!(
                        "unknown constant pool tag {} at index {}",
                        other,
                        entries.len()
                    )));
                }
            };

            let wide = matches!(entry, JiCConstant::Long(_) | JiCConstant::Double(_));
            entries.push(entry);
            if wide {
                entries.push(JiCConstant::Unused);
            }
        }

        if entries.len() != count.max(1) {
            return Err(JiError::class_format(
                "long or double constant overruns the constant pool",
            ));
        }

        Ok(JiCConstantPool { entries })
    }

    #[allow(non_snake_case)]
    pub fn JiFLen(&self) -> usize {
        self.entries.len()
    }

    #[allow(non_snake_case)]
    pub fn JiFGet(&self, index: u16) -> Result<&JiCConstant> {
        match self.entries.get(index as usize) {
            Some(JiCConstant::Unused) | None => Err(JiError::class_format(format!(
                "invalid constant pool index {}",
                index
            ))),
            Some(entry) => Ok(entry),
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFUtf8(&self, index: u16) -> Result<&str> {
        match self.JiFGet(index)? {
            JiCConstant::Utf8(text) => Ok(text),
            other => Err(JiError::class_format(format!(
                "constant {} is not Utf8: {:?}",
                index, other
            ))),
        }
    }

    /// Class constant as a qualified name with `.` separators. Array classes
    /// keep their descriptor form.
    #[allow(non_snake_case)]
    pub fn JiFClassName(&self, index: u16) -> Result<String> {
        match self.JiFGet(index)? {
            JiCConstant::Class { name_index } => {
                let internal = self.JiFUtf8(*name_index)?;
                if internal.starts_with('[') {
                    Ok(internal.to_string())
                } else {
                    Ok(internal.replace('/', "."))
                }
            }
            other => Err(JiError::class_format(format!(
                "constant {} is not a Class: {:?}",
                index, other
            ))),
        }
    }

    #[allow(non_snake_case)]
    pub fn JiFFieldRef(&self, index: u16) -> Result<JiCFieldRef> {
        let (class_index, nat_index) = match self.JiFGet(index)? {
            JiCConstant::FieldRef {
                class_index,
                name_and_type_index,
            } => (*class_index, *name_and_type_index),
            other => {
                return Err(JiError::class_format(format!(
                    "constant {} is not a Fieldref: {:?}",
                    index, other
                )));
            }
        };
        let (name_index, descriptor_index) = match self.JiFGet(nat_index)? {
            JiCConstant::NameAndType {
                name_index,
                descriptor_index,
            } => (*name_index, *descriptor_index),
            other => {
                return Err(JiError::class_format(format!(
                    "constant {} is not a NameAndType: {:?}",
                    nat_index, other
                )));
            }
        };
        Ok(JiCFieldRef {
            owner: self.JiFClassName(class_index)?,
            name: self.JiFUtf8(name_index)?.to_string(),
            descriptor: self.JiFUtf8(descriptor_index)?.to_string(),
        })
    }

    /// Value of a loadable constant (`ldc` operand or `ConstantValue`).
    /// Returns `None` for loadable kinds Ji does not model, such as class
    /// literals and method handles.
    #[allow(non_snake_case)]
    pub fn JiFLoadable(&self, index: u16) -> Result<Option<JiCValue>> {
        let value = match self.JiFGet(index)? {
            JiCConstant::Integer(v) => JiCValue::Int(*v),
            JiCConstant::Float(v) => JiCValue::Float(*v),
            JiCConstant::Long(v) => JiCValue::Long(*v),
            JiCConstant::Double(v) => JiCValue::Double(*v),
            JiCConstant::String { utf8_index } => {
                JiCValue::String(self.JiFUtf8(*utf8_index)?.to_string())
            }
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

/// Decodes the class file flavour of UTF-8: NUL as `C0 80` and
/// supplementary characters as surrogate pairs encoded separately.
fn decode_modified_utf8(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 && i + 1 < bytes.len() {
            units.push((((b & 0x1F) as u16) << 6) | (bytes[i + 1] & 0x3F) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 && i + 2 < bytes.len() {
            units.push(
                (((b & 0x0F) as u16) << 12)
                    | (((bytes[i + 1] & 0x3F) as u16) << 6)
                    | (bytes[i + 2] & 0x3F) as u16,
            );
            i += 3;
        } else {
            units.push(0xFFFD);
            i += 1;
        }
    }
    String::from_utf16_lossy(&units)
}
