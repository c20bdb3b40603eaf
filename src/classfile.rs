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

//! # Class File Reader
//!
//! Decodes the parts of a JVM class file Ji needs to name, isolate and
//! introspect a unit: the declared name, access flags, fields with their
//! `ConstantValue` attributes, methods with their code, and the
//! `InnerClasses` table used to tell nested units from top-level ones.
//! Every other attribute is skipped by length.

pub mod constant_pool;
pub mod initializer;

use crate::errors::{JiError, Result};
use crate::value::JiCValue;

pub use constant_pool::{JiCConstant, JiCConstantPool};
pub use initializer::JiFEvaluateStaticInitializer;

pub const JI_CLASS_MAGIC: u32 = 0xCAFE_BABE;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;

/// Big-endian cursor over class file bytes.
pub(crate) struct JiCByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> JiCByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        JiCByteReader { bytes, pos: 0 }
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                JiError::class_format(format!(
                    "truncated class file: need {} byte(s) at offset {}",
                    len, self.pos
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub(crate) fn u1(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u2(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn u4(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn u8(&mut self) -> Result<u64> {
        let hi = self.u4()? as u64;
        let lo = self.u4()? as u64;
        Ok((hi << 32) | lo)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

#[derive(Clone, Debug)]
pub struct JiCFieldInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    /// Value of the `ConstantValue` attribute, if any.
    pub constant_value: Option<JiCValue>,
}

#[derive(Clone, Debug)]
pub struct JiCMethodInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    /// Bytecode of the `Code` attribute; absent for abstract and native methods.
    pub code: Option<Vec<u8>>,
}

#[derive(Clone, Debug)]
pub struct JiCInnerClass {
    pub inner: String,
    pub outer: Option<String>,
    pub simple_name: Option<String>,
    pub access_flags: u16,
}

/// Decoded class file.
#[derive(Clone, Debug)]
pub struct JiCClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    /// Declared qualified name with `.` separators.
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<JiCFieldInfo>,
    pub methods: Vec<JiCMethodInfo>,
    pub inner_classes: Vec<JiCInnerClass>,
    pub constant_pool: JiCConstantPool,
}

impl JiCClassFile {
    #[allow(non_snake_case)]
    pub fn JiFIsPublic(&self) -> bool {
        self.access_flags & ACC_PUBLIC != 0
    }

    /// Whether the class lists itself in its own `InnerClasses` table, which
    /// javac does for every member, local and anonymous class.
    #[allow(non_snake_case)]
    pub fn JiFIsNested(&self) -> bool {
        self.inner_classes.iter().any(|entry| entry.inner == self.name)
    }

    /// Name relative to the package, e.g. `Outer$Inner`.
    #[allow(non_snake_case)]
    pub fn JiFSimpleName(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Number of package segments; zero for the default package.
    #[allow(non_snake_case)]
    pub fn JiFPackageDepth(&self) -> usize {
        self.name.matches('.').count()
    }

    #[allow(non_snake_case)]
    pub fn JiFMethod(&self, name: &str) -> Option<&JiCMethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Relative artifact path for a qualified name, e.g. `a/b/C.class`.
#[allow(non_snake_case)]
pub fn JiFArtifactPath(qualified_name: &str) -> String {
    format!("{}.class", qualified_name.replace('.', "/"))
}

/// Qualified name for an artifact path inside a root or archive.
#[allow(non_snake_case)]
pub fn JiFQualifiedNameFromEntry(entry: &str) -> Option<String> {
    let stem = entry.strip_suffix(".class")?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.trim_start_matches('/').replace(|c: char| c == '/' || c == '\\', "."))
}

#[allow(non_snake_case)]
pub fn JiFParseClassFile(bytes: &[u8]) -> Result<JiCClassFile> {
    let mut reader = JiCByteReader::new(bytes);

    let magic = reader.u4()?;
    if magic != JI_CLASS_MAGIC {
        return Err(JiError::class_format(format!(
            "bad magic 0x{:08X}",
            magic
        )));
    }
    let minor_version = reader.u2()?;
    let major_version = reader.u2()?;

    let constant_pool = JiCConstantPool::JiFParse(&mut reader)?;

    let access_flags = reader.u2()?;
    let name = constant_pool.JiFClassName(reader.u2()?)?;
    let super_index = reader.u2()?;
    let super_name = if super_index == 0 {
        None
    } else {
        Some(constant_pool.JiFClassName(super_index)?)
    };

    let interface_count = reader.u2()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(constant_pool.JiFClassName(reader.u2()?)?);
    }

    let field_count = reader.u2()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(parse_field(&mut reader, &constant_pool)?);
    }

    let method_count = reader.u2()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(parse_method(&mut reader, &constant_pool)?);
    }

    let mut inner_classes = Vec::new();
    let attribute_count = reader.u2()?;
    for _ in 0..attribute_count {
        let (attr_name, body) = read_attribute(&mut reader, &constant_pool)?;
        if attr_name == "InnerClasses" {
            inner_classes = parse_inner_classes(body, &constant_pool)?;
        }
    }

    if !reader.is_empty() {
        return Err(JiError::class_format(format!(
            "trailing bytes after class '{}'",
            name
        )));
    }

    Ok(JiCClassFile {
        minor_version,
        major_version,
        access_flags,
        name,
        super_name,
        interfaces,
        fields,
        methods,
        inner_classes,
        constant_pool,
    })
}

fn read_attribute<'a>(
    reader: &mut JiCByteReader<'a>,
    pool: &JiCConstantPool,
) -> Result<(String, &'a [u8])> {
    let name = pool.JiFUtf8(reader.u2()?)?.to_string();
    let len = reader.u4()? as usize;
    let body = reader.take(len)?;
    Ok((name, body))
}

fn parse_field(reader: &mut JiCByteReader<'_>, pool: &JiCConstantPool) -> Result<JiCFieldInfo> {
    let access_flags = reader.u2()?;
    let name = pool.JiFUtf8(reader.u2()?)?.to_string();
    let descriptor = pool.JiFUtf8(reader.u2()?)?.to_string();

    let mut constant_value = None;
    let attribute_count = reader.u2()?;
    for _ in 0..attribute_count {
        let (attr_name, body) = read_attribute(reader, pool)?;
        if attr_name == "ConstantValue" {
            let index = JiCByteReader::new(body).u2()?;
            constant_value = pool.JiFLoadable(index)?;
        }
    }

    Ok(JiCFieldInfo {
        access_flags,
        name,
        descriptor,
        constant_value,
    })
}

fn parse_method(reader: &mut JiCByteReader<'_>, pool: &JiCConstantPool) -> Result<JiCMethodInfo> {
    let access_flags = reader.u2()?;
    let name = pool.JiFUtf8(reader.u2()?)?.to_string();
    let descriptor = pool.JiFUtf8(reader.u2()?)?.to_string();

    let mut code = None;
    let attribute_count = reader.u2()?;
    for _ in 0..attribute_count {
        let (attr_name, body) = read_attribute(reader, pool)?;
        if attr_name == "Code" {
            let mut code_reader = JiCByteReader::new(body);
            let _max_stack = code_reader.u2()?;
            let _max_locals = code_reader.u2()?;
            let len = code_reader.u4()? as usize;
            code = Some(code_reader.take(len)?.to_vec());
        }
    }

    Ok(JiCMethodInfo {
        access_flags,
        name,
        descriptor,
        code,
    })
}

fn parse_inner_classes(body: &[u8], pool: &JiCConstantPool) -> Result<Vec<JiCInnerClass>> {
    let mut reader = JiCByteReader::new(body);
    let count = reader.u2()?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let inner = pool.JiFClassName(reader.u2()?)?;
        let outer_index = reader.u2()?;
        let name_index = reader.u2()?;
        let access_flags = reader.u2()?;
        entries.push(JiCInnerClass {
            inner,
            outer: if outer_index == 0 {
                None
            } else {
                Some(pool.JiFClassName(outer_index)?)
            },
            simple_name: if name_index == 0 {
                None
            } else {
                Some(pool.JiFUtf8(name_index)?.to_string())
            },
            access_flags,
        });
    }
    Ok(entries)
}
