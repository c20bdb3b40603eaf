//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Ji.
//! The Ji project belongs to the Dunimd project team.
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

#![allow(dead_code)]

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use ji::compiler::{JiCCompiler, JiCCompilerOutput, JiCDiagnostic, JiCSeverity};
use ji::{JiCExecutionPath, JiCLoader, JiCLoaderConfig, Result};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;

#[derive(Clone, Debug)]
pub enum Const {
    Int(i32),
    Long(i64),
    Double(f64),
    Str(String),
}

#[derive(Clone, Debug)]
struct FieldSpec {
    flags: u16,
    name: String,
    descriptor: String,
    constant: Option<Const>,
    initial: Option<Const>,
    after_opaque: bool,
}

#[derive(Clone, Debug)]
struct MethodSpec {
    flags: u16,
    name: String,
    descriptor: String,
}

/// Minimal class file assembler. Fields may carry a `ConstantValue`
/// attribute or a store in `<clinit>`; methods carry no code.
#[derive(Clone, Debug)]
pub struct ClassBuilder {
    name: String,
    flags: u16,
    nested: bool,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    opaque: bool,
}

impl ClassBuilder {
    pub fn new(name: &str) -> Self {
        ClassBuilder {
            name: name.to_string(),
            flags: 0x0020,
            nested: false,
            fields: Vec::new(),
            methods: Vec::new(),
            opaque: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public(mut self) -> Self {
        self.flags |= ACC_PUBLIC;
        self
    }

    /// Lists the class in its own `InnerClasses` table.
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    pub fn field(mut self, flags: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push(FieldSpec {
            flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            constant: None,
            initial: None,
            after_opaque: self.opaque,
        });
        self
    }

    /// Static field initialized through a `ConstantValue` attribute.
    pub fn constant(mut self, flags: u16, name: &str, descriptor: &str, value: Const) -> Self {
        self = self.field(flags | ACC_STATIC, name, descriptor);
        if let Some(field) = self.fields.last_mut() {
            field.constant = Some(value);
        }
        self
    }

    /// Static field initialized by a store in `<clinit>`.
    pub fn initialized(mut self, flags: u16, name: &str, descriptor: &str, value: Const) -> Self {
        self = self.field(flags | ACC_STATIC, name, descriptor);
        if let Some(field) = self.fields.last_mut() {
            field.initial = Some(value);
        }
        self
    }

    /// Stores of fields added after this call follow an instruction the
    /// initializer evaluator does not understand.
    pub fn opaque(mut self) -> Self {
        self.opaque = true;
        self
    }

    pub fn method(mut self, flags: u16, name: &str, descriptor: &str) -> Self {
        self.methods.push(MethodSpec {
            flags,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        });
        self
    }

    pub fn constructor(self, flags: u16, descriptor: &str) -> Self {
        self.method(flags, "<init>", descriptor)
    }

    pub fn artifact_path(&self) -> String {
        format!("{}.class", self.name.replace('.', "/"))
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = Pool::default();
        let this_class = pool.class(&self.name);
        let super_class = pool.class("java.lang.Object");

        let mut fields = Vec::new();
        fields.extend((self.fields.len() as u16).to_be_bytes());
        for field in &self.fields {
            fields.extend(field.flags.to_be_bytes());
            fields.extend(pool.utf8(&field.name).to_be_bytes());
            fields.extend(pool.utf8(&field.descriptor).to_be_bytes());
            match &field.constant {
                Some(value) => {
                    let attr = pool.utf8("ConstantValue");
                    let index = pool.constant(value);
                    fields.extend(1u16.to_be_bytes());
                    fields.extend(attr.to_be_bytes());
                    fields.extend(2u32.to_be_bytes());
                    fields.extend(index.to_be_bytes());
                }
                None => fields.extend(0u16.to_be_bytes()),
            }
        }

        let mut code = Vec::new();
        let mut barrier_written = false;
        for field in self.fields.iter().filter(|f| f.initial.is_some()) {
            if field.after_opaque && !barrier_written {
                // `new`, outside the evaluated subset
                code.push(0xbb);
                code.extend(this_class.to_be_bytes());
                barrier_written = true;
            }
            if let Some(value) = &field.initial {
                let index = pool.constant(value);
                let op = match value {
                    Const::Long(_) | Const::Double(_) => 0x14,
                    _ => 0x13,
                };
                code.push(op);
                code.extend(index.to_be_bytes());
            }
            let field_ref = pool.field_ref(&self.name, &field.name, &field.descriptor);
            code.push(0xb3);
            code.extend(field_ref.to_be_bytes());
        }

        let mut methods = Vec::new();
        let has_clinit = !code.is_empty();
        let method_count = self.methods.len() + usize::from(has_clinit);
        methods.extend((method_count as u16).to_be_bytes());
        for method in &self.methods {
            methods.extend(method.flags.to_be_bytes());
            methods.extend(pool.utf8(&method.name).to_be_bytes());
            methods.extend(pool.utf8(&method.descriptor).to_be_bytes());
            methods.extend(0u16.to_be_bytes());
        }
        if has_clinit {
            code.push(0xb1);
            let attr = pool.utf8("Code");
            methods.extend(ACC_STATIC.to_be_bytes());
            methods.extend(pool.utf8("<clinit>").to_be_bytes());
            methods.extend(pool.utf8("()V").to_be_bytes());
            methods.extend(1u16.to_be_bytes());
            methods.extend(attr.to_be_bytes());
            methods.extend((12 + code.len() as u32).to_be_bytes());
            methods.extend(4u16.to_be_bytes());
            methods.extend(0u16.to_be_bytes());
            methods.extend((code.len() as u32).to_be_bytes());
            methods.extend(&code);
            methods.extend(0u16.to_be_bytes());
            methods.extend(0u16.to_be_bytes());
        }

        let mut attributes = Vec::new();
        if self.nested {
            let attr = pool.utf8("InnerClasses");
            let (outer, simple) = match self.name.rsplit_once('$') {
                Some((outer, simple)) => (pool.class(outer), pool.utf8(simple)),
                None => (0, 0),
            };
            attributes.extend(1u16.to_be_bytes());
            attributes.extend(attr.to_be_bytes());
            attributes.extend(10u32.to_be_bytes());
            attributes.extend(1u16.to_be_bytes());
            attributes.extend(this_class.to_be_bytes());
            attributes.extend(outer.to_be_bytes());
            attributes.extend(simple.to_be_bytes());
            attributes.extend((ACC_PUBLIC | ACC_STATIC).to_be_bytes());
        } else {
            attributes.extend(0u16.to_be_bytes());
        }

        let mut out = Vec::new();
        out.extend(0xCAFE_BABEu32.to_be_bytes());
        out.extend(0u16.to_be_bytes());
        out.extend(52u16.to_be_bytes());
        out.extend(pool.next.to_be_bytes());
        out.extend(&pool.data);
        out.extend(self.flags.to_be_bytes());
        out.extend(this_class.to_be_bytes());
        out.extend(super_class.to_be_bytes());
        out.extend(0u16.to_be_bytes());
        out.extend(fields);
        out.extend(methods);
        out.extend(attributes);
        out
    }

    /// Writes the artifact under `root` at its package path.
    pub fn write_to(&self, root: &Path) -> std::path::PathBuf {
        let path = root.join(self.artifact_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, self.build()).unwrap();
        path
    }
}

struct Pool {
    data: Vec<u8>,
    next: u16,
    index: HashMap<Vec<u8>, u16>,
}

impl Default for Pool {
    fn default() -> Self {
        Pool {
            data: Vec::new(),
            next: 1,
            index: HashMap::new(),
        }
    }
}

impl Pool {
    fn add(&mut self, entry: Vec<u8>, wide: bool) -> u16 {
        if let Some(&index) = self.index.get(&entry) {
            return index;
        }
        let index = self.next;
        self.next += if wide { 2 } else { 1 };
        self.data.extend(&entry);
        self.index.insert(entry, index);
        index
    }

    fn utf8(&mut self, text: &str) -> u16 {
        let mut entry = vec![1];
        entry.extend((text.len() as u16).to_be_bytes());
        entry.extend(text.as_bytes());
        self.add(entry, false)
    }

    fn tagged(&mut self, tag: u8, refs: &[u16]) -> u16 {
        let mut entry = vec![tag];
        for r in refs {
            entry.extend(r.to_be_bytes());
        }
        self.add(entry, false)
    }

    fn class(&mut self, dotted: &str) -> u16 {
        let name = self.utf8(&dotted.replace('.', "/"));
        self.tagged(7, &[name])
    }

    fn field_ref(&mut self, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class = self.class(owner);
        let name = self.utf8(name);
        let descriptor = self.utf8(descriptor);
        let nat = self.tagged(12, &[name, descriptor]);
        self.tagged(9, &[class, nat])
    }

    fn constant(&mut self, value: &Const) -> u16 {
        match value {
            Const::Int(v) => {
                let mut entry = vec![3];
                entry.extend(v.to_be_bytes());
                self.add(entry, false)
            }
            Const::Long(v) => {
                let mut entry = vec![5];
                entry.extend(v.to_be_bytes());
                self.add(entry, true)
            }
            Const::Double(v) => {
                let mut entry = vec![6];
                entry.extend(v.to_bits().to_be_bytes());
                self.add(entry, true)
            }
            Const::Str(s) => {
                let text = self.utf8(s);
                self.tagged(8, &[text])
            }
        }
    }
}

/// Compiler stand-in reading a line-oriented unit description:
///
/// ```text
/// class com.acme.Calc public
/// field public static I LIMIT = 30
/// field public static final Ljava/lang/String; NAME = "calc"
/// method public static add (II)I
/// init public ()V
/// opaque
/// class com.acme.Calc$Inner nested
/// ```
///
/// `static final` fields with a value get a `ConstantValue` attribute, other
/// static fields with a value get a `<clinit>` store. Any other line is an
/// error diagnostic and the compilation fails.
#[derive(Debug, Default)]
pub struct FakeCompiler;

impl JiCCompiler for FakeCompiler {
    fn name(&self) -> &str {
        "fake-javac"
    }

    fn invoke(&self, source: &Path, staging: &Path, _class_path: &OsStr) -> Result<JiCCompilerOutput> {
        let text = fs::read_to_string(source)?;
        let source_name = source.display().to_string();
        match parse_units(&text, &source_name) {
            Ok(units) => {
                for unit in units {
                    unit.write_to(staging);
                }
                Ok(JiCCompilerOutput {
                    success: true,
                    diagnostics: Vec::new(),
                })
            }
            Err(diagnostics) => Ok(JiCCompilerOutput {
                success: false,
                diagnostics,
            }),
        }
    }
}

fn parse_flags(tokens: &mut std::iter::Peekable<std::str::SplitWhitespace<'_>>) -> u16 {
    let mut flags = 0;
    while let Some(token) = tokens.peek() {
        let flag = match *token {
            "public" => ACC_PUBLIC,
            "private" => ACC_PRIVATE,
            "protected" => ACC_PROTECTED,
            "static" => ACC_STATIC,
            "final" => ACC_FINAL,
            _ => break,
        };
        flags |= flag;
        tokens.next();
    }
    flags
}

fn parse_value(raw: &str, descriptor: &str) -> Option<Const> {
    let raw = raw.trim();
    if let Some(text) = raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')) {
        return Some(Const::Str(text.to_string()));
    }
    match descriptor {
        "J" => raw.parse().ok().map(Const::Long),
        "D" => raw.parse().ok().map(Const::Double),
        "Z" => match raw {
            "true" => Some(Const::Int(1)),
            "false" => Some(Const::Int(0)),
            _ => None,
        },
        "C" if raw.starts_with('\'') && raw.ends_with('\'') && raw.chars().count() == 3 => {
            raw.chars().nth(1).map(|c| Const::Int(c as i32))
        }
        _ => raw.parse().ok().map(Const::Int),
    }
}

fn parse_line(units: &mut Vec<ClassBuilder>, line: &str) -> Option<()> {
    let (decl, value) = match line.split_once('=') {
        Some((decl, value)) => (decl, Some(value)),
        None => (line, None),
    };
    let mut tokens = decl.split_whitespace().peekable();
    let keyword = tokens.next()?;

    if keyword == "class" {
        let mut unit = ClassBuilder::new(tokens.next()?);
        for modifier in tokens {
            unit = match modifier {
                "public" => unit.public(),
                "nested" => unit.nested(),
                _ => return None,
            };
        }
        units.push(unit);
        return Some(());
    }

    let unit = units.last_mut()?;
    let flags = parse_flags(&mut tokens);
    let rest: Vec<&str> = tokens.collect();
    let next = match (keyword, rest.as_slice(), value) {
        ("field", [descriptor, name], None) => unit.clone().field(flags, name, descriptor),
        ("field", [descriptor, name], Some(raw)) => {
            if flags & ACC_STATIC == 0 {
                return None;
            }
            let v = parse_value(raw, descriptor)?;
            if flags & ACC_FINAL != 0 {
                unit.clone().constant(flags, name, descriptor, v)
            } else {
                unit.clone().initialized(flags, name, descriptor, v)
            }
        }
        ("method", [name, descriptor], None) => unit.clone().method(flags, name, descriptor),
        ("init", [descriptor], None) => unit.clone().constructor(flags, descriptor),
        ("opaque", [], None) => unit.clone().opaque(),
        _ => return None,
    };
    *unit = next;
    Some(())
}

fn parse_units(
    text: &str,
    source_name: &str,
) -> std::result::Result<Vec<ClassBuilder>, Vec<JiCDiagnostic>> {
    let mut units = Vec::new();
    let mut diagnostics = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if parse_line(&mut units, line).is_none() {
            diagnostics.push(JiCDiagnostic {
                severity: JiCSeverity::Error,
                line: Some(number as u32 + 1),
                message: format!("cannot parse '{}'", line),
                source_name: source_name.to_string(),
            });
        }
    }

    if diagnostics.is_empty() {
        Ok(units)
    } else {
        Err(diagnostics)
    }
}

/// Writes a stored (uncompressed) archive with the given entries.
pub fn write_archive(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
}

/// Loader over a private registry, compiling with `FakeCompiler` into
/// `<dir>/out`.
pub fn fake_loader(dir: &Path) -> (JiCLoader, Arc<JiCExecutionPath>) {
    let paths = Arc::new(JiCExecutionPath::JiFNew());
    let config = JiCLoaderConfig::JiFNew(dir.join("out"));
    let loader = JiCLoader::JiFNew(config, paths.clone(), Box::new(FakeCompiler)).unwrap();
    (loader, paths)
}

/// Writes `text` to `<dir>/<file_name>` and returns the path.
pub fn write_source(dir: &Path, file_name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, text).unwrap();
    path
}
