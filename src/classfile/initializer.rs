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

//! Static initializer evaluation.
//!
//! javac compiles `static int X = 30;` into `<clinit>` code rather than a
//! `ConstantValue` attribute unless the field is `final`. To give static
//! slots their declared starting values, the leading run of constant stores in
//! `<clinit>` is evaluated: constant pushes followed by `putstatic` into the
//! unit's own fields. The first instruction outside that subset ends the
//! evaluation; slots not reached keep their default values.

use crate::classfile::JiCClassFile;
use crate::value::JiCValue;

const NOP: u8 = 0x00;
const ACONST_NULL: u8 = 0x01;
const ICONST_M1: u8 = 0x02;
const ICONST_5: u8 = 0x08;
const LCONST_0: u8 = 0x09;
const LCONST_1: u8 = 0x0a;
const FCONST_0: u8 = 0x0b;
const FCONST_2: u8 = 0x0d;
const DCONST_0: u8 = 0x0e;
const DCONST_1: u8 = 0x0f;
const BIPUSH: u8 = 0x10;
const SIPUSH: u8 = 0x11;
const LDC: u8 = 0x12;
const LDC_W: u8 = 0x13;
const LDC2_W: u8 = 0x14;
const RETURN: u8 = 0xb1;
const PUTSTATIC: u8 = 0xb3;

/// Returns `(field name, raw value)` assignments in execution order.
/// Values are uncoerced: int-category constants stay `Int` even when stored
/// into boolean, char, byte or short fields.
#[allow(non_snake_case)]
pub fn JiFEvaluateStaticInitializer(class: &JiCClassFile) -> Vec<(String, JiCValue)> {
    let code = match class.JiFMethod("<clinit>").and_then(|m| m.code.as_deref()) {
        Some(code) => code,
        None => return Vec::new(),
    };

    let pool = &class.constant_pool;
    let mut assignments = Vec::new();
    let mut stack: Vec<JiCValue> = Vec::new();
    let mut pc = 0usize;

    let operand_u1 = |pc: usize| code.get(pc + 1).copied();
    let operand_u2 = |pc: usize| {
        let hi = *code.get(pc + 1)?;
        let lo = *code.get(pc + 2)?;
        Some(u16::from_be_bytes([hi, lo]))
    };

    while let Some(&op) = code.get(pc) {
        match op {
            NOP => pc += 1,
            ACONST_NULL => {
                stack.push(JiCValue::Null);
                pc += 1;
            }
            ICONST_M1..=ICONST_5 => {
                stack.push(JiCValue::Int(op as i32 - 3));
                pc += 1;
            }
            LCONST_0 | LCONST_1 => {
                stack.push(JiCValue::Long((op - LCONST_0) as i64));
                pc += 1;
            }
            FCONST_0..=FCONST_2 => {
                stack.push(JiCValue::Float((op - FCONST_0) as f32));
                pc += 1;
            }
            DCONST_0 | DCONST_1 => {
                stack.push(JiCValue::Double((op - DCONST_0) as f64));
                pc += 1;
            }
            BIPUSH => {
                let Some(byte) = operand_u1(pc) else { break };
                stack.push(JiCValue::Int(byte as i8 as i32));
                pc += 2;
            }
            SIPUSH => {
                let Some(short) = operand_u2(pc) else { break };
                stack.push(JiCValue::Int(short as i16 as i32));
                pc += 3;
            }
            LDC | LDC_W | LDC2_W => {
                let (index, width) = if op == LDC {
                    match operand_u1(pc) {
                        Some(index) => (index as u16, 2),
                        None => break,
                    }
                } else {
                    match operand_u2(pc) {
                        Some(index) => (index, 3),
                        None => break,
                    }
                };
                match pool.JiFLoadable(index) {
                    Ok(Some(value)) => stack.push(value),
                    _ => break,
                }
                pc += width;
            }
            PUTSTATIC => {
                let Some(index) = operand_u2(pc) else { break };
                let Ok(field) = pool.JiFFieldRef(index) else { break };
                let Some(value) = stack.pop() else { break };
                if field.owner == class.name {
                    assignments.push((field.name, value));
                }
                pc += 3;
            }
            RETURN => break,
            other => {
                log::debug!(
                    "static initializer of '{}' stops at opcode 0x{:02x} (pc {})",
                    class.name,
                    other,
                    pc
                );
                break;
            }
        }
    }

    assignments
}
