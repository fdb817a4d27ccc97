//! Instruction representation for the mapping-stream CIL subset.
//!
//! Defines [`OpCode`], [`Operand`] and [`Instruction`]. The subset is deliberately closed:
//! mapping bodies are data carriers, and every opcode outside this set is a format violation
//! rather than an extension point.

use strum::{Display, EnumIter};

use crate::metadata::token::Token;

/// Opcodes of the mapping-stream subset, with their ECMA-335 encodings.
///
/// The `ldc.i4` short forms are included because the emitting stage compresses small
/// constants; a reader that only understood the long form would reject real artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum OpCode {
    /// `nop` (0x00) - padding, no effect
    #[strum(serialize = "nop")]
    Nop,
    /// `ldc.i4.m1` (0x15) - push the constant -1
    #[strum(serialize = "ldc.i4.m1")]
    LdcI4M1,
    /// `ldc.i4.0` (0x16) - push the constant 0
    #[strum(serialize = "ldc.i4.0")]
    LdcI40,
    /// `ldc.i4.1` (0x17) - push the constant 1
    #[strum(serialize = "ldc.i4.1")]
    LdcI41,
    /// `ldc.i4.2` (0x18) - push the constant 2
    #[strum(serialize = "ldc.i4.2")]
    LdcI42,
    /// `ldc.i4.3` (0x19) - push the constant 3
    #[strum(serialize = "ldc.i4.3")]
    LdcI43,
    /// `ldc.i4.4` (0x1A) - push the constant 4
    #[strum(serialize = "ldc.i4.4")]
    LdcI44,
    /// `ldc.i4.5` (0x1B) - push the constant 5
    #[strum(serialize = "ldc.i4.5")]
    LdcI45,
    /// `ldc.i4.6` (0x1C) - push the constant 6
    #[strum(serialize = "ldc.i4.6")]
    LdcI46,
    /// `ldc.i4.7` (0x1D) - push the constant 7
    #[strum(serialize = "ldc.i4.7")]
    LdcI47,
    /// `ldc.i4.8` (0x1E) - push the constant 8
    #[strum(serialize = "ldc.i4.8")]
    LdcI48,
    /// `ldc.i4.s` (0x1F) - push an inline i8 constant
    #[strum(serialize = "ldc.i4.s")]
    LdcI4S,
    /// `ldc.i4` (0x20) - push an inline i32 constant
    #[strum(serialize = "ldc.i4")]
    LdcI4,
    /// `pop` (0x26) - discard the top of the stack
    #[strum(serialize = "pop")]
    Pop,
    /// `ret` (0x2A) - return; terminates a mapping table
    #[strum(serialize = "ret")]
    Ret,
    /// `ldtoken` (0xD0) - push a runtime handle for an inline metadata token
    #[strum(serialize = "ldtoken")]
    Ldtoken,
}

impl OpCode {
    /// Returns true for every member of the `ldc.i4` family, long and short forms alike
    #[must_use]
    pub fn is_ldc_i4(&self) -> bool {
        matches!(
            self,
            OpCode::LdcI4M1
                | OpCode::LdcI40
                | OpCode::LdcI41
                | OpCode::LdcI42
                | OpCode::LdcI43
                | OpCode::LdcI44
                | OpCode::LdcI45
                | OpCode::LdcI46
                | OpCode::LdcI47
                | OpCode::LdcI48
                | OpCode::LdcI4S
                | OpCode::LdcI4
        )
    }
}

/// A decoded instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// No inline operand
    None,
    /// Inline i8 immediate (`ldc.i4.s`)
    Int8(i8),
    /// Inline i32 immediate (`ldc.i4`)
    Int32(i32),
    /// Inline metadata token (`ldtoken`)
    Token(Token),
}

/// A single decoded CIL instruction from a mapping-stream body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Byte offset of this instruction within the decoded code block
    pub offset: usize,
    /// Encoded size in bytes, opcode plus operand
    pub size: usize,
    /// The decoded opcode
    pub opcode: OpCode,
    /// The decoded inline operand, if the opcode carries one
    pub operand: Operand,
}

impl Instruction {
    /// The i32 value pushed by this instruction, if it is an `ldc.i4` family member.
    ///
    /// Short forms carry their value in the opcode itself; `ldc.i4.s` sign-extends its
    /// inline i8.
    #[must_use]
    pub fn i4_value(&self) -> Option<i32> {
        match (self.opcode, self.operand) {
            (OpCode::LdcI4M1, _) => Some(-1),
            (OpCode::LdcI40, _) => Some(0),
            (OpCode::LdcI41, _) => Some(1),
            (OpCode::LdcI42, _) => Some(2),
            (OpCode::LdcI43, _) => Some(3),
            (OpCode::LdcI44, _) => Some(4),
            (OpCode::LdcI45, _) => Some(5),
            (OpCode::LdcI46, _) => Some(6),
            (OpCode::LdcI47, _) => Some(7),
            (OpCode::LdcI48, _) => Some(8),
            (OpCode::LdcI4S, Operand::Int8(value)) => Some(i32::from(value)),
            (OpCode::LdcI4, Operand::Int32(value)) => Some(value),
            _ => None,
        }
    }

    /// The inline metadata token of this instruction, if it is a `ldtoken`.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match (self.opcode, self.operand) {
            (OpCode::Ldtoken, Operand::Token(token)) => Some(token),
            _ => None,
        }
    }
}
