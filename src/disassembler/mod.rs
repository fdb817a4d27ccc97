//! CIL instruction decoding for the mapping-stream subset.
//!
//! Mapping procedures are emitted by an earlier compilation stage as data-carrying method
//! bodies that are never executed. Their bodies only ever contain four shapes of instruction:
//! a symbol reference push (`ldtoken`), an integer constant push (the `ldc.i4` family,
//! including all short forms), a discard (`pop`), and the table terminator (`ret`). This
//! module decodes exactly that subset; any other opcode in a mapping body marks the artifact
//! as malformed.
//!
//! # Key Types
//! - [`Instruction`] - Represents a decoded CIL instruction
//! - [`OpCode`] - The opcodes of the mapping-stream subset
//! - [`Operand`] - Instruction operands (inline immediates and tokens)
//!
//! # Main Functions
//! - [`decode_instruction`] - Decode a single instruction
//! - [`decode_stream`] - Decode a full instruction sequence, bounded by the buffer length
//!
//! # Example
//! ```rust
//! use aotmeta::{disassembler::decode_instruction, Parser};
//!
//! let bytecode = &[0x2A]; // ret
//! let mut parser = Parser::new(bytecode);
//! let instruction = decode_instruction(&mut parser)?;
//! assert_eq!(instruction.opcode.to_string(), "ret");
//! # Ok::<(), aotmeta::Error>(())
//! ```

mod decoder;
mod instruction;

pub use decoder::{decode_instruction, decode_stream};
pub use instruction::{Instruction, OpCode, Operand};
