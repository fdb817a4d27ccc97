//! Decoding of raw mapping-body bytes into [`Instruction`] values.
//!
//! The decoder recognizes only the mapping-stream subset; see the module documentation of
//! [`crate::disassembler`] for the rationale. Decoding is always bounded by the buffer
//! length, so a body that lost its terminating `ret` cannot cause an unbounded scan.
//!
//! # Example: Decoding a Stream of Instructions
//!
//! ```rust
//! use aotmeta::{disassembler::decode_stream, Parser};
//!
//! let code = [0x16, 0x26, 0x2A]; // ldc.i4.0, pop, ret
//! let mut parser = Parser::new(&code);
//! let instructions = decode_stream(&mut parser)?;
//! assert_eq!(instructions.len(), 3);
//! # Ok::<(), aotmeta::Error>(())
//! ```

use crate::{
    disassembler::{Instruction, OpCode, Operand},
    file::parser::Parser,
    metadata::token::Token,
    Result,
};

/// Decode a single instruction at the parser's current position.
///
/// # Arguments
/// * `parser` - The parser positioned at the start of an instruction
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for any opcode outside the mapping-stream subset and
/// [`crate::Error::OutOfBounds`] if the buffer ends inside an instruction.
pub fn decode_instruction(parser: &mut Parser) -> Result<Instruction> {
    let offset = parser.pos();
    let first_byte = parser.read_le::<u8>()?;

    let opcode = match first_byte {
        0x00 => OpCode::Nop,
        0x15 => OpCode::LdcI4M1,
        0x16 => OpCode::LdcI40,
        0x17 => OpCode::LdcI41,
        0x18 => OpCode::LdcI42,
        0x19 => OpCode::LdcI43,
        0x1A => OpCode::LdcI44,
        0x1B => OpCode::LdcI45,
        0x1C => OpCode::LdcI46,
        0x1D => OpCode::LdcI47,
        0x1E => OpCode::LdcI48,
        0x1F => OpCode::LdcI4S,
        0x20 => OpCode::LdcI4,
        0x26 => OpCode::Pop,
        0x2A => OpCode::Ret,
        0xD0 => OpCode::Ldtoken,
        _ => {
            return Err(malformed_error!(
                "Opcode not valid in a mapping stream: {:02X}",
                first_byte
            ))
        }
    };

    let operand = match opcode {
        OpCode::LdcI4S => Operand::Int8(parser.read_le::<i8>()?),
        OpCode::LdcI4 => Operand::Int32(parser.read_le::<i32>()?),
        OpCode::Ldtoken => Operand::Token(Token::new(parser.read_le::<u32>()?)),
        _ => Operand::None,
    };

    Ok(Instruction {
        offset,
        size: parser.pos() - offset,
        opcode,
        operand,
    })
}

/// Decode all instructions from the parser's current position to the end of the buffer.
///
/// # Arguments
/// * `parser` - The parser positioned at the start of the code block
///
/// # Errors
/// Returns [`crate::Error::Malformed`] on the first unrecognized opcode and
/// [`crate::Error::OutOfBounds`] if the buffer ends inside an instruction.
pub fn decode_stream(parser: &mut Parser) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    while parser.has_more_data() {
        instructions.push(decode_instruction(parser)?);
    }

    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn single_instructions() {
        let mut parser = Parser::new(&[0x2A]);
        let instruction = decode_instruction(&mut parser).unwrap();
        assert_eq!(instruction.opcode, OpCode::Ret);
        assert_eq!(instruction.size, 1);

        let mut parser = Parser::new(&[0xD0, 0x01, 0x00, 0x00, 0x02]);
        let instruction = decode_instruction(&mut parser).unwrap();
        assert_eq!(instruction.opcode, OpCode::Ldtoken);
        assert_eq!(instruction.token(), Some(Token::new(0x02000001)));
        assert_eq!(instruction.size, 5);
    }

    #[test]
    fn ldc_forms() {
        // ldc.i4 0x12345678
        let mut parser = Parser::new(&[0x20, 0x78, 0x56, 0x34, 0x12]);
        let instruction = decode_instruction(&mut parser).unwrap();
        assert_eq!(instruction.i4_value(), Some(0x12345678));

        // ldc.i4.s -5
        let mut parser = Parser::new(&[0x1F, 0xFB]);
        let instruction = decode_instruction(&mut parser).unwrap();
        assert_eq!(instruction.i4_value(), Some(-5));

        // ldc.i4.7
        let mut parser = Parser::new(&[0x1D]);
        let instruction = decode_instruction(&mut parser).unwrap();
        assert_eq!(instruction.i4_value(), Some(7));
    }

    #[test]
    fn stream_offsets() {
        // ldtoken 0x06000001, ldc.i4.1, pop, pop, ret
        let code = [0xD0, 0x01, 0x00, 0x00, 0x06, 0x17, 0x26, 0x26, 0x2A];
        let mut parser = Parser::new(&code);
        let instructions = decode_stream(&mut parser).unwrap();

        assert_eq!(instructions.len(), 5);
        assert_eq!(instructions[0].offset, 0);
        assert_eq!(instructions[1].offset, 5);
        assert_eq!(instructions[4].opcode, OpCode::Ret);
    }

    #[test]
    fn unknown_opcode() {
        // call (0x28) never appears in a mapping body
        let mut parser = Parser::new(&[0x28, 0x01, 0x00, 0x00, 0x0A]);
        assert!(matches!(
            decode_instruction(&mut parser),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn truncated_operand() {
        let mut parser = Parser::new(&[0xD0, 0x01, 0x00]);
        assert!(matches!(
            decode_instruction(&mut parser),
            Err(Error::OutOfBounds)
        ));
    }
}
