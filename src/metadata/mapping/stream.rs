//! Record-level readers over mapping instruction streams.
//!
//! [`MappingStream`] is the abstract contract the table decoders are written against;
//! [`IlMappingStream`] implements it over a CIL code block. Separating the two keeps the
//! record grammar independent of the instruction encoding, so the grammar logic can be
//! exercised against synthetic streams without assembling bytecode.

use crate::{
    disassembler::{decode_instruction, Instruction, OpCode},
    file::parser::Parser,
    metadata::typesystem::{CilSymbol, TokenResolver},
    Result,
};

/// Reader contract over one mapping table.
///
/// The decoders drive this interface in a strict pattern: test for the terminator, test for a
/// live symbol header, then consume the record payload. Readers never guess - any stream
/// content that does not match the requested shape is a format violation, reported as
/// [`crate::Error::Malformed`].
pub trait MappingStream {
    /// Try to consume the table terminator.
    ///
    /// Returns `true` and consumes it if the next unit is the terminator; returns `false`
    /// without consuming anything otherwise - including at end of input, where the caller's
    /// next read reports the missing terminator.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the stream cannot be decoded at this position.
    fn try_read_terminator(&mut self) -> Result<bool>;

    /// Try to consume a live symbol-reference header.
    ///
    /// Returns the resolved symbol if the next unit is a symbol reference. Returns `Ok(None)`
    /// without consuming anything if the next unit is an integer literal instead - the
    /// caller must then consume the literal-zero dead-record confirmation plus the payload
    /// through [`MappingStream::read_i4`].
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the next unit is neither a symbol reference nor
    /// an integer literal (or the stream ended without a terminator), and
    /// [`crate::Error::SymbolNotFound`] if the embedded reference does not resolve.
    fn try_read_symbol(&mut self) -> Result<Option<CilSymbol>>;

    /// Consume an integer literal and return its value.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the next unit is not an integer literal.
    fn read_i4(&mut self) -> Result<i32>;

    /// Consume one discard.
    ///
    /// Each record carries two discards - the header value and the integer payload were
    /// pushed only to make the record self-describing to a disassembler, and the stream
    /// drops both. The two discards are an unordered, indistinguishable pair.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the next unit is not a discard.
    fn read_pop(&mut self) -> Result<()>;
}

/// [`MappingStream`] implementation over a CIL code block.
///
/// Decodes instructions on demand with one instruction of lookahead; `ldtoken` operands are
/// resolved through the supplied [`TokenResolver`]. The scan is bounded by the code block's
/// length, so a table that lost its terminator fails instead of looping.
pub struct IlMappingStream<'a> {
    parser: Parser<'a>,
    lookahead: Option<Instruction>,
    resolver: &'a dyn TokenResolver,
}

impl<'a> IlMappingStream<'a> {
    /// Create a stream over a code block.
    ///
    /// # Arguments
    /// * `code` - The instruction bytes of one mapping procedure (header already stripped)
    /// * `resolver` - Resolver for `ldtoken` operands
    #[must_use]
    pub fn new(code: &'a [u8], resolver: &'a dyn TokenResolver) -> Self {
        IlMappingStream {
            parser: Parser::new(code),
            lookahead: None,
            resolver,
        }
    }

    /// The next instruction, decoding it if not already buffered. `Ok(None)` at end of input.
    fn peek(&mut self) -> Result<Option<&Instruction>> {
        if self.lookahead.is_none() {
            if !self.parser.has_more_data() {
                return Ok(None);
            }

            self.lookahead = Some(decode_instruction(&mut self.parser)?);
        }

        Ok(self.lookahead.as_ref())
    }

    /// Consume the buffered lookahead instruction.
    fn consume(&mut self) -> Instruction {
        self.lookahead
            .take()
            .expect("consume() requires a buffered instruction")
    }

    /// The next instruction where one is required; end of input is a missing terminator.
    fn peek_required(&mut self) -> Result<Instruction> {
        match self.peek()? {
            Some(instruction) => Ok(*instruction),
            None => Err(malformed_error!(
                "Mapping stream ended without a terminating ret"
            )),
        }
    }
}

impl MappingStream for IlMappingStream<'_> {
    fn try_read_terminator(&mut self) -> Result<bool> {
        let is_terminator =
            matches!(self.peek()?, Some(instruction) if instruction.opcode == OpCode::Ret);
        if is_terminator {
            self.consume();
        }

        Ok(is_terminator)
    }

    fn try_read_symbol(&mut self) -> Result<Option<CilSymbol>> {
        let instruction = self.peek_required()?;
        match instruction.opcode {
            OpCode::Ldtoken => {
                self.consume();
                let token = instruction
                    .token()
                    .expect("ldtoken decodes with a token operand");
                Ok(Some(self.resolver.resolve(token)?))
            }
            opcode if opcode.is_ldc_i4() => Ok(None),
            opcode => Err(malformed_error!(
                "Expected a symbol reference or dead-record literal, found '{}'",
                opcode
            )),
        }
    }

    fn read_i4(&mut self) -> Result<i32> {
        let instruction = self.peek_required()?;
        match instruction.i4_value() {
            Some(value) => {
                self.consume();
                Ok(value)
            }
            None => Err(malformed_error!(
                "Expected an integer literal, found '{}'",
                instruction.opcode
            )),
        }
    }

    fn read_pop(&mut self) -> Result<()> {
        let instruction = self.peek_required()?;
        if instruction.opcode != OpCode::Pop {
            return Err(malformed_error!(
                "Expected a discard, found '{}'",
                instruction.opcode
            ));
        }

        self.consume();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{
            token::Token,
            typesystem::{CilType, Module, SymbolRegistry},
        },
        Error,
    };
    use std::sync::Arc;

    fn registry_with_type() -> (
        SymbolRegistry,
        crate::metadata::typesystem::ModuleRc,
        crate::metadata::typesystem::CilTypeRc,
    ) {
        let module = Module::new("M");
        let cil_type = CilType::new(&module, "N", "T", Token::new(0x02000001));
        let registry = SymbolRegistry::new();
        registry.register(CilSymbol::Type(cil_type.clone()));
        (registry, module, cil_type)
    }

    #[test]
    fn terminator() {
        let registry = SymbolRegistry::new();
        let code = [0x2A];
        let mut stream = IlMappingStream::new(&code, &registry);
        assert!(stream.try_read_terminator().unwrap());
    }

    #[test]
    fn live_header_then_payload() {
        let (registry, _module, cil_type) = registry_with_type();
        // ldtoken 0x02000001, ldc.i4.s 0x40, pop, pop, ret
        let code = [0xD0, 0x01, 0x00, 0x00, 0x02, 0x1F, 0x40, 0x26, 0x26, 0x2A];
        let mut stream = IlMappingStream::new(&code, &registry);

        assert!(!stream.try_read_terminator().unwrap());
        let symbol = stream.try_read_symbol().unwrap().unwrap();
        match symbol {
            CilSymbol::Type(resolved) => assert!(Arc::ptr_eq(&resolved, &cil_type)),
            _ => panic!("expected type symbol"),
        }
        assert_eq!(stream.read_i4().unwrap(), 0x40);
        stream.read_pop().unwrap();
        stream.read_pop().unwrap();
        assert!(stream.try_read_terminator().unwrap());
    }

    #[test]
    fn dead_header_is_not_consumed() {
        let registry = SymbolRegistry::new();
        // ldc.i4.0 (dead confirmation would follow)
        let code = [0x16, 0x2A];
        let mut stream = IlMappingStream::new(&code, &registry);

        assert!(stream.try_read_symbol().unwrap().is_none());
        // The literal is still there for the caller to consume
        assert_eq!(stream.read_i4().unwrap(), 0);
    }

    #[test]
    fn unresolvable_token() {
        let registry = SymbolRegistry::new();
        let code = [0xD0, 0x99, 0x00, 0x00, 0x02, 0x2A];
        let mut stream = IlMappingStream::new(&code, &registry);
        assert!(matches!(
            stream.try_read_symbol(),
            Err(Error::SymbolNotFound(_))
        ));
    }

    #[test]
    fn unexpected_opcode_where_header_expected() {
        let registry = SymbolRegistry::new();
        // pop where a record header should be
        let code = [0x26, 0x2A];
        let mut stream = IlMappingStream::new(&code, &registry);
        assert!(matches!(
            stream.try_read_symbol(),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn missing_terminator() {
        let registry = SymbolRegistry::new();
        let code: [u8; 0] = [];
        let mut stream = IlMappingStream::new(&code, &registry);

        assert!(!stream.try_read_terminator().unwrap());
        assert!(matches!(
            stream.try_read_symbol(),
            Err(Error::Malformed { .. })
        ));
    }
}
