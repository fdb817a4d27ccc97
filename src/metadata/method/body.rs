//! Parsing of CIL method-body headers.
//!
//! Supports both tiny and fat headers as specified by ECMA-335 II.25.4. Mapping procedures
//! are pure data carriers, so extra data sections (exception tables) are rejected as
//! malformed instead of being parsed.
//!
//! # Examples
//!
//! ```rust
//! use aotmeta::metadata::method::MethodBody;
//!
//! // Tiny header: 1-byte code block of a single `ret`
//! let data = [0x06, 0x2A];
//! let body = MethodBody::from(&data)?;
//! assert!(!body.is_fat);
//! assert_eq!(body.code(&data)?, &[0x2A]);
//! # Ok::<(), aotmeta::Error>(())
//! ```
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4 - Method Header Format

use crate::{
    file::parser::Parser,
    metadata::method::MethodBodyFlags,
    Error::{Empty, OutOfBounds},
    Result,
};

/// Parsed header of one CIL method body.
///
/// Describes where the code block sits inside the raw body buffer; the instruction bytes
/// themselves are obtained through [`MethodBody::code`].
pub struct MethodBody {
    /// Size of the code block (length of all instructions, not counting the header) in bytes
    pub size_code: usize,
    /// Size of the method header in bytes
    pub size_header: usize,
    /// Metadata token for the local variable signature, 0 == no local variables
    pub local_var_sig_token: u32,
    /// Maximum number of items on the operand stack
    pub max_stack: usize,
    /// Flag, indicating the type of the method header
    pub is_fat: bool,
    /// Flag, indicating to call the default constructor on all local variables
    pub is_init_local: bool,
}

impl MethodBody {
    /// Parse a method-body header from raw body bytes.
    ///
    /// # Arguments
    /// * `data` - The raw body bytes, starting at the header
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for empty input, [`crate::Error::OutOfBounds`] if the
    /// declared code size exceeds the buffer, and [`crate::Error::Malformed`] for unknown
    /// header formats or bodies carrying extra data sections.
    pub fn from(data: &[u8]) -> Result<MethodBody> {
        if data.is_empty() {
            return Err(Empty);
        }

        let mut parser = Parser::new(data);

        let first_byte = parser.read_le::<u8>()?;
        match MethodBodyFlags::from_bits_truncate(u16::from(first_byte & 0b0000_0011)) {
            MethodBodyFlags::TINY_FORMAT => {
                let size_code = (first_byte >> 2) as usize;
                if 1 + size_code > data.len() {
                    return Err(OutOfBounds);
                }

                Ok(MethodBody {
                    size_code,
                    size_header: 1,
                    local_var_sig_token: 0,
                    max_stack: 8,
                    is_fat: false,
                    is_init_local: false,
                })
            }
            MethodBodyFlags::FAT_FORMAT => {
                if data.len() < 12 {
                    return Err(OutOfBounds);
                }

                parser.seek(0)?;
                let first_duo = parser.read_le::<u16>()?;
                let flags_header = MethodBodyFlags::from_bits_truncate(first_duo & 0x0FFF);
                let size_header = ((first_duo >> 12) * 4) as usize;
                let max_stack = parser.read_le::<u16>()? as usize;
                let size_code = parser.read_le::<u32>()? as usize;
                let local_var_sig_token = parser.read_le::<u32>()?;

                if data.len() < size_header + size_code {
                    return Err(OutOfBounds);
                }

                if flags_header.contains(MethodBodyFlags::MORE_SECTS) {
                    // Mapping bodies are data carriers; they never carry exception sections
                    return Err(malformed_error!(
                        "Method body declares extra data sections, not valid for a mapping procedure"
                    ));
                }

                Ok(MethodBody {
                    size_code,
                    size_header,
                    local_var_sig_token,
                    max_stack,
                    is_fat: true,
                    is_init_local: flags_header.contains(MethodBodyFlags::INIT_LOCALS),
                })
            }
            _ => Err(malformed_error!(
                "MethodHeader is neither FAT nor TINY - {}",
                first_byte
            )),
        }
    }

    /// Get the full size of this method
    #[must_use]
    pub fn size(&self) -> usize {
        self.size_code + self.size_header
    }

    /// Slice the code block out of the raw body bytes this header was parsed from.
    ///
    /// # Arguments
    /// * `data` - The same buffer that was passed to [`MethodBody::from`]
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the buffer is shorter than the header
    /// declared - possible when a different buffer is passed in.
    pub fn code<'a>(&self, data: &'a [u8]) -> Result<&'a [u8]> {
        if data.len() < self.size() {
            return Err(OutOfBounds);
        }

        Ok(&data[self.size_header..self.size()])
    }
}
