//! Method bodies and the IL-provider collaborator.
//!
//! Mapping procedures reach the engine as raw CIL method bodies, header included, exactly as
//! laid out in the image. This module parses the ECMA-335 body header (II.25.4) to locate the
//! code block and defines [`IlProvider`], the contract through which the surrounding compiler
//! hands bodies over.
//!
//! # Key Types
//! - [`MethodBody`] - Parsed tiny/fat body header
//! - [`MethodBodyFlags`] - Header flag bits
//! - [`IlProvider`] - Body supplier contract
//! - [`StoredIlProvider`] - Default provider reading bodies attached to the symbol universe

mod body;

use bitflags::bitflags;

use crate::{metadata::typesystem::MethodRc, Result};

pub use body::MethodBody;

bitflags! {
    #[derive(PartialEq)]
    /// Flags that a method body header can have
    pub struct MethodBodyFlags: u16 {
        /// Tiny method header format
        const TINY_FORMAT = 0x2;
        /// Fat method header format
        const FAT_FORMAT = 0x3;
        /// Flag of the fat method header, showing that there are more data sections appended to the header
        const MORE_SECTS = 0x8;
        /// Flag to indicate that this method should call the default constructor on all local variables
        const INIT_LOCALS = 0x10;
    }
}

/// Supplier contract for method bodies.
///
/// The surrounding compiler owns IL storage; the engine asks it for the raw body bytes of a
/// mapping procedure when a table is decoded. Implementations must be thread-safe - the
/// lazily computed snapshot may be forced from any thread.
pub trait IlProvider: Send + Sync {
    /// The raw CIL body (header plus code) of the given method.
    ///
    /// # Arguments
    /// * `method` - The method whose body is requested
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the method has no body - every mapping
    /// procedure that exists in the marker type must carry one.
    fn method_il(&self, method: &MethodRc) -> Result<Vec<u8>>;
}

/// Default [`IlProvider`] that reads the body attached to the method symbol itself.
///
/// Suitable whenever the producing stage stored bodies directly in the symbol universe via
/// [`crate::metadata::typesystem::Method::set_body`].
pub struct StoredIlProvider;

impl IlProvider for StoredIlProvider {
    fn method_il(&self, method: &MethodRc) -> Result<Vec<u8>> {
        match method.body() {
            Some(data) => Ok(data.to_vec()),
            None => Err(malformed_error!(
                "Mapping procedure '{}' has no IL body",
                method.name
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{
        token::Token,
        typesystem::{CilType, Method, Module},
    };

    #[test]
    fn stored_provider_round_trip() {
        let module = Module::new("M");
        let cil_type = CilType::new(&module, "", "T", Token::new(0x02000001));
        let method = Method::new(&cil_type, "Metadata", Token::new(0x06000001), 0);
        method.set_body(vec![0x0A, 0x2A]);

        let provider = StoredIlProvider;
        assert_eq!(provider.method_il(&method).unwrap(), vec![0x0A, 0x2A]);
    }

    #[test]
    fn stored_provider_missing_body() {
        let module = Module::new("M");
        let cil_type = CilType::new(&module, "", "T", Token::new(0x02000001));
        let method = Method::new(&cil_type, "Metadata", Token::new(0x06000001), 0);

        let provider = StoredIlProvider;
        assert!(provider.method_il(&method).is_err());
    }
}
