//! Byte-level input layer for CIL method bodies.
//!
//! The mapping engine consumes method bodies as in-memory byte slices handed over by an
//! IL-provider collaborator; this module provides the bounds-checked cursor used to walk
//! them. There is no file or PE layer here - the surrounding compiler owns the container
//! format and only ever passes finished body buffers down.
//!
//! # Key Components
//!
//! - [`crate::file::parser::Parser`] - Cursor-based, bounds-checked reader over a byte slice
//! - [`crate::file::parser::CilIO`] - Conversion trait for the primitive types CIL encodes

pub(crate) mod parser;

pub use parser::{CilIO, Parser};
