// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # aotmeta
//!
//! Extraction of precomputed metadata mappings from .NET ahead-of-time compilation
//! artifacts. Built in pure Rust, `aotmeta` decodes the data-carrying mapping procedures an
//! earlier toolchain stage emits - instruction streams that were never meant to execute -
//! back into typed symbol-to-token tables the compiler can query.
//!
//! ## Features
//!
//! - **Record-grammar decoding** - The mapping format is modeled as an explicit abstract
//!   grammar; the CIL instruction framing is just one serialization adapter
//! - **Dead-record handling** - Placeholder slots left behind by trimming passes are skipped
//!   without disturbing index stability
//! - **Format enforcement** - Weak-table kind restrictions, dead-record confirmations, and
//!   the global symbol-uniqueness invariant are checked in every build
//! - **Lazy snapshots** - The mapping snapshot and the dynamic-invoke stub table are each
//!   computed at most once per manager, safely under concurrent queries
//! - **On-demand stub instantiation** - Invoke stubs stay generic templates until a call
//!   shape asks for them
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aotmeta::prelude::*;
//!
//! # fn example(describing: ModuleRc, registry: Arc<SymbolRegistry>) -> aotmeta::Result<()> {
//! let manager = MetadataManager::new(
//!     describing.clone(),
//!     [describing],
//!     Vec::new(),
//!     Arc::new(StoredIlProvider),
//!     registry,
//! );
//!
//! let metadata = manager.metadata()?;
//! println!(
//!     "{} type mappings, {} method mappings",
//!     metadata.type_mappings.len(),
//!     metadata.method_mappings.len()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! `aotmeta` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - The mapping engine, its snapshot, and the collaborator interfaces
//! - [`disassembler`] - Decoding of the mapping-stream CIL subset
//! - [`Error`] and [`Result`] - Comprehensive error handling
//!
//! The engine consumes an artifact produced upstream: the marker type
//! [`metadata::manager::METADATA_MAPPING_TYPE_NAME`] carries up to three well-known
//! procedures (strong table, weak table, dynamic-invoke table), each a repeated record
//! grammar terminated by `ret`. Decoding walks each body once, resolves embedded `ldtoken`
//! references through a [`metadata::typesystem::TokenResolver`], and caches the assembled
//! snapshot for the process lifetime.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result). Format violations are fatal for the
//! current load - they indicate a corrupt or mismatched compiled artifact, and partial
//! recovery could silently produce an AOT image with wrong runtime behavior:
//!
//! ```rust
//! use aotmeta::{Error, metadata::method::MethodBody};
//!
//! match MethodBody::from(&[0x01]) {
//!     Ok(_) => println!("parsed"),
//!     Err(Error::Malformed { message, .. }) => println!("malformed artifact: {}", message),
//!     Err(e) => println!("error: {}", e),
//! }
//! ```

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the aotmeta library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use aotmeta::prelude::*;
///
/// let module = Module::new("App");
/// assert!(!MetadataManager::module_has_metadata_mappings(&module));
/// ```
pub mod prelude;

/// Instruction decoding for the mapping-stream CIL subset
///
/// Mapping procedures only ever contain four instruction shapes: symbol-reference pushes
/// (`ldtoken`), integer-constant pushes (the `ldc.i4` family), discards (`pop`) and the
/// table terminator (`ret`). This module decodes exactly that subset.
///
/// # Key Types
///
/// - [`disassembler::Instruction`] - Represents a decoded CIL instruction
/// - [`disassembler::OpCode`] - The opcodes of the subset
/// - [`disassembler::Operand`] - Instruction operands (immediates and tokens)
///
/// # Main Functions
///
/// - [`disassembler::decode_instruction`] - Decode a single instruction
/// - [`disassembler::decode_stream`] - Decode a full instruction sequence
pub mod disassembler;

/// Extraction, validation, and caching of precomputed metadata mappings
///
/// This module contains the mapping engine itself plus the interfaces of its collaborators.
///
/// # Key Components
///
/// ## Facade
/// - [`metadata::manager::MetadataManager`] - The contract exposed to the rest of the compiler
/// - [`metadata::validation::ValidationConfig`] - Extraction configuration
///
/// ## Mapping Tables
/// - [`metadata::mapping`] - Record grammar, table decoders, snapshot assembly
/// - [`metadata::token`] - Runtime metadata tokens
///
/// ## Collaborator Interfaces
/// - [`metadata::typesystem`] - Symbol universe and token resolution
/// - [`metadata::method`] - Method bodies and IL supply
pub mod metadata;

/// `aotmeta` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always
/// [`Error`]. This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `aotmeta` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for stream decoding, format validation, and symbol resolution.
pub use error::Error;

/// Low-level byte-stream cursor over method-body data.
///
/// See [`file::parser::Parser`] for bounds-checked reading of IL bytes.
pub use file::parser::Parser;

/// Conversion trait for the primitive types CIL encodes.
///
/// Bounds [`Parser::read_le`]; implemented for the fixed-width integers.
pub use file::parser::CilIO;
