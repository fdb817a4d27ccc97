//! # aotmeta Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the aotmeta library. Import this module to get quick access to the essential types
//! for mapping extraction.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all aotmeta operations
pub use crate::Error;

/// The result type used throughout aotmeta
pub use crate::Result;

/// Low-level byte stream parsing utilities
pub use crate::Parser;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The facade exposed to the rest of the compiler
pub use crate::metadata::manager::{ComputedMetadata, MetadataManager, METADATA_MAPPING_TYPE_NAME};

/// Configuration for mapping extraction
pub use crate::metadata::validation::ValidationConfig;

// ================================================================================================
// Mapping Tables
// ================================================================================================

/// Metadata token type for addressing symbols at run time
pub use crate::metadata::token::Token;

/// Mapping records, table kinds, and the cached snapshot
pub use crate::metadata::mapping::{
    MappingTableKind, MetadataLoadedInfo, MetadataMapping,
};

/// Record-grammar reader contract and its CIL adapter
pub use crate::metadata::mapping::{IlMappingStream, MappingStream};

/// Table decoders and module discovery
pub use crate::metadata::mapping::{
    read_invoke_stub_table, read_mapping_table, DecodedTable, ModuleSet,
};

// ================================================================================================
// Symbol Universe
// ================================================================================================

/// Symbol kinds and their shared handles
pub use crate::metadata::typesystem::{
    CilSymbol, CilType, CilTypeRc, CilTypeRef, Field, FieldRc, Method, MethodRc, Module,
    ModuleRc, RefKey,
};

/// Token resolution
pub use crate::metadata::typesystem::{SymbolRegistry, TokenResolver};

// ================================================================================================
// Method Bodies
// ================================================================================================

/// Method-body parsing and IL supply
pub use crate::metadata::method::{IlProvider, MethodBody, MethodBodyFlags, StoredIlProvider};

// ================================================================================================
// Disassembler
// ================================================================================================

/// Instruction decoding for the mapping-stream subset
pub use crate::disassembler::{decode_instruction, decode_stream, Instruction, OpCode, Operand};
