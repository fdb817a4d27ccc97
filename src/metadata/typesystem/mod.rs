//! Minimal symbol universe for mapping extraction.
//!
//! The mapping engine does not build a type system of its own; it queries the one owned by the
//! surrounding compiler. This module defines exactly the interface the engine needs from that
//! collaborator: modules, types, methods and fields as reference-identity symbols, a closed
//! [`CilSymbol`] sum over the three mappable kinds, and the [`TokenResolver`] contract through
//! which `ldtoken` operands come back as live symbols.
//!
//! # Architecture
//!
//! Symbols are `Arc`-shared and compared by reference, never by value: two distinct type
//! objects with the same name are distinct symbols. Containers hold strong references
//! downwards (module -> types -> methods/fields) and members point back up through weak
//! references ([`CilTypeRef`]) so that dropping a module universe cannot leak through cycles.
//!
//! # Key Components
//!
//! - [`Module`], [`CilType`], [`Method`], [`Field`] - the symbol kinds, shared as
//!   [`ModuleRc`]/[`CilTypeRc`]/[`MethodRc`]/[`FieldRc`]
//! - [`CilSymbol`] - closed sum type over {type, method, field}; classifier matches are
//!   exhaustive, so a new kind fails to compile instead of failing at run time
//! - [`RefKey`] - wrapper giving `Arc`'d symbols reference-identity `Eq`/`Hash` for map keys
//! - [`TokenResolver`] - the resolver collaborator contract
//! - [`SymbolRegistry`] - a thread-safe, idempotent resolver backed by a concurrent map

mod base;
mod registry;

pub use base::{
    CilSymbol, CilType, CilTypeRc, CilTypeRef, CustomAttributeInfo, Field, FieldRc, Method,
    MethodRc, Module, ModuleRc, RefKey,
};
pub use registry::{SymbolRegistry, TokenResolver};
