//! Metadata-mapping extraction for precomputed AOT artifacts.
//!
//! This module implements the engine that recovers symbol-to-token mapping tables from the
//! data-carrying procedures a prior compilation stage emitted, together with the minimal
//! symbol universe those tables are resolved against.
//!
//! # Key Components
//!
//! ## Facade
//! - [`manager::MetadataManager`] - The contract exposed to the rest of the compiler
//! - [`validation::ValidationConfig`] - Extraction configuration
//!
//! ## Mapping Tables
//! - [`mapping`] - Record grammar, table decoders, and the cached snapshot
//! - [`token::Token`] - Runtime metadata tokens
//!
//! ## Collaborator Interfaces
//! - [`typesystem`] - Symbol universe and the [`typesystem::TokenResolver`] contract
//! - [`method`] - Method bodies and the [`method::IlProvider`] contract

pub mod manager;
pub mod mapping;
pub mod method;
pub mod token;
pub mod typesystem;
pub mod validation;
