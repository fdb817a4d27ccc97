//! The immutable mapping snapshot and its assembly rules.
//!
//! After both metadata tables decode, the results are validated and folded into one
//! [`MetadataLoadedInfo`]: the weak-table kind restriction is enforced, the global
//! uniqueness invariant is checked across all four mapping lists, the all-type list is formed
//! by appending strong mappings after weak ones, and the discovered modules are partitioned
//! against the compilation set. The snapshot is never mutated afterwards.

use std::collections::HashSet;

use crate::{
    metadata::{
        mapping::{DecodedTable, MetadataMapping, ModuleSet},
        typesystem::{CilSymbol, CilTypeRc, FieldRc, MethodRc, Module, ModuleRc, RefKey},
    },
    Result,
};

/// The cached result of decoding the metadata-mapping tables.
///
/// Computed once per manager on first demand and immutable afterwards; every accessor on the
/// facade reads from the same snapshot.
pub struct MetadataLoadedInfo {
    /// All modules discovered across both tables, in first-discovery order
    pub metadata_modules: Vec<ModuleRc>,
    /// Discovered modules that belong to the active compilation, in discovery order
    pub local_modules: Vec<ModuleRc>,
    /// Discovered modules that are merely referenced, in discovery order
    pub external_modules: Vec<ModuleRc>,
    /// Type mappings from the strong table: these types are unconditionally described
    pub strong_type_mappings: Vec<MetadataMapping<CilTypeRc>>,
    /// All type mappings: weak entries first, then the strong entries
    pub all_type_mappings: Vec<MetadataMapping<CilTypeRc>>,
    /// Method mappings from the strong table
    pub method_mappings: Vec<MetadataMapping<MethodRc>>,
    /// Field mappings from the strong table
    pub field_mappings: Vec<MetadataMapping<FieldRc>>,
}

impl MetadataLoadedInfo {
    /// Assemble the snapshot from the decoded tables.
    ///
    /// # Arguments
    /// * `strong` - Decode result of the strong table
    /// * `weak` - Decode result of the weak table, if one was present
    /// * `modules` - Module-discovery set threaded through both passes
    /// * `compilation_modules` - The modules of the active compilation
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the weak table carries method or field
    /// mappings, or if any symbol appears in more than one mapping.
    pub(crate) fn assemble(
        strong: DecodedTable,
        weak: Option<DecodedTable>,
        modules: ModuleSet,
        compilation_modules: &HashSet<RefKey<Module>>,
    ) -> Result<MetadataLoadedInfo> {
        let mut all_type_mappings = match weak {
            Some(weak) => {
                // The format does not permit weak method or field mappings
                if !weak.method_mappings.is_empty() || !weak.field_mappings.is_empty() {
                    return Err(malformed_error!(
                        "Weak mapping table carries {} method and {} field mappings",
                        weak.method_mappings.len(),
                        weak.field_mappings.len()
                    ));
                }

                weak.type_mappings
            }
            None => Vec::new(),
        };

        check_unique(
            &all_type_mappings,
            &strong.type_mappings,
            &strong.method_mappings,
            &strong.field_mappings,
        )?;

        // All type mappings is the combination of weak and strong type mappings
        all_type_mappings.extend(strong.type_mappings.iter().cloned());

        let metadata_modules = modules.into_modules();
        let mut local_modules = Vec::new();
        let mut external_modules = Vec::new();
        for module in &metadata_modules {
            if compilation_modules.contains(&RefKey::new(module)) {
                local_modules.push(module.clone());
            } else {
                external_modules.push(module.clone());
            }
        }

        Ok(MetadataLoadedInfo {
            metadata_modules,
            local_modules,
            external_modules,
            strong_type_mappings: strong.type_mappings,
            all_type_mappings,
            method_mappings: strong.method_mappings,
            field_mappings: strong.field_mappings,
        })
    }
}

/// Enforce the global uniqueness invariant: no symbol may appear in more than one mapping
/// across the union of all four lists.
///
/// A duplicate means two runtime tokens claim the same symbol - the artifact is corrupt, and
/// continuing would let an AOT image silently misbehave, so this runs in every build.
fn check_unique(
    weak_types: &[MetadataMapping<CilTypeRc>],
    strong_types: &[MetadataMapping<CilTypeRc>],
    methods: &[MetadataMapping<MethodRc>],
    fields: &[MetadataMapping<FieldRc>],
) -> Result<()> {
    let mut seen = HashSet::new();

    let type_symbols = weak_types
        .iter()
        .chain(strong_types)
        .map(|mapping| CilSymbol::Type(mapping.symbol.clone()));
    let method_symbols = methods
        .iter()
        .map(|mapping| CilSymbol::Method(mapping.symbol.clone()));
    let field_symbols = fields
        .iter()
        .map(|mapping| CilSymbol::Field(mapping.symbol.clone()));

    for symbol in type_symbols.chain(method_symbols).chain(field_symbols) {
        if !seen.insert(symbol.addr()) {
            return Err(malformed_error!(
                "Symbol '{}' appears in more than one metadata mapping",
                symbol.name()
            ));
        }
    }

    Ok(())
}
