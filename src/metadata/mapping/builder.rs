//! One-pass decoders for the mapping tables.
//!
//! [`read_mapping_table`] walks one metadata table (strong or weak - the grammar is
//! identical, only the permitted record kinds differ) and classifies every live record by
//! symbol kind. [`read_invoke_stub_table`] walks the dynamic-invoke table, whose records are
//! method pairs instead of symbol/token pairs.
//!
//! Both decoders are written against [`MappingStream`], so they are independent of the CIL
//! framing and can be tested with synthetic streams.

use std::collections::{HashMap, HashSet};

use crate::{
    metadata::{
        mapping::{MappingStream, MappingTableKind, MetadataMapping},
        token::Token,
        typesystem::{CilSymbol, CilTypeRc, FieldRc, Method, MethodRc, Module, ModuleRc, RefKey},
    },
    Result,
};

/// Set of modules discovered while decoding, in insertion order of first discovery.
///
/// One instance is threaded through both metadata-table passes so a single consolidated
/// module set results.
pub struct ModuleSet {
    order: Vec<ModuleRc>,
    seen: HashSet<RefKey<Module>>,
}

impl ModuleSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        ModuleSet {
            order: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Record a discovered module; repeated discoveries keep the original position.
    ///
    /// # Arguments
    /// * `module` - The module to record
    pub fn insert(&mut self, module: ModuleRc) {
        if self.seen.insert(RefKey::new(&module)) {
            self.order.push(module);
        }
    }

    /// The discovered modules in first-discovery order
    #[must_use]
    pub fn modules(&self) -> &[ModuleRc] {
        &self.order
    }

    /// Consume the set, yielding the modules in first-discovery order
    #[must_use]
    pub fn into_modules(self) -> Vec<ModuleRc> {
        self.order
    }
}

impl Default for ModuleSet {
    fn default() -> Self {
        Self::new()
    }
}

/// The typed mapping lists decoded from one metadata table.
pub struct DecodedTable {
    /// Type mappings, in record order
    pub type_mappings: Vec<MetadataMapping<CilTypeRc>>,
    /// Method mappings, in record order
    pub method_mappings: Vec<MetadataMapping<MethodRc>>,
    /// Field mappings, in record order
    pub field_mappings: Vec<MetadataMapping<FieldRc>>,
}

impl DecodedTable {
    /// An empty decode result, used when an optional table is absent
    #[must_use]
    pub fn empty() -> Self {
        DecodedTable {
            type_mappings: Vec::new(),
            method_mappings: Vec::new(),
            field_mappings: Vec::new(),
        }
    }
}

/// The module a symbol's owning type is defined in; a dangling weak reference means the
/// symbol universe was torn down mid-decode.
fn owning_module(symbol: &CilSymbol) -> Result<ModuleRc> {
    let cil_type = match symbol {
        CilSymbol::Type(cil_type) => cil_type.clone(),
        CilSymbol::Method(method) => method.owner().ok_or_else(|| {
            crate::Error::Error(format!("Owning type of method '{}' was dropped", method.name))
        })?,
        CilSymbol::Field(field) => field.owner().ok_or_else(|| {
            crate::Error::Error(format!("Owning type of field '{}' was dropped", field.name))
        })?,
    };

    cil_type.module().ok_or_else(|| {
        crate::Error::Error(format!("Module of type '{}' was dropped", cil_type.name))
    })
}

/// Decode one metadata table into typed mapping lists.
///
/// The record grammar is `{header, token value, discard, discard}` repeated until the
/// terminator. Live records are classified by the resolved symbol's kind and append to the
/// matching list while the owning module is recorded in `modules`. Dead records (a
/// literal-zero header standing in for a trimmed symbol) are consumed and skipped: the zero
/// confirmation is verified, the payload is read and dropped, and no mapping is produced.
///
/// The weak table only permits type records; a method or field surfacing there is raised
/// immediately, before the rest of the table is decoded.
///
/// # Arguments
/// * `stream` - The table to decode
/// * `kind` - Which table this is; [`MappingTableKind::Weak`] restricts records to types
/// * `modules` - Module-discovery set threaded across table passes
/// * `max_records` - Optional bound on the record count, guarding corrupt artifacts
///
/// # Errors
/// Returns [`crate::Error::Malformed`] when the stream violates the record grammar, when a
/// dead record's confirmation literal is not zero, when a non-type record appears in the
/// weak table, or when `max_records` is exceeded.
pub fn read_mapping_table(
    stream: &mut dyn MappingStream,
    kind: MappingTableKind,
    modules: &mut ModuleSet,
    max_records: Option<usize>,
) -> Result<DecodedTable> {
    let mut table = DecodedTable::empty();
    let mut records = 0usize;

    loop {
        if stream.try_read_terminator()? {
            break;
        }

        if let Some(limit) = max_records {
            if records >= limit {
                return Err(malformed_error!(
                    "Mapping table exceeds the configured record bound of {}",
                    limit
                ));
            }
        }
        records += 1;

        if let Some(symbol) = stream.try_read_symbol()? {
            let token = Token::new(stream.read_i4()? as u32);
            stream.read_pop()?;
            stream.read_pop()?;

            if kind == MappingTableKind::Weak && !matches!(symbol, CilSymbol::Type(_)) {
                // The format does not permit weak method or field mappings
                return Err(malformed_error!(
                    "Weak mapping table contains a {} record for '{}'",
                    match symbol {
                        CilSymbol::Type(_) => "type",
                        CilSymbol::Method(_) => "method",
                        CilSymbol::Field(_) => "field",
                    },
                    symbol.name()
                ));
            }

            modules.insert(owning_module(&symbol)?);
            match symbol {
                CilSymbol::Type(cil_type) => {
                    table.type_mappings.push(MetadataMapping::new(cil_type, token));
                }
                CilSymbol::Method(method) => {
                    table
                        .method_mappings
                        .push(MetadataMapping::new(method, token));
                }
                CilSymbol::Field(field) => {
                    table.field_mappings.push(MetadataMapping::new(field, token));
                }
            }
        } else {
            let dead_signifier = stream.read_i4()?;
            if dead_signifier != 0 {
                return Err(malformed_error!(
                    "Dead mapping record must confirm with a zero literal, found {}",
                    dead_signifier
                ));
            }

            stream.read_i4()?;
            stream.read_pop()?;
            stream.read_pop()?;
        }
    }

    Ok(table)
}

/// Decode the dynamic-invoke stub table.
///
/// The record grammar is `{header, header, discard, discard}` repeated until the terminator;
/// both headers must resolve to methods. The result maps each canonical call target to its
/// canonical stub; later records for the same target win, mirroring plain map insertion in
/// the producing stage.
///
/// # Arguments
/// * `stream` - The table to decode
/// * `max_records` - Optional bound on the record count, guarding corrupt artifacts
///
/// # Errors
/// Returns [`crate::Error::Malformed`] when the stream violates the record grammar or when a
/// record's headers do not resolve to two methods.
pub fn read_invoke_stub_table(
    stream: &mut dyn MappingStream,
    max_records: Option<usize>,
) -> Result<HashMap<RefKey<Method>, MethodRc>> {
    let mut table = HashMap::new();
    let mut records = 0usize;

    loop {
        if stream.try_read_terminator()? {
            break;
        }

        if let Some(limit) = max_records {
            if records >= limit {
                return Err(malformed_error!(
                    "Invoke-stub table exceeds the configured record bound of {}",
                    limit
                ));
            }
        }
        records += 1;

        let target = read_method_header(stream)?;
        let stub = read_method_header(stream)?;
        stream.read_pop()?;
        stream.read_pop()?;

        table.insert(RefKey::new(&target), stub);
    }

    Ok(table)
}

/// Read one invoke-stub header, which must be a live method reference.
fn read_method_header(stream: &mut dyn MappingStream) -> Result<MethodRc> {
    match stream.try_read_symbol()? {
        Some(CilSymbol::Method(method)) => Ok(method),
        Some(symbol) => Err(malformed_error!(
            "Invoke-stub record must reference methods, found '{}'",
            symbol.name()
        )),
        None => Err(malformed_error!(
            "Invoke-stub record must reference methods, found a literal"
        )),
    }
}
