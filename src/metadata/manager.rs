//! The metadata manager facade.
//!
//! [`MetadataManager`] is the contract the rest of the compiler sees: enumerate the local
//! metadata-bearing modules, test whether a type is reflection-blocked, retrieve the
//! precomputed metadata blob together with the four mapping lists, and resolve
//! dynamic-invoke stubs. The mapping snapshot and the stub table are computed lazily, at
//! most once each, on first demand.
//!
//! # Discovery convention
//!
//! Mapping procedures live on a reserved marker type whose name is fixed by the producing
//! toolchain ([`METADATA_MAPPING_TYPE_NAME`]). The strong table is the body of its
//! `Metadata` method, the weak table is `WeakMetadata`, and the dynamic-invoke table is
//! `DynamicInvokeStubs`; each is optional, and an absent procedure simply contributes an
//! empty table.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aotmeta::metadata::{
//!     manager::MetadataManager,
//!     method::StoredIlProvider,
//!     typesystem::{Module, SymbolRegistry},
//! };
//!
//! # fn example(describing: aotmeta::metadata::typesystem::ModuleRc,
//! #            registry: Arc<SymbolRegistry>) -> aotmeta::Result<()> {
//! let manager = MetadataManager::new(
//!     describing.clone(),
//!     [describing],
//!     vec![],
//!     Arc::new(StoredIlProvider),
//!     registry,
//! );
//!
//! for module in manager.compilation_modules_with_metadata()? {
//!     println!("metadata module: {}", module.name);
//! }
//! # Ok(())
//! # }
//! ```

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, OnceLock},
};

use crate::{
    metadata::{
        mapping::{
            read_invoke_stub_table, read_mapping_table, DecodedTable, IlMappingStream,
            MappingTableKind, MetadataLoadedInfo, MetadataMapping, ModuleSet,
        },
        method::{IlProvider, MethodBody},
        typesystem::{
            CilType, CilTypeRc, FieldRc, Method, MethodRc, Module, ModuleRc, RefKey,
            TokenResolver,
        },
        validation::ValidationConfig,
    },
    Result,
};

/// Name of the reserved marker type carrying the mapping procedures.
///
/// The producing toolchain synthesizes this type into the metadata-describing module; the
/// name is deliberately unspeakable in source code.
pub const METADATA_MAPPING_TYPE_NAME: &str = "_$ILCT$+$ILT$ReflectionMapping$";

/// Well-known name of the strong-table procedure
const FULL_METADATA_METHOD_NAME: &str = "Metadata";
/// Well-known name of the weak-table procedure
const WEAK_METADATA_METHOD_NAME: &str = "WeakMetadata";
/// Well-known name of the dynamic-invoke-table procedure
const DYNAMIC_INVOKE_STUBS_METHOD_NAME: &str = "DynamicInvokeStubs";

/// Namespace of the reflection-blocked marker attribute
const REFLECTION_BLOCKED_NAMESPACE: &str = "System.Runtime.CompilerServices";
/// Name of the reflection-blocked marker attribute
const REFLECTION_BLOCKED_NAME: &str = "ReflectionBlockedAttribute";

/// The combined metadata view handed to downstream compilation stages: the precomputed blob
/// plus the mapping lists, borrowed from the cached snapshot.
pub struct ComputedMetadata<'a> {
    /// The precomputed metadata blob, opaque to this engine
    pub blob: &'a [u8],
    /// All type mappings (weak entries first, then strong)
    pub type_mappings: &'a [MetadataMapping<CilTypeRc>],
    /// Method mappings
    pub method_mappings: &'a [MetadataMapping<MethodRc>],
    /// Field mappings
    pub field_mappings: &'a [MetadataMapping<FieldRc>],
}

/// Facade over precomputed metadata mappings.
///
/// Holds the two lazily computed caches. Both are `OnceLock`s over `Result`s: the winning
/// initializer runs exactly once even under concurrent queries, and every caller - racing or
/// later - observes the same completed outcome, including a memoized failure (the input is a
/// static artifact, retrying cannot change it).
pub struct MetadataManager {
    metadata_describing_module: ModuleRc,
    compilation_modules: HashSet<RefKey<Module>>,
    metadata_blob: Vec<u8>,
    il_provider: Arc<dyn IlProvider>,
    resolver: Arc<dyn TokenResolver>,
    config: ValidationConfig,
    loaded_metadata: OnceLock<Result<Arc<MetadataLoadedInfo>>>,
    dynamic_invoke_stubs: OnceLock<Result<Arc<HashMap<RefKey<Method>, MethodRc>>>>,
}

impl MetadataManager {
    /// Create a manager with the default [`ValidationConfig`].
    ///
    /// # Arguments
    /// * `metadata_describing_module` - The module carrying the mapping marker type
    /// * `compilation_modules` - The modules of the active compilation
    /// * `metadata_blob` - The precomputed metadata blob, passed through opaquely
    /// * `il_provider` - Supplier of mapping-procedure bodies
    /// * `resolver` - Resolver for `ldtoken` operands
    #[must_use]
    pub fn new(
        metadata_describing_module: ModuleRc,
        compilation_modules: impl IntoIterator<Item = ModuleRc>,
        metadata_blob: Vec<u8>,
        il_provider: Arc<dyn IlProvider>,
        resolver: Arc<dyn TokenResolver>,
    ) -> Self {
        Self::with_validation(
            metadata_describing_module,
            compilation_modules,
            metadata_blob,
            il_provider,
            resolver,
            ValidationConfig::default(),
        )
    }

    /// Create a manager with an explicit [`ValidationConfig`].
    ///
    /// # Arguments
    /// * `metadata_describing_module` - The module carrying the mapping marker type
    /// * `compilation_modules` - The modules of the active compilation
    /// * `metadata_blob` - The precomputed metadata blob, passed through opaquely
    /// * `il_provider` - Supplier of mapping-procedure bodies
    /// * `resolver` - Resolver for `ldtoken` operands
    /// * `config` - Extraction configuration
    #[must_use]
    pub fn with_validation(
        metadata_describing_module: ModuleRc,
        compilation_modules: impl IntoIterator<Item = ModuleRc>,
        metadata_blob: Vec<u8>,
        il_provider: Arc<dyn IlProvider>,
        resolver: Arc<dyn TokenResolver>,
        config: ValidationConfig,
    ) -> Self {
        MetadataManager {
            metadata_describing_module,
            compilation_modules: compilation_modules
                .into_iter()
                .map(|module| RefKey::new(&module))
                .collect(),
            metadata_blob,
            il_provider,
            resolver,
            config,
            loaded_metadata: OnceLock::new(),
            dynamic_invoke_stubs: OnceLock::new(),
        }
    }

    /// Check whether a module carries metadata mappings at all, without constructing a
    /// manager or decoding anything.
    ///
    /// # Arguments
    /// * `module` - The module to probe for the mapping marker type
    #[must_use]
    pub fn module_has_metadata_mappings(module: &ModuleRc) -> bool {
        module.type_by_name(METADATA_MAPPING_TYPE_NAME).is_some()
    }

    /// The local (in-compilation) modules that carry metadata, in discovery order.
    ///
    /// Forces the mapping snapshot on first call.
    ///
    /// # Errors
    /// Returns the memoized [`crate::Error`] of the snapshot computation if the artifact is
    /// malformed.
    pub fn compilation_modules_with_metadata(&self) -> Result<&[ModuleRc]> {
        Ok(&self.loaded()?.local_modules)
    }

    /// Whether reflection over a type is blocked.
    ///
    /// Evaluated per call from the marker attribute on the type; this is independent of the
    /// mapping snapshot and never forces it.
    ///
    /// # Arguments
    /// * `cil_type` - The type to test
    #[must_use]
    pub fn is_reflection_blocked(&self, cil_type: &CilType) -> bool {
        cil_type.has_custom_attribute(REFLECTION_BLOCKED_NAMESPACE, REFLECTION_BLOCKED_NAME)
    }

    /// The precomputed metadata blob together with all four mapping lists.
    ///
    /// Forces the mapping snapshot on first call.
    ///
    /// # Errors
    /// Returns the memoized [`crate::Error`] of the snapshot computation if the artifact is
    /// malformed.
    pub fn metadata(&self) -> Result<ComputedMetadata<'_>> {
        let loaded = self.loaded()?;
        Ok(ComputedMetadata {
            blob: &self.metadata_blob,
            type_mappings: &loaded.all_type_mappings,
            method_mappings: &loaded.method_mappings,
            field_mappings: &loaded.field_mappings,
        })
    }

    /// The full mapping snapshot, for callers that need the strong/weak split or the module
    /// partitions.
    ///
    /// Forces the mapping snapshot on first call.
    ///
    /// # Errors
    /// Returns the memoized [`crate::Error`] of the snapshot computation if the artifact is
    /// malformed.
    pub fn loaded_info(&self) -> Result<&MetadataLoadedInfo> {
        Ok(self.loaded()?.as_ref())
    }

    /// Is there a reflection invoke stub for a method that is invokable?
    ///
    /// # Arguments
    /// * `method` - The (possibly instantiated) call target
    ///
    /// # Errors
    /// Returns the memoized [`crate::Error`] of the stub-table computation if the artifact
    /// is malformed.
    pub fn has_reflection_invoke_stub(&self, method: &MethodRc) -> Result<bool> {
        Ok(self.reflection_invoke_stub(method)?.is_some())
    }

    /// Gets a stub that can be used to reflection-invoke a method with a given signature.
    ///
    /// The call target is reduced to its typical (generic definition) form and looked up in
    /// the stub table; `Ok(None)` means no stub exists for it, which is a defined result and
    /// not an error. A generic stub is instantiated over the original target's type
    /// arguments, producing a method specialized to that exact call shape.
    ///
    /// # Arguments
    /// * `method` - The (possibly instantiated) call target
    ///
    /// # Errors
    /// Returns the memoized [`crate::Error`] of the stub-table computation, or
    /// [`crate::Error::TypeError`] if the stub's generic arity does not match the target's
    /// instantiation.
    pub fn reflection_invoke_stub(&self, method: &MethodRc) -> Result<Option<MethodRc>> {
        let typical_invoke_target = Method::typical(method);
        let Some(typical_stub) = self
            .invoke_stubs()?
            .get(&RefKey::new(&typical_invoke_target))
        else {
            return Ok(None);
        };

        if method.instantiation.is_empty() || typical_stub.generic_params == 0 {
            return Ok(Some(typical_stub.clone()));
        }

        Method::instantiate(typical_stub, method.instantiation.clone()).map(Some)
    }

    /// The mapping snapshot, computing it on first call.
    fn loaded(&self) -> Result<&Arc<MetadataLoadedInfo>> {
        self.loaded_metadata
            .get_or_init(|| self.load_metadata().map(Arc::new))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// The stub table, computing it on first call.
    fn invoke_stubs(&self) -> Result<&Arc<HashMap<RefKey<Method>, MethodRc>>> {
        self.dynamic_invoke_stubs
            .get_or_init(|| self.load_dynamic_invoke_stubs().map(Arc::new))
            .as_ref()
            .map_err(Clone::clone)
    }

    /// The marker type in the metadata-describing module, honoring the configuration when
    /// it is absent.
    fn mapping_type(&self) -> Result<Option<CilTypeRc>> {
        match self
            .metadata_describing_module
            .type_by_name(METADATA_MAPPING_TYPE_NAME)
        {
            Some(marker) => Ok(Some(marker)),
            None if self.config.require_mapping_type => Err(malformed_error!(
                "Module '{}' does not contain the metadata mapping type",
                self.metadata_describing_module.name
            )),
            None => Ok(None),
        }
    }

    /// Decode both metadata tables and assemble the snapshot.
    fn load_metadata(&self) -> Result<MetadataLoadedInfo> {
        let Some(marker) = self.mapping_type()? else {
            return MetadataLoadedInfo::assemble(
                DecodedTable::empty(),
                None,
                ModuleSet::new(),
                &self.compilation_modules,
            );
        };

        let mut modules = ModuleSet::new();

        let strong = match marker.method_by_name(FULL_METADATA_METHOD_NAME) {
            Some(method) => self.decode_table(&method, MappingTableKind::Strong, &mut modules)?,
            None => DecodedTable::empty(),
        };

        let weak = match marker.method_by_name(WEAK_METADATA_METHOD_NAME) {
            Some(method) => {
                Some(self.decode_table(&method, MappingTableKind::Weak, &mut modules)?)
            }
            None => None,
        };

        MetadataLoadedInfo::assemble(strong, weak, modules, &self.compilation_modules)
    }

    /// Decode one metadata table from a mapping procedure's body.
    fn decode_table(
        &self,
        method: &MethodRc,
        kind: MappingTableKind,
        modules: &mut ModuleSet,
    ) -> Result<DecodedTable> {
        let data = self.il_provider.method_il(method)?;
        let body = MethodBody::from(&data)?;
        let mut stream = IlMappingStream::new(body.code(&data)?, self.resolver.as_ref());
        read_mapping_table(&mut stream, kind, modules, self.config.max_table_records)
    }

    /// Decode the dynamic-invoke stub table; an absent procedure yields an empty table.
    fn load_dynamic_invoke_stubs(&self) -> Result<HashMap<RefKey<Method>, MethodRc>> {
        let Some(marker) = self.mapping_type()? else {
            return Ok(HashMap::new());
        };

        let Some(method) = marker.method_by_name(DYNAMIC_INVOKE_STUBS_METHOD_NAME) else {
            return Ok(HashMap::new());
        };

        let data = self.il_provider.method_il(&method)?;
        let body = MethodBody::from(&data)?;
        let mut stream = IlMappingStream::new(body.code(&data)?, self.resolver.as_ref());
        read_invoke_stub_table(&mut stream, self.config.max_table_records)
    }
}
