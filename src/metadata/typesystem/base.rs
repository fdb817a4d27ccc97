use std::{
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock, Weak},
};

use crate::{metadata::token::Token, Result};

/// A reference counted [`Module`]
pub type ModuleRc = Arc<Module>;
/// A reference counted [`CilType`]
pub type CilTypeRc = Arc<CilType>;
/// A reference counted [`Method`]
pub type MethodRc = Arc<Method>;
/// A reference counted [`Field`]
pub type FieldRc = Arc<Field>;

/// A compilation unit containing types.
///
/// Module identity is by reference: the engine classifies discovered modules as local or
/// external by comparing against the compilation set, never by name.
pub struct Module {
    /// Simple name of the module (e.g. `System.Private.CoreLib`)
    pub name: String,
    /// Types defined in this module, in definition order
    pub types: boxcar::Vec<CilTypeRc>,
}

impl Module {
    /// Create a new empty module.
    ///
    /// # Arguments
    /// * `name` - Simple name of the module
    #[must_use]
    pub fn new(name: &str) -> ModuleRc {
        Arc::new(Module {
            name: name.to_string(),
            types: boxcar::Vec::new(),
        })
    }

    /// Find a type in this module by its full name (`Namespace.Name`, or just `Name` for
    /// types without a namespace).
    ///
    /// # Arguments
    /// * `full_name` - The namespace-qualified name to look for
    #[must_use]
    pub fn type_by_name(&self, full_name: &str) -> Option<CilTypeRc> {
        for (_, cil_type) in self.types.iter() {
            if cil_type.full_name() == full_name {
                return Some(cil_type.clone());
            }
        }

        None
    }
}

/// A smart reference to a [`CilType`] that holds a weak reference, preventing the
/// member -> owner -> member cycles from leaking memory while providing a clean API.
#[derive(Clone)]
pub struct CilTypeRef {
    weak_ref: Weak<CilType>,
}

impl CilTypeRef {
    /// Create a new `CilTypeRef` from a strong reference
    #[must_use]
    pub fn new(strong_ref: &CilTypeRc) -> Self {
        Self {
            weak_ref: Arc::downgrade(strong_ref),
        }
    }

    /// Get a strong reference to the type, returning `None` if the type has been dropped
    #[must_use]
    pub fn upgrade(&self) -> Option<CilTypeRc> {
        self.weak_ref.upgrade()
    }
}

impl From<CilTypeRc> for CilTypeRef {
    fn from(strong_ref: CilTypeRc) -> Self {
        Self::new(&strong_ref)
    }
}

/// Identity of a custom attribute applied to a type.
///
/// Only the attribute type's identity matters to the engine (e.g. the reflection-blocked
/// marker); constructor arguments are not modeled.
pub struct CustomAttributeInfo {
    /// Namespace of the attribute type
    pub namespace: String,
    /// Simple name of the attribute type
    pub name: String,
}

/// A type definition in the symbol universe.
pub struct CilType {
    /// Metadata token of the definition
    pub token: Token,
    /// Namespace this type is defined in, empty for the global namespace
    pub namespace: String,
    /// Simple name of the type
    pub name: String,
    /// The module this type is defined in
    module: Weak<Module>,
    /// Methods defined on this type, in definition order
    pub methods: boxcar::Vec<MethodRc>,
    /// Fields defined on this type, in definition order
    pub fields: boxcar::Vec<FieldRc>,
    /// Custom attributes applied to this type
    pub custom_attributes: boxcar::Vec<CustomAttributeInfo>,
}

impl CilType {
    /// Create a new type and register it in its module.
    ///
    /// # Arguments
    /// * `module` - The module the type belongs to
    /// * `namespace` - Namespace of the type, empty for the global namespace
    /// * `name` - Simple name of the type
    /// * `token` - Metadata token of the definition
    #[must_use]
    pub fn new(module: &ModuleRc, namespace: &str, name: &str, token: Token) -> CilTypeRc {
        let cil_type = Arc::new(CilType {
            token,
            namespace: namespace.to_string(),
            name: name.to_string(),
            module: Arc::downgrade(module),
            methods: boxcar::Vec::new(),
            fields: boxcar::Vec::new(),
            custom_attributes: boxcar::Vec::new(),
        });

        module.types.push(cil_type.clone());
        cil_type
    }

    /// The module this type is defined in, `None` if the universe has been dropped
    #[must_use]
    pub fn module(&self) -> Option<ModuleRc> {
        self.module.upgrade()
    }

    /// The namespace-qualified name of this type
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Find a method on this type by name.
    ///
    /// # Arguments
    /// * `name` - Simple name of the method
    #[must_use]
    pub fn method_by_name(&self, name: &str) -> Option<MethodRc> {
        for (_, method) in self.methods.iter() {
            if method.name == name {
                return Some(method.clone());
            }
        }

        None
    }

    /// Record a custom attribute on this type.
    ///
    /// # Arguments
    /// * `namespace` - Namespace of the attribute type
    /// * `name` - Simple name of the attribute type
    pub fn add_custom_attribute(&self, namespace: &str, name: &str) {
        self.custom_attributes.push(CustomAttributeInfo {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
    }

    /// Check whether a custom attribute with the given type identity is applied to this type.
    ///
    /// # Arguments
    /// * `namespace` - Namespace of the attribute type
    /// * `name` - Simple name of the attribute type
    #[must_use]
    pub fn has_custom_attribute(&self, namespace: &str, name: &str) -> bool {
        for (_, attribute) in self.custom_attributes.iter() {
            if attribute.namespace == namespace && attribute.name == name {
                return true;
            }
        }

        false
    }
}

/// A method definition or a generic instantiation of one.
///
/// An uninstantiated method (`instantiation` empty) is its own typical form; an instantiated
/// method points back at the definition it was instantiated from. The mapping streams only
/// ever reference typical forms, instantiations are produced on demand during invoke-stub
/// resolution.
pub struct Method {
    /// Metadata token of the definition
    pub token: Token,
    /// Simple name of the method
    pub name: String,
    /// The type this method is defined on
    owner: CilTypeRef,
    /// Number of generic parameters of the definition, 0 for non-generic methods
    pub generic_params: u32,
    /// Type arguments of this instantiation, empty for the typical (definition) form
    pub instantiation: Vec<CilTypeRc>,
    /// The definition this instantiation was created from, `None` for definitions
    typical: Option<MethodRc>,
    /// Raw CIL body bytes (header plus code), set once by the producing stage
    body: OnceLock<Vec<u8>>,
}

impl Method {
    /// Create a new method definition and register it on its owning type.
    ///
    /// # Arguments
    /// * `owner` - The type the method is defined on
    /// * `name` - Simple name of the method
    /// * `token` - Metadata token of the definition
    /// * `generic_params` - Number of generic parameters, 0 for non-generic methods
    #[must_use]
    pub fn new(owner: &CilTypeRc, name: &str, token: Token, generic_params: u32) -> MethodRc {
        let method = Arc::new(Method {
            token,
            name: name.to_string(),
            owner: CilTypeRef::new(owner),
            generic_params,
            instantiation: Vec::new(),
            typical: None,
            body: OnceLock::new(),
        });

        owner.methods.push(method.clone());
        method
    }

    /// The type this method is defined on, `None` if the universe has been dropped
    #[must_use]
    pub fn owner(&self) -> Option<CilTypeRc> {
        self.owner.upgrade()
    }

    /// Whether this method carries an instantiation (as opposed to being a definition)
    #[must_use]
    pub fn is_instantiated(&self) -> bool {
        !self.instantiation.is_empty()
    }

    /// The typical (generic definition) form of a method.
    ///
    /// For a definition this is the method itself; for an instantiation it is the definition
    /// the instantiation was created from. The typical form is the stable lookup key used by
    /// the invoke-stub table.
    #[must_use]
    pub fn typical(this: &MethodRc) -> MethodRc {
        match &this.typical {
            Some(definition) => definition.clone(),
            None => this.clone(),
        }
    }

    /// Instantiate a generic method definition with concrete type arguments.
    ///
    /// The result is a speculative symbol: it is not registered on the owning type, it only
    /// exists to describe one call shape.
    ///
    /// # Arguments
    /// * `definition` - The typical form to instantiate
    /// * `type_args` - One concrete type per generic parameter of the definition
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] if `definition` is already instantiated or the
    /// argument count does not match its generic arity.
    pub fn instantiate(definition: &MethodRc, type_args: Vec<CilTypeRc>) -> Result<MethodRc> {
        if definition.is_instantiated() {
            return Err(crate::Error::TypeError(format!(
                "Cannot instantiate '{}', it already carries an instantiation",
                definition.name
            )));
        }

        if type_args.len() != definition.generic_params as usize {
            return Err(crate::Error::TypeError(format!(
                "Instantiation of '{}' expects {} type arguments, got {}",
                definition.name,
                definition.generic_params,
                type_args.len()
            )));
        }

        Ok(Arc::new(Method {
            token: definition.token,
            name: definition.name.clone(),
            owner: definition.owner.clone(),
            generic_params: definition.generic_params,
            instantiation: type_args,
            typical: Some(definition.clone()),
            body: OnceLock::new(),
        }))
    }

    /// Attach the raw CIL body (header plus code) to this method.
    ///
    /// Returns `false` if a body was already set; the first body wins.
    ///
    /// # Arguments
    /// * `data` - Raw body bytes as laid out in the image
    pub fn set_body(&self, data: Vec<u8>) -> bool {
        self.body.set(data).is_ok()
    }

    /// The raw CIL body bytes of this method, if one was attached
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.get().map(Vec::as_slice)
    }
}

/// A field definition in the symbol universe.
pub struct Field {
    /// Metadata token of the definition
    pub token: Token,
    /// Simple name of the field
    pub name: String,
    /// The type this field is defined on
    owner: CilTypeRef,
}

impl Field {
    /// Create a new field and register it on its owning type.
    ///
    /// # Arguments
    /// * `owner` - The type the field is defined on
    /// * `name` - Simple name of the field
    /// * `token` - Metadata token of the definition
    #[must_use]
    pub fn new(owner: &CilTypeRc, name: &str, token: Token) -> FieldRc {
        let field = Arc::new(Field {
            token,
            name: name.to_string(),
            owner: CilTypeRef::new(owner),
        });

        owner.fields.push(field.clone());
        field
    }

    /// The type this field is defined on, `None` if the universe has been dropped
    #[must_use]
    pub fn owner(&self) -> Option<CilTypeRc> {
        self.owner.upgrade()
    }
}

/// A symbol that can appear in a mapping record: a type, a method, or a field.
///
/// This is a closed sum type on purpose. The set of mappable kinds is fixed by the artifact
/// format, and every classifier in the engine matches exhaustively - adding a kind here must
/// break compilation of each of them rather than surface as a run-time fallthrough.
#[derive(Clone)]
pub enum CilSymbol {
    /// A type symbol
    Type(CilTypeRc),
    /// A method symbol
    Method(MethodRc),
    /// A field symbol
    Field(FieldRc),
}

impl CilSymbol {
    /// The metadata token of the underlying symbol
    #[must_use]
    pub fn token(&self) -> Token {
        match self {
            CilSymbol::Type(cil_type) => cil_type.token,
            CilSymbol::Method(method) => method.token,
            CilSymbol::Field(field) => field.token,
        }
    }

    /// The simple name of the underlying symbol
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            CilSymbol::Type(cil_type) => &cil_type.name,
            CilSymbol::Method(method) => &method.name,
            CilSymbol::Field(field) => &field.name,
        }
    }

    /// A stable address identifying the underlying symbol object.
    ///
    /// Used for the cross-kind uniqueness check: two mappings reference the same symbol
    /// exactly when their addresses are equal.
    #[must_use]
    pub fn addr(&self) -> usize {
        match self {
            CilSymbol::Type(cil_type) => Arc::as_ptr(cil_type) as usize,
            CilSymbol::Method(method) => Arc::as_ptr(method) as usize,
            CilSymbol::Field(field) => Arc::as_ptr(field) as usize,
        }
    }
}

/// Wrapper giving an `Arc`'d symbol reference-identity semantics for use as a map key.
///
/// Symbol identity is by reference, not by value: `Eq` and `Hash` are defined over the
/// allocation address, so two handles to the same symbol object collide and two symbols that
/// merely look alike do not.
pub struct RefKey<T>(Arc<T>);

impl<T> RefKey<T> {
    /// Create a key from a shared handle
    #[must_use]
    pub fn new(value: &Arc<T>) -> Self {
        RefKey(value.clone())
    }

    /// Access the underlying handle
    #[must_use]
    pub fn get(&self) -> &Arc<T> {
        &self.0
    }
}

impl<T> Clone for RefKey<T> {
    fn clone(&self) -> Self {
        RefKey(self.0.clone())
    }
}

impl<T> PartialEq for RefKey<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for RefKey<T> {}

impl<T> Hash for RefKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}
