//! Token resolution for mapping streams.
//!
//! `ldtoken` operands embedded in a mapping stream are resolved back into live symbols
//! through the [`TokenResolver`] contract. The resolver is owned by the surrounding compiler;
//! [`SymbolRegistry`] is the canonical implementation, a concurrent token-to-symbol map that
//! is safe to share between compilation stages.

use dashmap::DashMap;

use crate::{
    metadata::{token::Token, typesystem::CilSymbol},
    Result,
};

/// Resolver collaborator contract: map a token embedded in the instruction stream to the
/// corresponding live symbol.
///
/// Implementations must be thread-safe and idempotent - resolving the same token repeatedly
/// yields the same symbol instance, so resolution results can be compared by reference. The
/// mapping engine never mutates anything owned by the resolver.
///
/// Dead table entries are signaled in-stream (a literal-zero header), never through the
/// resolver: a token that fails to resolve always indicates a corrupt or mismatched artifact.
pub trait TokenResolver: Send + Sync {
    /// Resolve a token to the symbol it addresses.
    ///
    /// # Arguments
    /// * `token` - The token taken from a `ldtoken` operand
    ///
    /// # Errors
    /// Returns [`crate::Error::SymbolNotFound`] if no symbol is registered for the token.
    fn resolve(&self, token: Token) -> Result<CilSymbol>;
}

/// A thread-safe, idempotent [`TokenResolver`] backed by a concurrent map.
///
/// Symbols register under their defining token; handing out clones of the stored `Arc`s
/// preserves reference identity across repeated resolutions.
///
/// # Examples
///
/// ```rust
/// use aotmeta::metadata::{
///     token::Token,
///     typesystem::{CilSymbol, CilType, Module, SymbolRegistry, TokenResolver},
/// };
///
/// let module = Module::new("App");
/// let widget = CilType::new(&module, "App", "Widget", Token::new(0x02000001));
///
/// let registry = SymbolRegistry::new();
/// registry.register(CilSymbol::Type(widget));
///
/// assert!(registry.resolve(Token::new(0x02000001)).is_ok());
/// assert!(registry.resolve(Token::new(0x02000099)).is_err());
/// ```
pub struct SymbolRegistry {
    entries: DashMap<Token, CilSymbol>,
}

impl SymbolRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        SymbolRegistry {
            entries: DashMap::new(),
        }
    }

    /// Register a symbol under its defining token.
    ///
    /// Re-registering a token keeps the first symbol; resolution must stay idempotent for
    /// the lifetime of the registry.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to register
    pub fn register(&self, symbol: CilSymbol) {
        self.entries.entry(symbol.token()).or_insert(symbol);
    }

    /// Number of registered symbols
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no symbols are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenResolver for SymbolRegistry {
    fn resolve(&self, token: Token) -> Result<CilSymbol> {
        match self.entries.get(&token) {
            Some(entry) => Ok(entry.value().clone()),
            None => Err(crate::Error::SymbolNotFound(token)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::{CilType, Method, Module};
    use std::sync::Arc;

    #[test]
    fn resolution_is_idempotent() {
        let module = Module::new("M");
        let cil_type = CilType::new(&module, "N", "T", Token::new(0x02000001));
        let method = Method::new(&cil_type, "Run", Token::new(0x06000001), 0);

        let registry = SymbolRegistry::new();
        registry.register(CilSymbol::Type(cil_type.clone()));
        registry.register(CilSymbol::Method(method.clone()));
        assert_eq!(registry.len(), 2);

        let first = registry.resolve(Token::new(0x06000001)).unwrap();
        let second = registry.resolve(Token::new(0x06000001)).unwrap();
        match (first, second) {
            (CilSymbol::Method(a), CilSymbol::Method(b)) => {
                assert!(Arc::ptr_eq(&a, &b));
                assert!(Arc::ptr_eq(&a, &method));
            }
            _ => panic!("expected method symbols"),
        }
    }

    #[test]
    fn first_registration_wins() {
        let module = Module::new("M");
        let first = CilType::new(&module, "N", "First", Token::new(0x02000001));
        let second = CilType::new(&module, "N", "Second", Token::new(0x02000001));

        let registry = SymbolRegistry::new();
        registry.register(CilSymbol::Type(first.clone()));
        registry.register(CilSymbol::Type(second));
        assert_eq!(registry.len(), 1);

        match registry.resolve(Token::new(0x02000001)).unwrap() {
            CilSymbol::Type(resolved) => assert!(Arc::ptr_eq(&resolved, &first)),
            _ => panic!("expected type symbol"),
        }
    }

    #[test]
    fn unknown_token() {
        let registry = SymbolRegistry::new();
        assert!(matches!(
            registry.resolve(Token::new(0xDEAD_BEEF)),
            Err(crate::Error::SymbolNotFound(_))
        ));
    }
}
