//! Shared fixtures for the integration tests: a tiny IL assembler for synthetic mapping
//! streams and helpers to build a symbol universe around the reserved marker type.

#![allow(dead_code)]

use std::sync::Arc;

use aotmeta::prelude::*;

/// Minimal IL assembler producing mapping-procedure bodies.
///
/// Emits the same instruction forms the producing toolchain would: integer constants use the
/// shortest available `ldc.i4` encoding, and the finished code block is wrapped in a tiny or
/// fat header depending on its size.
pub struct IlEmitter {
    code: Vec<u8>,
}

impl IlEmitter {
    pub fn new() -> Self {
        IlEmitter { code: Vec::new() }
    }

    pub fn ldtoken(&mut self, token: Token) -> &mut Self {
        self.code.push(0xD0);
        self.code.extend_from_slice(&token.value().to_le_bytes());
        self
    }

    pub fn ldc_i4(&mut self, value: i32) -> &mut Self {
        match value {
            -1 => self.code.push(0x15),
            0..=8 => self.code.push(0x16 + value as u8),
            -128..=127 => {
                self.code.push(0x1F);
                self.code.push(value as i8 as u8);
            }
            _ => {
                self.code.push(0x20);
                self.code.extend_from_slice(&value.to_le_bytes());
            }
        }
        self
    }

    pub fn pop(&mut self) -> &mut Self {
        self.code.push(0x26);
        self
    }

    pub fn ret(&mut self) -> &mut Self {
        self.code.push(0x2A);
        self
    }

    /// One live mapping record: `ldtoken`, token value, two discards.
    pub fn record(&mut self, symbol_token: Token, value: i32) -> &mut Self {
        self.ldtoken(symbol_token).ldc_i4(value).pop().pop()
    }

    /// One dead mapping record: zero confirmation, payload, two discards.
    pub fn dead_record(&mut self, payload: i32) -> &mut Self {
        self.ldc_i4(0).ldc_i4(payload).pop().pop()
    }

    /// One invoke-stub record: two method references, two discards.
    pub fn stub_record(&mut self, target_token: Token, stub_token: Token) -> &mut Self {
        self.ldtoken(target_token).ldtoken(stub_token).pop().pop()
    }

    /// Wrap the code block in a method-body header, tiny when it fits.
    pub fn into_body(self) -> Vec<u8> {
        if self.code.len() < 64 {
            let mut body = vec![0x02 | ((self.code.len() as u8) << 2)];
            body.extend_from_slice(&self.code);
            body
        } else {
            let mut body = Vec::with_capacity(12 + self.code.len());
            body.extend_from_slice(&0x3003u16.to_le_bytes()); // fat, header size 12
            body.extend_from_slice(&8u16.to_le_bytes()); // max stack
            body.extend_from_slice(&(self.code.len() as u32).to_le_bytes());
            body.extend_from_slice(&0u32.to_le_bytes()); // no locals
            body.extend_from_slice(&self.code);
            body
        }
    }

    /// The raw code block without any header.
    pub fn into_code(self) -> Vec<u8> {
        self.code
    }
}

/// A symbol universe with a metadata-describing module that carries the marker type.
pub struct Universe {
    pub describing_module: ModuleRc,
    pub marker: CilTypeRc,
    pub registry: Arc<SymbolRegistry>,
}

impl Universe {
    pub fn new() -> Self {
        let describing_module = Module::new("App.Metadata");
        let marker = CilType::new(
            &describing_module,
            "",
            METADATA_MAPPING_TYPE_NAME,
            Token::new(0x02000001),
        );

        Universe {
            describing_module,
            marker,
            registry: Arc::new(SymbolRegistry::new()),
        }
    }

    /// Register a type in the universe and hand it back.
    pub fn define_type(&self, module: &ModuleRc, namespace: &str, name: &str, token: u32) -> CilTypeRc {
        let cil_type = CilType::new(module, namespace, name, Token::new(token));
        self.registry.register(CilSymbol::Type(cil_type.clone()));
        cil_type
    }

    /// Register a method in the universe and hand it back.
    pub fn define_method(
        &self,
        owner: &CilTypeRc,
        name: &str,
        token: u32,
        generic_params: u32,
    ) -> MethodRc {
        let method = Method::new(owner, name, Token::new(token), generic_params);
        self.registry.register(CilSymbol::Method(method.clone()));
        method
    }

    /// Register a field in the universe and hand it back.
    pub fn define_field(&self, owner: &CilTypeRc, name: &str, token: u32) -> FieldRc {
        let field = Field::new(owner, name, Token::new(token));
        self.registry.register(CilSymbol::Field(field.clone()));
        field
    }

    /// Attach a mapping procedure body to the marker type.
    pub fn attach_procedure(&self, name: &str, token: u32, body: Vec<u8>) -> MethodRc {
        let method = Method::new(&self.marker, name, Token::new(token), 0);
        method.set_body(body);
        method
    }

    /// Build a manager over this universe with the default configuration.
    pub fn manager(&self, compilation_modules: Vec<ModuleRc>) -> MetadataManager {
        MetadataManager::new(
            self.describing_module.clone(),
            compilation_modules,
            Vec::new(),
            Arc::new(StoredIlProvider),
            self.registry.clone(),
        )
    }
}
