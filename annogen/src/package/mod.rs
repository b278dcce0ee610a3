//! Parsed view of one source directory and its symbol table.

mod loader;
mod types;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub use loader::{load, may_be_marked_in};
pub use types::{IntegerType, PointerKind, PrimitiveKind, SemanticType, TypeShape, type_to_string};

/// Alias and newtype chains longer than this are treated as cycles.
const MAX_RESOLVE_DEPTH: usize = 16;
const CYCLE: &str = "(cycle)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Struct,
    Enum,
    Function,
    TypeAlias,
    Const,
}

/// A named top-level item of the package.
#[derive(Debug, Clone)]
pub struct SourceDeclaration {
    pub name: String,
    pub kind: DeclarationKind,
    pub item: syn::Item,
    pub file: PathBuf,
    /// Module of the item as seen from a generated child of the package root,
    /// e.g. `super` or `super::models`.
    pub module_path: String,
    /// 1-based line of the item, including its attributes.
    pub line: usize,
}

impl SourceDeclaration {
    pub fn attrs(&self) -> &[syn::Attribute] {
        match &self.item {
            syn::Item::Struct(item) => &item.attrs,
            syn::Item::Enum(item) => &item.attrs,
            syn::Item::Fn(item) => &item.attrs,
            syn::Item::Type(item) => &item.attrs,
            syn::Item::Const(item) => &item.attrs,
            _ => &[],
        }
    }

    /// Whether the item lives in the package root file.
    pub fn is_root(&self) -> bool {
        self.module_path == loader::ROOT_MODULE
    }

    /// Path usable from generated code to reach this item.
    pub fn qualified_path(&self) -> String {
        format!("{}::{}", self.module_path, self.name)
    }
}

/// Why a type could not be reduced to a [`SemanticType`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveError {
    pub chain: Vec<String>,
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chain.join(" -> "))
    }
}

/// Every declaration of a package directory, indexed by name.
#[derive(Debug)]
pub struct Package {
    dir: PathBuf,
    declarations: Vec<SourceDeclaration>,
    index: HashMap<String, usize>,
}

impl Package {
    pub fn new(dir: impl Into<PathBuf>, declarations: Vec<SourceDeclaration>) -> Self {
        let mut index = HashMap::new();
        for (position, declaration) in declarations.iter().enumerate() {
            if let Some(previous) = index.insert(declaration.name.clone(), position) {
                // keep the first declaration, files are visited in name order
                index.insert(declaration.name.clone(), previous);
                log::warn!(
                    "`{}` is declared in both {} and {}; using the first",
                    declaration.name,
                    declarations[previous].file.display(),
                    declaration.file.display()
                );
            }
        }
        Self {
            dir: dir.into(),
            declarations,
            index,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn declarations(&self) -> &[SourceDeclaration] {
        &self.declarations
    }

    pub fn lookup(&self, name: &str) -> Option<&SourceDeclaration> {
        self.index.get(name).map(|&position| &self.declarations[position])
    }

    fn is_local_type(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|declaration| {
            matches!(
                declaration.kind,
                DeclarationKind::Struct | DeclarationKind::Enum | DeclarationKind::TypeAlias
            )
        })
    }

    pub fn shape_of(&self, ty: &syn::Type) -> TypeShape {
        TypeShape::from_syn(ty, &|name| self.is_local_type(name))
    }

    /// Struct declared in this package under `name`.
    pub fn struct_named(&self, name: &str) -> Option<(&SourceDeclaration, &syn::ItemStruct)> {
        let declaration = self.lookup(name)?;
        match &declaration.item {
            syn::Item::Struct(item) => Some((declaration, item)),
            _ => None,
        }
    }

    /// Top-level constants whose declared type is `type_name`, in source order.
    pub fn constants_of(&self, type_name: &str) -> Vec<(&SourceDeclaration, &syn::ItemConst)> {
        self.declarations
            .iter()
            .filter_map(|declaration| match &declaration.item {
                syn::Item::Const(item) if matches!(self.shape_of(&item.ty), TypeShape::Named(ref name) if name == type_name) => {
                    Some((declaration, item))
                }
                _ => None,
            })
            .collect()
    }

    /// Follow aliases, newtypes and pointers down to a semantic category.
    pub fn resolve(&self, shape: &TypeShape) -> Result<SemanticType, ResolveError> {
        let mut chain = Vec::new();
        self.resolve_inner(shape, &mut chain, 0)
            .map_err(|()| ResolveError { chain })
    }

    fn resolve_inner(&self, shape: &TypeShape, chain: &mut Vec<String>, depth: usize) -> Result<SemanticType, ()> {
        if depth > MAX_RESOLVE_DEPTH {
            chain.push(CYCLE.to_string());
            return Err(());
        }
        match shape {
            TypeShape::Primitive(kind) => Ok((*kind).into()),
            TypeShape::Pointer(_, inner) => {
                chain.push("pointer".to_string());
                self.resolve_inner(inner, chain, depth + 1)
            }
            TypeShape::Array(inner) => {
                // an unresolvable element leaves the array untyped, a cycle through it does not
                let mut element_chain = Vec::new();
                match self.resolve_inner(inner, &mut element_chain, depth + 1) {
                    Ok(element) => Ok(SemanticType::Array(Some(Box::new(element)))),
                    Err(()) if element_chain.last().is_some_and(|link| link == CYCLE) => {
                        chain.push("array".to_string());
                        chain.append(&mut element_chain);
                        Err(())
                    }
                    Err(()) => Ok(SemanticType::Array(None)),
                }
            }
            TypeShape::Map(_, _) => Ok(SemanticType::Object("map".to_string())),
            TypeShape::Named(name) => {
                chain.push(name.clone());
                let Some(declaration) = self.lookup(name) else {
                    return Err(());
                };
                match &declaration.item {
                    syn::Item::Type(alias) => self.resolve_inner(&self.shape_of(&alias.ty), chain, depth + 1),
                    syn::Item::Struct(item) => match &item.fields {
                        syn::Fields::Unnamed(fields) if fields.unnamed.len() == 1 => {
                            let inner = &fields.unnamed[0].ty;
                            self.resolve_inner(&self.shape_of(inner), chain, depth + 1)
                        }
                        _ => Ok(SemanticType::Object(name.clone())),
                    },
                    syn::Item::Enum(_) => Ok(SemanticType::Object(name.clone())),
                    _ => Err(()),
                }
            }
            TypeShape::Tuple(items) => {
                chain.push(if items.is_empty() { "()".to_string() } else { "tuple".to_string() });
                Err(())
            }
            TypeShape::External(path) | TypeShape::Unsupported(path) => {
                chain.push(path.clone());
                Err(())
            }
        }
    }
}
