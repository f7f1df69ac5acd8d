//! Symbol tables: one scope per lexical region, arranged as a tree of
//! lookup-only parent links, never used for upward mutation.

use cvm_util::{define_idx, Symbol as Interned};

define_idx! {
    /// Index into the scope arena.
    pub struct ScopeId;
}

define_idx! {
    /// Index into the symbol arena.
    pub struct SymbolId;
}

/// What a [`Symbol`] binds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Constant,
    Function,
    Argument,
    Variable,
}

/// A named binding. `local_index` is assigned per-kind within its owning
/// scope, dense from 0. `address` and `arg_count` are only meaningful for
/// `Function` symbols, and `address` starts unresolved — the generator
/// fills it in once the function's entry word is known.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: Interned,
    pub kind: SymbolKind,
    pub local_index: u32,
    pub scope: ScopeId,
    pub address: Option<i32>,
    pub arg_count: Option<u32>,
}

/// A lexical scope: a display name, its own symbols in declaration order,
/// a parent link (`None` only for the root), and its child scopes.
#[derive(Clone, Debug)]
pub struct Scope {
    pub name: String,
    pub symbols: Vec<SymbolId>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
}

/// Failure to add a [`Symbol`] to a [`Scope`]: a name collision within one
/// scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlreadyDefined;

impl Scope {
    fn new(name: String, parent: Option<ScopeId>) -> Self {
        Self {
            name,
            symbols: Vec::new(),
            parent,
            children: Vec::new(),
        }
    }
}

/// The scope arena plus the symbol arena it indexes into. Owned by the
/// parser, then moved into the generator for traversal (the generator
/// writes function addresses back into `symbols`, so ownership transfer is
/// total, not a shared borrow).
#[derive(Clone, Debug, Default)]
pub struct ScopeTree {
    scopes: cvm_util::IndexVec<ScopeId, Scope>,
    symbols: cvm_util::IndexVec<SymbolId, Symbol>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the root scope. Must be called exactly once, before any
    /// other scope.
    pub fn new_root(&mut self) -> ScopeId {
        self.scopes.push(Scope::new("module".to_string(), None))
    }

    /// Create a child of `parent`, linking it into `parent.children`.
    pub fn new_child(&mut self, parent: ScopeId, name: String) -> ScopeId {
        let id = self.scopes.push(Scope::new(name, Some(parent)));
        self.scopes[parent].children.push(id);
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id]
    }

    /// Register `name` as a symbol of `kind` in `scope`, assigning the
    /// next dense `local_index` for that kind. Fails if `name` already
    /// names a symbol directly in `scope` (shadowing an outer scope is
    /// fine; only same-scope collisions are rejected).
    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: Interned,
        kind: SymbolKind,
        arg_count: Option<u32>,
    ) -> Result<SymbolId, AlreadyDefined> {
        if self.lookup_local(scope, name).is_some() {
            return Err(AlreadyDefined);
        }
        let local_index = self
            .scopes[scope]
            .symbols
            .iter()
            .filter(|&&s| self.symbols[s].kind == kind)
            .count() as u32;
        let id = self.symbols.push(Symbol {
            name,
            kind,
            local_index,
            scope,
            address: None,
            arg_count,
        });
        self.scopes[scope].symbols.push(id);
        Ok(id)
    }

    fn lookup_local(&self, scope: ScopeId, name: Interned) -> Option<SymbolId> {
        self.scopes[scope]
            .symbols
            .iter()
            .copied()
            .find(|&s| self.symbols[s].name == name)
    }

    /// Walk `scope` and its ancestors, returning the first symbol named
    /// `name`.
    pub fn lookup(&self, scope: ScopeId, name: Interned) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(found) = self.lookup_local(s, name) {
                return Some(found);
            }
            current = self.scopes[s].parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvm_util::Symbol as Interned;

    #[test]
    fn duplicate_name_in_same_scope_is_rejected() {
        let mut tree = ScopeTree::new();
        let root = tree.new_root();
        let x = Interned::intern("x");
        tree.declare(root, x, SymbolKind::Variable, None).unwrap();
        assert!(tree.declare(root, x, SymbolKind::Variable, None).is_err());
    }

    #[test]
    fn local_index_is_dense_per_kind() {
        let mut tree = ScopeTree::new();
        let root = tree.new_root();
        let a = tree
            .declare(root, Interned::intern("a"), SymbolKind::Variable, None)
            .unwrap();
        let b = tree
            .declare(root, Interned::intern("b"), SymbolKind::Variable, None)
            .unwrap();
        let f = tree
            .declare(root, Interned::intern("f"), SymbolKind::Function, Some(0))
            .unwrap();
        assert_eq!(tree.symbol(a).local_index, 0);
        assert_eq!(tree.symbol(b).local_index, 1);
        assert_eq!(tree.symbol(f).local_index, 0);
    }

    #[test]
    fn lookup_walks_up_to_parent() {
        let mut tree = ScopeTree::new();
        let root = tree.new_root();
        let outer = Interned::intern("outer");
        tree.declare(root, outer, SymbolKind::Variable, None)
            .unwrap();
        let child = tree.new_child(root, "block0".to_string());
        assert_eq!(tree.lookup(child, outer), tree.lookup(root, outer));
    }

    #[test]
    fn shadowing_in_a_child_scope_is_allowed() {
        let mut tree = ScopeTree::new();
        let root = tree.new_root();
        let name = Interned::intern("x");
        tree.declare(root, name, SymbolKind::Variable, None)
            .unwrap();
        let child = tree.new_child(root, "block0".to_string());
        assert!(tree.declare(child, name, SymbolKind::Variable, None).is_ok());
    }

    // Testable Properties 2 and 3: scope uniqueness and dense per-kind
    // indexing, checked against randomly generated declaration sequences
    // rather than one hand-picked example each.
    mod props {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        fn kind_strategy() -> impl Strategy<Value = SymbolKind> {
            prop_oneof![
                Just(SymbolKind::Constant),
                Just(SymbolKind::Function),
                Just(SymbolKind::Argument),
                Just(SymbolKind::Variable),
            ]
        }

        proptest! {
            #[test]
            fn distinct_names_stay_unique_and_dense_per_kind(
                names in prop::collection::hash_set("[a-z][a-z0-9]{0,5}", 1..16),
                kinds in prop::collection::vec(kind_strategy(), 16),
            ) {
                let mut tree = ScopeTree::new();
                let root = tree.new_root();
                for (i, name) in names.iter().enumerate() {
                    let kind = kinds[i % kinds.len()];
                    let arg_count = (kind == SymbolKind::Function).then_some(0);
                    tree.declare(root, Interned::intern(name), kind, arg_count)
                        .expect("a name unique within the scope always declares cleanly");
                }

                // Property 2: scope uniqueness.
                let mut seen = HashSet::new();
                for &s in &tree.scope(root).symbols {
                    prop_assert!(seen.insert(tree.symbol(s).name));
                }

                // Property 3: dense indexing, {0, .., k-1} per kind.
                for kind in [
                    SymbolKind::Constant,
                    SymbolKind::Function,
                    SymbolKind::Argument,
                    SymbolKind::Variable,
                ] {
                    let mut indices: Vec<u32> = tree
                        .scope(root)
                        .symbols
                        .iter()
                        .map(|&s| tree.symbol(s))
                        .filter(|sym| sym.kind == kind)
                        .map(|sym| sym.local_index)
                        .collect();
                    indices.sort_unstable();
                    let expected: Vec<u32> = (0..indices.len() as u32).collect();
                    prop_assert_eq!(indices, expected);
                }
            }

            #[test]
            fn redeclaring_the_same_name_in_one_scope_always_fails(name in "[a-z][a-z0-9]{0,5}") {
                let mut tree = ScopeTree::new();
                let root = tree.new_root();
                let interned = Interned::intern(&name);
                tree.declare(root, interned, SymbolKind::Variable, None).unwrap();
                prop_assert!(tree.declare(root, interned, SymbolKind::Variable, None).is_err());
            }
        }
    }
}
