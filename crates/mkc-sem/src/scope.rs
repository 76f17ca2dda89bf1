//! Symbol table: a stack of lexical scopes.
//!
//! Shadowing is forbidden in all scopes: declaring a name that is visible
//! from the current scope (in any enclosing scope, prelude included) is a
//! hard error. The caller reports E2006 with the span returned in the
//! rejection.
//!
//! The root scope is the prelude; `leave` can never pop it.

use crate::types::Type;
use mkc_util::{Span, Symbol};

/// What a name is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Type,
    Effect,
    Module,
    /// A union constructor; callable when it has fields
    Constructor,
}

/// One declared symbol.
#[derive(Clone, Debug)]
pub struct SymbolEntry {
    pub name: Symbol,
    pub kind: SymbolKind,
    /// Resolved type for value symbols; `None` for types/effects/modules
    pub ty: Option<Type>,
    /// Where the symbol was declared (for diagnostics)
    pub decl_span: Span,
    /// Index of the scope the symbol was defined in
    pub scope_index: usize,
}

/// A single scope: a debug tag plus an ordered sequence of symbols.
#[derive(Debug)]
struct Scope {
    tag: String,
    symbols: Vec<SymbolEntry>,
}

/// Stack of scopes rooted at the prelude scope.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    /// Create a table containing only the (empty) root scope. The caller
    /// seeds the prelude.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                tag: "prelude".to_string(),
                symbols: Vec::new(),
            }],
        }
    }

    /// Push a new scope with a debug tag.
    pub fn enter(&mut self, tag: impl Into<String>) {
        self.scopes.push(Scope {
            tag: tag.into(),
            symbols: Vec::new(),
        });
    }

    /// Pop the current scope. The root scope is never popped.
    pub fn leave(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        } else {
            debug_assert!(false, "attempted to pop the prelude scope");
        }
    }

    /// Current nesting depth (1 = only the prelude).
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Tag of the innermost scope.
    pub fn current_tag(&self) -> &str {
        &self.scopes.last().expect("root scope always present").tag
    }

    /// Declare a symbol in the current scope.
    ///
    /// Fails if the name is already visible from the current scope; the
    /// existing declaration's span is returned so the caller can point at
    /// both sites. The symbol is not inserted on failure.
    pub fn declare(
        &mut self,
        name: Symbol,
        kind: SymbolKind,
        ty: Option<Type>,
        decl_span: Span,
    ) -> Result<(), Span> {
        if let Some(existing) = self.resolve(name) {
            return Err(existing.decl_span);
        }

        let scope_index = self.scopes.len() - 1;
        self.scopes
            .last_mut()
            .expect("root scope always present")
            .symbols
            .push(SymbolEntry {
                name,
                kind,
                ty,
                decl_span,
                scope_index,
            });
        Ok(())
    }

    /// Walk from the current scope outward and return the first match.
    pub fn resolve(&self, name: Symbol) -> Option<&SymbolEntry> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.iter().find(|s| s.name == name))
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    #[test]
    fn declare_then_resolve() {
        let mut table = SymbolTable::new();
        table
            .declare(sym("x"), SymbolKind::Variable, Some(Type::INT), Span::DUMMY)
            .unwrap();
        let entry = table.resolve(sym("x")).unwrap();
        assert_eq!(entry.kind, SymbolKind::Variable);
        assert!(entry.ty.as_ref().unwrap().equals(&Type::INT));
    }

    #[test]
    fn resolve_walks_outward() {
        let mut table = SymbolTable::new();
        table
            .declare(sym("outer"), SymbolKind::Function, None, Span::DUMMY)
            .unwrap();
        table.enter("fn outer");
        table.enter("block");
        assert!(table.resolve(sym("outer")).is_some());
        assert!(table.resolve(sym("missing")).is_none());
    }

    #[test]
    fn shadowing_is_rejected_across_scopes() {
        let mut table = SymbolTable::new();
        let span = Span::new(0, 1, 1, 1);
        table
            .declare(sym("x"), SymbolKind::Variable, Some(Type::INT), span)
            .unwrap();

        table.enter("inner");
        let err = table
            .declare(sym("x"), SymbolKind::Variable, Some(Type::BOOL), Span::DUMMY)
            .unwrap_err();
        assert_eq!(err, span);
        // The failed declaration must not have been inserted.
        assert!(table.resolve(sym("x")).unwrap().ty.as_ref().unwrap().equals(&Type::INT));
    }

    #[test]
    fn shadowing_is_rejected_in_same_scope() {
        let mut table = SymbolTable::new();
        table
            .declare(sym("f"), SymbolKind::Function, None, Span::DUMMY)
            .unwrap();
        assert!(table
            .declare(sym("f"), SymbolKind::Function, None, Span::DUMMY)
            .is_err());
    }

    #[test]
    fn leaving_a_scope_drops_its_symbols() {
        let mut table = SymbolTable::new();
        table.enter("block");
        table
            .declare(sym("tmp"), SymbolKind::Variable, Some(Type::INT), Span::DUMMY)
            .unwrap();
        assert!(table.resolve(sym("tmp")).is_some());
        table.leave();
        assert!(table.resolve(sym("tmp")).is_none());
        // Declaring again after the scope closed is allowed.
        table.enter("block2");
        assert!(table
            .declare(sym("tmp"), SymbolKind::Variable, Some(Type::INT), Span::DUMMY)
            .is_ok());
    }

    #[test]
    fn root_scope_cannot_be_popped() {
        let mut table = SymbolTable::new();
        assert_eq!(table.depth(), 1);
        table.enter("inner");
        table.leave();
        assert_eq!(table.depth(), 1);
        assert_eq!(table.current_tag(), "prelude");
    }
}
