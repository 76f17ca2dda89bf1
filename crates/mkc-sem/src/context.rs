//! Declared-type context: the shapes behind named types.
//!
//! The symbol table answers "is `Shape` a type"; this context answers
//! "what are `Shape`'s constructors and their field types". Exhaustiveness
//! checking, pattern binding, and OpenAPI schema derivation all read it.

use crate::types::Type;
use mkc_util::Symbol;
use rustc_hash::FxHashMap;

/// One constructor of a union, with resolved field types.
#[derive(Clone, Debug)]
pub struct CtorInfo {
    pub name: Symbol,
    /// Labeled fields in declaration order
    pub fields: Vec<(Symbol, Type)>,
}

/// A tagged union: its ordered constructor list.
#[derive(Clone, Debug, Default)]
pub struct UnionInfo {
    pub ctors: Vec<CtorInfo>,
}

impl UnionInfo {
    pub fn ctor(&self, name: Symbol) -> Option<&CtorInfo> {
        self.ctors.iter().find(|c| c.name == name)
    }

    pub fn ctor_names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.ctors.iter().map(|c| c.name)
    }
}

/// A record: labeled fields in declaration order.
#[derive(Clone, Debug, Default)]
pub struct RecordInfo {
    pub fields: Vec<(Symbol, Type)>,
}

impl RecordInfo {
    pub fn field(&self, name: Symbol) -> Option<&Type> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, t)| t)
    }
}

/// All union and record shapes visible to one translation unit.
#[derive(Debug, Default)]
pub struct TypeContext {
    unions: FxHashMap<Symbol, UnionInfo>,
    records: FxHashMap<Symbol, RecordInfo>,
}

impl TypeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_union(&mut self, name: Symbol, info: UnionInfo) {
        self.unions.insert(name, info);
    }

    pub fn insert_record(&mut self, name: Symbol, info: RecordInfo) {
        self.records.insert(name, info);
    }

    pub fn union(&self, name: Symbol) -> Option<&UnionInfo> {
        self.unions.get(&name)
    }

    pub fn record(&self, name: Symbol) -> Option<&RecordInfo> {
        self.records.get(&name)
    }

    /// The union info behind a scrutinee type, if it is a tagged union.
    pub fn union_of(&self, ty: &Type) -> Option<&UnionInfo> {
        self.union(ty.head_name()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::intern(s)
    }

    #[test]
    fn union_lookup_by_scrutinee_type() {
        let mut context = TypeContext::new();
        context.insert_union(
            sym("Shape"),
            UnionInfo {
                ctors: vec![
                    CtorInfo {
                        name: sym("Circle"),
                        fields: vec![(sym("radius"), Type::INT)],
                    },
                    CtorInfo {
                        name: sym("Point"),
                        fields: vec![],
                    },
                ],
            },
        );

        let named = Type::Named(sym("Shape"));
        let info = context.union_of(&named).unwrap();
        assert_eq!(info.ctors.len(), 2);
        assert!(info.ctor(sym("Circle")).is_some());
        assert!(info.ctor(sym("Triangle")).is_none());

        assert!(context.union_of(&Type::INT).is_none());
    }

    #[test]
    fn record_field_lookup() {
        let mut context = TypeContext::new();
        context.insert_record(
            sym("User"),
            RecordInfo {
                fields: vec![(sym("id"), Type::INT), (sym("name"), Type::STRING)],
            },
        );
        let record = context.record(sym("User")).unwrap();
        assert!(record.field(sym("id")).unwrap().equals(&Type::INT));
        assert!(record.field(sym("email")).is_none());
    }
}
