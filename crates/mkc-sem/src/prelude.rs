//! The prelude: built-in names seeded into the global scope before any
//! module is analyzed.
//!
//! Seeds the primitive types (`Int`, `Bool`, `String`, `Unit`), the
//! generic type constructors (`Option<T>`, `Result<T, E>`, `List<T>`,
//! `Map<K, V>`), the `Option`/`Result` constructors (`some`, `none`,
//! `ok`, `err`), and the eight host effect capabilities from the runtime
//! contract (`time`, `random`, `http`, `log`, `fs`, `crypto`, `env`,
//! `sys`).

use crate::context::{CtorInfo, TypeContext, UnionInfo};
use crate::scope::{SymbolKind, SymbolTable};
use crate::types::{EffectSet, FnType, Type};
use mkc_par::ast::PrimitiveType;
use mkc_util::{Span, Symbol};

/// Host capabilities that exist without a source-level `effect`
/// declaration. These mirror the runtime's effect object.
pub const HOST_EFFECTS: [&str; 8] = [
    "time", "random", "http", "log", "fs", "crypto", "env", "sys",
];

/// Seed the root scope and type context. Must run exactly once, before
/// any module is analyzed.
pub fn load_prelude(table: &mut SymbolTable, context: &mut TypeContext) {
    let declare = |table: &mut SymbolTable, name: &str, kind: SymbolKind, ty: Option<Type>| {
        table
            .declare(Symbol::intern(name), kind, ty, Span::DUMMY)
            .expect("prelude names are distinct");
    };

    // Primitive types
    for prim in [
        PrimitiveType::Int,
        PrimitiveType::Bool,
        PrimitiveType::String,
        PrimitiveType::Unit,
    ] {
        declare(
            table,
            prim.as_str(),
            SymbolKind::Type,
            Some(Type::Primitive(prim)),
        );
    }

    // Generic type constructors
    for name in ["Option", "Result", "List", "Map"] {
        declare(table, name, SymbolKind::Type, None);
    }

    // Option<T>: some(value: T) | none
    let option = Symbol::intern("Option");
    let option_ty = Type::Generic {
        name: option,
        args: vec![Type::Unknown],
    };
    declare(
        table,
        "some",
        SymbolKind::Constructor,
        Some(Type::Function(FnType {
            params: vec![Type::Unknown],
            ret: Box::new(option_ty.clone()),
            effects: EffectSet::new(),
        })),
    );
    declare(table, "none", SymbolKind::Constructor, Some(option_ty));
    context.insert_union(
        option,
        UnionInfo {
            ctors: vec![
                CtorInfo {
                    name: Symbol::intern("some"),
                    fields: vec![(Symbol::intern("value"), Type::Unknown)],
                },
                CtorInfo {
                    name: Symbol::intern("none"),
                    fields: vec![],
                },
            ],
        },
    );

    // Result<T, E>: ok(value: T) | err(error: E)
    let result = Symbol::intern("Result");
    let result_ty = Type::Generic {
        name: result,
        args: vec![Type::Unknown, Type::Unknown],
    };
    declare(
        table,
        "ok",
        SymbolKind::Constructor,
        Some(Type::Function(FnType {
            params: vec![Type::Unknown],
            ret: Box::new(result_ty.clone()),
            effects: EffectSet::new(),
        })),
    );
    declare(
        table,
        "err",
        SymbolKind::Constructor,
        Some(Type::Function(FnType {
            params: vec![Type::Unknown],
            ret: Box::new(result_ty),
            effects: EffectSet::new(),
        })),
    );
    context.insert_union(
        result,
        UnionInfo {
            ctors: vec![
                CtorInfo {
                    name: Symbol::intern("ok"),
                    fields: vec![(Symbol::intern("value"), Type::Unknown)],
                },
                CtorInfo {
                    name: Symbol::intern("err"),
                    fields: vec![(Symbol::intern("error"), Type::Unknown)],
                },
            ],
        },
    );

    // Host effect capabilities
    for effect in HOST_EFFECTS {
        declare(table, effect, SymbolKind::Effect, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded() -> (SymbolTable, TypeContext) {
        let mut table = SymbolTable::new();
        let mut context = TypeContext::new();
        load_prelude(&mut table, &mut context);
        (table, context)
    }

    #[test]
    fn primitive_types_are_seeded() {
        let (table, _) = loaded();
        for name in ["Int", "Bool", "String", "Unit"] {
            let entry = table.resolve(Symbol::intern(name)).unwrap();
            assert_eq!(entry.kind, SymbolKind::Type);
        }
    }

    #[test]
    fn option_and_result_constructors_are_callable() {
        let (table, _) = loaded();
        let some = table.resolve(Symbol::intern("some")).unwrap();
        assert_eq!(some.kind, SymbolKind::Constructor);
        assert!(matches!(some.ty, Some(Type::Function(_))));

        let none = table.resolve(Symbol::intern("none")).unwrap();
        assert!(matches!(none.ty, Some(Type::Generic { .. })));
    }

    #[test]
    fn option_union_has_exactly_some_and_none() {
        let (_, context) = loaded();
        let info = context.union(Symbol::intern("Option")).unwrap();
        let names: Vec<_> = info.ctor_names().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["some", "none"]);
    }

    #[test]
    fn host_effects_are_predeclared() {
        let (table, _) = loaded();
        for effect in HOST_EFFECTS {
            let entry = table.resolve(Symbol::intern(effect)).unwrap();
            assert_eq!(entry.kind, SymbolKind::Effect, "{effect}");
        }
    }
}
