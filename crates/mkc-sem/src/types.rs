//! Semantic type representation.
//!
//! Types are structural over a nominal core: primitives compare by kind,
//! named types by name (after the name resolved to a declaration), generic
//! instantiations by head plus pairwise-equal arguments, and function
//! types by parameter list, result, and effect set. There is no subtyping
//! and no unifier; generic arguments are invariant.
//!
//! [`Type::Unknown`] compares equal to everything. It is produced by
//! positions the checker cannot resolve (`none` with no context, host
//! effect operations, recovery after an error) and exists to stop one
//! mistake from cascading into a page of diagnostics.

use indexmap::IndexSet;
use mkc_par::ast::PrimitiveType;
use mkc_util::Symbol;
use std::fmt;

/// A set of effect names. Insertion order is preserved for rendering;
/// comparison ignores order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectSet {
    names: IndexSet<Symbol>,
}

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_names(names: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Insert a name; returns false if it was already present.
    pub fn insert(&mut self, name: Symbol) -> bool {
        self.names.insert(name)
    }

    pub fn contains(&self, name: Symbol) -> bool {
        self.names.contains(&name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True if every name in `self` is also in `other`.
    pub fn is_subset(&self, other: &EffectSet) -> bool {
        self.names.iter().all(|n| other.names.contains(n))
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.names.iter().copied()
    }
}

impl fmt::Display for EffectSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}")?;
        }
        write!(f, "}}")
    }
}

/// Function type: parameters, result, declared effect set.
#[derive(Clone, Debug, PartialEq)]
pub struct FnType {
    pub params: Vec<Type>,
    pub ret: Box<Type>,
    pub effects: EffectSet,
}

/// A semantic type.
///
/// The derived `PartialEq` is exact structural equality; the checker's
/// notion of equality (with `Unknown` as a wildcard) is [`Type::equals`].
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Primitive(PrimitiveType),
    /// User-declared record or union, by declaration name
    Named(Symbol),
    /// Generic instantiation: `Option<Int>`, `Map<String, Int>`, ...
    Generic { name: Symbol, args: Vec<Type> },
    Function(FnType),
    /// Unresolvable or error-recovery type; equal to everything
    Unknown,
}

impl Type {
    pub const INT: Type = Type::Primitive(PrimitiveType::Int);
    pub const BOOL: Type = Type::Primitive(PrimitiveType::Bool);
    pub const STRING: Type = Type::Primitive(PrimitiveType::String);
    pub const UNIT: Type = Type::Primitive(PrimitiveType::Unit);

    pub fn is_unit(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveType::Unit))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    /// The head name of a named or generic type.
    pub fn head_name(&self) -> Option<Symbol> {
        match self {
            Type::Named(name) => Some(*name),
            Type::Generic { name, .. } => Some(*name),
            _ => None,
        }
    }

    /// Structural equality with `Unknown` as a wildcard.
    pub fn equals(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Unknown, _) | (_, Type::Unknown) => true,
            (Type::Primitive(a), Type::Primitive(b)) => a == b,
            (Type::Named(a), Type::Named(b)) => a == b,
            (
                Type::Generic { name: a, args: xs },
                Type::Generic { name: b, args: ys },
            ) => a == b && xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| x.equals(y)),
            (Type::Function(a), Type::Function(b)) => {
                a.params.len() == b.params.len()
                    && a.params.iter().zip(&b.params).all(|(x, y)| x.equals(y))
                    && a.ret.equals(&b.ret)
                    && a.effects == b.effects
            }
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(prim) => write!(f, "{}", prim.as_str()),
            Type::Named(name) => write!(f, "{name}"),
            Type::Generic { name, args } => {
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            Type::Function(func) => {
                write!(f, "fn(")?;
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") -> {}", func.ret)?;
                if !func.effects.is_empty() {
                    write!(f, " uses {}", func.effects)?;
                }
                Ok(())
            }
            Type::Unknown => write!(f, "_"),
        }
    }
}
