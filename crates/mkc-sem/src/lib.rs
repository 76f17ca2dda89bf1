//! mkc-sem - Semantic analysis for `.mk` programs.
//!
//! Validates a parsed [`Program`](mkc_par::Program) against the language's
//! type-and-effect discipline:
//!
//! - **Symbol resolution** over a stack of lexical scopes rooted at the
//!   prelude; shadowing is forbidden everywhere (E2006)
//! - **Type checking** with structural equality, no coercions, and no
//!   subtyping
//! - **Effect checking**: each function's declared effect set is the exact
//!   upper bound of what its body may use; lambdas are always pure
//! - **Pattern exhaustiveness** over tagged unions
//! - **Totality**: non-Unit functions must produce a value on every path
//!
//! Analysis reports into the shared [`Handler`](mkc_util::Handler) and
//! never throws; downstream phases run only when the handler is clean.

mod analysis;
mod context;
mod prelude;
mod scope;
mod types;

pub use analysis::SemanticAnalyzer;
pub use context::{CtorInfo, RecordInfo, TypeContext, UnionInfo};
pub use prelude::{load_prelude, HOST_EFFECTS};
pub use scope::{SymbolEntry, SymbolKind, SymbolTable};
pub use types::{EffectSet, FnType, Type};

use mkc_par::Program;
use mkc_util::Handler;

/// Run semantic analysis over a translation unit. Returns the clean flag
/// plus the collected type shapes (consumed by the generators).
pub fn analyze(program: &Program, handler: &Handler) -> (bool, TypeContext) {
    let mut analyzer = SemanticAnalyzer::new(handler);
    let clean = analyzer.analyze(program);
    (clean, analyzer.into_context())
}
