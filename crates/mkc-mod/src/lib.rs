//! mkc-mod - Module resolution and the dependency graph.
//!
//! Converts dotted module names to file paths (`a.b.c` becomes
//! `<base>/a/b/c.mk`), loads the full import closure of a translation
//! unit, and rejects cycles. Each resolved module becomes a node in a
//! directed graph; each `import` adds an "importer -> imported" edge.
//! After the closure is enumerated, a depth-first walk with the standard
//! visited/on-stack coloring reports every back-edge as E5004, naming the
//! full cycle path.
//!
//! Missing files are E5001; duplicate `module X { ... }` blocks within a
//! single translation unit are E5002. All resolver state lives for a
//! single compiler invocation.

use indexmap::{IndexMap, IndexSet};
use mkc_lex::Lexer;
use mkc_par::{Parser, Program};
use mkc_util::{
    Diagnostic, DiagnosticCode, Handler, SourceMap, Span, MAX_SOURCE_BYTES,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Map a dotted module name to its source file path.
///
/// # Examples
///
/// ```
/// use mkc_mod::module_file_path;
/// use std::path::Path;
///
/// let path = module_file_path(Path::new("src"), "auth.user");
/// assert_eq!(path, Path::new("src/auth/user.mk"));
/// ```
pub fn module_file_path(base: &Path, dotted: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in dotted.split('.') {
        path.push(segment);
    }
    path.set_extension("mk");
    path
}

/// A module the resolver has seen.
#[derive(Debug)]
pub struct ResolvedModule {
    pub name: String,
    pub path: PathBuf,
    pub exists: bool,
    /// Parsed translation unit; `None` for the entry module (the driver
    /// owns that one) and for missing files.
    pub program: Option<Program>,
}

/// Resolver state for one compiler invocation.
pub struct ModuleResolver<'a> {
    base: PathBuf,
    handler: &'a Handler,
    modules: IndexMap<String, ResolvedModule>,
    /// importer -> (imported -> span of the import declaration)
    edges: IndexMap<String, IndexMap<String, Span>>,
}

impl<'a> ModuleResolver<'a> {
    pub fn new(base: impl Into<PathBuf>, handler: &'a Handler) -> Self {
        Self {
            base: base.into(),
            handler,
            modules: IndexMap::new(),
            edges: IndexMap::new(),
        }
    }

    /// Load the full import closure of the entry translation unit, then
    /// run cycle detection over the complete graph. Returns the clean
    /// flag for this phase.
    pub fn process(
        &mut self,
        entry_name: &str,
        entry_program: &Program,
        sources: &mut SourceMap,
    ) -> bool {
        let errors_before = self.handler.error_count();

        self.modules.insert(
            entry_name.to_string(),
            ResolvedModule {
                name: entry_name.to_string(),
                path: module_file_path(&self.base, entry_name),
                exists: true,
                program: None,
            },
        );

        self.check_duplicate_modules(entry_program);
        self.enqueue_imports(entry_name, entry_program, sources);

        // Cycle detection must see the whole graph before any module in a
        // cycle candidate is analyzed further.
        self.check_cycles();

        self.handler.error_count() == errors_before
    }

    /// Modules discovered so far, in resolution order.
    pub fn modules(&self) -> impl Iterator<Item = &ResolvedModule> {
        self.modules.values()
    }

    /// Duplicate `module X { ... }` blocks in one translation unit.
    fn check_duplicate_modules(&self, program: &Program) {
        let mut seen: IndexSet<String> = IndexSet::new();
        for module in &program.modules {
            if !seen.insert(module.name.joined()) {
                self.handler.emit(Diagnostic::error(
                    DiagnosticCode::E5002,
                    format!("duplicate module `{}`", module.name),
                    module.span,
                ));
            }
        }
    }

    /// Walk a translation unit's imports, resolving and loading each one.
    fn enqueue_imports(&mut self, importer: &str, program: &Program, sources: &mut SourceMap) {
        let imports: Vec<(String, Span)> = program
            .imports()
            .map(|import| (import.path.joined(), import.span))
            .collect();

        for (name, span) in imports {
            self.add_edge(importer, &name, span);
            self.load_module(&name, span, sources);
        }
    }

    fn add_edge(&mut self, importer: &str, imported: &str, span: Span) {
        self.edges
            .entry(importer.to_string())
            .or_default()
            .entry(imported.to_string())
            .or_insert(span);
    }

    /// Resolve one module name: map it to a path, read and parse the
    /// file, and recurse into its imports. Already-seen modules are not
    /// reloaded.
    fn load_module(&mut self, name: &str, span: Span, sources: &mut SourceMap) {
        if self.modules.contains_key(name) {
            return;
        }

        let path = module_file_path(&self.base, name);
        debug!(module = name, path = %path.display(), "resolving module");

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => {
                self.handler.emit(Diagnostic::error(
                    DiagnosticCode::E5001,
                    format!("module `{name}` not found (expected at {})", path.display()),
                    span,
                ));
                self.modules.insert(
                    name.to_string(),
                    ResolvedModule {
                        name: name.to_string(),
                        path,
                        exists: false,
                        program: None,
                    },
                );
                return;
            }
        };

        if content.len() > MAX_SOURCE_BYTES {
            self.handler.emit(Diagnostic::error(
                DiagnosticCode::E8001,
                format!(
                    "source file {} exceeds the {} MiB limit",
                    path.display(),
                    MAX_SOURCE_BYTES / (1024 * 1024)
                ),
                span,
            ));
            return;
        }

        let file_id = sources.add_file(path.display().to_string(), content.clone());
        let tokens = Lexer::new(&content, file_id, self.handler).tokenize();
        let program = Parser::new(tokens, self.handler).parse();

        self.check_duplicate_modules(&program);

        self.modules.insert(
            name.to_string(),
            ResolvedModule {
                name: name.to_string(),
                path,
                exists: true,
                program: None,
            },
        );
        self.enqueue_imports(name, &program, sources);

        if let Some(module) = self.modules.get_mut(name) {
            module.program = Some(program);
        }
    }

    /// Depth-first cycle check from every node. A back-edge (an edge to a
    /// node currently on the stack) is a cycle; the report names the full
    /// cycle path.
    fn check_cycles(&self) {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors: IndexMap<&str, Color> = self
            .modules
            .keys()
            .map(|name| (name.as_str(), Color::White))
            .collect();
        let mut stack: Vec<&str> = Vec::new();

        fn visit<'s>(
            node: &'s str,
            resolver: &'s ModuleResolver<'_>,
            colors: &mut IndexMap<&'s str, Color>,
            stack: &mut Vec<&'s str>,
        ) {
            colors.insert(node, Color::Gray);
            stack.push(node);

            if let Some(deps) = resolver.edges.get(node) {
                for (dep, span) in deps {
                    match colors.get(dep.as_str()).copied() {
                        Some(Color::White) => visit(dep.as_str(), resolver, colors, stack),
                        Some(Color::Gray) => {
                            let start = stack
                                .iter()
                                .position(|n| *n == dep.as_str())
                                .unwrap_or(0);
                            let mut cycle: Vec<&str> = stack[start..].to_vec();
                            cycle.push(dep.as_str());
                            resolver.handler.emit(Diagnostic::error(
                                DiagnosticCode::E5004,
                                format!("circular dependency detected: {}", cycle.join(" -> ")),
                                *span,
                            ));
                        }
                        // Black or unknown (unresolvable) nodes are done.
                        _ => {}
                    }
                }
            }

            stack.pop();
            colors.insert(node, Color::Black);
        }

        let roots: Vec<&str> = colors.keys().copied().collect();
        for root in roots {
            if colors.get(root) == Some(&Color::White) {
                visit(root, self, &mut colors, &mut stack);
            }
        }
    }
}
