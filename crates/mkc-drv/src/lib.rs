//! mkc-drv - Compiler driver.
//!
//! Orchestrates the pipeline: read the input file, lex, parse, resolve the
//! import closure (with cycle detection), run semantic analysis, then hand
//! the validated AST to the requested sinks (JS emitter, OpenAPI
//! generator, or the formatter in format mode).
//!
//! Each phase either produces its output or accumulates diagnostics;
//! later phases run only when everything upstream came back clean. The
//! driver is the only component that performs I/O.

use mkc_gen::{emit_js, format_program, openapi_json};
use mkc_lex::Lexer;
use mkc_mod::ModuleResolver;
use mkc_par::{Parser, Program};
use mkc_util::{Diagnostic, DiagnosticCode, Handler, SourceMap, Span, MAX_SOURCE_BYTES};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What the invocation should produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Full pipeline: emit the target program (and OpenAPI if requested)
    Compile,
    /// Stop after semantic analysis; succeed silently
    Check,
    /// Re-emit canonical source on stdout; do not compile
    Format,
}

/// Driver configuration, assembled from the command line.
#[derive(Debug)]
pub struct Options {
    pub input: PathBuf,
    /// Emitted target path; defaults to the input with its extension
    /// replaced by `.js`
    pub output: Option<PathBuf>,
    /// OpenAPI output path; omitted means no OpenAPI document
    pub openapi: Option<PathBuf>,
    pub mode: Mode,
    pub verbose: bool,
}

/// Driver-level failures. Diagnostics from the pipeline are rendered to
/// stderr before `Failed` is returned.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("cannot read input file `{path}`: {source}")]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write output file `{path}`: {source}")]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("compilation failed with {count} error(s)")]
    Failed { count: usize },
}

/// Run one compiler invocation.
pub fn run(options: &Options) -> Result<(), DriverError> {
    info!(input = %options.input.display(), mode = ?options.mode, "mkc");

    let source = std::fs::read_to_string(&options.input).map_err(|source| {
        DriverError::ReadInput {
            path: options.input.clone(),
            source,
        }
    })?;

    let mut sources = SourceMap::new();
    let handler = Handler::new();
    let file_id = sources.add_file(options.input.display().to_string(), source.clone());

    if source.len() > MAX_SOURCE_BYTES {
        handler.emit(Diagnostic::error(
            DiagnosticCode::E8001,
            format!(
                "source file exceeds the {} MiB limit",
                MAX_SOURCE_BYTES / (1024 * 1024)
            ),
            Span::point(1, 1).with_file_id(file_id),
        ));
        return fail(&handler, &sources);
    }

    // Lex + parse.
    debug!("phase: lex/parse");
    let tokens = Lexer::new(&source, file_id, &handler).tokenize();
    let program = Parser::new(tokens, &handler).parse();
    if handler.has_errors() {
        return fail(&handler, &sources);
    }

    // Format mode is parse-only by design.
    if options.mode == Mode::Format {
        print!("{}", format_program(&program));
        return Ok(());
    }

    // Module resolution and cycle detection over the full import closure.
    debug!("phase: module resolution");
    let base = options
        .input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    let entry_name = options
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string());
    let mut resolver = ModuleResolver::new(base, &handler);
    resolver.process(&entry_name, &program, &mut sources);
    if handler.has_errors() {
        return fail(&handler, &sources);
    }

    // Semantic analysis.
    debug!("phase: semantic analysis");
    mkc_sem::analyze(&program, &handler);
    if handler.has_errors() {
        return fail(&handler, &sources);
    }

    if options.mode == Mode::Check {
        println!("✓ Type check passed");
        return Ok(());
    }

    // Emission.
    debug!("phase: code emission");
    let output_path = options
        .output
        .clone()
        .unwrap_or_else(|| options.input.with_extension("js"));
    let source_name = options
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| options.input.display().to_string());

    let js = emit_js(&program, &source_name);
    write_output(&output_path, &js)?;
    if options.verbose {
        println!("✓ Generated {}", output_path.display());
    }

    if let Some(openapi_path) = &options.openapi {
        let json = generate_openapi(&program);
        write_output(openapi_path, &json)?;
        if options.verbose {
            println!("✓ Generated OpenAPI spec: {}", openapi_path.display());
        }
    }

    Ok(())
}

/// The OpenAPI document for an already-validated program.
pub fn generate_openapi(program: &Program) -> String {
    openapi_json(program)
}

fn write_output(path: &Path, content: &str) -> Result<(), DriverError> {
    std::fs::write(path, content).map_err(|source| DriverError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}

/// Render all collected diagnostics to stderr and return `Failed`.
fn fail(handler: &Handler, sources: &SourceMap) -> Result<(), DriverError> {
    let diagnostics = handler.diagnostics();
    let count = handler.error_count();
    eprintln!("Compilation failed with {count} error(s):");
    for diagnostic in &diagnostics {
        eprintln!("  {}", diagnostic.render(sources));
    }
    Err(DriverError::Failed { count })
}
