#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod ast;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod error;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod value;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod flags;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod splitter;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod lexer;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod builtins;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod parser;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod resolver;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod symbols;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod source;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod structure;
#[allow(
    clippy::indexing_slicing,
    clippy::wildcard_imports,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::single_match_else,
    clippy::needless_pass_by_value,
    clippy::module_name_repetitions,
)]
pub mod scanner;

use std::path::{Path, PathBuf};

use ast::{CompileUnit, LineInfo};
use error::CompileError;
use flags::AcceptedFlags;
use source::{FsLoader, NoIncludes, SourceLoader};

/// Per-unit knobs that do not come from the script itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Flags used when the script carries no recognized `//#!Mode:` directive.
    pub default_flags: AcceptedFlags,
    /// Maximum nesting of `#include` sources.
    pub max_include_depth: usize,
    /// Extra directories searched for includes after the script's own directory.
    pub include_dirs: Vec<PathBuf>,
}

pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 8;

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_flags: AcceptedFlags::DEFAULT_BASELINE,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            include_dirs: Vec::new(),
        }
    }
}

/// Split a source into logical token lines without scanning declarations.
pub fn tokenize(source: &str) -> Result<Vec<LineInfo>, CompileError> {
    lexer::lex(source)
}

/// Run the front end over a source string with includes disabled.
///
/// source → directives → lex → scan declarations → structure bodies →
/// resolve constants → `CompileUnit`
pub fn compile_source(source: &str, options: &CompileOptions) -> Result<CompileUnit, CompileError> {
    compile_with(source, options, &NoIncludes)
}

/// Same as [`compile_source`], resolving `#include` through `loader`.
pub fn compile_with(
    source: &str,
    options: &CompileOptions,
    loader: &dyn SourceLoader,
) -> Result<CompileUnit, CompileError> {
    let unit = scanner::scan(source, options, loader)?;
    tracing::info!(
        globals = unit.globals.len(),
        functions = unit.functions.len(),
        states = unit.states.len(),
        includes = unit.includes.len(),
        "compiled unit"
    );
    Ok(unit)
}

/// Read and compile a script file. Includes are searched next to the file,
/// then in `options.include_dirs`.
pub fn compile_file(path: &Path, options: &CompileOptions) -> Result<CompileUnit, CompileError> {
    let source = std::fs::read_to_string(path).map_err(|e| CompileError::io(&path.display().to_string(), &e))?;
    tracing::info!(file = %path.display(), bytes = source.len(), "compiling");
    let loader = FsLoader::for_file(path, &options.include_dirs);
    compile_with(&source, options, &loader)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use error::ErrorKind;

    #[test]
    fn compile_file_resolves_sibling_includes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("consts.lsl"), "float RATE = 0.5 * 4;").unwrap();
        let main = dir.path().join("main.lsl");
        std::fs::write(&main, "#include \"consts.lsl\"\ndefault { timer() { } }").unwrap();

        let unit = compile_file(&main, &CompileOptions::default()).unwrap();
        assert_eq!(unit.includes, vec!["consts.lsl".to_owned()]);
        assert!(unit.globals["RATE"].value.as_ref().unwrap().is_constant());
    }

    #[test]
    fn compile_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = compile_file(&dir.path().join("absent.lsl"), &CompileOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
    }

    #[test]
    fn includes_disabled_for_plain_sources() {
        let err = compile_source("#include \"x.lsl\"\ndefault { timer() { } }", &CompileOptions::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn configured_baseline_applies_without_directive() {
        let options = CompileOptions {
            default_flags: AcceptedFlags::LSL,
            ..CompileOptions::default()
        };
        let unit = compile_source("default { timer() { } }", &options).unwrap();
        assert_eq!(unit.flags, AcceptedFlags::LSL);
    }
}
