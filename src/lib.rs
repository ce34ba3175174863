pub mod compiler;
pub mod paths;
pub mod settings;

pub use compiler::ast::CompileUnit;
pub use compiler::error::{CompileError, ErrorKind};
pub use compiler::{compile_file, compile_source, compile_with, tokenize, CompileOptions};
