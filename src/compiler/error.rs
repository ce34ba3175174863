use serde::Serialize;

/// A fatal compilation error with the 1-based source line it was raised on.
///
/// There is no error recovery: the first error aborts the whole compile unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("[{}] line {line}: {message}", .kind.label())]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Unterminated literal, mismatched parenthesis, premature end of input.
    Lexer,
    /// Bad identifier, name collision, malformed header, state/event misuse.
    Declaration,
    /// Control-flow header problems, misplaced statements, unclosed blocks.
    Structure,
    /// Malformed expression.
    Syntax,
    /// Unsupported cast, bad angle-bracket arity, operand type mismatch.
    Resolver,
    /// Invariant violation inside the compiler itself.
    Internal,
    /// Source could not be read.
    Io,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Lexer => "lexer",
            ErrorKind::Declaration => "declaration",
            ErrorKind::Structure => "structure",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Resolver => "resolver",
            ErrorKind::Internal => "internal",
            ErrorKind::Io => "io",
        }
    }
}

impl CompileError {
    fn new(kind: ErrorKind, message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
            kind,
        }
    }

    pub fn lexer(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Lexer, message, line)
    }

    pub fn declaration(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Declaration, message, line)
    }

    pub fn structure(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Structure, message, line)
    }

    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Syntax, message, line)
    }

    pub fn resolver(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Resolver, message, line)
    }

    /// An internal compiler defect. Never expected on any input.
    pub fn internal(message: impl Into<String>, line: usize) -> Self {
        Self::new(
            ErrorKind::Internal,
            format!("internal compiler error: {}", message.into()),
            line,
        )
    }

    pub fn io(source_name: &str, err: &std::io::Error) -> Self {
        Self::new(ErrorKind::Io, format!("cannot read '{source_name}': {err}"), 0)
    }

    /// Format the error the way an in-world "compile failed" notice shows it.
    pub fn format_with_file(&self, file: &str) -> String {
        format!("{file}({}): {} error: {}", self.line, self.kind.label(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_line() {
        let err = CompileError::lexer("Unterminated string literal", 7);
        assert_eq!(err.to_string(), "[lexer] line 7: Unterminated string literal");
    }

    #[test]
    fn internal_errors_are_marked() {
        let err = CompileError::internal("scope stack is empty", 3);
        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.message.starts_with("internal compiler error"));
    }

    #[test]
    fn file_format() {
        let err = CompileError::resolver("bad cast", 12);
        assert_eq!(err.format_with_file("door.lsl"), "door.lsl(12): resolver error: bad cast");
    }
}
