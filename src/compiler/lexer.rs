use super::ast::{LineInfo, Token};
use super::error::CompileError;
use super::splitter::split_word;

/// Tokenize a whole source into logical lines.
pub fn lex(source: &str) -> Result<Vec<LineInfo>, CompileError> {
    Lexer::new(source).collect()
}

/// Produces one [`LineInfo`] per call. A logical line ends at `;` (outside
/// parentheses), `{`, `}`, the line feed of a preprocessor line, or the end of
/// input.
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    paren_depth: usize,
    failed: bool,
}

/// Accumulator for the logical line being built.
struct PendingLine {
    texts: Vec<String>,
    word: String,
    first_line: Option<usize>,
}

impl PendingLine {
    fn new() -> Self {
        Self {
            texts: Vec::new(),
            word: String::new(),
            first_line: None,
        }
    }

    fn mark(&mut self, line: usize) {
        self.first_line.get_or_insert(line);
    }

    fn push_char(&mut self, c: char, line: usize) {
        self.mark(line);
        self.word.push(c);
    }

    fn flush(&mut self) {
        if !self.word.is_empty() {
            let raw = std::mem::take(&mut self.word);
            self.texts.extend(split_word(&raw));
        }
    }

    fn emit(&mut self, text: impl Into<String>, line: usize) {
        self.flush();
        self.mark(line);
        self.texts.push(text.into());
    }

    fn first_text(&self) -> Option<&str> {
        self.texts.first().map(String::as_str)
    }

    fn is_preprocessor(&self) -> bool {
        self.first_text().is_some_and(|t| t.starts_with('#'))
    }

    /// `true` once the line is known to start with an include directive. The
    /// directive may still be sitting in the unsplit word.
    fn is_include(&self) -> bool {
        let first = match self.first_text() {
            Some(text) => text,
            None => self.word.as_str(),
        };
        first == "#include" || first == "#include_once"
    }

    fn finish(self) -> Option<LineInfo> {
        let line = self.first_line?;
        if self.texts.is_empty() {
            return None;
        }
        let mut info = LineInfo::new(line);
        info.tokens = self.texts.into_iter().map(|t| Token::new(t, line)).collect();
        Some(info)
    }
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            paren_depth: 0,
            failed: false,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Read the next logical line, or `None` at the end of input.
    pub fn next_line(&mut self) -> Result<Option<LineInfo>, CompileError> {
        let mut pending = PendingLine::new();

        while let Some(c) = self.peek_at(0) {
            match c {
                ' ' | '\t' | '\r' => {
                    pending.flush();
                    self.pos += 1;
                }
                '\n' => {
                    pending.flush();
                    self.pos += 1;
                    self.line += 1;
                    if pending.is_preprocessor() {
                        if pending.texts.last().is_some_and(|t| t == "\\") {
                            pending.texts.pop();
                        } else {
                            break;
                        }
                    }
                }
                '/' if self.peek_at(1) == Some('/') => {
                    pending.flush();
                    while self.peek_at(0).is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                '/' if self.peek_at(1) == Some('*') => {
                    pending.flush();
                    self.skip_block_comment()?;
                }
                '"' | '\'' => {
                    let start_line = self.line;
                    let literal = self.read_string(c)?;
                    pending.emit(literal, start_line);
                }
                ';' => {
                    pending.emit(";", self.line);
                    self.pos += 1;
                    if self.paren_depth == 0 {
                        break;
                    }
                }
                '{' | '}' => {
                    pending.emit(c, self.line);
                    self.pos += 1;
                    break;
                }
                '(' => {
                    pending.emit("(", self.line);
                    self.paren_depth += 1;
                    self.pos += 1;
                }
                ')' => {
                    if self.paren_depth == 0 {
                        return Err(self.fail(CompileError::lexer("Mismatched parenthesis: unexpected ')'", self.line)));
                    }
                    pending.emit(")", self.line);
                    self.paren_depth -= 1;
                    self.pos += 1;
                }
                '@' | ',' | '~' | '?' | '\\' | '[' | ']' => {
                    pending.emit(c, self.line);
                    self.pos += 1;
                }
                '<' if pending.is_include() => {
                    let start_line = self.line;
                    let name = self.read_include_name()?;
                    pending.emit(format!("\"{name}\""), start_line);
                }
                _ => {
                    pending.push_char(c, self.line);
                    self.pos += 1;
                }
            }
        }
        pending.flush();

        if self.peek_at(0).is_none() && self.paren_depth > 0 {
            return Err(self.fail(CompileError::lexer(
                "Premature end of input: unclosed parenthesis",
                self.line,
            )));
        }

        let info = pending.finish();
        if let Some(info) = &info {
            tracing::trace!(line = info.line, tokens = %info, "lexed line");
        }
        Ok(info)
    }

    fn fail(&mut self, err: CompileError) -> CompileError {
        self.failed = true;
        err
    }

    fn skip_block_comment(&mut self) -> Result<(), CompileError> {
        self.pos += 2;
        loop {
            match self.peek_at(0) {
                None => {
                    return Err(self.fail(CompileError::lexer(
                        "Premature end of input: unterminated block comment",
                        self.line,
                    )));
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.pos += 2;
                    return Ok(());
                }
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    self.pos += 1;
                }
            }
        }
    }

    /// Read a quoted literal, keeping the quotes and any escapes as written.
    fn read_string(&mut self, quote: char) -> Result<String, CompileError> {
        let mut text = String::from(quote);
        self.pos += 1;
        loop {
            let Some(c) = self.peek_at(0) else {
                return Err(self.fail(CompileError::lexer("Unterminated string literal", self.line)));
            };
            self.pos += 1;
            text.push(c);
            if c == '\n' {
                self.line += 1;
            }
            if c == '\\' {
                let Some(escaped) = self.peek_at(0) else {
                    return Err(self.fail(CompileError::lexer("Unterminated string literal", self.line)));
                };
                self.pos += 1;
                text.push(escaped);
                if escaped == '\n' {
                    self.line += 1;
                }
            } else if c == quote {
                return Ok(text);
            }
        }
    }

    /// `#include <name>`: everything up to the closing `>`.
    fn read_include_name(&mut self) -> Result<String, CompileError> {
        self.pos += 1;
        let mut name = String::new();
        loop {
            match self.peek_at(0) {
                Some('>') => {
                    self.pos += 1;
                    return Ok(name);
                }
                Some('\n') | None => {
                    return Err(self.fail(CompileError::lexer("Unterminated include name", self.line)));
                }
                Some(c) => {
                    name.push(c);
                    self.pos += 1;
                }
            }
        }
    }
}

impl Iterator for Lexer {
    type Item = Result<LineInfo, CompileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.next_line().transpose()
    }
}
