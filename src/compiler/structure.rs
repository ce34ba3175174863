//! Groups the flat lines of a function or event body into nested statement
//! blocks, resolving control-flow headers along the way.

use super::ast::*;
use super::builtins::is_control_keyword;
use super::error::CompileError;
use super::parser::is_identifier;
use super::resolver::Resolver;
use super::source::LineStream;
use super::symbols::CompileState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyContext {
    Function,
    Event,
}

pub struct Structurer<'s, 'l> {
    state: &'s mut CompileState,
    lines: &'s mut LineStream<'l>,
    context: BodyContext,
}

impl<'s, 'l> Structurer<'s, 'l> {
    pub fn new(state: &'s mut CompileState, lines: &'s mut LineStream<'l>, context: BodyContext) -> Self {
        Self { state, lines, context }
    }

    /// Structure a body whose opening `{` ended the header line. The caller
    /// owns the scope holding the parameters; the body shares it.
    pub fn structure_body(&mut self, line: usize) -> Result<Block, CompileError> {
        self.read_block(line)
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn resolver(&self, line: usize) -> Resolver<'_> {
        Resolver::new(self.state.flags(), &*self.state, line)
    }

    fn resolve(&self, tokens: &[Token], line: usize) -> Result<Resolved, CompileError> {
        self.resolver(line).resolve_tokens(tokens)
    }

    /// Statement tokens without the trailing `;`.
    fn strip_semicolon<'t>(tokens: &'t [Token], line: usize) -> Result<&'t [Token], CompileError> {
        match tokens.split_last() {
            Some((last, rest)) if last.is(";") => Ok(rest),
            Some((last, _)) => Err(CompileError::structure(
                format!("Expected ';' at end of statement, found '{}'", last.text),
                line,
            )),
            None => Err(CompileError::structure("Expected a statement", line)),
        }
    }

    /// Read statements until the `}` matching an already-consumed `{`.
    fn read_block(&mut self, line: usize) -> Result<Block, CompileError> {
        let mut block = Block::braced(line);
        loop {
            let Some(next) = self.lines.next_line()? else {
                return Err(CompileError::structure(
                    format!("Unclosed block: end of input before the '}}' for the block opened on line {line}"),
                    self.lines.last_line(),
                ));
            };
            if next.tokens.len() == 1 && next.first_is("}") {
                return Ok(block);
            }
            if next.first_is("else") {
                self.attach_else(&mut block.statements, &next)?;
                continue;
            }
            let statement = self.parse_statement(&next.tokens, next.line, false)?;
            block.statements.push(statement);
        }
    }

    /// Braced block with its own scope.
    fn read_scoped_block(&mut self, line: usize) -> Result<Block, CompileError> {
        self.state.push_scope();
        let block = self.read_block(line)?;
        self.state.pop_scope(line)?;
        Ok(block)
    }

    /// Body of a control statement: a braced block when the rest is `{`,
    /// otherwise the rest of the line as an implicit one-statement block.
    fn parse_body(&mut self, rest: &[Token], line: usize) -> Result<Block, CompileError> {
        match rest {
            [] => Err(CompileError::structure("Missing body after control statement", line)),
            [open] if open.is("{") => self.read_scoped_block(line),
            _ => {
                let statement = self.parse_statement(rest, line, true)?;
                Ok(Block::implicit(statement))
            }
        }
    }

    fn attach_else(&mut self, statements: &mut [Statement], line: &LineInfo) -> Result<(), CompileError> {
        let missing_if = || CompileError::structure("'else' without a matching 'if'", line.line);
        if statements.last_mut().and_then(open_else_slot).is_none() {
            return Err(missing_if());
        }
        let rest = line.tokens.get(1..).unwrap_or_default();
        let block = self.parse_body(rest, line.line)?;
        let slot = statements.last_mut().and_then(open_else_slot).ok_or_else(missing_if)?;
        *slot = Some(block);
        Ok(())
    }

    /// Split `( ... ) rest` after a control keyword into the header tokens
    /// and the rest of the line.
    fn split_header<'t>(
        keyword: &str,
        tokens: &'t [Token],
        line: usize,
    ) -> Result<(&'t [Token], &'t [Token]), CompileError> {
        if !tokens.first().is_some_and(|t| t.is("(")) {
            return Err(CompileError::structure(format!("'{keyword}' must be followed by '('"), line));
        }
        let mut depth = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            match token.text.as_str() {
                "(" | "[" => depth += 1,
                ")" | "]" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok((&tokens[1..i], &tokens[i + 1..]));
                    }
                }
                word if is_control_keyword(word) => {
                    return Err(CompileError::structure(
                        format!("'{word}' is not allowed inside the '{keyword}' header"),
                        line,
                    ));
                }
                _ => {}
            }
        }
        Err(CompileError::structure(format!("Unterminated '{keyword}' header"), line))
    }

    // ── Statements ─────────────────────────────────────────────────

    fn parse_statement(&mut self, tokens: &[Token], line: usize, implicit: bool) -> Result<Statement, CompileError> {
        let Some(first) = tokens.first() else {
            return Err(CompileError::structure("Expected a statement", line));
        };
        let rest = &tokens[1..];
        let kind = match first.text.as_str() {
            "{" if rest.is_empty() => StatementKind::Block {
                block: self.read_scoped_block(line)?,
            },
            "}" => return Err(CompileError::structure("Unexpected '}'", line)),
            ";" if rest.is_empty() => StatementKind::Empty,
            "if" => {
                let (header, rest) = Self::split_header("if", rest, line)?;
                let condition = self.resolve(header, line)?;
                let then_branch = self.parse_body(rest, line)?;
                StatementKind::If {
                    condition,
                    then_branch,
                    else_branch: None,
                }
            }
            "else" => return Err(CompileError::structure("'else' without a matching 'if'", line)),
            "while" => {
                let (header, rest) = Self::split_header("while", rest, line)?;
                let condition = self.resolve(header, line)?;
                let body = self.parse_body(rest, line)?;
                StatementKind::While { condition, body }
            }
            "for" => self.parse_for(rest, line)?,
            "do" => self.parse_do(rest, line)?,
            "return" => {
                let value_tokens = Self::strip_semicolon(rest, line)?;
                let value = if value_tokens.is_empty() {
                    None
                } else {
                    Some(self.resolve(value_tokens, line)?)
                };
                StatementKind::Return { value }
            }
            "state" => {
                if self.context != BodyContext::Event {
                    return Err(CompileError::structure(
                        "State changes are only allowed inside event handlers",
                        line,
                    ));
                }
                StatementKind::StateChange {
                    state: Self::single_name("state", rest, line)?,
                }
            }
            "jump" => StatementKind::Jump {
                label: Self::single_name("jump", rest, line)?,
            },
            "@" => StatementKind::Label {
                label: Self::single_name("@", rest, line)?,
            },
            word if word.starts_with('#') => {
                return Err(CompileError::structure(
                    format!("'{word}' is only allowed at top level"),
                    line,
                ));
            }
            word => match LslType::from_keyword(word) {
                Some(ty) => {
                    if implicit {
                        return Err(CompileError::structure(
                            "A declaration cannot be the body of a control statement; use braces",
                            line,
                        ));
                    }
                    self.parse_declaration(ty, rest, line)?
                }
                None => {
                    let expr_tokens = Self::strip_semicolon(tokens, line)?;
                    StatementKind::Expression {
                        expr: self.resolve(expr_tokens, line)?,
                    }
                }
            },
        };
        Ok(Statement { line, kind })
    }

    /// `keyword name ;`
    fn single_name(keyword: &str, rest: &[Token], line: usize) -> Result<String, CompileError> {
        match rest {
            [name, semi] if semi.is(";") && is_identifier(&name.text) => Ok(name.text.clone()),
            _ => Err(CompileError::structure(format!("Expected '{keyword} <name>;'"), line)),
        }
    }

    fn parse_declaration(&mut self, ty: LslType, rest: &[Token], line: usize) -> Result<StatementKind, CompileError> {
        let body = Self::strip_semicolon(rest, line)?;
        let (name, value) = match body {
            [name] => (name, None),
            [name, eq, init @ ..] if eq.is("=") && !init.is_empty() => (name, Some(self.resolve(init, line)?)),
            _ => {
                return Err(CompileError::declaration(
                    format!("Malformed {ty} declaration"),
                    line,
                ));
            }
        };
        self.state.declare_local(&name.text, ty, line)?;
        tracing::trace!(name = %name.text, %ty, line, "local variable");
        Ok(StatementKind::Declaration {
            ty,
            name: name.text.clone(),
            value,
        })
    }

    fn parse_for(&mut self, rest: &[Token], line: usize) -> Result<StatementKind, CompileError> {
        let (header, rest) = Self::split_header("for", rest, line)?;

        let mut parts: Vec<&[Token]> = Vec::with_capacity(3);
        let mut depth = 0usize;
        let mut start = 0;
        for (i, token) in header.iter().enumerate() {
            match token.text.as_str() {
                "(" | "[" => depth += 1,
                ")" | "]" => depth = depth.saturating_sub(1),
                ";" if depth == 0 => {
                    parts.push(&header[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        parts.push(&header[start..]);
        let [init, condition, step] = parts.as_slice() else {
            return Err(CompileError::structure(
                "'for' header needs three ';'-separated parts",
                line,
            ));
        };

        let resolver = self.resolver(line);
        let init = resolver.resolve_token_list(init)?;
        let condition = if condition.is_empty() {
            None
        } else {
            Some(resolver.resolve_tokens(condition)?)
        };
        let step = resolver.resolve_token_list(step)?;
        let body = self.parse_body(rest, line)?;
        Ok(StatementKind::For {
            init,
            condition,
            step,
            body,
        })
    }

    fn parse_do(&mut self, rest: &[Token], line: usize) -> Result<StatementKind, CompileError> {
        if !matches!(rest, [open] if open.is("{")) {
            return Err(CompileError::structure("'do' must be followed by a braced block", line));
        }
        let body = self.read_scoped_block(line)?;

        let Some(tail) = self.lines.next_line()? else {
            return Err(CompileError::structure("Expected 'while' after 'do' block", line));
        };
        if !tail.first_is("while") {
            return Err(CompileError::structure("Expected 'while' after 'do' block", tail.line));
        }
        let (header, after) = Self::split_header("while", &tail.tokens[1..], tail.line)?;
        if !matches!(after, [semi] if semi.is(";")) {
            return Err(CompileError::structure("Expected ';' after 'do ... while (...)'", tail.line));
        }
        let condition = self.resolve(header, tail.line)?;
        Ok(StatementKind::DoWhile { body, condition })
    }
}

/// The `else` slot an `else` line attaches to: the innermost `if` without an
/// else, reachable through unbraced bodies of `if`, `else`, `while`, and `for`.
fn open_else_slot(statement: &mut Statement) -> Option<&mut Option<Block>> {
    match &mut statement.kind {
        StatementKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            if else_branch.is_some() {
                return else_branch.as_mut().and_then(trailing_else_slot);
            }
            if let Some(inner) = trailing_else_slot(then_branch) {
                return Some(inner);
            }
            Some(else_branch)
        }
        StatementKind::While { body, .. } | StatementKind::For { body, .. } => trailing_else_slot(body),
        _ => None,
    }
}

/// Open `else` slot at the end of an unbraced body. A braced body closes
/// every `if` inside it.
fn trailing_else_slot(block: &mut Block) -> Option<&mut Option<Block>> {
    if block.braced {
        return None;
    }
    block.statements.last_mut().and_then(open_else_slot)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::compiler::error::ErrorKind;
    use crate::compiler::flags::AcceptedFlags;
    use crate::compiler::source::NoIncludes;
    use crate::compiler::value::ConstantValue;

    /// Structure `body` as if its opening brace was just read.
    fn structure(body: &str, context: BodyContext) -> Result<Block, CompileError> {
        let mut state = CompileState::new(AcceptedFlags::DEFAULT_BASELINE);
        let mut lines = LineStream::new(body, &NoIncludes, 4);
        state.push_scope();
        let block = Structurer::new(&mut state, &mut lines, context).structure_body(1)?;
        state.pop_scope(1)?;
        assert_eq!(state.scope_depth(), 0);
        Ok(block)
    }

    fn ok(body: &str) -> Vec<Statement> {
        structure(body, BodyContext::Event).unwrap().statements
    }

    fn err(body: &str) -> CompileError {
        structure(body, BodyContext::Event).unwrap_err()
    }

    #[test]
    fn braced_if_else() {
        let stmts = ok("if (x) { llSay(0, \"a\"); } else { llSay(0, \"b\"); } }");
        assert_eq!(stmts.len(), 1);
        let StatementKind::If { then_branch, else_branch, .. } = &stmts[0].kind else {
            panic!("expected if");
        };
        assert!(then_branch.braced);
        assert!(else_branch.as_ref().unwrap().braced);
    }

    #[test]
    fn implicit_body() {
        let stmts = ok("while (x) x--; }");
        let StatementKind::While { body, .. } = &stmts[0].kind else {
            panic!("expected while");
        };
        assert!(!body.braced);
        assert_eq!(body.statements.len(), 1);
    }

    #[test]
    fn else_if_chain() {
        let stmts = ok("if (a) x = 1; else if (b) x = 2; else x = 3; }");
        assert_eq!(stmts.len(), 1);
        let StatementKind::If { else_branch: Some(outer_else), .. } = &stmts[0].kind else {
            panic!("expected if with else");
        };
        let StatementKind::If { else_branch: inner_else, .. } = &outer_else.statements[0].kind else {
            panic!("expected else-if");
        };
        assert!(inner_else.is_some());
    }

    #[test]
    fn dangling_else_binds_innermost() {
        let stmts = ok("if (a) if (b) x = 1; else x = 2; }");
        let StatementKind::If { then_branch, else_branch, .. } = &stmts[0].kind else {
            panic!("expected if");
        };
        assert!(else_branch.is_none());
        let StatementKind::If { else_branch: inner, .. } = &then_branch.statements[0].kind else {
            panic!("expected nested if");
        };
        assert!(inner.is_some());
    }

    #[test]
    fn else_reaches_into_unbraced_loop_bodies() {
        for source in [
            "while (i) if (i) i--; else i++; }",
            "for (i = 0; i < 3; i++) if (i) x = 1; else x = 2; }",
        ] {
            let stmts = ok(source);
            assert_eq!(stmts.len(), 1, "{source}");
            let (StatementKind::While { body, .. } | StatementKind::For { body, .. }) = &stmts[0].kind else {
                panic!("expected loop in {source}");
            };
            assert!(matches!(
                &body.statements[0].kind,
                StatementKind::If { else_branch: Some(_), .. }
            ));
        }
    }

    #[test]
    fn else_passes_loop_without_open_if() {
        let stmts = ok("if (a) while (b) x = 1; else x = 2; }");
        let StatementKind::If { then_branch, else_branch, .. } = &stmts[0].kind else {
            panic!("expected if");
        };
        assert!(else_branch.is_some());
        assert!(matches!(then_branch.statements[0].kind, StatementKind::While { .. }));
    }

    #[test]
    fn else_reaches_loop_inside_else_branch() {
        let stmts = ok("if (a) x = 1; else while (b) if (c) x = 2; else x = 3; }");
        let StatementKind::If { else_branch: Some(outer_else), .. } = &stmts[0].kind else {
            panic!("expected if with else");
        };
        let StatementKind::While { body, .. } = &outer_else.statements[0].kind else {
            panic!("expected while in else branch");
        };
        assert!(matches!(
            &body.statements[0].kind,
            StatementKind::If { else_branch: Some(_), .. }
        ));
    }

    #[test]
    fn braced_loop_body_closes_its_ifs() {
        let e = err("while (a) { if (b) x = 1; } else x = 2; }");
        assert!(e.message.contains("without a matching 'if'"));
    }

    #[test]
    fn else_without_if() {
        assert!(err("x = 1; else x = 2; }").message.contains("without a matching 'if'"));
    }

    #[test]
    fn for_loop_parts() {
        let stmts = ok("integer i; for (i = 0; i < 10; i++) { } }");
        let StatementKind::For { init, condition, step, body } = &stmts[1].kind else {
            panic!("expected for");
        };
        assert_eq!(init.len(), 1);
        assert!(condition.is_some());
        assert_eq!(step.len(), 1);
        assert!(body.braced);
    }

    #[test]
    fn empty_for_header() {
        let stmts = ok("for (;;) ; }");
        let StatementKind::For { init, condition, step, body } = &stmts[0].kind else {
            panic!("expected for");
        };
        assert!(init.is_empty() && condition.is_none() && step.is_empty());
        assert_eq!(body.statements[0].kind, StatementKind::Empty);
    }

    #[test]
    fn do_while() {
        let stmts = ok("integer n = 3; do { n--; } while (n > 0); }");
        assert!(matches!(stmts[1].kind, StatementKind::DoWhile { .. }));
        assert!(err("do x--; while (x); }").message.contains("braced block"));
    }

    #[test]
    fn header_rules() {
        assert!(err("if x; }").message.contains("must be followed by '('"));
        assert!(err("while (return) x; }").message.contains("not allowed inside"));
    }

    #[test]
    fn locals_fold_and_scope() {
        let stmts = ok("float f = 1 + 2.5; }");
        let StatementKind::Declaration { value: Some(value), .. } = &stmts[0].kind else {
            panic!("expected declaration");
        };
        assert_eq!(value.as_constant(), Some(&ConstantValue::Float(3.5)));

        assert!(err("integer x; integer x; }").message.contains("already defined"));
        assert!(structure("integer x; { integer x; } }", BodyContext::Event).is_ok());
    }

    #[test]
    fn declaration_as_implicit_body_fails() {
        assert!(err("if (a) integer x = 1; }").message.contains("declaration"));
    }

    #[test]
    fn state_change_only_in_events() {
        assert!(matches!(ok("state running; }")[0].kind, StatementKind::StateChange { .. }));
        let e = structure("state running; }", BodyContext::Function).unwrap_err();
        assert_eq!(e.kind, ErrorKind::Structure);
    }

    #[test]
    fn jumps_labels_returns() {
        let stmts = ok("@top; jump top; return; }");
        assert!(matches!(&stmts[0].kind, StatementKind::Label { label } if label == "top"));
        assert!(matches!(&stmts[1].kind, StatementKind::Jump { label } if label == "top"));
        assert!(matches!(stmts[2].kind, StatementKind::Return { value: None }));
    }

    #[test]
    fn unclosed_block() {
        let e = err("if (x) {\n y = 1;\n");
        assert!(e.message.contains("Unclosed block"));
    }

    #[test]
    fn missing_semicolon() {
        assert!(err("llSay(0, \"x\") }").message.contains("Expected ';'"));
    }
}
