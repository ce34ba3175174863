//! Top-level declaration scanner: globals, functions, states, and the event
//! handlers inside them. Bodies are handed to the structurer as soon as their
//! header is read.

use super::ast::*;
use super::builtins::find_event;
use super::error::CompileError;
use super::flags::Directives;
use super::resolver::Resolver;
use super::source::{LineStream, SourceLoader};
use super::structure::{BodyContext, Structurer};
use super::symbols::CompileState;
use super::CompileOptions;

pub fn scan(source: &str, options: &CompileOptions, loader: &dyn SourceLoader) -> Result<CompileUnit, CompileError> {
    let flags = Directives::parse(source).accepted_flags(options.default_flags);
    tracing::debug!(?flags, "accepted dialect flags");
    let mut scanner = Scanner {
        state: CompileState::new(flags),
        lines: LineStream::new(source, loader, options.max_include_depth),
    };
    scanner.scan_top_level()?;
    scanner.finish()
}

struct Scanner<'a> {
    state: CompileState,
    lines: LineStream<'a>,
}

impl Scanner<'_> {
    fn has_states(&self) -> bool {
        !self.state.unit.states.is_empty()
    }

    fn scan_top_level(&mut self) -> Result<(), CompileError> {
        while let Some(line) = self.lines.next_line()? {
            let texts = line.texts();
            match texts.as_slice() {
                [directive, ..] if directive.starts_with('#') => self.scan_directive(&line)?,
                ["default", "{"] => self.scan_default(line.line)?,
                ["default", ..] => {
                    return Err(CompileError::declaration("Expected '{' after 'default'", line.line));
                }
                ["state", name, "{"] => self.scan_state(name, line.line)?,
                ["state", ..] => {
                    return Err(CompileError::declaration("Expected 'state <name> {'", line.line));
                }
                ["}", ..] => {
                    return Err(CompileError::declaration("Unexpected '}' at top level", line.line));
                }
                [first, _, "(", ..] if LslType::from_keyword(first).is_some() => self.scan_function(&line)?,
                [first, ..] if LslType::from_keyword(first).is_some() => self.scan_global(&line)?,
                ["void", _, "(", ..] | [_, "(", ..] => self.scan_function(&line)?,
                _ => {
                    return Err(CompileError::declaration(
                        format!("Unexpected '{line}' at top level"),
                        line.line,
                    ));
                }
            }
        }
        Ok(())
    }

    // ── Directives ─────────────────────────────────────────────────

    fn scan_directive(&mut self, line: &LineInfo) -> Result<(), CompileError> {
        let texts = line.texts();
        let once = match texts.first().copied() {
            Some("#include") => false,
            Some("#include_once") => true,
            Some(other) => {
                return Err(CompileError::declaration(
                    format!("Unsupported preprocessor directive '{other}'"),
                    line.line,
                ));
            }
            None => return Ok(()),
        };
        let name = match texts.as_slice() {
            [_, quoted] => quoted
                .strip_prefix('"')
                .and_then(|q| q.strip_suffix('"'))
                .filter(|name| !name.is_empty()),
            _ => None,
        };
        let Some(name) = name else {
            return Err(CompileError::declaration(
                "Expected '#include \"name\"' or '#include <name>'",
                line.line,
            ));
        };
        self.lines.include(name, once, line.line)?;
        Ok(())
    }

    // ── Globals ────────────────────────────────────────────────────

    fn scan_global(&mut self, line: &LineInfo) -> Result<(), CompileError> {
        let (ty_token, rest) = line
            .tokens
            .split_first()
            .ok_or_else(|| CompileError::internal("empty global declaration line", line.line))?;
        let ty = LslType::from_keyword(&ty_token.text)
            .ok_or_else(|| CompileError::internal("global declaration without a type", line.line))?;

        let (name, initializer) = match rest {
            [name, semi] if semi.is(";") => (name, None),
            [name, eq, init @ .., semi] if eq.is("=") && semi.is(";") && !init.is_empty() => (
                name,
                Some(LineInfo {
                    line: line.line,
                    tokens: init.to_vec(),
                }),
            ),
            _ => {
                return Err(CompileError::declaration(
                    format!("Malformed global declaration '{line}'"),
                    line.line,
                ));
            }
        };
        if self.has_states() {
            return Err(CompileError::declaration(
                format!("Global variable '{}' must be declared before the first state", name.text),
                line.line,
            ));
        }
        self.state.check_new_name(&name.text, line.line)?;
        tracing::debug!(name = %name.text, %ty, line = line.line, "global variable");
        self.state.unit.globals.insert(
            name.text.clone(),
            GlobalVariable {
                name: name.text.clone(),
                ty,
                line: line.line,
                initializer,
                value: None,
            },
        );
        Ok(())
    }

    // ── Functions ──────────────────────────────────────────────────

    fn scan_function(&mut self, line: &LineInfo) -> Result<(), CompileError> {
        let (return_type, header) = match line.tokens.split_first() {
            Some((first, rest)) if first.is("void") => (None, rest),
            Some((first, rest)) => match LslType::from_keyword(&first.text) {
                Some(ty) => (Some(ty), rest),
                None => (None, line.tokens.as_slice()),
            },
            None => return Err(CompileError::internal("empty function header", line.line)),
        };
        let (name, params) = split_header(header, line.line)?;
        if self.has_states() {
            return Err(CompileError::declaration(
                format!("Function '{name}' must be declared before the first state"),
                line.line,
            ));
        }
        self.state.check_new_name(name, line.line)?;
        tracing::debug!(name, ?return_type, params = params.len(), line = line.line, "function");

        // visible to its own body for recursion
        self.state.unit.functions.insert(
            name.to_owned(),
            Function {
                name: name.to_owned(),
                return_type,
                params: params.clone(),
                body: Block::braced(line.line),
                line: line.line,
            },
        );
        let body = self.structure_with_params(&params, BodyContext::Function, line.line)?;
        if let Some(function) = self.state.unit.functions.get_mut(name) {
            function.body = body;
        }
        Ok(())
    }

    fn structure_with_params(
        &mut self,
        params: &[Parameter],
        context: BodyContext,
        line: usize,
    ) -> Result<Block, CompileError> {
        self.state.push_scope();
        for param in params {
            self.state.declare_local(&param.name, param.ty, line)?;
        }
        let body = Structurer::new(&mut self.state, &mut self.lines, context).structure_body(line)?;
        self.state.pop_scope(line)?;
        Ok(body)
    }

    // ── States ─────────────────────────────────────────────────────

    fn scan_default(&mut self, line: usize) -> Result<(), CompileError> {
        if self.state.unit.states.contains_key("default") {
            return Err(CompileError::declaration("Duplicate 'default' state", line));
        }
        self.scan_state_body("default", line)
    }

    fn scan_state(&mut self, name: &str, line: usize) -> Result<(), CompileError> {
        if name == "default" {
            return Err(CompileError::declaration(
                "The default state is declared as 'default', not 'state default'",
                line,
            ));
        }
        if !self.state.unit.states.contains_key("default") {
            return Err(CompileError::declaration(
                format!("State '{name}' declared before the default state"),
                line,
            ));
        }
        if self.state.unit.states.contains_key(name) {
            return Err(CompileError::declaration(format!("Duplicate state '{name}'"), line));
        }
        self.scan_state_body(name, line)
    }

    fn scan_state_body(&mut self, name: &str, line: usize) -> Result<(), CompileError> {
        tracing::debug!(name, line, "state");
        let mut state = State {
            name: name.to_owned(),
            line,
            events: indexmap::IndexMap::new(),
        };
        loop {
            let Some(next) = self.lines.next_line()? else {
                return Err(CompileError::structure(
                    format!("Unclosed block: end of input inside state '{name}' opened on line {line}"),
                    self.lines.last_line(),
                ));
            };
            if next.tokens.len() == 1 && next.first_is("}") {
                break;
            }
            let handler = self.scan_event(&next, name)?;
            if state.events.contains_key(&handler.name) {
                return Err(CompileError::declaration(
                    format!("Duplicate event '{}' in state '{name}'", handler.name),
                    next.line,
                ));
            }
            state.events.insert(handler.name.clone(), handler);
        }
        if state.events.is_empty() {
            return Err(CompileError::declaration(
                format!("State '{name}' has no event handlers"),
                line,
            ));
        }
        self.state.unit.states.insert(name.to_owned(), state);
        Ok(())
    }

    fn scan_event(&mut self, line: &LineInfo, state: &str) -> Result<EventHandler, CompileError> {
        let (name, params) = split_header(&line.tokens, line.line).map_err(|_| {
            CompileError::declaration(
                format!("Only event handlers are allowed inside state '{state}', found '{line}'"),
                line.line,
            )
        })?;
        let signature = find_event(name)
            .ok_or_else(|| CompileError::declaration(format!("Unknown event '{name}'"), line.line))?;
        let found: Vec<LslType> = params.iter().map(|p| p.ty).collect();
        if found.as_slice() != signature.params {
            return Err(CompileError::declaration(
                format!(
                    "Event '{name}' expects ({}), found ({})",
                    type_list(signature.params),
                    type_list(&found)
                ),
                line.line,
            ));
        }
        tracing::debug!(name, state, line = line.line, "event handler");
        let body = self.structure_with_params(&params, BodyContext::Event, line.line)?;
        Ok(EventHandler {
            name: name.to_owned(),
            params,
            body,
            line: line.line,
        })
    }

    // ── Finish ─────────────────────────────────────────────────────

    fn finish(mut self) -> Result<CompileUnit, CompileError> {
        if !self.state.unit.states.contains_key("default") {
            return Err(CompileError::declaration("Script has no default state", self.lines.last_line()));
        }
        self.check_state_targets()?;
        self.resolve_globals()?;
        self.state.unit.includes = self.lines.included().map(str::to_owned).collect();
        Ok(self.state.into_unit())
    }

    fn check_state_targets(&self) -> Result<(), CompileError> {
        let unit = &self.state.unit;
        let mut targets = Vec::new();
        for state in unit.states.values() {
            for handler in state.events.values() {
                collect_state_changes(&handler.body, &mut targets);
            }
        }
        match targets.into_iter().find(|(target, _)| !unit.states.contains_key(*target)) {
            Some((target, line)) => Err(CompileError::declaration(format!("Unknown state '{target}'"), line)),
            None => Ok(()),
        }
    }

    fn resolve_globals(&mut self) -> Result<(), CompileError> {
        let flags = self.state.flags();
        let mut resolved = Vec::new();
        for global in self.state.unit.globals.values() {
            if let Some(init) = &global.initializer {
                let value = Resolver::new(flags, &self.state, init.line).resolve_tokens(&init.tokens)?;
                resolved.push((global.name.clone(), value));
            }
        }
        for (name, value) in resolved {
            if let Some(global) = self.state.unit.globals.get_mut(&name) {
                global.value = Some(value);
            }
        }
        Ok(())
    }
}

/// Split `name ( params ) {` into the name and its typed parameters.
fn split_header(tokens: &[Token], line: usize) -> Result<(&str, Vec<Parameter>), CompileError> {
    let malformed = || CompileError::declaration("Expected '<name> ( <parameters> ) {'", line);
    let [name, open, inner @ .., close, brace] = tokens else {
        return Err(malformed());
    };
    if !open.is("(") || !close.is(")") {
        return Err(malformed());
    }
    if !brace.is("{") {
        return Err(CompileError::declaration(
            format!("Expected '{{' after the header of '{}'", name.text),
            line,
        ));
    }
    Ok((&name.text, parse_params(inner, line)?))
}

fn parse_params(tokens: &[Token], line: usize) -> Result<Vec<Parameter>, CompileError> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    tokens
        .split(|t| t.is(","))
        .map(|chunk| match chunk {
            [ty, name] => LslType::from_keyword(&ty.text)
                .map(|ty| Parameter {
                    ty,
                    name: name.text.clone(),
                })
                .ok_or_else(|| CompileError::declaration(format!("Unknown parameter type '{}'", ty.text), line)),
            _ => Err(CompileError::declaration("Parameters must be '<type> <name>'", line)),
        })
        .collect()
}

fn type_list(types: &[LslType]) -> String {
    types.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
}

fn collect_state_changes<'b>(block: &'b Block, out: &mut Vec<(&'b str, usize)>) {
    for statement in &block.statements {
        match &statement.kind {
            StatementKind::StateChange { state } => out.push((state.as_str(), statement.line)),
            StatementKind::Block { block } => collect_state_changes(block, out),
            StatementKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                collect_state_changes(then_branch, out);
                if let Some(else_branch) = else_branch {
                    collect_state_changes(else_branch, out);
                }
            }
            StatementKind::While { body, .. } | StatementKind::DoWhile { body, .. } | StatementKind::For { body, .. } => {
                collect_state_changes(body, out);
            }
            _ => {}
        }
    }
}
