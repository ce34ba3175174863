use super::ast::*;
use super::builtins::is_reserved;
use super::error::CompileError;
use super::splitter::is_word_char;

/// Parse a complete expression from (cast-recombined) token texts.
pub fn parse_expression(tokens: &[String], line: usize) -> Result<Expr, CompileError> {
    let mut parser = ExprParser::new(tokens, line);
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse a comma-separated list of expressions (`for` init/step clauses).
/// An empty token list yields an empty list.
pub fn parse_comma_list(tokens: &[String], line: usize) -> Result<Vec<Expr>, CompileError> {
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    let mut parser = ExprParser::new(tokens, line);
    let mut exprs = vec![parser.parse_expr()?];
    while parser.eat(",") {
        exprs.push(parser.parse_expr()?);
    }
    parser.expect_end()?;
    Ok(exprs)
}

/// Cast token produced by recombining `(` type `)`.
pub fn cast_type(token: &str) -> Option<LslType> {
    token
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .and_then(LslType::from_keyword)
}

pub fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(is_word_char)
}

fn is_number(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn is_string_literal(token: &str) -> bool {
    token.starts_with('"') || token.starts_with('\'')
}

struct ExprParser<'a> {
    tokens: &'a [String],
    pos: usize,
    line: usize,
    /// Inside `< ... >`: a bare `>` closes the literal instead of comparing.
    in_angle: bool,
}

impl<'a> ExprParser<'a> {
    fn new(tokens: &'a [String], line: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
            in_angle: false,
        }
    }

    // ── Helpers ────────────────────────────────────────────────────

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).map(String::as_str)
    }

    fn peek_at(&self, offset: usize) -> Option<&'a str> {
        self.tokens.get(self.pos + offset).map(String::as_str)
    }

    fn advance(&mut self) -> Option<&'a str> {
        let tok = self.peek();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, text: &str) -> bool {
        if self.peek() == Some(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, text: &str) -> Result<(), CompileError> {
        match self.peek() {
            Some(t) if t == text => {
                self.pos += 1;
                Ok(())
            }
            Some(t) => Err(CompileError::syntax(format!("Expected '{text}' but found '{t}'"), self.line)),
            None => Err(CompileError::syntax(format!("Expected '{text}' at end of expression"), self.line)),
        }
    }

    fn expect_end(&self) -> Result<(), CompileError> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(CompileError::syntax(format!("Unexpected token '{t}'"), self.line)),
        }
    }

    /// Run `f` with the angle-bracket mode set to `in_angle`, restoring it after.
    fn with_angle<T>(
        &mut self,
        in_angle: bool,
        f: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        let saved = std::mem::replace(&mut self.in_angle, in_angle);
        let result = f(self);
        self.in_angle = saved;
        result
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    // ── Expression parsing (precedence climbing) ──────────────────

    fn parse_expr(&mut self) -> Result<Expr, CompileError> {
        let left = self.parse_logical()?;
        let op = match self.peek() {
            Some("=") => BinaryOp::Assign,
            Some("+=") => BinaryOp::AddAssign,
            Some("-=") => BinaryOp::SubAssign,
            Some("*=") => BinaryOp::MulAssign,
            Some("/=") => BinaryOp::DivAssign,
            Some("%=") => BinaryOp::ModAssign,
            _ => return Ok(left),
        };
        self.advance();
        // Right-associative: a = b = c
        let right = self.parse_expr()?;
        Ok(Self::binary(op, left, right))
    }

    /// `&&` and `||` share one precedence level.
    fn parse_logical(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_bit_or()?;
        loop {
            let op = match self.peek() {
                Some("&&") => BinaryOp::And,
                Some("||") => BinaryOp::Or,
                _ => break,
            };
            self.advance();
            let right = self.parse_bit_or()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_bit_or(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_bit_xor()?;
        while self.eat("|") {
            let right = self.parse_bit_xor()?;
            left = Self::binary(BinaryOp::BitOr, left, right);
        }
        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_bit_and()?;
        while self.eat("^") {
            let right = self.parse_bit_and()?;
            left = Self::binary(BinaryOp::BitXor, left, right);
        }
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_equality()?;
        while self.eat("&") {
            let right = self.parse_equality()?;
            left = Self::binary(BinaryOp::BitAnd, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Some("==") => BinaryOp::Eq,
                Some("!=") => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_shift()?;
        loop {
            let op = match self.peek() {
                Some("<") => BinaryOp::Lt,
                Some(">") if !self.in_angle => BinaryOp::Gt,
                Some("<=") => BinaryOp::Le,
                Some(">=") if !self.in_angle => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_shift()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_add()?;
        loop {
            let op = match self.peek() {
                Some("<<") => BinaryOp::Shl,
                Some(">>") if !self.in_angle => BinaryOp::Shr,
                _ => break,
            };
            self.advance();
            let right = self.parse_add()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_add(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some("+") => BinaryOp::Add,
                Some("-") => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_mul()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_mul(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some("*") => BinaryOp::Mul,
                Some("/") => BinaryOp::Div,
                Some("%") => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let op = match self.peek() {
            Some("-") => UnaryOp::Neg,
            Some("+") => UnaryOp::Plus,
            Some("!") => UnaryOp::Not,
            Some("~") => UnaryOp::BitNot,
            Some("++") => UnaryOp::PreIncrement,
            Some("--") => UnaryOp::PreDecrement,
            Some(tok) => match cast_type(tok) {
                Some(ty) => UnaryOp::Cast(ty),
                None => return self.parse_postfix(),
            },
            None => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::LeftUnary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Some("++") => {
                    self.advance();
                    expr = Expr::RightUnary {
                        op: PostfixOp::Increment,
                        operand: Box::new(expr),
                    };
                }
                Some("--") => {
                    self.advance();
                    expr = Expr::RightUnary {
                        op: PostfixOp::Decrement,
                        operand: Box::new(expr),
                    };
                }
                Some(".") => {
                    self.advance();
                    let member = match self.advance() {
                        Some(name) if is_identifier(name) => name.to_owned(),
                        Some(other) => {
                            return Err(CompileError::syntax(
                                format!("Expected member name after '.', found '{other}'"),
                                self.line,
                            ));
                        }
                        None => {
                            return Err(CompileError::syntax("Expected member name after '.'", self.line));
                        }
                    };
                    expr = Self::binary(BinaryOp::Member, expr, Expr::Value(member));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Arguments or list items up to `close`; the opening token is consumed.
    fn parse_items(&mut self, close: &str) -> Result<Vec<Expr>, CompileError> {
        let mut items = Vec::new();
        if !self.eat(close) {
            items.push(self.parse_expr()?);
            while self.eat(",") {
                items.push(self.parse_expr()?);
            }
            self.expect(close)?;
        }
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let Some(tok) = self.advance() else {
            return Err(CompileError::syntax("Unexpected end of expression", self.line));
        };
        match tok {
            "(" => {
                let inner = self.with_angle(false, |p| {
                    let inner = p.parse_expr()?;
                    p.expect(")")?;
                    Ok(inner)
                })?;
                Ok(Expr::Level {
                    kind: LevelKind::Paren,
                    children: vec![inner],
                })
            }
            "[" => {
                let items = self.with_angle(false, |p| p.parse_items("]"))?;
                Ok(Expr::Level {
                    kind: LevelKind::List,
                    children: items,
                })
            }
            "<" => {
                let components = self.with_angle(true, |p| {
                    let mut components = vec![p.parse_expr()?];
                    while p.eat(",") {
                        components.push(p.parse_expr()?);
                    }
                    p.expect(">")?;
                    Ok(components)
                })?;
                Ok(Expr::Declaration(components))
            }
            name if is_identifier(name) && self.peek() == Some("(") => {
                if is_reserved(name) {
                    return Err(CompileError::syntax(format!("Unexpected keyword '{name}'"), self.line));
                }
                self.advance();
                let args = self.with_angle(false, |p| p.parse_items(")"))?;
                Ok(Expr::Call {
                    name: name.to_owned(),
                    args,
                })
            }
            name if is_identifier(name) => {
                if is_reserved(name) {
                    return Err(CompileError::syntax(format!("Unexpected keyword '{name}'"), self.line));
                }
                Ok(Expr::Value(name.to_owned()))
            }
            literal if is_number(literal) || is_string_literal(literal) => Ok(Expr::Value(literal.to_owned())),
            other => Err(CompileError::syntax(format!("Unexpected token '{other}'"), self.line)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<String> {
        src.split_whitespace().map(str::to_owned).collect()
    }

    fn parse(src: &str) -> Expr {
        parse_expression(&toks(src), 1).unwrap()
    }

    fn value(v: &str) -> Expr {
        Expr::Value(v.into())
    }

    #[test]
    fn mul_binds_tighter_than_add() {
        let expr = parse("1 + 2 * 3");
        let Expr::Binary { op: BinaryOp::Add, right, .. } = expr else {
            panic!("expected add at the root: {expr:?}");
        };
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn assignment_is_right_associative() {
        let expr = parse("a = b = 1");
        let Expr::Binary { op: BinaryOp::Assign, right, .. } = expr else {
            panic!("expected assignment");
        };
        assert!(matches!(*right, Expr::Binary { op: BinaryOp::Assign, .. }));
    }

    #[test]
    fn vector_literal() {
        let expr = parse("< 1 , 2 , 3 >");
        assert_eq!(expr, Expr::Declaration(vec![value("1"), value("2"), value("3")]));
    }

    #[test]
    fn comparison_inside_parens_within_angle() {
        let expr = parse("< ( a > b ) , 0 , 0 >");
        let Expr::Declaration(components) = expr else {
            panic!("expected angle-bracket group");
        };
        assert!(matches!(&components[0], Expr::Level { kind: LevelKind::Paren, .. }));
    }

    #[test]
    fn vector_compared_with_less_than() {
        let expr = parse("a < < 1 , 2 , 3 >");
        assert!(matches!(expr, Expr::Binary { op: BinaryOp::Lt, .. }));
    }

    #[test]
    fn call_and_list() {
        let expr = parse("llList2String ( [ 1 , \"a\" ] , 0 )");
        let Expr::Call { name, args } = expr else {
            panic!("expected call");
        };
        assert_eq!(name, "llList2String");
        assert_eq!(args.len(), 2);
        assert!(matches!(&args[0], Expr::Level { kind: LevelKind::List, children } if children.len() == 2));
    }

    #[test]
    fn empty_call_and_list() {
        assert_eq!(parse("llGetPos ( )"), Expr::Call { name: "llGetPos".into(), args: vec![] });
        assert_eq!(parse("[ ]"), Expr::Level { kind: LevelKind::List, children: vec![] });
    }

    #[test]
    fn member_access_and_postfix() {
        let expr = parse("v . x");
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Member,
                left: Box::new(value("v")),
                right: Box::new(value("x")),
            }
        );
        assert!(matches!(parse("i ++"), Expr::RightUnary { op: PostfixOp::Increment, .. }));
    }

    #[test]
    fn cast_tokens_become_unary() {
        let expr = parse("(integer) \"5\"");
        assert_eq!(
            expr,
            Expr::LeftUnary {
                op: UnaryOp::Cast(LslType::Integer),
                operand: Box::new(value("\"5\"")),
            }
        );
    }

    #[test]
    fn negative_literal_is_unary() {
        assert!(matches!(parse("- 2147483648"), Expr::LeftUnary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn comma_list() {
        assert_eq!(parse_comma_list(&toks("i = 0 , j = 1"), 1).unwrap().len(), 2);
        assert!(parse_comma_list(&[], 1).unwrap().is_empty());
    }

    #[test]
    fn errors_are_syntax_errors() {
        use crate::compiler::error::ErrorKind;
        let err = parse_expression(&toks("1 +"), 4).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert_eq!(err.line, 4);
        assert!(parse_expression(&toks("( 1"), 1).is_err());
        assert!(parse_expression(&toks("1 2"), 1).is_err());
        assert!(parse_expression(&toks("if"), 1).is_err());
    }
}
