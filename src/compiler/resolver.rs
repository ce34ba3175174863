//! Constant resolution: folds literal arithmetic across the five value kinds
//! and keeps everything else as a retained tree for the code generator.

use super::ast::*;
use super::builtins::find_constant;
use super::error::CompileError;
use super::flags::AcceptedFlags;
use super::parser::{self, is_identifier};
use super::value::{
    self, float_to_integer, parse_float_prefix, parse_integer_prefix, parse_rotation, parse_vector,
    unescape_string_literal, ConstantValue, Negate,
};

/// Answers "is this name a declared variable" for identifier resolution.
pub trait VariableScope {
    fn is_variable(&self, name: &str) -> bool;
}

/// A scope with no variables; every identifier that is not a built-in
/// constant is retained as-is.
pub struct NoVariables;

impl VariableScope for NoVariables {
    fn is_variable(&self, _name: &str) -> bool {
        false
    }
}

/// The literal `2^31`: a float on its own, `i32::MIN` under unary minus.
const INT_MIN_MAGNITUDE: &str = "2147483648";

// ── Cast recombination ─────────────────────────────────────────────

fn is_literal(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '"' | '\'' | '.'))
}

/// `true` if a token ends an operand, so a following `(` cannot start a cast.
fn ends_operand(token: &str) -> bool {
    token == ")" || token == "]" || is_identifier(token) || is_literal(token)
}

fn starts_operand(token: &str) -> bool {
    token == "(" || token == "[" || is_identifier(token) || is_literal(token)
}

/// Collapse `(` type `)` triples in operand position into single cast
/// tokens such as `(integer)`.
pub fn recombine_casts(tokens: &[Token], line: usize) -> Result<Vec<String>, CompileError> {
    let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    let mut out: Vec<String> = Vec::with_capacity(texts.len());
    let mut i = 0;
    while i < texts.len() {
        let operand_position = out.last().map_or(true, |prev| !ends_operand(prev));
        let is_triple = texts[i] == "("
            && texts.get(i + 2) == Some(&")")
            && texts.get(i + 1).is_some_and(|t| is_identifier(t));
        if operand_position && is_triple {
            let name = texts[i + 1];
            if LslType::from_keyword(name).is_some() {
                out.push(format!("({name})"));
                i += 3;
                continue;
            }
            if texts.get(i + 3).is_some_and(|t| starts_operand(t)) {
                return Err(CompileError::resolver(format!("Invalid typecast '({name})'"), line));
            }
        }
        out.push(texts[i].to_owned());
        i += 1;
    }
    Ok(out)
}

// ── Resolver ───────────────────────────────────────────────────────

/// Resolves expressions for one statement; errors carry the statement line.
pub struct Resolver<'a> {
    flags: AcceptedFlags,
    scope: &'a dyn VariableScope,
    line: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(flags: AcceptedFlags, scope: &'a dyn VariableScope, line: usize) -> Self {
        Self { flags, scope, line }
    }

    /// Recombine casts, parse, and resolve one expression.
    pub fn resolve_tokens(&self, tokens: &[Token]) -> Result<Resolved, CompileError> {
        let texts = recombine_casts(tokens, self.line)?;
        let expr = parser::parse_expression(&texts, self.line)?;
        self.resolve(&expr)
    }

    /// Same as [`Resolver::resolve_tokens`] for a comma-separated list.
    pub fn resolve_token_list(&self, tokens: &[Token]) -> Result<Vec<Resolved>, CompileError> {
        let texts = recombine_casts(tokens, self.line)?;
        parser::parse_comma_list(&texts, self.line)?
            .iter()
            .map(|expr| self.resolve(expr))
            .collect()
    }

    fn error(&self, message: impl Into<String>) -> CompileError {
        CompileError::resolver(message, self.line)
    }

    /// Post-order resolution of a parsed tree.
    pub fn resolve(&self, expr: &Expr) -> Result<Resolved, CompileError> {
        match expr {
            Expr::Value(text) => self.resolve_value(text),
            Expr::Level {
                kind: LevelKind::Paren,
                children,
            } => match children.as_slice() {
                [child] => self.resolve(child),
                _ => Err(CompileError::syntax("Parenthesis must hold exactly one expression", self.line)),
            },
            Expr::Level {
                kind: LevelKind::List,
                children,
            } => {
                let items = children.iter().map(|c| self.resolve(c)).collect::<Result<_, _>>()?;
                Ok(Resolved::retained(RetainedExpr::List { items }))
            }
            Expr::Call { name, args } => {
                let args = args.iter().map(|a| self.resolve(a)).collect::<Result<_, _>>()?;
                Ok(Resolved::retained(RetainedExpr::Call {
                    name: name.clone(),
                    args,
                }))
            }
            Expr::Declaration(components) => self.resolve_angle_literal(components),
            Expr::LeftUnary { op, operand } => self.resolve_left_unary(*op, operand),
            Expr::RightUnary { op, operand } => {
                let operand = self.resolve(operand)?;
                if operand.is_constant() {
                    return Err(self.error("Cannot increment or decrement a constant"));
                }
                Ok(Resolved::retained(RetainedExpr::Postfix { op: *op, operand }))
            }
            Expr::Binary { op, left, right } => self.resolve_binary(*op, left, right),
        }
    }

    fn resolve_value(&self, text: &str) -> Result<Resolved, CompileError> {
        if text.starts_with('"') || text.starts_with('\'') {
            let value = unescape_string_literal(text)
                .ok_or_else(|| self.error(format!("Malformed string literal {text}")))?;
            return Ok(Resolved::Constant(ConstantValue::String(value)));
        }
        if text.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            return self.parse_number(text).map(Resolved::Constant);
        }
        if self.scope.is_variable(text) {
            return Ok(variable(text));
        }
        match find_constant(text, self.flags) {
            Some(constant) => Ok(Resolved::Constant(constant.value.to_constant())),
            None => Ok(variable(text)),
        }
    }

    fn parse_number(&self, text: &str) -> Result<ConstantValue, CompileError> {
        let invalid = || self.error(format!("Invalid numeric literal '{text}'"));

        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            if hex.is_empty() {
                return Err(invalid());
            }
            let mut value: u32 = 0;
            for c in hex.chars() {
                let digit = c.to_digit(16).ok_or_else(invalid)?;
                value = value.wrapping_mul(16).wrapping_add(digit);
            }
            return Ok(ConstantValue::Integer(value as i32));
        }

        if text.chars().all(|c| c.is_ascii_digit()) {
            return Ok(match text.parse::<i32>() {
                Ok(i) => ConstantValue::Integer(i),
                // beyond the integer range: 2147483648 and up read as floats
                Err(_) => ConstantValue::Float(text.parse::<f64>().map_err(|_| invalid())?),
            });
        }

        text.parse::<f64>().map(ConstantValue::Float).map_err(|_| invalid())
    }

    fn resolve_angle_literal(&self, components: &[Expr]) -> Result<Resolved, CompileError> {
        if components.len() != 3 && components.len() != 4 {
            return Err(self.error(format!(
                "Angle-bracket literal has {} components, which is neither 3 nor 4",
                components.len()
            )));
        }
        let resolved: Vec<Resolved> = components.iter().map(|c| self.resolve(c)).collect::<Result<_, _>>()?;
        let numbers: Option<Vec<f64>> = resolved.iter().map(|r| r.as_constant().and_then(ConstantValue::as_f64)).collect();

        Ok(match (numbers.as_deref(), resolved.len()) {
            (Some(&[x, y, z]), _) => Resolved::Constant(ConstantValue::Vector(value::Vector::new(x, y, z))),
            (Some(&[x, y, z, s]), _) => {
                Resolved::Constant(ConstantValue::Rotation(value::Rotation::new(x, y, z, s)))
            }
            (_, 3) => Resolved::retained(RetainedExpr::Vector { components: resolved }),
            _ => Resolved::retained(RetainedExpr::Rotation { components: resolved }),
        })
    }

    fn resolve_left_unary(&self, op: UnaryOp, operand: &Expr) -> Result<Resolved, CompileError> {
        if op == UnaryOp::Neg && matches!(operand, Expr::Value(v) if v == INT_MIN_MAGNITUDE) {
            return Ok(Resolved::Constant(ConstantValue::Integer(i32::MIN)));
        }
        let operand = self.resolve(operand)?;

        if let UnaryOp::Cast(ty) = op {
            return self.resolve_cast(ty, operand);
        }

        let Resolved::Constant(value) = operand else {
            return Ok(Resolved::retained(RetainedExpr::Unary { op, operand }));
        };

        let folded = match (op, &value) {
            (UnaryOp::Plus, _) => value.clone(),
            (UnaryOp::Neg, _) => value
                .negate()
                .ok_or_else(|| self.error(format!("Unary '-' is not supported on {}", value.kind_name())))?,
            (UnaryOp::BitNot, ConstantValue::Integer(i)) => ConstantValue::Integer(!i),
            (UnaryOp::Not, ConstantValue::Integer(i)) => ConstantValue::Integer(i32::from(*i == 0)),
            (UnaryOp::PreIncrement | UnaryOp::PreDecrement, _) => {
                return Err(self.error("Cannot increment or decrement a constant"));
            }
            (op, value) => {
                return Err(self.error(format!(
                    "Mismatching type: unary '{}' is not supported on {}",
                    op.symbol(),
                    value.kind_name()
                )));
            }
        };
        Ok(Resolved::Constant(folded))
    }

    fn resolve_cast(&self, ty: LslType, operand: Resolved) -> Result<Resolved, CompileError> {
        let retain = |operand| Ok(Resolved::retained(RetainedExpr::Unary { op: UnaryOp::Cast(ty), operand }));

        let value = match operand {
            Resolved::Constant(value) if ty != LslType::List => value,
            Resolved::Retained(expr) => {
                if ty == LslType::String {
                    if let RetainedExpr::List { items } = expr.as_ref() {
                        if let Some(joined) = join_constant_list(items) {
                            return Ok(Resolved::Constant(ConstantValue::String(joined)));
                        }
                    }
                }
                return retain(Resolved::Retained(expr));
            }
            constant => return retain(constant),
        };

        let converted = match (ty, &value) {
            (LslType::String, v) => ConstantValue::String(v.to_script_string()),
            (LslType::Key, ConstantValue::String(s)) => ConstantValue::String(s.clone()),
            (LslType::Integer, ConstantValue::Integer(i)) => ConstantValue::Integer(*i),
            (LslType::Integer, ConstantValue::Float(f)) => ConstantValue::Integer(float_to_integer(*f)),
            (LslType::Integer, ConstantValue::String(s)) => ConstantValue::Integer(parse_integer_prefix(s)),
            (LslType::Float, ConstantValue::Integer(i)) => ConstantValue::Float(f64::from(*i)),
            (LslType::Float, ConstantValue::Float(f)) => ConstantValue::Float(*f),
            (LslType::Float, ConstantValue::String(s)) => ConstantValue::Float(parse_float_prefix(s)),
            (LslType::Vector, ConstantValue::Vector(v)) => ConstantValue::Vector(*v),
            (LslType::Vector, ConstantValue::String(s)) => ConstantValue::Vector(parse_vector(s)),
            (LslType::Rotation, ConstantValue::Rotation(r)) => ConstantValue::Rotation(*r),
            (LslType::Rotation, ConstantValue::String(s)) => ConstantValue::Rotation(parse_rotation(s)),
            (ty, value) => {
                return Err(self.error(format!("Unsupported cast from {} to {ty}", value.kind_name())));
            }
        };
        Ok(Resolved::Constant(converted))
    }

    fn resolve_binary(&self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Resolved, CompileError> {
        if op == BinaryOp::Member {
            let object = self.resolve(left)?;
            let Expr::Value(member) = right else {
                return Err(CompileError::internal("member access without a member name", self.line));
            };
            return self.resolve_member(object, member);
        }

        let left = self.resolve(left)?;
        if op.is_assignment() && left.is_constant() {
            return Err(self.error("Cannot assign to a constant"));
        }
        let right = self.resolve(right)?;

        if !op.is_assignment() {
            if let (Resolved::Constant(a), Resolved::Constant(b)) = (&left, &right) {
                if let Some(folded) = self.fold_binary(op, a, b)? {
                    return Ok(Resolved::Constant(folded));
                }
            }
        }
        Ok(Resolved::retained(RetainedExpr::Binary { op, left, right }))
    }

    fn resolve_member(&self, object: Resolved, member: &str) -> Result<Resolved, CompileError> {
        let Resolved::Constant(value) = &object else {
            return Ok(Resolved::retained(RetainedExpr::Member {
                object,
                member: member.to_owned(),
            }));
        };
        let component = match value {
            ConstantValue::Vector(v) => v.component(member),
            ConstantValue::Rotation(r) => r.component(member),
            other => {
                return Err(self.error(format!(
                    "Mismatching type: operator '.' is not supported on {}",
                    other.kind_name()
                )));
            }
        };
        component
            .map(|f| Resolved::Constant(ConstantValue::Float(f)))
            .ok_or_else(|| self.error(format!("{} has no component '{member}'", value.kind_name())))
    }

    /// The per-type-pair arithmetic matrix. `Ok(None)` leaves the expression
    /// for runtime (division by a zero constant).
    pub fn fold_binary(
        &self,
        op: BinaryOp,
        a: &ConstantValue,
        b: &ConstantValue,
    ) -> Result<Option<ConstantValue>, CompileError> {
        use ConstantValue::{Float, Integer, Rotation, String, Vector};

        let mismatch = || {
            self.error(format!(
                "Mismatching type: operator '{}' is not supported between {} and {}",
                op.symbol(),
                a.kind_name(),
                b.kind_name()
            ))
        };

        let folded = match (op, a, b) {
            // ── Integer pairs ───────────────────────────────────────
            (BinaryOp::Add, Integer(x), Integer(y)) => Integer(x.wrapping_add(*y)),
            (BinaryOp::Sub, Integer(x), Integer(y)) => Integer(x.wrapping_sub(*y)),
            (BinaryOp::Mul, Integer(x), Integer(y)) => Integer(x.wrapping_mul(*y)),
            (BinaryOp::Div | BinaryOp::Mod, Integer(_), Integer(0)) => return Ok(None),
            (BinaryOp::Div, Integer(x), Integer(y)) => Integer(x.wrapping_div(*y)),
            (BinaryOp::Mod, Integer(x), Integer(y)) => Integer(x.wrapping_rem(*y)),
            (BinaryOp::BitAnd, Integer(x), Integer(y)) => Integer(x & y),
            (BinaryOp::BitOr, Integer(x), Integer(y)) => Integer(x | y),
            (BinaryOp::BitXor, Integer(x), Integer(y)) => Integer(x ^ y),
            (BinaryOp::Shl, Integer(x), Integer(y)) => Integer(x.wrapping_shl(*y as u32)),
            (BinaryOp::Shr, Integer(x), Integer(y)) => Integer(x.wrapping_shr(*y as u32)),
            (BinaryOp::And, Integer(x), Integer(y)) => Integer(i32::from(*x != 0 && *y != 0)),
            (BinaryOp::Or, Integer(x), Integer(y)) => Integer(i32::from(*x != 0 || *y != 0)),
            (BinaryOp::Lt, Integer(x), Integer(y)) => Integer(i32::from(x < y)),
            (BinaryOp::Gt, Integer(x), Integer(y)) => Integer(i32::from(x > y)),
            (BinaryOp::Le, Integer(x), Integer(y)) => Integer(i32::from(x <= y)),
            (BinaryOp::Ge, Integer(x), Integer(y)) => Integer(i32::from(x >= y)),
            (BinaryOp::Eq, Integer(x), Integer(y)) => Integer(i32::from(x == y)),
            (BinaryOp::Ne, Integer(x), Integer(y)) => Integer(i32::from(x != y)),

            // ── Mixed numeric, promoted to float ────────────────────
            (_, Integer(_) | Float(_), Integer(_) | Float(_)) => {
                let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
                    return Err(mismatch());
                };
                match op {
                    BinaryOp::Add => Float(x + y),
                    BinaryOp::Sub => Float(x - y),
                    BinaryOp::Mul => Float(x * y),
                    BinaryOp::Div | BinaryOp::Mod if y == 0.0 => return Ok(None),
                    BinaryOp::Div => Float(x / y),
                    BinaryOp::Mod => Float(x % y),
                    BinaryOp::Lt => Integer(i32::from(x < y)),
                    BinaryOp::Gt => Integer(i32::from(x > y)),
                    BinaryOp::Le => Integer(i32::from(x <= y)),
                    BinaryOp::Ge => Integer(i32::from(x >= y)),
                    BinaryOp::Eq => Integer(i32::from(x == y)),
                    BinaryOp::Ne => Integer(i32::from(x != y)),
                    _ => return Err(mismatch()),
                }
            }

            // ── Vectors ─────────────────────────────────────────────
            (BinaryOp::Add, Vector(v), Vector(w)) => Vector(v.add(*w)),
            (BinaryOp::Sub, Vector(v), Vector(w)) => Vector(v.sub(*w)),
            (BinaryOp::Mul, Vector(v), Vector(w)) => Float(v.dot(*w)),
            (BinaryOp::Mod, Vector(v), Vector(w)) => Vector(v.cross(*w)),
            (BinaryOp::Mul, Vector(v), n @ (Integer(_) | Float(_)))
            | (BinaryOp::Mul, n @ (Integer(_) | Float(_)), Vector(v)) => {
                Vector(v.scale(n.as_f64().ok_or_else(mismatch)?))
            }
            (BinaryOp::Div, Vector(v), n @ (Integer(_) | Float(_))) => {
                let divisor = n.as_f64().ok_or_else(mismatch)?;
                if divisor == 0.0 {
                    return Ok(None);
                }
                Vector(v.scale(1.0 / divisor))
            }
            (BinaryOp::Mul, Vector(v), Rotation(r)) => Vector(v.rotate(*r)),
            (BinaryOp::Div, Vector(v), Rotation(r)) => Vector(v.unrotate(*r)),
            (BinaryOp::Eq, Vector(v), Vector(w)) => Integer(i32::from(v == w)),
            (BinaryOp::Ne, Vector(v), Vector(w)) => Integer(i32::from(v != w)),

            // ── Rotations ───────────────────────────────────────────
            (BinaryOp::Add, Rotation(r), Rotation(q)) => Rotation(r.add(*q)),
            (BinaryOp::Sub, Rotation(r), Rotation(q)) => Rotation(r.sub(*q)),
            (BinaryOp::Mul, Rotation(r), Rotation(q)) => Rotation(r.compose(*q)),
            (BinaryOp::Div, Rotation(r), Rotation(q)) => Rotation(r.compose(q.conjugate())),
            (BinaryOp::Eq, Rotation(r), Rotation(q)) => Integer(i32::from(r == q)),
            (BinaryOp::Ne, Rotation(r), Rotation(q)) => Integer(i32::from(r != q)),

            // ── Strings ─────────────────────────────────────────────
            (BinaryOp::Add, String(s), String(t)) => String(format!("{s}{t}")),
            (BinaryOp::Eq, String(s), String(t)) => Integer(i32::from(s == t)),
            (BinaryOp::Ne, String(s), String(t)) => Integer(i32::from(s != t)),

            _ => return Err(mismatch()),
        };
        Ok(Some(folded))
    }
}

fn variable(name: &str) -> Resolved {
    Resolved::retained(RetainedExpr::Variable { name: name.to_owned() })
}

/// `(string)[...]`: concatenation of every element's string form, when every
/// element is constant.
fn join_constant_list(items: &[Resolved]) -> Option<String> {
    items
        .iter()
        .map(|item| item.as_constant().map(ConstantValue::to_list_element_string))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::compiler::error::ErrorKind;
    use crate::compiler::lexer::lex;
    use crate::compiler::value::{Rotation, Vector};

    struct Vars(&'static [&'static str]);

    impl VariableScope for Vars {
        fn is_variable(&self, name: &str) -> bool {
            self.0.contains(&name)
        }
    }

    fn tokens(src: &str) -> Vec<Token> {
        lex(src).unwrap().into_iter().flat_map(|l| l.tokens).collect()
    }

    fn resolve_with(src: &str, vars: &'static [&'static str]) -> Result<Resolved, CompileError> {
        let scope = Vars(vars);
        Resolver::new(AcceptedFlags::DEFAULT_BASELINE, &scope, 1).resolve_tokens(&tokens(src))
    }

    fn fold(src: &str) -> ConstantValue {
        match resolve_with(src, &[]).unwrap() {
            Resolved::Constant(value) => value,
            Resolved::Retained(expr) => panic!("{src} did not fold: {expr:?}"),
        }
    }

    fn fold_err(src: &str) -> CompileError {
        resolve_with(src, &[]).unwrap_err()
    }

    #[test]
    fn angle_bracket_arity() {
        assert_eq!(fold("<1,2,3>"), ConstantValue::Vector(Vector::new(1.0, 2.0, 3.0)));
        assert_eq!(fold("<1,2,3,4>"), ConstantValue::Rotation(Rotation::new(1.0, 2.0, 3.0, 4.0)));
        let err = fold_err("<1,2>");
        assert_eq!(err.kind, ErrorKind::Resolver);
        assert!(err.message.contains("neither 3 nor 4"));
    }

    #[test]
    fn numeric_promotion() {
        assert_eq!(fold("1 + 2.5"), ConstantValue::Float(3.5));
        assert_eq!(fold("2 * 3"), ConstantValue::Integer(6));
        assert_eq!(fold("7 / 2"), ConstantValue::Integer(3));
        assert_eq!(fold("7 % 3"), ConstantValue::Integer(1));
        assert_eq!(fold("2147483647 + 1"), ConstantValue::Integer(i32::MIN));
    }

    #[test]
    fn dot_product_of_orthogonal_units() {
        assert_eq!(fold("<1,0,0> * <0,1,0>"), ConstantValue::Float(0.0));
    }

    #[test]
    fn vector_ops() {
        assert_eq!(fold("<1,0,0> % <0,1,0>"), ConstantValue::Vector(Vector::new(0.0, 0.0, 1.0)));
        assert_eq!(fold("2 * <1,2,3>"), ConstantValue::Vector(Vector::new(2.0, 4.0, 6.0)));
        assert_eq!(fold("<1,2,3> - <1,1,1>"), ConstantValue::Vector(Vector::new(0.0, 1.0, 2.0)));
        assert_eq!(fold("<1,2,3> * ZERO_ROTATION"), ConstantValue::Vector(Vector::new(1.0, 2.0, 3.0)));
        assert_eq!(fold("<1,2,3>.y"), ConstantValue::Float(2.0));
        assert_eq!(fold("<1,2,3,4>.s"), ConstantValue::Float(4.0));
    }

    #[test]
    fn comparisons_yield_integers() {
        assert_eq!(fold("1 < 2.5"), ConstantValue::Integer(1));
        assert_eq!(fold("<1,2,3> == <1,2,3>"), ConstantValue::Integer(1));
        assert_eq!(fold("<1,2,3,4> != <1,2,3,4>"), ConstantValue::Integer(0));
    }

    #[test]
    fn min_int_literal() {
        assert_eq!(fold("-2147483648"), ConstantValue::Integer(i32::MIN));
        assert_eq!(fold("2147483648"), ConstantValue::Float(2_147_483_648.0));
    }

    #[test]
    fn hex_literals_wrap() {
        assert_eq!(fold("0xFFFFFFFF"), ConstantValue::Integer(-1));
        assert_eq!(fold("0x10"), ConstantValue::Integer(16));
    }

    #[test]
    fn string_casts() {
        assert_eq!(fold("(integer)\"abc\""), ConstantValue::Integer(0));
        assert_eq!(fold("(integer)\"42\""), ConstantValue::Integer(42));
        assert_eq!(fold("(float)\"x\""), ConstantValue::Float(0.0));
        assert_eq!(fold("(string)1.5"), ConstantValue::String("1.500000".into()));
        assert_eq!(fold("(rotation)\"junk\""), ConstantValue::Rotation(Rotation::IDENTITY));
        assert_eq!(fold("(quaternion)\"<0,0,0,1>\""), ConstantValue::Rotation(Rotation::IDENTITY));
        assert_eq!(fold("(vector)\"<1,2,3>\""), ConstantValue::Vector(Vector::new(1.0, 2.0, 3.0)));
        assert_eq!(fold("(integer)-2.9"), ConstantValue::Integer(-2));
    }

    #[test]
    fn string_cast_of_constant_list() {
        assert_eq!(fold("(string)[1, \"a\", 2.5]"), ConstantValue::String("1a2.500000".into()));
        let kept = resolve_with("(string)[1, x]", &["x"]).unwrap();
        assert!(!kept.is_constant());
    }

    #[test]
    fn list_cast_is_never_folded() {
        assert!(!resolve_with("(list)1", &[]).unwrap().is_constant());
    }

    #[test]
    fn unsupported_cast() {
        let err = fold_err("(vector)1");
        assert!(err.message.contains("Unsupported cast"));
    }

    #[test]
    fn invalid_typecast() {
        let err = fold_err("(foo)x");
        assert!(err.message.contains("Invalid typecast"));
        // a parenthesized variable followed by an operator is fine
        assert!(resolve_with("(x) + 1", &["x"]).is_ok());
    }

    #[test]
    fn mismatching_types() {
        let err = fold_err("\"a\" - \"b\"");
        assert!(err.message.contains("Mismatching type"));
        assert!(err.message.contains('-'));
        assert!(fold_err("1.5 << 2").message.contains("Mismatching type"));
        assert!(fold_err("~1.0").message.contains("Mismatching type"));
    }

    #[test]
    fn string_concat_and_negation() {
        assert_eq!(fold("\"a\" + \"b\""), ConstantValue::String("ab".into()));
        assert!(fold_err("-\"a\"").message.contains("not supported on string"));
    }

    #[test]
    fn division_by_zero_stays_runtime() {
        assert!(!resolve_with("1 / 0", &[]).unwrap().is_constant());
        assert!(!resolve_with("1.0 % 0.0", &[]).unwrap().is_constant());
    }

    #[test]
    fn logical_and_bitwise() {
        assert_eq!(fold("!0"), ConstantValue::Integer(1));
        assert_eq!(fold("~0"), ConstantValue::Integer(-1));
        assert_eq!(fold("1 << 4"), ConstantValue::Integer(16));
        assert_eq!(fold("6 & 3"), ConstantValue::Integer(2));
        assert_eq!(fold("TRUE && FALSE"), ConstantValue::Integer(0));
    }

    #[test]
    fn paren_adopts_child() {
        assert_eq!(fold("(1 + 2) * 3"), ConstantValue::Integer(9));
    }

    #[test]
    fn variables_are_retained() {
        let resolved = resolve_with("x + 1", &["x"]).unwrap();
        let Resolved::Retained(expr) = resolved else {
            panic!("expected retained");
        };
        assert!(matches!(*expr, RetainedExpr::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn variables_shadow_constants() {
        assert!(!resolve_with("PI", &["PI"]).unwrap().is_constant());
        assert!(resolve_with("PI", &[]).unwrap().is_constant());
    }

    #[test]
    fn vector_with_variable_component_is_retained() {
        let resolved = resolve_with("<x, 0, 0>", &["x"]).unwrap();
        let Resolved::Retained(expr) = resolved else {
            panic!("expected retained");
        };
        assert!(matches!(*expr, RetainedExpr::Vector { ref components } if components.len() == 3));
    }

    #[test]
    fn assigning_to_constant_fails() {
        assert!(fold_err("TRUE = 1").message.contains("Cannot assign"));
        assert!(resolve_with("x = 1", &["x"]).is_ok());
        assert!(fold_err("PI++").message.contains("constant"));
    }

    #[test]
    fn disabled_dialect_constants_are_plain_identifiers() {
        let scope = NoVariables;
        let resolver = Resolver::new(AcceptedFlags::LSL, &scope, 1);
        assert!(!resolver.resolve_tokens(&tokens("OS_NPC_FLY")).unwrap().is_constant());
    }
}
