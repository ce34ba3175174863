//! Token, expression, and statement types for the script compiler front end.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::flags::AcceptedFlags;
use super::value::ConstantValue;

// ── Tokens ───────────────────────────────────────────────────────

/// An untyped token. `line` is the line the enclosing logical line began on,
/// so every token of one `LineInfo` carries the same number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }

    pub fn is(&self, text: &str) -> bool {
        self.text == text
    }
}

/// One logical line: everything up to a `;`, `{`, `}` or the end of a
/// preprocessor line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineInfo {
    pub line: usize,
    pub tokens: Vec<Token>,
}

impl LineInfo {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            tokens: Vec::new(),
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    pub fn first_is(&self, text: &str) -> bool {
        self.tokens.first().is_some_and(|t| t.is(text))
    }
}

impl fmt::Display for LineInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.texts().join(" "))
    }
}

// ── Types ────────────────────────────────────────────────────────

/// The seven primitive value types. `quaternion` is an alias of `rotation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LslType {
    Integer,
    Float,
    String,
    Key,
    Vector,
    Rotation,
    List,
}

impl LslType {
    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "integer" => LslType::Integer,
            "float" => LslType::Float,
            "string" => LslType::String,
            "key" => LslType::Key,
            "vector" => LslType::Vector,
            "rotation" | "quaternion" => LslType::Rotation,
            "list" => LslType::List,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            LslType::Integer => "integer",
            LslType::Float => "float",
            LslType::String => "string",
            LslType::Key => "key",
            LslType::Vector => "vector",
            LslType::Rotation => "rotation",
            LslType::List => "list",
        }
    }
}

impl fmt::Display for LslType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Parsed expressions ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    /// Member access: `v.x`, `r.s`
    Member,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Member => ".",
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::ModAssign => "%=",
        }
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::ModAssign
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
    BitNot,
    PreIncrement,
    PreDecrement,
    Cast(LslType),
}

impl UnaryOp {
    pub fn symbol(self) -> String {
        match self {
            UnaryOp::Plus => "+".into(),
            UnaryOp::Neg => "-".into(),
            UnaryOp::Not => "!".into(),
            UnaryOp::BitNot => "~".into(),
            UnaryOp::PreIncrement => "++".into(),
            UnaryOp::PreDecrement => "--".into(),
            UnaryOp::Cast(ty) => format!("({ty})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PostfixOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LevelKind {
    /// `( expr )`
    Paren,
    /// `[ a, b, c ]`
    List,
}

/// Parsed expression tree. Immutable once built; resolution produces a
/// separate [`Resolved`] tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    LeftUnary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    RightUnary {
        op: PostfixOp,
        operand: Box<Expr>,
    },
    Level {
        kind: LevelKind,
        children: Vec<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    /// Leaf token awaiting resolution: literal or identifier.
    Value(String),
    /// `< ... >` group; becomes a vector or rotation once its arity is known.
    Declaration(Vec<Expr>),
}

// ── Resolved expressions ─────────────────────────────────────────

/// Result of the constant resolver: either a fully reduced constant or an
/// expression retained for the code generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resolved", content = "value", rename_all = "snake_case")]
pub enum Resolved {
    Constant(ConstantValue),
    Retained(Box<RetainedExpr>),
}

impl Resolved {
    pub fn retained(expr: RetainedExpr) -> Self {
        Resolved::Retained(Box::new(expr))
    }

    pub fn as_constant(&self) -> Option<&ConstantValue> {
        match self {
            Resolved::Constant(value) => Some(value),
            Resolved::Retained(_) => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Resolved::Constant(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum RetainedExpr {
    Variable {
        name: String,
    },
    Binary {
        op: BinaryOp,
        left: Resolved,
        right: Resolved,
    },
    Member {
        object: Resolved,
        member: String,
    },
    Unary {
        op: UnaryOp,
        operand: Resolved,
    },
    Postfix {
        op: PostfixOp,
        operand: Resolved,
    },
    Call {
        name: String,
        args: Vec<Resolved>,
    },
    List {
        items: Vec<Resolved>,
    },
    Vector {
        components: Vec<Resolved>,
    },
    Rotation {
        components: Vec<Resolved>,
    },
}

// ── Statements ───────────────────────────────────────────────────

/// A block of statements. `braced == false` marks the implicit one-statement
/// block synthesized for a control-flow body written without braces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub line: usize,
    pub braced: bool,
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn braced(line: usize) -> Self {
        Self {
            line,
            braced: true,
            statements: Vec::new(),
        }
    }

    pub fn implicit(statement: Statement) -> Self {
        Self {
            line: statement.line,
            braced: false,
            statements: vec![statement],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub line: usize,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "statement", rename_all = "snake_case")]
pub enum StatementKind {
    Expression {
        expr: Resolved,
    },
    Declaration {
        ty: LslType,
        name: String,
        value: Option<Resolved>,
    },
    Return {
        value: Option<Resolved>,
    },
    StateChange {
        state: String,
    },
    Jump {
        label: String,
    },
    Label {
        label: String,
    },
    Block {
        block: Block,
    },
    If {
        condition: Resolved,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    While {
        condition: Resolved,
        body: Block,
    },
    DoWhile {
        body: Block,
        condition: Resolved,
    },
    For {
        init: Vec<Resolved>,
        condition: Option<Resolved>,
        step: Vec<Resolved>,
        body: Block,
    },
    Empty,
}

// ── Compile unit ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub ty: LslType,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalVariable {
    pub name: String,
    pub ty: LslType,
    pub line: usize,
    /// Initializer tokens as scanned, before resolution.
    pub initializer: Option<LineInfo>,
    /// Initializer after the constant resolver ran over it.
    pub value: Option<Resolved>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    /// `None` for `void` functions.
    pub return_type: Option<LslType>,
    pub params: Vec<Parameter>,
    pub body: Block,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventHandler {
    pub name: String,
    pub params: Vec<Parameter>,
    pub body: Block,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct State {
    pub name: String,
    pub line: usize,
    pub events: IndexMap<String, EventHandler>,
}

/// Everything the front end hands to the code generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileUnit {
    pub flags: AcceptedFlags,
    pub globals: IndexMap<String, GlobalVariable>,
    pub functions: IndexMap<String, Function>,
    pub states: IndexMap<String, State>,
    pub includes: Vec<String>,
}

impl CompileUnit {
    pub fn new(flags: AcceptedFlags) -> Self {
        Self {
            flags,
            globals: IndexMap::new(),
            functions: IndexMap::new(),
            states: IndexMap::new(),
            includes: Vec::new(),
        }
    }
}
