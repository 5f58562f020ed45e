// AST (Abstract Syntax Tree) definitions for Forge programs

use std::fmt;

/// Parser-assigned identifier, unique within one parse. Used to memoize
/// per-node lowering of `attempt` expressions.
pub type NodeId = usize;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A type written in source: `int`, `Point`, `&Point`, `StringList`, ...
///
/// Annotations stay textual in the AST; the code generator maps them onto
/// its own type model once struct names are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAnnotation {
    pub name: String,
    pub by_ref: bool,
}

impl TypeAnnotation {
    pub fn named(name: impl Into<String>) -> Self {
        TypeAnnotation {
            name: name.into(),
            by_ref: false,
        }
    }

    pub fn reference(name: impl Into<String>) -> Self {
        TypeAnnotation {
            name: name.into(),
            by_ref: true,
        }
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.by_ref {
            write!(f, "&{}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Pow,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
}

impl BinOp {
    /// Binding power used by precedence climbing; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 0,
            BinOp::And => 1,
            BinOp::Eq | BinOp::Ne => 2,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 3,
            BinOp::Add | BinOp::Sub | BinOp::Pow => 4,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 5,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    /// The C spelling of the operator. `Pow` has no C operator and is
    /// lowered to a call instead.
    pub fn c_operator(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Pow => "^",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,    // -x
    Not,    // !x
    AddrOf, // &x
}

/// Postfix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Inc, // x++
    Dec, // x--
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_hint: Option<TypeAnnotation>,
}

/// Struct field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: TypeAnnotation,
}

/// `else if` arm of an `if` statement
#[derive(Debug, Clone, PartialEq)]
pub struct ElseIf {
    pub condition: AstNode,
    pub body: Vec<AstNode>,
}

/// Function body: either a braced block or a `=> expr` shorthand
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Vec<AstNode>),
    Expr(Box<AstNode>),
}

/// AST nodes representing statements and expressions
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    // Declarations
    FunctionDef {
        name: String,
        params: Vec<Param>,
        return_type: Option<TypeAnnotation>,
        body: FunctionBody,
        location: SourceLocation,
    },
    StructDef {
        name: String,
        fields: Vec<Field>,
        location: SourceLocation,
    },

    // Statements
    Let {
        name: String,
        type_hint: Option<TypeAnnotation>,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    Assignment {
        target: Box<AstNode>,
        value: Box<AstNode>,
        location: SourceLocation,
    },
    If {
        condition: Box<AstNode>,
        then_branch: Vec<AstNode>,
        else_ifs: Vec<ElseIf>,
        else_branch: Option<Vec<AstNode>>,
        location: SourceLocation,
    },
    While {
        condition: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    For {
        init: Box<AstNode>,
        condition: Box<AstNode>,
        increment: Box<AstNode>,
        body: Vec<AstNode>,
        location: SourceLocation,
    },
    Block {
        statements: Vec<AstNode>,
        location: SourceLocation,
    },
    Return {
        expr: Option<Box<AstNode>>,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    Load {
        path: String,
        location: SourceLocation,
    },
    AttemptRescue {
        try_block: Vec<AstNode>,
        error_name: String,
        rescue_block: Vec<AstNode>,
        location: SourceLocation,
    },
    ExpressionStatement {
        expr: Box<AstNode>,
        location: SourceLocation,
    },

    // Expressions
    IntLiteral(i64, SourceLocation),
    FloatLiteral(f64, SourceLocation),
    StringLiteral(String, SourceLocation),
    BoolLiteral(bool, SourceLocation),
    Null {
        location: SourceLocation,
    },
    Identifier(String, SourceLocation),
    Binary {
        op: BinOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
        location: SourceLocation,
    },
    Unary {
        op: UnOp,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
    Postfix {
        op: PostfixOp,
        operand: Box<AstNode>,
        location: SourceLocation,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
        /// Set on `input(...)` calls bound by an annotated `let`
        expected_type: Option<TypeAnnotation>,
        location: SourceLocation,
    },
    /// `.name` on an arbitrary receiver expression
    MemberAccess {
        object: Box<AstNode>,
        member: String,
        location: SourceLocation,
    },
    /// `ident.name`: field access, module-qualified call or container method
    PropertyAccess {
        object: Box<AstNode>,
        property: String,
        location: SourceLocation,
    },
    Subscript {
        target: Box<AstNode>,
        index: Box<AstNode>,
        location: SourceLocation,
    },
    ListLiteral {
        elements: Vec<AstNode>,
        /// Container variant forced by an annotated `let`
        forced_hint: Option<TypeAnnotation>,
        location: SourceLocation,
    },
    ArrayLiteral {
        elements: Vec<AstNode>,
        location: SourceLocation,
    },
    StructInstance {
        name: String,
        args: Vec<AstNode>,
        location: SourceLocation,
    },
    AttemptExpr {
        id: NodeId,
        try_expr: Box<AstNode>,
        error_name: String,
        rescue_expr: Box<AstNode>,
        location: SourceLocation,
    },
    Extern {
        name: String,
        param_types: Vec<TypeAnnotation>,
        return_type: Option<TypeAnnotation>,
        location: SourceLocation,
    },
}

impl AstNode {
    /// Get the source location of this node
    pub fn location(&self) -> &SourceLocation {
        match self {
            AstNode::FunctionDef { location, .. } => location,
            AstNode::StructDef { location, .. } => location,
            AstNode::Let { location, .. } => location,
            AstNode::Assignment { location, .. } => location,
            AstNode::If { location, .. } => location,
            AstNode::While { location, .. } => location,
            AstNode::For { location, .. } => location,
            AstNode::Block { location, .. } => location,
            AstNode::Return { location, .. } => location,
            AstNode::Break { location } => location,
            AstNode::Continue { location } => location,
            AstNode::Load { location, .. } => location,
            AstNode::AttemptRescue { location, .. } => location,
            AstNode::ExpressionStatement { location, .. } => location,
            AstNode::IntLiteral(_, loc) => loc,
            AstNode::FloatLiteral(_, loc) => loc,
            AstNode::StringLiteral(_, loc) => loc,
            AstNode::BoolLiteral(_, loc) => loc,
            AstNode::Null { location } => location,
            AstNode::Identifier(_, loc) => loc,
            AstNode::Binary { location, .. } => location,
            AstNode::Unary { location, .. } => location,
            AstNode::Postfix { location, .. } => location,
            AstNode::Call { location, .. } => location,
            AstNode::MemberAccess { location, .. } => location,
            AstNode::PropertyAccess { location, .. } => location,
            AstNode::Subscript { location, .. } => location,
            AstNode::ListLiteral { location, .. } => location,
            AstNode::ArrayLiteral { location, .. } => location,
            AstNode::StructInstance { location, .. } => location,
            AstNode::AttemptExpr { location, .. } => location,
            AstNode::Extern { location, .. } => location,
        }
    }

    /// Name of the identifier this node refers to, if it is one.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            AstNode::Identifier(name, _) => Some(name),
            _ => None,
        }
    }

    /// Visit this node and every descendant in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a AstNode)) {
        visit(self);
        match self {
            AstNode::FunctionDef { body, .. } => match body {
                FunctionBody::Block(stmts) => walk_all(stmts, visit),
                FunctionBody::Expr(expr) => expr.walk(visit),
            },
            AstNode::Let { value, .. } => value.walk(visit),
            AstNode::Assignment { target, value, .. } => {
                target.walk(visit);
                value.walk(visit);
            }
            AstNode::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
                ..
            } => {
                condition.walk(visit);
                walk_all(then_branch, visit);
                for arm in else_ifs {
                    arm.condition.walk(visit);
                    walk_all(&arm.body, visit);
                }
                if let Some(stmts) = else_branch {
                    walk_all(stmts, visit);
                }
            }
            AstNode::While { condition, body, .. } => {
                condition.walk(visit);
                walk_all(body, visit);
            }
            AstNode::For {
                init,
                condition,
                increment,
                body,
                ..
            } => {
                init.walk(visit);
                condition.walk(visit);
                increment.walk(visit);
                walk_all(body, visit);
            }
            AstNode::Block { statements, .. } => walk_all(statements, visit),
            AstNode::Return { expr, .. } => {
                if let Some(expr) = expr {
                    expr.walk(visit);
                }
            }
            AstNode::AttemptRescue {
                try_block,
                rescue_block,
                ..
            } => {
                walk_all(try_block, visit);
                walk_all(rescue_block, visit);
            }
            AstNode::ExpressionStatement { expr, .. } => expr.walk(visit),
            AstNode::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            AstNode::Unary { operand, .. } | AstNode::Postfix { operand, .. } => operand.walk(visit),
            AstNode::Call { callee, args, .. } => {
                callee.walk(visit);
                walk_all(args, visit);
            }
            AstNode::MemberAccess { object, .. } | AstNode::PropertyAccess { object, .. } => {
                object.walk(visit)
            }
            AstNode::Subscript { target, index, .. } => {
                target.walk(visit);
                index.walk(visit);
            }
            AstNode::ListLiteral { elements, .. } | AstNode::ArrayLiteral { elements, .. } => {
                walk_all(elements, visit)
            }
            AstNode::StructInstance { args, .. } => walk_all(args, visit),
            AstNode::AttemptExpr {
                try_expr,
                rescue_expr,
                ..
            } => {
                try_expr.walk(visit);
                rescue_expr.walk(visit);
            }
            AstNode::StructDef { .. }
            | AstNode::Break { .. }
            | AstNode::Continue { .. }
            | AstNode::Load { .. }
            | AstNode::IntLiteral(..)
            | AstNode::FloatLiteral(..)
            | AstNode::StringLiteral(..)
            | AstNode::BoolLiteral(..)
            | AstNode::Null { .. }
            | AstNode::Identifier(..)
            | AstNode::Extern { .. } => {}
        }
    }
}

fn walk_all<'a>(nodes: &'a [AstNode], visit: &mut impl FnMut(&'a AstNode)) {
    for node in nodes {
        node.walk(visit);
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub statements: Vec<AstNode>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    /// Top-level function definitions in source order.
    pub fn functions(&self) -> impl Iterator<Item = &AstNode> {
        self.statements
            .iter()
            .filter(|node| matches!(node, AstNode::FunctionDef { .. }))
    }
}
