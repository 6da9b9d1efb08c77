//! The typed AST. `Expr`/`Stmt` are tagged variants over every JS
//! expression/statement form; every node owns its source range. Children are
//! stored as `ExprId`/`StmtId` arena handles, not owning pointers or `Box`,
//! so that the mangler can overwrite a child slot in place and the lowerer
//! can replace a subtree without disturbing any other handle into the tree.

use crate::symbol::SymbolId;
use jsc_rowan::{Idx, Name, TextRange};

pub type ExprId = Idx<ExprNode>;
pub type StmtId = Idx<StmtNode>;

#[derive(Debug, Clone)]
pub struct ExprNode {
    pub range: TextRange,
    pub kind: Expr,
}

#[derive(Debug, Clone)]
pub struct StmtNode {
    pub range: TextRange,
    pub kind: Stmt,
}

/// Owner of every `ExprNode`/`StmtNode` parsed out of one source file:
/// created at parse start, append-only during parsing, released when the
/// printer finishes with it.
#[derive(Debug, Default)]
pub struct AstArena {
    pub exprs: jsc_rowan::Arena<ExprNode>,
    pub stmts: jsc_rowan::Arena<StmtNode>,
}

impl AstArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, range: TextRange, kind: Expr) -> ExprId {
        self.exprs.alloc(ExprNode { range, kind })
    }

    pub fn alloc_stmt(&mut self, range: TextRange, kind: Stmt) -> StmtId {
        self.stmts.alloc(StmtNode { range, kind })
    }

    pub fn expr(&self, id: ExprId) -> &ExprNode {
        &self.exprs[id]
    }

    pub fn stmt(&self, id: StmtId) -> &StmtNode {
        &self.stmts[id]
    }

    pub fn expr_mut(&mut self, id: ExprId) -> &mut ExprNode {
        &mut self.exprs[id]
    }

    pub fn stmt_mut(&mut self, id: StmtId) -> &mut StmtNode {
        &mut self.stmts[id]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Instanceof,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalescing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    BitNot,
    Not,
    Void,
    Delete,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

/// `AssignOp::Eq` is plain `=`; the rest are compound, including the
/// logical-assignment family (`&&=`, `||=`, `??=`) that share `=`'s
/// right-associativity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Eq,
    AddEq,
    SubEq,
    MulEq,
    DivEq,
    ModEq,
    ExpEq,
    BitAndEq,
    BitOrEq,
    BitXorEq,
    ShlEq,
    ShrEq,
    UShrEq,
    AndEq,
    OrEq,
    NullishEq,
}

#[derive(Debug, Clone)]
pub struct TemplatePart {
    /// `None` when the cooked form is invalid; tagged templates still see
    /// the (unusable) part via `raw`.
    pub cooked: Option<String>,
    pub raw: String,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct TemplateLiteral {
    /// `parts.len() == exprs.len() + 1`.
    pub parts: Vec<TemplatePart>,
    pub exprs: Vec<ExprId>,
}

/// A single link in a member/call chain. `optional` marks a `?.`
/// continuation; `chain_start`/`chain_continue` is tracked by the parser via
/// `OptionalChainLink` position rather than recomputed from context, since a
/// chain is a contiguous run terminated by the first non-optional
/// continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainLinkPosition {
    /// Not part of any optional chain.
    None,
    /// First `?.` in a chain.
    ChainStart,
    /// A later `.`/`[...]`/`(...)` inside a chain opened by an earlier `?.`.
    ChainContinue,
}

#[derive(Debug, Clone)]
pub enum PropertyKey {
    Ident(Name),
    PrivateName(Name),
    String(String),
    Number(f64),
    Computed(ExprId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
    Method,
    Spread,
}

#[derive(Debug, Clone)]
pub struct ObjectProperty {
    pub key: PropertyKey,
    pub value: ExprId,
    pub kind: PropertyKind,
    pub shorthand: bool,
    pub computed: bool,
}

#[derive(Debug, Clone)]
pub enum ArrayElement {
    Expr(ExprId),
    Spread(ExprId),
    Hole,
}

#[derive(Debug, Clone)]
pub struct Argument {
    pub expr: ExprId,
    pub spread: bool,
}

/// Function/arrow parameter list entry. Covers the binding-pattern subset
/// allowed there: a simple assignment target, or a destructuring pattern
/// whose own leaves are themselves simple assignment targets.
#[derive(Debug, Clone)]
pub struct Param {
    pub pattern: Pattern,
    pub default: Option<ExprId>,
    pub rest: bool,
}

/// Binding pattern: array/object destructuring whose leaves are simple
/// assignment targets, possibly with defaults and one trailing rest
/// without a default.
#[derive(Debug, Clone)]
pub enum Pattern {
    Ident(SymbolId),
    Array(ArrayPattern),
    Object(ObjectPattern),
    Assign(Box<Pattern>, ExprId),
    Rest(Box<Pattern>),
    /// A pattern reinterpreted from an arbitrary expression that turned out
    /// not to be a plain identifier/array/object shape; kept so diagnostics
    /// can point at the exact offending subexpression when an object
    /// literal is reinterpreted as a destructuring target.
    Expr(ExprId),
}

#[derive(Debug, Clone)]
pub struct ArrayPattern {
    pub elements: Vec<Option<Pattern>>,
    pub rest: Option<Box<Pattern>>,
}

#[derive(Debug, Clone)]
pub struct ObjectPatternProp {
    pub key: PropertyKey,
    pub value: Pattern,
    pub computed: bool,
    pub shorthand: bool,
}

#[derive(Debug, Clone)]
pub struct ObjectPattern {
    pub props: Vec<ObjectPatternProp>,
    pub rest: Option<Box<Pattern>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Normal,
    Generator,
    Async,
    AsyncGenerator,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Option<SymbolId>,
    pub kind: FunctionKind,
    pub params: Vec<Param>,
    pub body: FunctionBody,
    pub is_arrow: bool,
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(Vec<StmtId>),
    /// Arrow with a concise (expression) body.
    Expr(ExprId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassMemberKind {
    Field,
    Method,
    Get,
    Set,
    StaticInit,
}

#[derive(Debug, Clone)]
pub struct ClassMember {
    pub key: PropertyKey,
    pub kind: ClassMemberKind,
    pub is_static: bool,
    pub is_accessor_field: bool,
    pub computed: bool,
    /// `None` for a field with no initializer, or the static-init block.
    pub value: Option<ExprId>,
    pub params: Vec<Param>,
    pub body: Option<Vec<StmtId>>,
    pub range: TextRange,
}

#[derive(Debug, Clone)]
pub struct ClassBody {
    pub members: Vec<ClassMember>,
    /// Index of `members` holding the constructor, if any — enforced ≤1 at
    /// parse time.
    pub constructor: Option<usize>,
    pub superclass: Option<ExprId>,
}

#[derive(Debug, Clone)]
pub struct ClassExpr {
    pub name: Option<SymbolId>,
    pub body: ClassBody,
}

#[derive(Debug, Clone)]
pub enum JsxChild {
    Text(String),
    Expr(Option<ExprId>),
    Element(Box<JsxElement>),
    Spread(ExprId),
}

#[derive(Debug, Clone)]
pub struct JsxAttribute {
    pub name: String,
    pub value: Option<JsxAttributeValue>,
}

#[derive(Debug, Clone)]
pub enum JsxAttributeValue {
    String(String),
    Expr(ExprId),
    Spread(ExprId),
}

#[derive(Debug, Clone)]
pub struct JsxElement {
    /// `None` for a fragment (`<>...</>`).
    pub name: Option<String>,
    pub attributes: Vec<JsxAttribute>,
    pub children: Vec<JsxChild>,
    pub self_closing: bool,
}

#[derive(Debug, Clone)]
pub enum Expr {
    NumberLit(f64),
    BigIntLit(String),
    StringLit(String),
    BooleanLit(bool),
    NullLit,
    RegexLit { pattern: String, flags: String },
    Identifier(SymbolId),
    /// `this` — not symbol-resolved (it isn't lexically bound the way
    /// identifiers are), but still validated for placement (arrow bodies
    /// inherit the enclosing `this`; class field initializers get their
    /// own).
    This,
    Super,
    NewTarget,
    ImportMeta,
    Template(TemplateLiteral),
    TaggedTemplate {
        tag: ExprId,
        quasi: TemplateLiteral,
    },
    Array(Vec<ArrayElement>),
    Object(Vec<ObjectProperty>),
    Function(Box<Function>),
    Class(Box<ClassExpr>),
    Unary {
        op: UnaryOp,
        argument: ExprId,
    },
    Update {
        op: UpdateOp,
        argument: ExprId,
        prefix: bool,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Logical {
        op: LogicalOp,
        left: ExprId,
        right: ExprId,
    },
    /// `**` — kept distinct from `Binary` only because its right-side unary
    /// restriction (an unparenthesized unary may not appear there) is
    /// checked once at parse time and never needs revisiting.
    Exponent {
        base: ExprId,
        exponent: ExprId,
    },
    Assign {
        op: AssignOp,
        target: ExprId,
        value: ExprId,
    },
    Conditional {
        test: ExprId,
        consequent: ExprId,
        alternate: ExprId,
    },
    Sequence(Vec<ExprId>),
    Member {
        object: ExprId,
        property: PropertyKey,
        computed: bool,
        chain: ChainLinkPosition,
    },
    Call {
        callee: ExprId,
        arguments: Vec<Argument>,
        chain: ChainLinkPosition,
    },
    New {
        callee: ExprId,
        arguments: Vec<Argument>,
    },
    Spread(ExprId),
    Paren(ExprId),
    Yield {
        argument: Option<ExprId>,
        delegate: bool,
    },
    Await(ExprId),
    Jsx(Box<JsxElement>),
    /// Produced only by the mangler/lowerer: a marker that a call target is
    /// known-pure and safe to tree-shake.
    PureAnnotated(ExprId),
    /// A parse error recovered at the expression level; the original tokens
    /// are not retained (this is a typed AST, not a lossless CST), only the
    /// range for diagnostics.
    Error,
}

#[derive(Debug, Clone)]
pub struct VariableDeclarator {
    pub pattern: Pattern,
    pub init: Option<ExprId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub test: Option<ExprId>,
    pub consequent: Vec<StmtId>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Vec<StmtId>,
}

#[derive(Debug, Clone)]
pub enum ForInit {
    VarDecl(DeclKind, Vec<VariableDeclarator>),
    Expr(ExprId),
    None,
}

#[derive(Debug, Clone)]
pub enum ForHead {
    /// Classic `for (init; test; update)`.
    Classic {
        init: ForInit,
        test: Option<ExprId>,
        update: Option<ExprId>,
    },
    In {
        decl_kind: Option<DeclKind>,
        pattern: Pattern,
        right: ExprId,
    },
    Of {
        decl_kind: Option<DeclKind>,
        pattern: Pattern,
        right: ExprId,
        is_await: bool,
    },
}

#[derive(Debug, Clone)]
pub enum ImportSpecifier {
    Default(SymbolId),
    Namespace(SymbolId),
    Named { imported: Name, local: SymbolId },
}

#[derive(Debug, Clone)]
pub enum ExportSpecifier {
    Named { local: Name, exported: Name },
    Default,
    All { exported: Option<Name> },
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(ExprId),
    Block(Vec<StmtId>),
    Empty,
    Debugger,
    VarDecl {
        kind: DeclKind,
        declarations: Vec<VariableDeclarator>,
    },
    FunctionDecl {
        function: Box<Function>,
    },
    ClassDecl {
        class: Box<ClassExpr>,
    },
    If {
        test: ExprId,
        consequent: StmtId,
        alternate: Option<StmtId>,
    },
    For {
        head: ForHead,
        body: StmtId,
    },
    While {
        test: ExprId,
        body: StmtId,
    },
    DoWhile {
        body: StmtId,
        test: ExprId,
    },
    Switch {
        discriminant: ExprId,
        cases: Vec<SwitchCase>,
    },
    Try {
        block: Vec<StmtId>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<StmtId>>,
    },
    Throw(ExprId),
    Return(Option<ExprId>),
    Break(Option<Name>),
    Continue(Option<Name>),
    Labeled {
        label: Name,
        body: StmtId,
    },
    With {
        object: ExprId,
        body: StmtId,
    },
    /// Lowered Annex-B form: `if (c) { let f = function(){}; var f = f; }`
    /// is represented directly as `Block` + `FunctionDecl` + a synthesized
    /// `VarDecl`, so no separate `Stmt` variant is needed for it (spec
    /// §4.8) — see `jsc_parser::syntax::stmt::annex_b_hoist`.
    Import {
        specifiers: Vec<ImportSpecifier>,
        source: String,
    },
    Export {
        specifiers: Vec<ExportSpecifier>,
        source: Option<String>,
        declaration: Option<StmtId>,
    },
    /// Recovered syntax error at the statement level; a syntax error
    /// inside a function body becomes an error node with a best-effort
    /// range rather than aborting the enclosing file.
    Error,
}
