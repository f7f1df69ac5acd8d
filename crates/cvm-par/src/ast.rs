//! The syntax tree: an arena of [`Node`]s keyed by [`NodeId`] — integer
//! indices instead of owning pointers, so a node's children are plain index
//! lists and its scope back-reference is a plain [`ScopeId`].
//!
//! `NodeKind` is a closed enumeration matching the grammar's child-arity
//! table for each node shape; where the generator needs resolved data
//! beyond "which kind, which token, which children" — an operator, a
//! constant's value, a resolved symbol — it is carried as that variant's
//! payload, so dispatch on kind stays one exhaustive match rather than
//! virtual dispatch.

use crate::scope::{ScopeId, SymbolId};
use cvm_lex::Token;
use cvm_util::define_idx;

define_idx! {
    /// Index into the AST arena.
    pub struct NodeId;
}

/// A binary operator, named by the token that spells it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    NotEq,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    LogAnd,
    LogOr,
}

/// A unary operator. Unary `-`/`+` are lowered away by the parser:
/// `-x` becomes `BinOp::Sub` of `0` and `x`; `+x` is identity. Only the
/// two operators that have no such lowering remain here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Not,
    BitNot,
}

/// Node kind, closed and fixed. Every variant's doc comment
/// names its children in order; `CONSTANT`/`SYMBOL`/`BREAK` have none.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// declarations and functions in source order
    Module,
    /// integer value, already parsed from the literal's token text
    Constant(i32),
    /// one SYMBOL per declared name
    Type,
    /// resolved binding this identifier refers to; `None` only for the
    /// synthetic "argumentsList" container node under `FUNCTION` (the
    /// arity table gives that container kind `SYMBOL` too, though it names
    /// no binding of its own — its children are the real per-argument
    /// `TYPE`/`SYMBOL` pairs)
    Symbol(Option<SymbolId>),
    UnaryOp(UnOp),
    /// `[lhs, rhs]`
    BinaryOp(BinOp),
    /// resolved callee; children are argument expressions in order
    Call(SymbolId),
    /// resolved function symbol; children `[TYPE returnType, SYMBOL argumentsList, BLOCK body]`
    Function(SymbolId),
    /// zero or more statements
    Block,
    /// resolved assignment target; children `[expression]`
    Assignment(SymbolId),
    /// `[condition, thenStmt]` or `[condition, thenStmt, elseStmt]`
    IfElse,
    /// `[condition, body]`
    While,
    /// `[expression]`
    Return,
    Break,
}

/// One syntax-tree node: its kind (with any resolved payload), the token it
/// originated from, its children in order, and the scope it was parsed in.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub token: Token,
    pub children: Vec<NodeId>,
    pub scope: ScopeId,
}

/// The AST arena. Owned by the parser, then handed to the generator for
/// read-only traversal.
#[derive(Clone, Debug, Default)]
pub struct Ast {
    nodes: cvm_util::IndexVec<NodeId, Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }
}
