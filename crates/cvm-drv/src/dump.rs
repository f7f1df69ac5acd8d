//! Plain-text renderers for `--dump-tree`/`--dump-symbols`. Not a stable
//! format — just enough structure for a human reading terminal output to
//! follow the tree and the symbol tables it resolved against.

use std::fmt::Write as _;

use cvm_par::{Ast, Node, NodeId, NodeKind, ScopeId, ScopeTree};

pub fn render_tokens(tokens: &[cvm_lex::Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        let _ = writeln!(out, "{:>4}:{:<3} {:?}", tok.span.pos.row, tok.span.pos.col, tok.kind);
    }
    out
}

pub fn render_ast(ast: &Ast, root: NodeId) -> String {
    let mut out = String::new();
    write_node(ast, root, 0, &mut out);
    out
}

fn write_node(ast: &Ast, id: NodeId, depth: usize, out: &mut String) {
    let node: &Node = ast.node(id);
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{indent}{}", describe(node));
    for &child in &node.children {
        write_node(ast, child, depth + 1, out);
    }
}

fn describe(node: &Node) -> String {
    match &node.kind {
        NodeKind::Module => "MODULE".to_string(),
        NodeKind::Constant(v) => format!("CONSTANT {v}"),
        NodeKind::Type => "TYPE".to_string(),
        NodeKind::Symbol(sym) => format!("SYMBOL {sym:?}"),
        NodeKind::UnaryOp(op) => format!("UNARY_OP {op:?}"),
        NodeKind::BinaryOp(op) => format!("BINARY_OP {op:?}"),
        NodeKind::Call(sym) => format!("CALL {sym:?}"),
        NodeKind::Function(sym) => format!("FUNCTION {sym:?}"),
        NodeKind::Block => "BLOCK".to_string(),
        NodeKind::Assignment(sym) => format!("ASSIGNMENT {sym:?}"),
        NodeKind::IfElse => "IF_ELSE".to_string(),
        NodeKind::While => "WHILE".to_string(),
        NodeKind::Return => "RETURN".to_string(),
        NodeKind::Break => "BREAK".to_string(),
    }
}

pub fn render_scopes(scopes: &ScopeTree, root: ScopeId) -> String {
    let mut out = String::new();
    write_scope(scopes, root, 0, &mut out);
    out
}

fn write_scope(scopes: &ScopeTree, id: ScopeId, depth: usize, out: &mut String) {
    let scope = scopes.scope(id);
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{indent}{}", scope.name);
    for &sym_id in &scope.symbols {
        let sym = scopes.symbol(sym_id);
        let _ = writeln!(
            out,
            "{indent}  {:?} {} #{}",
            sym.kind, sym.name, sym.local_index
        );
    }
    for &child in &scope.children {
        write_scope(scopes, child, depth + 1, out);
    }
}
