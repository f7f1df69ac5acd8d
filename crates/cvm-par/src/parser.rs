//! Recursive-descent parser for the source grammar.
//!
//! One token of lookahead everywhere, except at module level where a
//! second token distinguishes `type identifier (` (function) from
//! `type identifier ...` (declaration).

use crate::ast::{Ast, BinOp, Node, NodeId, NodeKind, UnOp};
use crate::error::ParseError;
use crate::scope::{ScopeId, ScopeTree, SymbolKind};
use cvm_lex::{Token, TokenKind};
use cvm_util::Symbol as Interned;

/// Everything the parser produced: the AST, the scope tree, and the
/// entry points into each (the MODULE node and the root scope).
pub struct ParseOutput {
    pub ast: Ast,
    pub scopes: ScopeTree,
    pub root: NodeId,
    pub root_scope: ScopeId,
}

/// Parse a complete token stream (as produced by `cvm_lex::Lexer`) into a
/// [`ParseOutput`]. `source` is needed to recover literal/identifier text
/// from token spans.
pub fn parse(source: &str, tokens: Vec<Token>) -> Result<ParseOutput, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        source,
        ast: Ast::new(),
        scopes: ScopeTree::new(),
        block_counter: 0,
    };
    let root = parser.scopes.new_root();
    parser
        .scopes
        .declare(root, Interned::intern("iput"), SymbolKind::Function, Some(1))
        .expect("root scope starts empty");
    let module = parser.parse_module(root)?;
    Ok(ParseOutput {
        ast: parser.ast,
        scopes: parser.scopes,
        root: module,
        root_scope: root,
    })
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
    ast: Ast,
    scopes: ScopeTree,
    block_counter: u32,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Token {
        self.tokens[self.pos]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_kind_at(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.current();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        if self.current_kind() == kind {
            Ok(self.advance())
        } else {
            Err(ParseError::Expected {
                expected,
                found: self.current(),
            })
        }
    }

    fn intern(&self, tok: &Token) -> Interned {
        Interned::intern(tok.text(self.source))
    }

    fn lookup(&self, scope: ScopeId, tok: &Token) -> Result<crate::scope::SymbolId, ParseError> {
        let name = self.intern(tok);
        self.scopes.lookup(scope, name).ok_or_else(|| ParseError::SymbolNotDefined {
            name: tok.text(self.source).to_string(),
            token: *tok,
        })
    }

    fn declare(
        &mut self,
        scope: ScopeId,
        tok: &Token,
        kind: SymbolKind,
        arg_count: Option<u32>,
    ) -> Result<crate::scope::SymbolId, ParseError> {
        let name = self.intern(tok);
        self.scopes
            .declare(scope, name, kind, arg_count)
            .map_err(|_| ParseError::AlreadyDefined {
                name: tok.text(self.source).to_string(),
                token: *tok,
            })
    }

    // module := (declaration | function)*
    fn parse_module(&mut self, root: ScopeId) -> Result<NodeId, ParseError> {
        let mut children = Vec::new();
        while self.current_kind() != TokenKind::Eof {
            if self.current_kind() != TokenKind::Int {
                return Err(ParseError::Expected {
                    expected: "a declaration or function",
                    found: self.current(),
                });
            }
            if self.peek_kind_at(2) == Some(TokenKind::LParen) {
                children.push(self.parse_function(root)?);
            } else {
                children.push(self.parse_declaration(root)?);
            }
        }
        let eof = self.current();
        Ok(self.ast.push(Node {
            kind: NodeKind::Module,
            token: eof,
            children,
            scope: root,
        }))
    }

    // declaration := type identifier (',' identifier)* ';'
    fn parse_declaration(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let type_tok = self.expect(TokenKind::Int, "'int'")?;
        let mut names = Vec::new();
        loop {
            let ident = self.expect(TokenKind::Identifier, "an identifier")?;
            let sym = self.declare(scope, &ident, SymbolKind::Variable, None)?;
            names.push(self.ast.push(Node {
                kind: NodeKind::Symbol(Some(sym)),
                token: ident,
                children: Vec::new(),
                scope,
            }));
            if self.current_kind() == TokenKind::Comma {
                self.advance();
                continue;
            }
            break;
        }
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(self.ast.push(Node {
            kind: NodeKind::Type,
            token: type_tok,
            children: names,
            scope,
        }))
    }

    // function := type identifier '(' [argument (',' argument)*] ')' block
    // argument := type identifier
    fn parse_function(&mut self, root: ScopeId) -> Result<NodeId, ParseError> {
        let return_type_tok = self.expect(TokenKind::Int, "'int'")?;
        let name_tok = self.expect(TokenKind::Identifier, "a function name")?;
        // Registered before the parameter list/body are parsed, so a
        // recursive call inside the body resolves.
        let fn_sym = self.declare(root, &name_tok, SymbolKind::Function, None)?;
        let fn_scope = self
            .scopes
            .new_child(root, self.intern(&name_tok).to_string());

        self.expect(TokenKind::LParen, "'('")?;
        let mut arg_type_nodes = Vec::new();
        if self.current_kind() != TokenKind::RParen {
            loop {
                let arg_type_tok = self.expect(TokenKind::Int, "'int'")?;
                let arg_name_tok = self.expect(TokenKind::Identifier, "an argument name")?;
                let arg_sym = self.declare(fn_scope, &arg_name_tok, SymbolKind::Argument, None)?;
                let symbol_node = self.ast.push(Node {
                    kind: NodeKind::Symbol(Some(arg_sym)),
                    token: arg_name_tok,
                    children: Vec::new(),
                    scope: fn_scope,
                });
                arg_type_nodes.push(self.ast.push(Node {
                    kind: NodeKind::Type,
                    token: arg_type_tok,
                    children: vec![symbol_node],
                    scope: fn_scope,
                }));
                if self.current_kind() == TokenKind::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        let arg_count = arg_type_nodes.len() as u32;
        self.scopes.symbol_mut(fn_sym).arg_count = Some(arg_count);

        let return_type_node = self.ast.push(Node {
            kind: NodeKind::Type,
            token: return_type_tok,
            children: Vec::new(),
            scope: root,
        });
        let arguments_list_node = self.ast.push(Node {
            kind: NodeKind::Symbol(None),
            token: name_tok,
            children: arg_type_nodes,
            scope: fn_scope,
        });
        let body = self.parse_block_body(fn_scope)?;

        Ok(self.ast.push(Node {
            kind: NodeKind::Function(fn_sym),
            token: name_tok,
            children: vec![return_type_node, arguments_list_node, body],
            scope: root,
        }))
    }

    /// `{ statement* }`, parsed directly into `scope` with no new child
    /// scope — used for a function's own top-level block, since
    /// the function's fresh scope "owns its arguments and the statements
    /// of its top-level block."
    fn parse_block_body(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let open = self.expect(TokenKind::LBrace, "'{'")?;
        let mut stmts = Vec::new();
        while self.current_kind() != TokenKind::RBrace {
            stmts.push(self.parse_statement(scope)?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(self.ast.push(Node {
            kind: NodeKind::Block,
            token: open,
            children: stmts,
            scope,
        }))
    }

    /// A `{ ... }` appearing as a `statement`: introduces its own child
    /// scope named `block<N>`.
    fn parse_nested_block(&mut self, parent: ScopeId) -> Result<NodeId, ParseError> {
        let name = format!("block{}", self.block_counter);
        self.block_counter += 1;
        let scope = self.scopes.new_child(parent, name);
        self.parse_block_body(scope)
    }

    // statement := block | declaration | assignment | ifElse | while
    //            | return | break | call ';'
    fn parse_statement(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        match self.current_kind() {
            TokenKind::LBrace => self.parse_nested_block(scope),
            TokenKind::Int => self.parse_declaration(scope),
            TokenKind::If => self.parse_if_else(scope),
            TokenKind::While => self.parse_while(scope),
            TokenKind::Return => self.parse_return(scope),
            TokenKind::Break => self.parse_break(scope),
            TokenKind::Identifier => {
                if self.peek_kind_at(1) == Some(TokenKind::LParen) {
                    let call = self.parse_call(scope)?;
                    self.expect(TokenKind::Semicolon, "';'")?;
                    Ok(call)
                } else {
                    self.parse_assignment(scope)
                }
            }
            _ => Err(ParseError::Expected {
                expected: "a statement",
                found: self.current(),
            }),
        }
    }

    // assignment := identifier '=' condition ';'
    fn parse_assignment(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let ident = self.expect(TokenKind::Identifier, "an identifier")?;
        let sym = self.lookup(scope, &ident)?;
        self.expect(TokenKind::Assign, "'='")?;
        let rhs = self.parse_condition(scope)?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(self.ast.push(Node {
            kind: NodeKind::Assignment(sym),
            token: ident,
            children: vec![rhs],
            scope,
        }))
    }

    // ifElse := 'if' '(' condition ')' statement ['else' statement]
    fn parse_if_else(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let if_tok = self.expect(TokenKind::If, "'if'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.parse_condition(scope)?;
        self.expect(TokenKind::RParen, "')'")?;
        let then_branch = self.parse_statement(scope)?;
        let mut children = vec![cond, then_branch];
        if self.current_kind() == TokenKind::Else {
            self.advance();
            children.push(self.parse_statement(scope)?);
        }
        Ok(self.ast.push(Node {
            kind: NodeKind::IfElse,
            token: if_tok,
            children,
            scope,
        }))
    }

    // while := 'while' '(' condition ')' statement
    fn parse_while(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let while_tok = self.expect(TokenKind::While, "'while'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.parse_condition(scope)?;
        self.expect(TokenKind::RParen, "')'")?;
        let body = self.parse_statement(scope)?;
        Ok(self.ast.push(Node {
            kind: NodeKind::While,
            token: while_tok,
            children: vec![cond, body],
            scope,
        }))
    }

    // return := 'return' expression ';'
    fn parse_return(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let ret_tok = self.expect(TokenKind::Return, "'return'")?;
        let expr = self.parse_expression(scope)?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(self.ast.push(Node {
            kind: NodeKind::Return,
            token: ret_tok,
            children: vec![expr],
            scope,
        }))
    }

    // break := 'break' ';'
    fn parse_break(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let break_tok = self.expect(TokenKind::Break, "'break'")?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(self.ast.push(Node {
            kind: NodeKind::Break,
            token: break_tok,
            children: Vec::new(),
            scope,
        }))
    }

    // call := identifier '(' [condition (',' condition)*] ')'
    fn parse_call(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let ident = self.expect(TokenKind::Identifier, "a function name")?;
        let sym = self.lookup(scope, &ident)?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.current_kind() != TokenKind::RParen {
            loop {
                args.push(self.parse_condition(scope)?);
                if self.current_kind() == TokenKind::Comma {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(self.ast.push(Node {
            kind: NodeKind::Call(sym),
            token: ident,
            children: args,
            scope,
        }))
    }

    // condition := logical
    fn parse_condition(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        self.parse_logical(scope)
    }

    // logical := comparison (('&&'|'||') comparison)*
    fn parse_logical(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_comparison(scope)?;
        loop {
            let op = match self.current_kind() {
                TokenKind::AmpAmp => BinOp::LogAnd,
                TokenKind::PipePipe => BinOp::LogOr,
                _ => break,
            };
            let tok = self.advance();
            let rhs = self.parse_comparison(scope)?;
            lhs = self.ast.push(Node {
                kind: NodeKind::BinaryOp(op),
                token: tok,
                children: vec![lhs, rhs],
                scope,
            });
        }
        Ok(lhs)
    }

    // comparison := expression (('=='|'!='|'>'|'>='|'<'|'<=') expression)*
    fn parse_comparison(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_expression(scope)?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Eq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                TokenKind::Greater => BinOp::Greater,
                TokenKind::GreaterEq => BinOp::GreaterEq,
                TokenKind::Less => BinOp::Less,
                TokenKind::LessEq => BinOp::LessEq,
                _ => break,
            };
            let tok = self.advance();
            let rhs = self.parse_expression(scope)?;
            lhs = self.ast.push(Node {
                kind: NodeKind::BinaryOp(op),
                token: tok,
                children: vec![lhs, rhs],
                scope,
            });
        }
        Ok(lhs)
    }

    // expression := term (('+'|'-') term)*
    fn parse_expression(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_term(scope)?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let tok = self.advance();
            let rhs = self.parse_term(scope)?;
            lhs = self.ast.push(Node {
                kind: NodeKind::BinaryOp(op),
                token: tok,
                children: vec![lhs, rhs],
                scope,
            });
        }
        Ok(lhs)
    }

    // term := bitwise (('*'|'/') bitwise)*
    fn parse_term(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_bitwise(scope)?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            let tok = self.advance();
            let rhs = self.parse_bitwise(scope)?;
            lhs = self.ast.push(Node {
                kind: NodeKind::BinaryOp(op),
                token: tok,
                children: vec![lhs, rhs],
                scope,
            });
        }
        Ok(lhs)
    }

    // bitwise := factor (('&'|'|'|'^'|'<<'|'>>') factor)*
    fn parse_bitwise(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_factor(scope)?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Amp => BinOp::And,
                TokenKind::Pipe => BinOp::Or,
                TokenKind::Caret => BinOp::Xor,
                TokenKind::Shl => BinOp::Shl,
                TokenKind::Shr => BinOp::Shr,
                _ => break,
            };
            let tok = self.advance();
            let rhs = self.parse_factor(scope)?;
            lhs = self.ast.push(Node {
                kind: NodeKind::BinaryOp(op),
                token: tok,
                children: vec![lhs, rhs],
                scope,
            });
        }
        Ok(lhs)
    }

    // factor := ('~'|'!'|'-'|'+')? (integer | '(' condition ')' | identifier | call)
    fn parse_factor(&mut self, scope: ScopeId) -> Result<NodeId, ParseError> {
        match self.current_kind() {
            TokenKind::Tilde => {
                let tok = self.advance();
                let operand = self.parse_factor(scope)?;
                Ok(self.ast.push(Node {
                    kind: NodeKind::UnaryOp(UnOp::BitNot),
                    token: tok,
                    children: vec![operand],
                    scope,
                }))
            }
            TokenKind::Bang => {
                let tok = self.advance();
                let operand = self.parse_factor(scope)?;
                Ok(self.ast.push(Node {
                    kind: NodeKind::UnaryOp(UnOp::Not),
                    token: tok,
                    children: vec![operand],
                    scope,
                }))
            }
            TokenKind::Minus => {
                // Unary minus lowers to `BINARY_OP(0, operand, Sub)`.
                let tok = self.advance();
                let operand = self.parse_factor(scope)?;
                let zero = self.ast.push(Node {
                    kind: NodeKind::Constant(0),
                    token: tok,
                    children: Vec::new(),
                    scope,
                });
                Ok(self.ast.push(Node {
                    kind: NodeKind::BinaryOp(BinOp::Sub),
                    token: tok,
                    children: vec![zero, operand],
                    scope,
                }))
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_factor(scope)
            }
            TokenKind::IntegerLiteral => {
                let tok = self.advance();
                let value = tok.text(self.source).parse::<i64>().unwrap_or(0) as i32;
                Ok(self.ast.push(Node {
                    kind: NodeKind::Constant(value),
                    token: tok,
                    children: Vec::new(),
                    scope,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_condition(scope)?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Identifier => {
                if self.peek_kind_at(1) == Some(TokenKind::LParen) {
                    self.parse_call(scope)
                } else {
                    let ident = self.advance();
                    let sym = self.lookup(scope, &ident)?;
                    Ok(self.ast.push(Node {
                        kind: NodeKind::Symbol(Some(sym)),
                        token: ident,
                        children: Vec::new(),
                        scope,
                    }))
                }
            }
            _ => Err(ParseError::Expected {
                expected: "an expression",
                found: self.current(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use crate::scope::SymbolKind;
    use cvm_lex::Lexer;

    fn parse_src(src: &str) -> ParseOutput {
        let tokens = Lexer::new(src).tokenize().expect("lex failed");
        parse(src, tokens).expect("parse failed")
    }

    #[test]
    fn factorial_program_parses_with_recursive_call() {
        let src = "int main(){ int n; n=6; iput(fact(n)); return 0; } \
                    int fact(int x){ if (x<=1) return 1; return x*fact(x-1); }";
        let out = parse_src(src);
        let module = out.ast.node(out.root);
        assert!(matches!(module.kind, NodeKind::Module));
        assert_eq!(module.children.len(), 2);
    }

    #[test]
    fn undefined_symbol_is_rejected() {
        let src = "int main(){ y = 1; return 0; }";
        let tokens = Lexer::new(src).tokenize().unwrap();
        let err = parse(src, tokens).unwrap_err();
        assert!(matches!(err, ParseError::SymbolNotDefined { .. }));
    }

    #[test]
    fn duplicate_declaration_in_same_scope_is_rejected() {
        let src = "int main(){ int x; int x; return 0; }";
        let tokens = Lexer::new(src).tokenize().unwrap();
        let err = parse(src, tokens).unwrap_err();
        assert!(matches!(err, ParseError::AlreadyDefined { .. }));
    }

    #[test]
    fn nested_blocks_get_independent_scopes() {
        let src = "int main(){ { int x; } { int x; } return 0; }";
        let out = parse_src(src);
        let module = out.ast.node(out.root);
        let main_fn = out.ast.node(module.children[0]);
        let NodeKind::Function(_) = main_fn.kind else {
            panic!("expected Function node")
        };
        let body = out.ast.node(main_fn.children[2]);
        assert_eq!(body.children.len(), 3); // two blocks + return
    }

    #[test]
    fn arguments_are_dense_and_distinct_from_locals() {
        let src = "int add(int a, int b){ int c; c=a+b; return c; }";
        let out = parse_src(src);
        let module = out.ast.node(out.root);
        let func = out.ast.node(module.children[0]);
        let NodeKind::Function(fn_sym) = func.kind else {
            panic!()
        };
        let fn_scope = out.scopes.symbol(fn_sym).scope;
        // fn_scope here refers to the *function's own* symbol's scope
        // (root), not the body scope; fetch the body scope from the
        // block node instead.
        let _ = fn_scope;
        let body = out.ast.node(func.children[2]);
        let body_scope = body.scope;
        let scope = out.scopes.scope(body_scope);
        let arg_names: Vec<_> = scope
            .symbols
            .iter()
            .map(|&s| out.scopes.symbol(s))
            .filter(|s| s.kind == SymbolKind::Argument)
            .map(|s| s.local_index)
            .collect();
        assert_eq!(arg_names, vec![0, 1]);
    }

    #[test]
    fn unary_minus_lowers_to_binary_sub_from_zero() {
        let src = "int main(){ iput(-3+5); return 0; }";
        let out = parse_src(src);
        // Just confirming this parses; precise shape is exercised by the
        // generator's S4 arithmetic-precedence test.
        let module = out.ast.node(out.root);
        assert_eq!(module.children.len(), 1);
    }

    #[test]
    fn missing_entry_point_still_parses_successfully() {
        // S6: "no entry point" is a codegen failure, not a parse failure.
        let src = "int foo(){ return 0; }";
        let out = parse_src(src);
        assert_eq!(out.ast.node(out.root).children.len(), 1);
    }
}
