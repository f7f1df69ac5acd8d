//! The code generator proper: [`generate`] walks a [`Ast`]/[`ScopeTree`]
//! pair and produces an [`ExecutableImage`].
//!
//! Functions, `if`/`else` branches, and `while` bodies are each lowered into
//! their own scratch image first, so their exact word length is known
//! before the caller has to compute a jump distance, and then spliced onto
//! the image they belong in. A relative jump's operand is added to the
//! address of the operand word itself — the dispatch loop leaves `ip`
//! sitting on the operand when it evaluates a jump, it never advances past
//! it first — so every offset computed below is one more than the plain
//! "words to skip" count.
//!
//! `break` is lowered by threading a mutable fix-up list down through
//! statement generation rather than emitting a sentinel value to scan for
//! afterwards: `gen_statement` carries `Option<&mut Vec<usize>>`, `Some`
//! while inside a `while` body and `None` everywhere else (so a `break`
//! outside any loop is a hard error). Each `break` emits its own real `JMP`
//! with a zero placeholder operand and records that operand's address in
//! the list; nested `if`/`else` scratch images merge their own local lists
//! into the caller's, translating each recorded address by the position the
//! scratch image is spliced at. `gen_while` patches every collected address
//! once the loop's exit point is known.

use cvm_par::{Ast, BinOp, NodeId, NodeKind, ParseOutput, ScopeId, ScopeTree, SymbolId,
              SymbolKind, UnOp};
use cvm_util::{FxHashMap, Symbol as Interned};

use crate::error::CodegenError;
use crate::image::{ExecutableImage, Opcode};

type Result<T> = std::result::Result<T, CodegenError>;

/// Entry-stub size in words: `CALL main, 0` (3 words) then `HALT` (1 word).
const ENTRY_STUB_LEN: i32 = 4;

/// Lower a fully parsed and resolved program to an executable image.
pub fn generate(parsed: &ParseOutput) -> Result<ExecutableImage> {
    let iput = Interned::intern("iput");
    let mut gen = Generator {
        ast: &parsed.ast,
        scopes: &parsed.scopes,
        func_addresses: FxHashMap::default(),
        iput,
    };
    gen.run(parsed.root, parsed.root_scope)
}

struct Generator<'a> {
    ast: &'a Ast,
    scopes: &'a ScopeTree,
    func_addresses: FxHashMap<SymbolId, i32>,
    iput: Interned,
}

/// Map from a `VARIABLE` symbol to its frame-relative local slot.
type Locals = FxHashMap<SymbolId, u32>;

impl<'a> Generator<'a> {
    fn run(&mut self, root: NodeId, root_scope: ScopeId) -> Result<ExecutableImage> {
        let root_node = self.ast.node(root);
        let mut img = ExecutableImage::new();
        for _ in 0..ENTRY_STUB_LEN {
            img.emit_word(0);
        }

        for &child in &root_node.children {
            if let NodeKind::Function(sym) = self.ast.node(child).kind {
                let address = img.position() as i32;
                self.func_addresses.insert(sym, address);
                let body = self.gen_function(child)?;
                img.splice(&body);
            }
        }

        let main = self.find_main(root_scope).ok_or(CodegenError::NoEntryPoint)?;
        let main_address = *self
            .func_addresses
            .get(&main)
            .ok_or(CodegenError::NoEntryPoint)?;

        img.patch(0, Opcode::Call.into());
        img.patch(1, main_address);
        img.patch(2, 0);
        img.patch(3, Opcode::Halt.into());

        Ok(img)
    }

    /// A zero-argument `FUNCTION` symbol named `main` directly in the root
    /// scope.
    fn find_main(&self, root_scope: ScopeId) -> Option<SymbolId> {
        let main_name = Interned::intern("main");
        self.scopes
            .scope(root_scope)
            .symbols
            .iter()
            .copied()
            .find(|&s| {
                let sym = self.scopes.symbol(s);
                sym.kind == SymbolKind::Function
                    && sym.name == main_name
                    && sym.arg_count == Some(0)
            })
    }

    fn gen_function(&mut self, node: NodeId) -> Result<ExecutableImage> {
        let function = self.ast.node(node);
        let body = match function.children.as_slice() {
            [_return_type, _arguments, body] => *body,
            _ => return Err(CodegenError::MalformedNode("FUNCTION")),
        };

        let mut img = ExecutableImage::new();
        let mut locals = Locals::default();
        self.collect_locals(body, &mut locals);
        for _ in 0..locals.len() {
            img.emit_opcode(Opcode::Const);
            img.emit_word(0);
        }

        self.gen_statement(body, &mut img, &locals, None)?;

        if img.last_word() != Some(Opcode::Ret.into()) {
            img.emit_opcode(Opcode::Const);
            img.emit_word(0);
            img.emit_opcode(Opcode::Ret);
        }

        Ok(img)
    }

    /// Depth-first, pre-order: every `VARIABLE` declaration anywhere in the
    /// body gets one frame-relative slot, regardless of nesting depth.
    /// Nested blocks each have their own parser-level scope, so the
    /// parser's own per-scope `local_index` restarts at 0 inside them, but
    /// the virtual machine has only one flat local slab per call frame —
    /// this walk renumbers every declaration densely across the whole
    /// function instead.
    fn collect_locals(&self, node: NodeId, locals: &mut Locals) {
        let n = self.ast.node(node);
        match &n.kind {
            NodeKind::Type => {
                for &child in &n.children {
                    if let NodeKind::Symbol(Some(sym)) = self.ast.node(child).kind {
                        let next = locals.len() as u32;
                        locals.insert(sym, next);
                    }
                }
            }
            NodeKind::Block => {
                for &stmt in &n.children {
                    self.collect_locals(stmt, locals);
                }
            }
            NodeKind::IfElse => {
                for &stmt in n.children.iter().skip(1) {
                    self.collect_locals(stmt, locals);
                }
            }
            NodeKind::While => {
                self.collect_locals(n.children[1], locals);
            }
            _ => {}
        }
    }

    fn gen_statement(
        &mut self,
        node: NodeId,
        img: &mut ExecutableImage,
        locals: &Locals,
        mut break_targets: Option<&mut Vec<usize>>,
    ) -> Result<()> {
        let n = self.ast.node(node);
        match &n.kind {
            NodeKind::Type => Ok(()),
            NodeKind::Block => {
                for &stmt in &n.children {
                    self.gen_statement(stmt, img, locals, break_targets.as_deref_mut())?;
                }
                Ok(())
            }
            NodeKind::Assignment(sym) => {
                let sym = *sym;
                self.gen_expr(n.children[0], img, locals)?;
                let index = self.variable_slot(sym, locals)?;
                img.emit_opcode(Opcode::Store);
                img.emit_word(index);
                Ok(())
            }
            NodeKind::Return => {
                self.gen_expr(n.children[0], img, locals)?;
                img.emit_opcode(Opcode::Ret);
                Ok(())
            }
            NodeKind::Break => match break_targets {
                Some(targets) => {
                    img.emit_opcode(Opcode::Jmp);
                    let operand_addr = img.emit_word(0);
                    targets.push(operand_addr);
                    Ok(())
                }
                None => Err(CodegenError::BreakOutsideLoop),
            },
            NodeKind::IfElse => self.gen_if_else(node, img, locals, break_targets),
            NodeKind::While => self.gen_while(node, img, locals),
            NodeKind::Call(_) => {
                // A call used in statement position still leaves one word
                // on the stack (every user FUNCTION call does), so it has
                // to be dropped here; `iput` pushes nothing, since it
                // lowers straight to a SYSCALL instead.
                if self.gen_call(node, img, locals)? {
                    img.emit_opcode(Opcode::Drop);
                }
                Ok(())
            }
            _ => Err(CodegenError::MalformedNode("statement")),
        }
    }

    fn gen_if_else(
        &mut self,
        node: NodeId,
        img: &mut ExecutableImage,
        locals: &Locals,
        break_targets: Option<&mut Vec<usize>>,
    ) -> Result<()> {
        let n = self.ast.node(node);
        let (condition, then_stmt, else_stmt) = match n.children.as_slice() {
            [c, t] => (*c, *t, None),
            [c, t, e] => (*c, *t, Some(*e)),
            _ => return Err(CodegenError::MalformedNode("IF_ELSE")),
        };
        let in_loop = break_targets.is_some();

        let mut then_local = Vec::new();
        let mut then_img = ExecutableImage::new();
        self.gen_statement(
            then_stmt,
            &mut then_img,
            locals,
            if in_loop { Some(&mut then_local) } else { None },
        )?;

        let mut else_local = Vec::new();
        let else_img = match else_stmt {
            Some(e) => {
                let mut else_img = ExecutableImage::new();
                self.gen_statement(
                    e,
                    &mut else_img,
                    locals,
                    if in_loop { Some(&mut else_local) } else { None },
                )?;
                Some(else_img)
            }
            None => None,
        };

        self.gen_expr(condition, img, locals)?;
        img.emit_opcode(Opcode::IfZero);
        let then_len = then_img.words().len() as i32;
        match &else_img {
            Some(_) => img.emit_word(then_len + 2 + 1),
            None => img.emit_word(then_len + 1),
        }
        let then_base = img.position();
        img.splice(&then_img);

        let mut else_base = None;
        if let Some(e) = &else_img {
            img.emit_opcode(Opcode::Jmp);
            img.emit_word(e.words().len() as i32 + 1);
            else_base = Some(img.position());
            img.splice(e);
        }

        if let Some(targets) = break_targets {
            targets.extend(then_local.iter().map(|&a| a + then_base));
            if let Some(base) = else_base {
                targets.extend(else_local.iter().map(|&a| a + base));
            }
        }

        Ok(())
    }

    fn gen_while(
        &mut self,
        node: NodeId,
        img: &mut ExecutableImage,
        locals: &Locals,
    ) -> Result<()> {
        let n = self.ast.node(node);
        let (condition, body_stmt) = match n.children.as_slice() {
            [c, b] => (*c, *b),
            _ => return Err(CodegenError::MalformedNode("WHILE")),
        };

        let mut cond_img = ExecutableImage::new();
        self.gen_expr(condition, &mut cond_img, locals)?;

        let mut body_targets = Vec::new();
        let mut body_img = ExecutableImage::new();
        self.gen_statement(body_stmt, &mut body_img, locals, Some(&mut body_targets))?;
        let body_len = body_img.words().len() as i32;

        img.splice(&cond_img);
        img.emit_opcode(Opcode::IfZero);
        img.emit_word(body_len + 3);
        let body_base = img.position();
        img.splice(&body_img);
        img.emit_opcode(Opcode::Jmp);
        let cond_len = cond_img.words().len() as i32;
        img.emit_word(-(body_len + cond_len + 3));
        let exit_addr = img.position() as i32;

        // Every break's JMP operand is patched to the address of the first
        // instruction after the loop, per the relative-jump convention: the
        // offset is added to the address of the operand word itself.
        for local_addr in body_targets {
            let operand_addr = body_base + local_addr;
            img.patch(operand_addr, exit_addr - operand_addr as i32);
        }

        Ok(())
    }

    fn gen_expr(&mut self, node: NodeId, img: &mut ExecutableImage, locals: &Locals) -> Result<()> {
        let n = self.ast.node(node);
        match &n.kind {
            NodeKind::Constant(value) => {
                img.emit_opcode(Opcode::Const);
                img.emit_word(*value);
                Ok(())
            }
            NodeKind::Symbol(Some(sym)) => self.gen_symbol_ref(*sym, img, locals),
            NodeKind::UnaryOp(op) => {
                self.gen_expr(n.children[0], img, locals)?;
                img.emit_opcode(match op {
                    UnOp::Not => Opcode::LNot,
                    UnOp::BitNot => Opcode::Not,
                });
                Ok(())
            }
            NodeKind::BinaryOp(op) => {
                self.gen_expr(n.children[0], img, locals)?;
                self.gen_expr(n.children[1], img, locals)?;
                img.emit_opcode(binop_opcode(*op));
                Ok(())
            }
            NodeKind::Call(_) => self.gen_call(node, img, locals).map(|_| ()),
            _ => Err(CodegenError::MalformedNode("expression")),
        }
    }

    fn gen_symbol_ref(&self, sym: SymbolId, img: &mut ExecutableImage, locals: &Locals) -> Result<()> {
        if let Some(&index) = locals.get(&sym) {
            img.emit_opcode(Opcode::Load);
            img.emit_word(index as i32);
            return Ok(());
        }
        let symbol = self.scopes.symbol(sym);
        match symbol.kind {
            SymbolKind::Argument => {
                img.emit_opcode(Opcode::Arg);
                img.emit_word(symbol.local_index as i32);
                Ok(())
            }
            _ => Err(CodegenError::WrongSymbolKind {
                name: symbol.name.to_string(),
                expected: "ARGUMENT or VARIABLE",
                found: kind_name(symbol.kind),
            }),
        }
    }

    fn variable_slot(&self, sym: SymbolId, locals: &Locals) -> Result<i32> {
        if let Some(&index) = locals.get(&sym) {
            return Ok(index as i32);
        }
        let symbol = self.scopes.symbol(sym);
        Err(CodegenError::WrongSymbolKind {
            name: symbol.name.to_string(),
            expected: "VARIABLE",
            found: kind_name(symbol.kind),
        })
    }

    /// Lowers a call. Returns whether it left a value on the stack — true
    /// for every user `FUNCTION` call, false for `iput`, which lowers
    /// straight to a syscall and pushes nothing.
    fn gen_call(&mut self, node: NodeId, img: &mut ExecutableImage, locals: &Locals) -> Result<bool> {
        let n = self.ast.node(node);
        let callee = match n.kind {
            NodeKind::Call(sym) => sym,
            _ => return Err(CodegenError::MalformedNode("CALL")),
        };

        for &arg in &n.children {
            self.gen_expr(arg, img, locals)?;
        }

        let name = self.scopes.symbol(callee).name;
        if name == self.iput {
            img.emit_opcode(Opcode::Syscall);
            img.emit_word(0x21);
            return Ok(false);
        }

        let symbol = self.scopes.symbol(callee);
        if symbol.kind != SymbolKind::Function {
            return Err(CodegenError::WrongSymbolKind {
                name: symbol.name.to_string(),
                expected: "FUNCTION",
                found: kind_name(symbol.kind),
            });
        }

        let address = *self
            .func_addresses
            .get(&callee)
            .ok_or_else(|| CodegenError::UnknownSymbol(symbol.name.to_string()))?;
        img.emit_opcode(Opcode::Call);
        img.emit_word(address);
        img.emit_word(n.children.len() as i32);
        Ok(true)
    }
}

fn kind_name(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Constant => "CONSTANT",
        SymbolKind::Function => "FUNCTION",
        SymbolKind::Argument => "ARGUMENT",
        SymbolKind::Variable => "VARIABLE",
    }
}

fn binop_opcode(op: BinOp) -> Opcode {
    match op {
        BinOp::Add => Opcode::Add,
        BinOp::Sub => Opcode::Sub,
        BinOp::Mul => Opcode::Mul,
        BinOp::Div => Opcode::Div,
        BinOp::And => Opcode::And,
        BinOp::Or => Opcode::Or,
        BinOp::Xor => Opcode::Xor,
        BinOp::Shl => Opcode::Shl,
        BinOp::Shr => Opcode::Shr,
        BinOp::Eq => Opcode::Eq,
        BinOp::NotEq => Opcode::NEqual,
        BinOp::Greater => Opcode::Greater,
        BinOp::GreaterEq => Opcode::GrEqual,
        BinOp::Less => Opcode::Less,
        BinOp::LessEq => Opcode::LsEqual,
        BinOp::LogAnd => Opcode::LAnd,
        BinOp::LogOr => Opcode::LOr,
    }
}
