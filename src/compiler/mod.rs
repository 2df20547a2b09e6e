mod error;

pub use error::CompileError;

use crate::{
    common::{Interner, Key},
    parse::Exp,
    vm::{Globals, Handle, Heap, Opcode, Value},
};
use lazy_static::lazy_static;
use rustc_hash::FxHashMap;

lazy_static! {
    static ref COMPARE_OPS: FxHashMap<&'static str, u8> = {
        let mut ops = FxHashMap::default();
        for (index, op) in ["<", ">", "==", ">=", "<=", "!="].into_iter().enumerate() {
            ops.insert(op, index as u8);
        }
        ops
    };
}

/// Result of a compilation run: the `main` entry function plus the objects
/// the compiler created, retained as constant roots so code that has not
/// executed yet survives collection.
#[derive(Debug)]
pub struct CompiledProgram {
    pub main: Handle,
    pub code_objects: Vec<Handle>,
    pub constant_roots: Vec<Handle>,
}

/// Single-pass recursive lowering from the expression tree to bytecode.
/// One code object per function; `co` tracks the one currently receiving
/// instructions.
pub struct Compiler<'a> {
    heap: &'a mut Heap,
    globals: &'a mut Globals,
    interner: &'a Interner,
    co: Handle,
    code_objects: Vec<Handle>,
    constant_roots: Vec<Handle>,
}

impl<'a> Compiler<'a> {
    pub fn compile(
        program: &[Exp],
        heap: &'a mut Heap,
        globals: &'a mut Globals,
        interner: &'a Interner,
    ) -> Result<CompiledProgram, CompileError> {
        let main_co = heap.alloc_code(Key::main(), 0);
        let mut compiler = Self {
            heap,
            globals,
            interner,
            co: main_co,
            code_objects: vec![main_co],
            constant_roots: vec![main_co],
        };

        // the whole program is an implicit (begin ...); its scope level 1
        // is global scope
        compiler.block(program)?;
        compiler.emit(Opcode::Halt);

        let main = compiler.heap.alloc_function(main_co);
        compiler.constant_roots.push(main);
        Ok(CompiledProgram {
            main,
            code_objects: compiler.code_objects,
            constant_roots: compiler.constant_roots,
        })
    }

    fn gen(&mut self, exp: &Exp) -> Result<(), CompileError> {
        match exp {
            Exp::Number(value) => {
                let index = self.numeric_const(*value)?;
                self.emit_with_byte(Opcode::Const, index);
            }
            Exp::Str(value) => {
                let index = self.string_const(value)?;
                self.emit_with_byte(Opcode::Const, index);
            }
            Exp::Symbol(name) => self.symbol(*name)?,
            Exp::List(items) => self.form(items)?,
        }
        Ok(())
    }

    fn symbol(&mut self, name: Key) -> Result<(), CompileError> {
        match self.interner.lookup(name) {
            "true" => {
                let index = self.boolean_const(true)?;
                self.emit_with_byte(Opcode::Const, index);
            }
            "false" => {
                let index = self.boolean_const(false)?;
                self.emit_with_byte(Opcode::Const, index);
            }
            text => {
                // locals shadow globals
                if let Some(slot) = self.heap.code(self.co).local_index(name) {
                    let slot = u8::try_from(slot).map_err(|_| CompileError::TooManyLocals)?;
                    self.emit_with_byte(Opcode::GetLocal, slot);
                } else if let Some(index) = self.globals.index_of(name) {
                    let index = u8::try_from(index).map_err(|_| CompileError::TooManyGlobals)?;
                    self.emit_with_byte(Opcode::GetGlobal, index);
                } else {
                    return Err(CompileError::UndefinedReference {
                        name: text.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn form(&mut self, items: &[Exp]) -> Result<(), CompileError> {
        let head = items.first().ok_or(CompileError::EmptyExpression)?;
        let Some(tag) = head.as_symbol() else {
            // e.g. ((lambda (x) (* x x)) 2)
            return self.call(items);
        };

        match self.interner.lookup(tag) {
            "+" => self.binary_op(items, Opcode::Add),
            "-" => self.binary_op(items, Opcode::Sub),
            "*" => self.binary_op(items, Opcode::Mul),
            "/" => self.binary_op(items, Opcode::Div),
            op if COMPARE_OPS.contains_key(op) => self.comparison(items, COMPARE_OPS[op]),
            "if" => self.if_form(items),
            "while" => self.while_form(items),
            "var" => self.var_form(items),
            "set" => self.set_form(items),
            "begin" => self.block(&items[1..]),
            "def" => self.def_form(items),
            "lambda" => self.lambda_form(items, tag),
            _ => self.call(items),
        }
    }

    fn binary_op(&mut self, items: &[Exp], op: Opcode) -> Result<(), CompileError> {
        let (lhs, rhs) = match items {
            [_, lhs, rhs] => (lhs, rhs),
            _ => return Err(CompileError::MalformedForm { form: "arithmetic" }),
        };
        self.gen(lhs)?;
        self.gen(rhs)?;
        self.emit(op);
        Ok(())
    }

    fn comparison(&mut self, items: &[Exp], op: u8) -> Result<(), CompileError> {
        let (lhs, rhs) = match items {
            [_, lhs, rhs] => (lhs, rhs),
            _ => return Err(CompileError::MalformedForm { form: "comparison" }),
        };
        self.gen(lhs)?;
        self.gen(rhs)?;
        self.emit_with_byte(Opcode::Compare, op);
        Ok(())
    }

    fn if_form(&mut self, items: &[Exp]) -> Result<(), CompileError> {
        let (test, then, alt) = match items {
            [_, test, then] => (test, then, None),
            [_, test, then, alt] => (test, then, Some(alt)),
            _ => return Err(CompileError::MalformedForm { form: "if" }),
        };

        self.gen(test)?;
        let else_jmp = self.emit_jump(Opcode::JmpIfFalse);
        self.gen(then)?;
        let end_jmp = self.emit_jump(Opcode::Jmp);

        self.patch_jump(else_jmp, self.offset())?;
        match alt {
            Some(alt) => self.gen(alt)?,
            // no alternate: the false branch still has to produce a value
            None => {
                let index = self.boolean_const(false)?;
                self.emit_with_byte(Opcode::Const, index);
            }
        }
        self.patch_jump(end_jmp, self.offset())
    }

    fn while_form(&mut self, items: &[Exp]) -> Result<(), CompileError> {
        let (test, body) = match items {
            [_, test, body] => (test, body),
            _ => return Err(CompileError::MalformedForm { form: "while" }),
        };

        // seed a result so the loop nets exactly one value; each iteration
        // replaces it with the body's value
        let index = self.boolean_const(false)?;
        self.emit_with_byte(Opcode::Const, index);

        let loop_start = self.offset();
        self.gen(test)?;
        let loop_end_jmp = self.emit_jump(Opcode::JmpIfFalse);
        self.emit(Opcode::Pop);
        self.gen(body)?;
        let back_jmp = self.emit_jump(Opcode::Jmp);
        self.patch_jump(back_jmp, loop_start)?;

        // loop end is the offset right after the back-jump
        self.patch_jump(loop_end_jmp, self.offset())
    }

    fn var_form(&mut self, items: &[Exp]) -> Result<(), CompileError> {
        let (name_exp, value) = match items {
            [_, name, value] => (name, value),
            _ => return Err(CompileError::MalformedForm { form: "var" }),
        };
        let name = name_exp
            .as_symbol()
            .ok_or(CompileError::ExpectedSymbol { form: "var" })?;

        if value.is_tagged("lambda", self.interner) {
            let (params, body) = Self::lambda_parts(value.as_list().unwrap())?;
            self.function(name, params, body)?;
        } else {
            self.gen(value)?;
        }
        self.bind(name)
    }

    fn set_form(&mut self, items: &[Exp]) -> Result<(), CompileError> {
        let (name_exp, value) = match items {
            [_, name, value] => (name, value),
            _ => return Err(CompileError::MalformedForm { form: "set" }),
        };
        let name = name_exp
            .as_symbol()
            .ok_or(CompileError::ExpectedSymbol { form: "set" })?;

        self.gen(value)?;

        if let Some(slot) = self.heap.code(self.co).local_index(name) {
            let slot = u8::try_from(slot).map_err(|_| CompileError::TooManyLocals)?;
            self.emit_with_byte(Opcode::SetLocal, slot);
        } else if let Some(index) = self.globals.index_of(name) {
            let index = u8::try_from(index).map_err(|_| CompileError::TooManyGlobals)?;
            self.emit_with_byte(Opcode::SetGlobal, index);
        } else {
            return Err(CompileError::UndefinedReference {
                name: self.interner.lookup(name).to_string(),
            });
        }
        Ok(())
    }

    fn block(&mut self, exprs: &[Exp]) -> Result<(), CompileError> {
        self.enter_scope();
        let last = exprs.len().saturating_sub(1);
        for (i, exp) in exprs.iter().enumerate() {
            // a local declaration's value slot is the local's storage, so
            // it must stay on the stack
            let is_local_declaration = self.is_declaration(exp) && !self.is_global_scope();
            self.gen(exp)?;
            if i != last && !is_local_declaration {
                self.emit(Opcode::Pop);
            }
        }
        self.exit_scope()
    }

    fn def_form(&mut self, items: &[Exp]) -> Result<(), CompileError> {
        let (name_exp, params, body) = match items {
            [_, name, params, body] => (name, params, body),
            _ => return Err(CompileError::MalformedForm { form: "def" }),
        };
        let name = name_exp
            .as_symbol()
            .ok_or(CompileError::ExpectedSymbol { form: "def" })?;
        let params = params
            .as_list()
            .ok_or(CompileError::MalformedForm { form: "def" })?;

        self.function(name, params, body)?;
        self.bind(name)
    }

    fn lambda_form(&mut self, items: &[Exp], name: Key) -> Result<(), CompileError> {
        let (params, body) = Self::lambda_parts(items)?;
        // anonymous: the function value stays on the stack, unbound
        self.function(name, params, body)
    }

    fn lambda_parts(items: &[Exp]) -> Result<(&[Exp], &Exp), CompileError> {
        let (params, body) = match items {
            [_, params, body] => (params, body),
            _ => return Err(CompileError::MalformedForm { form: "lambda" }),
        };
        let params = params
            .as_list()
            .ok_or(CompileError::MalformedForm { form: "lambda" })?;
        Ok((params, body))
    }

    fn call(&mut self, items: &[Exp]) -> Result<(), CompileError> {
        for item in items {
            self.gen(item)?;
        }
        let argc =
            u8::try_from(items.len() - 1).map_err(|_| CompileError::TooManyArguments)?;
        self.emit_with_byte(Opcode::Call, argc);
        Ok(())
    }

    /// Compiles a function body into a fresh code object and leaves the
    /// resulting function value on the current stack position.
    fn function(&mut self, name: Key, params: &[Exp], body: &Exp) -> Result<(), CompileError> {
        let arity = params.len();
        let prev = self.co;

        let fn_co = self.heap.alloc_code(name, arity);
        self.code_objects.push(fn_co);
        self.constant_roots.push(fn_co);
        self.heap.code_mut(prev).add_const(Value::object(fn_co));

        self.co = fn_co;
        // slot 0 is the callee itself, so recursive references resolve
        self.heap.code_mut(fn_co).add_local(name);
        for param in params {
            let param = param
                .as_symbol()
                .ok_or(CompileError::ExpectedSymbol { form: "parameter list" })?;
            self.heap.code_mut(fn_co).add_local(param);
        }

        self.gen(body)?;
        if !body.is_tagged("begin", self.interner) {
            // a block body exits its own scope; otherwise account for the
            // callee slot and the arguments here
            let count =
                u8::try_from(arity + 1).map_err(|_| CompileError::TooManyLocals)?;
            self.emit_with_byte(Opcode::ScopeExit, count);
        }
        self.emit(Opcode::Return);
        self.co = prev;

        let function = self.heap.alloc_function(fn_co);
        self.constant_roots.push(function);
        self.heap.code_mut(prev).add_const(Value::object(function));
        let index = self.const_index(self.heap.code(prev).constants.len() - 1)?;
        self.emit_with_byte(Opcode::Const, index);
        Ok(())
    }

    fn bind(&mut self, name: Key) -> Result<(), CompileError> {
        if self.is_global_scope() {
            self.globals.define(name);
            let index = self.globals.index_of(name).unwrap();
            let index = u8::try_from(index).map_err(|_| CompileError::TooManyGlobals)?;
            self.emit_with_byte(Opcode::SetGlobal, index);
        } else {
            self.heap.code_mut(self.co).add_local(name);
            let slot = self.heap.code(self.co).local_index(name).unwrap();
            let slot = u8::try_from(slot).map_err(|_| CompileError::TooManyLocals)?;
            self.emit_with_byte(Opcode::SetLocal, slot);
        }
        Ok(())
    }

    fn enter_scope(&mut self) {
        self.heap.code_mut(self.co).scope_level += 1;
    }

    fn exit_scope(&mut self) -> Result<(), CompileError> {
        let is_function_body = self.is_function_body();
        let arity = self.heap.code(self.co).arity;

        let co = self.heap.code_mut(self.co);
        let mut count = 0usize;
        while co
            .locals
            .last()
            .map_or(false, |local| local.scope_level == co.scope_level)
        {
            co.locals.pop();
            count += 1;
        }

        if is_function_body {
            // even with no locals, the callee slot and arguments must be
            // dropped beneath the result
            let count =
                u8::try_from(count + arity + 1).map_err(|_| CompileError::TooManyLocals)?;
            self.emit_with_byte(Opcode::ScopeExit, count);
        } else if count > 0 {
            let count = u8::try_from(count).map_err(|_| CompileError::TooManyLocals)?;
            self.emit_with_byte(Opcode::ScopeExit, count);
        }

        self.heap.code_mut(self.co).scope_level -= 1;
        Ok(())
    }

    fn is_global_scope(&self) -> bool {
        let co = self.heap.code(self.co);
        co.name == Key::main() && co.scope_level == 1
    }

    fn is_function_body(&self) -> bool {
        let co = self.heap.code(self.co);
        co.name != Key::main() && co.scope_level == 1
    }

    fn is_declaration(&self, exp: &Exp) -> bool {
        exp.is_tagged("var", self.interner) || exp.is_tagged("def", self.interner)
    }

    // ------------------------------------------------------------------
    // Constants pool, interned by value equality per kind.

    fn numeric_const(&mut self, value: f64) -> Result<u8, CompileError> {
        let existing = self
            .heap
            .code(self.co)
            .constants
            .iter()
            .position(|c| matches!(c, Value::Number(n) if *n == value));
        if let Some(index) = existing {
            return self.const_index(index);
        }
        self.heap.code_mut(self.co).add_const(Value::number(value));
        self.const_index(self.heap.code(self.co).constants.len() - 1)
    }

    fn boolean_const(&mut self, value: bool) -> Result<u8, CompileError> {
        let existing = self
            .heap
            .code(self.co)
            .constants
            .iter()
            .position(|c| matches!(c, Value::Boolean(b) if *b == value));
        if let Some(index) = existing {
            return self.const_index(index);
        }
        self.heap.code_mut(self.co).add_const(Value::boolean(value));
        self.const_index(self.heap.code(self.co).constants.len() - 1)
    }

    fn string_const(&mut self, value: &str) -> Result<u8, CompileError> {
        let existing = self
            .heap
            .code(self.co)
            .constants
            .iter()
            .position(|c| c.as_string(self.heap) == Some(value));
        if let Some(index) = existing {
            return self.const_index(index);
        }
        let handle = self.heap.alloc_string(value);
        self.constant_roots.push(handle);
        self.heap.code_mut(self.co).add_const(Value::object(handle));
        self.const_index(self.heap.code(self.co).constants.len() - 1)
    }

    fn const_index(&self, index: usize) -> Result<u8, CompileError> {
        u8::try_from(index).map_err(|_| CompileError::TooManyConstants)
    }

    // ------------------------------------------------------------------
    // Emission.

    fn emit(&mut self, opcode: Opcode) {
        self.heap.code_mut(self.co).code.push(opcode as u8);
    }

    fn emit_with_byte(&mut self, opcode: Opcode, operand: u8) {
        self.emit(opcode);
        self.heap.code_mut(self.co).code.push(operand);
    }

    /// Emits a jump with a placeholder address; returns the offset of the
    /// address bytes for back-patching.
    fn emit_jump(&mut self, opcode: Opcode) -> usize {
        self.emit(opcode);
        let code = &mut self.heap.code_mut(self.co).code;
        code.push(0);
        code.push(0);
        code.len() - 2
    }

    fn patch_jump(&mut self, offset: usize, target: usize) -> Result<(), CompileError> {
        let target = u16::try_from(target).map_err(|_| CompileError::CodeTooLarge)?;
        let code = &mut self.heap.code_mut(self.co).code;
        code[offset] = (target >> 8) as u8;
        code[offset + 1] = (target & 0xFF) as u8;
        Ok(())
    }

    fn offset(&self) -> usize {
        self.heap.code(self.co).code.len()
    }
}
