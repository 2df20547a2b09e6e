use crate::{
    common::{
        config::{RunConfig, GC_THRESHOLD},
        Interner,
    },
    compiler::Compiler,
    parse,
    vm::{
        debug,
        error::RuntimeError,
        gc::Collector,
        global::Globals,
        heap::{Handle, Heap, Object},
        opcode::Opcode,
        stack::ValueStack,
        value::{self, Value},
    },
    Error,
};

/// Host-side native function. Reads its arguments with `Vm::peek` and
/// pushes its result; the CALL instruction replaces the callee + argument
/// region with that result.
pub type NativeFn = fn(&mut Vm) -> Result<(), RuntimeError>;

#[derive(Debug, Copy, Clone)]
struct Frame {
    ra: usize,
    bp: usize,
    function: Handle,
}

/// The Violang virtual machine: a fetch/decode/execute loop over a bounded
/// value stack and a separate call-frame stack. Owns the heap, the global
/// table, and the symbol interner for the lifetime of the program.
pub struct Vm {
    interner: Interner,
    heap: Heap,
    globals: Globals,
    collector: Collector,
    stack: ValueStack,
    call_stack: Vec<Frame>,
    ip: usize,
    bp: usize,
    function: Option<Handle>,
    code: Option<Handle>,
    constant_roots: Vec<Handle>,
    code_objects: Vec<Handle>,
    config: RunConfig,
}

impl Vm {
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        let mut interner = Interner::new();
        let mut heap = Heap::new();
        let mut globals = Globals::new();

        let version = interner.intern("VERSION");
        globals.add_global(version, 1.0);
        let square = interner.intern("square");
        globals.add_native(&mut heap, square, native_square, 1);

        Self {
            interner,
            heap,
            globals,
            collector: Collector::new(),
            stack: ValueStack::new(),
            call_stack: Vec::new(),
            ip: 0,
            bp: 0,
            function: None,
            code: None,
            constant_roots: Vec::new(),
            code_objects: Vec::new(),
            config,
        }
    }

    /// Parses, compiles, and runs a program; the returned value is whatever
    /// HALT popped.
    pub fn exec(&mut self, source: &str) -> Result<Value, Error> {
        let program = parse::parse(source, &mut self.interner).map_err(Error::Parse)?;
        let compiled = Compiler::compile(&program, &mut self.heap, &mut self.globals, &self.interner)
            .map_err(Error::Compile)?;

        self.constant_roots = compiled.constant_roots;
        self.code_objects = compiled.code_objects;

        if self.config.dump_bytecode {
            for &co in &self.code_objects {
                println!(
                    "{}",
                    debug::disassemble(&self.heap, &self.interner, &self.globals, co)
                );
            }
        }

        self.function = Some(compiled.main);
        self.code = Some(self.heap.function(compiled.main).code);
        self.ip = 0;
        self.bp = 0;
        self.stack.clear();
        self.call_stack.clear();

        self.eval().map_err(Error::Runtime)
    }

    fn eval(&mut self) -> Result<Value, RuntimeError> {
        loop {
            if self.config.trace_execution {
                self.trace();
            }

            let byte = self.fetch()?;
            let opcode = Opcode::from_byte(byte).ok_or(RuntimeError::UnknownOpcode { byte })?;
            match opcode {
                Opcode::Halt => return self.stack.pop(),
                Opcode::Const => {
                    let index = self.fetch()?;
                    let value = self.constant(index)?;
                    self.stack.push(value)?;
                }
                Opcode::Add => self.add()?,
                Opcode::Sub => self.binary_num("-", |a, b| a - b)?,
                Opcode::Mul => self.binary_num("*", |a, b| a * b)?,
                Opcode::Div => self.binary_num("/", |a, b| a / b)?,
                Opcode::Compare => self.compare()?,
                Opcode::JmpIfFalse => {
                    let addr = self.fetch_u16()?;
                    let cond = self.stack.pop()?;
                    let cond = cond.as_boolean().ok_or_else(|| RuntimeError::TypeError {
                        op: "if",
                        expected: "a boolean condition",
                        found: cond.kind_str(&self.heap).to_string(),
                    })?;
                    if !cond {
                        self.ip = addr as usize;
                    }
                }
                Opcode::Jmp => {
                    self.ip = self.fetch_u16()? as usize;
                }
                Opcode::GetGlobal => {
                    let index = self.fetch()? as usize;
                    let value = self
                        .globals
                        .get(index)
                        .ok_or(RuntimeError::GlobalOutOfRange { index })?
                        .value;
                    self.stack.push(value)?;
                }
                Opcode::SetGlobal => {
                    let index = self.fetch()? as usize;
                    // the written value stays on the stack
                    let value = self.stack.peek(0)?;
                    self.globals.set(index, value)?;
                }
                Opcode::Pop => {
                    self.stack.pop()?;
                }
                Opcode::GetLocal => {
                    let slot = self.fetch()?;
                    let value = self
                        .stack
                        .get(self.bp + slot as usize)
                        .ok_or(RuntimeError::BadLocalIndex { slot })?;
                    self.stack.push(value)?;
                }
                Opcode::SetLocal => {
                    let slot = self.fetch()?;
                    let value = self.stack.peek(0)?;
                    self.stack
                        .set(self.bp + slot as usize, value)
                        .ok_or(RuntimeError::BadLocalIndex { slot })?;
                }
                Opcode::ScopeExit => {
                    let count = self.fetch()? as usize;
                    self.stack.slide(count)?;
                }
                Opcode::Call => self.call()?,
                Opcode::Return => {
                    let frame = self
                        .call_stack
                        .pop()
                        .ok_or(RuntimeError::CallStackUnderflow)?;
                    self.ip = frame.ra;
                    self.bp = frame.bp;
                    self.function = Some(frame.function);
                    self.code = Some(self.heap.function(frame.function).code);
                }
            }
        }
    }

    fn add(&mut self) -> Result<(), RuntimeError> {
        let rhs = self.stack.pop()?;
        let lhs = self.stack.pop()?;

        if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
            return self.stack.push(Value::number(a + b));
        }

        if let (Some(a), Some(b)) = (lhs.as_string(&self.heap), rhs.as_string(&self.heap)) {
            let concat = format!("{a}{b}");
            self.maybe_gc();
            let handle = self.heap.alloc_string(concat);
            return self.stack.push(Value::object(handle));
        }

        Err(self.binary_type_error("+", "two numbers or two strings", lhs, rhs))
    }

    fn binary_num(
        &mut self,
        op: &'static str,
        apply: impl Fn(f64, f64) -> f64,
    ) -> Result<(), RuntimeError> {
        let rhs = self.stack.pop()?;
        let lhs = self.stack.pop()?;
        match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => self.stack.push(Value::number(apply(a, b))),
            _ => Err(self.binary_type_error(op, "two numbers", lhs, rhs)),
        }
    }

    fn compare(&mut self) -> Result<(), RuntimeError> {
        let op = self.fetch()?;
        let rhs = self.stack.pop()?;
        let lhs = self.stack.pop()?;

        let result = if let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) {
            compare_values(op, &a, &b)?
        } else if let (Some(a), Some(b)) =
            (lhs.as_string(&self.heap), rhs.as_string(&self.heap))
        {
            compare_values(op, &a, &b)?
        } else {
            return Err(self.binary_type_error("comparison", "two numbers or two strings", lhs, rhs));
        };
        self.stack.push(Value::boolean(result))
    }

    fn call(&mut self) -> Result<(), RuntimeError> {
        let argc = self.fetch()? as usize;
        let callee = self.stack.peek(argc)?;
        let handle = callee.as_object().ok_or_else(|| RuntimeError::NotCallable {
            found: callee.kind_str(&self.heap),
        })?;

        match self.heap.get(handle) {
            Object::Native(native) => {
                let native = *native;
                if argc != native.arity {
                    return Err(RuntimeError::ArityMismatch {
                        name: self.interner.lookup(native.name).to_string(),
                        expected: native.arity,
                        found: argc,
                    });
                }
                (native.function)(self)?;
                // replace callee + arguments with the native's result
                let result = self.stack.pop()?;
                self.stack.pop_n(argc + 1)?;
                self.stack.push(result)
            }
            Object::Function(function) => {
                let code = function.code;
                let co = self.heap.code(code);
                let (arity, name) = (co.arity, co.name);
                if argc != arity {
                    return Err(RuntimeError::ArityMismatch {
                        name: self.interner.lookup(name).to_string(),
                        expected: arity,
                        found: argc,
                    });
                }

                self.call_stack.push(Frame {
                    ra: self.ip,
                    bp: self.bp,
                    function: self.function.expect("no running function"),
                });
                self.function = Some(handle);
                self.code = Some(code);
                // bp[0] is the callee, bp[1..=argc] the arguments
                self.bp = self.stack.len() - argc - 1;
                self.ip = 0;
                Ok(())
            }
            _ => Err(RuntimeError::NotCallable {
                found: callee.kind_str(&self.heap),
            }),
        }
    }

    fn binary_type_error(
        &self,
        op: &'static str,
        expected: &'static str,
        lhs: Value,
        rhs: Value,
    ) -> RuntimeError {
        RuntimeError::TypeError {
            op,
            expected,
            found: format!(
                "{} and {}",
                lhs.kind_str(&self.heap),
                rhs.kind_str(&self.heap)
            ),
        }
    }

    // ------------------------------------------------------------------
    // Garbage collection.

    /// Runs a collection cycle when the allocation counter has crossed the
    /// threshold. Called on allocation paths, before the allocation, so
    /// the collector never observes a half-built object.
    fn maybe_gc(&mut self) {
        if self.heap.bytes_allocated() < GC_THRESHOLD {
            return;
        }
        let roots = self.gc_roots();
        if roots.is_empty() {
            return;
        }
        self.collector.collect(&mut self.heap, roots);
    }

    /// Roots: object values on the stack, object values in globals, and
    /// everything the compiler retained for not-yet-executed code.
    fn gc_roots(&self) -> Vec<Handle> {
        let mut roots: Vec<Handle> = self
            .stack
            .iter()
            .filter_map(|value| value.as_object())
            .collect();
        roots.extend(self.globals.iter().filter_map(|var| var.value.as_object()));
        roots.extend(self.constant_roots.iter().copied());
        roots
    }

    // ------------------------------------------------------------------
    // Fetching.

    fn fetch(&mut self) -> Result<u8, RuntimeError> {
        let code = self.code.expect("no running function");
        let byte = self
            .heap
            .code(code)
            .code
            .get(self.ip)
            .copied()
            .ok_or(RuntimeError::IpOutOfBounds { ip: self.ip })?;
        self.ip += 1;
        Ok(byte)
    }

    fn fetch_u16(&mut self) -> Result<u16, RuntimeError> {
        let hi = self.fetch()?;
        let lo = self.fetch()?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    fn constant(&self, index: u8) -> Result<Value, RuntimeError> {
        let code = self.code.expect("no running function");
        self.heap
            .code(code)
            .constants
            .get(index as usize)
            .copied()
            .ok_or(RuntimeError::BadConstIndex { index })
    }

    fn trace(&self) {
        if let Some(code) = self.code {
            let mut buf = String::new();
            debug::disassemble_instruction(
                &self.heap,
                &self.interner,
                &self.globals,
                code,
                self.ip,
                &mut buf,
            );
            println!("{buf}");
        }
    }

    // ------------------------------------------------------------------
    // Stack access for natives and tests.

    pub fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        self.stack.push(value)
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop()
    }

    pub fn peek(&self, offset: usize) -> Result<Value, RuntimeError> {
        self.stack.peek(offset)
    }

    #[must_use]
    pub fn render(&self, value: Value) -> String {
        value::render(value, &self.heap, &self.interner)
    }

    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    #[must_use]
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    #[must_use]
    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }
}

fn compare_values<T: PartialOrd>(op: u8, lhs: &T, rhs: &T) -> Result<bool, RuntimeError> {
    Ok(match op {
        0 => lhs < rhs,
        1 => lhs > rhs,
        2 => lhs == rhs,
        3 => lhs >= rhs,
        4 => lhs <= rhs,
        5 => lhs != rhs,
        _ => return Err(RuntimeError::BadCompareOp { op }),
    })
}

fn native_square(vm: &mut Vm) -> Result<(), RuntimeError> {
    let arg = vm.peek(0)?;
    let x = arg.as_number().ok_or_else(|| RuntimeError::TypeError {
        op: "square",
        expected: "a number",
        found: arg.kind_str(vm.heap()).to_string(),
    })?;
    vm.push(Value::number(x * x))
}
