mod debug;
mod error;
mod gc;
mod global;
mod heap;
mod opcode;
mod run;
mod stack;
mod value;

pub use debug::{disassemble, disassemble_instruction};
pub use error::RuntimeError;
pub use gc::Collector;
pub use global::{GlobalVar, Globals};
pub use heap::{CodeObject, FunctionObject, Handle, Heap, LocalVar, NativeObject, Object};
pub use opcode::Opcode;
pub use run::{NativeFn, Vm};
pub use stack::ValueStack;
pub use value::{render as render_value, Value};
