use crate::{
    common::Interner,
    vm::{
        global::Globals,
        heap::{Handle, Heap},
        opcode::Opcode,
        value,
    },
};
use std::fmt::Write;

const COMPARE_OP_NAMES: [&str; 6] = ["<", ">", "==", ">=", "<=", "!="];

/// Renders a full code object, one instruction per line. Read-only.
#[must_use]
pub fn disassemble(heap: &Heap, interner: &Interner, globals: &Globals, co: Handle) -> String {
    let code_obj = heap.code(co);
    let mut buf = String::new();
    let _ = writeln!(
        buf,
        "--- disassembly: {}/{} ---",
        interner.lookup(code_obj.name),
        code_obj.arity
    );

    let mut offset = 0;
    while offset < heap.code(co).code.len() {
        offset = disassemble_instruction(heap, interner, globals, co, offset, &mut buf);
        buf.push('\n');
    }
    buf
}

/// Renders the instruction at `offset` and returns the offset of the next
/// one.
pub fn disassemble_instruction(
    heap: &Heap,
    interner: &Interner,
    globals: &Globals,
    co: Handle,
    offset: usize,
    buf: &mut String,
) -> usize {
    let code_obj = heap.code(co);
    let code = &code_obj.code;
    let byte = code[offset];

    let Some(opcode) = Opcode::from_byte(byte) else {
        let _ = write!(buf, "{offset:04X}  {byte:02X}        <unknown>");
        return offset + 1;
    };

    let end = (offset + 1 + operand_count(opcode)).min(code.len());
    let bytes = code[offset..end]
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ");

    let detail = match opcode {
        Opcode::Const => {
            let index = code[offset + 1] as usize;
            let constant = code_obj
                .constants
                .get(index)
                .map_or_else(|| "<bad index>".to_string(), |c| value::render(*c, heap, interner));
            format!("{index} ({constant})")
        }
        Opcode::Compare => {
            let op = code[offset + 1];
            let name = COMPARE_OP_NAMES.get(op as usize).copied().unwrap_or("?");
            format!("{op} ({name})")
        }
        Opcode::JmpIfFalse | Opcode::Jmp => {
            let addr = u16::from_be_bytes([code[offset + 1], code[offset + 2]]);
            format!("{addr:04X}")
        }
        Opcode::GetGlobal | Opcode::SetGlobal => {
            let index = code[offset + 1] as usize;
            match globals.get(index) {
                Some(var) => format!("{index} ({})", interner.lookup(var.name)),
                None => index.to_string(),
            }
        }
        Opcode::GetLocal | Opcode::SetLocal | Opcode::ScopeExit | Opcode::Call => {
            code[offset + 1].to_string()
        }
        _ => String::new(),
    };

    if detail.is_empty() {
        let _ = write!(buf, "{offset:04X}  {bytes:<8}  {}", opcode.as_str());
    } else {
        let _ = write!(buf, "{offset:04X}  {bytes:<8}  {:<14}{detail}", opcode.as_str());
    }
    end
}

fn operand_count(opcode: Opcode) -> usize {
    use Opcode::*;

    match opcode {
        Halt | Add | Sub | Mul | Div | Pop | Return => 0,
        Const | Compare | GetGlobal | SetGlobal | GetLocal | SetLocal | ScopeExit | Call => 1,
        JmpIfFalse | Jmp => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::Interner,
        compiler::Compiler,
        parse,
        vm::global::Globals,
    };
    use expect_test::{expect, Expect};

    fn check(source: &str, which: usize, expect: Expect) {
        let mut heap = Heap::new();
        let mut globals = Globals::new();
        let mut interner = Interner::new();
        let program = parse::parse(source, &mut interner).unwrap();
        let compiled =
            Compiler::compile(&program, &mut heap, &mut globals, &interner).unwrap();
        let co = compiled.code_objects[which];
        expect.assert_eq(disassemble(&heap, &interner, &globals, co).trim_end());
    }

    #[test]
    fn disassemble_arithmetic() {
        check(
            "(+ 2 3)",
            0,
            expect![[r#"
                --- disassembly: main/0 ---
                0000  01 00     CONST         0 (2)
                0002  01 01     CONST         1 (3)
                0004  02        ADD
                0005  00        HALT"#]],
        );
    }

    #[test]
    fn disassemble_branches() {
        check(
            "(if true 1 2)",
            0,
            expect![[r#"
                --- disassembly: main/0 ---
                0000  01 00     CONST         0 (true)
                0002  07 00 0A  JMP_IF_FALSE  000A
                0005  01 01     CONST         1 (1)
                0007  08 00 0C  JMP           000C
                000A  01 02     CONST         2 (2)
                000C  00        HALT"#]],
        );
    }

    #[test]
    fn disassemble_function_body() {
        check(
            "(def sq (x) (* x x)) (sq 7)",
            1,
            expect![[r#"
                --- disassembly: sq/1 ---
                0000  0C 01     GET_LOCAL     1
                0002  0C 01     GET_LOCAL     1
                0004  04        MUL
                0005  0E 02     SCOPE_EXIT    2
                0007  10        RETURN"#]],
        );
    }

    #[test]
    fn disassemble_globals() {
        check(
            "(var x 5) x",
            0,
            expect![[r#"
                --- disassembly: main/0 ---
                0000  01 00     CONST         0 (5)
                0002  0A 00     SET_GLOBAL    0 (x)
                0004  0B        POP
                0005  09 00     GET_GLOBAL    0 (x)
                0007  00        HALT"#]],
        );
    }
}
