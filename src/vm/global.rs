use crate::{
    common::Key,
    vm::{
        error::RuntimeError,
        heap::{Handle, Heap},
        run::NativeFn,
        value::Value,
    },
};

#[derive(Debug, Copy, Clone)]
pub struct GlobalVar {
    pub name: Key,
    pub value: Value,
}

/// Insertion-ordered table of globals and native bindings. Indices are
/// stable for the lifetime of the program, so the compiler bakes them
/// directly into bytecode operands.
#[derive(Debug, Default)]
pub struct Globals {
    entries: Vec<GlobalVar>,
}

impl Globals {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` with a default value of zero. No-op if the name is
    /// already present, so redefinition keeps the earlier binding's index.
    pub fn define(&mut self, name: Key) {
        if self.exists(name) {
            return;
        }
        self.entries.push(GlobalVar {
            name,
            value: Value::number(0.0),
        });
    }

    pub fn add_global(&mut self, name: Key, value: f64) {
        if self.exists(name) {
            return;
        }
        self.entries.push(GlobalVar {
            name,
            value: Value::number(value),
        });
    }

    pub fn add_native(&mut self, heap: &mut Heap, name: Key, function: NativeFn, arity: usize) {
        if self.exists(name) {
            return;
        }
        let handle: Handle = heap.alloc_native(function, name, arity);
        self.entries.push(GlobalVar {
            name,
            value: Value::object(handle),
        });
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&GlobalVar> {
        self.entries.get(index)
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<(), RuntimeError> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(RuntimeError::GlobalOutOfRange { index })?;
        entry.value = value;
        Ok(())
    }

    /// Last-matching index, so lookups see the most recent binding.
    #[must_use]
    pub fn index_of(&self, name: Key) -> Option<usize> {
        self.entries.iter().rposition(|entry| entry.name == name)
    }

    #[must_use]
    pub fn exists(&self, name: Key) -> bool {
        self.index_of(name).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobalVar> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Interner;

    #[test]
    fn define_is_idempotent() {
        let mut interner = Interner::new();
        let mut globals = Globals::new();
        let x = interner.intern("x");

        globals.define(x);
        globals.set(0, Value::number(5.0)).unwrap();
        globals.define(x);

        assert_eq!(globals.len(), 1);
        assert_eq!(globals.get(0).unwrap().value, Value::number(5.0));
    }

    #[test]
    fn add_global_does_not_overwrite() {
        let mut interner = Interner::new();
        let mut globals = Globals::new();
        let version = interner.intern("VERSION");

        globals.add_global(version, 1.0);
        globals.add_global(version, 2.0);

        assert_eq!(globals.len(), 1);
        assert_eq!(globals.get(0).unwrap().value, Value::number(1.0));
    }

    #[test]
    fn set_out_of_range_is_an_error() {
        let mut globals = Globals::new();
        let err = globals.set(3, Value::number(1.0)).unwrap_err();
        assert!(matches!(err, RuntimeError::GlobalOutOfRange { index: 3 }));
    }
}
