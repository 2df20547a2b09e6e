#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Key(lasso::Spur);

impl Key {
    fn from_raw(raw: usize) -> Option<Self> {
        lasso::Key::try_from_usize(raw).map(Key)
    }

    /// Key of the entry-point code object. Interned by `Interner::default`.
    #[must_use]
    pub fn main() -> Self {
        Self::from_raw(0).unwrap()
    }
}

pub struct Interner {
    inner: lasso::Rodeo,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn intern(&mut self, s: &str) -> Key {
        Key(self.inner.get_or_intern(s))
    }

    #[must_use]
    pub fn lookup(&self, key: Key) -> &str {
        self.inner.resolve(&key.0)
    }
}

impl Default for Interner {
    fn default() -> Self {
        let mut ret = Self {
            inner: lasso::Rodeo::default(),
        };
        let _ = ret.intern(crate::common::MAIN_FN);
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_key_is_preinterned() {
        let mut interner = Interner::new();
        assert_eq!(interner.intern("main"), Key::main());
        assert_eq!(interner.lookup(Key::main()), "main");
    }

    #[test]
    fn interning_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern("square");
        let b = interner.intern("square");
        assert_eq!(a, b);
        assert_ne!(a, Key::main());
    }
}
