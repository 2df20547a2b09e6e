use crate::{
    common::List,
    vm::heap::{Handle, Heap, Object},
};

/// Mark-sweep collector over the heap's slot registry. Stop-the-world: runs
/// synchronously at the allocation boundary, before the offending
/// allocation.
#[derive(Debug, Default)]
pub struct Collector;

impl Collector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// One full cycle. Returns the number of objects reclaimed.
    pub fn collect(&self, heap: &mut Heap, roots: impl IntoIterator<Item = Handle>) -> usize {
        self.mark(heap, roots);
        heap.sweep()
    }

    fn mark(&self, heap: &mut Heap, roots: impl IntoIterator<Item = Handle>) {
        let mut worklist: Vec<Handle> = roots.into_iter().collect();

        while let Some(handle) = worklist.pop() {
            if !heap.mark(handle) {
                continue;
            }
            worklist.extend(children(heap, handle));
        }
    }
}

/// Traceable edges out of an object: a function references its code, a code
/// object references every object in its constants pool. Cycles are cut by
/// the mark-once check above.
fn children(heap: &Heap, handle: Handle) -> List<Handle> {
    match heap.get(handle) {
        Object::Str(_) | Object::Native(_) => List::new(),
        Object::Function(f) => {
            let mut out = List::new();
            out.push(f.code);
            out
        }
        Object::Code(co) => co
            .constants
            .iter()
            .filter_map(|value| value.as_object())
            .collect(),
    }
}
