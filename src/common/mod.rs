pub mod config;
mod interner;

pub use interner::{Interner, Key};

pub const MAIN_FN: &str = "main";

pub type List<T> = smallvec::SmallVec<[T; 3]>;
