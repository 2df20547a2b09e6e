use crate::common::{Interner, Key, List};

/// Expression tree produced by the reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Exp {
    Number(f64),
    Str(String),
    Symbol(Key),
    List(List<Exp>),
}

impl Exp {
    #[must_use]
    pub fn as_symbol(&self) -> Option<Key> {
        match self {
            Self::Symbol(key) => Some(*key),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Exp]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Head symbol of a list expression, if it has one.
    #[must_use]
    pub fn tag<'a>(&self, interner: &'a Interner) -> Option<&'a str> {
        let items = self.as_list()?;
        let head = items.first()?.as_symbol()?;
        Some(interner.lookup(head))
    }

    #[must_use]
    pub fn is_tagged(&self, tag: &str, interner: &Interner) -> bool {
        self.tag(interner) == Some(tag)
    }

    #[must_use]
    pub fn display(&self, interner: &Interner) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Str(s) => format!("{s:?}"),
            Self::Symbol(key) => interner.lookup(*key).to_string(),
            Self::List(items) => {
                let items = items
                    .iter()
                    .map(|item| item.display(interner))
                    .collect::<Vec<_>>();
                format!("({})", items.join(" "))
            }
        }
    }
}
