//! Persistent statement list.
//!
//! Two node shapes cover everything a sequence needs: `Snoc` appends one
//! statement to an existing list and `Concat` joins several lists. Both
//! share their children through `Arc`, so building never copies statements.

use std::fmt;
use std::sync::Arc;

use crate::statement::Statement;

enum Node {
    Snoc {
        prefix: StatementList,
        last: Statement,
    },
    Concat {
        parts: Vec<StatementList>,
        /// Absolute index of the first statement of each part.
        starts: Vec<usize>,
    },
}

#[derive(Clone, Default)]
pub struct StatementList {
    root: Option<Arc<Node>>,
    len: usize,
}

impl StatementList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A new list with `statement` appended. O(1).
    pub fn push(&self, statement: Statement) -> Self {
        Self {
            root: Some(Arc::new(Node::Snoc {
                prefix: self.clone(),
                last: statement,
            })),
            len: self.len + 1,
        }
    }

    /// Join lists end to end. O(number of lists).
    pub fn concat(lists: &[StatementList]) -> Self {
        let parts: Vec<StatementList> = lists.iter().filter(|l| !l.is_empty()).cloned().collect();
        match parts.len() {
            0 => Self::new(),
            1 => parts[0].clone(),
            _ => {
                let mut starts = Vec::with_capacity(parts.len());
                let mut len = 0;
                for part in &parts {
                    starts.push(len);
                    len += part.len;
                }
                Self {
                    root: Some(Arc::new(Node::Concat { parts, starts })),
                    len,
                }
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&Statement> {
        if index >= self.len {
            return None;
        }
        let mut list = self;
        let mut i = index;
        loop {
            match list.root.as_deref()? {
                Node::Snoc { prefix, last } => {
                    if i + 1 == list.len {
                        return Some(last);
                    }
                    list = prefix;
                }
                Node::Concat { parts, starts } => {
                    let part = starts.partition_point(|&s| s <= i) - 1;
                    i -= starts[part];
                    list = &parts[part];
                }
            }
        }
    }

    pub fn last(&self) -> Option<&Statement> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Statements in order.
    pub fn iter(&self) -> std::vec::IntoIter<&Statement> {
        let mut out = Vec::with_capacity(self.len);
        self.collect_into(&mut out);
        out.into_iter()
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a Statement>) {
        let mut tail = Vec::new();
        let mut list = self;
        loop {
            match list.root.as_deref() {
                None => break,
                Some(Node::Snoc { prefix, last }) => {
                    tail.push(last);
                    list = prefix;
                }
                Some(Node::Concat { parts, .. }) => {
                    for part in parts {
                        part.collect_into(out);
                    }
                    break;
                }
            }
        }
        out.extend(tail.into_iter().rev());
    }

    /// Same underlying storage, not merely equal contents.
    pub fn ptr_eq(&self, other: &StatementList) -> bool {
        self.len == other.len
            && match (&self.root, &other.root) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl fmt::Debug for StatementList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_ir::types::PrimitiveKind;
    use tessel_ir::{LiteralValue, Operation, TypeRegistry};

    fn lit(v: i32) -> Statement {
        let reg = TypeRegistry::new();
        let op = Operation::literal(&reg.primitive(PrimitiveKind::Int), LiteralValue::Int(v)).unwrap();
        Statement::new(Arc::new(op), Vec::new())
    }

    fn ints(list: &StatementList) -> Vec<i32> {
        list.iter()
            .map(|s| match s.operation().literal_value() {
                Some(LiteralValue::Int(v)) => *v,
                _ => panic!("not an int literal"),
            })
            .collect()
    }

    #[test]
    fn test_push_is_persistent() {
        let a = StatementList::new().push(lit(1));
        let b = a.push(lit(2));
        let c = a.push(lit(3));
        assert_eq!(ints(&a), vec![1]);
        assert_eq!(ints(&b), vec![1, 2]);
        assert_eq!(ints(&c), vec![1, 3]);
    }

    #[test]
    fn test_concat_and_index() {
        let a = StatementList::new().push(lit(1)).push(lit(2));
        let b = StatementList::new().push(lit(3));
        let joined = StatementList::concat(&[a.clone(), StatementList::new(), b]).push(lit(4));
        assert_eq!(joined.len(), 4);
        assert_eq!(ints(&joined), vec![1, 2, 3, 4]);
        for (i, expected) in [1, 2, 3, 4].into_iter().enumerate() {
            assert_eq!(joined.get(i).and_then(|s| s.operation().literal_value()), Some(&LiteralValue::Int(expected)));
        }
        assert!(joined.get(4).is_none());
        assert!(StatementList::concat(&[a.clone()]).ptr_eq(&a));
    }

    #[test]
    fn test_nested_concat() {
        let a = StatementList::new().push(lit(1));
        let ab = StatementList::concat(&[a.clone(), a.push(lit(2))]);
        let abab = StatementList::concat(&[ab.clone(), ab]);
        assert_eq!(ints(&abab), vec![1, 1, 2, 1, 1, 2]);
        assert_eq!(abab.last().and_then(|s| s.operation().literal_value()), Some(&LiteralValue::Int(2)));
    }
}
