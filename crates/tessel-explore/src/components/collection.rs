//! Components indexed by the exact types of their active tail variables.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tessel_ir::{Match, Type};
use tessel_sequence::Sequence;

use super::subtype::SubTypeSet;

/// A lazily joined list of component slices. Building one never copies a
/// sequence.
#[derive(Debug, Clone, Default)]
pub struct SequenceView<'a> {
    parts: Vec<&'a [Sequence]>,
    len: usize,
}

impl<'a> SequenceView<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, part: &'a [Sequence]) {
        if !part.is_empty() {
            self.len += part.len();
            self.parts.push(part);
        }
    }

    pub fn append(&mut self, other: SequenceView<'a>) {
        for part in other.parts {
            self.push(part);
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, mut index: usize) -> Option<&'a Sequence> {
        for part in &self.parts {
            if index < part.len() {
                return part.get(index);
            }
            index -= part.len();
        }
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Sequence> + '_ {
        self.parts.iter().copied().flat_map(|p| p.iter())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SequenceCollection {
    buckets: BTreeMap<Type, Vec<Sequence>>,
    types: SubTypeSet,
    size: usize,
}

impl SequenceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sequences(sequences: impl IntoIterator<Item = Sequence>) -> Self {
        let mut collection = Self::new();
        for seq in sequences {
            collection.add(seq);
        }
        collection
    }

    /// Index `seq` under the exact type of every active variable of its
    /// last statement. Returns false if no such variable exists, in which
    /// case the sequence is not stored.
    pub fn add(&mut self, seq: Sequence) -> bool {
        let mut seen = BTreeSet::new();
        for var in seq.last_statement_variables() {
            if !seq.is_active(var.index()) {
                continue;
            }
            match var.output_type() {
                Some(ty) if !ty.is_void() => {
                    seen.insert(ty);
                }
                _ => {}
            }
        }
        if seen.is_empty() {
            return false;
        }
        for ty in seen {
            self.types.add(ty.clone());
            self.buckets.entry(ty).or_default().push(seq.clone());
        }
        self.size += 1;
        true
    }

    /// Memoize the compatible-type set for `ty` so a following `view` is a
    /// cheap lookup.
    pub fn prime(&mut self, ty: &Type) {
        self.types.get_matches(ty);
    }

    pub fn view(&self, ty: &Type, mode: Match) -> SequenceView<'_> {
        let mut view = SequenceView::new();
        match mode {
            Match::ExactType => {
                if let Some(bucket) = self.buckets.get(ty) {
                    view.push(bucket);
                }
            }
            Match::CompatibleType => {
                for found in self.types.matches(ty) {
                    if let Some(bucket) = self.buckets.get(&found) {
                        view.push(bucket);
                    }
                }
            }
        }
        view
    }

    pub fn sequences_for_type(&mut self, ty: &Type, mode: Match) -> SequenceView<'_> {
        self.prime(ty);
        self.view(ty, mode)
    }

    pub fn has_sequences(&mut self, ty: &Type, mode: Match) -> bool {
        self.types.contains_assignable(ty, mode)
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.types = SubTypeSet::new();
        self.size = 0;
    }

    /// Number of sequences stored.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn num_types(&self) -> usize {
        self.types.len()
    }

    /// Every stored sequence once, in bucket order.
    pub fn all_sequences(&self) -> Vec<Sequence> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for seq in self.buckets.values().flatten() {
            if seen.insert(seq) {
                out.push(seq.clone());
            }
        }
        out
    }

    /// Single-literal sequences of primitive and string types.
    pub fn primitive_sequences(&self) -> Vec<Sequence> {
        self.buckets
            .iter()
            .filter(|(ty, _)| ty.is_primitive_like())
            .flat_map(|(_, seqs)| seqs.iter())
            .filter(|seq| seq.is_primitive())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessel_ir::types::ClassDecl;
    use tessel_ir::{LiteralValue, Operation, PrimitiveKind, TypeRegistry};

    #[test]
    fn test_view_joins_buckets() {
        let mut reg = TypeRegistry::new();
        let base = reg.declare(&ClassDecl::class("pkg.Base")).unwrap();
        let derived = reg
            .declare(&ClassDecl::class("pkg.Derived").extends("pkg.Base"))
            .unwrap();
        let mut c = SequenceCollection::new();
        assert!(c.add(Sequence::create(Arc::new(Operation::constructor(&base, vec![]))).unwrap()));
        assert!(c.add(Sequence::create(Arc::new(Operation::constructor(&derived, vec![]))).unwrap()));

        assert_eq!(c.sequences_for_type(&base, Match::CompatibleType).len(), 2);
        assert_eq!(c.sequences_for_type(&base, Match::ExactType).len(), 1);
        assert_eq!(c.sequences_for_type(&derived, Match::CompatibleType).len(), 1);
        assert_eq!(c.num_types(), 2);
        assert_eq!(c.size(), 2);
    }

    #[test]
    fn test_inactive_tail_is_not_indexed() {
        let reg = TypeRegistry::new();
        let int = reg.primitive(PrimitiveKind::Int);
        let mut seq =
            Sequence::create(Arc::new(Operation::literal(&int, LiteralValue::Int(1)).unwrap()))
                .unwrap();
        seq.clear_all_active();
        let mut c = SequenceCollection::new();
        assert!(!c.add(seq));
        assert_eq!(c.size(), 0);
        assert!(!c.has_sequences(&int, Match::ExactType));
    }

    #[test]
    fn test_primitive_sequences_and_clear() {
        let reg = TypeRegistry::new();
        let int = reg.primitive(PrimitiveKind::Int);
        let lit = |v| Sequence::create(Arc::new(Operation::literal(&int, LiteralValue::Int(v)).unwrap())).unwrap();
        let mut c = SequenceCollection::with_sequences([lit(1), lit(2), lit(2)]);
        assert_eq!(c.primitive_sequences().len(), 3);
        assert_eq!(c.all_sequences().len(), 2);
        c.clear();
        assert_eq!(c.size(), 0);
        assert!(c.view(&int, Match::CompatibleType).is_empty());
    }

    #[test]
    fn test_view_get_walks_parts() {
        let reg = TypeRegistry::new();
        let int = reg.primitive(PrimitiveKind::Int);
        let seqs: Vec<Sequence> = (0..3)
            .map(|v| Sequence::create(Arc::new(Operation::literal(&int, LiteralValue::Int(v)).unwrap())).unwrap())
            .collect();
        let mut view = SequenceView::new();
        view.push(&seqs[..1]);
        view.push(&[]);
        view.push(&seqs[1..]);
        assert_eq!(view.len(), 3);
        assert_eq!(view.get(2), Some(&seqs[2]));
        assert_eq!(view.get(3), None);
        assert_eq!(view.iter().count(), 3);
    }
}
