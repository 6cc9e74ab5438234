use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::Rng;
use tessel_ir::{LiteralValue, Match, Operation, PrimitiveKind, Type};

use crate::error::SequenceError;
use crate::list::StatementList;
use crate::statement::{RelativeIndex, Statement};

/// Name used for the value of statement `index` in text and code output.
pub fn variable_name(index: usize) -> String {
    format!("var{index}")
}

/// An immutable sequence of statements.
///
/// The hash is the wrapping sum of the statement hashes, so extension
/// updates it in O(1). `net_size` counts the non-literal statements. The
/// active flags mark which produced values are worth reusing as inputs;
/// they are bookkeeping for the generator and take no part in equality.
#[derive(Clone)]
pub struct Sequence {
    statements: StatementList,
    hash: u64,
    net_size: usize,
    active: Vec<u64>,
}

/// The value produced by statement `index` of a particular sequence.
#[derive(Clone, Copy)]
pub struct Variable<'a> {
    sequence: &'a Sequence,
    index: usize,
}

impl<'a> Variable<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sequence(&self) -> &'a Sequence {
        self.sequence
    }

    pub fn statement(&self) -> Option<&'a Statement> {
        self.sequence.statement(self.index)
    }

    pub fn output_type(&self) -> Option<Type> {
        self.sequence.output_type(self.index)
    }

    pub fn name(&self) -> String {
        variable_name(self.index)
    }
}

impl PartialEq for Variable<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && std::ptr::eq(self.sequence, other.sequence)
    }
}

impl fmt::Debug for Variable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequence {
    pub fn new() -> Self {
        Self::from_list(StatementList::new(), 0, 0)
    }

    fn from_list(statements: StatementList, hash: u64, net_size: usize) -> Self {
        let mut seq = Self {
            active: Vec::new(),
            statements,
            hash,
            net_size,
        };
        seq.set_all_active();
        seq
    }

    /// A one-statement sequence applying a parameterless operation.
    pub fn create(op: Arc<Operation>) -> Result<Self, SequenceError> {
        Self::new().extend(op, &[])
    }

    /// A one-statement sequence declaring the null/zero literal of `ty`.
    pub fn null_or_zero(ty: &Type) -> Self {
        let stmt = Statement::new(Arc::new(Operation::null_or_zero(ty)), Vec::new());
        let hash = stmt.stable_hash();
        Self::from_list(StatementList::new().push(stmt), hash, 0)
    }

    // ── Structure ────────────────────────────────────────────────────

    pub fn size(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn net_size(&self) -> usize {
        self.net_size
    }

    pub fn hash_code(&self) -> u64 {
        self.hash
    }

    pub fn statement(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    pub fn last_statement(&self) -> Option<&Statement> {
        self.statements.last()
    }

    pub fn statements(&self) -> std::vec::IntoIter<&Statement> {
        self.statements.iter()
    }

    pub fn output_type(&self, index: usize) -> Option<Type> {
        self.statement(index).map(Statement::output_type)
    }

    /// Absolute indices of the inputs of statement `index`.
    pub fn input_indices(&self, index: usize) -> Vec<usize> {
        self.statement(index)
            .map(|s| s.inputs().iter().filter_map(|r| r.resolve(index)).collect())
            .unwrap_or_default()
    }

    pub fn is_literal(&self, index: usize) -> bool {
        self.statement(index).is_some_and(Statement::is_literal)
    }

    pub fn is_null_literal(&self, index: usize) -> bool {
        self.statement(index).is_some_and(Statement::is_null_literal)
    }

    /// A single literal declaration and nothing else.
    pub fn is_primitive(&self) -> bool {
        self.size() == 1 && self.is_literal(0)
    }

    pub fn variable(&self, index: usize) -> Result<Variable<'_>, SequenceError> {
        if index >= self.size() {
            return Err(SequenceError::IndexOutOfBounds {
                index,
                size: self.size(),
            });
        }
        Ok(Variable {
            sequence: self,
            index,
        })
    }

    // ── Building ─────────────────────────────────────────────────────

    /// Append one application of `op` to variables of this sequence.
    pub fn extend(&self, op: Arc<Operation>, inputs: &[Variable<'_>]) -> Result<Self, SequenceError> {
        let types = op.input_types();
        if inputs.len() != types.len() {
            return Err(SequenceError::Arity {
                descriptor: op.descriptor(),
                expected: types.len(),
                actual: inputs.len(),
            });
        }

        let position = self.size();
        let mut relative = Vec::with_capacity(inputs.len());
        for (slot, (var, expected)) in inputs.iter().zip(&types).enumerate() {
            if !var.sequence.statements.ptr_eq(&self.statements) {
                return Err(SequenceError::ForeignVariable { slot });
            }
            let found = self
                .output_type(var.index)
                .ok_or(SequenceError::IndexOutOfBounds {
                    index: var.index,
                    size: position,
                })?;
            if !found.can_be_used_as(expected) {
                return Err(SequenceError::IncompatibleInput {
                    slot,
                    expected: expected.name().to_string(),
                    found: found.name().to_string(),
                });
            }
            relative.push(RelativeIndex::new(var.index as i64 - position as i64)?);
        }

        let stmt = Statement::new(op, relative);
        let hash = self.hash.wrapping_add(stmt.stable_hash());
        let net_size = self.net_size + usize::from(!stmt.is_literal());
        Ok(Self::from_list(self.statements.push(stmt), hash, net_size))
    }

    /// `extend` with inputs given as absolute statement indices.
    pub fn extend_indices(&self, op: Arc<Operation>, inputs: &[usize]) -> Result<Self, SequenceError> {
        let vars = inputs
            .iter()
            .map(|&i| self.variable(i))
            .collect::<Result<Vec<_>, _>>()?;
        self.extend(op, &vars)
    }

    /// Lay sequences end to end. Relative inputs stay valid, so no
    /// statement is rewritten.
    pub fn concatenate(sequences: &[Sequence]) -> Self {
        let lists: Vec<StatementList> = sequences.iter().map(|s| s.statements.clone()).collect();
        let hash = sequences
            .iter()
            .fold(0u64, |acc, s| acc.wrapping_add(s.hash));
        let net_size = sequences.iter().map(|s| s.net_size).sum();
        Self::from_list(StatementList::concat(&lists), hash, net_size)
    }

    /// Replay the last statement `times` more times. Every `int` input is
    /// replaced by a freshly declared literal drawn from `fresh_int`; other
    /// inputs are shared with the original statement.
    pub fn repeat_last(
        &self,
        times: usize,
        fresh_int: &mut dyn FnMut() -> i32,
    ) -> Result<Self, SequenceError> {
        let Some(last) = self.last_statement() else {
            return Ok(self.clone());
        };
        let op = last.operation_arc().clone();
        let types = op.input_types();
        let inputs = self.input_indices(self.size() - 1);

        let mut seq = self.clone();
        for _ in 0..times {
            let mut indices = Vec::with_capacity(inputs.len());
            for (slot, &input) in inputs.iter().enumerate() {
                if types[slot].primitive() == Some(PrimitiveKind::Int) {
                    let literal = Operation::literal(&types[slot], LiteralValue::Int(fresh_int()))?;
                    seq = seq.extend(Arc::new(literal), &[])?;
                    indices.push(seq.size() - 1);
                } else {
                    indices.push(input);
                }
            }
            seq = seq.extend_indices(op.clone(), &indices)?;
        }
        Ok(seq)
    }

    // ── Variables ────────────────────────────────────────────────────

    /// Output of the last statement first, then its inputs.
    pub fn last_statement_variables(&self) -> Vec<Variable<'_>> {
        let Some(last) = self.size().checked_sub(1) else {
            return Vec::new();
        };
        std::iter::once(last)
            .chain(self.input_indices(last))
            .map(|index| Variable {
                sequence: self,
                index,
            })
            .collect()
    }

    pub fn last_statement_types(&self) -> Vec<Type> {
        self.last_statement_variables()
            .iter()
            .filter_map(Variable::output_type)
            .collect()
    }

    pub fn variables_of_type(&self, ty: &Type, mode: Match) -> Vec<Variable<'_>> {
        (0..self.size())
            .filter(|&i| self.output_type(i).is_some_and(|t| mode.matches(&t, ty)))
            .map(|index| Variable {
                sequence: self,
                index,
            })
            .collect()
    }

    /// Values of the last statement (output and inputs) usable as `ty`,
    /// excluding void results.
    pub fn last_statement_variables_of_type(&self, ty: &Type, mode: Match) -> Vec<Variable<'_>> {
        self.last_statement_variables()
            .into_iter()
            .filter(|v| {
                v.output_type()
                    .is_some_and(|t| !t.is_void() && mode.matches(&t, ty))
            })
            .collect()
    }

    pub fn random_variable_for_type_last_statement<R: Rng + ?Sized>(
        &self,
        ty: &Type,
        mode: Match,
        rng: &mut R,
    ) -> Option<Variable<'_>> {
        let candidates = self.last_statement_variables_of_type(ty, mode);
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())])
    }

    pub fn random_variable_of_type<R: Rng + ?Sized>(
        &self,
        ty: &Type,
        mode: Match,
        rng: &mut R,
    ) -> Option<Variable<'_>> {
        let candidates = self.variables_of_type(ty, mode);
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.gen_range(0..candidates.len())])
    }

    // ── Active flags ─────────────────────────────────────────────────

    pub fn is_active(&self, index: usize) -> bool {
        self.active
            .get(index / 64)
            .is_some_and(|word| word & (1u64 << (index % 64)) != 0)
    }

    pub fn set_active(&mut self, index: usize) {
        if index < self.size() {
            self.active[index / 64] |= 1u64 << (index % 64);
        }
    }

    pub fn clear_active(&mut self, index: usize) {
        if let Some(word) = self.active.get_mut(index / 64) {
            *word &= !(1u64 << (index % 64));
        }
    }

    pub fn set_all_active(&mut self) {
        let size = self.size();
        self.active = vec![0; size.div_ceil(64)];
        for i in 0..size {
            self.active[i / 64] |= 1u64 << (i % 64);
        }
    }

    pub fn clear_all_active(&mut self) {
        self.active.iter_mut().for_each(|w| *w = 0);
    }

    pub fn has_active_flags(&self) -> bool {
        self.active.iter().any(|&w| w != 0)
    }

    pub fn active_indices(&self) -> Vec<usize> {
        (0..self.size()).filter(|&i| self.is_active(i)).collect()
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash || self.size() != other.size() {
            return false;
        }
        if self.statements.ptr_eq(&other.statements) {
            return true;
        }
        self.statements().eq(other.statements())
    }
}

impl Eq for Sequence {}

impl Hash for Sequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_parseable_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tessel_ir::types::ClassDecl;
    use tessel_ir::TypeRegistry;

    struct Fixture {
        reg: TypeRegistry,
        foo: Type,
    }

    fn fixture() -> Fixture {
        let mut reg = TypeRegistry::new();
        let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        Fixture { reg, foo }
    }

    fn int_lit(f: &Fixture, v: i32) -> Arc<Operation> {
        Arc::new(Operation::literal(&f.reg.primitive(PrimitiveKind::Int), LiteralValue::Int(v)).unwrap())
    }

    #[test]
    fn test_extend_grows_by_one_and_leaves_original() {
        let f = fixture();
        let base = Sequence::create(int_lit(&f, 1)).unwrap();
        let ctor = Arc::new(Operation::constructor(&f.foo, vec![f.reg.primitive(PrimitiveKind::Int)]));
        let a = base.extend(ctor.clone(), &[base.variable(0).unwrap()]).unwrap();
        assert_eq!(a.size(), base.size() + 1);
        assert_eq!(base.size(), 1);
        assert_eq!(a.net_size(), 1);
        assert_eq!(base.net_size(), 0);

        let b = base.extend(int_lit(&f, 2), &[]).unwrap();
        assert_ne!(a, b);
        assert_eq!(base.size(), 1);
    }

    #[test]
    fn test_extend_validates_inputs() {
        let f = fixture();
        let base = Sequence::create(int_lit(&f, 1)).unwrap();
        let other = Sequence::create(int_lit(&f, 1)).unwrap();
        let ctor = Arc::new(Operation::constructor(&f.foo, vec![f.reg.primitive(PrimitiveKind::Int)]));

        assert!(matches!(
            base.extend(ctor.clone(), &[]),
            Err(SequenceError::Arity { expected: 1, actual: 0, .. })
        ));
        assert!(matches!(
            base.extend(ctor, &[other.variable(0).unwrap()]),
            Err(SequenceError::ForeignVariable { slot: 0 })
        ));

        let takes_foo = Arc::new(Operation::method(&f.foo, "id", vec![], &f.foo));
        assert!(matches!(
            base.extend(takes_foo, &[base.variable(0).unwrap()]),
            Err(SequenceError::IncompatibleInput { slot: 0, .. })
        ));
    }

    #[test]
    fn test_structural_equality_and_hash() {
        let f = fixture();
        let a = Sequence::create(int_lit(&f, 1)).unwrap();
        let b = Sequence::create(int_lit(&f, 1)).unwrap();
        let c = Sequence::create(int_lit(&f, 2)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.hash_code(), b.hash_code());
        assert_ne!(a, c);
    }

    #[test]
    fn test_concatenate_preserves_order() {
        let f = fixture();
        let a = Sequence::create(int_lit(&f, 1)).unwrap();
        let b = Sequence::create(int_lit(&f, 2))
            .unwrap()
            .extend_indices(int_lit(&f, 3), &[])
            .unwrap();
        let joined = Sequence::concatenate(&[a.clone(), b.clone()]);
        assert_eq!(joined.size(), 3);
        assert_eq!(joined.statement(0), a.statement(0));
        assert_eq!(joined.statement(1), b.statement(0));
        assert_eq!(joined.statement(2), b.statement(1));
        assert_eq!(
            joined.hash_code(),
            a.hash_code().wrapping_add(b.hash_code())
        );
    }

    #[test]
    fn test_last_statement_variables() {
        let f = fixture();
        let int = f.reg.primitive(PrimitiveKind::Int);
        let seq = Sequence::create(int_lit(&f, 5))
            .unwrap()
            .extend_indices(Arc::new(Operation::constructor(&f.foo, vec![int.clone()])), &[0])
            .unwrap();
        let vars = seq.last_statement_variables();
        assert_eq!(vars.iter().map(|v| v.index()).collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(seq.last_statement_types(), vec![f.foo.clone(), int.clone()]);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let v = seq
            .random_variable_for_type_last_statement(&f.foo, Match::CompatibleType, &mut rng)
            .unwrap();
        assert_eq!(v.index(), 1);
        assert!(seq
            .random_variable_for_type_last_statement(&f.reg.string(), Match::CompatibleType, &mut rng)
            .is_none());
        assert_eq!(seq.variables_of_type(&int, Match::ExactType).len(), 1);
    }

    #[test]
    fn test_active_flags() {
        let f = fixture();
        let mut seq = Sequence::create(int_lit(&f, 1))
            .unwrap()
            .extend_indices(int_lit(&f, 2), &[])
            .unwrap();
        assert!(seq.is_active(0) && seq.is_active(1));
        seq.clear_active(0);
        assert_eq!(seq.active_indices(), vec![1]);
        seq.clear_all_active();
        assert!(!seq.has_active_flags());
        seq.set_active(1);
        assert!(seq.has_active_flags());
        seq.set_active(7);
        assert!(!seq.is_active(7));
    }

    #[test]
    fn test_repeat_last_replaces_int_inputs() {
        let f = fixture();
        let int = f.reg.primitive(PrimitiveKind::Int);
        let add = Arc::new(Operation::method(&f.foo, "add", vec![int.clone()], &f.reg.void()));
        let seq = Sequence::create(Arc::new(Operation::constructor(&f.foo, vec![])))
            .unwrap()
            .extend_indices(int_lit(&f, 1), &[])
            .unwrap()
            .extend_indices(add, &[0, 1])
            .unwrap();
        let mut next = 40;
        let repeated = seq
            .repeat_last(2, &mut || {
                next += 1;
                next
            })
            .unwrap();
        // Each repetition declares one fresh int and reapplies `add`.
        assert_eq!(repeated.size(), seq.size() + 4);
        assert_eq!(repeated.input_indices(4), vec![0, 3]);
        assert_eq!(
            repeated.statement(5).and_then(|s| s.operation().literal_value()),
            Some(&LiteralValue::Int(42))
        );
    }

    #[test]
    fn test_null_or_zero_sequence() {
        let f = fixture();
        let s = Sequence::null_or_zero(&f.foo);
        assert!(s.is_null_literal(0));
        assert!(s.is_primitive());
        assert_eq!(s, Sequence::null_or_zero(&f.foo));
    }
}
