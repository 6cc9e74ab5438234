//! The general component pool plus class- and package-scoped literal pools.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tessel_ir::{Match, Operation, Type};
use tessel_sequence::{Sequence, SequenceError};

use super::collection::{SequenceCollection, SequenceView};

#[derive(Debug, Clone, Default)]
pub struct ComponentManager {
    general: SequenceCollection,
    seeds: Vec<Sequence>,
    class_literals: BTreeMap<Type, SequenceCollection>,
    package_literals: BTreeMap<String, SequenceCollection>,
}

impl ComponentManager {
    /// A manager whose general pool starts out holding `seeds`. Clearing
    /// the pool returns it to exactly these.
    pub fn new(seeds: Vec<Sequence>) -> Self {
        Self {
            general: SequenceCollection::with_sequences(seeds.iter().cloned()),
            seeds,
            class_literals: BTreeMap::new(),
            package_literals: BTreeMap::new(),
        }
    }

    /// Literals visible to members of `class` and its subclasses.
    pub fn add_class_literals(&mut self, class: &Type, literals: &[Operation]) -> Result<(), SequenceError> {
        let pool = self.class_literals.entry(class.clone()).or_default();
        for op in literals {
            pool.add(Sequence::create(Arc::new(op.clone()))?);
        }
        Ok(())
    }

    /// Literals visible to members of every class in `package`.
    pub fn add_package_literals(&mut self, package: &str, literals: &[Operation]) -> Result<(), SequenceError> {
        let pool = self.package_literals.entry(package.to_string()).or_default();
        for op in literals {
            pool.add(Sequence::create(Arc::new(op.clone()))?);
        }
        Ok(())
    }

    pub fn add_sequence(&mut self, seq: Sequence) -> bool {
        self.general.add(seq)
    }

    /// Size of the general pool, seeds included.
    pub fn num_generated(&self) -> usize {
        self.general.size()
    }

    /// Reset the general pool to the seeds. Literal pools are untouched.
    pub fn clear_generated_sequences(&mut self) {
        self.general = SequenceCollection::with_sequences(self.seeds.iter().cloned());
    }

    pub fn general(&self) -> &SequenceCollection {
        &self.general
    }

    pub fn seeds(&self) -> &[Sequence] {
        &self.seeds
    }

    /// General components usable as `ty`.
    pub fn sequences_for_type(&mut self, ty: &Type) -> SequenceView<'_> {
        self.general.sequences_for_type(ty, Match::CompatibleType)
    }

    /// Candidates for input `slot` of `op`: general components usable as
    /// the slot type, joined with the literal pools scoped to the declaring
    /// class, its superclasses (never `Object`) and their packages.
    /// Receivers only draw from the general pool.
    pub fn sequences_for_input(&mut self, op: &Operation, slot: usize) -> SequenceView<'_> {
        let Some(ty) = op.input_types().get(slot).cloned() else {
            return SequenceView::new();
        };
        let scopes = if slot == 0 && op.has_receiver() {
            Vec::new()
        } else {
            scope_chain(op)
        };
        let packages: BTreeSet<String> = scopes
            .iter()
            .filter_map(|t| t.package().map(str::to_string))
            .collect();

        self.general.prime(&ty);
        for scope in &scopes {
            if let Some(pool) = self.class_literals.get_mut(scope) {
                pool.prime(&ty);
            }
        }
        for package in &packages {
            if let Some(pool) = self.package_literals.get_mut(package) {
                pool.prime(&ty);
            }
        }

        let mut view = self.general.view(&ty, Match::CompatibleType);
        for scope in &scopes {
            if let Some(pool) = self.class_literals.get(scope) {
                view.append(pool.view(&ty, Match::CompatibleType));
            }
        }
        for package in &packages {
            if let Some(pool) = self.package_literals.get(package) {
                view.append(pool.view(&ty, Match::CompatibleType));
            }
        }
        view
    }

    /// Every single-literal sequence known to any pool.
    pub fn all_primitive_sequences(&self) -> Vec<Sequence> {
        let mut out = self.general.primitive_sequences();
        for pool in self.class_literals.values().chain(self.package_literals.values()) {
            out.extend(pool.primitive_sequences());
        }
        out
    }
}

/// The declaring class followed by its superclasses, stopping before
/// `java.lang.Object`.
fn scope_chain(op: &Operation) -> Vec<Type> {
    let mut chain = Vec::new();
    let mut current = op.declaring_type().cloned();
    while let Some(ty) = current {
        if ty.is_object() {
            break;
        }
        current = ty.superclass().cloned();
        chain.push(ty);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_ir::types::ClassDecl;
    use tessel_ir::{LiteralValue, PrimitiveKind, TypeRegistry};

    fn int_literal(reg: &TypeRegistry, v: i32) -> Operation {
        Operation::literal(&reg.primitive(PrimitiveKind::Int), LiteralValue::Int(v)).unwrap()
    }

    #[test]
    fn test_class_literals_visible_to_subclass_members() {
        let mut reg = TypeRegistry::new();
        let base = reg.declare(&ClassDecl::class("pkg.Base")).unwrap();
        let derived = reg
            .declare(&ClassDecl::class("pkg.Derived").extends("pkg.Base"))
            .unwrap();
        let other = reg.declare(&ClassDecl::class("other.Thing")).unwrap();
        let int = reg.primitive(PrimitiveKind::Int);

        let mut cm = ComponentManager::new(vec![Sequence::create(Arc::new(int_literal(&reg, 0))).unwrap()]);
        cm.add_class_literals(&base, &[int_literal(&reg, 42)]).unwrap();

        let on_derived = Operation::method(&derived, "put", vec![int.clone()], &reg.void());
        let on_other = Operation::method(&other, "put", vec![int.clone()], &reg.void());
        assert_eq!(cm.sequences_for_input(&on_derived, 1).len(), 2);
        assert_eq!(cm.sequences_for_input(&on_other, 1).len(), 1);
    }

    #[test]
    fn test_receivers_skip_literal_pools() {
        let mut reg = TypeRegistry::new();
        let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        let mut cm = ComponentManager::new(Vec::new());
        cm.add_class_literals(&foo, &[Operation::null_or_zero(&foo)]).unwrap();
        let op = Operation::method(&foo, "run", vec![], &reg.void());
        assert!(cm.sequences_for_input(&op, 0).is_empty());
    }

    #[test]
    fn test_package_literals() {
        let mut reg = TypeRegistry::new();
        let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        let str_lit = Operation::literal(&reg.string(), LiteralValue::Str("k".into())).unwrap();
        let mut cm = ComponentManager::new(Vec::new());
        cm.add_package_literals("pkg", &[str_lit]).unwrap();
        let op = Operation::static_method(&foo, "of", vec![reg.string()], &foo);
        assert_eq!(cm.sequences_for_input(&op, 0).len(), 1);
        assert_eq!(cm.all_primitive_sequences().len(), 1);
    }

    #[test]
    fn test_clear_restores_seeds() {
        let mut reg = TypeRegistry::new();
        let foo = reg.declare(&ClassDecl::class("pkg.Foo")).unwrap();
        let seed = Sequence::create(Arc::new(int_literal(&reg, 1))).unwrap();
        let mut cm = ComponentManager::new(vec![seed]);
        cm.add_sequence(Sequence::create(Arc::new(Operation::constructor(&foo, vec![]))).unwrap());
        assert_eq!(cm.num_generated(), 2);
        cm.clear_generated_sequences();
        assert_eq!(cm.num_generated(), 1);
        assert!(cm.sequences_for_type(&foo).is_empty());
    }
}
