use std::collections::BTreeSet;

use proptest::prelude::*;
use tessel_explore::SubTypeSet;
use tessel_ir::types::ClassDecl;
use tessel_ir::{Match, PrimitiveKind, Type, TypeRegistry};

/// A small universe: primitives, strings, arrays and a random single
/// inheritance forest where class `i` extends some class `j < i` or Object.
fn universe(parents: &[Option<u8>]) -> Vec<Type> {
    let mut reg = TypeRegistry::new();
    let mut classes: Vec<Type> = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        let mut decl = ClassDecl::class(&format!("pkg.C{i}"));
        if let Some(p) = parent {
            if !classes.is_empty() {
                let j = usize::from(*p) % classes.len();
                decl = decl.extends(classes[j].name());
            }
        }
        classes.push(reg.declare(&decl).unwrap());
    }

    let mut types = vec![
        reg.object(),
        reg.string(),
        reg.primitive(PrimitiveKind::Int),
        reg.primitive(PrimitiveKind::Long),
        reg.resolve("java.lang.Integer").unwrap(),
        reg.resolve("int[]").unwrap(),
    ];
    for class in &classes {
        types.push(class.clone());
        types.push(Type::array_of(class));
    }
    types
}

#[derive(Debug, Clone)]
enum Action {
    Add(u8),
    Query(u8),
}

fn actions() -> impl Strategy<Value = Vec<Action>> {
    prop::collection::vec(
        prop_oneof![any::<u8>().prop_map(Action::Add), any::<u8>().prop_map(Action::Query)],
        0..60,
    )
}

fn parents() -> impl Strategy<Value = Vec<Option<u8>>> {
    prop::collection::vec(proptest::option::of(any::<u8>()), 1..8)
}

proptest! {
    #[test]
    fn matches_agree_with_ground_truth(parents in parents(), actions in actions()) {
        let types = universe(&parents);
        let pick = |i: u8| types[usize::from(i) % types.len()].clone();

        let mut set = SubTypeSet::new();
        let mut added: BTreeSet<Type> = BTreeSet::new();
        for action in &actions {
            match action {
                Action::Add(i) => {
                    let ty = pick(*i);
                    prop_assert_eq!(set.add(ty.clone()), added.insert(ty));
                }
                Action::Query(i) => {
                    let query = pick(*i);
                    let expected: BTreeSet<Type> =
                        added.iter().filter(|t| t.can_be_used_as(&query)).cloned().collect();
                    prop_assert_eq!(set.get_matches(&query), &expected);
                    prop_assert_eq!(
                        set.contains_assignable(&query, Match::CompatibleType),
                        !expected.is_empty()
                    );
                }
            }
        }

        // Memoized answers must still match after the last additions.
        for query in &types {
            let expected: BTreeSet<Type> =
                added.iter().filter(|t| t.can_be_used_as(query)).cloned().collect();
            prop_assert_eq!(set.matches(query), expected);
        }
    }
}
