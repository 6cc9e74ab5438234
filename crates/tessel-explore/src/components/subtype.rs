//! Incremental index from a query type to the registered types usable as it.

use std::collections::{BTreeMap, BTreeSet};

use tessel_ir::{Match, Type};

/// Registered types plus, per queried type, the memoized set of
/// registered types usable as it.
///
/// Memoized sets are kept current by `add`, so a query never rescans once
/// its type has been seen.
#[derive(Debug, Clone, Default)]
pub struct SubTypeSet {
    types: BTreeSet<Type>,
    memo: BTreeMap<Type, BTreeSet<Type>>,
}

impl SubTypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type. Returns false if it was already known.
    pub fn add(&mut self, ty: Type) -> bool {
        if self.types.contains(&ty) {
            return false;
        }
        for (query, matches) in &mut self.memo {
            if ty.can_be_used_as(query) {
                matches.insert(ty.clone());
            }
        }
        self.types.insert(ty);
        true
    }

    /// Registered types usable as `query`, computing and memoizing the set
    /// on first use.
    pub fn get_matches(&mut self, query: &Type) -> &BTreeSet<Type> {
        if !self.memo.contains_key(query) {
            let found = self.scan(query);
            self.memo.insert(query.clone(), found);
        }
        &self.memo[query]
    }

    /// Same answer as `get_matches` without touching the memo.
    pub fn matches(&self, query: &Type) -> BTreeSet<Type> {
        match self.memo.get(query) {
            Some(found) => found.clone(),
            None => self.scan(query),
        }
    }

    fn scan(&self, query: &Type) -> BTreeSet<Type> {
        self.types
            .iter()
            .filter(|t| t.can_be_used_as(query))
            .cloned()
            .collect()
    }

    pub fn contains_assignable(&mut self, ty: &Type, mode: Match) -> bool {
        match mode {
            Match::ExactType => self.types.contains(ty),
            Match::CompatibleType => !self.get_matches(ty).is_empty(),
        }
    }

    pub fn contains(&self, ty: &Type) -> bool {
        self.types.contains(ty)
    }

    pub fn types(&self) -> impl Iterator<Item = &Type> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
