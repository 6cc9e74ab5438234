//! The forward generation step: select an operation, pick inputs from the
//! component pools, build and dedup a candidate, run it, classify its
//! values and promote it when something in it is worth reusing.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tessel_ir::literal::is_valid_string_literal;
use tessel_ir::universe::Universe;
use tessel_ir::{ExecutionBackend, LiteralValue, Match, Operation, Type, TypeRegistry, Value};
use tessel_model::strings::looks_like_object_to_string;
use tessel_sandbox::{
    ContractCheckingVisitor, ExecConfig, ExecutableSequence, ExecutionVisitor, MultiVisitor,
    RegressionCaptureVisitor,
};
use tessel_sequence::Sequence;

use super::config::GenConfig;
use super::seeds::default_seeds;
use super::state_matcher::{EqualsMatcher, StateMatcher};
use super::GenerationError;
use crate::components::helper::create_array_sequence;
use crate::components::{ComponentManager, SubTypeSet};
use crate::rng::Randomness;

/// Plain counters describing what the generator has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorCounters {
    pub steps: u64,
    /// Steps where no viable inputs were found.
    pub selection_failures: u64,
    pub size_discards: u64,
    pub duplicates: u64,
    pub executed: u64,
    pub promoted: u64,
}

/// Inputs chosen for one operation: the subsequences to concatenate and,
/// per input slot, the absolute index of the chosen variable in the
/// concatenation.
struct SelectedInputs {
    sequences: Vec<Sequence>,
    indices: Vec<usize>,
}

enum Candidate {
    /// No component can supply the slot.
    Missing,
    /// Null (or zero) was drawn on purpose.
    Null,
    Picked(Sequence),
}

pub struct ForwardGenerator {
    operations: Vec<Arc<Operation>>,
    components: ComponentManager,
    registry: TypeRegistry,
    config: GenConfig,
    exec_config: ExecConfig,
    random: Randomness,
    backend: Box<dyn ExecutionBackend>,
    visitor: Box<dyn ExecutionVisitor>,

    // ── Run-scoped state ──
    all_sequences: HashSet<Sequence>,
    codes: HashSet<String>,
    subsumed: HashSet<Sequence>,
    runtime_primitives_seen: HashSet<LiteralValue>,
    object_cache: Option<Box<dyn StateMatcher>>,
    counters: GeneratorCounters,
}

impl ForwardGenerator {
    pub fn new(
        operations: Vec<Operation>,
        components: ComponentManager,
        registry: TypeRegistry,
        backend: Box<dyn ExecutionBackend>,
        config: GenConfig,
    ) -> Result<Self, GenerationError> {
        config.validate()?;

        let runtime_primitives_seen = components
            .all_primitive_sequences()
            .iter()
            .filter_map(|s| s.statement(0)?.operation().literal_value().cloned())
            .map(canonical)
            .collect();
        let object_cache: Option<Box<dyn StateMatcher>> = if config.use_object_cache {
            Some(Box::new(EqualsMatcher::new()))
        } else {
            None
        };
        let visitor = MultiVisitor::new(vec![
            Box::new(ContractCheckingVisitor::with_default_contracts()),
            Box::new(RegressionCaptureVisitor::new()),
        ]);

        tracing::info!(
            operations = operations.len(),
            seeds = components.num_generated(),
            seed = config.seed,
            "forward generator ready"
        );

        Ok(Self {
            operations: operations.into_iter().map(Arc::new).collect(),
            components,
            registry,
            random: Randomness::new(config.seed),
            config,
            exec_config: ExecConfig::default(),
            backend,
            visitor: Box::new(visitor),
            all_sequences: HashSet::new(),
            codes: HashSet::new(),
            subsumed: HashSet::new(),
            runtime_primitives_seen,
            object_cache,
            counters: GeneratorCounters::default(),
        })
    }

    /// A generator over a loaded universe. The general pool holds the
    /// default seeds plus the universe's own literals; scoped literals go
    /// to the class and package pools selected by `config.literal_scope`.
    pub fn from_universe(
        universe: Universe,
        backend: Box<dyn ExecutionBackend>,
        config: GenConfig,
    ) -> Result<Self, GenerationError> {
        let mut seeds = default_seeds(&universe.registry);
        for op in universe.seeds {
            seeds.push(Sequence::create(Arc::new(op))?);
        }
        let mut components = ComponentManager::new(seeds);

        if config.literal_scope.uses_class() {
            for (class, literals) in &universe.class_literals {
                components.add_class_literals(class, literals)?;
            }
        }
        if config.literal_scope.uses_package() {
            let mut by_package: BTreeMap<String, Vec<Operation>> = BTreeMap::new();
            for (class, literals) in &universe.class_literals {
                if let Some(package) = class.package() {
                    by_package
                        .entry(package.to_string())
                        .or_default()
                        .extend(literals.iter().cloned());
                }
            }
            for (package, literals) in &by_package {
                components.add_package_literals(package, literals)?;
            }
        }

        Self::new(universe.operations, components, universe.registry, backend, config)
    }

    /// Replace the default contract-checking plus regression-capture
    /// visitor.
    pub fn with_visitor(mut self, visitor: Box<dyn ExecutionVisitor>) -> Self {
        self.visitor = visitor;
        self
    }

    pub fn with_exec_config(mut self, exec_config: ExecConfig) -> Self {
        self.exec_config = exec_config;
        self
    }

    /// Install an object cache. Only consulted when `use_object_cache` is
    /// set.
    pub fn with_state_matcher(mut self, matcher: Box<dyn StateMatcher>) -> Self {
        self.object_cache = Some(matcher);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// Distinct sequences built so far in this run.
    pub fn num_generated(&self) -> usize {
        self.all_sequences.len()
    }

    pub fn all_sequences(&self) -> &HashSet<Sequence> {
        &self.all_sequences
    }

    /// Sequences that appear as a prefix part of some larger sequence.
    pub fn subsumed_sequences(&self) -> &HashSet<Sequence> {
        &self.subsumed
    }

    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    /// Operations still selectable. Parameterless operations drop out after
    /// their first use.
    pub fn operations(&self) -> &[Arc<Operation>] {
        &self.operations
    }

    pub fn counters(&self) -> GeneratorCounters {
        self.counters
    }

    pub fn config(&self) -> &GenConfig {
        &self.config
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    // ── Step ─────────────────────────────────────────────────────────

    /// One round of generation.
    ///
    /// `Ok(None)` means nothing new was produced this round: selection
    /// failed, the candidate was too large or a duplicate, or (offline)
    /// it was promoted without running. Errors are engine faults.
    #[tracing::instrument(level = "debug", skip(self), fields(step = self.counters.steps + 1))]
    pub fn step(&mut self) -> Result<Option<ExecutableSequence>, GenerationError> {
        self.counters.steps += 1;

        // A pool holding only the seeds is already clear.
        let pooled = self.components.num_generated();
        if pooled > self.components.seeds().len() && pooled as u64 % self.config.clear_interval == 0 {
            tracing::info!(components = pooled, "clearing generated components");
            self.components.clear_generated_sequences();
        }

        let started = Instant::now();
        let Some(mut eseq) = self.create_new_unique_sequence()? else {
            return Ok(None);
        };
        let gen_time = started.elapsed();

        if self.config.offline {
            let mut seq = eseq.sequence;
            seq.set_all_active();
            self.promote(seq);
            return Ok(None);
        }

        eseq.execute(self.backend.as_mut(), self.visitor.as_mut(), &self.exec_config)?;
        self.counters.executed += 1;

        self.process_sequence(&mut eseq)?;
        if eseq.sequence.has_active_flags() {
            self.promote(eseq.sequence.clone());
        }
        eseq.gen_time = gen_time;
        Ok(Some(eseq))
    }

    fn promote(&mut self, seq: Sequence) {
        if self.components.add_sequence(seq) {
            self.counters.promoted += 1;
        }
    }

    fn create_new_unique_sequence(&mut self) -> Result<Option<ExecutableSequence>, GenerationError> {
        if self.operations.is_empty() {
            return Ok(None);
        }
        let op_index = self.random.next_index(self.operations.len());
        let op = self.operations[op_index].clone();
        tracing::debug!(operation = %op.descriptor(), "selected operation");

        let Some(inputs) = self.select_inputs(&op)? else {
            self.counters.selection_failures += 1;
            tracing::debug!(operation = %op.descriptor(), "no viable inputs");
            return Ok(None);
        };

        let mut seq = Sequence::concatenate(&inputs.sequences).extend_indices(op.clone(), &inputs.indices)?;

        if self.config.repeat_heuristic && self.random.next_index(10) == 0 {
            let times = self.random.next_index(100);
            let random = &mut self.random;
            seq = seq.repeat_last(times, &mut || random.next_int(100))?;
            tracing::debug!(times, "repeated last statement");
        }

        if op.arity() == 0 {
            self.operations.remove(op_index);
        }

        if seq.size() > self.config.max_size {
            self.counters.size_discards += 1;
            tracing::debug!(size = seq.size(), max = self.config.max_size, "sequence too large");
            return Ok(None);
        }

        if self.config.debug_checks {
            let code = seq.to_code_string();
            if self.all_sequences.contains(&seq) != self.codes.contains(&code) {
                return Err(GenerationError::Inconsistent { code });
            }
            self.codes.insert(code);
        }

        if !self.all_sequences.insert(seq.clone()) {
            self.counters.duplicates += 1;
            tracing::debug!("duplicate sequence");
            return Ok(None);
        }

        self.subsumed.extend(inputs.sequences);
        tracing::debug!(size = seq.size(), "new unique sequence");
        Ok(Some(ExecutableSequence::new(seq)))
    }

    /// Choose one variable per input slot of `op`. `None` means selection
    /// failed for this attempt.
    fn select_inputs(&mut self, op: &Operation) -> Result<Option<SelectedInputs>, GenerationError> {
        let input_types = op.input_types();
        let mut sequences = Vec::with_capacity(input_types.len());
        let mut indices = Vec::with_capacity(input_types.len());
        let mut total_size = 0;

        // Reference-typed variables already in the partial sequence.
        let mut types_so_far = SubTypeSet::new();
        let mut types_to_vars: BTreeMap<Type, Vec<usize>> = BTreeMap::new();

        for (slot, in_type) in input_types.iter().enumerate() {
            let is_receiver = slot == 0 && op.has_receiver();

            if self.config.alias_ratio > 0.0 && self.random.weighted_coin_flip(self.config.alias_ratio) {
                let candidates: Vec<usize> = types_so_far
                    .get_matches(in_type)
                    .iter()
                    .filter_map(|t| types_to_vars.get(t))
                    .flatten()
                    .copied()
                    .collect();
                if let Some(&var) = self.random.random_member(&candidates) {
                    indices.push(var);
                    continue;
                }
            }

            let helper = if in_type.is_array() {
                create_array_sequence(
                    &mut self.components,
                    in_type,
                    self.config.forbid_null,
                    &mut self.random,
                )?
            } else {
                None
            };

            let candidate = {
                let mut view = self.components.sequences_for_input(op, slot);
                if let Some(extra) = helper.as_ref() {
                    view.push(std::slice::from_ref(extra));
                }
                if view.is_empty() {
                    Candidate::Missing
                } else if !is_receiver
                    && !self.config.forbid_null
                    && self.config.null_ratio > 0.0
                    && self.random.weighted_coin_flip(self.config.null_ratio)
                {
                    Candidate::Null
                } else {
                    let pick = if self.config.small_tests {
                        let weights: Vec<f64> = view.iter().map(|s| 1.0 / s.size().max(1) as f64).collect();
                        self.random.weighted_index(&weights)
                    } else {
                        Some(self.random.next_index(view.len()))
                    };
                    match pick.and_then(|i| view.get(i)) {
                        Some(seq) => Candidate::Picked(seq.clone()),
                        None => Candidate::Missing,
                    }
                }
            };

            let (chosen, var) = match candidate {
                Candidate::Missing if is_receiver || self.config.forbid_null => {
                    tracing::debug!(slot, ty = %in_type, "no components for slot");
                    return Ok(None);
                }
                Candidate::Missing | Candidate::Null => (Sequence::null_or_zero(in_type), 0),
                Candidate::Picked(seq) => {
                    let var = match seq.random_variable_for_type_last_statement(
                        in_type,
                        Match::CompatibleType,
                        self.random.rng(),
                    ) {
                        Some(v) => v.index(),
                        None => {
                            return Err(GenerationError::NoMatchingVariable {
                                ty: in_type.to_string(),
                                sequence: seq.to_parseable_string(),
                            })
                        }
                    };
                    if is_receiver
                        && (seq.is_literal(var) || seq.output_type(var).is_some_and(|t| t.is_primitive()))
                    {
                        tracing::debug!(slot, "receiver would be a literal");
                        return Ok(None);
                    }
                    (seq, var)
                }
            };

            for j in 0..chosen.size() {
                let Some(ty) = chosen.output_type(j) else {
                    continue;
                };
                if ty.is_void() || ty.is_primitive_like() || chosen.is_literal(j) {
                    continue;
                }
                types_so_far.add(ty.clone());
                types_to_vars.entry(ty).or_default().push(total_size + j);
            }
            indices.push(total_size + var);
            total_size += chosen.size();
            sequences.push(chosen);
        }

        Ok(Some(SelectedInputs { sequences, indices }))
    }

    /// Decide which values of an executed sequence stay reusable.
    ///
    /// Everything goes inactive when the run was not clean. Otherwise null
    /// and void results go inactive, primitive-like results go inactive
    /// but become literal components if unseen, and objects go inactive
    /// when the object cache already knows an equivalent one.
    fn process_sequence(&mut self, eseq: &mut ExecutableSequence) -> Result<(), GenerationError> {
        if eseq.has_non_executed() || eseq.has_failure() || !eseq.is_normal_execution() {
            eseq.sequence.clear_all_active();
            return Ok(());
        }

        let mut new_literals = Vec::new();
        let mut demoted = BTreeSet::new();
        for i in 0..eseq.size() {
            let Some(value) = eseq.value(i) else {
                demoted.insert(i);
                continue;
            };
            match value {
                Value::Null | Value::Void => {
                    demoted.insert(i);
                }
                v if v.is_primitive_like() => {
                    demoted.insert(i);
                    if let Value::Str(s) = v {
                        if !is_valid_string_literal(s) || looks_like_object_to_string(s) {
                            continue;
                        }
                    }
                    if let Some(literal) = LiteralValue::from_value(v) {
                        if self.runtime_primitives_seen.insert(canonical(literal.clone())) {
                            new_literals.push(literal);
                        }
                    }
                }
                Value::Object(_) if self.config.use_object_cache => {
                    if let Some(cache) = self.object_cache.as_mut() {
                        if !cache.add(value) {
                            demoted.insert(i);
                        }
                    }
                }
                _ => {}
            }
        }

        for i in demoted {
            eseq.sequence.clear_active(i);
        }
        for literal in new_literals {
            let ty = match literal.primitive_kind() {
                Some(kind) => self.registry.primitive(kind),
                None => self.registry.string(),
            };
            let seq = Sequence::create(Arc::new(Operation::literal(&ty, literal)?))?;
            tracing::debug!(literal = %seq.to_parseable_string(), "new runtime literal");
            self.promote(seq);
        }
        Ok(())
    }
}

/// All NaNs collapse to one entry in the seen-primitives set.
fn canonical(literal: LiteralValue) -> LiteralValue {
    match literal {
        LiteralValue::Float(v) if v.is_nan() => LiteralValue::Float(f32::NAN),
        LiteralValue::Double(v) if v.is_nan() => LiteralValue::Double(f64::NAN),
        other => other,
    }
}
