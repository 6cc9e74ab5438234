//! Generator heuristics.

use serde::{Deserialize, Serialize};

use super::GenerationError;

/// Which scoped literal pools feed input selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralScope {
    /// Scoped literals are ignored.
    None,
    /// Literals are visible to the members of their class and subclasses.
    #[default]
    Class,
    /// Literals are visible to every class of their package.
    Package,
    /// Both class and package pools.
    All,
}

impl LiteralScope {
    pub fn uses_class(self) -> bool {
        matches!(self, LiteralScope::Class | LiteralScope::All)
    }

    pub fn uses_package(self) -> bool {
        matches!(self, LiteralScope::Package | LiteralScope::All)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenConfig {
    pub seed: u64,
    /// Sequences longer than this are discarded.
    pub max_size: usize,
    /// Probability of reusing a variable already in the sequence under
    /// construction instead of pulling in another component.
    pub alias_ratio: f64,
    /// Probability of passing null/zero to a non-receiver slot even when
    /// components exist.
    pub null_ratio: f64,
    pub forbid_null: bool,
    /// Favor smaller components (weight 1/size) when picking inputs.
    pub small_tests: bool,
    /// Occasionally replay the new statement with fresh int arguments.
    pub repeat_heuristic: bool,
    /// Reset the general pool to the seeds whenever its size, seeds
    /// included, reaches a multiple of this.
    pub clear_interval: u64,
    /// Demote objects whose state an earlier sequence already produced.
    pub use_object_cache: bool,
    /// Cross-check the dedup set against rendered code.
    pub debug_checks: bool,
    /// Promote sequences without running them.
    pub offline: bool,
    pub literal_scope: LiteralScope,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            max_size: 100,
            alias_ratio: 0.0,
            null_ratio: 0.05,
            forbid_null: false,
            small_tests: false,
            repeat_heuristic: false,
            clear_interval: 100_000_000,
            use_object_cache: false,
            debug_checks: false,
            offline: false,
            literal_scope: LiteralScope::Class,
        }
    }
}

impl GenConfig {
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.max_size == 0 {
            return Err(GenerationError::Config("max_size must be positive".into()));
        }
        for (name, p) in [("alias_ratio", self.alias_ratio), ("null_ratio", self.null_ratio)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GenerationError::Config(format!("{name} must be in [0, 1], got {p}")));
            }
        }
        if self.clear_interval == 0 {
            return Err(GenerationError::Config("clear_interval must be positive".into()));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_alias_ratio(mut self, ratio: f64) -> Self {
        self.alias_ratio = ratio;
        self
    }

    pub fn with_null_ratio(mut self, ratio: f64) -> Self {
        self.null_ratio = ratio;
        self
    }

    pub fn with_forbid_null(mut self, forbid: bool) -> Self {
        self.forbid_null = forbid;
        self
    }

    pub fn with_small_tests(mut self, small: bool) -> Self {
        self.small_tests = small;
        self
    }

    pub fn with_repeat_heuristic(mut self, repeat: bool) -> Self {
        self.repeat_heuristic = repeat;
        self
    }

    pub fn with_clear_interval(mut self, interval: u64) -> Self {
        self.clear_interval = interval;
        self
    }

    pub fn with_object_cache(mut self, enabled: bool) -> Self {
        self.use_object_cache = enabled;
        self
    }

    pub fn with_debug_checks(mut self, enabled: bool) -> Self {
        self.debug_checks = enabled;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn with_literal_scope(mut self, scope: LiteralScope) -> Self {
        self.literal_scope = scope;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = GenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_size, 100);
        assert_eq!(config.literal_scope, LiteralScope::Class);
    }

    #[test]
    fn test_rejects_bad_ratio() {
        let config = GenConfig::default().with_null_ratio(1.5);
        assert!(matches!(config.validate(), Err(GenerationError::Config(_))));
    }

    #[test]
    fn test_partial_json() {
        let config: GenConfig =
            serde_json::from_str(r#"{"seed": 9, "literal_scope": "package"}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.literal_scope, LiteralScope::Package);
        assert_eq!(config.null_ratio, 0.05);
    }
}
