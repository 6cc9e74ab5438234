//! The single source of randomness for a generation run.
//!
//! Wraps a ChaCha8Rng seeded from the configured seed. Same seed, same
//! operation universe and same backend behavior give the same run.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct Randomness {
    rng: ChaCha8Rng,
}

impl Randomness {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform index in `0..n`. Returns 0 for an empty range.
    pub fn next_index(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Uniform int in `0..bound`.
    pub fn next_int(&mut self, bound: i32) -> i32 {
        if bound <= 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    /// True with probability `p`, clamped to `[0, 1]`.
    pub fn weighted_coin_flip(&mut self, p: f64) -> bool {
        if p.is_nan() {
            return false;
        }
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    pub fn random_member<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let i = self.next_index(items.len());
        items.get(i)
    }

    /// Index drawn with probability proportional to `weights[i]`. Falls
    /// back to uniform when no weight is positive.
    pub fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }
        let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return Some(self.next_index(weights.len()));
        }
        let mut point = self.rng.gen::<f64>() * total;
        for (i, w) in weights.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            if point < *w {
                return Some(i);
            }
            point -= w;
        }
        weights.iter().rposition(|w| *w > 0.0)
    }

    /// Member drawn with probability proportional to `weight(member)`.
    pub fn random_member_weighted<'a, T>(
        &mut self,
        items: &'a [T],
        weight: impl Fn(&T) -> f64,
    ) -> Option<&'a T> {
        let weights: Vec<f64> = items.iter().map(weight).collect();
        let i = self.weighted_index(&weights)?;
        items.get(i)
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = Randomness::new(7);
        let mut b = Randomness::new(7);
        let xs: Vec<usize> = (0..20).map(|_| a.next_index(1000)).collect();
        let ys: Vec<usize> = (0..20).map(|_| b.next_index(1000)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_coin_flip_extremes() {
        let mut r = Randomness::new(1);
        assert!((0..100).all(|_| !r.weighted_coin_flip(0.0)));
        assert!((0..100).all(|_| r.weighted_coin_flip(1.0)));
        assert!((0..100).all(|_| r.weighted_coin_flip(3.5)));
        assert!(!r.weighted_coin_flip(f64::NAN));
    }

    #[test]
    fn test_weighted_index_skips_zero_weights() {
        let mut r = Randomness::new(3);
        for _ in 0..200 {
            assert_eq!(r.weighted_index(&[0.0, 2.0, 0.0]), Some(1));
        }
        assert_eq!(r.weighted_index(&[]), None);
        assert!(r.weighted_index(&[0.0, 0.0]).is_some());
    }

    #[test]
    fn test_weighted_member_favors_heavy_items() {
        let mut r = Randomness::new(11);
        let sizes = [1usize, 1000];
        let small = (0..500)
            .filter(|_| r.random_member_weighted(&sizes, |s| 1.0 / *s as f64) == Some(&1))
            .count();
        assert!(small > 450, "{small}");
    }
}
