// Coprime pair generators - trimmers for the Step 1 conversion
//
// A trimmer (u, t) multiplies a plaintext by u/t mod N. When gcd(u, t) = 1
// and 2/3 < u/t < 3/2, a conformant plaintext stays close enough to the
// original to convert one PKCS#1 context into another.

use num_bigint::BigUint;
use num_integer::Integer;
use serde::{Deserialize, Serialize};

/// Blinding factor pair with gcd(u, t) = 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoprimePair {
    pub u: BigUint,
    pub t: BigUint,
}

impl CoprimePair {
    fn new(u: u64, t: u64) -> Self {
        Self {
            u: BigUint::from(u),
            t: BigUint::from(t),
        }
    }
}

/// Lazy, bounded sequence of coprime pairs
///
/// Exhaustion is only observable through `has_next`.
pub trait CoprimePairGenerator: Send {
    fn has_next(&self) -> bool;

    /// Next pair, `None` once the query budget is spent
    fn next_pair(&mut self) -> Option<CoprimePair>;

    fn queries_emitted(&self) -> u64;
}

/// Query counter shared by all generator variants
#[derive(Debug, Clone, Copy)]
pub struct QueryBudget {
    max_queries: u64,
    emitted: u64,
}

impl QueryBudget {
    pub fn new(max_queries: u64) -> Self {
        Self {
            max_queries,
            emitted: 0,
        }
    }

    pub fn remaining(&self) -> bool {
        self.emitted < self.max_queries
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Consume one query, `false` if the budget was already spent
    fn take(&mut self) -> bool {
        if !self.remaining() {
            return false;
        }
        self.emitted += 1;
        true
    }
}

/// Pair generation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrimmerStrategy {
    /// Ratio-constrained pairs (the default)
    #[default]
    Sieving,
    /// Adjacent integers, faster but ignores the ratio window
    Simple,
}

impl TrimmerStrategy {
    pub fn generator(&self, max_queries: u64) -> Box<dyn CoprimePairGenerator> {
        match self {
            TrimmerStrategy::Sieving => Box::new(SievingCoprimePairGenerator::new(max_queries)),
            TrimmerStrategy::Simple => Box::new(SimpleCoprimePairGenerator::new(max_queries)),
        }
    }
}

impl std::str::FromStr for TrimmerStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sieving" => Ok(TrimmerStrategy::Sieving),
            "simple" => Ok(TrimmerStrategy::Simple),
            other => Err(format!("unknown trimmer strategy: {}", other)),
        }
    }
}

/// Sieves pairs with 2/3 < u/t < 3/2, walking u upwards for each t
#[derive(Debug, Clone)]
pub struct SievingCoprimePairGenerator {
    budget: QueryBudget,
    u: u64,
    t: u64,
}

impl SievingCoprimePairGenerator {
    pub fn new(max_queries: u64) -> Self {
        Self {
            budget: QueryBudget::new(max_queries),
            u: 1,
            t: 2,
        }
    }

    /// Move (u, t) back into the ratio window
    fn fix_range(&mut self) {
        // u/t >= 3/2
        if 2 * self.u >= 3 * self.t {
            self.u = 1;
            self.t += 1;
        }
        // u/t <= 2/3
        while 3 * self.u <= 2 * self.t {
            self.u += 1;
        }
    }
}

impl CoprimePairGenerator for SievingCoprimePairGenerator {
    fn has_next(&self) -> bool {
        self.budget.remaining()
    }

    fn next_pair(&mut self) -> Option<CoprimePair> {
        if !self.budget.take() {
            return None;
        }

        self.fix_range();
        while self.u.gcd(&self.t) != 1 {
            self.u += 1;
            self.fix_range();
        }

        let pair = CoprimePair::new(self.u, self.t);
        self.u += 1;
        Some(pair)
    }

    fn queries_emitted(&self) -> u64 {
        self.budget.emitted()
    }
}

impl Iterator for SievingCoprimePairGenerator {
    type Item = CoprimePair;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_pair()
    }
}

/// Emits (n, n + 1) for odd n = 1, 3, 5, ...
#[derive(Debug, Clone)]
pub struct SimpleCoprimePairGenerator {
    budget: QueryBudget,
    n: u64,
}

impl SimpleCoprimePairGenerator {
    pub fn new(max_queries: u64) -> Self {
        Self {
            budget: QueryBudget::new(max_queries),
            n: 1,
        }
    }
}

impl CoprimePairGenerator for SimpleCoprimePairGenerator {
    fn has_next(&self) -> bool {
        self.budget.remaining()
    }

    fn next_pair(&mut self) -> Option<CoprimePair> {
        if !self.budget.take() {
            return None;
        }

        let pair = CoprimePair::new(self.n, self.n + 1);
        self.n += 2;
        Some(pair)
    }

    fn queries_emitted(&self) -> u64 {
        self.budget.emitted()
    }
}

impl Iterator for SimpleCoprimePairGenerator {
    type Item = CoprimePair;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_pair()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::One;

    fn small(pair: &CoprimePair) -> (u64, u64) {
        let u = pair.u.to_u64_digits().first().copied().unwrap_or(0);
        let t = pair.t.to_u64_digits().first().copied().unwrap_or(0);
        (u, t)
    }

    #[test]
    fn test_sieving_first_pairs() {
        let pairs: Vec<(u64, u64)> = SievingCoprimePairGenerator::new(6)
            .map(|p| small(&p))
            .collect();
        assert_eq!(pairs, vec![(4, 3), (3, 4), (5, 4), (4, 5), (6, 5), (7, 5)]);
    }

    #[test]
    fn test_sieving_pairs_coprime_and_in_window() {
        let mut generator = SievingCoprimePairGenerator::new(5000);
        while let Some(pair) = generator.next_pair() {
            assert!(pair.u.gcd(&pair.t).is_one());
            // 2/3 < u/t < 3/2
            assert!(&pair.u * 3u32 > &pair.t * 2u32, "{:?}", pair);
            assert!(&pair.u * 2u32 < &pair.t * 3u32, "{:?}", pair);
        }
        assert_eq!(generator.queries_emitted(), 5000);
    }

    #[test]
    fn test_sieving_pairs_are_distinct() {
        let pairs: Vec<(u64, u64)> = SievingCoprimePairGenerator::new(500)
            .map(|p| small(&p))
            .collect();
        let mut sorted = pairs.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), pairs.len());
    }

    #[test]
    fn test_simple_pairs_coprime() {
        let mut generator = SimpleCoprimePairGenerator::new(1000);
        let first = generator.next_pair().unwrap();
        assert_eq!(small(&first), (1, 2));
        while let Some(pair) = generator.next_pair() {
            assert!(pair.u.gcd(&pair.t).is_one());
            assert_eq!(&pair.t - &pair.u, BigUint::one());
        }
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut generator = TrimmerStrategy::Sieving.generator(3);
        let mut count = 0;
        while generator.has_next() {
            assert!(generator.next_pair().is_some());
            count += 1;
        }
        assert_eq!(count, 3);
        assert!(generator.next_pair().is_none());
        assert_eq!(generator.queries_emitted(), 3);

        let mut empty = TrimmerStrategy::Simple.generator(0);
        assert!(!empty.has_next());
        assert!(empty.next_pair().is_none());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("Sieving".parse::<TrimmerStrategy>().unwrap(), TrimmerStrategy::Sieving);
        assert_eq!("simple".parse::<TrimmerStrategy>().unwrap(), TrimmerStrategy::Simple);
        assert!("fast".parse::<TrimmerStrategy>().is_err());
    }
}
