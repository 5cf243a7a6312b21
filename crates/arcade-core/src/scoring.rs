//! Score comparison and the in-run/persisted currency wallet.

use serde::{Deserialize, Serialize};

use crate::game_trait::ScoreOrdering;

/// Upper bound on any stored currency balance. Also the validation range
/// for persisted records.
pub const MAX_CURRENCY: u64 = 1_000_000_000;

/// Whether `candidate` beats `best` under the given ordering. A missing
/// best is always beaten.
pub fn improves(ordering: ScoreOrdering, best: Option<i64>, candidate: i64) -> bool {
    match (ordering, best) {
        (_, None) => true,
        (ScoreOrdering::HigherIsBetter, Some(best)) => candidate > best,
        (ScoreOrdering::LowerIsBetter, Some(best)) => candidate < best,
    }
}

/// The stored value after offering `candidate`: monotone under the
/// ordering, always equal to the best value seen.
pub fn record_best(ordering: ScoreOrdering, best: Option<i64>, candidate: i64) -> i64 {
    if improves(ordering, best, candidate) {
        candidate
    } else {
        best.unwrap_or(candidate)
    }
}

/// Price of the next level of an upgrade.
pub fn upgrade_cost(base: u64, level: u32, step: u64) -> u64 {
    base.saturating_add(u64::from(level).saturating_mul(step))
}

/// Currency balance with guarded mutation: earning saturates at
/// [`MAX_CURRENCY`], spending is refused (no-op, `false`) when the
/// balance is insufficient. The balance can never go negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    balance: u64,
}

impl Wallet {
    pub fn new(balance: u64) -> Self {
        Self {
            balance: balance.min(MAX_CURRENCY),
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.balance >= amount
    }

    pub fn earn(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount).min(MAX_CURRENCY);
    }

    /// Deduct `amount` if affordable. Returns whether the purchase went
    /// through; callers disable the action on `false`.
    pub fn spend(&mut self, amount: u64) -> bool {
        if self.balance < amount {
            return false;
        }
        self.balance -= amount;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_is_better_keeps_max() {
        let mut best = None;
        for score in [10, 5, 30, 30, 12] {
            best = Some(record_best(ScoreOrdering::HigherIsBetter, best, score));
        }
        assert_eq!(best, Some(30));
    }

    #[test]
    fn lower_is_better_keeps_min() {
        let mut best = None;
        for score in [90_000, 120_000, 45_000, 45_000, 60_000] {
            best = Some(record_best(ScoreOrdering::LowerIsBetter, best, score));
        }
        assert_eq!(best, Some(45_000));
    }

    #[test]
    fn insufficient_spend_is_refused() {
        let mut wallet = Wallet::new(30);
        assert!(!wallet.spend(50));
        assert_eq!(wallet.balance(), 30);
        assert!(wallet.spend(30));
        assert_eq!(wallet.balance(), 0);
        assert!(!wallet.spend(1));
    }

    #[test]
    fn earning_saturates_at_cap() {
        let mut wallet = Wallet::new(MAX_CURRENCY - 5);
        wallet.earn(u64::MAX);
        assert_eq!(wallet.balance(), MAX_CURRENCY);
    }

    #[test]
    fn upgrade_cost_scales_linearly() {
        assert_eq!(upgrade_cost(50, 0, 25), 50);
        assert_eq!(upgrade_cost(50, 3, 25), 125);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn stored_best_is_monotone_and_equals_best_seen(
                scores in proptest::collection::vec(-1_000_000i64..1_000_000, 1..50),
            ) {
                let mut best: Option<i64> = None;
                let mut prev: Option<i64> = None;
                for &s in &scores {
                    let next = record_best(ScoreOrdering::HigherIsBetter, best, s);
                    if let Some(p) = prev {
                        prop_assert!(next >= p);
                    }
                    prev = Some(next);
                    best = Some(next);
                }
                prop_assert_eq!(best, scores.iter().copied().max());
            }

            #[test]
            fn wallet_never_goes_negative(
                ops in proptest::collection::vec((proptest::bool::ANY, 0u64..10_000), 0..100),
            ) {
                let mut wallet = Wallet::default();
                let mut shadow: i128 = 0;
                for (is_earn, amount) in ops {
                    if is_earn {
                        wallet.earn(amount);
                        shadow += i128::from(amount);
                    } else if wallet.spend(amount) {
                        shadow -= i128::from(amount);
                    }
                    prop_assert!(shadow >= 0);
                    prop_assert_eq!(u64::try_from(shadow).unwrap(), wallet.balance());
                }
            }
        }
    }
}
