use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Midpoint construction ran out of representable values between two
/// neighboring keys. Roughly 52 halvings fit between unit-spaced neighbors;
/// after that the caller must surface the error, never reuse a key.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ordering key precision exhausted between adjacent turns")]
pub struct OrderKeyExhausted;

/// Rational ordering key for turns within a topic.
///
/// Backed by a finite f64 so arbitrary annotations can be placed between any
/// two existing turns without renumbering. Construction guards against NaN
/// and infinity, which keeps `Ord` total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderKey(f64);

impl OrderKey {
    /// First key in an empty topic.
    pub const ONE: OrderKey = OrderKey(1.0);

    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Key for a turn appended after this one.
    pub fn successor(self) -> Self {
        Self(self.0 + 1.0)
    }

    /// A key strictly between `self` and `next`. Fails when floating-point
    /// precision leaves no representable value in the gap — two turns must
    /// never silently collide on one key.
    pub fn midpoint(self, next: OrderKey) -> Result<OrderKey, OrderKeyExhausted> {
        if self.0 >= next.0 {
            return Err(OrderKeyExhausted);
        }
        let mid = self.0 / 2.0 + next.0 / 2.0;
        if mid <= self.0 || mid >= next.0 || !mid.is_finite() {
            return Err(OrderKeyExhausted);
        }
        Ok(OrderKey(mid))
    }
}

impl Eq for OrderKey {}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Finite by construction, so total_cmp agrees with numeric order.
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rejects_non_finite() {
        assert!(OrderKey::new(f64::NAN).is_none());
        assert!(OrderKey::new(f64::INFINITY).is_none());
        assert!(OrderKey::new(1.5).is_some());
    }

    #[test]
    fn midpoint_lands_strictly_between() {
        let one = OrderKey::ONE;
        let two = one.successor();
        let mid = one.midpoint(two).unwrap();
        assert_eq!(mid.value(), 1.5);
        assert!(one < mid && mid < two);
    }

    #[test]
    fn midpoint_of_inverted_pair_fails() {
        let one = OrderKey::ONE;
        let two = one.successor();
        assert_eq!(two.midpoint(one), Err(OrderKeyExhausted));
        assert_eq!(one.midpoint(one), Err(OrderKeyExhausted));
    }

    #[test]
    fn repeated_halving_eventually_exhausts() {
        let mut lo = OrderKey::ONE;
        let hi = lo.successor();
        let mut halvings = 0;
        loop {
            match lo.midpoint(hi) {
                Ok(mid) => {
                    assert!(lo < mid && mid < hi);
                    lo = mid;
                    halvings += 1;
                    assert!(halvings < 128, "exhaustion never surfaced");
                }
                Err(OrderKeyExhausted) => break,
            }
        }
        // f64 mantissa gives ~52 usable halvings between unit neighbors.
        assert!(halvings >= 50, "only {halvings} halvings before exhaustion");
    }

    #[test]
    fn keys_sort_numerically() {
        let mut keys = vec![
            OrderKey::new(3.0).unwrap(),
            OrderKey::new(1.0).unwrap(),
            OrderKey::new(1.5).unwrap(),
            OrderKey::new(2.0).unwrap(),
        ];
        keys.sort();
        let values: Vec<f64> = keys.iter().map(|k| k.value()).collect();
        assert_eq!(values, vec![1.0, 1.5, 2.0, 3.0]);
    }

    #[test]
    fn serializes_as_bare_number() {
        let key = OrderKey::new(1.5).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "1.5");
        let back: OrderKey = serde_json::from_str("2.25").unwrap();
        assert_eq!(back, OrderKey::new(2.25).unwrap());
    }
}
