use converse_protocol::{OrderKey, OrderKeyExhausted};

/// Key for a turn appended at the end of a topic: strictly greater than the
/// current maximum, `1` for an empty topic.
pub fn append_key(current_max: Option<OrderKey>) -> OrderKey {
    match current_max {
        Some(max) => max.successor(),
        None => OrderKey::ONE,
    }
}

/// Key strictly between `prior` and its immediate successor, or `prior + 1`
/// when the prior turn is last. Existing keys are never rewritten; repeated
/// insertion into the same gap eventually fails with exhaustion instead of
/// colliding two turns on one key.
pub fn insert_between(
    prior: OrderKey,
    next: Option<OrderKey>,
) -> Result<OrderKey, OrderKeyExhausted> {
    match next {
        Some(next) => prior.midpoint(next),
        None => Ok(prior.successor()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn append_starts_at_one() {
        assert_eq!(append_key(None), OrderKey::ONE);
    }

    #[test]
    fn append_is_strictly_greater_than_max() {
        let max = OrderKey::new(3.5).unwrap();
        assert!(append_key(Some(max)) > max);
    }

    #[test]
    fn insert_between_lands_in_gap() {
        let one = OrderKey::ONE;
        let two = one.successor();
        let key = insert_between(one, Some(two)).unwrap();
        assert!(one < key && key < two);
        assert_eq!(key.value(), 1.5);
    }

    #[test]
    fn insert_after_last_is_prior_plus_one() {
        let three = OrderKey::new(3.0).unwrap();
        assert_eq!(insert_between(three, None).unwrap().value(), 4.0);
    }

    #[test]
    fn anchored_insertion_never_moves_existing_keys() {
        // Insert repeatedly right after the same anchor; every new key lands
        // in the shrinking gap and the anchor and its successor stay put.
        let anchor = OrderKey::ONE;
        let fence = anchor.successor();
        let mut upper = fence;
        for _ in 0..20 {
            let key = insert_between(anchor, Some(upper)).unwrap();
            assert!(anchor < key && key < upper);
            upper = key;
        }
        assert_eq!(anchor, OrderKey::ONE);
        assert_eq!(fence, OrderKey::new(2.0).unwrap());
    }

    #[test]
    fn exhaustion_surfaces_as_error() {
        let anchor = OrderKey::ONE;
        let mut upper = anchor.successor();
        let exhausted = loop {
            match insert_between(anchor, Some(upper)) {
                Ok(key) => upper = key,
                Err(err) => break err,
            }
        };
        let _: converse_protocol::OrderKeyExhausted = exhausted;
    }
}
