#![forbid(unsafe_code)]

//! Property-based invariant tests for properties and bindings.
//!
//! 1. `get` returns the last value written.
//! 2. Equal writes never notify.
//! 3. A unidirectional target mirrors its source after every source write.
//! 4. Bidirectional peers agree after writes on either side.
//! 5. Dropping a connection stops all propagation.
//! 6. Properties 3 and 4 hold when subscribers rewrite a bound property
//!    while it is notifying.

use std::cell::Cell;
use std::rc::Rc;

use lumen_runtime::{BindMode, BindingScope, Property, connect};
use proptest::prelude::*;

/// Rewrites the property to at most `limit` whenever it exceeds it.
fn clamp_to(property: &Property<i32>, limit: i32) -> lumen_runtime::Subscription {
    let handle = property.clone();
    property.on_change(move |_| {
        if handle.with(|value| *value > limit) {
            handle.set(limit);
        }
    })
}

fn counter(property: &Property<i32>) -> (Rc<Cell<u32>>, lumen_runtime::Subscription) {
    let count = Rc::new(Cell::new(0));
    let count_in = Rc::clone(&count);
    let sub = property.on_change(move |_| count_in.set(count_in.get() + 1));
    (count, sub)
}

proptest! {
    #[test]
    fn get_returns_last_write(writes in proptest::collection::vec(any::<i32>(), 1..32)) {
        let property = Property::new(0);
        for &value in &writes {
            property.set(value);
        }
        prop_assert_eq!(property.get(), *writes.last().unwrap());
    }

    #[test]
    fn notifications_match_value_changes(writes in proptest::collection::vec(0i32..4, 0..32)) {
        let property = Property::new(0);
        let (count, _sub) = counter(&property);
        let mut expected = 0;
        let mut current = 0;
        for &value in &writes {
            if value != current {
                expected += 1;
                current = value;
            }
            property.set(value);
        }
        prop_assert_eq!(count.get(), expected);
        prop_assert_eq!(property.version(), u64::from(expected));
    }

    #[test]
    fn unidirectional_target_mirrors_source(
        initial in any::<i32>(),
        writes in proptest::collection::vec(any::<i32>(), 0..16),
    ) {
        let source = Property::new(initial);
        let target = Property::new(0);
        target.bind(&source, BindMode::Unidirectional).unwrap();
        prop_assert_eq!(target.get(), initial);
        for &value in &writes {
            source.set(value);
            prop_assert_eq!(target.get(), value);
        }
    }

    #[test]
    fn bidirectional_peers_agree(writes in proptest::collection::vec((any::<bool>(), any::<i32>()), 0..16)) {
        let left = Property::new(0);
        let right = Property::new(1);
        let _link = connect(&left, &right, BindMode::Bidirectional).unwrap();
        for &(on_left, value) in &writes {
            if on_left {
                left.set(value);
            } else {
                right.set(value);
            }
            prop_assert_eq!(left.get(), right.get());
        }
    }

    #[test]
    fn clamped_links_stay_in_agreement(
        limit in -50i32..50,
        bidirectional in any::<bool>(),
        clamp_target in any::<bool>(),
        clamp_before_link in any::<bool>(),
        writes in proptest::collection::vec((any::<bool>(), -100i32..100), 1..16),
    ) {
        let source = Property::new(-100);
        let target = Property::new(-100);
        let mode = if bidirectional { BindMode::Bidirectional } else { BindMode::Unidirectional };
        // A one-way target that rewrites itself diverges on purpose.
        let clamped = if bidirectional && clamp_target { &target } else { &source };

        let _early = clamp_before_link.then(|| clamp_to(clamped, limit));
        let _link = connect(&source, &target, mode).unwrap();
        let _late = (!clamp_before_link).then(|| clamp_to(clamped, limit));

        for &(on_target, value) in &writes {
            if bidirectional && on_target {
                target.set(value);
            } else {
                source.set(value);
            }
            prop_assert_eq!(source.get(), target.get());
            if value > limit {
                prop_assert!(clamped.get() <= limit);
            }
        }
    }

    #[test]
    fn cleared_scope_stops_propagation(writes in proptest::collection::vec(1i32..100, 1..8)) {
        let source = Property::new(0);
        let target = Property::new(0);
        let mut scope = BindingScope::new();
        scope.connect(&source, &target, BindMode::Unidirectional).unwrap();
        scope.clear();
        for &value in &writes {
            source.set(value);
        }
        prop_assert_eq!(target.get(), 0);
    }
}

#[test]
fn chain_of_bindings_propagates_in_order() {
    let a = Property::new(0);
    let b = Property::new(0);
    let c = Property::new(0);
    b.bind(&a, BindMode::Unidirectional).unwrap();
    c.bind(&b, BindMode::Unidirectional).unwrap();

    let (count, _sub) = counter(&c);
    a.set(7);
    assert_eq!(c.get(), 7);
    assert_eq!(count.get(), 1);
}
