use super::{build_integration_test, nested_str, rec, shop_state};
use global_states::{Binding, Field, Fields, Projection, Record, Store, Subscriber, TestRenderer, Value};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[test]
fn given_a_new_binding_should_not_render_but_expose_its_projection() {
    let test = build_integration_test()
        .given_a_component_reading(["user", "missing"])
        .build();

    assert_eq!(test.renders.count(), 0);
    assert_eq!(test.binding.current().len(), 1);
    assert!(nested_str(&test.binding.current(), "user", "name", "me"));
    assert!(test.binding.is_subscribed());
    assert_eq!(test.store.subscriber_count(), 1);
}

#[test]
fn given_a_torn_down_binding_should_stop_rendering() {
    let test = build_integration_test()
        .given_a_component_reading(["user"])
        .build();

    test.binding.teardown();
    test.store.update_states(rec(json!({"user": {"name": "you"}})));

    assert_eq!(test.renders.count(), 0);
    assert_eq!(test.store.subscriber_count(), 0);
}

#[test]
fn given_a_rebind_to_the_same_fields_should_keep_the_subscription() {
    let mut test = build_integration_test()
        .given_a_component_reading(["user", "cart"])
        .build();

    test.binding.rebind(Fields::new(["cart", "user", "cart"]));

    assert_eq!(test.store.subscriber_count(), 1);
    assert_eq!(test.binding.cache_key(), "cart|user");
    assert_eq!(test.binding.selector().names(), ["user", "cart"]);
}

#[test]
fn given_a_rebind_to_other_fields_should_follow_the_new_selection() {
    let mut test = build_integration_test()
        .given_a_component_reading(["user"])
        .build();

    test.binding.rebind(Fields::new(["cart"]));

    assert_eq!(test.renders.count(), 0);
    assert_eq!(test.store.subscriber_count(), 1);
    assert!(test.binding.current().contains_key("cart"));
    assert!(!test.binding.current().contains_key("user"));

    test.store.update_states(rec(json!({"user": {"name": "you"}})));
    assert_eq!(test.renders.count(), 0);

    test.store.create_prop_updater("cart").update(rec(json!({"qty": 4})));
    assert_eq!(test.renders.count(), 1);
}

#[test]
fn given_several_bindings_should_render_in_subscription_order() {
    let store = Store::new(shop_state());
    let order = Arc::new(Mutex::new(Vec::new()));
    let bindings: Vec<_> = ["first", "second", "third"]
        .into_iter()
        .map(|name| {
            let order = order.clone();
            Binding::new(&store, Fields::new(["user"]), move |_: Projection| {
                order.lock().expect("not poisoned").push(name);
            })
        })
        .collect();

    store.update_states(rec(json!({"user": {"name": "you"}})));

    assert_eq!(*order.lock().expect("not poisoned"), ["first", "second", "third"]);
    drop(bindings);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn given_a_subscriber_that_unsubscribes_itself_should_not_skip_the_others() {
    let store = Store::new(shop_state());
    let slot: Arc<Mutex<Option<Subscriber>>> = Arc::new(Mutex::new(None));
    let once = {
        let store = store.clone();
        let slot = slot.clone();
        Subscriber::new(move |_| {
            if let Some(me) = slot.lock().expect("not poisoned").take() {
                store.unsubscribe(&me);
            }
        })
    };
    *slot.lock().expect("not poisoned") = Some(once.clone());
    store.subscribe(&once);

    let renders = TestRenderer::<Projection>::new();
    let _binding = Binding::new(&store, Fields::new(["cart"]), renders.clone());

    store.create_prop_updater("cart").update(rec(json!({"qty": 2})));

    assert_eq!(renders.count(), 1);
    assert!(!store.is_subscribed(&once));
}

#[test]
fn given_a_subscriber_added_during_notification_should_only_see_later_changes() {
    let store = Store::new(shop_state());
    let late_calls = Arc::new(Mutex::new(0));
    let late = {
        let late_calls = late_calls.clone();
        Subscriber::new(move |_| *late_calls.lock().expect("not poisoned") += 1)
    };
    let registrar = {
        let store = store.clone();
        let late = late.clone();
        Subscriber::new(move |_| store.subscribe(&late))
    };
    store.subscribe(&registrar);

    store.update_states(rec(json!({"cart": {"qty": 2}})));
    assert_eq!(*late_calls.lock().expect("not poisoned"), 0);

    store.update_states(rec(json!({"cart": {"qty": 3}})));
    assert_eq!(*late_calls.lock().expect("not poisoned"), 1);
}

#[test]
fn given_a_leaked_binding_should_keep_receiving_notifications() {
    let test = build_integration_test()
        .given_a_component_reading(["user"])
        .build();
    let renders = test.renders.clone();
    std::mem::forget(test.binding);

    test.store.update_states(rec(json!({"user": {"name": "you"}})));

    assert_eq!(renders.count(), 1);
    assert_eq!(test.store.subscriber_count(), 1);
}

fn number_at(store: &Store, field: &str) -> Option<f64> {
    store.get_states().get(field).and_then(Value::as_f64)
}

#[test]
fn given_a_subscriber_that_mutates_during_fan_out_should_leave_bindings_on_the_newest_state() {
    let store = Store::new(rec(json!({"x": 0, "y": 0})));
    let earlier = TestRenderer::<Projection>::new();
    let earlier_binding = Binding::new(&store, Fields::new(["x"]), earlier.clone());
    let normalizer = {
        let store = store.clone();
        Subscriber::new(move |snapshot| {
            if snapshot.get("x").and_then(Value::as_f64) == Some(1.0) {
                store.update_states(Record::new().with("x", 2));
            }
        })
    };
    store.subscribe(&normalizer);
    let later = TestRenderer::<Projection>::new();
    let later_binding = Binding::new(&store, Fields::new(["x", "y"]), later.clone());

    store.update_states(Record::new().with("x", 1));

    let in_store = number_at(&store, "x");
    assert_eq!(in_store, Some(2.0));
    assert_eq!(earlier_binding.current().get("x").and_then(Value::as_f64), in_store);
    assert_eq!(later_binding.current().get("x").and_then(Value::as_f64), in_store);
    assert_eq!(later.count(), 1);
    assert_eq!(
        later.last().and_then(|props| props.get("x").and_then(Value::as_f64)),
        in_store
    );
    assert_eq!(
        earlier.last().and_then(|props| props.get("x").and_then(Value::as_f64)),
        in_store
    );
    store.unsubscribe(&normalizer);
}

#[test]
fn given_a_renderer_that_mutates_its_own_selection_should_settle_without_hanging() {
    let store = Store::new(rec(json!({"n": 0})));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let binding = {
        let writer = store.clone();
        let seen = seen.clone();
        Binding::new(&store, Field::new("n"), move |props: Option<Value>| {
            let n = props.as_ref().and_then(Value::as_f64).unwrap_or_default();
            seen.lock().expect("not poisoned").push(n);
            if n < 3.0 {
                writer.update_states(Record::new().with("n", n + 1.0));
            }
        })
    };

    store.update_states(Record::new().with("n", 1));

    assert_eq!(*seen.lock().expect("not poisoned"), [1.0, 2.0, 3.0]);
    assert_eq!(number_at(&store, "n"), Some(3.0));
    assert_eq!(binding.current().as_ref().and_then(Value::as_f64), Some(3.0));
}

#[test]
fn given_concurrent_writers_should_leave_every_binding_on_the_final_state() {
    let store = Store::new(rec(json!({"counter": 0})));
    let bindings: Vec<_> = (0..4)
        .map(|_| Binding::new(&store, Field::new("counter"), TestRenderer::<Option<Value>>::new()))
        .collect();

    let writers: Vec<_> = (0..4)
        .map(|writer| {
            let store = store.clone();
            std::thread::spawn(move || {
                for step in 0..50 {
                    store.update_states(Record::new().with("counter", writer * 100 + step));
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().expect("writer finished");
    }

    let final_value = number_at(&store, "counter");
    for binding in &bindings {
        assert_eq!(binding.current().as_ref().and_then(Value::as_f64), final_value);
    }
}
