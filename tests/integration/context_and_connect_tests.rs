use super::{nested_str, rec, shop_state};
use global_states::{
    Action, ActionCatalog, Context, Error, Projection, Record, Store, TestRenderer, Value,
};
use serde_json::json;

fn shop_actions() -> ActionCatalog {
    ActionCatalog::new()
        .with("cart", "add_item", |store: &Store| {
            let store = store.clone();
            Action::new(move |item: Value| {
                let mut items = store
                    .get_states()
                    .get("cart")
                    .and_then(Value::as_record)
                    .and_then(|cart| cart.get("items"))
                    .and_then(Value::as_array)
                    .map(<[Value]>::to_vec)
                    .unwrap_or_default();
                items.push(item);
                store.create_prop_updater("cart").update(Record::new().with("items", items));
            })
        })
        .with("user", "rename", |store: &Store| {
            let update_user = store.create_prop_updater("user");
            Action::new(move |name| update_user.update(Record::new().with("name", name)))
        })
}

#[test]
fn given_no_provided_store_should_report_not_connected() {
    let context = Context::new();

    assert_eq!(
        context.bind(["user"], TestRenderer::<Projection>::new()).err(),
        Some(Error::NotConnected)
    );
    assert_eq!(context.connect(&shop_actions()).err(), Some(Error::NotConnected));
}

#[test]
fn given_a_provided_store_should_bind_components_to_it() {
    let context = Context::new();
    let store = Store::new(shop_state());
    let _provider = context.provide(store.clone());

    let renders = TestRenderer::<Projection>::new();
    let binding = context
        .bind(["user"], renders.clone())
        .expect("store provided");

    store.update_states(rec(json!({"user": {"name": "you"}})));

    assert!(binding.store().ptr_eq(&store));
    assert_eq!(renders.count(), 1);
}

#[test]
fn given_nested_providers_should_bind_to_the_innermost_store() {
    let context = Context::with_store(Store::builder().label("outer").build());
    let inner = Store::new(shop_state());

    let binding = {
        let _provider = context.provide(inner.clone());
        context
            .bind_field("cart", TestRenderer::<Option<Value>>::new())
            .expect("store provided")
    };

    assert!(binding.store().ptr_eq(&inner));
    assert!(binding.current().is_some());
    assert_eq!(context.store().ok().as_ref().and_then(Store::label), Some("outer"));
}

#[test]
fn given_connected_actions_should_update_the_store_and_render() {
    let store = Store::new(shop_state());
    let context = Context::with_store(store.clone());
    let connected = context.connect(&shop_actions()).expect("store provided");
    let renders = TestRenderer::<Projection>::new();
    let _binding = context.bind(["cart"], renders.clone()).expect("store provided");

    connected
        .actions()
        .call("cart", "add_item", "Item 2")
        .expect("registered");
    connected
        .actions()
        .call("user", "rename", "you")
        .expect("registered");

    assert_eq!(renders.count(), 1);
    assert_eq!(
        renders.last().and_then(|props| props.get("cart").map(Value::to_json)),
        Some(json!({"qty": 1.0, "items": ["Item 1", "Item 2"]}))
    );
    assert!(nested_str(
        &Projection::from(connected.store().get_states()),
        "user",
        "name",
        "you"
    ));
}

#[test]
fn given_an_unregistered_action_should_name_it_in_the_error() {
    let store = Store::new(shop_state());
    let actions = shop_actions().bind(&store);

    let error = actions
        .call("cart", "checkout", Value::Null)
        .expect_err("not registered");

    assert_eq!(
        error,
        Error::UnknownAction {
            namespace: "cart".into(),
            name: "checkout".into()
        }
    );
    assert_eq!(error.to_string(), "unknown action `cart.checkout`");
    assert!(actions.namespace("user").is_some_and(|user| user.contains_key("rename")));
}

#[test]
fn given_the_global_context_should_reach_the_default_store() {
    let context = Context::global();
    let renders = TestRenderer::<Option<Value>>::new();
    let _binding = context
        .bind_field("context_tests_counter", renders.clone())
        .expect("always connected");

    global_states::global::update_states(Record::new().with("context_tests_counter", 1));

    assert_eq!(renders.count(), 1);
    assert_eq!(renders.last().flatten().and_then(|v| v.as_f64()), Some(1.0));
}
