
pub(crate) use shop_fixture::*;

mod context_and_connect_tests;
mod lifecycle_tests;

use global_states::{Binding, Fields, Projection, Record, Store, TestRenderer};
use serde_json::json;

pub(crate) fn rec(json: serde_json::Value) -> Record {
    Record::from_json(json).expect("object literal")
}

/// The store every scenario starts from unless told otherwise.
pub(crate) fn shop_state() -> Record {
    rec(json!({
        "user": {"name": "me", "address": {"city": "Lyon"}},
        "cart": {"qty": 1, "items": ["Item 1"]},
        "tags": ["new", "sale"],
    }))
}

pub(crate) struct IntegrationTest {
    pub(crate) store: Store,
    pub(crate) renders: TestRenderer<Projection>,
    pub(crate) binding: Binding<Fields, TestRenderer<Projection>>,
}

pub(crate) struct IntegrationTestBuilder {
    state: Record,
    fields: Vec<String>,
}

pub(crate) fn build_integration_test() -> IntegrationTestBuilder {
    IntegrationTestBuilder {
        state: shop_state(),
        fields: Vec::new(),
    }
}

impl IntegrationTestBuilder {
    pub(crate) fn given_state(mut self, state: serde_json::Value) -> Self {
        self.state = rec(state);
        self
    }

    pub(crate) fn given_a_component_reading<const N: usize>(mut self, fields: [&str; N]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub(crate) fn build(self) -> IntegrationTest {
        let store = Store::builder().label("shop").initial(self.state).build();
        let renders = TestRenderer::new();
        let binding = Binding::new(&store, Fields::new(self.fields), renders.clone());

        IntegrationTest {
            store,
            renders,
            binding,
        }
    }
}
