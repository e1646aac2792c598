use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use windfarm_common::{Slot, Value};

/// The Manager's in-memory slot store. A single `RwLock` serializes access
/// across all connected client sessions, matching the spec's "per-slot
/// writes are atomic replacements; no cross-slot transaction" consistency
/// model — one lock, one map, whole-value replacement per write.
#[derive(Default)]
pub struct Namespace {
    slots: RwLock<HashMap<Slot, Value>>,
}

pub type SharedNamespace = Arc<Namespace>;

impl Namespace {
    pub fn new() -> SharedNamespace {
        Arc::new(Namespace::default())
    }

    pub async fn get(&self, slot: Slot) -> Option<Value> {
        self.slots.read().await.get(&slot).cloned()
    }

    pub async fn set(&self, slot: Slot, value: Value) {
        self.slots.write().await.insert(slot, value);
    }

    /// Atomically appends `entry` to the array stored at `slot`, creating an
    /// empty array first if the slot is absent. This is the redesign of the
    /// original client-side "fetch list, append, write back" race for the
    /// `logs` and `finished_inspections` slots (see DESIGN.md).
    pub async fn append(&self, slot: Slot, entry: Value) {
        let mut slots = self.slots.write().await;
        let arr = match slots.get_mut(&slot) {
            Some(Value::Array(arr)) => arr,
            _ => {
                slots.insert(slot, Value::Array(Vec::new()));
                match slots.get_mut(&slot).unwrap() {
                    Value::Array(arr) => arr,
                    _ => unreachable!(),
                }
            }
        };
        arr.push(entry);
    }
}
