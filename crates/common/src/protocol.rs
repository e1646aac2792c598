use serde::{Deserialize, Serialize};

use crate::slot::Slot;
use crate::value::Value;

/// A name-based method call issued by an authenticated client, per the
/// spec's "client issues name-based method calls" wire contract. Carries the
/// client's chosen identity string on every call so the server can attribute
/// lifecycle events (`on_connect_hook`, `on_disconnect_hook`) and log
/// messages to a session, matching the original Python client's per-call
/// `client_name` argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Request {
    GetSlot { client: String, slot: Slot },
    SetSlot { client: String, slot: Slot, value: Value },
    AppendSlot { client: String, slot: Slot, entry: Value },
    OnConnect { client: String },
    OnDisconnect { client: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result")]
pub enum Response {
    Value { value: Option<Value> },
    Ok,
    Err { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn get_slot_request_round_trips_through_json() {
        let req = Request::GetSlot {
            client: "datagen_sim".into(),
            slot: Slot::MapCfg,
        };
        let s = serde_json::to_string(&req).unwrap();
        let back: Request = serde_json::from_str(&s).unwrap();
        match back {
            Request::GetSlot { client, slot } => {
                assert_eq!(client, "datagen_sim");
                assert_eq!(slot, Slot::MapCfg);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn value_response_round_trips_with_nested_object() {
        let mut m = BTreeMap::new();
        m.insert("ticks".to_string(), Value::Number(3.0));
        let resp = Response::Value {
            value: Some(Value::Object(m)),
        };
        let s = serde_json::to_string(&resp).unwrap();
        let back: Response = serde_json::from_str(&s).unwrap();
        match back {
            Response::Value { value: Some(Value::Object(m)) } => {
                assert_eq!(m.get("ticks"), Some(&Value::Number(3.0)));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn absent_value_round_trips_as_none() {
        let resp = Response::Value { value: None };
        let s = serde_json::to_string(&resp).unwrap();
        let back: Response = serde_json::from_str(&s).unwrap();
        assert!(matches!(back, Response::Value { value: None }));
    }
}
