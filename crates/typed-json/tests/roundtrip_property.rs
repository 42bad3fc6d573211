mod common;

use chrono::{DateTime, Utc};
use common::date;
use proptest::prelude::*;
use typed_json::{Codec, Value, ValueSet, METADATA_KEY};

fn primitive() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,6}".prop_map(Value::from),
    ]
}

fn typed_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-2_000_000_000_000i64..4_102_444_800_000i64).prop_map(date),
        prop::collection::vec(any::<u8>(), 0..12).prop_map(Value::instance),
        prop::collection::vec(any::<i64>(), 0..4).prop_map(|items| {
            Value::from(items.into_iter().map(Value::from).collect::<ValueSet>())
        }),
    ]
}

fn tree(leaf: BoxedStrategy<Value>) -> impl Strategy<Value = Value> {
    leaf.prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,4}", inner), 0..5)
                .prop_map(|fields| fields.into_iter().collect::<Value>()),
        ]
    })
}

fn document(leaf: BoxedStrategy<Value>) -> impl Strategy<Value = Value> {
    prop::collection::vec(("[a-z]{1,4}", tree(leaf)), 0..6)
        .prop_map(|fields| fields.into_iter().collect::<Value>())
}

fn plain_document() -> impl Strategy<Value = Value> {
    document(primitive().boxed())
}

fn typed_document() -> impl Strategy<Value = Value> {
    document(prop_oneof![3 => primitive(), 1 => typed_leaf()].boxed())
}

fn names_in_order(value: &Value, out: &mut Vec<&'static str>) {
    match value {
        Value::Instance(instance) => {
            let name = if instance.is::<DateTime<Utc>>() {
                "Date"
            } else if instance.is::<Vec<u8>>() {
                "Buffer"
            } else {
                "Set"
            };
            if !out.contains(&name) {
                out.push(name);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| names_in_order(item, out)),
        Value::Object(object) => object.values().for_each(|item| names_in_order(item, out)),
        _ => {}
    }
}

proptest! {
    #[test]
    fn decode_inverts_encode(value in typed_document()) {
        let codec = Codec::new();
        let plain = codec.serialize(&value).unwrap();
        let back = codec.deserialize(plain).unwrap();
        prop_assert_eq!(&back, &value);
        // Debug output walks maps in order, so this also pins key order.
        prop_assert_eq!(format!("{back:?}"), format!("{value:?}"));
    }

    #[test]
    fn type_table_lists_each_used_type_once(value in typed_document()) {
        let mut expected = Vec::new();
        names_in_order(&value, &mut expected);
        let plain = Codec::new().serialize(&value).unwrap();
        match plain.get(METADATA_KEY) {
            Some(meta) => prop_assert_eq!(meta["t"].clone(), serde_json::json!(expected)),
            None => prop_assert!(expected.is_empty()),
        }
    }

    #[test]
    fn untyped_documents_encode_to_themselves(value in plain_document()) {
        let codec = Codec::new();
        let plain = codec.serialize(&value).unwrap();
        prop_assert!(plain.get(METADATA_KEY).is_none());
        prop_assert_eq!(plain.to_string(), value.to_plain().unwrap().to_string());
        let again = codec.serialize(&codec.deserialize(plain.clone()).unwrap()).unwrap();
        prop_assert_eq!(again.to_string(), plain.to_string());
    }
}
