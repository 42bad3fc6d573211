mod common;

use std::sync::Arc;
use std::thread;

use chrono::{DateTime, SecondsFormat, Utc};
use common::{bytes, date, init_tracing, obj};
use serde_json::{json, Value as JsonValue};
use typed_json::{
    builtins, Codec, CodecOptions, DescriptorError, EncodeError, Instance, TypeCodec,
    TypeDescriptor, TypeRegistry, Value,
};

fn iso_date() -> TypeDescriptor<DateTime<Utc>> {
    TypeDescriptor::new(
        builtins::DATE,
        |d: &DateTime<Utc>| Ok(json!(d.to_rfc3339_opts(SecondsFormat::Millis, true))),
        |plain| {
            plain
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|d| d.with_timezone(&Utc))
                .ok_or_else(|| DescriptorError::custom("expected RFC 3339 text"))
        },
    )
}

#[test]
fn overriding_a_builtin_changes_its_wire_form() {
    init_tracing();
    let codec = Codec::with_options(CodecOptions::default().descriptor(iso_date()));
    assert_eq!(
        codec.registry().names().collect::<Vec<_>>(),
        ["Date", "Buffer", "Set", "Map"]
    );
    let value = obj([("at", date(1_696_660_516_142))]);
    let plain = codec.serialize(&value).unwrap();
    assert_eq!(
        plain,
        json!({"at": "2023-10-07T06:35:16.142Z", "__t": {"t": ["Date"], "i": {"at": 0}}})
    );
    assert_eq!(codec.deserialize(plain).unwrap(), value);
}

#[derive(Debug, PartialEq)]
struct Celsius(f64);

#[derive(Debug, PartialEq)]
struct Kelvin(f64);

/// One codec for a family of unit types, written against the trait directly.
struct Temperature;

impl TypeCodec for Temperature {
    fn name(&self) -> &str {
        "Temperature"
    }

    fn matches(&self, instance: &Instance) -> bool {
        instance.is::<Celsius>() || instance.is::<Kelvin>()
    }

    fn encode(&self, instance: &Instance) -> Result<JsonValue, DescriptorError> {
        if let Some(Celsius(c)) = instance.downcast_ref::<Celsius>() {
            return Ok(json!({"unit": "C", "value": c}));
        }
        if let Some(Kelvin(k)) = instance.downcast_ref::<Kelvin>() {
            return Ok(json!({"unit": "K", "value": k}));
        }
        Err(DescriptorError::Unsupported {
            expected: "Celsius | Kelvin",
            found: instance.type_name(),
        })
    }

    fn decode(&self, plain: JsonValue) -> Result<Value, DescriptorError> {
        let value = plain["value"]
            .as_f64()
            .ok_or_else(|| DescriptorError::custom("missing temperature value"))?;
        match plain["unit"].as_str() {
            Some("C") => Ok(Value::instance(Celsius(value))),
            Some("K") => Ok(Value::instance(Kelvin(value))),
            _ => Err(DescriptorError::custom("unknown temperature unit")),
        }
    }
}

#[test]
fn trait_codec_covers_a_type_family() {
    let codec = Codec::with_options(CodecOptions::default().descriptor(Temperature));
    let value = obj([(
        "readings",
        Value::Array(vec![
            Value::instance(Celsius(21.5)),
            Value::instance(Kelvin(0.0)),
        ]),
    )]);
    let plain = codec.serialize(&value).unwrap();
    assert_eq!(
        plain,
        json!({
            "readings": [{"unit": "C", "value": 21.5}, {"unit": "K", "value": 0.0}],
            "__t": {"t": ["Temperature"], "i": {"readings": [0, 0]}}
        })
    );
    assert_eq!(codec.deserialize(plain).unwrap(), value);
}

#[test]
fn object_shaped_plain_forms_are_not_walked_on_decode() {
    let codec = Codec::with_options(CodecOptions::default().descriptor(Temperature));
    let value = obj([("t", Value::instance(Celsius(1.0))), ("d", date(1))]);
    let plain = codec.serialize(&value).unwrap();
    assert_eq!(plain["__t"]["i"], json!({"t": 0, "d": 1}));
    assert_eq!(codec.deserialize(plain).unwrap(), value);
}

#[test]
fn unregistered_instance_fails_encode() {
    let codec = Codec::new();
    let value = obj([("ok", bytes(b"x")), ("temp", Value::instance(Kelvin(3.0)))]);
    let err = codec.serialize(&value).unwrap_err();
    assert!(matches!(err, EncodeError::Unsupported { .. }));
    assert!(err.to_string().contains("Kelvin"));
    assert!(err.to_string().ends_with("at `/temp`"));
}

#[test]
fn earlier_registration_wins_ties() {
    let cold = TypeDescriptor::<Celsius>::new(
        "Cold",
        |c| Ok(json!(c.0)),
        |plain| Ok(Celsius(plain.as_f64().unwrap_or_default())),
    )
    .with_predicate(|i| i.downcast_ref::<Celsius>().is_some_and(|c| c.0 < 0.0));
    let registry = TypeRegistry::with_descriptors([
        Arc::new(cold) as Arc<dyn TypeCodec>,
        Arc::new(Temperature) as Arc<dyn TypeCodec>,
    ]);
    let frozen = Instance::new(Celsius(-4.0));
    let warm = Instance::new(Celsius(30.0));
    assert_eq!(registry.lookup_by_value(&frozen).unwrap().name(), "Cold");
    assert_eq!(registry.lookup_by_value(&warm).unwrap().name(), "Temperature");

    let codec = Codec::with_options(CodecOptions {
        descriptors: vec![
            Arc::new(
                TypeDescriptor::<Celsius>::new(
                    "Cold",
                    |c| Ok(json!(c.0)),
                    |plain| Ok(Celsius(plain.as_f64().unwrap_or_default())),
                )
                .with_predicate(|i| i.downcast_ref::<Celsius>().is_some_and(|c| c.0 < 0.0)),
            ) as Arc<dyn TypeCodec>,
            Arc::new(Temperature) as Arc<dyn TypeCodec>,
        ],
        max_depth: None,
    });
    let value = obj([
        ("a", Value::instance(Celsius(-4.0))),
        ("b", Value::instance(Celsius(30.0))),
    ]);
    let plain = codec.serialize(&value).unwrap();
    assert_eq!(plain["__t"]["t"], json!(["Cold", "Temperature"]));
    assert_eq!(codec.deserialize(plain).unwrap(), value);
}

#[test]
fn codec_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Codec>();

    let codec = Codec::with_options(CodecOptions::default().descriptor(Temperature));
    thread::scope(|scope| {
        for worker in 0..4i64 {
            let codec = &codec;
            scope.spawn(move || {
                for i in 0..25 {
                    let value = obj([
                        ("worker", Value::from(worker)),
                        ("at", date(worker * 1_000 + i)),
                        ("temp", Value::instance(Kelvin(i as f64))),
                    ]);
                    let plain = codec.serialize(&value).unwrap();
                    assert_eq!(codec.deserialize(plain).unwrap(), value);
                }
            });
        }
    });
}
