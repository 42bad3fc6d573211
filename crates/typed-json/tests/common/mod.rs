#![allow(dead_code)]

use std::sync::Once;

use chrono::{DateTime, Utc};
use tracing_subscriber::EnvFilter;
use typed_json::Value;

static TRACING: Once = Once::new();

/// Routes codec trace output to the test writer. Set `RUST_LOG=typed_json=trace` to see it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn date(millis: i64) -> Value {
    Value::from(DateTime::<Utc>::from_timestamp_millis(millis).unwrap())
}

pub fn bytes(data: &[u8]) -> Value {
    Value::instance(data.to_vec())
}

pub fn obj<const N: usize>(fields: [(&str, Value); N]) -> Value {
    fields.into_iter().collect()
}
