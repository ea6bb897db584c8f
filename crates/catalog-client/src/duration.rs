//! Go-style duration strings used on the wire (`wait=30s`, `"Interval": "10s"`)

use serde::Serializer;
use std::time::Duration;

/// Format a duration the way the registry parses it.
///
/// Whole seconds are written as `"{n}s"`, anything finer as `"{n}ms"`.
/// Sub-millisecond precision is dropped.
pub fn format(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", millis / 1000)
    } else {
        format!("{}ms", millis)
    }
}

pub(crate) fn serialize_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(d) => serializer.serialize_str(&format(*d)),
        None => serializer.serialize_none(),
    }
}
