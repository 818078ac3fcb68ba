use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

pub const METRIC_HTTP_REQUESTS_TOTAL: &str = "http.requests_total";
pub const METRIC_HTTP_REQUEST_TIME_SECONDS: &str = "http.request_time_seconds";

/// Distinguishes a field that was absent from the request body from one that
/// was sent explicitly (including an explicit `null` when `T` is an `Option`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionalProperty<T> {
    None,
    Some(T),
}

impl<T> Default for OptionalProperty<T> {
    #[inline]
    fn default() -> OptionalProperty<T> {
        OptionalProperty::None
    }
}

impl<T> OptionalProperty<T> {
    pub fn is_none(&self) -> bool {
        matches!(self, OptionalProperty::None)
    }
}

impl<T> Serialize for OptionalProperty<T>
where T: Serialize
{
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where S: Serializer {
        match self {
            // absent fields are expected to be skipped with `skip_serializing_if`
            OptionalProperty::None => serializer.serialize_none(),
            OptionalProperty::Some(v) => v.serialize(serializer),
        }
    }
}

impl<'de, T> Deserialize<'de> for OptionalProperty<T>
where T: Deserialize<'de>
{
    fn deserialize<D>(de: D) -> std::result::Result<Self, D::Error>
    where D: Deserializer<'de> {
        let a = Deserialize::deserialize(de);
        a.map(OptionalProperty::Some)
    }
}
