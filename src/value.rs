use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A typed Firestore value in its v1 REST representation: a single-key
/// JSON object naming the type, e.g. `{"stringValue": "x"}`. Note int64
/// travels as a decimal string on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
	NullValue(()),
	BooleanValue(bool),
	IntegerValue(#[serde(with = "int64_string")] i64),
	DoubleValue(f64),
	TimestampValue(String),
	StringValue(String),
	BytesValue(String),
	ReferenceValue(String),
	GeoPointValue(LatLng),
	ArrayValue(ArrayValue),
	MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
	#[serde(default)]
	pub fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
	pub latitude: f64,
	pub longitude: f64,
}

impl Value {
	pub fn string(s: impl Into<String>) -> Self {
		Value::StringValue(s.into())
	}

	pub fn integer(i: i64) -> Self {
		Value::IntegerValue(i)
	}

	pub fn boolean(b: bool) -> Self {
		Value::BooleanValue(b)
	}

	pub fn timestamp(rfc3339: impl Into<String>) -> Self {
		Value::TimestampValue(rfc3339.into())
	}

	pub fn map(fields: BTreeMap<String, Value>) -> Self {
		Value::MapValue(MapValue { fields })
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::StringValue(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_timestamp(&self) -> Option<&str> {
		match self {
			Value::TimestampValue(ts) => Some(ts),
			_ => None,
		}
	}
}

mod int64_string {
	use serde::{Deserialize, Deserializer, Serializer, de::Error};

	pub fn serialize<S: Serializer>(value: &i64, ser: S) -> Result<S::Ok, S::Error> {
		ser.serialize_str(&value.to_string())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
		let raw = String::deserialize(de)?;
		raw.parse().map_err(D::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn string_value_is_a_single_key_object() {
		let v = serde_json::to_value(Value::string("a@x.com")).unwrap();
		assert_eq!(v, json!({"stringValue": "a@x.com"}));
	}

	#[test]
	fn integer_value_travels_as_a_decimal_string() {
		let v = serde_json::to_value(Value::integer(42)).unwrap();
		assert_eq!(v, json!({"integerValue": "42"}));

		let back: Value = serde_json::from_value(json!({"integerValue": "-7"})).unwrap();
		assert_eq!(back, Value::integer(-7));
	}

	#[test]
	fn null_value_serializes_with_a_null_payload() {
		let v = serde_json::to_value(Value::NullValue(())).unwrap();
		assert_eq!(v, json!({"nullValue": null}));
	}

	#[test]
	fn map_value_nests_typed_fields() {
		let mut fields = BTreeMap::new();
		fields.insert("role".to_string(), Value::string("admin"));
		let v = serde_json::to_value(Value::map(fields)).unwrap();
		assert_eq!(
			v,
			json!({"mapValue": {"fields": {"role": {"stringValue": "admin"}}}})
		);
	}

	#[test]
	fn timestamp_value_round_trips_and_reads_back() {
		let v: Value =
			serde_json::from_value(json!({"timestampValue": "2026-08-25T12:00:00Z"})).unwrap();
		assert_eq!(v.as_timestamp(), Some("2026-08-25T12:00:00Z"));
		assert_eq!(v.as_str(), None);
	}

	#[test]
	fn geo_point_carries_both_coordinates() {
		let v = serde_json::to_value(Value::GeoPointValue(LatLng {
			latitude: 52.37,
			longitude: 4.89,
		}))
		.unwrap();
		assert_eq!(
			v,
			json!({"geoPointValue": {"latitude": 52.37, "longitude": 4.89}})
		);
	}
}
