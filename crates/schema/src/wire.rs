//! Closed wire-level classification of model types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one message in the graph. Derived from the originating type's
/// simple name; the graph deduplicates by this, not by structural shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
	/// `Zone` → `ZoneState`. Applied uniformly so regeneration is stable.
	pub fn for_type(type_name: &str) -> Self {
		Self(format!("{type_name}State"))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for MessageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Scalar representations the wire format knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
	Bool,
	Int32,
	Int64,
	Uint32,
	Uint64,
	Float,
	Double,
	String,
	Timestamp,
}

impl ScalarKind {
	/// proto3 field type for the bare scalar.
	pub fn proto_name(self) -> &'static str {
		match self {
			Self::Bool => "bool",
			Self::Int32 => "int32",
			Self::Int64 => "int64",
			Self::Uint32 => "uint32",
			Self::Uint64 => "uint64",
			Self::Float => "float",
			Self::Double => "double",
			Self::String => "string",
			Self::Timestamp => "google.protobuf.Timestamp",
		}
	}

	/// Well-known wrapper message for the nullable form.
	pub fn wrapper_proto_name(self) -> &'static str {
		match self {
			Self::Bool => "google.protobuf.BoolValue",
			Self::Int32 => "google.protobuf.Int32Value",
			Self::Int64 => "google.protobuf.Int64Value",
			Self::Uint32 => "google.protobuf.UInt32Value",
			Self::Uint64 => "google.protobuf.UInt64Value",
			Self::Float => "google.protobuf.FloatValue",
			Self::Double => "google.protobuf.DoubleValue",
			Self::String => "google.protobuf.StringValue",
			// Timestamp is already a message; the optional field is its own
			// presence marker.
			Self::Timestamp => "google.protobuf.Timestamp",
		}
	}

	/// Whether proto3 accepts this scalar as a map key.
	pub fn valid_map_key(self) -> bool {
		!matches!(self, Self::Float | Self::Double | Self::Timestamp)
	}
}

/// Wire-level shape of a single model type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum WireType {
	Scalar(ScalarKind),
	/// Nullable scalar carried in an explicit one-field wrapper message.
	WrapperScalar(ScalarKind),
	Bytes,
	/// Wire representation is a 32-bit signed integer; enum metadata itself
	/// is not emitted as a message.
	Enum,
	Collection(Box<WireType>),
	Map(Box<WireType>, Box<WireType>),
	Message(MessageId),
}

impl WireType {
	/// Human-readable shape name for diagnostics.
	pub fn describe(&self) -> String {
		match self {
			Self::Scalar(kind) => kind.proto_name().to_string(),
			Self::WrapperScalar(kind) => kind.wrapper_proto_name().to_string(),
			Self::Bytes => "bytes".to_string(),
			Self::Enum => "enum(int32)".to_string(),
			Self::Collection(element) => format!("repeated {}", element.describe()),
			Self::Map(key, value) => format!("map<{}, {}>", key.describe(), value.describe()),
			Self::Message(id) => id.to_string(),
		}
	}
}
