//! Dynamic wire envelope and path-addressed access over value trees.

use crate::ApplyError;
use mirror_model::{PathSegment, PropertyPath};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Dynamically-typed wire value.
///
/// Carries any wrapper or message payload the protocol knows about; used for
/// both update requests and change notifications. Map entries are kept as
/// ordered pairs so snapshots render deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnyValue {
	Null,
	Bool(bool),
	I32(i32),
	I64(i64),
	U32(u32),
	U64(u64),
	F32(f32),
	F64(f64),
	Str(String),
	Bytes(Vec<u8>),
	/// Enum value as its wire representation (32-bit signed).
	Enum(i32),
	List(Vec<AnyValue>),
	Map(Vec<(AnyValue, AnyValue)>),
	Message {
		name: String,
		fields: Vec<(String, AnyValue)>,
	},
}

impl AnyValue {
	/// Shape name used in mismatch diagnostics.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Self::Null => "null",
			Self::Bool(_) => "bool",
			Self::I32(_) => "i32",
			Self::I64(_) => "i64",
			Self::U32(_) => "u32",
			Self::U64(_) => "u64",
			Self::F32(_) => "f32",
			Self::F64(_) => "f64",
			Self::Str(_) => "string",
			Self::Bytes(_) => "bytes",
			Self::Enum(_) => "enum",
			Self::List(_) => "list",
			Self::Map(_) => "map",
			Self::Message { .. } => "message",
		}
	}

	/// Convenience constructor for message values.
	pub fn message(name: impl Into<String>, fields: Vec<(String, AnyValue)>) -> Self {
		Self::Message {
			name: name.into(),
			fields,
		}
	}

	/// Dynamically pack an arbitrary host value for the wire.
	///
	/// The entry point for values the generated conversions do not cover,
	/// e.g. ad-hoc structs published through `ViewModelServer::mutate`.
	/// Structured shapes map onto the envelope; anything serde cannot
	/// represent degrades through [`pack_debug`](Self::pack_debug).
	pub fn pack<T: Serialize + std::fmt::Debug>(value: &T) -> Self {
		match serde_json::to_value(value) {
			Ok(json) => Self::from_json(json),
			Err(_) => Self::pack_debug(value),
		}
	}

	/// Best-effort packing for values with no structured representation.
	/// Degrades to a string render and logs; packing is never fatal.
	pub fn pack_debug<T: std::fmt::Debug>(value: &T) -> Self {
		let rendered = format!("{value:?}");
		warn!(value = rendered, "packing unsupported value as string");
		Self::Str(rendered)
	}

	fn from_json(value: serde_json::Value) -> Self {
		use serde_json::Value;
		match value {
			Value::Null => Self::Null,
			Value::Bool(b) => Self::Bool(b),
			Value::Number(n) => {
				if let Some(i) = n.as_i64() {
					Self::I64(i)
				} else if let Some(u) = n.as_u64() {
					Self::U64(u)
				} else {
					n.as_f64().map(Self::F64).unwrap_or(Self::Null)
				}
			}
			Value::String(s) => Self::Str(s),
			Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
			Value::Object(fields) => Self::Map(
				fields
					.into_iter()
					.map(|(key, value)| (Self::Str(key), Self::from_json(value)))
					.collect(),
			),
		}
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	pub fn as_i32(&self) -> Option<i32> {
		match self {
			Self::I32(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(v) => Some(v),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[AnyValue]> {
		match self {
			Self::List(items) => Some(items),
			_ => None,
		}
	}

	/// Field lookup on a message value.
	pub fn field(&self, name: &str) -> Option<&AnyValue> {
		match self {
			Self::Message { fields, .. } => {
				fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
			}
			_ => None,
		}
	}

	fn field_mut(&mut self, name: &str) -> Option<&mut AnyValue> {
		match self {
			Self::Message { fields, .. } => {
				fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
			}
			_ => None,
		}
	}

	/// Read the value a path addresses inside this tree.
	pub fn read_path(&self, path: &PropertyPath) -> Result<&AnyValue, ApplyError> {
		let mut current = self;
		for segment in &path.segments {
			current = resolve_segment(current, segment, path)?;
		}
		Ok(current)
	}

	/// Replace the value a path addresses, returning the previous value.
	///
	/// The new value must match the shape of the old one; `Null` slots accept
	/// anything (first population of an optional field).
	pub fn set_path(
		&mut self,
		path: &PropertyPath,
		new_value: AnyValue,
	) -> Result<AnyValue, ApplyError> {
		let slot = self.slot_mut(path)?;
		if !slot.is_null() && !new_value.is_null() && !compatible(slot, &new_value) {
			return Err(ApplyError::TypeMismatch {
				path: path.to_string(),
				expected: slot.kind_name().to_string(),
				actual: new_value.kind_name().to_string(),
			});
		}
		Ok(std::mem::replace(slot, new_value))
	}

	/// Append to the collection a path addresses. Returns `Null` as the
	/// previous value (there is none for an append).
	pub fn add_path(
		&mut self,
		path: &PropertyPath,
		new_value: AnyValue,
	) -> Result<AnyValue, ApplyError> {
		let slot = self.slot_mut(path)?;
		match slot {
			AnyValue::List(items) => {
				items.push(new_value);
				Ok(AnyValue::Null)
			}
			_ => Err(ApplyError::NotACollection {
				path: path.to_string(),
			}),
		}
	}

	fn slot_mut(&mut self, path: &PropertyPath) -> Result<&mut AnyValue, ApplyError> {
		let mut current = self;
		for segment in &path.segments {
			current = resolve_segment_mut(current, segment, path)?;
		}
		Ok(current)
	}
}

fn resolve_segment<'value>(
	current: &'value AnyValue,
	segment: &PathSegment,
	path: &PropertyPath,
) -> Result<&'value AnyValue, ApplyError> {
	let named = current
		.field(&segment.name)
		.ok_or_else(|| ApplyError::UnknownProperty {
			path: path.to_string(),
		})?;
	match segment.index {
		None => Ok(named),
		Some(index) => match named {
			AnyValue::List(items) => items.get(index).ok_or(ApplyError::IndexOutOfBounds {
				path: path.to_string(),
				index,
			}),
			_ => Err(ApplyError::NotACollection {
				path: path.to_string(),
			}),
		},
	}
}

fn resolve_segment_mut<'value>(
	current: &'value mut AnyValue,
	segment: &PathSegment,
	path: &PropertyPath,
) -> Result<&'value mut AnyValue, ApplyError> {
	let named = current
		.field_mut(&segment.name)
		.ok_or_else(|| ApplyError::UnknownProperty {
			path: path.to_string(),
		})?;
	match segment.index {
		None => Ok(named),
		Some(index) => match named {
			AnyValue::List(items) => {
				items.get_mut(index).ok_or(ApplyError::IndexOutOfBounds {
					path: path.to_string(),
					index,
				})
			}
			_ => Err(ApplyError::NotACollection {
				path: path.to_string(),
			}),
		},
	}
}

/// Shape compatibility for in-place replacement. Messages additionally have
/// to agree on their type name.
fn compatible(old: &AnyValue, new: &AnyValue) -> bool {
	match (old, new) {
		(AnyValue::Message { name: a, .. }, AnyValue::Message { name: b, .. }) => a == b,
		_ => old.kind_name() == new.kind_name(),
	}
}

impl Default for AnyValue {
	fn default() -> Self {
		Self::Null
	}
}

impl From<bool> for AnyValue {
	fn from(v: bool) -> Self {
		Self::Bool(v)
	}
}

impl From<i32> for AnyValue {
	fn from(v: i32) -> Self {
		Self::I32(v)
	}
}

impl From<i64> for AnyValue {
	fn from(v: i64) -> Self {
		Self::I64(v)
	}
}

impl From<u32> for AnyValue {
	fn from(v: u32) -> Self {
		Self::U32(v)
	}
}

impl From<u64> for AnyValue {
	fn from(v: u64) -> Self {
		Self::U64(v)
	}
}

impl From<f32> for AnyValue {
	fn from(v: f32) -> Self {
		Self::F32(v)
	}
}

impl From<f64> for AnyValue {
	fn from(v: f64) -> Self {
		Self::F64(v)
	}
}

impl From<&str> for AnyValue {
	fn from(v: &str) -> Self {
		Self::Str(v.to_string())
	}
}

impl From<String> for AnyValue {
	fn from(v: String) -> Self {
		Self::Str(v)
	}
}

impl From<Vec<u8>> for AnyValue {
	fn from(v: Vec<u8>) -> Self {
		Self::Bytes(v)
	}
}
