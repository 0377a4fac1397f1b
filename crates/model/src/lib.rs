//! Canonical view-model description consumed by the generator.
//!
//! The Model Extractor (external to this workspace) walks whatever source
//! representation the host application uses and hands us a [`ViewModelModel`]
//! as JSON. Everything downstream operates on this immutable snapshot and
//! never on the host's own reflection machinery.

pub mod path;

pub use path::{PathParseError, PathSegment, PropertyPath};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the extractor classified a primitive value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
	Bool,
	I8,
	I16,
	I32,
	I64,
	U8,
	U16,
	U32,
	U64,
	ISize,
	USize,
	F16,
	F32,
	F64,
	Char,
}

/// Flavors of byte buffers the extractor collapses into one wire family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BytesKind {
	ByteArray,
	Memory,
	ReadOnlyMemory,
	ByteList,
}

/// A type as reported by the Model Extractor.
///
/// Complex and enum types are referenced by name; their shapes live in
/// [`ViewModelModel::types`] so that self-referential graphs are
/// representable (and can then be rejected by the graph builder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeHandle {
	Primitive { primitive: PrimitiveKind },
	/// Nullable value-type primitive (`int?` and friends).
	Nullable { primitive: PrimitiveKind },
	String,
	Bytes { bytes: BytesKind },
	DateTime,
	DateOnly,
	TimeOnly,
	Enum { name: String },
	Array { element: Box<TypeHandle> },
	List { element: Box<TypeHandle> },
	ObservableList { element: Box<TypeHandle> },
	Dictionary { key: Box<TypeHandle>, value: Box<TypeHandle> },
	/// `int[,]` and higher ranks. Always an unsupported-type error downstream.
	MultiDimArray { element: Box<TypeHandle>, rank: u8 },
	/// Reference to a named complex type in [`ViewModelModel::types`].
	Complex { name: String },
	/// The extractor could not resolve this member's type. Downstream warns
	/// and skips the member instead of failing the whole run.
	Unresolved { name: String },
}

/// One public read-write member of a complex type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
	pub name: String,
	#[serde(rename = "type")]
	pub ty: TypeHandle,
	#[serde(default)]
	pub read_only: bool,
}

/// Shape of a named complex type referenced from [`TypeHandle::Complex`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
	#[serde(default)]
	pub is_interface: bool,
	pub members: Vec<MemberDescriptor>,
}

/// An observable property on the root view model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
	pub name: String,
	#[serde(rename = "type")]
	pub ty: TypeHandle,
	#[serde(default)]
	pub read_only: bool,
}

/// One typed command parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
	pub name: String,
	#[serde(rename = "type")]
	pub ty: TypeHandle,
}

/// A named command exposed by the root view model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
	pub name: String,
	#[serde(default)]
	pub parameters: Vec<ParameterDescriptor>,
	#[serde(default)]
	pub is_async: bool,
}

/// The full extractor output for one root view model.
///
/// Immutable after deserialization; regeneration always starts from a fresh
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModelModel {
	pub name: String,
	#[serde(default)]
	pub properties: Vec<PropertyDescriptor>,
	#[serde(default)]
	pub commands: Vec<CommandDescriptor>,
	/// Named complex types reachable from properties and command parameters.
	#[serde(default)]
	pub types: BTreeMap<String, TypeDefinition>,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
	#[error("failed to parse view model JSON: {0}")]
	Json(#[from] serde_json::Error),
}

impl ViewModelModel {
	/// Deserialize an extractor JSON document.
	pub fn from_json(json: &str) -> Result<Self, ModelError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Look up the shape of a named complex type.
	pub fn resolve(&self, name: &str) -> Option<&TypeDefinition> {
		self.types.get(name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deserializes_extractor_json() {
		let json = r#"{
			"name": "Thermostat",
			"properties": [
				{ "name": "Setpoint", "type": { "kind": "primitive", "primitive": "f64" } },
				{ "name": "Zone", "type": { "kind": "complex", "name": "Zone" } }
			],
			"commands": [
				{
					"name": "Reset",
					"parameters": [
						{ "name": "hard", "type": { "kind": "primitive", "primitive": "bool" } }
					],
					"is_async": true
				}
			],
			"types": {
				"Zone": {
					"members": [
						{ "name": "Temperature", "type": { "kind": "primitive", "primitive": "i32" } }
					]
				}
			}
		}"#;

		let model = ViewModelModel::from_json(json).unwrap();
		assert_eq!(model.name, "Thermostat");
		assert_eq!(model.properties.len(), 2);
		assert!(model.commands[0].is_async);
		assert!(model.resolve("Zone").is_some());
		assert!(model.resolve("Missing").is_none());
	}

	#[test]
	fn nullable_and_bytes_handles_round_trip() {
		let handle = TypeHandle::Dictionary {
			key: Box::new(TypeHandle::String),
			value: Box::new(TypeHandle::Nullable {
				primitive: PrimitiveKind::I32,
			}),
		};
		let json = serde_json::to_string(&handle).unwrap();
		let back: TypeHandle = serde_json::from_str(&json).unwrap();
		assert_eq!(handle, back);
	}
}
