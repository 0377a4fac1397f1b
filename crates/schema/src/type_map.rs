//! Classification of extractor type handles into [`WireType`]s.

use crate::{MessageId, ScalarKind, SchemaError, WireType};
use mirror_model::{PrimitiveKind, TypeHandle, ViewModelModel};

/// Maps [`TypeHandle`]s into the closed [`WireType`] classification.
///
/// The rules run in a fixed priority order, so e.g. a `List<u8>` lands in the
/// byte-buffer family before the generic sequence rule can see it.
pub struct TypeMapper<'model> {
	model: &'model ViewModelModel,
}

impl<'model> TypeMapper<'model> {
	pub fn new(model: &'model ViewModelModel) -> Self {
		Self { model }
	}

	pub fn model(&self) -> &'model ViewModelModel {
		self.model
	}

	/// Resolve one type handle, or fail with the error that aborts (or, for
	/// [`SchemaError::UnresolvedType`], degrades) generation.
	pub fn map(&self, handle: &TypeHandle) -> Result<WireType, SchemaError> {
		match handle {
			// Rule 1: the whole byte-buffer family collapses to `bytes`.
			TypeHandle::Bytes { .. } => Ok(WireType::Bytes),
			TypeHandle::Array { element }
			| TypeHandle::List { element }
			| TypeHandle::ObservableList { element }
				if is_byte(element) =>
			{
				Ok(WireType::Bytes)
			}

			// Rule 2: nullable value types get an explicit wrapper message,
			// never the raw scalar field.
			TypeHandle::Nullable { primitive } => {
				Ok(WireType::WrapperScalar(scalar_kind(*primitive)))
			}

			// Rule 3: plain primitives.
			TypeHandle::Primitive { primitive } => Ok(WireType::Scalar(scalar_kind(*primitive))),
			TypeHandle::String => Ok(WireType::Scalar(ScalarKind::String)),

			// Rule 4: instants become timestamps; date-only and time-only
			// travel as ISO-8601 text in a string wrapper.
			TypeHandle::DateTime => Ok(WireType::Scalar(ScalarKind::Timestamp)),
			TypeHandle::DateOnly | TypeHandle::TimeOnly => {
				Ok(WireType::WrapperScalar(ScalarKind::String))
			}

			// Rule 5: enums ride as int32, no message of their own.
			TypeHandle::Enum { .. } => Ok(WireType::Enum),

			// Rule 6: sequences, element-recursive.
			TypeHandle::Array { element }
			| TypeHandle::List { element }
			| TypeHandle::ObservableList { element } => {
				Ok(WireType::Collection(Box::new(self.map(element)?)))
			}

			// Rule 7: dictionaries. proto map keys must be integral or
			// string, so anything else is rejected here.
			TypeHandle::Dictionary { key, value } => {
				let key_wire = self.map(key)?;
				match &key_wire {
					WireType::Scalar(kind) if kind.valid_map_key() => {}
					other => {
						return Err(SchemaError::InvalidMapKey {
							key: other.describe(),
						})
					}
				}
				Ok(WireType::Map(
					Box::new(key_wire),
					Box::new(self.map(value)?),
				))
			}

			// Rules 8/9: complex types (interfaces included) defer to the
			// graph builder. Interface-ness is recorded on the descriptor so
			// conversion code never default-constructs one.
			TypeHandle::Complex { name } => Ok(WireType::Message(MessageId::for_type(name))),

			// Rule 10: multi-dimensional arrays are an explicit error, never
			// silently flattened.
			TypeHandle::MultiDimArray { element, rank } => Err(SchemaError::UnsupportedType {
				type_name: format!("{}[{rank}D]", describe_handle(element)),
				reason: "multi-dimensional arrays have no wire representation".to_string(),
			}),

			TypeHandle::Unresolved { name } => {
				Err(SchemaError::UnresolvedType { name: name.clone() })
			}
		}
	}
}

fn is_byte(handle: &TypeHandle) -> bool {
	matches!(
		handle,
		TypeHandle::Primitive {
			primitive: PrimitiveKind::U8
		}
	)
}

fn scalar_kind(primitive: PrimitiveKind) -> ScalarKind {
	match primitive {
		PrimitiveKind::Bool => ScalarKind::Bool,
		PrimitiveKind::I8 | PrimitiveKind::I16 | PrimitiveKind::I32 => ScalarKind::Int32,
		PrimitiveKind::I64 | PrimitiveKind::ISize => ScalarKind::Int64,
		PrimitiveKind::U8 | PrimitiveKind::U16 | PrimitiveKind::U32 => ScalarKind::Uint32,
		PrimitiveKind::U64 | PrimitiveKind::USize => ScalarKind::Uint64,
		PrimitiveKind::F16 | PrimitiveKind::F32 => ScalarKind::Float,
		PrimitiveKind::F64 => ScalarKind::Double,
		PrimitiveKind::Char => ScalarKind::String,
	}
}

fn describe_handle(handle: &TypeHandle) -> String {
	match handle {
		TypeHandle::Primitive { primitive } | TypeHandle::Nullable { primitive } => {
			format!("{primitive:?}")
		}
		TypeHandle::Complex { name }
		| TypeHandle::Enum { name }
		| TypeHandle::Unresolved { name } => name.clone(),
		other => format!("{other:?}"),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mirror_model::BytesKind;

	fn empty_model() -> ViewModelModel {
		ViewModelModel {
			name: "Test".to_string(),
			properties: vec![],
			commands: vec![],
			types: Default::default(),
		}
	}

	fn prim(primitive: PrimitiveKind) -> TypeHandle {
		TypeHandle::Primitive { primitive }
	}

	#[test]
	fn byte_family_maps_to_bytes() {
		let model = empty_model();
		let mapper = TypeMapper::new(&model);

		for handle in [
			TypeHandle::Bytes {
				bytes: BytesKind::ByteArray,
			},
			TypeHandle::Bytes {
				bytes: BytesKind::ReadOnlyMemory,
			},
			TypeHandle::Array {
				element: Box::new(prim(PrimitiveKind::U8)),
			},
			TypeHandle::List {
				element: Box::new(prim(PrimitiveKind::U8)),
			},
		] {
			assert_eq!(mapper.map(&handle).unwrap(), WireType::Bytes);
		}
	}

	#[test]
	fn nullable_int_gets_wrapper() {
		let model = empty_model();
		let mapper = TypeMapper::new(&model);

		let wire = mapper
			.map(&TypeHandle::Nullable {
				primitive: PrimitiveKind::I32,
			})
			.unwrap();
		assert_eq!(wire, WireType::WrapperScalar(ScalarKind::Int32));
	}

	#[test]
	fn primitive_widths_collapse_onto_wire_scalars() {
		let model = empty_model();
		let mapper = TypeMapper::new(&model);

		let cases = [
			(PrimitiveKind::I16, ScalarKind::Int32),
			(PrimitiveKind::ISize, ScalarKind::Int64),
			(PrimitiveKind::U16, ScalarKind::Uint32),
			(PrimitiveKind::USize, ScalarKind::Uint64),
			(PrimitiveKind::F16, ScalarKind::Float),
			(PrimitiveKind::Char, ScalarKind::String),
		];
		for (primitive, expected) in cases {
			assert_eq!(
				mapper.map(&prim(primitive)).unwrap(),
				WireType::Scalar(expected)
			);
		}
	}

	#[test]
	fn date_and_time_mapping() {
		let model = empty_model();
		let mapper = TypeMapper::new(&model);

		assert_eq!(
			mapper.map(&TypeHandle::DateTime).unwrap(),
			WireType::Scalar(ScalarKind::Timestamp)
		);
		assert_eq!(
			mapper.map(&TypeHandle::DateOnly).unwrap(),
			WireType::WrapperScalar(ScalarKind::String)
		);
	}

	#[test]
	fn collections_recurse() {
		let model = empty_model();
		let mapper = TypeMapper::new(&model);

		let wire = mapper
			.map(&TypeHandle::ObservableList {
				element: Box::new(TypeHandle::List {
					element: Box::new(prim(PrimitiveKind::I32)),
				}),
			})
			.unwrap();
		assert_eq!(
			wire,
			WireType::Collection(Box::new(WireType::Collection(Box::new(WireType::Scalar(
				ScalarKind::Int32
			)))))
		);
	}

	#[test]
	fn float_map_keys_are_rejected() {
		let model = empty_model();
		let mapper = TypeMapper::new(&model);

		let err = mapper
			.map(&TypeHandle::Dictionary {
				key: Box::new(prim(PrimitiveKind::F64)),
				value: Box::new(TypeHandle::String),
			})
			.unwrap_err();
		assert!(matches!(err, SchemaError::InvalidMapKey { .. }));
	}

	#[test]
	fn multi_dim_array_is_unsupported() {
		let model = empty_model();
		let mapper = TypeMapper::new(&model);

		let err = mapper
			.map(&TypeHandle::MultiDimArray {
				element: Box::new(prim(PrimitiveKind::I32)),
				rank: 2,
			})
			.unwrap_err();
		assert!(matches!(err, SchemaError::UnsupportedType { .. }));
	}
}
