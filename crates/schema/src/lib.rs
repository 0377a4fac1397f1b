//! Wire schema derivation for observable view models.
//!
//! Takes the canonical [`mirror_model::ViewModelModel`] and resolves every
//! reachable property and command-parameter type into a closed [`WireType`],
//! then folds the complex ones into a deduplicated, cycle-free set of
//! [`MessageDescriptor`]s: the message graph the emitters render.

mod graph;
mod type_map;
mod wire;

pub use graph::{FieldDescriptor, MessageDescriptor, MessageGraph, MessageGraphBuilder};
pub use type_map::TypeMapper;
pub use wire::{MessageId, ScalarKind, WireType};

/// Errors that abort schema derivation for a root model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
	#[error("unsupported type {type_name}: {reason}")]
	UnsupportedType { type_name: String, reason: String },
	#[error("cyclic type graph: {chain}")]
	CyclicType { chain: String },
	#[error("unknown complex type {name:?} referenced by the model")]
	UnknownType { name: String },
	#[error("dictionary key type {key} cannot be used as a wire map key")]
	InvalidMapKey { key: String },
	/// The extractor delivered a degraded model. The graph builder treats
	/// this as warn-and-skip rather than a hard failure.
	#[error("type {name:?} was not resolved by the extractor")]
	UnresolvedType { name: String },
}
