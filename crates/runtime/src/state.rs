//! Server-side view of the observable object graph.

use crate::{AnyValue, ApplyError};
use mirror_model::PropertyPath;
use serde::{Deserialize, Serialize};

/// Mutation kinds accepted by the update protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOperation {
	/// Replace the addressed slot.
	Set,
	/// Append to the addressed collection.
	Add,
}

/// The live object graph as the server sees it.
///
/// Generated bindings implement this for the host's domain root; tests and
/// dynamic hosts use [`ValueState`].
pub trait ObservableState: Send + Sync + 'static {
	/// Serialize the full current graph into the root message.
	fn snapshot(&self) -> AnyValue;

	/// Read the value a path addresses.
	fn read(&self, path: &PropertyPath) -> Result<AnyValue, ApplyError>;

	/// Apply a mutation, returning the previous value for audit/rollback.
	fn apply(
		&mut self,
		path: &PropertyPath,
		operation: UpdateOperation,
		value: AnyValue,
	) -> Result<AnyValue, ApplyError>;
}

/// [`ObservableState`] backed directly by an [`AnyValue`] message tree.
#[derive(Debug, Clone)]
pub struct ValueState {
	root: AnyValue,
}

impl ValueState {
	/// `root` is expected to be an [`AnyValue::Message`]; anything else will
	/// fail every path lookup with `UnknownProperty`.
	pub fn new(root: AnyValue) -> Self {
		Self { root }
	}

	pub fn root(&self) -> &AnyValue {
		&self.root
	}
}

impl ObservableState for ValueState {
	fn snapshot(&self) -> AnyValue {
		self.root.clone()
	}

	fn read(&self, path: &PropertyPath) -> Result<AnyValue, ApplyError> {
		self.root.read_path(path).cloned()
	}

	fn apply(
		&mut self,
		path: &PropertyPath,
		operation: UpdateOperation,
		value: AnyValue,
	) -> Result<AnyValue, ApplyError> {
		match operation {
			UpdateOperation::Set => self.root.set_path(path, value),
			UpdateOperation::Add => self.root.add_path(path, value),
		}
	}
}
