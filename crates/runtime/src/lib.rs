//! Runtime half of the state-synchronization stack.
//!
//! Generated bindings (and hand-written hosts) sit on top of this crate:
//! a [`ViewModelServer`] serves full-state snapshots and streams
//! path-addressed change notifications to any number of subscribers, and a
//! [`ViewModelClient`] keeps a local mirror live against such a server,
//! resyncing after connection loss.

mod client;
mod context;
mod registry;
mod server;
mod state;
mod value;

pub use client::{ClientOptions, ClientState, Mirror, ValueMirror, ViewModelClient};
pub use context::{ExecutionContext, NoopExecutionContext};
pub use registry::{PropertyChangeNotification, Subscription, SubscriptionRegistry};
pub use server::{
	ConnectionStatus, InProcessService, UpdateRequest, UpdateResponse, ViewModelServer,
	ViewModelService,
};
pub use state::{ObservableState, UpdateOperation, ValueState};
pub use value::AnyValue;

pub use mirror_model::{PathParseError, PathSegment, PropertyPath};

/// Failure to resolve or mutate a path-addressed slot in an object graph.
///
/// These never cross the RPC boundary as faults; the server folds them into
/// `success = false` responses and the client logs-and-drops them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
	#[error(transparent)]
	Path(#[from] PathParseError),
	#[error("unknown property {path:?}")]
	UnknownProperty { path: String },
	#[error("index {index} out of bounds at {path:?}")]
	IndexOutOfBounds { path: String, index: usize },
	#[error("{path:?} is not a collection")]
	NotACollection { path: String },
	#[error("type mismatch at {path:?}: expected {expected}, got {actual}")]
	TypeMismatch {
		path: String,
		expected: String,
		actual: String,
	},
}

/// Transport-level failures of a [`ViewModelService`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
	#[error("connection lost")]
	Disconnected,
	#[error("transport failure: {0}")]
	Transport(String),
}

/// Client proxy failures surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
	#[error("client has been disposed")]
	Disposed,
	#[error("client is already initialized")]
	AlreadyInitialized,
	#[error(transparent)]
	Service(#[from] ServiceError),
}
