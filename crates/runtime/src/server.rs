//! The four-operation synchronization service.

use crate::{
	AnyValue, ExecutionContext, NoopExecutionContext, ObservableState, PropertyChangeNotification,
	ServiceError, Subscription, SubscriptionRegistry, UpdateOperation,
};
use mirror_model::PropertyPath;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// `UpdatePropertyValue` request.
///
/// `property_path` addresses nested/indexed targets; when it is empty the
/// bare `property_name` is the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
	pub property_name: String,
	pub property_path: String,
	pub operation: UpdateOperation,
	pub new_value: AnyValue,
}

impl UpdateRequest {
	pub fn set(path: impl Into<String>, new_value: AnyValue) -> Self {
		Self {
			property_name: String::new(),
			property_path: path.into(),
			operation: UpdateOperation::Set,
			new_value,
		}
	}

	pub fn add(path: impl Into<String>, new_value: AnyValue) -> Self {
		Self {
			property_name: String::new(),
			property_path: path.into(),
			operation: UpdateOperation::Add,
			new_value,
		}
	}

	fn target(&self) -> &str {
		if self.property_path.is_empty() {
			&self.property_name
		} else {
			&self.property_path
		}
	}
}

/// `UpdatePropertyValue` response. Domain failures land here as
/// `success = false`; they never surface as transport faults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse {
	pub success: bool,
	pub old_value: Option<AnyValue>,
	pub error_message: Option<String>,
}

impl UpdateResponse {
	fn ok(old_value: AnyValue) -> Self {
		Self {
			success: true,
			old_value: Some(old_value),
			error_message: None,
		}
	}

	fn failed(message: String) -> Self {
		Self {
			success: false,
			old_value: None,
			error_message: Some(message),
		}
	}
}

/// `Ping` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
	Connected,
	Disconnected,
}

/// Serves one observable object graph to any number of subscribers.
pub struct ViewModelServer<S: ObservableState> {
	state: RwLock<S>,
	registry: SubscriptionRegistry,
	context: Arc<dyn ExecutionContext>,
}

impl<S: ObservableState> ViewModelServer<S> {
	pub fn new(state: S) -> Self {
		Self::with_context(state, Arc::new(NoopExecutionContext))
	}

	/// Use an explicit execution context for notification delivery (e.g. a
	/// UI dispatcher). The context only sees the fan-out closure.
	pub fn with_context(state: S, context: Arc<dyn ExecutionContext>) -> Self {
		Self {
			state: RwLock::new(state),
			registry: SubscriptionRegistry::new(),
			context,
		}
	}

	/// `GetState`: the full current graph as the root message.
	pub fn get_state(&self) -> AnyValue {
		self.state
			.read()
			.unwrap_or_else(std::sync::PoisonError::into_inner)
			.snapshot()
	}

	/// `UpdatePropertyValue`: resolve, convert, mutate, answer with the
	/// previous value. Unknown paths and type mismatches come back as
	/// `success = false` with a message.
	pub fn update_property(&self, request: UpdateRequest) -> UpdateResponse {
		let path = match PropertyPath::parse(request.target()) {
			Ok(path) => path,
			Err(err) => {
				debug!(target = request.target(), %err, "rejecting malformed update path");
				return UpdateResponse::failed(err.to_string());
			}
		};

		let mut state = self
			.state
			.write()
			.unwrap_or_else(std::sync::PoisonError::into_inner);
		match state.apply(&path, request.operation, request.new_value.clone()) {
			Ok(old_value) => {
				// Published while the state lock is held: per-subscriber
				// delivery order matches the order mutations were applied.
				self.publish(path.to_string(), request.new_value);
				UpdateResponse::ok(old_value)
			}
			Err(err) => {
				debug!(path = %path, %err, "update rejected");
				UpdateResponse::failed(err.to_string())
			}
		}
	}

	/// `SubscribeToPropertyChanges`: registers the caller and returns its
	/// notification stream. Dropping the stream deregisters it.
	pub fn subscribe(&self, client_id: Uuid) -> Subscription {
		self.registry.register(client_id)
	}

	/// `Ping` liveness probe.
	pub fn ping(&self) -> ConnectionStatus {
		ConnectionStatus::Connected
	}

	/// Announce a mutation that happened directly on the in-process state
	/// (not through [`update_property`](Self::update_property)).
	pub fn notify_changed(&self, path: &str) {
		let state = self
			.state
			.read()
			.unwrap_or_else(std::sync::PoisonError::into_inner);
		self.publish_path(&state, path);
	}

	/// Run work against the state directly, then broadcast the paths it
	/// touched. For hosts mutating their graph in-process. The state lock is
	/// held across the broadcasts, so interleaved updates cannot reorder them.
	pub fn mutate<R>(&self, f: impl FnOnce(&mut S) -> R, changed_paths: &[&str]) -> R {
		let mut state = self
			.state
			.write()
			.unwrap_or_else(std::sync::PoisonError::into_inner);
		let result = f(&mut state);
		for path in changed_paths {
			self.publish_path(&state, path);
		}
		result
	}

	fn publish_path(&self, state: &S, path: &str) {
		let parsed = match PropertyPath::parse(path) {
			Ok(parsed) => parsed,
			Err(err) => {
				warn!(path, %err, "cannot notify change for malformed path");
				return;
			}
		};
		match state.read(&parsed) {
			Ok(value) => self.publish(path.to_string(), value),
			Err(err) => warn!(path, %err, "cannot notify change for unreadable path"),
		}
	}

	pub fn registry(&self) -> &SubscriptionRegistry {
		&self.registry
	}

	fn publish(&self, property_name: String, new_value: AnyValue) {
		let notification = PropertyChangeNotification {
			property_name,
			new_value,
		};
		let registry = self.registry.clone();
		self.context
			.post(Box::new(move || registry.broadcast(&notification)));
	}
}

/// Transport abstraction over the four RPCs, as the client sees them.
///
/// An implementation backed by a real network transport lives with the
/// generated artifacts; [`InProcessService`] serves same-process pairs and
/// tests.
#[async_trait::async_trait]
pub trait ViewModelService: Send + Sync + 'static {
	async fn get_state(&self) -> Result<AnyValue, ServiceError>;

	async fn update_property(&self, request: UpdateRequest)
		-> Result<UpdateResponse, ServiceError>;

	async fn subscribe_to_property_changes(
		&self,
		client_id: Uuid,
	) -> Result<Subscription, ServiceError>;

	async fn ping(&self) -> Result<ConnectionStatus, ServiceError>;
}

/// [`ViewModelService`] adapter over a server in the same process.
#[derive(Clone)]
pub struct InProcessService<S: ObservableState> {
	server: Arc<ViewModelServer<S>>,
}

impl<S: ObservableState> InProcessService<S> {
	pub fn new(server: Arc<ViewModelServer<S>>) -> Self {
		Self { server }
	}
}

#[async_trait::async_trait]
impl<S: ObservableState> ViewModelService for InProcessService<S> {
	async fn get_state(&self) -> Result<AnyValue, ServiceError> {
		Ok(self.server.get_state())
	}

	async fn update_property(
		&self,
		request: UpdateRequest,
	) -> Result<UpdateResponse, ServiceError> {
		Ok(self.server.update_property(request))
	}

	async fn subscribe_to_property_changes(
		&self,
		client_id: Uuid,
	) -> Result<Subscription, ServiceError> {
		Ok(self.server.subscribe(client_id))
	}

	async fn ping(&self) -> Result<ConnectionStatus, ServiceError> {
		Ok(self.server.ping())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ValueState;

	fn server() -> ViewModelServer<ValueState> {
		ViewModelServer::new(ValueState::new(AnyValue::message(
			"MainState",
			vec![
				("Counter".to_string(), AnyValue::I32(0)),
				("Name".to_string(), AnyValue::Str("initial".into())),
			],
		)))
	}

	#[test]
	fn update_returns_old_value() {
		let server = server();
		let response = server.update_property(UpdateRequest::set("Counter", AnyValue::I32(7)));
		assert!(response.success);
		assert_eq!(response.old_value, Some(AnyValue::I32(0)));
		assert_eq!(response.error_message, None);
	}

	#[test]
	fn unknown_path_fails_softly() {
		let server = server();
		let response = server.update_property(UpdateRequest::set("Nope", AnyValue::I32(1)));
		assert!(!response.success);
		assert!(response.error_message.unwrap().contains("Nope"));
	}

	#[test]
	fn type_mismatch_fails_softly_and_keeps_state() {
		let server = server();
		let response =
			server.update_property(UpdateRequest::set("Counter", AnyValue::Str("x".into())));
		assert!(!response.success);
		assert_eq!(
			server.get_state().field("Counter"),
			Some(&AnyValue::I32(0))
		);
	}

	#[test]
	fn malformed_path_fails_softly() {
		let server = server();
		let response = server.update_property(UpdateRequest::set("A..B", AnyValue::I32(1)));
		assert!(!response.success);
	}

	#[tokio::test]
	async fn failed_updates_do_not_notify() {
		let server = server();
		let mut sub = server.subscribe(Uuid::new_v4());

		server.update_property(UpdateRequest::set("Nope", AnyValue::I32(1)));
		server.update_property(UpdateRequest::set("Counter", AnyValue::I32(3)));

		let first = sub.recv().await.unwrap();
		assert_eq!(first.property_name, "Counter");
		assert_eq!(first.new_value, AnyValue::I32(3));
	}

	#[tokio::test]
	async fn add_appends_and_notifies_with_the_new_element() {
		let server = ViewModelServer::new(ValueState::new(AnyValue::message(
			"MainState",
			vec![(
				"Tags".to_string(),
				AnyValue::List(vec![AnyValue::Str("alpha".into())]),
			)],
		)));
		let mut sub = server.subscribe(Uuid::new_v4());

		let response = server.update_property(UpdateRequest::add("Tags", AnyValue::Str("beta".into())));
		assert!(response.success);
		// An append has no previous value.
		assert_eq!(response.old_value, Some(AnyValue::Null));

		let notification = sub.recv().await.unwrap();
		assert_eq!(notification.property_name, "Tags");
		assert_eq!(notification.new_value, AnyValue::Str("beta".into()));

		let tags = server.get_state();
		assert_eq!(tags.field("Tags").unwrap().as_list().unwrap().len(), 2);
	}

	#[tokio::test]
	async fn mutate_broadcasts_dynamically_packed_values() {
		#[derive(Debug, serde::Serialize)]
		struct Diagnostics {
			uptime_secs: u64,
		}

		let server = ViewModelServer::new(ValueState::new(AnyValue::message(
			"MainState",
			vec![("Diagnostics".to_string(), AnyValue::Null)],
		)));
		let mut sub = server.subscribe(Uuid::new_v4());

		server.mutate(
			|state| {
				let path = PropertyPath::parse("Diagnostics").unwrap();
				state
					.apply(
						&path,
						UpdateOperation::Set,
						AnyValue::pack(&Diagnostics { uptime_secs: 5 }),
					)
					.unwrap();
			},
			&["Diagnostics"],
		);

		let notification = sub.recv().await.unwrap();
		assert_eq!(
			notification.new_value,
			AnyValue::Map(vec![(
				AnyValue::Str("uptime_secs".into()),
				AnyValue::I64(5)
			)])
		);
	}

	#[tokio::test]
	async fn notify_changed_packs_current_value() {
		let server = server();
		let mut sub = server.subscribe(Uuid::new_v4());

		server.mutate(
			|state| {
				let path = PropertyPath::parse("Name").unwrap();
				state
					.apply(&path, UpdateOperation::Set, AnyValue::Str("direct".into()))
					.unwrap();
			},
			&["Name"],
		);

		let notification = sub.recv().await.unwrap();
		assert_eq!(notification.property_name, "Name");
		assert_eq!(notification.new_value, AnyValue::Str("direct".into()));
	}
}
