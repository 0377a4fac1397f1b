//! Client proxy keeping a local mirror of a remote object graph live.

use crate::{
	AnyValue, ApplyError, ClientError, ConnectionStatus, UpdateRequest, UpdateResponse,
	ViewModelService,
};
use mirror_model::PropertyPath;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// The client's local copy of the object graph.
///
/// Generated bindings implement this with a typed struct per view model;
/// [`ValueMirror`] mirrors any graph dynamically.
pub trait Mirror: Send + Sync + 'static {
	/// Replace the whole mirror from a fresh snapshot.
	fn replace_snapshot(&mut self, snapshot: AnyValue);

	/// Apply one streamed change. Failures are reported, not fatal; the
	/// mirror keeps its last good value.
	fn apply(&mut self, path: &PropertyPath, value: AnyValue) -> Result<(), ApplyError>;
}

/// [`Mirror`] backed by an [`AnyValue`] tree.
#[derive(Debug, Default)]
pub struct ValueMirror {
	root: AnyValue,
}

impl ValueMirror {
	pub fn read(&self, path: &PropertyPath) -> Result<AnyValue, ApplyError> {
		self.root.read_path(path).cloned()
	}

	pub fn root(&self) -> &AnyValue {
		&self.root
	}
}

impl Mirror for ValueMirror {
	fn replace_snapshot(&mut self, snapshot: AnyValue) {
		self.root = snapshot;
	}

	fn apply(&mut self, path: &PropertyPath, value: AnyValue) -> Result<(), ApplyError> {
		self.root.set_path(path, value)?;
		Ok(())
	}
}

/// Client lifecycle. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
	Uninitialized,
	Initializing,
	Active,
	Disconnected,
	Disposed,
}

/// Tunables for the background loops.
#[derive(Debug, Clone)]
pub struct ClientOptions {
	/// Cadence of the liveness probe.
	pub ping_interval: Duration,
}

impl Default for ClientOptions {
	fn default() -> Self {
		Self {
			ping_interval: Duration::from_secs(5),
		}
	}
}

struct Shared<M: Mirror> {
	service: Arc<dyn ViewModelService>,
	mirror: RwLock<M>,
	state: Mutex<ClientState>,
}

impl<M: Mirror> Shared<M> {
	fn state(&self) -> ClientState {
		*self
			.state
			.lock()
			.unwrap_or_else(std::sync::PoisonError::into_inner)
	}

	fn set_state(&self, next: ClientState) {
		let mut state = self
			.state
			.lock()
			.unwrap_or_else(std::sync::PoisonError::into_inner);
		// Disposed is terminal; a racing background task must not revive us.
		if *state != ClientState::Disposed {
			*state = next;
		}
	}
}

/// Mirror-and-resync proxy over a [`ViewModelService`].
///
/// Lifecycle: `Uninitialized → Initializing → Active ⇄ Disconnected`, with
/// [`dispose`](Self::dispose) terminal from any state. The subscription
/// reader and the liveness loop run as independent tasks; caller-initiated
/// updates never wait on notification delivery.
pub struct ViewModelClient<M: Mirror> {
	shared: Arc<Shared<M>>,
	client_id: Uuid,
	options: ClientOptions,
	tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<M: Mirror> ViewModelClient<M> {
	pub fn new(service: Arc<dyn ViewModelService>, mirror: M) -> Self {
		Self::with_options(service, mirror, ClientOptions::default())
	}

	pub fn with_options(
		service: Arc<dyn ViewModelService>,
		mirror: M,
		options: ClientOptions,
	) -> Self {
		Self {
			shared: Arc::new(Shared {
				service,
				mirror: RwLock::new(mirror),
				state: Mutex::new(ClientState::Uninitialized),
			}),
			client_id: Uuid::new_v4(),
			options,
			tasks: Mutex::new(Vec::new()),
		}
	}

	pub fn client_id(&self) -> Uuid {
		self.client_id
	}

	pub fn state(&self) -> ClientState {
		self.shared.state()
	}

	/// Fetch the full state, populate the mirror, and start the
	/// subscription reader and liveness loop.
	pub async fn initialize(&self) -> Result<(), ClientError> {
		{
			let mut state = self
				.shared
				.state
				.lock()
				.unwrap_or_else(std::sync::PoisonError::into_inner);
			match *state {
				ClientState::Uninitialized => *state = ClientState::Initializing,
				ClientState::Disposed => return Err(ClientError::Disposed),
				_ => return Err(ClientError::AlreadyInitialized),
			}
		}

		let snapshot = match self.shared.service.get_state().await {
			Ok(snapshot) => snapshot,
			Err(err) => {
				self.shared.set_state(ClientState::Uninitialized);
				return Err(err.into());
			}
		};
		let subscription = match self
			.shared
			.service
			.subscribe_to_property_changes(self.client_id)
			.await
		{
			Ok(subscription) => subscription,
			Err(err) => {
				self.shared.set_state(ClientState::Uninitialized);
				return Err(err.into());
			}
		};

		self.shared
			.mirror
			.write()
			.unwrap_or_else(std::sync::PoisonError::into_inner)
			.replace_snapshot(snapshot);

		let reader = tokio::spawn(run_subscription_reader(
			Arc::clone(&self.shared),
			subscription,
		));
		let pinger = tokio::spawn(run_liveness_loop(
			Arc::clone(&self.shared),
			self.options.ping_interval,
		));
		{
			let mut tasks = self
				.tasks
				.lock()
				.unwrap_or_else(std::sync::PoisonError::into_inner);
			tasks.push(reader);
			tasks.push(pinger);
		}

		self.shared.set_state(ClientState::Active);
		Ok(())
	}

	/// Wrap `value` and send an update for `path`. Awaited internally, but
	/// independent of notification delivery.
	pub async fn update_property(
		&self,
		path: &str,
		value: impl Into<AnyValue>,
	) -> Result<UpdateResponse, ClientError> {
		if self.shared.state() == ClientState::Disposed {
			return Err(ClientError::Disposed);
		}
		Ok(self
			.shared
			.service
			.update_property(UpdateRequest::set(path, value.into()))
			.await?)
	}

	/// Read from the local mirror.
	pub fn with_mirror<R>(&self, f: impl FnOnce(&M) -> R) -> R {
		let mirror = self
			.shared
			.mirror
			.read()
			.unwrap_or_else(std::sync::PoisonError::into_inner);
		f(&mirror)
	}

	/// Cancel the subscription and liveness loop and release the
	/// connection. Terminal; safe to call in any state, any number of
	/// times, including before initialization completed.
	pub fn dispose(&self) {
		{
			let mut state = self
				.shared
				.state
				.lock()
				.unwrap_or_else(std::sync::PoisonError::into_inner);
			*state = ClientState::Disposed;
		}
		let mut tasks = self
			.tasks
			.lock()
			.unwrap_or_else(std::sync::PoisonError::into_inner);
		for task in tasks.drain(..) {
			task.abort();
		}
	}
}

impl<M: Mirror> Drop for ViewModelClient<M> {
	fn drop(&mut self) {
		self.dispose();
	}
}

async fn run_subscription_reader<M: Mirror>(
	shared: Arc<Shared<M>>,
	mut subscription: crate::Subscription,
) {
	while let Some(notification) = subscription.recv().await {
		match shared.state() {
			ClientState::Disposed => break,
			// Deltas streamed while disconnected are unrecoverable anyway;
			// the resync snapshot supersedes them.
			ClientState::Disconnected => {
				debug!(
					path = notification.property_name,
					"dropping notification while disconnected"
				);
				continue;
			}
			_ => {}
		}

		let path = match PropertyPath::parse(&notification.property_name) {
			Ok(path) => path,
			Err(err) => {
				warn!(path = notification.property_name, %err, "dropping unparseable notification");
				continue;
			}
		};
		let applied = shared
			.mirror
			.write()
			.unwrap_or_else(std::sync::PoisonError::into_inner)
			.apply(&path, notification.new_value);
		if let Err(err) = applied {
			// Mirror stays at its last good value; connection stays up.
			warn!(path = %path, %err, "dropping unappliable notification");
		}
	}
	debug!("subscription stream ended");
}

async fn run_liveness_loop<M: Mirror>(shared: Arc<Shared<M>>, interval: Duration) {
	let mut ticker = tokio::time::interval(interval);
	ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
	loop {
		ticker.tick().await;
		let state = shared.state();
		if state == ClientState::Disposed {
			break;
		}

		match shared.service.ping().await {
			Ok(ConnectionStatus::Connected) => {
				if state == ClientState::Disconnected {
					// Notifications missed while disconnected cannot be
					// replayed from the stream; refetch before going live.
					match shared.service.get_state().await {
						Ok(snapshot) => {
							shared
								.mirror
								.write()
								.unwrap_or_else(std::sync::PoisonError::into_inner)
								.replace_snapshot(snapshot);
							shared.set_state(ClientState::Active);
							debug!("resynced after reconnect");
						}
						Err(err) => {
							warn!(%err, "resync snapshot failed; staying disconnected");
						}
					}
				}
			}
			Ok(ConnectionStatus::Disconnected) | Err(_) => {
				if state == ClientState::Active {
					warn!("connection lost");
					shared.set_state(ClientState::Disconnected);
				}
			}
		}
	}
}
