//! Per-subscriber fan-out of change notifications.
//!
//! Each subscriber owns an unbounded single-consumer queue; enqueue never
//! blocks the mutating thread, so a slow subscriber accumulates memory
//! instead of stalling the server. Dead subscribers are pruned on every
//! broadcast and a dropped [`Subscription`] removes its own registration,
//! never one that replaced it.

use crate::AnyValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// One property change, dynamically packed for the wire.
///
/// `property_name` carries the full path string of the mutated slot (e.g.
/// `"ZoneList[1].Temperature"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChangeNotification {
	pub property_name: String,
	pub new_value: AnyValue,
}

#[derive(Default)]
struct Registrations {
	/// Monotonic per-registration id. Removal is keyed by (client, generation)
	/// so a stale handle can never evict the registration that replaced it.
	next_generation: u64,
	subscribers: HashMap<Uuid, Registered>,
}

struct Registered {
	generation: u64,
	sender: mpsc::UnboundedSender<PropertyChangeNotification>,
}

/// Registry of live subscribers, owned by one server instance.
///
/// Deliberately not process-global: two servers in one process cannot see
/// each other's subscribers.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
	inner: Arc<RwLock<Registrations>>,
}

impl SubscriptionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a subscriber. A re-registration under the same id replaces
	/// the previous queue, ending its stream; dropping the stale handle
	/// afterwards leaves the replacement registered.
	pub fn register(&self, client_id: Uuid) -> Subscription {
		let (tx, rx) = mpsc::unbounded_channel();
		let generation = {
			let mut inner = self
				.inner
				.write()
				.unwrap_or_else(std::sync::PoisonError::into_inner);
			let generation = inner.next_generation;
			inner.next_generation += 1;
			inner.subscribers.insert(
				client_id,
				Registered {
					generation,
					sender: tx,
				},
			);
			generation
		};
		debug!(%client_id, generation, "subscriber registered");
		Subscription {
			client_id,
			generation,
			receiver: rx,
			registry: self.clone(),
		}
	}

	/// Deliver one notification to every current subscriber, FIFO per
	/// subscriber. Queues are unbounded, so this never waits on a consumer;
	/// closed queues are pruned here.
	pub fn broadcast(&self, notification: &PropertyChangeNotification) {
		let mut dead = Vec::new();
		{
			let inner = self
				.inner
				.read()
				.unwrap_or_else(std::sync::PoisonError::into_inner);
			for (client_id, registered) in inner.subscribers.iter() {
				if registered.sender.send(notification.clone()).is_err() {
					dead.push((*client_id, registered.generation));
				}
			}
		}
		for (client_id, generation) in dead {
			self.deregister(client_id, generation);
		}
	}

	pub fn subscriber_count(&self) -> usize {
		self.inner
			.read()
			.unwrap_or_else(std::sync::PoisonError::into_inner)
			.subscribers
			.len()
	}

	/// Remove the registration only if it still is the one `generation`
	/// refers to; a replacement under the same client id stays.
	fn deregister(&self, client_id: Uuid, generation: u64) {
		let mut inner = self
			.inner
			.write()
			.unwrap_or_else(std::sync::PoisonError::into_inner);
		let current = inner
			.subscribers
			.get(&client_id)
			.map(|registered| registered.generation);
		if current == Some(generation) {
			inner.subscribers.remove(&client_id);
			debug!(%client_id, generation, "subscriber deregistered");
		}
	}
}

/// A subscriber's end of the notification stream.
///
/// The streaming RPC handler is the sole consumer of this queue. Dropping it
/// deregisters the subscriber and releases the queue; cleanup is the same
/// for cancellation and for write failures.
pub struct Subscription {
	client_id: Uuid,
	generation: u64,
	receiver: mpsc::UnboundedReceiver<PropertyChangeNotification>,
	registry: SubscriptionRegistry,
}

impl Subscription {
	pub fn client_id(&self) -> Uuid {
		self.client_id
	}

	/// Next notification; `None` once the subscriber was replaced or the
	/// registry dropped every sender.
	pub async fn recv(&mut self) -> Option<PropertyChangeNotification> {
		self.receiver.recv().await
	}
}

impl futures::Stream for Subscription {
	type Item = PropertyChangeNotification;

	fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		self.receiver.poll_recv(cx)
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		self.registry.deregister(self.client_id, self.generation);
	}
}
