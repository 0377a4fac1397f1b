//! The full loop: snapshot, path-addressed update, fan-out, client mirror.

use mirror_runtime::{
	AnyValue, ClientOptions, InProcessService, PropertyPath, UpdateRequest, ValueMirror,
	ValueState, ViewModelClient, ViewModelServer, ViewModelService,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn zone(temperature: i32) -> AnyValue {
	AnyValue::message(
		"ZoneState",
		vec![("Temperature".to_string(), AnyValue::I32(temperature))],
	)
}

fn zone_server() -> Arc<ViewModelServer<ValueState>> {
	Arc::new(ViewModelServer::new(ValueState::new(AnyValue::message(
		"HvacState",
		vec![(
			"ZoneList".to_string(),
			AnyValue::List(vec![zone(42), zone(43)]),
		)],
	))))
}

#[tokio::test(flavor = "multi_thread")]
async fn zone_scenario() {
	let server = zone_server();
	let service = Arc::new(InProcessService::new(Arc::clone(&server)));

	// GetState returns both seeded zones.
	let snapshot = service.get_state().await.unwrap();
	let zones = snapshot.field("ZoneList").unwrap().as_list().unwrap();
	assert_eq!(zones.len(), 2);
	assert_eq!(zones[0].field("Temperature"), Some(&AnyValue::I32(42)));
	assert_eq!(zones[1].field("Temperature"), Some(&AnyValue::I32(43)));

	let mut subscriber_a = server.subscribe(Uuid::new_v4());
	let mut subscriber_b = server.subscribe(Uuid::new_v4());

	// Path-addressed set returns the previous value.
	let response = service
		.update_property(UpdateRequest::set(
			"ZoneList[1].Temperature",
			AnyValue::I32(55),
		))
		.await
		.unwrap();
	assert!(response.success);
	assert_eq!(response.old_value, Some(AnyValue::I32(43)));
	assert_eq!(response.error_message, None);

	// Every active subscriber gets exactly that one notification.
	for subscriber in [&mut subscriber_a, &mut subscriber_b] {
		let notification = subscriber.recv().await.unwrap();
		assert_eq!(notification.property_name, "ZoneList[1].Temperature");
		assert_eq!(notification.new_value, AnyValue::I32(55));
	}

	// And the server state reflects the mutation.
	let path = PropertyPath::parse("ZoneList[1].Temperature").unwrap();
	assert_eq!(
		server.get_state().read_path(&path).unwrap(),
		&AnyValue::I32(55)
	);
}

#[tokio::test(flavor = "multi_thread")]
async fn client_mirror_follows_server_updates() {
	let server = zone_server();
	let service: Arc<dyn ViewModelService> =
		Arc::new(InProcessService::new(Arc::clone(&server)));

	let client = ViewModelClient::with_options(
		Arc::clone(&service),
		ValueMirror::default(),
		ClientOptions {
			ping_interval: Duration::from_millis(10),
		},
	);
	client.initialize().await.unwrap();

	// Mirror starts from the snapshot.
	let path = PropertyPath::parse("ZoneList[0].Temperature").unwrap();
	assert_eq!(
		client.with_mirror(|m| m.read(&path).unwrap()),
		AnyValue::I32(42)
	);

	// A mutation through the client round-trips into its own mirror via the
	// notification stream.
	let response = client
		.update_property("ZoneList[0].Temperature", 21i32)
		.await
		.unwrap();
	assert!(response.success);
	assert_eq!(response.old_value, Some(AnyValue::I32(42)));

	for _ in 0..100 {
		if client.with_mirror(|m| m.read(&path).unwrap()) == AnyValue::I32(21) {
			client.dispose();
			return;
		}
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
	panic!("mirror never converged on the updated value");
}
