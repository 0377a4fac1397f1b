//! End-to-end generation over extractor JSON.

use mirror_codegen::{CodegenError, Generator};
use mirror_model::ViewModelModel;

fn hvac_model() -> ViewModelModel {
	ViewModelModel::from_json(
		r#"{
			"name": "Hvac",
			"properties": [
				{
					"name": "ZoneList",
					"type": {
						"kind": "observable_list",
						"element": { "kind": "complex", "name": "Zone" }
					}
				},
				{ "name": "Setpoint", "type": { "kind": "nullable", "primitive": "i32" } },
				{ "name": "LastSync", "type": { "kind": "date_time" } },
				{ "name": "Mode", "type": { "kind": "enum", "name": "HvacMode" } }
			],
			"types": {
				"Zone": {
					"members": [
						{ "name": "Temperature", "type": { "kind": "primitive", "primitive": "i32" } },
						{ "name": "Name", "type": { "kind": "string" } }
					]
				}
			}
		}"#,
	)
	.unwrap()
}

#[test]
fn proto_schema_covers_model_and_protocol() {
	let artifacts = Generator::new().generate(&hvac_model()).unwrap();
	let proto = &artifacts.proto;

	assert!(proto.contains("syntax = \"proto3\";"));
	assert!(proto.contains("package hvac;"));

	// Nested messages come before the root.
	let zone_at = proto.find("message ZoneState {").unwrap();
	let root_at = proto.find("message HvacState {").unwrap();
	assert!(zone_at < root_at);

	assert!(proto.contains("repeated ZoneState zone_list = 1;"));
	assert!(proto.contains("google.protobuf.Int32Value setpoint = 2;"));
	assert!(proto.contains("google.protobuf.Timestamp last_sync = 3;"));
	assert!(proto.contains("int32 mode = 4;"));
	assert!(proto.contains("import \"google/protobuf/timestamp.proto\";"));
	assert!(proto.contains("import \"google/protobuf/wrappers.proto\";"));

	// The fixed protocol surface rides along with every schema.
	assert!(proto.contains("message UpdatePropertyValueRequest {"));
	assert!(proto.contains("message PropertyChangeNotification {"));
	assert!(proto.contains("service HvacService {"));
	assert!(proto.contains("rpc GetState (google.protobuf.Empty) returns (HvacState);"));
	assert!(proto.contains(
		"rpc SubscribeToPropertyChanges (SubscribeRequest) returns (stream PropertyChangeNotification);"
	));
}

#[test]
fn unused_well_known_imports_are_omitted() {
	let model = ViewModelModel::from_json(
		r#"{
			"name": "Counter",
			"properties": [
				{ "name": "Count", "type": { "kind": "primitive", "primitive": "i32" } }
			]
		}"#,
	)
	.unwrap();

	let artifacts = Generator::new().generate(&model).unwrap();
	assert!(!artifacts.proto.contains("timestamp.proto"));
	assert!(!artifacts.proto.contains("wrappers.proto"));
}

#[test]
fn rust_artifacts_parse_and_name_the_domain() {
	let artifacts = Generator::new().generate(&hvac_model()).unwrap();

	for source in [
		&artifacts.conversions,
		&artifacts.server,
		&artifacts.client,
	] {
		syn::parse_file(source).unwrap();
	}

	assert!(artifacts.conversions.contains("pub fn to_wire_hvac"));
	assert!(artifacts.conversions.contains("pub fn from_wire_zone"));
	assert!(artifacts.server.contains("pub fn new_server"));
	assert!(artifacts.server.contains("ViewModelServer<ValueState>"));
	assert!(artifacts.client.contains("pub struct HvacMirror"));
	assert!(artifacts.client.contains("pub fn zone_list"));
	assert!(artifacts.client.contains("pub async fn connect"));
	assert_eq!(artifacts.file_stem, "hvac");
}

#[test]
fn generation_is_deterministic() {
	let model = hvac_model();
	let first = Generator::new().generate(&model).unwrap();
	let second = Generator::new().generate(&model).unwrap();

	assert_eq!(first.proto, second.proto);
	assert_eq!(first.conversions, second.conversions);
	assert_eq!(first.server, second.server);
	assert_eq!(first.client, second.client);
}

#[test]
fn interface_types_get_no_constructor_and_no_getter() {
	let model = ViewModelModel::from_json(
		r#"{
			"name": "Logger",
			"properties": [
				{ "name": "Sink", "type": { "kind": "complex", "name": "ILogSink" } },
				{ "name": "Level", "type": { "kind": "primitive", "primitive": "i32" } }
			],
			"types": {
				"ILogSink": {
					"is_interface": true,
					"members": [
						{ "name": "Name", "type": { "kind": "string" } }
					]
				}
			}
		}"#,
	)
	.unwrap();

	let artifacts = Generator::new().generate(&model).unwrap();

	// Serializable, but never rebuilt from the wire.
	assert!(artifacts.conversions.contains("pub fn to_wire_ilog_sink"));
	assert!(!artifacts.conversions.contains("from_wire_ilog_sink"));
	assert!(!artifacts.client.contains("fn sink"));
	assert!(artifacts.client.contains("fn level"));
}

#[test]
fn nested_repeated_is_rejected_at_emission() {
	let model = ViewModelModel::from_json(
		r#"{
			"name": "Grid",
			"properties": [
				{
					"name": "Rows",
					"type": {
						"kind": "list",
						"element": {
							"kind": "list",
							"element": { "kind": "primitive", "primitive": "i32" }
						}
					}
				}
			]
		}"#,
	)
	.unwrap();

	let err = Generator::new().generate(&model).unwrap_err();
	match err {
		CodegenError::Unrepresentable { message, field, .. } => {
			assert_eq!(message, "GridState");
			assert_eq!(field, "Rows");
		}
		other => panic!("expected Unrepresentable, got {other:?}"),
	}
}

#[test]
fn custom_domain_module_lands_in_signatures() {
	let generator = Generator::with_options(mirror_codegen::GeneratorOptions {
		domain_module: "crate::domain".to_string(),
	});
	let artifacts = generator.generate(&hvac_model()).unwrap();
	assert!(artifacts.conversions.contains("crate::domain::Hvac"));
	assert!(artifacts.client.contains("crate::domain::Zone"));
}
