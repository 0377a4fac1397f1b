//! proto3 schema text emission.
//!
//! Output is deterministic (byte-identical across runs for the same model)
//! so generated schemas can be checked in and diffed.

use crate::naming::snake_case;
use crate::{CodegenError, BANNER};
use mirror_schema::{MessageDescriptor, MessageGraph, WireType};
use std::fmt::Write;

/// Render the message graph plus the fixed protocol surface into one
/// `.proto` document.
pub fn emit_proto(graph: &MessageGraph, package: &str) -> Result<String, CodegenError> {
	let mut body = String::new();
	for message in graph.iter() {
		render_message(&mut body, message)?;
	}

	let mut out = String::new();
	let _ = writeln!(out, "{BANNER}");
	let _ = writeln!(out, "syntax = \"proto3\";");
	out.push('\n');
	let _ = writeln!(out, "package {};", snake_case(package));
	out.push('\n');

	let _ = writeln!(out, "import \"google/protobuf/any.proto\";");
	let _ = writeln!(out, "import \"google/protobuf/empty.proto\";");
	if graph_uses(graph, |wire| {
		matches!(wire, WireType::Scalar(kind) | WireType::WrapperScalar(kind)
			if *kind == mirror_schema::ScalarKind::Timestamp)
	}) {
		let _ = writeln!(out, "import \"google/protobuf/timestamp.proto\";");
	}
	if graph_uses(graph, |wire| matches!(wire, WireType::WrapperScalar(kind)
		if *kind != mirror_schema::ScalarKind::Timestamp))
	{
		let _ = writeln!(out, "import \"google/protobuf/wrappers.proto\";");
	}
	out.push('\n');

	out.push_str(&body);
	out.push_str(PROTOCOL_MESSAGES);
	out.push('\n');
	out.push_str(&render_service(graph, package));
	Ok(out)
}

fn render_message(out: &mut String, message: &MessageDescriptor) -> Result<(), CodegenError> {
	let _ = writeln!(out, "message {} {{", message.id);
	for field in &message.fields {
		let _ = writeln!(
			out,
			"  {} {} = {};",
			field_type(&field.wire, &message.id.to_string(), &field.name)?,
			snake_case(&field.name),
			field.number
		);
	}
	let _ = writeln!(out, "}}");
	out.push('\n');
	Ok(())
}

fn field_type(
	wire: &WireType,
	message: &str,
	field: &str,
) -> Result<String, CodegenError> {
	Ok(match wire {
		WireType::Scalar(kind) => kind.proto_name().to_string(),
		WireType::WrapperScalar(kind) => kind.wrapper_proto_name().to_string(),
		WireType::Bytes => "bytes".to_string(),
		WireType::Enum => "int32".to_string(),
		WireType::Message(id) => id.to_string(),
		WireType::Collection(element) => match element.as_ref() {
			WireType::Collection(_) | WireType::Map(..) => {
				return Err(CodegenError::Unrepresentable {
					message: message.to_string(),
					field: field.to_string(),
					reason: "proto3 cannot nest repeated/map inside repeated".to_string(),
				})
			}
			inner => format!("repeated {}", field_type(inner, message, field)?),
		},
		WireType::Map(key, value) => {
			let value_type = match value.as_ref() {
				WireType::Collection(_) | WireType::Map(..) => {
					return Err(CodegenError::Unrepresentable {
						message: message.to_string(),
						field: field.to_string(),
						reason: "proto3 map values cannot be repeated or maps".to_string(),
					})
				}
				inner => field_type(inner, message, field)?,
			};
			format!("map<{}, {}>", field_type(key, message, field)?, value_type)
		}
	})
}

fn graph_uses(graph: &MessageGraph, predicate: impl Fn(&WireType) -> bool + Copy) -> bool {
	fn walk(wire: &WireType, predicate: impl Fn(&WireType) -> bool + Copy) -> bool {
		if predicate(wire) {
			return true;
		}
		match wire {
			WireType::Collection(element) => walk(element, predicate),
			WireType::Map(key, value) => walk(key, predicate) || walk(value, predicate),
			_ => false,
		}
	}
	graph
		.iter()
		.flat_map(|message| &message.fields)
		.any(|field| walk(&field.wire, predicate))
}

/// Fixed messages of the update/subscribe protocol; identical for every
/// generated schema.
const PROTOCOL_MESSAGES: &str = "\
message UpdatePropertyValueRequest {
  string property_name = 1;
  string property_path = 2;
  string operation_type = 3;
  google.protobuf.Any new_value = 4;
}

message UpdatePropertyValueResponse {
  bool success = 1;
  google.protobuf.Any old_value = 2;
  string error_message = 3;
}

message SubscribeRequest {
  string client_id = 1;
}

message PropertyChangeNotification {
  string property_name = 1;
  google.protobuf.Any new_value = 2;
}

enum ConnectionStatus {
  CONNECTION_STATUS_CONNECTED = 0;
  CONNECTION_STATUS_DISCONNECTED = 1;
}

message ConnectionStatusResponse {
  ConnectionStatus status = 1;
}
";

fn render_service(graph: &MessageGraph, package: &str) -> String {
	let root = graph.root_id();
	let mut out = String::new();
	let _ = writeln!(out, "service {}Service {{", crate::naming::pascal_case(package));
	let _ = writeln!(
		out,
		"  rpc GetState (google.protobuf.Empty) returns ({root});"
	);
	let _ = writeln!(
		out,
		"  rpc UpdatePropertyValue (UpdatePropertyValueRequest) returns (UpdatePropertyValueResponse);"
	);
	let _ = writeln!(
		out,
		"  rpc SubscribeToPropertyChanges (SubscribeRequest) returns (stream PropertyChangeNotification);"
	);
	let _ = writeln!(
		out,
		"  rpc Ping (google.protobuf.Empty) returns (ConnectionStatusResponse);"
	);
	let _ = writeln!(out, "}}");
	out
}
