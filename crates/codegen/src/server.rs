//! Server binding emitter.
//!
//! The generated file wires the host's root domain type into a
//! `ViewModelServer<ValueState>`: constructors that seed the server from a
//! domain value, and a decoder back out for hosts that want a typed view of
//! the live graph.

use crate::convert::{from_wire_fn, to_wire_fn};
use crate::naming::pascal_ident;
use crate::{CodegenError, GeneratorOptions};
use mirror_schema::MessageGraph;
use proc_macro2::TokenStream;
use quote::quote;

pub fn emit_server(
	graph: &MessageGraph,
	options: &GeneratorOptions,
	convert_module: &proc_macro2::Ident,
) -> Result<TokenStream, CodegenError> {
	let domain = options.domain_path()?;
	let root = graph.root();
	let root_type = pascal_ident(&root.source_type);
	let to_wire = to_wire_fn(&root.id, graph);
	let from_wire = from_wire_fn(&root.id, graph);

	let new_doc = format!(
		"Serve a `{}` graph seeded from `initial`.",
		root.source_type
	);
	let decode_doc = format!(
		"Decode the server's current state back into a `{}`.",
		root.source_type
	);

	Ok(quote! {
		use crate::#convert_module::{#from_wire, #to_wire};
		use mirror_runtime::{ExecutionContext, ValueState, ViewModelServer};
		use std::sync::Arc;

		#[doc = #new_doc]
		pub fn new_server(initial: &#domain::#root_type) -> ViewModelServer<ValueState> {
			ViewModelServer::new(ValueState::new(#to_wire(initial)))
		}

		/// Same, but change notifications fan out through `context`.
		pub fn new_server_with_context(
			initial: &#domain::#root_type,
			context: Arc<dyn ExecutionContext>,
		) -> ViewModelServer<ValueState> {
			ViewModelServer::with_context(ValueState::new(#to_wire(initial)), context)
		}

		#[doc = #decode_doc]
		pub fn current_state(
			server: &ViewModelServer<ValueState>,
		) -> Option<#domain::#root_type> {
			#from_wire(&server.get_state())
		}
	})
}
