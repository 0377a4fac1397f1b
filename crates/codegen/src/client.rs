//! Client binding emitter.
//!
//! Generates a typed mirror struct over [`mirror_runtime::ValueMirror`]: one
//! getter per root property decoding straight out of the mirrored graph, plus
//! a `connect` helper that builds the client and runs initialization.
//! Interface-typed properties get no getter; they cannot be reconstructed
//! from the wire.

use crate::convert::{from_wire_fn, unpack_element};
use crate::naming::{pascal_case, pascal_ident, snake_ident};
use crate::{CodegenError, GeneratorOptions};
use mirror_schema::{MessageGraph, MessageId, ScalarKind, WireType};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

pub fn emit_client(
	graph: &MessageGraph,
	options: &GeneratorOptions,
	convert_module: &proc_macro2::Ident,
) -> Result<TokenStream, CodegenError> {
	let domain = options.domain_path()?;
	let root = graph.root();
	let mirror_type = format_ident!("{}Mirror", pascal_case(&root.source_type));

	let mut getters = Vec::new();
	for field in &root.fields {
		if mentions_interface(graph, &field.wire) {
			continue;
		}
		let getter = snake_ident(&field.name);
		let wire_name = &field.name;
		let doc = format!("Current `{}` from the mirrored graph.", field.name);

		let getter_fn = match &field.wire {
			WireType::Message(id) => {
				let ty = message_type(graph, id, &domain);
				let decode = from_wire_fn(id, graph);
				quote! {
					#[doc = #doc]
					pub fn #getter(&self) -> Option<#ty> {
						self.inner.root().field(#wire_name).and_then(#decode)
					}
				}
			}
			WireType::WrapperScalar(kind) => {
				let ty = scalar_type(*kind);
				let unpack = unpack_element(graph, &field.wire)?;
				quote! {
					#[doc = #doc]
					pub fn #getter(&self) -> Option<#ty> {
						self.inner.root().field(#wire_name).and_then(|item| #unpack)
					}
				}
			}
			wire => {
				let ty = rust_type(graph, wire, &domain)?;
				let unpack = unpack_element(graph, wire)?;
				quote! {
					#[doc = #doc]
					pub fn #getter(&self) -> #ty {
						self.inner
							.root()
							.field(#wire_name)
							.and_then(|item| #unpack)
							.unwrap_or_default()
					}
				}
			}
		};
		getters.push(getter_fn);
	}

	let mirror_doc = format!("Live local mirror of `{}`.", root.source_type);
	let connect_doc = format!(
		"Connect to a `{}` service, take the initial snapshot, and start the \
		 background loops.",
		root.source_type
	);

	Ok(quote! {
		use crate::#convert_module::*;
		use mirror_model::PropertyPath;
		use mirror_runtime::{
			AnyValue, ApplyError, ClientError, Mirror, ValueMirror, ViewModelClient,
			ViewModelService,
		};
		use std::sync::Arc;

		#[doc = #mirror_doc]
		#[derive(Debug, Default)]
		pub struct #mirror_type {
			inner: ValueMirror,
		}

		impl #mirror_type {
			/// The raw mirrored graph.
			pub fn root(&self) -> &AnyValue {
				self.inner.root()
			}

			#(#getters)*
		}

		impl Mirror for #mirror_type {
			fn replace_snapshot(&mut self, snapshot: AnyValue) {
				self.inner.replace_snapshot(snapshot);
			}

			fn apply(&mut self, path: &PropertyPath, value: AnyValue) -> Result<(), ApplyError> {
				self.inner.apply(path, value)
			}
		}

		#[doc = #connect_doc]
		pub async fn connect(
			service: Arc<dyn ViewModelService>,
		) -> Result<ViewModelClient<#mirror_type>, ClientError> {
			let client = ViewModelClient::new(service, #mirror_type::default());
			client.initialize().await?;
			Ok(client)
		}
	})
}

/// Domain-side Rust type for a wire shape, as used in getter signatures.
fn rust_type(
	graph: &MessageGraph,
	wire: &WireType,
	domain: &syn::Path,
) -> Result<TokenStream, CodegenError> {
	Ok(match wire {
		// Nulls are filtered out element-wise, so the wrapper collapses to
		// its inner scalar inside collections.
		WireType::Scalar(kind) | WireType::WrapperScalar(kind) => scalar_type(*kind),
		WireType::Bytes => quote!(Vec<u8>),
		// Raw discriminant; the domain enum name is not part of the wire shape.
		WireType::Enum => quote!(i32),
		WireType::Collection(element) => {
			let inner = rust_type(graph, element, domain)?;
			quote!(Vec<#inner>)
		}
		WireType::Map(key, value) => {
			let key = rust_type(graph, key, domain)?;
			let value = rust_type(graph, value, domain)?;
			quote!(Vec<(#key, #value)>)
		}
		WireType::Message(id) => message_type(graph, id, domain),
	})
}

fn scalar_type(kind: ScalarKind) -> TokenStream {
	match kind {
		ScalarKind::Bool => quote!(bool),
		ScalarKind::Int32 => quote!(i32),
		ScalarKind::Int64 | ScalarKind::Timestamp => quote!(i64),
		ScalarKind::Uint32 => quote!(u32),
		ScalarKind::Uint64 => quote!(u64),
		ScalarKind::Float => quote!(f32),
		ScalarKind::Double => quote!(f64),
		ScalarKind::String => quote!(String),
	}
}

fn message_type(graph: &MessageGraph, id: &MessageId, domain: &syn::Path) -> TokenStream {
	let name = graph
		.get(id)
		.map(|m| m.source_type.as_str())
		.unwrap_or_else(|| id.as_str());
	let ident = pascal_ident(name);
	quote!(#domain::#ident)
}

fn mentions_interface(graph: &MessageGraph, wire: &WireType) -> bool {
	match wire {
		WireType::Message(id) => graph.get(id).map(|m| m.is_interface).unwrap_or(false),
		WireType::Collection(element) => mentions_interface(graph, element),
		WireType::Map(key, value) => {
			mentions_interface(graph, key) || mentions_interface(graph, value)
		}
		_ => false,
	}
}
