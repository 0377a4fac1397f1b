//! Conversion emitter: `to_wire` / `from_wire` pairs for every message.
//!
//! The generated functions map the host's domain structs onto the dynamic
//! wire envelope and back. Collections and maps convert element-wise;
//! read-only domain fields are only ever populated through construction;
//! interface-typed sources get no `from_wire` at all, and interface-typed
//! fields inside other messages are left unset.

use crate::naming::{pascal_ident, snake_case, snake_ident};
use crate::{CodegenError, GeneratorOptions};
use mirror_schema::{MessageDescriptor, MessageGraph, MessageId, ScalarKind, WireType};
use proc_macro2::TokenStream;
use quote::quote;

pub fn emit_conversions(
	graph: &MessageGraph,
	options: &GeneratorOptions,
) -> Result<TokenStream, CodegenError> {
	let domain = options.domain_path()?;
	let mut items = Vec::new();

	for message in graph.iter() {
		items.push(emit_to_wire(graph, message, &domain)?);
		if message.is_interface {
			// Never default-construct an interface type.
			continue;
		}
		items.push(emit_from_wire(graph, message, &domain)?);
	}

	Ok(quote! {
		use mirror_runtime::AnyValue;

		#(#items)*
	})
}

fn emit_to_wire(
	graph: &MessageGraph,
	message: &MessageDescriptor,
	domain: &syn::Path,
) -> Result<TokenStream, CodegenError> {
	let fn_name = to_wire_fn(&message.id, graph);
	let domain_type = pascal_ident(&message.source_type);
	let message_name = message.id.to_string();

	let fields = message
		.fields
		.iter()
		.map(|field| {
			let wire_name = &field.name;
			let accessor = snake_ident(&field.name);
			let packed = pack_expr(graph, &field.wire, quote!(value.#accessor))?;
			Ok(quote! {
				(#wire_name.to_string(), #packed)
			})
		})
		.collect::<Result<Vec<_>, CodegenError>>()?;

	let doc = format!("Serialize a [`{}`] into its wire message.", message.source_type);
	Ok(quote! {
		#[doc = #doc]
		pub fn #fn_name(value: &#domain::#domain_type) -> AnyValue {
			AnyValue::Message {
				name: #message_name.to_string(),
				fields: vec![#(#fields),*],
			}
		}
	})
}

fn emit_from_wire(
	graph: &MessageGraph,
	message: &MessageDescriptor,
	domain: &syn::Path,
) -> Result<TokenStream, CodegenError> {
	let fn_name = from_wire_fn(&message.id, graph);
	let domain_type = pascal_ident(&message.source_type);

	let fields = message
		.fields
		.iter()
		.map(|field| {
			let accessor = snake_ident(&field.name);
			let unpacked = unpack_field(graph, field)?;
			Ok(quote! { #accessor: #unpacked })
		})
		.collect::<Result<Vec<_>, CodegenError>>()?;

	let doc = format!(
		"Rebuild a [`{}`] from its wire message. Read-only fields are set \
		 here, at construction, and nowhere else.",
		message.source_type
	);
	Ok(quote! {
		#[doc = #doc]
		pub fn #fn_name(value: &AnyValue) -> Option<#domain::#domain_type> {
			Some(#domain::#domain_type {
				#(#fields),*
			})
		}
	})
}

/// Expression packing `expr` (a domain field access) into an [`AnyValue`].
fn pack_expr(
	graph: &MessageGraph,
	wire: &WireType,
	expr: TokenStream,
) -> Result<TokenStream, CodegenError> {
	Ok(match wire {
		WireType::Scalar(kind) => pack_scalar(*kind, expr),
		WireType::WrapperScalar(kind) => {
			let inner = pack_scalar(*kind, quote!((*inner)));
			quote! {
				match &#expr {
					Some(inner) => #inner,
					None => AnyValue::Null,
				}
			}
		}
		WireType::Bytes => quote!(AnyValue::Bytes(#expr.clone())),
		WireType::Enum => quote!(AnyValue::Enum(#expr as i32)),
		WireType::Collection(element) => {
			let item = pack_expr(graph, element, quote!((*item)))?;
			quote! {
				AnyValue::List(#expr.iter().map(|item| #item).collect())
			}
		}
		WireType::Map(key, value) => {
			let key_packed = pack_expr(graph, key, quote!((*key)))?;
			let value_packed = pack_expr(graph, value, quote!((*val)))?;
			quote! {
				AnyValue::Map(
					#expr
						.iter()
						.map(|(key, val)| (#key_packed, #value_packed))
						.collect(),
				)
			}
		}
		WireType::Message(id) => {
			let nested = to_wire_fn(id, graph);
			quote!(#nested(&#expr))
		}
	})
}

fn pack_scalar(kind: ScalarKind, expr: TokenStream) -> TokenStream {
	match kind {
		ScalarKind::Bool => quote!(AnyValue::Bool(#expr)),
		ScalarKind::Int32 => quote!(AnyValue::I32(#expr)),
		// Instants travel as epoch milliseconds.
		ScalarKind::Int64 | ScalarKind::Timestamp => quote!(AnyValue::I64(#expr)),
		ScalarKind::Uint32 => quote!(AnyValue::U32(#expr)),
		ScalarKind::Uint64 => quote!(AnyValue::U64(#expr)),
		ScalarKind::Float => quote!(AnyValue::F32(#expr)),
		ScalarKind::Double => quote!(AnyValue::F64(#expr)),
		ScalarKind::String => quote!(AnyValue::Str(#expr.clone())),
	}
}

/// Expression unpacking one named field of the enclosing wire message.
fn unpack_field(
	graph: &MessageGraph,
	field: &mirror_schema::FieldDescriptor,
) -> Result<TokenStream, CodegenError> {
	let wire_name = &field.name;
	Ok(match &field.wire {
		WireType::Scalar(kind) => {
			let (pattern, bind) = scalar_pattern(*kind);
			quote! {
				match value.field(#wire_name) {
					Some(#pattern) => #bind,
					_ => Default::default(),
				}
			}
		}
		WireType::WrapperScalar(kind) => {
			let (pattern, bind) = scalar_pattern(*kind);
			quote! {
				match value.field(#wire_name) {
					Some(#pattern) => Some(#bind),
					_ => None,
				}
			}
		}
		WireType::Bytes => quote! {
			match value.field(#wire_name) {
				Some(AnyValue::Bytes(v)) => v.clone(),
				_ => Default::default(),
			}
		},
		WireType::Enum => quote! {
			match value.field(#wire_name) {
				Some(AnyValue::Enum(v)) => (*v).try_into().unwrap_or_default(),
				_ => Default::default(),
			}
		},
		WireType::Collection(element) => {
			let item = unpack_element(graph, element)?;
			quote! {
				match value.field(#wire_name) {
					Some(AnyValue::List(items)) => {
						items.iter().filter_map(|item| #item).collect()
					}
					_ => Default::default(),
				}
			}
		}
		WireType::Map(key, val) => {
			let key_unpack = unpack_element(graph, key)?;
			let val_unpack = unpack_element(graph, val)?;
			quote! {
				match value.field(#wire_name) {
					Some(AnyValue::Map(entries)) => entries
						.iter()
						.filter_map(|(key, val)| {
							let key = { let item = key; #key_unpack }?;
							let val = { let item = val; #val_unpack }?;
							Some((key, val))
						})
						.collect(),
					_ => Default::default(),
				}
			}
		}
		WireType::Message(id) => {
			if graph.get(id).map(|m| m.is_interface).unwrap_or(false) {
				// Interface-typed field: discovered structurally, never
				// constructed from the wire.
				quote!(None)
			} else {
				let nested = from_wire_fn(id, graph);
				quote! {
					value
						.field(#wire_name)
						.and_then(#nested)
						.unwrap_or_default()
				}
			}
		}
	})
}

/// `|item: &AnyValue| -> Option<T>` body for collection/map elements; the
/// element is in scope as `item`.
pub(crate) fn unpack_element(
	graph: &MessageGraph,
	wire: &WireType,
) -> Result<TokenStream, CodegenError> {
	Ok(match wire {
		WireType::Scalar(kind) | WireType::WrapperScalar(kind) => {
			let (pattern, bind) = scalar_pattern(*kind);
			quote! {
				match item {
					#pattern => Some(#bind),
					_ => None,
				}
			}
		}
		WireType::Bytes => quote! {
			match item {
				AnyValue::Bytes(v) => Some(v.clone()),
				_ => None,
			}
		},
		WireType::Enum => quote! {
			match item {
				AnyValue::Enum(v) => (*v).try_into().ok(),
				_ => None,
			}
		},
		WireType::Message(id) => {
			if graph.get(id).map(|m| m.is_interface).unwrap_or(false) {
				quote!(None)
			} else {
				let nested = from_wire_fn(id, graph);
				quote!(#nested(item))
			}
		}
		WireType::Collection(element) => {
			let inner = unpack_element(graph, element)?;
			quote! {
				match item {
					AnyValue::List(items) => {
						Some(items.iter().filter_map(|item| #inner).collect::<Vec<_>>())
					}
					_ => None,
				}
			}
		}
		WireType::Map(key, value) => {
			let key_unpack = unpack_element(graph, key)?;
			let value_unpack = unpack_element(graph, value)?;
			quote! {
				match item {
					AnyValue::Map(entries) => Some(
						entries
							.iter()
							.filter_map(|(key, val)| {
								let key = { let item = key; #key_unpack }?;
								let val = { let item = val; #value_unpack }?;
								Some((key, val))
							})
							.collect::<Vec<_>>(),
					),
					_ => None,
				}
			}
		}
	})
}

fn scalar_pattern(kind: ScalarKind) -> (TokenStream, TokenStream) {
	match kind {
		ScalarKind::Bool => (quote!(AnyValue::Bool(v)), quote!(*v)),
		ScalarKind::Int32 => (quote!(AnyValue::I32(v)), quote!(*v)),
		ScalarKind::Int64 | ScalarKind::Timestamp => (quote!(AnyValue::I64(v)), quote!(*v)),
		ScalarKind::Uint32 => (quote!(AnyValue::U32(v)), quote!(*v)),
		ScalarKind::Uint64 => (quote!(AnyValue::U64(v)), quote!(*v)),
		ScalarKind::Float => (quote!(AnyValue::F32(v)), quote!(*v)),
		ScalarKind::Double => (quote!(AnyValue::F64(v)), quote!(*v)),
		ScalarKind::String => (quote!(AnyValue::Str(v)), quote!(v.clone())),
	}
}

pub fn to_wire_fn(id: &MessageId, graph: &MessageGraph) -> proc_macro2::Ident {
	let source = graph
		.get(id)
		.map(|m| m.source_type.as_str())
		.unwrap_or_else(|| id.as_str());
	quote::format_ident!("to_wire_{}", snake_case(source))
}

pub fn from_wire_fn(id: &MessageId, graph: &MessageGraph) -> proc_macro2::Ident {
	let source = graph
		.get(id)
		.map(|m| m.source_type.as_str())
		.unwrap_or_else(|| id.as_str());
	quote::format_ident!("from_wire_{}", snake_case(source))
}
