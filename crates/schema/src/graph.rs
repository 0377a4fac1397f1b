//! Message graph construction.
//!
//! Walks every type reachable from the root model's properties and command
//! parameters, deduplicating complex types by identity and rejecting true
//! structural cycles. The resulting graph is immutable; regeneration means
//! rebuilding from a fresh model snapshot.

use crate::{MessageId, SchemaError, TypeMapper, WireType};
use indexmap::IndexMap;
use mirror_model::{MemberDescriptor, ViewModelModel};
use tracing::warn;

/// One numbered field of a wire message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
	pub name: String,
	pub wire: WireType,
	/// 1-based, assigned in first-seen member order, never renumbered.
	pub number: u32,
	/// Read-only domain members are populated on construction only; the
	/// conversion emitter never reassigns them.
	pub read_only: bool,
}

/// A wire message derived from one complex model type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
	pub id: MessageId,
	/// Simple name of the originating model type.
	pub source_type: String,
	/// Interface-typed sources are emitted structurally but must never be
	/// default-constructed by generated conversion code.
	pub is_interface: bool,
	pub fields: Vec<FieldDescriptor>,
}

/// Deduplicated, acyclic set of message descriptors reachable from a model.
#[derive(Debug, Clone)]
pub struct MessageGraph {
	root: MessageId,
	messages: IndexMap<MessageId, MessageDescriptor>,
}

impl MessageGraph {
	/// The root state message (`<ViewModel>State`).
	pub fn root(&self) -> &MessageDescriptor {
		&self.messages[&self.root]
	}

	pub fn root_id(&self) -> &MessageId {
		&self.root
	}

	pub fn get(&self, id: &MessageId) -> Option<&MessageDescriptor> {
		self.messages.get(id)
	}

	/// Messages in deterministic first-discovered order, root last.
	pub fn iter(&self) -> impl Iterator<Item = &MessageDescriptor> {
		self.messages.values()
	}

	pub fn len(&self) -> usize {
		self.messages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.is_empty()
	}
}

/// Breadth-of-model, depth-of-type walker producing a [`MessageGraph`].
pub struct MessageGraphBuilder<'model> {
	mapper: TypeMapper<'model>,
	messages: IndexMap<MessageId, MessageDescriptor>,
	/// Types currently being expanded; re-entry here is a structural cycle.
	in_progress: Vec<String>,
}

impl<'model> MessageGraphBuilder<'model> {
	pub fn new(model: &'model ViewModelModel) -> Self {
		Self {
			mapper: TypeMapper::new(model),
			messages: IndexMap::new(),
			in_progress: Vec::new(),
		}
	}

	pub fn build(mut self) -> Result<MessageGraph, SchemaError> {
		let model = self.mapper.model();

		// Root state message: one field per property, numbered in
		// declaration order.
		let mut fields = Vec::new();
		let mut number = 0u32;
		for property in &model.properties {
			let wire = match self.mapper.map(&property.ty) {
				Ok(wire) => wire,
				Err(SchemaError::UnresolvedType { name }) => {
					warn!(
						property = property.name,
						type_name = name,
						"skipping property with unresolved type"
					);
					continue;
				}
				Err(err) => return Err(err),
			};
			self.expand_referenced(&wire)?;
			number += 1;
			fields.push(FieldDescriptor {
				name: property.name.clone(),
				wire,
				number,
				read_only: property.read_only,
			});
		}

		// Command parameters do not land in the root message, but any
		// complex type they reference must exist in the graph for the
		// emitters.
		for command in &model.commands {
			for parameter in &command.parameters {
				match self.mapper.map(&parameter.ty) {
					Ok(wire) => self.expand_referenced(&wire)?,
					Err(SchemaError::UnresolvedType { name }) => {
						warn!(
							command = command.name,
							parameter = parameter.name,
							type_name = name,
							"skipping command parameter with unresolved type"
						);
					}
					Err(err) => return Err(err),
				}
			}
		}

		let root = MessageId::for_type(&model.name);
		self.messages.insert(
			root.clone(),
			MessageDescriptor {
				id: root.clone(),
				source_type: model.name.clone(),
				is_interface: false,
				fields,
			},
		);

		Ok(MessageGraph {
			root,
			messages: self.messages,
		})
	}

	/// Expand every message type referenced anywhere inside `wire`.
	fn expand_referenced(&mut self, wire: &WireType) -> Result<(), SchemaError> {
		match wire {
			WireType::Message(id) => self.expand(id.clone()),
			WireType::Collection(element) => self.expand_referenced(element),
			WireType::Map(key, value) => {
				self.expand_referenced(key)?;
				self.expand_referenced(value)
			}
			_ => Ok(()),
		}
	}

	fn expand(&mut self, id: MessageId) -> Result<(), SchemaError> {
		if self.messages.contains_key(&id) {
			// Revisit after full expansion: reuse, no duplicate.
			return Ok(());
		}

		let type_name = match self
			.mapper
			.model()
			.types
			.keys()
			.find(|name| MessageId::for_type(name) == id)
		{
			Some(name) => name.clone(),
			None => {
				return Err(SchemaError::UnknownType {
					name: id.to_string(),
				})
			}
		};

		if self.in_progress.contains(&type_name) {
			let mut chain = self.in_progress.clone();
			chain.push(type_name);
			return Err(SchemaError::CyclicType {
				chain: chain.join(" -> "),
			});
		}

		// Borrow gymnastics: clone the definition so we can recurse with
		// `&mut self`. Definitions are small.
		let definition = self
			.mapper
			.model()
			.resolve(&type_name)
			.cloned()
			.ok_or_else(|| SchemaError::UnknownType {
				name: type_name.clone(),
			})?;

		self.in_progress.push(type_name.clone());
		let fields = self.expand_members(&definition.members)?;
		self.in_progress.pop();

		self.messages.insert(
			id.clone(),
			MessageDescriptor {
				id,
				source_type: type_name,
				is_interface: definition.is_interface,
				fields,
			},
		);
		Ok(())
	}

	fn expand_members(
		&mut self,
		members: &[MemberDescriptor],
	) -> Result<Vec<FieldDescriptor>, SchemaError> {
		let mut fields = Vec::with_capacity(members.len());
		let mut number = 0u32;
		for member in members {
			let wire = match self.mapper.map(&member.ty) {
				Ok(wire) => wire,
				Err(SchemaError::UnresolvedType { name }) => {
					warn!(
						member = member.name,
						type_name = name,
						"skipping member with unresolved type"
					);
					continue;
				}
				Err(err) => return Err(err),
			};
			// Nested messages are expanded before this message is finalized,
			// which is what makes in-progress re-entry detectable.
			self.expand_referenced(&wire)?;
			number += 1;
			fields.push(FieldDescriptor {
				name: member.name.clone(),
				wire,
				number,
				read_only: member.read_only,
			});
		}
		Ok(fields)
	}
}
