//! Artifact generation for observable view models.
//!
//! Drives [`mirror_schema`] over a canonical model and renders four artifacts
//! per root view model: the `.proto` schema, the wire conversion functions,
//! the server binding, and the typed client mirror. Rust output is emitted
//! through `quote` and formatted with `prettyplease` so regeneration produces
//! stable, reviewable diffs.

mod client;
mod convert;
mod naming;
mod proto;
mod server;

pub use proto::emit_proto;

use mirror_model::ViewModelModel;
use mirror_schema::{MessageGraphBuilder, SchemaError};
use tracing::info;

pub(crate) const BANNER: &str = "// Generated by mirror-cli. Do not edit.";

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
	#[error(transparent)]
	Schema(#[from] SchemaError),
	/// The wire shape exists in the graph but proto3 has no syntax for it.
	#[error("{message}.{field} cannot be represented: {reason}")]
	Unrepresentable {
		message: String,
		field: String,
		reason: String,
	},
	#[error("emitted code does not parse: {0}")]
	Render(#[from] syn::Error),
	#[error("invalid domain module path {module:?}")]
	DomainModule { module: String },
}

/// Knobs the CLI exposes.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
	/// Module path under which the host's domain types are reachable from the
	/// generated files.
	pub domain_module: String,
}

impl Default for GeneratorOptions {
	fn default() -> Self {
		Self {
			domain_module: "crate".to_string(),
		}
	}
}

impl GeneratorOptions {
	pub(crate) fn domain_path(&self) -> Result<syn::Path, CodegenError> {
		syn::parse_str(&self.domain_module).map_err(|_| CodegenError::DomainModule {
			module: self.domain_module.clone(),
		})
	}
}

/// Everything generated for one root view model. All four artifacts share
/// `file_stem`; the CLI appends `.proto` / `_convert.rs` / `_server.rs` /
/// `_client.rs`.
#[derive(Debug, Clone)]
pub struct GeneratedArtifacts {
	pub file_stem: String,
	pub proto: String,
	pub conversions: String,
	pub server: String,
	pub client: String,
}

pub struct Generator {
	options: GeneratorOptions,
}

impl Default for Generator {
	fn default() -> Self {
		Self::new()
	}
}

impl Generator {
	pub fn new() -> Self {
		Self::with_options(GeneratorOptions::default())
	}

	pub fn with_options(options: GeneratorOptions) -> Self {
		Self { options }
	}

	/// Derive the message graph and render all artifacts for `model`.
	pub fn generate(&self, model: &ViewModelModel) -> Result<GeneratedArtifacts, CodegenError> {
		let graph = MessageGraphBuilder::new(model).build()?;
		info!(
			model = model.name,
			messages = graph.len(),
			"derived message graph"
		);

		let file_stem = naming::snake_case(&model.name);
		let convert_module = quote::format_ident!("{file_stem}_convert");

		let proto = proto::emit_proto(&graph, &model.name)?;
		let conversions = render(convert::emit_conversions(&graph, &self.options)?)?;
		let server = render(server::emit_server(&graph, &self.options, &convert_module)?)?;
		let client = render(client::emit_client(&graph, &self.options, &convert_module)?)?;

		Ok(GeneratedArtifacts {
			file_stem,
			proto,
			conversions,
			server,
			client,
		})
	}
}

/// Parse the token stream back as a file and pretty-print it. Parsing here
/// means a malformed emitter fails the run instead of producing a file that
/// breaks the host's build.
fn render(tokens: proc_macro2::TokenStream) -> Result<String, CodegenError> {
	let file: syn::File = syn::parse2(tokens)?;
	Ok(format!("{BANNER}\n\n{}", prettyplease::unparse(&file)))
}
