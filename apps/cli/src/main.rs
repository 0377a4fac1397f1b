//! `mirror-cli`: renders synchronization artifacts from extractor JSON.
//!
//! Each input document describes one root view model. For every model the
//! tool writes four files: the `.proto` schema, the wire conversions, the
//! server binding, and the typed client mirror.

use anyhow::{bail, Context};
use clap::Parser;
use mirror_codegen::{GeneratedArtifacts, Generator, GeneratorOptions};
use mirror_model::ViewModelModel;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "mirror-cli", version, about = "Generate state-sync artifacts from view-model JSON")]
struct Args {
	/// Extractor JSON documents, one root view model each.
	#[arg(required = true)]
	models: Vec<PathBuf>,

	/// Directory the generated Rust files are written to.
	#[arg(long, default_value = "generated")]
	output: PathBuf,

	/// Directory for the `.proto` schemas. Defaults to `--output`.
	#[arg(long)]
	proto_output: Option<PathBuf>,

	/// Module path the host's domain types live under, as seen from the
	/// generated files.
	#[arg(long, default_value = "crate")]
	domain_module: String,
}

fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info".into()),
		)
		.init();

	run(&Args::parse())
}

fn run(args: &Args) -> anyhow::Result<()> {
	let proto_output = args.proto_output.as_deref().unwrap_or(&args.output);
	fs::create_dir_all(&args.output)
		.with_context(|| format!("creating {}", args.output.display()))?;
	fs::create_dir_all(proto_output)
		.with_context(|| format!("creating {}", proto_output.display()))?;

	let generator = Generator::with_options(GeneratorOptions {
		domain_module: args.domain_module.clone(),
	});

	// Keep going on per-model failures so one bad document does not hide
	// diagnostics for the rest of the batch.
	let mut failed = 0usize;
	for path in &args.models {
		if let Err(err) = generate_one(&generator, path, &args.output, proto_output) {
			error!(model = %path.display(), "generation failed: {err:#}");
			failed += 1;
		}
	}
	if failed > 0 {
		bail!("{failed} of {} model(s) failed", args.models.len());
	}
	Ok(())
}

fn generate_one(
	generator: &Generator,
	path: &Path,
	output: &Path,
	proto_output: &Path,
) -> anyhow::Result<()> {
	let json =
		fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	let model = ViewModelModel::from_json(&json)
		.with_context(|| format!("parsing {}", path.display()))?;
	let artifacts = generator
		.generate(&model)
		.with_context(|| format!("generating artifacts for {}", model.name))?;
	write_artifacts(&artifacts, output, proto_output)?;
	info!(
		model = model.name,
		stem = artifacts.file_stem,
		"artifacts written"
	);
	Ok(())
}

fn write_artifacts(
	artifacts: &GeneratedArtifacts,
	output: &Path,
	proto_output: &Path,
) -> anyhow::Result<()> {
	let stem = &artifacts.file_stem;
	let files = [
		(proto_output.join(format!("{stem}.proto")), &artifacts.proto),
		(
			output.join(format!("{stem}_convert.rs")),
			&artifacts.conversions,
		),
		(output.join(format!("{stem}_server.rs")), &artifacts.server),
		(output.join(format!("{stem}_client.rs")), &artifacts.client),
	];
	for (path, contents) in files {
		fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
	}
	Ok(())
}
