//! x3d-export - X3D to binary glTF conversion tool
//!
//! Converts X3D triangle-set nodes to glTF-binary (.glb) containers.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use x3d_export::{convert, manifest, read_glb, ConvertOptions, MeshSelector};

#[derive(Parser)]
#[command(name = "x3d-export")]
#[command(about = "Generate glTF-binary files from X3D triangle set nodes")]
#[command(version)]
struct Cli {
    /// Write debug messages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a single X3D file
    Convert {
        /// Input XML file, or '-' for stdin
        input: PathBuf,

        /// Output .glb file (default: input with .glb extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the JSON content, indented, for debugging
        #[arg(long)]
        json_output: Option<PathBuf>,

        /// Element wrapping each mesh node
        #[arg(long, default_value = "mesh")]
        mesh_tag: String,

        /// Wrapper attribute holding the mesh name
        #[arg(long, default_value = "name")]
        name_attribute: String,
    },

    /// Convert every entry of a manifest file
    Build {
        /// Path to x3d-export.toml manifest
        #[arg(default_value = manifest::DEFAULT_MANIFEST)]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the preamble and layout of a generated .glb file
    Inspect {
        /// Input .glb file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            json_output,
            mesh_tag,
            name_attribute,
        } => {
            let output = match output {
                Some(output) => output,
                None if input.as_os_str() == "-" => {
                    bail!("--output is required when reading from stdin")
                }
                None => input.with_extension("glb"),
            };
            let options = ConvertOptions {
                selector: MeshSelector {
                    mesh_tag,
                    name_attribute,
                },
                generator: None,
            };

            tracing::info!("Converting {:?} -> {:?}", input, output);
            convert::convert_x3d(&input, &output, json_output.as_deref(), &options)?;
            tracing::info!("Done!");
        }

        Commands::Build { manifest, output } => {
            tracing::info!("Building from {:?}", manifest);
            let config = manifest::load_manifest(&manifest)?;
            let headers = manifest::build_all(&config, output.as_deref())?;
            tracing::info!("Build complete! {} files written", headers.len());
        }

        Commands::Inspect { input } => inspect(&input)?,
    }

    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let container = read_glb(&bytes).with_context(|| format!("Invalid container {:?}", path))?;
    let header = container.header;

    println!("GLB preamble:");
    println!("  Version: {}", header.version);
    println!("  Total length: {} bytes", header.total_length);
    println!("  Content length: {} bytes", header.content_length);
    println!("  Content format: {}", header.content_format);
    println!("  Binary payload: {} bytes", container.binary.len());

    let json: serde_json::Value =
        serde_json::from_str(container.json).context("Container content is not JSON")?;

    if let Some(views) = json["bufferViews"].as_object() {
        println!("\nBuffer views:");
        for (key, view) in views {
            println!(
                "  {}: offset {}, length {}, target {}",
                key, view["byteOffset"], view["byteLength"], view["target"]
            );
        }
    }

    if let Some(meshes) = json["meshes"].as_object() {
        println!("\nMeshes:");
        for (name, mesh) in meshes {
            let primitive = &mesh["primitives"][0];
            let position = primitive["attributes"]["POSITION"].as_str().unwrap_or("-");
            println!(
                "  {}: {} points, normals: {}, indices: {}",
                name,
                json["accessors"][position]["count"],
                primitive["attributes"].get("NORMAL").is_some(),
                primitive["indices"]
                    .as_str()
                    .map(|key| json["accessors"][key]["count"].to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
        }
    }

    Ok(())
}
