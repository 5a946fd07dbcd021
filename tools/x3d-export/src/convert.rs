//! X3D -> GLB conversion pipeline
//!
//! Parser -> extractor -> packer -> assembler -> container writer. Every
//! conversion owns its regions and counters, so conversions can run side by
//! side.

use anyhow::{bail, Context, Result};
use glb_builder::{write_glb, Document, DocumentBuilder, GlbHeader, MeshRecord};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::ExportError;
use crate::mesh::extract_mesh;
use crate::node::{meshes_from_document, MeshNode, MeshSelector};

/// Conversion settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub selector: MeshSelector,
    /// asset.generator override
    pub generator: Option<String>,
}

/// Convert `(name, node)` pairs into an assembled document.
///
/// Any failure aborts the whole conversion.
pub fn generate_glb<N, I>(meshes: I, options: &ConvertOptions) -> Result<Document, ExportError>
where
    N: MeshNode,
    I: IntoIterator<Item = (String, N)>,
{
    let records = meshes
        .into_iter()
        .map(|(name, node)| match extract_mesh(&node) {
            Ok(record) => Ok((name, record)),
            Err(err) => Err(err.in_mesh(&name)),
        })
        .collect::<Result<Vec<(String, MeshRecord)>, _>>()?;

    let mut builder = DocumentBuilder::new();
    if let Some(generator) = &options.generator {
        builder = builder.generator(generator);
    }
    Ok(builder.assemble(records)?)
}

/// Parse X3D text and convert every selected mesh
pub fn convert_x3d_to_memory(xml: &str, options: &ConvertOptions) -> Result<Document, ExportError> {
    let document = roxmltree::Document::parse(xml)?;
    let meshes = meshes_from_document(&document, &options.selector)?;
    tracing::debug!("found {} meshes", meshes.len());
    generate_glb(meshes, options)
}

/// Convert an X3D file (or `-` for stdin) to a GLB file.
///
/// The output is only created once the whole container has been framed.
pub fn convert_x3d(
    input: &Path,
    output: &Path,
    json_output: Option<&Path>,
    options: &ConvertOptions,
) -> Result<GlbHeader> {
    let xml = read_input(input)?;
    let document = convert_x3d_to_memory(&xml, options)
        .with_context(|| format!("Failed to convert {:?}", input))?;

    let mut glb = Vec::new();
    let mut json_text = Vec::new();
    let json_sink: Option<&mut dyn Write> = match json_output {
        Some(_) => Some(&mut json_text),
        None => None,
    };
    let header = write_glb(&document, json_sink, &mut glb)?;

    if let Some(json_path) = json_output {
        std::fs::write(json_path, &json_text)
            .with_context(|| format!("Failed to write JSON output: {:?}", json_path))?;
    }

    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&glb)?;
    writer.flush()?;

    tracing::info!(
        "Wrote {:?}: {} meshes, {} bytes",
        output,
        document.root().meshes.len(),
        header.total_length
    );
    Ok(header)
}

fn read_input(input: &Path) -> Result<String> {
    let mut xml = String::new();
    if input.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut xml)
            .context("Failed to read stdin")?;
    } else {
        File::open(input)
            .with_context(|| format!("Failed to open input: {:?}", input))?
            .read_to_string(&mut xml)
            .with_context(|| format!("Failed to read input: {:?}", input))?;
    }

    if xml.trim().is_empty() {
        bail!("Input {:?} is empty", input);
    }
    Ok(xml)
}
