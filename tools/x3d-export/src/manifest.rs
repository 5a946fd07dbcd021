//! x3d-export.toml manifest parsing and batch builds

use anyhow::{bail, Context, Result};
use glb_builder::GlbHeader;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::convert::{convert_x3d, ConvertOptions};
use crate::node::MeshSelector;

/// Default manifest file name
pub const DEFAULT_MANIFEST: &str = "x3d-export.toml";

/// x3d-export.toml manifest structure
#[derive(Debug, Deserialize)]
pub struct ExportManifest {
    #[serde(default)]
    pub options: OptionsSection,
    #[serde(default)]
    pub conversions: Vec<ConversionEntry>,

    /// Directory relative paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Options shared by every conversion in the manifest
#[derive(Debug, Deserialize)]
pub struct OptionsSection {
    /// Wrapper element around each mesh node.
    /// Default: "mesh"
    #[serde(default = "default_mesh_tag")]
    pub mesh_tag: String,

    /// Wrapper attribute holding the mesh name.
    /// Default: "name"
    #[serde(default = "default_name_attribute")]
    pub name_attribute: String,

    /// asset.generator override
    #[serde(default)]
    pub generator: Option<String>,
}

fn default_mesh_tag() -> String {
    MeshSelector::default().mesh_tag
}

fn default_name_attribute() -> String {
    MeshSelector::default().name_attribute
}

impl Default for OptionsSection {
    fn default() -> Self {
        Self {
            mesh_tag: default_mesh_tag(),
            name_attribute: default_name_attribute(),
            generator: None,
        }
    }
}

impl OptionsSection {
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            selector: MeshSelector {
                mesh_tag: self.mesh_tag.clone(),
                name_attribute: self.name_attribute.clone(),
            },
            generator: self.generator.clone(),
        }
    }
}

/// Single conversion entry
#[derive(Debug, Deserialize)]
pub struct ConversionEntry {
    pub input: PathBuf,

    /// Output GLB path. Default: input with a .glb extension
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Optional indented JSON written next to the container
    #[serde(default)]
    pub json_output: Option<PathBuf>,
}

/// Conversion entry with all paths resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConversion {
    pub input: PathBuf,
    pub output: PathBuf,
    pub json_output: Option<PathBuf>,
}

/// Load and parse a manifest
pub fn load_manifest(path: &Path) -> Result<ExportManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {:?}", path))?;
    let mut manifest: ExportManifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {:?}", path))?;

    manifest.base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(manifest)
}

impl ExportManifest {
    /// Resolve entry paths against the manifest directory.
    ///
    /// `output_dir` replaces the directory of every output file.
    pub fn resolve(&self, output_dir: Option<&Path>) -> Vec<ResolvedConversion> {
        self.conversions
            .iter()
            .map(|entry| {
                let input = self.base_dir.join(&entry.input);
                let output = entry
                    .output
                    .clone()
                    .unwrap_or_else(|| entry.input.with_extension("glb"));
                let relocate = |path: &Path| match (output_dir, path.file_name()) {
                    (Some(dir), Some(name)) => dir.join(name),
                    _ => self.base_dir.join(path),
                };

                ResolvedConversion {
                    input,
                    output: relocate(&output),
                    json_output: entry.json_output.as_deref().map(relocate),
                }
            })
            .collect()
    }
}

/// Resolve the manifest, checking that inputs exist and no two conversions
/// write the same file once `output_dir` is applied
pub fn validate(
    manifest: &ExportManifest,
    output_dir: Option<&Path>,
) -> Result<Vec<ResolvedConversion>> {
    if manifest.conversions.is_empty() {
        bail!("Manifest declares no conversions");
    }

    let conversions = manifest.resolve(output_dir);
    let mut outputs = HashSet::new();
    for conversion in &conversions {
        if !conversion.input.is_file() {
            bail!("Input file not found: {:?}", conversion.input);
        }
        for path in std::iter::once(&conversion.output).chain(&conversion.json_output) {
            if !outputs.insert(path.clone()) {
                bail!("Output {:?} is written by more than one conversion", path);
            }
        }
    }
    Ok(conversions)
}

/// Run every conversion in the manifest (in parallel)
pub fn build_all(manifest: &ExportManifest, output_dir: Option<&Path>) -> Result<Vec<GlbHeader>> {
    use rayon::prelude::*;

    let conversions = validate(manifest, output_dir)?;
    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }

    let options = manifest.options.convert_options();
    conversions
        .par_iter()
        .map(|conversion| {
            tracing::info!("Converting {:?} -> {:?}", conversion.input, conversion.output);
            convert_x3d(
                &conversion.input,
                &conversion.output,
                conversion.json_output.as_deref(),
                &options,
            )
        })
        .collect()
}
