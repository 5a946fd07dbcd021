//! GLTF document construction
//!
//! Meshes are packed one at a time into the shared regions. Once every mesh
//! is in, region offsets are finalized and written into `bufferViews`.

use crate::buffer::{finalize_offsets, Accessor, BufferRegion, BufferView, RegionRole};
use crate::error::GlbError;
use crate::mesh::{MeshAccessors, MeshRecord};
use crate::utils::compute_bounds;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;

/// primitive.mode for triangle lists
pub const TRIANGLES_MODE: u32 = 4;

/// Key of the single material every primitive references
pub const DEFAULT_MATERIAL: &str = "default_red";

/// Default asset.generator
pub const DEFAULT_GENERATOR: &str = "X3D to glTF-binary tool";

/// Extensions declared in `extensionsUsed`
pub const EXTENSIONS_USED: [&str; 2] = ["KHR_materials_common", "KHR_binary_glTF"];

/// Fixed normal accessor bounds (unit vectors)
pub const NORMAL_MIN: [f32; 3] = [-1.0, -1.0, -1.0];
pub const NORMAL_MAX: [f32; 3] = [1.0, 1.0, 1.0];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub generator: String,
    pub profile: Profile,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub api: String,
    pub version: String,
}

impl Asset {
    fn new(generator: &str) -> Self {
        Self {
            generator: generator.to_string(),
            profile: Profile {
                api: "WebGL".to_string(),
                version: "1.0.2".to_string(),
            },
            version: "1.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Primitive {
    pub attributes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indices: Option<String>,
    pub material: String,
    pub mode: u32,
}

impl From<&MeshAccessors> for Primitive {
    fn from(accessors: &MeshAccessors) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("POSITION".to_string(), accessors.positions.clone());
        if let Some(normals) = &accessors.normals {
            attributes.insert("NORMAL".to_string(), normals.clone());
        }

        Self {
            attributes,
            indices: accessors.indices.clone(),
            material: DEFAULT_MATERIAL.to_string(),
            mode: TRIANGLES_MODE,
        }
    }
}

/// KHR_materials_common material
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub extensions: MaterialExtensions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialExtensions {
    #[serde(rename = "KHR_materials_common")]
    pub materials_common: MaterialsCommon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialsCommon {
    pub double_sided: bool,
    pub technique: String,
    pub transparent: bool,
    pub values: MaterialValues,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialValues {
    pub emission: [f32; 4],
}

impl Material {
    /// Constant bright red, double sided, opaque
    pub fn default_red() -> Self {
        Self {
            extensions: MaterialExtensions {
                materials_common: MaterialsCommon {
                    double_sided: true,
                    technique: "CONSTANT".to_string(),
                    transparent: false,
                    values: MaterialValues {
                        emission: [1.0, 0.0, 0.0, 1.0],
                    },
                },
            },
        }
    }
}

/// Top-level JSON scene document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Root {
    pub asset: Asset,
    pub accessors: BTreeMap<String, Accessor>,
    pub buffer_views: BTreeMap<String, BufferView>,
    pub meshes: BTreeMap<String, Mesh>,
    pub materials: BTreeMap<String, Material>,
    pub extensions_used: Vec<String>,
}

/// Assembled document: JSON root plus the binary regions it describes
#[derive(Debug, Clone)]
pub struct Document {
    root: Root,
    regions: Vec<BufferRegion>,
}

impl Document {
    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Regions in payload order
    pub fn regions(&self) -> &[BufferRegion] {
        &self.regions
    }

    /// Compact JSON text as embedded in the container
    pub fn to_json_string(&self) -> Result<String, GlbError> {
        Ok(serde_json::to_string(&self.root)?)
    }

    /// Indented JSON for debugging, without padding or payload.
    ///
    /// Keys are sorted at every level and indented by four spaces.
    pub fn to_pretty_json(&self) -> Result<String, GlbError> {
        let sorted = serde_json::to_value(&self.root)?;
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        sorted.serialize(&mut serde_json::Serializer::with_formatter(&mut out, formatter))?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Total payload length in bytes
    pub fn binary_length(&self) -> usize {
        self.regions.iter().map(|r| r.data().len()).sum()
    }

    /// Concatenated region bytes
    pub fn binary_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.binary_length());
        for region in &self.regions {
            payload.extend_from_slice(region.data());
        }
        payload
    }
}

/// Builder packing meshes into one document
pub struct DocumentBuilder {
    vertex: BufferRegion,
    index: BufferRegion,
    accessors: BTreeMap<String, Accessor>,
    meshes: BTreeMap<String, Mesh>,
    generator: String,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self {
            vertex: BufferRegion::new(RegionRole::Vertex),
            index: BufferRegion::new(RegionRole::Index),
            accessors: BTreeMap::new(),
            meshes: BTreeMap::new(),
            generator: DEFAULT_GENERATOR.to_string(),
        }
    }

    /// Override asset.generator
    pub fn generator(mut self, generator: &str) -> Self {
        self.generator = generator.to_string();
        self
    }

    pub fn region(&self, role: RegionRole) -> &BufferRegion {
        match role {
            RegionRole::Vertex => &self.vertex,
            RegionRole::Index => &self.index,
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Pack one mesh and record its primitive.
    ///
    /// On error the builder must be discarded: a region may be left mid-write.
    pub fn add_mesh(&mut self, name: &str, mesh: &MeshRecord) -> Result<MeshAccessors, GlbError> {
        if self.meshes.contains_key(name) {
            return Err(GlbError::DuplicateMesh(name.to_string()));
        }
        let (min, max) = compute_bounds(mesh.points()).ok_or(GlbError::EmptyMesh)?;

        let accessor = pack_vec3(&mut self.vertex, mesh.points())?.with_bounds(min, max);
        let positions = self.insert_accessor(accessor);

        let normals = match mesh.normals() {
            Some(normals) => {
                let accessor =
                    pack_vec3(&mut self.vertex, normals)?.with_bounds(NORMAL_MIN, NORMAL_MAX);
                Some(self.insert_accessor(accessor))
            }
            None => None,
        };

        let indices = match mesh.indices() {
            Some(indices) => {
                // Declared range, not the observed one
                let last = mesh.points().len() as u32 - 1;
                let accessor = pack_indices(&mut self.index, indices)?.with_bounds([0u32], [last]);
                Some(self.insert_accessor(accessor))
            }
            None => None,
        };

        let accessors = MeshAccessors {
            positions,
            normals,
            indices,
        };
        tracing::debug!(
            "mesh {:?}: {} points, normals: {}, indices: {}",
            name,
            mesh.points().len(),
            accessors.normals.is_some(),
            mesh.indices().map_or(0, <[u32]>::len)
        );

        self.meshes.insert(
            name.to_string(),
            Mesh {
                primitives: vec![Primitive::from(&accessors)],
            },
        );
        Ok(accessors)
    }

    /// Pack every mesh in order, then build
    pub fn assemble<I, S>(mut self, meshes: I) -> Result<Document, GlbError>
    where
        I: IntoIterator<Item = (S, MeshRecord)>,
        S: Into<String>,
    {
        for (name, mesh) in meshes {
            let name = name.into();
            self.add_mesh(&name, &mesh)
                .map_err(|source| GlbError::Mesh {
                    name,
                    source: Box::new(source),
                })?;
        }
        self.build()
    }

    /// Finalize region offsets and produce the document
    pub fn build(self) -> Result<Document, GlbError> {
        let spans = finalize_offsets(&[&self.vertex, &self.index])?;
        let buffer_views = spans
            .into_iter()
            .map(|span| (span.role.key().to_string(), BufferView::from(span)))
            .collect();

        let mut materials = BTreeMap::new();
        materials.insert(DEFAULT_MATERIAL.to_string(), Material::default_red());

        let root = Root {
            asset: Asset::new(&self.generator),
            accessors: self.accessors,
            buffer_views,
            meshes: self.meshes,
            materials,
            extensions_used: EXTENSIONS_USED.iter().map(|e| e.to_string()).collect(),
        };

        Ok(Document {
            root,
            regions: vec![self.vertex, self.index],
        })
    }

    fn insert_accessor(&mut self, accessor: Accessor) -> String {
        let key = format!("accessor_{}", self.accessors.len());
        self.accessors.insert(key.clone(), accessor);
        key
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Assemble a document from named mesh records with default metadata
pub fn assemble<I, S>(meshes: I) -> Result<Document, GlbError>
where
    I: IntoIterator<Item = (S, MeshRecord)>,
    S: Into<String>,
{
    DocumentBuilder::new().assemble(meshes)
}

fn pack_vec3(region: &mut BufferRegion, data: &[[f32; 3]]) -> Result<Accessor, GlbError> {
    let handle = region.open_accessor()?;
    for item in data {
        region.write(&handle, &item.map(f64::from))?;
    }
    region.close_accessor(handle)
}

fn pack_indices(region: &mut BufferRegion, indices: &[u32]) -> Result<Accessor, GlbError> {
    let handle = region.open_accessor()?;
    for &ix in indices {
        region.write(&handle, &[f64::from(ix)])?;
    }
    region.close_accessor(handle)
}
