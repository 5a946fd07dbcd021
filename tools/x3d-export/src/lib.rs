//! x3d-export library
//!
//! Converts X3D triangle-set geometry into binary glTF containers. Provides
//! conversion functions for use by other tools as well as the CLI.

pub mod convert;
pub mod error;
pub mod manifest;
pub mod mesh;
pub mod node;
pub mod vector;

// Re-export key types for conversion
pub use convert::{convert_x3d, convert_x3d_to_memory, generate_glb, ConvertOptions};
pub use error::ExportError;
pub use mesh::extract_mesh;
pub use node::{meshes_from_document, MeshNode, MeshSelector};
pub use vector::{parse_index_list, parse_mfvec2f, parse_mfvec3f, parse_vector};

// Re-export container types from glb-builder
pub use glb_builder::{
    assemble_glb, read_glb, Document, GlbContainer, GlbError, GlbHeader, MeshRecord,
};
