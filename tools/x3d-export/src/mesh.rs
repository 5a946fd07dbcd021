//! Mesh extraction from X3D triangle-set nodes

use crate::error::ExportError;
use crate::node::MeshNode;
use crate::vector::{parse_index_list, parse_mfvec3f};
use glb_builder::MeshRecord;

pub const COORDINATE_TAG: &str = "Coordinate";
pub const POINT_ATTRIBUTE: &str = "point";
pub const NORMAL_TAG: &str = "Normal";
pub const VECTOR_ATTRIBUTE: &str = "vector";
pub const INDEX_ATTRIBUTE: &str = "index";

/// Read coordinates, optional normals and optional indices from one mesh node.
///
/// Index values are not checked against the point count.
pub fn extract_mesh<N: MeshNode>(node: &N) -> Result<MeshRecord, ExportError> {
    let coordinate = node
        .find_child(COORDINATE_TAG)
        .ok_or_else(|| missing_coordinates(node))?;
    let point_text = coordinate
        .attribute(POINT_ATTRIBUTE)
        .ok_or_else(|| missing_coordinates(node))?;
    let points = to_f32(parse_mfvec3f(point_text)?);

    let normals = match node.find_child(NORMAL_TAG) {
        Some(normal) => {
            let vector_text = normal.attribute(VECTOR_ATTRIBUTE).ok_or_else(|| {
                ExportError::MissingData(format!(
                    "{NORMAL_TAG} element of <{}> has no {VECTOR_ATTRIBUTE} attribute",
                    node.tag()
                ))
            })?;
            Some(to_f32(parse_mfvec3f(vector_text)?))
        }
        None => None,
    };

    let indices = node
        .attribute(INDEX_ATTRIBUTE)
        .map(parse_index_list)
        .transpose()?;

    Ok(MeshRecord::new(points, normals, indices)?)
}

fn missing_coordinates<N: MeshNode>(node: &N) -> ExportError {
    ExportError::MissingData(format!(
        "coordinate data required: <{}> has no {COORDINATE_TAG}/@{POINT_ATTRIBUTE}",
        node.tag()
    ))
}

fn to_f32(vectors: Vec<[f64; 3]>) -> Vec<[f32; 3]> {
    vectors
        .into_iter()
        .map(|v| v.map(|c| c as f32))
        .collect()
}
