//! In-memory mesh records handed to the document assembler

use crate::error::GlbError;

/// Geometry extracted from one input mesh node.
///
/// Immutable once constructed. Normals, when present, hold exactly one
/// vector per point. Index values are not checked against the point count.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshRecord {
    points: Vec<[f32; 3]>,
    normals: Option<Vec<[f32; 3]>>,
    indices: Option<Vec<u32>>,
}

impl MeshRecord {
    pub fn new(
        points: Vec<[f32; 3]>,
        normals: Option<Vec<[f32; 3]>>,
        indices: Option<Vec<u32>>,
    ) -> Result<Self, GlbError> {
        if let Some(normals) = &normals {
            if normals.len() != points.len() {
                return Err(GlbError::NormalCountMismatch {
                    points: points.len(),
                    normals: normals.len(),
                });
            }
        }

        Ok(Self {
            points,
            normals,
            indices,
        })
    }

    pub fn points(&self) -> &[[f32; 3]] {
        &self.points
    }

    pub fn normals(&self) -> Option<&[[f32; 3]]> {
        self.normals.as_deref()
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.indices.as_deref()
    }
}

/// Accessor keys produced for one mesh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshAccessors {
    pub positions: String,
    pub normals: Option<String>,
    pub indices: Option<String>,
}
