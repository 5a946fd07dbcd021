//! Error type for X3D parsing and mesh extraction

use glb_builder::GlbError;

/// Errors raised while reading X3D input or converting it.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Token that is not a number
    #[error("unable to parse {token:?} as a number")]
    Parse { token: String },

    /// Vector list whose length is not a multiple of its dimension
    #[error("vector encoding of incorrect length {count} for dimension {dimension}")]
    Shape { count: usize, dimension: usize },

    /// Required element or attribute absent
    #[error("{0}")]
    MissingData(String),

    /// Failure inside one named mesh
    #[error("mesh {name:?}: {source}")]
    Mesh {
        name: String,
        #[source]
        source: Box<ExportError>,
    },

    #[error(transparent)]
    Glb(#[from] GlbError),

    #[error("XML parse failed: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Attach the name of the mesh being processed
    pub fn in_mesh(self, name: &str) -> Self {
        ExportError::Mesh {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}
