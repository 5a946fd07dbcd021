//! Error type for buffer packing, document assembly and container framing

/// Errors raised while packing geometry or framing a GLB container.
///
/// Every variant aborts the conversion; no partial container is produced.
#[derive(Debug, thiserror::Error)]
pub enum GlbError {
    /// Tuple arity does not match the region's element layout
    #[error("tuple of {actual} values does not match the {expected}-component element layout")]
    Shape { expected: usize, actual: usize },

    /// Index value outside the u16 storage range
    #[error("index value {0} is not representable as an unsigned 16-bit integer")]
    Range(f64),

    /// Vertex component that is not a finite f32 (NaN, infinite, or overflowing)
    #[error("vertex component {0} is not a finite 32-bit float")]
    NonFinite(f64),

    /// Accessor lifecycle violated on a region
    #[error("{region}: {message}")]
    State {
        region: &'static str,
        message: &'static str,
    },

    /// Mesh without points (bounds are undefined)
    #[error("mesh has no points, position bounds are undefined")]
    EmptyMesh,

    /// Two meshes share one name
    #[error("mesh name {0:?} is used more than once")]
    DuplicateMesh(String),

    /// Normals present but not one per point
    #[error("mesh has {points} points but {normals} normals")]
    NormalCountMismatch { points: usize, normals: usize },

    /// A length does not fit a u32 container field
    #[error("{0} bytes exceeds the 32-bit container length limit")]
    ContainerTooLarge(u64),

    /// Container bytes failed validation on read-back
    #[error("invalid GLB container: {0}")]
    InvalidContainer(String),

    /// Failure inside one named mesh
    #[error("mesh {name:?}: {source}")]
    Mesh {
        name: String,
        #[source]
        source: Box<GlbError>,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GlbError {
    /// The innermost error, skipping mesh context wrappers
    pub fn root_cause(&self) -> &GlbError {
        match self {
            GlbError::Mesh { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
