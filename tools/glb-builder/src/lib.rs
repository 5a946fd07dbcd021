//! Binary glTF (GLB v1) generation for the X3D export tool
//!
//! This library packs triangle-mesh geometry into a self-contained container:
//! - BufferRegion: Append-only binary regions with an open/write/close accessor lifecycle
//! - DocumentBuilder: Packs meshes and builds the JSON scene document
//! - assemble_glb / write_glb: Frame the document behind the 20-byte preamble
//! - read_glb: Parse a container back for verification
//!
//! # Example
//!
//! ```
//! use glb_builder::*;
//!
//! let mesh = MeshRecord::new(
//!     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
//!     None,
//!     Some(vec![0, 1, 2]),
//! )?;
//! let document = assemble([("tri0", mesh)])?;
//! let glb = assemble_glb(&document)?;
//!
//! let container = read_glb(&glb)?;
//! assert_eq!(container.binary.len(), 42);
//! # Ok::<(), GlbError>(())
//! ```

pub mod buffer;
pub mod document;
pub mod error;
pub mod glb;
pub mod mesh;
pub mod utils;

pub use buffer::{
    finalize_offsets, Accessor, AccessorHandle, AccessorType, BufferRegion, BufferView,
    ComponentType, ElementLayout, RegionRole, RegionSpan, Target,
};
pub use document::{assemble, Document, DocumentBuilder, Root};
pub use error::GlbError;
pub use glb::{assemble_glb, read_glb, write_glb, GlbContainer, GlbHeader};
pub use mesh::{MeshAccessors, MeshRecord};
pub use utils::{compute_bounds, pad_json};
