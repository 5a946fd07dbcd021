//! Binary buffer regions with an explicit accessor lifecycle
//!
//! The binary payload is made of two append-only regions: one float3 region
//! shared by positions and normals, and one u16 region for indices. Each region
//! is either idle or writing exactly one accessor:
//!
//! ```text
//! Idle --open_accessor--> Writing --close_accessor--> Idle
//! ```
//!
//! Writes are only accepted through the handle of the currently open accessor.

use crate::error::GlbError;
use serde::Serialize;

/// bufferView.target for vertex attributes
pub const ARRAY_BUFFER: u32 = 34962;
/// bufferView.target for element indices
pub const ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// accessor.componentType for u16
pub const UNSIGNED_SHORT: u32 = 5123;
/// accessor.componentType for f32
pub const FLOAT: u32 = 5126;

/// Buffer every bufferView points at when embedded with KHR_binary_glTF
pub const BINARY_BUFFER: &str = "binary_glTF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u32")]
pub enum ComponentType {
    UnsignedShort,
    Float,
}

impl From<ComponentType> for u32 {
    fn from(value: ComponentType) -> Self {
        match value {
            ComponentType::UnsignedShort => UNSIGNED_SHORT,
            ComponentType::Float => FLOAT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AccessorType {
    #[serde(rename = "SCALAR")]
    Scalar,
    #[serde(rename = "VEC3")]
    Vec3,
}

impl AccessorType {
    /// Number of components per element
    pub const fn components(self) -> usize {
        match self {
            AccessorType::Scalar => 1,
            AccessorType::Vec3 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u32")]
pub enum Target {
    ArrayBuffer,
    ElementArrayBuffer,
}

impl From<Target> for u32 {
    fn from(value: Target) -> Self {
        match value {
            Target::ArrayBuffer => ARRAY_BUFFER,
            Target::ElementArrayBuffer => ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// Fixed binary layout of one region's elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLayout {
    pub component_type: ComponentType,
    pub type_: AccessorType,
    pub byte_stride: u32,
    pub target: Target,
}

/// Data role of a region, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegionRole {
    /// Positions and normals (float3, 12-byte stride)
    Vertex,
    /// Triangle indices (u16, 2-byte stride)
    Index,
}

impl RegionRole {
    /// Both roles, in the order their bytes appear in the payload
    pub const ALL: [RegionRole; 2] = [RegionRole::Vertex, RegionRole::Index];

    pub const fn layout(self) -> ElementLayout {
        match self {
            RegionRole::Vertex => ElementLayout {
                component_type: ComponentType::Float,
                type_: AccessorType::Vec3,
                byte_stride: 12,
                target: Target::ArrayBuffer,
            },
            RegionRole::Index => ElementLayout {
                component_type: ComponentType::UnsignedShort,
                type_: AccessorType::Scalar,
                byte_stride: 2,
                target: Target::ElementArrayBuffer,
            },
        }
    }

    /// bufferView key in the JSON document
    pub const fn key(self) -> &'static str {
        match self {
            RegionRole::Vertex => "bufferView_0",
            RegionRole::Index => "bufferView_1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegionState {
    Idle,
    Writing { id: u32, byte_offset: u32, count: u32 },
}

/// Handle to the accessor currently open on a region.
///
/// Consumed by [`BufferRegion::close_accessor`], so a closed accessor can
/// never be written again.
#[derive(Debug, PartialEq, Eq)]
pub struct AccessorHandle {
    role: RegionRole,
    id: u32,
}

impl AccessorHandle {
    pub fn role(&self) -> RegionRole {
        self.role
    }
}

/// Sealed accessor metadata as it appears under `accessors` in the document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessor {
    pub buffer_view: String,
    pub byte_offset: u32,
    #[serde(rename = "type")]
    pub type_: AccessorType,
    pub component_type: ComponentType,
    pub byte_stride: u32,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Vec<serde_json::Value>>,
}

impl Accessor {
    /// Attach min/max bounds
    pub fn with_bounds<T, I>(mut self, min: I, max: I) -> Self
    where
        T: Into<serde_json::Value>,
        I: IntoIterator<Item = T>,
    {
        self.min = Some(min.into_iter().map(Into::into).collect());
        self.max = Some(max.into_iter().map(Into::into).collect());
        self
    }
}

/// Final placement of a region inside the binary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSpan {
    pub role: RegionRole,
    pub byte_offset: u32,
    pub byte_length: u32,
}

/// bufferView entry in the document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: String,
    pub target: Target,
    pub byte_offset: u32,
    pub byte_length: u32,
}

impl From<RegionSpan> for BufferView {
    fn from(span: RegionSpan) -> Self {
        Self {
            buffer: BINARY_BUFFER.to_string(),
            target: span.role.layout().target,
            byte_offset: span.byte_offset,
            byte_length: span.byte_length,
        }
    }
}

/// Append-only byte region for one data role
#[derive(Debug, Clone)]
pub struct BufferRegion {
    role: RegionRole,
    bytes: Vec<u8>,
    state: RegionState,
    opened: u32,
}

impl BufferRegion {
    pub fn new(role: RegionRole) -> Self {
        Self {
            role,
            bytes: Vec::new(),
            state: RegionState::Idle,
            opened: 0,
        }
    }

    pub fn role(&self) -> RegionRole {
        self.role
    }

    pub fn layout(&self) -> ElementLayout {
        self.role.layout()
    }

    /// Raw bytes written so far
    pub fn data(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether an accessor is currently open
    pub fn is_writing(&self) -> bool {
        matches!(self.state, RegionState::Writing { .. })
    }

    /// Current total bytes written
    pub fn byte_length(&self) -> Result<u32, GlbError> {
        u32::try_from(self.bytes.len())
            .map_err(|_| GlbError::ContainerTooLarge(self.bytes.len() as u64))
    }

    /// Begin a new accessor at the current end of the region
    pub fn open_accessor(&mut self) -> Result<AccessorHandle, GlbError> {
        if self.is_writing() {
            return Err(self.state_error("an accessor is already open"));
        }

        let id = self.opened;
        self.opened += 1;
        self.state = RegionState::Writing {
            id,
            byte_offset: self.byte_length()?,
            count: 0,
        };

        Ok(AccessorHandle {
            role: self.role,
            id,
        })
    }

    /// Append one element to the open accessor
    pub fn write(&mut self, handle: &AccessorHandle, values: &[f64]) -> Result<(), GlbError> {
        self.check_handle(handle)?;

        let layout = self.layout();
        let expected = layout.type_.components();
        if values.len() != expected {
            return Err(GlbError::Shape {
                expected,
                actual: values.len(),
            });
        }

        match layout.component_type {
            ComponentType::Float => {
                if let Some(&bad) = values.iter().find(|&&v| !(v as f32).is_finite()) {
                    return Err(GlbError::NonFinite(bad));
                }
                for &value in values {
                    self.bytes.extend_from_slice(&(value as f32).to_le_bytes());
                }
            }
            ComponentType::UnsignedShort => {
                for &value in values {
                    if value.fract() != 0.0 || !(0.0..=u16::MAX as f64).contains(&value) {
                        return Err(GlbError::Range(value));
                    }
                    self.bytes.extend_from_slice(&(value as u16).to_le_bytes());
                }
            }
        }

        if let RegionState::Writing { count, .. } = &mut self.state {
            *count += 1;
        }
        Ok(())
    }

    /// Seal the open accessor and return its metadata (without bounds)
    pub fn close_accessor(&mut self, handle: AccessorHandle) -> Result<Accessor, GlbError> {
        self.check_handle(&handle)?;

        let RegionState::Writing {
            byte_offset, count, ..
        } = self.state
        else {
            return Err(self.state_error("no accessor is open"));
        };
        self.state = RegionState::Idle;

        let layout = self.layout();
        Ok(Accessor {
            buffer_view: self.role.key().to_string(),
            byte_offset,
            type_: layout.type_,
            component_type: layout.component_type,
            byte_stride: layout.byte_stride,
            count,
            min: None,
            max: None,
        })
    }

    fn check_handle(&self, handle: &AccessorHandle) -> Result<(), GlbError> {
        match self.state {
            RegionState::Writing { id, .. } if handle.role == self.role && handle.id == id => Ok(()),
            RegionState::Writing { .. } => {
                Err(self.state_error("handle does not belong to the open accessor"))
            }
            RegionState::Idle => Err(self.state_error("no accessor is open")),
        }
    }

    fn state_error(&self, message: &'static str) -> GlbError {
        GlbError::State {
            region: self.role.key(),
            message,
        }
    }
}

/// Assign payload offsets as the running sum of prior region lengths.
///
/// Regions must be idle; offsets follow the slice order.
pub fn finalize_offsets(regions: &[&BufferRegion]) -> Result<Vec<RegionSpan>, GlbError> {
    let mut offset: u64 = 0;
    let mut spans = Vec::with_capacity(regions.len());

    for region in regions {
        if region.is_writing() {
            return Err(region.state_error("cannot finalize while an accessor is open"));
        }

        let byte_length = region.byte_length()?;
        let byte_offset = u32::try_from(offset).map_err(|_| GlbError::ContainerTooLarge(offset))?;
        spans.push(RegionSpan {
            role: region.role,
            byte_offset,
            byte_length,
        });
        offset += u64::from(byte_length);
    }

    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_region_packs_little_endian_f32() {
        let mut region = BufferRegion::new(RegionRole::Vertex);
        let handle = region.open_accessor().unwrap();
        region.write(&handle, &[1.0, -2.0, 0.5]).unwrap();
        let accessor = region.close_accessor(handle).unwrap();

        assert_eq!(accessor.count, 1);
        assert_eq!(accessor.byte_offset, 0);
        assert_eq!(accessor.byte_stride, 12);
        assert_eq!(region.byte_length().unwrap(), 12);
        assert_eq!(&region.data()[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&region.data()[4..8], &(-2.0f32).to_le_bytes());
        assert_eq!(&region.data()[8..12], &0.5f32.to_le_bytes());
    }

    #[test]
    fn test_second_accessor_starts_at_region_end() {
        let mut region = BufferRegion::new(RegionRole::Vertex);
        let first = region.open_accessor().unwrap();
        for _ in 0..3 {
            region.write(&first, &[0.0, 0.0, 0.0]).unwrap();
        }
        region.close_accessor(first).unwrap();

        let second = region.open_accessor().unwrap();
        region.write(&second, &[0.0, 0.0, 1.0]).unwrap();
        let accessor = region.close_accessor(second).unwrap();

        assert_eq!(accessor.byte_offset, 36);
        assert_eq!(accessor.count, 1);
    }

    #[test]
    fn test_index_region_packs_u16() {
        let mut region = BufferRegion::new(RegionRole::Index);
        let handle = region.open_accessor().unwrap();
        for ix in [0.0, 1.0, 65535.0] {
            region.write(&handle, &[ix]).unwrap();
        }
        let accessor = region.close_accessor(handle).unwrap();

        assert_eq!(accessor.count, 3);
        assert_eq!(accessor.type_, AccessorType::Scalar);
        assert_eq!(accessor.component_type, ComponentType::UnsignedShort);
        assert_eq!(region.data(), &[0, 0, 1, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn test_index_out_of_range() {
        let mut region = BufferRegion::new(RegionRole::Index);
        let handle = region.open_accessor().unwrap();

        assert!(matches!(region.write(&handle, &[65536.0]), Err(GlbError::Range(_))));
        assert!(matches!(region.write(&handle, &[-1.0]), Err(GlbError::Range(_))));
        assert!(matches!(region.write(&handle, &[1.5]), Err(GlbError::Range(_))));
        assert!(region.data().is_empty());
    }

    #[test]
    fn test_vertex_rejects_non_finite() {
        let mut region = BufferRegion::new(RegionRole::Vertex);
        let handle = region.open_accessor().unwrap();

        assert!(matches!(
            region.write(&handle, &[1.0, 1e39, 0.0]),
            Err(GlbError::NonFinite(v)) if v == 1e39
        ));
        assert!(matches!(
            region.write(&handle, &[0.0, 0.0, f64::NAN]),
            Err(GlbError::NonFinite(v)) if v.is_nan()
        ));
        assert!(matches!(
            region.write(&handle, &[f64::NEG_INFINITY, 0.0, 0.0]),
            Err(GlbError::NonFinite(_))
        ));
        assert!(region.data().is_empty());

        region.write(&handle, &[f64::from(f32::MAX), 0.0, 0.0]).unwrap();
        assert_eq!(region.data().len(), 12);
    }

    #[test]
    fn test_arity_mismatch() {
        let mut vertex = BufferRegion::new(RegionRole::Vertex);
        let handle = vertex.open_accessor().unwrap();
        assert!(matches!(
            vertex.write(&handle, &[1.0, 2.0]),
            Err(GlbError::Shape {
                expected: 3,
                actual: 2
            })
        ));

        let mut index = BufferRegion::new(RegionRole::Index);
        let handle = index.open_accessor().unwrap();
        assert!(matches!(
            index.write(&handle, &[1.0, 2.0, 3.0]),
            Err(GlbError::Shape {
                expected: 1,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_open_while_open_fails() {
        let mut region = BufferRegion::new(RegionRole::Vertex);
        let _handle = region.open_accessor().unwrap();

        assert!(matches!(
            region.open_accessor(),
            Err(GlbError::State { region: "bufferView_0", .. })
        ));
    }

    #[test]
    fn test_regions_are_independent() {
        let mut vertex = BufferRegion::new(RegionRole::Vertex);
        let mut index = BufferRegion::new(RegionRole::Index);

        let v = vertex.open_accessor().unwrap();
        let i = index.open_accessor().unwrap();
        vertex.write(&v, &[0.0, 0.0, 0.0]).unwrap();
        index.write(&i, &[0.0]).unwrap();

        assert!(vertex.close_accessor(v).is_ok());
        assert!(index.close_accessor(i).is_ok());
    }

    #[test]
    fn test_foreign_handle_rejected() {
        let mut vertex = BufferRegion::new(RegionRole::Vertex);
        let mut index = BufferRegion::new(RegionRole::Index);
        let _v = vertex.open_accessor().unwrap();
        let i = index.open_accessor().unwrap();

        assert!(matches!(
            vertex.write(&i, &[0.0, 0.0, 0.0]),
            Err(GlbError::State { .. })
        ));
    }

    #[test]
    fn test_write_after_reopen_requires_new_handle() {
        let mut region = BufferRegion::new(RegionRole::Index);
        let first = region.open_accessor().unwrap();
        let stale = AccessorHandle {
            role: first.role,
            id: first.id,
        };
        region.close_accessor(first).unwrap();

        assert!(matches!(region.write(&stale, &[0.0]), Err(GlbError::State { .. })));

        let _second = region.open_accessor().unwrap();
        assert!(matches!(region.write(&stale, &[0.0]), Err(GlbError::State { .. })));
    }

    #[test]
    fn test_finalize_offsets_running_sum() {
        let mut vertex = BufferRegion::new(RegionRole::Vertex);
        let handle = vertex.open_accessor().unwrap();
        for _ in 0..3 {
            vertex.write(&handle, &[0.0, 0.0, 0.0]).unwrap();
        }
        vertex.close_accessor(handle).unwrap();

        let mut index = BufferRegion::new(RegionRole::Index);
        let handle = index.open_accessor().unwrap();
        for ix in 0..3 {
            index.write(&handle, &[f64::from(ix)]).unwrap();
        }
        index.close_accessor(handle).unwrap();

        let spans = finalize_offsets(&[&vertex, &index]).unwrap();
        assert_eq!(
            spans,
            vec![
                RegionSpan {
                    role: RegionRole::Vertex,
                    byte_offset: 0,
                    byte_length: 36
                },
                RegionSpan {
                    role: RegionRole::Index,
                    byte_offset: 36,
                    byte_length: 6
                },
            ]
        );
    }

    #[test]
    fn test_finalize_rejects_open_region() {
        let mut vertex = BufferRegion::new(RegionRole::Vertex);
        let index = BufferRegion::new(RegionRole::Index);
        let _handle = vertex.open_accessor().unwrap();

        assert!(matches!(
            finalize_offsets(&[&vertex, &index]),
            Err(GlbError::State { .. })
        ));
    }

    #[test]
    fn test_accessor_json_shape() {
        let accessor = Accessor {
            buffer_view: "bufferView_1".to_string(),
            byte_offset: 4,
            type_: AccessorType::Scalar,
            component_type: ComponentType::UnsignedShort,
            byte_stride: 2,
            count: 3,
            min: None,
            max: None,
        }
        .with_bounds([0u32], [2u32]);

        let value = serde_json::to_value(&accessor).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "bufferView": "bufferView_1",
                "byteOffset": 4,
                "type": "SCALAR",
                "componentType": 5123,
                "byteStride": 2,
                "count": 3,
                "min": [0],
                "max": [2],
            })
        );
    }
}
