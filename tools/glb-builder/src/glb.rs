//! Binary glTF (version 1) container framing
//!
//! Layout: 20-byte little-endian preamble, space-padded JSON content, then
//! the binary regions in declaration order.

use crate::document::Document;
use crate::error::GlbError;
use crate::utils::pad_json;
use std::io::Write;

pub const GLB_MAGIC: [u8; 4] = *b"glTF";
pub const GLB_VERSION: u32 = 1;
pub const PREAMBLE_LENGTH: usize = 20;
/// contentFormat value for JSON content
pub const CONTENT_FORMAT_JSON: u32 = 0;

/// The five preamble fields (magic is implied)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbHeader {
    pub version: u32,
    pub total_length: u32,
    pub content_length: u32,
    pub content_format: u32,
}

impl GlbHeader {
    pub fn to_bytes(&self) -> [u8; PREAMBLE_LENGTH] {
        let mut bytes = [0u8; PREAMBLE_LENGTH];
        bytes[0..4].copy_from_slice(&GLB_MAGIC);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.total_length.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.content_length.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.content_format.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GlbError> {
        if bytes.len() < PREAMBLE_LENGTH {
            return Err(GlbError::InvalidContainer(format!(
                "{} bytes is shorter than the {PREAMBLE_LENGTH}-byte preamble",
                bytes.len()
            )));
        }
        if bytes[0..4] != GLB_MAGIC {
            return Err(GlbError::InvalidContainer("bad magic".to_string()));
        }

        let field = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Ok(Self {
            version: field(4),
            total_length: field(8),
            content_length: field(12),
            content_format: field(16),
        })
    }
}

/// Borrowed view of a parsed container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbContainer<'a> {
    pub header: GlbHeader,
    /// JSON content with trailing pad spaces removed
    pub json: &'a str,
    pub binary: &'a [u8],
}

/// Frame a document as a complete GLB byte stream
pub fn assemble_glb(document: &Document) -> Result<Vec<u8>, GlbError> {
    let content = pad_json(document.to_json_string()?);
    let binary_length = document.binary_length();
    let total = PREAMBLE_LENGTH + content.len() + binary_length;

    let header = GlbHeader {
        version: GLB_VERSION,
        total_length: u32::try_from(total).map_err(|_| GlbError::ContainerTooLarge(total as u64))?,
        content_length: u32::try_from(content.len())
            .map_err(|_| GlbError::ContainerTooLarge(content.len() as u64))?,
        content_format: CONTENT_FORMAT_JSON,
    };
    tracing::debug!(
        "preamble: magic glTF; version {}; length {}; contentLength {}; contentFormat {}",
        header.version,
        header.total_length,
        header.content_length,
        header.content_format
    );
    tracing::debug!("final buffer size: {}", binary_length);

    let mut glb = Vec::with_capacity(total);
    glb.extend_from_slice(&header.to_bytes());
    glb.extend_from_slice(&content);
    for region in document.regions() {
        glb.extend_from_slice(region.data());
    }

    debug_assert_eq!(glb.len(), total);
    Ok(glb)
}

/// Write the container to `out`, and the indented JSON to `json_sink` if given.
///
/// The container is framed in memory first, so a failure never leaves a
/// partial container in `out`.
pub fn write_glb<W: Write>(
    document: &Document,
    json_sink: Option<&mut dyn Write>,
    out: &mut W,
) -> Result<GlbHeader, GlbError> {
    let glb = assemble_glb(document)?;

    if let Some(sink) = json_sink {
        sink.write_all(document.to_pretty_json()?.as_bytes())?;
    }

    out.write_all(&glb)?;
    GlbHeader::from_bytes(&glb)
}

/// Parse and validate a container produced by [`assemble_glb`]
pub fn read_glb(bytes: &[u8]) -> Result<GlbContainer<'_>, GlbError> {
    let header = GlbHeader::from_bytes(bytes)?;

    if header.version != GLB_VERSION {
        return Err(GlbError::InvalidContainer(format!(
            "unsupported version {}",
            header.version
        )));
    }
    if header.content_format != CONTENT_FORMAT_JSON {
        return Err(GlbError::InvalidContainer(format!(
            "unsupported content format {}",
            header.content_format
        )));
    }
    if header.total_length as usize != bytes.len() {
        return Err(GlbError::InvalidContainer(format!(
            "declared length {} but container holds {} bytes",
            header.total_length,
            bytes.len()
        )));
    }

    let content_end = PREAMBLE_LENGTH + header.content_length as usize;
    let content = bytes
        .get(PREAMBLE_LENGTH..content_end)
        .ok_or_else(|| GlbError::InvalidContainer("content runs past end of file".to_string()))?;
    let json = std::str::from_utf8(content)
        .map_err(|e| GlbError::InvalidContainer(format!("content is not UTF-8: {e}")))?;

    Ok(GlbContainer {
        header,
        json: json.trim_end_matches(' '),
        binary: &bytes[content_end..],
    })
}
