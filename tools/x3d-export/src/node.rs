//! Minimal query surface over parsed XML elements
//!
//! The extractor only needs "find child element by tag" and "read attribute",
//! so any tree can be plugged in by implementing [`MeshNode`].

use crate::error::ExportError;

pub trait MeshNode: Sized {
    /// Local tag name, used in error context
    fn tag(&self) -> &str;

    /// First direct child element with the given tag
    fn find_child(&self, tag: &str) -> Option<Self>;

    fn attribute(&self, name: &str) -> Option<&str>;
}

impl<'a, 'input: 'a> MeshNode for roxmltree::Node<'a, 'input> {
    fn tag(&self) -> &str {
        self.tag_name().name()
    }

    fn find_child(&self, tag: &str) -> Option<Self> {
        self.children()
            .find(|child| child.is_element() && child.tag_name().name() == tag)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        roxmltree::Node::attribute(self, name)
    }
}

/// Where meshes live in an input document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshSelector {
    /// Tag of the wrapper element around each mesh node
    pub mesh_tag: String,
    /// Wrapper attribute holding the mesh name
    pub name_attribute: String,
}

impl Default for MeshSelector {
    fn default() -> Self {
        Self {
            mesh_tag: "mesh".to_string(),
            name_attribute: "name".to_string(),
        }
    }
}

/// Collect `(name, node)` pairs from the children of the document root.
///
/// Each wrapper's first child element is the mesh node. Wrappers without a
/// name are called `mesh_<position>`.
pub fn meshes_from_document<'a, 'input>(
    document: &'a roxmltree::Document<'input>,
    selector: &MeshSelector,
) -> Result<Vec<(String, roxmltree::Node<'a, 'input>)>, ExportError> {
    let wrappers = document
        .root_element()
        .children()
        .filter(|child| child.is_element() && child.tag_name().name() == selector.mesh_tag);

    let mut meshes = Vec::new();
    for (position, wrapper) in wrappers.enumerate() {
        let name = match wrapper.attribute(selector.name_attribute.as_str()) {
            Some(name) => name.to_string(),
            None => {
                let name = format!("mesh_{position}");
                tracing::warn!(
                    "<{}> without {:?} attribute, using {:?}",
                    selector.mesh_tag,
                    selector.name_attribute,
                    name
                );
                name
            }
        };

        let node = wrapper.first_element_child().ok_or_else(|| {
            ExportError::MissingData(format!("<{}> has no mesh element", selector.mesh_tag))
                .in_mesh(&name)
        })?;
        meshes.push((name, node));
    }

    Ok(meshes)
}
