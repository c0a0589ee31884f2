//! Generic hierarchical document access
//!
//! The loaders only need a handful of capabilities from a parsed document:
//! child lookup by tag, attribute lookup and text content. They are written
//! against `DocumentNode` so the concrete parser can be swapped. `XmlNode` is
//! the implementation provided here, built from XML text with xml-rs.
mod xml_node;

// Re-exports
pub use xml_node::XmlNode;

/// Capability set of one element in a tag/attribute/child-list tree
pub trait DocumentNode {
    /// Tag name of this element
    fn tag(&self) -> &str;

    /// Value of the named attribute, if present
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Text content, if any
    fn text(&self) -> Option<&str>;

    /// All direct children with the given tag, in document order
    fn children(&self, tag: &str) -> Vec<&Self>;

    /// First direct child with the given tag
    fn child(&self, tag: &str) -> Option<&Self> {
        self.children(tag).into_iter().next()
    }

    /// First direct child with the given tag whose attribute has the given
    /// value, e.g. `source` with `id="Hips-output"`
    fn child_with_attribute(
        &self,
        tag: &str,
        attribute: &str,
        value: &str,
    ) -> Option<&Self> {
        self.children(tag)
            .into_iter()
            .find(|node| node.attribute(attribute) == Some(value))
    }
}
