use super::DocumentNode;
use crate::{arm_error::ArmError, collada_import::ImportError};
use ahash::{HashMap, HashMapExt};
use std::io::Read;
use xml::reader::{ParserConfig, XmlEvent};

#[allow(unused_imports)]
use log::{debug, trace};

/// Owned in-memory element of an XML document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlNode {
    tag: String,
    attributes: HashMap<String, String>,
    text: Option<String>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            attributes: HashMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_owned());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    pub fn add_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Every direct child regardless of tag
    #[must_use]
    pub fn all_children(&self) -> &[Self] {
        &self.children
    }

    /// Parses XML text into a tree and returns the root element. Whitespace
    /// around text is trimmed and CDATA is treated as ordinary text. Namespace
    /// prefixes are dropped so tags and attributes are matched by local name.
    ///
    /// # Errors
    /// May return `ArmError`
    pub fn parse<R: Read>(source: R) -> Result<Self, ArmError> {
        let reader = ParserConfig::new()
            .trim_whitespace(true)
            .cdata_to_characters(true)
            .create_reader(source);

        // Elements still waiting for their end tag
        let mut open: Vec<Self> = Vec::new();
        let mut root = None;

        for event in reader {
            match event? {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    let mut node = Self::new(&name.local_name);
                    for attribute in attributes {
                        node.attributes
                            .insert(attribute.name.local_name, attribute.value);
                    }
                    open.push(node);
                }
                XmlEvent::EndElement { name } => {
                    let Some(node) = open.pop() else {
                        return Err(
                            ImportError::MalformedXml(name.local_name).into()
                        );
                    };
                    trace!("closed <{}>", node.tag);
                    if let Some(parent) = open.last_mut() {
                        parent.children.push(node);
                    } else {
                        root = Some(node);
                    }
                }
                XmlEvent::Characters(data) => {
                    if let Some(node) = open.last_mut() {
                        // Text interrupted by a comment arrives in pieces.
                        // Keep the pieces apart so numbers don't run together.
                        match node.text.as_mut() {
                            Some(text) => {
                                text.push(' ');
                                text.push_str(&data);
                            }
                            None => node.text = Some(data),
                        }
                    }
                }
                _ => {}
            }
        }

        let root = root.ok_or(ImportError::EmptyDocument)?;
        debug!("parsed document root=<{}>", root.tag);
        Ok(root)
    }

    /// Convenience wrapper around `parse` for XML held in a string
    ///
    /// # Errors
    /// May return `ArmError`
    pub fn parse_str(source: &str) -> Result<Self, ArmError> {
        Self::parse(source.as_bytes())
    }
}

impl DocumentNode for XmlNode {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn children(&self, tag: &str) -> Vec<&Self> {
        self.children.iter().filter(|c| c.tag == tag).collect()
    }

    fn child(&self, tag: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.tag == tag)
    }
}
