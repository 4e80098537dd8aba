//! Minimal XML element tree with an exclusive canonical serializer
//!
//! Output follows Exclusive XML Canonicalization (without comments) for the
//! documents this crate builds: namespace declarations appear on the first
//! element that visibly uses the prefix, declarations come before attributes,
//! attributes are sorted by name, empty elements get explicit end tags and
//! text/attribute values use the canonical escapes. Serializing a subtree on
//! its own therefore yields exactly its canonical form.

use std::borrow::Cow;
use std::collections::BTreeMap;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::Writer;

use super::FederationError;

pub const SAML_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";
pub const SAMLP_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";
pub const DSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// Namespace bound to a known prefix
pub fn namespace_for(prefix: &str) -> Option<&'static str> {
	match prefix {
		"saml" => Some(SAML_NS),
		"samlp" => Some(SAMLP_NS),
		"ds" => Some(DSIG_NS),
		_ => None,
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
	Element(XmlElement),
	Text(String),
}

/// Element with a qualified name (`prefix:Local` or `Local`)
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
	pub name: String,
	pub attributes: Vec<(String, String)>,
	pub children: Vec<XmlNode>,
}

impl XmlElement {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			attributes: Vec::new(),
			children: Vec::new(),
		}
	}

	pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.push((name.into(), value.into()));
		self
	}

	pub fn child(mut self, child: XmlElement) -> Self {
		self.children.push(XmlNode::Element(child));
		self
	}

	pub fn children(mut self, children: impl IntoIterator<Item = XmlElement>) -> Self {
		self.children
			.extend(children.into_iter().map(XmlNode::Element));
		self
	}

	pub fn text(mut self, text: impl Into<String>) -> Self {
		self.children.push(XmlNode::Text(text.into()));
		self
	}

	pub fn prefix(&self) -> Option<&str> {
		self.name.split_once(':').map(|(prefix, _)| prefix)
	}

	pub fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|(key, _)| key == name)
			.map(|(_, value)| value.as_str())
	}

	/// Direct child elements
	pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
		self.children.iter().filter_map(|node| match node {
			XmlNode::Element(element) => Some(element),
			XmlNode::Text(_) => None,
		})
	}

	pub fn find_child(&self, name: &str) -> Option<&XmlElement> {
		self.elements().find(|element| element.name == name)
	}

	/// Insert `node` right after the first direct child named `anchor`
	pub fn insert_after(&mut self, anchor: &str, node: XmlElement) -> Result<(), FederationError> {
		let position = self
			.children
			.iter()
			.position(|child| matches!(child, XmlNode::Element(e) if e.name == anchor))
			.ok_or_else(|| {
				FederationError::Xml(format!("<{}> has no <{}> child", self.name, anchor))
			})?;
		self.children.insert(position + 1, XmlNode::Element(node));
		Ok(())
	}

	/// Canonical serialization of this subtree
	pub fn to_canonical_string(&self) -> Result<String, FederationError> {
		let mut writer = Writer::new(Vec::new());
		write_element(&mut writer, self, &BTreeMap::new())?;
		String::from_utf8(writer.into_inner())
			.map_err(|e| FederationError::Xml(format!("serialized XML is not UTF-8: {}", e)))
	}
}

fn escape_text(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	for c in raw.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'\r' => out.push_str("&#xD;"),
			other => out.push(other),
		}
	}
	out
}

fn escape_attribute(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());
	for c in raw.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'"' => out.push_str("&quot;"),
			'\t' => out.push_str("&#x9;"),
			'\n' => out.push_str("&#xA;"),
			'\r' => out.push_str("&#xD;"),
			other => out.push(other),
		}
	}
	out
}

fn xml_error(error: impl std::fmt::Display) -> FederationError {
	FederationError::Xml(error.to_string())
}

fn write_element(
	writer: &mut Writer<Vec<u8>>,
	element: &XmlElement,
	in_scope: &BTreeMap<String, &'static str>,
) -> Result<(), FederationError> {
	let mut used: Vec<&str> = element.prefix().into_iter().collect();
	used.extend(
		element
			.attributes
			.iter()
			.filter_map(|(key, _)| key.split_once(':').map(|(prefix, _)| prefix)),
	);

	let mut scope = in_scope.clone();
	let mut declarations = BTreeMap::new();
	for prefix in used {
		let uri = namespace_for(prefix)
			.ok_or_else(|| FederationError::Xml(format!("unknown namespace prefix '{}'", prefix)))?;
		if in_scope.get(prefix) != Some(&uri) {
			declarations.insert(prefix.to_string(), uri);
			scope.insert(prefix.to_string(), uri);
		}
	}

	let mut start = BytesStart::new(element.name.as_str());
	for (prefix, uri) in &declarations {
		let key = format!("xmlns:{}", prefix);
		start.push_attribute(Attribute {
			key: QName(key.as_bytes()),
			value: Cow::Owned(escape_attribute(uri).into_bytes()),
		});
	}

	let mut attributes: Vec<&(String, String)> = element.attributes.iter().collect();
	attributes.sort_by(|a, b| a.0.cmp(&b.0));
	for (key, value) in attributes {
		start.push_attribute(Attribute {
			key: QName(key.as_bytes()),
			value: Cow::Owned(escape_attribute(value).into_bytes()),
		});
	}

	writer.write_event(Event::Start(start)).map_err(xml_error)?;
	for child in &element.children {
		match child {
			XmlNode::Element(nested) => write_element(writer, nested, &scope)?,
			XmlNode::Text(text) => writer
				.write_event(Event::Text(BytesText::from_escaped(escape_text(text))))
				.map_err(xml_error)?,
		}
	}
	writer
		.write_event(Event::End(BytesEnd::new(element.name.as_str())))
		.map_err(xml_error)?;

	Ok(())
}
