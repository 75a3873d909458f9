//! Item XML parsing.
//!
//! An item record looks like this:
//!
//! ```xml
//! <item id="{..}" name="Home" parentid="{..}" tid="{..}" mid="{..}" bid="{..}"
//!       template="sample item" language="en" version="1">
//!   <fields>
//!     <field tfid="{..}" key="title"><content>Welcome</content></field>
//!   </fields>
//! </item>
//! ```
//!
//! The root element name is not checked. Attributes are read leniently: a
//! missing attribute is an empty string.

use quick_xml::Reader;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use super::{Field, Item, Version};

#[derive(Debug, Error)]
pub enum ItemParseError {
    #[error("document is empty")]
    Empty,

    #[error("document ends inside <{0}>")]
    Truncated(String),

    #[error("content after the root element")]
    TrailingContent,

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),
}

/// Parse one item record.
///
/// Returns `Ok(None)` for a document without a root element.
pub fn parse_item(xml: &str) -> Result<Option<Item>, ItemParseError> {
    if xml.trim().is_empty() {
        return Err(ItemParseError::Empty);
    }

    let mut reader = Reader::from_str(xml);
    let mut builder = ItemBuilder::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                builder.open(&e)?;
            }
            Event::Empty(e) => {
                builder.open(&e)?;
                builder.close();
            }
            Event::End(_) => builder.close(),
            Event::Text(t) => {
                if builder.capturing() {
                    builder.push_text(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if builder.capturing() {
                    builder.push_text(&String::from_utf8_lossy(&c));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    builder.finish()
}

/// Element nesting while walking the document.
///
/// Depth 1 is the root, `fields` is depth 2, `field` depth 3 and
/// `content` depth 4.
#[derive(Default)]
struct ItemBuilder {
    stack: Vec<String>,
    item: Option<Item>,
    root_closed: bool,
    field: Option<Field>,
    content_depth: Option<usize>,
}

impl ItemBuilder {
    fn open(&mut self, e: &BytesStart) -> Result<(), ItemParseError> {
        if self.root_closed {
            return Err(ItemParseError::TrailingContent);
        }

        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
        let parent = self.stack.last().map(String::as_str);

        match (self.stack.len(), parent, name.as_str()) {
            (0, _, _) => {
                let attrs = Attributes::of(e)?;
                self.item = Some(Item {
                    id: attrs.get("id"),
                    name: attrs.get("name"),
                    parent_id: attrs.get("parentid"),
                    template_id: attrs.get("tid"),
                    master_id: attrs.get("mid"),
                    branch_id: attrs.get("bid"),
                    template_name: attrs.get("template"),
                    versions: vec![Version {
                        language: attrs.get("language"),
                        number: attrs.get("version"),
                        revision: String::new(),
                        fields: Vec::new(),
                    }],
                });
            }
            (2, Some("fields"), "field") => {
                let attrs = Attributes::of(e)?;
                self.field = Some(Field::new(attrs.get("tfid"), attrs.get("key"), None));
            }
            (3, Some("field"), "content") if self.stack[1] == "fields" => {
                // Only the first content element of a field counts
                if let Some(field) = self.field.as_mut().filter(|f| f.value.is_none()) {
                    field.value = Some(String::new());
                    self.content_depth = Some(4);
                }
            }
            _ => {}
        }

        self.stack.push(name);
        Ok(())
    }

    fn close(&mut self) {
        if self.stack.pop().is_none() {
            return;
        }

        match self.stack.len() {
            0 => self.root_closed = true,
            2 => {
                if let (Some(field), Some(item)) = (self.field.take(), self.item.as_mut()) {
                    if let Some(version) = item.versions.first_mut() {
                        version.fields.push(field);
                    }
                }
            }
            3 => self.content_depth = None,
            _ => {}
        }
    }

    fn capturing(&self) -> bool {
        self.content_depth
            .is_some_and(|depth| self.stack.len() >= depth)
    }

    fn push_text(&mut self, text: &str) {
        if let Some(value) = self.field.as_mut().and_then(|f| f.value.as_mut()) {
            value.push_str(text);
        }
    }

    fn finish(self) -> Result<Option<Item>, ItemParseError> {
        if let Some(open) = self.stack.last() {
            return Err(ItemParseError::Truncated(open.clone()));
        }
        Ok(self.item)
    }
}

/// Unescaped attributes of one element.
struct Attributes(Vec<(String, String)>);

impl Attributes {
    fn of(e: &BytesStart) -> Result<Self, ItemParseError> {
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attrs.push((key, value));
        }
        Ok(Self(attrs))
    }

    fn get(&self, name: &str) -> String {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }
}
