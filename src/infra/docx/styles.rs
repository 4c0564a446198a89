//! Paragraph style names from `styles.xml`.

use std::collections::HashMap;

use quick_xml::{Reader, events::Event};

use super::xml::attr;

#[derive(Debug, Clone, Default)]
pub(super) struct Styles {
    paragraph_names: HashMap<String, String>,
}

impl Styles {
    pub(super) fn parse(xml: &[u8]) -> Result<Self, quick_xml::Error> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut styles = Self::default();
        let mut current: Option<(String, Option<String>)> = None;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(element) => match element.local_name().as_ref() {
                    b"style" => {
                        current = match (attr(&element, b"type"), attr(&element, b"styleId")) {
                            (Some(kind), Some(id)) if kind == "paragraph" => Some((id, None)),
                            _ => None,
                        };
                    }
                    b"name" => {
                        if let Some((_, name)) = current.as_mut() {
                            *name = attr(&element, b"val");
                        }
                    }
                    _ => {}
                },
                Event::Empty(element) if element.local_name().as_ref() == b"name" => {
                    if let Some((_, name)) = current.as_mut() {
                        *name = attr(&element, b"val");
                    }
                }
                Event::End(element) if element.local_name().as_ref() == b"style" => {
                    if let Some((id, Some(name))) = current.take() {
                        styles.paragraph_names.insert(id, name);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(styles)
    }

    pub(super) fn paragraph_style_name(&self, style_id: &str) -> Option<&str> {
        self.paragraph_names.get(style_id).map(String::as_str)
    }
}
