//! List definitions from `numbering.xml`.

use std::collections::HashMap;

use quick_xml::{Reader, events::Event};

use super::xml::attr;

#[derive(Debug, Clone, Default)]
pub(super) struct Numbering {
    /// abstractNumId → level → ordered?
    abstract_levels: HashMap<String, HashMap<u8, bool>>,
    /// numId → abstractNumId
    instances: HashMap<String, String>,
}

#[derive(Default)]
struct ParseState {
    abstract_id: Option<String>,
    level: Option<(u8, bool)>,
    num_id: Option<String>,
}

impl Numbering {
    pub(super) fn parse(xml: &[u8]) -> Result<Self, quick_xml::Error> {
        let mut reader = Reader::from_reader(xml);
        let mut buf = Vec::new();
        let mut numbering = Self::default();
        let mut state = ParseState::default();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(element) | Event::Empty(element) => {
                    match element.local_name().as_ref() {
                        b"abstractNum" => state.abstract_id = attr(&element, b"abstractNumId"),
                        b"lvl" if state.abstract_id.is_some() => {
                            state.level = attr(&element, b"ilvl")
                                .and_then(|value| value.parse().ok())
                                .map(|level| (level, true));
                        }
                        b"numFmt" => {
                            if let Some((_, ordered)) = state.level.as_mut() {
                                *ordered = attr(&element, b"val").as_deref() != Some("bullet");
                            }
                        }
                        b"num" => state.num_id = attr(&element, b"numId"),
                        b"abstractNumId" => {
                            if let (Some(num_id), Some(abstract_id)) =
                                (state.num_id.as_ref(), attr(&element, b"val"))
                            {
                                numbering.instances.insert(num_id.clone(), abstract_id);
                            }
                        }
                        _ => {}
                    }
                }
                Event::End(element) => match element.local_name().as_ref() {
                    b"lvl" => {
                        if let (Some(abstract_id), Some((level, ordered))) =
                            (state.abstract_id.as_ref(), state.level.take())
                        {
                            numbering
                                .abstract_levels
                                .entry(abstract_id.clone())
                                .or_default()
                                .insert(level, ordered);
                        }
                    }
                    b"abstractNum" => state.abstract_id = None,
                    b"num" => state.num_id = None,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(numbering)
    }

    /// Whether level `level` of list instance `num_id` is ordered.
    /// `None` when the instance or level is not defined.
    pub(super) fn is_ordered(&self, num_id: &str, level: u8) -> Option<bool> {
        let abstract_id = self.instances.get(num_id)?;
        self.abstract_levels.get(abstract_id)?.get(&level).copied()
    }
}
