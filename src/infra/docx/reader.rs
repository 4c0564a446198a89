//! Streaming reader turning `document.xml` into a [`Block`] tree.

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use super::model::{
    Block, Cell, Hyperlink, ImageRef, Inline, NumberingRef, Paragraph, Row, Run, RunContent,
    Table, VerticalAlign, VerticalMerge,
};
use super::xml::{attr, toggle};

/// Subtrees whose content never reaches the output: tracked deletions, field
/// instructions, text boxes, compatibility fallbacks and revision history.
const SKIPPED: &[&[u8]] = &[
    b"del",
    b"moveFrom",
    b"delText",
    b"instrText",
    b"txbxContent",
    b"Fallback",
    b"sectPr",
    b"rPrChange",
    b"pPrChange",
];

pub(super) fn read_document(xml: &[u8]) -> Result<Vec<Block>, quick_xml::Error> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut state = DocumentReader::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => state.open(&element, false),
            Event::Empty(element) => state.open(&element, true),
            Event::End(element) => state.close(element.local_name().as_ref()),
            Event::Text(text) if state.wants_text() => {
                let text = text.unescape()?;
                state.push_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(state.body)
}

#[derive(Default)]
struct DrawingState {
    relationship_id: Option<String>,
    alt: Option<String>,
}

#[derive(Default)]
struct DocumentReader {
    body: Vec<Block>,
    tables: Vec<Table>,
    paragraph: Option<Paragraph>,
    pending_level: u8,
    hyperlink: Option<Hyperlink>,
    run: Option<Run>,
    drawing: Option<DrawingState>,
    in_paragraph_props: bool,
    in_run_props: bool,
    in_text: bool,
    skip_depth: usize,
}

impl DocumentReader {
    fn wants_text(&self) -> bool {
        self.in_text && self.skip_depth == 0 && self.drawing.is_none() && self.run.is_some()
    }

    fn open(&mut self, element: &BytesStart<'_>, empty: bool) {
        if self.skip_depth > 0 {
            if !empty {
                self.skip_depth += 1;
            }
            return;
        }

        let local_name = element.local_name();
        let name = local_name.as_ref();

        if SKIPPED.contains(&name) {
            if !empty {
                self.skip_depth = 1;
            }
            return;
        }

        if let Some(drawing) = self.drawing.as_mut() {
            match name {
                b"docPr" => {
                    drawing.alt = non_empty(attr(element, b"descr"))
                        .or_else(|| non_empty(attr(element, b"title")));
                }
                b"blip" => {
                    drawing.relationship_id =
                        attr(element, b"embed").or_else(|| attr(element, b"link"));
                }
                _ => {}
            }
            return;
        }

        match name {
            b"tbl" if !empty => self.tables.push(Table::default()),
            b"tr" => {
                if let Some(table) = self.tables.last_mut() {
                    table.rows.push(Row::default());
                }
            }
            b"tblHeader" => {
                if let Some(row) = self.current_row() {
                    row.header = toggle(element);
                }
            }
            b"tc" => {
                if let Some(row) = self.current_row() {
                    row.cells.push(Cell::default());
                }
            }
            b"gridSpan" => {
                if let Some(cell) = self.current_cell() {
                    cell.col_span = attr(element, b"val")
                        .and_then(|value| value.parse().ok())
                        .filter(|span| *span > 0)
                        .unwrap_or(1);
                }
            }
            b"vMerge" => {
                if let Some(cell) = self.current_cell() {
                    cell.v_merge = match attr(element, b"val").as_deref() {
                        Some("restart") => VerticalMerge::Restart,
                        _ => VerticalMerge::Continue,
                    };
                }
            }
            b"p" if !empty => {
                self.paragraph = Some(Paragraph::default());
                self.pending_level = 0;
            }
            b"pPr" => self.in_paragraph_props = !empty,
            b"rPr" => self.in_run_props = !empty,
            b"pStyle" if self.in_paragraph_props => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.style_id = attr(element, b"val");
                }
            }
            b"ilvl" if self.in_paragraph_props => {
                let level = attr(element, b"val")
                    .and_then(|value| value.parse().ok())
                    .unwrap_or(0);
                self.pending_level = level;
                if let Some(numbering) = self
                    .paragraph
                    .as_mut()
                    .and_then(|paragraph| paragraph.numbering.as_mut())
                {
                    numbering.level = level;
                }
            }
            b"numId" if self.in_paragraph_props => {
                let level = self.pending_level;
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.numbering = attr(element, b"val")
                        .filter(|num_id| num_id != "0")
                        .map(|num_id| NumberingRef { num_id, level });
                }
            }
            b"r" if !empty => self.run = Some(Run::default()),
            b"b" | b"i" | b"strike" | b"dstrike" | b"vertAlign"
                if self.in_run_props && !self.in_paragraph_props =>
            {
                self.apply_run_property(name, element);
            }
            b"t" => self.in_text = !empty,
            b"tab" if !self.in_paragraph_props => self.push_run_content(RunContent::Tab),
            b"br" => match attr(element, b"type").as_deref() {
                None | Some("textWrapping") => self.push_run_content(RunContent::Break),
                _ => {}
            },
            b"cr" => self.push_run_content(RunContent::Break),
            b"hyperlink" if !empty => {
                self.hyperlink = Some(Hyperlink {
                    relationship_id: attr(element, b"id"),
                    anchor: non_empty(attr(element, b"anchor")),
                    runs: Vec::new(),
                });
            }
            b"bookmarkStart" => {
                if let (Some(paragraph), Some(bookmark)) =
                    (self.paragraph.as_mut(), attr(element, b"name"))
                    && bookmark != "_GoBack"
                {
                    paragraph.children.push(Inline::Bookmark(bookmark));
                }
            }
            b"drawing" if !empty => self.drawing = Some(DrawingState::default()),
            b"imagedata" => {
                if let Some(relationship_id) = attr(element, b"id") {
                    self.push_run_content(RunContent::Image(ImageRef {
                        relationship_id,
                        alt: non_empty(attr(element, b"title")),
                    }));
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }

        if self.drawing.is_some() {
            if name == b"drawing" {
                self.finish_drawing();
            }
            return;
        }

        match name {
            b"t" => self.in_text = false,
            b"pPr" => self.in_paragraph_props = false,
            b"rPr" => self.in_run_props = false,
            b"r" => {
                if let Some(run) = self.run.take() {
                    self.push_run(run);
                }
            }
            b"hyperlink" => {
                if let (Some(link), Some(paragraph)) =
                    (self.hyperlink.take(), self.paragraph.as_mut())
                {
                    paragraph.children.push(Inline::Hyperlink(link));
                }
            }
            b"p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.push_block(Block::Paragraph(paragraph));
                }
            }
            b"tbl" => {
                if let Some(table) = self.tables.pop() {
                    self.push_block(Block::Table(table));
                }
            }
            _ => {}
        }
    }

    fn apply_run_property(&mut self, name: &[u8], element: &BytesStart<'_>) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        match name {
            b"b" => run.format.bold = toggle(element),
            b"i" => run.format.italic = toggle(element),
            b"strike" | b"dstrike" => run.format.strike = toggle(element),
            b"vertAlign" => {
                run.format.vertical = match attr(element, b"val").as_deref() {
                    Some("superscript") => VerticalAlign::Superscript,
                    Some("subscript") => VerticalAlign::Subscript,
                    _ => VerticalAlign::Baseline,
                };
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        match run.content.last_mut() {
            Some(RunContent::Text(existing)) => existing.push_str(text),
            _ => run.content.push(RunContent::Text(text.to_string())),
        }
    }

    fn push_run_content(&mut self, content: RunContent) {
        if let Some(run) = self.run.as_mut() {
            run.content.push(content);
        }
    }

    fn push_run(&mut self, run: Run) {
        if let Some(link) = self.hyperlink.as_mut() {
            link.runs.push(run);
        } else if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.children.push(Inline::Run(run));
        }
    }

    fn finish_drawing(&mut self) {
        if let Some(DrawingState {
            relationship_id: Some(relationship_id),
            alt,
        }) = self.drawing.take()
        {
            self.push_run_content(RunContent::Image(ImageRef {
                relationship_id,
                alt,
            }));
        }
    }

    fn push_block(&mut self, block: Block) {
        if let Some(cell) = self.current_cell() {
            cell.blocks.push(block);
        } else if self.tables.is_empty() {
            self.body.push(block);
        }
    }

    fn current_row(&mut self) -> Option<&mut Row> {
        self.tables.last_mut()?.rows.last_mut()
    }

    fn current_cell(&mut self) -> Option<&mut Cell> {
        self.current_row()?.cells.last_mut()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
