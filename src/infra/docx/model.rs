//! Document tree read from `document.xml`, before rendering.

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct Paragraph {
    pub(super) style_id: Option<String>,
    pub(super) numbering: Option<NumberingRef>,
    pub(super) children: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct NumberingRef {
    pub(super) num_id: String,
    pub(super) level: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Inline {
    Run(Run),
    Hyperlink(Hyperlink),
    Bookmark(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct Hyperlink {
    pub(super) relationship_id: Option<String>,
    pub(super) anchor: Option<String>,
    pub(super) runs: Vec<Run>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct Run {
    pub(super) format: RunFormat,
    pub(super) content: Vec<RunContent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct RunFormat {
    pub(super) bold: bool,
    pub(super) italic: bool,
    pub(super) strike: bool,
    pub(super) vertical: VerticalAlign,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) enum VerticalAlign {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum RunContent {
    Text(String),
    Tab,
    Break,
    Image(ImageRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ImageRef {
    pub(super) relationship_id: String,
    pub(super) alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct Table {
    pub(super) rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct Row {
    pub(super) header: bool,
    pub(super) cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Cell {
    pub(super) col_span: u32,
    pub(super) v_merge: VerticalMerge,
    pub(super) blocks: Vec<Block>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            col_span: 1,
            v_merge: VerticalMerge::None,
            blocks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum VerticalMerge {
    None,
    Restart,
    Continue,
}
