//! Renders the document tree as semantic HTML.

use std::collections::HashSet;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::domain::conversion::{Conversion, Warning};
use crate::domain::uploads::FALLBACK_MEDIA_TYPE;

use super::DocxError;
use super::model::{
    Block, Cell, Hyperlink, ImageRef, Inline, Paragraph, Run, RunContent, RunFormat, Table,
    VerticalAlign, VerticalMerge,
};
use super::numbering::Numbering;
use super::package::{Package, Relationships, resolve_target};
use super::styles::Styles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParagraphRole {
    Plain,
    Heading(u8),
    Quote,
}

/// Paragraph style names (lowercase, whitespace removed) with a semantic mapping.
const PARAGRAPH_STYLES: &[(&str, ParagraphRole)] = &[
    ("heading1", ParagraphRole::Heading(1)),
    ("heading2", ParagraphRole::Heading(2)),
    ("heading3", ParagraphRole::Heading(3)),
    ("heading4", ParagraphRole::Heading(4)),
    ("heading5", ParagraphRole::Heading(5)),
    ("heading6", ParagraphRole::Heading(6)),
    ("title", ParagraphRole::Heading(1)),
    ("subtitle", ParagraphRole::Heading(2)),
    ("quote", ParagraphRole::Quote),
    ("intensequote", ParagraphRole::Quote),
    ("normal", ParagraphRole::Plain),
];

const BROWSER_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/svg+xml",
    "image/bmp",
    "image/webp",
];

struct ListFrame {
    ordered: bool,
    item_open: bool,
}

/// Warnings in first-occurrence order, each reported once.
#[derive(Default)]
struct Warnings {
    seen: HashSet<String>,
    items: Vec<Warning>,
}

impl Warnings {
    fn push(&mut self, message: String) {
        if self.seen.insert(message.clone()) {
            self.items.push(Warning::warning(message));
        }
    }
}

pub(super) struct HtmlWriter<'a> {
    package: &'a mut Package,
    part: &'a str,
    relationships: &'a Relationships,
    styles: &'a Styles,
    numbering: &'a Numbering,
    warnings: Warnings,
    lists: Vec<ListFrame>,
}

impl<'a> HtmlWriter<'a> {
    pub(super) fn new(
        package: &'a mut Package,
        part: &'a str,
        relationships: &'a Relationships,
        styles: &'a Styles,
        numbering: &'a Numbering,
    ) -> Self {
        Self {
            package,
            part,
            relationships,
            styles,
            numbering,
            warnings: Warnings::default(),
            lists: Vec::new(),
        }
    }

    pub(super) fn render(mut self, blocks: &[Block]) -> Result<Conversion, DocxError> {
        let mut html = String::new();
        self.write_blocks(blocks, &mut html)?;
        Ok(Conversion::new(html, self.warnings.items))
    }

    fn write_blocks(&mut self, blocks: &[Block], out: &mut String) -> Result<(), DocxError> {
        for block in blocks {
            match block {
                Block::Paragraph(paragraph) => self.write_paragraph(paragraph, out)?,
                Block::Table(table) => {
                    self.close_lists(0, out);
                    self.write_table(table, out)?;
                }
            }
        }
        self.close_lists(0, out);
        Ok(())
    }

    fn write_paragraph(&mut self, paragraph: &Paragraph, out: &mut String) -> Result<(), DocxError> {
        let mut body = String::new();
        if !self.write_inlines(&paragraph.children, &mut body)? {
            return Ok(());
        }

        let list = paragraph.numbering.as_ref().and_then(|numbering| {
            self.numbering
                .is_ordered(&numbering.num_id, numbering.level)
                .map(|ordered| (numbering, ordered))
        });

        if let Some((numbering, ordered)) = list {
            self.open_list_item(&numbering.num_id, numbering.level, ordered, out);
            out.push_str(&body);
            return Ok(());
        }

        self.close_lists(0, out);
        match self.paragraph_role(paragraph) {
            ParagraphRole::Plain => {
                out.push_str("<p>");
                out.push_str(&body);
                out.push_str("</p>");
            }
            ParagraphRole::Heading(level) => {
                out.push_str(&format!("<h{level}>"));
                out.push_str(&body);
                out.push_str(&format!("</h{level}>"));
            }
            ParagraphRole::Quote => {
                out.push_str("<blockquote><p>");
                out.push_str(&body);
                out.push_str("</p></blockquote>");
            }
        }
        Ok(())
    }

    fn paragraph_role(&mut self, paragraph: &Paragraph) -> ParagraphRole {
        let Some(style_id) = paragraph.style_id.as_deref() else {
            return ParagraphRole::Plain;
        };
        let style_name = self.styles.paragraph_style_name(style_id);

        let role = style_name
            .and_then(lookup_role)
            .or_else(|| lookup_role(style_id));
        match role {
            Some(role) => role,
            None => {
                self.warnings.push(format!(
                    "Unrecognised paragraph style: '{}' (Style ID: {style_id})",
                    style_name.unwrap_or(style_id)
                ));
                ParagraphRole::Plain
            }
        }
    }

    /// Leave the list stack `level + 1` deep and open a fresh item at the top.
    /// Missing parent levels take their own kind from the numbering definition.
    fn open_list_item(&mut self, num_id: &str, level: u8, ordered: bool, out: &mut String) {
        let level = usize::from(level);
        self.close_lists(level + 1, out);

        while self.lists.len() < level + 1 {
            let depth = self.lists.len();
            let frame_ordered = if depth == level {
                ordered
            } else {
                u8::try_from(depth)
                    .ok()
                    .and_then(|depth| self.numbering.is_ordered(num_id, depth))
                    .unwrap_or(ordered)
            };
            if let Some(parent) = self.lists.last_mut()
                && !parent.item_open
            {
                out.push_str("<li>");
                parent.item_open = true;
            }
            out.push_str(if frame_ordered { "<ol>" } else { "<ul>" });
            self.lists.push(ListFrame {
                ordered: frame_ordered,
                item_open: false,
            });
        }

        if self.lists.last().is_some_and(|frame| frame.ordered != ordered) {
            self.close_lists(level, out);
            out.push_str(if ordered { "<ol>" } else { "<ul>" });
            self.lists.push(ListFrame {
                ordered,
                item_open: false,
            });
        }

        if let Some(frame) = self.lists.last_mut() {
            if frame.item_open {
                out.push_str("</li>");
            }
            out.push_str("<li>");
            frame.item_open = true;
        }
    }

    fn close_lists(&mut self, depth: usize, out: &mut String) {
        while self.lists.len() > depth {
            if let Some(frame) = self.lists.pop() {
                if frame.item_open {
                    out.push_str("</li>");
                }
                out.push_str(if frame.ordered { "</ol>" } else { "</ul>" });
            }
        }
    }

    /// Returns whether anything visible or linkable was written.
    fn write_inlines(&mut self, inlines: &[Inline], out: &mut String) -> Result<bool, DocxError> {
        let mut visible = false;
        let mut pending: Vec<&Run> = Vec::new();

        for inline in inlines {
            match inline {
                Inline::Run(run) => pending.push(run),
                Inline::Hyperlink(link) => {
                    visible |= self.write_runs(&pending, out)?;
                    pending.clear();
                    visible |= self.write_hyperlink(link, out)?;
                }
                Inline::Bookmark(name) => {
                    visible |= self.write_runs(&pending, out)?;
                    pending.clear();
                    out.push_str("<a id=\"");
                    escape_attr(name, out);
                    out.push_str("\"></a>");
                    visible = true;
                }
            }
        }
        visible |= self.write_runs(&pending, out)?;
        Ok(visible)
    }

    fn write_hyperlink(&mut self, link: &Hyperlink, out: &mut String) -> Result<bool, DocxError> {
        let runs: Vec<&Run> = link.runs.iter().collect();
        let mut inner = String::new();
        let visible = self.write_runs(&runs, &mut inner)?;

        let target = link
            .relationship_id
            .as_deref()
            .and_then(|id| self.relationships.get(id))
            .map(|relationship| relationship.target.clone());
        let href = match (target, link.anchor.as_deref()) {
            (Some(target), Some(anchor)) => Some(format!("{target}#{anchor}")),
            (Some(target), None) => Some(target),
            (None, Some(anchor)) => Some(format!("#{anchor}")),
            (None, None) => None,
        };

        match href {
            Some(href) => {
                out.push_str("<a href=\"");
                escape_attr(&href, out);
                out.push_str("\">");
                out.push_str(&inner);
                out.push_str("</a>");
            }
            None => out.push_str(&inner),
        }
        Ok(visible)
    }

    /// Writes runs, merging neighbours that share a format into one wrapper.
    fn write_runs(&mut self, runs: &[&Run], out: &mut String) -> Result<bool, DocxError> {
        let mut visible = false;
        let mut index = 0;

        while index < runs.len() {
            let format = runs[index].format;
            let mut inner = String::new();
            while index < runs.len() && runs[index].format == format {
                visible |= self.write_run_content(&runs[index].content, &mut inner)?;
                index += 1;
            }
            if !inner.is_empty() {
                wrap_formatted(format, &inner, out);
            }
        }

        Ok(visible)
    }

    fn write_run_content(
        &mut self,
        content: &[RunContent],
        out: &mut String,
    ) -> Result<bool, DocxError> {
        let mut visible = false;
        for item in content {
            match item {
                RunContent::Text(text) => {
                    visible |= !text.is_empty();
                    escape_text(text, out);
                }
                RunContent::Tab => {
                    visible = true;
                    out.push('\t');
                }
                RunContent::Break => {
                    visible = true;
                    out.push_str("<br />");
                }
                RunContent::Image(image) => visible |= self.write_image(image, out)?,
            }
        }
        Ok(visible)
    }

    fn write_image(&mut self, image: &ImageRef, out: &mut String) -> Result<bool, DocxError> {
        let Some(relationship) = self.relationships.get(&image.relationship_id) else {
            self.warnings.push(format!(
                "Could not find image relationship '{}'",
                image.relationship_id
            ));
            return Ok(false);
        };

        let src = if relationship.external {
            relationship.target.clone()
        } else {
            let path = resolve_target(self.part, &relationship.target);
            let Some(data) = self.package.read_part(&path)? else {
                self.warnings
                    .push(format!("Could not find image file '{path}'"));
                return Ok(false);
            };
            let media_type = mime_guess::from_path(&path)
                .first_raw()
                .unwrap_or(FALLBACK_MEDIA_TYPE);
            if !BROWSER_IMAGE_TYPES.contains(&media_type) {
                self.warnings.push(format!(
                    "Image of type {media_type} is unlikely to display in web browsers"
                ));
            }
            format!("data:{media_type};base64,{}", STANDARD.encode(&data))
        };

        out.push_str("<img");
        if let Some(alt) = image.alt.as_deref() {
            out.push_str(" alt=\"");
            escape_attr(alt, out);
            out.push('"');
        }
        out.push_str(" src=\"");
        escape_attr(&src, out);
        out.push_str("\" />");
        Ok(true)
    }

    fn write_table(&mut self, table: &Table, out: &mut String) -> Result<(), DocxError> {
        let spans = row_spans(table);
        let header_rows = table.rows.iter().take_while(|row| row.header).count();

        out.push_str("<table>");
        if header_rows > 0 {
            out.push_str("<thead>");
            for (row, spans) in table.rows.iter().zip(&spans).take(header_rows) {
                self.write_row(&row.cells, spans, "th", out)?;
            }
            out.push_str("</thead>");
            if header_rows < table.rows.len() {
                out.push_str("<tbody>");
                for (row, spans) in table.rows.iter().zip(&spans).skip(header_rows) {
                    self.write_row(&row.cells, spans, "td", out)?;
                }
                out.push_str("</tbody>");
            }
        } else {
            for (row, spans) in table.rows.iter().zip(&spans) {
                self.write_row(&row.cells, spans, "td", out)?;
            }
        }
        out.push_str("</table>");
        Ok(())
    }

    fn write_row(
        &mut self,
        cells: &[Cell],
        spans: &[Option<usize>],
        tag: &str,
        out: &mut String,
    ) -> Result<(), DocxError> {
        out.push_str("<tr>");
        for (cell, span) in cells.iter().zip(spans) {
            let Some(row_span) = span else {
                continue;
            };
            out.push('<');
            out.push_str(tag);
            if cell.col_span > 1 {
                out.push_str(&format!(" colspan=\"{}\"", cell.col_span));
            }
            if *row_span > 1 {
                out.push_str(&format!(" rowspan=\"{row_span}\""));
            }
            out.push('>');

            // Each cell starts its own list context.
            let outer_lists = std::mem::take(&mut self.lists);
            let result = self.write_blocks(&cell.blocks, out);
            self.lists = outer_lists;
            result?;

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        out.push_str("</tr>");
        Ok(())
    }
}

fn lookup_role(name: &str) -> Option<ParagraphRole> {
    let normalized: String = name
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    PARAGRAPH_STYLES
        .iter()
        .find(|(candidate, _)| *candidate == normalized)
        .map(|(_, role)| *role)
}

/// Row span per cell; `None` marks a vertically merged continuation that is not rendered.
fn row_spans(table: &Table) -> Vec<Vec<Option<usize>>> {
    let positioned: Vec<Vec<(usize, &Cell)>> = table
        .rows
        .iter()
        .map(|row| {
            let mut column = 0usize;
            row.cells
                .iter()
                .map(|cell| {
                    let start = column;
                    column += cell.col_span as usize;
                    (start, cell)
                })
                .collect()
        })
        .collect();

    positioned
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            row.iter()
                .map(|(column, cell)| match cell.v_merge {
                    VerticalMerge::Continue => None,
                    VerticalMerge::None => Some(1),
                    VerticalMerge::Restart => {
                        let continued = positioned[row_index + 1..]
                            .iter()
                            .take_while(|below| {
                                below.iter().any(|(below_column, below_cell)| {
                                    below_column == column
                                        && below_cell.v_merge == VerticalMerge::Continue
                                })
                            })
                            .count();
                        Some(1 + continued)
                    }
                })
                .collect()
        })
        .collect()
}

fn wrap_formatted(format: RunFormat, inner: &str, out: &mut String) {
    let mut tags: Vec<&str> = Vec::new();
    if format.bold {
        tags.push("strong");
    }
    if format.italic {
        tags.push("em");
    }
    if format.strike {
        tags.push("s");
    }
    match format.vertical {
        VerticalAlign::Superscript => tags.push("sup"),
        VerticalAlign::Subscript => tags.push("sub"),
        VerticalAlign::Baseline => {}
    }

    for tag in &tags {
        out.push('<');
        out.push_str(tag);
        out.push('>');
    }
    out.push_str(inner);
    for tag in tags.iter().rev() {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::docx::model::Row;

    #[test]
    fn style_lookup_ignores_case_and_whitespace() {
        assert_eq!(lookup_role("heading 3"), Some(ParagraphRole::Heading(3)));
        assert_eq!(lookup_role("Heading3"), Some(ParagraphRole::Heading(3)));
        assert_eq!(lookup_role("Intense Quote"), Some(ParagraphRole::Quote));
        assert_eq!(lookup_role("Body Text"), None);
    }

    #[test]
    fn formatted_text_nests_in_fixed_order() {
        let mut out = String::new();
        wrap_formatted(
            RunFormat {
                bold: true,
                italic: true,
                strike: false,
                vertical: VerticalAlign::Superscript,
            },
            "x",
            &mut out,
        );
        assert_eq!(out, "<strong><em><sup>x</sup></em></strong>");
    }

    #[test]
    fn escapes_markup_in_text_and_attributes() {
        let mut text = String::new();
        escape_text("a < b & \"c\"", &mut text);
        assert_eq!(text, "a &lt; b &amp; \"c\"");

        let mut attribute = String::new();
        escape_attr("say \"hi\" & <go>", &mut attribute);
        assert_eq!(attribute, "say &quot;hi&quot; &amp; &lt;go&gt;");
    }

    #[test]
    fn vertical_merges_become_row_spans() {
        let cell = |v_merge| Cell {
            col_span: 1,
            v_merge,
            blocks: Vec::new(),
        };
        let table = Table {
            rows: vec![
                Row {
                    header: false,
                    cells: vec![cell(VerticalMerge::Restart), cell(VerticalMerge::None)],
                },
                Row {
                    header: false,
                    cells: vec![cell(VerticalMerge::Continue), cell(VerticalMerge::None)],
                },
                Row {
                    header: false,
                    cells: vec![cell(VerticalMerge::None), cell(VerticalMerge::None)],
                },
            ],
        };

        assert_eq!(
            row_spans(&table),
            vec![
                vec![Some(2), Some(1)],
                vec![None, Some(1)],
                vec![Some(1), Some(1)],
            ]
        );
    }
}
