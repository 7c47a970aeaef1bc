//! Pagination of a [`RenderedDocument`] into positioned drawing operations.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of
//! the page. Layout is a pure function of the document.

use thiserror::Error;

use super::fonts::{text_width, ASCENT};
use super::render::{
    Block, Cell, HAlign, PageSetup, Paragraph, RenderedDocument, Rgb8, Table, TextStyle, VAlign,
};

pub const BORDER_WIDTH: f32 = 0.5;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("table has {columns} columns but row {row} has {cells} cells")]
    ColumnMismatch {
        row: usize,
        columns: usize,
        cells: usize,
    },
    #[error("table column widths must be positive")]
    InvalidColumnWidths,
    #[error("row {row} needs {height:.1}pt but a page cannot hold a single line of it ({available:.1}pt)")]
    RowTooTall {
        row: usize,
        height: f32,
        available: f32,
    },
}

/// Axis-aligned box; `y` is the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub style: TextStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text(TextRun),
    Fill { bounds: Bounds, color: Rgb8 },
    Border { bounds: Bounds, width: f32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

impl PageLayout {
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(run) => Some(run),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub title: String,
    pub page: PageSetup,
    pub pages: Vec<PageLayout>,
}

/// Flow every block of `document` onto as many pages as needed.
pub fn layout(document: &RenderedDocument) -> Result<LaidOutDocument, LayoutError> {
    let mut cursor = Cursor::new(document.page);

    for block in &document.blocks {
        match block {
            Block::Paragraph(paragraph) => cursor.paragraph(paragraph),
            Block::Table(table) => cursor.table(table)?,
        }
    }

    Ok(LaidOutDocument {
        title: document.title.clone(),
        page: document.page,
        pages: cursor.finish(),
    })
}

struct Cursor {
    page: PageSetup,
    pages: Vec<PageLayout>,
    current: PageLayout,
    y: f32,
}

impl Cursor {
    fn new(page: PageSetup) -> Self {
        Self {
            page,
            pages: Vec::new(),
            current: PageLayout::default(),
            y: page.content_top(),
        }
    }

    fn remaining(&self) -> f32 {
        self.y - self.page.margin_bottom
    }

    fn at_page_top(&self) -> bool {
        self.y >= self.page.content_top()
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = self.page.content_top();
    }

    fn finish(mut self) -> Vec<PageLayout> {
        self.pages.push(self.current);
        self.pages
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        let style = paragraph.style;
        let leading = style.leading();
        let left = self.page.margin_left;
        let width = self.page.content_width();

        for line in wrap_text(&paragraph.text, style, width) {
            if leading > self.remaining() && !self.at_page_top() {
                self.break_page();
            }
            if !line.is_empty() {
                let x = aligned_x(&line, style, paragraph.align, left, width);
                self.current.ops.push(DrawOp::Text(TextRun {
                    baseline: self.y - baseline_offset(style),
                    text: line,
                    x,
                    style,
                }));
            }
            self.y -= leading;
        }
    }

    fn table(&mut self, table: &Table) -> Result<(), LayoutError> {
        if table.relative_widths.is_empty()
            || table.relative_widths.iter().any(|ratio| *ratio <= 0.0)
        {
            return Err(LayoutError::InvalidColumnWidths);
        }

        let content_width = self.page.content_width();
        let total_width = content_width * table.width_percent / 100.0;
        let left = self.page.margin_left + (content_width - total_width) / 2.0;
        let widths = table.column_widths(total_width);

        let rows = std::iter::once(&table.header).chain(table.rows.iter());
        for (index, row) in rows.enumerate() {
            if row.len() != widths.len() {
                return Err(LayoutError::ColumnMismatch {
                    row: index,
                    columns: widths.len(),
                    cells: row.len(),
                });
            }

            let wrapped: Vec<Vec<String>> = row
                .iter()
                .zip(&widths)
                .map(|(cell, width)| wrap_text(&cell.text, cell.style, width - 2.0 * cell.padding))
                .collect();
            let height = row_height(row, &wrapped);

            if height > self.remaining() && !self.at_page_top() {
                self.break_page();
            }
            if height <= self.remaining() {
                self.row(row, &wrapped, &widths, left, height);
                self.y -= height;
            } else {
                self.split_row(index, row, wrapped, &widths, left)?;
            }
        }

        Ok(())
    }

    /// Lay out a row taller than a whole page, breaking its cells at line
    /// boundaries and continuing them on the following pages.
    fn split_row(
        &mut self,
        index: usize,
        cells: &[Cell],
        mut pending: Vec<Vec<String>>,
        widths: &[f32],
        left: f32,
    ) -> Result<(), LayoutError> {
        loop {
            let remaining = self.remaining();
            let height = row_height(cells, &pending);
            if height <= remaining {
                self.row(cells, &pending, widths, left, height);
                self.y -= height;
                return Ok(());
            }

            let mut fragment = Vec::with_capacity(cells.len());
            for (cell, lines) in cells.iter().zip(pending.iter_mut()) {
                let capacity = ((remaining - 2.0 * cell.padding) / cell.style.leading())
                    .floor()
                    .max(0.0) as usize;
                let rest = lines.split_off(capacity.min(lines.len()));
                fragment.push(std::mem::replace(lines, rest));
            }

            if fragment.iter().all(Vec::is_empty) {
                if self.at_page_top() {
                    // not even one line fits on an empty page
                    return Err(LayoutError::RowTooTall {
                        row: index,
                        height,
                        available: self.page.content_height(),
                    });
                }
                self.break_page();
                continue;
            }

            let fragment_height = row_height(cells, &fragment);
            self.row(cells, &fragment, widths, left, fragment_height);
            self.break_page();
        }
    }

    fn row(&mut self, cells: &[Cell], wrapped: &[Vec<String>], widths: &[f32], left: f32, height: f32) {
        let top = self.y;
        let mut x = left;

        for ((cell, lines), width) in cells.iter().zip(wrapped).zip(widths) {
            let bounds = Bounds {
                x,
                y: top - height,
                width: *width,
                height,
            };
            if let Some(color) = cell.background {
                self.current.ops.push(DrawOp::Fill { bounds, color });
            }
            self.current.ops.push(DrawOp::Border {
                bounds,
                width: BORDER_WIDTH,
            });

            let leading = cell.style.leading();
            let block_height = lines.len() as f32 * leading;
            let offset = match cell.v_align {
                VAlign::Top => cell.padding,
                VAlign::Middle => (height - block_height) / 2.0,
            };
            let inner_left = x + cell.padding;
            let inner_width = width - 2.0 * cell.padding;

            for (line_index, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let line_top = top - offset - line_index as f32 * leading;
                self.current.ops.push(DrawOp::Text(TextRun {
                    text: line.clone(),
                    x: aligned_x(line, cell.style, cell.h_align, inner_left, inner_width),
                    baseline: line_top - baseline_offset(cell.style),
                    style: cell.style,
                }));
            }

            x += width;
        }
    }
}

fn cell_height(cell: &Cell, lines: usize) -> f32 {
    lines as f32 * cell.style.leading() + 2.0 * cell.padding
}

fn row_height(cells: &[Cell], wrapped: &[Vec<String>]) -> f32 {
    cells
        .iter()
        .zip(wrapped)
        .map(|(cell, lines)| cell_height(cell, lines.len()))
        .fold(0.0_f32, f32::max)
}

/// Distance from the top of a line box down to its baseline.
fn baseline_offset(style: TextStyle) -> f32 {
    (style.leading() - style.size) / 2.0 + style.size * ASCENT
}

fn aligned_x(line: &str, style: TextStyle, align: HAlign, left: f32, width: f32) -> f32 {
    match align {
        HAlign::Left => left,
        HAlign::Center => left + (width - text_width(line, style)).max(0.0) / 2.0,
    }
}

/// Greedy word wrap; words wider than a line are broken by characters.
///
/// Always returns at least one (possibly empty) line.
pub fn wrap_text(text: &str, style: TextStyle, max_width: f32) -> Vec<String> {
    let space = text_width(" ", style);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in paragraph.split_whitespace() {
            let word_width = text_width(word, style);
            let needed = if current.is_empty() {
                word_width
            } else {
                current_width + space + word_width
            };

            if needed <= max_width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_width = needed;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }

            if word_width <= max_width {
                current.push_str(word);
                current_width = word_width;
            } else {
                for ch in word.chars() {
                    let ch_width = text_width(ch.encode_utf8(&mut [0; 4]), style);
                    if current_width + ch_width > max_width && !current.is_empty() {
                        lines.push(std::mem::take(&mut current));
                        current_width = 0.0;
                    }
                    current.push(ch);
                    current_width += ch_width;
                }
            }
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fonts::text_width;
    use crate::report::models::{PatientRecord, ReportMessage};
    use crate::report::render::render;
    use chrono::NaiveDate;

    fn message(patients: usize, symptoms: &str) -> ReportMessage {
        let visit = PatientRecord {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 1),
            appointment_date: NaiveDate::from_ymd_opt(2024, 1, 10)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            symptoms: Some(symptoms.to_string()),
        };
        ReportMessage {
            doctor_name: "Smith".into(),
            specialization: "Cardiology".into(),
            period: "2024-Q1".into(),
            total_patients: patients as u32,
            patient_details: vec![visit; patients],
        }
    }

    fn borders(page: &PageLayout) -> Vec<Bounds> {
        page.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Border { bounds, .. } => Some(*bounds),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_wrap_text_short() {
        let lines = wrap_text("Chest pain", TextStyle::regular(10.0), 200.0);
        assert_eq!(lines, vec!["Chest pain"]);
    }

    #[test]
    fn test_wrap_text_empty() {
        assert_eq!(wrap_text("", TextStyle::regular(10.0), 100.0), vec![String::new()]);
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let style = TextStyle::regular(10.0);
        let text = "persistent headache with nausea and light sensitivity since last week";
        let lines = wrap_text(text, style, 80.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, style) <= 80.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_text_breaks_long_words() {
        let style = TextStyle::regular(10.0);
        let word = "x".repeat(100);
        let lines = wrap_text(&word, style, 50.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_title_is_centered() {
        let laid_out = layout(&render(&message(0, ""))).unwrap();
        let title = laid_out.pages[0].texts().next().unwrap();
        let width = text_width(&title.text, title.style);
        let center = title.x + width / 2.0;
        assert!((center - (20.0 + 555.0 / 2.0)).abs() < 0.01);
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let laid_out = layout(&render(&message(0, ""))).unwrap();
        assert_eq!(laid_out.pages.len(), 1);

        let page = &laid_out.pages[0];
        assert_eq!(borders(page).len(), 5);
        let fills = page
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Fill { color, .. } if *color == Rgb8(230, 230, 230)))
            .count();
        assert_eq!(fills, 5);
    }

    #[test]
    fn test_table_spans_content_width_with_ratios() {
        let laid_out = layout(&render(&message(1, "Chest pain"))).unwrap();
        let header: Vec<Bounds> = borders(&laid_out.pages[0]).into_iter().take(5).collect();

        assert!((header[0].x - 20.0).abs() < 1e-3);
        let total: f32 = header.iter().map(|b| b.width).sum();
        assert!((total - 555.0).abs() < 1e-3);
        for narrow in &header[..4] {
            assert!((narrow.width - header[0].width).abs() < 1e-3);
        }
        assert!((header[4].width - 2.0 * header[0].width).abs() < 1e-3);
    }

    #[test]
    fn test_many_rows_paginate_without_splitting() {
        let laid_out = layout(&render(&message(150, "Chest pain"))).unwrap();
        assert!(laid_out.pages.len() > 1);

        let total_cells: usize = laid_out.pages.iter().map(|p| borders(p).len()).sum();
        assert_eq!(total_cells, 5 * 151);

        for page in &laid_out.pages {
            for bounds in borders(page) {
                assert!(bounds.y >= 30.0 - 1e-3);
                assert!(bounds.y + bounds.height <= 842.0 - 30.0 + 1e-3);
            }
            // whole rows only: every page carries a multiple of five cells
            assert_eq!(borders(page).len() % 5, 0);
        }
    }

    #[test]
    fn test_layout_is_deterministic() {
        let document = render(&message(40, "Cough and fever"));
        assert_eq!(layout(&document).unwrap(), layout(&document).unwrap());
    }

    fn symptom_lines(laid_out: &LaidOutDocument) -> Vec<String> {
        // the symptoms column starts two thirds into the 555pt table
        let column_left = 20.0 + 555.0 * 8.0 / 12.0;
        laid_out
            .pages
            .iter()
            .flat_map(|page| page.texts())
            .filter(|run| run.x > column_left && run.style == TextStyle::regular(10.0))
            .map(|run| run.text.clone())
            .collect()
    }

    #[test]
    fn test_row_taller_than_page_continues_on_next_pages() {
        let symptoms = "persistent chest pain ".repeat(400);
        let laid_out = layout(&render(&message(1, &symptoms))).unwrap();
        assert!(laid_out.pages.len() > 2);

        assert_eq!(symptom_lines(&laid_out).join(" "), symptoms.trim_end());

        // the short cells of the row are drawn once, on the first fragment
        let names: Vec<&TextRun> = laid_out
            .pages
            .iter()
            .flat_map(|page| page.texts())
            .filter(|run| run.text == "Jane")
            .collect();
        assert_eq!(names.len(), 1);

        for page in &laid_out.pages {
            for bounds in borders(page) {
                assert!(bounds.y >= 30.0 - 1e-3);
                assert!(bounds.y + bounds.height <= 842.0 - 30.0 + 1e-3);
            }
            for run in page.texts() {
                assert!(run.baseline >= 30.0);
            }
        }
    }

    #[test]
    fn test_tall_row_after_short_rows_keeps_their_order() {
        let mut message = message(3, "Cough");
        message.patient_details[1].symptoms = Some("fever ".repeat(1500));
        let laid_out = layout(&render(&message)).unwrap();

        let lines = symptom_lines(&laid_out);
        assert_eq!(lines.first().map(String::as_str), Some("Cough"));
        assert_eq!(lines.last().map(String::as_str), Some("Cough"));
        assert_eq!(lines[1..lines.len() - 1].join(" "), "fever ".repeat(1500).trim_end());
    }

    #[test]
    fn test_column_mismatch_fails() {
        let mut document = render(&message(1, "Cough"));
        if let Some(Block::Table(table)) = document.blocks.last_mut() {
            table.rows[0].pop();
        }
        assert_eq!(
            layout(&document).unwrap_err(),
            LayoutError::ColumnMismatch {
                row: 1,
                columns: 5,
                cells: 4
            }
        );
    }
}
