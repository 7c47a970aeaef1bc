//! Report renderer: turns a report message into a layout-independent document model.
//!
//! The model records *what* goes on the page (text, styles, table geometry
//! ratios); [`super::layout`] decides *where* it goes.

use super::models::{NormalizedRow, ReportMessage};
use super::normalize::normalize_all;

pub const TITLE_PREFIX: &str = "Report for doctor: ";
pub const HEADER_LABELS: [&str; 5] = [
    "Name",
    "Surname",
    "Date of birth",
    "Appointment date",
    "Reports",
];
/// First name, last name, date of birth, appointment date, symptoms.
pub const COLUMN_RATIOS: [f32; 5] = [2.0, 2.0, 2.0, 2.0, 4.0];
pub const HEADER_BACKGROUND: Rgb8 = Rgb8(230, 230, 230);
pub const CELL_PADDING: f32 = 5.0;

const TITLE_STYLE: TextStyle = TextStyle::bold(16.0);
const SUMMARY_STYLE: TextStyle = TextStyle::regular(12.0);
const HEADER_STYLE: TextStyle = TextStyle::bold(12.0);
const BODY_STYLE: TextStyle = TextStyle::regular(10.0);

const BODY_ALIGNMENT: [HAlign; 5] = [
    HAlign::Left,
    HAlign::Left,
    HAlign::Center,
    HAlign::Center,
    HAlign::Left,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
}

impl TextStyle {
    pub const fn regular(size: f32) -> Self {
        Self {
            face: FontFace::Regular,
            size,
        }
    }

    pub const fn bold(size: f32) -> Self {
        Self {
            face: FontFace::Bold,
            size,
        }
    }

    /// Distance between consecutive baselines.
    pub fn leading(&self) -> f32 {
        self.size * 1.5
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8(pub u8, pub u8, pub u8);

/// Page size and margins, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageSetup {
    pub const A4: Self = Self {
        width: 595.0,
        height: 842.0,
        margin_left: 0.0,
        margin_right: 0.0,
        margin_top: 0.0,
        margin_bottom: 0.0,
    };

    pub const fn with_margins(self, left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            margin_left: left,
            margin_right: right,
            margin_top: top,
            margin_bottom: bottom,
            ..self
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn content_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom
    }

    /// Y coordinate (from the page bottom) where content starts.
    pub fn content_top(&self) -> f32 {
        self.height - self.margin_top
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub style: TextStyle,
    pub align: HAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub style: TextStyle,
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub background: Option<Rgb8>,
    pub padding: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Share of the content width the table spans.
    pub width_percent: f32,
    /// Relative column widths; only their proportions matter.
    pub relative_widths: Vec<f32>,
    pub header: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Header row plus body rows.
    pub fn row_count(&self) -> usize {
        1 + self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.relative_widths.len()
    }

    /// Absolute column widths for a table of `total` width.
    pub fn column_widths(&self, total: f32) -> Vec<f32> {
        let sum: f32 = self.relative_widths.iter().sum();
        self.relative_widths
            .iter()
            .map(|ratio| total * ratio / sum)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// In-memory document, consumed once by the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    /// Document title, also used as PDF metadata.
    pub title: String,
    pub page: PageSetup,
    pub blocks: Vec<Block>,
}

impl RenderedDocument {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(paragraph) => Some(paragraph),
            Block::Table(_) => None,
        })
    }

    pub fn table(&self) -> Option<&Table> {
        self.blocks.iter().find_map(|block| match block {
            Block::Table(table) => Some(table),
            Block::Paragraph(_) => None,
        })
    }
}

/// Render a report, normalizing its patient rows first.
pub fn render(message: &ReportMessage) -> RenderedDocument {
    render_rows(message, &normalize_all(&message.patient_details))
}

/// Render a report from already-normalized rows.
pub fn render_rows(message: &ReportMessage, rows: &[NormalizedRow]) -> RenderedDocument {
    let title = format!("{TITLE_PREFIX}{}", message.doctor_name);

    let mut blocks = vec![Block::Paragraph(Paragraph {
        text: title.clone(),
        style: TITLE_STYLE,
        align: HAlign::Center,
    })];

    let summary = [
        format!("Specialization: {}", message.specialization),
        format!("Period: {}", message.period),
        format!("All patients: {}", message.total_patients),
        String::new(),
    ];
    blocks.extend(summary.into_iter().map(|text| {
        Block::Paragraph(Paragraph {
            text,
            style: SUMMARY_STYLE,
            align: HAlign::Left,
        })
    }));

    blocks.push(Block::Table(patient_table(rows)));

    RenderedDocument {
        title,
        page: PageSetup::A4.with_margins(20.0, 20.0, 30.0, 30.0),
        blocks,
    }
}

fn patient_table(rows: &[NormalizedRow]) -> Table {
    let header = HEADER_LABELS
        .iter()
        .map(|label| Cell {
            text: (*label).to_string(),
            style: HEADER_STYLE,
            h_align: HAlign::Center,
            v_align: VAlign::Middle,
            background: Some(HEADER_BACKGROUND),
            padding: CELL_PADDING,
        })
        .collect();

    let body = rows
        .iter()
        .map(|row| {
            row.cells()
                .iter()
                .zip(BODY_ALIGNMENT)
                .map(|(text, h_align)| Cell {
                    text: (*text).to_string(),
                    style: BODY_STYLE,
                    h_align,
                    v_align: VAlign::Top,
                    background: None,
                    padding: CELL_PADDING,
                })
                .collect()
        })
        .collect();

    Table {
        width_percent: 100.0,
        relative_widths: COLUMN_RATIOS.to_vec(),
        header,
        rows: body,
    }
}
