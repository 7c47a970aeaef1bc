//! PDF rendering engine.
//!
//! Serializes laid-out pages with `printpdf` using the built-in Helvetica
//! faces, so no font files are needed at runtime. Document dates and the
//! document id are derived from the generation time and title.

use std::io::BufWriter;

use chrono::NaiveDateTime;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, OffsetDateTime, PdfDocument,
    PdfLayerReference, Point, Rect, Rgb,
};
use uuid::Uuid;

use super::layout::{Bounds, DrawOp, LaidOutDocument, PageLayout};
use super::render::{FontFace, Rgb8};
use super::ReportError;

const BLACK: Rgb8 = Rgb8(0, 0, 0);

/// Stateless engine for encoding laid-out reports as PDF.
pub struct PdfRenderEngine;

impl PdfRenderEngine {
    /// Encode every page of `document` and return the PDF bytes.
    pub fn encode(
        document: &LaidOutDocument,
        generated_at: NaiveDateTime,
    ) -> Result<Vec<u8>, ReportError> {
        let setup = document.page;
        let stamp = OffsetDateTime::from_unix_timestamp(generated_at.and_utc().timestamp())
            .map_err(|e| ReportError::Encode(format!("invalid generation time: {e}")))?;

        let (doc, first_page, first_layer) = PdfDocument::new(
            &document.title,
            mm(setup.width),
            mm(setup.height),
            "Layer 1",
        );
        let doc = doc
            .with_creation_date(stamp)
            .with_mod_date(stamp)
            .with_metadata_date(stamp)
            .with_document_id(document_id(&document.title, generated_at));

        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Encode(format!("font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Encode(format!("font error: {e}")))?;
        let fonts = Fonts { regular, bold };

        for (index, page) in document.pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_index, layer_index) = doc.add_page(
                    mm(setup.width),
                    mm(setup.height),
                    format!("Page {}", index + 1),
                );
                doc.get_page(page_index).get_layer(layer_index)
            };
            draw_page(&layer, page, &fonts);
        }

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| ReportError::Encode(format!("save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ReportError::Encode(format!("buffer error: {e}")))
    }
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Fonts {
    fn get(&self, face: FontFace) -> &IndirectFontRef {
        match face {
            FontFace::Regular => &self.regular,
            FontFace::Bold => &self.bold,
        }
    }
}

fn draw_page(layer: &PdfLayerReference, page: &PageLayout, fonts: &Fonts) {
    for op in &page.ops {
        match op {
            DrawOp::Fill { bounds, color } => {
                layer.set_fill_color(color_of(*color));
                layer.add_rect(Rect::new(
                    mm(bounds.x),
                    mm(bounds.y),
                    mm(bounds.x + bounds.width),
                    mm(bounds.y + bounds.height),
                ));
                layer.set_fill_color(color_of(BLACK));
            }
            DrawOp::Border { bounds, width } => {
                layer.set_outline_color(color_of(BLACK));
                layer.set_outline_thickness(*width);
                layer.add_line(outline(bounds));
            }
            DrawOp::Text(run) => {
                layer.use_text(
                    run.text.as_str(),
                    run.style.size,
                    mm(run.x),
                    mm(run.baseline),
                    fonts.get(run.style.face),
                );
            }
        }
    }
}

fn outline(bounds: &Bounds) -> Line {
    let left = mm(bounds.x);
    let right = mm(bounds.x + bounds.width);
    let bottom = mm(bounds.y);
    let top = mm(bounds.y + bounds.height);

    Line {
        points: vec![
            (Point::new(left, bottom), false),
            (Point::new(right, bottom), false),
            (Point::new(right, top), false),
            (Point::new(left, top), false),
        ],
        is_closed: true,
    }
}

fn color_of(color: Rgb8) -> Color {
    let Rgb8(r, g, b) = color;
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn document_id(title: &str, generated_at: NaiveDateTime) -> String {
    let seed = format!("{title}|{}", generated_at.format("%Y%m%d%H%M%S"));
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes())
        .simple()
        .to_string()
}

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}
