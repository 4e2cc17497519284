//! Printable dispatch summary.
//!
//! US Letter pages laid out in points from the bottom-left corner. The first
//! page carries the office, guide number and date above the line table;
//! lines that do not fit continue on further pages under a repeated table
//! header.

use std::{fs, path::Path};

use printpdf::{
    path::PaintMode, BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Pt, Rect, Rgb,
};

use crate::errors::Error;

use super::aggregate::Dispatch;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;

const TABLE_LEFT: f32 = 50.0;
const FIRST_TABLE_TOP: f32 = PAGE_HEIGHT - 180.0;
const NEXT_TABLE_TOP: f32 = PAGE_HEIGHT - 50.0;
const TABLE_BOTTOM: f32 = 50.0;

const HEADER_ROW_HEIGHT: f32 = 24.0;
const ROW_HEIGHT: f32 = 18.0;
const CELL_PADDING: f32 = 4.0;
const TABLE_FONT_SIZE: f32 = 10.0;

const COLUMNS: [(&str, f32); 5] = [
    ("Código", 70.0),
    ("Descripción", 200.0),
    ("Cantidad", 70.0),
    ("Folio Inicial", 85.0),
    ("Folio Final", 85.0),
];

const GREY: (f32, f32, f32) = (0.5, 0.5, 0.5);
const WHITESMOKE: (f32, f32, f32) = (0.96, 0.96, 0.96);
const BLACK: (f32, f32, f32) = (0.0, 0.0, 0.0);

/// Renders the dispatch and writes it into `dir`. Returns the file name.
pub fn write(dispatch: &Dispatch, dir: &Path) -> Result<String, Error> {
    let file_name = dispatch.pdf_file_name();
    let bytes = render(dispatch)?;
    fs::write(dir.join(&file_name), bytes)?;

    tracing::info!("Wrote {} ({} lines)", file_name, dispatch.lines.len());
    Ok(file_name)
}

pub fn render(dispatch: &Dispatch) -> Result<Vec<u8>, Error> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        format!("Guía de Despacho {}", dispatch.guide_number),
        mm(PAGE_WIDTH),
        mm(PAGE_HEIGHT),
        "Guía",
    );
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(render_error)?,
    };

    let rows: Vec<[String; 5]> = dispatch.lines.iter().map(|line| line.cells()).collect();
    let pages = paginate(rows.len());

    draw_heading(&doc.get_page(first_page).get_layer(first_layer), &fonts, dispatch);

    for (number, range) in pages.into_iter().enumerate() {
        let (layer, top) = if number == 0 {
            (doc.get_page(first_page).get_layer(first_layer), FIRST_TABLE_TOP)
        } else {
            let (page, layer) = doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Guía");
            (doc.get_page(page).get_layer(layer), NEXT_TABLE_TOP)
        };
        draw_table(&layer, &fonts, top, &rows[range]);
    }

    doc.save_to_bytes().map_err(render_error)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn draw_heading(layer: &PdfLayerReference, fonts: &Fonts, dispatch: &Dispatch) {
    layer.set_fill_color(rgb(BLACK));
    layer.use_text(
        format!("Oficina: {}", dispatch.office),
        12.0,
        mm(200.0),
        mm(PAGE_HEIGHT - 130.0),
        &fonts.bold,
    );
    layer.use_text(
        format!("Guía N°: {}", dispatch.guide_number),
        12.0,
        mm(200.0),
        mm(PAGE_HEIGHT - 150.0),
        &fonts.bold,
    );
    layer.use_text(
        format!("Fecha: {}", dispatch.formatted_date()),
        12.0,
        mm(400.0),
        mm(PAGE_HEIGHT - 150.0),
        &fonts.bold,
    );
}

fn draw_table(layer: &PdfLayerReference, fonts: &Fonts, top: f32, rows: &[[String; 5]]) {
    let width: f32 = COLUMNS.iter().map(|(_, w)| w).sum();
    let header_bottom = top - HEADER_ROW_HEIGHT;
    let bottom = header_bottom - ROW_HEIGHT * rows.len() as f32;

    // Header band
    layer.set_fill_color(rgb(GREY));
    layer.add_rect(
        Rect::new(mm(TABLE_LEFT), mm(header_bottom), mm(TABLE_LEFT + width), mm(top))
            .with_mode(PaintMode::Fill),
    );
    layer.set_fill_color(rgb(WHITESMOKE));
    let mut x = TABLE_LEFT;
    for (title, w) in COLUMNS {
        draw_centered(layer, &fonts.bold, title, x, w, header_bottom + 10.0);
        x += w;
    }

    layer.set_fill_color(rgb(BLACK));
    for (i, cells) in rows.iter().enumerate() {
        let row_bottom = header_bottom - ROW_HEIGHT * (i + 1) as f32;
        let mut x = TABLE_LEFT;
        for (text, (_, w)) in cells.iter().zip(COLUMNS) {
            draw_centered(layer, &fonts.regular, text, x, w, row_bottom + 6.0);
            x += w;
        }
    }

    // Grid
    layer.set_outline_color(rgb(BLACK));
    layer.set_outline_thickness(1.0);
    let mut y = top;
    horizontal(layer, TABLE_LEFT, TABLE_LEFT + width, y);
    y -= HEADER_ROW_HEIGHT;
    horizontal(layer, TABLE_LEFT, TABLE_LEFT + width, y);
    for _ in rows {
        y -= ROW_HEIGHT;
        horizontal(layer, TABLE_LEFT, TABLE_LEFT + width, y);
    }
    let mut x = TABLE_LEFT;
    vertical(layer, x, bottom, top);
    for (_, w) in COLUMNS {
        x += w;
        vertical(layer, x, bottom, top);
    }
}

fn draw_centered(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    x: f32,
    width: f32,
    baseline: f32,
) {
    let text = fit(text, width - 2.0 * CELL_PADDING);
    let offset = ((width - text_width(&text)) / 2.0).max(CELL_PADDING);
    layer.use_text(text, TABLE_FONT_SIZE, mm(x + offset), mm(baseline), font);
}

/// Builtin fonts carry no metrics here; Helvetica averages about half an em
/// per character.
fn text_width(text: &str) -> f32 {
    text.chars().count() as f32 * TABLE_FONT_SIZE * 0.52
}

fn fit(text: &str, width: f32) -> String {
    if text_width(text) <= width {
        return text.to_string();
    }
    let keep = ((width / (TABLE_FONT_SIZE * 0.52)) as usize).saturating_sub(3);
    let mut fitted: String = text.chars().take(keep).collect();
    fitted.push_str("...");
    fitted
}

/// Splits `rows` lines into per-page index ranges. There is always at least
/// one page, even with no lines.
fn paginate(rows: usize) -> Vec<std::ops::Range<usize>> {
    let capacity = |top: f32| ((top - HEADER_ROW_HEIGHT - TABLE_BOTTOM) / ROW_HEIGHT) as usize;

    let mut pages = Vec::new();
    let mut start = 0;
    let mut per_page = capacity(FIRST_TABLE_TOP);
    loop {
        let end = (start + per_page).min(rows);
        pages.push(start..end);
        if end >= rows {
            return pages;
        }
        start = end;
        per_page = capacity(NEXT_TABLE_TOP);
    }
}

fn horizontal(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32) {
    stroke(layer, (x1, y), (x2, y));
}

fn vertical(layer: &PdfLayerReference, x: f32, y1: f32, y2: f32) {
    stroke(layer, (x, y1), (x, y2));
}

fn stroke(layer: &PdfLayerReference, from: (f32, f32), to: (f32, f32)) {
    layer.add_line(Line {
        points: vec![
            (Point::new(mm(from.0), mm(from.1)), false),
            (Point::new(mm(to.0), mm(to.1)), false),
        ],
        is_closed: false,
    });
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn rgb((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn render_error(err: impl std::fmt::Display) -> Error {
    Error::Render {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::dispatches::{DispatchLine, GuideNumber, Office};

    fn dispatch(lines: usize) -> Dispatch {
        Dispatch::new(
            GuideNumber::new(21).unwrap(),
            Office::SanCarlos,
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            (0..lines)
                .map(|i| {
                    DispatchLine::new(
                        format!("TB-{}", i),
                        "Talonario de boletas electrónicas".into(),
                        Some(5),
                        "5001".into(),
                        "5100".into(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn writes_named_pdf_into_directory() {
        let dir = tempfile::tempdir().unwrap();

        let file = write(&dispatch(3), dir.path()).unwrap();

        assert_eq!(file, "Guia_21_Oficina_San_Carlos.pdf");
        let bytes = fs::read(dir.path().join(&file)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_empty_and_long_dispatches() {
        assert!(render(&dispatch(0)).unwrap().starts_with(b"%PDF"));
        assert!(render(&dispatch(80)).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn short_dispatch_fits_one_page() {
        assert_eq!(paginate(0), vec![0..0]);
        assert_eq!(paginate(5), vec![0..5]);
    }

    #[test]
    fn long_dispatch_continues_on_next_pages() {
        let pages = paginate(80);

        assert!(pages.len() > 1);
        assert_eq!(pages.first().unwrap().start, 0);
        assert_eq!(pages.last().unwrap().end, 80);
        assert!(pages.windows(2).all(|w| w[0].end == w[1].start));
    }

    #[test]
    fn long_text_is_truncated_to_cell() {
        let fitted = fit(&"x".repeat(100), 62.0);

        assert!(fitted.ends_with("..."));
        assert!(text_width(&fitted) <= 62.0 + TABLE_FONT_SIZE);
    }
}
