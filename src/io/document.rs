use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Result;
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};

use crate::application::{LedgerReport, MISSING_CODE};
use crate::domain::format_cents;

const TITLE: &str = "Detailed Report of Credit Notes and Commitments";

// Landscape A4.
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 12.0;
const ROW_HEIGHT: f32 = 7.0;

// Column label and width in mm; widths sum to the printable area.
const COLUMNS: [(&str, f32); 11] = [
    ("Internal Plan", 24.0),
    ("Expense Nature", 26.0),
    ("PTRES", 16.0),
    ("Source", 24.0),
    ("Note No.", 20.0),
    ("Original", 22.0),
    ("Remaining", 22.0),
    ("Date", 26.0),
    ("Commitment", 22.0),
    ("Description", 48.0),
    ("Section", 23.0),
];

/// Render the report as a paginated landscape document: a title, the data
/// table with a header repeated on every page, and a totals table.
pub fn write_document(report: &LedgerReport, path: &Path) -> Result<()> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(TITLE, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    layer.set_outline_thickness(0.2);

    let mut y = PAGE_HEIGHT - MARGIN - 6.0;
    layer.use_text(TITLE, 16.0, Mm(MARGIN), Mm(y), &bold);
    y -= 10.0;

    draw_header_row(&layer, &bold, y);
    y -= ROW_HEIGHT;

    for row in &report.rows {
        if y < MARGIN + ROW_HEIGHT {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            layer = doc.get_page(page).get_layer(page_layer);
            layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
            layer.set_outline_thickness(0.2);
            y = PAGE_HEIGHT - MARGIN;
            draw_header_row(&layer, &bold, y);
            y -= ROW_HEIGHT;
        }

        let (date, value, description, section) = match &row.commitment {
            Some(c) => (
                c.date.format("%d/%m/%Y").to_string(),
                format_cents(c.value),
                c.description.clone(),
                c.section_code.clone(),
            ),
            None => (
                "None".to_string(),
                String::new(),
                String::new(),
                MISSING_CODE.to_string(),
            ),
        };
        let cells = [
            row.plan_code.clone(),
            row.nature_code.clone(),
            row.ptres.clone(),
            row.source.clone(),
            row.note_number.clone(),
            format_cents(row.note_value),
            format_cents(row.note_remaining),
            date,
            value,
            description,
            section,
        ];
        draw_cells(&layer, &font, 8.0, y, &cells);
        draw_rule(&layer, y - 2.0);
        y -= ROW_HEIGHT;
    }

    // Totals table, moved to a fresh page when the current one is full.
    if y < MARGIN + 3.0 * ROW_HEIGHT {
        let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        layer = doc.get_page(page).get_layer(page_layer);
        layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.set_outline_thickness(0.2);
        y = PAGE_HEIGHT - MARGIN;
    }
    y -= 4.0;
    layer.use_text("Grand Totals", 12.0, Mm(MARGIN), Mm(y), &bold);
    y -= ROW_HEIGHT;
    let totals = [
        ("Total Original Value", format_cents(report.totals.original)),
        ("Total Remaining Value", format_cents(report.totals.remaining)),
        ("Total Committed Value", format_cents(report.totals.committed)),
    ];
    let mut x = MARGIN;
    for (label, amount) in totals {
        layer.use_text(label, 9.0, Mm(x), Mm(y), &bold);
        layer.use_text(amount.as_str(), 9.0, Mm(x), Mm(y - 5.0), &font);
        x += 60.0;
    }
    draw_rule(&layer, y - 8.0);

    doc.save(&mut BufWriter::new(File::create(path)?))?;
    Ok(())
}

fn draw_header_row(layer: &PdfLayerReference, bold: &IndirectFontRef, y: f32) {
    let labels: Vec<String> = COLUMNS.iter().map(|(label, _)| label.to_string()).collect();
    draw_cells(layer, bold, 8.0, y, &labels);
    draw_rule(layer, y - 2.0);
}

fn draw_cells<S: AsRef<str>>(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    size: f32,
    y: f32,
    cells: &[S],
) {
    let mut x = MARGIN;
    for (cell, (_, width)) in cells.iter().zip(COLUMNS.iter()) {
        layer.use_text(fit(cell.as_ref(), *width), size, Mm(x), Mm(y), font);
        x += width;
    }
}

fn draw_rule(layer: &PdfLayerReference, y: f32) {
    let line = Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

/// Truncate a cell to roughly what fits its column at 8pt Helvetica.
fn fit(text: &str, width_mm: f32) -> String {
    let max_chars = (width_mm / 1.7) as usize;
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}
