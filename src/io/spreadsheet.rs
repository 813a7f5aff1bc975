use std::path::Path;

use anyhow::Result;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};

use crate::application::{LedgerReport, MISSING_CODE};

const HEADER_FILL: u32 = 0x1E90FF;

const HEADERS: [&str; 13] = [
    "Internal Plan",
    "Expense Nature",
    "PTRES",
    "Source",
    "Note No.",
    "Original Value",
    "Remaining Value",
    "Note Description",
    "Deadline",
    "Commitment Date",
    "Commitment Value",
    "Commitment Description",
    "Requesting Section",
];

/// Render the report as a styled workbook: bold white-on-blue header row,
/// thin borders throughout, two-decimal money cells, auto-width columns and
/// a grand-totals row.
pub fn write_spreadsheet(report: &LedgerReport, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Commitments")?;

    let header_format = Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);
    let text_format = Format::new().set_border(FormatBorder::Thin);
    let center_format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center);
    let money_format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_num_format("#,##0.00");
    let totals_label_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_border(FormatBorder::Thin);
    let totals_money_format = Format::new()
        .set_bold()
        .set_border(FormatBorder::Thin)
        .set_num_format("#,##0.00");

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_with_format(0, col as u16, *header, &header_format)?;
    }

    for (i, row) in report.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_with_format(r, 0, row.plan_code.as_str(), &text_format)?;
        worksheet.write_with_format(r, 1, row.nature_code.as_str(), &text_format)?;
        worksheet.write_with_format(r, 2, row.ptres.as_str(), &center_format)?;
        worksheet.write_with_format(r, 3, row.source.as_str(), &center_format)?;
        worksheet.write_with_format(r, 4, row.note_number.as_str(), &center_format)?;
        worksheet.write_with_format(r, 5, cents_to_units(row.note_value), &money_format)?;
        worksheet.write_with_format(r, 6, cents_to_units(row.note_remaining), &money_format)?;
        worksheet.write_with_format(r, 7, row.note_description.as_str(), &text_format)?;
        worksheet.write_with_format(
            r,
            8,
            row.deadline.format("%d/%m/%Y").to_string(),
            &center_format,
        )?;

        match &row.commitment {
            Some(c) => {
                worksheet.write_with_format(
                    r,
                    9,
                    c.date.format("%d/%m/%Y %H:%M").to_string(),
                    &center_format,
                )?;
                worksheet.write_with_format(r, 10, cents_to_units(c.value), &money_format)?;
                worksheet.write_with_format(r, 11, c.description.as_str(), &text_format)?;
                worksheet.write_with_format(r, 12, c.section_code.as_str(), &center_format)?;
            }
            None => {
                worksheet.write_with_format(r, 9, "No commitments", &center_format)?;
                worksheet.write_with_format(r, 10, "", &center_format)?;
                worksheet.write_with_format(r, 11, "", &text_format)?;
                worksheet.write_with_format(r, 12, MISSING_CODE, &center_format)?;
            }
        }
    }

    // Blank spacer row, then the grand totals.
    let totals_row = report.rows.len() as u32 + 2;
    worksheet.write_with_format(totals_row, 0, "GRAND TOTALS", &totals_label_format)?;
    worksheet.write_with_format(
        totals_row,
        5,
        cents_to_units(report.totals.original),
        &totals_money_format,
    )?;
    worksheet.write_with_format(
        totals_row,
        6,
        cents_to_units(report.totals.remaining),
        &totals_money_format,
    )?;
    worksheet.write_with_format(
        totals_row,
        10,
        cents_to_units(report.totals.committed),
        &totals_money_format,
    )?;

    worksheet.autofit();
    workbook.save(path)?;
    Ok(())
}

fn cents_to_units(cents: i64) -> f64 {
    cents as f64 / 100.0
}
