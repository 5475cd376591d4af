// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Expense-report PDF generation.
//!
//! Produces the paginated travel-report table: per-page header, five boxed
//! columns, filler rows padding the table down to a reserved total-row slot,
//! and a signature block anchored to the bottom edge of the final page.
//!
//! The work is split in two: [`build_report_table`] does all filtering,
//! sorting, and fare arithmetic on plain data, and the renderer walks the
//! resulting rows through one declarative [`TableLayout`] that is re-invoked
//! identically on every page.

use std::path::{Path, PathBuf};

use image::GenericImageView;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::error::{AppError, Result};
use crate::models::{parse_fare, resolve_display_name, resolve_trip_id, ReportConfig, TripRecord};
use crate::time_utils::{format_mmddyy, format_month_year, subtitle_date_or_epoch};

// Letter-size page, coordinates in points. Vertical positions below are
// measured from the top edge and flipped at draw time.
const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;

const TABLE_TOP: f32 = 200.0;
const HEADER_ROW_HEIGHT: f32 = 18.0;
const ROW_HEIGHT: f32 = 16.0;

/// A data row starting below this line would collide with the page bottom.
const DATA_ROW_LIMIT: f32 = 680.0;

const BOTTOM_MARGIN: f32 = 50.0;
const SIGNATURE_LINE_HEIGHT: f32 = 20.0;
const SIGNATURE_SPACING: f32 = 40.0;
/// Safety gap between the last data row and the trailing block.
const TRAILING_BUFFER: f32 = 20.0;

const INFO_BLOCK_TOP: f32 = 130.0;
const INFO_LINE_HEIGHT: f32 = 15.0;
const INFO_RIGHT_COLUMN_X: f32 = 350.0;

const LOGO_TOP: f32 = 50.0;
const LOGO_WIDTH: f32 = 150.0;

const TITLE_FONT_SIZE: f32 = 20.0;
const INFO_FONT_SIZE: f32 = 10.0;
const TABLE_FONT_SIZE: f32 = 9.0;
const SIGNATURE_FONT_SIZE: f32 = 10.0;

const COLUMN_HEADERS: [&str; 5] = ["Date", "Start Location", "Destination", "Amt", "Note"];

/// One rendered table row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub date: String,
    pub start_location: String,
    pub destination: String,
    /// Parsed fare magnitude; the currency symbol appears only in the total.
    pub amount: f64,
}

/// Fully computed report content, ready to draw.
#[derive(Debug, Clone)]
pub struct ReportTable {
    pub rows: Vec<ReportRow>,
    /// Grand total of the unrounded per-row fares
    pub total: f64,
    /// `TOTAL FARES FOR {MONTH} {YEAR}`, from the last sorted row's date
    pub total_label: String,
    /// First sorted row's date, `mm/dd/yy`
    pub period_start: String,
    /// Last sorted row's date, `mm/dd/yy`
    pub period_end: String,
}

/// Filter, sort, and total the trip records for a report.
///
/// Fails with [`AppError::ReportInput`] before any PDF work when the config
/// is incomplete or no completed trips remain after filtering.
pub fn build_report_table(records: &[TripRecord], config: &ReportConfig) -> Result<ReportTable> {
    config.validate()?;

    let mut completed: Vec<&TripRecord> = records
        .iter()
        .filter(|r| r.detail.status.is_completed())
        .collect();

    if completed.is_empty() {
        return Err(AppError::ReportInput(
            "No completed trips to generate report".to_string(),
        ));
    }

    // Date-only sort; unparsable subtitles collapse to epoch zero and sort
    // first. The sort is stable, so same-day trips keep their fetch order.
    completed.sort_by_key(|r| subtitle_date_or_epoch(&r.activity.subtitle));

    let first_date = subtitle_date_or_epoch(&completed[0].activity.subtitle);
    let last_date = subtitle_date_or_epoch(&completed[completed.len() - 1].activity.subtitle);

    let mut rows = Vec::with_capacity(completed.len());
    let mut total = 0.0f64;

    for record in &completed {
        let detail = &record.detail;
        let start_raw = detail.waypoints.first().map(String::as_str).unwrap_or("Unknown");
        let end_raw = detail.waypoints.get(1).map(String::as_str).unwrap_or("Unknown");

        let amount = match parse_fare(&detail.fare) {
            Some(value) => value,
            None => {
                // Open question: an unparsable fare silently totals as zero.
                tracing::warn!(
                    trip_uuid = %resolve_trip_id(&record.activity, &record.detail),
                    fare = %detail.fare,
                    "Unparsable fare counted as zero in report total"
                );
                0.0
            }
        };
        total += amount;

        rows.push(ReportRow {
            date: format_mmddyy(subtitle_date_or_epoch(&record.activity.subtitle)),
            start_location: resolve_display_name(start_raw, &config.address_mappings).to_string(),
            destination: resolve_display_name(end_raw, &config.address_mappings).to_string(),
            amount,
        });
    }

    Ok(ReportTable {
        rows,
        total,
        total_label: format!("TOTAL FARES FOR {}", format_month_year(last_date)),
        period_start: format_mmddyy(first_date),
        period_end: format_mmddyy(last_date),
    })
}

/// Generate the travel-report PDF at `output_path`.
pub fn generate_report(
    records: &[TripRecord],
    config: &ReportConfig,
    output_path: &Path,
) -> Result<PathBuf> {
    let table = build_report_table(records, config)?;

    let logo = config.logo_path.as_deref().and_then(|path| {
        match Logo::load(path) {
            Ok(logo) => Some(logo),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not load logo");
                None
            }
        }
    });

    let mut renderer = Renderer::new(&table, config, logo.is_some());
    renderer.render();

    write_document(renderer.pages, logo.as_ref(), output_path)?;
    tracing::info!(
        rows = table.rows.len(),
        total = table.total,
        output = %output_path.display(),
        "Generated travel report"
    );
    Ok(output_path.to_path_buf())
}

// ─── Layout ──────────────────────────────────────────────────────────────────

/// Declarative table geometry, identical on every page.
struct TableLayout {
    left: f32,
    column_widths: [f32; 5],
}

impl TableLayout {
    fn standard() -> Self {
        Self {
            left: 50.0,
            column_widths: [65.0, 175.0, 175.0, 55.0, 42.0],
        }
    }

    fn width(&self) -> f32 {
        self.column_widths.iter().sum()
    }

    /// Left edge of column `index` (index 5 = right edge of the table).
    fn column_x(&self, index: usize) -> f32 {
        self.left + self.column_widths[..index].iter().sum::<f32>()
    }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

struct Renderer<'a> {
    layout: TableLayout,
    table: &'a ReportTable,
    config: &'a ReportConfig,
    has_logo: bool,
    pages: Vec<Vec<Operation>>,
}

impl<'a> Renderer<'a> {
    fn new(table: &'a ReportTable, config: &'a ReportConfig, has_logo: bool) -> Self {
        Self {
            layout: TableLayout::standard(),
            table,
            config,
            has_logo,
            pages: Vec::new(),
        }
    }

    /// Lay out every page. Data rows and the trailing block check their own
    /// thresholds independently; the trailing block is always anchored to
    /// the bottom of whichever page it lands on.
    fn render(&mut self) {
        let mut y = self.start_page();

        for index in 0..self.table.rows.len() {
            if y > DATA_ROW_LIMIT {
                y = self.start_page();
            }
            self.draw_data_row(y, index);
            y += ROW_HEIGHT;
        }

        let signature2_y = PAGE_HEIGHT - BOTTOM_MARGIN - SIGNATURE_LINE_HEIGHT;
        let signature1_y = signature2_y - SIGNATURE_LINE_HEIGHT;
        let total_row_y = signature1_y - SIGNATURE_SPACING - ROW_HEIGHT;

        if y > total_row_y - TRAILING_BUFFER {
            y = self.start_page();
        }

        // Pad with empty bordered rows so the table stays visually
        // contiguous down to the reserved total-row slot.
        while y + ROW_HEIGHT <= total_row_y {
            self.draw_row_borders(y, ROW_HEIGHT, true);
            y += ROW_HEIGHT;
        }

        self.draw_total_row(y);
        self.draw_signature_line(signature1_y, "Employee Signature");
        self.draw_signature_line(signature2_y, "Supervisor Signature");
    }

    /// Begin a new page: stroke setup, page header, table header row.
    /// Returns the y position of the first data row.
    fn start_page(&mut self) -> f32 {
        let mut ops = Vec::new();
        // Thin gray borders, black text.
        ops.push(Operation::new("w", vec![0.5f32.into()]));
        ops.push(Operation::new("G", vec![0.5f32.into()]));
        ops.push(Operation::new("g", vec![0.0f32.into()]));
        self.pages.push(ops);

        self.draw_page_header();
        self.draw_table_header(TABLE_TOP);
        TABLE_TOP + HEADER_ROW_HEIGHT
    }

    fn draw_page_header(&mut self) {
        if self.has_logo {
            self.draw_logo();
        }

        self.text_right(
            Font::Bold,
            TITLE_FONT_SIZE,
            self.layout.left + self.layout.width(),
            60.0,
            "Travel Report",
        );

        let left = self.layout.left;
        let period = format!(
            "Report Period:    {}    to    {}",
            self.table.period_start, self.table.period_end
        );
        self.text(Font::Regular, INFO_FONT_SIZE, left, INFO_BLOCK_TOP, &period);
        self.text(
            Font::Regular,
            INFO_FONT_SIZE,
            left,
            INFO_BLOCK_TOP + INFO_LINE_HEIGHT,
            &format!("Name:    {}", self.config.name),
        );

        self.text(
            Font::Regular,
            INFO_FONT_SIZE,
            INFO_RIGHT_COLUMN_X,
            INFO_BLOCK_TOP,
            &format!("Vendor Number:    {}", self.config.vendor_number),
        );
        self.text(
            Font::Regular,
            INFO_FONT_SIZE,
            INFO_RIGHT_COLUMN_X,
            INFO_BLOCK_TOP + INFO_LINE_HEIGHT,
            &format!("Purchase Order #:    {}", self.config.purchase_order),
        );
        self.text(
            Font::Regular,
            INFO_FONT_SIZE,
            INFO_RIGHT_COLUMN_X,
            INFO_BLOCK_TOP + 2.0 * INFO_LINE_HEIGHT,
            &format!("Department:    {}", self.config.department),
        );
    }

    fn draw_logo(&mut self) {
        let ops = self.pages.last_mut().expect("page started");
        ops.push(Operation::new("q", vec![]));
        // The image transform is finished in write_document once the logo's
        // aspect ratio is known; here the placement box is emitted with a
        // named height resolved at the same scale.
        ops.push(Operation::new("Do", vec!["Im1".into()]));
        ops.push(Operation::new("Q", vec![]));
    }

    fn draw_table_header(&mut self, y: f32) {
        self.draw_row_borders(y, HEADER_ROW_HEIGHT, true);
        for (index, header) in COLUMN_HEADERS.iter().enumerate() {
            self.text(
                Font::Regular,
                TABLE_FONT_SIZE,
                self.layout.column_x(index) + 5.0,
                y + 5.0,
                header,
            );
        }
    }

    fn draw_data_row(&mut self, y: f32, index: usize) {
        self.draw_row_borders(y, ROW_HEIGHT, true);

        let row = &self.table.rows[index];
        let date = row.date.clone();
        let start = row.start_location.clone();
        let destination = row.destination.clone();
        let amount = format!("{:.2}", row.amount);

        self.text(
            Font::Regular,
            TABLE_FONT_SIZE,
            self.layout.column_x(0) + 2.0,
            y + 3.0,
            &date,
        );
        self.text(
            Font::Regular,
            TABLE_FONT_SIZE,
            self.layout.column_x(1) + 2.0,
            y + 3.0,
            &start,
        );
        self.text(
            Font::Regular,
            TABLE_FONT_SIZE,
            self.layout.column_x(2) + 2.0,
            y + 3.0,
            &destination,
        );
        self.text_right(
            Font::Regular,
            TABLE_FONT_SIZE,
            self.layout.column_x(4) - 2.0,
            y + 3.0,
            &amount,
        );
        // The Note column is left blank for handwritten annotations.
    }

    fn draw_total_row(&mut self, y: f32) {
        // The total row keeps only the separators around the Amount column.
        self.draw_row_borders(y, ROW_HEIGHT, false);
        self.vline(self.layout.column_x(3), y, ROW_HEIGHT);
        self.vline(self.layout.column_x(4), y, ROW_HEIGHT);

        let label = self.table.total_label.clone();
        let total = format!("${:.2}", self.table.total);
        self.text_right(
            Font::Regular,
            TABLE_FONT_SIZE,
            self.layout.column_x(3) - 2.0,
            y + 3.0,
            &label,
        );
        self.text_right(
            Font::Regular,
            TABLE_FONT_SIZE,
            self.layout.column_x(4) - 2.0,
            y + 3.0,
            &total,
        );
    }

    fn draw_signature_line(&mut self, y: f32, label: &str) {
        self.text(
            Font::Regular,
            SIGNATURE_FONT_SIZE,
            self.layout.left,
            y,
            &format!("{}: ___________________________________", label),
        );
        self.text(
            Font::Regular,
            SIGNATURE_FONT_SIZE,
            370.0,
            y,
            "Date: __________________",
        );
    }

    /// Outer border plus (optionally) every interior column separator.
    fn draw_row_borders(&mut self, y: f32, height: f32, separators: bool) {
        let left = self.layout.left;
        let width = self.layout.width();
        let ops = self.pages.last_mut().expect("page started");
        ops.push(Operation::new(
            "re",
            vec![
                left.into(),
                (PAGE_HEIGHT - y - height).into(),
                width.into(),
                height.into(),
            ],
        ));
        ops.push(Operation::new("S", vec![]));

        if separators {
            for index in 1..self.layout.column_widths.len() {
                self.vline(self.layout.column_x(index), y, height);
            }
        }
    }

    fn vline(&mut self, x: f32, y: f32, height: f32) {
        let ops = self.pages.last_mut().expect("page started");
        ops.push(Operation::new(
            "m",
            vec![x.into(), (PAGE_HEIGHT - y).into()],
        ));
        ops.push(Operation::new(
            "l",
            vec![x.into(), (PAGE_HEIGHT - y - height).into()],
        ));
        ops.push(Operation::new("S", vec![]));
    }

    fn text(&mut self, font: Font, size: f32, x: f32, y: f32, text: &str) {
        let baseline = PAGE_HEIGHT - y - size;
        let ops = self.pages.last_mut().expect("page started");
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![font.resource_name().into(), size.into()],
        ));
        ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
        ops.push(Operation::new("ET", vec![]));
    }

    fn text_right(&mut self, font: Font, size: f32, right_x: f32, y: f32, text: &str) {
        let x = right_x - font.text_width(text, size);
        self.text(font, size, x, y, text);
    }
}

// ─── Fonts ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    /// Width of `text` at `size` points, from the standard AFM metrics.
    /// Characters outside ASCII fall back to an average glyph width.
    fn text_width(self, text: &str, size: f32) -> f32 {
        let table: &[u16; 95] = match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        let units: u32 = text
            .chars()
            .map(|c| match (c as usize).checked_sub(32) {
                Some(index) if index < table.len() => u32::from(table[index]),
                _ => 556,
            })
            .sum();
        units as f32 * size / 1000.0
    }
}

/// Helvetica glyph widths for chars 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold glyph widths for chars 32..=126, in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
    584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
    556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

// ─── Logo ────────────────────────────────────────────────────────────────────

/// A JPEG logo, embedded verbatim as a DCTDecode image XObject.
struct Logo {
    data: Vec<u8>,
    width_px: u32,
    height_px: u32,
    grayscale: bool,
}

impl Logo {
    fn load(path: &Path) -> anyhow::Result<Self> {
        let reader = image::ImageReader::open(path)?.with_guessed_format()?;
        if reader.format() != Some(image::ImageFormat::Jpeg) {
            anyhow::bail!("logo must be a JPEG image");
        }
        let data = std::fs::read(path)?;
        let img = reader.decode()?;
        let (width_px, height_px) = img.dimensions();
        let grayscale = matches!(
            img.color(),
            image::ColorType::L8 | image::ColorType::L16
        );
        Ok(Self {
            data,
            width_px,
            height_px,
            grayscale,
        })
    }

    /// Displayed size in points: fixed width, aspect-preserving height.
    fn display_size(&self) -> (f32, f32) {
        let height = LOGO_WIDTH * self.height_px as f32 / self.width_px.max(1) as f32;
        (LOGO_WIDTH, height)
    }
}

// ─── Document assembly ───────────────────────────────────────────────────────

fn write_document(
    pages_ops: Vec<Vec<Operation>>,
    logo: Option<&Logo>,
    output_path: &Path,
) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });

    let mut resources = dictionary! {
        "Font" => dictionary! { "F1" => regular, "F2" => bold },
    };

    if let Some(logo) = logo {
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => logo.width_px as i64,
                "Height" => logo.height_px as i64,
                "ColorSpace" => if logo.grayscale { "DeviceGray" } else { "DeviceRGB" },
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            logo.data.clone(),
        ));
        resources.set("XObject", dictionary! { "Im1" => image_id });
    }
    let resources_id = doc.add_object(resources);

    let mut kids: Vec<Object> = Vec::with_capacity(pages_ops.len());
    for ops in pages_ops {
        let ops = match logo {
            Some(logo) => place_logo(ops, logo),
            None => ops,
        };
        let encoded = Content { operations: ops }
            .encode()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Content encoding failed: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (PAGE_WIDTH as i64).into(), (PAGE_HEIGHT as i64).into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(output_path)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to save report PDF: {}", e)))?;
    Ok(())
}

/// Insert the logo's scale/translate matrix in front of its `Do` operator.
/// The matrix depends on the image's aspect ratio, which only the loaded
/// logo knows, so it is spliced in at assembly time.
fn place_logo(ops: Vec<Operation>, logo: &Logo) -> Vec<Operation> {
    let (width, height) = logo.display_size();
    let x = 50.0f32;
    let y = PAGE_HEIGHT - LOGO_TOP - height;

    let mut placed = Vec::with_capacity(ops.len() + 1);
    for op in ops {
        if op.operator == "Do" {
            placed.push(Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.0f32.into(),
                    0.0f32.into(),
                    height.into(),
                    x.into(),
                    y.into(),
                ],
            ));
        }
        placed.push(op);
    }
    placed
}
