//! Renders the monthly spending chart as a PNG image.
//!
//! The chart is drawn into an in-memory RGB buffer with plotters and encoded
//! with the image crate. Text is rendered with an embedded copy of DejaVu Sans,
//! so the output does not depend on the fonts installed on the host.

use std::{io::Cursor, sync::OnceLock};

use image::{ImageFormat, RgbImage};
use plotters::{
    coord::Shift,
    prelude::*,
    style::{
        FontStyle, register_font,
        text_anchor::{HPos, Pos, VPos},
    },
};

use crate::{Error, summary::aggregation::MonthlySpending};

/// The width of the chart image in pixels.
pub const CHART_WIDTH: u32 = 600;
/// The height of the chart image in pixels.
pub const CHART_HEIGHT: u32 = 300;

const CHART_TITLE: &str = "Monthly Spending";
const FONT_FAMILY: &str = "sans-serif";
const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const MARGIN: u32 = 10;
const X_LABEL_AREA_SIZE: u32 = 45;
const Y_LABEL_AREA_SIZE: u32 = 60;

const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);
const GRID_COLOR: RGBColor = RGBColor(225, 225, 225);
const TEXT_COLOR: RGBColor = RGBColor(40, 40, 40);

type ChartArea<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// The reason a chart has no data to plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// The user has no transactions in the requested range.
    NoData,
    /// The user has transactions in the range, but none are expenses.
    NoExpenseData,
    /// The request did not carry a valid bearer token.
    Unauthorized,
    /// The query string could not be parsed.
    InvalidRequest,
    /// The data for the chart could not be loaded.
    ServerError,
}

impl Placeholder {
    /// The message drawn in the middle of the placeholder image.
    pub fn message(&self) -> &'static str {
        match self {
            Placeholder::NoData => "No data",
            Placeholder::NoExpenseData => "No expense data",
            Placeholder::Unauthorized => "Unauthorized",
            Placeholder::InvalidRequest => "Invalid request",
            Placeholder::ServerError => "Server error",
        }
    }
}

/// What to draw on the spending chart.
#[derive(Debug, Clone, PartialEq)]
pub enum SpendingChart {
    /// Monthly expense totals in chronological order, never empty.
    Series(Vec<MonthlySpending>),
    /// A message explaining why there is nothing to plot.
    Placeholder(Placeholder),
}

fn chart_error(error: impl std::fmt::Display) -> Error {
    Error::ChartRendering(error.to_string())
}

/// Make the embedded font available to plotters under [FONT_FAMILY].
///
/// Registration happens once per process, later calls return the first result.
fn register_chart_font() -> Result<(), Error> {
    static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

    REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA)
                .map_err(|_| "invalid font data".to_string())
        })
        .clone()
        .map_err(Error::ChartRendering)
}

/// Render `chart` as a PNG image of [CHART_WIDTH] by [CHART_HEIGHT] pixels.
///
/// # Errors
/// Returns [Error::ChartRendering] if the chart cannot be drawn or encoded.
pub fn render_spending_chart(chart: &SpendingChart) -> Result<Vec<u8>, Error> {
    register_chart_font()?;

    let mut buffer = vec![0u8; (CHART_WIDTH * CHART_HEIGHT * 3) as usize];

    {
        let root =
            BitMapBackend::with_buffer(&mut buffer, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        match chart {
            SpendingChart::Series(months) => draw_series(&root, months)?,
            SpendingChart::Placeholder(placeholder) => {
                draw_message(&root, placeholder.message())?
            }
        }

        root.present().map_err(chart_error)?;
    }

    encode_png(buffer)
}

fn draw_series(root: &ChartArea<'_>, months: &[MonthlySpending]) -> Result<(), Error> {
    let max_total = months.iter().map(|month| month.total).fold(0.0, f64::max);
    let min_total = months.iter().map(|month| month.total).fold(0.0, f64::min);
    let y_max = if max_total > 0.0 { max_total * 1.1 } else { 1.0 };
    let y_min = min_total * 1.1;
    let x_max = months.len() as f64 - 0.5;

    let mut chart = ChartBuilder::on(root)
        .caption(CHART_TITLE, (FONT_FAMILY, 20).into_font())
        .margin(MARGIN)
        .x_label_area_size(X_LABEL_AREA_SIZE)
        .y_label_area_size(Y_LABEL_AREA_SIZE)
        .build_cartesian_2d(-0.5..x_max, y_min..y_max)
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(GRID_COLOR)
        .x_labels(months.len())
        .x_label_formatter(&|position| month_label(*position, months))
        .y_label_formatter(&|amount| format!("{amount:.0}"))
        .x_desc("Month")
        .y_desc("Amount")
        .label_style((FONT_FAMILY, 12).into_font())
        .axis_desc_style((FONT_FAMILY, 14).into_font())
        .draw()
        .map_err(chart_error)?;

    let points: Vec<(f64, f64)> = months
        .iter()
        .enumerate()
        .map(|(index, month)| (index as f64, month.total))
        .collect();

    chart
        .draw_series(LineSeries::new(points.iter().copied(), LINE_COLOR.stroke_width(2)))
        .map_err(chart_error)?;

    chart
        .draw_series(
            points
                .iter()
                .map(|point| Circle::new(*point, 4, LINE_COLOR.filled())),
        )
        .map_err(chart_error)?;

    Ok(())
}

/// The tick label at `position` on the x axis.
///
/// Months are plotted at whole-number positions, any position between two
/// months gets no label.
fn month_label(position: f64, months: &[MonthlySpending]) -> String {
    if position < 0.0 || position.fract() != 0.0 {
        return String::new();
    }

    months
        .get(position as usize)
        .map(|month| month.month.clone())
        .unwrap_or_default()
}

fn draw_message(root: &ChartArea<'_>, message: &str) -> Result<(), Error> {
    let style = (FONT_FAMILY, 28)
        .into_font()
        .color(&TEXT_COLOR)
        .pos(Pos::new(HPos::Center, VPos::Center));

    root.draw_text(
        message,
        &style,
        (CHART_WIDTH as i32 / 2, CHART_HEIGHT as i32 / 2),
    )
    .map_err(chart_error)
}

fn encode_png(buffer: Vec<u8>) -> Result<Vec<u8>, Error> {
    let image = RgbImage::from_raw(CHART_WIDTH, CHART_HEIGHT, buffer)
        .ok_or_else(|| chart_error("pixel buffer does not match the image size"))?;

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(chart_error)?;

    Ok(png.into_inner())
}
