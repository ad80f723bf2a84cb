use image::{DynamicImage, ImageFormat, RgbaImage};
use std::fs;
use std::path::Path;

use crate::config::ChartConfig;
use crate::models::Row;
use crate::renderer::colours::Colours;
use crate::renderer::fonts::Fonts;
use crate::renderer::{drawing, widgets};
use crate::sinks::RenderError;
use crate::store::SampleStore;

const HEADER_HEIGHT: u32 = 30;

// Create the chart image: header, plot, and the latest table rows when a font
// is available.
pub(crate) fn create_image(
    config: &ChartConfig,
    store: &SampleStore,
    rows: &[Row],
    fonts: Option<&Fonts>,
) -> DynamicImage {
    let width = config.width.max(64);
    let height = config.height.max(64);
    let colours = Colours::default();

    let mut image = RgbaImage::new(width, height);
    drawing::fill(&mut image, colours.background);

    let show_table = fonts.is_some() && config.table_rows > 0;
    let y_chart = if fonts.is_some() { HEADER_HEIGHT } else { 0 };
    let y_footer = if show_table {
        let table_height = 18 * (config.table_rows as u32 + 1) + 10;
        height.saturating_sub(table_height).max(y_chart + height / 2)
    } else {
        height
    };

    if fonts.is_some() {
        let mut header_ctx = widgets::RenderContext {
            store,
            fonts,
            image: &mut image,
            x: 0,
            y: 0,
            width,
            height: HEADER_HEIGHT,
        };
        widgets::render_header(&mut header_ctx);
        drawing::horizontal_line(&mut image, 0, y_chart, width, colours.separator);
    }

    let mut chart_ctx = widgets::RenderContext {
        store,
        fonts,
        image: &mut image,
        x: 0,
        y: y_chart,
        width,
        height: y_footer - y_chart,
    };
    widgets::render_chart(&mut chart_ctx);

    if show_table {
        drawing::horizontal_line(&mut image, 0, y_footer, width, colours.separator);
        let mut table_ctx = widgets::RenderContext {
            store,
            fonts,
            image: &mut image,
            x: 0,
            y: y_footer + 5,
            width,
            height: height.saturating_sub(y_footer + 5),
        };
        widgets::render_table(&mut table_ctx, rows);
    }

    DynamicImage::ImageRgba8(image)
}

/// Written to a sibling `.tmp` file, then renamed over `path`.
pub(crate) fn save_image(image: &DynamicImage, path: &Path) -> Result<(), RenderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    image.save_with_format(&tmp, ImageFormat::Png)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
