use image::RgbaImage;

use crate::models::Row;
use crate::renderer::colours::{self, Colours};
use crate::renderer::drawing;
use crate::renderer::fonts::Fonts;
use crate::store::SampleStore;

const GRID_LINES: u32 = 4;
const AXIS_LABEL_WIDTH: u32 = 60;

pub struct RenderContext<'a> {
    pub store: &'a SampleStore,
    pub fonts: Option<&'a Fonts>,
    pub image: &'a mut RgbaImage,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Time and value range covered by the plotted samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotBounds {
    pub t_min: i64,
    pub t_max: i64,
    pub v_min: f64,
    pub v_max: f64,
}

impl PlotBounds {
    /// `None` when no sensor has a finite sample yet.
    pub fn from_store(store: &SampleStore) -> Option<Self> {
        let mut samples = store
            .series()
            .flat_map(|(_, samples)| samples.iter())
            .filter(|s| s.value.is_finite());

        let first = samples.next()?;
        let mut bounds = Self {
            t_min: first.timestamp.timestamp(),
            t_max: first.timestamp.timestamp(),
            v_min: first.value,
            v_max: first.value,
        };
        for sample in samples {
            let t = sample.timestamp.timestamp();
            bounds.t_min = bounds.t_min.min(t);
            bounds.t_max = bounds.t_max.max(t);
            bounds.v_min = bounds.v_min.min(sample.value);
            bounds.v_max = bounds.v_max.max(sample.value);
        }

        if bounds.t_max == bounds.t_min {
            bounds.t_max = bounds.t_min + 1;
        }
        let pad = ((bounds.v_max - bounds.v_min) * 0.05).max(0.5);
        bounds.v_min -= pad;
        bounds.v_max += pad;
        Some(bounds)
    }

    /// Map a sample onto a pixel inside the `(x, y, width, height)` area.
    pub fn project(&self, t: i64, v: f64, area: (u32, u32, u32, u32)) -> (f32, f32) {
        let (x, y, width, height) = area;
        let tx = (t - self.t_min) as f64 / (self.t_max - self.t_min) as f64;
        let ty = (v - self.v_min) / (self.v_max - self.v_min);
        let px = x as f64 + tx * width as f64;
        let py = (y + height) as f64 - ty * height as f64;
        (px as f32, py as f32)
    }
}

pub fn render_header(ctx: &mut RenderContext) {
    let colours = Colours::default();
    let Some(fonts) = ctx.fonts else {
        return;
    };

    drawing::text(
        ctx.image,
        colours.header,
        (ctx.x + 5) as i32,
        (ctx.y + 4) as i32,
        &fonts.title,
        "Real-time Sensor Data",
    );

    if let Some(row) = ctx.store.latest_row() {
        drawing::text(
            ctx.image,
            colours.header,
            ctx.width.saturating_sub(200) as i32,
            (ctx.y + 6) as i32,
            &fonts.regular,
            &row.timestamp_display(),
        );
    }
}

pub fn render_chart(ctx: &mut RenderContext) {
    let colours = Colours::default();

    let label_width = if ctx.fonts.is_some() { AXIS_LABEL_WIDTH } else { 5 };
    let plot_x = ctx.x + label_width;
    let plot_y = ctx.y + 5;
    let plot_width = ctx.width.saturating_sub(label_width + 10).max(1);
    let plot_height = ctx.height.saturating_sub(10).max(1);
    let area = (plot_x, plot_y, plot_width, plot_height);

    for i in 0..=GRID_LINES {
        let y = plot_y + plot_height * i / GRID_LINES;
        drawing::horizontal_line(ctx.image, plot_x, y, plot_width, colours.grid);
    }
    drawing::vertical_line(ctx.image, plot_x, plot_y, plot_y + plot_height, colours.axis);
    drawing::horizontal_line(ctx.image, plot_x, plot_y + plot_height, plot_width, colours.axis);

    // Nothing to scale against until the first reading arrives.
    let Some(bounds) = PlotBounds::from_store(ctx.store) else {
        return;
    };

    if let Some(fonts) = ctx.fonts {
        for i in 0..=GRID_LINES {
            let value = bounds.v_max - (bounds.v_max - bounds.v_min) * i as f64 / GRID_LINES as f64;
            let y = plot_y + plot_height * i / GRID_LINES;
            drawing::text(
                ctx.image,
                colours.axis,
                ctx.x as i32 + 2,
                y as i32 - 8,
                &fonts.small,
                &format!("{:>6.1}", value),
            );
        }
    }

    let store = ctx.store;
    for (index, (_, samples)) in store.series().enumerate() {
        let points: Vec<(f32, f32)> = samples
            .iter()
            .filter(|s| s.value.is_finite())
            .map(|s| bounds.project(s.timestamp.timestamp(), s.value, area))
            .collect();
        drawing::polyline(ctx.image, &points, colours::series(index));
    }

    render_legend(ctx, plot_x + 10, plot_y + 5);
}

fn render_legend(ctx: &mut RenderContext, x: u32, y: u32) {
    let Some(fonts) = ctx.fonts else {
        return;
    };
    let colours = Colours::default();
    let store = ctx.store;

    let reporting = store
        .sensors()
        .iter()
        .zip(store.series())
        .enumerate()
        .filter(|(_, (_, (_, samples)))| !samples.is_empty())
        .map(|(index, ((_, name), _))| (index, name));

    let mut y_pos = y;
    for (index, name) in reporting {
        let colour = colours::series(index);
        drawing::horizontal_line(ctx.image, x, y_pos + 9, 18, colour);
        drawing::horizontal_line(ctx.image, x, y_pos + 10, 18, colour);
        drawing::text(ctx.image, colours.text, (x + 24) as i32, y_pos as i32, &fonts.small, name);
        y_pos += 18;
    }
}

/// Most recent rows, oldest first, one line each.
pub fn render_table(ctx: &mut RenderContext, rows: &[Row]) {
    let Some(fonts) = ctx.fonts else {
        return;
    };
    let colours = Colours::default();
    let line_height = 18;

    let mut header = format!("{:<19}", "Timestamp");
    for name in ctx.store.sensors().names() {
        header.push_str(&format!(" {:>10}", truncate(name, 10)));
    }
    drawing::text(ctx.image, colours.header, (ctx.x + 5) as i32, ctx.y as i32, &fonts.small, &header);

    let max_rows = (ctx.height / line_height).saturating_sub(1) as usize;
    let skip = rows.len().saturating_sub(max_rows);
    for (i, row) in rows.iter().skip(skip).enumerate() {
        let mut line = format!("{:<19}", row.timestamp_display());
        for value in row.values.values() {
            let cell = value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
            line.push_str(&format!(" {:>10}", cell));
        }
        let y = ctx.y + line_height * (i as u32 + 1);
        drawing::text(ctx.image, colours.text, (ctx.x + 5) as i32, y as i32, &fonts.small, &line);
    }
}

fn truncate(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Reading, SensorId, SensorTable};
    use chrono::{Local, TimeZone};
    use std::sync::Arc;

    fn store_with(readings: &[(i64, &str, f64)]) -> SampleStore {
        let table = SensorTable::new([("28AA", "A"), ("28BB", "B")]).unwrap();
        let mut store = SampleStore::new(Arc::new(table));
        for (secs, sensor, value) in readings {
            let ts = Local.timestamp_opt(*secs, 0).unwrap();
            store.append(&Reading::new(ts, SensorId::new(sensor), *value)).unwrap();
        }
        store
    }

    #[test]
    fn test_bounds_empty_store() {
        assert_eq!(PlotBounds::from_store(&store_with(&[])), None);
    }

    #[test]
    fn test_bounds_cover_all_sensors() {
        let store = store_with(&[(100, "28AA", 20.0), (110, "28BB", 25.0), (105, "28AA", f64::NAN)]);
        let bounds = PlotBounds::from_store(&store).unwrap();
        assert_eq!(bounds.t_min, 100);
        assert_eq!(bounds.t_max, 110);
        assert_eq!(bounds.v_min, 19.5);
        assert_eq!(bounds.v_max, 25.5);
    }

    #[test]
    fn test_single_sample_has_non_empty_range() {
        let bounds = PlotBounds::from_store(&store_with(&[(100, "28AA", 20.0)])).unwrap();
        assert_eq!(bounds.t_max, 101);
        assert!(bounds.v_max > bounds.v_min);

        let (x, y) = bounds.project(100, 20.0, (10, 10, 100, 100));
        assert_eq!(x, 10.0);
        assert_eq!(y, 60.0);
    }
}
