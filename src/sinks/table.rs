use std::io::{self, Write};

use super::{PresentationSink, RenderError};
use crate::models::{Row, SensorTable};
use crate::store::SampleStore;

const MIN_COLUMN_WIDTH: usize = 8;

/// Scrolling text table: one line per accepted reading, header repeated
/// every `header_every` rows.
pub struct TableView {
    out: Box<dyn Write + Send>,
    header_every: usize,
    printed: usize,
    // Store length at the previous render.
    cursor: usize,
}

impl TableView {
    pub fn stdout(header_every: usize) -> Self {
        Self::new(Box::new(io::stdout()), header_every)
    }

    pub fn new(out: Box<dyn Write + Send>, header_every: usize) -> Self {
        Self {
            out,
            header_every,
            printed: 0,
            cursor: 0,
        }
    }

    fn widths(sensors: &SensorTable) -> Vec<usize> {
        sensors
            .names()
            .map(|name| name.chars().count().max(MIN_COLUMN_WIDTH))
            .collect()
    }

    fn write_header(&mut self, sensors: &SensorTable) -> io::Result<()> {
        let mut line = format!("{:<19}", "Timestamp");
        for (name, width) in sensors.names().zip(Self::widths(sensors)) {
            line.push_str(&format!(" | {:>width$}", name, width = width));
        }
        writeln!(self.out, "{}", line)?;
        writeln!(self.out, "{}", "-".repeat(line.chars().count()))
    }

    fn write_row(&mut self, sensors: &SensorTable, row: &Row) -> io::Result<()> {
        let mut line = format!("{:<19}", row.timestamp_display());
        for (value, width) in row.values.values().zip(Self::widths(sensors)) {
            let cell = value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
            line.push_str(&format!(" | {:>width$}", cell, width = width));
        }
        writeln!(self.out, "{}", line)
    }
}

impl PresentationSink for TableView {
    fn render(&mut self, store: &SampleStore) -> Result<(), RenderError> {
        let rows = store.rows_since(self.cursor);
        if rows.is_empty() {
            return Ok(());
        }

        let sensors = store.sensors();
        for row in &rows {
            let header_due = match self.header_every {
                0 => self.printed == 0,
                every => self.printed % every == 0,
            };
            if header_due {
                self.write_header(sensors)?;
            }
            self.write_row(sensors, row)?;
            self.printed += 1;
        }
        self.out.flush()?;

        self.cursor = store.len();
        Ok(())
    }
}
