//! Tabulated results and wall-clock timing.
//!
//! Sweeps produce one row per simulated parameter point. [`SweepTable`] holds
//! those rows and exports them as CSV, JSON or an aligned text table.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Rows of results sharing one set of columns.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SweepTable {
    /// Table title
    pub title: String,

    /// Column names
    pub columns: Vec<String>,

    /// Cell values, one inner vector per row
    pub rows: Vec<Vec<String>>,

    /// Wall-clock time spent producing the rows
    pub wall_time_ms: f64,
}

impl SweepTable {
    /// Creates an empty table.
    pub fn new(title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            wall_time_ms: 0.0,
        }
    }

    /// Appends a row.
    ///
    /// # Panics
    /// If the row does not have one cell per column.
    pub fn push_row(&mut self, row: Vec<String>) {
        assert_eq!(
            row.len(),
            self.columns.len(),
            "row has {} cells for {} columns",
            row.len(),
            self.columns.len()
        );
        self.rows.push(row);
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exports to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports to CSV.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str(&self.columns.join(","));
        csv.push('\n');
        for row in &self.rows {
            csv.push_str(&row.join(","));
            csv.push('\n');
        }
        csv
    }

    /// Exports to a CSV file.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }

    /// Writes an aligned, human-readable table.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                self.rows
                    .iter()
                    .map(|r| r[i].len())
                    .chain(std::iter::once(c.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        writeln!(w, "=== {} ===", self.title)?;
        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:>width$}"))
                .collect::<Vec<_>>()
                .join("  ")
        };
        writeln!(w, "{}", line(self.columns.as_slice()))?;
        for row in &self.rows {
            writeln!(w, "{}", line(row.as_slice()))?;
        }
        writeln!(w, "({} rows, {:.2} ms)", self.rows.len(), self.wall_time_ms)?;
        Ok(())
    }

    /// Returns the summary as a string.
    pub fn summary(&self) -> String {
        let mut buf = Vec::new();
        // Writing to a Vec cannot fail
        let _ = self.write_summary(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// A simple timer for measuring wall-clock time.
#[derive(Debug)]
pub struct Timer {
    start: std::time::Instant,
}

impl Timer {
    /// Starts a new timer.
    pub fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Returns elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}
