//! # Ambiguity report
//!
//! Final product of an analysis: which survivors passed the field-of-view cap, the
//! ambiguity record of each visible one, and the ones dropped beyond the horizon.
//!
//! The report prints as a one-line summary (`{}`) or as a table of records (`{:#}`),
//! and can be written to CSV with one row per record.
use std::fmt;

use camino::Utf8Path;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::ambiguity::AmbiguityRecord;
use crate::fringe_errors::FringeError;

/// An ambiguity excluded because its direction lies beyond the horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RejectedAmbiguity {
    pub survivor_index: usize,
    /// `‖k0_xy − s_xy‖²`, greater than one.
    pub radius_sq: f64,
}

/// Output of [`AmbiguityEvaluator::evaluate`](crate::ambiguity::AmbiguityEvaluator::evaluate).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmbiguityReport {
    /// Survivor indices inside the field-of-view cap.
    pub cap_indices: Vec<usize>,
    /// One record per visible ambiguity, in cap order.
    pub records: Vec<AmbiguityRecord>,
    pub rejected: Vec<RejectedAmbiguity>,
}

/// CSV row of one [`AmbiguityRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguityRow {
    pub survivor_index: usize,
    /// Fringe offsets joined with `;`.
    pub offsets: String,
    pub s_x: f64,
    pub s_y: f64,
    pub dir_x: f64,
    pub dir_y: f64,
    pub dir_z: f64,
    pub distance: f64,
}

impl From<&AmbiguityRecord> for AmbiguityRow {
    fn from(record: &AmbiguityRecord) -> Self {
        AmbiguityRow {
            survivor_index: record.survivor_index,
            offsets: record.candidate.offsets().iter().join(";"),
            s_x: record.point.x,
            s_y: record.point.y,
            dir_x: record.direction.x,
            dir_y: record.direction.y,
            dir_z: record.direction.z,
            distance: record.distance,
        }
    }
}

impl AmbiguityReport {
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The least distinguishable ambiguity, if any.
    pub fn closest(&self) -> Option<&AmbiguityRecord> {
        self.records
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Records whose distance is at most `threshold`.
    pub fn unresolvable(&self, threshold: f64) -> impl Iterator<Item = &AmbiguityRecord> + '_ {
        self.records.iter().filter(move |r| r.distance <= threshold)
    }

    pub fn rows(&self) -> Vec<AmbiguityRow> {
        self.records.iter().map(AmbiguityRow::from).collect()
    }

    /// Write one CSV row per record, with a header line.
    pub fn write_csv(&self, path: &Utf8Path) -> Result<(), FringeError> {
        let mut writer = csv::Writer::from_path(path)?;
        for row in self.rows() {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read back rows written by [`AmbiguityReport::write_csv`].
    pub fn read_csv(path: &Utf8Path) -> Result<Vec<AmbiguityRow>, FringeError> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize::<AmbiguityRow>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

impl fmt::Display for AmbiguityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !f.alternate() {
            return match self.closest() {
                Some(c) => write!(
                    f,
                    "AmbiguityReport(in_cap={}, records={}, rejected={}, min_distance={:.6})",
                    self.cap_indices.len(),
                    self.records.len(),
                    self.rejected.len(),
                    c.distance
                ),
                None => write!(
                    f,
                    "AmbiguityReport(in_cap={}, records=0, rejected={})",
                    self.cap_indices.len(),
                    self.rejected.len()
                ),
            };
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.set_header(vec![
            Cell::new("#"),
            Cell::new("Offsets"),
            Cell::new("s_x"),
            Cell::new("s_y"),
            Cell::new("dir_x"),
            Cell::new("dir_y"),
            Cell::new("dir_z"),
            Cell::new("Distance"),
        ]);

        let num = |v: f64| Cell::new(format!("{v:.6}")).set_alignment(CellAlignment::Right);
        for r in &self.records {
            table.add_row(Row::from(vec![
                Cell::new(r.survivor_index).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:?}", r.candidate.offsets())),
                num(r.point.x),
                num(r.point.y),
                num(r.direction.x),
                num(r.direction.y),
                num(r.direction.z),
                num(r.distance),
            ]));
        }

        writeln!(f, "{table}")?;
        for r in &self.rejected {
            writeln!(
                f,
                "rejected survivor {} (beyond horizon, x² + y² = {:.6})",
                r.survivor_index, r.radius_sq
            )?;
        }
        Ok(())
    }
}
