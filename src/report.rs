// 📋 Result table
// One row per entity, most seats first.
//
// Rendering never touches the registry after construction, so a report
// only exists once a run has fully succeeded.

use crate::allocator::Allocation;
use crate::config::TableFormat;
use crate::error::Result;
use crate::registry::Registry;
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Header label for the seat column
pub const SEATS_COLUMN: &str = "Reps";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub name: String,
    pub population: u64,
    pub seats: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
}

impl Report {
    /// Snapshot the registry, sorted by seats descending
    ///
    /// Equal seat counts keep registry (input) order.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut rows: Vec<ReportRow> = registry
            .iter_entities()
            .map(|e| ReportRow {
                name: e.name().to_string(),
                population: e.population(),
                seats: e.seats(),
            })
            .collect();

        rows.sort_by(|a, b| b.seats.cmp(&a.seats));

        Report { rows }
    }

    pub fn total_seats(&self) -> u64 {
        self.rows.iter().map(|r| u64::from(r.seats)).sum()
    }

    /// Header line then one line per entity, using the table's delimiter
    /// and column labels (`State\tPopulation\tReps` by default)
    pub fn write_delimited<W: Write>(&self, writer: W, format: &TableFormat) -> Result<()> {
        let mut wtr = WriterBuilder::new()
            .delimiter(format.delimiter_byte()?)
            .from_writer(writer);

        wtr.write_record([
            format.name_column.as_str(),
            format.population_column.as_str(),
            SEATS_COLUMN,
        ])?;

        for row in &self.rows {
            wtr.write_record([
                row.name.clone(),
                row.population.to_string(),
                row.seats.to_string(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.rows)?;
        Ok(())
    }

    /// One JSON document: `{ "rows": [...], "priority_list": [...] }`
    pub fn write_json_with_priority_list<W: Write>(
        &self,
        writer: W,
        allocations: &[Allocation],
    ) -> Result<()> {
        #[derive(Serialize)]
        struct Traced<'a> {
            rows: &'a [ReportRow],
            priority_list: &'a [Allocation],
        }

        let doc = Traced {
            rows: &self.rows,
            priority_list: allocations,
        };
        serde_json::to_writer_pretty(writer, &doc)?;
        Ok(())
    }
}

/// Seat-by-seat priority list: `Seat`, name, `Priority`, seats after the grant
pub fn write_priority_list<W: Write>(
    writer: W,
    allocations: &[Allocation],
    format: &TableFormat,
) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(format.delimiter_byte()?)
        .from_writer(writer);

    wtr.write_record(["Seat", format.name_column.as_str(), "Priority", SEATS_COLUMN])?;

    for a in allocations {
        wtr.write_record([
            a.seat_number.to_string(),
            a.name.clone(),
            format!("{:.3}", a.priority),
            a.seats.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
