// 🗺️ Entity Registry
// The authoritative set of apportionable entities (e.g. states).
//
// Structure is frozen after load: no entities are added or removed.
// Only `seats` changes during a run, and only through the allocator.

use crate::config::TableFormat;
use crate::error::{ApportionError, Result};
use csv::{ErrorKind, ReaderBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Largest population whose priority stays exact: above 2^53 neighbouring
/// integers collapse to the same f64 and stop ranking strictly
pub const MAX_POPULATION: u64 = 1 << 53;

// ============================================================================
// ENTITY
// ============================================================================

/// One apportionable unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    population: u64,
    seats: u32,
}

impl Entity {
    /// Every entity begins with the one guaranteed seat
    ///
    /// Populations above `MAX_POPULATION` lose precision in the priority
    /// function; `Registry::load` rejects them.
    pub fn new(name: impl Into<String>, population: u64) -> Self {
        Entity {
            name: name.into(),
            population,
            seats: 1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn seats(&self) -> u32 {
        self.seats
    }

    pub(crate) fn grant_seat(&mut self) {
        self.seats += 1;
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Name → entity mapping, kept in input order
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Build a registry from entities constructed in code
    pub fn from_entities<I>(entities: I) -> Result<Self>
    where
        I: IntoIterator<Item = Entity>,
    {
        let mut registry = Registry::default();
        for entity in entities {
            registry.insert(entity)?;
        }
        Ok(registry)
    }

    /// Load a population table from any reader
    ///
    /// The header row names the columns; only the name and population columns
    /// are read, in whatever position they appear.
    pub fn load<R: Read>(reader: R, format: &TableFormat) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(format.delimiter_byte()?)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim() == wanted)
                .ok_or_else(|| ApportionError::malformed(1, format!("missing column '{}'", wanted)))
        };
        let name_idx = column(&format.name_column)?;
        let pop_idx = column(&format.population_column)?;

        let mut registry = Registry::default();

        for result in rdr.records() {
            let record = result.map_err(record_error)?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let name = record
                .get(name_idx)
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| ApportionError::malformed(line, format!("missing '{}'", format.name_column)))?;

            let raw_pop = record
                .get(pop_idx)
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    ApportionError::malformed(line, format!("missing '{}'", format.population_column))
                })?;

            let population = parse_population(raw_pop)
                .ok_or_else(|| ApportionError::malformed(line, format!("population '{}' is not a positive integer", raw_pop)))?;

            registry.insert(Entity::new(name, population))?;
        }

        info!(entities = registry.len(), "loaded population table");

        Ok(registry)
    }

    /// Open and load a population table from disk
    pub fn load_path<P: AsRef<Path>>(path: P, format: &TableFormat) -> Result<Self> {
        let file = File::open(path)?;
        Self::load(file, format)
    }

    fn insert(&mut self, entity: Entity) -> Result<()> {
        if self.index.contains_key(entity.name()) {
            return Err(ApportionError::DuplicateEntity(entity.name().to_string()));
        }
        self.index.insert(entity.name().to_string(), self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    /// Sum of seats across every entity
    pub fn total_seats(&self) -> u64 {
        self.entities.iter().map(|e| u64::from(e.seats)).sum()
    }

    /// All entities, in input order
    pub fn iter_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Entity> {
        self.index.get(name).map(|&i| &self.entities[i])
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    // Allocator access by position, so the heap can carry plain indices
    pub(crate) fn entity_at(&self, idx: usize) -> &Entity {
        &self.entities[idx]
    }

    pub(crate) fn grant_seat_at(&mut self, idx: usize) -> &Entity {
        let entity = &mut self.entities[idx];
        entity.grant_seat();
        entity
    }
}

/// Positive integer up to `MAX_POPULATION`, no sign, no fraction
fn parse_population(raw: &str) -> Option<u64> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u64>()
        .ok()
        .filter(|&p| p > 0 && p <= MAX_POPULATION)
}

/// Undecodable or misshapen records are bad data, not reader failures
fn record_error(err: csv::Error) -> ApportionError {
    let bad_data = matches!(
        err.kind(),
        ErrorKind::Utf8 { .. } | ErrorKind::UnequalLengths { .. }
    );
    if !bad_data {
        return ApportionError::Csv(err);
    }
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    ApportionError::malformed(line, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_tsv(input: &str) -> Result<Registry> {
        Registry::load(input.as_bytes(), &TableFormat::default())
    }

    #[test]
    fn test_load_starts_everyone_at_one_seat() {
        let registry = load_tsv("State\tPopulation\nOhio\t11799448\nIowa\t3190369\n").unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.total_seats(), 2);
        assert!(registry.iter_entities().all(|e| e.seats() == 1));
        assert_eq!(registry.get("Iowa").unwrap().population(), 3190369);
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let registry =
            load_tsv("Region\tPopulation\tState\nMidwest\t42\tKansas\nSouth\t7\tTexas\n").unwrap();

        assert_eq!(registry.get("Kansas").unwrap().population(), 42);
        assert_eq!(registry.get("Texas").unwrap().population(), 7);
    }

    #[test]
    fn test_iteration_keeps_input_order() {
        let registry = load_tsv("State\tPopulation\nB\t1\nA\t2\nC\t3\n").unwrap();
        let names: Vec<&str> = registry.iter_entities().map(|e| e.name()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_custom_format() {
        let format = TableFormat {
            delimiter: ',',
            name_column: "name".to_string(),
            population_column: "pop".to_string(),
        };
        let registry = Registry::load("name,pop\nX,100\nY,50\n".as_bytes(), &format).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_missing_column_is_malformed() {
        let result = load_tsv("State\tPeople\nOhio\t1\n");
        assert!(matches!(result, Err(ApportionError::MalformedInput { line: 1, .. })));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let result = load_tsv("State\tPopulation\nOhio\t5\nIowa\n");
        assert!(matches!(result, Err(ApportionError::MalformedInput { line: 3, .. })));
    }

    #[test]
    fn test_empty_name_is_malformed() {
        let result = load_tsv("State\tPopulation\n\t5\n");
        assert!(matches!(result, Err(ApportionError::MalformedInput { .. })));
    }

    #[test]
    fn test_bad_population_is_malformed() {
        for bad in ["0", "-5", "12.5", "lots", "1e6", "+7"] {
            let input = format!("State\tPopulation\nOhio\t{}\n", bad);
            let result = load_tsv(&input);
            assert!(
                matches!(result, Err(ApportionError::MalformedInput { .. })),
                "population {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let input: &[u8] = b"State\tPopulation\nOhio\t\xff\xfe\n";
        let result = Registry::load(input, &TableFormat::default());
        assert!(matches!(result, Err(ApportionError::MalformedInput { line: 2, .. })));
    }

    #[test]
    fn test_population_upper_bound() {
        let registry = load_tsv("State\tPopulation\nBig\t9007199254740992\n").unwrap();
        assert_eq!(registry.get("Big").unwrap().population(), MAX_POPULATION);

        let result = load_tsv("State\tPopulation\nHuge\t9007199254740993\n");
        assert!(matches!(result, Err(ApportionError::MalformedInput { line: 2, .. })));
    }

    #[test]
    fn test_population_whitespace_trimmed() {
        let registry = load_tsv("State\tPopulation\nOhio\t 12 \n").unwrap();
        assert_eq!(registry.get("Ohio").unwrap().population(), 12);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = load_tsv("State\tPopulation\nOhio\t5\nOhio\t6\n");
        match result {
            Err(ApportionError::DuplicateEntity(name)) => assert_eq!(name, "Ohio"),
            other => panic!("expected DuplicateEntity, got {:?}", other),
        }
    }

    #[test]
    fn test_header_only_gives_empty_registry() {
        let registry = load_tsv("State\tPopulation\n").unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.total_seats(), 0);
    }

    #[test]
    fn test_from_entities_rejects_duplicates() {
        let result = Registry::from_entities(vec![Entity::new("X", 1), Entity::new("X", 2)]);
        assert!(matches!(result, Err(ApportionError::DuplicateEntity(_))));
    }

    #[test]
    fn test_load_path_missing_file() {
        let result = Registry::load_path("/nonexistent/state_inputs.tsv", &TableFormat::default());
        assert!(matches!(result, Err(ApportionError::Io(_))));
    }
}
