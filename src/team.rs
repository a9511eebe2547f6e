use std::collections::BTreeMap;

use crate::error::GameError;

pub const FACTOR_COUNT: usize = 8;
pub const MIN_VALUE: u8 = 0;
pub const MAX_VALUE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Factor {
    Population,
    Food,
    Finances,
    Hospitals,
    Schools,
    PowerPlants,
    PlacesOfWorship,
    Solidarity,
}

impl Factor {
    /// Display order; also the row order of every table.
    pub const ALL: [Factor; FACTOR_COUNT] = [
        Factor::Population,
        Factor::Food,
        Factor::Finances,
        Factor::Hospitals,
        Factor::Schools,
        Factor::PowerPlants,
        Factor::PlacesOfWorship,
        Factor::Solidarity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Factor::Population => "👤 Popolazione",
            Factor::Food => "🥫 Cibo",
            Factor::Finances => "💰 Finanze",
            Factor::Hospitals => "🚑 Ospedali",
            Factor::Schools => "🎒 Scuole",
            Factor::PowerPlants => "🔋 Centrali Elettriche",
            Factor::PlacesOfWorship => "⛪ Luoghi di Culto",
            Factor::Solidarity => "🫂 Solidarietà",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamId {
    One,
    Two,
}

impl TeamId {
    pub const BOTH: [TeamId; 2] = [TeamId::One, TeamId::Two];

    pub fn label(self) -> &'static str {
        match self {
            TeamId::One => "Team 1",
            TeamId::Two => "Team 2",
        }
    }
}

/// One factor of one team. `display_value` feeds the progress bar and only
/// changes together with `raw_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactorRow {
    factor: Factor,
    raw_value: u8,
    display_value: u8,
}

impl FactorRow {
    fn new(factor: Factor) -> Self {
        Self {
            factor,
            raw_value: MAX_VALUE,
            display_value: MAX_VALUE,
        }
    }

    pub fn factor(&self) -> Factor {
        self.factor
    }

    pub fn raw_value(&self) -> u8 {
        self.raw_value
    }

    pub fn display_value(&self) -> u8 {
        self.display_value
    }

    fn set(&mut self, value: u8) {
        *self = FactorRow {
            factor: self.factor,
            raw_value: value,
            display_value: value,
        };
    }
}

/// Sparse batch of cell edits: row position -> new value.
pub type Edits = BTreeMap<usize, u16>;

/// The eight factor rows of a team, in [`Factor::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamTable {
    rows: [FactorRow; FACTOR_COUNT],
}

impl TeamTable {
    pub fn new() -> Self {
        Self {
            rows: Factor::ALL.map(FactorRow::new),
        }
    }

    pub fn rows(&self) -> &[FactorRow] {
        &self.rows
    }

    pub fn row(&self, row: usize) -> Option<&FactorRow> {
        self.rows.get(row)
    }

    /// Writes each edited value into both columns of its row. The whole batch
    /// is checked first: one bad entry rejects it and nothing changes.
    pub fn apply_edits(&mut self, edits: &Edits) -> Result<(), GameError> {
        for (&row, &value) in edits {
            if row >= FACTOR_COUNT {
                return Err(GameError::RowOutOfRange { row });
            }
            if value > MAX_VALUE as u16 {
                return Err(GameError::EditOutOfRange { row, value });
            }
        }
        for (&row, &value) in edits {
            self.rows[row].set(value as u8);
        }
        Ok(())
    }

    /// True when any factor has run out.
    pub fn has_critical_factor(&self) -> bool {
        self.rows.iter().any(|row| row.raw_value == MIN_VALUE)
    }

    pub fn critical_factors(&self) -> Vec<Factor> {
        self.rows
            .iter()
            .filter(|row| row.raw_value == MIN_VALUE)
            .map(|row| row.factor)
            .collect()
    }
}

impl Default for TeamTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Edits, FACTOR_COUNT, Factor, TeamTable};
    use crate::error::GameError;

    #[test]
    fn fresh_table_is_full_and_safe() {
        let table = TeamTable::new();
        assert_eq!(table.rows().len(), FACTOR_COUNT);
        for (row, factor) in table.rows().iter().zip(Factor::ALL) {
            assert_eq!(row.factor(), factor);
            assert_eq!(row.raw_value(), 100);
            assert_eq!(row.display_value(), 100);
        }
        assert!(!table.has_critical_factor());
    }

    #[test]
    fn rejected_batch_changes_nothing() {
        let mut table = TeamTable::new();
        let edits = Edits::from([(0, 40), (3, 101)]);
        assert_eq!(
            table.apply_edits(&edits),
            Err(GameError::EditOutOfRange { row: 3, value: 101 })
        );
        assert_eq!(table, TeamTable::new());

        let edits = Edits::from([(8, 10)]);
        assert_eq!(
            table.apply_edits(&edits),
            Err(GameError::RowOutOfRange { row: 8 })
        );
    }

    #[test]
    fn critical_factors_are_named() {
        let mut table = TeamTable::new();
        table.apply_edits(&Edits::from([(1, 0), (6, 0)])).unwrap();
        assert_eq!(
            table.critical_factors(),
            vec![Factor::Food, Factor::PlacesOfWorship]
        );
    }
}
