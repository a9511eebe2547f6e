use crate::catalog::EventCatalog;
use crate::error::GameError;
use crate::team::{Edits, Factor, MAX_VALUE, TeamId, TeamTable};

/// Which teams have lost. Both can be true at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameOver {
    pub team1: bool,
    pub team2: bool,
}

impl GameOver {
    pub fn is_over(&self) -> bool {
        self.team1 || self.team2
    }

    pub fn lost(&self, team: TeamId) -> bool {
        match team {
            TeamId::One => self.team1,
            TeamId::Two => self.team2,
        }
    }
}

/// Everything one facilitator's game holds between interactions.
///
/// Created when the game starts and dropped when it ends; losing does not
/// lock anything.
#[derive(Debug, Clone)]
pub struct GameSession {
    team1: TeamTable,
    team2: TeamTable,
    catalog: Option<EventCatalog>,
    selected_event: usize,
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            team1: TeamTable::new(),
            team2: TeamTable::new(),
            catalog: None,
            selected_event: 1,
        }
    }

    pub fn table(&self, team: TeamId) -> &TeamTable {
        match team {
            TeamId::One => &self.team1,
            TeamId::Two => &self.team2,
        }
    }

    fn table_mut(&mut self, team: TeamId) -> &mut TeamTable {
        match team {
            TeamId::One => &mut self.team1,
            TeamId::Two => &mut self.team2,
        }
    }

    pub fn apply_edits(&mut self, team: TeamId, edits: &Edits) -> Result<(), GameError> {
        self.table_mut(team).apply_edits(edits)
    }

    /// Moves one value by `delta`, stopping at the 0..=100 bounds like a
    /// stepped number input. Returns the value written.
    pub fn step_value(&mut self, team: TeamId, row: usize, delta: i16) -> Result<u8, GameError> {
        let current = self
            .table(team)
            .row(row)
            .ok_or(GameError::RowOutOfRange { row })?
            .raw_value();
        let next = (current as i16)
            .saturating_add(delta)
            .clamp(0, MAX_VALUE as i16) as u16;
        self.apply_edits(team, &Edits::from([(row, next)]))?;
        Ok(next as u8)
    }

    pub fn has_critical_factor(&self, team: TeamId) -> bool {
        self.table(team).has_critical_factor()
    }

    pub fn critical_factors(&self, team: TeamId) -> Vec<Factor> {
        self.table(team).critical_factors()
    }

    pub fn game_over(&self) -> GameOver {
        GameOver {
            team1: self.team1.has_critical_factor(),
            team2: self.team2.has_critical_factor(),
        }
    }

    pub fn catalog(&self) -> Option<&EventCatalog> {
        self.catalog.as_ref()
    }

    /// Replaces any previous catalog and rewinds the draw selector.
    pub fn install_catalog(&mut self, catalog: EventCatalog) {
        self.catalog = Some(catalog);
        self.selected_event = 1;
    }

    pub fn can_draw(&self) -> bool {
        self.catalog.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn selected_event(&self) -> usize {
        self.selected_event
    }

    /// Sets the draw selector, clamped to `1..=len`.
    pub fn select_event(&mut self, index: usize) -> usize {
        let len = self.catalog.as_ref().map(EventCatalog::len).unwrap_or(0);
        self.selected_event = index.clamp(1, len.max(1));
        self.selected_event
    }

    pub fn draw(&self, index: usize) -> Result<&str, GameError> {
        self.catalog.as_ref().ok_or(GameError::NoCatalog)?.draw(index)
    }

    pub fn drawn_event(&self) -> Result<&str, GameError> {
        self.draw(self.selected_event)
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::GameSession;
    use crate::catalog::EventCatalog;
    use crate::error::GameError;
    use crate::team::TeamId;

    #[test]
    fn step_value_stops_at_bounds() {
        let mut session = GameSession::new();
        assert_eq!(session.step_value(TeamId::One, 0, 10).unwrap(), 100);
        assert_eq!(session.step_value(TeamId::One, 0, -30).unwrap(), 70);
        assert_eq!(session.step_value(TeamId::One, 0, -200).unwrap(), 0);
        let row = session.table(TeamId::One).row(0).unwrap();
        assert_eq!(row.display_value(), 0);
        assert!(session.game_over().team1);
        assert!(!session.game_over().team2);
    }

    #[test]
    fn draw_without_catalog_fails() {
        let session = GameSession::new();
        assert_eq!(session.drawn_event(), Err(GameError::NoCatalog));
        assert!(!session.can_draw());
    }

    #[test]
    fn select_event_is_clamped_to_catalog() {
        let mut session = GameSession::new();
        session.install_catalog(EventCatalog::new(vec!["a".into(), "b".into()]));
        assert_eq!(session.select_event(0), 1);
        assert_eq!(session.select_event(9), 2);
        assert_eq!(session.drawn_event().unwrap(), "b");
    }
}
