use crate::error::GameError;

/// Ordered event prompts from one successful load. Replaced wholesale by
/// the next successful load, never edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCatalog {
    events: Vec<String>,
}

impl EventCatalog {
    pub fn new(events: Vec<String>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    /// Event at a 1-based position. Draws do not consume events.
    pub fn draw(&self, index: usize) -> Result<&str, GameError> {
        if index == 0 || index > self.events.len() {
            return Err(GameError::DrawOutOfRange {
                index,
                len: self.events.len(),
            });
        }
        Ok(&self.events[index - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::EventCatalog;
    use crate::error::GameError;

    fn catalog() -> EventCatalog {
        EventCatalog::new(vec![
            "flood".to_string(),
            "riot".to_string(),
            "plague".to_string(),
        ])
    }

    #[test]
    fn draw_is_one_based() {
        let catalog = catalog();
        assert_eq!(catalog.draw(1).unwrap(), "flood");
        assert_eq!(catalog.draw(2).unwrap(), "riot");
        assert_eq!(catalog.draw(3).unwrap(), "plague");
    }

    #[test]
    fn draw_does_not_consume() {
        let catalog = catalog();
        assert_eq!(catalog.draw(2).unwrap(), catalog.draw(2).unwrap());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn draw_rejects_zero_and_past_end() {
        let catalog = catalog();
        assert_eq!(
            catalog.draw(0),
            Err(GameError::DrawOutOfRange { index: 0, len: 3 })
        );
        assert!(catalog.draw(4).is_err());
    }
}
