use std::collections::VecDeque;

use log::{debug, info, warn};

use crate::catalog::EventCatalog;
use crate::error::LoadError;
use crate::loader::EVENT_COLUMN;
use crate::session::{GameOver, GameSession};
use crate::team::{Edits, FACTOR_COUNT, MAX_VALUE, TeamId};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Url,
    Team(TeamId),
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    EditingUrl,
    EditingValue { buffer: String },
    EditingDraw { buffer: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

impl Banner {
    fn new(kind: BannerKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// UI-side state around a [`GameSession`]: what has focus, what is being
/// typed, the status banner and the console.
#[derive(Debug, Clone)]
pub struct AppState {
    pub session: GameSession,
    pub focus: Focus,
    pub input_mode: InputMode,
    pub url_input: String,
    pub selected_row: [usize; 2],
    pub banner: Option<Banner>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    announced: GameOver,
}

impl AppState {
    pub fn new(sheet_url: impl Into<String>) -> Self {
        Self {
            session: GameSession::new(),
            focus: Focus::Url,
            input_mode: InputMode::Normal,
            url_input: sheet_url.into(),
            selected_row: [0; 2],
            banner: Some(Banner::new(
                BannerKind::Info,
                "Paste your Google Sheet link and press L to load the events.",
            )),
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            announced: GameOver::default(),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Tables and the draw panel only exist once a sheet has been loaded.
    pub fn game_started(&self) -> bool {
        self.session.catalog().is_some()
    }

    pub fn selected_row(&self, team: TeamId) -> usize {
        self.selected_row[team_slot(team)]
    }

    pub fn cycle_focus(&mut self) {
        if !self.game_started() {
            self.focus = Focus::Url;
            return;
        }
        self.focus = match self.focus {
            Focus::Url => Focus::Team(TeamId::One),
            Focus::Team(TeamId::One) => Focus::Team(TeamId::Two),
            Focus::Team(TeamId::Two) if self.session.can_draw() => Focus::Draw,
            Focus::Team(TeamId::Two) | Focus::Draw => Focus::Url,
        };
    }

    pub fn select_next(&mut self) {
        match self.focus {
            Focus::Team(team) => {
                let slot = &mut self.selected_row[team_slot(team)];
                *slot = (*slot + 1).min(FACTOR_COUNT - 1);
            }
            Focus::Draw => self.step_draw(1),
            Focus::Url => {}
        }
    }

    pub fn select_prev(&mut self) {
        match self.focus {
            Focus::Team(team) => {
                let slot = &mut self.selected_row[team_slot(team)];
                *slot = slot.saturating_sub(1);
            }
            Focus::Draw => self.step_draw(-1),
            Focus::Url => {}
        }
    }

    /// Nudges the focused factor, stopping at the bounds.
    pub fn step_selected(&mut self, delta: i16) {
        let Focus::Team(team) = self.focus else {
            return;
        };
        let row = self.selected_row(team);
        match self.session.step_value(team, row, delta) {
            Ok(value) => self.log_edit(team, row, value),
            Err(err) => self.banner = Some(Banner::new(BannerKind::Error, err.to_string())),
        }
    }

    fn step_draw(&mut self, delta: isize) {
        if !self.session.can_draw() {
            return;
        }
        let next = self.session.selected_event().saturating_add_signed(delta);
        let index = self.session.select_event(next);
        debug!("selected event {index}");
    }

    pub fn begin_input(&mut self) {
        self.input_mode = match self.focus {
            Focus::Url => InputMode::EditingUrl,
            Focus::Team(_) if self.game_started() => InputMode::EditingValue {
                buffer: String::new(),
            },
            Focus::Draw if self.session.can_draw() => InputMode::EditingDraw {
                buffer: String::new(),
            },
            _ => InputMode::Normal,
        };
    }

    pub fn input_char(&mut self, ch: char) {
        match &mut self.input_mode {
            InputMode::EditingUrl => self.url_input.push(ch),
            InputMode::EditingValue { buffer } | InputMode::EditingDraw { buffer } => {
                if ch.is_ascii_digit() && buffer.len() < 4 {
                    buffer.push(ch);
                }
            }
            InputMode::Normal => {}
        }
    }

    pub fn input_backspace(&mut self) {
        match &mut self.input_mode {
            InputMode::EditingUrl => {
                self.url_input.pop();
            }
            InputMode::EditingValue { buffer } | InputMode::EditingDraw { buffer } => {
                buffer.pop();
            }
            InputMode::Normal => {}
        }
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Commits what was typed. Values outside the widget's bounds are
    /// refused here and never reach the session.
    pub fn commit_input(&mut self) {
        let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);
        match mode {
            InputMode::Normal | InputMode::EditingUrl => {}
            InputMode::EditingValue { buffer } => {
                let Focus::Team(team) = self.focus else {
                    return;
                };
                let value = match parse_factor_value(&buffer) {
                    Ok(value) => value,
                    Err(msg) => {
                        self.banner = Some(Banner::new(BannerKind::Error, msg));
                        return;
                    }
                };
                let row = self.selected_row(team);
                match self.session.apply_edits(team, &Edits::from([(row, value)])) {
                    Ok(()) => self.log_edit(team, row, value as u8),
                    Err(err) => self.banner = Some(Banner::new(BannerKind::Error, err.to_string())),
                }
            }
            InputMode::EditingDraw { buffer } => {
                let len = self.session.catalog().map(EventCatalog::len).unwrap_or(0);
                match parse_draw_index(&buffer, len) {
                    Ok(index) => {
                        self.session.select_event(index);
                        debug!("selected event {index}");
                    }
                    Err(msg) => self.banner = Some(Banner::new(BannerKind::Error, msg)),
                }
            }
        }
    }

    /// Link to load, or `None` (with a warning) when the field is blank.
    pub fn request_load(&mut self) -> Option<String> {
        let url = self.url_input.trim();
        if url.is_empty() {
            self.banner = Some(Banner::new(BannerKind::Warning, "Please enter a valid URL."));
            return None;
        }
        info!("loading events from {url}");
        Some(url.to_string())
    }

    /// A failed load keeps whatever catalog was already there.
    pub fn apply_load_result(&mut self, result: Result<EventCatalog, LoadError>) {
        match result {
            Ok(catalog) => {
                let count = catalog.len();
                self.session.install_catalog(catalog);
                if count == 0 {
                    self.banner = Some(Banner::new(
                        BannerKind::Warning,
                        format!("No valid events found in column '{EVENT_COLUMN}'."),
                    ));
                } else {
                    self.banner = Some(Banner::new(
                        BannerKind::Success,
                        format!("Loaded {count} events!"),
                    ));
                }
                if self.focus == Focus::Url {
                    self.focus = Focus::Team(TeamId::One);
                }
            }
            Err(err) => {
                let mut text = format!("Error: {err}");
                if matches!(err, LoadError::Fetch(_)) {
                    text.push_str(
                        " Make sure the sheet is shared as 'Anyone with the link' -> 'Viewer'.",
                    );
                }
                self.banner = Some(Banner::new(BannerKind::Error, text));
            }
        }
    }

    /// Re-evaluates the loss condition; newly losing teams are logged once.
    pub fn check_game_over(&mut self) -> GameOver {
        let status = self.session.game_over();
        for team in TeamId::BOTH {
            if status.lost(team) && !self.announced.lost(team) {
                if let Some(message) = self.game_over_message(team) {
                    warn!("{message}");
                }
            }
        }
        self.announced = status;
        status
    }

    /// Loss banner for `team`, naming every exhausted factor.
    pub fn game_over_message(&self, team: TeamId) -> Option<String> {
        let factors = self.session.critical_factors(team);
        if factors.is_empty() {
            return None;
        }
        let labels: Vec<&str> = factors.into_iter().map(|f| f.label()).collect();
        Some(format!(
            "GAME OVER! {} has completely exhausted: {}",
            team.label(),
            labels.join(", ")
        ))
    }

    /// Throws the whole session away, like reloading the page.
    pub fn restart(&mut self) {
        self.session = GameSession::new();
        self.focus = Focus::Url;
        self.input_mode = InputMode::Normal;
        self.selected_row = [0; 2];
        self.announced = GameOver::default();
        self.banner = Some(Banner::new(
            BannerKind::Info,
            "New game. Press L to load the events.",
        ));
        info!("session restarted");
    }

    fn log_edit(&self, team: TeamId, row: usize, value: u8) {
        if let Some(factor) = self.session.table(team).row(row).map(|r| r.factor()) {
            debug!("{} {} -> {value}", team.label(), factor.label());
        }
    }
}

fn team_slot(team: TeamId) -> usize {
    match team {
        TeamId::One => 0,
        TeamId::Two => 1,
    }
}

pub fn parse_factor_value(input: &str) -> Result<u16, String> {
    let msg = || format!("Enter a whole number between 0 and {MAX_VALUE}.");
    let value = input.trim().parse::<u16>().map_err(|_| msg())?;
    if value > MAX_VALUE as u16 {
        return Err(msg());
    }
    Ok(value)
}

pub fn parse_draw_index(input: &str, len: usize) -> Result<usize, String> {
    let msg = || format!("Pick a number from 1 to {len}.");
    let index = input.trim().parse::<usize>().map_err(|_| msg())?;
    if index == 0 || index > len {
        return Err(msg());
    }
    Ok(index)
}
