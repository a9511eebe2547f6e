use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};

use war_games_terminal::config::GameConfig;
use war_games_terminal::console_log::ConsoleLogger;
use war_games_terminal::document_source::HttpDocumentSource;
use war_games_terminal::loader::{EVENT_COLUMN, EventLoader};
use war_games_terminal::session::GameOver;
use war_games_terminal::state::{AppState, BannerKind, Focus, InputMode};
use war_games_terminal::team::{FactorRow, TeamId};

struct App {
    state: AppState,
    loader: EventLoader<HttpDocumentSource>,
    should_quit: bool,
}

impl App {
    fn new(config: &GameConfig) -> Self {
        Self {
            state: AppState::new(config.sheet_url.clone()),
            loader: EventLoader::new(
                HttpDocumentSource::new(config.fetch_timeout),
                config.cache_ttl,
            ),
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.input_mode != InputMode::Normal {
            self.on_input_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            KeyCode::Tab => self.state.cycle_focus(),
            KeyCode::Char('l') | KeyCode::Char('L') => self.load_events(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.state.restart(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Right => {
                self.on_step(1);
            }
            KeyCode::Char('-') | KeyCode::Left => self.on_step(-1),
            KeyCode::PageUp => self.state.step_selected(10),
            KeyCode::PageDown => self.state.step_selected(-10),
            KeyCode::Enter | KeyCode::Char('e') => self.state.begin_input(),
            _ => {}
        }
    }

    fn on_step(&mut self, delta: i16) {
        match self.state.focus {
            Focus::Draw if delta > 0 => self.state.select_next(),
            Focus::Draw => self.state.select_prev(),
            _ => self.state.step_selected(delta),
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.cancel_input(),
            KeyCode::Enter => self.state.commit_input(),
            KeyCode::Backspace => self.state.input_backspace(),
            KeyCode::Char(ch) => self.state.input_char(ch),
            _ => {}
        }
    }

    fn load_events(&mut self) {
        let Some(url) = self.state.request_load() else {
            return;
        };
        let result = self.loader.load(&url);
        self.state.apply_load_result(result);
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = GameConfig::from_env();
    let log_rx = match ConsoleLogger::install(config.log_level) {
        Ok(rx) => rx,
        Err(err) => {
            eprintln!("error: {err}");
            return Ok(());
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(&config);
    let res = run_app(&mut terminal, &mut app, log_rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    log_rx: mpsc::Receiver<String>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        app.state.check_game_over();
        while let Ok(line) = log_rx.try_recv() {
            app.state.push_log(line);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let state = &app.state;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text())
        .block(Block::default().borders(Borders::BOTTOM))
        .style(Style::default().add_modifier(Modifier::BOLD));
    frame.render_widget(header, chunks[0]);

    render_url_input(frame, chunks[1], state);
    render_banner(frame, chunks[2], state);

    if state.game_started() {
        let status = state.session.game_over();
        render_teams(frame, chunks[3], state);
        render_draw_panel(frame, chunks[4], state, status);
    } else {
        let info = Paragraph::new(format!(
            "The sheet must be shared as 'Anyone with the link' (Viewer) and have a column named exactly '{EVENT_COLUMN}'.\nPress L to load it."
        ))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title("Game panel").borders(Borders::ALL));
        frame.render_widget(info, chunks[3]);
    }

    render_console(frame, chunks[5], state);

    let footer = Paragraph::new(footer_text(state));
    frame.render_widget(footer, chunks[6]);

    if state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text() -> String {
    "  THE WAR GAMES | a survival game where every choice counts".to_string()
}

fn footer_text(state: &AppState) -> String {
    match state.input_mode {
        InputMode::Normal => match state.focus {
            Focus::Url => "Tab Focus | e Edit URL | L Load | r Restart | ? Help | q Quit".to_string(),
            Focus::Team(_) => {
                "Tab Focus | j/k Row | +/- Step | PgUp/PgDn ±10 | Enter Type value | L Load | r Restart | ? Help | q Quit".to_string()
            }
            Focus::Draw => {
                "Tab Focus | j/k/←/→ Event number | Enter Type number | r Restart | ? Help | q Quit".to_string()
            }
        },
        _ => "Enter Confirm | Esc Cancel | Backspace Delete".to_string(),
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn render_url_input(frame: &mut Frame, area: Rect, state: &AppState) {
    let editing = state.input_mode == InputMode::EditingUrl;
    let text = if editing {
        format!("{}_", state.url_input)
    } else {
        state.url_input.clone()
    };
    let title = if editing {
        "Google Sheet URL (editing)"
    } else {
        "Google Sheet URL"
    };
    let input = Paragraph::new(text).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(focus_style(state.focus == Focus::Url)),
    );
    frame.render_widget(input, area);
}

fn render_banner(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(banner) = state.banner.as_ref() else {
        return;
    };
    let color = match banner.kind {
        BannerKind::Info => Color::Cyan,
        BannerKind::Success => Color::Green,
        BannerKind::Warning => Color::Yellow,
        BannerKind::Error => Color::Red,
    };
    let paragraph = Paragraph::new(banner.text.as_str())
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
    frame.render_widget(paragraph, area);
}

fn render_teams(frame: &mut Frame, area: Rect, state: &AppState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    for (team, col) in TeamId::BOTH.into_iter().zip(cols.iter()) {
        render_team_table(frame, *col, state, team);
    }
}

fn team_color(team: TeamId) -> Color {
    match team {
        TeamId::One => Color::Red,
        TeamId::Two => Color::Blue,
    }
}

fn render_team_table(frame: &mut Frame, area: Rect, state: &AppState, team: TeamId) {
    let focused = state.focus == Focus::Team(team);
    let marker = match team {
        TeamId::One => "🟥",
        TeamId::Two => "🟦",
    };
    let block = Block::default()
        .title(format!("{marker} {}", team.label()))
        .borders(Borders::ALL)
        .border_style(focus_style(focused));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    let widths = table_columns();
    render_table_header(frame, sections[0], &widths);

    let table = state.session.table(team);
    for (idx, row) in table.rows().iter().enumerate() {
        if idx as u16 >= sections[1].height {
            break;
        }
        let row_area = Rect {
            x: sections[1].x,
            y: sections[1].y + idx as u16,
            width: sections[1].width,
            height: 1,
        };
        let selected = focused && idx == state.selected_row(team);
        let editing = match &state.input_mode {
            InputMode::EditingValue { buffer } if selected => Some(buffer.as_str()),
            _ => None,
        };
        render_factor_row(frame, row_area, row, team, selected, editing, &widths);
    }
}

fn table_columns() -> [Constraint; 3] {
    [
        Constraint::Length(24),
        Constraint::Length(8),
        Constraint::Min(10),
    ]
}

fn render_table_header(frame: &mut Frame, area: Rect, widths: &[Constraint]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.to_vec())
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);
    for (label, col) in ["Factor", "Value", "Health"].iter().zip(cols.iter()) {
        frame.render_widget(Paragraph::new(*label).style(style), *col);
    }
}

fn render_factor_row(
    frame: &mut Frame,
    area: Rect,
    row: &FactorRow,
    team: TeamId,
    selected: bool,
    editing: Option<&str>,
    widths: &[Constraint],
) {
    let row_style = if selected {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default()
    };
    if selected {
        frame.render_widget(Block::default().style(row_style), area);
    }
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.to_vec())
        .split(area);

    let value = match editing {
        Some(buffer) => format!("[{buffer}_]"),
        None => row.raw_value().to_string(),
    };
    frame.render_widget(Paragraph::new(row.factor().label()).style(row_style), cols[0]);
    frame.render_widget(Paragraph::new(value).style(row_style), cols[1]);

    let percent = row.display_value();
    let gauge_color = if percent == 0 {
        Color::DarkGray
    } else {
        team_color(team)
    };
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(gauge_color))
        .percent(u16::from(percent))
        .label(format!("{percent}%"));
    frame.render_widget(gauge, cols[2]);
}

fn render_draw_panel(frame: &mut Frame, area: Rect, state: &AppState, status: GameOver) {
    let focused = state.focus == Focus::Draw;
    let mut lines: Vec<Line> = Vec::new();

    for team in TeamId::BOTH {
        if !status.lost(team) {
            continue;
        }
        if let Some(message) = state.game_over_message(team) {
            lines.push(Line::styled(
                format!("☠️ {message} ☠️"),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }
    }

    match state.session.catalog() {
        Some(catalog) if !catalog.is_empty() => {
            let selector = match &state.input_mode {
                InputMode::EditingDraw { buffer } => format!("[{buffer}_]"),
                _ => state.session.selected_event().to_string(),
            };
            lines.push(Line::raw(format!(
                "Pick a number from 1 to {}: {selector}",
                catalog.len()
            )));
            if let Ok(event) = state.session.drawn_event() {
                lines.push(Line::styled(
                    format!("Event drawn: {event}"),
                    Style::default().fg(Color::Yellow),
                ));
            }
        }
        _ => lines.push(Line::styled(
            format!("No valid events found in column '{EVENT_COLUMN}' of the sheet."),
            Style::default().fg(Color::Yellow),
        )),
    }

    if status.is_over() {
        lines.push(Line::raw("The game is over. Press r to start again."));
    }

    let panel = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title("Draw an event")
            .borders(Borders::ALL)
            .border_style(focus_style(focused)),
    );
    frame.render_widget(panel, area);
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = state.logs.len().saturating_sub(visible);
    let text = state
        .logs
        .iter()
        .skip(start)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let console = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "The War Games - Help",
        "",
        "Global:",
        "  Tab          Next panel",
        "  L            Load events from the sheet",
        "  r            Restart the game",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "URL panel:",
        "  e / Enter    Edit the link",
        "",
        "Team tables:",
        "  j/k or ↑/↓   Move between factors",
        "  + / -        Step value by 1",
        "  PgUp/PgDn    Step value by 10",
        "  Enter        Type a value (0-100)",
        "",
        "Draw panel:",
        "  j/k or ←/→   Change event number",
        "  Enter        Type an event number",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
