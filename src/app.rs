//! UI shell
//!
//! Shows the live log tail and status notices until the user quits. Container
//! views come from the connector and are not part of this shell.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::cli::Options;
use crate::logging::{Logger, TailStream};
use crate::tui::{LogPane, StatusBanner, Tui};

/// Lines kept by the log pane
const PANE_LINES: usize = 5_000;

/// Lines moved by PageUp/PageDown
const PAGE: usize = 10;

/// What a key press asks the shell to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ScrollUp(usize),
    ScrollDown(usize),
    Top,
    Bottom,
    None,
}

/// Map a key press to an action
pub fn action_for(key: KeyEvent) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') => Action::ScrollUp(1),
        KeyCode::Down | KeyCode::Char('j') => Action::ScrollDown(1),
        KeyCode::PageUp => Action::ScrollUp(PAGE),
        KeyCode::PageDown => Action::ScrollDown(PAGE),
        KeyCode::Char('g') | KeyCode::Home => Action::Top,
        KeyCode::Char('G') | KeyCode::End => Action::Bottom,
        _ => Action::None,
    }
}

/// Main application
pub struct App {
    logger: Arc<Logger>,
    options: Options,
    tail: TailStream,
    pane: LogPane,
    banner: StatusBanner,
    tui: Tui,
    needs_render: bool,
    /// Height of the log pane content at the last render
    pane_height: usize,
}

impl App {
    /// Create the application; must be called from within a tokio runtime
    pub fn new(logger: Arc<Logger>, options: Options) -> Result<Self> {
        let tail = logger.tail();
        Ok(Self {
            logger,
            options,
            tail,
            pane: LogPane::new(PANE_LINES),
            banner: StatusBanner::new(),
            tui: Tui::new()?,
            needs_render: true,
            pane_height: 0,
        })
    }

    /// Run the main application loop
    pub async fn run(&mut self) -> Result<()> {
        self.tui.enter()?;
        tracing::info!("icm started ({}). Press 'q' to quit.", self.options.summary());

        let result = self.event_loop().await;

        // Exit TUI mode (also done in Drop, but explicit is clearer)
        self.tui.exit()?;

        result
    }

    async fn event_loop(&mut self) -> Result<()> {
        let tick_rate = Duration::from_millis(50);

        loop {
            self.pull_updates();

            if self.needs_render {
                self.render()?;
                self.needs_render = false;
            }

            if event::poll(tick_rate)? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.handle_action(action_for(key)) {
                            return Ok(());
                        }
                        self.needs_render = true;
                    }
                    Event::Resize(_, _) => self.needs_render = true,
                    _ => {}
                }
            }

            tokio::task::yield_now().await;
        }
    }

    /// Move new tail lines and status notices into the widgets
    fn pull_updates(&mut self) {
        while let Some(line) = self.tail.try_next() {
            self.pane.push(line);
            self.needs_render = true;
        }

        if self.logger.has_pending() {
            self.banner.extend(self.logger.drain());
            self.needs_render = true;
        }
        if self.banner.tick() {
            self.needs_render = true;
        }
    }

    /// Apply an action; returns true when the shell should quit
    fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::ScrollUp(n) => self.pane.scroll_up(n, self.pane_height),
            Action::ScrollDown(n) => self.pane.scroll_down(n, self.pane_height),
            Action::Top => self.pane.scroll_to_top(),
            Action::Bottom => self.pane.scroll_to_bottom(),
            Action::None => {}
        }
        false
    }

    fn render(&mut self) -> Result<()> {
        let header = format!(" icm - {}", self.options.summary());
        let pane = &self.pane;
        let banner = &self.banner;
        let mut pane_height = self.pane_height;

        self.tui.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Min(3),
                    Constraint::Length(1),
                ])
                .split(frame.size());

            frame.render_widget(
                Paragraph::new(header).style(Style::default().fg(Color::Cyan).bold()),
                chunks[0],
            );

            pane_height = chunks[1].height.saturating_sub(2) as usize;
            pane.render(frame, chunks[1], "Logs");

            if banner.is_empty() {
                frame.render_widget(
                    Paragraph::new("↑/k ↓/j: scroll | g: top | G: follow | PgUp/PgDn: page | q: quit")
                        .style(Style::default().fg(Color::DarkGray))
                        .block(Block::default().borders(Borders::NONE)),
                    chunks[2],
                );
            } else {
                banner.render(frame, chunks[2]);
            }
        })?;

        self.pane_height = pane_height;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(action_for(press(KeyCode::Char('q'))), Action::Quit);
        assert_eq!(action_for(press(KeyCode::Esc)), Action::Quit);
        assert_eq!(
            action_for(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Action::Quit
        );
    }

    #[test]
    fn test_scroll_keys() {
        assert_eq!(action_for(press(KeyCode::Char('k'))), Action::ScrollUp(1));
        assert_eq!(action_for(press(KeyCode::PageDown)), Action::ScrollDown(PAGE));
        assert_eq!(action_for(press(KeyCode::Char('g'))), Action::Top);
        assert_eq!(action_for(press(KeyCode::Char('G'))), Action::Bottom);
    }

    #[test]
    fn test_plain_c_is_ignored() {
        assert_eq!(action_for(press(KeyCode::Char('c'))), Action::None);
    }
}
