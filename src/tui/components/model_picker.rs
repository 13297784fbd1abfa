//! Two-stage overlay for choosing the session's provider and model.
//! Opened with Ctrl+P, dismissed with Esc.
//!
//! Stage one lists the providers the server advertises, stage two the models
//! of the chosen provider. Picking a different provider clears the session's
//! model so a stale model name never rides along with the new provider;
//! picking a model keeps the provider as-is.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph};

use crate::api::ServerConfig;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::session_panel::centered_rect;
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Providers,
    Models,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    /// Provider changed; the session's model resets and must be re-picked.
    SetProvider(String),
    SetModel(String),
    Dismiss,
}

pub struct ModelPickerState {
    stage: Stage,
    selected: usize,
    list_state: ListState,
    /// Provider whose models stage two lists.
    provider: Option<String>,
}

impl Default for ModelPickerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelPickerState {
    pub fn new() -> Self {
        Self {
            stage: Stage::Providers,
            selected: 0,
            list_state: ListState::default(),
            provider: None,
        }
    }

    /// Open at the session's current provider and model.
    pub fn open(
        &mut self,
        catalog: &ServerConfig,
        current_provider: &str,
        current_model: &str,
    ) {
        if !current_provider.is_empty() && catalog.providers.iter().any(|p| p == current_provider)
        {
            self.provider = Some(current_provider.to_string());
            self.stage = Stage::Models;
            self.selected = catalog
                .models_for(current_provider)
                .iter()
                .position(|m| m == current_model)
                .unwrap_or(0);
        } else {
            self.provider = None;
            self.stage = Stage::Providers;
            self.selected = 0;
        }
    }
}

pub struct ModelPicker<'a> {
    state: &'a mut ModelPickerState,
    catalog: &'a ServerConfig,
}

impl<'a> ModelPicker<'a> {
    pub fn new(state: &'a mut ModelPickerState, catalog: &'a ServerConfig) -> Self {
        Self { state, catalog }
    }

    fn items(&self) -> Vec<String> {
        match self.state.stage {
            Stage::Providers => self.catalog.providers.clone(),
            Stage::Models => self
                .state
                .provider
                .as_deref()
                .map(|p| self.catalog.models_for(p).to_vec())
                .unwrap_or_default(),
        }
    }
}

impl EventHandler for ModelPicker<'_> {
    type Event = PickerEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<PickerEvent> {
        let items = self.items();
        match event {
            TuiEvent::Escape => match self.state.stage {
                // Esc from stage two backs out to the provider list
                Stage::Models => {
                    self.state.stage = Stage::Providers;
                    self.state.selected = self
                        .state
                        .provider
                        .as_deref()
                        .and_then(|p| self.catalog.providers.iter().position(|x| x == p))
                        .unwrap_or(0);
                    None
                }
                Stage::Providers => Some(PickerEvent::Dismiss),
            },
            TuiEvent::CursorUp => {
                self.state.selected = self.state.selected.saturating_sub(1);
                None
            }
            TuiEvent::CursorDown => {
                if !items.is_empty() {
                    self.state.selected = (self.state.selected + 1).min(items.len() - 1);
                }
                None
            }
            TuiEvent::Submit => {
                let choice = items.get(self.state.selected)?.clone();
                match self.state.stage {
                    Stage::Providers => {
                        let changed = self.state.provider.as_deref() != Some(choice.as_str());
                        self.state.provider = Some(choice.clone());
                        self.state.stage = Stage::Models;
                        self.state.selected = 0;
                        changed.then_some(PickerEvent::SetProvider(choice))
                    }
                    Stage::Models => Some(PickerEvent::SetModel(choice)),
                }
            }
            _ => None,
        }
    }
}

impl Component for ModelPicker<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(50, 60, area);
        frame.render_widget(Clear, overlay);

        let title = match self.state.stage {
            Stage::Providers => " Provider ".to_string(),
            Stage::Models => match self.state.provider.as_deref() {
                Some(p) => format!(" Models · {p} "),
                None => " Models ".to_string(),
            },
        };
        let help = match self.state.stage {
            Stage::Providers => " Enter Choose  Esc Back ",
            Stage::Models => " Enter Choose  Esc Providers ",
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(title)
            .title_bottom(Line::from(help).centered())
            .padding(Padding::horizontal(1));

        let items = self.items();
        if items.is_empty() {
            let empty = Paragraph::new("Nothing to choose from.")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, overlay);
            return;
        }

        self.state.selected = self.state.selected.min(items.len() - 1);
        self.state.list_state.select(Some(self.state.selected));

        let list = List::new(items.into_iter().map(ListItem::new).collect::<Vec<_>>())
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            );

        frame.render_stateful_widget(list, overlay, &mut self.state.list_state);
    }
}
