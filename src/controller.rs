use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, SearchConfig, SearchError};
use crate::model::Model;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &SearchConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, SearchError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    self.handle_key(key, model.raw_keyevents())
                }
                Event::Resize(width, height) => {
                    Some(Message::Resize(width as usize, height as usize))
                }
                _ => None,
            });
        }
        Ok(None)
    }

    fn handle_key(&self, key: event::KeyEvent, raw_keyevents: bool) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::F(1), _) => Some(Message::Help),
            (KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::Down, _) => Some(Message::MoveDown),
            (KeyCode::PageUp, _) => Some(Message::MovePageUp),
            (KeyCode::PageDown, _) => Some(Message::MovePageDown),
            (KeyCode::Home, KeyModifiers::CONTROL) => Some(Message::MoveBeginning),
            (KeyCode::End, KeyModifiers::CONTROL) => Some(Message::MoveEnd),
            (KeyCode::Tab, _) => Some(Message::NextFilter),
            (KeyCode::BackTab, _) => Some(Message::PreviousFilter),
            (KeyCode::Char('f'), KeyModifiers::CONTROL) => Some(Message::OpenFilterSelect),
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => Some(Message::ClearQuery),
            (KeyCode::Char('y'), KeyModifiers::CONTROL) => Some(Message::CopyRow),
            (KeyCode::Char(c @ '1'..='6'), KeyModifiers::ALT) => c
                .to_digit(10)
                .map(|d| Message::SelectFilter(d as usize - 1)),
            _ if raw_keyevents => Some(Message::RawKey(key)),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
