use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use tracing::trace;

/// Single line text editor backing the query input. The cursor counts chars.
#[derive(Default)]
pub struct Inputter {
    current_input: String,
    curser_pos: usize,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct InputResult {
    pub input: String,
    pub curser_pos: usize,
}

impl Inputter {
    pub fn read(&mut self, key: event::KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, KeyModifiers::NONE) => self.left(),
            (KeyCode::Right, KeyModifiers::NONE) => self.right(),
            (KeyCode::Home, KeyModifiers::NONE) => self.home(),
            (KeyCode::End, KeyModifiers::NONE) => self.end(),
            (kc, km) => self.key(kc, km),
        }
    }

    pub fn get(&self) -> InputResult {
        InputResult {
            input: self.current_input.clone(),
            curser_pos: self.curser_pos,
        }
    }

    /// Replaces the text and puts the cursor behind the last char.
    pub fn set(&mut self, input: &str) {
        self.current_input = input.to_string();
        self.curser_pos = input.chars().count();
    }

    pub fn clear(&mut self) {
        self.current_input.clear();
        self.curser_pos = 0;
    }

    fn backspace(&mut self) -> InputResult {
        if self.curser_pos > 0 {
            self.curser_pos -= 1;
            let pos = self.getbytepos();
            self.current_input.remove(pos);
        }
        self.get()
    }

    fn delete(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            let pos = self.getbytepos();
            self.current_input.remove(pos);
        }
        self.get()
    }

    fn left(&mut self) -> InputResult {
        self.curser_pos = self.curser_pos.saturating_sub(1);
        self.get()
    }

    fn right(&mut self) -> InputResult {
        if self.curser_pos < self.current_input.chars().count() {
            self.curser_pos += 1;
        }
        self.get()
    }

    fn home(&mut self) -> InputResult {
        self.curser_pos = 0;
        self.get()
    }

    fn end(&mut self) -> InputResult {
        self.curser_pos = self.current_input.chars().count();
        self.get()
    }

    fn key(&mut self, code: KeyCode, modifier: KeyModifiers) -> InputResult {
        // Control combinations are commands, not text
        if modifier.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
            trace!("Ignoring {code:?} with {modifier:?}");
            return self.get();
        }
        if let Some(chr) = code.as_char() {
            self.current_input.insert(self.getbytepos(), chr);
            self.curser_pos += 1;
        }
        self.get()
    }

    fn getbytepos(&self) -> usize {
        self.current_input
            .char_indices()
            .nth(self.curser_pos)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(self.current_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn type_str(input: &mut Inputter, s: &str) -> InputResult {
        let mut last = input.get();
        for c in s.chars() {
            last = input.read(KeyEvent::from(KeyCode::Char(c)));
        }
        last
    }

    #[test]
    fn typing_appends() {
        let mut input = Inputter::default();
        let result = type_str(&mut input, "John");
        assert_eq!(result.input, "John");
        assert_eq!(result.curser_pos, 4);
    }

    #[test]
    fn insert_and_delete_at_cursor() {
        let mut input = Inputter::default();
        type_str(&mut input, "Jne");
        input.read(KeyEvent::from(KeyCode::Left));
        input.read(KeyEvent::from(KeyCode::Left));
        let result = type_str(&mut input, "a");
        assert_eq!(result.input, "Jane");
        assert_eq!(result.curser_pos, 2);

        let result = input.read(KeyEvent::from(KeyCode::Backspace));
        assert_eq!(result.input, "Jne");
        assert_eq!(result.curser_pos, 1);

        let result = input.read(KeyEvent::from(KeyCode::Delete));
        assert_eq!(result.input, "Je");
        assert_eq!(result.curser_pos, 1);
    }

    #[test]
    fn multibyte_characters() {
        let mut input = Inputter::default();
        type_str(&mut input, "Zoë");
        input.read(KeyEvent::from(KeyCode::Home));
        let result = input.read(KeyEvent::from(KeyCode::Delete));
        assert_eq!(result.input, "oë");
        input.read(KeyEvent::from(KeyCode::End));
        let result = input.read(KeyEvent::from(KeyCode::Backspace));
        assert_eq!(result.input, "o");
    }

    #[test]
    fn spaces_are_kept() {
        let mut input = Inputter::default();
        let result = type_str(&mut input, " a ");
        assert_eq!(result.input, " a ");
    }

    #[test]
    fn control_keys_do_not_insert() {
        let mut input = Inputter::default();
        let result = input.read(KeyEvent::new(KeyCode::Char('y'), KeyModifiers::CONTROL));
        assert_eq!(result.input, "");
    }

    #[test]
    fn clear_resets() {
        let mut input = Inputter::default();
        type_str(&mut input, "Doe");
        assert_eq!(input.get().curser_pos, 3);
        input.clear();
        assert_eq!(input.get(), InputResult::default());
    }

    #[test]
    fn set_moves_cursor_to_end() {
        let mut input = Inputter::default();
        input.set("Zoë");
        assert_eq!(input.get().curser_pos, 3);
        let result = type_str(&mut input, "y");
        assert_eq!(result.input, "Zoëy");
        input.read(KeyEvent::from(KeyCode::Left));
        let result = input.read(KeyEvent::from(KeyCode::Backspace));
        assert_eq!(result.input, "Zoy");
    }
}
