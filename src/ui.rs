use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, Cell, Clear, List, ListState, Padding, Paragraph, Row, Table, TableState,
    },
};

use crate::model::{Model, UIData};

pub const HEADER_HEIGHT: usize = 3;
pub const TABLE_HEADER_HEIGHT: usize = 3; // Header row plus the two borders
pub const SUMMARY_HEIGHT: usize = 1;
pub const STATUSLINE_HEIGHT: usize = 1;

const TITLE: &str = "Real-time Search for Users";
const INPUT_WIDTH: u16 = 34;
const SELECTOR_WIDTH: u16 = 22;
const KEY_HINTS: &str = " Tab field · Ctrl-F choose field · F1 help · Esc quit ";

pub struct TableUI {
    table_state: TableState,
    highlight: Style,
}

impl Default for TableUI {
    fn default() -> Self {
        Self::new()
    }
}

impl TableUI {
    pub fn new() -> Self {
        Self {
            table_state: TableState::default(),
            highlight: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [header_area, table_area, summary_area, status_area] = Layout::vertical([
            Constraint::Length(HEADER_HEIGHT as u16),
            Constraint::Min(TABLE_HEADER_HEIGHT as u16),
            Constraint::Length(SUMMARY_HEIGHT as u16),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        self.render_header(uidata, frame, header_area);
        self.render_table(uidata, frame, table_area);
        Self::render_summary(uidata, frame, summary_area);
        Self::render_statusline(uidata, frame, status_area);

        if uidata.show_filter_select {
            self.render_filter_select(uidata, frame);
        }
        if uidata.show_popup {
            Self::render_popup(uidata, frame);
        }
    }

    fn render_header(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let [title_area, input_area, selector_area] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(INPUT_WIDTH),
            Constraint::Length(SELECTOR_WIDTH),
        ])
        .areas(area);

        let title = Paragraph::new(Line::from(TITLE.bold()))
            .block(Block::new().padding(Padding::top(1)));
        frame.render_widget(title, title_area);

        // Placeholder only while nothing is typed
        let input_text = if uidata.input.input.is_empty() {
            Line::from(uidata.placeholder.as_str().dark_gray())
        } else {
            Line::from(uidata.input.input.as_str())
        };
        frame.render_widget(
            Paragraph::new(input_text).block(Block::bordered()),
            input_area,
        );

        let selector = Line::from(vec![
            Span::raw(uidata.filter_label.as_str()),
            Span::raw(" ▾").dark_gray(),
        ]);
        frame.render_widget(
            Paragraph::new(selector).block(Block::bordered()),
            selector_area,
        );

        if !uidata.show_popup && !uidata.show_filter_select {
            // Cursor goes behind the display width of the text before it
            let input = &uidata.input;
            let before: String = input.input.chars().take(input.curser_pos).collect();
            let inner_width = input_area.width.saturating_sub(2);
            let offset = std::cmp::min(Line::from(before).width() as u16, inner_width);
            frame.set_cursor_position(Position::new(input_area.x + 1 + offset, input_area.y + 1));
        }
    }

    fn render_table(&mut self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let ncols = uidata.header.len() as u32;
        let widths = vec![Constraint::Ratio(1, ncols.max(1)); ncols as usize];

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let header = Row::new(
            uidata
                .header
                .iter()
                .map(|h| Cell::from(h.as_str()).style(bold)),
        );
        let rows = uidata
            .rows
            .iter()
            .map(|row| Row::new(row.iter().map(|c| Cell::from(c.as_str()))));

        let title = Line::from(Span::from(format!(" {} ", uidata.name)).bold());
        let count = Line::from(format!(" {} rows ", uidata.nrows)).right_aligned();
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(self.highlight)
            .block(Block::bordered().title(title).title_bottom(count));

        // Rows are already windowed by the model
        self.table_state.select(uidata.selected_row);
        *self.table_state.offset_mut() = 0;
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }

    fn render_summary(uidata: &UIData, frame: &mut Frame, area: Rect) {
        if let Some(summary) = &uidata.summary {
            let line = Line::from(summary.as_str().bold()).right_aligned();
            frame.render_widget(Paragraph::new(line), area);
        }
    }

    fn render_statusline(uidata: &UIData, frame: &mut Frame, area: Rect) {
        let [message_area, hints_area] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(KEY_HINTS.chars().count() as u16),
        ])
        .areas(area);
        frame.render_widget(
            Paragraph::new(uidata.status_message.as_str().yellow()),
            message_area,
        );
        frame.render_widget(Paragraph::new(KEY_HINTS.dark_gray()), hints_area);
    }

    fn render_filter_select(&self, uidata: &UIData, frame: &mut Frame) {
        let height = uidata.filter_options.len() as u16 + 2;
        let area = popup_area(frame.area(), SELECTOR_WIDTH + 4, height);
        let items = uidata.filter_options.iter().map(|o| o.as_str());
        let list = List::new(items)
            .block(Block::bordered().title(" Search field "))
            .highlight_style(self.highlight)
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(uidata.filter_select_curser));
        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_popup(uidata: &UIData, frame: &mut Frame) {
        let lines = uidata.popup_message.lines().count() as u16;
        let width = uidata
            .popup_message
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0) as u16;
        let area = popup_area(frame.area(), width + 4, lines + 2);
        let popup = Paragraph::new(uidata.popup_message.as_str())
            .block(Block::bordered().title(" Help ".bold()));
        frame.render_widget(Clear, area);
        frame.render_widget(popup, area);
    }
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}
