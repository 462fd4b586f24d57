use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::time::Instant;
use tracing::{debug, error, info, trace};

use crate::catalog::{FILTERS, FilterField, ID_HEADER};
use crate::dataset::{Dataset, Record};
use crate::domain::{HELP_TEXT, Message, SearchConfig, SearchError};
use crate::inputter::{InputResult, Inputter};
use crate::search;
use crate::ui::{HEADER_HEIGHT, STATUSLINE_HEIGHT, SUMMARY_HEIGHT, TABLE_HEADER_HEIGHT};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    SEARCH,
    FILTERSELECT,
    POPUP,
}

/// The two user controlled values of the search widget.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    pub filter: FilterField,
    pub query: String,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            filter: FILTERS[0],
            query: String::new(),
        }
    }
}

struct TableView {
    rows: Vec<usize>, // Indices into Model.records that pass the current filter
    curser_row: usize,
    offset_row: usize,
    heigh: usize,
}

impl TableView {
    fn empty() -> Self {
        TableView {
            rows: Vec::new(),
            curser_row: 0,
            offset_row: 0,
            heigh: 0,
        }
    }

    fn selected(&self) -> Option<usize> {
        if self.rows.is_empty() {
            None
        } else {
            Some(self.offset_row + self.curser_row)
        }
    }

    // Moves the cursor to the absolute row, shifting the window if needed
    fn select(&mut self, row: usize) {
        if self.rows.is_empty() {
            self.curser_row = 0;
            self.offset_row = 0;
            return;
        }
        let row = std::cmp::min(row, self.rows.len() - 1);
        let height = std::cmp::max(self.heigh, 1);
        if row < self.offset_row {
            self.offset_row = row;
        } else if row >= self.offset_row + height {
            self.offset_row = row + 1 - height;
        }
        self.curser_row = row - self.offset_row;
    }
}

pub struct UIData {
    pub name: String,
    pub input: InputResult,
    pub placeholder: String,
    pub filter_label: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>, // Visible rows only, already formatted for display
    pub nrows: usize,
    pub selected_row: Option<usize>,
    pub summary: Option<String>,
    pub show_popup: bool,
    pub popup_message: String,
    pub show_filter_select: bool,
    pub filter_options: Vec<String>,
    pub filter_select_curser: usize,
    pub status_message: String,
    pub layout: UILayout,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            input: InputResult::default(),
            placeholder: String::new(),
            filter_label: String::new(),
            header: Vec::new(),
            rows: Vec::new(),
            nrows: 0,
            selected_row: None,
            summary: None,
            show_popup: false,
            popup_message: String::new(),
            show_filter_select: false,
            filter_options: Vec::new(),
            filter_select_curser: 0,
            status_message: String::new(),
            layout: UILayout::default(),
        }
    }
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let table_height = ui_height.saturating_sub(
            HEADER_HEIGHT + TABLE_HEADER_HEIGHT + SUMMARY_HEIGHT + STATUSLINE_HEIGHT,
        );
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_height,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    pub status: Status,
    modus: Modus,
    name: String,
    records: Vec<Record>,
    state: WidgetState,
    table: TableView,
    uilayout: UILayout,
    uidata: UIData,
    clipboard: Option<Clipboard>,
    input: Inputter,
    filter_select_curser: usize,
    status_message: String,
}

impl Model {
    pub fn init(
        config: &SearchConfig,
        dataset: Dataset,
        ui_width: usize,
        ui_height: usize,
    ) -> Self {
        // Tables are titled after their file unless a title is given
        let name = if config.source_name.is_empty() {
            dataset.name
        } else {
            config.source_name.clone()
        };
        let mut model = Self {
            status: Status::READY,
            modus: Modus::SEARCH,
            name,
            records: dataset.records,
            state: WidgetState::default(),
            table: TableView::empty(),
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::empty(),
            clipboard: None,
            input: Inputter::default(),
            filter_select_curser: 0,
            status_message: String::new(),
        };
        model.status_message = format!("Loaded {} users from {}", model.records.len(), model.name);
        if !config.query.is_empty() {
            model.input.set(&config.query);
            model.state.query = config.query.clone();
        }
        model.refresh_view();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    /// Records currently passing the filter, in dataset order.
    pub fn filtered(&self) -> impl Iterator<Item = &Record> {
        self.table.rows.iter().map(|&idx| &self.records[idx])
    }

    /// True while key presses should be routed to the query input.
    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::SEARCH
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), SearchError> {
        if let Some(msg) = message {
            trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
            match self.modus {
                Modus::SEARCH => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit => self.exit(),
                    Message::MoveUp => self.move_selection_up(1),
                    Message::MoveDown => self.move_selection_down(1),
                    Message::MovePageUp => self.move_selection_up(self.page_size()),
                    Message::MovePageDown => self.move_selection_down(self.page_size()),
                    Message::MoveBeginning => self.move_selection_beginning(),
                    Message::MoveEnd => self.move_selection_end(),
                    Message::NextFilter => self.select_filter(self.state.filter.next().index()),
                    Message::PreviousFilter => {
                        self.select_filter(self.state.filter.previous().index())
                    }
                    Message::OpenFilterSelect => self.open_filter_select(),
                    Message::SelectFilter(idx) => self.select_filter(idx),
                    Message::ClearQuery => self.clear_query(),
                    Message::CopyRow => self.copy_row(),
                    Message::Help => self.show_help(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::RawKey(key) => self.raw_input(key),
                    Message::Enter => (),
                },
                Modus::FILTERSELECT => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit => self.exit(),
                    Message::MoveUp => self.move_filter_select(-1),
                    Message::MoveDown => self.move_filter_select(1),
                    Message::Enter => self.select_filter(self.filter_select_curser),
                    Message::SelectFilter(idx) => self.select_filter(idx),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Exit | Message::Enter | Message::Help => self.exit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    _ => (),
                },
            }
        }
        Ok(())
    }

    // -------------------- Derived view ---------------------- //

    // Recomputes the filtered rows from records, filter and query
    fn refresh_view(&mut self) {
        let start_time = Instant::now();
        self.table.rows =
            search::filter_records(&self.records, self.state.filter, &self.state.query);
        self.table.select(0);
        debug!(
            "Filter {} = {:?} matched {}/{} records in {}us",
            self.state.filter.code(),
            self.state.query,
            self.table.rows.len(),
            self.records.len(),
            start_time.elapsed().as_micros()
        );
        self.update_table_data();
    }

    fn update_table_data(&mut self) {
        self.table.heigh = self.uilayout.table_height;
        // Height changes can push the cursor out of the window
        if let Some(selected) = self.table.selected() {
            self.table.select(selected);
        }

        let rbegin = self.table.offset_row;
        let rend = std::cmp::min(rbegin + self.table.heigh, self.table.rows.len());

        let rows = self.table.rows[rbegin..rend]
            .iter()
            .map(|&ridx| Self::format_row(&self.records[ridx]))
            .collect();

        let mut header = vec![ID_HEADER.to_string()];
        header.extend(FILTERS.iter().map(|f| f.label().to_string()));

        self.uidata = UIData {
            name: self.name.clone(),
            input: self.input.get(),
            placeholder: self.state.filter.placeholder(),
            filter_label: self.state.filter.label().to_string(),
            header,
            rows,
            nrows: self.table.rows.len(),
            selected_row: self.table.selected().map(|_| self.table.curser_row),
            summary: search::summary(&self.state.query, self.table.rows.len()),
            show_popup: self.uidata.show_popup,
            popup_message: self.uidata.popup_message.clone(),
            show_filter_select: self.modus == Modus::FILTERSELECT,
            filter_options: FILTERS.iter().map(|f| f.label().to_string()).collect(),
            filter_select_curser: self.filter_select_curser,
            status_message: self.status_message.clone(),
            layout: self.uilayout.clone(),
        };
    }

    fn format_row(record: &Record) -> Vec<String> {
        let mut row = Vec::with_capacity(FILTERS.len() + 1);
        row.push(record.id.to_string());
        row.extend(FILTERS.iter().map(|&f| search::display_value(record, f)));
        row
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
    }

    fn page_size(&self) -> usize {
        std::cmp::max(self.uilayout.table_height, 1)
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        self.update_table_data();
    }

    // -------------------- Control handling functions ---------------------- //

    fn raw_input(&mut self, key: KeyEvent) {
        let last_input = self.input.read(key);
        if last_input.input != self.state.query {
            self.state.query = last_input.input;
            self.refresh_view();
        } else {
            // Cursor movement only
            self.uidata.input = self.input.get();
        }
    }

    fn clear_query(&mut self) {
        self.input.clear();
        self.state.query.clear();
        self.refresh_view();
    }

    /// Replaces the active filter. The query is kept.
    fn select_filter(&mut self, idx: usize) {
        match FilterField::from_index(idx) {
            Some(filter) => {
                info!("Search field {} -> {}", self.state.filter.code(), filter.code());
                self.state.filter = filter;
                self.modus = Modus::SEARCH;
                self.set_status_message(format!("Searching by {}", filter.label()));
                self.refresh_view();
            }
            None => error!("Trying to select unknown filter idx {idx}!"),
        }
    }

    fn open_filter_select(&mut self) {
        trace!("Open filter selection ...");
        self.modus = Modus::FILTERSELECT;
        self.filter_select_curser = self.state.filter.index();
        self.uidata.show_filter_select = true;
        self.uidata.filter_select_curser = self.filter_select_curser;
    }

    fn move_filter_select(&mut self, step: i32) {
        let n = FILTERS.len() as i32;
        self.filter_select_curser =
            ((self.filter_select_curser as i32 + step).rem_euclid(n)) as usize;
        self.uidata.filter_select_curser = self.filter_select_curser;
    }

    fn show_help(&mut self) {
        self.modus = Modus::POPUP;
        self.uidata.popup_message = HELP_TEXT.to_string();
        self.uidata.show_popup = true;
    }

    fn exit(&mut self) {
        match self.modus {
            Modus::SEARCH => {
                if self.state.query.is_empty() {
                    self.quit();
                } else {
                    self.clear_query();
                }
            }
            Modus::FILTERSELECT => {
                trace!("Close filter selection ...");
                self.modus = Modus::SEARCH;
                self.uidata.show_filter_select = false;
            }
            Modus::POPUP => {
                trace!("Close popup ...");
                self.modus = Modus::SEARCH;
                self.uidata.show_popup = false;
            }
        }
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.chars().any(|c| c == '"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    fn row_as_csv(record: &Record) -> String {
        let mut fields = vec![record.id.to_string()];
        fields.extend(FILTERS.iter().map(|f| f.value_of(record)));
        fields
            .iter()
            .map(|c| Model::wrap_cell_content(c))
            .collect::<Vec<String>>()
            .join(",")
    }

    fn copy_row(&mut self) {
        let Some(selected) = self.table.selected() else {
            self.set_status_message("Nothing to copy");
            return;
        };
        let record = &self.records[self.table.rows[selected]];
        let (id, content) = (record.id, Model::row_as_csv(record));
        trace!("Row content: {}", content);

        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => error!("Could not open clipboard: {:?}", e),
            }
        }
        let message = match self.clipboard.as_mut().map(|c| c.set_text(content)) {
            Some(Ok(_)) => format!("Copied user {id} to clipboard"),
            Some(Err(e)) => {
                error!("Error copying to clipboard: {:?}", e);
                "Copying to clipboard failed".to_string()
            }
            None => "No clipboard available".to_string(),
        };
        self.set_status_message(message);
    }

    fn move_selection_beginning(&mut self) {
        self.table.select(0);
        self.update_table_data();
    }

    fn move_selection_end(&mut self) {
        self.table.select(self.table.rows.len().saturating_sub(1));
        self.update_table_data();
    }

    fn move_selection_up(&mut self, size: usize) {
        if let Some(selected) = self.table.selected() {
            self.table.select(selected.saturating_sub(size));
            self.update_table_data();
        }
    }

    fn move_selection_down(&mut self, size: usize) {
        if let Some(selected) = self.table.selected() {
            self.table.select(selected + size);
            self.update_table_data();
        }
    }
}
