pub mod format;
pub mod sort;

use serde::{Deserialize, Serialize};

use crate::record::{FieldDescriptor, Record};

pub use format::display_value;
pub use sort::sort_records;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_SORT_FIELD: &str = "Created";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GridState {
    current_page: usize,
    page_size: usize,
    sort_field: String,
    sort_direction: SortDirection,
}

impl Default for GridState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl GridState {
    pub fn new(page_size: usize) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_direction: SortDirection::default(),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn sort_field(&self) -> &str {
        &self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn total_pages(&self, total_records: usize) -> usize {
        total_records.div_ceil(self.page_size)
    }

    fn last_page(&self, total_records: usize) -> usize {
        self.total_pages(total_records).max(1)
    }

    pub fn clamp(&mut self, total_records: usize) {
        self.current_page = self.current_page.clamp(1, self.last_page(total_records));
    }

    pub fn toggle_sort(&mut self, field: &str) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.flip();
        } else {
            self.sort_field = field.to_string();
            self.sort_direction = SortDirection::Ascending;
        }
    }

    pub fn set_sort(&mut self, field: &str, direction: SortDirection) {
        self.sort_field = field.to_string();
        self.sort_direction = direction;
    }

    pub fn next_page(&mut self, total_records: usize) -> bool {
        if self.current_page < self.total_pages(total_records) {
            self.current_page += 1;
            return true;
        }
        false
    }

    pub fn prev_page(&mut self) -> bool {
        if self.current_page > 1 {
            self.current_page -= 1;
            return true;
        }
        false
    }

    pub fn go_to_page(&mut self, page: usize, total_records: usize) {
        self.current_page = page;
        self.clamp(total_records);
    }

    pub fn set_page_size(&mut self, page_size: usize, total_records: usize) {
        self.page_size = page_size.max(1);
        self.clamp(total_records);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Column {
    pub field: String,
    pub title: String,
    pub sorted: Option<SortDirection>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GridView {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_records: usize,
}

impl GridView {
    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn format_row(record: &Record, fields: &[FieldDescriptor]) -> Vec<String> {
    fields.iter().map(|field| display_value(record, field)).collect()
}

pub fn columns(fields: &[FieldDescriptor], state: &GridState) -> Vec<Column> {
    fields
        .iter()
        .map(|field| Column {
            field: field.internal_name.clone(),
            title: field.display_title.clone(),
            sorted: (field.internal_name == state.sort_field()).then(|| state.sort_direction()),
        })
        .collect()
}

pub fn view(records: &[Record], fields: &[FieldDescriptor], state: &GridState) -> GridView {
    let sorted = sort_records(records, state.sort_field(), state.sort_direction());
    let page = paginate(&sorted, state.current_page(), state.page_size());
    GridView {
        columns: columns(fields, state),
        rows: page.iter().map(|record| format_row(record, fields)).collect(),
        current_page: state.current_page(),
        total_pages: state.total_pages(records.len()),
        total_records: records.len(),
    }
}
