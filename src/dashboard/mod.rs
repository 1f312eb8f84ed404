use std::cell::RefCell;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::aggregate::{self, CategoryCounts};
use crate::chart::{self, ColorScheme, Distribution};
use crate::export::{self, ExportError};
use crate::grid::{self, GridState, GridView, SortDirection, DEFAULT_PAGE_SIZE, DEFAULT_SORT_FIELD};
use crate::record::{FieldDescriptor, Record};
use crate::source::{FetchError, RecordOrder, RecordSource};

pub const DEFAULT_LIST_NAME: &str = "ProcApprvlShnitzel3";
pub const DEFAULT_STATUS_FIELD: &str = "_x05e1__x05d8__x05d8__x05d5__x05";

#[derive(Clone, Debug)]
pub struct Options {
    pub list_name: String,
    pub status_field: String,
    pub page_size: usize,
    pub sort_field: String,
    pub sort_direction: SortDirection,
    pub colors: ColorScheme,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            list_name: DEFAULT_LIST_NAME.to_string(),
            status_field: DEFAULT_STATUS_FIELD.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_direction: SortDirection::Descending,
            colors: ColorScheme::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("list name is empty")]
    EmptyListName,

    #[error("status field is empty")]
    EmptyStatusField,

    #[error("page size must be positive")]
    ZeroPageSize,
}

impl Options {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.list_name.trim().is_empty() {
            return Err(OptionsError::EmptyListName);
        }
        if self.status_field.trim().is_empty() {
            return Err(OptionsError::EmptyStatusField);
        }
        if self.page_size == 0 {
            return Err(OptionsError::ZeroPageSize);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct DashboardState {
    pub records: Vec<Record>,
    pub fields: Vec<FieldDescriptor>,
    pub grid: GridState,
    pub counts: CategoryCounts,
    pub chart_error: Option<String>,
    pub grid_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct RefreshOutcome {
    pub chart: Result<usize, FetchError>,
    pub grid: Result<usize, FetchError>,
}

impl RefreshOutcome {
    pub fn is_ok(&self) -> bool {
        self.chart.is_ok() && self.grid.is_ok()
    }
}

// State is only touched between awaits; overlapping refreshes resolve to
// whichever finishes last.
pub struct Dashboard<S> {
    source: S,
    options: Options,
    state: RefCell<DashboardState>,
}

impl<S: RecordSource> Dashboard<S> {
    pub fn new(source: S, options: Options) -> Self {
        let mut grid = GridState::new(options.page_size);
        grid.set_sort(&options.sort_field, options.sort_direction);
        Self {
            source,
            options,
            state: RefCell::new(DashboardState {
                grid,
                ..DashboardState::default()
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn refresh_distribution(&self) -> Result<usize, FetchError> {
        let fetched = self
            .source
            .fetch_records(&self.options.list_name, RecordOrder::Unordered)
            .await;

        let mut state = self.state.borrow_mut();
        match fetched {
            Ok(records) => {
                state.counts = aggregate::aggregate(&records, &self.options.status_field);
                state.chart_error = None;
                state.last_updated = Some(Utc::now());
                tracing::info!(
                    records = records.len(),
                    categories = state.counts.len(),
                    "status distribution refreshed"
                );
                Ok(records.len())
            }
            Err(e) => {
                tracing::warn!(error = %e, "status distribution refresh failed");
                state.counts = CategoryCounts::default();
                state.chart_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn fetch_grid(&self) -> Result<(Vec<FieldDescriptor>, Vec<Record>), FetchError> {
        let list_name = &self.options.list_name;
        let fields = self.source.fetch_fields(list_name).await?;
        let records = self
            .source
            .fetch_records(list_name, RecordOrder::CreatedDescending)
            .await?;
        Ok((fields, records))
    }

    pub async fn refresh_grid(&self) -> Result<usize, FetchError> {
        let fetched = self.fetch_grid().await;

        let mut state = self.state.borrow_mut();
        match fetched {
            Ok((fields, records)) => {
                let count = records.len();
                state.fields = fields;
                state.records = records;
                state.grid.clamp(count);
                state.grid_error = None;
                state.last_updated = Some(Utc::now());
                tracing::info!(
                    records = count,
                    fields = state.fields.len(),
                    "record grid refreshed"
                );
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "record grid refresh failed");
                state.fields.clear();
                state.records.clear();
                state.grid.clamp(0);
                state.grid_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let (chart, grid) = futures::join!(self.refresh_distribution(), self.refresh_grid());
        RefreshOutcome { chart, grid }
    }

    pub fn distribution(&self) -> Distribution {
        chart::render(&self.state.borrow().counts, &self.options.colors)
    }

    pub fn grid_view(&self) -> GridView {
        let state = self.state.borrow();
        grid::view(&state.records, &state.fields, &state.grid)
    }

    pub fn toggle_sort(&self, field: &str) {
        self.state.borrow_mut().grid.toggle_sort(field);
    }

    pub fn set_sort(&self, field: &str, direction: SortDirection) {
        self.state.borrow_mut().grid.set_sort(field, direction);
    }

    pub fn next_page(&self) -> bool {
        let mut state = self.state.borrow_mut();
        let total = state.records.len();
        state.grid.next_page(total)
    }

    pub fn prev_page(&self) -> bool {
        self.state.borrow_mut().grid.prev_page()
    }

    pub fn go_to_page(&self, page: usize) {
        let mut state = self.state.borrow_mut();
        let total = state.records.len();
        state.grid.go_to_page(page, total);
    }

    pub fn set_page_size(&self, page_size: usize) {
        let mut state = self.state.borrow_mut();
        let total = state.records.len();
        state.grid.set_page_size(page_size, total);
    }

    pub fn export_csv(&self) -> Result<String, ExportError> {
        let state = self.state.borrow();
        export::export(&state.records, &state.fields)
    }

    pub fn write_export(&self, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf, ExportError> {
        let state = self.state.borrow();
        export::write_export(dir, &self.options.list_name, &state.records, &state.fields, now)
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.borrow().clone()
    }
}
