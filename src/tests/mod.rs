use std::io::Write;

use serde_json::json;

use crate::aggregate::aggregate;
use crate::chart::{self, ColorScheme, APPROVED_COLOR};
use crate::dashboard::{Dashboard, Options};
use crate::export::{export, ExportError};
use crate::grid::{self, GridState, SortDirection};
use crate::output::{self, DashboardReport, OutputFormat, View};
use crate::record::{FieldDescriptor, FieldType, Record};
use crate::source::{RecordOrder, RecordSource, SnapshotSource};

fn records(statuses: &[Option<&str>]) -> Vec<Record> {
    statuses
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let mut r = Record::new().with("Id", i as i64);
            if let Some(s) = s {
                r.insert("Status", *s);
            }
            r
        })
        .collect()
}

fn snapshot_file(body: serde_json::Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.to_string().as_bytes()).unwrap();
    file
}

#[test]
fn counts_and_percentages_for_open_closed() {
    let counts = aggregate(&records(&[Some("Open"), Some("Open"), Some("Closed")]), "Status");
    assert_eq!(counts.get("Open"), Some(2));
    assert_eq!(counts.get("Closed"), Some(1));

    let dist = chart::render(&counts, &ColorScheme::default());
    let pcts: Vec<f64> = dist.legend.iter().map(|e| e.percentage).collect();
    assert_eq!(pcts, vec![66.7, 33.3]);
}

#[test]
fn counts_always_sum_to_record_count() {
    let recs = records(&[Some("a"), None, Some(""), Some("b"), Some("a"), None]);
    let counts = aggregate(&recs, "Status");
    assert_eq!(counts.total(), recs.len());
    assert_eq!(counts.get("Unknown"), Some(3));

    let dist = chart::render(&counts, &ColorScheme::default());
    assert!(dist.legend.iter().all(|e| (0.0..=100.0).contains(&e.percentage)));
    assert_eq!(dist.arcs.last().unwrap().end_angle, 270.0);
}

#[test]
fn single_record_is_the_whole_ring() {
    let counts = aggregate(&records(&[Some("Solo")]), "Status");
    let dist = chart::render(&counts, &ColorScheme::default());
    assert_eq!(dist.legend[0].percentage, 100.0);
    assert_eq!(dist.arcs[0].sweep(), 360.0);
}

#[test]
fn approved_label_gets_approved_color_at_any_position() {
    for position in 0..12 {
        let mut statuses: Vec<String> = (0..12).map(|i| format!("status {i}")).collect();
        statuses[position] = "אושר ע\"י המשתמש".to_string();
        let refs: Vec<Option<&str>> = statuses.iter().map(|s| Some(s.as_str())).collect();
        let dist = chart::render(&aggregate(&records(&refs), "Status"), &ColorScheme::default());
        assert_eq!(dist.legend[position].color, APPROVED_COLOR);
        let others = dist.legend.iter().filter(|e| e.color == APPROVED_COLOR).count();
        assert_eq!(others, 1);
    }
}

#[test]
fn user_identifier_alias_is_displayed() {
    let record = Record::from_json(json!({"XId": 42})).unwrap();
    let field = FieldDescriptor::new("X", "X", FieldType::User);
    assert_eq!(grid::display_value(&record, &field), "42");
}

#[test]
fn five_records_page_size_two() {
    let items: Vec<usize> = (0..5).collect();
    assert_eq!(grid::paginate(&items, 1, 2), &[0, 1]);
    assert_eq!(grid::paginate(&items, 3, 2), &[4]);
    assert!(grid::paginate(&items, 4, 2).is_empty());
    assert_eq!(GridState::new(2).total_pages(5), 3);
}

#[test]
fn descending_view_reverses_unique_keys() {
    let recs: Vec<Record> = ["c", "a", "d", "b"]
        .iter()
        .map(|s| Record::new().with("Title", *s))
        .collect();
    let fields = vec![FieldDescriptor::new("Title", "Title", FieldType::Text)];
    let mut state = GridState::new(10);
    state.set_sort("Title", SortDirection::Ascending);
    let asc: Vec<String> = grid::view(&recs, &fields, &state).rows.concat();
    state.toggle_sort("Title");
    let mut desc: Vec<String> = grid::view(&recs, &fields, &state).rows.concat();
    desc.reverse();
    assert_eq!(asc, desc);
    assert_eq!(asc, vec!["a", "b", "c", "d"]);
}

#[test]
fn export_is_unsorted_and_unpaginated() {
    let recs: Vec<Record> = (1..=25)
        .map(|i| Record::new().with("Id", i as i64).with("Title", format!("row {i}").as_str()))
        .collect();
    let csv = export(&recs, &[]).unwrap();
    let lines: Vec<&str> = csv.split('\n').collect();
    assert_eq!(lines.len(), 26);
    assert_eq!(lines[1], r#""1","row 1","""#);
    assert_eq!(lines[25], r#""25","row 25","""#);
    assert!(matches!(export(&[], &[]), Err(ExportError::NoRecords)));
}

#[tokio::test]
async fn snapshot_source_drives_full_dashboard() {
    let file = snapshot_file(json!({
        "fields": [
            {"InternalName": "Title", "Title": "Title", "TypeAsString": "Text"},
            {"InternalName": "Status", "Title": "Status", "TypeAsString": "Text"},
            {"InternalName": "Owner", "Title": "Owner", "TypeAsString": "User"}
        ],
        "items": [
            {"Id": 1, "Title": "first", "Status": "Open", "OwnerId": 7, "Created": "2024-01-01T08:00:00Z"},
            {"Id": 2, "Title": "second", "OData_Status": "Closed", "Created": "2024-02-01T08:00:00Z"},
            {"Id": 3, "Title": "third", "Status": "Open", "Created": "2024-03-01T08:00:00Z"}
        ]
    }));
    let source = SnapshotSource::new(file.path(), 5000);
    let options = Options {
        list_name: "Requests".into(),
        status_field: "Status".into(),
        page_size: 2,
        ..Options::default()
    };
    let dashboard = Dashboard::new(source, options);
    assert!(dashboard.refresh().await.is_ok());

    let dist = dashboard.distribution();
    assert_eq!(dist.total, 3);
    assert_eq!(dist.legend[0].label, "Open");
    assert_eq!(dist.legend[1].label, "Closed");

    let view = dashboard.grid_view();
    assert_eq!(view.rows[0], vec!["third", "Open", ""]);
    assert_eq!(view.rows[1], vec!["second", "Closed", ""]);
    assert_eq!(view.total_pages, 2);

    assert!(dashboard.next_page());
    assert_eq!(dashboard.grid_view().rows, vec![vec!["first", "Open", "7"]]);

    let dir = tempfile::tempdir().unwrap();
    let path = dashboard.write_export(dir.path(), chrono::Utc::now()).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("Requests_") && name.ends_with(".csv"));
    assert!(!name.contains(':'));
    let csv = std::fs::read_to_string(path).unwrap();
    assert!(csv.starts_with(r#""ID","Title","Created","Title","Status","Owner""#));
    assert_eq!(csv.lines().nth(1).unwrap().split("\",\"").next(), Some("\"3"));

    let report = DashboardReport::from_dashboard(&dashboard, View::All);
    let html = String::from_utf8(output::render(&report, OutputFormat::Html)).unwrap();
    assert!(html.contains("<svg"));
    assert!(html.contains("Page 2 of 2 (3 records)"));
}

#[tokio::test]
async fn missing_snapshot_shows_inline_errors() {
    let dir = tempfile::tempdir().unwrap();
    let source = SnapshotSource::new(dir.path().join("gone.json"), 10);
    assert!(source.describe().ends_with("gone.json"));
    let dashboard = Dashboard::new(source, Options::default());
    let outcome = dashboard.refresh().await;
    assert!(outcome.chart.is_err() && outcome.grid.is_err());

    let report = DashboardReport::from_dashboard(&dashboard, View::Grid);
    assert!(report.chart.is_none());
    assert!(report.has_errors());
    let json: serde_json::Value =
        serde_json::from_slice(&output::render(&report, OutputFormat::Json)).unwrap();
    assert!(json["grid"]["error"]
        .as_str()
        .unwrap()
        .starts_with("failed to read snapshot"));
}

#[tokio::test]
async fn created_descending_order_is_applied_by_snapshot() {
    let file = snapshot_file(json!({"value": [
        {"Id": 1, "Created": "2024-01-01T00:00:00Z"},
        {"Id": 2, "Created": "2024-06-01T00:00:00Z"}
    ]}));
    let source = SnapshotSource::new(file.path(), 10);
    let unordered = source.fetch_records("x", RecordOrder::Unordered).await.unwrap();
    let ordered = source
        .fetch_records("x", RecordOrder::CreatedDescending)
        .await
        .unwrap();
    assert_eq!(unordered[0].get("Id").unwrap().to_string(), "1");
    assert_eq!(ordered[0].get("Id").unwrap().to_string(), "2");
}
