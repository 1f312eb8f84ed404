use super::{ChartPanel, DashboardReport, GridPanel};
use crate::chart::svg::{self, Canvas};
use crate::grid::SortDirection;
use crate::utils::escape_html;

fn error_block(message: &str) -> String {
    format!(
        r#"<div class="error bg-red-50 border border-red-200 text-red-800 rounded-xl px-5 py-4 font-medium">Error: {}</div>"#,
        escape_html(message)
    )
}

fn chart_section(panel: &ChartPanel) -> String {
    let body = if let Some(err) = panel.error.as_deref() {
        error_block(err)
    } else if panel.distribution.is_empty() {
        r#"<p class="text-slate-500 text-sm font-medium">No data</p>"#.to_string()
    } else {
        let drawing = match svg::draw(&panel.distribution, &Canvas::default()) {
            Ok(drawing) => drawing,
            Err(e) => {
                tracing::warn!(error = %e, "doughnut drawing skipped");
                String::new()
            }
        };
        let legend: String = panel
            .distribution
            .legend
            .iter()
            .map(|entry| {
                format!(
                    r#"
              <li class="flex items-center gap-3 py-1">
                <span class="legend-color inline-block size-3 rounded-sm" style="background-color: {}"></span>
                <span class="legend-label flex-1 text-sm font-medium">{}</span>
                <span class="legend-value text-sm text-slate-500">{} ({:.1}%)</span>
              </li>"#,
                    escape_html(&entry.color),
                    escape_html(&entry.label),
                    entry.count,
                    entry.percentage
                )
            })
            .collect();
        format!(
            r#"<div class="chart-body flex flex-col md:flex-row items-center gap-8">
            <div class="shrink-0">{drawing}</div>
            <ul class="legend-list flex-1 w-full">{legend}
            </ul>
          </div>"#
        )
    };

    format!(
        r#"
      <section class="doughnut-chart-container bg-white rounded-2xl border border-slate-200 p-6 mb-8 shadow-sm">
        <h3 class="chart-title text-lg mb-4">Status Distribution</h3>
        {body}
      </section>"#
    )
}

fn sort_icon(sorted: Option<SortDirection>) -> &'static str {
    match sorted {
        Some(SortDirection::Ascending) => "▲",
        Some(SortDirection::Descending) => "▼",
        None => "⇅",
    }
}

fn grid_section(panel: &GridPanel) -> String {
    let body = if let Some(err) = panel.error.as_deref() {
        error_block(err)
    } else {
        let view = &panel.view;
        let headers: String = view
            .columns
            .iter()
            .map(|c| {
                format!(
                    r#"
                <th class="sortable px-6 py-4 text-[11px] uppercase tracking-widest" data-column="{}" aria-sort="{}">{} <span class="sort-icon">{}</span></th>"#,
                    escape_html(&c.field),
                    match c.sorted {
                        Some(SortDirection::Ascending) => "ascending",
                        Some(SortDirection::Descending) => "descending",
                        None => "none",
                    },
                    escape_html(&c.title),
                    sort_icon(c.sorted)
                )
            })
            .collect();
        let rows: String = view
            .rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|cell| format!(r#"<td class="px-6 py-3 text-sm">{}</td>"#, escape_html(cell)))
                    .collect();
                format!("\n              <tr>{cells}</tr>")
            })
            .collect();
        let prev_disabled = if view.has_prev() { "" } else { " disabled" };
        let next_disabled = if view.has_next() { "" } else { " disabled" };
        format!(
            r#"<div class="overflow-x-auto">
          <table class="w-full text-left border-collapse" role="table" aria-label="List items">
            <thead>
              <tr class="bg-slate-50 border-b border-slate-200">{headers}
              </tr>
            </thead>
            <tbody class="divide-y divide-slate-100">{rows}
            </tbody>
          </table>
        </div>
        <div class="pagination flex items-center justify-between gap-4 pt-5">
          <button class="page-btn prev-btn px-4 py-2 rounded-lg border border-slate-200" type="button"{prev_disabled}>Previous</button>
          <span class="page-info text-sm font-bold text-slate-500">Page {} of {} ({} records)</span>
          <button class="page-btn next-btn px-4 py-2 rounded-lg border border-slate-200" type="button"{next_disabled}>Next</button>
        </div>"#,
            view.current_page, view.total_pages, view.total_records
        )
    };

    format!(
        r#"
      <section class="records-container bg-white rounded-2xl border border-slate-200 p-6 mb-8 shadow-sm">
        <h3 class="text-lg mb-4">Recent Items</h3>
        {body}
      </section>"#
    )
}

pub fn render_html(report: &DashboardReport) -> Vec<u8> {
    let chart = report.chart.as_ref().map(chart_section).unwrap_or_default();
    let grid = report.grid.as_ref().map(grid_section).unwrap_or_default();
    let list_name = escape_html(&report.list_name);
    let source = escape_html(&report.source);
    let last_updated = escape_html(&report.last_updated_label());

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>{list_name} - listboard</title>
  <script src="https://cdn.tailwindcss.com?plugins=forms,container-queries"></script>
  <link href="https://fonts.googleapis.com/css2?family=Montserrat:wght@700;800&amp;family=Inter:wght@400;500;600;700&amp;display=swap" rel="stylesheet"/>
  <style type="text/tailwindcss">
    body {{
      font-family: 'Inter', sans-serif;
    }}
    h1, h2, h3 {{
      font-family: 'Montserrat', sans-serif;
      font-weight: 800;
      letter-spacing: -0.025em;
    }}
  </style>
</head>
<body class="bg-slate-50 text-slate-900 min-h-screen">
  <div class="flex h-full grow flex-col">
    <header class="flex items-center justify-between border-b border-slate-200 bg-white px-8 py-4">
      <h2 class="text-xl uppercase tracking-tight">{list_name}</h2>
      <span class="text-xs font-medium text-slate-500">{source}</span>
    </header>

    <main class="flex-1 max-w-[1440px] mx-auto w-full px-8 py-10">{chart}{grid}
    </main>

    <footer class="mt-auto py-8 border-t border-slate-200 text-center">
      <span class="last-updated text-xs font-bold text-slate-400 uppercase tracking-widest">Last updated: <time>{last_updated}</time></span>
    </footer>
  </div>
</body>
</html>
"####,
    );

    html.into_bytes()
}
