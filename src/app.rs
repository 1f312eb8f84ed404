use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::chart::{ColorScheme, DEFAULT_APPROVED_LABEL, DEFAULT_APPROVED_MARKER};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::dashboard::{self, Dashboard};
use crate::export::ExportError;
use crate::grid::SortDirection;
use crate::output::{self, DashboardReport, OutputFormat, View};
use crate::source::{RecordSource, SharePointOptions, SharePointSource, SnapshotSource};

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn flag_line(arg: &clap::Arg) -> String {
    let mut names: Vec<String> = Vec::new();
    names.extend(arg.get_short().map(|c| format!("-{c}")));
    names.extend(arg.get_long().map(|l| format!("--{l}")));
    for alias in arg.get_visible_aliases().unwrap_or_default() {
        names.push(format!("--{alias}"));
    }
    let mut line = names.join(", ");
    if arg.get_action().takes_values() {
        let value = arg
            .get_value_names()
            .and_then(|v| v.first())
            .map(|v| v.as_str())
            .unwrap_or("VALUE");
        line.push_str(&format!(" <{value}>"));
    }
    line
}

// Arguments grouped under their help headings, in declaration order.
fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = format!("{} {}\n", cmd.get_name(), cmd.get_version().unwrap_or_default());
    if let Some(about) = cmd.get_long_about().or(cmd.get_about()) {
        out.push_str(&format!("{about}\n"));
    }
    out.push_str(&format!("\nUsage: {} [OPTIONS]\n", cmd.get_name()));

    let mut sections: IndexMap<&str, Vec<&clap::Arg>> = IndexMap::new();
    for arg in cmd.get_arguments().filter(|a| !a.is_hide_set()) {
        sections
            .entry(arg.get_help_heading().unwrap_or("Options"))
            .or_default()
            .push(arg);
    }

    for (heading, args) in sections {
        out.push_str(&format!("\n{heading}:\n"));
        for arg in args {
            out.push_str(&format!("  {}\n", flag_line(arg)));
            if let Some(help) = arg.get_help().map(|h| h.to_string()) {
                out.push_str(&format!("          {}\n", help.trim()));
            }
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
enum SourceConfig {
    Site {
        url: String,
        proxy: Option<String>,
        headers: Vec<String>,
        timeout: u64,
    },
    Snapshot(PathBuf),
}

#[derive(Clone, Debug)]
struct RunConfig {
    source: SourceConfig,
    max_records: usize,
    options: dashboard::Options,
    page: usize,
    view: View,
    output: Option<String>,
    output_format: OutputFormat,
    export_dir: Option<PathBuf>,
    no_color: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn build_source_config(
    args: &CliArgs,
    cfg: &ConfigFile,
    timeout: u64,
) -> Result<SourceConfig, String> {
    let (site, input) = if args.site.is_some() || args.input.is_some() {
        (non_empty(args.site.clone()), non_empty(args.input.clone()))
    } else {
        (non_empty(cfg.site.clone()), non_empty(cfg.input.clone()))
    };

    let mut headers = cfg.headers.clone().unwrap_or_default();
    headers.extend(args.header.iter().cloned());
    crate::utils::parse_header_lines(&headers).map_err(|e| format!("invalid header {e}"))?;

    match (site, input) {
        (Some(_), Some(_)) => Err("site and input are mutually exclusive".to_string()),
        (Some(url), None) => {
            reqwest::Url::parse(url.trim()).map_err(|e| format!("invalid site URL '{url}': {e}"))?;
            Ok(SourceConfig::Site {
                url,
                proxy: non_empty(args.proxy.clone().or_else(|| cfg.proxy.clone())),
                headers,
                timeout,
            })
        }
        (None, Some(input)) => Ok(SourceConfig::Snapshot(config::expand_tilde(&input))),
        (None, None) => Err(
            "a record source must be specified (--site or --input, or site/input in the config file)"
                .to_string(),
        ),
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    if timeout == 0 {
        return Err("invalid timeout, expected positive number of seconds".to_string());
    }
    let max_records = args
        .max_records
        .or(cfg.max_records)
        .unwrap_or(crate::source::DEFAULT_MAX_RECORDS);
    if max_records == 0 {
        return Err("invalid max_records, expected positive integer".to_string());
    }

    let source = build_source_config(&args, &cfg, timeout)?;

    let defaults = dashboard::Options::default();
    let page_size = args.page_size.or(cfg.page_size).unwrap_or(defaults.page_size);
    let page = args.page.or(cfg.page).unwrap_or(1);
    if page_size == 0 || page == 0 {
        return Err("page and page_size must be 1 or greater".to_string());
    }

    let sort_dir_raw = args.sort_dir.or(cfg.sort_dir);
    let sort_direction = match sort_dir_raw.as_deref() {
        Some(raw) => SortDirection::parse(raw)
            .ok_or_else(|| format!("invalid sort direction '{raw}', expected asc or desc"))?,
        None => defaults.sort_direction,
    };

    let approved_label = args.approved_label.or(cfg.approved_label);
    let approved_marker = args.approved_marker.or(cfg.approved_marker);
    let colors = ColorScheme::with_approved(
        approved_label.as_deref().unwrap_or(DEFAULT_APPROVED_LABEL),
        approved_marker.as_deref().unwrap_or(DEFAULT_APPROVED_MARKER),
    );

    let options = dashboard::Options {
        list_name: non_empty(args.list.or(cfg.list_name)).unwrap_or(defaults.list_name),
        status_field: non_empty(args.status_field.or(cfg.status_field))
            .unwrap_or(defaults.status_field),
        page_size,
        sort_field: non_empty(args.sort.or(cfg.sort)).unwrap_or(defaults.sort_field),
        sort_direction,
        colors,
    };
    options.validate().map_err(|e| e.to_string())?;

    let view_raw = args.view.or(cfg.view);
    let view = match view_raw.as_deref() {
        Some(raw) => View::parse(raw)
            .ok_or_else(|| format!("invalid view '{raw}', expected chart, grid or all"))?,
        None => View::default(),
    };

    let output = non_empty(args.output.or(cfg.output));
    let output_format = match args.output_format.or(cfg.output_format).as_deref() {
        Some(raw) => OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let export_dir = non_empty(args.export.or(cfg.export_dir)).map(|d| config::expand_tilde(&d));

    Ok(RunConfig {
        source,
        max_records,
        options,
        page,
        view,
        output,
        output_format,
        export_dir,
        no_color,
    })
}

fn spinner(message: String) -> Result<ProgressBar, String> {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_style(
        ProgressStyle::with_template(":: {spinner} {msg} [{elapsed_precise}]")
            .map_err(|e| format!("failed to build progress bar style: {e}"))?,
    );
    pb.set_message(message);
    Ok(pb)
}

async fn write_output(run: &RunConfig, rendered: &[u8]) -> Result<(), String> {
    match run.output.as_ref() {
        Some(outfile_path) => {
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(outfile_path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(rendered)
                .await
                .map_err(|e| format!("failed to write output file: {e}"))?;
            format_kv_line("Output", outfile_path);
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(rendered)
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
        }
    }
    Ok(())
}

async fn present<S: RecordSource>(dashboard: Dashboard<S>, run: &RunConfig) -> Result<(), String> {
    let pb = spinner(format!(
        "loading '{}' from {}",
        dashboard.options().list_name,
        dashboard.source().describe()
    ))?;
    let outcome = dashboard.refresh().await;
    pb.finish_and_clear();

    if run.page > 1 {
        dashboard.go_to_page(run.page);
    }

    let report = DashboardReport::from_dashboard(&dashboard, run.view);
    write_output(run, &output::render(&report, run.output_format)).await?;

    if let Some(dir) = run.export_dir.as_ref() {
        if outcome.grid.is_ok() {
            match dashboard.write_export(dir, Utc::now()) {
                Ok(path) => format_kv_line("Export", &path.display().to_string()),
                Err(ExportError::NoRecords) => {
                    eprintln!("{}", "No data to export".yellow());
                }
                Err(e) => return Err(e.to_string()),
            }
        }
    }

    let mut failures: Vec<String> = Vec::new();
    if let Err(e) = &outcome.chart {
        failures.push(format!("chart: {e}"));
    }
    if let Err(e) = &outcome.grid {
        failures.push(format!("grid: {e}"));
    }
    if !failures.is_empty() {
        return Err(format!("refresh failed ({})", failures.join("; ")));
    }
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    format_kv_line("List", &run.options.list_name);
    format_kv_line("Status", &run.options.status_field);

    match run.source.clone() {
        SourceConfig::Site {
            url,
            proxy,
            headers,
            timeout,
        } => {
            format_kv_line("Site", &url);
            let source = SharePointSource::new(SharePointOptions {
                site_url: url,
                proxy,
                headers: crate::utils::parse_header_lines(&headers)?,
                timeout: Duration::from_secs(timeout),
                max_records: run.max_records,
            })
            .map_err(|e| e.to_string())?;
            present(Dashboard::new(source, run.options.clone()), &run).await
        }
        SourceConfig::Snapshot(path) => {
            format_kv_line("Snapshot", &path.display().to_string());
            let source = SnapshotSource::new(path, run.max_records);
            present(Dashboard::new(source, run.options.clone()), &run).await
        }
    }
}

fn init_config(path: Option<PathBuf>) -> Result<(), String> {
    let path = path
        .or_else(config::default_config_path)
        .ok_or_else(|| "could not determine home directory for config file".to_string())?;
    if config::ensure_default_config_file(&path)? {
        println!("{} {}", "wrote".green(), path.display());
    } else {
        println!("config already exists: {}", path.display());
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    crate::logging::init(args.verbose, args.no_color);

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));
    if args.init_config {
        return init_config(user_config_path);
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    tracing::debug!(?run, "resolved run configuration");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["listboard"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn source_is_required() {
        let err = build_run_config(parse(&[]), ConfigFile::default()).unwrap_err();
        assert!(err.contains("record source"));
    }

    #[test]
    fn defaults_follow_the_approval_list() {
        let run = build_run_config(parse(&["-i", "snap.json"]), ConfigFile::default()).unwrap();
        assert_eq!(run.source, SourceConfig::Snapshot(PathBuf::from("snap.json")));
        assert_eq!(run.options.list_name, "ProcApprvlShnitzel3");
        assert_eq!(run.options.page_size, 10);
        assert_eq!(run.options.sort_field, "Created");
        assert_eq!(run.options.sort_direction, SortDirection::Descending);
        assert_eq!(run.page, 1);
        assert_eq!(run.view, View::All);
        assert_eq!(run.output_format, OutputFormat::Text);
        assert_eq!(run.max_records, 5000);
    }

    #[test]
    fn cli_overrides_config_file() {
        let cfg = ConfigFile {
            site: Some("https://tenant.example/sites/a".into()),
            list_name: Some("FromConfig".into()),
            page_size: Some(25),
            timeout: Some(30),
            headers: Some(vec!["X-Config: 1".into()]),
            ..ConfigFile::default()
        };
        let run = build_run_config(
            parse(&["-l", "FromCli", "-H", "X-Cli: 2", "--sort-dir", "asc"]),
            cfg,
        )
        .unwrap();
        assert_eq!(run.options.list_name, "FromCli");
        assert_eq!(run.options.page_size, 25);
        assert_eq!(run.options.sort_direction, SortDirection::Ascending);
        match run.source {
            SourceConfig::Site {
                url,
                headers,
                timeout,
                ..
            } => {
                assert_eq!(url, "https://tenant.example/sites/a");
                assert_eq!(headers, vec!["X-Config: 1".to_string(), "X-Cli: 2".to_string()]);
                assert_eq!(timeout, 30);
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn cli_source_replaces_config_source() {
        let cfg = ConfigFile {
            site: Some("https://tenant.example".into()),
            ..ConfigFile::default()
        };
        let run = build_run_config(parse(&["-i", "local.json"]), cfg).unwrap();
        assert!(matches!(run.source, SourceConfig::Snapshot(_)));
    }

    #[test]
    fn output_format_is_inferred_from_extension() {
        let run = build_run_config(
            parse(&["-i", "s.json", "-o", "dash.html"]),
            ConfigFile::default(),
        )
        .unwrap();
        assert_eq!(run.output_format, OutputFormat::Html);

        let run = build_run_config(
            parse(&["-i", "s.json", "-o", "dash.html", "--output-format", "json"]),
            ConfigFile::default(),
        )
        .unwrap();
        assert_eq!(run.output_format, OutputFormat::Json);
    }

    #[test]
    fn approved_overrides_build_color_scheme() {
        let run = build_run_config(
            parse(&["-i", "s.json", "--approved-label", "Approved", "--approved-marker", "OK"]),
            ConfigFile::default(),
        )
        .unwrap();
        assert!(run.options.colors.is_approved("Approved"));
        assert!(run.options.colors.is_approved("OK by manager"));
    }

    #[test]
    fn invalid_site_url_is_rejected() {
        let err = build_run_config(parse(&["-s", "not a url"]), ConfigFile::default()).unwrap_err();
        assert!(err.contains("invalid site URL"));
    }

    #[test]
    fn help_groups_arguments_by_heading() {
        let help = render_custom_help();
        for heading in ["Source:", "Grid:", "Output:", "HTTP:"] {
            assert!(help.contains(heading), "missing {heading}");
        }
        assert!(help.contains("--page-size, --ps <N>"));
        assert!(help.contains("  -v, --verbose\n"));
        assert!(help.find("Source:") < help.find("HTTP:"));
    }
}
