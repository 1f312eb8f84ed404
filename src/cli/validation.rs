use crate::cli::args::CliArgs;
use crate::grid::SortDirection;
use crate::output::{OutputFormat, View};

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if args.site.is_some() && args.input.is_some() {
        return Err("--site and --input are mutually exclusive".to_string());
    }
    if let Some(page) = args.page {
        if page == 0 {
            return Err("invalid page, expected 1 or greater".to_string());
        }
    }
    if let Some(page_size) = args.page_size {
        if page_size == 0 {
            return Err("invalid page-size, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive number of seconds".to_string());
        }
    }
    if let Some(max_records) = args.max_records {
        if max_records == 0 {
            return Err("invalid max-records, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.sort_dir.as_deref() {
        SortDirection::parse(raw)
            .ok_or_else(|| format!("invalid --sort-dir '{raw}', expected asc or desc"))?;
    }
    if let Some(raw) = args.view.as_deref() {
        View::parse(raw)
            .ok_or_else(|| format!("invalid --view '{raw}', expected chart, grid or all"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --output-format '{raw}', expected text, json or html"))?;
    }
    crate::utils::parse_header_lines(&args.header).map_err(|e| format!("invalid --header {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["listboard"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn accepts_defaults() {
        assert!(validate(&args(&[])).is_ok());
    }

    #[test]
    fn rejects_zero_ranges() {
        assert!(validate(&args(&["--page", "0"])).is_err());
        assert!(validate(&args(&["--page-size", "0"])).is_err());
        assert!(validate(&args(&["--timeout", "0"])).is_err());
        assert!(validate(&args(&["--max-records", "0"])).is_err());
    }

    #[test]
    fn rejects_unknown_enums_and_bad_headers() {
        assert!(validate(&args(&["--sort-dir", "up"])).is_err());
        assert!(validate(&args(&["--view", "pie"])).is_err());
        assert!(validate(&args(&["--output-format", "xml"])).is_err());
        assert!(validate(&args(&["-H", "missing-colon"])).is_err());
        assert!(validate(&args(&["-H", "X-Token: abc"])).is_ok());
    }

    #[test]
    fn site_and_snapshot_are_exclusive() {
        let err = validate(&args(&["-s", "https://t.example", "-i", "x.json"])).unwrap_err();
        assert!(err.contains("mutually exclusive"));
    }
}
