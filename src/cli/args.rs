use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "listboard",
    version,
    about = "status distribution and record grid for remote lists",
    long_about = "listboard fetches a SharePoint-style list, breaks its items down by status and renders a sortable, paginated grid with CSV export.\n\nExamples:\n  listboard -s https://tenant.sharepoint.com/sites/ops -l Requests\n  listboard -i ./snapshot.json --view grid --sort Title --sort-dir asc -p 2\n  listboard -s https://tenant.sharepoint.com/sites/ops -H \"Authorization: Bearer TOKEN\" -o dashboard.html\n  listboard -i ./snapshot.json --export ./exports\n\nTip: Use --config to persist the site, list and header and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 's',
        long = "site",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Source",
        help = "Site URL hosting the list (REST source)."
    )]
    pub site: Option<String>,

    #[arg(
        short = 'i',
        long = "input",
        visible_alias = "snapshot",
        value_name = "FILE",
        help_heading = "Source",
        help = "Read fields and items from a JSON snapshot instead of the site."
    )]
    pub input: Option<String>,

    #[arg(
        short = 'l',
        long = "list",
        visible_alias = "list-name",
        value_name = "NAME",
        help_heading = "Source",
        help = "List title (defaults to ProcApprvlShnitzel3)."
    )]
    pub list: Option<String>,

    #[arg(
        long = "status-field",
        visible_alias = "sf",
        value_name = "FIELD",
        help_heading = "Source",
        help = "Internal name of the field the distribution is grouped by."
    )]
    pub status_field: Option<String>,

    #[arg(
        long = "max-records",
        visible_alias = "top",
        value_name = "N",
        help_heading = "Source",
        help = "Maximum records fetched per call (default 5000)."
    )]
    pub max_records: Option<usize>,

    #[arg(
        short = 'C',
        long = "config",
        visible_alias = "cfg",
        value_name = "FILE",
        help_heading = "Source",
        help = "Path to config file (defaults to ~/.listboard/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Source",
        help = "Write a commented default config file and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'p',
        long = "page",
        value_name = "N",
        help_heading = "Grid",
        help = "Page of the grid to show (clamped to the last page)."
    )]
    pub page: Option<usize>,

    #[arg(
        long = "page-size",
        visible_alias = "ps",
        value_name = "N",
        help_heading = "Grid",
        help = "Rows per page (default 10)."
    )]
    pub page_size: Option<usize>,

    #[arg(
        long = "sort",
        value_name = "FIELD",
        help_heading = "Grid",
        help = "Field to sort the grid by (default Created)."
    )]
    pub sort: Option<String>,

    #[arg(
        long = "sort-dir",
        value_name = "asc|desc",
        help_heading = "Grid",
        help = "Sort direction (default desc)."
    )]
    pub sort_dir: Option<String>,

    #[arg(
        long = "view",
        value_name = "chart|grid|all",
        help_heading = "Output",
        help = "Panels to render (default all)."
    )]
    pub view: Option<String>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the rendered dashboard to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        long = "output-format",
        visible_alias = "of",
        value_name = "text|json|html",
        help_heading = "Output",
        help = "Output format (inferred from --output extension when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'e',
        long = "export",
        value_name = "DIR",
        help_heading = "Output",
        help = "Write all fetched records as CSV into DIR."
    )]
    pub export: Option<String>,

    #[arg(
        long = "approved-label",
        value_name = "LABEL",
        help_heading = "Output",
        help = "Status label always drawn in the approved color."
    )]
    pub approved_label: Option<String>,

    #[arg(
        long = "approved-marker",
        value_name = "TEXT",
        help_heading = "Output",
        help = "Substring marking a status as approved."
    )]
    pub approved_marker: Option<String>,

    #[arg(
        long = "no-color",
        visible_alias = "nc",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv). RUST_LOG takes precedence."
    )]
    pub verbose: u8,

    #[arg(
        short = 'H',
        long = "header",
        value_name = "HEADER",
        action = ArgAction::Append,
        help_heading = "HTTP",
        help = "Extra request header \"Name: Value\" (repeatable)."
    )]
    pub header: Vec<String>,

    #[arg(
        short = 'x',
        long = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Route requests through a proxy."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds (default 10)."
    )]
    pub timeout: Option<u64>,
}
