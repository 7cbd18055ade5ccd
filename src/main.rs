use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use splitdiff::cli::{self, CliArgs, DEFAULT_CONTEXT};
use splitdiff::config::{self, AppConfig, ConfigLoadOutcome};
use splitdiff::error::SplitDiffError;
use splitdiff::host::HostEmbedding;
use splitdiff::theme;
use splitdiff::view::DiffView;
use splitdiff::worker::{HighlightClient, HighlightWorker};

fn main() {
    init_tracing();
    let cli_args = cli::parse_cli_args();

    match run(cli_args) {
        Ok(()) => {}
        Err(err) if is_no_changes(&err) => eprintln!("No differences found."),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn is_no_changes(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<SplitDiffError>(),
        Some(SplitDiffError::NoChanges)
    )
}

/// Logs go to stderr so stdout carries only the page.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli_args: CliArgs) -> Result<()> {
    let ConfigLoadOutcome { config, warnings } = config::load_config().unwrap_or_else(|err| {
        ConfigLoadOutcome {
            config: None,
            warnings: vec![format!("Warning: Failed to load config, using defaults: {err:#}")],
        }
    });
    for warning in &warnings {
        eprintln!("{warning}");
    }
    let config = config.unwrap_or_default();

    let (theme, theme_warnings) =
        theme::resolve_theme_with_config(cli_args.theme, config.theme.as_deref());
    for warning in &theme_warnings {
        eprintln!("{warning}");
    }

    let left_text = read_text(&cli_args.old)?;
    let right_text = read_text(&cli_args.new)?;
    let filename = display_filename(&cli_args);
    let context = cli_args.context.or(config.context).unwrap_or(DEFAULT_CONTEXT);

    let host = HostEmbedding::new().with_report_error(|err| eprintln!("Warning: {err}"));
    let mut view = DiffView::new(filename, left_text, right_text, context, host)?;

    highlight(&mut view, &config, &cli_args)?;

    let page = view.to_html(&theme)?;
    write_page(cli_args.output.as_deref(), &page)
}

fn highlight(view: &mut DiffView, config: &AppConfig, cli_args: &CliArgs) -> Result<()> {
    let worker = HighlightWorker::spawn(config.languages.clone())
        .context("Failed to start highlight worker")?;
    let mut client = HighlightClient::new(worker);

    if let Err(err) = view.submit_highlight(&mut client) {
        view.report_highlight_failure(err);
        return Ok(());
    }

    match client.recv_timeout(cli_args.timeout) {
        Ok(Some(reply)) => match reply.outcome {
            Ok(response) => {
                let updated = view.apply_highlight(&response);
                tracing::debug!(updated, rows = view.row_count(), "applied highlighting");
            }
            Err(err) => view.report_highlight_failure(err),
        },
        Ok(None) => {
            tracing::warn!(
                timeout_secs = cli_args.timeout.as_secs(),
                "highlighting timed out; rendering plain rows"
            );
        }
        Err(err) => view.report_highlight_failure(err),
    }
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn display_filename(cli_args: &CliArgs) -> String {
    cli_args.filename.clone().unwrap_or_else(|| {
        cli_args
            .new
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| cli_args.new.display().to_string())
    })
}

fn write_page(output: Option<&Path>, page: &str) -> Result<()> {
    match output {
        Some(path) => fs::write(path, page)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(page.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
