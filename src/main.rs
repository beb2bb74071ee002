use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ui_exerciser::config::{self, TimingSettings, WebDriverSettings};
use ui_exerciser::demo;
use ui_exerciser::report::{self, ReportFormat};
use ui_exerciser::session::{self, Session};
use ui_exerciser::{Exerciser, ExerciserConfig, Page, ProbeStatus, RunReport, WebDriverPage};

/// UI Exerciser - activate every interactive element on a page and report what happened
#[derive(Parser, Debug)]
#[command(
    name = "ui-exerciser",
    about = "Discover, activate and classify the interactive elements of a web page",
    after_help = "ENVIRONMENT VARIABLES:\n\
        UI_EXERCISER_WEBDRIVER_URL      WebDriver endpoint URL\n\
        UI_EXERCISER_BROWSER            Browser behind the WebDriver (firefox, chrome)\n\
        UI_EXERCISER_SESSION_DIR        Base directory for report sessions\n\
        UI_EXERCISER_REACTION_MS        Wait after each activation (ms)\n\
        UI_EXERCISER_INTER_PROBE_MS     Pause between probes (ms)\n\
        RUST_LOG                        Log filter (default: ui_exerciser=info)"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exercise a live page through a WebDriver server
    Run {
        /// Page to open before discovery
        #[arg(short, long)]
        url: String,

        /// WebDriver endpoint
        #[arg(long, env = config::ENV_WEBDRIVER_URL, default_value = config::DEFAULT_WEBDRIVER_URL)]
        webdriver: String,

        /// Browser behind the WebDriver
        #[arg(long, env = config::ENV_BROWSER, default_value = config::DEFAULT_BROWSER)]
        browser: String,

        /// Run the browser without a window
        #[arg(long)]
        headless: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Exercise the built-in storefront fixture (no browser needed)
    Demo {
        /// Skip every settle window
        #[arg(long)]
        fast: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List report sessions
    Sessions {
        /// Remove sessions older than this many hours
        #[arg(long)]
        prune_hours: Option<u64>,
    },
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Report encoding(s) to write
    #[arg(short, long, value_enum, default_value = "both")]
    format: FormatChoice,

    /// Output directory for reports (default: auto-generated in session dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep reports after completion (default: cleanup unless --output is specified)
    #[arg(long, short = 'k')]
    keep: bool,

    /// Print the JSON report instead of the listing
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FormatChoice {
    Csv,
    Json,
    Both,
}

impl FormatChoice {
    fn formats(self) -> Vec<ReportFormat> {
        match self {
            FormatChoice::Csv => vec![ReportFormat::Csv],
            FormatChoice::Json => vec![ReportFormat::Json],
            FormatChoice::Both => vec![ReportFormat::Csv, ReportFormat::Json],
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ui_exerciser=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Some(Commands::Run {
            url,
            webdriver,
            browser,
            headless,
            output,
        }) => {
            let settings = WebDriverSettings {
                url: webdriver,
                browser,
                headless,
            };
            let page = WebDriverPage::connect(&settings)
                .await
                .with_context(|| format!("failed to start a browser session at {}", settings.url))?;

            let backend = page.source_type().to_string();
            let outcome = async {
                page.goto(&url).await.with_context(|| format!("failed to open {}", url))?;
                let report = exercise(&page, ExerciserConfig::from_env(), output.json).await?;
                Ok::<_, anyhow::Error>(report)
            }
            .await;
            if let Err(err) = page.close().await {
                warn!(error = %err, "failed to close the browser session");
            }

            let report = outcome?;
            finish(&report, &output, &url, &backend)?;
        }

        Some(Commands::Demo { fast, output }) => {
            let timings = if fast {
                TimingSettings::immediate()
            } else {
                config::get().timings
            };
            let (page, _) = demo::storefront();
            let report = exercise(&page, ExerciserConfig::default().with_timings(timings), output.json).await?;
            finish(&report, &output, "storefront", page.source_type())?;
        }

        Some(Commands::Sessions { prune_hours }) => {
            if let Some(hours) = prune_hours {
                let removed = session::cleanup_old_sessions(Duration::from_secs(hours * 3600))
                    .context("failed to prune sessions")?;
                println!("Removed {} session(s) older than {}h", removed, hours);
            }

            let sessions = session::list_sessions().context("failed to list sessions")?;
            if sessions.is_empty() {
                println!("No sessions in {}", config::session_base_dir());
            }
            for dir in sessions {
                match session::read_metadata(&dir) {
                    Some(meta) => println!(
                        "{}  {}  {}",
                        dir.display(),
                        meta.created,
                        meta.target.unwrap_or_default()
                    ),
                    None => println!("{}", dir.display()),
                }
            }
        }

        None => {
            println!("UI Exerciser - activate every interactive element on a page and report what happened");
            println!();
            println!("Usage: ui-exerciser <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run       Exercise a live page through a WebDriver server");
            println!("  demo      Exercise the built-in storefront fixture");
            println!("  sessions  List (and prune) report sessions");
            println!();
            println!("Run with --help for more information.");
        }
    }

    Ok(())
}

/// Run the exerciser with Ctrl-C cancellation and a live progress line
async fn exercise<P: Page>(page: &P, config: ExerciserConfig, quiet: bool) -> Result<RunReport> {
    let exerciser = Exerciser::new(config);
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing the current probe");
            interrupt.cancel();
        }
    });

    let mut updates = exerciser.subscribe();
    let progress = tokio::spawn(async move {
        let mut last: Option<String> = None;
        while updates.changed().await.is_ok() {
            let label = updates.borrow_and_update().current_label.clone();
            if label.is_some() && label != last {
                if !quiet {
                    if let Some(label) = &label {
                        eprintln!("Testing: {}", label);
                    }
                }
                last = label;
            }
        }
    });

    let report = exerciser.run(page, &cancel).await?;
    drop(exerciser);
    let _ = progress.await;

    if let Some(failure) = &report.failure {
        bail!("run aborted: {}", failure);
    }
    Ok(report)
}

/// Print the results and write the report artifacts
fn finish(run: &RunReport, output: &OutputArgs, target: &str, backend: &str) -> Result<()> {
    if output.json {
        println!("{}", report::to_json(&run.outcomes)?);
    } else {
        for outcome in &run.outcomes {
            let marker = match outcome.status {
                ProbeStatus::Success => "ok  ",
                ProbeStatus::Warning => "warn",
                ProbeStatus::Error => "FAIL",
            };
            println!(
                "[{}] {} ({}) [{}]: {}",
                marker,
                outcome.label,
                outcome.location,
                outcome.action_category,
                outcome.detail.as_deref().unwrap_or("")
            );
        }
        println!();
        if run.cancelled {
            println!("Cancelled after {} of {} elements", run.outcomes.len(), run.discovered);
        }
        println!("{}", run.summary);
    }

    let keep = output.keep || output.output.is_some();
    let session = match &output.output {
        Some(dir) => Session::in_dir(dir),
        None => Session::with_name(target),
    }
    .keep(keep)
    .with_target(target, backend);
    session.init().context("failed to create the report session")?;

    for format in output.format.formats() {
        let artifact = report::export(&run.outcomes, format)?;
        let path = session.write_report(&artifact)?;
        if !output.json {
            println!("Report: {}", path.display());
        }
    }

    if !output.json {
        if keep {
            println!("\nSession: {}", session.dir.display());
        } else {
            println!("\nSession: {} (removed on exit, pass --keep to preserve)", session.dir.display());
        }
    }

    // Keep session alive if needed (prevent Drop cleanup)
    if keep {
        std::mem::forget(session);
    }
    Ok(())
}
