use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;
use psgen_app::{render, AppConfig, Renderer, Session};
use psgen_core::{DocumentKind, PollPhase};
use psgen_logging::{psgen_error, psgen_info, LogDestination};

/// Uploads the old PS and both mockups, generates the new PS document and
/// downloads it once the backend job has finished.
#[derive(Debug, Parser)]
#[command(name = "psgen", version)]
struct Cli {
    /// Old PS (original requirement document, .docx)
    #[arg(long)]
    old_ps: PathBuf,
    /// Old mockup document (.docx)
    #[arg(long)]
    old_mockup: PathBuf,
    /// New mockup document (.docx)
    #[arg(long)]
    new_mockup: PathBuf,
    /// RON config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Backend base url (overrides config and PSGEN_API_BASE)
    #[arg(long)]
    base_url: Option<String>,
    /// Where the generated document is saved
    #[arg(long)]
    download_dir: Option<PathBuf>,
    #[arg(long)]
    poll_interval_ms: Option<u64>,
    #[arg(long)]
    similarity_threshold: Option<f64>,
    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        config.override_base_url(self.base_url.clone());
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
        if self.similarity_threshold.is_some() {
            config.similarity_threshold = self.similarity_threshold;
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = match &cli.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    psgen_logging::initialize(destination, level);

    let config = cli.config()?;
    psgen_info!("Using backend {}", config.base_url);

    let mut session = Session::new(&config).context("failed to set up backend client")?;
    let mut renderer = Renderer::new();
    session.set_observer(move |view| {
        for line in renderer.changes(view) {
            println!("{line}");
        }
    });

    let result = run(&mut session, &cli).await;
    if let Err(err) = &result {
        psgen_error!("{:#}", err);
        for line in render::render(&session.view()) {
            eprintln!("{line}");
        }
    }
    session.shutdown();
    result
}

async fn run(session: &mut Session, cli: &Cli) -> Result<()> {
    session.select_file(DocumentKind::OldPs, &cli.old_ps);
    session.select_file(DocumentKind::OldMockup, &cli.old_mockup);
    session.select_file(DocumentKind::NewMockup, &cli.new_mockup);
    session.upload_many(&DocumentKind::ALL).await?;

    let job_id = session.generate().await?;
    psgen_info!("Tracking job {}", job_id);

    match session.wait_for_job().await? {
        PollPhase::Complete => {}
        PollPhase::Failed => bail!("lost track of job {job_id}: progress could not be fetched"),
        phase => bail!("job {job_id} stopped unexpectedly ({phase:?})"),
    }

    let saved = session.download().await?;
    println!("Saved {}", saved.display());
    Ok(())
}
