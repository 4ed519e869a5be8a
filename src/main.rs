use clap::Parser;
use std::path::PathBuf;

use track_coding_time::constants::{DEFAULT_ENV_FILE, DEFAULT_SUMMARY_RANGE};
use track_coding_time::{
    run, CodeProvider, ConsoleCodeProvider, FixedCodeProvider, OAuthEndpoints, Settings,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Fetch WakaTime coding summaries and store per-file time in a database"
)]
struct Args {
    /// Env file holding DB_URI, WT_CLIENT_ID and WT_CLIENT_SECRET
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Authorization code to exchange instead of prompting for one
    #[arg(long)]
    code: Option<String>,

    /// Summaries range passed to the API
    #[arg(long, default_value = DEFAULT_SUMMARY_RANGE)]
    range: String,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let settings = Settings::load(&args.env_file)?;
    log::debug!("Loaded {:?} from {}", settings, args.env_file.display());

    let mut provider: Box<dyn CodeProvider> = match args.code {
        Some(code) => Box::new(FixedCodeProvider::new(code)),
        None => Box::new(ConsoleCodeProvider),
    };

    let report = run(
        &settings,
        OAuthEndpoints::default(),
        provider.as_mut(),
        &args.range,
    )?;

    println!(
        "Inserted {} rows from {} projects for {}",
        report.rows_inserted,
        report.projects.len(),
        report.user
    );
    Ok(())
}
