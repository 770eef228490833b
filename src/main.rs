use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

use corpus::core::config::{self, CliOverrides};

#[derive(Parser)]
#[command(name = "corpus", about = "Ask questions about your course material")]
struct Args {
    /// Answer from the built-in simulator instead of the service
    #[arg(long)]
    demo: bool,

    /// Answering service base URL (e.g. http://localhost:8000/api/v1)
    #[arg(long)]
    url: Option<String>,

    /// Restrict retrieval to one semester (1-6)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
    semester: Option<u8>,

    /// Restrict retrieval to one subject id
    #[arg(long)]
    subject: Option<String>,

    /// Demo account to answer as (hod@, faculty@ or student@bca.edu)
    #[arg(long)]
    demo_user: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to corpus.log in current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();

    if let Ok(log_file) = File::create("corpus.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().unwrap_or_else(|e| {
        log::warn!("{e}; falling back to defaults");
        config::CorpusConfig::default()
    });
    let cli = CliOverrides {
        demo: args.demo,
        url: args.url,
        semester: args.semester,
        subject: args.subject,
        demo_user: args.demo_user,
    };
    let resolved = config::resolve(&file_config, &cli);

    log::info!(
        "Corpus starting up: mode={}, service={}",
        if resolved.demo_mode { "demo" } else { "live" },
        resolved.base_url
    );

    corpus::tui::run(resolved)
}
