//! briefing-clock: talking alarm clock with news, weather and Covid-19 briefings.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use briefing_clock::briefing::Sources;
use briefing_clock::config::Config;
use briefing_clock::scheduler::Scheduler;
use briefing_clock::service::AlarmService;
use briefing_clock::speech::{speaker_from_config, SpeechQueue};
use briefing_clock::timefmt::local_now;
use briefing_clock::web;

#[derive(Parser, Debug)]
#[command(name = "briefing-clock", about = "Talking alarm clock with daily briefings")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for the web page (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Only advance alarms when the page is requested
    #[arg(long)]
    poll_only: bool,

    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(args: &Args) -> Option<WorkerGuard> {
    // Suppress noisy HTTP internals
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,hyper_util=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,hyper_util=warn,reqwest=warn")
    };

    let (file_layer, guard) = match &args.log_file {
        Some(path) => {
            let dir = path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
            let name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "briefing-clock.log".into());
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _log_guard = init_logging(&args);

    info!("briefing-clock starting");

    let mut config = Config::load(args.config.as_deref());
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.poll_only {
        config.schedule.poll_only = true;
    }
    info!("Location: {}, speech backend: {}", config.location, config.speech.backend);

    // Speech runs on its own thread so announcements never block the page
    let (speech, _speech_thread) = SpeechQueue::spawn(speaker_from_config(&config.speech))?;

    let service = AlarmService::new(
        Scheduler::new(&config.schedule, local_now()),
        Sources::from_config(&config),
        speech,
        config.history.resolved_dir(),
    );

    if config.schedule.poll_only {
        info!("Poll-only mode: alarms advance only when the page is requested");
    } else {
        let every = Duration::from_millis(config.schedule.tick_interval_ms.max(100));
        tokio::spawn(service.clone().run(every));
    }

    web::serve(service, &config.server).await?;

    Ok(())
}
