mod classifier;
mod error;
mod labels;
mod model;
mod page;
mod predict;
mod server;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::server::{AppState, ServerConfig};

/// Serves a text classification form backed by a local pretrained model.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on.
    #[arg(long, default_value_t = 5001)]
    port: u16,
    /// Directory with config.json, tokenizer.json and model.safetensors.
    #[arg(long, default_value = "models/itsclassifier")]
    model_dir: PathBuf,
    /// JSON object mapping class ids to labels.
    #[arg(long, default_value = "conversions/id2label.txt")]
    id2label: PathBuf,
    /// JSON object mapping labels to class ids.
    #[arg(long, default_value = "conversions/label2id.txt")]
    label2id: PathBuf,
    /// Minimum level written to the log: off, error, warn, info, debug or trace.
    #[arg(long, default_value_t = log::LevelFilter::Info)]
    log_level: log::LevelFilter,
}

fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        .init();
}

#[actix_web::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_level);

    let state = match AppState::load(&args.model_dir, &args.id2label, &args.label2id) {
        Ok(state) => state,
        Err(e) => {
            log::error!("startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = ServerConfig {
        host: args.host,
        port: args.port,
    };
    match server::startup(config, state).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
