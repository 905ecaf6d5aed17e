//! Entry point for the churn prediction service.

use std::sync::Arc;

use churnkit::config::{Settings, parse_config_arg};
use churnkit::logging;
use churnkit::ml::ModelKind;
use churnkit::server::{self, AppState};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = parse_config_arg(&args, &help_text())?;
    let settings = Settings::load(config_path.as_deref()).map_err(|err| err.to_string())?;

    if let Err(err) = logging::init("serve", settings.logging.dir.as_deref()) {
        eprintln!("Logging to file disabled: {err}");
        logging::init_stdout_only();
    }

    let state = AppState::load(&settings.paths.models_dir);
    if ModelKind::ALL
        .iter()
        .all(|&kind| !state.slot(kind).is_loaded())
    {
        tracing::warn!(
            models_dir = %settings.paths.models_dir.display(),
            "No models loaded; every prediction will fail until the trainer has run"
        );
    }

    let addr = settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| format!("Failed to bind {addr}: {err}"))?;
    server::serve(listener, Arc::new(state))
        .await
        .map_err(|err| format!("Server error: {err}"))
}

fn help_text() -> String {
    [
        "churnkit",
        "",
        "Serve churn predictions over HTTP (POST /predict, GET /).",
        "",
        "Usage:",
        "  churnkit [--config <file>]",
        "",
        "Options:",
        "  --config <file>   TOML settings (default: ./churnkit.toml when present)",
        "  -h, --help        Show this help",
    ]
    .join("\n")
}
