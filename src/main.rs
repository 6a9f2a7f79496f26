//! winstrap CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use winstrap::cli::{self, Cli};
use winstrap::ui::Theme;

/// Initialize the tracing subscriber for developer diagnostics.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("winstrap=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("winstrap=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("winstrap starting with args: {:?}", cli);

    let theme = if cli.no_color {
        Theme::plain()
    } else {
        Theme::detect()
    };

    match cli::run(&cli, theme.clone()) {
        Ok(_) => {
            println!("{}", theme.format_success("winstrap finished"));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", theme.format_error(&format!("Error: {}", e)));
            ExitCode::from(1)
        }
    }
}
