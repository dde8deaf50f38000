//! Copy stdin to stdout through a few stream layers
//!
//! Usage: `layerio-demo [config.json]`

use layerio::{
    copy_with_buffer_size, counting_input, input_from_std, output_from_std, registry, tab_output,
    Ownership, StreamConfig,
};
use tracing::{error, info};

fn load_config() -> layerio::Result<StreamConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let file = std::fs::File::open(&path)?;
            let input = input_from_std(file);
            let config = StreamConfig::from_input(&input);
            input.close()?;
            config
        }
        None => Ok(StreamConfig::default()),
    }
}

fn run(config: &StreamConfig) -> layerio::Result<()> {
    let stdin = input_from_std(std::io::stdin());
    let stdout = output_from_std(std::io::stdout());
    config.maybe_track(&stdin);
    config.maybe_track(&stdout);

    let (counted, position) = counting_input(&stdin, Ownership::Borrowed);
    let tabbed = tab_output(&stdout, 4, Ownership::Borrowed);
    let synced = config.synchronize_output(&tabbed);

    info!("Dependency tree:\n{}{}", counted.describe(), synced.describe());

    let copied = copy_with_buffer_size(&counted, &synced, config.buffer_size)?;
    synced.write_line_with(b"-- end --", config.line_ending)?;

    // closing the wrappers leaves stdin and stdout open
    synced.close()?;
    tabbed.close()?;
    let read = counted.close()?;
    info!(copied, read, position = position.get(), "copy finished");

    // tracked streams are closed by the sweep in main
    if !config.track {
        stdout.close()?;
        stdin.close()?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {e}");
            std::process::exit(2);
        }
    };

    let status = match run(&config) {
        Ok(()) => 0,
        Err(e) => {
            error!("Copy failed: {e}");
            1
        }
    };

    let closed = registry::close_all();
    info!(closed, "Program completed");
    std::process::exit(status);
}
