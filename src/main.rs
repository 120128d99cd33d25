use bitclock16::clock::WallClock;
use bitclock16::config::Config;
use bitclock16::error::Error;
use bitclock16::host::ClockHost;
use bitclock16::logging;
use bitclock16::session::WidgetSession;
use bitclock16::sink::PngDirectorySink;
use bitclock16::{command, host_log};
use log::Level::{Error as ErrorLevel, Info};

#[tokio::main]
async fn main() {
    // Initialize logging
    logging::init_logging();

    if let Err(e) = run().await {
        host_log!(ErrorLevel, "{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::load()?;
    std::fs::create_dir_all(&config.output_dir)?;
    host_log!(Info, "Writing frames to {}", config.output_dir.display());

    let sink = PngDirectorySink::new(&config.output_dir);
    let session = WidgetSession::new(&config, wall_clock(), Box::new(sink))?.into_shared();

    // Start the command listener (in a background thread)
    command::start_command_listener(config.command_addr.clone(), session.clone());

    let mut host = ClockHost::enable(session).await;
    tokio::signal::ctrl_c().await?;
    host_log!(Info, "Shutting down");
    host.disable();
    Ok(())
}

#[cfg(feature = "mock_clock")]
fn wall_clock() -> Box<dyn WallClock> {
    Box::new(bitclock16::clock::mock::MockClock::new(60))
}

#[cfg(not(feature = "mock_clock"))]
fn wall_clock() -> Box<dyn WallClock> {
    Box::new(bitclock16::clock::SystemClock)
}
