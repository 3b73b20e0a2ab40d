use basalt_bus::Transmitter;
use basalt_config::BusConfig;
use basalt_util::time::now_ns;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Demo message type: a sequence number followed by a send timestamp.
const TICK_MSG_TYPE_ID: i32 = 1;

const MESSAGE_COUNT: u64 = 1_000_000;
const BATCH_SIZE: u64 = 1_000;
const BATCH_DELAY_US: u64 = 100;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => BusConfig::load(&path)?,
        None => BusConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let capacity = config.data_capacity()?;
    let mut transmitter = Transmitter::create(&config.shm_file_path, capacity)?;

    info!(
        "publisher: broadcasting to {path} (capacity={capacity}, version={version})",
        path = &config.shm_file_path,
        version = basalt_util::version::version_text(),
    );

    let mut payload = [0u8; 16];
    for seq in 0..MESSAGE_COUNT {
        payload[..8].copy_from_slice(&seq.to_ne_bytes());
        payload[8..].copy_from_slice(&now_ns().to_ne_bytes());
        transmitter.transmit(TICK_MSG_TYPE_ID, &payload)?;

        // Pace the stream so live subscribers get a chance to keep up.
        if (seq + 1) % BATCH_SIZE == 0 {
            std::thread::sleep(Duration::from_micros(BATCH_DELAY_US));

            if (seq + 1) % 100_000 == 0 {
                info!("publisher: {published}/{MESSAGE_COUNT} messages", published = seq + 1);
            }
        }
    }

    info!("publisher: done, {MESSAGE_COUNT} messages broadcast");
    Ok(())
}
