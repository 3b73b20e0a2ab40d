use basalt_bus::Receiver;
use basalt_config::BusConfig;
use basalt_util::time::now_ns;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How long to wait for the publisher to create the bus file.
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

/// Exit after this many consecutive empty scans once data has flowed.
const IDLE_SCANS: u32 = 1_000_000;

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

    info!(
        "subscriber: waiting for bus at {path}",
        path = &config.shm_file_path
    );

    // The publisher creates the file; retry until it shows up.
    let open_deadline = Instant::now() + OPEN_TIMEOUT;
    let mut receiver = loop {
        match Receiver::open(&config.shm_file_path) {
            Ok(r) => break r,
            Err(_) if Instant::now() < open_deadline => {
                std::thread::sleep(Duration::from_millis(1));
            }
            Err(e) => return Err(e.into()),
        }
    };

    info!(
        "subscriber: attached (capacity={capacity}, tail-follow)",
        capacity = receiver.capacity()
    );

    let mut msg = Vec::new();
    let mut received: u64 = 0;
    let mut latency_sum_ns: u64 = 0;
    let mut idle_scans: u32 = 0;

    loop {
        match receiver.try_read(&mut msg) {
            Some(_msg_type_id) => {
                idle_scans = 0;
                received += 1;

                if msg.len() >= 16 {
                    let sent_ns = u64::from_ne_bytes(msg[8..16].try_into().unwrap());
                    latency_sum_ns += now_ns().saturating_sub(sent_ns);
                }

                if received % 100_000 == 0 {
                    info!(
                        "subscriber: {received} messages, {lapped} laps, mean latency {mean}ns",
                        lapped = receiver.lapped_count(),
                        mean = latency_sum_ns / received,
                    );
                }
            }
            None => {
                idle_scans += 1;
                if idle_scans > IDLE_SCANS && received > 0 {
                    break;
                }
                std::hint::spin_loop();
            }
        }
    }

    if receiver.lapped_count() > 0 {
        warn!(
            "subscriber: lapped {lapped} times, messages were lost",
            lapped = receiver.lapped_count()
        );
    }
    info!("subscriber: done, {received} messages received");
    Ok(())
}
