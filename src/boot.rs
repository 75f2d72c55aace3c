use chrono::Local;
use log::LevelFilter;
use std::io::{self, Write};

use env_logger::{Builder, Target};

/// Environment variable naming a file to send logs to instead of stderr.
pub const LOG_FILE_ENV: &str = "SCANVIEW_LOG_FILE";

/// Logger setup shared by every entrypoint.
///
/// Logs go to stderr so stdout stays free for rendered output. When
/// `SCANVIEW_LOG_FILE` is set they are appended to that file instead.
/// `RUST_LOG` overrides the default level either way.
pub fn init_logging() {
    if let Ok(path) = std::env::var(LOG_FILE_ENV) {
        match init_file_logger(&path) {
            Ok(()) => return,
            Err(err) => eprintln!("Failed to initialize file logger at '{path}': {err}"),
        }
    }

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Stderr)
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn init_file_logger(path: &str) -> io::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(file)))
        .filter_level(LevelFilter::Debug)
        .parse_default_env()
        .init();

    log::info!("Logging to {path}");

    Ok(())
}
