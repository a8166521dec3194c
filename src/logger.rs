use std::time::SystemTime;

use fern::colors::{Color, ColoredLevelConfig};
use log::{LevelFilter, SetLoggerError};

/// Colored, timestamped log lines on stderr at `level`. The HTTP plumbing
/// is held at info so debug runs stay readable.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .debug(Color::Magenta)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .level_for("hyper", level.min(LevelFilter::Info))
        .level_for("tungstenite", level.min(LevelFilter::Info))
        .chain(std::io::stderr())
        .apply()
}
