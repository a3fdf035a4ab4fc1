use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate};
use env_logger::{Env, Target};

use crate::chrono_util::log_file_name;

/// Copies every log line to stderr and to the day's log file.
struct Tee {
    file: fs_err::File,
    stderr: io::Stderr,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stderr.write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stderr.flush()?;
        self.file.flush()
    }
}

/// Installs the global logger.  `RUST_LOG` overrides the default `info` level.
///
/// Lines look like `2025-04-04 18:30:01,123 - INFO - message` and are appended to
/// `logs_dir/bgmafia_scraper_<YYYYMMDD>.log`.
pub fn init(logs_dir: &Path, today: NaiveDate) -> anyhow::Result<PathBuf> {
    let path = logs_dir.join(log_file_name(today));
    let file = fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
                record.level(),
                record.args()
            )
        })
        .target(Target::Pipe(Box::new(Tee {
            file,
            stderr: io::stderr(),
        })))
        .try_init()?;
    Ok(path)
}
