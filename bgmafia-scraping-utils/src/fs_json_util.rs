use std::{
    fmt::Debug,
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use fs_err::File;
use serde::{Deserialize, Serialize};

/// Writes `value` as two-space indented JSON.  Non-ASCII text is kept as is.
pub fn write_json_pretty<P: Into<PathBuf>, T: Serialize>(
    path: P,
    value: &T,
) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

pub fn read_yaml<P: Into<PathBuf> + Debug, T: for<'de> Deserialize<'de>>(
    path: P,
) -> anyhow::Result<T> {
    let path = path.into();
    (|| serde_yaml::from_str(&fs_err::read_to_string(&path)?).map_err(anyhow::Error::new))()
        .with_context(|| {
            format!(
                "While trying to parse {path:?} as {}",
                std::any::type_name::<T>()
            )
        })
}

pub fn write_yaml<P: Into<PathBuf>, T: Serialize>(path: P, value: &T) -> anyhow::Result<()> {
    fs_err::write(path.into(), serde_yaml::to_string(value)?)?;
    Ok(())
}
