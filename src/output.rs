// Report files are written beside their final path and renamed into place,
// so a failed run never leaves a truncated CSV or summary behind.
use crate::error::OutputError;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

fn write_replacing<F>(path: &Path, fill: F) -> Result<(), OutputError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), OutputError>,
{
    let partial = partial_path(path);
    let mut out = BufWriter::new(File::create(&partial)?);
    let written = fill(&mut out).and_then(|()| out.flush().map_err(OutputError::from));
    drop(out);
    match written {
        Ok(()) => Ok(fs::rename(&partial, path)?),
        Err(e) => {
            fs::remove_file(&partial).ok();
            Err(e)
        }
    }
}

/// One CSV row per item, headers taken from the serde field names.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), OutputError> {
    write_replacing(path, |out| {
        let mut csv_out = csv::Writer::from_writer(out);
        rows.iter().try_for_each(|row| csv_out.serialize(row))?;
        csv_out.flush()?;
        Ok(())
    })
}

/// Pretty-printed JSON document with a trailing newline.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    write_replacing(path, |out| {
        serde_json::to_writer_pretty(&mut *out, value)?;
        out.write_all(b"\n")?;
        Ok(())
    })
}

/// Markdown table of the first `max_rows` rows, or `(no rows)`.
pub fn render_preview<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", render_preview(rows, max_rows));
}
