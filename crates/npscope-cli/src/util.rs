use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use npscope_table::Table;
use serde::Serialize;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    /// Writes `body` wrapped in a [`Report`] envelope to `output_path`, or to
    /// stdout when no path is given.
    pub fn save_report<T>(
        command: &'static str,
        body: &T,
        output_path: Option<PathBuf>,
    ) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(Report::new(command, body))?;
        log::info!("Wrote {command} report to {}", output.display_path());
        Ok(())
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Envelope written around every command result
#[derive(Debug, Clone, Serialize)]
pub struct Report<T> {
    /// Timestamp when the report was generated (ISO 8601 format)
    pub generated_at: DateTime<Utc>,
    /// Subcommand that produced the report
    pub command: &'static str,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Report<T> {
    pub fn new(command: &'static str, body: T) -> Self {
        Self {
            generated_at: Utc::now(),
            command,
            body,
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Read a table from a JSON file
///
/// # Arguments
///
/// * `table_kind` - Role of the table, used in log and error messages
/// * `path` - Path to a JSON file of the form `{"columns": [...], "rows": [[...], ...]}`
///
/// # Returns
///
/// Deserialized table with validated row lengths
///
/// # Errors
///
/// Returns error if file cannot be opened or parsed, or its rows do not
/// match its columns
pub fn read_table_file<P>(table_kind: &str, path: P) -> anyhow::Result<Table>
where
    P: AsRef<Path>,
{
    let table: Table = read_json_file(table_kind, path)?;
    log::info!(
        "Loaded {table_kind} table: {} row(s), {} column(s)",
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

/// Read an optional table, returning `None` when no path is given
///
/// # Errors
///
/// Returns error if the file cannot be read (see [`read_table_file`])
pub fn read_optional_table_file(
    table_kind: &str,
    path: Option<&PathBuf>,
) -> anyhow::Result<Option<Table>> {
    path.map(|path| read_table_file(table_kind, path))
        .transpose()
}
