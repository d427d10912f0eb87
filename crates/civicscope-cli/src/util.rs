use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use civicscope_analysis::config::AnalysisConfig;
use civicscope_data::table::RawTable;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "CIVICSCOPE_LOG";

/// Installs the stderr log subscriber, filtered by [`LOG_ENV`] (default `warn`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Response of the per-district commands when no district is given.
#[derive(Debug, serde::Serialize)]
pub struct DistrictList<'a> {
    pub districts: Vec<&'a str>,
}

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
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
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
        T: serde::Serialize,
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
        if let Output::File { path, .. } = self {
            tracing::info!(path = %path.display(), "report written");
        }
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

/// Loads the analysis configuration, or the defaults when no path is given.
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed, or if a value is out
/// of range
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    let config = match path {
        Some(path) => read_json_file::<AnalysisConfig, _>("analysis config", path)?,
        None => AnalysisConfig::default(),
    };
    config
        .validate()
        .context("Invalid analysis configuration")?;
    Ok(config)
}

/// Read a CSV file into a raw table
///
/// # Arguments
///
/// * `file_kind` - What the file holds, for error messages
/// * `path` - Path to the CSV file
///
/// # Errors
///
/// Returns error if file cannot be opened or is not valid CSV
pub fn read_csv_file<P>(file_kind: &str, path: P) -> anyhow::Result<RawTable>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;
    let table = read_csv(io::BufReader::new(file))
        .with_context(|| format!("Failed to parse {} CSV file: {}", file_kind, path.display()))?;
    tracing::debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.len(),
        "loaded {file_kind} table"
    );
    Ok(table)
}

/// Parses CSV text with a header row.
///
/// Rows may have fewer or more cells than the header; cells are trimmed.
pub fn read_csv<R>(reader: R) -> Result<RawTable, csv::Error>
where
    R: io::Read,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader
        .headers()?
        .iter()
        .map(str::to_owned)
        .collect::<Vec<_>>();
    let rows = reader
        .records()
        .map(|record| Ok(record?.iter().map(str::to_owned).collect::<Vec<_>>()))
        .collect::<Result<Vec<_>, csv::Error>>()?;
    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv() {
        let text = "District , Population\nMysuru, 3001127\nUdupi,1177361\n";
        let table = read_csv(text.as_bytes()).unwrap();
        assert_eq!(table.headers, ["District", "Population"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), Some("Mysuru"));
        assert_eq!(table.cell(0, 1), Some("3001127"));
    }

    #[test]
    fn test_read_csv_quoted_and_ragged() {
        let text = "district,scheme,coverage_ratio\n\"Bengaluru (U)\",\"PM-KISAN, phase 2\",0.12\nKodagu,NSAP\n";
        let table = read_csv(text.as_bytes()).unwrap();
        assert_eq!(table.cell(0, 0), Some("Bengaluru (U)"));
        assert_eq!(table.cell(0, 1), Some("PM-KISAN, phase 2"));
        assert_eq!(table.cell(1, 1), Some("NSAP"));
        assert_eq!(table.cell(1, 2), None);
    }

    #[test]
    fn test_read_csv_header_only() {
        let table = read_csv("district,population\n".as_bytes()).unwrap();
        assert_eq!(table.headers.len(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_default_config_loads_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }
}
