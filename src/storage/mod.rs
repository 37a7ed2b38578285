use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{Result, SearchError};
use crate::parser::ResultRecord;

pub const JSON_FILE_NAME: &str = "results.json";
pub const CSV_FILE_NAME: &str = "results.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Text => "text",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        };
        f.write_str(name)
    }
}

pub trait OutputFormatter {
    fn format_records(&self, records: &[ResultRecord]) -> Result<String>;
    /// File the output goes to inside the output directory; `None` means stdout.
    fn file_name(&self) -> Option<&str>;
}

pub struct TextFormatter;
pub struct JsonFormatter;
pub struct CsvFormatter;

impl OutputFormatter for TextFormatter {
    fn format_records(&self, records: &[ResultRecord]) -> Result<String> {
        let mut output = String::new();
        for record in records {
            output.push_str(&format!(
                "Title: {}\nLink: {}\nDescription: {}\n\n",
                record.title(),
                record.link(),
                record.description()
            ));
        }
        Ok(output)
    }

    fn file_name(&self) -> Option<&str> {
        None
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_records(&self, records: &[ResultRecord]) -> Result<String> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        records
            .serialize(&mut serializer)
            .map_err(|e| SearchError::Storage(format!("JSON serialization failed: {}", e)))?;
        String::from_utf8(buffer).map_err(|e| SearchError::Storage(e.to_string()))
    }

    fn file_name(&self) -> Option<&str> {
        Some(JSON_FILE_NAME)
    }
}

impl CsvFormatter {
    fn escape_csv_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }
}

impl OutputFormatter for CsvFormatter {
    /// Header comes from the first record's field names, so an empty slice is an error.
    fn format_records(&self, records: &[ResultRecord]) -> Result<String> {
        let columns = records.first().ok_or(SearchError::EmptyExport)?.field_names();

        let mut output = columns.join(",");
        output.push_str("\r\n");

        for record in records {
            let row: Vec<String> = columns
                .iter()
                .map(|column| Self::escape_csv_field(record.field(column)))
                .collect();
            output.push_str(&row.join(","));
            output.push_str("\r\n");
        }

        Ok(output)
    }

    fn file_name(&self) -> Option<&str> {
        Some(CSV_FILE_NAME)
    }
}

/// Where an export ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Printed { count: usize },
    Written { path: PathBuf, count: usize },
}

pub struct Exporter {
    output_dir: PathBuf,
}

impl Exporter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn formatter(format: ExportFormat) -> Box<dyn OutputFormatter> {
        match format {
            ExportFormat::Text => Box::new(TextFormatter),
            ExportFormat::Json => Box::new(JsonFormatter),
            ExportFormat::Csv => Box::new(CsvFormatter),
        }
    }

    /// Export to stdout (text) or to a file in the output directory.
    pub fn export(&self, records: &[ResultRecord], format: ExportFormat) -> Result<ExportOutcome> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.export_with(records, format, &mut handle)
    }

    /// Like [`Exporter::export`], with text output going to `writer`.
    pub fn export_with<W: Write>(
        &self,
        records: &[ResultRecord],
        format: ExportFormat,
        writer: &mut W,
    ) -> Result<ExportOutcome> {
        let formatter = Self::formatter(format);
        let content = formatter.format_records(records)?;

        match formatter.file_name() {
            None => {
                writer.write_all(content.as_bytes())?;
                writer.flush()?;
                debug!("Printed {} results as {}", records.len(), format);
                Ok(ExportOutcome::Printed { count: records.len() })
            }
            Some(file_name) => {
                fs::create_dir_all(&self.output_dir)?;
                let path = self.output_dir.join(file_name);
                fs::write(&path, content)?;
                info!("Wrote {} results to {}", records.len(), path.display());
                Ok(ExportOutcome::Written {
                    path,
                    count: records.len(),
                })
            }
        }
    }
}
