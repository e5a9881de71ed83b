use std::io::IsTerminal;
use std::path::Path;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use npybridge_format::{format_shape, Header};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct HeaderSummary {
    pub path: String,
    pub descr: String,
    pub element_type: String,
    pub shape: Vec<usize>,
    pub element_count: usize,
    pub header_bytes: usize,
    pub payload_bytes: usize,
    /// Bytes present after the header, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_bytes: Option<u64>,
}

impl HeaderSummary {
    pub fn new(path: &Path, header: &Header, payload_bytes: usize) -> Self {
        Self {
            path: path.display().to_string(),
            descr: header.descr.to_string(),
            element_type: header.element.to_string(),
            shape: header.shape.clone(),
            element_count: header.element_count(),
            header_bytes: header.header_len,
            payload_bytes,
            available_bytes: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.available_bytes
            .is_none_or(|available| available >= self.payload_bytes as u64)
    }
}

pub fn print_header_summary(summary: &HeaderSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(summary),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["path".to_string(), summary.path.clone()])
                .add_row(vec!["descr".to_string(), summary.descr.clone()])
                .add_row(vec!["type".to_string(), summary.element_type.clone()])
                .add_row(vec!["shape".to_string(), format_shape(&summary.shape)])
                .add_row(vec!["elements".to_string(), summary.element_count.to_string()])
                .add_row(vec!["header bytes".to_string(), summary.header_bytes.to_string()])
                .add_row(vec!["payload bytes".to_string(), summary.payload_bytes.to_string()]);
            if let Some(available) = summary.available_bytes {
                table.add_row(vec!["available bytes".to_string(), available.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}: {} {} {} (header {} bytes, payload {} bytes{})",
                summary.path,
                summary.descr,
                summary.element_type,
                format_shape(&summary.shape),
                summary.header_bytes,
                summary.payload_bytes,
                if summary.is_complete() { "" } else { ", truncated" }
            );
        }
    }
}

#[derive(Serialize)]
pub struct DemuxSummary {
    pub text_lines: u64,
    pub frames: u64,
    pub written: Vec<String>,
    pub failed: u64,
}

/// Demux summaries go to stderr; stdout carries the transcript text.
pub fn print_demux_summary(summary: &DemuxSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => eprintln!("{}", to_json(summary)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TEXT LINES", "FRAMES", "WRITTEN", "FAILED"])
                .add_row(vec![
                    summary.text_lines.to_string(),
                    summary.frames.to_string(),
                    summary.written.len().to_string(),
                    summary.failed.to_string(),
                ]);
            eprintln!("{table}");
        }
        OutputFormat::Pretty => {
            eprintln!(
                "{} text lines, {} frames ({} written, {} failed)",
                summary.text_lines,
                summary.frames,
                summary.written.len(),
                summary.failed
            );
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", to_json(value));
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}
