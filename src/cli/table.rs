//! Table formatting utilities for CLI list commands
//!
//! Every list command describes its columns once and hands typed rows to
//! [`TableFormatter`], which renders them as aligned TSV, CSV, Markdown or
//! bare ids.

use chrono::{DateTime, Local, NaiveDate, Utc};
use console::style;

use crate::cli::helpers::{format_short_id_str, truncate_str};
use crate::cli::OutputFormat;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Record id (cyan, shortened in TSV)
    Id(String),
    /// Plain text, truncated to the column width in TSV
    Text(String),
    /// DMT open/closed state (`true` = closed)
    Closed(bool),
    /// Yes/no flag
    Flag(bool),
    /// Calendar date (stored dates have no time component)
    Date(Option<NaiveDate>),
    /// Timestamp shown in local time
    DateTime(DateTime<Utc>),
    Number(i64),
    Empty,
}

impl CellValue {
    /// Optional text, `Empty` when missing or blank
    pub fn opt_text(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => CellValue::Text(s.to_string()),
            _ => CellValue::Empty,
        }
    }

    /// Format for TSV output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Id(id) => {
                format!("{:<width$}", style(format_short_id_str(id)).cyan(), width = width)
            }
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width.saturating_sub(2)), width = width)
            }
            CellValue::Closed(closed) => {
                let styled = if *closed {
                    style("Closed").green()
                } else {
                    style("Open").yellow()
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Flag(true) => format!("{:<width$}", style("yes").bold(), width = width),
            CellValue::Flag(false) => format!("{:<width$}", style("no").dim(), width = width),
            CellValue::Empty | CellValue::Date(None) => {
                format!("{:<width$}", "-", width = width)
            }
            other => format!("{:<width$}", other.raw(), width = width),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Empty | CellValue::Date(None) => "-".to_string(),
            CellValue::Flag(true) => "**yes**".to_string(),
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%d %H:%M").to_string()
            }
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Get raw string value (no formatting, used for CSV and ids)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(s) | CellValue::Text(s) => s.clone(),
            CellValue::Closed(true) => "Closed".to_string(),
            CellValue::Closed(false) => "Open".to_string(),
            CellValue::Flag(true) => "yes".to_string(),
            CellValue::Flag(false) => "no".to_string(),
            CellValue::Date(date) => date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            CellValue::DateTime(dt) => {
                let local: DateTime<Local> = dt.with_timezone(&Local);
                local.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Get the display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Id(id) => format_short_id_str(id).len(),
            CellValue::Text(s) => s.chars().count(),
            CellValue::Closed(_) => 6,
            CellValue::Flag(_) => 3,
            CellValue::Date(_) => 10,
            CellValue::DateTime(_) => 19,
            CellValue::Number(n) => n.to_string().len(),
            CellValue::Empty => 1,
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Renders rows in the list output formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'a str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'a str) -> Self {
        Self {
            columns,
            entity_name,
            show_summary: true,
        }
    }

    /// Drop the trailing "N found" line (for piping)
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Print rows in the specified format
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) -> miette::Result<()> {
        print!("{}", self.render(rows, format)?);
        Ok(())
    }

    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> miette::Result<String> {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => Ok(self.render_md(rows)),
            OutputFormat::Id => Ok(rows.iter().map(|r| format!("{}\n", r.id)).collect()),
            _ => Ok(self.render_tsv(rows)),
        }
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);
                // +2 matches the truncation buffer in format_tsv
                col.header.len().max(max_content + 2).min(col.width)
            })
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.calculate_widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            let parts: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| match row.get(col.key) {
                    Some(value) => value.format_tsv(*w),
                    None => format!("{:<width$}", "-", width = *w),
                })
                .collect();
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) found.\n",
                style(rows.len()).cyan(),
                self.entity_name
            ));
        }
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> miette::Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["id"];
        header.extend(self.columns.iter().filter(|c| c.key != "id").map(|c| c.key));
        writer
            .write_record(&header)
            .map_err(|e| miette::miette!("CSV error: {}", e))?;

        for row in rows {
            let mut record = vec![row.id.clone()];
            record.extend(
                self.columns
                    .iter()
                    .filter(|c| c.key != "id")
                    .map(|c| row.get(c.key).map(CellValue::raw).unwrap_or_default()),
            );
            writer
                .write_record(&record)
                .map_err(|e| miette::miette!("CSV error: {}", e))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| miette::miette!("CSV error: {}", e))?;
        String::from_utf8(bytes).map_err(|e| miette::miette!("CSV error: {}", e))
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let headers: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        out.push_str(&format!("| {} |\n", headers.join(" | ")));
        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        out.push_str(&format!("|{}|\n", separators.join("|")));

        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|c| {
                    if c.key == "id" {
                        row.id.clone()
                    } else {
                        row.get(c.key)
                            .map(CellValue::format_md)
                            .unwrap_or_else(|| "-".to_string())
                    }
                })
                .collect();
            out.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("id", "ID", 18),
        ColumnDef::new("name", "NAME", 30),
        ColumnDef::new("closed", "STATUS", 8),
    ];

    fn rows() -> Vec<TableRow> {
        vec![
            TableRow::new("DMT-LR3K9F2-A8X3Q")
                .cell("id", CellValue::Id("DMT-LR3K9F2-A8X3Q".into()))
                .cell("name", CellValue::Text("Burr, on edge".into()))
                .cell("closed", CellValue::Closed(false)),
            TableRow::new("DMT-LR3K9F3-ZZZZZ")
                .cell("id", CellValue::Id("DMT-LR3K9F3-ZZZZZ".into()))
                .cell("name", CellValue::Text("a | b".into()))
                .cell("closed", CellValue::Closed(true)),
        ]
    }

    #[test]
    fn test_csv_quotes_commas() {
        let out = TableFormatter::new(COLUMNS, "record")
            .render(&rows(), OutputFormat::Csv)
            .unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("id,name,closed"));
        assert_eq!(lines.next(), Some("DMT-LR3K9F2-A8X3Q,\"Burr, on edge\",Open"));
        assert_eq!(lines.next(), Some("DMT-LR3K9F3-ZZZZZ,a | b,Closed"));
    }

    #[test]
    fn test_md_escapes_pipes() {
        let out = TableFormatter::new(COLUMNS, "record")
            .render(&rows(), OutputFormat::Md)
            .unwrap();
        assert!(out.starts_with("| ID | NAME | STATUS |\n|---|---|---|\n"));
        assert!(out.contains("a \\| b"));
    }

    #[test]
    fn test_id_format_is_bare() {
        let out = TableFormatter::new(COLUMNS, "record")
            .render(&rows(), OutputFormat::Id)
            .unwrap();
        assert_eq!(out, "DMT-LR3K9F2-A8X3Q\nDMT-LR3K9F3-ZZZZZ\n");
    }

    #[test]
    fn test_tsv_summary_toggle() {
        let with = TableFormatter::new(COLUMNS, "record")
            .render(&rows(), OutputFormat::Tsv)
            .unwrap();
        assert!(with.contains("record(s) found"));

        let without = TableFormatter::new(COLUMNS, "record")
            .without_summary()
            .render(&rows(), OutputFormat::Tsv)
            .unwrap();
        assert!(!without.contains("found"));
    }

    #[test]
    fn test_cell_raw_values() {
        assert_eq!(CellValue::Date(None).raw(), "");
        assert_eq!(
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 5, 1)).raw(),
            "2024-05-01"
        );
        assert_eq!(CellValue::Flag(true).raw(), "yes");
        assert!(matches!(CellValue::opt_text(Some("")), CellValue::Empty));
    }
}
