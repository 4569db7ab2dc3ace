//! JSON output formatter for machine-readable results.

use super::formatter::FormatSupport;
use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use repack_core::ArchiveInfo;
use repack_core::Operation;
use repack_core::OperationReport;
use repack_core::ToolAvailability;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_operation_result(
        &self,
        operation: Operation,
        report: &OperationReport,
    ) -> Result<()> {
        Self::output(&JsonOutput::success(operation.as_str(), report))
    }

    fn format_archive_info(&self, info: &ArchiveInfo, _long: bool) -> Result<()> {
        Self::output(&JsonOutput::success("info", info))
    }

    fn format_formats(&self, formats: &[FormatSupport], tools: &ToolAvailability) -> Result<()> {
        #[derive(Serialize)]
        struct FormatsOutput<'a> {
            formats: &'a [FormatSupport],
            unar: Option<&'a Path>,
            lsar: Option<&'a Path>,
        }

        let data = FormatsOutput {
            formats,
            unar: tools.unar(),
            lsar: tools.lsar(),
        };
        Self::output(&JsonOutput::success("formats", data))
    }
}
