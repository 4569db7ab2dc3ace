//! Human-readable output formatter with colors and styling.

use super::formatter::FormatSupport;
use super::formatter::OutputFormatter;
use super::formatter::format_size;
use anyhow::Result;
use console::Term;
use console::style;
use repack_core::ArchiveInfo;
use repack_core::Operation;
use repack_core::OperationReport;
use repack_core::ToolAvailability;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }

    fn headline(operation: Operation) -> &'static str {
        match operation {
            Operation::Extract => "Extraction complete",
            Operation::Compress => "Archive created",
            Operation::Convert => "Conversion complete",
        }
    }

    fn yes_no(value: bool) -> &'static str {
        if value { "yes" } else { "no" }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_operation_result(
        &self,
        operation: Operation,
        report: &OperationReport,
    ) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let headline = Self::headline(operation);
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {headline}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(headline);
        }

        let _ = self
            .term
            .write_line(&format!("  Output:      {}", report.output_path.display()));
        let _ = self.term.write_line(&format!(
            "  Entries:     {}",
            Self::format_number(report.entries_processed)
        ));
        let _ = self.term.write_line(&format!(
            "  Total size:  {}",
            format_size(report.bytes_processed)
        ));

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Duration:    {:?}", report.duration));
        }

        if report.has_warnings() {
            let _ = self.term.write_line("");
            if self.use_colors {
                let _ = self
                    .term
                    .write_line(&format!("{}", style("Warnings:").yellow().bold()));
            } else {
                let _ = self.term.write_line("Warnings:");
            }
            for warning in &report.warnings {
                let _ = self.term.write_line(&format!("  - {warning}"));
            }
        }

        Ok(())
    }

    fn format_archive_info(&self, info: &ArchiveInfo, long: bool) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let _ = self.term.write_line(&format!("{} ({})", info.name, info.format));
        let _ = self
            .term
            .write_line(&format!("  Path:        {}", info.path.display()));
        let _ = self
            .term
            .write_line(&format!("  Size:        {}", format_size(info.size)));
        let _ = self.term.write_line(&format!(
            "  Files:       {}",
            Self::format_number(info.total_files)
        ));
        let _ = self.term.write_line(&format!(
            "  Total size:  {}",
            format_size(info.total_size)
        ));

        if long {
            let _ = self.term.write_line("");
            for entry in &info.entries {
                let type_char = if entry.is_dir { "d" } else { "-" };
                let _ = self.term.write_line(&format!(
                    "{type_char} {:>10} {:>10}  {}",
                    format_size(entry.size),
                    format_size(entry.compressed_size),
                    entry.name
                ));
            }
        }

        Ok(())
    }

    fn format_formats(&self, formats: &[FormatSupport], tools: &ToolAvailability) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let _ = self.term.write_line("Format  Extension  Read  Write");
        for support in formats {
            let _ = self.term.write_line(&format!(
                "{:<7} .{:<9} {:<5} {}",
                support.format.to_string(),
                support.extension,
                Self::yes_no(support.read),
                Self::yes_no(support.write)
            ));
        }

        let _ = self.term.write_line("");
        for (name, path) in [("unar", tools.unar()), ("lsar", tools.lsar())] {
            let line = path.map_or_else(
                || format!("  {name}: not found"),
                |path| format!("  {name}: {}", path.display()),
            );
            let _ = self.term.write_line(&line);
        }
        if tools.unar().is_none() && self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} RAR extraction needs unar (brew install unar)",
                style("⚠").yellow().bold()
            ));
        } else if tools.unar().is_none() {
            let _ = self
                .term
                .write_line("WARNING: RAR extraction needs unar (brew install unar)");
        }

        Ok(())
    }
}
