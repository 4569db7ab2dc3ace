//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap_complete::Shell;
use repack_core::ArchiveFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract archive contents
    Extract(ExtractArgs),
    /// Pack files and directories into a ZIP archive
    Compress(CompressArgs),
    /// Repack an archive into another format
    Convert(ConvertArgs),
    /// Show archive contents without extracting
    Info(InfoArgs),
    /// List supported formats and installed tools
    Formats,
    /// Generate shell completions
    Completion(CompletionArgs),
}

#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output directory (default: archive name next to the archive)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum directory depth of entry names
    #[arg(long, default_value = "32", value_parser = clap::value_parser!(u16).range(1..))]
    pub max_depth: u16,

    /// Preserve file permissions from archive
    #[arg(long)]
    pub preserve_permissions: bool,
}

#[derive(clap::Args)]
pub struct CompressArgs {
    /// Output archive file path
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Source files or directories to archive
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<PathBuf>,

    /// Compression level (0 stores, 1-9 deflate)
    #[arg(short = 'l', long, default_value = "6", value_parser = clap::value_parser!(u8).range(0..=9))]
    pub compression_level: u8,

    /// Skip hidden files inside source directories
    #[arg(long)]
    pub exclude_hidden: bool,

    /// Exclude pattern (glob, can be repeated)
    #[arg(long = "exclude", short = 'x', value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Do not store Unix permissions
    #[arg(long)]
    pub no_permissions: bool,

    /// Overwrite output file if exists
    #[arg(short = 'f', long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct ConvertArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Output archive (default: archive path with the target extension)
    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Target format
    #[arg(short = 't', long = "to", default_value = "zip", value_parser = parse_format)]
    pub target: ArchiveFormat,

    /// Overwrite output file if exists
    #[arg(short = 'f', long)]
    pub force: bool,
}

#[derive(clap::Args)]
pub struct InfoArgs {
    /// Path to the archive file
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// List every entry
    #[arg(short, long)]
    pub long: bool,
}

#[derive(clap::Args)]
pub struct CompletionArgs {
    /// Target shell
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

/// Parses a format name such as `zip` or `RAR`.
fn parse_format(s: &str) -> Result<ArchiveFormat, String> {
    ArchiveFormat::ALL
        .into_iter()
        .find(|format| format.extension().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("unknown format '{s}' (expected zip or rar)"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format("zip").unwrap(), ArchiveFormat::Zip);
        assert_eq!(parse_format("RAR").unwrap(), ArchiveFormat::Rar);
        assert!(parse_format("7z").is_err());
        assert!(parse_format("").is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compression_level_range() {
        assert!(Cli::try_parse_from(["repack", "compress", "-l", "10", "out.zip", "src"]).is_err());
        let cli = Cli::try_parse_from(["repack", "compress", "-l", "0", "out.zip", "src"]).unwrap();
        match cli.command {
            Commands::Compress(args) => assert_eq!(args.compression_level, 0),
            _ => panic!("expected compress"),
        }
    }
}
