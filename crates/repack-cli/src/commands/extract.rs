//! Extract command implementation.

use super::Context;
use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use anyhow::Result;
use repack_core::ArchiveTask;
use repack_core::Engine;
use repack_core::EngineConfig;
use repack_core::ExtractConfig;
use repack_core::Operation;
use repack_core::default_extract_dir;

pub fn execute(args: &ExtractArgs, ctx: &Context<'_>) -> Result<()> {
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_extract_dir(&args.archive));

    let config = EngineConfig::default().with_extract(
        ExtractConfig::default()
            .with_max_path_depth(usize::from(args.max_depth))
            .with_preserve_permissions(args.preserve_permissions),
    );
    let engine = Engine::new(ctx.tools.clone(), config);
    let task = ArchiveTask::extract(&args.archive, output_dir);

    let report = add_archive_context(ctx.run(&engine, &task), &args.archive)?;
    ctx.formatter.format_operation_result(Operation::Extract, &report)
}
