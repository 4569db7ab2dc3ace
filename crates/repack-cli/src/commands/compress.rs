//! Compress command implementation.

use super::Context;
use crate::cli::CompressArgs;
use crate::error::add_archive_context;
use anyhow::Result;
use repack_core::ArchiveTask;
use repack_core::CompressConfig;
use repack_core::Engine;
use repack_core::EngineConfig;
use repack_core::Operation;

pub fn execute(args: &CompressArgs, ctx: &Context<'_>) -> Result<()> {
    let config = EngineConfig::default().with_compress(
        CompressConfig::default()
            .with_compression_level(args.compression_level)
            .with_include_hidden(!args.exclude_hidden)
            .with_exclude_patterns(args.exclude.clone())
            .with_preserve_permissions(!args.no_permissions),
    );
    let engine = Engine::new(ctx.tools.clone(), config);
    let task = ArchiveTask::compress(&args.sources, &args.output).with_overwrite(args.force);

    let report = add_archive_context(ctx.run(&engine, &task), &args.output)?;
    ctx.formatter.format_operation_result(Operation::Compress, &report)
}
