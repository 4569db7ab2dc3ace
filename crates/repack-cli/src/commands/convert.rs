//! Convert command implementation.

use super::Context;
use crate::cli::ConvertArgs;
use crate::error::add_archive_context;
use anyhow::Result;
use repack_core::ArchiveTask;
use repack_core::Engine;
use repack_core::EngineConfig;
use repack_core::Operation;
use repack_core::default_output_path;

pub fn execute(args: &ConvertArgs, ctx: &Context<'_>) -> Result<()> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.archive, args.target));

    let engine = Engine::new(ctx.tools.clone(), EngineConfig::default());
    let task = ArchiveTask::convert(&args.archive, output, args.target).with_overwrite(args.force);

    let report = add_archive_context(ctx.run(&engine, &task), &args.archive)?;
    ctx.formatter.format_operation_result(Operation::Convert, &report)
}
