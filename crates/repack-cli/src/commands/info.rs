//! Info command implementation.

use super::Context;
use crate::cli::InfoArgs;
use crate::error::add_archive_context;
use anyhow::Result;
use repack_core::Engine;
use repack_core::EngineConfig;

pub fn execute(args: &InfoArgs, ctx: &Context<'_>) -> Result<()> {
    let engine = Engine::new(ctx.tools.clone(), EngineConfig::default());
    let info = add_archive_context(engine.inspect(&args.archive), &args.archive)?;
    ctx.formatter.format_archive_info(&info, args.long)
}
