//! Formats command implementation.

use super::Context;
use crate::output::FormatSupport;
use anyhow::Result;
use repack_core::ArchiveFormat;
use repack_core::Engine;
use repack_core::EngineConfig;

pub fn execute(ctx: &Context<'_>) -> Result<()> {
    let engine = Engine::new(ctx.tools.clone(), EngineConfig::default());
    let formats: Vec<FormatSupport> = ArchiveFormat::ALL
        .into_iter()
        .map(|format| FormatSupport {
            format,
            extension: format.extension(),
            read: engine.supports_format(format, false),
            write: engine.supports_format(format, true),
        })
        .collect();
    ctx.formatter.format_formats(&formats, ctx.tools)
}
