use std::path::Path;

use super::CliContext;
use crate::error::CliError;

pub async fn run_import(ctx: &CliContext, input: &Path) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(input)?;
    let payload: serde_json::Value = serde_json::from_str(&raw)?;
    ctx.engine.import(payload).await?;
    ctx.flush()?;
    println!("Imported {}", input.display());
    Ok(())
}
