use super::CliContext;
use crate::error::CliError;

pub async fn run_push(ctx: &CliContext) -> Result<(), CliError> {
    let snapshot = ctx.engine.push().await?;
    println!("Pushed {} group(s) to the snapshot", snapshot.len());
    Ok(())
}

pub async fn run_pull(ctx: &CliContext) -> Result<(), CliError> {
    ctx.engine.pull().await?;
    ctx.flush()?;
    println!("Pulled the snapshot into the browser state");
    Ok(())
}

pub async fn run_merge(ctx: &CliContext) -> Result<(), CliError> {
    let merged = ctx.engine.merge().await?;
    println!("Merged snapshot now holds {} group(s)", merged.len());
    Ok(())
}
