use super::CliContext;
use crate::error::CliError;

pub async fn run_groups(ctx: &CliContext, json: bool) -> Result<(), CliError> {
    let snapshot = ctx.engine.snapshot().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    if snapshot.is_empty() {
        println!("No groups in the snapshot");
        return Ok(());
    }
    for (key, group) in &snapshot {
        let title = group.title.as_deref().unwrap_or("(untitled)");
        let operation = group
            .last_operation
            .map_or_else(|| "-".to_string(), |operation| operation.to_string());
        println!("{key}\t{title}\t{} tab(s)\t{operation}", group.tabs.len());
    }
    Ok(())
}
