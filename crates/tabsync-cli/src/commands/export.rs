use std::path::{Path, PathBuf};

use chrono::Utc;
use tabsync_core::codec::{export_file_name, render_json_export};

use super::CliContext;
use crate::error::CliError;

pub async fn run_export(
    ctx: &CliContext,
    select: Option<&[i64]>,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let data = match select {
        Some(selected_ids) => ctx.engine.export_selected(selected_ids).await?,
        None => ctx.engine.snapshot().await?,
    };
    if data.is_empty() {
        return Err(CliError::EmptyExport);
    }

    let rendered = render_json_export(&data)?;
    let path: PathBuf = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(export_file_name(Utc::now())),
    };
    std::fs::write(&path, rendered + "\n")?;
    println!("{}", path.display());
    Ok(())
}
