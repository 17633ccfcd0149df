use std::path::Path;

use anyhow::{Context, Result};

use daybook_core::service::DaybookService;

/// Write a JSON snapshot of every namespace to `output`, or stdout.
pub(crate) async fn cmd_export(svc: &DaybookService, output: Option<&Path>) -> Result<()> {
    let export = svc.export_all().await?;
    let body = serde_json::to_string_pretty(&export)?;

    match output {
        Some(path) => {
            std::fs::write(path, body)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            let total: usize = export.namespaces.values().map(Vec::len).sum();
            eprintln!("Exported {total} entities to {}", path.display());
        }
        None => println!("{body}"),
    }

    Ok(())
}
