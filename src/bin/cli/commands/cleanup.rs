use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

/// Remove duplicate rows for the current user, or for everyone with `all_users`
pub fn run(app: &App, all_users: bool, format: &OutputFormat, _use_color: bool) -> Result<()> {
    let scope = if all_users { None } else { Some(app.user_id) };
    let deleted = app
        .service
        .cleanup_duplicates(scope)
        .context("Failed to remove duplicate words")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "deleted": deleted });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if deleted == 0 {
                println!("No duplicates found.");
            } else {
                println!("Removed {} duplicate {}.", deleted, if deleted == 1 { "row" } else { "rows" });
            }
        }
    }

    Ok(())
}
