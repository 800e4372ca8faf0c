use anyhow::{bail, Context, Result};

use lexis_lib::vocabulary::ReviewOutcome;

use crate::app::App;
use crate::OutputFormat;

pub fn run_review(
    app: &App,
    word_id: i64,
    outcome: ReviewOutcome,
    format: &OutputFormat,
    _use_color: bool,
) -> Result<()> {
    let updated = app
        .service
        .record_review(app.user_id, word_id, outcome)
        .with_context(|| format!("Failed to record review of word #{}", word_id))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "wordId": word_id,
                "outcome": outcome,
                "updated": updated,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if !updated {
                bail!("No word #{} in your vocabulary", word_id);
            }
            let verb = if outcome.is_success() { "remembered" } else { "forgotten" };
            println!("Word #{} marked as {}.", word_id, verb);
        }
    }

    Ok(())
}

pub fn run_retire(app: &App, word_id: i64, format: &OutputFormat, _use_color: bool) -> Result<()> {
    let retired = app
        .service
        .retire_word(word_id)
        .with_context(|| format!("Failed to retire word #{}", word_id))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "wordId": word_id,
                "retired": retired,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if !retired {
                bail!("No word #{} to retire", word_id);
            }
            println!("Word #{} retired; it will not come up for review again.", word_id);
        }
    }

    Ok(())
}
