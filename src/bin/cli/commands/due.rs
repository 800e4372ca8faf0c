use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, progress_bar, rule, status_color, truncate, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let due = app
        .service
        .get_due_words(app.user_id)
        .context("Failed to list due words")?;
    let cards: Vec<_> = due.iter().map(|entry| app.service.review_card(entry)).collect();

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = due
                .iter()
                .zip(&cards)
                .map(|(entry, card)| {
                    serde_json::json!({
                        "id": entry.id,
                        "word": entry.word,
                        "context": entry.context,
                        "meaning": entry.meaning,
                        "reviewStatus": entry.review_status,
                        "nextReviewAt": entry.next_review_at,
                        "progressPercent": card.progress_percent,
                        "countdown": card.countdown,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if due.is_empty() {
                println!("Nothing due for review.");
                return Ok(());
            }

            let id_width = 6;
            let word_width = due.iter().map(|e| e.word.chars().count()).max().unwrap_or(4).clamp(4, 24);
            let status_width = 8;
            let bar_width = 12;
            let when_width = 20;

            println!(
                "{:<iw$} {:<ww$} {:<sw$} {:<bw$} {}",
                "ID", "Word", "Status", "Progress", "When",
                iw = id_width, ww = word_width, sw = status_width, bw = bar_width
            );
            println!("{}", rule(&[id_width, word_width, status_width, bar_width, when_width]));

            for (entry, card) in due.iter().zip(&cards) {
                let status = format!("{:<width$}", entry.review_status.as_str(), width = status_width);
                let when = if card.progress_percent == 100 {
                    paint(&card.countdown, Color::RED, use_color)
                } else {
                    card.countdown.clone()
                };
                println!(
                    "{:<iw$} {:<ww$} {} {} {}",
                    entry.id,
                    truncate(&entry.word, word_width),
                    paint(&status, status_color(entry.review_status), use_color),
                    progress_bar(card.progress_percent, bar_width - 2),
                    when,
                    iw = id_width,
                    ww = word_width,
                );
            }

            println!("\n{} words due", due.len());
        }
    }

    Ok(())
}
