use anyhow::{Context, Result};

use lexis_lib::vocabulary::VocabularyEntry;

use crate::app::App;
use crate::render::terminal::{paint, rule, status_color, truncate, Color};
use crate::OutputFormat;

pub async fn run(
    app: &App,
    word: &str,
    context: Option<&str>,
    article_id: Option<i64>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let entry = app
        .service
        .lookup_word(word, context, app.user_id, article_id)
        .await
        .with_context(|| format!("Failed to look up '{}'", word))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        OutputFormat::Plain => print_entry(&entry, use_color),
    }

    Ok(())
}

pub async fn run_batch(
    app: &App,
    words: &[String],
    context: Option<&str>,
    article_id: Option<i64>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let entries = app
        .service
        .lookup_words(words, context, app.user_id, article_id)
        .await
        .context("Failed to look up words")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Plain => {
            if entries.is_empty() {
                println!("No words given.");
                return Ok(());
            }

            let word_width = entries.iter().map(|e| e.word.chars().count()).max().unwrap_or(4).clamp(4, 24);
            let status_width = 8;
            let meaning_width = 50;

            println!("{:<ww$} {:<sw$} {}", "Word", "Status", "Meaning", ww = word_width, sw = status_width);
            println!("{}", rule(&[word_width, status_width, meaning_width]));

            for entry in &entries {
                let status = format!("{:<width$}", entry.review_status.as_str(), width = status_width);
                println!(
                    "{:<ww$} {} {}",
                    truncate(&entry.word, word_width),
                    paint(&status, status_color(entry.review_status), use_color),
                    truncate(&entry.meaning, meaning_width),
                    ww = word_width,
                );
            }

            let cached = entries.iter().filter(|e| e.is_persisted()).count();
            println!("\n{} words, {} from your vocabulary", entries.len(), cached);
        }
    }

    Ok(())
}

/// Full view of one entry
pub fn print_entry(entry: &VocabularyEntry, use_color: bool) {
    let heading = match &entry.phonetic {
        Some(phonetic) => format!("{} {}", entry.word, phonetic),
        None => entry.word.clone(),
    };
    println!("{}", paint(&heading, Color::BOLD, use_color));
    println!("  {}", entry.meaning);
    if !entry.example.is_empty() {
        println!("  {}", paint(&entry.example, Color::DIM, use_color));
    }
    println!();

    let status = paint(entry.review_status.as_str(), status_color(entry.review_status), use_color);
    println!("  Context:     {}", entry.context);
    println!("  Status:      {}", status);
    if let Some(difficulty) = &entry.difficulty {
        println!("  Difficulty:  {}", difficulty);
    }
    println!("  Source:      {}", entry.source);
    if entry.is_persisted() {
        println!("  ID:          {}", entry.id);
        println!("  Next review: {}", entry.next_review_at);
    } else {
        println!("  {}", paint("(not saved yet)", Color::DIM, use_color));
    }
}
