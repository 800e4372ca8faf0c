use anyhow::{Context, Result};

use lexis_lib::vocabulary::NewWord;

use crate::app::App;
use crate::commands::lookup::print_entry;
use crate::OutputFormat;

pub fn run(app: &App, new_word: NewWord, format: &OutputFormat, use_color: bool) -> Result<()> {
    let word = new_word.word.clone();
    let entry = app
        .service
        .add_word(app.user_id, new_word)
        .with_context(|| format!("Failed to add '{}'", word))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        OutputFormat::Plain => {
            println!("Saved \"{}\" to your vocabulary.\n", entry.word);
            print_entry(&entry, use_color);
        }
    }

    Ok(())
}
