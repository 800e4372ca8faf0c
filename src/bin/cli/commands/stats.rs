use anyhow::{Context, Result};

use lexis_lib::vocabulary::ReviewStatus;

use crate::app::App;
use crate::render::terminal::{paint, rule, status_color, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let stats = app
        .service
        .get_stats(app.user_id)
        .context("Failed to load vocabulary stats")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            println!("{}", paint("Vocabulary", Color::BOLD, use_color));
            println!("  Total words:   {}", stats.total_words);
            println!("  From AI:       {}", stats.ai_words);
            println!("  Added locally: {}", stats.local_words);
            println!("  Due now:       {}", stats.due_words);
            println!();

            println!("{}", paint("Status", Color::BOLD, use_color));
            for status in ReviewStatus::ALL {
                let label = format!("{:<9}", status.as_str());
                println!(
                    "  {} {}",
                    paint(&label, status_color(status), use_color),
                    stats.status_distribution.get(status)
                );
            }
            println!();

            println!("{}", paint("Reviews", Color::BOLD, use_color));
            println!("  Reviewed:      {}", stats.reviewed_words);
            println!("  Remembered:    {}", stats.successful_words);
            println!("  Success rate:  {:.1}%", stats.success_rate * 100.0);
            println!();

            println!("{}", paint("Added", Color::BOLD, use_color));
            println!("  Today:         {}", stats.added_today);
            println!("  This week:     {}", stats.added_this_week);
            println!("  This month:    {}", stats.added_this_month);
        }
    }

    Ok(())
}

pub fn run_growth(app: &App, days: u32, format: &OutputFormat, use_color: bool) -> Result<()> {
    let curve = app
        .service
        .get_growth_curve(app.user_id, days)
        .context("Failed to load growth curve")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "dates": curve.labels(),
                "counts": curve.counts(),
                "totalWords": curve.total_words,
                "weeklyNewWords": curve.weekly_new_words,
                "dailyAverage": curve.daily_average,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let max = curve.points.iter().map(|p| p.count).max().unwrap_or(0);
            let bar_width = 40;

            println!("{:<5} {:>5} ", "Date", "Added");
            println!("{}", rule(&[5, 5, bar_width]));
            for (label, point) in curve.labels().iter().zip(&curve.points) {
                let len = if max == 0 {
                    0
                } else {
                    (point.count * bar_width as u64 / max) as usize
                };
                println!(
                    "{:<5} {:>5} {}",
                    label,
                    point.count,
                    paint(&"\u{2588}".repeat(len), Color::GREEN, use_color)
                );
            }

            println!(
                "\n{} words total, {} this week ({:.1} per day)",
                curve.total_words, curve.weekly_new_words, curve.daily_average
            );
        }
    }

    Ok(())
}
