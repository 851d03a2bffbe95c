//! Terminal styling utilities for the run log

use std::path::Path;
use std::time::Duration;

use console::{style, Emoji};

use crate::pipeline::PipelineConfig;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static TREE: Emoji<'_, '_> = Emoji("🌲 ", "");
pub static DICE: Emoji<'_, '_> = Emoji("🎲 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static CLOCK: Emoji<'_, '_> = Emoji("⏱️  ", "");

/// Print the application banner with ASCII art
pub fn print_banner(version: &str) {
    let banner = r#"
    ███████╗██╗   ██╗██╗    ██╗   ██╗ █████╗
    ██╔════╝╚██╗ ██╔╝██║    ██║   ██║██╔══██╗
    ███████╗ ╚████╔╝ ██║    ██║   ██║███████║
    ╚════██║  ╚██╔╝  ██║    ╚██╗ ██╔╝██╔══██║
    ███████║   ██║   ███████╗╚████╔╝ ██║  ██║
    ╚══════╝   ╚═╝   ╚══════╝ ╚═══╝  ╚═╝  ╚═╝
    "#;

    println!();
    println!("{}", style(banner).green().bold());
    println!(
        "    {} {}",
        TREE,
        style("Random forests from synthetic data").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(config: &PipelineConfig) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);
    let depth = config
        .forest
        .max_depth
        .map_or_else(|| "unlimited".to_string(), |d| d.to_string());

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Samples:   {:<36}│",
        CHART,
        format!(
            "{} x {} ({} informative)",
            config.generator.n_samples, config.generator.n_features, config.generator.n_informative
        )
    );
    println!(
        "    │  {} Forest:    {:<36}│",
        TREE,
        format!("{} trees, depth {}", config.forest.n_estimators, depth)
    );
    println!(
        "    │  {} Seed:      {:<36}│",
        DICE, config.generator.seed
    );
    println!(
        "    │  {} Output:    {:<36}│",
        SAVE,
        truncate_path(&config.output.output_dir, 35)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Test size: {:<36}│",
        CHART,
        style(format!("{:.0}%", config.split.test_size * 100.0)).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {} {}",
        CLOCK,
        style(format!("Completed in {}", format_duration(elapsed))).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Sylva training complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!("      {} {}", style(count).yellow().bold(), description);
    }
}

/// `850ms`, `2.41s` or `1m 05s`
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", elapsed.as_millis())
    } else if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        let whole = elapsed.as_secs();
        format!("{}m {:02}s", whole / 60, whole % 60)
    }
}

// Helper functions

pub fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
