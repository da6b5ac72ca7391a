//! Terminal styling utilities

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static DICE: Emoji<'_, '_> = Emoji("🎲 ", "");
pub static RECIPE: Emoji<'_, '_> = Emoji("🧾 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("churnprep").cyan().bold(),
        style(format!("v{}", version)).dim()
    );
    println!(
        "    {}",
        style("Leakage-free feature preparation for churn models").dim()
    );
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Settings shown in the prepare configuration card
pub struct PrepareCard<'a> {
    pub input: &'a Path,
    pub recipe: Option<&'a Path>,
    pub outcome: &'a str,
    pub positive: &'a str,
    pub train_output: &'a Path,
    pub test_output: &'a Path,
    pub train_fraction: f64,
    pub seed: u64,
}

/// Print configuration card
pub fn print_config(card: &PrepareCard<'_>) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!("    │ {:<width$}│", style("⚙️  Configuration").cyan().bold(), width = box_width - 3);
    println!("    ├{}┤", line);
    println!(
        "    │  {}Input:   {:<40}│",
        FOLDER,
        truncate_path(card.input, 40)
    );
    println!(
        "    │  {}Recipe:  {:<40}│",
        RECIPE,
        card.recipe
            .map(|p| truncate_path(p, 40))
            .unwrap_or_else(|| "built-in churn recipe".to_string())
    );
    println!(
        "    │  {}Outcome: {:<40}│",
        TARGET,
        truncate_string(&format!("{} = '{}'", card.outcome, card.positive), 40)
    );
    println!(
        "    │  {}Train:   {:<40}│",
        SAVE,
        truncate_path(card.train_output, 40)
    );
    println!(
        "    │  {}Test:    {:<40}│",
        SAVE,
        truncate_path(card.test_output, 40)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {}Train fraction {:<7} seed {:<16}│",
        DICE,
        format!("{:.2}", card.train_fraction),
        card.seed
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
    println!("    {}{}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("    {}{}", WARN, style(message).yellow());
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion(message: &str) {
    println!();
    println!("    {}{}", ROCKET, style(message).green().bold());
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    match detail {
        Some(info) => println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        ),
        None => println!("      Found {} {}", style(count).yellow().bold(), description),
    }
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    truncate_string(&path.display().to_string(), max_len)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate_string("Churn", 10), "Churn");
    }

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate_string("data/telco_churn.csv", 10), "...urn.csv");
        assert_eq!(truncate_string("data/telco_churn.csv", 10).chars().count(), 10);
    }
}
