//! End-of-run summary tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{ClassScores, RunOutcome};
use crate::utils::format_duration;

/// Number of features listed in the importance table
const TOP_FEATURES: usize = 5;

/// Summary of one training run
#[derive(Debug)]
pub struct TrainingSummary<'a> {
    outcome: &'a RunOutcome,
}

impl<'a> TrainingSummary<'a> {
    pub fn new(outcome: &'a RunOutcome) -> Self {
        Self { outcome }
    }

    /// Per-class precision/recall/F1 plus the two averages
    pub fn metrics_table(&self) -> Table {
        let report = &self.outcome.metrics.classification_report;

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Class").add_attribute(Attribute::Bold),
            Cell::new("Precision").add_attribute(Attribute::Bold),
            Cell::new("Recall").add_attribute(Attribute::Bold),
            Cell::new("F1").add_attribute(Attribute::Bold),
            Cell::new("Support").add_attribute(Attribute::Bold),
        ]);

        for (label, scores) in &report.classes {
            table.add_row(score_row(label, scores, None));
        }
        table.add_row(score_row("macro avg", &report.macro_avg, Some(Color::Cyan)));
        table.add_row(score_row(
            "weighted avg",
            &report.weighted_avg,
            Some(Color::Cyan),
        ));
        table
    }

    /// Run overview: sizes, accuracy and stage timings
    pub fn overview_table(&self) -> Table {
        let outcome = self.outcome;
        let accuracy = outcome.metrics.accuracy;
        let accuracy_color = if accuracy >= 0.9 {
            Color::Green
        } else if accuracy >= 0.7 {
            Color::Yellow
        } else {
            Color::Red
        };

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📚 Training Rows"), Cell::new(outcome.n_train)]);
        table.add_row(vec![Cell::new("🧪 Test Rows"), Cell::new(outcome.n_test)]);
        table.add_row(vec![
            Cell::new("🎯 Accuracy"),
            Cell::new(format!("{:.4}", accuracy))
                .fg(accuracy_color)
                .add_attribute(Attribute::Bold),
        ]);

        let timings = &outcome.timings;
        for (label, elapsed) in [
            ("⏱️  Generate", timings.generate),
            ("⏱️  Preprocess", timings.preprocess),
            ("⏱️  Train", timings.train),
            ("⏱️  Evaluate", timings.evaluate),
            ("⏱️  Save", timings.persist),
        ] {
            table.add_row(vec![Cell::new(label), Cell::new(format_duration(elapsed))]);
        }
        table.add_row(vec![
            Cell::new("⏱️  Total"),
            Cell::new(format_duration(timings.total())).add_attribute(Attribute::Bold),
        ]);
        table
    }

    /// The most important features, highest first
    pub fn top_features(&self) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> = self
            .outcome
            .feature_importances
            .iter()
            .copied()
            .enumerate()
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(TOP_FEATURES);
        ranked
    }

    pub fn display(&self) {
        print_section("📋", "TRAINING SUMMARY");
        print_indented(&self.overview_table());

        print_section("📈", "CLASSIFICATION REPORT");
        print_indented(&self.metrics_table());

        let top = self.top_features();
        if !top.is_empty() {
            print_section("🌲", "TOP FEATURES");
            for (index, importance) in top {
                println!(
                    "      {} feature_{:<4} {}",
                    style("•").dim(),
                    index,
                    style(format!("{:.4}", importance)).yellow()
                );
            }
        }

        print_section("💾", "ARTIFACTS");
        for path in self.outcome.artifacts.iter() {
            println!("      {} {}", style("•").dim(), path.display());
        }
    }
}

fn score_row(label: &str, scores: &ClassScores, color: Option<Color>) -> Vec<Cell> {
    let mut name = Cell::new(label);
    if let Some(color) = color {
        name = name.fg(color);
    }
    vec![
        name,
        number_cell(scores.precision),
        number_cell(scores.recall),
        number_cell(scores.f1_score),
        Cell::new(scores.support).set_alignment(CellAlignment::Right),
    ]
}

fn number_cell(value: f64) -> Cell {
    Cell::new(format!("{:.4}", value)).set_alignment(CellAlignment::Right)
}

fn print_section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

// Indent the table
fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}
