//! Terminal rendering of the analysis report
//!
//! Pure presentation: every table is rendered from the literal data
//! structures the pipeline produced.

use crate::metrics::ConfusionMatrix;
use crate::pipeline::AnalysisReport;
use colored::*;

fn dim(s: &str) -> ColoredString {
    s.truecolor(110, 110, 110)
}

fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(60)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<28} {}", dim(key), val.white());
}

/// Print the whole report
pub fn render(report: &AnalysisReport) {
    section("Dataset");
    kv("records", &report.n_records.to_string());
    kv(
        "train / test",
        &format!("{} / {}", report.n_train, report.n_test),
    );
    kv(
        "positive outcome fraction",
        &format!("{:.3}", report.positive_fraction),
    );

    section("Predictors and missingness");
    println!(
        "  {:<24} {:>8} {:>10}   {}",
        dim("column"),
        dim("missing"),
        dim("mean"),
        dim("levels")
    );
    for summary in &report.column_summaries {
        let mean = summary
            .mean
            .map(|m| format!("{:.2}", m))
            .unwrap_or_else(|| "-".to_string());
        let levels = summary
            .levels
            .as_ref()
            .map(|l| l.join(", "))
            .unwrap_or_default();
        let missing = if summary.null_count > 0 {
            format!("{}", summary.null_count).yellow().to_string()
        } else {
            "0".to_string()
        };
        println!(
            "  {:<24} {:>8} {:>10}   {}",
            summary.name, missing, mean, levels
        );
    }

    section("Candidate screening (cross-validated ROC-AUC)");
    println!(
        "  {:<26} {:>10} {:>10}",
        dim("family"),
        dim("mean"),
        dim("std")
    );
    for entry in &report.comparison {
        println!(
            "  {:<26} {:>10.4} {:>10.4}",
            entry.spec.family(),
            entry.scores.mean,
            entry.scores.std
        );
    }

    section("Hyperparameter tuning (ranked)");
    println!(
        "  {:<6} {:<34} {:>10} {:>10}",
        dim("rank"),
        dim("combination"),
        dim("mean"),
        dim("std")
    );
    for (rank, entry) in report.tuning.iter().enumerate().take(10) {
        let line = format!(
            "  {:<6} {:<34} {:>10.4} {:>10.4}",
            rank + 1,
            entry.spec.to_string(),
            entry.scores.mean,
            entry.scores.std
        );
        if rank == 0 {
            println!("{}", line.white().bold());
        } else {
            println!("{}", line);
        }
    }
    if report.tuning.len() > 10 {
        println!("  {}", dim(&format!("… {} more", report.tuning.len() - 10)));
    }

    let final_report = &report.final_report;
    section("Final evaluation (held-out test subset)");
    kv("family", final_report.spec.family());
    kv("hyperparameters", &final_report.spec.to_string());
    kv("test ROC-AUC", &format!("{:.4}", final_report.test_auc));
    render_confusion(&final_report.confusion);

    if let Some(importances) = &final_report.feature_importances {
        section("Feature importances");
        let top = importances.iter().take(12);
        let max = importances.first().map(|(_, v)| *v).unwrap_or(1.0);
        for (name, value) in top {
            let width = if max > 0.0 {
                ((value / max) * 30.0).round() as usize
            } else {
                0
            };
            println!(
                "  {:<24} {:>7.4} {}",
                name,
                value,
                accent(&"▪".repeat(width))
            );
        }
    }

    section("Predictions");
    println!(
        "  {:<8} {:<10} {:<10} {}",
        dim("record"),
        dim("actual"),
        dim("predicted"),
        dim("p(poor recovery)")
    );
    for (i, prediction) in final_report.predictions.iter().enumerate() {
        let marker = if prediction.actual == prediction.predicted {
            " ".normal()
        } else {
            "✗".red()
        };
        println!(
            "  {:<8} {:<10} {:<10} {:.3}  {}",
            i + 1,
            prediction.actual,
            prediction.predicted,
            prediction.probability,
            marker
        );
    }
    println!();
}

fn render_confusion(confusion: &ConfusionMatrix) {
    kv("threshold", &format!("{}", confusion.threshold));
    println!();
    println!(
        "  {:<18} {:>12} {:>12}",
        "",
        dim("pred. poor"),
        dim("pred. good")
    );
    println!(
        "  {:<18} {:>12} {:>12}",
        dim("actual poor"),
        confusion.true_positives,
        confusion.false_negatives
    );
    println!(
        "  {:<18} {:>12} {:>12}",
        dim("actual good"),
        confusion.false_positives,
        confusion.true_negatives
    );
    println!();
    kv("accuracy", &format!("{:.4}", confusion.accuracy()));
    kv("sensitivity", &format!("{:.4}", confusion.sensitivity()));
    kv("specificity", &format!("{:.4}", confusion.specificity()));
}
