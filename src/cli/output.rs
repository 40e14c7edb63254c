//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the ragcheck CLI,
//! including the evaluation report and comparison tables.

use owo_colors::OwoColorize;
use std::io::{self, Write};

use crate::eval::{Comparison, EvaluationReport};
use crate::types::RunRecord;

/// Width of the question column in the report table
const QUESTION_WIDTH: usize = 56;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the ragcheck banner
    pub fn banner(&self) {
        if self.colored {
            println!(
                "\n   {} {}\n",
                "ragcheck".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!("\n   ragcheck v{}\n", env!("CARGO_PKG_VERSION"));
        }
    }

    /// Print the colored or the plain rendering of one line
    fn emit(&self, colored: impl FnOnce() -> String, plain: impl FnOnce() -> String) {
        if self.colored {
            println!("{}", colored());
        } else {
            println!("{}", plain());
        }
    }

    pub fn success(&self, message: &str) {
        self.emit(
            || format!("  {} {}", "✓".green().bold(), message.green()),
            || format!("  [OK] {}", message),
        );
    }

    pub fn info(&self, message: &str) {
        self.emit(
            || format!("  {} {}", "•".blue(), message),
            || format!("  [INFO] {}", message),
        );
    }

    pub fn warning(&self, message: &str) {
        self.emit(
            || format!("  {} {}", "⚠".yellow().bold(), message.yellow()),
            || format!("  [WARN] {}", message),
        );
    }

    /// Errors go to stderr
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Progress through the numbered stages of a command
    pub fn step(&self, step_num: u32, total: u32, message: &str) {
        let counter = format!("[{}/{}]", step_num, total);
        self.emit(
            || format!("  {} {}", counter.dimmed(), message.bright_white()),
            || format!("  {} {}", counter, message),
        );
    }

    /// A file written by `init`; `reason` marks one left untouched
    pub fn file(&self, label: &str, path: &str, reason: Option<&str>) {
        match reason {
            None => self.emit(
                || format!("  {} {} {}", "✓".green().bold(), label.dimmed(), path.bright_white()),
                || format!("  [CREATED] {} {}", label, path),
            ),
            Some(reason) => self.emit(
                || format!("  {} {} {}", "○".yellow(), path.dimmed(), format!("({})", reason).yellow()),
                || format!("  [SKIPPED] {} ({})", path, reason),
            ),
        }
    }

    pub fn header(&self, title: &str) {
        self.emit(
            || format!("\n  {}", title.bright_white().bold().underline()),
            || format!("\n  === {} ===", title),
        );
    }

    pub fn subheader(&self, title: &str) {
        self.emit(
            || format!("\n  {}", title.cyan().bold()),
            || format!("\n  --- {} ---", title),
        );
    }

    pub fn kv(&self, key: &str, value: &str) {
        self.emit(
            || format!("    {}: {}", key.dimmed(), value.bright_white()),
            || format!("    {}: {}", key, value),
        );
    }

    pub fn list_item(&self, item: &str) {
        self.emit(
            || format!("    {} {}", "•".blue(), item),
            || format!("    - {}", item),
        );
    }

    pub fn hint(&self, message: &str) {
        self.emit(
            || format!("\n  {}", message.dimmed().italic()),
            || format!("\n  [TIP] {}", message),
        );
    }

    /// An instruction followed by the commands that carry it out
    pub fn suggest(&self, message: &str, commands: &[&str]) {
        self.newline();
        self.info(message);
        for cmd in commands {
            self.emit(
                || format!("     {}", format!("$ {}", cmd).bright_cyan()),
                || format!("     $ {}", cmd),
            );
        }
    }

    pub fn complete(&self, message: &str) {
        self.emit(
            || format!("\n  {}", message.bright_green().bold()),
            || format!("\n  [DONE] {}", message),
        );
    }

    /// Write one streamed text delta without a newline
    pub fn delta(&self, text: &str) {
        print!("{}", text);
        io::stdout().flush().ok();
    }

    /// Print a newline
    pub fn newline(&self) {
        println!();
    }

    /// Print one evaluation report: a row per example, then the totals
    pub fn report(&self, report: &EvaluationReport) {
        self.header(&format!("Project {}", report.project_name));
        self.kv("dataset", &report.dataset_name);
        self.kv("variant", report.variant.as_str());
        self.kv("generator", &report.generator_model);
        self.kv("grader", &report.grader_model);
        self.newline();

        for run in &report.runs {
            let question = truncate(&run.question, QUESTION_WIDTH);
            let line = format!(
                "{:>3}  {:<width$}  {:>6}ms",
                run.example_index,
                question,
                run.latency_ms(),
                width = QUESTION_WIDTH
            );
            let status = status_label(run);
            if self.colored {
                let status = match status {
                    "PASS" => status.green().bold().to_string(),
                    "FAIL" => status.red().bold().to_string(),
                    _ => status.yellow().bold().to_string(),
                };
                println!("    {}  {}", status, line);
            } else {
                println!("    {}  {}", status, line);
            }
            if let Some(error) = &run.error {
                if self.colored {
                    println!("          {}", error.dimmed());
                } else {
                    println!("          {}", error);
                }
            }
        }

        let s = &report.summary;
        let totals = format!(
            "{}/{} correct ({:.1}%), {} incorrect, {} ungraded, {} errors",
            s.passed,
            s.total,
            s.accuracy * 100.0,
            s.failed,
            s.ungraded,
            s.errors
        );
        self.newline();
        if self.colored {
            println!("    {}", totals.bright_white().bold());
        } else {
            println!("    {}", totals);
        }
    }

    /// Print the per-example differences between two reports
    pub fn comparison(&self, comparison: &Comparison) {
        self.header(&format!(
            "{} vs {}",
            comparison.baseline_project, comparison.candidate_project
        ));
        self.kv(
            "accuracy",
            &format!(
                "{:.1}% -> {:.1}%",
                comparison.baseline_accuracy * 100.0,
                comparison.candidate_accuracy * 100.0
            ),
        );

        if comparison.changes.is_empty() {
            self.info("No example changed its score");
            return;
        }

        for change in &comparison.changes {
            let line = format!(
                "{:>3}  {}  {} -> {}",
                change.example_index,
                truncate(&change.question, QUESTION_WIDTH),
                score_label(change.before),
                score_label(change.after)
            );
            match (self.colored, change.improved(), change.regressed()) {
                (true, true, _) => println!("    {} {}", "▲".green().bold(), line),
                (true, _, true) => println!("    {} {}", "▼".red().bold(), line),
                (true, false, false) => println!("    {} {}", "•".dimmed(), line),
                (false, true, _) => println!("    [+] {}", line),
                (false, _, true) => println!("    [-] {}", line),
                (false, false, false) => println!("    [=] {}", line),
            }
        }
        self.kv(
            "changed",
            &format!(
                "{} improved, {} regressed",
                comparison.improved(),
                comparison.regressed()
            ),
        );
        if comparison.unmatched > 0 {
            self.warning(&format!(
                "{} examples appear in only one report",
                comparison.unmatched
            ));
        }
    }
}

fn status_label(run: &RunRecord) -> &'static str {
    match run.score() {
        Some(score) if score >= 1.0 => "PASS",
        Some(_) => "FAIL",
        None if run.error.is_some() => "ERR ",
        None => "N/A ",
    }
}

fn score_label(score: Option<f64>) -> String {
    match score {
        Some(score) => format!("{:.0}", score),
        None => "-".to_string(),
    }
}

/// Cut `text` to at most `max` characters on one line
fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max && !text.contains('\n') {
        return line.to_string();
    }
    let cut: String = line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::PromptVariant;
    use crate::eval::{compare, ReportSummary};
    use crate::types::Feedback;
    use chrono::Utc;
    use uuid::Uuid;

    fn report(project: &str, scores: &[Option<f64>]) -> EvaluationReport {
        let now = Utc::now();
        let runs: Vec<RunRecord> = scores
            .iter()
            .enumerate()
            .map(|(i, score)| RunRecord {
                id: Uuid::new_v4(),
                example_id: format!("ex-{}", i),
                example_index: i,
                question: format!("What is feature number {}?", i),
                reference_answer: "ref".to_string(),
                answer: Some("answer".to_string()),
                sources: vec![],
                feedback: score.map(|s| Feedback {
                    key: "correctness".to_string(),
                    score: Some(s),
                    comment: None,
                }),
                error: score.is_none().then(|| "LLM error: timeout".to_string()),
                start_time: now,
                end_time: now,
            })
            .collect();
        EvaluationReport {
            project_name: project.to_string(),
            dataset_id: "ds".to_string(),
            dataset_name: "Retrieval QA Questions x".to_string(),
            variant: PromptVariant::Baseline,
            generator_model: "gpt-3.5-turbo-16k".to_string(),
            grader_model: "gpt-4".to_string(),
            started_at: now,
            finished_at: now,
            summary: ReportSummary::from_runs(&runs),
            runs,
        }
    }

    #[test]
    fn test_output_new() {
        assert!(Output::new().colored);
        assert!(!Output::no_color().colored);
        assert!(Output::default().colored);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("a much longer question", 10), "a much ...");
        assert_eq!(truncate("first\nsecond", 20), "first...");
    }

    #[test]
    fn test_labels() {
        assert_eq!(score_label(Some(1.0)), "1");
        assert_eq!(score_label(None), "-");
    }

    #[test]
    fn test_report_output_no_panic() {
        let a = report("baseline-1234abcd", &[Some(1.0), Some(0.0), None]);
        let b = report("strict-5678abcd", &[Some(1.0), Some(1.0), Some(1.0)]);
        let comparison = compare(&a, &b);

        for output in [Output::no_color(), Output::new()] {
            output.report(&a);
            output.comparison(&comparison);
            output.comparison(&compare(&a, &a));
        }
    }

    #[test]
    fn test_output_methods_no_panic() {
        let output = Output::no_color();

        output.banner();
        output.success("test success");
        output.info("test info");
        output.warning("test warning");
        output.error("test error");
        output.step(1, 3, "step message");
        output.file("config", "path/to/file", None);
        output.file("env", "path", Some("reason"));
        output.header("Test Header");
        output.subheader("Test Subheader");
        output.kv("key", "value");
        output.list_item("item");
        output.hint("hint message");
        output.suggest("Run it:", &["some command", "another command"]);
        output.complete("complete message");
        output.delta("partial");
        output.newline();
    }
}
