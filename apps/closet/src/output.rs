use closet_core::{MessageLog, PipelineResult, Severity};
use closet_journal::{MessageCounts, RunRecord, RunTimer};
use colored::Colorize;

pub fn print_messages(messages: &MessageLog) {
    for message in messages {
        let tag = match message.severity {
            Severity::Error => "ERROR".red(),
            Severity::Warning => "WARN".yellow(),
            Severity::Info => "INFO".blue(),
        };
        println!("{tag} {message}");
    }
}

pub fn counts(messages: &MessageLog) -> MessageCounts {
    MessageCounts {
        errors: messages.count(Severity::Error),
        warnings: messages.count(Severity::Warning),
        info: messages.count(Severity::Info),
    }
}

pub fn print_summary(result: &PipelineResult) {
    let summary = if result.has_error {
        result.summary.red()
    } else {
        result.summary.green()
    };
    println!("{summary}");
}

/// Fields of a journal line that every command fills the same way.
pub struct JournalEntry<'a> {
    pub command: &'a str,
    pub scene: &'a str,
    pub avatar: &'a str,
    pub dry_run: bool,
}

impl JournalEntry<'_> {
    pub fn record(&self, timer: &RunTimer, result: &PipelineResult) -> RunRecord {
        let (completed_at, duration_ms) = timer.finish();
        RunRecord {
            run_id: timer.run_id.clone(),
            command: self.command.to_string(),
            started_at: timer.started_at,
            completed_at,
            duration_ms,
            scene: self.scene.to_string(),
            avatar: self.avatar.to_string(),
            status: result.summary.clone(),
            applied: result.applied,
            repaired: result.repaired,
            has_error: result.has_error,
            counts: counts(&result.messages),
            messages: serde_json::to_value(&result.messages).unwrap_or_default(),
            dry_run: self.dry_run,
        }
    }
}
