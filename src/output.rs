//! @ai:module:intent Format outcomes, summaries and chunk plans for the terminal
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_record, format_summary, format_plan
//! @ai:module:depends_on report, chunk
//! @ai:module:stateless true

use crate::chunk::Chunk;
use crate::report::{OutcomeRecord, RunStats};
use colored::Colorize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format one outcome record
/// @ai:effects pure
pub fn format_record(record: &OutcomeRecord, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(record).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(record).unwrap_or_default(),
        OutputFormat::Text => format_record_text(record),
    }
}

fn format_record_text(record: &OutcomeRecord) -> String {
    match record {
        OutcomeRecord::Success { id, body } => {
            format!("{} {} {}", "OK".green().bold(), id, body.to_string().dimmed())
        }
        OutcomeRecord::Error {
            kind,
            message,
            payload,
            ..
        } => {
            let mut line = format!(
                "{} {} {}",
                "ERROR".red().bold(),
                message,
                format!("({})", kind).dimmed()
            );
            if let Some(payload) = payload {
                line.push_str(&format!("\n  {} {}", "payload:".cyan(), payload));
            }
            line
        }
    }
}

/// @ai:intent Format end-of-run counters
/// @ai:effects pure
pub fn format_summary(stats: &RunStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(stats).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(stats).unwrap_or_default(),
        OutputFormat::Text => format_summary_text(stats),
    }
}

fn format_summary_text(stats: &RunStats) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\nSent {} batches for {} requests in {}ms",
        stats.batches_sent, stats.requested, stats.elapsed_ms
    ));
    if stats.throttle_rounds > 0 {
        output.push_str(&format!(
            " ({} throttled responses, {} retry rounds)",
            stats.throttled.to_string().yellow(),
            stats.throttle_rounds
        ));
    }
    output.push('\n');

    let errors = stats.failed + stats.transport_errors;
    if errors > 0 {
        output.push_str(&format!(
            "{} succeeded, {} failed, {} transport errors\n",
            stats.succeeded.to_string().green(),
            stats.failed.to_string().red().bold(),
            stats.transport_errors.to_string().red().bold()
        ));
    } else {
        output.push_str(&format!(
            "{} {} succeeded\n",
            "OK".green().bold(),
            stats.succeeded
        ));
    }

    output
}

/// @ai:intent Describe how requests will be split, without sending anything
/// @ai:effects pure
pub fn format_plan(chunks: &[Chunk], format: OutputFormat) -> String {
    let plan: Vec<Vec<&str>> = chunks.iter().map(Chunk::ids).collect();

    match format {
        OutputFormat::Json => serde_json::to_string(&plan).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&plan).unwrap_or_default(),
        OutputFormat::Text => {
            let mut output = String::new();
            for chunk in chunks {
                output.push_str(&format!(
                    "{} {} ({} requests): {}\n",
                    "batch".bold(),
                    chunk.index + 1,
                    chunk.len(),
                    chunk.ids().join(", ")
                ));
            }
            output.push_str(&format!(
                "{} batches, {} requests\n",
                chunks.len(),
                chunks.iter().map(Chunk::len).sum::<usize>()
            ));
            output
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_requests;
    use crate::request::RequestItem;
    use serde_json::json;

    #[test]
    fn test_json_record_is_single_line() {
        let record = OutcomeRecord::Success {
            id: "1".to_string(),
            body: json!({"displayName": "Megan"}),
        };

        let line = format_record(&record, OutputFormat::Json);
        assert!(!line.contains('\n'));
        assert!(line.contains(r#""outcome":"success""#));
    }

    #[test]
    fn test_transport_error_shows_payload() {
        colored::control::set_override(false);
        let record = OutcomeRecord::Error {
            kind: "transport".to_string(),
            ids: vec!["1".to_string()],
            status: None,
            message: "Batch submission failed: offline".to_string(),
            payload: Some(r#"{"requests":[{"id":"1","method":"GET","url":"/me"}]}"#.to_string()),
        };

        let text = format_record(&record, OutputFormat::Text);
        assert!(text.contains(r#"payload: {"requests":[{"id":"1""#));

        let json = format_record(&record, OutputFormat::Json);
        assert!(json.contains(r#""payload":"{\"requests\""#));
    }

    #[test]
    fn test_text_summary_mentions_failures() {
        colored::control::set_override(false);
        let stats = RunStats {
            requested: 3,
            succeeded: 2,
            failed: 1,
            batches_sent: 1,
            ..Default::default()
        };

        let text = format_summary(&stats, OutputFormat::Text);
        assert!(text.contains("2 succeeded, 1 failed, 0 transport errors"));
    }

    #[test]
    fn test_plan_lists_ids_per_batch() {
        colored::control::set_override(false);
        let requests: Vec<RequestItem> = (1..=3)
            .map(|i| RequestItem::get(i.to_string(), "/me"))
            .collect();
        let chunks = chunk_requests(&requests, 2);

        assert_eq!(
            format_plan(&chunks, OutputFormat::Json),
            r#"[["1","2"],["3"]]"#
        );

        let text = format_plan(&chunks, OutputFormat::Text);
        assert!(text.contains("batch 2 (1 requests): 3"));
        assert!(text.contains("2 batches, 3 requests"));
    }
}
