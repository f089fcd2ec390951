use crate::{job::SyncOutcome, store::Fields};

/// One-line summary of a run for terminal output
pub fn format_outcome(outcome: Option<SyncOutcome>) -> String {
    match outcome {
        Some(SyncOutcome::Committed { written, skipped }) => format!(
            "{} video{} upserted, {} other result{} skipped",
            written,
            plural(written),
            skipped,
            plural(skipped)
        ),
        Some(SyncOutcome::NoItems) => "API returned no items, nothing written".to_string(),
        None => "sync failed, see logs".to_string(),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

fn field<'a>(fields: &'a Fields, key: &str) -> &'a str {
    fields.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

/// Format stored videos newest first, one block per video
pub fn format_videos_readable(documents: &[(String, Fields)]) -> String {
    let mut sorted: Vec<&(String, Fields)> = documents.iter().collect();
    // ISO-8601 in the same zone sorts lexicographically
    sorted.sort_by(|a, b| field(&b.1, "publishedAt").cmp(field(&a.1, "publishedAt")));

    let mut output = String::new();
    for (id, fields) in sorted {
        output.push_str(&format!(
            "[{}] {}  {}\n",
            field(fields, "publishedAt"),
            id,
            field(fields, "title")
        ));
        let thumbnail = field(fields, "thumbnailUrl");
        if !thumbnail.is_empty() {
            output.push_str(&format!("    {}\n", thumbnail));
        }
    }
    output
}
