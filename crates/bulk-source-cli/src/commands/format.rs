use bulk_source::{BulkOperation, Feedback};

const LINE_BUDGET: usize = 90;

/// Print feedback items to stderr.
pub fn print_feedback(feedback: &[Feedback]) {
    for item in feedback {
        eprintln!("{item}");
    }
}

/// Multi-line description of a bulk operation.
pub fn describe_operation(op: &BulkOperation) -> String {
    let mut lines = vec![
        format!("Id:           {}", op.id),
        format!("Status:       {}", op.status),
        format!("Object count: {}", op.object_count),
    ];
    if let Some(code) = &op.error_code {
        lines.push(format!("Error code:   {code}"));
    }
    if let Some(url) = &op.url {
        lines.push(format!("Result url:   {url}"));
    }
    lines.join("\n")
}

/// Query collapsed onto one line and cut to fit next to `name_width`.
pub fn query_preview(query: &str, name_width: usize) -> String {
    let compact = query.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&compact, LINE_BUDGET.saturating_sub(2 + name_width + 2))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{truncated}…")
    }
}
