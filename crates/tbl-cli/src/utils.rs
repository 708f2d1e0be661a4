//! Shared utilities

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// Running cost as shown to the student
pub fn format_cost(cost: f64) -> String {
    format!("${:.5}", cost)
}

/// Rates as shown next to a model name
pub fn format_rates(rates: &tbl_ai::CostInfo) -> String {
    format!("${:.2} / ${:.2} per 1M tokens", rates.input, rates.output)
}

/// Token and cost line printed after each reply in line mode
pub fn format_turn_summary(usage: &tbl_ai::Usage, cost: f64, total_cost: f64) -> String {
    format!(
        "[{} tokens ({} in / {} out), {} | total {}]",
        usage.total(),
        usage.prompt_tokens,
        usage.completion_tokens,
        format_cost(cost),
        format_cost(total_cost)
    )
}
