/// Bounds on the size of any single tool result.
///
/// Tool-set-wide constants rather than per-call configuration, so the model
/// sees the same behavior on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputLimits {
    pub max_lines: usize,
    pub max_bytes: usize,
}

/// Default budget: roughly one screenful of context per tool call.
pub const DEFAULT_LIMITS: OutputLimits = OutputLimits {
    max_lines: 200,
    max_bytes: 16 * 1024,
};

/// Truncate `text` to the configured budget: lines first, then bytes.
///
/// When either limit was hit, a single trailing marker line is appended
/// *after* the budget, naming the truncation and pointing at narrower
/// queries. Input already within bounds is returned unchanged.
pub fn clamp(text: &str, limits: OutputLimits) -> String {
    let over_lines = text.lines().count() > limits.max_lines;
    let over_bytes = text.len() > limits.max_bytes;
    if !over_lines && !over_bytes {
        return text.to_string();
    }

    let mut out = if over_lines {
        text.lines()
            .take(limits.max_lines)
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        text.to_string()
    };

    if out.len() > limits.max_bytes {
        let mut cut = limits.max_bytes;
        while cut > 0 && !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
    }

    out.push_str(&format!(
        "\n[output truncated at {} lines / {} bytes; request a narrower range or use search_code for targeted context]",
        limits.max_lines, limits.max_bytes
    ));
    out
}
