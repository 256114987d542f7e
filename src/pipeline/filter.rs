use super::{AttributeValue, Operation, ResultSet};

/// Post-filter over a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    /// Keep only boolean results equal to the target.
    Is(bool),
}

impl Filter {
    /// `all`, or one of the command's two labels (case-insensitive).
    pub fn from_label(op: Operation, label: &str) -> Result<Self, String> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("all") { return Ok(Filter::All); }
        match op.labels() {
            Some((yes, _)) if label.eq_ignore_ascii_case(yes) => Ok(Filter::Is(true)),
            Some((_, no)) if label.eq_ignore_ascii_case(no) => Ok(Filter::Is(false)),
            Some((yes, no)) => Err(format!(
                "invalid filter '{}' for {}: expected all, {}, or {}",
                label, op.name(), yes.to_lowercase(), no.to_lowercase()
            )),
            None => Err(format!("{} does not support filtering", op.name())),
        }
    }
}

/// Error entries never survive a non-`All` filter.
pub fn apply(mut results: ResultSet, filter: Filter) -> ResultSet {
    if let Filter::Is(target) = filter {
        results.retain(|_, v| matches!(v, AttributeValue::Flag(b) if *b == target));
    }
    results
}
