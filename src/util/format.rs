//! Display formatting shared by the job views.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

/// Render an integer with `,` between thousands groups.
#[must_use]
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Human-readable salary range. A zero bound counts as unset.
#[must_use]
pub fn format_salary(min: Option<u64>, max: Option<u64>) -> String {
    match (min.filter(|v| *v > 0), max.filter(|v| *v > 0)) {
        (None, None) => "Salary not specified".to_owned(),
        (Some(min), Some(max)) => format!("${} - ${}", group_thousands(min), group_thousands(max)),
        (Some(min), None) => format!("From ${}", group_thousands(min)),
        (None, Some(max)) => format!("Up to ${}", group_thousands(max)),
    }
}
