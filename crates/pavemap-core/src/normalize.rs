/// Canonical form used for every key comparison in the join.
///
/// Lowercases, drops spaces and both slash characters, and trims. With
/// `numeric`, a value that parses as a finite float is re-rendered so that
/// `"12.0"` and `"12"` compare equal.
pub fn normalize(value: Option<&str>, numeric: bool) -> String {
    let Some(value) = value else {
        return String::new();
    };

    let stripped: String = value
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '/' | '\\'))
        .collect();
    let text = stripped.trim().to_string();

    if numeric {
        if let Some(rendered) = render_number(&text) {
            return rendered;
        }
    }
    text
}

fn render_number(text: &str) -> Option<String> {
    let n: f64 = text.parse().ok()?;
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        // `as i64` also folds -0.0 into 0
        Some((n as i64).to_string())
    } else {
        Some(n.to_string())
    }
}
