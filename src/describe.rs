//! Text layout for diagnostic descriptions.

/// Renders a title line followed by right-aligned `key: value` rows.
pub(crate) fn describe(title: &str, rows: &[(String, String)]) -> String {
    let width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let mut out = String::from(title);
    for (key, value) in rows {
        out.push('\n');
        out.push_str(&format!("  {key:>width$}: {value}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_aligns_keys() {
        let rows = vec![
            ("area".to_string(), "105.4".to_string()),
            ("population".to_string(), "500".to_string()),
        ];
        assert_eq!(
            describe("#<Entity(Paris)>", &rows),
            "#<Entity(Paris)>\n        area: 105.4\n  population: 500"
        );
    }

    #[test]
    fn test_describe_without_rows() {
        assert_eq!(describe("title", &[]), "title");
    }
}
