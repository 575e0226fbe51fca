//! Normalization of submitted property fields

use serde::Deserialize;

use crate::error::CoreError;

/// Feature tags as submitted: a list, or one comma-separated string
///
/// `null` entries in a list are accepted and dropped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeaturesInput {
    List(Vec<Option<String>>),
    Csv(String),
}

/// Trim every tag and drop the empty ones, keeping order
pub fn normalize_features(input: &FeaturesInput) -> Vec<String> {
    let tags: Box<dyn Iterator<Item = &str>> = match input {
        FeaturesInput::List(items) => Box::new(items.iter().filter_map(|item| item.as_deref())),
        FeaturesInput::Csv(text) => Box::new(text.split(',')),
    };
    tags.map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a monetary amount
///
/// Blank input means "not set" and yields `Ok(None)`, never zero.
pub fn parse_amount(field: &'static str, raw: &str) -> Result<Option<f64>, CoreError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value: f64 = raw.parse().map_err(|_| CoreError::NotANumber { field })?;
    if !value.is_finite() {
        return Err(CoreError::NotANumber { field });
    }
    if value < 0.0 {
        return Err(CoreError::Negative { field });
    }
    Ok(Some(value))
}

/// Public reference for a stored image
///
/// Absolute URLs pass through. Paths under an `uploads` directory become
/// root-relative `/uploads/...` paths. Otherwise the bare filename is
/// served from `/uploads`. Returns `None` when nothing usable is known.
pub fn image_reference(path: Option<&str>, filename: Option<&str>) -> Option<String> {
    if let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }

        let normalized = path.replace('\\', "/");
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
        if let Some(pos) = segments.iter().rposition(|s| *s == "uploads") {
            let rest = &segments[pos + 1..];
            if !rest.is_empty() {
                return Some(format!("/uploads/{}", rest.join("/")));
            }
        }
    }

    filename
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| format!("/uploads/{f}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_from_csv() {
        let input = FeaturesInput::Csv("a, b ,,c".to_string());
        assert_eq!(normalize_features(&input), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_features_from_list() {
        let input = FeaturesInput::List(vec![
            Some("x ".to_string()),
            Some("".to_string()),
            None,
            Some("y".to_string()),
        ]);
        assert_eq!(normalize_features(&input), vec!["x", "y"]);
    }

    #[test]
    fn test_features_deserialize_either_shape() {
        let list: FeaturesInput = serde_json::from_str(r#"["wifi","parking"]"#).unwrap();
        assert_eq!(normalize_features(&list), vec!["wifi", "parking"]);
        let csv: FeaturesInput = serde_json::from_str(r#""wifi, parking""#).unwrap();
        assert_eq!(normalize_features(&csv), vec!["wifi", "parking"]);
        let with_null: FeaturesInput = serde_json::from_str(r#"["a", null, " b "]"#).unwrap();
        assert_eq!(normalize_features(&with_null), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("rent", "1500").unwrap(), Some(1500.0));
        assert_eq!(parse_amount("rent", " 99.5 ").unwrap(), Some(99.5));
        assert_eq!(parse_amount("deposit", "").unwrap(), None);
        assert_eq!(parse_amount("deposit", "0").unwrap(), Some(0.0));
        assert_eq!(
            parse_amount("rent", "cheap"),
            Err(CoreError::NotANumber { field: "rent" })
        );
        assert_eq!(
            parse_amount("rent", "NaN"),
            Err(CoreError::NotANumber { field: "rent" })
        );
        assert_eq!(
            parse_amount("deposit", "-1"),
            Err(CoreError::Negative { field: "deposit" })
        );
    }

    #[test]
    fn test_image_reference_rules() {
        assert_eq!(
            image_reference(Some("https://cdn.example.com/a.jpg"), Some("a.jpg")).as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
        assert_eq!(
            image_reference(Some("/srv/app/uploads/a.jpg"), None).as_deref(),
            Some("/uploads/a.jpg")
        );
        assert_eq!(
            image_reference(Some(r"C:\app\uploads\b.png"), None).as_deref(),
            Some("/uploads/b.png")
        );
        assert_eq!(
            image_reference(Some("/tmp/other/c.png"), Some("c.png")).as_deref(),
            Some("/uploads/c.png")
        );
        assert_eq!(image_reference(Some("/tmp/other/c.png"), None), None);
        assert_eq!(image_reference(None, None), None);
    }
}
