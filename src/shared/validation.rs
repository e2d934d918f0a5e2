use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationErrors;

use crate::shared::types::FieldIssue;

lazy_static! {
    /// Leading integer of a query value, mirroring how browsers' `parseInt` reads it
    /// - "12" -> 12, "2abc" -> 2, " 7" -> 7, "5.9" -> 5
    /// - "abc", "" -> no match
    pub static ref LEADING_INT_REGEX: Regex = Regex::new(r"^\s*([+-]?\d+)").unwrap();

    /// Plain decimal number as submitted by a form field
    /// - Valid: "250.50", "0", "12.", ".5", "-3"
    /// - Invalid: "1e3", "12,5", "abc", ""
    pub static ref DECIMAL_REGEX: Regex = Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)$").unwrap();

    /// Syntactically valid image or video media type
    /// - Valid: "image/jpeg", "video/mp4", "image/svg+xml", "video/x-matroska"
    /// - Invalid: "application/pdf", "image/", "text/plain", "imagejpeg"
    pub static ref MEDIA_TYPE_REGEX: Regex =
        Regex::new(r"^(?i)(image|video)/[a-z0-9][a-z0-9!#$&^_.+-]*$").unwrap();
}

/// Parse the leading integer of a query value, `None` when there is none
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    LEADING_INT_REGEX
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// Parse a numeric path id such as `/api/businesses/{id}`
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Convert a Rust field name into the camelCase name used on the wire
pub fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper_next = false;
    for ch in field.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Flatten `validator` errors into field issues, ordered by field name
pub fn issues_from(errors: &ValidationErrors) -> Vec<FieldIssue> {
    let mut issues: Vec<FieldIssue> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = to_camel_case(field.as_ref());
            errs.iter()
                .map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    FieldIssue::new(field.clone(), e.code.to_string(), message)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    issues.sort_by(|a, b| a.field.cmp(&b.field));
    issues
}
