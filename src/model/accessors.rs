//! Safe accessors: the single place where missing or malformed CMS fields
//! become display-safe values. None of these functions panic or return errors.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use url::Url;

use super::media::{ImageUrlBuilder, MediaReference};

const DATE_FORMAT: &str = "%A, %B %-d, %Y";
const TIME_FORMAT: &str = "%-I:%M %p";

/// Characters left as-is in `mailto:` query values (same set as `encodeURIComponent`)
const MAILTO_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Resolve an image field into a CDN URL, or `None` if it cannot be resolved
pub fn resolve_image_url(
    builder: &ImageUrlBuilder,
    reference: Option<&Value>,
    width: u32,
    height: Option<u32>,
) -> Option<String> {
    let resolved = MediaReference::from_value(reference)
        .and_then(|media| builder.url(&media.width(width).height(height)));
    match resolved {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::trace!(error = %e, "Image reference did not resolve");
            None
        }
    }
}

/// `value` if it is a non-blank string, else `fallback`
pub fn text(value: Option<&Value>, fallback: &str) -> String {
    opt_text(value).unwrap_or_else(|| fallback.to_string())
}

/// Non-blank string value, trimmed
pub fn opt_text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `value` if it is an array, else empty
pub fn list(value: Option<&Value>) -> Vec<Value> {
    list_or(value, Vec::new())
}

pub fn list_or(value: Option<&Value>, fallback: Vec<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        _ => fallback,
    }
}

/// `value` only if it parses as an absolute URL with a host
pub fn valid_url(value: Option<&Value>) -> Option<String> {
    let raw = opt_text(value)?;
    match Url::parse(&raw) {
        Ok(url) if url.has_host() => Some(raw),
        _ => None,
    }
}

pub fn format_date(value: Option<&Value>, fallback: &str) -> String {
    match opt_text(value).and_then(|raw| parse_date_time(&raw)) {
        Some(parsed) => parsed.date().format(DATE_FORMAT).to_string(),
        None => {
            let date = opt_text(value)
                .and_then(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok());
            match date {
                Some(date) => date.format(DATE_FORMAT).to_string(),
                None => fallback.to_string(),
            }
        }
    }
}

/// Time of day; date-only values carry no time and yield `fallback`
pub fn format_time(value: Option<&Value>, fallback: &str) -> String {
    match opt_text(value).and_then(|raw| parse_date_time(&raw)) {
        Some(parsed) => parsed.format(TIME_FORMAT).to_string(),
        None => fallback.to_string(),
    }
}

/// Wall-clock time as written by the editor (offset kept, not converted)
fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Portable-text blocks (or a plain string) flattened into paragraphs
pub fn paragraphs(value: Option<&Value>) -> Vec<String> {
    if let Some(single) = opt_text(value) {
        return vec![single];
    }
    list(value)
        .iter()
        .filter_map(|block| {
            let spans: String = list(block.get("children"))
                .iter()
                .filter_map(|child| child.get("text").and_then(Value::as_str))
                .collect();
            let spans = spans.trim();
            (!spans.is_empty()).then(|| spans.to_string())
        })
        .collect()
}

/// A `mailto:` link that opens the user's mail client pre-filled
pub fn mailto(address: Option<&Value>, subject: &str, body: &str) -> Option<String> {
    let address = opt_text(address)?;
    let (local, domain) = address.split_once('@')?;
    if local.is_empty() || domain.is_empty() || address.contains(char::is_whitespace) {
        return None;
    }
    let mut link = format!("mailto:{}", address);
    let mut sep = '?';
    for (key, value) in [("subject", subject), ("body", body)] {
        if !value.is_empty() {
            link.push(sep);
            link.push_str(key);
            link.push('=');
            link.extend(utf8_percent_encode(value, MAILTO_VALUE));
            sep = '&';
        }
    }
    Some(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_falls_back_for_anything_but_real_text() {
        assert_eq!(text(Some(&json!("Blue Note")), "TBA"), "Blue Note");
        for bad in [json!(""), json!("   "), json!(null), json!(3), json!(["x"]), json!({})] {
            assert_eq!(text(Some(&bad), "TBA"), "TBA", "{}", bad);
        }
        assert_eq!(text(None, "TBA"), "TBA");
    }

    #[test]
    fn list_only_accepts_arrays() {
        assert_eq!(list(Some(&json!([1, 2]))).len(), 2);
        assert!(list(Some(&json!({ "0": 1 }))).is_empty());
        assert!(list(Some(&json!("abc"))).is_empty());
        assert!(list(None).is_empty());
        assert_eq!(list_or(Some(&json!(null)), vec![json!(1)]), vec![json!(1)]);
    }

    #[test]
    fn valid_url_requires_absolute_url_with_host() {
        let ok = json!("https://tickets.example.com/show/1");
        assert_eq!(valid_url(Some(&ok)).as_deref(), Some("https://tickets.example.com/show/1"));
        let bad_values = [
            json!("#"),
            json!("/relative"),
            json!("not a url"),
            json!("mailto:a@b.c"),
            json!(7),
        ];
        for bad in bad_values {
            assert_eq!(valid_url(Some(&bad)), None, "{}", bad);
        }
    }

    #[test]
    fn dates_and_times_format_or_fall_back_verbatim() {
        let show = json!("2025-03-15T20:00:00Z");
        assert_eq!(format_date(Some(&show), "TBA"), "Saturday, March 15, 2025");
        assert_eq!(format_time(Some(&show), "TBA"), "8:00 PM");

        let day = json!("2024-11-01");
        assert_eq!(format_date(Some(&day), "TBA"), "Friday, November 1, 2024");
        assert_eq!(format_time(Some(&day), "TBA"), "TBA");

        for bad in [json!("soon"), json!("2025-13-45"), json!(null), json!(1700000000)] {
            assert_eq!(format_date(Some(&bad), "Date TBA"), "Date TBA");
            assert_eq!(format_time(Some(&bad), "Time TBA"), "Time TBA");
        }
    }

    #[test]
    fn image_resolution_never_raises() {
        let builder = ImageUrlBuilder::new("p", "d");
        let good = json!({ "asset": { "_ref": "image-abc-100x100-jpg" } });
        assert!(resolve_image_url(&builder, Some(&good), 600, None).is_some());
        assert_eq!(resolve_image_url(&builder, Some(&json!("garbage")), 600, None), None);
        assert_eq!(resolve_image_url(&builder, None, 600, Some(400)), None);
    }

    #[test]
    fn paragraphs_flatten_blocks() {
        let blocks = json!([
            { "_type": "block", "children": [{ "text": "Born in " }, { "text": "Lisbon." }] },
            { "_type": "block", "children": [] },
            { "_type": "image" },
            { "_type": "block", "children": [{ "text": "Touring since 2019." }] }
        ]);
        assert_eq!(paragraphs(Some(&blocks)), vec!["Born in Lisbon.", "Touring since 2019."]);
        assert_eq!(paragraphs(Some(&json!("Just text"))), vec!["Just text"]);
        assert!(paragraphs(Some(&json!(5))).is_empty());
    }

    #[test]
    fn mailto_encodes_subject_and_body() {
        let address = json!("band@example.com");
        let link = mailto(Some(&address), "Contact from Ana", "Hi & bye").unwrap();
        assert_eq!(
            link,
            "mailto:band@example.com?subject=Contact%20from%20Ana&body=Hi%20%26%20bye"
        );
        assert_eq!(mailto(Some(&address), "", "").unwrap(), "mailto:band@example.com");
        assert_eq!(mailto(Some(&json!("no-at-sign")), "s", "b"), None);
        assert_eq!(mailto(None, "s", "b"), None);
    }
}
