//! Row reshaping
//!
//! Decodes the API's composite dimension-key encoding into named columns
//! and assembles destination-shaped records. The document path nests the
//! dimensions under one sub-map; the warehouse path emits each dimension
//! as its own flat column.

use chrono::NaiveDate;
use serde_json::Value;

use crate::api::{ReportRow, RowKeys};

/// A destination-shaped record, JSON object form.
pub type Document = serde_json::Map<String, Value>;

/// Trim surrounding whitespace, then surrounding quote characters.
fn clean_field(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim()
        .to_string()
}

/// Decode row keys into exactly `dimension_count` cleaned fields.
///
/// Composite form: bracket characters are dropped, the remainder is split
/// on commas left-to-right with at most `dimension_count - 1` splits, so a
/// value containing the delimiter is never over-split. Already-split key
/// arrays pass through with the same per-field cleaning.
pub fn decode_keys(keys: &RowKeys, dimension_count: usize) -> Vec<String> {
    let mut fields: Vec<String> = match keys {
        RowKeys::Split(list) => list.iter().map(|k| clean_field(k)).collect(),
        RowKeys::Composite(raw) => {
            let stripped: String = raw.chars().filter(|c| *c != '[' && *c != ']').collect();
            stripped
                .splitn(dimension_count, ',')
                .map(clean_field)
                .collect()
        }
    };

    if fields.len() != dimension_count {
        log::debug!(
            "row has {} key fields, expected {dimension_count}; padding",
            fields.len()
        );
        fields.resize(dimension_count, String::new());
    }
    fields
}

/// Shared top-level fields: property, date, search type, and the four
/// metric columns passed through unmodified.
fn base_fields(record: &mut Document, row: &ReportRow, property: &str, date: NaiveDate, search_type: &str) {
    record.insert("property".to_string(), Value::from(property));
    record.insert(
        "date".to_string(),
        Value::from(date.format("%Y-%m-%d").to_string()),
    );
    record.insert("clicks".to_string(), Value::from(row.clicks));
    record.insert("impressions".to_string(), Value::from(row.impressions));
    record.insert("ctr".to_string(), Value::from(row.ctr));
    record.insert("position".to_string(), Value::from(row.position));
    record.insert("searchType".to_string(), Value::from(search_type));
}

/// Build document-store records: one nested `dimensions` sub-map per row.
pub fn document_records(
    rows: &[ReportRow],
    property: &str,
    date: NaiveDate,
    dimensions: &[String],
    search_type: &str,
) -> Vec<Document> {
    rows.iter()
        .map(|row| {
            let mut record = Document::new();
            base_fields(&mut record, row, property, date, search_type);

            let mut nested = Document::new();
            for (name, value) in dimensions.iter().zip(decode_keys(&row.keys, dimensions.len())) {
                nested.insert(name.clone(), Value::from(value));
            }
            record.insert("dimensions".to_string(), Value::Object(nested));
            record
        })
        .collect()
}

/// Build warehouse records: each dimension as its own flat top-level column.
pub fn table_records(
    rows: &[ReportRow],
    property: &str,
    date: NaiveDate,
    dimensions: &[String],
    search_type: &str,
) -> Vec<Document> {
    rows.iter()
        .map(|row| {
            let mut record = Document::new();
            base_fields(&mut record, row, property, date, search_type);
            // Inserted after the shared fields: on a name collision (for
            // example a dimension literally named "position") the decoded
            // dimension value wins.
            for (name, value) in dimensions.iter().zip(decode_keys(&row.keys, dimensions.len())) {
                record.insert(name.clone(), Value::from(value));
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(keys: RowKeys) -> ReportRow {
        ReportRow {
            keys,
            clicks: 12.0,
            impressions: 480.0,
            ctr: 0.025,
            position: 3.4,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 7).unwrap()
    }

    // --- decode_keys ---

    #[test]
    fn composite_quoted_padded_tokens() {
        let keys = RowKeys::Composite("[ '/page' , 'mobile' ,  'rust async'  ]".to_string());
        assert_eq!(decode_keys(&keys, 3), ["/page", "mobile", "rust async"]);
    }

    #[test]
    fn composite_single_field() {
        let keys = RowKeys::Composite("['US']".to_string());
        assert_eq!(decode_keys(&keys, 1), ["US"]);
    }

    #[test]
    fn composite_delimiter_in_last_field_not_oversplit() {
        // Two dimensions, one split: everything after the first comma stays
        // in the second field.
        let keys = RowKeys::Composite("['mobile', 'rust, async rust']".to_string());
        assert_eq!(decode_keys(&keys, 2), ["mobile", "rust, async rust"]);
    }

    #[test]
    fn composite_double_quotes_stripped() {
        let keys = RowKeys::Composite(r#"["US", "desktop"]"#.to_string());
        assert_eq!(decode_keys(&keys, 2), ["US", "desktop"]);
    }

    #[test]
    fn split_keys_cleaned_in_order() {
        let keys = RowKeys::Split(vec![" 'US' ".to_string(), "mobile".to_string()]);
        assert_eq!(decode_keys(&keys, 2), ["US", "mobile"]);
    }

    #[test]
    fn short_key_list_padded_with_empty() {
        let keys = RowKeys::Split(vec!["US".to_string()]);
        assert_eq!(decode_keys(&keys, 3), ["US", "", ""]);
    }

    // --- record shapes ---

    #[test]
    fn warehouse_record_is_flat() {
        let rows = vec![row(RowKeys::Split(dims(&["US", "1.0", "mobile"])))];
        let records = table_records(
            &rows,
            "https://example.com/",
            date(),
            &dims(&["country", "position", "device"]),
            "web",
        );
        assert_eq!(records.len(), 1);
        let rec = &records[0];

        assert_eq!(rec["country"], "US");
        // "position" names both a dimension and a metric here; the decoded
        // dimension value wins on the flat path
        assert_eq!(rec["position"], "1.0");
        assert_eq!(rec["device"], "mobile");
        assert_eq!(rec["property"], "https://example.com/");
        assert_eq!(rec["date"], "2024-03-07");
        assert_eq!(rec["searchType"], "web");
        assert_eq!(rec["clicks"], 12.0);
        assert_eq!(rec["impressions"], 480.0);
        assert_eq!(rec["ctr"], 0.025);
        assert!(rec.get("dimensions").is_none());
        // two non-colliding dimension columns + the seven shared fields
        assert_eq!(rec.len(), 2 + 7);
    }

    #[test]
    fn document_record_nests_dimensions() {
        let rows = vec![row(RowKeys::Split(dims(&["US", "1.0", "mobile"])))];
        let records = document_records(
            &rows,
            "https://example.com/",
            date(),
            &dims(&["country", "position", "device"]),
            "web",
        );
        assert_eq!(records.len(), 1);
        let rec = &records[0];

        let nested = rec["dimensions"].as_object().unwrap();
        assert_eq!(nested["country"], "US");
        assert_eq!(nested["position"], "1.0");
        assert_eq!(nested["device"], "mobile");
        assert_eq!(nested.len(), 3);

        assert_eq!(rec["property"], "https://example.com/");
        assert_eq!(rec["date"], "2024-03-07");
        assert_eq!(rec["searchType"], "web");
        assert_eq!(rec["clicks"], 12.0);
        assert_eq!(rec["position"], 3.4);
        // property/date/searchType + four metrics + nested dimensions
        assert_eq!(rec.len(), 8);
    }

    #[test]
    fn metrics_pass_through_unrounded() {
        let mut r = row(RowKeys::Split(dims(&["US"])));
        r.ctr = 0.012345678;
        let records = table_records(&[r], "p", date(), &dims(&["country"]), "web");
        assert_eq!(records[0]["ctr"], 0.012345678);
    }
}
