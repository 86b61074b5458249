//! # Document Number Formatting
//!
//! Pure helpers for the `PREFIX-YYYYMM-SEQ` document number format. The
//! allocation itself (the atomic counter upsert) lives in
//! [`crate::repositories::DocSequenceRepository`]; this module only derives
//! the period bucket and renders the final string.

use chrono::{Datelike, NaiveDate};

/// Derive the six-digit `YYYYMM` bucket from a business date.
pub fn year_month(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

/// Render `PREFIX-YYYYMM-SEQ` with the sequence zero-padded to 5 digits.
///
/// Sequences above 99999 keep their natural width; 100000 renders as
/// `100000`, never truncated or wrapped.
pub fn format_document_no(prefix: &str, year_month: &str, seq: i64) -> String {
    format!("{}-{}-{:05}", prefix, year_month, seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_month_zero_pads() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(year_month(date), "202406");

        let january = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(year_month(january), "202401");
    }

    #[test]
    fn sequence_is_padded_to_five_digits() {
        assert_eq!(format_document_no("SO", "202406", 1), "SO-202406-00001");
        assert_eq!(format_document_no("SO", "202406", 42), "SO-202406-00042");
        assert_eq!(format_document_no("APR", "202401", 99999), "APR-202401-99999");
    }

    #[test]
    fn sequence_above_padding_keeps_natural_width() {
        assert_eq!(format_document_no("SM", "202401", 100000), "SM-202401-100000");
        assert_eq!(
            format_document_no("SM", "202401", 1234567),
            "SM-202401-1234567"
        );
    }
}
