//! Input decoding and CSV parsing into a [`Series`].

use encoding_rs::Encoding;
use gapfill_core::{ImputeError, Result, Series};
use std::borrow::Cow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// How to locate the date and demand columns.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub date_column: String,
    /// First non-date column when `None`
    pub value_column: Option<String>,
    pub delimiter: u8,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            date_column: "date".to_string(),
            value_column: None,
            delimiter: b',',
        }
    }
}

/// Decode raw input bytes, trying UTF-8 first and then CP949/EUC-KR.
///
/// A UTF-8 byte-order mark is stripped. Returns the text and the encoding
/// that succeeded.
pub fn decode_bytes(bytes: &[u8]) -> Result<(Cow<'_, str>, &'static Encoding)> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    for encoding in [encoding_rs::UTF_8, encoding_rs::EUC_KR] {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
            return Ok((text, encoding));
        }
        tracing::debug!(encoding = encoding.name(), "input is not valid in this encoding");
    }

    Err(ImputeError::DataFormat(
        "input is neither valid UTF-8 nor CP949/EUC-KR".to_string(),
    ))
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
}

/// Parse delimited text into a series.
///
/// Rows whose demand cell is blank are skipped, which leaves their date as
/// a gap. Any other unparseable cell aborts with [`ImputeError::DataFormat`].
pub fn read_series(text: &str, options: &ReadOptions) -> Result<Series> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ImputeError::DataFormat(format!("failed to read header: {}", e)))?
        .clone();

    let date_idx = find_column(&headers, &options.date_column).ok_or_else(|| {
        ImputeError::DataFormat(format!("no '{}' column in header", options.date_column))
    })?;
    let value_idx = match &options.value_column {
        Some(name) => find_column(&headers, name)
            .ok_or_else(|| ImputeError::DataFormat(format!("no '{}' column in header", name)))?,
        None => (0..headers.len())
            .find(|&i| i != date_idx)
            .ok_or_else(|| ImputeError::DataFormat("no demand column in header".to_string()))?,
    };
    tracing::debug!(
        date = &headers[date_idx],
        value = &headers[value_idx],
        "resolved input columns"
    );

    let mut records = Vec::new();
    let mut n_blank = 0usize;
    for (idx, result) in reader.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let record =
            result.map_err(|e| ImputeError::DataFormat(format!("line {}: {}", line, e)))?;

        let field = |i: usize| {
            record.get(i).ok_or_else(|| {
                ImputeError::DataFormat(format!("line {}: missing column {}", line, i + 1))
            })
        };
        let date = field(date_idx)?;
        let value = field(value_idx)?;

        if value.is_empty() {
            n_blank += 1;
            continue;
        }
        records.push((date.to_string(), value.to_string()));
    }

    if n_blank > 0 {
        tracing::warn!(rows = n_blank, "rows with a blank demand value treated as missing");
    }
    if records.is_empty() {
        return Err(ImputeError::DataFormat("input has no observations".to_string()));
    }

    Series::from_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBFdate,qty\n2023.1.1,5\n";
        let (text, encoding) = decode_bytes(bytes).unwrap();
        assert_eq!(encoding, encoding_rs::UTF_8);
        assert!(text.starts_with("date"));
    }

    #[test]
    fn test_decode_falls_back_to_euc_kr() {
        let (bytes, _, _) = encoding_rs::EUC_KR.encode("날짜,수요\n2023.1.1,5\n");
        let (text, encoding) = decode_bytes(&bytes).unwrap();
        assert_eq!(encoding, encoding_rs::EUC_KR);
        assert!(text.starts_with("날짜"));
    }

    #[test]
    fn test_columns_by_name_and_default() {
        let text = "Store,DATE,qty\nA,2023.1.1,5\nA,2023.1.3,7\n";
        let options = ReadOptions {
            value_column: Some("qty".to_string()),
            ..Default::default()
        };
        let series = read_series(text, &options).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.missing_dates().len(), 1);

        // Without a name the first non-date column is used
        let err = read_series(text, &ReadOptions::default()).unwrap_err();
        assert!(err.is_data_format());
    }

    #[test]
    fn test_blank_value_becomes_gap() {
        let text = "date,qty\n2023-01-01,5\n2023-01-02,\n2023-01-03,7\n";
        let series = read_series(text, &ReadOptions::default()).unwrap();
        assert_eq!(series.missing_dates().len(), 1);
    }

    #[test]
    fn test_bad_date_and_missing_column() {
        let err = read_series("date,qty\nyesterday,5\n", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, ImputeError::DataFormat(_)));

        let err = read_series("day,qty\n2023.1.1,5\n", &ReadOptions::default()).unwrap_err();
        assert!(err.is_data_format());
    }

    #[test]
    fn test_semicolon_delimiter() {
        let options = ReadOptions {
            delimiter: b';',
            ..Default::default()
        };
        let series = read_series("date;qty\n2023.1.1;1,5\n2023.1.2;2\n", &options);
        // "1,5" is not a number in this parser
        assert!(series.is_err());
        let series = read_series("date;qty\n2023.1.1;1.5\n2023.1.2;2\n", &options).unwrap();
        assert_eq!(series.observed().len(), 2);
    }
}
