//! CSV form of token maps: one `"key","value"` record per line, no header row.
//!
//! Records may carry more than two fields; only the first two are read.
//! Fields are always quoted on output, with embedded quotes doubled.

use scriptstash_core::LINE_SEPARATOR;

use super::TokenMap;
use crate::error::{Error, Result};

const FORMAT: &str = "CSV";

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All);
    builder
}

fn writer_builder() -> csv::WriterBuilder {
    let terminator = if LINE_SEPARATOR == "\r\n" {
        csv::Terminator::CRLF
    } else {
        csv::Terminator::Any(b'\n')
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(terminator);
    builder
}

fn csv_error(e: csv::Error) -> Error {
    Error::format(FORMAT, e.to_string())
}

pub(super) fn parse(text: &str) -> Result<TokenMap> {
    let tokens = TokenMap::new();
    let mut reader = reader_builder().from_reader(text.as_bytes());
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let (Some(key), Some(value)) = (record.get(0), record.get(1)) else {
            let line = record.position().map_or(0, |p| p.line());
            return Err(Error::format(
                FORMAT,
                format!("line {line} has no value: {}", record.iter().collect::<Vec<_>>().join(",")),
            ));
        };
        tokens.set(key, value);
    }
    if tokens.is_empty() {
        return Err(Error::format(FORMAT, "no token lines found"));
    }
    Ok(tokens)
}

pub(super) fn to_string(tokens: &TokenMap) -> Result<String> {
    let mut writer = writer_builder().from_writer(Vec::new());
    for (key, value) in tokens.pairs() {
        writer.write_record([&key, &value]).map_err(csv_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| Error::format(FORMAT, e.error().to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| Error::format(FORMAT, e.to_string()))?;
    Ok(text
        .strip_suffix(LINE_SEPARATOR)
        .map(str::to_owned)
        .unwrap_or(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_pairs() {
        let tokens = parse("\"k1\",\"v1\"\n\"k2\",\"v2\"").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens.get("k1"), "v1");
        assert_eq!(tokens.get("k2"), "v2");
    }

    #[test]
    fn test_parse_crlf_and_blank_lines() {
        let tokens = parse("\"k1\",\"v1\"\r\n\r\n\"k2\",\"v2\"\r\n").unwrap();
        assert_eq!(tokens.keys(), vec!["k1", "k2"]);
        assert_eq!(tokens.get("k2"), "v2");
    }

    #[test]
    fn test_parse_comma_inside_quotes() {
        let tokens = parse("\"[CSV_FIELDS]\",\"NAME, PHONE\"").unwrap();
        assert_eq!(tokens.get("[CSV_FIELDS]"), "NAME, PHONE");
    }

    #[test]
    fn test_parse_unquoted_and_extra_fields() {
        let tokens = parse("key,value,ignored").unwrap();
        assert_eq!(tokens.get("key"), "value");
    }

    #[test]
    fn test_parse_line_without_value() {
        let err = parse("\"k1\",\"v1\"\n\"lonely\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_to_string() {
        let tokens = TokenMap::from([("k1", "v1"), ("k2", "v2")]);
        assert_eq!(
            to_string(&tokens).unwrap(),
            format!("\"k1\",\"v1\"{LINE_SEPARATOR}\"k2\",\"v2\"")
        );
        assert_eq!(to_string(&TokenMap::new()).unwrap(), "");
    }

    #[test]
    fn test_quotes_and_commas_survive() {
        let tokens = TokenMap::from([("k", "say \"hi\", ok"), ("[LIST]", "a,b")]);
        let text = to_string(&tokens).unwrap();
        assert!(text.starts_with("\"k\",\"say \"\"hi\"\", ok\""));

        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.get("k"), "say \"hi\", ok");
        assert_eq!(parsed.get("[LIST]"), "a,b");
        assert_eq!(parsed, tokens);
    }
}
