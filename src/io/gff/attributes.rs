//! Tokenisers for the free-text attribute column.
//!
//! GFF2 attributes are `Tag value value ; Tag "quoted value"` with values
//! separated by whitespace. GFF3 attributes are `key=value,value;key=value`
//! with reserved characters percent-encoded. Both are read into the same
//! ordered tag → values list.
use itertools::Itertools;

use crate::io::gff::error::GffError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pairs: Vec<(String, Vec<String>)>,
}

impl Attributes {
    /// First value of `tag`. Tags compare case-insensitively.
    pub fn get(
        &self,
        tag: &str,
    ) -> Option<&str> {
        self.get_all(tag)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(
        &self,
        tag: &str,
    ) -> Option<&[String]> {
        self.pairs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(tag))
            .map(|(_, values)| values.as_slice())
    }

    pub fn contains(
        &self,
        tag: &str,
    ) -> bool {
        self.get_all(tag).is_some()
    }

    /// Every value of `tag` across repeated occurrences.
    pub fn values_of<'a>(
        &'a self,
        tag: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(tag))
            .flat_map(|(_, values)| values.iter().map(String::as_str))
    }

    /// `true` for flags written as a bare tag or with a truthy value.
    pub fn flag(
        &self,
        tag: &str,
    ) -> bool {
        match self.get_all(tag) {
            Some([]) => true,
            Some(values) => values.iter().any(|v| {
                !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no")
            }),
            None => false,
        }
    }

    pub fn len(&self) -> usize { self.pairs.len() }

    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }

    /// Reads GFF2 `Tag value ; Tag "value"` attributes.
    pub fn parse_gff2(
        text: &str,
        line: usize,
    ) -> Result<Self, GffError> {
        let mut pairs = Vec::new();
        for group in split_unquoted(text, ';', line)? {
            let tokens = tokenize_gff2(group, line)?;
            let mut tokens = tokens.into_iter();
            if let Some(tag) = tokens.next() {
                pairs.push((tag, tokens.collect()));
            }
        }
        Ok(Self { pairs })
    }

    /// Reads GFF3 `key=value,value;key=value` attributes.
    pub fn parse_gff3(
        text: &str,
        line: usize,
    ) -> Result<Self, GffError> {
        let mut pairs = Vec::new();
        for group in text.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = group.split_once('=').ok_or_else(|| {
                GffError::BadAttribute {
                    line,
                    reason: format!("'{}' is not a key=value pair", group),
                }
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(GffError::BadAttribute {
                    line,
                    reason: format!("empty key in '{}'", group),
                });
            }
            let values = value
                .split(',')
                .map(|v| percent_decode(v.trim()))
                .collect_vec();
            pairs.push((percent_decode(key), values));
        }
        Ok(Self { pairs })
    }
}

/// Splits on `sep` outside double quotes.
fn split_unquoted<'a>(
    text: &'a str,
    sep: char,
    line: usize,
) -> Result<Vec<&'a str>, GffError> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == sep && !in_quotes => {
                parts.push(&text[start..idx]);
                start = idx + c.len_utf8();
            },
            _ => {},
        }
    }
    if in_quotes {
        return Err(GffError::BadAttribute {
            line,
            reason: "unterminated quoted value".to_string(),
        });
    }
    parts.push(&text[start..]);
    Ok(parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect())
}

/// Splits one GFF2 attribute into whitespace separated tokens, unquoting
/// quoted ones.
fn tokenize_gff2(
    group: &str,
    line: usize,
) -> Result<Vec<String>, GffError> {
    let mut tokens = Vec::new();
    let mut chars = group.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if ch == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => {
                        if let Some(next) = chars.next() {
                            token.push(next);
                        }
                    },
                    '"' => {
                        closed = true;
                        break;
                    },
                    c => token.push(c),
                }
            }
            if !closed {
                return Err(GffError::BadAttribute {
                    line,
                    reason: "unterminated quoted value".to_string(),
                });
            }
        }
        else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

/// Decodes `%XX` escapes. Malformed escapes are kept literally.
pub fn percent_decode(value: &str) -> String {
    if !value.contains('%') {
        return value.to_string();
    }
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' && idx + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[idx + 1..idx + 3])
                .ok()
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = hex {
                out.push(byte);
                idx += 3;
                continue;
            }
        }
        out.push(bytes[idx]);
        idx += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gff2_tag_values() {
        let attrs = Attributes::parse_gff2(
            r#"Target "Sequence:AB000123" 12 140 ; Note "semi; colon" ; Length 900"#,
            1,
        )
        .unwrap();
        assert_eq!(
            attrs.get_all("target").unwrap(),
            &["Sequence:AB000123", "12", "140"]
        );
        assert_eq!(attrs.get("Note"), Some("semi; colon"));
        assert_eq!(attrs.get("Length"), Some("900"));
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn test_gff2_unterminated_quote() {
        assert!(matches!(
            Attributes::parse_gff2(r#"Sequence "B0250.1"#, 9),
            Err(GffError::BadAttribute { line: 9, .. })
        ));
    }

    #[test]
    fn test_gff3_key_values() {
        let attrs = Attributes::parse_gff3(
            "ID=tx1;Parent=g1,g2;Note=a%3Bb%2Cc;start_not_found",
            4,
        );
        assert!(attrs.is_err());

        let attrs =
            Attributes::parse_gff3("ID=tx1;Parent=g1,g2;Note=a%3Bb%2Cc;", 4).unwrap();
        assert_eq!(attrs.get("ID"), Some("tx1"));
        assert_eq!(attrs.get_all("Parent").unwrap(), &["g1", "g2"]);
        assert_eq!(attrs.get("Note"), Some("a;b,c"));
    }

    #[test]
    fn test_flags() {
        let attrs =
            Attributes::parse_gff3("start_not_found=true;end_not_found=false", 1).unwrap();
        assert!(attrs.flag("start_not_found"));
        assert!(!attrs.flag("end_not_found"));
        assert!(!attrs.flag("missing"));
        let attrs = Attributes::parse_gff2("Start_not_found ; Note x", 1).unwrap();
        assert!(attrs.flag("start_not_found"));
    }

    #[test]
    fn test_percent_decode_keeps_malformed() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz1"), "%zz1");
        assert_eq!(percent_decode("a%20b"), "a b");
    }
}
