use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_html(value: &str) -> String {
    escape_xml(value).replace("&apos;", "&#39;")
}

pub fn parse_header_line(value: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (key, val) = value
        .split_once(':')
        .ok_or_else(|| "expected 'Name: Value'".to_string())?;
    let key = HeaderName::from_bytes(key.trim().as_bytes())
        .map_err(|_| format!("invalid header name '{}'", key.trim()))?;
    let val = HeaderValue::from_str(val.trim())
        .map_err(|_| format!("invalid header value for '{key}'"))?;
    Ok((key, val))
}

pub fn parse_header_lines(values: &[String]) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    for raw in values.iter().filter(|v| !v.trim().is_empty()) {
        let (key, val) = parse_header_line(raw).map_err(|e| format!("header '{raw}': {e}"))?;
        headers.append(key, val);
    }
    Ok(headers)
}

pub fn display_width(value: &str) -> usize {
    UnicodeWidthStr::width(value)
}

// `max` is in terminal columns; the ellipsis takes one.
pub fn truncate_chars(value: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if display_width(value) <= max {
        return value.to_string();
    }
    let budget = max - 1;
    let mut out = String::new();
    let mut used = 0;
    for ch in value.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > budget {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push('…');
    out
}

pub fn pad_right(value: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(value));
    format!("{value}{}", " ".repeat(pad))
}

pub fn single_line(value: &str) -> String {
    value.split(['\r', '\n']).filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_xml_covers_markup_characters() {
        assert_eq!(escape_xml(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;");
        assert_eq!(escape_html("it's"), "it&#39;s");
    }

    #[test]
    fn parse_header_line_splits_on_first_colon() {
        let (k, v) = parse_header_line("Authorization: Bearer a:b").unwrap();
        assert_eq!(k.as_str(), "authorization");
        assert_eq!(v.to_str().unwrap(), "Bearer a:b");
        assert!(parse_header_line("no separator").is_err());
        assert!(parse_header_line("bad name: x").is_err());
    }

    #[test]
    fn parse_header_lines_skips_blank_entries() {
        let headers = parse_header_lines(&[
            "X-One: 1".to_string(),
            " ".to_string(),
            "X-Two: 2".to_string(),
        ])
        .unwrap();
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn text_helpers_measure_terminal_columns() {
        assert_eq!(display_width("אושר"), 4);
        assert_eq!(display_width("日本語"), 6);
        assert_eq!(display_width("✅ok"), 4);
        assert_eq!(pad_right("日本語", 8), "日本語  ");
        assert_eq!(pad_right("日本語", 6), "日本語");
        assert_eq!(truncate_chars("日本語テキスト", 6), "日本…");
        assert_eq!(display_width(&truncate_chars("日本語テキスト", 6)), 5);
        assert_eq!(pad_right("ab", 4), "ab  ");
        assert_eq!(truncate_chars("abcdef", 4), "abc…");
        assert_eq!(truncate_chars("abc", 4), "abc");
        assert_eq!(single_line("a\r\nb\nc"), "a b c");
    }
}
