// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Lenient value parsers shared by filtering, sorting and cell formatting.
//!
//! Every parser is total: malformed input yields `None`, which callers treat
//! as "unparsable" and exclude from range predicates.

use serde_json::Value;

const CURRENCY_SUFFIX: &str = "lei";

/// Parses the longest numeric prefix of `raw` (after leading whitespace).
pub fn parse_float_prefix(raw: &str) -> Option<f64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let unsigned = &text[end..];
    if unsigned.starts_with("Infinity") {
        let value = f64::INFINITY;
        return Some(if bytes[0] == b'-' { -value } else { value });
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok()
}

/// Removes every case-insensitive occurrence of the currency suffix.
fn strip_currency(raw: &str) -> String {
    let lower = raw.to_ascii_lowercase();
    let mut out = String::with_capacity(raw.len());
    let mut index = 0;
    while index < raw.len() {
        if lower[index..].starts_with(CURRENCY_SUFFIX) {
            index += CURRENCY_SUFFIX.len();
            continue;
        }
        let Some(ch) = raw[index..].chars().next() else {
            break;
        };
        out.push(ch);
        index += ch.len_utf8();
    }
    out
}

fn numeric_source(value: &Value) -> Option<NumericSource<'_>> {
    match value {
        Value::Number(number) => number.as_f64().map(NumericSource::Number),
        Value::String(text) if !text.is_empty() => Some(NumericSource::Text(text)),
        _ => None,
    }
}

enum NumericSource<'a> {
    Number(f64),
    Text(&'a str),
}

/// Generic numeric fields: counts, scores, discounts (`"12%"`, `"4,5"`).
pub fn parse_number(value: &Value) -> Option<f64> {
    match numeric_source(value)? {
        NumericSource::Number(number) => Some(number),
        NumericSource::Text(text) => parse_number_text(text),
    }
}

pub fn parse_number_text(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    let mut text = strip_currency(raw).replacen('%', "", 1).trim().to_owned();
    if text.contains(',') && !text.contains('.') {
        text = text.replacen(',', ".", 1);
    }
    parse_float_prefix(&text)
}

/// Currency fields; `"54,93 Lei"`, `"54.93"` and `"1.234,50"` are all accepted.
pub fn parse_price(value: &Value) -> Option<f64> {
    match numeric_source(value)? {
        NumericSource::Number(number) => Some(number),
        NumericSource::Text(text) => parse_price_text(text),
    }
}

pub fn parse_price_text(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return None;
    }
    let mut text = strip_currency(raw).trim().to_owned();
    match (text.rfind('.'), text.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => {
            text = text.replace('.', "").replacen(',', ".", 1);
        }
        (Some(_), Some(_)) => {
            text = text.replace(',', "");
        }
        (None, Some(_)) => {
            text = text.replacen(',', ".", 1);
        }
        _ => {}
    }
    parse_float_prefix(&text)
}

/// Rating on the dataset's own scale; fractions in (0, 1] map onto 0-5.
pub fn parse_stars(value: &Value) -> Option<f64> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        _ => return None,
    };
    let number = parse_float_prefix(&text.replacen('%', "", 1))?;
    if number > 0.0 && number <= 1.0 {
        Some(number * 5.0)
    } else {
        Some(number)
    }
}

/// Rating as a 0-100 percentage for star rendering.
pub fn parse_rating_percent(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => parse_float_prefix(text.replacen('%', "", 1).trim())?,
        _ => return None,
    };
    let percent = if number > 0.0 && number <= 1.0 {
        number * 100.0
    } else {
        number
    };
    Some(percent.clamp(0.0, 100.0))
}

/// Filter-bar bound input; blank or non-numeric text disables the bound.
pub fn parse_bound(raw: &str) -> Option<f64> {
    parse_float_prefix(raw).filter(|value| value.is_finite())
}
