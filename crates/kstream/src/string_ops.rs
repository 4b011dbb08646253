//! Operations producing and consuming [KsString] values.

use std::cmp::Ordering;

use crate::{
    errors::{Error, Result},
    session::Session,
    value::{Bytes, KsString},
};

impl Session {
    pub fn str_from_literal(&mut self, text: &str) -> Result<KsString> {
        self.ensure_clear()?;
        let stream = self.detached_stream();
        let result = self.owned_string(stream, text.to_string());
        self.guard(result)
    }

    pub fn str_as_str(&self, s: &KsString) -> Result<&str> {
        self.strings.get(s.slot).map(String::as_str)
    }

    /// Length in characters.
    pub fn str_len(&self, s: &KsString) -> Result<usize> {
        Ok(self.str_as_str(s)?.chars().count())
    }

    /// New string computed from `s`, attributed to `s`'s stream.
    fn derive_str(
        &mut self,
        s: &KsString,
        op: impl FnOnce(&str) -> Result<String>,
    ) -> Result<KsString> {
        self.ensure_clear()?;
        let result = self.handles.get(s.handle).map(|h| h.stream).and_then(|stream| {
            let text = op(self.str_as_str(s)?)?;
            self.owned_string(stream, text)
        });
        self.guard(result)
    }

    pub fn str_concat(&mut self, a: &KsString, b: &KsString) -> Result<KsString> {
        let tail = self.str_as_str(b).map(str::to_string);
        let tail = self.guard(tail)?;
        self.derive_str(a, |head| Ok(format!("{head}{tail}")))
    }

    pub fn str_reverse(&mut self, s: &KsString) -> Result<KsString> {
        self.derive_str(s, |text| Ok(text.chars().rev().collect()))
    }

    /// Characters `start..end`, clamped to the string. An inverted range
    /// gives an empty string.
    pub fn str_substr(&mut self, s: &KsString, start: usize, end: usize) -> Result<KsString> {
        self.derive_str(s, |text| {
            Ok(text
                .chars()
                .skip(start)
                .take(end.saturating_sub(start))
                .collect())
        })
    }

    /// Renders `value` in `base` (2..=36); hex digits are lowercase.
    pub fn str_from_int(&mut self, value: i64, base: u32) -> Result<KsString> {
        self.ensure_clear()?;
        let result = format_radix(value, base);
        let text = self.guard(result)?;
        let stream = self.detached_stream();
        let result = self.owned_string(stream, text);
        self.guard(result)
    }

    pub fn str_to_int(&mut self, s: &KsString, base: u32) -> Result<i64> {
        self.ensure_clear()?;
        let result = self.str_as_str(s).and_then(|text| parse_radix(text, base));
        self.guard(result)
    }

    /// Decodes `bytes` from `encoding` through the session's decoder.
    pub fn str_from_bytes(&mut self, bytes: &Bytes, encoding: &str) -> Result<KsString> {
        let raw = self.bytes_data(bytes)?;
        let result = self.config.decoder.decode(&raw, encoding);
        let text = self.guard(result)?;
        let result = self
            .handles
            .get(bytes.handle)
            .map(|h| h.stream)
            .and_then(|stream| self.owned_string(stream, text));
        self.guard(result)
    }

    pub fn str_compare(&mut self, a: &KsString, b: &KsString) -> Result<Ordering> {
        self.ensure_clear()?;
        let result = self
            .str_as_str(a)
            .and_then(|left| Ok(left.cmp(self.str_as_str(b)?)));
        self.guard(result)
    }
}

fn check_radix(base: u32) -> Result<()> {
    if !(2..=36).contains(&base) {
        return Err(Error::InvalidRadix(base));
    }
    Ok(())
}

fn format_radix(value: i64, base: u32) -> Result<String> {
    check_radix(base)?;

    match base {
        10 => return Ok(value.to_string()),
        16 if value >= 0 => return Ok(format!("{value:x}")),
        _ => {}
    }

    let mut magnitude = value.unsigned_abs();
    if magnitude == 0 {
        return Ok("0".to_string());
    }

    let mut digits = Vec::new();
    while magnitude > 0 {
        let d = (magnitude % base as u64) as u32;
        digits.push(char::from_digit(d, base).unwrap_or('?'));
        magnitude /= base as u64;
    }
    if value < 0 {
        digits.push('-');
    }

    Ok(digits.into_iter().rev().collect())
}

fn parse_radix(text: &str, base: u32) -> Result<i64> {
    check_radix(base)?;
    let parsed = if base == 10 {
        text.parse::<i64>()
    } else {
        i64::from_str_radix(text, base)
    };
    parsed.map_err(|_| Error::InvalidNumber {
        text: text.to_string(),
        base,
    })
}
