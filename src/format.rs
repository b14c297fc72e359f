//! pt-BR presentation helpers: money, dates, percentages.
//!
//! DESIGN
//! ======
//! Money travels as integer cents everywhere (`BIGINT` in Postgres, `i64`
//! in Rust). Formatting to `R$ 1.234,56` happens only at the response edge,
//! and parsing of user-typed amounts happens only at the request edge.

use time::Date;
use time::macros::format_description;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("valor vazio")]
    Empty,
    #[error("valor inválido: {0}")]
    InvalidAmount(String),
    #[error("no máximo duas casas decimais")]
    TooManyDecimals,
    #[error("valor fora do intervalo suportado")]
    Overflow,
    #[error("data inválida: {0}")]
    InvalidDate(String),
}

// =============================================================================
// MONEY
// =============================================================================

/// Format cents as Brazilian reais: `R$ 1.234,56`, negatives as `-R$ 1.234,56`.
#[must_use]
pub fn format_brl(cents: i64) -> String {
    let abs = cents.unsigned_abs();
    let grouped = group_thousands(abs / 100);
    let frac = abs % 100;
    if cents < 0 {
        format!("-R$ {grouped},{frac:02}")
    } else {
        format!("R$ {grouped},{frac:02}")
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Parse a user-typed amount into cents.
///
/// Accepts an optional `R$` prefix and sign. A comma is always the decimal
/// separator. Without a comma, a single dot followed by one or two digits is
/// read as a decimal point; any other dots are thousands separators.
///
/// # Errors
///
/// Returns a [`FormatError`] for empty input, stray characters, misplaced
/// thousands separators, more than two decimal digits, or values that
/// overflow `i64` cents.
pub fn parse_brl(input: &str) -> Result<i64, FormatError> {
    let mut s = input.trim();
    let mut negative = false;
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_prefix("R$") {
        s = rest.trim_start();
    }
    if !negative {
        if let Some(rest) = s.strip_prefix('-') {
            negative = true;
            s = rest.trim_start();
        }
    }
    if s.is_empty() {
        return Err(FormatError::Empty);
    }

    let (int_part, frac_part) = split_decimal(s);
    if !well_grouped(int_part) {
        return Err(FormatError::InvalidAmount(input.to_owned()));
    }
    let int_digits: String = int_part.chars().filter(|c| *c != '.').collect();
    if !int_digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(FormatError::InvalidAmount(input.to_owned()));
    }

    let frac_cents = match frac_part {
        None => 0,
        Some(frac) => {
            if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
                return Err(FormatError::InvalidAmount(input.to_owned()));
            }
            if frac.len() > 2 {
                return Err(FormatError::TooManyDecimals);
            }
            let value: i64 = frac.parse().map_err(|_| FormatError::InvalidAmount(input.to_owned()))?;
            if frac.len() == 1 { value * 10 } else { value }
        }
    };
    if int_digits.is_empty() && frac_part.is_none() {
        return Err(FormatError::InvalidAmount(input.to_owned()));
    }

    let units: i64 = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse().map_err(|_| FormatError::Overflow)?
    };
    let cents = units
        .checked_mul(100)
        .and_then(|v| v.checked_add(frac_cents))
        .ok_or(FormatError::Overflow)?;

    Ok(if negative { -cents } else { cents })
}

/// Thousands separators must sit every three digits: `1.234.567`, not `1.2.3`.
fn well_grouped(int_part: &str) -> bool {
    if !int_part.contains('.') {
        return true;
    }
    int_part.split('.').enumerate().all(|(i, group)| {
        let len_ok = if i == 0 { (1..=3).contains(&group.len()) } else { group.len() == 3 };
        len_ok && group.chars().all(|c| c.is_ascii_digit())
    })
}

fn split_decimal(s: &str) -> (&str, Option<&str>) {
    if let Some(idx) = s.rfind(',') {
        return (&s[..idx], Some(&s[idx + 1..]));
    }
    if s.matches('.').count() == 1 {
        if let Some(idx) = s.rfind('.') {
            let tail = &s[idx + 1..];
            if (1..=2).contains(&tail.len()) {
                return (&s[..idx], Some(tail));
            }
        }
    }
    (s, None)
}

// =============================================================================
// DATES
// =============================================================================

/// Format a date as `dd/mm/aaaa`.
#[must_use]
pub fn format_date_br(date: Date) -> String {
    format!("{:02}/{:02}/{:04}", date.day(), u8::from(date.month()), date.year())
}

/// Parse a `dd/mm/aaaa` date.
///
/// # Errors
///
/// Returns [`FormatError::InvalidDate`] when the text is not a real calendar date.
pub fn parse_date_br(input: &str) -> Result<Date, FormatError> {
    Date::parse(input.trim(), format_description!("[day]/[month]/[year]"))
        .map_err(|_| FormatError::InvalidDate(input.to_owned()))
}

/// Parse an ISO `aaaa-mm-dd` date, falling back to `dd/mm/aaaa`.
///
/// # Errors
///
/// Returns [`FormatError::InvalidDate`] when neither layout matches.
pub fn parse_date(input: &str) -> Result<Date, FormatError> {
    let trimmed = input.trim();
    Date::parse(trimmed, format_description!("[year]-[month]-[day]")).or_else(|_| parse_date_br(trimmed))
}

/// Current UTC calendar date.
#[must_use]
pub fn today() -> Date {
    time::OffsetDateTime::now_utc().date()
}

// =============================================================================
// PERCENT
// =============================================================================

/// Format a percentage with one decimal place and a decimal comma: `42,5%`.
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%").replace('.', ",")
}

// =============================================================================
// REQUEST DESERIALIZERS
// =============================================================================

/// `serde` adapters for request bodies. Amounts arrive as integer cents or as
/// typed BRL text (`"1.234,56"`); dates as `aaaa-mm-dd` or `dd/mm/aaaa`.
pub mod de {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use time::Date;

    use super::{parse_brl, parse_date};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Cents(i64),
        Text(String),
    }

    impl RawAmount {
        fn into_cents<E: Error>(self) -> Result<i64, E> {
            match self {
                Self::Cents(cents) => Ok(cents),
                Self::Text(text) => parse_brl(&text).map_err(E::custom),
            }
        }
    }

    pub fn cents<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        RawAmount::deserialize(deserializer)?.into_cents()
    }

    pub fn option_cents<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Option::<RawAmount>::deserialize(deserializer)?
            .map(RawAmount::into_cents)
            .transpose()
    }

    pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw).map_err(D::Error::custom)
    }

    pub fn option_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Date>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) if !raw.trim().is_empty() => parse_date(&raw).map(Some).map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
