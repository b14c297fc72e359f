//! Form-level validation shared by every write endpoint.
//!
//! DESIGN
//! ======
//! Checks accumulate into `FieldErrors` so a single 422 response can report
//! every offending field at once. Messages are user-facing (pt-BR); field
//! names match the JSON request keys.

use std::fmt;

use serde::Serialize;
use time::Date;
use uuid::Uuid;

pub const MSG_REQUIRED: &str = "Campo obrigatório";
pub const MSG_SAME_ACCOUNT: &str = "A conta de débito deve ser diferente da conta de crédito";
pub const MSG_PASSWORD_MISMATCH: &str = "A confirmação de senha não confere";
pub const MSG_PASSWORD_SHORT: &str = "A senha deve ter pelo menos 8 caracteres";
pub const MSG_POSITIVE_AMOUNT: &str = "O valor deve ser maior que zero";
pub const MSG_INVALID_EMAIL: &str = "E-mail inválido";
pub const MSG_INVALID_CNPJ: &str = "CNPJ inválido";
pub const MSG_DATE_RANGE: &str = "A data inicial deve ser anterior ou igual à data final";
pub const MSG_ACCOUNT_CODE: &str = "Código de conta inválido (use dígitos separados por ponto)";

pub const MIN_PASSWORD_LEN: usize = 8;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// One or more invalid fields. Displays as the first message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    #[must_use]
    pub fn single(field: &str, message: &str) -> Self {
        Self { fields: vec![FieldError { field: field.to_owned(), message: message.to_owned() }] }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fields.first() {
            Some(first) => f.write_str(&first.message),
            None => f.write_str("Dados inválidos"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Accumulator for field checks.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError { field: field.to_owned(), message: message.to_owned() });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// # Errors
    ///
    /// Returns the accumulated errors when any check failed.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() { Ok(()) } else { Err(ValidationError { fields: self.errors }) }
    }

    // -------------------------------------------------------------------------
    // CHECKS
    // -------------------------------------------------------------------------

    pub fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, MSG_REQUIRED);
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.push(field, &format!("Máximo de {max} caracteres"));
        }
    }

    pub fn positive_amount(&mut self, field: &str, cents: i64) {
        if cents <= 0 {
            self.push(field, MSG_POSITIVE_AMOUNT);
        }
    }

    pub fn distinct_accounts(&mut self, debit: Uuid, credit: Uuid) {
        if debit == credit {
            self.push("credit_account_id", MSG_SAME_ACCOUNT);
        }
    }

    /// New password rules: minimum length and matching confirmation.
    pub fn password(&mut self, password: &str, confirmation: &str) {
        if password.chars().count() < MIN_PASSWORD_LEN {
            self.push("password", MSG_PASSWORD_SHORT);
        }
        if password != confirmation {
            self.push("password_confirmation", MSG_PASSWORD_MISMATCH);
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if !is_valid_email(value) {
            self.push(field, MSG_INVALID_EMAIL);
        }
    }

    pub fn cnpj(&mut self, field: &str, value: &str) {
        if !is_valid_cnpj(value) {
            self.push(field, MSG_INVALID_CNPJ);
        }
    }

    pub fn date_range(&mut self, field: &str, start: Date, end: Date) {
        if start > end {
            self.push(field, MSG_DATE_RANGE);
        }
    }

    pub fn account_code(&mut self, field: &str, code: &str) {
        if !is_valid_account_code(code) {
            self.push(field, MSG_ACCOUNT_CODE);
        }
    }
}

// =============================================================================
// PREDICATES
// =============================================================================

/// Shape check only: one `@`, non-empty local part, dotted domain, no spaces.
#[must_use]
pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Brazilian company registry number with check digits. Punctuation is ignored.
#[must_use]
pub fn is_valid_cnpj(value: &str) -> bool {
    const W1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const W2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    if value.chars().any(|c| !(c.is_ascii_digit() || matches!(c, '.' | '/' | '-' | ' '))) {
        return false;
    }
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 14 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check = |len: usize, weights: &[u32]| -> u32 {
        let sum: u32 = digits[..len].iter().zip(weights).map(|(d, w)| d * w).sum();
        let rem = sum % 11;
        if rem < 2 { 0 } else { 11 - rem }
    };

    check(12, &W1) == digits[12] && check(13, &W2) == digits[13]
}

/// Chart-of-accounts code: digit groups separated by dots (`1`, `1.1`, `1.1.01`).
#[must_use]
pub fn is_valid_account_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Digits-only form of a CNPJ for storage.
#[must_use]
pub fn normalize_cnpj(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;
