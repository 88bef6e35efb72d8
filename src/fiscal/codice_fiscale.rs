//! Codice fiscale (Italian national tax code) checksum validation.
//!
//! Personal codes are 16 characters with a control letter computed from
//! the official odd/even character tables. Companies use their 11-digit
//! partita IVA as tax code, so all-numeric input delegates to that
//! checksum.

use super::FiscalIdError;
use super::partita_iva::validate_partita_iva;

/// Month encoding letters, January to December.
const MONTH_LETTERS: [char; 12] = ['A', 'B', 'C', 'D', 'E', 'H', 'L', 'M', 'P', 'R', 'S', 'T'];

/// Letters substituted for digits in omocodia-resolved codes.
const OMOCODE_LETTERS: [char; 10] = ['L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V'];

/// Validate a codice fiscale, returning the normalized (uppercase) code.
pub fn validate_codice_fiscale(value: &str) -> Result<String, FiscalIdError> {
    let code = value.trim().to_uppercase();

    // Legal persons: the tax code is the 11-digit partita IVA.
    if code.len() == 11 && code.chars().all(|c| c.is_ascii_digit()) {
        return validate_partita_iva(&code);
    }

    if code.len() != 16 {
        return Err(FiscalIdError::new(
            value,
            format!("expected 16 characters (or 11 digits), got {}", code.len()),
        ));
    }

    let chars: Vec<char> = code.chars().collect();

    if !chars[..6].iter().all(|c| c.is_ascii_alphabetic()) {
        return Err(FiscalIdError::new(
            value,
            "the first 6 characters must be letters",
        ));
    }
    for &i in &[6, 7, 9, 10, 12, 13, 14] {
        if !is_digit_or_omocode(chars[i]) {
            return Err(FiscalIdError::new(
                value,
                format!("character {} must be a digit or omocodia letter", i + 1),
            ));
        }
    }
    if !MONTH_LETTERS.contains(&chars[8]) {
        return Err(FiscalIdError::new(value, "invalid month letter"));
    }
    if !chars[11].is_ascii_alphabetic() {
        return Err(FiscalIdError::new(
            value,
            "the birthplace code must start with a letter",
        ));
    }

    let expected = control_character(&chars[..15])?;
    if chars[15] != expected {
        return Err(FiscalIdError::new(
            value,
            format!("control character mismatch: expected {expected}, got {}", chars[15]),
        ));
    }

    Ok(code)
}

fn is_digit_or_omocode(c: char) -> bool {
    c.is_ascii_digit() || OMOCODE_LETTERS.contains(&c)
}

/// Control character over the first 15 characters: odd positions
/// (1-indexed) use the official odd table, even positions their plain
/// value, summed modulo 26.
fn control_character(chars: &[char]) -> Result<char, FiscalIdError> {
    let mut sum = 0u32;
    for (i, &c) in chars.iter().enumerate() {
        let value = if i % 2 == 0 {
            odd_value(c)
        } else {
            even_value(c)
        };
        sum += value.ok_or_else(|| {
            FiscalIdError::new(chars.iter().collect::<String>(), format!("invalid character '{c}'"))
        })?;
    }
    Ok((b'A' + (sum % 26) as u8) as char)
}

fn even_value(c: char) -> Option<u32> {
    match c {
        '0'..='9' => Some(c as u32 - '0' as u32),
        'A'..='Z' => Some(c as u32 - 'A' as u32),
        _ => None,
    }
}

fn odd_value(c: char) -> Option<u32> {
    let value = match c {
        '0' | 'A' => 1,
        '1' | 'B' => 0,
        '2' | 'C' => 5,
        '3' | 'D' => 7,
        '4' | 'E' => 9,
        '5' | 'F' => 13,
        '6' | 'G' => 15,
        '7' | 'H' => 17,
        '8' | 'I' => 19,
        '9' | 'J' => 21,
        'K' => 2,
        'L' => 4,
        'M' => 18,
        'N' => 20,
        'O' => 11,
        'P' => 3,
        'Q' => 6,
        'R' => 8,
        'S' => 12,
        'T' => 14,
        'U' => 16,
        'V' => 10,
        'W' => 22,
        'X' => 25,
        'Y' => 24,
        'Z' => 23,
        _ => return None,
    };
    Some(value)
}
