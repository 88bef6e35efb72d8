//! Partita IVA (Italian VAT number) checksum validation.

use super::FiscalIdError;

/// Validate a partita IVA, returning the cleaned 11-digit number.
///
/// Accepts the bare 11-digit form and the EU-prefixed form ("IT" +
/// 11 digits); surrounding whitespace is ignored. The last digit is a
/// Luhn-style check digit computed over the first ten.
pub fn validate_partita_iva(value: &str) -> Result<String, FiscalIdError> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("IT")
        .or_else(|| trimmed.strip_prefix("it"))
        .unwrap_or(trimmed);

    if digits.len() != 11 {
        return Err(FiscalIdError::new(
            value,
            format!("expected 11 digits, got {}", digits.len()),
        ));
    }
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(FiscalIdError::new(value, "must be numeric"));
    }
    if digits[..7].chars().all(|c| c == '0') {
        return Err(FiscalIdError::new(value, "taxpayer sequence must not be all zeros"));
    }

    let nums: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();

    // Odd positions (1-indexed) count as-is; even positions are doubled,
    // minus 9 when the double exceeds 9.
    let mut sum = 0u32;
    for (i, &d) in nums[..10].iter().enumerate() {
        if i % 2 == 0 {
            sum += d;
        } else {
            let doubled = d * 2;
            sum += if doubled > 9 { doubled - 9 } else { doubled };
        }
    }
    let check = (10 - sum % 10) % 10;
    if check != nums[10] {
        return Err(FiscalIdError::new(
            value,
            format!("check digit mismatch: expected {check}, got {}", nums[10]),
        ));
    }

    Ok(digits.to_string())
}
