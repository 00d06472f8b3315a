use crate::error::CredpayError;

/// Parse a human-readable price (e.g. `"$0.01"`) into atomic token units.
///
/// Strips everything except digits and `.`, so `"$0.01"`, `"0.01"` and
/// `"$1"` all work. Fractional digits beyond `decimals` are truncated.
/// Integer-only arithmetic; no `f64` anywhere in the pipeline.
pub fn parse_price(price: &str, decimals: u32) -> Result<String, CredpayError> {
    let cleaned: String = price
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() || cleaned == "." {
        return Err(CredpayError::InvalidPrice(format!(
            "'{price}': no numeric content"
        )));
    }

    let overflow = || CredpayError::InvalidPrice(format!("'{price}': overflow"));
    let multiplier = 10u64.checked_pow(decimals).ok_or_else(overflow)?;

    let (integer_part, fractional_part) = cleaned.split_once('.').unwrap_or((&cleaned, ""));

    let integer: u64 = if integer_part.is_empty() {
        0
    } else {
        integer_part
            .parse()
            .map_err(|e| CredpayError::InvalidPrice(format!("'{price}': integer part: {e}")))?
    };

    let decimals = decimals as usize;
    let frac_str = if fractional_part.len() > decimals {
        &fractional_part[..decimals]
    } else {
        fractional_part
    };

    let fractional: u64 = if frac_str.is_empty() {
        0
    } else {
        frac_str
            .parse()
            .map_err(|e| CredpayError::InvalidPrice(format!("'{price}': fractional part: {e}")))?
    };

    // Scale a short fraction up to the full number of decimals
    let scale = 10u64.pow((decimals - frac_str.len()) as u32);

    let amount = integer
        .checked_mul(multiplier)
        .and_then(|whole| {
            fractional
                .checked_mul(scale)
                .and_then(|frac| whole.checked_add(frac))
        })
        .ok_or_else(overflow)?;

    Ok(amount.to_string())
}
