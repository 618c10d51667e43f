/// Converts a textual counter such as `"3,512"`, `"1.2K"` or `"142M"` into an integer.
///
/// Thousands separators (`,` and the middle dot) are dropped. A trailing `K`, `M`
/// or `B` (any case) scales the number and the result is truncated toward zero.
/// Returns `None` for empty, unparseable or negative input, so a real zero stays
/// distinguishable from "could not determine".
pub fn parse_count(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '·')
        .collect();

    let multiplier = match cleaned.chars().last()? {
        'k' | 'K' => 1_000,
        'm' | 'M' => 1_000_000,
        'b' | 'B' => 1_000_000_000,
        _ => return cleaned.parse::<u64>().ok(),
    };

    let number = cleaned[..cleaned.len() - 1].trim_end();
    scale_decimal(number, multiplier)
}

// Works on the decimal digits directly so "4.1K" can't come out as 4099.
fn scale_decimal(number: &str, multiplier: u64) -> Option<u64> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole_value = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().ok()?
    };
    let mut scaled = whole_value.checked_mul(multiplier)?;

    let mut place = multiplier;
    for digit in fraction.chars() {
        place /= 10;
        if place == 0 {
            break;
        }
        scaled = scaled.checked_add(u64::from(digit.to_digit(10)?) * place)?;
    }

    Some(scaled)
}
