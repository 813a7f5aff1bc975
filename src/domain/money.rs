use std::fmt;

/// Money is represented as integer cents to avoid floating-point drift in the
/// balance ledger. R$ 1.234,56 = 123456 cents.
pub type Cents = i64;

/// Format cents with fixed two decimals. Example: 5000 -> "50.00".
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse a monetary amount into cents. Accepts both `.` and `,` as the
/// decimal separator ("1234.56" and "1234,56" are the same amount); more
/// than two decimal digits truncate.
pub fn parse_amount(input: &str) -> Result<Cents, ParseAmountError> {
    let input = input.trim().replace(',', ".");

    let parts: Vec<&str> = input.split('.').collect();
    match parts.len() {
        1 => {
            let units: i64 = parts[0]
                .parse()
                .map_err(|_| ParseAmountError::InvalidFormat)?;
            if units < 0 {
                return Err(ParseAmountError::Negative);
            }
            Ok(units * 100)
        }
        2 => {
            if parts[0].starts_with('-') {
                return Err(ParseAmountError::Negative);
            }
            let units: i64 = if parts[0].is_empty() {
                0
            } else {
                parts[0]
                    .parse()
                    .map_err(|_| ParseAmountError::InvalidFormat)?
            };

            let decimal_str = parts[1];
            let decimal_cents: i64 = match decimal_str.len() {
                0 => 0,
                1 => {
                    // A single digit like "5" means 50 cents.
                    decimal_str
                        .parse::<i64>()
                        .map_err(|_| ParseAmountError::InvalidFormat)?
                        * 10
                }
                2 => decimal_str
                    .parse()
                    .map_err(|_| ParseAmountError::InvalidFormat)?,
                _ => decimal_str[..2]
                    .parse()
                    .map_err(|_| ParseAmountError::InvalidFormat)?,
            };
            if decimal_cents < 0 {
                return Err(ParseAmountError::InvalidFormat);
            }

            Ok(units * 100 + decimal_cents)
        }
        _ => Err(ParseAmountError::InvalidFormat),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
    Negative,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
            ParseAmountError::Negative => write!(f, "amount cannot be negative"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(100), "1.00");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
    }

    #[test]
    fn test_parse_amount_dot_separator() {
        assert_eq!(parse_amount("50.00"), Ok(5000));
        assert_eq!(parse_amount("50"), Ok(5000));
        assert_eq!(parse_amount("12.34"), Ok(1234));
        assert_eq!(parse_amount("12.5"), Ok(1250));
        assert_eq!(parse_amount("0.01"), Ok(1));
        assert_eq!(parse_amount(".50"), Ok(50));
        assert_eq!(parse_amount("100.999"), Ok(10099)); // Truncates
    }

    #[test]
    fn test_parse_amount_comma_separator() {
        assert_eq!(parse_amount("50,00"), Ok(5000));
        assert_eq!(parse_amount("1234,56"), Ok(123456));
        assert_eq!(parse_amount("0,5"), Ok(50));
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("12.34.56").is_err());
        assert!(parse_amount("").is_err());
        assert_eq!(parse_amount("-50.00"), Err(ParseAmountError::Negative));
        assert_eq!(parse_amount("-50"), Err(ParseAmountError::Negative));
    }
}
