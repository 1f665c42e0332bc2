use matselect::core::models::requirement::FlatValue;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid format '{0}'. Expected KEY=VALUE (e.g., 'max_density=3.0').")]
    MissingSeparator(String),

    #[error("Key cannot be empty in '{0}'.")]
    EmptyKey(String),

    #[error("Value cannot be empty for key '{0}'.")]
    EmptyValue(String),

    #[error("Invalid number '{value}' for '{key}'.")]
    InvalidNumber { key: String, value: String },
}

/// Splits `KEY=VALUE` on the first `=`, trimming both sides.
pub fn parse_key_value(input: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| ParseError::MissingSeparator(input.to_string()))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() {
        return Err(ParseError::EmptyKey(input.to_string()));
    }
    if value.is_empty() {
        return Err(ParseError::EmptyValue(key.to_string()));
    }
    Ok((key, value))
}

/// Parses a `-r` requirement such as `max_density=3.0`, `corrosion_resistance=good` or
/// `elements=Fe,Ni`.
pub fn parse_requirement(input: &str) -> Result<(String, FlatValue), ParseError> {
    let (key, value) = parse_key_value(input)?;
    let flat = if let Ok(number) = value.parse::<f64>() {
        FlatValue::Number(number)
    } else if value.contains(',') || key == "elements" {
        FlatValue::List(
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    } else {
        FlatValue::Text(value.to_string())
    };
    Ok((key.to_string(), flat))
}

/// Parses a numeric `-S` value.
pub fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}
