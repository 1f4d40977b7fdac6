use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ()-]{5,19}$").unwrap());

static BLOCK_NAME_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Block [A-Z][0-9]*$").unwrap());

const BLOCK_PREFIX: &str = "Block ";

pub fn validate_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

pub fn validate_block_name(name: &str) -> bool {
    BLOCK_NAME_REGEX.is_match(name)
}

/// Короткий код блока: "Block A12" -> "A12", "a12" -> "a12"
pub fn block_code(input: &str) -> String {
    let trimmed = input.trim();
    match trimmed.get(..BLOCK_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BLOCK_PREFIX) => {
            trimmed[BLOCK_PREFIX.len()..].trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Полное имя блока: "A12" -> "Block A12"
pub fn block_label(input: &str) -> String {
    format!("{}{}", BLOCK_PREFIX, block_code(input).to_uppercase())
}

pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}

/// Пустая после обрезки строка считается отсутствующим значением
pub fn non_blank(input: Option<&str>) -> Option<String> {
    input.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
