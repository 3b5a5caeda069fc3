//! Field validation rules shared by the user and recipe endpoints.
//!
//! Each rule either accepts the value (returning it normalized where the rule
//! normalizes) or rejects it with a message suitable for a field-keyed 400 body.
//! Uniqueness is not checked here; handlers query the store and the unique
//! constraints are the final arbiter.

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 1440;

pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
pub const MAX_INGREDIENT_AMOUNT: i32 = 32000;

pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MAX_RECIPE_NAME_LENGTH: usize = 256;
pub const MIN_PERSON_NAME_LENGTH: usize = 2;
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const DEFAULT_RECIPES_LIMIT: i64 = 3;
pub const MAX_RECIPES_LIMIT: i64 = 100;

pub fn validate_username(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("Username cannot be empty.".to_string());
    }
    if value.chars().count() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Username cannot be longer than {} characters.",
            MAX_USERNAME_LENGTH
        ));
    }
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'));
    if !valid {
        return Err(
            "Username may only contain letters, digits and @/./+/-/_ characters.".to_string(),
        );
    }
    Ok(())
}

pub fn validate_password(value: &str) -> Result<(), String> {
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Err("Password cannot consist of digits only.".to_string());
    }
    if value.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LENGTH
        ));
    }
    // Lowercasing must change something, so at least one character is not
    // already lowercase (an uppercase letter in practice).
    if value.to_lowercase() == value {
        return Err("Password must contain at least one uppercase letter.".to_string());
    }
    Ok(())
}

/// Validates a first/last name and returns it trimmed and title-cased.
pub fn validate_person_name(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("This field cannot be empty.".to_string());
    }
    if trimmed.chars().count() < MIN_PERSON_NAME_LENGTH {
        return Err(format!(
            "Name must be at least {} characters long.",
            MIN_PERSON_NAME_LENGTH
        ));
    }
    let valid = trimmed
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-');
    if !valid {
        return Err("Name may only contain letters, spaces and hyphens.".to_string());
    }
    Ok(title_case(trimmed))
}

/// Capitalizes the first letter of every space- or hyphen-separated word and
/// lowercases the rest: "anna-maria the third" -> "Anna-Maria The Third".
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for c in value.chars() {
        if c == ' ' || c == '-' {
            out.push(c);
            at_word_start = true;
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

pub fn validate_cooking_time(value: i32) -> Result<(), String> {
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&value) {
        return Err(format!(
            "Cooking time must be between {} and {} minutes.",
            MIN_COOKING_TIME, MAX_COOKING_TIME
        ));
    }
    Ok(())
}

pub fn validate_ingredient_amount(value: i32) -> Result<(), String> {
    if !(MIN_INGREDIENT_AMOUNT..=MAX_INGREDIENT_AMOUNT).contains(&value) {
        return Err(format!(
            "Amount must be between {} and {}.",
            MIN_INGREDIENT_AMOUNT, MAX_INGREDIENT_AMOUNT
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_accepts_allowed_punctuation() {
        assert!(validate_username("chef.marie@example+tag_1-x").is_ok());
    }

    #[test]
    fn test_username_rejects_spaces_and_unicode() {
        assert!(validate_username("two words").is_err());
        assert!(validate_username("повар").is_err());
    }

    #[test]
    fn test_username_rejects_overlong() {
        let long = "a".repeat(MAX_USERNAME_LENGTH + 1);
        assert!(validate_username(&long).is_err());
        let max = "a".repeat(MAX_USERNAME_LENGTH);
        assert!(validate_username(&max).is_ok());
    }

    #[test]
    fn test_password_all_lowercase_fails() {
        assert!(validate_password("abcdefgh").is_err());
    }

    #[test]
    fn test_password_with_uppercase_passes() {
        assert!(validate_password("Abcdefgh").is_ok());
    }

    #[test]
    fn test_password_all_digits_fails() {
        assert!(validate_password("12345678").is_err());
    }

    #[test]
    fn test_password_too_short_fails() {
        assert!(validate_password("Abcdefg").is_err());
    }

    #[test]
    fn test_person_name_trims_and_title_cases() {
        assert_eq!(validate_person_name(" john ").unwrap(), "John");
        assert_eq!(validate_person_name("anna-maria").unwrap(), "Anna-Maria");
        assert_eq!(validate_person_name("VAN DER berg").unwrap(), "Van Der Berg");
    }

    #[test]
    fn test_person_name_rejects_short_and_nonalpha() {
        assert!(validate_person_name("  ").is_err());
        assert!(validate_person_name("a").is_err());
        assert!(validate_person_name("j0hn").is_err());
    }

    #[test]
    fn test_cooking_time_bounds() {
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(1).is_ok());
        assert!(validate_cooking_time(1440).is_ok());
        assert!(validate_cooking_time(1441).is_err());
    }

    #[test]
    fn test_amount_bounds() {
        assert!(validate_ingredient_amount(0).is_err());
        assert!(validate_ingredient_amount(1).is_ok());
        assert!(validate_ingredient_amount(32000).is_ok());
        assert!(validate_ingredient_amount(32001).is_err());
    }
}
