use std::time::Instant;

use chrono::{Datelike, Local};

pub const MIN_BIRTH_YEAR: i32 = 1900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountField {
    #[default]
    DisplayName,
    BirthYear,
}

/// Anonymous-account form. Its status line is separate from the error banner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountForm {
    pub display_name: String,
    pub birth_year: String,
    pub field: AccountField,
    pub status: String,
    pub submitting: bool,
    pub close_at: Option<Instant>,
}

impl AccountForm {
    pub fn active_value_mut(&mut self) -> &mut String {
        match self.field {
            AccountField::DisplayName => &mut self.display_name,
            AccountField::BirthYear => &mut self.birth_year,
        }
    }

    pub fn next_field(&mut self) {
        self.field = match self.field {
            AccountField::DisplayName => AccountField::BirthYear,
            AccountField::BirthYear => AccountField::DisplayName,
        };
    }

    pub fn is_locked(&self) -> bool {
        self.submitting || self.close_at.is_some()
    }
}

/// Validate sign-up input; on success returns the trimmed name and the year.
pub fn validate_account_input(
    display_name: &str,
    birth_year: &str,
    current_year: i32,
) -> Result<(String, i32), String> {
    let name = display_name.trim();
    if name.is_empty() {
        return Err("Please enter your name.".to_string());
    }

    match birth_year.trim().parse::<i32>() {
        Ok(year) if (MIN_BIRTH_YEAR..=current_year).contains(&year) => {
            Ok((name.to_string(), year))
        }
        _ => Err("Please enter a valid birth year.".to_string()),
    }
}

pub fn current_year() -> i32 {
    Local::now().year()
}

/// Form for adopting an existing user id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub uid: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required() {
        assert_eq!(
            validate_account_input("   ", "1990", 2026),
            Err("Please enter your name.".to_string())
        );
    }

    #[test]
    fn birth_year_must_be_in_range() {
        assert!(validate_account_input("Ada", "1899", 2026).is_err());
        assert!(validate_account_input("Ada", "2027", 2026).is_err());
        assert!(validate_account_input("Ada", "nineteen", 2026).is_err());
        assert_eq!(
            validate_account_input(" Ada ", " 1900 ", 2026),
            Ok(("Ada".to_string(), 1900))
        );
        assert_eq!(
            validate_account_input("Ada", "2026", 2026),
            Ok(("Ada".to_string(), 2026))
        );
    }

    #[test]
    fn tab_cycles_between_fields() {
        let mut form = AccountForm::default();
        form.active_value_mut().push_str("Ada");
        form.next_field();
        form.active_value_mut().push_str("1990");
        form.next_field();
        assert_eq!(form.field, AccountField::DisplayName);
        assert_eq!(form.display_name, "Ada");
        assert_eq!(form.birth_year, "1990");
    }
}
