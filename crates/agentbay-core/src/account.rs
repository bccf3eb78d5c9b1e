// Sign-up and sign-in forms, and the local account profile.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::form::{non_blank, FormError};

pub const MIN_PASSWORD_LEN: usize = 8;

/// What the user intends to do on the marketplace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Buyer,
    Seller,
}

impl UserType {
    pub fn toggle(self) -> Self {
        match self {
            UserType::Buyer => UserType::Seller,
            UserType::Seller => UserType::Buyer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Buyer => "buyer",
            UserType::Seller => "seller",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        if s.eq_ignore_ascii_case("seller") {
            UserType::Seller
        } else {
            UserType::Buyer
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Buyer => write!(f, "Buy items"),
            UserType::Seller => write!(f, "Sell items"),
        }
    }
}

/// A locally stored profile. Passwords are never kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub user_type: UserType,
}

impl Account {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub user_type: UserType,
    pub agree_to_terms: bool,
}

impl SignupForm {
    /// The "Create Account" action stays disabled until the terms box is
    /// ticked.
    pub fn can_submit(&self) -> bool {
        self.agree_to_terms
    }

    pub fn validate(&self) -> Result<Account, FormError> {
        if !self.agree_to_terms {
            return Err(FormError::TermsNotAccepted);
        }
        let fields = [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.password,
            &self.confirm_password,
        ];
        if fields.iter().any(|f| non_blank(f).is_none()) {
            return Err(FormError::MissingFields);
        }
        let email = self.email.trim();
        if !is_plausible_email(email) {
            return Err(FormError::InvalidEmail);
        }
        if self.password != self.confirm_password {
            return Err(FormError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }

        Ok(Account {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: email.to_lowercase(),
            user_type: self.user_type,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SigninForm {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

impl SigninForm {
    /// Returns the normalized email on success.
    pub fn validate(&self) -> Result<String, FormError> {
        let email = non_blank(&self.email).ok_or(FormError::Required { field: "email" })?;
        if self.password.is_empty() {
            return Err(FormError::Required { field: "password" });
        }
        if !is_plausible_email(email) {
            return Err(FormError::InvalidEmail);
        }
        Ok(email.to_lowercase())
    }
}

/// `local@domain.tld`: a non-empty local part, exactly one `@`, and a dot
/// inside the domain with text on both sides.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.contains(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
