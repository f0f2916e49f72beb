use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::usermodel::*;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserDto {
    #[validate(length(min = 2, message = "Name must be at least 2 characters long"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email address")
    )]
    pub email: String,

    #[validate(length(
        min = 6,
        max = 50,
        message = "Password must be between 6 and 50 characters"
    ))]
    pub password: String,

    #[validate(url(message = "Profile picture must be a URL"))]
    pub profile_pic: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email address")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    #[validate(length(min = 2, message = "Name must be at least 2 characters long"))]
    pub name: Option<String>,

    pub profile_pic: Option<String>,

    pub current_password: Option<String>,

    #[validate(length(
        min = 6,
        max = 50,
        message = "Password must be between 6 and 50 characters"
    ))]
    pub new_password: Option<String>,
}

/// Admin-side user creation. An unknown or missing role falls back to customer.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserDto {
    #[validate(length(min = 2, message = "Name must be at least 2 characters long"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email address")
    )]
    pub email: String,

    #[validate(length(
        min = 6,
        max = 50,
        message = "Password must be between 6 and 50 characters"
    ))]
    pub password: String,

    pub role: Option<String>,

    pub profile_pic: Option<String>,
}

/// Admin-side update. Email and password are never changed through here.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUpdateUserDto {
    #[validate(length(min = 2, message = "Name must be at least 2 characters long"))]
    pub name: Option<String>,

    pub role: Option<String>,

    pub profile_pic: Option<String>,

    pub is_blocked: Option<bool>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordDto {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserQueryDto {
    pub role: Option<String>,
    pub q: Option<String>,
}

impl UserQueryDto {
    /// "All" or an empty value means no role filter.
    pub fn role_filter(&self) -> Result<Option<UserRole>, String> {
        match self.role.as_deref().map(str::trim) {
            None | Some("") | Some("All") => Ok(None),
            Some(value) => UserRole::parse(value)
                .map(Some)
                .ok_or_else(|| format!("Unknown role '{}'", value)),
        }
    }

    pub fn search(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub profile_pic: String,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            profile_pic: user.profile_pic.to_owned(),
            is_blocked: user.is_blocked,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub success: bool,
    pub users: Vec<FilterUserDto>,
    pub results: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub success: bool,
    pub token: String,
    pub user: FilterUserDto,
}

/// Normalizes an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_validation() {
        let dto = RegisterUserDto {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
            profile_pic: None,
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));

        let ok = RegisterUserDto {
            name: "Amina".to_string(),
            email: "amina@example.com".to_string(),
            password: "secret1".to_string(),
            profile_pic: None,
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn role_filter_accepts_all_and_rejects_unknown() {
        let all = UserQueryDto {
            role: Some("All".to_string()),
            q: None,
        };
        assert_eq!(all.role_filter(), Ok(None));

        let admin = UserQueryDto {
            role: Some("admin".to_string()),
            q: Some("  ".to_string()),
        };
        assert_eq!(admin.role_filter(), Ok(Some(UserRole::Admin)));
        assert_eq!(admin.search(), None);

        let bogus = UserQueryDto {
            role: Some("superuser".to_string()),
            q: None,
        };
        assert!(bogus.role_filter().is_err());
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Amina@Example.COM "), "amina@example.com");
    }
}
