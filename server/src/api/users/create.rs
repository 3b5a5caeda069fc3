use crate::api::{field_error, ErrorResponse};
use crate::auth::hash_password;
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewUser, User};
use crate::representations::UserResponse;
use crate::schema::users;
use crate::validation::{validate_password, validate_person_name, validate_username};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

const MAX_EMAIL_LENGTH: usize = 254;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

fn validate_email(value: &str) -> Result<(), String> {
    let valid = value.chars().count() <= MAX_EMAIL_LENGTH
        && value
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
    if !valid {
        return Err("Enter a valid email address.".to_string());
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn create_user(
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    if let Err(msg) = validate_username(&req.username) {
        return field_error("username", &msg);
    }
    if let Err(msg) = validate_email(&req.email) {
        return field_error("email", &msg);
    }
    if let Err(msg) = validate_password(&req.password) {
        return field_error("password", &msg);
    }
    let first_name = match validate_person_name(&req.first_name) {
        Ok(n) => n,
        Err(msg) => return field_error("first_name", &msg),
    };
    let last_name = match validate_person_name(&req.last_name) {
        Ok(n) => n,
        Err(msg) => return field_error("last_name", &msg),
    };

    let mut conn = get_conn!(pool);

    // Advisory pre-checks for friendlier field errors; the unique constraints
    // below are the authoritative guard against concurrent duplicates.
    let email_taken: Result<bool, _> = diesel::select(diesel::dsl::exists(
        users::table.filter(users::email.eq(&req.email)),
    ))
    .get_result(&mut conn);
    if let Ok(true) = email_taken {
        return field_error("email", "A user with this email already exists.");
    }
    let username_taken: Result<bool, _> = diesel::select(diesel::dsl::exists(
        users::table.filter(users::username.eq(&req.username)),
    ))
    .get_result(&mut conn);
    if let Ok(true) = username_taken {
        return field_error("username", "A user with this username already exists.");
    }

    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to hash password".to_string(),
                }),
            )
                .into_response();
        }
    };

    let new_user = NewUser {
        username: &req.username,
        first_name: &first_name,
        last_name: &last_name,
        email: &req.email,
        password_hash: &password_hash,
    };

    let user: User = match diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(&mut conn)
    {
        Ok(u) => u,
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return field_error("email", "A user with this email or username already exists.");
        }
        Err(e) => {
            tracing::error!("Failed to create user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create user".to_string(),
                }),
            )
                .into_response();
        }
    };

    let response = UserResponse {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        avatar: None,
        is_subscribed: false,
    };

    (StatusCode::CREATED, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("chef@example.com").is_ok());
        assert!(validate_email("chef@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("no-at-sign").is_err());
    }
}
