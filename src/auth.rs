//! JWT bearer-token authentication for the API.

use std::str::FromStr;

use axum::{
    Json, RequestPartsExt,
    extract::{FromRef, FromRequestParts, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use email_address::EmailAddress;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::{AppState, Error, models::UserId, stores::UserStore};

// Code in this module is adapted from https://github.com/ezesundayeze/axum--auth and https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

/// How long an issued bearer token stays valid.
const TOKEN_DURATION: Duration = Duration::minutes(15);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The expiry time of the token.
    pub exp: usize,
    /// The time the token was issued.
    pub iat: usize,
    /// The ID of the user the token was issued to.
    pub sub: UserId,
}

impl<S> FromRequestParts<S> for Claims
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        let state = AppState::from_ref(state);
        let token_data = decode_token(bearer.token(), state.decoding_key())?;

        Ok(token_data.claims)
    }
}

/// The credentials expected by the log in endpoint.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Email entered during log in.
    pub email: String,
    /// Password entered during log in.
    pub password: String,
}

/// The ways authentication can fail.
#[derive(Debug)]
pub enum AuthError {
    /// The email and password pair did not match a registered user.
    WrongCredentials,
    /// The request carried no usable bearer token.
    InvalidToken,
    /// The token could not be created.
    TokenCreation,
    /// Something unexpected went wrong while checking the credentials.
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::WrongCredentials => (StatusCode::UNAUTHORIZED, "Wrong credentials"),
            AuthError::InvalidToken => (StatusCode::BAD_REQUEST, "Invalid token"),
            AuthError::TokenCreation => (StatusCode::INTERNAL_SERVER_ERROR, "Token creation error"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Handler for log in requests: checks the credentials against the user store
/// and returns a fresh bearer token.
///
/// # Errors
///
/// This function will return an error if:
/// - The email is not a well-formed email address.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn log_in(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<String>, AuthError> {
    let email = EmailAddress::from_str(credentials.email.trim())
        .map_err(|_| AuthError::WrongCredentials)?;

    let user = state.user_store.get_by_email(&email).map_err(|error| match error {
        Error::UserNotFound => AuthError::WrongCredentials,
        error => {
            tracing::error!("Error matching user: {error}");
            AuthError::InternalError
        }
    })?;

    let password_is_correct = user.password_hash.verify(&credentials.password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        AuthError::InternalError
    })?;

    if !password_is_correct {
        return Err(AuthError::WrongCredentials);
    }

    let token = encode_token(&user.id, state.encoding_key())?;

    Ok(Json(token))
}

fn encode_token(user_id: &UserId, encoding_key: &EncodingKey) -> Result<String, AuthError> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        exp: (now + TOKEN_DURATION).unix_timestamp() as usize,
        iat: now.unix_timestamp() as usize,
        sub: user_id.clone(),
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|error| {
        tracing::error!("Error creating token: {error}");
        AuthError::TokenCreation
    })
}

fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<TokenData<Claims>, AuthError> {
    decode(token, decoding_key, &Validation::default()).map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod auth_tests {
    use std::str::FromStr;

    use axum::{
        Json, Router,
        http::StatusCode,
        routing::{get, post},
    };
    use axum_test::TestServer;
    use email_address::EmailAddress;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState, endpoints,
        models::{NewUser, PasswordHash, User, UserId},
        stores::UserStore,
    };

    use super::{Claims, decode_token, encode_token, log_in};

    const TEST_PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_app_state() -> AppState {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");

        AppState::new(db_connection, "foobar").expect("Could not create app state.")
    }

    fn create_test_user(state: &mut AppState) -> User {
        state
            .user_store
            .create(NewUser {
                name: "Ada".to_string(),
                email: EmailAddress::from_str("foo@bar.baz").unwrap(),
                password_hash: PasswordHash::from_raw_password(TEST_PASSWORD, 4).unwrap(),
                yearly_income: None,
            })
            .unwrap()
    }

    #[test]
    fn decode_token_gives_correct_user_id() {
        let state = get_test_app_state();
        let user_id = UserId::new_random();

        let token = encode_token(&user_id, state.encoding_key()).unwrap();
        let claims = decode_token(&token, state.decoding_key()).unwrap().claims;

        assert_eq!(claims.sub, user_id);
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let mut state = get_test_app_state();
        let test_user = create_test_user(&mut state);

        let app = Router::new()
            .route(endpoints::LOG_IN, post(log_in))
            .with_state(state);
        let server = TestServer::new(app);

        let response = server
            .post(endpoints::LOG_IN)
            .content_type("application/json")
            .json(&json!({
                "email": test_user.email.to_string(),
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status_ok();
        assert!(!response.json::<String>().is_empty());
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let app = Router::new()
            .route(endpoints::LOG_IN, post(log_in))
            .with_state(get_test_app_state());
        let server = TestServer::new(app);

        server
            .post(endpoints::LOG_IN)
            .content_type("application/json")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let mut state = get_test_app_state();
        let test_user = create_test_user(&mut state);

        let app = Router::new()
            .route(endpoints::LOG_IN, post(log_in))
            .with_state(state);
        let server = TestServer::new(app);

        server
            .post(endpoints::LOG_IN)
            .content_type("application/json")
            .json(&json!({
                "email": test_user.email.to_string(),
                "password": "definitelyNotTheCorrectPassword",
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let app = Router::new()
            .route(endpoints::LOG_IN, post(log_in))
            .with_state(get_test_app_state());
        let server = TestServer::new(app);

        server
            .post(endpoints::LOG_IN)
            .content_type("application/json")
            .json(&json!({
                "email": "wrongemail@gmail.com",
                "password": "definitelyNotTheCorrectPassword",
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    async fn handler_with_auth(_: Claims) -> Json<&'static str> {
        Json("Hello, World!")
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_jwt() {
        let mut state = get_test_app_state();
        let test_user = create_test_user(&mut state);

        let app = Router::new()
            .route(endpoints::LOG_IN, post(log_in))
            .route("/protected", get(handler_with_auth))
            .with_state(state);
        let server = TestServer::new(app);

        let response = server
            .post(endpoints::LOG_IN)
            .content_type("application/json")
            .json(&json!({
                "email": test_user.email.to_string(),
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status_ok();
        let token = response.json::<String>();

        server
            .get("/protected")
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn get_protected_route_with_missing_header() {
        let app = Router::new()
            .route("/protected", get(handler_with_auth))
            .with_state(get_test_app_state());
        let server = TestServer::new(app);

        server
            .get("/protected")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_protected_route_with_invalid_token() {
        let app = Router::new()
            .route("/protected", get(handler_with_auth))
            .with_state(get_test_app_state());
        let server = TestServer::new(app);

        server
            .get("/protected")
            .authorization_bearer("not-a-real-token")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
