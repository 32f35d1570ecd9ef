//! Implements registration, log in, and the bearer token authentication used
//! by the protected API routes.

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

use crate::{
    Error,
    models::{PasswordHash, User, UserID},
    state::{AppState, JwtKeys},
    stores::{CategoryStore, TransactionStore, UserStore},
};

/// How long a token stays valid after it is issued.
const TOKEN_DURATION: Duration = Duration::hours(24);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
    /// Email associated with the token.
    pub email: EmailAddress,
}

impl<S> FromRequestParts<S> for Claims
where
    JwtKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;

        let jwt_keys = JwtKeys::from_ref(state);

        let token_data = decode_jwt(bearer.token(), &jwt_keys.decoding_key)?;

        Ok(token_data.claims)
    }
}

/// The errors that can occur while authenticating a request.
#[derive(Debug, PartialEq)]
pub enum AuthError {
    /// The email/password combination did not match a registered user.
    WrongCredentials,
    /// The bearer token was missing, malformed, or expired.
    InvalidToken,
    /// A token could not be created for a user.
    TokenCreation,
    /// A valid token referred to a user that no longer resolves.
    UnknownUser,
    /// An unexpected error occurred in the auth layer.
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AuthError::WrongCredentials => (StatusCode::UNAUTHORIZED, "Wrong credentials"),
            AuthError::InvalidToken => (StatusCode::BAD_REQUEST, "Invalid token"),
            AuthError::TokenCreation => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Token creation error")
            }
            AuthError::UnknownUser => (StatusCode::UNAUTHORIZED, "Unknown user"),
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

/// The request body for registering a new user.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// The email address to register with.
    pub email: String,
    /// The password to register with.
    pub password: String,
}

/// The email and password entered during log in.
#[derive(Debug, Serialize, Deserialize)]
pub struct Credentials {
    /// Email entered during log in.
    pub email: EmailAddress,
    /// Password entered during log in.
    pub password: String,
}

/// The transport representation of a user, without credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    /// The ID of the user.
    pub id: UserID,
    /// The email address of the user.
    pub email: EmailAddress,
}

/// The response to a successful registration or log in.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The bearer token to authenticate follow-up requests with.
    pub access_token: String,
    /// The user the token was issued for.
    pub user: UserData,
}

/// A route handler for registering a new user.
///
/// Responds with an [AuthResponse] so that a freshly registered client is
/// immediately logged in.
pub async fn register_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    Json(request): Json<RegisterRequest>,
) -> Response
where
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let email = match request.email.parse::<EmailAddress>() {
        Ok(email) => email,
        Err(error) => return Error::InvalidEmail(error.to_string()).into_response(),
    };

    let password_hash =
        match PasswordHash::from_raw_password(&request.password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => password_hash,
            Err(error) => {
                tracing::error!("an error occurred while hashing a password: {error}");
                return AuthError::InternalError.into_response();
            }
        };

    let mut user_store = state.user_store;

    match user_store.create(email, password_hash) {
        Ok(user) => match issue_token_response(&user, &state.jwt_keys) {
            Ok(response) => response,
            Err(error) => error.into_response(),
        },
        Err(error) => error.into_response(),
    }
}

/// Handler for log in requests.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The email does not belong to a registered user.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn log_in_endpoint<C, T, U>(
    State(state): State<AppState<C, T, U>>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AuthError>
where
    C: CategoryStore + Clone + Send + Sync,
    T: TransactionStore + Clone + Send + Sync,
    U: UserStore + Clone + Send + Sync,
{
    let user = state
        .user_store
        .get_by_email(&credentials.email)
        .map_err(|error| match error {
            // A missing user and a wrong password respond identically so that
            // log in attempts cannot be used to find registered emails.
            Error::NotFound => AuthError::WrongCredentials,
            error => {
                tracing::error!("Error matching user: {error}");
                AuthError::InternalError
            }
        })?;

    let password_is_correct = user
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| {
            tracing::error!("Error verifying password: {error}");
            AuthError::InternalError
        })?;

    if password_is_correct {
        issue_token_response(&user, &state.jwt_keys)
    } else {
        Err(AuthError::WrongCredentials)
    }
}

/// Resolve the acting user for a set of token claims.
///
/// The resolved user should be passed explicitly into the service functions,
/// which never read the current user from any ambient state.
///
/// # Errors
///
/// Returns an [AuthError::UnknownUser] if the claims refer to an email address
/// with no matching user.
pub fn resolve_user<U: UserStore>(claims: &Claims, user_store: &U) -> Result<User, AuthError> {
    user_store
        .get_by_email(&claims.email)
        .map_err(|error| match error {
            Error::NotFound => AuthError::UnknownUser,
            error => {
                tracing::error!("could not resolve the user for a valid token: {error}");
                AuthError::InternalError
            }
        })
}

fn issue_token_response(user: &User, jwt_keys: &JwtKeys) -> Result<Response, AuthError> {
    let access_token = encode_jwt(&user.email, &jwt_keys.encoding_key)?;

    let response = AuthResponse {
        access_token,
        user: UserData {
            id: user.id,
            email: user.email.clone(),
        },
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

fn encode_jwt(email: &EmailAddress, encoding_key: &EncodingKey) -> Result<String, AuthError> {
    let now = OffsetDateTime::now_utc();
    let exp = (now + TOKEN_DURATION).unix_timestamp() as usize;
    let iat = now.unix_timestamp() as usize;
    let claims = Claims {
        exp,
        iat,
        email: email.to_owned(),
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|_| AuthError::TokenCreation)
}

fn decode_jwt(jwt_token: &str, decoding_key: &DecodingKey) -> Result<TokenData<Claims>, AuthError> {
    decode(jwt_token, decoding_key, &Validation::default()).map_err(|_| AuthError::InvalidToken)
}


#[cfg(test)]
mod auth_endpoint_tests {
    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        models::PasswordHash,
        routes::endpoints,
        stores::UserStore,
        test_utils::get_test_app_state,
    };

    use super::{AuthResponse, Claims};

    async fn handler_with_auth(_: Claims) -> StatusCode {
        StatusCode::OK
    }

    #[tokio::test]
    async fn register_returns_token_and_user() {
        let app = crate::build_router(get_test_app_state());
        let server = TestServer::new(app);

        let response = server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .json(&json!({
                "email": "test@test.com",
                "password": "averysafeandsecurepassword",
            }))
            .await;

        response.assert_status_ok();

        let auth_response = response.json::<AuthResponse>();
        assert_eq!(auth_response.user.email.as_str(), "test@test.com");
        assert!(!auth_response.access_token.is_empty());
    }

    #[tokio::test]
    async fn register_fails_with_invalid_email() {
        let app = crate::build_router(get_test_app_state());
        let server = TestServer::new(app);

        server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .json(&json!({
                "email": "definitely not an email",
                "password": "averysafeandsecurepassword",
            }))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn register_fails_with_duplicate_email() {
        let app = crate::build_router(get_test_app_state());
        let server = TestServer::new(app);

        let request = json!({
            "email": "test@test.com",
            "password": "averysafeandsecurepassword",
        });

        server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .json(&request)
            .await
            .assert_status_ok();

        server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .json(&request)
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let state = get_test_app_state();
        let mut user_store = state.user_store.clone();
        user_store
            .create(
                "foo@bar.baz".parse().unwrap(),
                PasswordHash::from_raw_password("averysafeandsecurepassword", 4).unwrap(),
            )
            .unwrap();

        let app = crate::build_router(state);
        let server = TestServer::new(app);

        server
            .post(endpoints::LOG_IN)
            .content_type("application/json")
            .json(&json!({
                "email": "foo@bar.baz",
                "password": "averysafeandsecurepassword",
            }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn log_in_fails_with_wrong_password() {
        let state = get_test_app_state();
        let mut user_store = state.user_store.clone();
        user_store
            .create(
                "foo@bar.baz".parse().unwrap(),
                PasswordHash::from_raw_password("averysafeandsecurepassword", 4).unwrap(),
            )
            .unwrap();

        let app = crate::build_router(state);
        let server = TestServer::new(app);

        server
            .post(endpoints::LOG_IN)
            .content_type("application/json")
            .json(&json!({
                "email": "foo@bar.baz",
                "password": "definitelyNotTheCorrectPassword",
            }))
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn log_in_fails_with_unregistered_email() {
        let app = crate::build_router(get_test_app_state());
        let server = TestServer::new(app);

        server
            .post(endpoints::LOG_IN)
            .content_type("application/json")
            .json(&json!({
                "email": "wrongemail@gmail.com",
                "password": "definitelyNotTheCorrectPassword",
            }))
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn get_protected_route_with_valid_jwt() {
        let state = get_test_app_state();
        let app = Router::new()
            .route("/protected", get(handler_with_auth))
            .with_state(state.clone());
        let server = TestServer::new(app);

        let auth_app = crate::build_router(state);
        let auth_server = TestServer::new(auth_app);
        let token = auth_server
            .post(endpoints::REGISTER)
            .content_type("application/json")
            .json(&json!({
                "email": "test@test.com",
                "password": "averysafeandsecurepassword",
            }))
            .await
            .json::<AuthResponse>()
            .access_token;

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
    async fn get_protected_route_with_garbage_token() {
        let app = Router::new()
            .route("/protected", get(handler_with_auth))
            .with_state(get_test_app_state());
        let server = TestServer::new(app);

        server
            .get("/protected")
            .authorization_bearer("not.a.token")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
