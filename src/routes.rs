//! The REST API routes and their JSON request handlers.
//!
//! Handlers stay thin: they validate the request data, call into the stores or
//! the [ExpenseEngine](crate::ExpenseEngine), and map the outcome to a status
//! code. All routes except registration and log in require a bearer token.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use email_address::EmailAddress;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::{self, Claims},
    endpoints,
    models::{Expense, ExpenseId, NewUser, PasswordHash, User, UserId},
    stores::{ExpenseStore, UserStore},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(auth::log_in))
        .route(endpoints::USERS, get(list_users))
        .route(endpoints::USER, get(get_user))
        .route(endpoints::EXPENSES, get(list_expenses))
        .route(endpoints::EXPENSE, get(get_expense))
        .route(endpoints::ADD_EXPENSE, post(add_expense))
        .route(endpoints::UPDATE_EXPENSE, put(update_expense))
        .route(endpoints::DELETE_EXPENSE, delete(delete_expense))
        .with_state(state)
}

/// The data for registering a new user.
#[derive(Debug, Deserialize)]
struct RegisterForm {
    name: String,
    email: String,
    password: String,
    yearly_income: Option<f64>,
}

/// A route handler for registering a new user.
///
/// The password hash is stored, never the password, and the returned user
/// record does not include the hash.
async fn register_user(
    State(mut state): State<AppState>,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse, Error> {
    let name = form.name.trim();
    if name.is_empty() {
        return Err(Error::EmptyUserName);
    }

    let email = EmailAddress::from_str(form.email.trim())
        .map_err(|_| Error::InvalidEmail(form.email.clone()))?;
    let password_hash =
        PasswordHash::from_raw_password(&form.password, PasswordHash::DEFAULT_COST)?;

    let user = state.user_store.create(NewUser {
        name: name.to_string(),
        email,
        password_hash,
        yearly_income: form.yearly_income,
    })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// A route handler for listing all users.
async fn list_users(
    State(state): State<AppState>,
    _claims: Claims,
) -> Result<Json<Vec<User>>, Error> {
    let users = state.user_store.list()?;

    Ok(Json(users))
}

/// A route handler for getting a single user, including the summary list of
/// the expenses they own.
async fn get_user(
    State(state): State<AppState>,
    _claims: Claims,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, Error> {
    let user = state.user_store.get(&user_id)?;

    Ok(Json(user))
}

/// A route handler for listing all expenses.
async fn list_expenses(
    State(state): State<AppState>,
    _claims: Claims,
) -> Result<Json<Vec<Expense>>, Error> {
    let expenses = state.expense_store.list()?;

    Ok(Json(expenses))
}

/// A route handler for getting a single canonical expense record.
async fn get_expense(
    State(state): State<AppState>,
    _claims: Claims,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Json<Expense>, Error> {
    let expense = state.expense_store.get(&expense_id)?;

    Ok(Json(expense))
}

/// The data for creating an expense.
#[derive(Debug, Deserialize)]
struct ExpenseForm {
    expense_name: String,
    cost: f64,
}

/// A route handler for creating an expense owned by the user in the path.
async fn add_expense(
    State(mut state): State<AppState>,
    _claims: Claims,
    Path(user_id): Path<UserId>,
    Json(form): Json<ExpenseForm>,
) -> Result<impl IntoResponse, Error> {
    let expense = state
        .engine
        .add_expense(&user_id, &form.expense_name, form.cost)?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// The data for updating the cost of an expense.
#[derive(Debug, Deserialize)]
struct UpdateCostForm {
    cost: f64,
}

/// A route handler for setting a new cost on an expense.
async fn update_expense(
    State(mut state): State<AppState>,
    _claims: Claims,
    Path(expense_id): Path<ExpenseId>,
    Json(form): Json<UpdateCostForm>,
) -> Result<Json<Expense>, Error> {
    let expense = state.engine.update_expense_cost(&expense_id, form.cost)?;

    Ok(Json(expense))
}

/// A route handler for deleting an expense.
async fn delete_expense(
    State(mut state): State<AppState>,
    _claims: Claims,
    Path(expense_id): Path<ExpenseId>,
) -> Result<impl IntoResponse, Error> {
    state.engine.delete_expense(&expense_id)?;

    Ok(Json(json!({
        "message": format!("deleted expense {expense_id}"),
    })))
}

#[cfg(test)]
mod route_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState, build_router,
        endpoints::{self, format_endpoint},
        models::Expense,
    };

    const TEST_PASSWORD: &str = "averysafeandsecurepassword";

    fn get_test_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = AppState::new(db_connection, "foobar").expect("Could not create app state.");

        TestServer::new(build_router(state))
    }

    /// Register a user and log them in, returning the user's ID and a bearer
    /// token for authenticated requests.
    async fn create_user_and_token(server: &TestServer) -> (String, String) {
        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Ada",
                "email": "ada@example.com",
                "password": TEST_PASSWORD,
                "yearly_income": 120_000.0,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let user_id = response.json::<Value>()["id"]
            .as_str()
            .expect("The registration response should contain the user ID.")
            .to_string();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "ada@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;
        response.assert_status_ok();

        (user_id, response.json::<String>())
    }

    /// Create an expense for `user_id` and return the record from the response.
    async fn create_expense(server: &TestServer, token: &str, user_id: &str) -> Expense {
        let response = server
            .post(&format_endpoint(endpoints::ADD_EXPENSE, user_id))
            .authorization_bearer(token)
            .json(&json!({
                "expense_name": "coffee",
                "cost": 3.5,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Expense>()
    }

    #[tokio::test]
    async fn register_creates_user() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Ada",
                "email": "ada@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let user = response.json::<Value>();
        assert_eq!(user["name"], "Ada");
        assert_eq!(user["email"], "ada@example.com");
        assert_eq!(user["yearly_income"], Value::Null);
        assert!(user["expense_summaries"].as_array().unwrap().is_empty());
        // The password hash must never leave the server.
        assert!(user.get("password").is_none());
        assert!(user.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn register_fails_with_duplicate_email() {
        let server = get_test_server();
        create_user_and_token(&server).await;

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Also Ada",
                "email": "ada@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_fails_with_invalid_email() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Ada",
                "email": "not-an-email",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_fails_with_weak_password() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "Ada",
                "email": "ada@example.com",
                "password": "short",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_fails_with_empty_name() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({
                "name": "  ",
                "email": "ada@example.com",
                "password": TEST_PASSWORD,
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_users_returns_all_users() {
        let server = get_test_server();
        let (_, token) = create_user_and_token(&server).await;

        let response = server
            .get(endpoints::USERS)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let users = response.json::<Value>();
        assert_eq!(users.as_array().unwrap().len(), 1);
        assert_eq!(users[0]["email"], "ada@example.com");
    }

    #[tokio::test]
    async fn get_user_returns_user_with_summaries() {
        let server = get_test_server();
        let (user_id, token) = create_user_and_token(&server).await;
        let expense = create_expense(&server, &token, &user_id).await;

        let response = server
            .get(&format_endpoint(endpoints::USER, &user_id))
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        let user = response.json::<Value>();
        assert_eq!(user["id"], user_id.as_str());

        let summaries = user["expense_summaries"].as_array().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0]["id"], expense.id.as_str());
        assert_eq!(summaries[0]["name"], "coffee");
        assert_eq!(summaries[0]["cost"], 3.5);
    }

    #[tokio::test]
    async fn get_user_fails_with_unknown_id() {
        let server = get_test_server();
        let (_, token) = create_user_and_token(&server).await;

        server
            .get(&format_endpoint(endpoints::USER, "does-not-exist"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn add_expense_creates_expense() {
        let server = get_test_server();
        let (user_id, token) = create_user_and_token(&server).await;

        let expense = create_expense(&server, &token, &user_id).await;

        assert_eq!(expense.owner_id.as_str(), user_id);
        assert_eq!(expense.name.as_ref(), "coffee");
        assert_eq!(expense.cost, 3.5);

        server
            .get(&format_endpoint(endpoints::EXPENSE, expense.id.as_str()))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn add_expense_fails_with_unknown_owner() {
        let server = get_test_server();
        let (_, token) = create_user_and_token(&server).await;

        server
            .post(&format_endpoint(endpoints::ADD_EXPENSE, "does-not-exist"))
            .authorization_bearer(&token)
            .json(&json!({
                "expense_name": "coffee",
                "cost": 3.5,
            }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn add_expense_fails_with_negative_cost() {
        let server = get_test_server();
        let (user_id, token) = create_user_and_token(&server).await;

        server
            .post(&format_endpoint(endpoints::ADD_EXPENSE, &user_id))
            .authorization_bearer(&token)
            .json(&json!({
                "expense_name": "coffee",
                "cost": -3.5,
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn add_expense_fails_with_empty_name() {
        let server = get_test_server();
        let (user_id, token) = create_user_and_token(&server).await;

        server
            .post(&format_endpoint(endpoints::ADD_EXPENSE, &user_id))
            .authorization_bearer(&token)
            .json(&json!({
                "expense_name": "   ",
                "cost": 3.5,
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_expenses_returns_all_expenses() {
        let server = get_test_server();
        let (user_id, token) = create_user_and_token(&server).await;
        create_expense(&server, &token, &user_id).await;

        let response = server
            .get(endpoints::EXPENSES)
            .authorization_bearer(&token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Vec<Expense>>().len(), 1);
    }

    #[tokio::test]
    async fn get_expense_fails_with_unknown_id() {
        let server = get_test_server();
        let (_, token) = create_user_and_token(&server).await;

        server
            .get(&format_endpoint(endpoints::EXPENSE, "does-not-exist"))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_expense_changes_cost_everywhere() {
        let server = get_test_server();
        let (user_id, token) = create_user_and_token(&server).await;
        let expense = create_expense(&server, &token, &user_id).await;

        let response = server
            .put(&format_endpoint(endpoints::UPDATE_EXPENSE, expense.id.as_str()))
            .authorization_bearer(&token)
            .json(&json!({ "cost": 4.25 }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Expense>().cost, 4.25);

        let canonical = server
            .get(&format_endpoint(endpoints::EXPENSE, expense.id.as_str()))
            .authorization_bearer(&token)
            .await
            .json::<Expense>();
        assert_eq!(canonical.cost, 4.25);

        let user = server
            .get(&format_endpoint(endpoints::USER, &user_id))
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        assert_eq!(user["expense_summaries"][0]["cost"], 4.25);
    }

    #[tokio::test]
    async fn update_expense_fails_with_unknown_id() {
        let server = get_test_server();
        let (_, token) = create_user_and_token(&server).await;

        server
            .put(&format_endpoint(endpoints::UPDATE_EXPENSE, "does-not-exist"))
            .authorization_bearer(&token)
            .json(&json!({ "cost": 4.25 }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_expense_removes_expense_and_summary() {
        let server = get_test_server();
        let (user_id, token) = create_user_and_token(&server).await;
        let expense = create_expense(&server, &token, &user_id).await;

        server
            .delete(&format_endpoint(endpoints::DELETE_EXPENSE, expense.id.as_str()))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        server
            .get(&format_endpoint(endpoints::EXPENSE, expense.id.as_str()))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let user = server
            .get(&format_endpoint(endpoints::USER, &user_id))
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        assert!(user["expense_summaries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_expense_fails_the_second_time() {
        let server = get_test_server();
        let (user_id, token) = create_user_and_token(&server).await;
        let expense = create_expense(&server, &token, &user_id).await;
        let endpoint = format_endpoint(endpoints::DELETE_EXPENSE, expense.id.as_str());

        server
            .delete(&endpoint)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        server
            .delete(&endpoint)
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn expense_routes_require_a_token() {
        let server = get_test_server();

        server
            .get(endpoints::EXPENSES)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
