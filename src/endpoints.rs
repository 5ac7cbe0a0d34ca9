//! The API endpoint URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/user/{user_id}', use
//! [format_endpoint].

/// The route for registering a new user.
pub const REGISTER: &str = "/api/user/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/api/user/login";
/// The route for listing all users.
pub const USERS: &str = "/api/user/list";
/// The route for getting a single user.
pub const USER: &str = "/api/user/{user_id}";
/// The route for listing all expenses.
pub const EXPENSES: &str = "/api/expense/list";
/// The route for getting a single expense.
pub const EXPENSE: &str = "/api/expense/{expense_id}";
/// The route for creating an expense owned by a user.
pub const ADD_EXPENSE: &str = "/api/expense/add/{user_id}";
/// The route for updating the cost of an expense.
pub const UPDATE_EXPENSE: &str = "/api/expense/update/{expense_id}";
/// The route for deleting an expense.
pub const DELETE_EXPENSE: &str = "/api/expense/delete/{expense_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a substring that starts with a left brace, contains one or
/// more lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/user/{user_id}', '{user_id}' is the
/// parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::REGISTER);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN);
        assert_endpoint_is_valid_uri(endpoints::USERS);
        assert_endpoint_is_valid_uri(endpoints::USER);
        assert_endpoint_is_valid_uri(endpoints::EXPENSES);
        assert_endpoint_is_valid_uri(endpoints::EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::ADD_EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::UPDATE_EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::DELETE_EXPENSE);
    }

    #[test]
    fn format_endpoint_replaces_parameter() {
        let formatted = format_endpoint(endpoints::USER, "abc-123");

        assert_eq!(formatted, "/api/user/abc-123");
    }

    #[test]
    fn format_endpoint_returns_path_without_parameter_unchanged() {
        let formatted = format_endpoint(endpoints::USERS, "abc-123");

        assert_eq!(formatted, endpoints::USERS);
    }
}
