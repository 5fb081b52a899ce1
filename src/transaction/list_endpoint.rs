//! Defines the endpoints for reading transactions.

use axum::{Extension, extract::State, response::Response};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    Error,
    app_state::lock_connection,
    auth::UserID,
    database_id::DatabaseId,
    date_range::DateRange,
    extract::{PathParam, ValidatedQuery},
    pagination::PageInfo,
    response::ok,
    transaction::{
        Transaction, TransactionFilter, TransactionState, TransactionType, get_transaction,
        list_transactions,
    },
};

/// The filters and paging for the transaction list.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    /// Only include this type of transaction.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// Only include this category.
    pub category: Option<String>,
    /// The earliest date to include.
    pub start_date: Option<String>,
    /// The latest date to include.
    pub end_date: Option<String>,
    /// The one-based page number.
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<u64>,
    /// The number of transactions per page.
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
struct TransactionList {
    transactions: Vec<Transaction>,
    pagination: PageInfo,
}

/// A route handler for listing the user's transactions, newest first.
///
/// # Errors
///
/// Returns a 400 error if a filter is malformed.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ValidatedQuery(query): ValidatedQuery<TransactionQuery>,
) -> Result<Response, Error> {
    let filter = TransactionFilter {
        kind: query.kind,
        category: query
            .category
            .map(|category| category.trim().to_owned())
            .filter(|category| !category.is_empty()),
        range: DateRange::parse(query.start_date.as_deref(), query.end_date.as_deref())?,
    };
    let page = state.pagination_config.resolve(query.page, query.limit);

    let connection = lock_connection(&state.db_connection)?;
    let (transactions, total) = list_transactions(user_id, &filter, page, &connection)?;

    Ok(ok(TransactionList {
        transactions,
        pagination: PageInfo::new(page, total),
    }))
}

/// A route handler for getting one of the user's transactions.
///
/// # Errors
///
/// Returns a 404 error if the user has no transaction with the ID.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    PathParam(transaction_id): PathParam<DatabaseId>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transaction = get_transaction(transaction_id, user_id, &connection)?;

    Ok(ok(transaction))
}

#[cfg(test)]
mod list_transactions_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        app_state::test_utils::{TestUser, get_test_server, register_test_user},
        endpoints::{self, format_endpoint},
    };

    async fn post_transaction(
        server: &TestServer,
        user: &TestUser,
        kind: &str,
        amount: f64,
        category: &str,
        date: &str,
    ) -> i64 {
        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&user.access_token)
            .json(&json!({
                "type": kind,
                "amount": amount,
                "category": category,
                "date": date,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        response.json::<Value>()["data"]["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn lists_newest_first_with_pagination() {
        let server = get_test_server();
        let user = register_test_user(&server, "jane@example.com").await;
        for day in 1..=3 {
            post_transaction(&server, &user, "expense", 10.0, "food", &format!("2025-01-0{day}"))
                .await;
        }

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&user.access_token)
            .add_query_param("limit", 2)
            .await;

        response.assert_status_ok();
        let data = &response.json::<Value>()["data"];
        let dates: Vec<&str> = data["transactions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|transaction| transaction["date"].as_str().unwrap())
            .collect();
        assert_eq!(dates, vec!["2025-01-03", "2025-01-02"]);
        assert_eq!(
            data["pagination"],
            json!({ "page": 1, "limit": 2, "total": 3, "pages": 2 })
        );
    }

    #[tokio::test]
    async fn filters_by_type_category_and_date() {
        let server = get_test_server();
        let user = register_test_user(&server, "jane@example.com").await;
        post_transaction(&server, &user, "expense", 10.0, "food", "2025-01-05").await;
        post_transaction(&server, &user, "expense", 20.0, "travel", "2025-01-06").await;
        post_transaction(&server, &user, "income", 30.0, "salary", "2025-01-07").await;
        post_transaction(&server, &user, "expense", 40.0, "food", "2025-02-01").await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&user.access_token)
            .add_query_param("type", "expense")
            .add_query_param("category", "food")
            .add_query_param("startDate", "2025-01-01")
            .add_query_param("endDate", "2025-01-31")
            .await;

        response.assert_status_ok();
        let data = &response.json::<Value>()["data"];
        assert_eq!(data["pagination"]["total"], 1);
        assert_eq!(data["transactions"][0]["amount"], 10.0);
    }

    #[tokio::test]
    async fn rejects_page_beyond_addressable_range() {
        let server = get_test_server();
        let user = register_test_user(&server, "jane@example.com").await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&user.access_token)
            .add_query_param("page", u64::MAX)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["status"], "error");
    }

    #[tokio::test]
    async fn rejects_malformed_date_filter() {
        let server = get_test_server();
        let user = register_test_user(&server, "jane@example.com").await;

        server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&user.access_token)
            .add_query_param("startDate", "not-a-date")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn round_trips_a_transaction() {
        let server = get_test_server();
        let user = register_test_user(&server, "jane@example.com").await;
        let id = post_transaction(&server, &user, "income", 1234.56, "salary", "2025-03-31").await;

        let response = server
            .get(&format_endpoint(endpoints::TRANSACTION, id))
            .authorization_bearer(&user.access_token)
            .await;

        response.assert_status_ok();
        let data = &response.json::<Value>()["data"];
        assert_eq!(data["type"], "income");
        assert_eq!(data["amount"], 1234.56);
        assert_eq!(data["category"], "salary");
        assert_eq!(data["date"], "2025-03-31");
    }

    #[tokio::test]
    async fn other_users_transactions_are_not_found() {
        let server = get_test_server();
        let owner = register_test_user(&server, "jane@example.com").await;
        let other = register_test_user(&server, "john@example.com").await;
        let id = post_transaction(&server, &owner, "expense", 5.0, "food", "2025-01-01").await;

        server
            .get(&format_endpoint(endpoints::TRANSACTION, id))
            .authorization_bearer(&other.access_token)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        let response = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&other.access_token)
            .await;
        assert_eq!(response.json::<Value>()["data"]["pagination"]["total"], 0);
    }
}
