//! Line protocol integration tests

use serde_json::{json, Value};

use lms_engine::{api, config::AppConfig, services::Services};

async fn open_services(dir: &tempfile::TempDir) -> Services {
    let mut config =
        AppConfig::with_database_url(format!("sqlite://{}", dir.path().join("library.db").display()));
    config.auth.bootstrap_login = Some("admin".to_string());
    config.auth.bootstrap_password = Some("admin".to_string());
    Services::open(&config).await.expect("Failed to open services")
}

/// Feed `input` through the protocol loop and decode every response line
async fn run(services: &mut Services, input: &str) -> Vec<Value> {
    let mut output = Vec::new();
    api::serve(services, input.as_bytes(), &mut output)
        .await
        .expect("Failed to serve");

    String::from_utf8(output)
        .expect("Response is not UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Response is not JSON"))
        .collect()
}

async fn call(services: &mut Services, request: Value) -> Value {
    let mut responses = run(services, &format!("{}\n", request)).await;
    assert_eq!(responses.len(), 1);
    responses.remove(0)
}

#[tokio::test]
async fn test_checkout_flow_over_protocol() {
    let dir = tempfile::tempdir().unwrap();
    let mut services = open_services(&dir).await;

    let added = call(
        &mut services,
        json!({"id": 1, "method": "addBook", "title": "Dune", "isbn": "0441013593", "author": "Herbert", "genre": "Science"}),
    )
    .await;
    assert_eq!(added["success"], true);
    assert_eq!(added["data"]["book"]["genre"], "science");
    let book_id = added["data"]["book"]["id"].as_i64().unwrap();

    let member = call(
        &mut services,
        json!({"id": 2, "method": "addMember", "name": "Ada", "address": "1 Infinite Loop"}),
    )
    .await;
    let member_id = member["data"]["member"]["id"].as_i64().unwrap();

    let checkout = call(
        &mut services,
        json!({"id": 3, "method": "checkoutBook", "bookID": book_id, "memberID": member_id}),
    )
    .await;
    assert_eq!(checkout["id"], 3);
    assert_eq!(checkout["success"], true);

    let again = call(
        &mut services,
        json!({"id": 4, "method": "checkoutBook", "bookID": book_id, "memberID": member_id}),
    )
    .await;
    assert_eq!(again["success"], false);
    assert_eq!(again["code"], 7);

    let books = call(&mut services, json!({"id": 5, "method": "listBooks"})).await;
    assert_eq!(books["data"][0]["borrowed"], true);
    assert_eq!(books["data"][0]["issuedTo"], member_id);

    let held = call(&mut services, json!({"id": 6, "method": "borrowedBooks", "memberID": member_id})).await;
    assert_eq!(held["data"]["book"]["id"], book_id);

    let returned = call(
        &mut services,
        json!({"id": 7, "method": "returnBook", "bookID": book_id, "memberID": member_id}),
    )
    .await;
    assert_eq!(returned["success"], true);

    let members = call(&mut services, json!({"id": 8, "method": "listMembers"})).await;
    assert_eq!(members["data"][0]["borrowedBookId"], 0);

    services.close().await;
}

#[tokio::test]
async fn test_responses_follow_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut services = open_services(&dir).await;

    let input = concat!(
        "{\"id\": 10, \"method\": \"ping\"}\n",
        "\n",
        "not json\n",
        "{\"id\": 11, \"method\": \"fly\"}\n",
        "{\"id\": 12, \"method\": \"checkoutBook\", \"bookID\": 1000}\n",
        "{\"id\": 13, \"method\": \"searchBooks\", \"query\": \"dune\"}\n",
        "{\"id\": -14, \"method\": \"ping\"}\n",
    );
    let responses = run(&mut services, input).await;

    let ids: Vec<i64> = responses.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![10, 0, 11, 12, 13, -14]);

    assert_eq!(responses[0]["success"], true);
    assert_eq!(responses[1]["success"], false);
    assert_eq!(responses[1]["code"], 18);
    assert!(responses[2]["error"].as_str().unwrap().contains("Unknown method"));
    assert!(responses[3]["error"].as_str().unwrap().contains("memberID"));
    assert_eq!(responses[4]["data"], json!([]));
    assert_eq!(responses[5]["success"], true);

    services.close().await;
}

#[tokio::test]
async fn test_search_member_by_id_or_query() {
    let dir = tempfile::tempdir().unwrap();
    let mut services = open_services(&dir).await;

    let member = call(
        &mut services,
        json!({"id": 1, "method": "addMember", "name": "Ada", "address": "1 Infinite Loop"}),
    )
    .await;
    let member_id = member["data"]["member"]["id"].as_i64().unwrap();

    let by_id = call(&mut services, json!({"id": 2, "method": "searchMember", "memberID": member_id})).await;
    assert_eq!(by_id["data"]["name"], "Ada");

    let by_query = call(&mut services, json!({"id": 3, "method": "searchMember", "query": "ADA"})).await;
    assert_eq!(by_query["data"].as_array().unwrap().len(), 1);

    let missing = call(&mut services, json!({"id": 4, "method": "searchMember", "memberID": 9999})).await;
    assert_eq!(missing["success"], false);
    assert_eq!(missing["code"], 4);

    let neither = call(&mut services, json!({"id": 5, "method": "searchMember"})).await;
    assert_eq!(neither["code"], 18);

    services.close().await;
}

#[tokio::test]
async fn test_delete_aliases_and_guard() {
    let dir = tempfile::tempdir().unwrap();
    let mut services = open_services(&dir).await;

    let book = call(
        &mut services,
        json!({"id": 1, "method": "addBook", "title": "Emma", "isbn": "0141439580", "author": "Austen"}),
    )
    .await;
    let book_id = book["data"]["book"]["id"].as_i64().unwrap();
    let member = call(
        &mut services,
        json!({"id": 2, "method": "addMember", "name": "Ada", "address": "1 Infinite Loop", "borrowedBookId": book_id}),
    )
    .await;
    assert_eq!(member["data"]["member"]["borrowedBookId"], book_id);

    let refused = call(&mut services, json!({"id": 3, "method": "delete-book", "bookID": book_id})).await;
    assert_eq!(refused["success"], false);

    let forced = call(
        &mut services,
        json!({"id": 4, "method": "deleteBook", "bookID": book_id, "force": true}),
    )
    .await;
    assert_eq!(forced["data"]["deleted"], true);

    let lookup = call(&mut services, json!({"id": 5, "method": "lookupBook", "bookID": book_id})).await;
    assert_eq!(lookup["code"], 4);

    let audit = call(&mut services, json!({"id": 6, "method": "audit"})).await;
    assert_eq!(audit["data"], json!([]));

    services.close().await;
}

#[tokio::test]
async fn test_login_against_bootstrap_credential() {
    let dir = tempfile::tempdir().unwrap();
    let mut services = open_services(&dir).await;

    let ok = call(
        &mut services,
        json!({"id": 1, "method": "login", "username": "admin", "password": "admin"}),
    )
    .await;
    assert_eq!(ok["success"], true);

    let bad = call(
        &mut services,
        json!({"id": 2, "method": "login", "username": "admin", "password": "nope"}),
    )
    .await;
    assert_eq!(bad["success"], false);
    assert_eq!(bad["code"], 2);

    services.close().await;
}
