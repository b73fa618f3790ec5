mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{call_json, create_folder, create_task, init_app, settings, sign_up};

#[actix_rt::test]
async fn test_folder_ownership() {
    let app = init_app(settings()).await;
    let owner = sign_up(&app, "owner@example.com").await;
    let intruder = sign_up(&app, "intruder@example.com").await;
    let folder_id = create_folder(&app, &owner, "Work").await;
    let uri = format!("/api/v1/folders/{}", folder_id);
    let missing = format!("/api/v1/folders/{}", folder_id + 1000);

    let (status, body) = call_json(&app, &intruder, test::TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "you do not have permission to access this resource");

    let (status, _) = call_json(
        &app,
        &intruder,
        test::TestRequest::patch().uri(&uri).set_json(json!({ "name": "Mine" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call_json(&app, &intruder, test::TestRequest::delete().uri(&uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    for req in [
        test::TestRequest::get().uri(&missing),
        test::TestRequest::patch().uri(&missing).set_json(json!({ "name": "x" })),
        test::TestRequest::delete().uri(&missing),
    ] {
        let (status, body) = call_json(&app, &intruder, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "the requested resource could not be found");
    }

    let (status, body) = call_json(&app, &owner, test::TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["folder"]["name"], "Work");
    assert_eq!(body["folder"]["user_id"], owner.id);

    let (status, body) = call_json(
        &app,
        &owner,
        test::TestRequest::patch().uri(&uri).set_json(json!({ "name": "Home" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["folder"]["name"], "Home");

    let (status, body) = call_json(&app, &owner, test::TestRequest::delete().uri(&uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = call_json(&app, &owner, test::TestRequest::get().uri(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_deleting_folder_removes_its_tasks() {
    let app = init_app(settings()).await;
    let user = sign_up(&app, "cascade@example.com").await;
    let folder_id = create_folder(&app, &user, "Temp").await;
    let task = create_task(
        &app,
        &user,
        folder_id,
        json!({ "title": "gone soon", "datetime": "2024-06-01T10:00:00Z" }),
    )
    .await;

    let (status, _) = call_json(
        &app,
        &user,
        test::TestRequest::delete().uri(&format!("/api/v1/folders/{}", folder_id)),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call_json(
        &app,
        &user,
        test::TestRequest::get().uri(&format!("/api/v1/tasks/{}", task["id"])),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_non_numeric_ids_are_not_found() {
    let app = init_app(settings()).await;
    let user = sign_up(&app, "ids@example.com").await;

    for uri in ["/api/v1/folders/foo", "/api/v1/folders/1.5", "/api/v1/folders/-1"] {
        let (status, _) = call_json(&app, &user, test::TestRequest::get().uri(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_rt::test]
async fn test_folder_name_is_validated() {
    let app = init_app(settings()).await;
    let user = sign_up(&app, "names@example.com").await;

    for name in [String::new(), "x".repeat(31)] {
        let (status, body) = call_json(
            &app,
            &user,
            test::TestRequest::post()
                .uri("/api/v1/users/me/folders")
                .set_json(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["fields"]["name"], "must be between 1 and 30 characters");
    }
}

#[actix_rt::test]
async fn test_invalid_list_parameters_are_rejected() {
    let app = init_app(settings()).await;
    let user = sign_up(&app, "params@example.com").await;
    create_folder(&app, &user, "Only").await;

    for (query, field) in [
        ("sort=unsafe_value", "sort"),
        ("sort=name%3BDROP%20TABLE%20folders", "sort"),
        ("page=0", "page"),
        ("page=-1", "page"),
        ("page=1000000", "page"),
        ("page=abc", "page"),
        ("page_size=0", "page_size"),
        ("page_size=100000", "page_size"),
        ("page_size=101", "page_size"),
    ] {
        let (status, body) = call_json(
            &app,
            &user,
            test::TestRequest::get().uri(&format!("/api/v1/users/me/folders?{}", query)),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", query);
        assert_eq!(body["message"], "validation failed");
        assert!(body["fields"][field].is_string(), "{}: {}", query, body);
    }

    let (status, body) = call_json(
        &app,
        &user,
        test::TestRequest::get().uri("/api/v1/users/me/folders"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metadata"]["current_page"], 1);
    assert_eq!(body["metadata"]["page_size"], 20);
}

#[actix_rt::test]
async fn test_pagination_metadata() {
    let app = init_app(settings()).await;
    let user = sign_up(&app, "pages@example.com").await;
    let other = sign_up(&app, "other@example.com").await;
    for i in 0..45 {
        create_folder(&app, &user, &format!("folder {:02}", i)).await;
    }
    create_folder(&app, &other, "not mine").await;

    let mut seen = Vec::new();
    for (page, expected) in [(1, 20), (2, 20), (3, 5)] {
        let (status, body) = call_json(
            &app,
            &user,
            test::TestRequest::get().uri(&format!(
                "/api/v1/users/me/folders?page={}&page_size=20&sort=-name",
                page
            )),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let folders = body["folders"].as_array().unwrap();
        assert_eq!(folders.len(), expected, "page {}", page);
        assert_eq!(
            body["metadata"],
            json!({
                "current_page": page,
                "page_size": 20,
                "first_page": 1,
                "last_page": 3,
                "total_records": 45
            })
        );
        seen.extend(folders.iter().map(|f| f["name"].as_str().unwrap().to_string()));
    }

    assert_eq!(seen.first().map(String::as_str), Some("folder 44"));
    assert_eq!(seen.last().map(String::as_str), Some("folder 00"));

    let (status, body) = call_json(
        &app,
        &user,
        test::TestRequest::get().uri("/api/v1/users/me/folders?page=4&page_size=20"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["folders"], json!([]));
    assert_eq!(body["metadata"], json!({}));
}
