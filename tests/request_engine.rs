mod common;

use std::time::Duration;

use honist_client::http::PartValue;
use honist_client::{ApiRequest, CredentialPair, EmptyPayload, Error, ListPayload, MultipartPart};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{context, envelope, mint_token};

#[derive(Debug, Deserialize, PartialEq)]
struct Offer {
    id: String,
    gems: u32,
    created_at: jiff::Timestamp,
}

fn signed_in(server: &MockServer) -> honist_client::HonistContext {
    context(server, CredentialPair::new(mint_token(3600), "refresh-1"))
}

#[tokio::test]
async fn decodes_nested_list_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/shop/offers"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "pagination": {"page": 1, "limit": 10, "total": 1, "totalPages": 1},
                "items": [{"id": "o1", "gems": 50, "created_at": "2025-09-06T14:20:00.123Z"}]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = signed_in(&server);
    let list: ListPayload<Offer> = ctx
        .api()
        .send_list(
            ApiRequest::get("/api/v1/shop/offers")
                .query("page", 1)
                .query("limit", 10),
        )
        .await
        .unwrap();

    assert_eq!(list.items.len(), 1);
    assert_eq!(list.pagination.unwrap().page, 1);
    assert_eq!(list.items[0].gems, 50);
}

#[tokio::test]
async fn decodes_root_pagination_and_bare_arrays() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": "o1", "gems": 1, "created_at": "2025-01-01T00:00:00Z"},
                {"id": "o2", "gems": 2, "created_at": "2025-01-02T00:00:00Z"}
            ],
            "pagination": {"page": 2, "limit": 2, "total": 4, "total_pages": 2}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/bonuses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            {"id": "b1", "gems": 5, "created_at": "2025-01-01T00:00:00Z"}
        ]))))
        .mount(&server)
        .await;

    let ctx = signed_in(&server);
    let history: ListPayload<Offer> = ctx.api().get_list("/api/v1/history").await.unwrap();
    assert_eq!(history.items.len(), 2);
    assert_eq!(history.pagination.unwrap().total_pages, 2);

    let bonuses: ListPayload<Offer> = ctx.api().get_list("/api/v1/bonuses").await.unwrap();
    assert_eq!(bonuses.items[0].id, "b1");
    assert!(bonuses.pagination.is_none());
}

#[tokio::test]
async fn non_success_status_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/referrals/apply"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({"success": false, "message": "code already used"})),
        )
        .mount(&server)
        .await;

    let ctx = signed_in(&server);
    let err = ctx
        .api()
        .post::<_, EmptyPayload>("/api/v1/referrals/apply", &json!({"code": "ABC"}))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "Network error (422): code already used");
}

#[tokio::test]
async fn unsuccessful_envelope_on_200_is_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/profile"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": "nickname taken"})),
        )
        .mount(&server)
        .await;

    let ctx = signed_in(&server);
    let err = ctx
        .api()
        .patch::<_, EmptyPayload>("/api/v1/profile", &json!({"username": "x"}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Server { message: Some(ref m) } if m == "nickname taken"));
}

#[tokio::test]
async fn caller_headers_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/settings"))
        .and(header("accept", "application/vnd.honist+json"))
        .and(header("content-type", "application/json; charset=utf-8"))
        .and(header("x-request-source", "integration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = signed_in(&server);
    let request = ApiRequest::put("/api/v1/settings")
        .json(&json!({"language": "en"}))
        .unwrap()
        .header("Accept", "application/vnd.honist+json")
        .header("X-Request-Source", "integration");
    let _: EmptyPayload = ctx.api().send(request).await.unwrap();
}

#[tokio::test]
async fn delete_accepts_bodiless_success() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/devices/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = signed_in(&server);
    ctx.api().delete_empty("/api/v1/devices/d1").await.unwrap();
}

#[tokio::test]
async fn cancellation_resolves_to_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let ctx = signed_in(&server);
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = ctx
        .api()
        .send::<EmptyPayload>(ApiRequest::get("/api/v1/slow").cancel_on(token))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn uploads_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/profile/photo"))
        .and(header_regex(
            "content-type",
            "^multipart/form-data; boundary=Boundary-[0-9a-f-]{36}$",
        ))
        .and(body_string_contains("name=\"caption\"\r\n\r\nhello\r\n"))
        .and(body_string_contains(
            "name=\"photo\"; filename=\"avatar.png\"\r\nContent-Type: image/png",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": "p1", "gems": 0, "created_at": "2025-09-06T14:20:00Z"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("avatar.png");
    std::fs::write(&file, b"fake").unwrap();
    let photo = MultipartPart::from_path("photo", &file, Some("image/png".into()))
        .await
        .unwrap();
    assert!(matches!(photo.value, PartValue::Data { ref bytes, .. } if bytes.len() == 4));

    let ctx = signed_in(&server);
    let offer: Offer = ctx
        .api()
        .upload_multipart(
            "/api/v1/profile/photo",
            Method::POST,
            &[MultipartPart::text("caption", "hello"), photo],
        )
        .await
        .unwrap();
    assert_eq!(offer.id, "p1");
}

#[tokio::test]
async fn empty_upload_is_rejected_locally() {
    let server = MockServer::start().await;
    let ctx = signed_in(&server);
    let err = ctx
        .api()
        .upload_multipart::<EmptyPayload>("/api/v1/profile/photo", Method::POST, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Upload(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}
