// Integration tests for HMAC signed request bodies
use actix_web::{
    http::{header::AUTHORIZATION, Method, StatusCode},
    test, web, App, HttpResponse,
};
use api_guard::hmac_verification::{
    sign_body, verify_at, HmacConfig, HmacError, HmacSignedBody,
};
use api_guard::testing::constants::TEST_HMAC_SECRET;
use api_guard::testing::signing::{hmac_body, hmac_signature};
use api_guard::testing::{assert_error_response, RequestBuilder, TestFixtures};
use api_guard::utils::crypto::DigestAlgorithm;
use api_guard::utils::responses::ResponseBuilder;
use chrono::Utc;
use serde_json::json;

const NOW: i64 = 1_700_000_000;

fn authorization(mac: &str) -> actix_web::http::header::HeaderMap {
    let mut headers = actix_web::http::header::HeaderMap::new();
    headers.insert(AUTHORIZATION, mac.parse().unwrap());
    headers
}

#[::core::prelude::v1::test]
fn test_signed_body_accepted_then_expires() {
    let config = HmacConfig::new("k");
    let body = hmac_body("/", "POST", NOW, &json!({}));
    let headers = authorization(&sign_body("k", &body, DigestAlgorithm::Sha256));

    let signed = verify_at(&body, &headers, "/", "POST", &config, NOW).unwrap();
    assert_eq!(signed.timestamp, NOW);
    assert_eq!(signed.contents, json!({}));

    // Still inside the 120 second window
    assert!(verify_at(&body, &headers, "/", "POST", &config, NOW + 120).is_ok());

    assert_eq!(
        verify_at(&body, &headers, "/", "POST", &config, NOW + 121).unwrap_err(),
        HmacError::Expired
    );
}

#[::core::prelude::v1::test]
fn test_single_byte_mutations_break_the_hash() {
    let config = HmacConfig::new(TEST_HMAC_SECRET);
    let body = hmac_body("/orders", "POST", NOW, &json!({"amount": 42}));
    let headers = authorization(&hmac_signature(&body));
    assert!(verify_at(&body, &headers, "/orders", "POST", &config, NOW).is_ok());

    for index in [0, body.len() / 2, body.len() - 1] {
        let mut mutated = body.clone();
        mutated[index] ^= 0x01;
        assert_eq!(
            verify_at(&mutated, &headers, "/orders", "POST", &config, NOW).unwrap_err(),
            HmacError::HashMismatch,
            "body byte {index}"
        );
    }

    let mut secret = TEST_HMAC_SECRET.as_bytes().to_vec();
    secret[0] ^= 0x01;
    let wrong = HmacConfig::new(std::str::from_utf8(&secret).unwrap());
    assert_eq!(
        verify_at(&body, &headers, "/orders", "POST", &wrong, NOW).unwrap_err(),
        HmacError::HashMismatch
    );
}

#[::core::prelude::v1::test]
fn test_signed_path_and_method_must_match() {
    let config = HmacConfig::new(TEST_HMAC_SECRET);
    let body = hmac_body("/orders", "POST", NOW, &json!({}));
    let headers = authorization(&hmac_signature(&body));
    assert!(verify_at(&body, &headers, "/orders", "POST", &config, NOW).is_ok());

    // HTTP methods are case-sensitive
    let lowercase = hmac_body("/orders", "post", NOW, &json!({}));
    let lowercase_headers = authorization(&hmac_signature(&lowercase));
    assert_eq!(
        verify_at(&lowercase, &lowercase_headers, "/orders", "POST", &config, NOW).unwrap_err(),
        HmacError::MethodMismatch
    );

    assert_eq!(
        verify_at(&body, &headers, "/refunds", "POST", &config, NOW).unwrap_err(),
        HmacError::PathMismatch
    );
    assert_eq!(
        verify_at(&body, &headers, "/orders", "DELETE", &config, NOW).unwrap_err(),
        HmacError::MethodMismatch
    );
}

#[::core::prelude::v1::test]
fn test_other_algorithms() {
    let config = HmacConfig::new(TEST_HMAC_SECRET).with_algorithm(DigestAlgorithm::Sha512);
    let body = hmac_body("/", "PUT", NOW, &json!([1, 2, 3]));

    let sha512 = authorization(&sign_body(TEST_HMAC_SECRET, &body, DigestAlgorithm::Sha512));
    assert!(verify_at(&body, &sha512, "/", "PUT", &config, NOW).is_ok());

    let sha256 = authorization(&sign_body(TEST_HMAC_SECRET, &body, DigestAlgorithm::Sha256));
    assert_eq!(
        verify_at(&body, &sha256, "/", "PUT", &config, NOW).unwrap_err(),
        HmacError::HashMismatch
    );
}

// ============================================================================
// Extractor
// ============================================================================

async fn create_order(signed: HmacSignedBody) -> HttpResponse {
    ResponseBuilder::ok().json(&signed.0.contents)
}

#[actix_web::test]
async fn test_extractor_accepts_signed_request() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(TestFixtures::hmac_verifier()))
            .route("/orders", web::post().to(create_order)),
    )
    .await;

    let body = hmac_body("/orders", "POST", Utc::now().timestamp(), &json!({"sku": "A-1"}));
    let req = RequestBuilder::new()
        .method(Method::POST)
        .uri("/orders")
        .header(AUTHORIZATION.as_str(), &hmac_signature(&body))
        .raw_body(body)
        .into_test_request()
        .to_request();

    let response = test::call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    let contents: serde_json::Value = test::read_body_json(response).await;
    assert_eq!(contents, json!({"sku": "A-1"}));
}

#[actix_web::test]
async fn test_extractor_rejects_unsigned_and_stale_requests() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(TestFixtures::hmac_verifier()))
            .route("/orders", web::post().to(create_order)),
    )
    .await;

    let body = hmac_body("/orders", "POST", Utc::now().timestamp(), &json!({}));
    let req = RequestBuilder::new()
        .method(Method::POST)
        .uri("/orders")
        .raw_body(body)
        .into_test_request()
        .to_request();
    let response = test::call_service(&app, req).await;
    assert_error_response(
        response.into_parts().1,
        StatusCode::UNAUTHORIZED,
        "missing authorization header",
    )
    .await;

    let body = hmac_body("/orders", "POST", Utc::now().timestamp() - 3600, &json!({}));
    let req = RequestBuilder::new()
        .method(Method::POST)
        .uri("/orders")
        .header(AUTHORIZATION.as_str(), &hmac_signature(&body))
        .raw_body(body)
        .into_test_request()
        .to_request();
    let response = test::call_service(&app, req).await;
    assert_error_response(response.into_parts().1, StatusCode::UNAUTHORIZED, "expired").await;
}
