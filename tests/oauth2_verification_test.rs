// Integration tests for bearer JWT verification against a static keyset
use actix_web::{http::StatusCode, test, web, App, HttpResponse};
use api_guard::oauth2::{
    verify_audience, verify_scope, JwksVerifier, JwtAlgorithm, JwtVerifier, OAuth2Config,
    OAuth2Error, VerifiedJwt,
};
use api_guard::settings::Settings;
use api_guard::testing::assert_error_response;
use api_guard::testing::constants::TEST_ISSUER;
use api_guard::testing::signing::{keyset_base64, oct_jwk, sign_hs256, Es256TestKey};
use api_guard::utils::crypto::encode_segment;
use api_guard::utils::responses::ResponseBuilder;
use chrono::Utc;
use serde_json::{json, Value};

const NOW: i64 = 1_700_000_000;
const HMAC_KEY: &[u8] = b"oauth2_hmac_key_32_bytes_long!!!";

fn claims(exp: i64) -> Value {
    json!({
        "iss": TEST_ISSUER,
        "sub": "user-123",
        "exp": exp,
        "aud": "orders-api",
        "scope": "orders:read orders:write",
    })
}

/// Verifier built the way a deployment would, through settings
fn verifier(es256: &Es256TestKey, algorithms: &str) -> JwksVerifier {
    let mut settings = Settings::default();
    settings.oauth2.keyset = Some(keyset_base64(&[
        es256.jwk(),
        oct_jwk("hs", None, HMAC_KEY),
    ]));
    settings.oauth2.issuer = Some(TEST_ISSUER.to_string());
    settings.oauth2.algorithms = algorithms.split(',').map(ToString::to_string).collect();

    JwksVerifier::new(settings.oauth2_config().unwrap())
}

#[::core::prelude::v1::test]
fn test_es256_expiry_boundary() {
    let key = Es256TestKey::new("es");
    let verifier = verifier(&key, "ES256");

    let jwt = verifier
        .verify_token_at(&key.sign(&claims(NOW + 1)), NOW)
        .unwrap();
    assert_eq!(jwt.subject(), Some("user-123"));
    assert_eq!(jwt.header["kid"], "es");

    assert_eq!(
        verifier
            .verify_token_at(&key.sign(&claims(NOW - 1)), NOW)
            .unwrap_err(),
        OAuth2Error::Expired
    );
}

#[::core::prelude::v1::test]
fn test_algorithm_outside_whitelist_is_rejected() {
    let key = Es256TestKey::new("es");
    let token = sign_hs256("hs", HMAC_KEY, &claims(NOW + 60));

    // Mathematically valid HS256 signature, but only ES256 is allowed
    assert_eq!(
        verifier(&key, "ES256").verify_token_at(&token, NOW).unwrap_err(),
        OAuth2Error::SignatureMismatch
    );
    assert!(verifier(&key, "ES256,HS256").verify_token_at(&token, NOW).is_ok());
}

#[::core::prelude::v1::test]
fn test_public_key_cannot_be_used_as_hmac_secret() {
    let key = Es256TestKey::new("es");
    let verifier = verifier(&key, "ES256,HS256");

    let public_x = key.jwk().x.unwrap();
    let forged = sign_hs256("es", public_x.as_bytes(), &claims(NOW + 60));

    assert_eq!(
        verifier.verify_token_at(&forged, NOW).unwrap_err(),
        OAuth2Error::SignatureMismatch
    );
}

#[::core::prelude::v1::test]
fn test_unknown_key_and_issuer() {
    let key = Es256TestKey::new("es");
    let verifier = verifier(&key, "ES256");

    let other = Es256TestKey::new("rotated-away");
    assert_eq!(
        verifier
            .verify_token_at(&other.sign(&claims(NOW + 60)), NOW)
            .unwrap_err(),
        OAuth2Error::UnknownSigningKey
    );

    let mut foreign = claims(NOW + 60);
    foreign["iss"] = json!("https://elsewhere.example.com");
    assert_eq!(
        verifier.verify_token_at(&key.sign(&foreign), NOW).unwrap_err(),
        OAuth2Error::IssuerMismatch
    );
}

#[::core::prelude::v1::test]
fn test_tampered_es256_token() {
    let key = Es256TestKey::new("es");
    let verifier = verifier(&key, "ES256");
    let token = key.sign(&claims(NOW + 60));

    let mut parts: Vec<&str> = token.split('.').collect();
    let mut forged = claims(NOW + 60);
    forged["sub"] = json!("admin");
    let forged_claims = encode_segment(forged.to_string().as_bytes());
    parts[1] = &forged_claims;

    assert_eq!(
        verifier.verify_token_at(&parts.join("."), NOW).unwrap_err(),
        OAuth2Error::SignatureMismatch
    );
}

#[::core::prelude::v1::test]
fn test_scope_and_audience() {
    let key = Es256TestKey::new("es");
    let jwt = verifier(&key, "ES256")
        .verify_token_at(&key.sign(&claims(NOW + 60)), NOW)
        .unwrap();

    assert!(verify_scope(&jwt, &["orders:write"]).is_ok());
    assert_eq!(
        verify_scope(&jwt, &["admin"]).unwrap_err(),
        OAuth2Error::InsufficientScope
    );
    assert!(verify_audience(&jwt, "orders-api").is_ok());
    assert_eq!(
        verify_audience(&jwt, "billing-api").unwrap_err(),
        OAuth2Error::AudienceMismatch
    );
}

#[::core::prelude::v1::test]
fn test_dummy_verification_skips_checks() {
    let key = Es256TestKey::new("es");
    let config = OAuth2Config::new(
        api_guard::oauth2::KeySet::from_keys(vec![key.jwk()]).unwrap(),
        TEST_ISSUER,
        vec![JwtAlgorithm::Es256],
    )
    .with_dummy_verify(true);
    let verifier = JwksVerifier::new(config);

    // Expired, unknown issuer, signed by nobody
    let token = sign_hs256("nobody", b"x", &json!({"iss": "x", "exp": 1, "sub": "ghost"}));
    let jwt = verifier.verify_token_at(&token, NOW).unwrap();
    assert_eq!(jwt.subject(), Some("ghost"));
}

// ============================================================================
// Extractor
// ============================================================================

async fn orders(jwt: VerifiedJwt) -> HttpResponse {
    ResponseBuilder::ok().json(&json!({ "sub": jwt.subject() }))
}

#[actix_web::test]
async fn test_extractor() {
    let key = Es256TestKey::new("es");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(verifier(&key, "ES256")))
            .route("/orders", web::get().to(orders)),
    )
    .await;

    let token = key.sign(&claims(Utc::now().timestamp() + 300));
    let req = test::TestRequest::get()
        .uri("/orders")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let response = test::call_service(&app, req).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["sub"], "user-123");

    let req = test::TestRequest::get().uri("/orders").to_request();
    let response = test::call_service(&app, req).await;
    assert_error_response(
        response.into_parts().1,
        StatusCode::UNAUTHORIZED,
        "bearer token not found",
    )
    .await;
}

#[::core::prelude::v1::test]
fn test_verify_header_value() {
    let key = Es256TestKey::new("es");
    let verifier = verifier(&key, "ES256");
    let token = key.sign(&claims(Utc::now().timestamp() + 300));

    assert!(verifier.verify(Some(format!("Bearer {token}").as_str())).is_ok());
    assert_eq!(
        verifier.verify(Some(format!("Basic {token}").as_str())).unwrap_err(),
        OAuth2Error::BearerNotFound
    );
    assert_eq!(verifier.verify(None).unwrap_err(), OAuth2Error::BearerNotFound);
}
