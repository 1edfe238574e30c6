use super::*;
use crate::probe::DEFAULT_TIMEOUT;
use crate::report::Outcome;
use httpmock::prelude::*;
use serde_json::json;

fn probe() -> HttpProbe {
    HttpProbe::new(DEFAULT_TIMEOUT, false).unwrap()
}

fn config_with_key(api_key: &str) -> ProbeConfig {
    ProbeConfig {
        api_key: Some(api_key.to_string()),
        ..Default::default()
    }
}

fn config_with_bucket(bucket: &str) -> ProbeConfig {
    ProbeConfig {
        storage_bucket: Some(bucket.to_string()),
        ..Default::default()
    }
}

// ---- registration ----

#[tokio::test]
async fn registration_open_sign_up_is_vulnerable_and_yields_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/accounts:signUp")
            .query_param("key", "AIzaTest")
            .json_body(json!({
                "email": "test@bugbounty.com",
                "password": "TestPassword123!",
                "returnSecureToken": true,
            }));
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "idToken": "tok-123",
                "email": "test@bugbounty.com",
                "localId": "uid-1",
            }));
    });

    let check = RegistrationCheck::with_base_url(server.url("/v1/accounts:signUp"));
    let verdict = check
        .execute(&probe(), &config_with_key("AIzaTest"), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Vulnerable);
    assert_eq!(verdict.auth_token.as_deref(), Some("tok-123"));
    mock.assert();
}

#[tokio::test]
async fn registration_disabled_is_secure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/accounts:signUp");
        then.status(400).json_body(json!({
            "error": {
                "code": 400,
                "message": "OPERATION_NOT_ALLOWED : The identity provider configuration is disabled.",
                "errors": [{"message": "OPERATION_NOT_ALLOWED", "domain": "global", "reason": "invalid"}],
            }
        }));
    });

    let check = RegistrationCheck::with_base_url(server.url("/v1/accounts:signUp"));
    let verdict = check
        .execute(&probe(), &config_with_key("AIzaTest"), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Secure);
    assert!(verdict.evidence.contains("OPERATION_NOT_ALLOWED"));
    assert!(verdict.auth_token.is_none());
}

#[tokio::test]
async fn registration_invalid_api_key_is_secure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/accounts:signUp");
        then.status(400).json_body(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
            }
        }));
    });

    let check = RegistrationCheck::with_base_url(server.url("/v1/accounts:signUp"));
    let verdict = check
        .execute(&probe(), &config_with_key("bogus"), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Secure);
}

#[tokio::test]
async fn registration_unexpected_rejection_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/accounts:signUp");
        then.status(400).json_body(json!({
            "error": {"code": 400, "message": "EMAIL_EXISTS"}
        }));
    });

    let check = RegistrationCheck::with_base_url(server.url("/v1/accounts:signUp"));
    let verdict = check
        .execute(&probe(), &config_with_key("AIzaTest"), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Error);
    assert!(verdict.evidence.contains("EMAIL_EXISTS"));
}

#[tokio::test]
async fn registration_success_without_token_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/accounts:signUp");
        then.status(200).json_body(json!({"kind": "identitytoolkit#SignupNewUserResponse"}));
    });

    let check = RegistrationCheck::with_base_url(server.url("/v1/accounts:signUp"));
    let verdict = check
        .execute(&probe(), &config_with_key("AIzaTest"), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Error);
}

// ---- storage bucket access ----

#[tokio::test]
async fn storage_listing_on_either_surface_is_vulnerable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/fb/b/test-bucket/o");
        then.status(200).json_body(json!({
            "prefixes": ["uploads/"],
            "items": [{"name": "users.csv", "bucket": "test-bucket"}],
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/gcs/b/test-bucket/o");
        then.status(403).json_body(json!({
            "error": {"code": 403, "message": "Permission denied."}
        }));
    });

    let check = StorageAccessCheck::with_base_urls(server.url("/fb"), server.url("/gcs"));
    let verdict = check
        .execute(&probe(), &config_with_bucket("test-bucket"), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Vulnerable);
    assert!(verdict.evidence.contains("users.csv"));
}

#[tokio::test]
async fn storage_denied_on_both_surfaces_is_secure() {
    let server = MockServer::start();
    let denial = json!({"error": {"code": 403, "message": "Permission denied."}});
    server.mock(|when, then| {
        when.method(GET).path("/fb/b/test-bucket/o");
        then.status(403).json_body(denial.clone());
    });
    server.mock(|when, then| {
        when.method(GET).path("/gcs/b/test-bucket/o");
        then.status(404).json_body(json!({
            "error": {"code": 404, "message": "The specified bucket does not exist."}
        }));
    });

    let check = StorageAccessCheck::with_base_urls(server.url("/fb"), server.url("/gcs"));
    let verdict = check
        .execute(&probe(), &config_with_bucket("test-bucket"), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Secure);
}

#[tokio::test]
async fn storage_unclassifiable_response_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/fb/b/test-bucket/o");
        then.status(200).body("<html>login required</html>");
    });
    server.mock(|when, then| {
        when.method(GET).path("/gcs/b/test-bucket/o");
        then.status(403).json_body(json!({
            "error": {"code": 403, "message": "Permission denied."}
        }));
    });

    let check = StorageAccessCheck::with_base_urls(server.url("/fb"), server.url("/gcs"));
    let verdict = check
        .execute(&probe(), &config_with_bucket("test-bucket"), None)
        .await
        .unwrap();

    // One denial plus one unclassifiable body must not read as secure.
    assert_eq!(verdict.outcome, Outcome::Error);
}

// ---- storage upload ----

#[tokio::test]
async fn anonymous_upload_accepted_is_vulnerable() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/fb/b/test-bucket/o")
            .query_param_exists("name");
        then.status(200).json_body(json!({"name": "whatever"}));
    });

    let check = StorageUploadCheck::with_base_url(server.url("/fb"));
    let verdict = check
        .execute(&probe(), &config_with_bucket("test-bucket"), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Vulnerable);
    assert!(verdict.evidence.contains("upload accepted"));
    mock.assert();
}

#[tokio::test]
async fn upload_denied_without_token_is_secure() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/fb/b/test-bucket/o")
            .query_param_exists("name");
        then.status(403).json_body(json!({
            "error": {"code": 403, "message": "Permission denied."}
        }));
    });

    let check = StorageUploadCheck::with_base_url(server.url("/fb"));
    let verdict = check
        .execute(&probe(), &config_with_bucket("test-bucket"), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Secure);
    // Without a registration token only the anonymous attempt runs.
    mock.assert_hits(1);
}

#[tokio::test]
async fn upload_with_registration_token_detects_authenticated_exposure() {
    let server = MockServer::start();
    // Only the Firebase-token attempt finds a mock; the anonymous and
    // Bearer attempts fall through to the mock server's 404, which stays
    // ambiguous and must not mask the authenticated exposure.
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/fb/b/test-bucket/o")
            .header("Authorization", "Firebase tok-123")
            .query_param_exists("name");
        then.status(200).json_body(json!({"name": "whatever"}));
    });

    let check = StorageUploadCheck::with_base_url(server.url("/fb"));
    let verdict = check
        .execute(&probe(), &config_with_bucket("test-bucket"), Some("tok-123"))
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Vulnerable);
    assert!(verdict.evidence.contains("firebase-token"));
    mock.assert();
}

#[tokio::test]
async fn upload_probes_every_auth_state_when_a_token_exists() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/fb/b/test-bucket/o")
            .query_param_exists("name");
        then.status(403).json_body(json!({
            "error": {"code": 403, "message": "Permission denied."}
        }));
    });

    let check = StorageUploadCheck::with_base_url(server.url("/fb"));
    let verdict = check
        .execute(&probe(), &config_with_bucket("test-bucket"), Some("tok-123"))
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Secure);
    // Anonymous, Bearer and Firebase token attempts all reached the bucket.
    mock.assert_hits(3);
}

// ---- database ----

fn config_with_db(server: &MockServer) -> ProbeConfig {
    ProbeConfig {
        database_url: Some(server.url("")),
        ..Default::default()
    }
}

#[tokio::test]
async fn readable_database_root_is_vulnerable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/.json");
        then.status(200).json_body(json!({"users": {"u1": {"email": "a@b.c"}}}));
    });
    server.mock(|when, then| {
        when.method(PUT).path_includes("probe_");
        then.status(401).json_body(json!({"error": "Permission denied"}));
    });

    let check = DatabaseAccessCheck::new();
    let verdict = check
        .execute(&probe(), &config_with_db(&server), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Vulnerable);
    assert!(verdict.evidence.contains("users"));
}

#[tokio::test]
async fn writable_database_is_vulnerable_even_when_read_is_denied() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/.json");
        then.status(401).json_body(json!({"error": "Permission denied"}));
    });
    server.mock(|when, then| {
        when.method(PUT).path_includes("probe_");
        then.status(200).json_body(json!({"probe": "probe_1"}));
    });

    let check = DatabaseAccessCheck::new();
    let verdict = check
        .execute(&probe(), &config_with_db(&server), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Vulnerable);
    assert!(verdict.evidence.contains("writable"));
}

#[tokio::test]
async fn locked_down_database_is_secure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/.json");
        then.status(401).json_body(json!({"error": "Permission denied"}));
    });
    server.mock(|when, then| {
        when.method(PUT).path_includes("probe_");
        then.status(401).json_body(json!({"error": "Permission denied"}));
    });

    let check = DatabaseAccessCheck::new();
    let verdict = check
        .execute(&probe(), &config_with_db(&server), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Secure);
    assert!(verdict.evidence.contains("read denied"));
    assert!(verdict.evidence.contains("write denied"));
}

#[tokio::test]
async fn null_root_with_denied_write_stays_ambiguous() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/.json");
        then.status(200).body("null");
    });
    server.mock(|when, then| {
        when.method(PUT).path_includes("probe_");
        then.status(401).json_body(json!({"error": "Permission denied"}));
    });

    let check = DatabaseAccessCheck::new();
    let verdict = check
        .execute(&probe(), &config_with_db(&server), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Error);
}

// ---- remote config ----

fn config_for_remote_config() -> ProbeConfig {
    ProbeConfig {
        project_id: Some("test-project".to_string()),
        api_key: Some("AIzaTest".to_string()),
        app_id: Some("1:1234567890:web:abcdef".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn fetched_template_is_vulnerable() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/rc/projects/test-project/namespaces/firebase:fetch")
            .query_param("key", "AIzaTest");
        then.status(200).json_body(json!({
            "entries": {"welcome_message": "Hello", "feature_flag": "on"},
            "state": "UPDATE",
        }));
    });

    let check = RemoteConfigCheck::with_base_url(server.url("/rc"));
    let verdict = check
        .execute(&probe(), &config_for_remote_config(), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Vulnerable);
    assert!(verdict.evidence.contains("2 parameter(s)"));
    mock.assert();
}

#[tokio::test]
async fn no_template_state_is_secure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/rc/projects/test-project/namespaces/firebase:fetch");
        then.status(200).json_body(json!({"state": "NO_TEMPLATE"}));
    });

    let check = RemoteConfigCheck::with_base_url(server.url("/rc"));
    let verdict = check
        .execute(&probe(), &config_for_remote_config(), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Secure);
    assert!(verdict.evidence.contains("NO_TEMPLATE"));
}

#[tokio::test]
async fn remote_config_denial_is_secure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/rc/projects/test-project/namespaces/firebase:fetch");
        then.status(403).json_body(json!({
            "error": {"code": 403, "message": "Forbidden", "status": "PERMISSION_DENIED"}
        }));
    });

    let check = RemoteConfigCheck::with_base_url(server.url("/rc"));
    let verdict = check
        .execute(&probe(), &config_for_remote_config(), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Secure);
}

#[tokio::test]
async fn remote_config_unknown_state_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/rc/projects/test-project/namespaces/firebase:fetch");
        then.status(200).json_body(json!({"state": "INSTANCE_STATE_UNSPECIFIED"}));
    });

    let check = RemoteConfigCheck::with_base_url(server.url("/rc"));
    let verdict = check
        .execute(&probe(), &config_for_remote_config(), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Error);
}

// ---- crashlytics ----

fn config_for_crashlytics() -> ProbeConfig {
    ProbeConfig {
        project_id: Some("test-project".to_string()),
        app_id: Some("1:1234567890:web:abcdef".to_string()),
        api_key: Some("AIzaTest".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn readable_issue_feed_is_vulnerable() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/cl/projects/test-project/apps/1:1234567890:web:abcdef/issues")
            .header("X-Goog-Api-Key", "AIzaTest");
        then.status(200).json_body(json!({
            "issues": [{"id": "1", "title": "NullPointerException"}]
        }));
    });

    let check = CrashlyticsCheck::with_base_url(server.url("/cl"));
    let verdict = check
        .execute(&probe(), &config_for_crashlytics(), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Vulnerable);
    mock.assert();
}

#[tokio::test]
async fn crashlytics_denial_is_secure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/cl/projects/test-project/apps/1:1234567890:web:abcdef/issues");
        then.status(403).json_body(json!({
            "error": {"code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED"}
        }));
    });

    let check = CrashlyticsCheck::with_base_url(server.url("/cl"));
    let verdict = check
        .execute(&probe(), &config_for_crashlytics(), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Secure);
}

#[tokio::test]
async fn crashlytics_html_error_page_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/cl/projects/test-project/apps/1:1234567890:web:abcdef/issues");
        then.status(500).body("internal error");
    });

    let check = CrashlyticsCheck::with_base_url(server.url("/cl"));
    let verdict = check
        .execute(&probe(), &config_for_crashlytics(), None)
        .await
        .unwrap();

    assert_eq!(verdict.outcome, Outcome::Error);
    assert!(verdict.evidence.contains("500"));
}
