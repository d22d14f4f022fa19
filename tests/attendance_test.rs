//! Integration tests for role resolution and the attendance state machine

mod common;

use common::*;
use endfield_checkin::error::Error;
use endfield_checkin::models::{ClaimOutcome, Reward, Role, SessionCredential};
use endfield_checkin::skport::{AttendanceClaimer, RoleResolver};
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> SessionCredential {
    SessionCredential::new("cred-xyz", "salt-xyz", "1001")
}

fn role() -> Role {
    Role::new("12345", "2", "Endmin", 40, "Asia")
}

#[tokio::test]
async fn test_list_roles_flattens_endfield_binding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(BINDING_PATH))
        .and(header("cred", "cred-xyz"))
        .and(ValidSignature::new("salt-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(binding_body(vec![
            role_json("111", "2", "Alpha", 30),
            role_json("222", "3", "Beta", 12),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let roles = RoleResolver::new(&client).list_roles(&session()).await.unwrap();

    assert_eq!(roles.len(), 2);
    assert_eq!(roles[0].composite_id, "3_111_2");
    assert_eq!(roles[0].label(), "Alpha (Lv.30) [Asia]");
    assert_eq!(roles[1].composite_id, "3_222_3");
}

#[tokio::test]
async fn test_list_roles_without_endfield_binding() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(BINDING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "list": [ { "appCode": "arknights", "bindingList": [ { "roles": [] } ] } ] }
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = RoleResolver::new(&client).list_roles(&session()).await.unwrap_err();

    assert!(matches!(err, Error::NoBinding));
    assert_eq!(err.to_string(), "No Endfield account binding found");
}

#[tokio::test]
async fn test_list_roles_with_empty_roles() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(BINDING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(binding_body(vec![])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = RoleResolver::new(&client).list_roles(&session()).await.unwrap_err();

    assert!(matches!(err, Error::NoRoles));
}

#[tokio::test]
async fn test_list_roles_upstream_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(BINDING_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": 10000, "message": "" })),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = RoleResolver::new(&client).list_roles(&session()).await.unwrap_err();

    match err {
        Error::Upstream { code, message } => {
            assert_eq!(code, 10000);
            assert_eq!(message, "Binding API error: 10000");
        }
        other => panic!("Expected upstream error, got: {other:?}"),
    }
}

/// Already claimed today: the claim POST must never be sent
#[tokio::test]
async fn test_already_claimed_skips_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ATTENDANCE_PATH))
        .and(header("sk-game-role", "3_12345_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(check_body(true)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(claim_body()))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = AttendanceClaimer::new(&client)
        .claim_for_role(&session(), &role())
        .await
        .unwrap();

    assert_eq!(outcome, ClaimOutcome::AlreadyClaimed);
    assert_eq!(outcome.describe(), "Already checked in today");
}

/// Not yet claimed: exactly one signed POST, unknown award ids are skipped
#[tokio::test]
async fn test_claim_collects_known_rewards() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(check_body(false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(ATTENDANCE_PATH))
        .and(header("sk-game-role", "3_12345_2"))
        .and(header_exists("sign"))
        .and(ValidSignature::new("salt-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(claim_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = AttendanceClaimer::new(&client)
        .claim_for_role(&session(), &role())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ClaimOutcome::ClaimedWithRewards(vec![Reward {
            name: "Oroberyl".to_string(),
            count: 80
        }])
    );
    assert_eq!(outcome.describe(), "Checked in! Rewards: Oroberyl x80");
}

#[tokio::test]
async fn test_claim_without_rewards() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(check_body(false)))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 0, "data": {} })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = AttendanceClaimer::new(&client)
        .claim_for_role(&session(), &role())
        .await
        .unwrap();

    assert_eq!(outcome, ClaimOutcome::ClaimedNoRewards);
    assert_eq!(outcome.describe(), "Successfully checked in!");
}

#[tokio::test]
async fn test_check_failure_is_claim_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "code": 10001, "message": "signature mismatch" })),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = AttendanceClaimer::new(&client)
        .claim_for_role(&session(), &role())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ClaimFailed(ref m) if m == "signature mismatch"));
}

#[tokio::test]
async fn test_claim_failure_uses_code_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(check_body(false)))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": 10003 })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = AttendanceClaimer::new(&client)
        .claim_for_role(&session(), &role())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Claim failed: 10003");
}

/// Without a secret requests go out unsigned
#[tokio::test]
async fn test_unsigned_request_has_no_sign_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ATTENDANCE_PATH))
        .and(header("cred", "cred-only"))
        .respond_with(ResponseTemplate::new(200).set_body_json(check_body(true)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let unsigned = SessionCredential::new("cred-only", "", "");
    AttendanceClaimer::new(&client)
        .check(&unsigned, &role())
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("sign").is_none());
    assert!(requests[0].headers.get("timestamp").is_some());
}

/// A binding entry with `roles: null` does not hide its siblings' roles
#[tokio::test]
async fn test_null_roles_entry_is_skipped() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(BINDING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {
                "list": [ {
                    "appCode": "endfield",
                    "bindingList": [
                        { "roles": null },
                        { "roles": [ {
                            "roleId": "333",
                            "serverId": "2",
                            "nickname": null,
                            "level": 5,
                            "serverName": "Asia"
                        } ] }
                    ]
                } ]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let roles = RoleResolver::new(&client).list_roles(&session()).await.unwrap();

    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].composite_id, "3_333_2");
    assert_eq!(roles[0].label(), " (Lv.5) [Asia]");
}

/// `records: null` still honors `hasToday`
#[tokio::test]
async fn test_null_records_with_claimed_today() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "hasToday": true, "records": null }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let claimer = AttendanceClaimer::new(&client);
    let status = claimer.check(&session(), &role()).await.unwrap();
    assert!(status.has_today);
    assert_eq!(status.total_sign_ins, 0);

    let outcome = claimer.claim_for_role(&session(), &role()).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::AlreadyClaimed);
}

/// `hasToday: null` reads as not yet claimed
#[tokio::test]
async fn test_null_has_today_claims() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "hasToday": null, "records": null }
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(ATTENDANCE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": { "awardIds": null, "resourceInfoMap": null }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let outcome = AttendanceClaimer::new(&client)
        .claim_for_role(&session(), &role())
        .await
        .unwrap();

    assert_eq!(outcome, ClaimOutcome::ClaimedNoRewards);
}
