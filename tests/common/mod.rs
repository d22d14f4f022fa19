//! Common test utilities

use endfield_checkin::config::{
    AccountSource, ApiConfig, Config, LoggingConfig, NotifyConfig, PacingConfig,
};
use endfield_checkin::skport::SkportClient;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

pub const BASIC_INFO_PATH: &str = "/user/info/v1/basic";
pub const GRANT_PATH: &str = "/user/oauth2/v2/grant";
pub const GENERATE_CRED_PATH: &str = "/web/v1/user/auth/generate_cred_by_code";
pub const BINDING_PATH: &str = "/api/v1/game/player/binding";
pub const ATTENDANCE_PATH: &str = "/web/v1/game/endfield/attendance";

/// Config pointing both services at `base_url`, without pacing
pub fn test_config(base_url: &str, accounts: Vec<AccountSource>) -> Config {
    Config {
        accounts,
        api: ApiConfig {
            requests_per_second: 0,
            ..ApiConfig::default().with_base_url(base_url)
        },
        pacing: PacingConfig::none(),
        notify: NotifyConfig::default(),
        logging: LoggingConfig::default(),
    }
}

/// Client talking to the mock server
pub fn client_for(server: &MockServer) -> SkportClient {
    let config = test_config(&server.uri(), Vec::new());
    SkportClient::new(&config.api).unwrap()
}

#[allow(dead_code)]
pub fn token(value: &str) -> AccountSource {
    AccountSource::Token {
        token: value.to_string(),
    }
}

#[allow(dead_code)]
pub fn direct(cred: &str, secret: &str) -> AccountSource {
    AccountSource::Credential {
        cred: cred.to_string(),
        secret: secret.to_string(),
    }
}

/// A role entry as the binding endpoint returns it
#[allow(dead_code)]
pub fn role_json(role_id: &str, server_id: &str, nickname: &str, level: i64) -> Value {
    json!({
        "roleId": role_id,
        "serverId": server_id,
        "nickname": nickname,
        "level": level,
        "serverName": "Asia"
    })
}

/// A successful binding response with one Endfield binding holding `roles`
#[allow(dead_code)]
pub fn binding_body(roles: Vec<Value>) -> Value {
    json!({
        "code": 0,
        "message": "OK",
        "data": {
            "list": [
                { "appCode": "arknights", "bindingList": [] },
                { "appCode": "endfield", "bindingList": [ { "roles": roles } ] }
            ]
        }
    })
}

#[allow(dead_code)]
pub fn check_body(has_today: bool) -> Value {
    json!({
        "code": 0,
        "message": "OK",
        "data": { "hasToday": has_today, "records": [ {}, {} ] }
    })
}

#[allow(dead_code)]
pub fn claim_body() -> Value {
    json!({
        "code": 0,
        "message": "OK",
        "data": {
            "awardIds": [ { "id": "r1" }, { "id": "unknown" } ],
            "resourceInfoMap": { "r1": { "name": "Oroberyl", "count": 80 } }
        }
    })
}

/// Mount a successful three-step handshake for `token` yielding `cred`/`secret`
#[allow(dead_code)]
pub async fn mount_handshake(server: &MockServer, token: &str, cred: &str, secret: &str) {
    Mock::given(method("GET"))
        .and(path(BASIC_INFO_PATH))
        .and(query_param("token", token))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "msg": "OK",
            "data": { "nickName": "tester" }
        })))
        .mount(server)
        .await;

    let code = format!("code-for-{token}");
    Mock::given(method("POST"))
        .and(path(GRANT_PATH))
        .and(wiremock::matchers::body_partial_json(json!({ "token": token })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": 0,
            "msg": "OK",
            "data": { "code": code }
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(GENERATE_CRED_PATH))
        .and(wiremock::matchers::body_partial_json(json!({ "code": code })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "message": "OK",
            "data": { "cred": cred, "token": secret, "userId": "1001" }
        })))
        .mount(server)
        .await;
}

/// Matches requests whose `sign` header is the signature of their own path
/// and `timestamp` header under `secret`
#[allow(dead_code)]
pub struct ValidSignature {
    pub secret: String,
}

impl ValidSignature {
    #[allow(dead_code)]
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }
}

impl Match for ValidSignature {
    fn matches(&self, request: &Request) -> bool {
        let header = |name: &str| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let (Some(timestamp), Some(signature)) = (header("timestamp"), header("sign")) else {
            return false;
        };
        let expected =
            endfield_checkin::sign(request.url.path(), &timestamp, &self.secret, "3", "1.0.0")
                .ok()
                .flatten();
        expected.as_deref() == Some(signature.as_str())
    }
}
