use std::time::Duration;

use actix_web::{web, App, HttpResponse, HttpServer};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use cangate::client::Client;
use cangate::gateway::{AccessGateway, ContractError};
use cangate::types::principal::Principal;

static PRINCIPAL: Lazy<Principal> =
    Lazy::new(|| Principal::new("demoUser", vec!["admin".to_string()]));

async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "serving", "version": "0.0.0-test"}))
}

// Scripted decision service: the resource kind selects the failure mode,
// anything else is answered per instance and action, allowing only
// principals carrying the admin role.
async fn check(body: web::Json<Value>) -> HttpResponse {
    let body = body.into_inner();
    let kind = body["resource"]["kind"].as_str().unwrap_or_default();

    match kind {
        "broken" => HttpResponse::Ok()
            .content_type("application/json")
            .body("not json"),
        "missing" => HttpResponse::Ok().json(json!({"results": {}})),
        "refused" => HttpResponse::InternalServerError().body("policy engine exploded"),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            HttpResponse::Ok().json(json!({"results": {}}))
        }
        _ => {
            let admin = body["principal"]["roles"]
                .as_array()
                .map(|roles| roles.iter().any(|role| role == "admin"))
                .unwrap_or(false);
            let verdict = if admin { "ALLOW" } else { "DENY" };

            let empty = Vec::new();
            let actions = body["actions"].as_array().unwrap_or(&empty);
            let mut results = serde_json::Map::new();
            if let Some(instances) = body["resource"]["instances"].as_object() {
                for id in instances.keys() {
                    let mut verdicts = serde_json::Map::new();
                    for action in actions {
                        if let Some(action) = action.as_str() {
                            verdicts.insert(action.to_string(), json!(verdict));
                        }
                    }
                    results.insert(id.clone(), Value::Object(verdicts));
                }
            }
            HttpResponse::Ok().json(json!({"results": results}))
        }
    }
}

async fn start_mock(port: u16) {
    let server = HttpServer::new(|| {
        App::new()
            .route("/healthz", web::get().to(healthz))
            .route("/api/check", web::post().to(check))
    })
    .bind(("127.0.0.1", port))
    .unwrap()
    .run();
    tokio::spawn(server);
}

async fn connect(port: u16, timeout: Duration) -> Client {
    Client::connect(&format!("http://127.0.0.1:{port}"), "", timeout)
        .await
        .unwrap()
}

#[actix_web::test]
async fn gateway_end_to_end() {
    start_mock(9860).await;
    let client = connect(9860, Duration::from_secs(1)).await;
    let gateway = AccessGateway::new(client);

    // Explicit ALLOW comes back as true, keyed by the record id.
    let record = json!({"id": "7", "title": "hello"});
    let record = record.as_object().unwrap();
    assert!(gateway
        .can_perform(&PRINCIPAL, "posts", "delete", Some(record))
        .await
        .unwrap());

    // A principal without the admin role gets an explicit DENY.
    let viewer = Principal::new("viewer", vec!["viewer".to_string()]);
    assert!(!gateway
        .can_perform(&viewer, "posts", "delete", Some(record))
        .await
        .unwrap());

    // Create checks work without a record, keyed by the sentinel.
    assert!(gateway
        .can_perform(&PRINCIPAL, "posts", "create", None)
        .await
        .unwrap());

    // A response missing our verdict reads as denied.
    assert!(!gateway
        .can_perform(&PRINCIPAL, "missing", "delete", None)
        .await
        .unwrap());

    // A malformed response body is absorbed, not surfaced.
    assert!(!gateway
        .can_perform(&PRINCIPAL, "broken", "delete", None)
        .await
        .unwrap());

    // So is a server-side failure status.
    assert!(!gateway
        .can_perform(&PRINCIPAL, "refused", "delete", None)
        .await
        .unwrap());

    // And a response slower than the client timeout.
    assert!(!gateway
        .can_perform(&PRINCIPAL, "slow", "delete", None)
        .await
        .unwrap());

    // Caller contract violations surface before any request is issued.
    let err = gateway
        .can_perform(&PRINCIPAL, "", "delete", None)
        .await
        .unwrap_err();
    assert_eq!(err, ContractError::EmptyResourceKind);
    let err = gateway
        .can_perform(&PRINCIPAL, "posts", "", None)
        .await
        .unwrap_err();
    assert_eq!(err, ContractError::EmptyAction);
}

#[actix_web::test]
async fn connect_rejects_unhealthy_service() {
    let server = HttpServer::new(|| {
        App::new().route(
            "/healthz",
            web::get().to(|| async { HttpResponse::Ok().json(json!({"status": "starting"})) }),
        )
    })
    .bind(("127.0.0.1", 9861))
    .unwrap()
    .run();
    tokio::spawn(server);

    let result = Client::connect("http://127.0.0.1:9861", "", Duration::from_secs(1)).await;
    assert!(result.is_err());
}

#[actix_web::test]
async fn connect_rejects_bad_urls() {
    let result = Client::connect("ftp://pdp.example.com", "", Duration::from_secs(1)).await;
    assert!(result.is_err());

    let result = Client::connect("http://pdp.example.com/sub/path", "", Duration::from_secs(1)).await;
    assert!(result.is_err());
}
