//! End-to-end page behaviour against mock services

use std::sync::Arc;
use std::time::Duration;

use apiprobe_common::resources::{Location, Product, Store, User};
use apiprobe_common::{
    Credential, CredentialSource, Error, Identity, ResourcePage, ServiceClient, SessionProvider,
    Status, Subscription,
};
use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticCredential(Option<&'static str>);

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn fresh_credential(&self, _identity: &Identity) -> apiprobe_common::Result<Credential> {
        match self.0 {
            Some(token) => Ok(Credential::new(token)),
            None => Err(Error::Identity("token endpoint unreachable".into())),
        }
    }
}

/// Session that has processed one sign-in for `u1`
async fn signed_in(token: Option<&'static str>) -> (SessionProvider, Subscription) {
    let session = SessionProvider::new();
    let events = futures::stream::iter(vec![Some(Identity::new("u1"))]);
    let sub = session.subscribe(events, Arc::new(StaticCredential(token)));
    session.ready().await;
    (session, sub)
}

fn store_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "address": "Rua das Flores, 10",
        "store_category": "bakery",
        "description": "",
        "location": {"latitude": -23.5, "longitude": -46.6}
    })
}

#[tokio::test]
async fn create_success_reports_id_and_resets_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_json(json!({
            "email": "ana@example.com",
            "name": "Ana",
            "location": {"latitude": 0.0, "longitude": 0.0}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _sub) = signed_in(Some("tok-1")).await;
    let page: ResourcePage<User> = ResourcePage::new(ServiceClient::new(server.uri()), session);
    page.edit(|u| {
        u.email = "ana@example.com".into();
        u.name = "Ana".into();
    });

    let status = page.create().await;
    let message = status.message().expect("success message");
    assert!(message.contains("abc123"), "{}", message);
    assert_eq!(page.form(), User::default());
}

#[tokio::test]
async fn create_failure_shows_error_and_keeps_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stores"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "name required"})))
        .mount(&server)
        .await;

    let (session, _sub) = signed_in(Some("tok-1")).await;
    let page: ResourcePage<Store> = ResourcePage::new(ServiceClient::new(server.uri()), session);
    page.edit(|s| {
        s.name = "Padaria".into();
        s.address = "Rua A".into();
        s.store_category = "bakery".into();
    });
    let before = page.form();

    let status = page.create().await;
    assert_eq!(status, Status::Failed("name required".into()));
    assert_eq!(page.form(), before);
}

#[tokio::test]
async fn delete_resets_entity_and_fetch_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stores/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(store_json("s-1", "Padaria")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/stores/s-1"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _sub) = signed_in(Some("tok-1")).await;
    let page: ResourcePage<Store> = ResourcePage::new(ServiceClient::new(server.uri()), session);
    page.set_fetch_id("s-1");

    assert_eq!(page.fetch().await, Status::Succeeded("Store found.".into()));
    assert_eq!(page.form().location, Some(Location::new(-23.5, -46.6)));

    let status = page.delete().await;
    assert_eq!(status, Status::Succeeded("Store deleted successfully.".into()));
    assert_eq!(page.form(), Store::default());
    assert!(page.fetch_id().is_empty());
}

#[tokio::test]
async fn protected_calls_need_a_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    // Identity present but credential retrieval failed
    let (session, _sub) = signed_in(None).await;
    assert!(session.snapshot().identity().is_some());

    let page: ResourcePage<Product> = ResourcePage::new(ServiceClient::new(server.uri()), session);
    page.edit(|p| {
        p.name = "Café".into();
        p.store_id = "s-1".into();
        p.category = "drinks".into();
    });
    assert_eq!(page.create().await, Status::Failed("Login required.".into()));
}

#[tokio::test]
async fn validation_and_loaded_entity_checks_skip_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (session, _sub) = signed_in(Some("tok-1")).await;
    let page: ResourcePage<Product> = ResourcePage::new(ServiceClient::new(server.uri()), session);
    page.edit(|p| p.name = "Café".into());

    assert_eq!(
        page.create().await,
        Status::Failed("Missing required field: store_id".into())
    );
    assert_eq!(
        page.update().await,
        Status::Failed("Login and loaded product required.".into())
    );
}

#[tokio::test]
async fn update_puts_loaded_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stores/s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(store_json("s-1", "Padaria")))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/stores/s-1"))
        .and(body_json(json!({
            "name": "Padaria Nova",
            "address": "Rua das Flores, 10",
            "store_category": "bakery",
            "description": "",
            "location": {"latitude": -23.5, "longitude": -46.6}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let (session, _sub) = signed_in(Some("tok-1")).await;
    let page: ResourcePage<Store> = ResourcePage::new(ServiceClient::new(server.uri()), session);
    page.set_fetch_id("s-1");
    page.fetch().await;
    page.edit(|s| s.name = "Padaria Nova".into());

    assert_eq!(
        page.update().await,
        Status::Succeeded("Store updated successfully.".into())
    );
    assert_eq!(page.form().name, "Padaria Nova");
}

#[tokio::test]
async fn failed_fetch_resets_form() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stores/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Store not found"})))
        .mount(&server)
        .await;

    let page: ResourcePage<Store> =
        ResourcePage::new(ServiceClient::new(server.uri()), SessionProvider::new());
    page.edit(|s| s.name = "draft".into());
    page.set_fetch_id("missing");

    assert_eq!(page.fetch().await, Status::Failed("Store not found".into()));
    assert_eq!(page.form(), Store::default());
}

#[tokio::test]
async fn stale_fetch_does_not_overwrite_newer_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stores/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(store_json("slow", "Slow Store"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/stores/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(store_json("fast", "Fast Store")))
        .mount(&server)
        .await;

    let page: ResourcePage<Store> =
        ResourcePage::new(ServiceClient::new(server.uri()), SessionProvider::new());

    page.set_fetch_id("slow");
    let slow_page = page.clone();
    let slow = tokio::spawn(async move { slow_page.fetch().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    page.set_fetch_id("fast");
    assert_eq!(page.fetch().await, Status::Succeeded("Store found.".into()));
    assert_eq!(page.form().name, "Fast Store");

    slow.await.unwrap();
    assert_eq!(page.form().name, "Fast Store");
    assert_eq!(page.form().id.as_deref(), Some("fast"));
}

#[tokio::test]
async fn validation_failure_supersedes_in_flight_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/stores/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(store_json("slow", "Slow Store"))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let page: ResourcePage<Store> =
        ResourcePage::new(ServiceClient::new(server.uri()), SessionProvider::new());

    page.set_fetch_id("slow");
    let slow_page = page.clone();
    let slow = tokio::spawn(async move { slow_page.fetch().await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    page.set_fetch_id("");
    let rejected = Status::Failed("Enter a store ID.".into());
    assert_eq!(page.fetch().await, rejected);

    slow.await.unwrap();
    assert_eq!(page.status(), rejected);
    assert_eq!(page.form(), Store::default());
}
