//! Backend client against a scripted HTTP server: the wire sequence of one claim.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hp_core::auth::AuthTokens;
use hp_core::backend::AttachRequest;
use hp_core::ports::{AuthTokenPort, DeviceBackendPort, ServerPresencePort};
use hp_core::settings::HttpSettings;
use hp_core::{ClaimCode, DeviceId, DeviceNaming, Lookup, PlantId, UserId};
use hp_platform::BackendClient;
use mockito::{Matcher, Server};

struct StaticToken(Mutex<Option<AuthTokens>>);

#[async_trait]
impl AuthTokenPort for StaticToken {
    async fn load(&self) -> anyhow::Result<Option<AuthTokens>> {
        Ok(self.0.lock().unwrap().clone())
    }

    async fn save(&self, tokens: &AuthTokens) -> anyhow::Result<()> {
        *self.0.lock().unwrap() = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        *self.0.lock().unwrap() = None;
        Ok(())
    }
}

#[tokio::test]
async fn backend_flow_claim_status_then_attach_then_confirm() {
    let mut server = Server::new_async().await;
    let claim = server
        .mock("GET", "/claims/status")
        .match_query(Matcher::UrlEncoded("code".into(), "785".into()))
        .with_status(200)
        .with_body(r#"{"code":"785","user_id":null,"device_id":"hpfs-9f1c"}"#)
        .create_async()
        .await;
    let attach = server
        .mock("POST", "/devices/attach")
        .match_header("authorization", "Bearer access-1")
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;
    let lookup = server
        .mock("GET", "/devices/lookup")
        .match_query(Matcher::UrlEncoded("device_id".into(), "hpfs-9f1c".into()))
        .with_status(200)
        .with_body(r#"{"device_id":"hpfs-9f1c","owner_id":42,"plant_id":3,"online":1}"#)
        .create_async()
        .await;

    let tokens = Arc::new(StaticToken(Mutex::new(Some(AuthTokens {
        access: "access-1".to_string(),
        refresh: Some("refresh-1".to_string()),
    }))));
    let backend = BackendClient::new(
        server.url(),
        DeviceNaming::default(),
        tokens,
        &HttpSettings::default(),
    )
    .unwrap();
    let code = ClaimCode::parse("785").unwrap();

    let device_id = backend.query_by_claim_code(&code).await.found().unwrap();
    assert_eq!(device_id, DeviceId::from("hpfs-9f1c"));

    backend
        .attach(&AttachRequest {
            device_id: device_id.clone(),
            plant_id: PlantId::new(3),
            claim: code,
        })
        .await
        .unwrap();

    let record = match backend.lookup_device(&device_id).await {
        Lookup::Found(record) => record,
        other => panic!("expected a record, got {other:?}"),
    };
    assert!(record.is_attached_to(Some(UserId::new(42))));

    claim.assert_async().await;
    attach.assert_async().await;
    lookup.assert_async().await;
}
