//! Backend REST client.
//!
//! 后端 REST 客户端：
//! - 公开接口：`/devices/lookup`、`/claims/status`（存在性查询）
//! - 需要令牌：`/devices`、`/plants`、`POST /devices/attach`

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use hp_core::backend::shape::{
    claim_bound_device, device_id_of, device_records, first_device_record,
};
use hp_core::backend::{AttachRequest, DeviceRecord, PlantRecord};
use hp_core::ports::{AttachError, AuthTokenPort, DeviceBackendPort, ServerPresencePort};
use hp_core::settings::HttpSettings;
use hp_core::{Absence, ClaimCode, DeviceId, DeviceNaming, Lookup};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::http::{build_client, error_message, join_url, json_lookup};

const DEVICE_LOOKUP_PATH: &str = "/devices/lookup";
const CLAIM_STATUS_PATH: &str = "/claims/status";
const DEVICES_PATH: &str = "/devices";
const PLANTS_PATH: &str = "/plants";
const ATTACH_PATH: &str = "/devices/attach";

#[derive(Debug, Deserialize)]
struct AttachAck {
    ok: Option<bool>,
}

pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    attach_timeout: Duration,
    naming: DeviceNaming,
    tokens: Arc<dyn AuthTokenPort>,
}

impl BackendClient {
    pub fn new(
        base_url: impl Into<String>,
        naming: DeviceNaming,
        tokens: Arc<dyn AuthTokenPort>,
        http: &HttpSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client(http.backend_timeout)?,
            base_url: base_url.into(),
            attach_timeout: http.attach_timeout,
            naming,
            tokens,
        })
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    async fn access_token(&self) -> Option<String> {
        match self.tokens.load().await {
            Ok(tokens) => tokens.map(|t| t.access).filter(|t| !t.is_empty()),
            Err(err) => {
                warn!(error = %err, "failed to load auth token");
                None
            }
        }
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.access_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET `path` with a bearer token and decode a JSON body.
    async fn get_authorized<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        if self.access_token().await.is_none() {
            bail!("not signed in: no access token stored");
        }
        let url = self.url(path);
        let response = self
            .authorized(self.client.get(&url))
            .await
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = error_message(&body).unwrap_or_else(|| status.to_string());
            bail!("GET {url} returned {}: {reason}", status.as_u16());
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("GET {url} returned an unexpected body"))
    }

    async fn lookup_raw(&self, device_id: &DeviceId) -> Lookup<serde_json::Value> {
        let device_id = self.naming.normalize_device_id(device_id);
        let sent = self
            .client
            .get(self.url(DEVICE_LOOKUP_PATH))
            .query(&[("device_id", device_id.as_str())])
            .send()
            .await;
        json_lookup(sent).await
    }
}

#[async_trait]
impl ServerPresencePort for BackendClient {
    async fn query_by_device_id(&self, candidate: &DeviceId) -> Lookup<DeviceId> {
        let result = self
            .lookup_raw(candidate)
            .await
            .and_then(|value| Lookup::from_option(device_id_of(&value)));
        if let Lookup::Absent(absence) = &result {
            debug!(device_id = %candidate, %absence, "device lookup: no hit");
        }
        result
    }

    async fn query_by_claim_code(&self, code: &ClaimCode) -> Lookup<DeviceId> {
        let sent = self
            .client
            .get(self.url(CLAIM_STATUS_PATH))
            .query(&[("code", code.as_str())])
            .send()
            .await;
        let result = json_lookup(sent)
            .await
            .and_then(|value| Lookup::from_option(claim_bound_device(&value)));
        if let Lookup::Absent(absence) = &result {
            debug!(code = %code, %absence, "claim status: no hit");
        }
        result
    }
}

#[async_trait]
impl DeviceBackendPort for BackendClient {
    async fn attach(&self, request: &AttachRequest) -> Result<(), AttachError> {
        let url = self.url(ATTACH_PATH);
        let response = self
            .authorized(self.client.post(&url))
            .await
            .timeout(self.attach_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| AttachError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        if !(200..300).contains(&status) {
            return Err(AttachError::Rejected {
                status,
                message: error_message(&body),
            });
        }

        let ack = serde_json::from_str::<AttachAck>(&body).ok();
        if ack.and_then(|a| a.ok) == Some(false) {
            return Err(AttachError::Rejected {
                status,
                message: error_message(&body),
            });
        }

        info!(device_id = %request.device_id, plant_id = %request.plant_id, "attach accepted");
        Ok(())
    }

    async fn lookup_device(&self, device_id: &DeviceId) -> Lookup<DeviceRecord> {
        self.lookup_raw(device_id).await.and_then(|value| {
            match first_device_record(&value) {
                Some(record) => Lookup::Found(record),
                None => Lookup::Absent(Absence::Malformed(
                    "no device record in lookup response".to_string(),
                )),
            }
        })
    }

    async fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        let body: serde_json::Value = self.get_authorized(DEVICES_PATH).await?;
        let records = device_records(&body);
        debug!(count = records.len(), "device list decoded");
        Ok(records)
    }

    async fn list_plants(&self) -> Result<Vec<PlantRecord>> {
        self.get_authorized(PLANTS_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hp_core::auth::AuthTokens;
    use hp_core::{PlantId, UserId};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryTokens(Mutex<Option<AuthTokens>>);

    impl MemoryTokens {
        fn signed_in(access: &str) -> Arc<Self> {
            Arc::new(Self(Mutex::new(Some(AuthTokens {
                access: access.to_string(),
                refresh: None,
            }))))
        }
    }

    #[async_trait]
    impl AuthTokenPort for MemoryTokens {
        async fn load(&self) -> Result<Option<AuthTokens>> {
            Ok(self.0.lock().unwrap().clone())
        }

        async fn save(&self, tokens: &AuthTokens) -> Result<()> {
            *self.0.lock().unwrap() = Some(tokens.clone());
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            *self.0.lock().unwrap() = None;
            Ok(())
        }
    }

    fn client(server: &Server, tokens: Arc<dyn AuthTokenPort>) -> BackendClient {
        BackendClient::new(
            server.url(),
            DeviceNaming::default(),
            tokens,
            &HttpSettings::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_by_device_id_accepts_array_shape() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/devices/lookup")
            .match_query(Matcher::UrlEncoded("device_id".into(), "hpfs-785".into()))
            .with_status(200)
            .with_body(r#"[{"id":"hpfs-785","owner_id":null}]"#)
            .create_async()
            .await;
        let backend = client(&server, Arc::new(MemoryTokens::default()));

        let result = backend.query_by_device_id(&DeviceId::from("hpfs-785")).await;

        mock.assert_async().await;
        assert_eq!(result, Lookup::Found(DeviceId::from("hpfs-785")));
    }

    #[tokio::test]
    async fn test_query_by_device_id_normalizes_bare_code() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/devices/lookup")
            .match_query(Matcher::UrlEncoded("device_id".into(), "hpfs-785".into()))
            .with_status(200)
            .with_body(r#"{"device_id":"hpfs-785"}"#)
            .create_async()
            .await;
        let backend = client(&server, Arc::new(MemoryTokens::default()));

        let result = backend.query_by_device_id(&DeviceId::from("785")).await;

        mock.assert_async().await;
        assert!(result.is_found());
    }

    #[tokio::test]
    async fn test_presence_failures_are_absences() {
        let mut server = Server::new_async().await;
        let _missing = server
            .mock("GET", "/devices/lookup")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"error":"not found"}"#)
            .create_async()
            .await;
        let _broken = server
            .mock("GET", "/claims/status")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;
        let backend = client(&server, Arc::new(MemoryTokens::default()));

        assert_eq!(
            backend.query_by_device_id(&DeviceId::from("hpfs-785")).await,
            Lookup::Absent(Absence::NotFound)
        );
        assert_eq!(
            backend
                .query_by_claim_code(&ClaimCode::parse("785").unwrap())
                .await,
            Lookup::Absent(Absence::Status(500))
        );
    }

    #[tokio::test]
    async fn test_query_by_claim_code_needs_bound_device() {
        let mut server = Server::new_async().await;
        let pending = server
            .mock("GET", "/claims/status")
            .match_query(Matcher::UrlEncoded("code".into(), "785".into()))
            .with_status(200)
            .with_body(r#"{"code":"785","device_id":null}"#)
            .expect(1)
            .create_async()
            .await;
        let backend = client(&server, Arc::new(MemoryTokens::default()));
        let code = ClaimCode::parse("785").unwrap();

        assert_eq!(
            backend.query_by_claim_code(&code).await,
            Lookup::Absent(Absence::NotFound)
        );
        pending.assert_async().await;
        pending.remove_async().await;

        let _bound = server
            .mock("GET", "/claims/status")
            .match_query(Matcher::UrlEncoded("code".into(), "785".into()))
            .with_status(200)
            .with_body(r#"{"code":"785","device_id":"hpfs-abc"}"#)
            .create_async()
            .await;
        assert_eq!(
            backend.query_by_claim_code(&code).await,
            Lookup::Found(DeviceId::from("hpfs-abc"))
        );
    }

    #[tokio::test]
    async fn test_attach_sends_bearer_and_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/devices/attach")
            .match_header("authorization", "Bearer tok-1")
            .match_body(Matcher::Json(json!({
                "device_id": "hpfs-785",
                "plant_id": 3,
                "claim": "785"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;
        let backend = client(&server, MemoryTokens::signed_in("tok-1"));

        let result = backend
            .attach(&AttachRequest {
                device_id: DeviceId::from("hpfs-785"),
                plant_id: PlantId::new(3),
                claim: ClaimCode::parse("785").unwrap(),
            })
            .await;

        mock.assert_async().await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_attach_rejections() {
        let mut server = Server::new_async().await;
        let _conflict = server
            .mock("POST", "/devices/attach")
            .with_status(409)
            .with_body(r#"{"error":"device already claimed"}"#)
            .create_async()
            .await;
        let backend = client(&server, MemoryTokens::signed_in("tok-1"));
        let request = AttachRequest {
            device_id: DeviceId::from("hpfs-785"),
            plant_id: PlantId::new(3),
            claim: ClaimCode::parse("785").unwrap(),
        };

        assert_eq!(
            backend.attach(&request).await,
            Err(AttachError::Rejected {
                status: 409,
                message: Some("device already claimed".to_string()),
            })
        );

        server.reset_async().await;
        let _not_ok = server
            .mock("POST", "/devices/attach")
            .with_status(200)
            .with_body(r#"{"ok":false}"#)
            .create_async()
            .await;
        assert_eq!(
            backend.attach(&request).await,
            Err(AttachError::Rejected {
                status: 200,
                message: None,
            })
        );
    }

    #[tokio::test]
    async fn test_lookup_device_reads_first_record() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/devices/lookup")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"device_id":"hpfs-785","owner_id":7,"online":1}]"#)
            .create_async()
            .await;
        let backend = client(&server, Arc::new(MemoryTokens::default()));

        let record = backend
            .lookup_device(&DeviceId::from("hpfs-785"))
            .await
            .found()
            .unwrap();

        assert!(record.is_attached_to(Some(UserId::new(7))));
        assert_eq!(record.online, Some(true));
    }

    #[tokio::test]
    async fn test_lookup_device_tolerates_database_row_types() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/devices/lookup")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"id":42,"device_id":"hpfs-785","owner_id":7,"last_seen_at":"2025-08-18T10:00:00Z"}"#,
            )
            .create_async()
            .await;
        let backend = client(&server, Arc::new(MemoryTokens::default()));

        let record = backend
            .lookup_device(&DeviceId::from("hpfs-785"))
            .await
            .found()
            .unwrap();

        assert_eq!(record.identifier(), Some(DeviceId::from("hpfs-785")));
        assert!(record.is_attached_to(Some(UserId::new(7))));
    }

    #[tokio::test]
    async fn test_list_devices_skips_unusable_rows() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/devices")
            .with_status(200)
            .with_body(r#"[{"device_id":"hpfs-1","id":9,"online":1},7,{"device_id":"hpfs-2","firmware_version":3}]"#)
            .create_async()
            .await;
        let backend = client(&server, MemoryTokens::signed_in("tok-1"));

        let devices = backend.list_devices().await.unwrap();

        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].online, Some(true));
        assert_eq!(devices[1].identifier(), Some(DeviceId::from("hpfs-2")));
    }

    #[tokio::test]
    async fn test_list_devices_requires_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/devices")
            .match_header("authorization", "Bearer tok-1")
            .with_status(200)
            .with_body(r#"[{"device_id":"hpfs-785","plant_id":3}]"#)
            .create_async()
            .await;

        let anonymous = client(&server, Arc::new(MemoryTokens::default()));
        assert!(anonymous.list_devices().await.is_err());

        let backend = client(&server, MemoryTokens::signed_in("tok-1"));
        let devices = backend.list_devices().await.unwrap();

        mock.assert_async().await;
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].plant_id, Some(PlantId::new(3)));
    }

    #[tokio::test]
    async fn test_list_plants_surfaces_backend_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/plants")
            .with_status(401)
            .with_body(r#"{"error":"token expired"}"#)
            .create_async()
            .await;
        let backend = client(&server, MemoryTokens::signed_in("tok-1"));

        let err = backend.list_plants().await.unwrap_err();

        assert!(err.to_string().contains("token expired"), "{err}");
    }
}
