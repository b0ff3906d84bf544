//! HTTP 测试辅助：内存数据库 + 完整路由，通过 `oneshot` 发送请求

#![allow(dead_code)]

use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use water_server::core::config::FileConfig;
use water_server::db::DbService;
use water_server::{AppState, Config, build_app};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

pub struct TestApp {
    pub state: AppState,
    _upload_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let upload_path = upload_dir.path().display().to_string();
        let config = Config::from_sources(FileConfig::default(), move |key| match key {
            "ADMIN_USERNAME" => Some(ADMIN_USERNAME.to_string()),
            "ADMIN_PASSWORD" => Some(ADMIN_PASSWORD.to_string()),
            "UPLOAD_DIR" => Some(upload_path.clone()),
            "JWT_SECRET" => Some("test-secret".to_string()),
            _ => None,
        })
        .unwrap();

        let db = DbService::in_memory().await.unwrap();
        let state = AppState::with_pool(config, db.pool);
        state.bootstrap_admin().await.unwrap();
        Self {
            state,
            _upload_dir: upload_dir,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = build_app(self.state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, body).await
    }

    /// 发送验证码并登录，返回 access_token
    pub async fn login_user(&self, phone: &str) -> String {
        let (_, body) = self
            .post("/api/auth/send-code", None, json!({ "phone": phone }))
            .await;
        assert_code(&body, "0");
        let code = body["data"]["verifyCode"].as_str().unwrap().to_string();

        let (_, body) = self
            .post(
                "/api/auth/phone-login",
                None,
                json!({ "phone": phone, "code": code }),
            )
            .await;
        assert_code(&body, "0");
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    pub async fn login_admin(&self) -> String {
        let (_, body) = self
            .post(
                "/api/admin-auth/login",
                None,
                json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_code(&body, "0");
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    pub async fn create_product(&self, admin: &str, name: &str, price: f64, stock: i64) -> i64 {
        let (_, body) = self
            .post(
                "/api/products",
                Some(admin),
                json!({ "name": name, "price": price, "stock": stock }),
            )
            .await;
        assert_code(&body, "0");
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn create_address(&self, user: &str) -> i64 {
        let (_, body) = self
            .post(
                "/api/addresses",
                Some(user),
                json!({
                    "name": "张三",
                    "phone": "13800138000",
                    "province": "浙江省",
                    "city": "杭州市",
                    "detail": "文一西路 100 号",
                    "is_default": true
                }),
            )
            .await;
        assert_code(&body, "0");
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn product_stock(&self, admin: &str, product_id: i64) -> i64 {
        let (_, body) = self.get("/api/products/admin/all", Some(admin)).await;
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["id"].as_i64() == Some(product_id))
            .and_then(|p| p["stock"].as_i64())
            .unwrap()
    }
}

#[track_caller]
pub fn assert_code(body: &Value, code: &str) {
    assert_eq!(body["code"], code, "unexpected envelope: {body}");
}
