#[cfg(test)]
mod admin_api_tests {
    use crate::api::{app_state::AppState, create_router};
    use crate::bulk::upstream::ProductCreator;
    use crate::config::AppConfig;
    use crate::config::config::ServerConfig;
    use crate::observability::AppMetrics;
    use crate::session::{HttpTokenRefresher, TokenRefresher};
    use crate::storage::{OrderStore, ProductStore};
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
        routing::get,
    };
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "admin-token";
    const CSRF: &str = "dGVzdC1jc3JmLXRva2Vu";
    const BOUNDARY: &str = "fitfoot-boundary";

    fn test_app() -> (Router, AppState) {
        test_app_with_backend("http://127.0.0.1:9")
    }

    fn test_app_with_backend(backend_url: &str) -> (Router, AppState) {
        let products = ProductStore::seeded();
        let creator: Arc<dyn ProductCreator> = Arc::new(products.clone());
        let refresher: Arc<dyn TokenRefresher> =
            Arc::new(HttpTokenRefresher::new(backend_url, Duration::from_secs(2)).unwrap());
        let state = AppState::with_parts(
            AppConfig::development(),
            products,
            OrderStore::seeded(),
            creator,
            refresher,
            Arc::new(AppMetrics::new().unwrap()),
        );
        (create_router(state.clone()), state)
    }

    fn authed(method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .header("X-CSRF-Token", CSRF)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        authed(method, uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_request(file_name: &str, csv: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{BOUNDARY}--\r\n"
        );
        authed("POST", "/api/admin/products/import")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn import_csv() -> String {
        let mut csv = String::from("Title,Description,Price (CHF),Type,Condition Grade,Inventory Quantity\n");
        for i in 1..=10 {
            let line = match i {
                3 => ",Missing title,49.90,new,,5\n".to_string(),
                7 => format!("Shoe {i},Bad price,-5,new,,5\n"),
                _ => format!("Shoe {i},Imported shoe {i},{i}9.90,new,,{i}\n"),
            };
            csv.push_str(&line);
        }
        csv
    }

    #[tokio::test]
    async fn test_import_reports_partial_success_with_row_numbers() {
        let (app, state) = test_app();
        let before = state.products.len();

        let response = app
            .oneshot(multipart_request("products.csv", &import_csv()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::MULTI_STATUS);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["totalRows"], 10);
        assert_eq!(json["successfulRows"], 8);
        assert_eq!(json["failedRows"], 2);

        let rows: Vec<u64> = json["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["row"].as_u64().unwrap())
            .collect();
        assert_eq!(rows, vec![4, 8]);
        assert_eq!(json["errors"][0]["field"], "title");
        assert_eq!(json["errors"][1]["message"], "Price must be a positive number");
        assert_eq!(state.products.len(), before + 8);
    }

    #[tokio::test]
    async fn test_import_accepts_raw_csv_body() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                authed("POST", "/api/admin/products/import")
                    .header(header::CONTENT_TYPE, "text/csv")
                    .body(Body::from(
                        "title,description,price,product_type\nRunner,Light shoe,120,new\n",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["successfulRows"], 1);
        assert_eq!(json["createdProducts"][0]["price"], 12000);
    }

    #[tokio::test]
    async fn test_import_rejects_non_csv_file() {
        let (app, _) = test_app();

        let response = app
            .oneshot(multipart_request("products.xlsx", "a,b\n1,2\n"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Only CSV files are allowed");
    }

    #[tokio::test]
    async fn test_import_requires_csrf_token() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/admin/products/import")
                    .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                    .header(header::CONTENT_TYPE, "text/csv")
                    .body(Body::from("title\nx\n"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().contains_key("x-frame-options"));
        let json = body_json(response).await;
        assert_eq!(json["error"], "CSRF token required");
    }

    #[tokio::test]
    async fn test_export_then_import_round_trip() {
        let (app, state) = test_app();

        let export = app
            .clone()
            .oneshot(
                authed("GET", "/api/admin/products/export?ids=1,3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(export.status(), StatusCode::OK);
        assert_eq!(export.headers()[header::CONTENT_TYPE], "text/csv");
        let disposition = export.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"products-export-"));
        assert!(disposition.ends_with(".csv\""));

        let csv = body_text(export).await;
        assert!(csv.starts_with("\"ID\",\"Title\""));
        assert_eq!(csv.lines().count(), 3);

        let import = app
            .oneshot(
                authed("POST", "/api/admin/products/import")
                    .header(header::CONTENT_TYPE, "text/csv")
                    .body(Body::from(csv))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(import.status(), StatusCode::OK);
        let json = body_json(import).await;
        assert_eq!(json["successfulRows"], 2);

        for (index, id) in ["1", "3"].into_iter().enumerate() {
            let original = state.products.get(id).unwrap();
            let copy = &json["createdProducts"][index];
            assert_ne!(copy["id"], id);
            assert_eq!(copy["title"], original.title.as_str());
            assert_eq!(copy["price"], original.price);
            assert_eq!(copy["product_type"], original.product_type.as_str());
            assert_eq!(copy["condition_grade"], json!(original.condition_grade));
        }
        assert_eq!(json["createdProducts"][1]["product_type"], "refurbished");
        assert_eq!(json["createdProducts"][1]["condition_grade"], "excellent");
    }

    #[tokio::test]
    async fn test_export_json_format() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                authed("GET", "/api/admin/products/export?format=json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 3);
        assert_eq!(json["products"][0]["ID"], "1");
    }

    #[tokio::test]
    async fn test_export_unknown_ids_is_not_found() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                authed("GET", "/api/admin/products/export?ids=nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_product_sanitizes_and_returns_201() {
        let (app, _) = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/admin/products",
                json!({
                    "title": "<script>alert(1)</script>Trail Pro",
                    "description": "Grippy sole",
                    "price": 15900,
                    "product_type": "new"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key("x-ratelimit-limit"));
        let json = body_json(response).await;
        assert_eq!(json["product"]["title"], "Trail Pro");
    }

    #[tokio::test]
    async fn test_create_product_missing_fields_is_400() {
        let (app, _) = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/admin/products",
                json!({"title": "Only a title"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn test_missing_auth_is_401_and_audited() {
        let (app, state) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/admin/products")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Authentication required");

        let entries = state.audit_sink.recent(10);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "/api/admin/products");
        assert_eq!(entries[0].response_status, Some(401));
    }

    #[tokio::test]
    async fn test_product_not_found() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                authed("GET", "/api/admin/products/missing")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_bulk_update_with_unknown_id_is_207() {
        let (app, state) = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/admin/products/bulk",
                json!({
                    "action": "update",
                    "productIds": ["1", "ghost"],
                    "updateData": {
                        "category": "trail",
                        "price_adjustment": {"type": "percentage", "value": -10}
                    }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::MULTI_STATUS);
        let json = body_json(response).await;
        assert_eq!(json["totalProcessed"], 2);
        assert_eq!(json["successCount"], 1);
        assert_eq!(json["failureCount"], 1);
        assert_eq!(json["errors"][0]["productId"], "ghost");

        let updated = state.products.get("1").unwrap();
        assert_eq!(updated.category.as_deref(), Some("trail"));
    }

    #[tokio::test]
    async fn test_bulk_rejects_malformed_request() {
        let (app, _) = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/admin/products/bulk",
                json!({"action": "explode", "productIds": ["1"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bulk_archive_all_found_is_200() {
        let (app, state) = test_app();

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/admin/products/bulk",
                json!({"action": "archive", "productIds": ["2", "3"]}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.products.get("2").unwrap().archived);
        assert!(state.products.get("3").unwrap().archived);
    }

    #[tokio::test]
    async fn test_order_patch_without_updates_is_400() {
        let (app, state) = test_app();
        let id = state.orders.list(&Default::default())[0].id.clone();

        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/api/admin/orders/{id}"),
                json!({"unexpected": true}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No valid updates provided");
    }

    #[tokio::test]
    async fn test_order_patch_shipped_sets_fulfillment() {
        let (app, state) = test_app();
        let id = state.orders.list(&Default::default())[0].id.clone();

        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/api/admin/orders/{id}"),
                json!({"status": "shipped", "tracking_number": "CH123"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "shipped");
        assert_eq!(json["fulfillment_status"], "shipped");
        assert_eq!(json["tracking_number"], "CH123");
        assert!(json["estimated_delivery_date"].is_string());
    }

    #[tokio::test]
    async fn test_order_list_filters_by_status() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                authed("GET", "/api/admin/orders?status=shipped")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let orders = json.as_array().unwrap();
        assert!(!orders.is_empty());
        assert!(orders.iter().all(|o| o["status"] == "shipped"));
    }

    #[tokio::test]
    async fn test_csrf_token_issuance_in_advisory_mode() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                authed("GET", "/api/admin/csrf-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let token = json["csrfToken"].as_str().unwrap();
        assert!(crate::security::csrf::has_valid_format(token));
        assert_eq!(json["mode"], "advisory");
        assert!(json.get("expiresIn").is_none());
    }

    #[tokio::test]
    async fn test_session_status_reports_expired_token() {
        let (app, _) = test_app();
        let header_part = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let exp = chrono::Utc::now().timestamp() - 30;
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"admin","exp":{exp}}}"#));
        let token = format!("{header_part}.{payload}.signature");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/session/status")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "expired");
        assert_eq!(json["secondsRemaining"], 0);
    }

    #[tokio::test]
    async fn test_audit_listing_returns_critical_entries() {
        let (app, _) = test_app();

        app.clone()
            .oneshot(
                authed("GET", "/api/admin/products/1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let response = app
            .oneshot(
                authed("GET", "/api/admin/audit?limit=5")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 1);
        assert_eq!(json["entries"][0]["url"], "/api/admin/products/1");
    }

    #[tokio::test]
    async fn test_session_refresh_forwards_bearer_and_returns_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/admin/refresh"))
            .and(bearer_token(TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh-token"})))
            .expect(1)
            .mount(&server)
            .await;
        let (app, _) = test_app_with_backend(&server.uri());

        let response = app
            .oneshot(
                authed("POST", "/api/session/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-ratelimit-limit"));
        let json = body_json(response).await;
        assert_eq!(json["token"], "fresh-token");
    }

    #[tokio::test]
    async fn test_session_refresh_rejected_upstream_is_502() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/admin/refresh"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let (app, _) = test_app_with_backend(&server.uri());

        let response = app
            .oneshot(
                authed("POST", "/api/session/refresh")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["code"], "UPSTREAM_ERROR");
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_session_refresh_requires_csrf_token() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/session/refresh")
                    .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_slow_request_times_out_with_408() {
        let server = ServerConfig {
            request_timeout: 1,
            ..ServerConfig::default()
        };
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .layer(crate::api::timeout_layer(&server));

        let response = app
            .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
