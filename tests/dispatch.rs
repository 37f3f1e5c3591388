// End-to-end routing through the dispatcher's axum router
#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use axum::{Router, body::Body, extract::Request};
    use http_body_util::BodyExt;
    use hyper::{Method, StatusCode, header};
    use spark::{
        Dispatcher, HttpClientAdapter,
        config::{CorsConfig, ServerConfig},
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn router(config: &ServerConfig) -> Router {
        let client = Arc::new(HttpClientAdapter::new(Duration::from_secs(2)).unwrap());
        Dispatcher::from_config(config, client).unwrap().into_router()
    }

    async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, header::HeaderMap, String) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8_lossy(&body).into_owned())
    }

    fn mock_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let users = dir.path().join("users");
        std::fs::create_dir_all(&users).unwrap();
        std::fs::write(users.join("GET"), "user list").unwrap();
        std::fs::write(users.join("POST_201.json"), "{\"created\":true}").unwrap();
        dir
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mock_endpoint_methods() {
        let mocks = mock_tree();
        let config = ServerConfig::builder()
            .body("fallback")
            .mock_dir(Some(mocks.path().to_path_buf()))
            .build();
        let router = router(&config);

        let (status, _, body) = send(&router, Method::GET, "/users").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "user list");

        let (status, headers, body) = send(&router, Method::POST, "/users").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(body, "{\"created\":true}");

        let (status, headers, _) = send(&router, Method::PUT, "/users").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers[header::ALLOW], "GET, POST");

        // Paths outside the mock endpoints fall through to the content route
        let (status, _, body) = send(&router, Method::GET, "/other").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "fallback");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_preflight_on_every_route() {
        let mocks = mock_tree();
        let config = ServerConfig::builder()
            .body("content")
            .mock_dir(Some(mocks.path().to_path_buf()))
            .proxy("/api=>http://127.0.0.1:9")
            .cors(CorsConfig {
                origin: "*".to_string(),
                ..CorsConfig::default()
            })
            .build();
        let router = router(&config);

        for uri in ["/", "/users", "/api/x", "/echo"] {
            let (status, headers, body) = send(&router, Method::OPTIONS, uri).await;
            assert_eq!(status, StatusCode::OK, "preflight to {uri}");
            assert!(body.is_empty(), "preflight to {uri}");
            assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(
                headers[header::ACCESS_CONTROL_ALLOW_METHODS],
                "POST, GET, OPTIONS, PUT, DELETE"
            );
            assert_eq!(
                headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
                "Content-Type, Authorization, X-Requested-With"
            );
        }

        // Non-preflight requests carry the headers too
        let (_, headers, _) = send(&router, Method::GET, "/").await;
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_options_without_cors_reaches_handler() {
        let mocks = mock_tree();
        let config = ServerConfig::builder()
            .body("content")
            .mock_dir(Some(mocks.path().to_path_buf()))
            .build();
        let router = router(&config);

        let (status, headers, _) = send(&router, Method::OPTIONS, "/users").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_directory_mode_filters_and_lists() {
        let root = TempDir::new().unwrap();
        std::fs::write(root.path().join("index.txt"), "public").unwrap();
        std::fs::write(root.path().join(".env"), "SECRET=1").unwrap();
        std::fs::create_dir_all(root.path().join(".git")).unwrap();
        std::fs::write(root.path().join(".git/HEAD"), "ref").unwrap();

        let config = ServerConfig::builder()
            .path("/files")
            .deny(".env, .git")
            .body(root.path().to_str().unwrap())
            .build();
        let router = router(&config);

        let (status, _, body) = send(&router, Method::GET, "/files/index.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "public");

        let (status, _, body) = send(&router, Method::GET, "/files/.env").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(!body.contains("SECRET"));

        let (status, _, _) = send(&router, Method::GET, "/files/.git/HEAD").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, headers, _) = send(&router, Method::GET, "/files").await;
        assert_eq!(status, StatusCode::MOVED_PERMANENTLY);
        assert_eq!(headers[header::LOCATION], "files/");

        let (status, _, body) = send(&router, Method::GET, "/files/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("index.txt"));
        assert!(!body.contains(".env"));
        assert!(!body.contains(".git"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_file_body_is_loaded_once() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("payload.json");
        std::fs::write(&file, "{\"v\":1}").unwrap();

        let config = ServerConfig::builder()
            .body(file.to_str().unwrap())
            .status(418)
            .build();
        let router = router(&config);

        let first = send(&router, Method::GET, "/a").await;
        // Changing the file after startup has no effect
        std::fs::write(&file, "{\"v\":2}").unwrap();
        let second = send(&router, Method::GET, "/a").await;

        assert_eq!(first.0, StatusCode::IM_A_TEAPOT);
        assert_eq!(first.2, "{\"v\":1}");
        assert_eq!(first.2, second.2);
        assert_eq!(first.0, second.0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_echo_reports_request() {
        let config = ServerConfig::builder().body("content").build();
        let router = router(&config);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/echo?trace=1")
            .header(header::HOST, "spark.local")
            .body(Body::from("hello"))
            .unwrap();
        let response = router.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Method: POST\n"));
        assert!(text.contains("Query: trace=1\n"));
        assert!(text.contains("Host: spark.local\n"));
        assert!(text.ends_with("=== BODY ===\nhello\n"));
    }
}
