#[cfg(test)]
mod tests {
    use aex_action_test::{
        application::{ApplicationConfig, TypeMapExt},
        testing::{TestApplicationEngine, with_test_application},
    };
    use http::{Method, StatusCode, Version};

    #[tokio::test]
    async fn test_default_call() {
        let engine = TestApplicationEngine::default();
        let call = engine.create_call(|_| {});
        let req = call.request();

        assert_eq!(call.id, 1);
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.path, "/");
        assert_eq!(req.version, Version::HTTP_11);
        assert!(req.headers.is_empty());
        assert!(req.cookies.is_empty());
        assert!(req.params.query.is_empty());
        assert!(req.params.form.is_none());
        assert!(req.body.is_empty());
        assert_eq!(call.peer_addr, engine.application().config.peer_addr);
    }

    #[tokio::test]
    async fn test_call_ids_increase() {
        let engine = TestApplicationEngine::default();
        let ids: Vec<u64> = (0..3).map(|_| engine.create_call(|_| {}).id).collect();

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_query_and_path_params() {
        let engine = TestApplicationEngine::default();
        let call = engine.create_call(|req| {
            req.uri("/search?q=rust&tags=a&tags=b").param("lang", "en");
        });
        let req = call.request();

        assert_eq!(req.pure_path(), "/search");
        assert_eq!(req.query("q"), Some("rust"));
        assert_eq!(req.params.query.get("tags").unwrap().len(), 2);
        assert_eq!(req.param("lang"), Some("en"));
        assert_eq!(req.query("missing"), None);
    }

    #[tokio::test]
    async fn test_form_body() {
        let engine = TestApplicationEngine::default();
        let call = engine.create_call(|req| {
            req.method(Method::POST)
                .uri("/login")
                .form(&[("user", "alice"), ("note", "a&b c")]);
        });
        let req = call.request();

        assert_eq!(req.content_type(), Some("application/x-www-form-urlencoded"));
        assert_eq!(req.form("user"), Some("alice"));
        assert_eq!(req.form("note"), Some("a&b c"));
        assert_eq!(
            req.header("content-length"),
            Some(req.body.len().to_string().as_str())
        );
    }

    #[tokio::test]
    async fn test_plain_body_is_not_parsed_as_form() {
        let engine = TestApplicationEngine::default();
        let call = engine.create_call(|req| {
            req.method(Method::POST)
                .header("content-type", "text/plain")
                .body("user=alice");
        });

        assert!(call.request().params.form.is_none());
        assert_eq!(call.request().body_text(), "user=alice");
    }

    #[tokio::test]
    async fn test_cookies_are_merged() {
        let engine = TestApplicationEngine::default();
        let call = engine.create_call(|req| {
            req.header("cookie", "session=xyz; theme=dark")
                .cookie("lang", "en");
        });
        let req = call.request();

        assert_eq!(req.cookie("session"), Some("xyz"));
        assert_eq!(req.cookie("theme"), Some("dark"));
        assert_eq!(req.cookie("lang"), Some("en"));
        assert_eq!(req.header("cookie"), Some("session=xyz; theme=dark; lang=en"));
    }

    #[tokio::test]
    async fn test_default_headers_can_be_overridden() {
        let config = ApplicationConfig::new()
            .with_default_header("x-tenant", "acme")
            .with_default_header("accept", "text/html");
        let engine = TestApplicationEngine::new(config);
        let call = engine.create_call(|req| {
            req.header("accept", "application/json");
        });
        let req = call.request();

        assert_eq!(req.header("x-tenant"), Some("acme"));
        assert_eq!(req.header("accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_invalid_header_is_skipped_or_rejected() {
        let engine = TestApplicationEngine::default();

        let call = engine.create_call(|req| {
            req.header("bad header", "x").header("x-ok", "1");
        });
        assert_eq!(call.request().header("x-ok"), Some("1"));
        assert_eq!(call.request().headers.len(), 1);

        let res = engine.try_create_call(|req| {
            req.header("bad header", "x");
        });
        assert!(res.is_err());
        assert!(format!("{:#}", res.unwrap_err()).contains("Invalid header name"));
    }

    #[tokio::test]
    async fn test_repeated_headers_are_kept() {
        let config = ApplicationConfig::new().with_default_header("accept", "text/html");
        let engine = TestApplicationEngine::new(config);
        let call = engine.create_call(|req| {
            req.header("accept", "application/json")
                .header("accept", "text/plain");
        });

        let values: Vec<&str> = call
            .request()
            .headers
            .get_all("accept")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        // 默认值被第一次出现的同名头替换，之后的追加
        assert_eq!(values, vec!["application/json", "text/plain"]);
        assert_eq!(call.request().header("accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_invalid_cookie_is_skipped_or_rejected() {
        let engine = TestApplicationEngine::default();

        let call = engine.create_call(|req| {
            req.method(Method::POST)
                .uri("/orders")
                .cookie("s", "a\nb")
                .cookie("ok", "1");
        });
        assert_eq!(call.request().method, Method::POST);
        assert_eq!(call.request().path, "/orders");
        assert_eq!(call.request().cookie("s"), None);
        assert_eq!(call.request().cookie("ok"), Some("1"));
        assert_eq!(call.request().header("cookie"), Some("ok=1"));

        let res = engine.try_create_call(|req| {
            req.cookie("s", "a\nb");
        });
        assert!(format!("{:#}", res.unwrap_err()).contains("Invalid cookie value for s"));
    }

    #[tokio::test]
    async fn test_invalid_target() {
        let engine = TestApplicationEngine::default();

        assert!(engine.try_create_call(|req| {
            req.uri("users");
        })
        .is_err());

        // 宽松模式退回到空白请求
        let call = engine.create_call(|req| {
            req.uri("users");
        });
        assert_eq!(call.request().path, "/");
    }

    #[tokio::test]
    async fn test_engine_lifecycle() {
        let engine = TestApplicationEngine::default();
        assert!(!engine.is_running());

        engine.start();
        engine.start();
        assert!(engine.is_running());

        engine.stop();
        assert!(!engine.is_running());
        // 停止引擎不取消应用作用域
        assert!(!engine.application().scope().is_cancelled());
    }

    #[tokio::test]
    async fn test_with_test_application() {
        let (running, name) = with_test_application(
            ApplicationConfig::new().with_server_name("demo"),
            |engine| (engine.is_running(), engine.application().name().to_string()),
        );

        assert!(running);
        assert_eq!(name, "demo");
    }

    #[tokio::test]
    async fn test_response_and_attributes() {
        let engine = TestApplicationEngine::default();
        let call = engine.create_call(|_| {});

        assert_eq!(call.response().status(), StatusCode::OK);
        assert!(!call.response().is_committed());

        call.response().respond_text(StatusCode::CREATED, "created");
        assert_eq!(call.response().status(), StatusCode::CREATED);
        assert_eq!(call.response().body_text(), "created");
        assert_eq!(call.response().header("content-length").as_deref(), Some("7"));
        assert_eq!(
            call.response().header("content-type").as_deref(),
            Some("text/plain; charset=utf-8")
        );
        assert!(call.response().is_committed());

        assert!(call.response().set_header("x-trace", "1").is_ok());
        assert!(call.response().set_header("bad header", "1").is_err());

        #[derive(Clone, Debug, PartialEq)]
        struct User {
            id: u64,
        }
        call.attributes.set_value(User { id: 9 });
        assert_eq!(call.attributes.get_value::<User>(), Some(User { id: 9 }));
    }
}
