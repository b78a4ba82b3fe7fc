//! Login, logout and session handling through the router

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use taxi_fleet::{models::Manufacturer, state::AppState};
use tower::ServiceExt;

fn session_cookie(response: &Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn csrf_field(html: &str) -> String {
    let marker = r#"name="_csrf_token" value=""#;
    let start = html.find(marker).expect("csrf field") + marker.len();
    let len = html[start..].find('"').unwrap();
    html[start..start + len].to_string()
}

/// Session cookie and form token from a fresh login page
async fn login_page(state: &AppState) -> (String, String) {
    let response = taxi_fleet::router(state.clone())
        .oneshot(
            Request::builder()
                .uri("/accounts/login/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let cookie = session_cookie(&response);
    let token = csrf_field(&body_text(response).await);
    (cookie, token)
}

fn login_request(
    (cookie, token): &(String, String),
    username: &str,
    password: &str,
    next: Option<&str>,
) -> Request<Body> {
    let mut pairs = vec![
        ("username", username),
        ("password", password),
        ("_csrf_token", token.as_str()),
    ];
    if let Some(next) = next {
        pairs.push(("next", next));
    }
    Request::builder()
        .method("POST")
        .uri("/accounts/login/")
        .header(header::COOKIE, cookie.as_str())
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(serde_urlencoded::to_string(&pairs).unwrap()))
        .unwrap()
}

fn get_with(uri: &str, cookie: impl AsRef<str>) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie.as_ref())
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_login_page_is_public() {
    let state = common::state().await;

    let response = taxi_fleet::router(state)
        .oneshot(
            Request::builder()
                .uri("/accounts/login/?next=/cars/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains(r#"name="next" value="/cars/""#));
}

#[tokio::test]
async fn test_login_then_browse() {
    let state = common::state().await;
    common::driver(&state, "driver", "ABC12345").await;

    let page = login_page(&state).await;

    let response = taxi_fleet::router(state.clone())
        .oneshot(login_request(&page, "driver", common::PASSWORD, Some("/cars/")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/cars/");
    let cookie = session_cookie(&response);

    let response = taxi_fleet::router(state)
        .oneshot(get_with("/cars/", cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_ignores_external_next() {
    let state = common::state().await;
    common::driver(&state, "driver", "ABC12345").await;

    let page = login_page(&state).await;

    let response = taxi_fleet::router(state)
        .oneshot(login_request(
            &page,
            "driver",
            common::PASSWORD,
            Some("https://evil.example/"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_wrong_password_rerenders_form() {
    let state = common::state().await;
    common::driver(&state, "driver", "ABC12345").await;

    let page = login_page(&state).await;

    let response = taxi_fleet::router(state.clone())
        .oneshot(login_request(&page, "driver", "not-the-password", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let text = body_text(response).await;
    assert!(text.contains("Please enter a correct username and password."));
    assert!(text.contains(r#"value="driver""#));
}

#[tokio::test]
async fn test_inactive_driver_cannot_log_in() {
    let state = common::state().await;
    let driver = common::driver(&state, "driver", "ABC12345").await;
    sqlx::query("UPDATE taxi_driver SET is_active = 0 WHERE id = ?")
        .bind(driver.id)
        .execute(state.pool())
        .await
        .unwrap();

    let page = login_page(&state).await;

    let response = taxi_fleet::router(state)
        .oneshot(login_request(&page, "driver", common::PASSWORD, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_ends_session() {
    let state = common::state().await;
    let driver = common::driver(&state, "driver", "ABC12345").await;
    let cookie = common::login_cookie(&state, driver.id);

    let response = taxi_fleet::router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/accounts/logout/")
                .header(header::COOKIE, cookie.clone())
                .header(common::CSRF_HEADER, common::csrf_token())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/accounts/login/");
    let after_logout = session_cookie(&response);
    assert_ne!(after_logout, cookie.to_str().unwrap());

    let response = taxi_fleet::router(state.clone())
        .oneshot(get_with("/accounts/login/", &after_logout))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("You have been logged out."));

    for stale in [after_logout.as_str(), cookie.to_str().unwrap()] {
        let response = taxi_fleet::router(state.clone())
            .oneshot(get_with("/manufacturers/", stale))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }
}

#[tokio::test]
async fn test_flash_message_shown_once() {
    let state = common::state().await;
    let driver = common::driver(&state, "driver", "ABC12345").await;
    let cookie = common::login_cookie(&state, driver.id);

    let response = taxi_fleet::router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/manufacturers/create/")
                .header(header::COOKIE, cookie.clone())
                .header(common::CSRF_HEADER, common::csrf_token())
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("name=Skoda&country=Czechia"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let list = || {
        Request::builder()
            .uri("/manufacturers/")
            .header(header::COOKIE, cookie.clone())
            .body(Body::empty())
            .unwrap()
    };

    let first = taxi_fleet::router(state.clone()).oneshot(list()).await.unwrap();
    assert!(body_text(first).await.contains("was added."));

    let second = taxi_fleet::router(state).oneshot(list()).await.unwrap();
    assert!(!body_text(second).await.contains("was added."));
}

#[tokio::test]
async fn test_login_moves_session_to_new_id() {
    let state = common::state().await;
    common::driver(&state, "driver", "ABC12345").await;
    let page = login_page(&state).await;

    let response = taxi_fleet::router(state.clone())
        .oneshot(login_request(&page, "driver", common::PASSWORD, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let logged_in = session_cookie(&response);
    assert_ne!(logged_in, page.0);
    assert_eq!(state.sessions().len(), 1);

    let response = taxi_fleet::router(state.clone())
        .oneshot(get_with("/cars/", &page.0))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let response = taxi_fleet::router(state)
        .oneshot(get_with("/cars/", &logged_in))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_ignores_backslash_next() {
    let state = common::state().await;
    common::driver(&state, "driver", "ABC12345").await;
    let page = login_page(&state).await;

    let response = taxi_fleet::router(state)
        .oneshot(login_request(
            &page,
            "driver",
            common::PASSWORD,
            Some("/\\evil.example"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_login_with_forged_csrf_token_is_forbidden() {
    let state = common::state().await;
    common::driver(&state, "driver", "ABC12345").await;
    let (cookie, _) = login_page(&state).await;

    let response = taxi_fleet::router(state.clone())
        .oneshot(login_request(
            &(cookie, "forged".to_string()),
            "driver",
            common::PASSWORD,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_post_without_csrf_token_is_forbidden() {
    let state = common::state().await;
    let driver = common::driver(&state, "driver", "ABC12345").await;
    let toyota = common::manufacturer(&state, "Toyota", "Japan").await;
    let cookie = common::login_cookie(&state, driver.id);

    let response = taxi_fleet::router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/manufacturers/{}/delete/", toyota.id))
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(Manufacturer::find_by_id(state.pool(), toyota.id).await.is_ok());
}

#[tokio::test]
async fn test_deleted_driver_session_cannot_delete() {
    let state = common::state().await;
    let driver = common::driver(&state, "driver", "ABC12345").await;
    let toyota = common::manufacturer(&state, "Toyota", "Japan").await;
    let cookie = common::login_cookie(&state, driver.id);
    taxi_fleet::models::Driver::delete(state.pool(), driver.id)
        .await
        .unwrap();

    let response = taxi_fleet::router(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/manufacturers/{}/delete/", toyota.id))
                .header(header::COOKIE, cookie)
                .header(common::CSRF_HEADER, common::csrf_token())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .starts_with("/accounts/login/"));
    assert!(Manufacturer::find_by_id(state.pool(), toyota.id).await.is_ok());
}

#[tokio::test]
async fn test_anonymous_requests_do_not_grow_session_store() {
    let state = common::state().await;

    for _ in 0..50 {
        let response = taxi_fleet::router(state.clone())
            .oneshot(Request::builder().uri("/cars/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
    assert!(state.sessions().is_empty());

    let driver = common::driver(&state, "driver", "ABC12345").await;
    let cookie = common::login_cookie(&state, driver.id);
    for _ in 0..50 {
        let response = taxi_fleet::router(state.clone())
            .oneshot(get_with("/cars/", cookie.to_str().unwrap()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(state.sessions().len(), 1);
}
