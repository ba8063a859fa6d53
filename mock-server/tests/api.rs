use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, MealPlan, Page, Recipe, DEMO_EMAIL, DEMO_PASSWORD};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, token: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
}

fn json_request(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    request(method, uri, token)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn form_request(method: &str, uri: &str, token: &str, body: &str) -> Request<String> {
    request(method, uri, token)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

fn multipart_request(token: &str, fields: &[(&str, Option<&str>, &str)]) -> Request<String> {
    let mut body = String::new();
    for (name, filename, value) in fields {
        body.push_str("--XBOUNDARY\r\n");
        match filename {
            Some(f) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                 Content-Type: text/plain\r\n\r\n"
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
            )),
        }
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str("--XBOUNDARY--\r\n");
    request("POST", "/api/v1/recipes/", token)
        .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
        .body(body)
        .unwrap()
}

async fn login(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/login/access-token")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(format!(
                    "username={DEMO_EMAIL}&password={}",
                    DEMO_PASSWORD.replace(' ', "%20")
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let token: Value = body_json(resp).await;
    assert_eq!(token["token_type"], "bearer");
    token["access_token"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn login_with_wrong_password_returns_400() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/login/access-token")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(format!("username={DEMO_EMAIL}&password=nope"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Incorrect email or password");
}

#[tokio::test]
async fn missing_token_returns_401() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/v1/users/me").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_returns_403() {
    let resp = app()
        .oneshot(request("GET", "/api/v1/users/me", "bogus").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn users_me_returns_logged_in_user() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(request("GET", "/api/v1/users/me", &token).body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let me: Value = body_json(resp).await;
    assert_eq!(me["email"], DEMO_EMAIL);
}

// --- recipes ---

#[tokio::test]
async fn create_recipe_with_url() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .clone()
        .oneshot(multipart_request(
            &token,
            &[("title", None, "Soup"), ("url", None, "https://example.com/soup")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let recipe: Recipe = body_json(resp).await;
    assert_eq!(recipe.title, "Soup");
    assert_eq!(recipe.url.as_deref(), Some("https://example.com/soup"));

    let resp = app
        .oneshot(request("GET", "/api/v1/recipes/?limit=10", &token).body(String::new()).unwrap())
        .await
        .unwrap();
    let page: Page<Recipe> = body_json(resp).await;
    assert_eq!(page.count, 1);
    assert_eq!(page.data[0].id, recipe.id);
}

#[tokio::test]
async fn create_recipe_with_file_records_path() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(multipart_request(
            &token,
            &[("title", None, "Bread"), ("file", Some("bread.txt"), "flour, water")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let recipe: Recipe = body_json(resp).await;
    assert_eq!(recipe.file_path.as_deref(), Some("uploads/1/bread.txt"));
}

#[tokio::test]
async fn create_recipe_without_title_returns_422() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(multipart_request(&token, &[("url", None, "https://example.com")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "title is required");
}

#[tokio::test]
async fn create_recipe_without_source_returns_400() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(multipart_request(&token, &[("title", None, "Ghost")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Either 'url' or 'file' must be provided.");
}

#[tokio::test]
async fn update_comment_and_delete_recipe() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .clone()
        .oneshot(multipart_request(
            &token,
            &[("title", None, "Stew"), ("url", None, "https://example.com/stew")],
        ))
        .await
        .unwrap();
    let recipe: Recipe = body_json(resp).await;
    let uri = format!("/api/v1/recipes/{}", recipe.id);

    let resp = app
        .clone()
        .oneshot(json_request("PUT", &uri, &token, r#"{"categories":["dinner"]}"#))
        .await
        .unwrap();
    let updated: Recipe = body_json(resp).await;
    assert_eq!(updated.categories, vec!["dinner"]);
    assert_eq!(updated.title, "Stew");

    let resp = app
        .clone()
        .oneshot(form_request("POST", &format!("{uri}/comments"), &token, "content=tasty"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(request("DELETE", &uri, &token).body(String::new()).unwrap())
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Recipe deleted successfully");

    let resp = app
        .oneshot(request("GET", &uri, &token).body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Recipe not found");
}

#[tokio::test]
async fn add_and_delete_comment() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .clone()
        .oneshot(multipart_request(
            &token,
            &[("title", None, "Pie"), ("url", None, "https://example.com/pie")],
        ))
        .await
        .unwrap();
    let recipe: Recipe = body_json(resp).await;
    let uri = format!("/api/v1/recipes/{}", recipe.id);

    let resp = app
        .clone()
        .oneshot(json_request("POST", &format!("{uri}/comments"), &token, r#"{"content":"x"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let resp = app
        .clone()
        .oneshot(form_request(
            "POST",
            &format!("{uri}/comments"),
            &token,
            "content=needs%20more%20salt",
        ))
        .await
        .unwrap();
    let comment: Value = body_json(resp).await;
    assert_eq!(comment["content"], "needs more salt");
    let comment_uri = format!("/api/v1/recipes/comments/{}", comment["id"]);

    let resp = app
        .clone()
        .oneshot(request("DELETE", &comment_uri, &token).body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Comment deleted successfully");

    let resp = app
        .clone()
        .oneshot(request("GET", &uri, &token).body(String::new()).unwrap())
        .await
        .unwrap();
    let recipe: Recipe = body_json(resp).await;
    assert!(recipe.comments.is_empty());

    let resp = app
        .oneshot(request("DELETE", &comment_uri, &token).body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Comment not found");
}

#[tokio::test]
async fn fetch_opengraph_returns_prefixed_keys() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/v1/recipes/fetch-opengraph",
            &token,
            r#"{"url":"https://example.com/lemon-tart"}"#,
        ))
        .await
        .unwrap();
    let og: Value = body_json(resp).await;
    assert_eq!(og["og:title"], "lemon tart");
    assert_eq!(og["og:image"], "https://example.com/lemon-tart/image.jpg");
}

// --- meal plans ---

#[tokio::test]
async fn generate_save_and_delete_meal_plan() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/llm/meal-plan",
            &token,
            r#"{"vegetables":["leek"],"diets":["vegan"],"number_of_people":2,
                "start_day":"2024-01-01"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let generated: Value = body_json(resp).await;
    let week = generated["response"].as_object().unwrap();
    assert_eq!(week.len(), 7);
    assert!(week.contains_key("2024-01-07"));

    let save = serde_json::json!({ "plan": generated["response"], "start_date": "2024-01-01" });
    let resp = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/meal-plans/", &token, &save.to_string()))
        .await
        .unwrap();
    let plan: MealPlan = body_json(resp).await;

    let resp = app
        .clone()
        .oneshot(request("GET", "/api/v1/meal-plans/", &token).body(String::new()).unwrap())
        .await
        .unwrap();
    let page: Page<MealPlan> = body_json(resp).await;
    assert_eq!(page.count, 1);

    let uri = format!("/api/v1/meal-plans/{}", plan.id);
    let resp = app
        .clone()
        .oneshot(request("DELETE", &uri, &token).body(String::new()).unwrap())
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["message"], "Meal plan deleted successfully");

    let resp = app
        .oneshot(request("DELETE", &uri, &token).body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
