//! Full recipe and meal-plan lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port and exercises the catalogue over
//! real HTTP twice: once through `ApiClient` (reqwest, spawned tasks,
//! cancelable handles) and once host-driven, where ureq performs the I/O and
//! only `build_request`, `authorize` and `classify` come from the core.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use mock_server::{DEMO_EMAIL, DEMO_PASSWORD};
use recipe_core::format::{format_date_range, open_graph_summary};
use recipe_core::operations::{llm, login, meal_plans, recipes, users};
use recipe_core::types::{
    CommentCreate, CommentOut, LoginForm, MealPlanCreate, MealPlanOut, MealPlanRequest,
    MealPlanResponse, MealPlansOut, Message, RecipeCreate, RecipeOut, RecipeUpdate, RecipesOut,
    Token, UrlRequest, UserOut,
};
use recipe_core::{
    authorize, build_request, classify, ApiClient, ClientConfig, Decoded, HttpMethod, HttpRequest,
    HttpResponse, MultipartForm, RequestArgs,
};
use serde_json::Value;

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}")
}

#[tokio::test(flavor = "multi_thread")]
async fn recipe_lifecycle_through_api_client() {
    let base_url = start_server().await;

    // Step 1: token store starts empty; the provider is read on every call.
    let token_store: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let reader = token_store.clone();
    let config = ClientConfig::builder(&base_url)
        .token_fn(move || reader.lock().unwrap().clone())
        .validate_responses(true)
        .build()
        .unwrap();
    let client = ApiClient::new(config);

    // Step 2: anonymous call is rejected with the server's detail.
    let err = client
        .request::<UserOut>(&users::READ_USER_ME, RequestArgs::new())
        .unwrap()
        .await
        .unwrap_err();
    let api = err.as_api().unwrap();
    assert_eq!(api.status, 401);
    assert_eq!(api.message, "Unexpected status");
    assert_eq!(api.detail().as_deref(), Some("Not authenticated"));

    // Step 3: log in and store the token.
    let args = RequestArgs::new()
        .body(&LoginForm::new(DEMO_EMAIL, DEMO_PASSWORD))
        .unwrap();
    let token: Token = client.request(&login::ACCESS_TOKEN, args).unwrap().await.unwrap();
    assert_eq!(token.token_type, "bearer");
    *token_store.lock().unwrap() = Some(token.access_token);

    let me: UserOut = client
        .request(&users::READ_USER_ME, RequestArgs::new())
        .unwrap()
        .await
        .unwrap();
    assert_eq!(me.email, DEMO_EMAIL);

    // Step 4: multipart create without a title is a labelled 422.
    let form = MultipartForm::new().text("url", "https://example.com/soup");
    let err = client
        .request::<RecipeOut>(&recipes::CREATE_RECIPE, RequestArgs::new().form_data(form))
        .unwrap()
        .await
        .unwrap_err();
    let api = err.as_api().unwrap();
    assert_eq!(api.status, 422);
    assert_eq!(api.message, "Validation Error");
    assert!(api.url.ends_with("/api/v1/recipes/"));
    assert_eq!(api.detail().as_deref(), Some("title is required"));

    // Step 5: create with a file part.
    let form = MultipartForm::new()
        .text("title", "Leek Soup")
        .file("file", "soup.txt", "text/plain", Bytes::from_static(b"leeks, stock"));
    let recipe: RecipeOut = client
        .request(&recipes::CREATE_RECIPE, RequestArgs::new().form_data(form))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(recipe.title, "Leek Soup");
    assert_eq!(recipe.owner_id, me.id);
    assert!(recipe.file_path.is_some());

    // Step 6: update, comment (form-encoded), list, delete the comment.
    let update = RecipeUpdate {
        categories: Some(vec!["soup".to_string()]),
        ..RecipeUpdate::default()
    };
    let updated: RecipeOut = client
        .request(
            &recipes::UPDATE_RECIPE,
            RequestArgs::new().path("recipe_id", recipe.id).body(&update).unwrap(),
        )
        .unwrap()
        .await
        .unwrap();
    assert_eq!(updated.categories, vec!["soup"]);
    assert_eq!(updated.title, "Leek Soup");

    let comment_args = RequestArgs::new()
        .path("recipe_id", recipe.id)
        .body(&CommentCreate {
            content: "Needs pepper".to_string(),
        })
        .unwrap();
    let plain = ClientConfig::builder(&base_url).build().unwrap();
    let wire = build_request(&plain, &recipes::ADD_COMMENT, &comment_args).unwrap();
    assert_eq!(wire.header("content-type"), Some("application/x-www-form-urlencoded"));
    assert_eq!(wire.body_str(), Some("content=Needs%20pepper"));

    let comment: CommentOut = client
        .request(&recipes::ADD_COMMENT, comment_args)
        .unwrap()
        .await
        .unwrap();
    assert_eq!(comment.content, "Needs pepper");

    let page: RecipesOut = client
        .request(
            &recipes::READ_RECIPES,
            RequestArgs::new().query("skip", 0u32).query("limit", None::<u32>),
        )
        .unwrap()
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.data[0].comments.len(), 1);

    let msg: Message = client
        .request(&recipes::DELETE_COMMENT, RequestArgs::new().path("comment_id", comment.id))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(msg.message, "Comment deleted successfully");

    let reread: RecipeOut = client
        .request(&recipes::READ_RECIPE, RequestArgs::new().path("recipe_id", recipe.id))
        .unwrap()
        .await
        .unwrap();
    assert!(reread.comments.is_empty());

    // Step 7: open-graph lookup through the key normalizer.
    let raw: Value = client
        .request(
            &recipes::FETCH_OPENGRAPH,
            RequestArgs::new()
                .body(&UrlRequest {
                    url: "https://example.com/leek-soup".to_string(),
                })
                .unwrap(),
        )
        .unwrap()
        .await
        .unwrap();
    let og = open_graph_summary(&raw);
    assert_eq!(og.title, "leek soup");
    assert_eq!(og.description, "No description available");
    assert_eq!(og.og_image, "https://example.com/leek-soup/image.jpg");

    // Step 8: delete, then the recipe is gone.
    let msg: Message = client
        .request(&recipes::DELETE_RECIPE, RequestArgs::new().path("recipe_id", recipe.id))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(msg.message, "Recipe deleted successfully");

    let args = RequestArgs::new().path("recipe_id", recipe.id);
    let err = client
        .request::<RecipeOut>(&recipes::READ_RECIPE, args)
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.as_api().map(|e| e.status), Some(404));
}

#[tokio::test(flavor = "multi_thread")]
async fn meal_plan_lifecycle_through_api_client() {
    let base_url = start_server().await;
    let anonymous = ApiClient::new(ClientConfig::builder(&base_url).build().unwrap());
    let args = RequestArgs::new()
        .body(&LoginForm::new(DEMO_EMAIL, DEMO_PASSWORD))
        .unwrap();
    let token: Token = anonymous.request(&login::ACCESS_TOKEN, args).unwrap().await.unwrap();

    let config = ClientConfig::builder(&base_url)
        .token(token.access_token)
        .validate_responses(true)
        .build()
        .unwrap();
    let client = ApiClient::new(config);

    // Step 1: generate a week.
    let request = MealPlanRequest {
        vegetables: vec!["leek".to_string()],
        diets: vec!["vegetarian".to_string()],
        number_of_people: 2,
        start_day: "2024-01-01".to_string(),
    };
    let generated: MealPlanResponse = client
        .request(&llm::GENERATE_MEAL_PLAN, RequestArgs::new().body(&request).unwrap())
        .unwrap()
        .await
        .unwrap();
    assert_eq!(generated.response.len(), 7);
    assert!(generated.response["2024-01-01"].dinner.recipe.contains("leek"));

    // Step 2: save it.
    let start_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let create = MealPlanCreate {
        plan: generated.response,
        start_date,
    };
    let saved: MealPlanOut = client
        .request(&meal_plans::CREATE_MEAL_PLAN, RequestArgs::new().body(&create).unwrap())
        .unwrap()
        .await
        .unwrap();
    assert_eq!(saved.start_date, start_date);
    assert_eq!(format_date_range(saved.start_date), "Mon 01/01/2024 - Sun 07/01/2024");

    let plans: MealPlansOut = client
        .request(&meal_plans::READ_MEAL_PLANS, RequestArgs::new())
        .unwrap()
        .await
        .unwrap();
    assert_eq!(plans.count, 1);
    assert_eq!(plans.data[0].id, saved.id);

    // Step 3: delete twice; the second is a 404 with the server's detail.
    let msg: Message = client
        .request(&meal_plans::DELETE_MEAL_PLAN, RequestArgs::new().path("id", saved.id))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(msg.message, "Meal plan deleted successfully");

    let err = client
        .request::<Message>(&meal_plans::DELETE_MEAL_PLAN, RequestArgs::new().path("id", saved.id))
        .unwrap()
        .await
        .unwrap_err();
    let api = err.as_api().unwrap();
    assert_eq!(api.status, 404);
    assert_eq!(api.detail().as_deref(), Some("Meal plan not found"));
}

// ---------------------------------------------------------------------------
// Host-driven I/O
// ---------------------------------------------------------------------------

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// classify them.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let url = req.url.as_str();
    let headers = req.headers.as_slice();
    let mut response = match (req.method, req.body.as_deref()) {
        (HttpMethod::Get, _) => with_headers(agent.get(url), headers).call(),
        (HttpMethod::Delete, _) => with_headers(agent.delete(url), headers).call(),
        (HttpMethod::Post, Some(body)) => with_headers(agent.post(url), headers).send(body),
        (HttpMethod::Post, None) => with_headers(agent.post(url), headers).send_empty(),
        (HttpMethod::Put, Some(body)) => with_headers(agent.put(url), headers).send(body),
        (HttpMethod::Put, None) => with_headers(agent.put(url), headers).send_empty(),
        (HttpMethod::Patch, Some(body)) => with_headers(agent.patch(url), headers).send(body),
        (HttpMethod::Patch, None) => with_headers(agent.patch(url), headers).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();
    let body = response.body_mut().read_to_vec().unwrap_or_default();

    HttpResponse {
        status,
        headers,
        body: Bytes::from(body),
    }
}

#[test]
fn host_driven_login_and_recipe_round_trip() {
    // Step 1: start mock server on a random port.
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    let config = ClientConfig::builder(format!("http://{addr}/")).build().unwrap();

    // Step 2: log in with a form-encoded body.
    let args = RequestArgs::new()
        .body(&LoginForm::new(DEMO_EMAIL, DEMO_PASSWORD))
        .unwrap();
    let req = build_request(&config, &login::ACCESS_TOKEN, &args).unwrap();
    assert_eq!(req.header("content-type"), Some("application/x-www-form-urlencoded"));
    let url = req.url.clone();
    let decoded = classify(&login::ACCESS_TOKEN, &execute(req), &url, true).unwrap();
    let token: Token = serde_json::from_value(decoded.into_json().unwrap()).unwrap();

    // Step 3: unauthenticated and authenticated profile reads.
    let req = build_request(&config, &users::READ_USER_ME, &RequestArgs::new()).unwrap();
    let url = req.url.clone();
    let err = classify(&users::READ_USER_ME, &execute(req.clone()), &url, false).unwrap_err();
    assert_eq!(err.status, 401);

    let mut req = req;
    authorize(&mut req, Some(token.access_token.clone()));
    let decoded = classify(&users::READ_USER_ME, &execute(req), &url, true).unwrap();
    assert!(matches!(decoded, Decoded::Json(ref v) if v["email"] == DEMO_EMAIL));

    // Step 4: multipart upload with neither url nor file is a 400.
    let args = RequestArgs::new().form_data(MultipartForm::new().text("title", "Ghost"));
    let mut req = build_request(&config, &recipes::CREATE_RECIPE, &args).unwrap();
    authorize(&mut req, Some(token.access_token.clone()));
    let url = req.url.clone();
    let err = classify(&recipes::CREATE_RECIPE, &execute(req), &url, false).unwrap_err();
    assert_eq!(err.status, 400);
    assert_eq!(err.message, "Unexpected status");
    assert_eq!(err.detail().as_deref(), Some("Either 'url' or 'file' must be provided."));

    // Step 5: a real upload, then list.
    let fields = RecipeCreate {
        title: "Tart".to_string(),
        url: Some("https://example.com/tart".to_string()),
        ..RecipeCreate::default()
    };
    let form = MultipartForm::from_value(&serde_json::to_value(&fields).unwrap()).unwrap();
    let args = RequestArgs::new().form_data(form);
    let mut req = build_request(&config, &recipes::CREATE_RECIPE, &args).unwrap();
    authorize(&mut req, Some(token.access_token.clone()));
    let url = req.url.clone();
    classify(&recipes::CREATE_RECIPE, &execute(req), &url, true).unwrap();

    let args = RequestArgs::new().query("limit", 5u32);
    let mut req = build_request(&config, &recipes::READ_RECIPES, &args).unwrap();
    assert!(req.url.ends_with("/api/v1/recipes/?limit=5"));
    authorize(&mut req, Some(token.access_token));
    let url = req.url.clone();
    let decoded = classify(&recipes::READ_RECIPES, &execute(req), &url, true).unwrap();
    let page: RecipesOut = serde_json::from_value(decoded.into_json().unwrap()).unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.data[0].title, "Tart");
}
