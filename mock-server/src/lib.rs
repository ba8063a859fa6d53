//! In-memory stand-in for the recipe backend.
//!
//! Covers the endpoints the client tests exercise: password login, bearer
//! auth, recipes with multipart upload and comments, meal plans, open-graph
//! lookup and a canned meal-plan generator. Error bodies follow the
//! backend's `{"detail": ...}` convention.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{FromRequestParts, Multipart, Path, Query, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Form, Json, Router,
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "cook@example.com";
pub const DEMO_PASSWORD: &str = "correct horse";
const DEMO_USER_ID: i64 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub full_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub file_path: Option<String>,
    pub description: Option<String>,
    pub store_in_vector_db: bool,
    pub categories: Vec<String>,
    pub comments: Vec<Comment>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MealPlan {
    pub id: i64,
    pub owner_id: i64,
    pub plan: Value,
    pub start_date: NaiveDate,
}

#[derive(Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub count: usize,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RecipeUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct CommentCreate {
    pub content: String,
}

#[derive(Deserialize)]
pub struct MealPlanCreate {
    pub plan: Value,
    pub start_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct MealPlanRequest {
    pub vegetables: Vec<String>,
    pub diets: Vec<String>,
    pub number_of_people: u32,
    pub start_day: String,
}

#[derive(Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Default)]
pub struct Store {
    users: HashMap<String, (String, User)>,
    tokens: HashMap<String, i64>,
    recipes: BTreeMap<i64, Recipe>,
    meal_plans: BTreeMap<i64, MealPlan>,
    next_id: i64,
}

impl Store {
    fn seeded() -> Self {
        let mut store = Store {
            next_id: 1,
            ..Store::default()
        };
        store.users.insert(
            DEMO_EMAIL.to_string(),
            (
                DEMO_PASSWORD.to_string(),
                User {
                    id: DEMO_USER_ID,
                    email: DEMO_EMAIL.to_string(),
                    is_active: true,
                    is_superuser: false,
                    full_name: Some("Demo Cook".to_string()),
                },
            ),
        );
        store
    }

    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn user(&self, id: i64) -> Option<&User> {
        self.users.values().map(|(_, u)| u).find(|u| u.id == id)
    }
}

pub type Db = Arc<RwLock<Store>>;

/// `{"detail": ...}` error response.
#[derive(Debug)]
pub struct Failure(StatusCode, String);

impl Failure {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self(status, detail.into())
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "detail": self.1 }))).into_response()
    }
}

/// The user behind the request's bearer token.
pub struct CurrentUser(pub User);

impl FromRequestParts<Db> for CurrentUser {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let unauthorized = || Failure::new(StatusCode::UNAUTHORIZED, "Not authenticated");
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;

        let store = db.read().await;
        let user_id = store.tokens.get(token).ok_or_else(|| {
            Failure::new(StatusCode::FORBIDDEN, "Could not validate credentials")
        })?;
        store
            .user(*user_id)
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| Failure::not_found("User"))
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::seeded()));
    Router::new()
        .route("/api/v1/login/access-token", post(login))
        .route("/api/v1/login/test-token", post(test_token))
        .route("/api/v1/users/me", get(read_user_me))
        .route("/api/v1/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/api/v1/recipes/{recipe_id}",
            get(read_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/api/v1/recipes/{recipe_id}/comments", post(add_comment))
        .route("/api/v1/recipes/comments/{comment_id}", delete(delete_comment))
        .route("/api/v1/recipes/fetch-opengraph", post(fetch_opengraph))
        .route("/api/v1/meal-plans/", get(list_meal_plans).post(create_meal_plan))
        .route("/api/v1/meal-plans/{id}", delete(delete_meal_plan))
        .route("/api/v1/llm/meal-plan", post(generate_meal_plan))
        .with_state(db)
        .layer(middleware::from_fn(log_request))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    tracing::info!(%method, %path, status = response.status().as_u16(), "request");
    response
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn login(
    State(db): State<Db>,
    Form(form): Form<LoginForm>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let user_id = match store.users.get(&form.username) {
        Some((password, user)) if *password == form.password => user.id,
        _ => {
            tracing::info!(username = %form.username, "login rejected");
            return Err(Failure::new(StatusCode::BAD_REQUEST, "Incorrect email or password"));
        }
    };
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone(), user_id);
    tracing::info!(user_id, "login accepted");
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

async fn test_token(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn read_user_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn list_recipes(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<Pagination>,
) -> Json<Page<Recipe>> {
    let store = db.read().await;
    let owned: Vec<&Recipe> = store.recipes.values().filter(|r| r.owner_id == user.id).collect();
    let data = owned
        .iter()
        .skip(page.skip)
        .take(page.limit)
        .map(|r| (*r).clone())
        .collect();
    Json(Page {
        data,
        count: owned.len(),
    })
}

async fn create_recipe(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<Recipe>, Failure> {
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        Failure::new(StatusCode::BAD_REQUEST, e.body_text())
    };
    let mut title = None;
    let mut url = None;
    let mut description = None;
    let mut file_name = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        match field.name().unwrap_or_default() {
            "title" => title = Some(field.text().await.map_err(bad_form)?),
            "url" => url = Some(field.text().await.map_err(bad_form)?),
            "description" => description = Some(field.text().await.map_err(bad_form)?),
            "file" => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(bad_form)?;
                tracing::debug!(file = %name, size = data.len(), "received recipe file");
                file_name = Some(name);
            }
            _ => {}
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "title is required"))?;
    let url = url.filter(|u| !u.is_empty());
    if url.is_none() && file_name.is_none() {
        return Err(Failure::new(
            StatusCode::BAD_REQUEST,
            "Either 'url' or 'file' must be provided.",
        ));
    }

    let mut store = db.write().await;
    let id = store.next_id();
    let recipe = Recipe {
        id,
        owner_id: user.id,
        title,
        url,
        file_path: file_name.map(|name| format!("uploads/{}/{name}", user.id)),
        description,
        store_in_vector_db: false,
        categories: Vec::new(),
        comments: Vec::new(),
    };
    store.recipes.insert(id, recipe.clone());
    tracing::info!(recipe_id = id, "recipe created");
    Ok(Json(recipe))
}

async fn read_recipe(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(recipe_id): Path<i64>,
) -> Result<Json<Recipe>, Failure> {
    let store = db.read().await;
    store
        .recipes
        .get(&recipe_id)
        .filter(|r| r.owner_id == user.id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found("Recipe"))
}

async fn update_recipe(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(recipe_id): Path<i64>,
    Json(input): Json<RecipeUpdate>,
) -> Result<Json<Recipe>, Failure> {
    let mut store = db.write().await;
    let recipe = store
        .recipes
        .get_mut(&recipe_id)
        .filter(|r| r.owner_id == user.id)
        .ok_or_else(|| Failure::not_found("Recipe"))?;
    if let Some(title) = input.title {
        recipe.title = title;
    }
    if let Some(url) = input.url {
        recipe.url = Some(url);
    }
    if let Some(description) = input.description {
        recipe.description = Some(description);
    }
    if let Some(categories) = input.categories {
        recipe.categories = categories;
    }
    Ok(Json(recipe.clone()))
}

async fn delete_recipe(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(recipe_id): Path<i64>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    match store.recipes.get(&recipe_id) {
        Some(r) if r.owner_id == user.id => {
            store.recipes.remove(&recipe_id);
            tracing::info!(recipe_id, "recipe deleted");
            Ok(Json(json!({ "message": "Recipe deleted successfully" })))
        }
        _ => Err(Failure::not_found("Recipe")),
    }
}

async fn add_comment(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(recipe_id): Path<i64>,
    Form(input): Form<CommentCreate>,
) -> Result<Json<Comment>, Failure> {
    let mut store = db.write().await;
    let id = store.next_id();
    let recipe = store
        .recipes
        .get_mut(&recipe_id)
        .filter(|r| r.owner_id == user.id)
        .ok_or_else(|| Failure::not_found("Recipe"))?;
    let comment = Comment {
        id,
        content: input.content,
        created_at: Utc::now(),
    };
    recipe.comments.push(comment.clone());
    tracing::info!(recipe_id, comment_id = id, "comment added");
    Ok(Json(comment))
}

async fn delete_comment(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<i64>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let comments = store
        .recipes
        .values_mut()
        .filter(|r| r.owner_id == user.id)
        .map(|r| &mut r.comments)
        .find(|comments| comments.iter().any(|c| c.id == comment_id))
        .ok_or_else(|| Failure::not_found("Comment"))?;
    comments.retain(|c| c.id != comment_id);
    tracing::info!(comment_id, "comment deleted");
    Ok(Json(json!({ "message": "Comment deleted successfully" })))
}

async fn fetch_opengraph(
    _user: CurrentUser,
    Json(input): Json<UrlRequest>,
) -> Result<Json<Value>, Failure> {
    let slug = input
        .url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && !s.contains(':'))
        .ok_or_else(|| Failure::new(StatusCode::BAD_REQUEST, "Could not fetch page"))?;
    Ok(Json(json!({
        "og:title": slug.replace('-', " "),
        "og:image": format!("{}/image.jpg", input.url.trim_end_matches('/')),
        "og:url": input.url,
    })))
}

async fn list_meal_plans(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Query(page): Query<Pagination>,
) -> Json<Page<MealPlan>> {
    let store = db.read().await;
    let owned: Vec<&MealPlan> =
        store.meal_plans.values().filter(|p| p.owner_id == user.id).collect();
    let data = owned
        .iter()
        .skip(page.skip)
        .take(page.limit)
        .map(|p| (*p).clone())
        .collect();
    Json(Page {
        data,
        count: owned.len(),
    })
}

async fn create_meal_plan(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<MealPlanCreate>,
) -> Json<MealPlan> {
    let mut store = db.write().await;
    let id = store.next_id();
    let plan = MealPlan {
        id,
        owner_id: user.id,
        plan: input.plan,
        start_date: input.start_date,
    };
    store.meal_plans.insert(id, plan.clone());
    tracing::info!(meal_plan_id = id, "meal plan saved");
    Json(plan)
}

async fn delete_meal_plan(
    State(db): State<Db>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    match store.meal_plans.get(&id) {
        Some(p) if p.owner_id == user.id => {
            store.meal_plans.remove(&id);
            Ok(Json(json!({ "message": "Meal plan deleted successfully" })))
        }
        _ => Err(Failure::not_found("Meal plan")),
    }
}

/// Seven days of placeholder meals keyed by ISO date.
async fn generate_meal_plan(
    _user: CurrentUser,
    Json(input): Json<MealPlanRequest>,
) -> Result<Json<Value>, Failure> {
    let start = NaiveDate::parse_from_str(input.start_day.get(..10).unwrap_or_default(), "%Y-%m-%d")
        .map_err(|_| Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "start_day must be a date"))?;
    let main = input.vegetables.first().map(String::as_str).unwrap_or("seasonal");
    let style = input.diets.first().map(String::as_str).unwrap_or("home-style");

    let mut week = serde_json::Map::new();
    for offset in 0..7 {
        let Some(day) = start.checked_add_days(Days::new(offset)) else {
            break;
        };
        let meal = |course: &str| {
            json!({
                "recipe": format!("{style} {main} {course} for {}", input.number_of_people),
                "url": null,
                "ingredients": [main],
                "recipe_steps": ["prepare", "cook", "serve"],
            })
        };
        week.insert(
            day.format("%Y-%m-%d").to_string(),
            json!({
                "breakfast": meal("breakfast"),
                "lunch": meal("lunch"),
                "dinner": meal("dinner"),
            }),
        );
    }
    tracing::info!(days = week.len(), "meal plan generated");
    Ok(Json(json!({ "response": week })))
}
