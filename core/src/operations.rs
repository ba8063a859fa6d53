//! Operation catalogue for the recipe backend (`/api/v1`).
//!
//! Every endpoint is a `static Operation`; callers pass one to
//! `ApiClient::request` together with its `RequestArgs`. Response schemas
//! are only consulted when response validation is enabled.

use crate::http::HttpMethod::{Delete, Get, Patch, Post, Put};
use crate::operation::{MediaType, Operation};
use crate::schema::{Property, Schema};

const VALIDATION_ERROR: &[(u16, &str)] = &[(422, "Validation Error")];

pub mod schemas {
    use super::*;

    const OPT_STRING: Schema = Schema::Nullable(&Schema::String);
    const STRINGS: Schema = Schema::Array(&Schema::String);
    const OPT_STRINGS: Schema = Schema::Nullable(&STRINGS);

    static MESSAGE_PROPS: [Property; 1] = [Property::required("message", Schema::String)];
    pub static MESSAGE: Schema = Schema::Object(&MESSAGE_PROPS);

    static TOKEN_PROPS: [Property; 2] = [
        Property::required("access_token", Schema::String),
        Property::optional("token_type", Schema::String),
    ];
    pub static TOKEN: Schema = Schema::Object(&TOKEN_PROPS);

    static USER_OUT_PROPS: [Property; 5] = [
        Property::required("id", Schema::Integer),
        Property::required("email", Schema::String),
        Property::optional("is_active", Schema::Boolean),
        Property::optional("is_superuser", Schema::Boolean),
        Property::optional("full_name", OPT_STRING),
    ];
    pub static USER_OUT: Schema = Schema::Object(&USER_OUT_PROPS);

    static USERS_OUT_PROPS: [Property; 2] = [
        Property::required("data", Schema::Array(&USER_OUT)),
        Property::required("count", Schema::Integer),
    ];
    pub static USERS_OUT: Schema = Schema::Object(&USERS_OUT_PROPS);

    static ITEM_OUT_PROPS: [Property; 4] = [
        Property::required("id", Schema::Integer),
        Property::required("owner_id", Schema::Integer),
        Property::required("title", Schema::String),
        Property::optional("description", OPT_STRING),
    ];
    pub static ITEM_OUT: Schema = Schema::Object(&ITEM_OUT_PROPS);

    static ITEMS_OUT_PROPS: [Property; 2] = [
        Property::required("data", Schema::Array(&ITEM_OUT)),
        Property::required("count", Schema::Integer),
    ];
    pub static ITEMS_OUT: Schema = Schema::Object(&ITEMS_OUT_PROPS);

    static COMMENT_OUT_PROPS: [Property; 3] = [
        Property::required("id", Schema::Integer),
        Property::required("content", Schema::String),
        Property::required("created_at", Schema::String),
    ];
    pub static COMMENT_OUT: Schema = Schema::Object(&COMMENT_OUT_PROPS);

    static RECIPE_OUT_PROPS: [Property; 9] = [
        Property::required("id", Schema::Integer),
        Property::required("owner_id", Schema::Integer),
        Property::required("title", Schema::String),
        Property::optional("url", OPT_STRING),
        Property::optional("file_path", OPT_STRING),
        Property::optional("description", OPT_STRING),
        Property::optional("store_in_vector_db", Schema::Boolean),
        Property::optional("categories", STRINGS),
        Property::optional("comments", Schema::Array(&COMMENT_OUT)),
    ];
    pub static RECIPE_OUT: Schema = Schema::Object(&RECIPE_OUT_PROPS);

    static RECIPES_OUT_PROPS: [Property; 2] = [
        Property::required("data", Schema::Array(&RECIPE_OUT)),
        Property::required("count", Schema::Integer),
    ];
    pub static RECIPES_OUT: Schema = Schema::Object(&RECIPES_OUT_PROPS);

    static MEAL_PROPS: [Property; 4] = [
        Property::required("recipe", Schema::String),
        Property::optional("url", OPT_STRING),
        Property::optional("ingredients", OPT_STRINGS),
        Property::optional("recipe_steps", OPT_STRINGS),
    ];
    pub static MEAL: Schema = Schema::Object(&MEAL_PROPS);

    static DAY_PLAN_PROPS: [Property; 3] = [
        Property::required("breakfast", Schema::Object(&MEAL_PROPS)),
        Property::required("lunch", Schema::Object(&MEAL_PROPS)),
        Property::required("dinner", Schema::Object(&MEAL_PROPS)),
    ];
    pub static DAY_PLAN: Schema = Schema::Object(&DAY_PLAN_PROPS);
    pub static WEEK_PLAN: Schema = Schema::Map(&DAY_PLAN);

    static MEAL_PLAN_RESPONSE_PROPS: [Property; 1] =
        [Property::required("response", Schema::Map(&DAY_PLAN))];
    pub static MEAL_PLAN_RESPONSE: Schema = Schema::Object(&MEAL_PLAN_RESPONSE_PROPS);

    static MEAL_PLAN_OUT_PROPS: [Property; 4] = [
        Property::required("id", Schema::Integer),
        Property::required("owner_id", Schema::Integer),
        Property::required("plan", Schema::Map(&DAY_PLAN)),
        Property::required("start_date", Schema::String),
    ];
    pub static MEAL_PLAN_OUT: Schema = Schema::Object(&MEAL_PLAN_OUT_PROPS);

    static MEAL_PLANS_OUT_PROPS: [Property; 2] = [
        Property::required("data", Schema::Array(&MEAL_PLAN_OUT)),
        Property::required("count", Schema::Integer),
    ];
    pub static MEAL_PLANS_OUT: Schema = Schema::Object(&MEAL_PLANS_OUT_PROPS);

    static TEXT_RESPONSE_PROPS: [Property; 1] = [Property::required("response", Schema::String)];
    pub static TEXT_RESPONSE: Schema = Schema::Object(&TEXT_RESPONSE_PROPS);
}

pub mod login {
    use super::*;

    /// OAuth2 password flow; body is `LoginForm`.
    pub static ACCESS_TOKEN: Operation =
        Operation::new("login_access_token", Post, "/api/v1/login/access-token")
            .media_type(MediaType::FormUrlEncoded)
            .errors(VALIDATION_ERROR)
            .response(&schemas::TOKEN);

    pub static TEST_TOKEN: Operation =
        Operation::new("test_token", Post, "/api/v1/login/test-token").response(&schemas::USER_OUT);

    pub static RECOVER_PASSWORD: Operation =
        Operation::new("recover_password", Post, "/api/v1/password-recovery/{email}")
            .errors(VALIDATION_ERROR)
            .response(&schemas::MESSAGE);

    pub static RESET_PASSWORD: Operation =
        Operation::new("reset_password", Post, "/api/v1/reset-password/")
            .media_type(MediaType::Json)
            .errors(VALIDATION_ERROR)
            .response(&schemas::MESSAGE);
}

pub mod users {
    use super::*;

    pub static READ_USER_ME: Operation =
        Operation::new("read_user_me", Get, "/api/v1/users/me").response(&schemas::USER_OUT);

    pub static UPDATE_USER_ME: Operation =
        Operation::new("update_user_me", Patch, "/api/v1/users/me")
            .media_type(MediaType::Json)
            .errors(VALIDATION_ERROR)
            .response(&schemas::USER_OUT);

    pub static UPDATE_PASSWORD_ME: Operation =
        Operation::new("update_password_me", Patch, "/api/v1/users/me/password")
            .media_type(MediaType::Json)
            .errors(VALIDATION_ERROR)
            .response(&schemas::MESSAGE);

    /// Admin only. Query: `skip`, `limit`.
    pub static READ_USERS: Operation = Operation::new("read_users", Get, "/api/v1/users/")
        .errors(VALIDATION_ERROR)
        .response(&schemas::USERS_OUT);

    pub static CREATE_USER: Operation = Operation::new("create_user", Post, "/api/v1/users/")
        .media_type(MediaType::Json)
        .errors(VALIDATION_ERROR)
        .response(&schemas::USER_OUT);

    pub static DELETE_USER: Operation =
        Operation::new("delete_user", Delete, "/api/v1/users/{user_id}")
            .errors(VALIDATION_ERROR)
            .response(&schemas::MESSAGE);
}

pub mod items {
    use super::*;

    pub static READ_ITEMS: Operation = Operation::new("read_items", Get, "/api/v1/items/")
        .errors(VALIDATION_ERROR)
        .response(&schemas::ITEMS_OUT);

    pub static CREATE_ITEM: Operation = Operation::new("create_item", Post, "/api/v1/items/")
        .media_type(MediaType::Json)
        .errors(VALIDATION_ERROR)
        .response(&schemas::ITEM_OUT);

    pub static UPDATE_ITEM: Operation = Operation::new("update_item", Put, "/api/v1/items/{id}")
        .media_type(MediaType::Json)
        .errors(VALIDATION_ERROR)
        .response(&schemas::ITEM_OUT);

    pub static DELETE_ITEM: Operation = Operation::new("delete_item", Delete, "/api/v1/items/{id}")
        .errors(VALIDATION_ERROR)
        .response(&schemas::MESSAGE);
}

pub mod recipes {
    use super::*;

    /// Multipart: `title`, optional `url`, optional `file`.
    pub static CREATE_RECIPE: Operation = Operation::new("create_recipe", Post, "/api/v1/recipes/")
        .media_type(MediaType::Multipart)
        .errors(VALIDATION_ERROR)
        .response(&schemas::RECIPE_OUT);

    /// Query: `skip`, `limit`.
    pub static READ_RECIPES: Operation = Operation::new("read_recipes", Get, "/api/v1/recipes/")
        .errors(VALIDATION_ERROR)
        .response(&schemas::RECIPES_OUT);

    pub static READ_RECIPE: Operation =
        Operation::new("read_recipe", Get, "/api/v1/recipes/{recipe_id}")
            .errors(VALIDATION_ERROR)
            .response(&schemas::RECIPE_OUT);

    pub static UPDATE_RECIPE: Operation =
        Operation::new("update_recipe", Put, "/api/v1/recipes/{recipe_id}")
            .media_type(MediaType::Json)
            .errors(VALIDATION_ERROR)
            .response(&schemas::RECIPE_OUT);

    pub static DELETE_RECIPE: Operation =
        Operation::new("delete_recipe", Delete, "/api/v1/recipes/{recipe_id}")
            .errors(VALIDATION_ERROR)
            .response(&schemas::MESSAGE);

    /// Form body: `content`.
    pub static ADD_COMMENT: Operation =
        Operation::new("add_comment", Post, "/api/v1/recipes/{recipe_id}/comments")
            .media_type(MediaType::FormUrlEncoded)
            .errors(VALIDATION_ERROR)
            .response(&schemas::COMMENT_OUT);

    pub static DELETE_COMMENT: Operation =
        Operation::new("delete_comment", Delete, "/api/v1/recipes/comments/{comment_id}")
            .errors(VALIDATION_ERROR)
            .response(&schemas::MESSAGE);

    pub static GENERATE_SIGNED_URL: Operation =
        Operation::new("generate_signed_url", Post, "/api/v1/recipes/generate-signed-url")
            .media_type(MediaType::Json)
            .errors(VALIDATION_ERROR);

    /// Returns raw open-graph tags (`og:title`, ...); see `format::open_graph_summary`.
    pub static FETCH_OPENGRAPH: Operation =
        Operation::new("fetch_opengraph", Post, "/api/v1/recipes/fetch-opengraph")
            .media_type(MediaType::Json)
            .errors(VALIDATION_ERROR);
}

pub mod meal_plans {
    use super::*;

    pub static CREATE_MEAL_PLAN: Operation =
        Operation::new("create_meal_plan", Post, "/api/v1/meal-plans/")
            .media_type(MediaType::Json)
            .errors(VALIDATION_ERROR)
            .response(&schemas::MEAL_PLAN_OUT);

    /// Query: `skip`, `limit`.
    pub static READ_MEAL_PLANS: Operation =
        Operation::new("read_meal_plans", Get, "/api/v1/meal-plans/")
            .errors(VALIDATION_ERROR)
            .response(&schemas::MEAL_PLANS_OUT);

    pub static DELETE_MEAL_PLAN: Operation =
        Operation::new("delete_meal_plan", Delete, "/api/v1/meal-plans/{id}")
            .errors(VALIDATION_ERROR)
            .response(&schemas::MESSAGE);
}

pub mod llm {
    use super::*;

    pub static CHAT_WITH_AI: Operation = Operation::new("chat_with_ai", Post, "/api/v1/llm/chat")
        .media_type(MediaType::Json)
        .errors(VALIDATION_ERROR)
        .response(&schemas::TEXT_RESPONSE);

    pub static GENERATE_MEAL_PLAN: Operation =
        Operation::new("generate_meal_plan", Post, "/api/v1/llm/meal-plan")
            .media_type(MediaType::Json)
            .errors(VALIDATION_ERROR)
            .response(&schemas::MEAL_PLAN_RESPONSE);

    pub static LLM_QUERY: Operation = Operation::new("llm_query", Post, "/api/v1/llm/llm-query")
        .media_type(MediaType::Json)
        .errors(VALIDATION_ERROR)
        .response(&schemas::TEXT_RESPONSE);
}

/// Every operation in the catalogue.
pub static ALL: &[&Operation] = &[
    &login::ACCESS_TOKEN,
    &login::TEST_TOKEN,
    &login::RECOVER_PASSWORD,
    &login::RESET_PASSWORD,
    &users::READ_USER_ME,
    &users::UPDATE_USER_ME,
    &users::UPDATE_PASSWORD_ME,
    &users::READ_USERS,
    &users::CREATE_USER,
    &users::DELETE_USER,
    &items::READ_ITEMS,
    &items::CREATE_ITEM,
    &items::UPDATE_ITEM,
    &items::DELETE_ITEM,
    &recipes::CREATE_RECIPE,
    &recipes::READ_RECIPES,
    &recipes::READ_RECIPE,
    &recipes::UPDATE_RECIPE,
    &recipes::DELETE_RECIPE,
    &recipes::ADD_COMMENT,
    &recipes::DELETE_COMMENT,
    &recipes::GENERATE_SIGNED_URL,
    &recipes::FETCH_OPENGRAPH,
    &meal_plans::CREATE_MEAL_PLAN,
    &meal_plans::READ_MEAL_PLANS,
    &meal_plans::DELETE_MEAL_PLAN,
    &llm::CHAT_WITH_AI,
    &llm::GENERATE_MEAL_PLAN,
    &llm::LLM_QUERY,
];

/// Look an operation up by its id, e.g. `"read_recipe"`.
pub fn by_id(id: &str) -> Option<&'static Operation> {
    ALL.iter().copied().find(|op| op.id == id)
}
