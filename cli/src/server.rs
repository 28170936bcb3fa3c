use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::limit::RequestBodyLimitLayer;

use platter_core::models::{
    AggregatedIngredient, ExportData, Macros, MealType, NewIngredient, NewRecipe, PlanEntry,
    Recipe, RecipeUpdate, Slot, normalize_day, validate_import_entry, validate_import_recipe,
    validate_new_recipe,
};
use platter_core::service::PlannerService;

const BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MB

#[derive(Clone)]
struct AppState {
    service: Arc<Mutex<PlannerService>>,
    api_key: Option<String>,
}

// --- Request / Response types ---

#[derive(Deserialize)]
struct IngredientSpec {
    name: String,
    amount: f64,
    unit: String,
}

impl From<IngredientSpec> for NewIngredient {
    fn from(spec: IngredientSpec) -> Self {
        Self {
            name: spec.name,
            amount: spec.amount,
            unit: spec.unit,
        }
    }
}

#[derive(Deserialize)]
struct CreateRecipeRequest {
    name: String,
    #[serde(default)]
    ingredients: Vec<IngredientSpec>,
    calories: Option<f64>,
    macros: Option<Macros>,
    tags: Option<Vec<String>>,
    instructions: Option<Vec<String>>,
    prep_time: Option<String>,
    servings: Option<i64>,
    description: Option<String>,
    image: Option<String>,
    color: Option<String>,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Partial update. A field that is absent is left alone; a field that is
/// present as `null` clears the stored value.
#[derive(Deserialize)]
#[allow(clippy::option_option)]
struct UpdateRecipeRequest {
    name: Option<String>,
    ingredients: Option<Vec<IngredientSpec>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    calories: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    macros: Option<Option<Macros>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    tags: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    instructions: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    prep_time: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    servings: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    image: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    color: Option<Option<String>>,
}

impl UpdateRecipeRequest {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.ingredients.is_none()
            && self.calories.is_none()
            && self.macros.is_none()
            && self.tags.is_none()
            && self.instructions.is_none()
            && self.prep_time.is_none()
            && self.servings.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.color.is_none()
    }
}

#[derive(Deserialize)]
struct CreatePlanRequest {
    recipe_id: String,
    date: String,
    meal_type: String,
}

#[derive(Deserialize)]
struct MovePlanRequest {
    date: String,
    meal_type: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(err) => {
                eprintln!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Recipe handlers ---

async fn list_recipes(State(state): State<AppState>) -> Json<Vec<Recipe>> {
    let svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Json(svc.recipes().to_vec())
}

async fn create_recipe(
    State(state): State<AppState>,
    Json(req): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<Recipe>), ApiError> {
    let new = NewRecipe {
        name: req.name.trim().to_string(),
        ingredients: req.ingredients.into_iter().map(Into::into).collect(),
        calories: req.calories,
        macros: req.macros,
        tags: req.tags,
        instructions: req.instructions,
        prep_time: req.prep_time,
        servings: req.servings,
        description: req.description,
        image: req.image,
        color: req.color,
    };
    validate_new_recipe(&new).map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let mut svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let recipe = svc.add_recipe(new);
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, ApiError> {
    let svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let recipe = svc
        .get_recipe(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {id} not found")))?;
    Ok(Json(recipe.clone()))
}

async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRecipeRequest>,
) -> Result<Json<Recipe>, ApiError> {
    if req.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one field must be provided".to_string(),
        ));
    }
    if let Some(ref name) = req.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Recipe name must not be empty".to_string(),
            ));
        }
    }
    if req.calories.flatten().is_some_and(|v| v < 0.0) {
        return Err(ApiError::BadRequest(
            "calories must not be negative".to_string(),
        ));
    }

    let update = RecipeUpdate {
        name: req.name,
        ingredients: req
            .ingredients
            .map(|ings| ings.into_iter().map(Into::into).collect()),
        calories: req.calories,
        macros: req.macros,
        tags: req.tags,
        instructions: req.instructions,
        prep_time: req.prep_time,
        servings: req.servings,
        description: req.description,
        image: req.image,
        color: req.color,
    };
    if let Some(ings) = &update.ingredients {
        for ing in ings {
            platter_core::models::validate_ingredient(ing)
                .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
        }
    }

    let mut svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if svc.get_recipe(&id).is_none() {
        return Err(ApiError::NotFound(format!("Recipe {id} not found")));
    }
    svc.update_recipe(&id, &update);
    let recipe = svc
        .get_recipe(&id)
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {id} not found")))?;
    Ok(Json(recipe.clone()))
}

async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if svc.get_recipe(&id).is_none() {
        return Err(ApiError::NotFound(format!("Recipe {id} not found")));
    }
    svc.delete_recipe(&id);
    Ok(StatusCode::NO_CONTENT)
}

// --- Plan handlers ---

async fn get_plan(State(state): State<AppState>) -> Json<Vec<PlanEntry>> {
    let svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Json(svc.plan().to_vec())
}

async fn create_plan_entry(
    State(state): State<AppState>,
    Json(req): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<PlanEntry>), ApiError> {
    let meal_type =
        MealType::parse(&req.meal_type).map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    let date = normalize_day(&req.date);
    if date.is_empty() {
        return Err(ApiError::BadRequest("date must not be empty".to_string()));
    }

    let mut svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if svc.get_recipe(&req.recipe_id).is_none() {
        return Err(ApiError::BadRequest(format!(
            "Recipe {} not found",
            req.recipe_id
        )));
    }

    let id = svc.place(&req.recipe_id, &Slot::new(date, meal_type));
    let entry = svc
        .plan()
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("placed entry {id} missing")))?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn move_plan_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MovePlanRequest>,
) -> Result<Json<PlanEntry>, ApiError> {
    let meal_type =
        MealType::parse(&req.meal_type).map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    let date = normalize_day(&req.date);

    let mut svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if !svc.plan().iter().any(|e| e.id == id) {
        return Err(ApiError::NotFound(format!("Plan entry {id} not found")));
    }
    svc.move_entry(&id, &date, meal_type);
    let entry = svc
        .plan()
        .iter()
        .find(|e| e.id == id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Plan entry {id} not found")))?;
    Ok(Json(entry))
}

async fn delete_plan_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if !svc.plan().iter().any(|e| e.id == id) {
        return Err(ApiError::NotFound(format!("Plan entry {id} not found")));
    }
    svc.remove_entry(&id);
    Ok(StatusCode::NO_CONTENT)
}

// --- Derived views ---

async fn grocery_list(State(state): State<AppState>) -> Json<Vec<AggregatedIngredient>> {
    let svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Json(svc.grocery_list())
}

async fn day_macros(
    State(state): State<AppState>,
    Path(day): Path<String>,
) -> Json<serde_json::Value> {
    let day = normalize_day(&day);
    let svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let totals = svc.day_totals(&day);
    Json(serde_json::json!({
        "day": day,
        "calories": totals.calories,
        "protein": totals.protein,
        "carbs": totals.carbs,
        "fats": totals.fats,
    }))
}

// --- Export / Import handlers ---

async fn export_data(State(state): State<AppState>) -> Json<ExportData> {
    let svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Json(svc.export_all())
}

async fn import_data(
    State(state): State<AppState>,
    Json(data): Json<ExportData>,
) -> Result<Json<serde_json::Value>, ApiError> {
    for recipe in &data.recipes {
        validate_import_recipe(recipe).map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    }
    for entry in &data.plan_entries {
        validate_import_entry(entry).map_err(|e| ApiError::BadRequest(format!("{e}")))?;
    }

    let mut svc = state
        .service
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    svc.import_all(&data)?;
    Ok(Json(serde_json::json!({
        "recipes_imported": data.recipes.len(),
        "plan_entries_imported": data.plan_entries.len(),
    })))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// --- Router builder ---

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/api/recipes/{id}",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .route("/api/plan", get(get_plan).post(create_plan_entry))
        .route("/api/plan/{id}", delete(delete_plan_entry))
        .route("/api/plan/{id}/move", put(move_plan_entry))
        .route("/api/grocery-list", get(grocery_list))
        .route("/api/macros/{day}", get(day_macros))
        .route("/api/export", get(export_data))
        .route("/api/import", post(import_data))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        // Health stays reachable without a key
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// Abbreviated key for the startup banner. The key file can be hand-edited,
/// so short or multi-byte contents must not panic here.
fn key_preview(key: &str) -> String {
    match (key.get(..4), key.get(key.len().saturating_sub(4)..)) {
        (Some(head), Some(tail)) if key.len() >= 8 => format!("{head}...{tail}"),
        _ => "(short key)".to_string(),
    }
}

pub async fn start_server(
    service: PlannerService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
) -> anyhow::Result<()> {
    let state = AppState {
        service: Arc::new(Mutex::new(service)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    if let Some(ref key) = api_key {
        eprintln!(
            "API key: {} (see api_key file in data directory)",
            key_preview(key)
        );
    } else {
        eprintln!("Warning: Authentication disabled (--no-auth). API is open to anyone.");
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        eprintln!(
            "Warning: Listening on {bind} with no authentication. Any device on your network can access this API."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state(api_key: Option<String>) -> AppState {
        AppState {
            service: Arc::new(Mutex::new(PlannerService::new_in_memory().unwrap())),
            api_key,
        }
    }

    fn test_app(api_key: Option<String>) -> Router {
        build_router(test_state(api_key))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn auth_missing_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Invalid or missing API key");
    }

    #[tokio::test]
    async fn auth_wrong_key_returns_401() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes")
                    .header("Authorization", "Bearer wrong-key")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn auth_correct_key_succeeds() {
        let app = test_app(Some("test-key-abc123".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes")
                    .header("Authorization", "Bearer test-key-abc123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn no_auth_mode_allows_requests() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_does_not_require_auth() {
        let app = test_app(Some("secret".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn security_headers_present() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
        assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(
            response.headers().get("content-security-policy").unwrap(),
            "default-src 'none'"
        );
    }

    #[tokio::test]
    async fn security_headers_on_auth_failure() {
        let app = test_app(Some("secret".to_string()));

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn body_size_limit_rejects_oversized() {
        let app = test_app(None);

        let big_body = vec![0u8; BODY_LIMIT + 1];
        let response = app
            .oneshot(
                axum::http::Request::post("/api/recipes")
                    .header("content-type", "application/json")
                    .body(Body::from(big_body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn internal_error_does_not_leak_details() {
        // The Internal variant should produce a generic message
        let error =
            ApiError::Internal(anyhow::anyhow!("secret database path /home/user/.platter/db"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Internal server error");
        assert!(!json["error"].as_str().unwrap().contains("secret"));
    }

    // --- Recipe endpoint tests ---

    async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
        app.oneshot(
            axum::http::Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn create_recipe_returns_201() {
        let state = test_state(None);
        let app = build_router(state);

        let body = serde_json::json!({
            "name": "Chicken Curry",
            "calories": 550.0,
            "macros": { "protein": 40.0, "carbs": 60.0, "fats": 15.0 },
            "ingredients": [
                { "name": "Chicken", "amount": 500.0, "unit": "g" },
                { "name": "Rice", "amount": 200.0, "unit": "g" }
            ],
            "tags": ["dinner", "spicy"]
        });

        let response = post_json(app, "/api/recipes", body).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        assert_eq!(json["name"], "Chicken Curry");
        assert!(!json["id"].as_str().unwrap().is_empty());
        assert_eq!(json["ingredients"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_recipe_round_trips_instructions() {
        let state = test_state(None);
        let app = build_router(state.clone());

        let body = serde_json::json!({
            "name": "Pancakes",
            "instructions": ["Whisk batter", "Fry on both sides"]
        });

        let response = post_json(app, "/api/recipes", body).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = body_json(response).await;
        assert_eq!(
            json["instructions"],
            serde_json::json!(["Whisk batter", "Fry on both sides"])
        );

        let svc = state.service.lock().unwrap();
        let stored = &svc.recipes()[0];
        assert_eq!(
            stored.instructions.as_deref(),
            Some(&["Whisk batter".to_string(), "Fry on both sides".to_string()][..])
        );
    }

    #[tokio::test]
    async fn create_recipe_empty_name_returns_400() {
        let app = test_app(None);

        let response = post_json(app, "/api/recipes", serde_json::json!({ "name": "  " })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_recipe_negative_calories_returns_400() {
        let app = test_app(None);

        let response = post_json(
            app,
            "/api/recipes",
            serde_json::json!({ "name": "Bad", "calories": -10.0 }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_recipe_not_found_returns_404() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::get("/api/recipes/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_recipe_clears_field_with_null() {
        let state = test_state(None);
        let id = {
            let mut svc = state.service.lock().unwrap();
            svc.add_recipe(NewRecipe {
                name: "Toast".to_string(),
                calories: Some(220.0),
                ..NewRecipe::default()
            })
            .id
        };

        let app = build_router(state.clone());
        let response = app
            .oneshot(
                axum::http::Request::put(format!("/api/recipes/{id}"))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"calories": null}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let svc = state.service.lock().unwrap();
        assert!(svc.get_recipe(&id).unwrap().calories.is_none());
    }

    #[tokio::test]
    async fn update_recipe_empty_body_returns_400() {
        let state = test_state(None);
        let id = {
            let mut svc = state.service.lock().unwrap();
            svc.add_recipe(NewRecipe {
                name: "Toast".to_string(),
                ..NewRecipe::default()
            })
            .id
        };

        let app = build_router(state);
        let response = app
            .oneshot(
                axum::http::Request::put(format!("/api/recipes/{id}"))
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_recipe_returns_204() {
        let state = test_state(None);
        let id = {
            let mut svc = state.service.lock().unwrap();
            svc.add_recipe(NewRecipe {
                name: "Soup".to_string(),
                ..NewRecipe::default()
            })
            .id
        };

        let app = build_router(state.clone());
        let response = app
            .oneshot(
                axum::http::Request::delete(format!("/api/recipes/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.service.lock().unwrap().get_recipe(&id).is_none());
    }

    // --- Plan endpoint tests ---

    #[tokio::test]
    async fn plan_create_move_delete_flow() {
        let state = test_state(None);
        let recipe_id = {
            let mut svc = state.service.lock().unwrap();
            svc.add_recipe(NewRecipe {
                name: "Pasta".to_string(),
                ..NewRecipe::default()
            })
            .id
        };

        // Create
        let app = build_router(state.clone());
        let response = post_json(
            app,
            "/api/plan",
            serde_json::json!({
                "recipe_id": recipe_id,
                "date": "monday",
                "meal_type": "dinner"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        let entry_id = json["id"].as_str().unwrap().to_string();
        assert_eq!(json["date"], "Monday");
        assert_eq!(json["meal_type"], "dinner");

        // Move
        let app = build_router(state.clone());
        let response = app
            .oneshot(
                axum::http::Request::put(format!("/api/plan/{entry_id}/move"))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"date": "tuesday", "meal_type": "lunch"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["date"], "Tuesday");
        assert_eq!(json["meal_type"], "lunch");

        // Delete
        let app = build_router(state.clone());
        let response = app
            .oneshot(
                axum::http::Request::delete(format!("/api/plan/{entry_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.service.lock().unwrap().plan().is_empty());
    }

    #[tokio::test]
    async fn plan_create_unknown_recipe_returns_400() {
        let app = test_app(None);

        let response = post_json(
            app,
            "/api/plan",
            serde_json::json!({
                "recipe_id": "ghost",
                "date": "Monday",
                "meal_type": "lunch"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn plan_create_invalid_meal_type_returns_400() {
        let state = test_state(None);
        let recipe_id = {
            let mut svc = state.service.lock().unwrap();
            svc.add_recipe(NewRecipe {
                name: "Pasta".to_string(),
                ..NewRecipe::default()
            })
            .id
        };

        let app = build_router(state);
        let response = post_json(
            app,
            "/api/plan",
            serde_json::json!({
                "recipe_id": recipe_id,
                "date": "Monday",
                "meal_type": "brunch"
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn plan_move_unknown_entry_returns_404() {
        let app = test_app(None);

        let response = app
            .oneshot(
                axum::http::Request::put("/api/plan/nope/move")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"date": "Monday", "meal_type": "lunch"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // --- Derived view tests ---

    #[tokio::test]
    async fn grocery_list_merges_across_planned_recipes() {
        let state = test_state(None);
        {
            let mut svc = state.service.lock().unwrap();
            let a = svc
                .add_recipe(NewRecipe {
                    name: "Salad".to_string(),
                    ingredients: vec![NewIngredient {
                        name: "Tomato".to_string(),
                        amount: 2.0,
                        unit: "pcs".to_string(),
                    }],
                    ..NewRecipe::default()
                })
                .id;
            let b = svc
                .add_recipe(NewRecipe {
                    name: "Soup".to_string(),
                    ingredients: vec![NewIngredient {
                        name: "tomato".to_string(),
                        amount: 3.0,
                        unit: "PCS".to_string(),
                    }],
                    ..NewRecipe::default()
                })
                .id;
            svc.place(&a, &Slot::new("Monday", MealType::Lunch));
            svc.place(&b, &Slot::new("Tuesday", MealType::Dinner));
        }

        let app = build_router(state);
        let response = app
            .oneshot(
                axum::http::Request::get("/api/grocery-list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Tomato");
        assert_eq!(items[0]["amount"], 5.0);
        assert_eq!(
            items[0]["recipes"],
            serde_json::json!(["Salad", "Soup"])
        );
    }

    #[tokio::test]
    async fn macros_endpoint_sums_planned_day() {
        let state = test_state(None);
        {
            let mut svc = state.service.lock().unwrap();
            let id = svc
                .add_recipe(NewRecipe {
                    name: "Omelette".to_string(),
                    calories: Some(300.0),
                    macros: Some(Macros {
                        protein: Some(20.0),
                        carbs: Some(2.0),
                        fats: Some(22.0),
                    }),
                    ..NewRecipe::default()
                })
                .id;
            svc.place(&id, &Slot::new("Monday", MealType::Breakfast));
            svc.place(&id, &Slot::new("Monday", MealType::Lunch));
        }

        let app = build_router(state);
        let response = app
            .oneshot(
                axum::http::Request::get("/api/macros/mon")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["day"], "Monday");
        assert_eq!(json["calories"], 600.0);
        assert_eq!(json["protein"], 40.0);
    }

    // --- Export / import tests ---

    #[tokio::test]
    async fn export_then_import_roundtrip() {
        let state = test_state(None);
        {
            let mut svc = state.service.lock().unwrap();
            let id = svc
                .add_recipe(NewRecipe {
                    name: "Stew".to_string(),
                    ..NewRecipe::default()
                })
                .id;
            svc.place(&id, &Slot::new("Friday", MealType::Dinner));
        }

        let app = build_router(state);
        let response = app
            .oneshot(
                axum::http::Request::get("/api/export")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let exported = body_json(response).await;
        assert_eq!(exported["recipes"].as_array().unwrap().len(), 1);
        assert_eq!(exported["plan_entries"].as_array().unwrap().len(), 1);

        // Import into a fresh server
        let fresh = test_state(None);
        let app = build_router(fresh.clone());
        let response = post_json(app, "/api/import", exported).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["recipes_imported"], 1);
        assert_eq!(json["plan_entries_imported"], 1);

        let svc = fresh.service.lock().unwrap();
        assert_eq!(svc.recipes().len(), 1);
        assert_eq!(svc.plan().len(), 1);
    }

    #[tokio::test]
    async fn import_invalid_recipe_returns_400() {
        let app = test_app(None);

        let body = serde_json::json!({
            "version": 1,
            "exported_at": "2025-01-01T00:00:00Z",
            "recipes": [{ "id": "", "name": "Broken", "ingredients": [] }],
            "plan_entries": []
        });

        let response = post_json(app, "/api/import", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // --- Startup banner ---

    #[test]
    fn key_preview_abbreviates_normal_key() {
        assert_eq!(key_preview("abcdef123456"), "abcd...3456");
    }

    #[test]
    fn key_preview_handles_short_key() {
        assert_eq!(key_preview("abc"), "(short key)");
        assert_eq!(key_preview(""), "(short key)");
    }

    #[test]
    fn key_preview_handles_multibyte_key() {
        // Slicing at byte 4 would split the second 'é'; must not panic.
        assert_eq!(key_preview("aéééé"), "(short key)");
        // Multi-byte but with clean boundaries at both ends.
        assert_eq!(key_preview("abcdéfghijkl"), "abcd...ijkl");
    }
}
