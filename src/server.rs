use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc};
use tower_http::services::{ServeDir, ServeFile};

use crate::api::{
    catalog_rows, unknown_persona_warnings, ApiEstimateRequest, ApiEstimateResponse,
    ClearResponse, CreateGroupRequest, DeleteResponse, RefreshResponse, UpdateGroupRequest,
};
use crate::feed::AudienceFeed;
use reach_sim::config::ReferenceConfig;
use reach_sim::estimator::ReachEstimator;
use reach_sim::store::AudienceGroupStore;
use reach_sim::EstimateRequest;

const DEFAULT_USER_ID: &str = "1";

#[derive(Clone)]
struct AppState {
    feed: Arc<AudienceFeed>,
    store: Arc<AudienceGroupStore>,
    estimator: Arc<ReachEstimator>,
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

pub async fn serve(args: crate::ServeArgs) -> Result<(), String> {
    init_tracing();

    let (config, config_path) = ReferenceConfig::load(args.config.clone())?;
    if let Some(path) = config_path.as_ref().filter(|path| path.exists()) {
        tracing::info!(path = %path.display(), "reference tables loaded");
    }

    let feed = Arc::new(AudienceFeed::from_env(args.feed.clone())?);
    let store_path = args.data_dir.join("audience_groups.json");
    let store = Arc::new(AudienceGroupStore::load(store_path).await?);
    let estimator = Arc::new(ReachEstimator::new(&config));

    let state = AppState {
        feed,
        store,
        estimator,
    };

    let web_root = args.web_root;
    let index_path = format!("{}/index.html", web_root.trim_end_matches('/'));
    let static_service = ServeDir::new(web_root).not_found_service(ServeFile::new(index_path));

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/audience", get(list_audience))
        .route("/api/audience/refresh", post(refresh_audience))
        .route("/api/estimate", post(estimate_handler))
        .route(
            "/api/audience-groups",
            get(list_groups).post(create_group).delete(clear_groups),
        )
        .route(
            "/api/audience-groups/:id",
            put(update_group).delete(delete_group),
        )
        .fallback_service(static_service)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    tracing::info!(%addr, "reach-sim server listening");
    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|err| format!("failed to bind server: {}", err))?,
        app,
    )
    .await
    .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn list_audience(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let catalog = state.feed.catalog().await.map_err(bad_gateway)?;
    let rows = catalog_rows(&catalog, state.estimator.scorer());
    Ok(Json(rows))
}

async fn refresh_audience(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let catalog = state.feed.refresh().await.map_err(bad_gateway)?;
    Ok(Json(RefreshResponse {
        segments: catalog.len(),
        regions: catalog.regions().len(),
    }))
}

async fn estimate_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiEstimateRequest>,
) -> Result<Json<ApiEstimateResponse>, (StatusCode, String)> {
    let request = request.into_request();
    let catalog = state.feed.catalog().await.map_err(bad_gateway)?;
    let warnings = unknown_persona_warnings(&catalog, &request.personas);
    let result = state.estimator.estimate(&catalog, &request);
    Ok(Json(ApiEstimateResponse::from_result(result, warnings)))
}

async fn list_groups(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let user = resolve_user(&query, &headers);
    Json(state.store.list(&user).await)
}

async fn create_group(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
    headers: HeaderMap,
    Json(request): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = resolve_user(&query, &headers);

    // the store never recomputes; fill in missing summary figures here
    let computed = if request.has_summary() {
        None
    } else {
        let catalog = state.feed.catalog().await.map_err(bad_gateway)?;
        let selection = EstimateRequest {
            personas: request.personas.clone(),
            regions: Vec::new(),
            demographics: request.demographics.clone(),
        };
        Some(state.estimator.estimate(&catalog, &selection))
    };

    let group = state
        .store
        .create(&user, request.into_draft(computed.as_ref()))
        .await
        .map_err(internal)?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn update_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<UserQuery>,
    headers: HeaderMap,
    Json(request): Json<UpdateGroupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = resolve_user(&query, &headers);
    let Some(existing) = state.store.get(&user, &group_id).await else {
        return Err(not_found());
    };

    let computed = if request.changes_selection() && !request.has_summary() {
        let catalog = state.feed.catalog().await.map_err(bad_gateway)?;
        let selection = EstimateRequest {
            personas: request
                .personas
                .clone()
                .unwrap_or_else(|| existing.personas.clone()),
            regions: Vec::new(),
            demographics: request
                .demographics
                .clone()
                .unwrap_or_else(|| existing.demographics.clone()),
        };
        Some(state.estimator.estimate(&catalog, &selection))
    } else {
        None
    };

    match state
        .store
        .update(&user, &group_id, request.into_patch(computed.as_ref()))
        .await
        .map_err(internal)?
    {
        Some(group) => Ok(Json(group)),
        None => Err(not_found()),
    }
}

async fn delete_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Query(query): Query<UserQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = resolve_user(&query, &headers);
    let deleted = state
        .store
        .delete(&user, &group_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(not_found());
    }
    Ok(Json(DeleteResponse { deleted }))
}

async fn clear_groups(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = resolve_user(&query, &headers);
    let deleted = state.store.clear(&user).await.map_err(internal)?;
    Ok(Json(ClearResponse { deleted }))
}

fn resolve_user(query: &UserQuery, headers: &HeaderMap) -> String {
    if let Some(user) = query.user_id.as_ref().filter(|user| !user.is_empty()) {
        return user.clone();
    }
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string())
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "audience group not found".to_string())
}

fn bad_gateway(err: String) -> (StatusCode, String) {
    (StatusCode::BAD_GATEWAY, err)
}

fn internal(err: String) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err)
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
