// Fiesta Voting - Web Server
// REST API over the voting core; the phone UI and the projector dashboard
// talk to these routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use fiesta_voting::{
    available_voters_from_ids, compute_results, costume_candidates, group_by_family,
    karaoke_candidates, list_ballots, list_families, list_guests, list_voter_ids, submit_ballot,
    BallotForm, Family, VoteError, NO_FAMILY,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

/// Core errors carried out to HTTP.
struct ApiError(VoteError);

impl From<VoteError> for ApiError {
    fn from(err: VoteError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            VoteError::AlreadyVoted { .. } => StatusCode::CONFLICT,
            VoteError::InvalidBallot(_) => StatusCode::UNPROCESSABLE_ENTITY,
            VoteError::UnknownGuest { .. } | VoteError::UnknownFamily { .. } => {
                StatusCode::NOT_FOUND
            }
            VoteError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            eprintln!("Store error: {}", self.0);
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Flat guest row for dropdowns and candidate lists.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GuestRow {
    id: String,
    name: String,
    family: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MemberRow {
    id: String,
    name: String,
}

/// One family with its guests, for the grouped roster view.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FamilyGroup {
    family: String,
    guests: Vec<MemberRow>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FamilyRow {
    id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    voter_id: String,
    costume_votes: [String; 3],
    karaoke_vote: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    voter_id: String,
    submitted_at: String,
}

fn family_name_map(families: &[Family]) -> HashMap<&str, &str> {
    families
        .iter()
        .map(|f| (f.id.as_str(), f.name.as_str()))
        .collect()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/guests - Full roster grouped by family
async fn get_guests(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let conn = state.db.lock().unwrap();

    let guests = list_guests(&conn)?;
    let families = list_families(&conn)?;

    let groups: Vec<FamilyGroup> = group_by_family(&guests, &families)
        .into_iter()
        .map(|(family, members)| FamilyGroup {
            family,
            guests: members
                .into_iter()
                .map(|g| MemberRow {
                    id: g.id,
                    name: g.name,
                })
                .collect(),
        })
        .collect();

    Ok((StatusCode::OK, Json(ApiResponse::ok(groups))))
}

/// GET /api/guests/available - Guests who have not voted yet
async fn get_available_guests(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.db.lock().unwrap();

    let guests = list_guests(&conn)?;
    let families = list_families(&conn)?;
    let voted = list_voter_ids(&conn)?;

    let family_names = family_name_map(&families);

    let rows: Vec<GuestRow> = available_voters_from_ids(&guests, &voted)
        .into_iter()
        .map(|g| GuestRow {
            family: family_names
                .get(g.family_id.as_str())
                .map(|n| n.to_string())
                .unwrap_or_else(|| NO_FAMILY.to_string()),
            id: g.id,
            name: g.name,
        })
        .collect();

    Ok((StatusCode::OK, Json(ApiResponse::ok(rows))))
}

/// GET /api/candidates/costume/:voter_id - Everyone except the voter
async fn get_costume_candidates(
    State(state): State<AppState>,
    Path(voter_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.db.lock().unwrap();

    let guests = list_guests(&conn)?;
    let families = list_families(&conn)?;

    let family_names = family_name_map(&families);

    let rows: Vec<GuestRow> = costume_candidates(&guests, &voter_id)?
        .into_iter()
        .map(|g| GuestRow {
            family: family_names
                .get(g.family_id.as_str())
                .map(|n| n.to_string())
                .unwrap_or_else(|| NO_FAMILY.to_string()),
            id: g.id,
            name: g.name,
        })
        .collect();

    Ok((StatusCode::OK, Json(ApiResponse::ok(rows))))
}

/// GET /api/candidates/karaoke/:voter_id - Every family except the voter's
async fn get_karaoke_candidates(
    State(state): State<AppState>,
    Path(voter_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.db.lock().unwrap();

    let guests = list_guests(&conn)?;
    let families = list_families(&conn)?;

    let rows: Vec<FamilyRow> = karaoke_candidates(&guests, &families, &voter_id)?
        .into_iter()
        .map(|f| FamilyRow {
            id: f.id,
            name: f.name,
        })
        .collect();

    Ok((StatusCode::OK, Json(ApiResponse::ok(rows))))
}

/// POST /api/ballots - Cast a ballot
async fn post_ballot(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conn = state.db.lock().unwrap();

    let form = BallotForm {
        voter_id: req.voter_id,
        costume_votes: req.costume_votes,
        karaoke_vote: req.karaoke_vote,
    };

    let ballot = submit_ballot(&conn, &form)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SubmitResponse {
            voter_id: ballot.voter_id,
            submitted_at: ballot.submitted_at.to_rfc3339(),
        })),
    ))
}

/// GET /api/results - Winners plus the per-guest board (dashboard polls this)
async fn get_results(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let conn = state.db.lock().unwrap();

    let guests = list_guests(&conn)?;
    let families = list_families(&conn)?;
    let ballots = list_ballots(&conn)?;

    let results = compute_results(&ballots, &guests, &families);

    Ok((StatusCode::OK, Json(ApiResponse::ok(results))))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    env_logger::init();

    println!("🎉 Fiesta Voting - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Open database
    let db_path = std::env::var("FIESTA_DB").unwrap_or_else(|_| "fiesta.db".to_string());
    let db_path = std::path::Path::new(&db_path);

    if !db_path.exists() {
        eprintln!("❌ Database not found at {:?}", db_path);
        eprintln!("   Run: fiesta-voting seed <roster.txt>");
        eprintln!("   to load the guest list first.");
        std::process::exit(1);
    }

    let conn = Connection::open(db_path).expect("Failed to open database");
    println!("✓ Database opened: {:?}", db_path);

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/guests", get(get_guests))
        .route("/guests/available", get(get_available_guests))
        .route("/candidates/costume/:voter_id", get(get_costume_candidates))
        .route("/candidates/karaoke/:voter_id", get(get_karaoke_candidates))
        .route("/ballots", post(post_ballot))
        .route("/results", get(get_results))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let port = std::env::var("FIESTA_PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    println!("\n🚀 Server running on http://localhost:{}", port);
    println!("   Guests:  GET  http://localhost:{}/api/guests/available", port);
    println!("   Ballots: POST http://localhost:{}/api/ballots", port);
    println!("   Results: GET  http://localhost:{}/api/results", port);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
