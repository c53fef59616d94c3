use actix_web::{
    http::header::USER_AGENT,
    web::{self, Data, Json, Path, Query},
    HttpRequest, HttpResponse, Responder,
};
use reflex_core::constants::{LEADERBOARD_LIMIT_DEFAULT, LEADERBOARD_LIMIT_MAX, MAX_USERNAME_LEN};
use reflex_core::ranking::username_fits;
use reflex_core::{DeviceFilter, DeviceType, GameOutcome};
use uuid::Uuid;

use crate::config::AppState;
use crate::error::LedgerError;
use crate::ledger::SessionLedger;
use crate::rate_limit::LimitClass;
use crate::response::ledger_error;
use crate::types::{
    EndSessionRequest, EndSessionResponse, HealthResponse, LeaderboardQuery, LeaderboardResponse,
    LeaderboardRow, SessionResponse, StartSessionRequest, StartSessionResponse, StatsResponse,
    UserScoresResponse,
};

pub(crate) fn parse_device_type(raw: Option<&str>) -> Result<DeviceType, LedgerError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LedgerError::InvalidInput("device_type is required".to_string()))?;
    raw.parse()
        .map_err(|err| LedgerError::InvalidInput(format!("{err}")))
}

/// Session ids are issued as UUIDs; plain alphanumeric ids are also accepted.
pub(crate) fn validate_session_id(raw: Option<&str>) -> Result<&str, LedgerError> {
    let id = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| LedgerError::InvalidInput("session_id is required".to_string()))?;
    if Uuid::parse_str(id).is_ok() || id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(id)
    } else {
        Err(LedgerError::InvalidInput(
            "session_id must be a UUID or alphanumeric".to_string(),
        ))
    }
}

fn whole_number(name: &str, value: Option<f64>, min: f64) -> Result<u32, LedgerError> {
    let value =
        value.ok_or_else(|| LedgerError::InvalidInput(format!("{name} is required")))?;
    if !value.is_finite() || value < min || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(LedgerError::InvalidInput(format!(
            "{name} must be an integer >= {min}"
        )));
    }
    Ok(value as u32)
}

pub(crate) fn validate_outcome(body: &EndSessionRequest) -> Result<GameOutcome, LedgerError> {
    let time_taken_seconds = body
        .time_taken
        .ok_or_else(|| LedgerError::InvalidInput("time_taken is required".to_string()))?;
    if !time_taken_seconds.is_finite() || time_taken_seconds < 0.0 {
        return Err(LedgerError::InvalidInput(
            "time_taken must be a non-negative number".to_string(),
        ));
    }

    Ok(GameOutcome {
        time_taken_seconds,
        attempts: whole_number("attempts", body.attempts, 0.0)?,
        max_level: whole_number("max_level", body.max_level, 1.0)?,
    })
}

pub(crate) fn validate_username(raw: Option<&str>) -> Result<(), LedgerError> {
    match raw.map(str::trim) {
        Some(name) if !username_fits(name) => Err(LedgerError::InvalidInput(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn parse_leaderboard_query(
    query: &LeaderboardQuery,
) -> Result<(u32, DeviceFilter), LedgerError> {
    let limit = match query.limit.as_deref().map(str::trim) {
        None | Some("") => LEADERBOARD_LIMIT_DEFAULT,
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|limit| (1..=LEADERBOARD_LIMIT_MAX).contains(limit))
            .ok_or_else(|| {
                LedgerError::InvalidInput(format!(
                    "limit must be an integer between 1 and {LEADERBOARD_LIMIT_MAX}"
                ))
            })?,
    };

    let filter = match query.device_type.as_deref().map(str::trim) {
        None | Some("") => DeviceFilter::All,
        Some(raw) => raw
            .parse()
            .map_err(|err| LedgerError::InvalidInput(format!("{err}")))?,
    };

    Ok((limit, filter))
}

fn client_ip(req: &HttpRequest) -> Option<String> {
    req.connection_info()
        .realip_remote_addr()
        .map(str::to_string)
}

fn throttle(state: &AppState, class: LimitClass, client: Option<&str>) -> Result<(), LedgerError> {
    state.limiter.check(class, client.unwrap_or("unknown"))
}

/// Run a ledger call on the blocking pool; the store holds a sync mutex.
async fn with_ledger<T, F>(state: &AppState, f: F) -> Result<T, LedgerError>
where
    F: FnOnce(&SessionLedger) -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    let ledger = state.ledger.clone();
    web::block(move || f(&ledger))
        .await
        .map_err(|err| LedgerError::StoreFailure(format!("blocking worker failure: {err}")))?
}

pub(crate) async fn health(state: Data<AppState>) -> impl Responder {
    let stored_sessions = match with_ledger(&state, |ledger| ledger.stored_sessions()).await {
        Ok(count) => count,
        Err(err) => return ledger_error(&err),
    };

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        service: "reflex-api",
        stored_sessions,
        min_game_time_seconds: state.policy.min_time_seconds,
        max_game_time_seconds: state.policy.max_time_seconds,
        flag_implausible_times: state.policy.flag_on_finalize,
        reject_implausible_times: state.policy.reject_on_submit,
        rate_limited_clients: state.limiter.tracked_clients(),
    })
}

pub(crate) async fn start_session(
    state: Data<AppState>,
    req: HttpRequest,
    body: Json<StartSessionRequest>,
) -> impl Responder {
    let ip = client_ip(&req);
    if let Err(err) = throttle(&state, LimitClass::SessionStart, ip.as_deref()) {
        return ledger_error(&err);
    }

    let body = body.into_inner();
    let device_type = match parse_device_type(body.device_type.as_deref()) {
        Ok(device) => device,
        Err(err) => return ledger_error(&err),
    };
    let user_agent = body.user_agent.filter(|ua| !ua.trim().is_empty()).or_else(|| {
        req.headers()
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    });

    match with_ledger(&state, move |ledger| {
        ledger.start_session(device_type, user_agent, ip)
    })
    .await
    {
        Ok(session) => HttpResponse::Created().json(StartSessionResponse {
            success: true,
            session_id: session.session_id,
            start_time: session.start_time,
        }),
        Err(err) => ledger_error(&err),
    }
}

pub(crate) async fn end_session(
    state: Data<AppState>,
    req: HttpRequest,
    body: Json<EndSessionRequest>,
) -> impl Responder {
    let ip = client_ip(&req);
    if let Err(err) = throttle(&state, LimitClass::SessionEnd, ip.as_deref()) {
        return ledger_error(&err);
    }

    let body = body.into_inner();
    let validated = validate_session_id(body.session_id.as_deref())
        .map(str::to_string)
        .and_then(|id| validate_outcome(&body).map(|outcome| (id, outcome)))
        .and_then(|pair| validate_username(body.username.as_deref()).map(|()| pair));
    let (session_id, outcome) = match validated {
        Ok(pair) => pair,
        Err(err) => return ledger_error(&err),
    };
    let username = body.username;

    match with_ledger(&state, move |ledger| {
        ledger.end_session(&session_id, outcome, username.as_deref())
    })
    .await
    {
        Ok((session, ranking_entry)) => HttpResponse::Ok().json(EndSessionResponse {
            success: true,
            session,
            ranking_entry,
        }),
        Err(err) => ledger_error(&err),
    }
}

pub(crate) async fn get_session(
    state: Data<AppState>,
    req: HttpRequest,
    path: Path<String>,
) -> impl Responder {
    if let Err(err) = throttle(&state, LimitClass::General, client_ip(&req).as_deref()) {
        return ledger_error(&err);
    }
    let raw = path.into_inner();
    let session_id = match validate_session_id(Some(raw.as_str())) {
        Ok(id) => id.to_string(),
        Err(err) => return ledger_error(&err),
    };

    match with_ledger(&state, move |ledger| ledger.get_session(&session_id)).await {
        Ok(session) => HttpResponse::Ok().json(SessionResponse {
            success: true,
            session,
        }),
        Err(err) => ledger_error(&err),
    }
}

pub(crate) async fn game_stats(state: Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(err) = throttle(&state, LimitClass::General, client_ip(&req).as_deref()) {
        return ledger_error(&err);
    }
    match with_ledger(&state, |ledger| ledger.game_stats()).await {
        Ok(stats) => HttpResponse::Ok().json(StatsResponse {
            success: true,
            stats,
        }),
        Err(err) => ledger_error(&err),
    }
}

pub(crate) async fn leaderboard(
    state: Data<AppState>,
    req: HttpRequest,
    query: Query<LeaderboardQuery>,
) -> impl Responder {
    if let Err(err) = throttle(&state, LimitClass::LeaderboardRead, client_ip(&req).as_deref()) {
        return ledger_error(&err);
    }
    let (limit, filter) = match parse_leaderboard_query(&query) {
        Ok(parsed) => parsed,
        Err(err) => return ledger_error(&err),
    };

    match with_ledger(&state, move |ledger| ledger.top_scores(limit, filter)).await {
        Ok(scores) => HttpResponse::Ok().json(LeaderboardResponse {
            success: true,
            count: scores.len(),
            scores: scores.into_iter().map(LeaderboardRow::from).collect(),
            device_type: filter.as_str(),
            limit,
        }),
        Err(err) => ledger_error(&err),
    }
}

pub(crate) async fn user_scores(
    state: Data<AppState>,
    req: HttpRequest,
    path: Path<String>,
) -> impl Responder {
    if let Err(err) = throttle(&state, LimitClass::General, client_ip(&req).as_deref()) {
        return ledger_error(&err);
    }
    let username = path.into_inner().trim().to_string();
    if username.is_empty() {
        return ledger_error(&LedgerError::InvalidInput("username is required".to_string()));
    }
    if let Err(err) = validate_username(Some(username.as_str())) {
        return ledger_error(&err);
    }

    let lookup = username.clone();
    match with_ledger(&state, move |ledger| ledger.user_scores(&lookup)).await {
        Ok(scores) => HttpResponse::Ok().json(UserScoresResponse {
            success: true,
            username,
            scores,
        }),
        Err(err) => ledger_error(&err),
    }
}

pub(crate) async fn leaderboard_stats(state: Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(err) = throttle(&state, LimitClass::General, client_ip(&req).as_deref()) {
        return ledger_error(&err);
    }
    match with_ledger(&state, |ledger| ledger.leaderboard_stats()).await {
        Ok(stats) => HttpResponse::Ok().json(StatsResponse {
            success: true,
            stats,
        }),
        Err(err) => ledger_error(&err),
    }
}
