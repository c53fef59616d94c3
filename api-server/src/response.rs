use actix_web::{
    http::{
        header::{HeaderValue, RETRY_AFTER},
        StatusCode,
    },
    HttpResponse,
};
use serde::Serialize;

use crate::error::LedgerError;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    error_code: &'a str,
}

/// Failure envelope shared by every route and the JSON extractor.
pub(crate) fn json_error_with_code(
    status: StatusCode,
    message: &str,
    error_code: &str,
) -> HttpResponse {
    HttpResponse::build(status).json(ErrorBody {
        success: false,
        error: message,
        error_code,
    })
}

pub(crate) fn ledger_error(err: &LedgerError) -> HttpResponse {
    match err {
        LedgerError::StoreFailure(detail) => tracing::error!("store failure: {detail}"),
        LedgerError::Throttled { .. } => tracing::warn!("{err}"),
        _ => tracing::debug!("request rejected: {err}"),
    }

    let mut response = json_error_with_code(err.status(), &err.public_message(), err.code());
    if let LedgerError::Throttled {
        retry_after_secs, ..
    } = err
    {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
    }
    response
}
