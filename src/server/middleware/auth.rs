use ntex::{
    http::{Payload, header},
    web::{Error, FromRequest, HttpRequest},
};

use crate::{
    api::{envelope::ApiError, token},
    metric,
    server::AppState,
};

/// Guard for session routes: the bearer token must belong to the
/// `{session}` in the path
pub struct Authorized;

fn is_authorized(req: &HttpRequest) -> bool {
    let (Some(session), Some(app_state)) = (
        req.match_info().get("session"),
        req.app_state::<AppState>(),
    ) else {
        return false;
    };

    if app_state.secret_key.is_empty() {
        return false;
    }

    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    token::verify_bearer(header, &app_state.secret_key, session)
}

impl<Err> FromRequest<Err> for Authorized {
    type Error = Error;

    fn from_request(
        req: &HttpRequest,
        _: &mut Payload,
    ) -> impl std::future::Future<Output = Result<Self, Self::Error>> {
        if !is_authorized(req) {
            metric::incr_auth_statds("rejected");
            return futures::future::ready(Err(ApiError::Unauthorized.into()));
        }

        futures::future::ready(Ok(Self))
    }
}
