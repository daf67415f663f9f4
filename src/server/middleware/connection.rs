use ntex::{
    http::Payload,
    web::{Error, FromRequest, HttpRequest},
};
use serde_json::Value;

use crate::{api::envelope::ApiError, server::AppState};

/// Guard for routes that need a live WhatsApp connection.
///
/// Unknown sessions pass through so the handler can answer
/// "Session not found".
pub struct ConnectedSession;

/// `"CONNECTED"` (any case) or `true`
pub fn is_connected(state: &Value) -> bool {
    match state {
        Value::String(s) => s.eq_ignore_ascii_case("CONNECTED"),
        Value::Bool(connected) => *connected,
        _ => false,
    }
}

impl<Err> FromRequest<Err> for ConnectedSession {
    type Error = Error;

    fn from_request(
        req: &HttpRequest,
        _: &mut Payload,
    ) -> impl std::future::Future<Output = Result<Self, Self::Error>> {
        let session = req
            .match_info()
            .get("session")
            .zip(req.app_state::<AppState>())
            .and_then(|(name, app_state)| app_state.registry.get(name));

        async move {
            let Some(session) = session else {
                return Ok(Self);
            };

            match session.get_connection_state().await {
                Ok(state) if is_connected(&state) => Ok(Self),
                Ok(_) => Err(ApiError::Disconnected.into()),
                Err(e) => Err(ApiError::operational("check connection", e).into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_connected() {
        assert!(is_connected(&json!("CONNECTED")));
        assert!(is_connected(&json!("connected")));
        assert!(is_connected(&json!(true)));
        assert!(!is_connected(&json!("DISCONNECTED")));
        assert!(!is_connected(&json!("OPENING")));
        assert!(!is_connected(&Value::Null));
    }
}
