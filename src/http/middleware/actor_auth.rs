use crate::domain::actor::AuthenticatedActor;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

/// Reads the actor identity propagated by the upstream auth layer and makes
/// it available to handlers as an extension. Requests without a complete
/// identity are rejected.
pub async fn require_actor(mut request: Request<Body>, next: Next) -> Response {
    let actor = {
        let headers = request.headers();
        let id = headers
            .get("X-Actor-Id")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok());
        let email = headers
            .get("X-Actor-Email")
            .and_then(|h| h.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let role = headers
            .get("X-Actor-Role")
            .and_then(|h| h.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        match (id, email, role) {
            (Some(id), Some(email), Some(role)) => Some(AuthenticatedActor { id, email, role }),
            _ => None,
        }
    };

    match actor {
        Some(actor) => {
            request.extensions_mut().insert(actor);
            next.run(request).await
        }
        None => Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .body(Body::from("unauthorized"))
            .unwrap_or_else(|_| Response::new(Body::from("unauthorized"))),
    }
}
