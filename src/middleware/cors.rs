// CORS configuration
// The mobile app talks to the relay directly; browsers get a permissive policy

use tower_http::cors::{CorsLayer, Any};
use axum::Router;

pub fn apply_cors(router: Router) -> Router {
    router.layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
