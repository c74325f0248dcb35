use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/v3/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/v3/roles/{role_id}",
            get(handlers::roles::get_role_handler)
                .patch(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/v3/role_assignments",
            get(handlers::assignments::list_role_assignments_handler),
        )
        .route(
            "/v3/users/{user_id}/role_assignments",
            get(handlers::assignments::list_user_role_assignments_handler),
        )
        .route(
            "/v3/domains/{domain_id}",
            put(handlers::scopes::register_domain_handler),
        )
        .route(
            "/v3/projects/{project_id}",
            put(handlers::scopes::register_project_handler),
        )
        .route(
            "/v3/system/{actor_kind}/{actor_id}/roles/{role_id}",
            put(handlers::assignments::grant_system_role_handler)
                .delete(handlers::assignments::revoke_system_role_handler),
        )
        .route(
            "/v3/domains/{domain_id}/{actor_kind}/{actor_id}/roles/{role_id}",
            put(handlers::assignments::grant_domain_role_handler)
                .delete(handlers::assignments::revoke_domain_role_handler),
        )
        .route(
            "/v3/projects/{project_id}/{actor_kind}/{actor_id}/roles/{role_id}",
            put(handlers::assignments::grant_project_role_handler)
                .delete(handlers::assignments::revoke_project_role_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_token,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/v3/auth/tokens", post(handlers::tokens::issue_token_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
