use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{admin, auth, public, sitemap};

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route(
            "/api/admin/articles",
            get(admin::list_articles).post(admin::create_article),
        )
        // static segments win over `{slug}`
        .route("/api/admin/articles/batch", post(admin::generate_batch))
        .route("/api/admin/articles/save-batch", post(admin::save_batch))
        .route(
            "/api/admin/articles/{slug}",
            get(admin::get_article)
                .put(admin::update_article)
                .delete(admin::delete_article),
        )
        .route("/api/admin/articles/{slug}/cover", post(admin::generate_cover))
        .route("/api/admin/images", post(admin::generate_image))
        .route("/api/generate-article", post(admin::generate_article))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/health", get(public::health))
        .route("/api/blogs", get(public::list_blogs))
        .route("/api/blogs/{slug}", get(public::get_blog))
        .route("/sitemap.xml", get(sitemap::sitemap_xml))
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
