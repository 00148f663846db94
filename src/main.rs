use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lesebuch::progress::store::{init_db, ProgressStore};
use lesebuch::state::AppState;
use lesebuch::{config, content, handlers};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lesebuch=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = config::load_settings();

    let course = match content::load_course(&settings.course_dir) {
        Ok(course) => Arc::new(course),
        Err(e) => {
            tracing::error!("failed to load course from {}: {}", settings.course_dir.display(), e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "loaded course \"{}\" with {} lessons",
        course.title,
        course.lessons().count()
    );

    let pool = init_db(&settings.database_path).expect("Failed to initialize database");
    let state = AppState::new(ProgressStore::new(pool), course, settings.base_path.clone());

    let app = handlers::router(state)
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http());

    let bind_addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

    tracing::info!("Server running on http://localhost:{}", settings.port);

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
