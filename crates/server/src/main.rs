use std::process;

use clap::Parser;
use env_logger::Env;

use proctor_core::detection::domain::confidence_policy::ConfidencePolicy;
use proctor_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_CANDIDATE_CONFIDENCE,
};
use proctor_core::pipeline::detect_faces_use_case::DetectFacesUseCase;
use proctor_core::shared::constants::{YOLO_MODEL_NAME, YOLO_MODEL_URL};
use proctor_core::shared::model_resolver;
use proctor_core::violation::domain::violation_logger::ViolationLogger;
use proctor_core::violation::domain::violation_store::shared_store;
use proctor_core::violation::infrastructure::sqlite_violation_store::SqliteViolationStore;

use proctor_server::config::ServerConfig;
use proctor_server::router::build_app_router;
use proctor_server::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(e) = run(ServerConfig::parse()).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let policy = ConfidencePolicy::new(config.confidence)?;

    // Model download and session setup block; keep them off the runtime.
    let model = config.model.clone();
    let detector = tokio::task::spawn_blocking(move || {
        let model_path = model_resolver::resolve(
            model.as_deref(),
            YOLO_MODEL_NAME,
            YOLO_MODEL_URL,
            Some(Box::new(model_resolver::report_download_progress)),
        )
        .map_err(|e| e.to_string())?;
        log::info!("Using face model {}", model_path.display());
        OnnxYoloDetector::new(&model_path, DEFAULT_CANDIDATE_CONFIDENCE).map_err(|e| e.to_string())
    })
    .await??;

    let store = shared_store(SqliteViolationStore::open(&config.store)?);
    log::info!("Violation store at {}", config.store);

    let pipeline = DetectFacesUseCase::new(
        Box::new(detector),
        ViolationLogger::new(store.clone()),
        policy,
    );
    let app = build_app_router(AppState::new(pipeline, store));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    log::info!("Listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Cannot listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("Shutdown signal received");
}
