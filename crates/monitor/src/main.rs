mod app;
mod config;
mod worker;

use std::process;

use clap::Parser;
use env_logger::Env;

use proctor_core::annotation::infrastructure::box_annotator::BoxAnnotator;
use proctor_core::detection::domain::confidence_policy::ConfidencePolicy;
use proctor_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_CANDIDATE_CONFIDENCE,
};
use proctor_core::shared::constants::{DISPLAY_WINDOW_TITLE, YOLO_MODEL_NAME, YOLO_MODEL_URL};
use proctor_core::shared::model_resolver;
use proctor_core::video::domain::frame_source::FrameSource;
use proctor_core::video::infrastructure::ffmpeg_camera_source::FfmpegCameraSource;
use proctor_core::video::infrastructure::image_decoder::ImageFileSource;

use app::App;
use config::MonitorConfig;
use worker::MonitorHandle;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = MonitorConfig::parse();
    // A still image has nothing more to show, so its result stays on screen.
    let close_on_stop = config.image.is_none();
    let handle = match start(&config) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };
    let on_exit = handle.clone();

    let result = iced::application(
        move || App::new(handle.clone(), close_on_stop),
        App::update,
        App::view,
    )
    .title(DISPLAY_WINDOW_TITLE)
    .subscription(App::subscription)
    .window(iced::window::Settings {
        size: iced::Size::new(960.0, 600.0),
        ..Default::default()
    })
    .run();

    // Closing the window must also stop the capture thread.
    on_exit.request_quit();

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn start(config: &MonitorConfig) -> Result<MonitorHandle, Box<dyn std::error::Error>> {
    let policy = ConfidencePolicy::new(config.confidence)?;

    let model_path = model_resolver::resolve(
        config.model.as_deref(),
        YOLO_MODEL_NAME,
        YOLO_MODEL_URL,
        Some(Box::new(model_resolver::report_download_progress)),
    )?;
    log::info!("Using face model {}", model_path.display());
    let detector = OnnxYoloDetector::new(&model_path, DEFAULT_CANDIDATE_CONFIDENCE)?;

    let source: Box<dyn FrameSource> = match &config.image {
        Some(path) => Box::new(ImageFileSource::new(path)),
        None => Box::new(FfmpegCameraSource::open(
            &config.camera,
            config.input_format(),
        )?),
    };
    let annotator = BoxAnnotator::new(policy).with_font_file(&config.font);

    Ok(worker::spawn(
        source,
        Box::new(detector),
        Box::new(annotator),
    ))
}
