pub mod nms;
pub mod onnx_yolo_detector;
