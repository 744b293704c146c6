pub mod shared {
    pub mod constants;
    pub mod detection;
    pub mod frame;
    pub mod model_resolver;
}

pub mod detection {
    pub mod domain {
        pub mod confidence_policy;
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure;
}

pub mod annotation {
    pub mod domain {
        pub mod frame_annotator;
    }
    pub mod infrastructure;
}

pub mod violation {
    pub mod domain {
        pub mod violation_logger;
        pub mod violation_record;
        pub mod violation_store;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod capture_loop_use_case;
    pub mod detect_faces_use_case;
}
