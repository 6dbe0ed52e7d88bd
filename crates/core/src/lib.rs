pub mod shared {
    pub mod config;
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod paths;
    pub mod placement;
    pub mod scoped_file;
    pub mod video_metadata;
}

pub mod watermark {
    pub mod domain {
        pub mod watermark_image;
        pub mod watermark_loader;
    }
    pub mod infrastructure;
}

pub mod compositing {
    pub mod domain {
        pub mod frame_compositor;
    }
    pub mod infrastructure;
}

pub mod remux {
    pub mod domain {
        pub mod audio_remuxer;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod video_reader;
        pub mod video_writer;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod composite_video_use_case;
    pub mod pipeline_logger;
    pub mod prepare_watermark_use_case;
    pub mod watermark_video_use_case;
}
