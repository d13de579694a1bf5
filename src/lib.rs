pub mod app;
pub mod backend;
pub mod clipboard;
pub mod constants;
pub mod error;
pub mod image_file;
pub mod languages;
pub mod ui;

pub use crate::{
    app::App,
    backend::{
        GenerationBackend, GenerationOutcome, GenerationRequest, HttpBackend, UrlGenerationRequest,
    },
    clipboard::{ClipboardSink, SystemClipboard},
    error::{Error, Result},
    image_file::{ImageFile, ImagePreview},
};
