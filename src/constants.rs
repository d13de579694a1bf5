use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8088";
pub const GENERATE_FROM_UPLOAD_PATH: &str = "api/generate-from-upload";
pub const MODELS_PATH: &str = "v1/models";
pub const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";
pub const DEFAULT_MODEL: &str = "image-to-prompt-v1";

pub const DEFAULT_LANGUAGE: &str = "en";
pub const STRUCTURED_PROMPT_OPTIONS: &[&str] = &["yes", "no"];
pub const DEFAULT_STRUCTURED_PROMPT: &str = "yes";

pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

pub const COPY_LABEL: &str = "复制";
pub const COPIED_LABEL: &str = "已复制!";
pub const COPIED_LABEL_DURATION: Duration = Duration::from_secs(2);

// User-facing messages.
pub const MSG_INVALID_IMAGE: &str = "请上传有效的图片文件。";
pub const MSG_NO_IMAGE: &str = "请先上传一张图片。";
pub const MSG_NO_API_KEY: &str = "请输入 API Key。";
pub const MSG_GENERATION_FAILED: &str = "生成失败，未知错误。";
pub const MSG_COPY_FAILED: &str = "复制失败";
