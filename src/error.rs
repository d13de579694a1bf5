use thiserror::Error;

/// Everything that can go wrong on the way from a picked file to a copied
/// prompt. The `Display` text of each variant is what the user sees.
#[derive(Error, Debug)]
pub enum Error {
    #[error("请上传有效的图片文件。")]
    InvalidImage,

    #[error("请先上传一张图片。")]
    NoImageSelected,

    #[error("请输入 API Key。")]
    MissingApiKey,

    /// Message reported by the backend, shown verbatim.
    #[error("{0}")]
    Backend(String),

    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    MalformedResponse(String),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("unknown {control} option: {value}")]
    UnknownOption { control: &'static str, value: String },

    #[error("复制失败: {0}")]
    Clipboard(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
