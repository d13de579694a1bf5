//! Plain-data page controls.
//!
//! Each control holds exactly the state the page toggles on it, so handlers
//! can be driven and inspected without a browser or a terminal.

use tokio::time::Instant;

use crate::{
    constants::{COPIED_LABEL, COPIED_LABEL_DURATION, COPY_LABEL},
    error::{Error, Result},
    image_file::ImagePreview,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A drop-down. At most one option is selected at a time.
#[derive(Debug, Clone)]
pub struct Select {
    name: &'static str,
    options: Vec<SelectOption>,
}

impl Select {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            options: Vec::new(),
        }
    }

    pub fn append(&mut self, value: impl Into<String>, label: impl Into<String>, selected: bool) {
        if selected {
            self.options.iter_mut().for_each(|o| o.selected = false);
        }
        self.options.push(SelectOption {
            value: value.into(),
            label: label.into(),
            selected,
        });
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    /// Selected value, or the first option's value when none is marked.
    pub fn value(&self) -> &str {
        self.options
            .iter()
            .find(|o| o.selected)
            .or_else(|| self.options.first())
            .map(|o| o.value.as_str())
            .unwrap_or("")
    }

    pub fn select(&mut self, value: &str) -> Result<()> {
        if !self.options.iter().any(|o| o.value == value) {
            return Err(Error::UnknownOption {
                control: self.name,
                value: value.to_string(),
            });
        }
        for option in &mut self.options {
            option.selected = option.value == value;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DropZone {
    pub dragover: bool,
}

#[derive(Debug, Clone)]
pub struct PreviewPane {
    pub image: Option<ImagePreview>,
    pub hidden: bool,
    pub placeholder_hidden: bool,
}

impl Default for PreviewPane {
    fn default() -> Self {
        Self {
            image: None,
            hidden: true,
            placeholder_hidden: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerateButton {
    pub disabled: bool,
    pub text_visible: bool,
    pub spinner_visible: bool,
}

impl Default for GenerateButton {
    fn default() -> Self {
        Self {
            disabled: false,
            text_visible: true,
            spinner_visible: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultArea {
    pub placeholder_hidden: bool,
    pub container_hidden: bool,
    pub output: String,
}

impl Default for ResultArea {
    fn default() -> Self {
        Self {
            placeholder_hidden: false,
            container_hidden: true,
            output: String::new(),
        }
    }
}

/// Copy button whose label reads "copied" for a short while after a copy.
#[derive(Debug, Clone, Default)]
pub struct CopyButton {
    acknowledged_until: Option<Instant>,
}

impl CopyButton {
    pub fn acknowledge(&mut self) {
        self.acknowledged_until = Some(Instant::now() + COPIED_LABEL_DURATION);
    }

    pub fn label(&self) -> &'static str {
        match self.acknowledged_until {
            Some(until) if Instant::now() < until => COPIED_LABEL,
            _ => COPY_LABEL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorBanner {
    pub text: String,
    pub hidden: bool,
}

impl Default for ErrorBanner {
    fn default() -> Self {
        Self {
            text: String::new(),
            hidden: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page {
    pub api_key: String,
    pub language: Select,
    pub structured_prompt: Select,
    pub uploader: DropZone,
    pub preview: PreviewPane,
    pub generate: GenerateButton,
    pub result: ResultArea,
    pub copy: CopyButton,
    pub error: ErrorBanner,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            language: Select::new("language"),
            structured_prompt: Select::new("structured prompt"),
            uploader: DropZone::default(),
            preview: PreviewPane::default(),
            generate: GenerateButton::default(),
            result: ResultArea::default(),
            copy: CopyButton::default(),
            error: ErrorBanner::default(),
        }
    }
}

impl Page {
    pub fn set_loading(&mut self, loading: bool) {
        self.generate.disabled = loading;
        self.generate.text_visible = !loading;
        self.generate.spinner_visible = loading;
        if loading {
            self.hide_error();
            self.result.container_hidden = true;
            self.result.placeholder_hidden = false;
        }
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error.text = message.into();
        self.error.hidden = false;
    }

    pub fn hide_error(&mut self) {
        self.error.hidden = true;
    }

    /// Text of the banner while it is shown.
    pub fn error_message(&self) -> Option<&str> {
        (!self.error.hidden).then_some(self.error.text.as_str())
    }
}
