//! Handlers for every user action on the upload page.
//!
//! `App` owns the page state and the selected file. Each handler mirrors one
//! control event; errors are shown on the page banner and also returned so a
//! caller can stop early.

use log::{info, warn};

use crate::{
    backend::{GenerationBackend, GenerationOutcome, GenerationRequest, UrlGenerationRequest},
    clipboard::ClipboardSink,
    constants::{DEFAULT_STRUCTURED_PROMPT, STRUCTURED_PROMPT_OPTIONS},
    error::{Error, Result},
    image_file::ImageFile,
    languages::{SUPPORTED_LANGUAGES, default_language, find_by_code},
    ui::Page,
};

pub struct App<B, C> {
    page: Page,
    selected_file: Option<ImageFile>,
    backend: B,
    clipboard: C,
}

impl<B: GenerationBackend, C: ClipboardSink> App<B, C> {
    pub fn new(backend: B, clipboard: C) -> Self {
        let mut app = Self {
            page: Page::default(),
            selected_file: None,
            backend,
            clipboard,
        };
        app.initialize();
        app
    }

    fn initialize(&mut self) {
        let default = default_language();
        for lang in SUPPORTED_LANGUAGES {
            self.page
                .language
                .append(lang.code, lang.name, lang == default);
        }
        for &option in STRUCTURED_PROMPT_OPTIONS {
            self.page
                .structured_prompt
                .append(option, option, option == DEFAULT_STRUCTURED_PROMPT);
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn selected_file(&self) -> Option<&ImageFile> {
        self.selected_file.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn clipboard(&self) -> &C {
        &self.clipboard
    }

    // --- Form inputs ---

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.page.api_key = api_key.into();
    }

    pub fn select_language(&mut self, code: &str) -> Result<()> {
        let lang = find_by_code(code).ok_or_else(|| Error::UnknownOption {
            control: "language",
            value: code.to_string(),
        })?;
        info!("Prompt language: {} ({})", lang.name, lang.code);
        self.page.language.select(lang.code)
    }

    pub fn select_structured_prompt(&mut self, value: &str) -> Result<()> {
        self.page.structured_prompt.select(value)
    }

    // --- Image input ---

    pub fn drag_over(&mut self) {
        self.page.uploader.dragover = true;
    }

    pub fn drag_leave(&mut self) {
        self.page.uploader.dragover = false;
    }

    /// Only the first dropped file is considered.
    pub async fn drop_files(&mut self, files: Vec<ImageFile>) -> Result<()> {
        self.page.uploader.dragover = false;
        self.handle_file(files.into_iter().next()).await
    }

    pub async fn pick_files(&mut self, files: Vec<ImageFile>) -> Result<()> {
        self.handle_file(files.into_iter().next()).await
    }

    pub async fn handle_file(&mut self, file: Option<ImageFile>) -> Result<()> {
        let file = match file {
            Some(file) if file.is_image() => file,
            other => {
                if let Some(file) = &other {
                    warn!("Rejected {} ({})", file.name(), file.mime());
                }
                return Err(self.report(Error::InvalidImage));
            }
        };

        info!("Selected {} ({} bytes)", file.name(), file.bytes().len());
        self.selected_file = Some(file.clone());

        let preview = file.preview().await;
        self.page.preview.image = Some(preview);
        self.page.preview.hidden = false;
        self.page.preview.placeholder_hidden = true;
        self.page.hide_error();
        Ok(())
    }

    // --- Submission ---

    pub async fn handle_generate(&mut self) -> Result<()> {
        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => return Err(self.report(e)),
        };

        self.page.set_loading(true);
        let outcome = self.backend.generate(&request).await;
        self.page.set_loading(false);

        self.present(outcome)
    }

    /// Like [`handle_generate`](Self::handle_generate), for an image the
    /// backend fetches: an `http(s)` URL or a `data:image/...;base64,` URI.
    /// The selected file is not involved.
    pub async fn handle_generate_from_url(&mut self, image_url: &str) -> Result<()> {
        let request = match self.build_url_request(image_url) {
            Ok(request) => request,
            Err(e) => return Err(self.report(e)),
        };

        self.page.set_loading(true);
        let outcome = self.backend.generate_from_url(&request).await;
        self.page.set_loading(false);

        self.present(outcome)
    }

    fn present(&mut self, outcome: Result<GenerationOutcome>) -> Result<()> {
        match outcome {
            Ok(GenerationOutcome::Success(prompt)) => {
                self.display_result(prompt);
                Ok(())
            }
            Ok(GenerationOutcome::Failure(message)) => Err(self.report(Error::Backend(message))),
            Err(e) => Err(self.report(e)),
        }
    }

    fn build_request(&self) -> Result<GenerationRequest> {
        let image = self.selected_file.clone().ok_or(Error::NoImageSelected)?;
        let api_key = self.api_key()?;

        Ok(GenerationRequest {
            image,
            language: self.page.language.value().to_string(),
            structured_prompt: self.page.structured_prompt.value().to_string(),
            api_key,
        })
    }

    fn build_url_request(&self, image_url: &str) -> Result<UrlGenerationRequest> {
        let image_url = match image_url.trim() {
            "" => return Err(Error::NoImageSelected),
            url => url.to_string(),
        };
        let api_key = self.api_key()?;

        Ok(UrlGenerationRequest {
            image_url,
            language: self.page.language.value().to_string(),
            structured_prompt: self.page.structured_prompt.value().to_string(),
            api_key,
        })
    }

    fn api_key(&self) -> Result<String> {
        match self.page.api_key.trim() {
            "" => Err(Error::MissingApiKey),
            key => Ok(key.to_string()),
        }
    }

    /// Model ids the backend advertises.
    pub async fn list_models(&mut self) -> Result<Vec<String>> {
        let api_key = match self.api_key() {
            Ok(key) => key,
            Err(e) => return Err(self.report(e)),
        };
        self.page.hide_error();
        match self.backend.list_models(&api_key).await {
            Ok(models) => Ok(models),
            Err(e) => Err(self.report(e)),
        }
    }

    // --- Result ---

    pub fn display_result(&mut self, prompt: impl Into<String>) {
        self.page.result.placeholder_hidden = true;
        self.page.result.container_hidden = false;
        self.page.result.output = prompt.into();
    }

    pub fn copy_to_clipboard(&mut self) -> Result<()> {
        let text = self.page.result.output.clone();
        match self.clipboard.set_text(&text) {
            Ok(()) => {
                self.page.copy.acknowledge();
                Ok(())
            }
            Err(reason) => Err(self.report(Error::Clipboard(reason))),
        }
    }

    fn report(&mut self, err: Error) -> Error {
        self.page.show_error(err.to_string());
        err
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{constants::*, image_file::tests::png_bytes};

    enum Reply {
        Outcome(GenerationOutcome),
        Malformed(&'static str),
    }

    struct FakeBackend {
        reply: Reply,
        calls: RefCell<Vec<GenerationRequest>>,
        url_calls: RefCell<Vec<UrlGenerationRequest>>,
    }

    impl FakeBackend {
        fn replying(outcome: GenerationOutcome) -> Self {
            Self {
                reply: Reply::Outcome(outcome),
                calls: RefCell::new(Vec::new()),
                url_calls: RefCell::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl GenerationBackend for FakeBackend {
        async fn generate(&self, request: &GenerationRequest) -> Result<GenerationOutcome> {
            self.calls.borrow_mut().push(request.clone());
            match &self.reply {
                Reply::Outcome(outcome) => Ok(outcome.clone()),
                Reply::Malformed(msg) => Err(Error::MalformedResponse(msg.to_string())),
            }
        }

        async fn generate_from_url(
            &self,
            request: &UrlGenerationRequest,
        ) -> Result<GenerationOutcome> {
            self.url_calls.borrow_mut().push(request.clone());
            match &self.reply {
                Reply::Outcome(outcome) => Ok(outcome.clone()),
                Reply::Malformed(msg) => Err(Error::MalformedResponse(msg.to_string())),
            }
        }

        async fn list_models(&self, _api_key: &str) -> Result<Vec<String>> {
            Ok(vec!["image-to-prompt-v1".to_string()])
        }
    }

    #[derive(Default)]
    struct FakeClipboard {
        copied: Vec<String>,
        deny: Option<&'static str>,
    }

    impl ClipboardSink for FakeClipboard {
        fn set_text(&mut self, text: &str) -> std::result::Result<(), String> {
            if let Some(reason) = self.deny {
                return Err(reason.to_string());
            }
            self.copied.push(text.to_string());
            Ok(())
        }
    }

    fn app_with(outcome: GenerationOutcome) -> App<FakeBackend, FakeClipboard> {
        App::new(FakeBackend::replying(outcome), FakeClipboard::default())
    }

    fn cat_png() -> ImageFile {
        ImageFile::new("cat.png", "image/png", png_bytes(4, 4))
    }

    #[test]
    fn initializer_populates_selects() {
        let app = app_with(GenerationOutcome::Success(String::new()));
        let languages = app.page().language.options();
        assert_eq!(languages.len(), 11);
        assert_eq!(languages[5].value, "zh-CN");
        assert_eq!(languages[5].label, "简体中文");

        let selected: Vec<_> = languages.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, "en");

        assert_eq!(app.page().structured_prompt.value(), "yes");
        assert_eq!(app.page().structured_prompt.options().len(), 2);
    }

    #[tokio::test]
    async fn non_image_is_rejected_and_selection_kept() {
        let mut app = app_with(GenerationOutcome::Success(String::new()));
        app.handle_file(Some(cat_png())).await.unwrap();

        let text = ImageFile::new("notes.txt", "text/plain", b"hi".to_vec());
        let err = app.handle_file(Some(text)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidImage));
        assert_eq!(app.page().error_message(), Some(MSG_INVALID_IMAGE));
        assert_eq!(app.selected_file(), Some(&cat_png()));

        app.handle_file(None).await.unwrap_err();
        assert_eq!(app.selected_file(), Some(&cat_png()));
    }

    #[tokio::test]
    async fn valid_image_is_selected_and_clears_error() {
        let mut app = app_with(GenerationOutcome::Success(String::new()));
        app.handle_file(None).await.unwrap_err();
        assert!(app.page().error_message().is_some());

        app.handle_file(Some(cat_png())).await.unwrap();
        assert_eq!(app.selected_file(), Some(&cat_png()));
        assert_eq!(app.page().error_message(), None);
        assert!(!app.page().preview.hidden);
        assert!(app.page().preview.placeholder_hidden);
        assert_eq!(
            app.page().preview.image.as_ref().and_then(|p| p.dimensions),
            Some((4, 4))
        );
    }

    #[tokio::test]
    async fn undecodable_image_still_clears_error() {
        let mut app = app_with(GenerationOutcome::Success(String::new()));
        app.handle_file(None).await.unwrap_err();

        let odd = ImageFile::new("odd.heic", "image/heic", b"\0\0\0".to_vec());
        app.handle_file(Some(odd.clone())).await.unwrap();
        assert_eq!(app.selected_file(), Some(&odd));
        assert_eq!(app.page().error_message(), None);
        assert_eq!(
            app.page().preview.image.as_ref().map(|p| p.dimensions),
            Some(None)
        );
    }

    #[tokio::test]
    async fn drop_uses_first_file_and_clears_highlight() {
        let mut app = app_with(GenerationOutcome::Success(String::new()));
        app.drag_over();
        assert!(app.page().uploader.dragover);
        app.drag_leave();
        assert!(!app.page().uploader.dragover);

        app.drag_over();
        let text = ImageFile::new("a.txt", "text/plain", Vec::new());
        app.drop_files(vec![cat_png(), text]).await.unwrap();
        assert!(!app.page().uploader.dragover);
        assert_eq!(app.selected_file(), Some(&cat_png()));

        app.drop_files(Vec::new()).await.unwrap_err();
        assert_eq!(app.page().error_message(), Some(MSG_INVALID_IMAGE));
    }

    #[tokio::test]
    async fn generate_without_image_makes_no_call() {
        let mut app = app_with(GenerationOutcome::Success("x".into()));
        app.set_api_key("sk-123");

        let err = app.handle_generate().await.unwrap_err();
        assert!(matches!(err, Error::NoImageSelected));
        assert_eq!(app.page().error_message(), Some(MSG_NO_IMAGE));
        assert_eq!(app.backend().call_count(), 0);

        // Missing image is reported even when the key is missing too.
        app.set_api_key("");
        app.handle_generate().await.unwrap_err();
        assert_eq!(app.page().error_message(), Some(MSG_NO_IMAGE));
    }

    #[tokio::test]
    async fn generate_with_blank_key_makes_no_call() {
        let mut app = app_with(GenerationOutcome::Success("x".into()));
        app.pick_files(vec![cat_png()]).await.unwrap();

        for key in ["", "   ", "\t\n"] {
            app.set_api_key(key);
            let err = app.handle_generate().await.unwrap_err();
            assert!(matches!(err, Error::MissingApiKey));
            assert_eq!(app.page().error_message(), Some(MSG_NO_API_KEY));
        }
        assert_eq!(app.backend().call_count(), 0);
        assert!(!app.page().generate.disabled);
    }

    #[tokio::test]
    async fn successful_generation_shows_prompt() {
        let mut app = app_with(GenerationOutcome::Success("a cat on a windowsill".into()));
        app.pick_files(vec![cat_png()]).await.unwrap();
        app.set_api_key("  sk-123  ");
        app.select_language("ja").unwrap();
        app.select_structured_prompt("no").unwrap();

        app.handle_generate().await.unwrap();

        let page = app.page();
        assert_eq!(page.result.output, "a cat on a windowsill");
        assert!(!page.result.container_hidden);
        assert!(page.result.placeholder_hidden);
        assert_eq!(page.error_message(), None);
        assert!(!page.generate.disabled);
        assert!(page.generate.text_visible);
        assert!(!page.generate.spinner_visible);

        let calls = app.backend().calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].api_key, "sk-123");
        assert_eq!(calls[0].language, "ja");
        assert_eq!(calls[0].structured_prompt, "no");
        assert_eq!(calls[0].image, cat_png());
    }

    #[tokio::test]
    async fn backend_failure_shows_detail() {
        let mut app = app_with(GenerationOutcome::Failure("invalid api key".into()));
        app.pick_files(vec![cat_png()]).await.unwrap();
        app.set_api_key("sk-bad");

        let err = app.handle_generate().await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert_eq!(app.page().error_message(), Some("invalid api key"));
        assert!(app.page().result.container_hidden);
        assert!(!app.page().generate.disabled);
    }

    #[tokio::test]
    async fn backend_failure_without_detail_shows_fallback() {
        let mut app = app_with(GenerationOutcome::Failure(MSG_GENERATION_FAILED.into()));
        app.pick_files(vec![cat_png()]).await.unwrap();
        app.set_api_key("sk");

        app.handle_generate().await.unwrap_err();
        assert_eq!(app.page().error_message(), Some("生成失败，未知错误。"));
    }

    #[tokio::test]
    async fn transport_error_is_shown_and_loading_exits() {
        let backend = FakeBackend {
            reply: Reply::Malformed("expected value at line 1 column 1"),
            calls: RefCell::new(Vec::new()),
            url_calls: RefCell::new(Vec::new()),
        };
        let mut app = App::new(backend, FakeClipboard::default());
        app.pick_files(vec![cat_png()]).await.unwrap();
        app.set_api_key("sk");

        app.handle_generate().await.unwrap_err();
        assert_eq!(
            app.page().error_message(),
            Some("expected value at line 1 column 1")
        );
        assert!(!app.page().generate.disabled);
        assert!(app.page().generate.text_visible);
    }

    #[tokio::test]
    async fn new_submission_hides_previous_result() {
        let mut app = app_with(GenerationOutcome::Failure("quota".into()));
        app.pick_files(vec![cat_png()]).await.unwrap();
        app.set_api_key("sk");
        app.display_result("old prompt");

        app.handle_generate().await.unwrap_err();
        assert!(app.page().result.container_hidden);
        assert!(!app.page().result.placeholder_hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn copy_writes_output_and_acknowledges() {
        let mut app = app_with(GenerationOutcome::Success(String::new()));
        app.display_result("a cat on a windowsill");

        app.copy_to_clipboard().unwrap();
        assert_eq!(app.clipboard().copied, vec!["a cat on a windowsill"]);
        assert_eq!(app.page().copy.label(), COPIED_LABEL);

        tokio::time::advance(COPIED_LABEL_DURATION).await;
        assert_eq!(app.page().copy.label(), COPY_LABEL);
    }

    #[tokio::test]
    async fn copy_before_any_result_copies_empty_string() {
        let mut app = app_with(GenerationOutcome::Success(String::new()));
        app.copy_to_clipboard().unwrap();
        assert_eq!(app.clipboard().copied, vec![String::new()]);
    }

    #[tokio::test]
    async fn copy_failure_reports_reason() {
        let clipboard = FakeClipboard {
            deny: Some("permission denied"),
            ..Default::default()
        };
        let mut app = App::new(
            FakeBackend::replying(GenerationOutcome::Success(String::new())),
            clipboard,
        );

        let err = app.copy_to_clipboard().unwrap_err();
        assert!(matches!(err, Error::Clipboard(_)));
        assert_eq!(app.page().error_message(), Some("复制失败: permission denied"));
        assert_eq!(app.page().copy.label(), COPY_LABEL);
    }

    #[tokio::test]
    async fn list_models_requires_key() {
        let mut app = app_with(GenerationOutcome::Success(String::new()));
        app.list_models().await.unwrap_err();
        assert_eq!(app.page().error_message(), Some(MSG_NO_API_KEY));

        app.set_api_key("sk");
        assert_eq!(app.list_models().await.unwrap(), vec!["image-to-prompt-v1"]);
        assert_eq!(app.page().error_message(), None);
    }

    #[test]
    fn unknown_language_is_rejected() {
        let mut app = app_with(GenerationOutcome::Success(String::new()));
        let err = app.select_language("zh").unwrap_err();
        assert_eq!(err.to_string(), "unknown language option: zh");
        assert_eq!(app.page().language.value(), "en");

        app.select_language("ko").unwrap();
        assert_eq!(app.page().language.value(), "ko");
    }

    #[tokio::test]
    async fn url_generation_shows_prompt_without_a_file() {
        let mut app = app_with(GenerationOutcome::Success("a red fox".into()));
        app.set_api_key(" sk-123 ");
        app.select_language("de").unwrap();

        app.handle_generate_from_url("  https://example.com/fox.jpg ")
            .await
            .unwrap();

        assert_eq!(app.page().result.output, "a red fox");
        assert!(!app.page().result.container_hidden);
        assert!(!app.page().generate.disabled);
        assert_eq!(app.backend().call_count(), 0);

        let calls = app.backend().url_calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].image_url, "https://example.com/fox.jpg");
        assert_eq!(calls[0].api_key, "sk-123");
        assert_eq!(calls[0].language, "de");
        assert_eq!(calls[0].structured_prompt, "yes");
    }

    #[tokio::test]
    async fn url_generation_checks_url_then_key() {
        let mut app = app_with(GenerationOutcome::Success("x".into()));
        app.handle_generate_from_url("   ").await.unwrap_err();
        assert_eq!(app.page().error_message(), Some(MSG_NO_IMAGE));

        app.handle_generate_from_url("data:image/png;base64,AAAA")
            .await
            .unwrap_err();
        assert_eq!(app.page().error_message(), Some(MSG_NO_API_KEY));
        assert!(app.backend().url_calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn url_generation_failure_shows_detail() {
        let mut app = app_with(GenerationOutcome::Failure("no image found".into()));
        app.set_api_key("sk");

        let err = app
            .handle_generate_from_url("https://example.com/x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert_eq!(app.page().error_message(), Some("no image found"));
    }

    #[tokio::test]
    async fn successful_listing_hides_stale_error() {
        let mut app = app_with(GenerationOutcome::Success(String::new()));
        app.handle_file(None).await.unwrap_err();
        assert_eq!(app.page().error_message(), Some(MSG_INVALID_IMAGE));

        app.set_api_key("sk");
        app.list_models().await.unwrap();
        assert_eq!(app.page().error_message(), None);
    }
}
