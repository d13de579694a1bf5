use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::info;
use imagetoprompt_client::{
    App, HttpBackend, ImageFile, SystemClipboard,
    constants::{DEFAULT_BASE_URL, DEFAULT_LANGUAGE, DEFAULT_STRUCTURED_PROMPT},
    languages::SUPPORTED_LANGUAGES,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Base URL of the image-to-prompt backend
    #[arg(long, env = "IMAGETOPROMPT_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Give up on a request after this many seconds (waits forever if unset)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a prompt for an image
    Generate {
        /// Path to the image file
        #[arg(required_unless_present = "url")]
        image_path: Option<PathBuf>,

        /// Let the backend fetch the image from an http(s) URL or a data:image URI
        #[arg(long, conflicts_with = "image_path")]
        url: Option<String>,

        /// API key sent as a bearer token
        #[arg(long, env = "IMAGETOPROMPT_API_KEY", hide_env_values = true, default_value = "")]
        api_key: String,

        /// Language code of the generated prompt
        #[arg(long, default_value = DEFAULT_LANGUAGE)]
        language: String,

        /// Ask for a structured prompt (yes or no)
        #[arg(long, default_value = DEFAULT_STRUCTURED_PROMPT)]
        structured: String,

        /// Copy the prompt to the clipboard
        #[arg(long)]
        clip: bool,

        /// Also write the prompt to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the models the backend advertises
    Models {
        /// API key sent as a bearer token
        #[arg(long, env = "IMAGETOPROMPT_API_KEY", hide_env_values = true, default_value = "")]
        api_key: String,
    },
    /// List supported prompt languages
    Languages,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    let backend = HttpBackend::new(&args.base_url, args.timeout.map(Duration::from_secs))
        .with_context(|| format!("cannot use backend at {}", args.base_url))?;
    info!("Using backend at {}", backend.base_url());
    let mut app = App::new(backend, SystemClipboard::new());

    match args.command {
        Command::Generate {
            image_path,
            url,
            api_key,
            language,
            structured,
            clip,
            output,
        } => {
            app.select_language(&language)?;
            app.select_structured_prompt(&structured)?;
            app.set_api_key(api_key);

            match (image_path, url) {
                (_, Some(url)) => app.handle_generate_from_url(&url).await?,
                (Some(image_path), None) => {
                    let file = ImageFile::from_path(&image_path)
                        .await
                        .with_context(|| format!("cannot read {}", image_path.display()))?;
                    app.pick_files(vec![file]).await?;
                    app.handle_generate().await?;
                }
                (None, None) => bail!("either an image path or --url is required"),
            }

            let prompt = &app.page().result.output;
            println!("{prompt}");

            if let Some(path) = output {
                fs::write(&path, prompt)
                    .with_context(|| format!("cannot write {}", path.display()))?;
            }

            if clip {
                if let Err(e) = app.copy_to_clipboard() {
                    eprintln!("{e}");
                }
            }
        }
        Command::Models { api_key } => {
            app.set_api_key(api_key);
            let models = app.list_models().await?;
            if models.is_empty() {
                bail!("backend advertises no models");
            }
            for model in models {
                println!("{model}");
            }
        }
        Command::Languages => {
            for lang in SUPPORTED_LANGUAGES {
                let marker = if lang.code == DEFAULT_LANGUAGE { "*" } else { " " };
                println!("{marker} {:<6} {}", lang.code, lang.name);
            }
        }
    }

    Ok(())
}
