use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use imaginai::core::config::AppConfig;
use imaginai::core::models::{GeneratedImage, UploadedImage, ValidatedUpload};
use imaginai::errors::AppError;
use imaginai::gateway::{Gateway, SubmissionError};
use imaginai::preview::{PreviewRegistry, PreviewSlot};
use imaginai::validation::{
    FileValidator, LocalFileUpload, PromptValidator, UploadSource, clamp_prompt_input,
    encode_validated, read_validated,
};

#[derive(Parser)]
#[command(name = "imaginai", version, about = "Image generation webhook gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an image from a text prompt
    Generate(GenerateOpts),
    /// Edit an uploaded image according to a prompt
    Edit(EditOpts),
    /// Validate an image file without contacting the backend
    CheckFile(FileOpts),
    /// Validate a prompt without contacting the backend
    CheckPrompt { prompt: String },
}

#[derive(Args)]
struct GenerateOpts {
    #[arg(short, long)]
    prompt: String,
    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Args)]
struct EditOpts {
    #[arg(short, long)]
    prompt: String,
    #[arg(short, long)]
    image: PathBuf,
    /// Override the content type guessed from the extension
    #[arg(long)]
    mime: Option<String>,
    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Args)]
struct FileOpts {
    path: PathBuf,
    #[arg(long)]
    mime: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    imaginai::setup_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(opts) => {
            let gateway = Gateway::new(&AppConfig::from_env()?)?;
            let result = gateway
                .submit_generate(clamp_prompt_input(&opts.prompt))
                .await;
            finish(result, &opts.out).await
        }
        Commands::Edit(opts) => {
            let gateway = Gateway::new(&AppConfig::from_env()?)?;
            let upload = open_upload(&opts.image, opts.mime).await?;

            // only a fully accepted upload gets a preview
            let (validated, image) = match prepare_upload(&upload).await {
                Ok(prepared) => prepared,
                Err(e) => {
                    eprintln!("{}: {}", e.code(), e);
                    return Ok(ExitCode::FAILURE);
                }
            };
            let mut preview = PreviewSlot::new(PreviewRegistry::new());
            let url = preview.replace(validated.into_bytes(), image.mime_type());
            info!("Upload preview available at {}", url);

            let result = gateway
                .submit_encoded_edit(clamp_prompt_input(&opts.prompt), &image)
                .await;
            preview.clear();
            finish(result, &opts.out).await
        }
        Commands::CheckFile(opts) => {
            let upload = open_upload(&opts.path, opts.mime).await?;
            let result = FileValidator::new().validate(&upload).await;
            match result.error() {
                None => {
                    println!("OK {} ({})", upload.file_name(), upload.declared_mime());
                    Ok(ExitCode::SUCCESS)
                }
                Some(reason) => {
                    eprintln!("VALIDATION_ERROR: {reason}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::CheckPrompt { prompt } => {
            let result = PromptValidator::new().validate(clamp_prompt_input(&prompt));
            match (result.sanitized(), result.error()) {
                (Some(sanitized), _) => {
                    println!("{sanitized}");
                    Ok(ExitCode::SUCCESS)
                }
                (None, reason) => {
                    eprintln!("VALIDATION_ERROR: {}", reason.unwrap_or_default());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

async fn open_upload(path: &Path, mime: Option<String>) -> anyhow::Result<LocalFileUpload> {
    let upload = LocalFileUpload::open(path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(match mime {
        Some(mime) => upload.with_declared_mime(mime),
        None => upload,
    })
}

async fn prepare_upload(
    upload: &LocalFileUpload,
) -> Result<(ValidatedUpload, UploadedImage), AppError> {
    let validated = read_validated(&FileValidator::new(), upload).await?;
    let image = encode_validated(&validated)?;
    Ok((validated, image))
}

async fn finish(
    result: Result<GeneratedImage, SubmissionError>,
    out: &Path,
) -> anyhow::Result<ExitCode> {
    match result {
        Ok(image) => {
            let png = STANDARD
                .decode(image.base64_png.as_bytes())
                .context("backend returned invalid base64 image data")?;
            tokio::fs::write(out, &png)
                .await
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Wrote {} bytes to {}", png.len(), out.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{}: {}", e.code(), e);
            Ok(ExitCode::FAILURE)
        }
    }
}
