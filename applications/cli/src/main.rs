/// Coverdeck - cover art tool for Ogg Vorbis and Ogg Opus files
use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use coverdeck_artwork::OggArtworkHandler;
use coverdeck_cli::{inspect::inspect, Settings};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "coverdeck")]
#[command(about = "Read and write cover art in Ogg Vorbis / Opus files", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "COVERDECK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the embedded cover as base64, or save it to a file
    Extract {
        /// Audio file
        file: PathBuf,
        /// Write the decoded image here instead of printing base64
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Embed an image file as the front cover
    Embed {
        /// Audio file
        file: PathBuf,
        /// Image file (JPEG, PNG, GIF or WEBP)
        image: PathBuf,
    },
    /// Embed base64 image data (a data URI prefix is allowed)
    EmbedData {
        /// Audio file
        file: PathBuf,
        /// Base64 image bytes
        data: String,
    },
    /// Remove the embedded cover
    Remove {
        /// Audio file
        file: PathBuf,
    },
    /// Show codec, tag placement and cover details
    Inspect {
        /// Audio file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coverdeck=info,coverdeck_artwork=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    settings.validate()?;

    let handler = OggArtworkHandler::new(
        settings.tools.ffmpeg_path.clone(),
        settings.tools.ffprobe_path.clone(),
    )
    .with_owner(settings.owner());

    match cli.command {
        Commands::Extract { file, output } => {
            let file = settings.resolve_path(&file)?;
            extract(&handler, &file, output.as_deref()).await?;
        }
        Commands::Embed { file, image } => {
            let file = settings.resolve_path(&file)?;
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("Failed to read image {}", image.display()))?;
            handler.embed(&file, &STANDARD.encode(bytes), false).await?;
        }
        Commands::EmbedData { file, data } => {
            let file = settings.resolve_path(&file)?;
            handler.embed(&file, &data, false).await?;
        }
        Commands::Remove { file } => {
            let file = settings.resolve_path(&file)?;
            handler.embed(&file, "", true).await?;
        }
        Commands::Inspect { file } => {
            let file = settings.resolve_path(&file)?;
            println!("{}", inspect(&handler, &file).await?);
        }
    }

    Ok(())
}

async fn extract(
    handler: &OggArtworkHandler,
    file: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let Some(encoded) = handler.extract(file).await? else {
        anyhow::bail!("No artwork found in {}", file.display());
    };

    match output {
        Some(output) => {
            let image = STANDARD.decode(&encoded)?;
            tokio::fs::write(output, &image)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!("Saved {} bytes to {}", image.len(), output.display());
        }
        None => println!("{}", encoded),
    }

    Ok(())
}
