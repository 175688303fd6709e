use std::collections::HashMap;
use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use thumbgrab::{
    DecoderLogLevel, ThumbgrabError, ThumbnailExtractor, ThumbnailFormat, ThumbnailRequest,
    set_decoder_log_level,
};

const CLI_AFTER_HELP: &str = "Examples:\n  thumbgrab file input.mp4 --max-width 320 --time-ms 2000\n  thumbgrab data https://example.com/clip.mp4 --header 'Authorization: Bearer tok' --out thumb.jpg\n  thumbgrab files a.mp4 b.mp4 --out thumbs/ --json";

#[derive(Debug, Parser)]
#[command(
    name = "thumbgrab",
    version,
    about = "Extract video thumbnails to JPEG, PNG, or WebP",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    options: SharedOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone)]
struct SharedOptions {
    /// Output format (jpg, png, webp).
    #[arg(long, default_value = "jpg")]
    format: String,

    /// Target max width in pixels. 0 derives from the height or keeps the
    /// native width.
    #[arg(long, default_value_t = 0)]
    max_width: u32,

    /// Target max height in pixels. 0 derives from the width or keeps the
    /// native height.
    #[arg(long, default_value_t = 0)]
    max_height: u32,

    /// Target timestamp in milliseconds. -1 picks the nearest keyframe.
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    time_ms: i64,

    /// JPEG quality, 0-100.
    #[arg(long, default_value_t = 90)]
    quality: u8,

    /// HTTP header for remote sources, as "Key: Value". Repeatable.
    #[arg(long = "header")]
    headers: Vec<String>,

    /// Silence FFmpeg's own stderr output.
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract thumbnail bytes and write them to stdout or --out.
    Data {
        /// Input video path or URL.
        video: String,

        /// Write bytes here instead of stdout.
        #[arg(long)]
        out: Option<String>,
    },

    /// Extract a thumbnail file next to the source, or at --out.
    File {
        /// Input video path or URL.
        video: String,

        /// Explicit output path or directory.
        #[arg(long)]
        out: Option<String>,
    },

    /// Extract thumbnails for several videos; missing sources are skipped.
    Files {
        /// Input video paths or URLs.
        #[arg(required = true)]
        videos: Vec<String>,

        /// Output directory for every thumbnail.
        #[arg(long)]
        out: Option<String>,

        /// Print the written paths as a JSON array.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.options.quiet {
        set_decoder_log_level(DecoderLogLevel::Quiet);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), ThumbgrabError> {
    let extractor = ThumbnailExtractor::new();

    match &cli.command {
        Commands::Data { video, out } => {
            let request = build_request(video.clone(), &cli.options, None)?;
            let bytes = extractor.data(&request)?;
            match out {
                Some(path) => std::fs::write(path, &bytes)?,
                None => std::io::stdout().write_all(&bytes)?,
            }
            Ok(())
        }
        Commands::File { video, out } => {
            let request = build_request(video.clone(), &cli.options, out.clone())?;
            let written = extractor.file(&request)?;
            println!("{}", written.display());
            Ok(())
        }
        Commands::Files { videos, out, json } => {
            let requests: Result<Vec<ThumbnailRequest>, ThumbgrabError> = videos
                .iter()
                .map(|video| build_request(video.clone(), &cli.options, out.clone()))
                .collect();
            let written = extractor.files(&requests?)?;

            if *json {
                let rendered: Vec<String> = written
                    .iter()
                    .map(|path| path.to_string_lossy().into_owned())
                    .collect();
                println!("{}", json!(rendered));
            } else {
                for path in &written {
                    println!("{}", path.display());
                }
            }
            Ok(())
        }
    }
}

fn build_request(
    video: String,
    options: &SharedOptions,
    out: Option<String>,
) -> Result<ThumbnailRequest, ThumbgrabError> {
    let mut request = ThumbnailRequest::new(video)
        .with_format(parse_format(&options.format)?)
        .with_max_width(options.max_width)
        .with_max_height(options.max_height)
        .with_time_ms(options.time_ms)
        .with_quality(options.quality)
        .with_headers(parse_headers(&options.headers)?);

    if let Some(path) = out {
        request = request.with_output_path(path);
    }
    Ok(request)
}

fn parse_format(name: &str) -> Result<ThumbnailFormat, ThumbgrabError> {
    match name.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Ok(ThumbnailFormat::Jpeg),
        "png" => Ok(ThumbnailFormat::Png),
        "webp" => Ok(ThumbnailFormat::Webp),
        other => Err(ThumbgrabError::MalformedCall {
            method: "cli".to_string(),
            reason: format!("unknown format `{other}` (expected jpg, png, or webp)"),
        }),
    }
}

fn parse_headers(raw: &[String]) -> Result<HashMap<String, String>, ThumbgrabError> {
    let mut headers = HashMap::new();
    for entry in raw {
        let (key, value) = entry.split_once(':').ok_or_else(|| {
            ThumbgrabError::MalformedCall {
                method: "cli".to_string(),
                reason: format!("header `{entry}` is not in `Key: Value` form"),
            }
        })?;
        headers.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(headers)
}
