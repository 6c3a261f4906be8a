use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use swf_extract::swf_data::TagRecord;
use swf_extract::{
    load_movie_with, load_options, Character, ColorTransform, DrawCommand, Drawable, ErrorFlags, ExtractOptions,
    Extractor, FileLoader, Rectangle,
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Movie to inspect
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// JSON file with extraction options
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Fault categories that abort, e.g. "OUT_OF_BOUNDS | CIRCULAR_REFERENCE"
    #[arg(long)]
    errors: Option<String>,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tag headers
    Tags,
    /// List defined characters
    Characters,
    /// List exported names
    Exports,
    /// Summarize the root timeline
    Timeline {
        /// Report the stage bounds instead of the content bounds
        #[arg(long)]
        display_bounds: bool,
    },
    /// Print the fill hashes of a shape
    Fills {
        id: u16,
        /// Color transform to apply first, as JSON: {"mult":[r,g,b,a],"add":[r,g,b,a]}
        #[arg(long)]
        transform: Option<String>,
    },
    /// Record the draw commands of a character, or of the root timeline
    Draw {
        id: Option<u16>,
        #[arg(long, default_value_t = 0)]
        frame: usize,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Serialize)]
struct CharacterSummary {
    id: u16,
    kind: &'static str,
    offset: Option<usize>,
    bounds: Rectangle,
    frames: usize,
}

#[derive(Serialize)]
struct FrameSummary {
    index: usize,
    label: Option<String>,
    bounds: Rectangle,
    objects: Vec<ObjectSummary>,
}

#[derive(Serialize)]
struct ObjectSummary {
    depth: u16,
    character_id: u16,
    kind: &'static str,
    name: Option<String>,
    bounds: Rectangle,
}

#[derive(Serialize)]
struct TimelineSummary {
    bounds: Rectangle,
    frames: usize,
    frames_recursive: usize,
    timeline: Vec<FrameSummary>,
}

#[derive(Serialize)]
struct FillSummary {
    role: &'static str,
    hash: String,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(cli.log_level.to_string().parse().unwrap())
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match cli.log_format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn options(cli: &Cli) -> Result<ExtractOptions> {
    let mut options = match &cli.config {
        Some(path) => load_options(&FileLoader, path)?,
        None => ExtractOptions::default(),
    };
    if let Some(errors) = &cli.errors {
        options.errors = serde_json::from_value::<ErrorFlags>(serde_json::Value::String(errors.clone()))
            .with_context(|| format!("invalid --errors value {errors:?}"))?;
    }
    Ok(options)
}

fn run(cli: Cli) -> Result<()> {
    let options = options(&cli)?;
    let (header, extractor) = load_movie_with(&FileLoader, &cli.file, options)?;
    info!("Movie: {:?}, version {}", cli.file, header.version);

    match cli.command {
        Command::Tags => {
            let records: Vec<TagRecord> = extractor.tags()?;
            print_json(&records)
        }
        Command::Characters => print_json(&characters(&extractor)?),
        Command::Exports => print_json(&*extractor.exported()?),
        Command::Timeline { display_bounds } => print_json(&timeline(&extractor, display_bounds)?),
        Command::Fills { id, transform } => {
            let transform = match transform {
                Some(json) => serde_json::from_str::<ColorTransform>(&json).context("invalid --transform value")?,
                None => ColorTransform::IDENTITY,
            };
            print_json(&fills(&extractor, id, &transform)?)
        }
        Command::Draw { id, frame } => {
            let mut commands: Vec<DrawCommand> = Vec::new();
            match id {
                Some(id) => extractor.character(id)?.draw(&mut commands, frame)?,
                None => extractor.timeline(false)?.draw(&mut commands, frame)?,
            }
            print_json(&commands)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn characters(extractor: &Extractor) -> Result<Vec<CharacterSummary>> {
    extractor
        .character_ids()?
        .into_iter()
        .map(|id| {
            let character = extractor.character(id)?;
            Ok(CharacterSummary {
                id,
                kind: character.kind(),
                offset: character.offset(),
                bounds: character.bounds()?,
                frames: character.frames_count(false)?,
            })
        })
        .collect()
}

fn timeline(extractor: &Extractor, display_bounds: bool) -> Result<TimelineSummary> {
    let timeline = extractor.timeline(display_bounds)?;
    let frames = timeline
        .frames()
        .iter()
        .map(|frame| FrameSummary {
            index: frame.index,
            label: frame.label.clone(),
            bounds: frame.bounds,
            objects: frame
                .objects
                .values()
                .map(|object| ObjectSummary {
                    depth: object.depth,
                    character_id: object.character_id,
                    kind: object.character.kind(),
                    name: object.name.clone(),
                    bounds: object.bounds,
                })
                .collect(),
        })
        .collect();
    Ok(TimelineSummary {
        bounds: timeline.bounds()?,
        frames: timeline.frames_count(false)?,
        frames_recursive: timeline.frames_count(true)?,
        timeline: frames,
    })
}

fn fills(extractor: &Extractor, id: u16, transform: &ColorTransform) -> Result<Vec<FillSummary>> {
    let Character::Shape(definition) = extractor.character(id)? else {
        bail!("character {id} is not a shape");
    };
    let shape = definition.transform_colors(transform)?.shape()?;
    let fills = shape.fills.iter().map(|fill| FillSummary {
        role: "fill",
        hash: fill.hash(),
    });
    let strokes = shape.strokes.iter().map(|stroke| FillSummary {
        role: "stroke",
        hash: stroke.fill.hash(),
    });
    Ok(fills.chain(strokes).collect())
}
