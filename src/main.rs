// Identity document field and portrait extraction

use clap::Parser;
use identidoc::{
    models::ExtractionResult,
    sources::{ImageFileRenderer, OcrAnalysis},
    validation::OverflowPolicy,
    DocumentError, DocumentProcessor, ProcessorConfig,
};
use identidoc::processing::SkinToneDetector;
use log::{error, info, LevelFilter};
use std::path::PathBuf;
use std::process;

/// Extracts name, CPF, RG/ID number and the portrait photo from a Brazilian ID document.
#[derive(Parser, Debug)]
#[command(name = "identidoc")]
#[command(about = "Identity document field and portrait extraction")]
struct Args {
    /// OCR analysis JSON: {"text": ..., "key_value_pairs": {...}}, or an array of them per page
    #[arg(long)]
    ocr: PathBuf,

    /// Page raster, in page order (repeatable)
    #[arg(long = "page")]
    pages: Vec<PathBuf>,

    /// Image embedded in the document (repeatable)
    #[arg(long = "embedded")]
    embedded: Vec<PathBuf>,

    /// Scale at which the page rasters were produced (1.0 = 72 dpi)
    #[arg(long, default_value = "2.0")]
    page_scale: f32,

    /// Processor configuration override (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the selected photo
    #[arg(long)]
    photo_out: Option<PathBuf>,

    /// Reject tax ids with more than 11 digits instead of truncating them
    #[arg(long)]
    strict_tax_id: bool,

    /// Verbose logging and structured field dump
    #[arg(long)]
    debug: bool,
}

fn run(args: Args) -> Result<ExtractionResult, DocumentError> {
    let mut config = match &args.config {
        Some(path) => ProcessorConfig::from_file(path)?,
        None => ProcessorConfig::default(),
    };
    if args.strict_tax_id {
        config = config.with_overflow_policy(OverflowPolicy::Reject);
    }
    let processor = DocumentProcessor::new(config, Box::new(SkinToneDetector::new()))?;

    let analysis = OcrAnalysis::from_file(&args.ocr)?;
    let renderer = ImageFileRenderer::new(args.pages, args.embedded, args.page_scale);
    let document = processor.load_document(analysis, &renderer);

    if args.debug {
        eprintln!("Structured fields:");
        for (key, value) in &document.structured_fields {
            eprintln!("  {}: {}", key, value);
        }
    }

    let result = processor.process(document, &renderer)?;

    if let (Some(path), Some(photo)) = (&args.photo_out, &result.photo) {
        photo.as_rgb().save(path)?;
        info!("Photo written to {:?}", path);
    }
    Ok(result)
}

fn main() {
    let args = Args::parse();

    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(args) {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Could not serialize result: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Extraction failed: {}", e);
            process::exit(1);
        }
    }
}
