use std::io::Write;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use rnalayout_core::booquet::BooquetOptions;
use rnalayout_core::svg::{self, SvgOptions};
use rnalayout_core::theme::Theme;
use rnalayout_core::viewport::WorkingSession;
use rnalayout_core::{Drawing, LayoutOptions, SecondaryStructure};

#[derive(Clone, Copy, clap::ValueEnum)]
enum Format {
    Svg,
    Booquet,
    Json,
}

/// RNA secondary structure 2D layout and rendering
#[derive(Parser)]
#[command(name = "rnalayout", version)]
struct Cli {
    /// Dot-bracket structure notation, pseudoknots as [], {} or <>
    #[arg(short, long)]
    structure: String,

    /// RNA sequence (e.g. GGGAAACCC)
    #[arg(short = 'q', long)]
    sequence: String,

    /// Molecule name used in the output
    #[arg(short, long, default_value = "rna")]
    name: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Svg)]
    format: Format,

    /// Theme file (JSON mapping element kinds to style parameters)
    #[arg(short, long)]
    theme: Option<PathBuf>,

    /// Document width in pixels
    #[arg(long, default_value_t = 1024.0)]
    width: f64,

    /// Document height in pixels
    #[arg(long, default_value_t = 768.0)]
    height: f64,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let ss = SecondaryStructure::from_bracket_notation(&cli.name, &cli.sequence, &cli.structure)?;

    if let Format::Booquet = cli.format {
        let opts = BooquetOptions {
            width: cli.width,
            height: cli.height,
            ..BooquetOptions::default()
        };
        return Ok(rnalayout_core::booquet::booquet(&ss, &opts));
    }

    let mut drawing = Drawing::new(ss, &LayoutOptions::default())?;
    if let Some(path) = &cli.theme {
        let content = std::fs::read_to_string(path)?;
        let theme: Theme = serde_json::from_str(&content)?;
        theme.validate()?;
        drawing.apply_theme(&theme);
    }

    match cli.format {
        Format::Svg => {
            let opts = SvgOptions {
                width: cli.width,
                height: cli.height,
                ..SvgOptions::default()
            };
            Ok(svg::render(&drawing, &WorkingSession::default(), &opts))
        }
        Format::Json => Ok(serde_json::to_string_pretty(&svg::export(&drawing))?),
        Format::Booquet => unreachable!(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let output = match run(&cli) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if let Some(path) = cli.output {
        if let Err(e) = std::fs::write(&path, &output) {
            eprintln!("error: failed to write {}: {e}", path.display());
            process::exit(1);
        }
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        if let Err(e) = handle.write_all(output.as_bytes()) {
            eprintln!("error: write failed: {e}");
            process::exit(1);
        }
    }
}
