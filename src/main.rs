use std::error::Error;
use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use natal_core::{
    extract_birth_data, ChartDigest, ChartDocument, ChartEngine, ChartRequest, Fallback,
    NominatimResolver, Settings, SwissEphemeris, USAGE_PROMPT,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "natal", about = "Natal chart and transit calculator")]
struct Cli {
    /// TOML settings file (environment variables prefixed NATAL__ override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a natal chart from structured birth data
    Chart {
        /// Birth date, YYYY-MM-DD
        date: String,
        /// Birth time, HH:MM (24-hour)
        time: String,
        /// Birth place, e.g. "Austin, TX"
        city: String,
        #[arg(long)]
        house_system: Option<String>,
        /// tropical or sidereal
        #[arg(long)]
        zodiac_type: Option<String>,
        #[arg(long)]
        sidereal_mode: Option<String>,
        /// Also compute transits for this date (YYYY-MM-DD)
        #[arg(long)]
        transit_date: Option<String>,
        /// Transit time, HH:MM; defaults to the configured time
        #[arg(long, requires = "transit_date")]
        transit_time: Option<String>,
        /// Print a plain-text digest instead of JSON
        #[arg(long)]
        digest: bool,
    },
    /// Recover date, time and place from free text
    Extract {
        text: Vec<String>,
    },
    /// Handle a raw message: a birth_data JSON document or free text (stdin if omitted)
    Message {
        text: Option<String>,
        #[arg(long)]
        digest: bool,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "natal=info,natal_core=info".into());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

type Engine = ChartEngine<SwissEphemeris, Fallback<natal_core::Gazetteer, NominatimResolver>>;

fn engine(settings: &Settings) -> Result<Engine, Box<dyn Error>> {
    let ephemeris = SwissEphemeris::new(settings.ephemeris.path.as_deref())?;
    let locations = Fallback::new(settings.gazetteer(), NominatimResolver::new(&settings.geocoder)?);
    Ok(ChartEngine::new(ephemeris, locations).with_settings(settings))
}

fn print_document(document: &ChartDocument, digest: bool) -> Result<(), Box<dyn Error>> {
    if digest {
        print!("{}", ChartDigest::from_document(document));
    } else {
        println!("{}", serde_json::to_string_pretty(document)?);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load(cli.config.as_deref())?;
    settings.validate()?;

    match cli.command {
        Commands::Chart {
            date,
            time,
            city,
            house_system,
            zodiac_type,
            sidereal_mode,
            transit_date,
            transit_time,
            digest,
        } => {
            let request = ChartRequest {
                date,
                time,
                city,
                house_system,
                zodiac_type,
                sidereal_mode,
                transit_date,
                transit_time,
            };
            let document = engine(&settings)?.handle(&request)?;
            print_document(&document, digest)
        }
        Commands::Extract { text } => {
            match extract_birth_data(&text.join(" ")) {
                Some(birth) => println!("{}", serde_json::to_string_pretty(&birth)?),
                None => println!("{}", USAGE_PROMPT),
            }
            Ok(())
        }
        Commands::Message { text, digest } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            match ChartRequest::from_message(text.trim()) {
                Some(request) => {
                    let document = engine(&settings)?.handle(&request)?;
                    if digest {
                        print_document(&document, true)
                    } else {
                        println!("{}", serde_json::to_string_pretty(&document.envelope()?)?);
                        Ok(())
                    }
                }
                None => {
                    println!("{}", USAGE_PROMPT);
                    Ok(())
                }
            }
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "request failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
