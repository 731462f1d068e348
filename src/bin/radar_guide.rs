use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::{error::Error, fs::File, io::Read, path::PathBuf, sync::Arc};
use uom::si::length::meter;
use waypoint_radar::{
    azimuth::Azimuth,
    config::Config,
    datum::Datum,
    direction::{Sector, relative_bearing},
    geo::{GeoPoint, format_distance},
    navigation::{Arrival, Navigator, Waypoint},
    skin::Skin,
    store::MemoryStore,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON file overriding the default configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print distance and direction from one point toward another.
    Guide {
        /// Current position as "lat,lon".
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: GeoPoint,

        /// Target position as "lat,lon".
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: GeoPoint,

        /// Datum both points are given in.
        #[arg(long, value_enum, default_value_t = DatumArg::Global)]
        datum: DatumArg,

        /// Device heading in degrees clockwise from north.
        #[arg(long)]
        heading: Option<f64>,

        /// Print as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Convert a point between datums.
    Convert {
        /// Point as "lat,lon".
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        point: GeoPoint,

        /// Datum the point is given in.
        #[arg(long, value_enum, default_value_t = DatumArg::Global)]
        from: DatumArg,
    },

    /// Print the effective configuration as JSON.
    Params,

    /// List the available radar skins.
    Skins,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DatumArg {
    Global,
    Shifted,
}

impl From<DatumArg> for Datum {
    fn from(arg: DatumArg) -> Self {
        match arg {
            DatumArg::Global => Datum::Global,
            DatumArg::Shifted => Datum::Shifted,
        }
    }
}

fn parse_point(s: &str) -> Result<GeoPoint, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\" but got \"{s}\""))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    GeoPoint::new(lat, lon).map_err(|e| e.to_string())
}

fn read_config(path: Option<&PathBuf>) -> Result<Config, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let mut file = File::open(path)?;
    let mut serialized = String::new();
    file.read_to_string(&mut serialized)?;
    log::info!("loaded configuration from {}", path.display());
    Ok(serde_json::from_str(&serialized)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = read_config(args.config.as_ref())?;

    match args.command {
        Command::Guide {
            from,
            to,
            datum,
            heading,
            json,
        } => {
            let datum = Datum::from(datum);
            let from = datum.convert(from, Datum::Global);
            let target = Waypoint::from_datum("target", to, datum);

            let mut navigator =
                Navigator::with_arrival_radius(MemoryStore::new(), config.arrival_radius());
            navigator.set_target(Arc::new(target));

            let (distance, bearing) = navigator
                .leg_from(&from)
                .ok_or("navigator lost its target")?;
            let relative = heading.map(|h| relative_bearing(bearing, Azimuth::from_degrees(h)));
            let sector = relative.map(Sector::from_relative);
            let arrived = navigator.check_arrival(&from) == Arrival::Finished;

            if json {
                let output = json!({
                    "distance_m": distance.get::<meter>(),
                    "bearing_deg": bearing.degrees(),
                    "relative_deg": relative.map(|r| r.degrees()),
                    "sector": sector.map(|s| s.name().to_owned()),
                    "arrived": arrived,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
                return Ok(());
            }

            println!("distance: {}", format_distance(distance));
            println!("bearing:  {bearing}");
            if let (Some(relative), Some(sector)) = (relative, sector) {
                println!("relative: {relative} ({sector})");
            }
            if arrived {
                println!("arrived");
            }
        }
        Command::Convert { point, from } => {
            let from = Datum::from(from);
            let to = match from {
                Datum::Global => Datum::Shifted,
                Datum::Shifted => Datum::Global,
            };
            let converted = from.convert(point, to);
            println!("{:.8},{:.8}", converted.latitude(), converted.longitude());
        }
        Command::Params => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Skins => {
            for skin in Skin::all() {
                let marker = match skin.name == config.skin().name {
                    true => "*",
                    false => " ",
                };
                println!("{marker} {skin}");
            }
        }
    }

    Ok(())
}
