// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path;

use rasterfx::{DisplaceOptions, EmbossOptions, Image, Region};

macro_rules! timed {
    ($args:expr, $name:expr, $task:expr) => {
        if $args.perf {
            let now = std::time::Instant::now();
            let res = $task;
            println!("{}: {:.2}ms", $name, now.elapsed().as_micros() as f64 / 1000.0);
            res
        } else {
            $task
        }
    };
}

fn main() {
    if let Err(e) = process() {
        eprintln!("Error: {}.", e);
        std::process::exit(1);
    }
}

fn process() -> Result<(), String> {
    let args = match collect_args() {
        Ok(args) => args,
        Err(e) => {
            println!("{}", HELP);
            return Err(e);
        }
    };

    if !args.quiet {
        if let Ok(()) = log::set_logger(&LOGGER) {
            let level = if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
            log::set_max_level(level);
        }
    }

    let mut img = timed!(args, "Reading", load_image(&args.input))?;

    match args.filter {
        Filter::Displace { ref opt, ref map_x, ref map_y } => {
            let map_x = match map_x {
                Some(path) => Some(timed!(args, "Reading X map", load_image(path))?),
                None => None,
            };

            let map_y = match map_y {
                Some(path) => Some(timed!(args, "Reading Y map", load_image(path))?),
                None => None,
            };

            timed!(args, "Displacing",
                rasterfx::displace(&mut img, map_x.as_ref(), map_y.as_ref(), opt)
            ).map_err(|e| e.to_string())?;
        }
        Filter::Emboss { ref opt } => {
            timed!(args, "Embossing",
                rasterfx::emboss(&mut img, opt)
            ).map_err(|e| e.to_string())?;
        }
    }

    timed!(args, "Saving", img.save_png(&args.output)).map_err(|e| e.to_string())
}

fn load_image(path: &path::Path) -> Result<Image, String> {
    Image::from_file(path).map_err(|e| format!("failed to load {:?} cause {}", path, e))
}

const HELP: &str = "\
rasterfx applies displacement and emboss filters to raster images.

USAGE:
  rasterfx displace [OPTIONS] <in> <out-png>
  rasterfx emboss [OPTIONS] <in> <out-png>

  rasterfx displace --map-x map.png --map-y map.png in.png out.png
  rasterfx displace --no-y --amount-x 8 --map-x map.png in.jpg out.png
  rasterfx emboss --azimuth 135 --depth 3 in.png out.png

OPTIONS:
      --help                    Prints this help
  -V, --version                 Prints version

  --region X,Y,W,H              Processes only the selected rectangle
                                [default: whole image]

DISPLACE OPTIONS:
  --amount-x N                  Sets the horizontal displacement amount
                                [default: 20]
  --amount-y N                  Sets the vertical displacement amount
                                [default: 20]
  --no-x                        Disables the horizontal displacement
  --no-y                        Disables the vertical displacement
  --map-x PATH                  Sets the horizontal displacement map.
                                Required unless --no-x is set
  --map-y PATH                  Sets the vertical displacement map.
                                Required unless --no-y is set
  --edge MODE                   Selects how pixels outside the image are sampled
                                [default: wrap]
                                [possible values: wrap, smear, black]

EMBOSS OPTIONS:
  --azimuth DEG                 Sets the light azimuth
                                [default: 30] [possible values: 0..360]
  --elevation DEG               Sets the light elevation
                                [default: 45] [possible values: 0..180]
  --depth N                     Sets the surface depth
                                [default: 20] [possible values: 1..100]
  --mode MODE                   Selects the output mode
                                [default: emboss]
                                [possible values: bumpmap, emboss]

  --perf                        Prints performance stats
  --quiet                       Disables warnings
  --verbose                     Prints debug messages

ARGS:
  <in>                          Input PNG or JPEG file
  <out-png>                     Output file
";

enum Filter {
    Displace {
        opt: DisplaceOptions,
        map_x: Option<path::PathBuf>,
        map_y: Option<path::PathBuf>,
    },
    Emboss {
        opt: EmbossOptions,
    },
}

struct Args {
    filter: Filter,
    perf: bool,
    quiet: bool,
    verbose: bool,
    input: path::PathBuf,
    output: path::PathBuf,
}

fn collect_args() -> Result<Args, String> {
    let mut input = pico_args::Arguments::from_env();

    if input.contains("--help") {
        print!("{}", HELP);
        std::process::exit(0);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    let filter = match input.subcommand().map_err(|e| e.to_string())?.as_deref() {
        Some("displace") => collect_displace_args(&mut input),
        Some("emboss") => collect_emboss_args(&mut input),
        Some(name) => return Err(format!("unknown filter '{}'", name)),
        None => return Err("a filter must be set".to_string()),
    }.map_err(|e| e.to_string())?;

    let args = Args {
        filter,
        perf:       input.contains("--perf"),
        quiet:      input.contains("--quiet"),
        verbose:    input.contains("--verbose"),
        input:      input.free_from_str().map_err(|e| e.to_string())?,
        output:     input.free_from_str().map_err(|e| e.to_string())?,
    };

    let remaining = input.finish();
    if !remaining.is_empty() {
        return Err(format!("unexpected arguments: {:?}", remaining));
    }

    Ok(args)
}

fn collect_displace_args(input: &mut pico_args::Arguments) -> Result<Filter, pico_args::Error> {
    let mut opt = DisplaceOptions::default();
    let d = &mut opt.displacement;

    d.amount_x  = input.opt_value_from_str("--amount-x")?.unwrap_or(d.amount_x);
    d.amount_y  = input.opt_value_from_str("--amount-y")?.unwrap_or(d.amount_y);
    d.enable_x  = !input.contains("--no-x");
    d.enable_y  = !input.contains("--no-y");
    d.edge_mode = input.opt_value_from_str("--edge")?.unwrap_or_default();
    opt.region  = input.opt_value_from_fn("--region", parse_region)?;

    Ok(Filter::Displace {
        opt,
        map_x: input.opt_value_from_str("--map-x")?,
        map_y: input.opt_value_from_str("--map-y")?,
    })
}

fn collect_emboss_args(input: &mut pico_args::Arguments) -> Result<Filter, pico_args::Error> {
    let mut opt = EmbossOptions::default();
    let e = &mut opt.emboss;

    e.azimuth   = input.opt_value_from_fn("--azimuth", parse_azimuth)?.unwrap_or(e.azimuth);
    e.elevation = input.opt_value_from_fn("--elevation", parse_elevation)?.unwrap_or(e.elevation);
    e.depth     = input.opt_value_from_fn("--depth", parse_depth)?.unwrap_or(e.depth);
    e.mode      = input.opt_value_from_str("--mode")?.unwrap_or_default();
    opt.region  = input.opt_value_from_fn("--region", parse_region)?;

    Ok(Filter::Emboss { opt })
}

fn parse_angle(s: &str, max: f64) -> Result<f64, String> {
    let n: f64 = s.parse().map_err(|_| "invalid angle")?;

    if n >= 0.0 && n <= max {
        Ok(n)
    } else {
        Err("angle out of bounds".to_string())
    }
}

fn parse_azimuth(s: &str) -> Result<f64, String> {
    parse_angle(s, 360.0)
}

fn parse_elevation(s: &str) -> Result<f64, String> {
    parse_angle(s, 180.0)
}

fn parse_depth(s: &str) -> Result<u32, String> {
    let n: u32 = s.parse().map_err(|_| "invalid number")?;

    if (1..=100).contains(&n) {
        Ok(n)
    } else {
        Err("depth out of bounds".to_string())
    }
}

fn parse_region(s: &str) -> Result<Region, String> {
    let mut values = Vec::with_capacity(4);
    for n in s.split(',') {
        values.push(n.trim().parse::<u32>().map_err(|_| "invalid region")?);
    }

    match values.as_slice() {
        &[x, y, w, h] if w > 0 && h > 0 => Ok(Region::new(x, y, w, h)),
        &[_, _, _, _] => Err("region cannot be empty".to_string()),
        _ => Err("region must be set as X,Y,W,H".to_string()),
    }
}


/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let line = record.line().unwrap_or(0);

            match record.level() {
                log::Level::Error => eprintln!("Error (in {}:{}): {}", target, line, record.args()),
                log::Level::Warn  => eprintln!("Warning (in {}:{}): {}", target, line, record.args()),
                log::Level::Info  => eprintln!("Info (in {}:{}): {}", target, line, record.args()),
                log::Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, record.args()),
                log::Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, record.args()),
            }
        }
    }

    fn flush(&self) {}
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region() {
        assert_eq!(parse_region("1,2,3,4"), Ok(Region::new(1, 2, 3, 4)));
        assert_eq!(parse_region(" 0, 0, 10, 5 "), Ok(Region::new(0, 0, 10, 5)));
        assert!(parse_region("1,2,0,4").is_err());
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("1,2,3,4,5").is_err());
        assert!(parse_region("a,2,3,4").is_err());
        assert!(parse_region("-1,2,3,4").is_err());
    }

    #[test]
    fn ranges() {
        assert_eq!(parse_depth("1"), Ok(1));
        assert_eq!(parse_depth("100"), Ok(100));
        assert!(parse_depth("0").is_err());
        assert!(parse_depth("101").is_err());

        assert_eq!(parse_azimuth("360"), Ok(360.0));
        assert!(parse_azimuth("-1").is_err());
        assert_eq!(parse_elevation("0"), Ok(0.0));
        assert!(parse_elevation("180.5").is_err());
        assert!(parse_elevation("NaN").is_err());
    }
}
