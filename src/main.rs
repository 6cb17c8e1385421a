use std::path::PathBuf;

use clap::{AppSettings, Parser};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{debug, info};

use swap_polarizations::{correct_cube, ms::MsUpdater, SwapPolError, HUNDRED_HOUR_RUN};

#[derive(Parser)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_long_args = true)]
struct Args {
    /// The measurement set to be fixed in place.
    ms: PathBuf,

    /// Read and classify, but don't write the corrected data back.
    #[clap(long)]
    dry_run: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    verbosity: u8,

    /// Disable progress bars.
    #[clap(long)]
    no_progress_bars: bool,
}

fn main() {
    let args = Args::parse();
    setup_logging(args.verbosity);

    if let Err(e) = try_main(args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn try_main(args: Args) -> Result<(), SwapPolError> {
    let mut updater = MsUpdater::open(&args.ms)?;
    let num_baselines = updater.num_baselines();
    info!("{}: {num_baselines} baselines", args.ms.display());
    info!(
        "{} of the antennas in the swap table are marked swapped",
        HUNDRED_HOUR_RUN.num_swapped()
    );

    let multi_progress = MultiProgress::with_draw_target(if args.no_progress_bars {
        ProgressDrawTarget::hidden()
    } else {
        ProgressDrawTarget::stdout()
    });
    let read_progress = multi_progress.add(baseline_bar(num_baselines, "Reading"));
    let correct_progress = multi_progress.add(baseline_bar(num_baselines, "Correcting"));
    let write_progress = multi_progress.add(baseline_bar(num_baselines, "Writing"));

    let (antenna1, antenna2) = updater.antenna_pairs()?;
    let mut data = updater.read_data(Some(&read_progress))?;
    debug!("Visibility cube shape: {:?}", data.dim());

    correct_cube(
        &mut data,
        &antenna1,
        &antenna2,
        &HUNDRED_HOUR_RUN,
        Some(&correct_progress),
    )?;

    if args.dry_run {
        info!("Dry run; not writing the corrected data back");
        return Ok(());
    }
    updater.write_data(data.view(), Some(&write_progress))?;
    info!("Corrected data written to {}", args.ms.display());

    Ok(())
}

fn baseline_bar(num_baselines: usize, msg: &'static str) -> ProgressBar {
    ProgressBar::new(num_baselines as _)
        .with_style(
            ProgressStyle::default_bar()
                .template("{msg:10}: [{wide_bar:.blue}] {pos:6}/{len:6} baselines ({elapsed_precise}<{eta_precise})")
                .unwrap()
                .progress_chars("=> "),
        )
        .with_position(0)
        .with_message(msg)
}

fn setup_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Stdout);
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                use std::io::Write;

                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.init();
}
