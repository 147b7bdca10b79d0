use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tesslook_core::pipeline::run_direct_reported;
use tesslook_core::query::MastClient;
use tesslook_core::render::SvgBackend;
use tesslook_core::target::{CoordinateFrame, TargetSpec};

use super::{export_pngs, RunOptions, SelectArg};
use crate::progress::SpinnerReporter;
use crate::summary::{print_report, print_run_summary};

#[derive(Args)]
pub struct CutoutArgs {
    /// Right ascension in degrees (or galactic longitude with --frame galactic)
    #[arg(long, allow_hyphen_values = true)]
    pub ra: f64,

    /// Declination in degrees (or galactic latitude with --frame galactic)
    #[arg(long, allow_hyphen_values = true)]
    pub dec: f64,

    /// Reference frame of the coordinates (icrs, fk5, galactic)
    #[arg(long, default_value = "icrs")]
    pub frame: CoordinateFrame,

    /// Only this sector
    #[arg(long)]
    pub sector: Option<u32>,

    /// Which covering sectors to download
    #[arg(long, value_enum)]
    pub select: Option<SelectArg>,

    #[command(flatten)]
    pub options: RunOptions,
}

pub fn run(args: &CutoutArgs) -> Result<()> {
    let mut config = args.options.load_config()?;
    if args.sector.is_some() {
        config.sector = args.sector;
    }
    if let Some(select) = args.select {
        config.selection = select.into();
    }

    let target = TargetSpec::SkyPosition {
        ra: args.ra,
        dec: args.dec,
        frame: args.frame,
    };
    let label = config
        .target_label
        .clone()
        .unwrap_or_else(|| format!("RA {:.4} Dec {:+.4} ({})", args.ra, args.dec, args.frame));
    print_run_summary("TESS FFI Cutout", &label, &config);

    let service = MastClient::new()?;
    let mut backend = SvgBackend::new(&config.output_dir);
    let spinner = Arc::new(SpinnerReporter::new()?);

    let report = run_direct_reported(&target, &config, &service, &mut backend, spinner.clone());
    spinner.finish();
    let report = report?;

    let pngs = if args.options.export_png {
        export_pngs(&report, &config.output_dir)
    } else {
        Vec::new()
    };
    print_report(&report, &pngs);
    Ok(())
}
