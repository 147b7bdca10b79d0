use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tesslook_core::pipeline::run_search_reported;
use tesslook_core::query::MastClient;
use tesslook_core::render::SvgBackend;

use super::{export_pngs, RunOptions};
use crate::progress::SpinnerReporter;
use crate::summary::{print_report, print_run_summary};

#[derive(Args)]
pub struct SearchArgs {
    /// Object name or catalog identifier, e.g. "TIC 261868510"
    pub identifier: String,

    #[command(flatten)]
    pub options: RunOptions,
}

pub fn run(args: &SearchArgs) -> Result<()> {
    let config = args.options.load_config()?;
    let label = config
        .target_label
        .clone()
        .unwrap_or_else(|| args.identifier.clone());
    print_run_summary("TESS Sector Search", &label, &config);

    let service = MastClient::new()?;
    let mut backend = SvgBackend::new(&config.output_dir);
    let spinner = Arc::new(SpinnerReporter::new()?);

    let report = run_search_reported(
        &args.identifier,
        &config,
        &service,
        &mut backend,
        spinner.clone(),
    );
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
