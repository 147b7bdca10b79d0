use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::archive::{self, extraction_dir};
use crate::decode::decode;
use crate::error::Result;
use crate::query::{CutoutQueryClient, CutoutRequest, CutoutService, SectorFetch};
use crate::render::{self, RenderBackend, RenderSpec, TitleTemplate};
use crate::target::{resolve, ResolvedTarget, TargetSpec};

use super::config::PipelineConfig;
use super::types::{
    FrameSummary, ItemOutcome, ItemStatus, NoOpReporter, PipelineOutcome, PipelineReport,
    PipelineStage, ProgressReporter,
};

/// Direct mode: fetch a cutout for `target`, unpack it and render every frame.
pub fn run_direct(
    target: &TargetSpec,
    config: &PipelineConfig,
    service: &dyn CutoutService,
    backend: &mut dyn RenderBackend,
) -> Result<PipelineReport> {
    run_direct_reported(target, config, service, backend, Arc::new(NoOpReporter))
}

/// Direct mode with a thread-safe progress reporter.
///
/// Resolution and query failures end the run with `Err`. Extraction, decode
/// and render failures are recorded per item and the run continues.
pub fn run_direct_reported(
    target: &TargetSpec,
    config: &PipelineConfig,
    service: &dyn CutoutService,
    backend: &mut dyn RenderBackend,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineReport> {
    reporter.begin_stage(PipelineStage::Resolving, None);
    let resolved = resolve(target)?;
    reporter.finish_stage();
    let label = config
        .target_label
        .clone()
        .unwrap_or_else(|| resolved.to_string());

    reporter.begin_stage(PipelineStage::Querying, None);
    let client = CutoutQueryClient::new(service, &config.work_dir)
        .with_search_radius(config.search_radius_deg);
    let request = CutoutRequest {
        target: resolved,
        sector: config.sector,
        size: config.cutout_size,
    };
    let archives = client.query(&request, config.selection)?;
    reporter.finish_stage();

    if archives.is_empty() {
        info!(query_target = %label, "No data products found");
        return Ok(PipelineReport {
            target: label,
            outcome: PipelineOutcome::NoData,
        });
    }

    let size = config.cutout_size as usize;
    let mut items = Vec::new();
    for reference in &archives {
        let dir = extraction_dir(&config.work_dir, reference.sector);

        reporter.begin_stage(PipelineStage::Extracting, Some(1));
        let extracted = archive::extract(reference, &dir);
        reporter.finish_stage();

        let extracted = match extracted {
            Ok(set) => set,
            Err(e) => {
                warn!(sector = reference.sector, error = %e, "Archive extraction failed");
                items.push(ItemOutcome {
                    sector: reference.sector,
                    source: Some(reference.path.clone()),
                    status: ItemStatus::Failed {
                        stage: PipelineStage::Extracting,
                        error: e,
                    },
                });
                continue;
            }
        };

        if extracted.is_empty() {
            warn!(dir = %dir.display(), "No FITS files found in extracted archive");
            items.push(ItemOutcome {
                sector: reference.sector,
                source: Some(reference.path.clone()),
                status: ItemStatus::MissingFrameFiles { dir },
            });
            continue;
        }

        let title = TitleTemplate::parse(&fill_placeholders(
            &config.title.direct,
            reference.sector,
            &label,
        ));
        for file in &extracted.files {
            let name = figure_name(reference.sector, Some(file));
            items.push(process_frame(
                file,
                reference.sector,
                Some((size, size)),
                &title,
                name,
                config,
                backend,
                reporter.as_ref(),
            ));
        }
    }

    Ok(finish(label, items))
}

/// Search mode: render one frame for every sector covering `identifier`.
pub fn run_search(
    identifier: &str,
    config: &PipelineConfig,
    service: &dyn CutoutService,
    backend: &mut dyn RenderBackend,
) -> Result<PipelineReport> {
    run_search_reported(identifier, config, service, backend, Arc::new(NoOpReporter))
}

/// Search mode with a thread-safe progress reporter. Each sector is
/// processed independently; one failing sector does not stop the others.
pub fn run_search_reported(
    identifier: &str,
    config: &PipelineConfig,
    service: &dyn CutoutService,
    backend: &mut dyn RenderBackend,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineReport> {
    reporter.begin_stage(PipelineStage::Resolving, None);
    let name = match resolve(&TargetSpec::identifier(identifier))? {
        ResolvedTarget::Identifier(name) => name,
        other => other.to_string(),
    };
    reporter.finish_stage();
    let label = config.target_label.clone().unwrap_or_else(|| name.clone());

    reporter.begin_stage(PipelineStage::Querying, None);
    let client = CutoutQueryClient::new(service, &config.work_dir)
        .with_search_radius(config.search_radius_deg);
    let products = client.search_and_fetch(&name, config.cutout_size)?;
    reporter.finish_stage();

    if products.is_empty() {
        info!(query_target = %label, "No TESS data found");
        return Ok(PipelineReport {
            target: label,
            outcome: PipelineOutcome::NoData,
        });
    }

    let size = config.cutout_size as usize;
    let mut items = Vec::with_capacity(products.len());
    for product in products {
        let handle = match product.product {
            Ok(SectorFetch::Product(handle)) => handle,
            Ok(SectorFetch::NoFrameFiles { dir }) => {
                items.push(ItemOutcome {
                    sector: product.sector,
                    source: None,
                    status: ItemStatus::MissingFrameFiles { dir },
                });
                continue;
            }
            Err(e) => {
                items.push(ItemOutcome {
                    sector: product.sector,
                    source: None,
                    status: ItemStatus::Failed {
                        stage: PipelineStage::Fetching,
                        error: e,
                    },
                });
                continue;
            }
        };

        let title = TitleTemplate::parse(&fill_placeholders(
            &config.title.search,
            handle.sector,
            &label,
        ));
        items.push(process_frame(
            &handle.path,
            handle.sector,
            Some((size, size)),
            &title,
            figure_name(handle.sector, None),
            config,
            backend,
            reporter.as_ref(),
        ));
    }

    Ok(finish(label, items))
}

#[allow(clippy::too_many_arguments)]
fn process_frame(
    path: &Path,
    sector: u32,
    expected: Option<(usize, usize)>,
    title: &TitleTemplate,
    name: String,
    config: &PipelineConfig,
    backend: &mut dyn RenderBackend,
    reporter: &dyn ProgressReporter,
) -> ItemOutcome {
    let failed = |stage, error| ItemOutcome {
        sector,
        source: Some(path.to_path_buf()),
        status: ItemStatus::Failed { stage, error },
    };

    reporter.begin_stage(PipelineStage::Decoding, Some(1));
    let frame = decode(path, expected);
    reporter.finish_stage();
    let frame = match frame {
        Ok(frame) => frame,
        Err(e) => {
            warn!(sector, path = %path.display(), error = %e, "Decode failed");
            return failed(PipelineStage::Decoding, e);
        }
    };

    let summary = FrameSummary::from_frame(&frame);
    info!(
        sector,
        object = %summary.object,
        ra = %summary.ra,
        dec = %summary.dec,
        "Decoded frame"
    );

    let spec = RenderSpec {
        frame: &frame,
        title: title.clone(),
        name,
    };
    let rendered_title = spec.title.render(&frame.header);

    reporter.begin_stage(PipelineStage::Rendering, Some(1));
    let output = render::render(&spec, &config.figure, backend);
    reporter.advance(1);
    reporter.finish_stage();

    match output {
        Ok(output) => ItemOutcome {
            sector,
            source: Some(path.to_path_buf()),
            status: ItemStatus::Rendered {
                title: rendered_title,
                output,
                summary,
            },
        },
        Err(e) => {
            warn!(sector, error = %e, "Render failed");
            failed(PipelineStage::Rendering, e)
        }
    }
}

fn finish(label: String, items: Vec<ItemOutcome>) -> PipelineReport {
    let rendered = items.iter().filter(|i| i.is_rendered()).count();
    info!(query_target = %label, rendered, total = items.len(), "Pipeline complete");
    PipelineReport {
        target: label,
        outcome: PipelineOutcome::Completed(items),
    }
}

/// Substitute `{sector}` and `{target}`; braces in the label are escaped so
/// the result still parses as a title template.
fn fill_placeholders(template: &str, sector: u32, label: &str) -> String {
    let escaped = label.replace('{', "{{").replace('}', "}}");
    template
        .replace("{sector}", &sector.to_string())
        .replace("{target}", &escaped)
}

fn figure_name(sector: u32, file: Option<&Path>) -> String {
    match file.and_then(|f| f.file_stem()).map(|s| s.to_string_lossy()) {
        Some(stem) => format!("tess_sector{sector}_{stem}"),
        None => format!("tess_sector{sector}"),
    }
}
