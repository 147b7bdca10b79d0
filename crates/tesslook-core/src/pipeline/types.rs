use std::fmt;
use std::path::PathBuf;

use crate::error::TessError;
use crate::frame::DecodedFrame;

/// Pipeline processing stage, used for progress reporting and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Resolving,
    Querying,
    Fetching,
    Extracting,
    Decoding,
    Rendering,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolving => write!(f, "Resolving target"),
            Self::Querying => write!(f, "Querying archive"),
            Self::Fetching => write!(f, "Fetching sector"),
            Self::Extracting => write!(f, "Extracting archive"),
            Self::Decoding => write!(f, "Decoding frame"),
            Self::Rendering => write!(f, "Rendering"),
        }
    }
}

/// Header fields printed alongside a rendered frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSummary {
    pub object: String,
    pub ra: String,
    pub dec: String,
    pub width: usize,
    pub height: usize,
}

impl FrameSummary {
    pub fn from_frame(frame: &DecodedFrame) -> Self {
        Self {
            object: frame.header.get_or("OBJECT", "Unknown"),
            ra: frame.header.get_or("RA_TARG", "N/A"),
            dec: frame.header.get_or("DEC_TARG", "N/A"),
            width: frame.width(),
            height: frame.height(),
        }
    }
}

/// Terminal state of one archive, file or sector.
#[derive(Debug)]
pub enum ItemStatus {
    Rendered {
        title: String,
        output: Option<PathBuf>,
        summary: FrameSummary,
    },
    /// Extraction succeeded but produced no FITS files.
    MissingFrameFiles { dir: PathBuf },
    Failed {
        stage: PipelineStage,
        error: TessError,
    },
}

#[derive(Debug)]
pub struct ItemOutcome {
    pub sector: u32,
    /// Archive or FITS file the outcome refers to.
    pub source: Option<PathBuf>,
    pub status: ItemStatus,
}

impl ItemOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self.status, ItemStatus::Rendered { .. })
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            ItemStatus::Rendered { title, output, .. } => {
                write!(f, "Sector {}: rendered \"{}\"", self.sector, title.replace('\n', " / "))?;
                if let Some(path) = output {
                    write!(f, " -> {}", path.display())?;
                }
                Ok(())
            }
            ItemStatus::MissingFrameFiles { dir } => write!(
                f,
                "Sector {}: no FITS files found in {}",
                self.sector,
                dir.display()
            ),
            ItemStatus::Failed { stage, error } => {
                write!(f, "Sector {}: {stage} failed: {error}", self.sector)
            }
        }
    }
}

#[derive(Debug)]
pub enum PipelineOutcome {
    /// The service has no data for the target.
    NoData,
    Completed(Vec<ItemOutcome>),
}

/// Everything a run produced for one target.
#[derive(Debug)]
pub struct PipelineReport {
    /// Display name of the target.
    pub target: String,
    pub outcome: PipelineOutcome,
}

impl PipelineReport {
    pub fn is_no_data(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::NoData)
    }

    pub fn items(&self) -> &[ItemOutcome] {
        match &self.outcome {
            PipelineOutcome::NoData => &[],
            PipelineOutcome::Completed(items) => items,
        }
    }

    pub fn rendered_count(&self) -> usize {
        self.items().iter().filter(|i| i.is_rendered()).count()
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            PipelineOutcome::NoData => write!(f, "No TESS data found for {}", self.target),
            PipelineOutcome::Completed(items) => write!(
                f,
                "{}: {} of {} frame(s) rendered",
                self.target,
                self.rendered_count(),
                items.len()
            ),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive spinners, logging, or any other UI
/// feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., sector count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when the unreported entry points delegate.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
