use std::path::PathBuf;

use console::Style;
use tesslook_core::pipeline::{ItemStatus, PipelineConfig, PipelineReport};

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    ok: Style,
    failed: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            ok: Style::new().green(),
            failed: Style::new().red(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_run_summary(heading: &str, target: &str, config: &PipelineConfig) {
    let s = Styles::new();
    let rule = "\u{2550}".repeat(heading.chars().count());

    println!();
    println!("  {}", s.title.apply_to(heading));
    println!("  {}", s.title.apply_to(rule));
    println!();

    println!("  {:<14}{}", s.label.apply_to("Target"), s.value.apply_to(target));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Size"),
        s.value.apply_to(format!("{0}x{0} px", config.cutout_size))
    );
    match config.sector {
        Some(sector) => println!("  {:<14}{}", s.label.apply_to("Sector"), s.value.apply_to(sector)),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Sector"),
            s.disabled.apply_to("any")
        ),
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Selection"),
        s.value.apply_to(config.selection)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Work dir"),
        s.path.apply_to(config.work_dir.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output_dir.display())
    );
    println!();
}

pub fn print_report(report: &PipelineReport, pngs: &[PathBuf]) {
    let s = Styles::new();

    if report.is_no_data() {
        println!("  {}", s.disabled.apply_to(report));
        println!();
        return;
    }

    println!("  {}", s.header.apply_to("Results"));
    for item in report.items() {
        match &item.status {
            ItemStatus::Rendered {
                title,
                output,
                summary,
            } => {
                println!(
                    "    {} {}",
                    s.ok.apply_to(format!("Sector {}", item.sector)),
                    s.value.apply_to(title.replace('\n', " / "))
                );
                if let Some(ref source) = item.source {
                    println!(
                        "      {:<12}{}",
                        s.label.apply_to("File"),
                        s.path.apply_to(source.display())
                    );
                }
                println!(
                    "      {:<12}{}",
                    s.label.apply_to("Target"),
                    s.value.apply_to(&summary.object)
                );
                println!(
                    "      {:<12}{}",
                    s.label.apply_to("RA/Dec"),
                    s.value.apply_to(format!("{}, {}", summary.ra, summary.dec))
                );
                println!(
                    "      {:<12}{}",
                    s.label.apply_to("Frame"),
                    s.value.apply_to(format!("{}x{}", summary.width, summary.height))
                );
                if let Some(path) = output {
                    println!(
                        "      {:<12}{}",
                        s.label.apply_to("Figure"),
                        s.path.apply_to(path.display())
                    );
                }
            }
            ItemStatus::MissingFrameFiles { .. } | ItemStatus::Failed { .. } => {
                println!("    {}", s.failed.apply_to(item));
            }
        }
    }

    if !pngs.is_empty() {
        println!();
        println!("  {}", s.header.apply_to("PNG export"));
        for path in pngs {
            println!("    {}", s.path.apply_to(path.display()));
        }
    }

    println!();
    println!("  {}", s.title.apply_to(report));
    println!();
}
