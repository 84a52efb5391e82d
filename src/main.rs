use anyhow::{bail, Context, Result};
use clap::Parser;
use convstat::analysis::ReferenceValues;
use convstat::cli::{Cli, Command, FileArgs, StudyArgs};
use convstat::config::StudyConfig;
use convstat::layout::Layout;
use convstat::output::{self, Axis, Report, ReportOptions};
use convstat::table::RawTable;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Decode a single statistics file named on the command line
fn run_file(args: &FileArgs, axis: Axis, options: &ReportOptions) -> Result<Vec<Report>> {
    if axis == Axis::Parameter && args.skip_parameters > 0 {
        bail!("--skip-parameters only applies to by-period");
    }
    let layout = Layout::new(args.parameters, args.periods, args.layout)?;
    let table = RawTable::from_file(&args.file)?;
    let label = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());

    let report = output::build_report(&label, &table, &layout, axis, args.index, &args.slice_options(), options)?;
    Ok(vec![report])
}

/// Decode every entry of a study description
fn run_study(args: &StudyArgs, cli: &Cli) -> Result<Vec<Report>> {
    let config = StudyConfig::from_file(&args.config)?;
    let options = cli.report_options(config.reference_values());

    config
        .entries
        .iter()
        .map(|entry| {
            let layout = entry.layout()?;
            let table = entry.load_table()?;
            output::build_report(
                &entry.label(),
                &table,
                &layout,
                args.by,
                args.index,
                &entry.slice_options(),
                &options,
            )
            .with_context(|| format!("Failed to decode study entry {}", entry.label()))
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let reports = match &args.command {
        Command::ByPeriod(file_args) => {
            run_file(file_args, Axis::Period, &args.report_options(ReferenceValues::default()))?
        }
        Command::ByParameter(file_args) => {
            run_file(file_args, Axis::Parameter, &args.report_options(ReferenceValues::default()))?
        }
        Command::Study(study_args) => run_study(study_args, &args)?,
    };

    print!("{}", output::render(&reports, args.format)?);

    Ok(())
}
