use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use pretext_to_asm::cli::Cli;
use pretext_to_asm::naming::{ChrNamerError, TaggingError};
use pretext_to_asm::output::OutputExistsError;
use pretext_to_asm::{InvocationError, RunConfig};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logfile = match setup_logging(&cli) {
        Ok(logfile) => logfile,
        Err(err) => {
            eprintln!("ERROR: {err}");
            return ExitCode::from(1);
        }
    };

    let config = RunConfig {
        assembly_file: cli.assembly.clone(),
        pretext_file: cli.pretext.clone(),
        output_file: cli.output.clone(),
        autosome_prefix: cli.autosome_prefix.clone(),
        clobber: cli.clobber(),
        max_contig_length: cli.max_contig_length(),
        allow_consecutive_autosomes: cli.allow_consecutive_autosomes,
    };

    if let Err(err) = pretext_to_asm::run(&config) {
        return report_error(&err);
    }

    if let Some(logfile) = logfile {
        eprintln!("  Log saved: '{}'", logfile.display());
    }
    ExitCode::SUCCESS
}

fn report_error(err: &anyhow::Error) -> ExitCode {
    if let Some(cne) = err.downcast_ref::<ChrNamerError>() {
        eprintln!("{}", cne.message);
        for table in &cne.tables {
            eprint!("{table}");
        }
        eprintln!("Error naming chromosomes");
        ExitCode::from(1)
    } else if let Some(te) = err.downcast_ref::<TaggingError>() {
        eprintln!("{te}");
        eprintln!("Error in Pretext tags");
        ExitCode::from(1)
    } else if let Some(oee) = err.downcast_ref::<OutputExistsError>() {
        eprintln!("ERROR: {oee}");
        ExitCode::from(1)
    } else if let Some(ie) = err.downcast_ref::<InvocationError>() {
        eprintln!("{ie}");
        ExitCode::from(2)
    } else {
        eprintln!("ERROR: {err:?}");
        ExitCode::from(1)
    }
}

/// Configure `env_logger` with plain messages. With a log file, messages
/// go into it and warnings are also echoed to stderr so they are seen
/// without opening the log.
fn setup_logging(cli: &Cli) -> Result<Option<PathBuf>> {
    let mut logfile = None;
    if cli.write_log() {
        if let Some(output) = &cli.output {
            logfile = Some(output.with_extension("log"));
        }
    }

    let mut builder = env_logger::Builder::new();
    builder.parse_filters(cli.log_filter());

    match &logfile {
        Some(path) => {
            if path.exists() && !cli.clobber() {
                anyhow::bail!("log file '{}' already exists", path.display());
            }
            let file = File::create(path)?;
            builder
                .format(|buf, record| {
                    if record.level() <= log::Level::Warn {
                        eprintln!("{}: {}", record.level(), record.args());
                    }
                    writeln!(buf, "{}", record.args())
                })
                .target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.format(|buf, record| writeln!(buf, "{}", record.args()));
        }
    }
    builder.init();

    Ok(logfile)
}
