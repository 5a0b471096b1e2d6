use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use kiln_build::{
    BuildError, Builder, CompileError, ExtensionClassifier, MemoryPathReader, PathReader,
};
use kiln_driver::FsPathReader;
use kiln_scan::{ScanCompiler, ScanOptions};

/// Extra load paths, appended after any `-I` flags
const LOAD_PATH_ENV: &str = "KILN_LOAD_PATH";

#[derive(Parser)]
#[command(
    name = "kiln",
    version,
    about = "Link a module and everything it requires into one file"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ResolveArgs {
    /// Directory to search for modules (repeatable, searched in order)
    #[arg(short = 'I', long = "load-path", value_name = "DIR")]
    load_paths: Vec<PathBuf>,

    /// Module already present at runtime; never compiled or emitted (repeatable)
    #[arg(short, long = "prerequire", value_name = "PATH")]
    prerequired: Vec<String>,

    /// Extension of modules passed through verbatim (repeatable)
    #[arg(long = "asset-ext", value_name = "EXT", default_values_t = vec!["js".to_string()])]
    asset_extensions: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Link a module with all of its requires
    Build {
        /// Logical path of the entry module
        entry: String,

        #[command(flatten)]
        resolve: ResolveArgs,

        /// Name of the runtime object in generated code
        #[arg(long, default_value = "Kiln")]
        runtime: String,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile a single file without linking its requires
    Compile {
        /// Input file
        input: PathBuf,

        /// Name of the runtime object in generated code
        #[arg(long, default_value = "Kiln")]
        runtime: String,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the modules a build would emit, dependencies first
    Deps {
        /// Logical path of the entry module
        entry: String,

        #[command(flatten)]
        resolve: ResolveArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Build {
            entry,
            resolve,
            runtime,
            output,
        } => build_command(&entry, resolve, runtime, output),
        Commands::Compile {
            input,
            runtime,
            output,
        } => compile_command(&input, runtime, output),
        Commands::Deps { entry, resolve } => deps_command(&entry, resolve),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_level.into()))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn make_builder(
    resolve: &ResolveArgs,
    options: ScanOptions,
) -> Builder<FsPathReader, ScanCompiler> {
    let mut load_paths = resolve.load_paths.clone();
    if let Some(extra) = std::env::var_os(LOAD_PATH_ENV) {
        load_paths.extend(std::env::split_paths(&extra));
    }
    if load_paths.is_empty() {
        load_paths.push(PathBuf::from("."));
    }

    let reader = FsPathReader::new(load_paths);
    let classifier = ExtensionClassifier::new(&resolve.asset_extensions);
    debug!(
        load_paths = ?reader.load_paths(),
        assets = ?classifier.extensions(),
        "module search setup"
    );

    Builder::new(reader, ScanCompiler::new(options)).with_classifier(classifier)
}

fn build_command(
    entry: &str,
    resolve: ResolveArgs,
    runtime: String,
    output: Option<PathBuf>,
) -> ExitCode {
    let builder = make_builder(&resolve, ScanOptions { runtime });

    let linked = match builder.build_linked(entry, resolve.prerequired.iter().cloned()) {
        Ok(linked) => linked,
        Err(e) => {
            report_build_error(&e, builder.reader());
            return ExitCode::FAILURE;
        }
    };

    info!(
        entry,
        fragments = linked.fragments.len(),
        compiled = linked.graph.module_count(),
        "linked"
    );
    for (i, fragment) in linked.fragments.iter().enumerate() {
        debug!("{}. {} ({})", i + 1, fragment.path, fragment.kind.as_str());
    }

    write_output(&linked.output(), output.as_deref())
}

fn compile_command(input: &Path, runtime: String, output: Option<PathBuf>) -> ExitCode {
    let source = match fs::read_to_string(input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    // build_from_string never reads, so the reader stays empty
    let builder = Builder::new(MemoryPathReader::new(), ScanCompiler::new(ScanOptions { runtime }));
    let file = input.display().to_string();

    match builder.build_from_string(&source, &file) {
        Ok(compiled) => write_output(&compiled, output.as_deref()),
        Err(BuildError::Compile(e)) => {
            report_compile_error(&e, &source);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn deps_command(entry: &str, resolve: ResolveArgs) -> ExitCode {
    let builder = make_builder(&resolve, ScanOptions::default());

    match builder.build_linked(entry, resolve.prerequired.iter().cloned()) {
        Ok(linked) => {
            for fragment in &linked.fragments {
                match linked.graph.requires_of(&fragment.path) {
                    Some(requires) if !requires.is_empty() => println!(
                        "{}\t{}\t{}",
                        fragment.kind.as_str(),
                        fragment.path,
                        requires.join(", ")
                    ),
                    _ => println!("{}\t{}", fragment.kind.as_str(), fragment.path),
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_build_error(&e, builder.reader());
            ExitCode::FAILURE
        }
    }
}

// Helper functions

fn write_output(text: &str, output: Option<&Path>) -> ExitCode {
    match output {
        Some(path) => match fs::write(path, text) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error writing {}: {}", path.display(), e);
                ExitCode::FAILURE
            }
        },
        None => {
            println!("{}", text);
            ExitCode::SUCCESS
        }
    }
}

fn report_build_error(err: &BuildError, reader: &impl PathReader) {
    match err {
        BuildError::Compile(e) => match reader.read(&e.file) {
            Ok(source) => report_compile_error(e, &source),
            Err(_) => eprintln!("Error: {}", e),
        },
        BuildError::Read(e) => eprintln!("Error: {}", e),
    }
}

fn report_compile_error(err: &CompileError, source: &str) {
    match &err.span {
        Some(span) => report_error(
            "E0001",
            "Compile error",
            &err.message,
            span.start,
            span.end,
            &err.file,
            source,
        ),
        None => eprintln!("Error: {}", err),
    }
}

fn report_error(
    code: &str,
    title: &str,
    message: &str,
    start: usize,
    end: usize,
    filename: &str,
    source: &str,
) {
    let span = (filename, start..end);
    let printed = Report::build(ReportKind::Error, span.clone())
        .with_code(code)
        .with_message(title)
        .with_label(
            Label::new(span)
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)));

    if printed.is_err() {
        eprintln!("Error: {}: {}", filename, message);
    }
}
