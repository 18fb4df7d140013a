use clap::{Parser, Subcommand};
use sempipe::loader::FileFetcher;
use sempipe::project::Project;
use sempipe::publish::{SystemRunner, TerminalPrompter};
use sempipe::render::{CommandTransformer, DescriptionRenderer};
use sempipe::{config, output};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sempipe")]
#[command(about = "Declarative publishing pipeline driven by a graph configuration")]
#[command(long_about = "\
Declarative publishing pipeline driven by a graph configuration

Resources, their representations and the hosted spaces they are published
to are described in Turtle. The build turns every resource into one file
per representation, plus type-maps and access-control files where content
negotiation by quality is needed.

Project structure:

  project/
  ├── sempipe.toml          # Tool settings (optional)
  ├── sempipeconf.n3        # Root configuration document
  ├── spaces.n3             # Imported with <> semp:confGraph <spaces.n3>
  ├── data.n3               # Declared with <./> semp:dataGraph <data.n3>
  └── build/                # Declared with <./> semp:buildDir <build/>

Run 'sempipe gen-config' to generate a documented sempipe.toml.")]
#[command(version)]
struct Cli {
    /// Project directory
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Directory for the persisted graph snapshot
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build every resource into the build directory
    Build,
    /// Print every configuration and data graph as N-Quads
    Dump,
    /// Load configuration and data without building
    Load,
    /// Print the build instructions (semp:buildVar, semp:build) of every resource
    Plan,
    /// Run the publish method of every hosted space
    Publish {
        /// Preset a publish variable instead of being asked for it
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
    /// Print a stock sempipe.toml with all options documented
    GenConfig,
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {s:?}")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            let settings = config::load_config(&cli.project)?;
            let project = open(&cli.project, &settings, cli.store.as_deref())?;
            output::print_load_report(&project);

            println!("==> Building into {}", project.spaces.build_dir());
            init_thread_pool(&settings.processing);
            let transformer = CommandTransformer::new(settings.transform.command.clone());
            let build_dir = project.spaces.build_dir().to_string();
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_build_event(&event, &build_dir) {
                        println!("{}", line);
                    }
                }
            });
            let summary = project.build(&DescriptionRenderer, &transformer, Some(tx));
            printer
                .join()
                .map_err(|_| "build output thread panicked")?;
            output::print_build_summary(&summary);
            project.close()?;
            if !summary.is_success() {
                return Err(format!("{} resource(s) failed to build", summary.failed.len()).into());
            }
        }
        Command::Dump => {
            let settings = config::load_config(&cli.project)?;
            let project = Project::open(&cli.project, &settings, cli.store.as_deref(), &FileFetcher)?;
            print!("{}", project.dump());
            project.close()?;
        }
        Command::Load => {
            let settings = config::load_config(&cli.project)?;
            let project = open(&cli.project, &settings, cli.store.as_deref())?;
            output::print_load_report(&project);
            project.close()?;
        }
        Command::Plan => {
            let settings = config::load_config(&cli.project)?;
            let project = Project::open(&cli.project, &settings, cli.store.as_deref(), &FileFetcher)?;
            output::print_plan(&project.plan()?);
            project.close()?;
        }
        Command::Publish { vars } => {
            let settings = config::load_config(&cli.project)?;
            let project = open(&cli.project, &settings, cli.store.as_deref())?;
            let mut variables: HashMap<String, String> = vars.into_iter().collect();
            println!("==> Publishing {}", project.uri);
            let outcomes = project.publish(&mut TerminalPrompter, &mut SystemRunner, &mut variables);
            output::print_publish_outcomes(&outcomes);
            project.close()?;
            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            if failed > 0 {
                return Err(format!("{failed} hosted space(s) failed to publish").into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn open(
    dir: &Path,
    settings: &config::PipelineConfig,
    store: Option<&Path>,
) -> Result<Project, Box<dyn std::error::Error>> {
    println!("==> Loading {}", dir.display());
    Ok(Project::open(dir, settings, store, &FileFetcher)?)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
