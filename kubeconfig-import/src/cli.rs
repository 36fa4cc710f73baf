use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use log::{debug, info};
use tabular::{row, Table};

use rustkube::{kubeconfig_path, KubeConfig};

use crate::import::{self, Applied, ImportOptions};
use crate::kubectl::{DryRun, Kubectl};

#[derive(Parser, Debug)]
#[command(
    name = "kubeconfig-import",
    about = "Import clusters, users and contexts from another kubeconfig into the active one",
    disable_version_flag = true
)]
pub struct Cli {
    /// Path to the kubeconfig to import; read from stdin if not specified
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,
    /// Kubeconfig to import into; also passed on to every kubectl call
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,
    /// kubectl binary to run
    #[arg(long, env = "KUBECTL", default_value = "kubectl")]
    pub kubectl: PathBuf,
    /// Print the kubectl calls without running them
    #[arg(long)]
    pub dry_run: bool,
    /// Also keep a timestamped copy of the target kubeconfig next to it
    #[arg(long)]
    pub save_backup: bool,
    /// Log level: error, warn, info, debug
    #[arg(long, default_value = "info")]
    pub log_level: String,
    /// Print version information and exit
    #[arg(long)]
    pub version: bool,
}

fn init_logger(level_arg: &str) {
    let mut builder = env_logger::Builder::new();
    builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    builder.parse_filters(level_arg);
    let _ = builder.try_init();
}

fn print_version() {
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Revision: {}", env!("BUILD_REVISION"));
    println!("RustVersion: {}", env!("BUILD_RUST_VERSION"));
}

fn non_empty(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

fn read_source(file: Option<&Path>) -> Result<KubeConfig> {
    match file.filter(|f| *f != Path::new("-")) {
        Some(path) => {
            let data = fs::read(path)
                .with_context(|| format!("opening file: {}", path.display()))?;
            KubeConfig::from_slice(&data).context("loading config")
        }
        None => KubeConfig::from_reader(io::stdin().lock()).context("loading config"),
    }
}

fn print_summary(applied: &[Applied]) {
    if applied.is_empty() {
        println!("Nothing to import");
        return;
    }
    let mut table = Table::new("{:<}  {:<}");
    for entity in applied {
        table.add_row(row!(entity.kind, &entity.name));
    }
    println!("\nImported:");
    print!("{table}");
}

/// Parses the command line. `Ok(None)` means help was printed and there is nothing to do.
fn parse_args<I, T>(args: I) -> Result<Option<Cli>>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().context("printing help")?;
                Ok(None)
            }
            _ => Err(err).context("parsing flags"),
        },
    }
}

pub fn run() -> Result<()> {
    let cli = match parse_args(std::env::args_os())? {
        Some(cli) => cli,
        None => return Ok(()),
    };
    init_logger(&cli.log_level);

    if cli.version {
        print_version();
        return Ok(());
    }

    let options = ImportOptions {
        kubeconfig: non_empty(cli.kubeconfig),
        dry_run: cli.dry_run,
        save_backup: cli.save_backup,
    };

    let target = kubeconfig_path(options.kubeconfig.as_deref())
        .context("getting kubeconfig path")?;
    debug!("target kubeconfig: {}", target.display());

    let source = read_source(non_empty(cli.file).as_deref())?;
    info!(
        "importing {} clusters, {} users, {} contexts",
        source.clusters.len(),
        source.users.len(),
        source.contexts.len()
    );

    if options.dry_run {
        import::import(&source, &target, &options, &mut DryRun::new(cli.kubectl))?;
        return Ok(());
    }

    let applied = import::import(&source, &target, &options, &mut Kubectl::new(cli.kubectl))?;
    print_summary(&applied);
    Ok(())
}
