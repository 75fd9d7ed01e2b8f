use anyhow::{Context, Result};
use batch_renamer_core::{
    app_paths, collect_changes, compile_search, load_config, replace, save_config, AppConfig,
    FileChange, FindOptions, ReplaceOptions, ReplacementChain, ScanOptions, SortCriterion,
    SystemProvider,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "batch-renamer")]
#[command(about = "Preview batch renames driven by find/replace chains and template variables")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[command(flatten)]
    rename: RenameArgs,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    /// Write the default config file if none exists yet.
    Init,
}

#[derive(Debug, Args)]
struct RenameArgs {
    /// Search pattern; repeat to build a chain.
    #[arg(short = 'f', long = "find")]
    find: Vec<String>,
    /// Replacement template; repeat to build a chain.
    #[arg(short = 'r', long = "replace")]
    replace: Vec<String>,
    /// 0 replaces all matches, N the first N, -N the last N.
    #[arg(short = 'l', long, allow_hyphen_values = true)]
    replace_limit: Option<i64>,
    #[arg(short = 'e', long = "ignore-ext")]
    ignore_ext: bool,
    #[arg(short = 'i', long)]
    ignore_case: bool,
    /// Treat find arguments as plain text.
    #[arg(short = 's', long)]
    string_mode: bool,
    #[arg(long, value_enum)]
    sort: Option<SortArg>,
    #[arg(long)]
    sort_reverse: bool,
    #[arg(short = 'R', long)]
    recursive: bool,
    #[arg(short = 'H', long)]
    hidden: bool,
    #[arg(short = 'd', long)]
    include_dir: bool,
    /// CSV file whose first column names a file; its columns feed `{csv.N}`.
    #[arg(long)]
    csv: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(short = 'V', long)]
    verbose: bool,
    #[arg(default_value = ".")]
    path: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Default,
    Natural,
    Size,
    Mtime,
    Btime,
    Atime,
    Ctime,
}

impl From<SortArg> for SortCriterion {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Default => Self::Default,
            SortArg::Natural => Self::Natural,
            SortArg::Size => Self::Size,
            SortArg::Mtime => Self::Mtime,
            SortArg::Btime => Self::Btime,
            SortArg::Atime => Self::Atime,
            SortArg::Ctime => Self::Ctime,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.rename.verbose);

    match cli.command {
        Some(Commands::Config(config)) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init => cmd_config_init(),
        },
        None => cmd_rename(cli.rename),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    if args.find.is_empty() && args.replace.is_empty() {
        anyhow::bail!("at least one --find or --replace argument is required");
    }

    let config = load_config()?;
    let options = build_options(&args, &config);

    let first_find = options
        .chain
        .links
        .first()
        .map(|link| link.find.as_str())
        .unwrap_or_default();
    let search = compile_search(first_find, options.find)?;

    let scan = ScanOptions {
        root: args.path.clone(),
        recursive: args.recursive || config.recursive,
        include_hidden: args.hidden || config.include_hidden,
        include_dirs: args.include_dir || config.include_dirs,
    };
    let changes = collect_changes(&scan, &search)?;

    let provider = build_provider(args.csv.as_deref())?;
    let changes = replace(&options, changes, &provider)
        .with_context(|| format!("failed to compute new names under {}", args.path.display()))?;

    match args.output {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&changes)?);
        }
        OutputFormat::Table => {
            print_table(&changes);
        }
    }

    Ok(())
}

fn build_provider(csv: Option<&Path>) -> Result<SystemProvider> {
    let provider = SystemProvider::new();
    match csv {
        Some(path) => provider
            .with_csv_file(path)
            .with_context(|| format!("failed to load --csv rows from {}", path.display())),
        None => Ok(provider),
    }
}

fn build_options(args: &RenameArgs, config: &AppConfig) -> ReplaceOptions {
    ReplaceOptions {
        chain: ReplacementChain::from_pairs(&args.find, &args.replace),
        find: FindOptions {
            ignore_case: args.ignore_case || config.ignore_case,
            literal: args.string_mode,
        },
        replace_limit: args.replace_limit.unwrap_or(config.replace_limit),
        ignore_extension: args.ignore_ext || config.ignore_extension,
        sort: args.sort.map(SortCriterion::from).or(config.sort),
        reverse_sort: args.sort_reverse || config.reverse_sort,
    }
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("config file: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let paths = app_paths()?;
    if paths.config_path.exists() {
        println!("config file already exists: {}", paths.config_path.display());
        return Ok(());
    }
    save_config(&AppConfig::default())?;
    println!("wrote default config: {}", paths.config_path.display());
    Ok(())
}

fn print_table(changes: &[FileChange]) {
    println!("source -> target");
    let mut renamed = 0usize;
    for change in changes {
        if change.changed() {
            renamed += 1;
        }
        println!(
            "{} -> {}",
            change.source_path().display(),
            change.rel_target_path.display()
        );
    }

    println!(
        "\nsummary: matched={} renamed={} unchanged={}",
        changes.len(),
        renamed,
        changes.len() - renamed
    );
    eprintln!("dry run: no files were renamed.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("parse args")
    }

    #[test]
    fn repeated_find_and_replace_build_a_chain() {
        let cli = parse(&["batch-renamer", "-f", "a", "-r", "b", "-r", "c", "photos"]);
        assert!(cli.command.is_none());
        let options = build_options(&cli.rename, &AppConfig::default());
        assert_eq!(options.chain.len(), 2);
        assert_eq!(options.chain.links[1].find, "a");
        assert_eq!(cli.rename.path, PathBuf::from("photos"));
    }

    #[test]
    fn flags_override_config_defaults() {
        let config = AppConfig {
            replace_limit: 2,
            sort: Some(SortCriterion::Size),
            ignore_extension: true,
            ..AppConfig::default()
        };

        let cli = parse(&["batch-renamer", "-f", "x", "-l", "-1", "--sort", "natural"]);
        let options = build_options(&cli.rename, &config);
        assert_eq!(options.replace_limit, -1);
        assert_eq!(options.sort, Some(SortCriterion::Natural));
        assert!(options.ignore_extension);

        let cli = parse(&["batch-renamer", "-f", "x"]);
        let options = build_options(&cli.rename, &config);
        assert_eq!(options.replace_limit, 2);
        assert_eq!(options.sort, Some(SortCriterion::Size));
    }

    #[test]
    fn csv_rows_feed_csv_variables() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        std::fs::write(root.join("img1.jpg"), b"1").expect("write img1");
        std::fs::write(root.join("img2.jpg"), b"2").expect("write img2");
        let csv_path = root.join("names.csv");
        std::fs::write(&csv_path, "img1.jpg,Beach\nimg2.jpg,Forest\n").expect("write csv");

        let root_arg = root.to_string_lossy().into_owned();
        let csv_arg = csv_path.to_string_lossy().into_owned();
        let cli = parse(&[
            "batch-renamer",
            "-f",
            "img",
            "-r",
            "{csv.2}_",
            "--csv",
            &csv_arg,
            &root_arg,
        ]);
        let options = build_options(&cli.rename, &AppConfig::default());
        let provider = build_provider(cli.rename.csv.as_deref()).expect("provider");
        let search = compile_search("img", options.find).expect("search");
        let scan = ScanOptions {
            root: cli.rename.path.clone(),
            ..ScanOptions::default()
        };
        let changes = collect_changes(&scan, &search).expect("scan");
        let changes = replace(&options, changes, &provider).expect("replace");

        let targets: Vec<&str> = changes.iter().map(|c| c.target.as_str()).collect();
        assert_eq!(targets, vec!["Beach_1.jpg", "Forest_2.jpg"]);
    }

    #[test]
    fn missing_csv_file_is_reported() {
        let err = build_provider(Some(Path::new("/nonexistent/rows.csv")))
            .err()
            .expect("must fail");
        assert!(format!("{err:#}").contains("--csv"));
    }

    #[test]
    fn config_subcommand_parses() {
        let cli = parse(&["batch-renamer", "config", "init"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Config(ConfigArgs {
                action: ConfigAction::Init
            }))
        ));
    }
}
