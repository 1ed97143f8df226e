//! CLI definition, prompt item assembly, and tracing setup.

use std::io::{Read, Write};
use std::path::PathBuf;

use clap::{ArgMatches, Parser};
use color_eyre::eyre::{Result, eyre};
use tracing::info;

use ctxkit_core::{Variables, process_config};
use ctxkit_fetch::TextFetcher;
use ctxkit_grok::GrokClient;
use ctxkit_shared::{
    BaseDir, CONFIG_SCHEMA_DOC, Config, CtxKitError, DirItem, Item, Settings, VarItem,
    init_settings, load_settings, load_settings_from, resolve_api_key, settings_dir,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ctxkit: build an LLM prompt from messages, files, directories, and URLs.
///
/// Items are emitted in command-line order, separated by a blank line.
#[derive(Parser)]
#[command(
    name = "ctxkit",
    version,
    about = "Build an LLM prompt from messages, files, directories, and URLs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Display the JSON configuration file format.
    #[arg(short = 'g', long)]
    pub config_help: bool,

    /// Process the JSON configuration file path or URL.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    pub configs: Vec<String>,

    /// Add a prompt message.
    #[arg(short = 'm', long = "message", value_name = "TEXT")]
    pub messages: Vec<String>,

    /// Add the file path or URL text.
    #[arg(short = 'i', long = "include", value_name = "PATH")]
    pub includes: Vec<String>,

    /// Add the file path or URL as a text file.
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub files: Vec<String>,

    /// Add a directory's text files.
    #[arg(short = 'd', long = "dir", value_name = "PATH")]
    pub dirs: Vec<String>,

    /// Add a directory text file extension.
    #[arg(short = 'x', long = "ext", value_name = "EXT")]
    pub exts: Vec<String>,

    /// The maximum directory depth, default is 0 (infinite).
    #[arg(short = 'l', long, value_name = "N", default_value_t = 0)]
    pub depth: u32,

    /// Define a variable (reference with "{{var}}").
    #[arg(short = 'v', long = "var", num_args = 2, value_names = ["VAR", "EXPR"])]
    pub vars: Vec<String>,

    /// Pass stdin to the Grok API using MODEL.
    #[arg(long, value_name = "MODEL")]
    pub grok: Option<String>,

    /// The LLM temperature (defaults to the settings value, 0.7).
    #[arg(long, value_name = "TEMP")]
    pub temp: Option<f64>,

    /// Settings file path (defaults to ~/.ctxkit/ctxkit.toml).
    #[arg(long, value_name = "PATH", env = "CTXKIT_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Write a default settings file and print its path.
    #[arg(long)]
    pub init_settings: bool,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text")]
    pub log_format: LogFormat,

    /// Log verbosity (--verbose, --verbose --verbose).
    #[arg(long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Crates whose events the CLI filter enables.
const LOG_TARGETS: [&str; 5] = [
    "ctxkit",
    "ctxkit_core",
    "ctxkit_fetch",
    "ctxkit_grok",
    "ctxkit_shared",
];

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = LOG_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI.
pub(crate) fn run(cli: &Cli, matches: &ArgMatches) -> Result<()> {
    if cli.init_settings {
        return cmd_init_settings();
    }

    if cli.config_help {
        println!("{CONFIG_SCHEMA_DOC}");
        return Ok(());
    }

    if let Some(model) = &cli.grok {
        return cmd_grok(&cli_settings(cli)?, model, cli.temp);
    }

    let items = prompt_items(cli, matches);
    if items.is_empty() {
        return Err(eyre!("no prompt items specified"));
    }

    cmd_prompt(&cli_settings(cli)?, items)
}

/// Settings from `--settings`, or the default settings file.
fn cli_settings(cli: &Cli) -> Result<Settings> {
    let settings = match &cli.settings {
        Some(path) => load_settings_from(path)?,
        None => load_settings()?,
    };
    Ok(settings)
}

fn cmd_init_settings() -> Result<()> {
    let path = init_settings(&settings_dir()?)?;
    println!("Settings initialized at: {}", path.display());
    Ok(())
}

fn cmd_prompt(settings: &Settings, items: Vec<Item>) -> Result<()> {
    info!(items = items.len(), "assembling prompt");

    let fetcher = TextFetcher::new(&settings.http)?;
    let prompt = process_config(
        Config { items },
        &mut Variables::new(),
        BaseDir::default(),
        &fetcher,
    )?;

    println!("{prompt}");
    Ok(())
}

fn cmd_grok(settings: &Settings, model: &str, temp: Option<f64>) -> Result<()> {
    let api_key = resolve_api_key(&settings.grok)?;
    let temperature = temp.unwrap_or(settings.grok.temperature);

    let mut prompt = String::new();
    std::io::stdin().read_to_string(&mut prompt)?;

    let client = GrokClient::new(&settings.http, &settings.grok.url, api_key)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    client.chat(model, &prompt, temperature, &mut |chunk| {
        out.write_all(chunk.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| CtxKitError::io("<stdout>", e))
    })?;
    writeln!(out)?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Prompt items
// ---------------------------------------------------------------------------

/// Build the prompt items in the order their flags appeared.
///
/// Every `--dir` uses the `--ext` and `--depth` values, wherever they appear.
fn prompt_items(cli: &Cli, matches: &ArgMatches) -> Vec<Item> {
    let mut indexed: Vec<(usize, Item)> = Vec::new();

    let mut add = |id: &str, values: &[String], make: &dyn Fn(&str) -> Item| {
        let indices = matches.indices_of(id).into_iter().flatten();
        indexed.extend(indices.zip(values).map(|(ix, value)| (ix, make(value))));
    };

    add("configs", &cli.configs, &|v| Item::Config(v.into()));
    add("messages", &cli.messages, &|v| Item::Message(v.into()));
    add("includes", &cli.includes, &|v| Item::Include(v.into()));
    add("files", &cli.files, &|v| Item::File(v.into()));
    add("dirs", &cli.dirs, &|v| {
        Item::Dir(DirItem {
            path: v.into(),
            exts: cli.exts.clone(),
            depth: cli.depth,
        })
    });

    // `--var NAME VALUE` records one index per value; keep the first of each pair.
    let var_indices = matches.indices_of("vars").into_iter().flatten().step_by(2);
    indexed.extend(var_indices.zip(cli.vars.chunks_exact(2)).map(|(ix, pair)| {
        (
            ix,
            Item::Var(VarItem {
                name: pair[0].clone(),
                value: pair[1].clone(),
            }),
        )
    }));

    indexed.sort_by_key(|(ix, _)| *ix);
    indexed.into_iter().map(|(_, item)| item).collect()
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, FromArgMatches};

    use super::*;

    fn items_for(args: &[&str]) -> Vec<Item> {
        let matches = Cli::command()
            .try_get_matches_from(std::iter::once("ctxkit").chain(args.iter().copied()))
            .expect("valid args");
        let cli = Cli::from_arg_matches(&matches).expect("cli");
        prompt_items(&cli, &matches)
    }

    #[test]
    fn items_follow_flag_order() {
        let items = items_for(&[
            "-m", "first", "-f", "a.txt", "-v", "x", "1", "-m", "second", "-c", "sub.json", "-i",
            "b.txt",
        ]);
        assert_eq!(
            items,
            vec![
                Item::Message("first".into()),
                Item::File("a.txt".into()),
                Item::Var(VarItem {
                    name: "x".into(),
                    value: "1".into(),
                }),
                Item::Message("second".into()),
                Item::Config("sub.json".into()),
                Item::Include("b.txt".into()),
            ]
        );
    }

    #[test]
    fn dirs_share_ext_and_depth() {
        let items = items_for(&["-d", "src", "-x", "rs", "-d", "docs", "-x", ".md", "-l", "2"]);
        let expected = |path: &str| {
            Item::Dir(DirItem {
                path: path.into(),
                exts: vec!["rs".into(), ".md".into()],
                depth: 2,
            })
        };
        assert_eq!(items, vec![expected("src"), expected("docs")]);
    }

    #[test]
    fn multiple_vars_pair_up() {
        let items = items_for(&["-v", "first", "Foo", "--var", "Last", "Bar", "-m", "hi"]);
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[1],
            Item::Var(VarItem {
                name: "Last".into(),
                value: "Bar".into(),
            })
        );
    }

    #[test]
    fn no_items() {
        assert!(items_for(&[]).is_empty());
        assert!(items_for(&["-x", "rs", "-l", "1"]).is_empty());
    }

    #[test]
    fn var_requires_two_values() {
        let result = Cli::command().try_get_matches_from(["ctxkit", "-v", "only-name"]);
        assert!(result.is_err());
    }
}
