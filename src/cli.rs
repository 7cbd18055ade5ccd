use std::path::PathBuf;
use std::time::Duration;

use crate::config::config_path_hint;
use crate::theme::ThemeArg;

pub const DEFAULT_CONTEXT: usize = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// CLI arguments parsed from command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub old: PathBuf,
    pub new: PathBuf,
    /// Name used for language detection and the page title
    pub filename: Option<String>,
    pub context: Option<usize>,
    /// Write the page here instead of stdout
    pub output: Option<PathBuf>,
    pub theme: Option<ThemeArg>,
    /// How long to wait for highlighting before rendering plain rows
    pub timeout: Duration,
}

/// Print help message and exit
fn print_help() -> ! {
    let name = std::env::args()
        .next()
        .and_then(|p| {
            std::path::Path::new(&p)
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "splitdiff".to_string());
    let valid_values = ThemeArg::valid_values_display();
    let config_path = config_path_hint();
    let timeout = DEFAULT_TIMEOUT.as_secs();
    println!(
        "splitdiff - Render a highlighted side-by-side diff of two files as HTML

Usage: {name} [OPTIONS] <OLD> <NEW>

Options:
  --filename <NAME>      Name used for language detection and the title [default: NEW's file name]
  -U, --context <N>      Lines of context around each change [default: {DEFAULT_CONTEXT}]
  -o, --output <PATH>    Write the page to PATH instead of stdout
  --theme <THEME>        Color theme to use [default: dark]
                         Valid values: {valid_values}
                         Precedence: --theme > {config_path} > dark
  --timeout <SECS>       Seconds to wait for syntax highlighting [default: {timeout}]
  -h, --help             Print this help message

Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostics on stderr."
    );
    std::process::exit(0);
}

/// Parse CLI arguments from command line
///
/// We use a handrolled argument parser instead of clap to keep binary size
/// small and build times fast.
pub fn parse_cli_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    parse_cli_args_from(&args).unwrap_or_else(|err| {
        eprintln!("Error: {err}");
        eprintln!("Run with --help for usage.");
        std::process::exit(2);
    })
}

fn parse_cli_args_from(args: &[String]) -> Result<CliArgs, String> {
    let mut filename = None;
    let mut context = None;
    let mut output = None;
    let mut theme = None;
    let mut timeout = DEFAULT_TIMEOUT;
    let mut positionals = Vec::new();
    let mut options_done = false;

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        i += 1;

        if options_done || !arg.starts_with('-') {
            positionals.push(PathBuf::from(arg));
            continue;
        }
        if arg == "--" {
            options_done = true;
            continue;
        }

        // Handle --flag=value as well as --flag value
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value)),
            _ => (arg, None),
        };

        match flag {
            "-h" | "--help" => print_help(),
            "--filename" => {
                filename = Some(option_value(flag, inline, args, &mut i)?.to_string());
            }
            "-U" | "--context" => {
                let value = option_value(flag, inline, args, &mut i)?;
                context = Some(value.parse::<usize>().map_err(|_| {
                    format!("Invalid context '{value}': expected a non-negative integer")
                })?);
            }
            "-o" | "--output" => {
                output = Some(PathBuf::from(option_value(flag, inline, args, &mut i)?));
            }
            "--theme" => {
                let valid_values = ThemeArg::valid_values_display();
                let value = option_value(flag, inline, args, &mut i)
                    .map_err(|err| format!("{err} ({valid_values})"))?;
                theme = ThemeArg::from_str(value)
                    .ok_or_else(|| {
                        format!("Unknown theme '{value}'. Valid options: {valid_values}")
                    })
                    .map(Some)?;
            }
            "--timeout" => {
                let value = option_value(flag, inline, args, &mut i)?;
                let secs = value.parse::<u64>().map_err(|_| {
                    format!("Invalid timeout '{value}': expected a whole number of seconds")
                })?;
                timeout = Duration::from_secs(secs);
            }
            _ => return Err(format!("Unknown option '{arg}'")),
        }
    }

    let [old, new]: [PathBuf; 2] = positionals.try_into().map_err(|paths: Vec<PathBuf>| {
        format!(
            "Expected <OLD> and <NEW> paths, got {} path argument(s)",
            paths.len()
        )
    })?;

    Ok(CliArgs {
        old,
        new,
        filename,
        context,
        output,
        theme,
        timeout,
    })
}

fn option_value<'a>(
    flag: &str,
    inline: Option<&'a str>,
    args: &'a [String],
    i: &mut usize,
) -> Result<&'a str, String> {
    let value = match inline {
        Some(value) => value,
        None => {
            let value = args
                .get(*i)
                .map(String::as_str)
                .filter(|v| !v.starts_with('-'))
                .ok_or_else(|| format!("{flag} requires a value"))?;
            *i += 1;
            value
        }
    };

    if value.is_empty() {
        return Err(format!("{flag} requires a value"));
    }
    Ok(value)
}
