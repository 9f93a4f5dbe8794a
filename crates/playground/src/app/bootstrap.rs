use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use map_entity::InteractionConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ACTIVATION_RADIUS_ENV_VAR: &str = "MAPENT_ACTIVATION_RADIUS";
const OUTLINE_THICKNESS_ENV_VAR: &str = "MAPENT_OUTLINE_THICKNESS";

#[derive(Debug, Clone)]
pub(crate) struct AppWiring {
    pub(crate) config: InteractionConfig,
    pub(crate) map_path: PathBuf,
    pub(crate) script_path: Option<PathBuf>,
}

/// Returns `Ok(None)` when only help was requested.
pub(crate) fn build_app(args: &[String]) -> Result<Option<AppWiring>, String> {
    if args.iter().any(|arg| arg == "-h" || arg == "--help") {
        println!("{}", usage_text());
        return Ok(None);
    }
    let (map_path, script_path) = parse_args(args)?;

    init_tracing();
    info!("=== Map Entity Playground ===");

    let config = InteractionConfig {
        activation_radius: env_override(
            ACTIVATION_RADIUS_ENV_VAR,
            InteractionConfig::default().activation_radius,
        ),
        outline_thickness: env_override(
            OUTLINE_THICKNESS_ENV_VAR,
            InteractionConfig::default().outline_thickness,
        ),
        ..InteractionConfig::default()
    };

    Ok(Some(AppWiring {
        config,
        map_path,
        script_path,
    }))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_args(args: &[String]) -> Result<(PathBuf, Option<PathBuf>), String> {
    let mut map_path = None;
    let mut script_path = None;
    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--map" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --map".to_string())?;
                map_path = Some(PathBuf::from(value));
                index += 2;
            }
            "--script" => {
                let value = args
                    .get(index + 1)
                    .ok_or_else(|| "missing value for --script".to_string())?;
                script_path = Some(PathBuf::from(value));
                index += 2;
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    let map_path = map_path.ok_or_else(|| "--map is required".to_string())?;
    Ok((map_path, script_path))
}

fn env_override<T: FromStr + Copy>(var: &'static str, fallback: T) -> T {
    match env::var(var) {
        Ok(value) => match value.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    env_var = var,
                    value = value.as_str(),
                    "invalid env var value; falling back to default"
                );
                fallback
            }
        },
        Err(env::VarError::NotPresent) => fallback,
        Err(err) => {
            warn!(env_var = var, error = %err, "unable to read env var; falling back to default");
            fallback
        }
    }
}

pub(crate) fn usage_text() -> String {
    [
        "playground - replay entity interactions against a map entity file",
        "",
        "Usage:",
        "  playground --map <file.json> [--script <file>]",
        "",
        "Script commands (one per line, '#' starts a comment):",
        "  activate <id> | force-activate <id> | deactivate <id>",
        "  trigger <action label>",
        "  hover <id> <#rrggbb> | unhover <id> | near <id> <#rrggbb> | far <id>",
        "  move <id> <x> <y> | set <id> <key> <json> | delete <id>",
        "  editor on|off | editor-mode add|edit|remove",
        "",
        "Environment:",
        "  MAPENT_ACTIVATION_RADIUS (default 96)",
        "  MAPENT_OUTLINE_THICKNESS (default 2)",
        "  RUST_LOG (default info)",
    ]
    .join("\n")
}
