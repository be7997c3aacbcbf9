//! PageWarden CLI
//!
//! CLI tool for validating rule files and dry-running the interception
//! engine against origins and URLs.

use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand};

use pw_core::types::{NavDisposition, NavSurface, Protections};
use pw_core::{Engine, Registry};
use pw_rules::{builtin_registry, load_rules_path, LoadReport};

#[derive(Parser)]
#[command(name = "pw-cli")]
#[command(about = "PageWarden rule file tools and engine dry runs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a rule file
    Validate {
        /// Rule file to validate
        #[arg(short, long)]
        input: String,
    },

    /// Dump rule set info
    Info {
        /// Rule file to inspect; built-in rules when omitted
        #[arg(short, long)]
        input: Option<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Resolve an origin to its rule set
    Resolve {
        /// Page origin (hostname or URL)
        origin: String,

        /// Rule file to resolve against; built-in rules when omitted
        #[arg(short, long)]
        input: Option<String>,
    },

    /// Screen one navigation the way a bound page would
    Check {
        /// Page origin (hostname or URL)
        origin: String,

        /// Navigation target URL
        url: String,

        /// Link text, for click surfaces
        #[arg(short, long)]
        text: Option<String>,

        /// Surface: click, open, location or submit
        #[arg(short, long, default_value = "click")]
        surface: String,

        /// Rule file to screen against; built-in rules when omitted
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { input } => cmd_validate(&input),
        Commands::Info { input, json } => cmd_info(input.as_deref(), json),
        Commands::Resolve { origin, input } => cmd_resolve(&origin, input.as_deref()),
        Commands::Check {
            origin,
            url,
            text,
            surface,
            input,
        } => cmd_check(&origin, &url, text.as_deref(), &surface, input.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_registry(input: Option<&str>) -> Result<(Registry, LoadReport, String), String> {
    match input {
        Some(path) => {
            let (registry, report) = load_rules_path(Path::new(path))
                .map_err(|e| format!("Failed to load '{}': {}", path, e))?;
            Ok((registry, report, path.to_string()))
        }
        None => {
            let (registry, report) = builtin_registry()
                .map_err(|e| format!("Built-in rules failed to load: {}", e))?;
            Ok((registry, report, "builtin".to_string()))
        }
    }
}

fn cmd_validate(input: &str) -> Result<(), String> {
    let start = Instant::now();
    let (registry, report) = load_rules_path(Path::new(input))
        .map_err(|e| format!("Failed to load '{}': {}", input, e))?;
    let elapsed = start.elapsed();

    println!("Rule file '{}' is valid", input);
    println!("  Sets:      {}", report.sets);
    println!("  Sites:     {}", registry.len());
    println!("  Rejected:  {}", report.rejected.len());
    for rejection in &report.rejected {
        println!("    [{}] {}", rejection.set_id, rejection.error);
    }
    println!("  Time:      {:.1}ms", elapsed.as_secs_f64() * 1000.0);

    Ok(())
}

fn cmd_info(input: Option<&str>, json: bool) -> Result<(), String> {
    let (registry, report, label) = load_registry(input)?;
    let all_sets = || std::iter::once(registry.default_set()).chain(registry.sets());

    if json {
        let sets: Vec<serde_json::Value> = all_sets()
            .map(|set| {
                serde_json::json!({
                    "id": set.id,
                    "matchDomains": set.match_domains,
                    "selectors": set.selectors.len(),
                    "schemes": set.schemes.len(),
                    "patterns": set.patterns.len(),
                    "functions": set.functions.len(),
                    "protections": protection_names(set.protections),
                })
            })
            .collect();
        let payload = serde_json::json!({
            "source": label,
            "sets": sets,
            "rejected": report.rejected.len(),
        });
        let text = serde_json::to_string_pretty(&payload)
            .map_err(|e| format!("Failed to serialize info: {}", e))?;
        println!("{text}");
        return Ok(());
    }

    println!("Rules: {}", label);
    println!("  Sets:      {}", report.sets);
    println!("  Rejected:  {}", report.rejected.len());
    println!();

    for set in all_sets() {
        let domains = if set.match_domains.is_empty() {
            "any origin".to_string()
        } else {
            set.match_domains.join(", ")
        };
        println!("{} ({})", set.id, domains);
        println!("  Selectors:   {}", set.selectors.len());
        println!("  Schemes:     {}", set.schemes.len());
        println!("  Patterns:    {}", set.patterns.len());
        println!("  Functions:   {}", set.functions.len());
        println!("  Protections: {}", protection_names(set.protections));
        println!();
    }

    Ok(())
}

fn cmd_resolve(origin: &str, input: Option<&str>) -> Result<(), String> {
    let (registry, _, label) = load_registry(input)?;
    let set = registry.resolve(origin);

    println!("Origin:    {}", origin);
    println!("Rules:     {}", label);
    println!("Rule set:  {}", set.id);
    if !set.match_domains.is_empty() {
        println!("  Domains:     {}", set.match_domains.join(", "));
    }
    println!("  Selectors:   {}", set.selectors.len());
    println!("  Schemes:     {}", set.schemes.len());
    println!("  Patterns:    {}", set.patterns.len());
    println!("  Functions:   {}", set.functions.len());
    println!("  Protections: {}", protection_names(set.protections));

    Ok(())
}

fn cmd_check(
    origin: &str,
    url: &str,
    text: Option<&str>,
    surface: &str,
    input: Option<&str>,
) -> Result<(), String> {
    let surface = NavSurface::from_str(surface).ok_or_else(|| {
        format!("Unknown surface '{}' (expected click, open, location or submit)", surface)
    })?;

    let (registry, _, _) = load_registry(input)?;
    let mut engine = Engine::new(&registry, origin);
    let disposition = engine.screen_navigation(surface, url, text);

    println!("Origin:    {}", origin);
    println!("Rule set:  {}", engine.binding().id);
    println!("Surface:   {}", surface.as_str());
    println!("URL:       {}", url);
    match disposition {
        NavDisposition::Suppress => {
            println!("Verdict:   SUPPRESS");
            let set = engine.binding();
            if let Some(scheme) = set.blocked_scheme(url) {
                println!("  Matched scheme:  {}", scheme);
            } else if let Some(pattern) = set.blocked_pattern(url) {
                println!("  Matched pattern: {}", pattern);
            } else if let Some(pattern) = text.and_then(|t| set.blocked_pattern(t)) {
                println!("  Matched pattern: {} (link text)", pattern);
            }
        }
        NavDisposition::Proceed => println!("Verdict:   PROCEED"),
    }

    Ok(())
}

fn protection_names(protections: Protections) -> String {
    if protections == Protections::ALL {
        return "all".to_string();
    }
    let mut names = Vec::new();
    for (name, flag) in [
        ("elements", Protections::ELEMENTS),
        ("schemes", Protections::SCHEMES),
        ("functions", Protections::FUNCTIONS),
        ("dynamic", Protections::DYNAMIC),
    ] {
        if protections.contains(flag) {
            names.push(name);
        }
    }
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}
