//! Detail View CLI
//!
//! Serves and renders detail pages over the demo company/contact data set:
//! - `serve` runs the HTTP surface
//! - `render` and `fragment` print one page or one lazy fragment
//! - `routes` and `config` inspect the site

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use dv_common::{ObjectId, TypeKey};
use dv_core::config::SiteConfig;
use dv_core::demo::demo_site;
use dv_core::exit_codes::ExitCode;
use dv_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use dv_core::server::DetailServer;
use dv_core::site::DetailSite;

/// Detail View - object detail pages with lazily loaded panels
#[derive(Parser)]
#[command(name = "dv")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to a TOML site config
    #[arg(long, global = true, env = "DV_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve detail pages and fragments over HTTP
    Serve(ServeArgs),

    /// Print the full detail page of one object
    Render(ObjectArgs),

    /// Print one lazy fragment of an object's detail page
    Fragment(FragmentArgs),

    /// List the registered routes
    Routes(RoutesArgs),

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Override the bind address from the config
    #[arg(long)]
    bind: Option<String>,

    /// Override the port from the config
    #[arg(long, short)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ObjectArgs {
    /// Object type as `app.model`
    type_key: TypeKey,

    /// Object identifier
    id: ObjectId,
}

#[derive(Args, Debug)]
struct FragmentArgs {
    #[command(flatten)]
    object: ObjectArgs,

    /// Fragment key of the lazy panel
    key: String,
}

#[derive(Args, Debug)]
struct RoutesArgs {
    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_env(
        cli.global.log_level,
        cli.global.log_format,
    ));

    let exit_code = match load_config(&cli.global) {
        Err(code) => code,
        Ok(config) => match cli.command {
            Commands::Serve(args) => run_serve(config, &args),
            Commands::Render(args) => with_site(config, |site| {
                site.render_detail(&args.type_key, &args.id)
            }),
            Commands::Fragment(args) => with_site(config, |site| {
                site.render_fragment(&args.object.type_key, &args.object.id, &args.key)
            }),
            Commands::Routes(args) => run_routes(config, &args),
            Commands::Config => run_config(&config),
        },
    };

    std::process::exit(exit_code.as_i32());
}

fn report(err: &dv_common::Error) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

fn load_config(global: &GlobalOpts) -> Result<SiteConfig, ExitCode> {
    SiteConfig::load_or_default(global.config.as_deref()).map_err(|e| {
        eprintln!("error: failed to load config: {e}");
        match ExitCode::from(&e) {
            ExitCode::IoError => ExitCode::ConfigError,
            code => code,
        }
    })
}

fn build_site(config: SiteConfig) -> Result<DetailSite, ExitCode> {
    demo_site(config).map_err(|e| report(&e))
}

fn with_site<F>(config: SiteConfig, render: F) -> ExitCode
where
    F: FnOnce(&DetailSite) -> dv_common::Result<String>,
{
    let site = match build_site(config) {
        Ok(site) => site,
        Err(code) => return code,
    };
    match render(&site) {
        Ok(html) => {
            println!("{html}");
            ExitCode::Clean
        }
        Err(e) => report(&e),
    }
}

fn run_serve(mut config: SiteConfig, args: &ServeArgs) -> ExitCode {
    if let Some(bind) = &args.bind {
        config.server.bind = bind.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let server_config = config.server.clone();

    let site = match build_site(config) {
        Ok(site) => Arc::new(site),
        Err(code) => return code,
    };
    match DetailServer::start(&server_config, site) {
        Ok(server) => {
            eprintln!("listening on http://{}", server.addr());
            server.join();
            ExitCode::Clean
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn run_routes(config: SiteConfig, args: &RoutesArgs) -> ExitCode {
    let site = match build_site(config) {
        Ok(site) => site,
        Err(code) => return code,
    };
    let table = site.routes().table();

    if args.json {
        match serde_json::to_string_pretty(&table) {
            Ok(json) => println!("{json}"),
            Err(e) => return report(&e.into()),
        }
    } else {
        let width = table.iter().map(|r| r.name.len()).max().unwrap_or(0);
        for route in &table {
            println!("{:width$}  {}", route.name, route.pattern);
        }
    }
    ExitCode::Clean
}

fn run_config(config: &SiteConfig) -> ExitCode {
    match config.to_toml() {
        Ok(toml) => {
            print!("{toml}");
            ExitCode::Clean
        }
        Err(e) => report(&e),
    }
}
