use anyhow::{Context, Result};
use std::net::SocketAddr;
use syllabus::{
    auth::jwt::AuthService,
    cli::{
        init::{self, InitConfig, InitResult},
        output::{Mark, Output},
        Cli, Commands,
    },
    types::{ClassScope, Role},
    utils::toml_config::{LogFormat, SyllabusConfig},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match cli.command {
        Some(Commands::Init {
            path,
            force,
            provider,
            host,
            port,
        }) => {
            let result = init::run(
                InitConfig {
                    path,
                    force,
                    provider,
                    host,
                    port,
                },
                &output,
            );
            match result {
                InitResult::Success | InitResult::AlreadyExists => Ok(()),
                InitResult::Error(e) => anyhow::bail!("init failed: {}", e),
            }
        }
        Some(Commands::Token {
            subject,
            role,
            standard,
            division,
        }) => {
            let config = load_config(&cli.config)?;
            let role = Role::from(role);
            let class = match (standard, division) {
                (Some(standard), Some(division)) => Some(ClassScope::new(standard, division)),
                _ => None,
            };
            let auth = AuthService::new(config.jwt_secret()?, config.auth.token_expiry);
            let token = auth
                .generate_token(&subject, role, class.as_ref())
                .context("failed to mint token")?;
            println!("{}", token);
            Ok(())
        }
        Some(Commands::Config { full, validate }) => {
            let config = if validate {
                load_config(&cli.config)?
            } else {
                let content = std::fs::read_to_string(&cli.config)
                    .with_context(|| format!("failed to read {}", cli.config.display()))?;
                SyllabusConfig::parse(&content)?
            };
            if validate {
                output.status(Mark::Done, &format!("{} is valid", cli.config.display()));
            }
            show_config(&config, full, &output)
        }
        Some(Commands::Serve) | None => {
            let config = load_config(&cli.config)?;
            init_tracing(&config, cli.verbose);
            serve(config).await
        }
    }
}

fn load_config(path: &std::path::Path) -> Result<SyllabusConfig> {
    SyllabusConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn init_tracing(config: &SyllabusConfig, verbose: bool) {
    let default_level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "syllabus={lvl},syllabus_server={lvl},tower_http={lvl}",
            lvl = default_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.server.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn serve(config: SyllabusConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid bind address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let state = AppState::from_config(config)
        .await
        .context("failed to initialize application state")?;
    let app = state.router();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Syllabus listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

fn show_config(config: &SyllabusConfig, full: bool, output: &Output) -> Result<()> {
    if full {
        println!("{}", toml::to_string_pretty(config)?);
        return Ok(());
    }

    output.header("Configuration");
    output.kv(
        "server",
        &format!("{}:{}", config.server.host, config.server.port),
    );
    output.kv("database", &config.database.url);
    output.kv(
        "embedding",
        &format!("{:?} / {}", config.embedding.provider, config.embedding.model),
    );
    output.kv(
        "generation",
        &format!(
            "{:?} / {}",
            config.generation.provider, config.generation.model
        ),
    );
    output.kv(
        "rag",
        &format!(
            "chunk_size={} top_k={} embed_concurrency={}",
            config.rag.chunk_size, config.rag.top_k, config.rag.embed_concurrency
        ),
    );
    Ok(())
}
