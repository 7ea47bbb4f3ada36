//! Init command implementation
//!
//! Writes a starter `syllabus.toml`, `.env.example` and `.gitignore`.

use super::output::{Mark, Output};
use super::InitProvider;
use std::fs;
use std::path::{Path, PathBuf};

/// Result of the init operation
pub enum InitResult {
    Success,
    /// syllabus.toml exists and `--force` was not given
    AlreadyExists,
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    pub provider: InitProvider,
    pub host: String,
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Syllabus");

    let base_path = &config.path;
    let config_path = base_path.join("syllabus.toml");
    if config_path.exists() && !config.force {
        output.status(
            Mark::Warn,
            "syllabus.toml already exists, use --force to overwrite it",
        );
        return InitResult::AlreadyExists;
    }

    let data_dir = base_path.join("data");
    if data_dir.exists() {
        output.status(Mark::Kept, "data/ (already exists)");
    } else if let Err(e) = fs::create_dir_all(&data_dir) {
        return fail(output, "data/", e);
    } else {
        output.status(Mark::Wrote, "data/");
    }

    let files = [
        ("syllabus.toml", generate_syllabus_toml(&config)),
        (".env.example", generate_env_example(config.provider)),
    ];
    for (name, content) in files {
        if let Err(e) = write_file(&base_path.join(name), &content, config.force) {
            return fail(output, name, e);
        }
        output.status(Mark::Wrote, name);
    }

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        match write_file(&gitignore_path, GITIGNORE, false) {
            Ok(()) => output.status(Mark::Wrote, ".gitignore"),
            Err(e) => output.status(Mark::Warn, &format!("Could not write .gitignore: {}", e)),
        }
    }

    output.status(Mark::Done, "Syllabus initialized");

    output.header("Next Steps");
    output.status(Mark::Note, "Copy the environment template and set JWT_SECRET:");
    output.command("cp .env.example .env");
    match config.provider {
        InitProvider::Ollama => {
            output.status(Mark::Note, "Pull the models into Ollama:");
            output.command("ollama pull nomic-embed-text");
            output.command("ollama pull llama3.2");
        }
        InitProvider::Openai => {
            output.status(Mark::Note, "Put your API key in .env (OPENAI_API_KEY)");
        }
    }
    output.status(
        Mark::Note,
        &format!(
            "Start the server on http://{}:{} and mint a token:",
            config.host, config.port
        ),
    );
    output.command("syllabus-server");
    output.command("syllabus-server token teacher-1 --role teacher");

    InitResult::Success
}

fn fail(output: &Output, name: &str, e: std::io::Error) -> InitResult {
    output.status(Mark::Fail, &format!("Failed to create {}: {}", name, e));
    InitResult::Error(e.to_string())
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

fn generate_syllabus_toml(config: &InitConfig) -> String {
    let providers = match config.provider {
        InitProvider::Ollama => {
            r#"[embedding]
provider = "ollama"
base_url = "http://localhost:11434"
model = "nomic-embed-text"
timeout_secs = 30

[generation]
provider = "ollama"
base_url = "http://localhost:11434"
model = "llama3.2"
temperature = 0.7
timeout_secs = 120
"#
        }
        InitProvider::Openai => {
            r#"[embedding]
provider = "openai"
base_url = "https://api.openai.com/v1"
model = "text-embedding-3-small"
api_key_env = "OPENAI_API_KEY"
timeout_secs = 30

[generation]
provider = "openai"
base_url = "https://api.openai.com/v1"
model = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"
temperature = 0.7
timeout_secs = 120
"#
        }
    };

    format!(
        r#"# Syllabus Configuration
# Generated by: syllabus-server init
#
# Secrets are read from the environment variables named below (see .env.example).

[server]
host = "{host}"
port = {port}
log_level = "info"
log_format = "pretty"
max_upload_bytes = 10485760

[auth]
jwt_secret_env = "JWT_SECRET"
token_expiry = 86400

[database]
url = "./data/syllabus.db"
# turso_url_env = "TURSO_URL"
# turso_token_env = "TURSO_AUTH_TOKEN"

{providers}
[rag]
chunk_size = 1000
top_k = 3
embed_concurrency = 4
max_prompt_chars = 1000
"#,
        host = config.host,
        port = config.port,
        providers = providers,
    )
}

fn generate_env_example(provider: InitProvider) -> String {
    let mut env = String::from(
        "# Copy to .env and fill in\n\
         # JWT signing secret, at least 32 characters\n\
         JWT_SECRET=change-me-to-a-long-random-secret-value\n",
    );
    if provider == InitProvider::Openai {
        env.push_str("\n# OpenAI-compatible API key\nOPENAI_API_KEY=\n");
    }
    env.push_str("\n# RUST_LOG overrides server.log_level\n# RUST_LOG=syllabus=debug,tower_http=debug\n");
    env
}

const GITIGNORE: &str = "/target\n.env\ndata/\n*.db\n";
