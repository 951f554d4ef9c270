use clap::Parser;
use safedl::{
    config::{self, DownloadConfig, ServerConfig},
    server,
};

#[derive(Parser, Debug)]
#[command(
    name = "safedl",
    bin_name = "safedl",
    about = "Serve files from one directory, by name, with no way out of it.",
    version,
    author
)]
struct Cli {
    /// Port to listen on
    #[arg(short = 'p', long, env = "SAFEDL_PORT", default_value_t = 8080)]
    port: u16,

    /// Bind address
    #[arg(short = 'b', long, env = "SAFEDL_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Base directory that requested names are relative to
    #[arg(short = 'r', long, env = "SAFEDL_ROOT", default_value = ".")]
    root: std::path::PathBuf,

    /// Directory prefix files must live under (relative, trailing '/' required)
    #[arg(short = 'd', long = "dir", env = "SAFEDL_DIR", default_value = config::DEFAULT_DOWNLOAD_DIR)]
    download_dir: String,

    /// Allowed file endings, comma separated (e.g. .jpg,.pdf)
    #[arg(
        short = 'x',
        long = "ext",
        env = "SAFEDL_EXTENSIONS",
        value_delimiter = ',',
        default_values_t = config::DEFAULT_EXTENSIONS.iter().map(|s| s.to_string())
    )]
    extensions: Vec<String>,

    /// Ignore the query string (no GET parameters)
    #[arg(long, env = "SAFEDL_NO_GET")]
    no_get: bool,

    /// Ignore form bodies (no POST parameters)
    #[arg(long, env = "SAFEDL_NO_POST")]
    no_post: bool,

    /// Also require the resolved path to stay inside the directory (follows symlinks)
    #[arg(long, env = "SAFEDL_STRICT")]
    strict: bool,

    /// HTTP status sent with "Download failed."
    #[arg(long, env = "SAFEDL_FAILURE_STATUS", default_value_t = 200)]
    failure_status: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("safedl=info".parse()?),
        )
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    let download = DownloadConfig::new(
        cli.root,
        cli.download_dir,
        config::parse_extensions(&cli.extensions),
    )?
    .with_methods(!cli.no_get, !cli.no_post)?
    .with_strict_containment(cli.strict)
    .with_failure_status(cli.failure_status)?;

    server::start(ServerConfig::new(cli.bind, cli.port, download)).await?;

    Ok(())
}
