use clap::Parser;
use easychat::core::config;
use easychat::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;

#[derive(Parser)]
#[command(name = "easychat", about = "Terminal client for an EasyChatbox server")]
struct Args {
    /// Server base URL (e.g. http://localhost:8000)
    #[arg(short, long)]
    server: Option<String>,

    /// Username to sign in with (password is prompted, or taken from
    /// EASYCHAT_PASSWORD / the config file)
    #[arg(short, long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // File logger - writes to easychat.log in the current directory
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create("easychat.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("Config file problem, using defaults: {}", e);
            Default::default()
        }
    };
    let resolved = config::resolve(
        &file_config,
        args.server.as_deref(),
        args.username.as_deref(),
    );

    log::info!("Easychat starting up against {}", resolved.base_url);

    tui::run(resolved)
}
