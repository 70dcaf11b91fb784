use clap::{Parser, Subcommand};
use spvits_core::{Reply, SpvitsConfig};
use spvits_plugin::VitsPlugin;
use spvits_voice::{split_text, MockTts, TextToSpeech, VitsClient};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "SPVITS_CONFIG", default_value = "spvits.toml")]
    config: String,

    /// Use silent mock audio instead of calling the VITS API
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize text into a clip in the temp dir and print its path
    Say {
        /// Text to speak
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Show how a text would be segmented for synthesis
    Split {
        text: String,
        /// Overrides vits.max_text_length
        #[arg(short = 'n', long)]
        max_length: Option<usize>,
    },
    /// Delete every clip in the temp dir
    Clear,
    /// Connect to OneBot and serve /say, /voice_mode and /clear_temp
    #[cfg(feature = "onebot")]
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let config = SpvitsConfig::load_or_default(&args.config);

    let tts: Arc<dyn TextToSpeech> = if args.mock {
        Arc::new(MockTts::new())
    } else {
        Arc::new(VitsClient::from_config(&config.vits))
    };

    match args.command {
        Commands::Split { text, max_length } => {
            let max_length = max_length.unwrap_or(config.vits.max_text_length);
            for segment in split_text(&text, max_length) {
                println!("{}", segment);
            }
        }
        Commands::Say { text } => {
            let plugin = VitsPlugin::new(&config, tts);
            plugin.initialize()?;
            match plugin.say(&text.join(" ")).await {
                Reply::Voice(path) => println!("{}", path.display()),
                Reply::Text(msg) => anyhow::bail!(msg),
            }
        }
        Commands::Clear => {
            let plugin = VitsPlugin::new(&config, tts);
            plugin.store().ensure_dir()?;
            let report = plugin.store().clear_all()?;
            println!(
                "临时文件清理完成！\n清理前: {:.2}MB\n清理后: {:.2}MB",
                report.before_mb(),
                report.after_mb()
            );
            if !report.failed.is_empty() {
                anyhow::bail!("Failed to remove {} clip(s): {:?}", report.failed.len(), report.failed);
            }
        }
        #[cfg(feature = "onebot")]
        Commands::Serve => serve(&config, tts).await?,
    }

    Ok(())
}

#[cfg(feature = "onebot")]
async fn serve(config: &SpvitsConfig, tts: Arc<dyn TextToSpeech>) -> anyhow::Result<()> {
    use spvits_onebot::{InboundMessage, OneBotClient};

    let Some(onebot) = &config.onebot else {
        anyhow::bail!("No [onebot] section in config and ONEBOT_WS_URL is not set");
    };

    let plugin = VitsPlugin::new(config, tts);
    plugin.initialize()?;

    let (client, mut inbound) = OneBotClient::new(&onebot.ws_url, onebot.access_token.clone())?;
    info!("Serving on {} (auto voice {})", onebot.ws_url, if plugin.voice_mode() { "on" } else { "off" });

    loop {
        tokio::select! {
            message = inbound.recv() => {
                let Some(message) = message else {
                    tracing::error!("OneBot task stopped");
                    break;
                };
                match message {
                    InboundMessage::User { target, content } => {
                        let Some(replies) = plugin.dispatch(&content.body).await else {
                            continue;
                        };
                        for reply in replies {
                            if let Err(e) = client.send_reply(target, &reply).await {
                                tracing::error!("Failed to deliver reply to {}: {}", content.source, e);
                            }
                        }
                    }
                    InboundMessage::BotReply { target, content } => {
                        plugin
                            .on_llm_response(&content.body, &client.sink(target))
                            .await
                            .log_failure();
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down...");
                break;
            }
        }
    }

    plugin.terminate();
    Ok(())
}
