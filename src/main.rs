use backend::avatar::AvatarResolver;
use backend::config::AppConfig;
use backend::emotes::{
    initialize_emotes, BttvEmotes, EmoteProvider, FfzEmotes, SevenTvEmotes, TwitchEmotes,
};
use backend::overlay::{start_overlay_server, WebSocketState};
use backend::pipeline::ChatPipeline;
use backend::render::MessageRenderer;
use backend::twitch::{ChatClient, HelixClient};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

pub mod backend;
mod handlers;

const OVERLAY_PING_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn emote_providers(config: &AppConfig, helix: &HelixClient) -> Vec<Box<dyn EmoteProvider>> {
    let mut providers: Vec<Box<dyn EmoteProvider>> = Vec::new();
    if helix.has_credentials() {
        providers.push(Box::new(TwitchEmotes::new(helix.clone())));
    }
    providers.push(Box::new(BttvEmotes::new(config.endpoints.bttv.clone())));
    providers.push(Box::new(FfzEmotes::new(config.endpoints.ffz.clone())));
    providers.push(Box::new(SevenTvEmotes::new(config.endpoints.seventv.clone())));
    providers
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = backend::config::load_config()?;
    let channel = config.channel();
    info!("Starting chat overlay for #{}", channel);

    let overlay = WebSocketState::new(config.overlay.max_messages, config.overlay.grace());
    let keepalive = overlay.spawn_keepalive(OVERLAY_PING_INTERVAL);

    let overlay_dir = project_root::get_project_root()?.join(&config.overlay.assets_dir);
    let mut server = tokio::spawn(start_overlay_server(
        config.overlay.port,
        overlay_dir,
        overlay.clone(),
    ));

    // Chat connects while emotes load; early messages wait in the channel
    let (chat_tx, chat_rx) = tokio::sync::mpsc::channel(100);
    let mut client = ChatClient::new(config.chat_config());
    client.connect(chat_tx);

    let helix = HelixClient::new(
        config.endpoints.helix.clone(),
        config.twitch.client_id.clone(),
        config.twitch.access_token.clone(),
    )
    .with_timeout(config.endpoints.helix_timeout());
    let providers = emote_providers(&config, &helix);
    let store = Arc::new(initialize_emotes(&helix, &providers, &channel).await);

    let pipeline = ChatPipeline::new(
        AvatarResolver::new(helix),
        MessageRenderer::new(store, config.overlay.render_options()),
        overlay.clone(),
    );

    // The overlay outlives the chat client; only the server or ctrl-c end the run
    let chat = handlers::handle_chat_events(&pipeline, chat_rx);
    tokio::pin!(chat);
    let mut chat_running = true;

    let result: Result<(), Box<dyn std::error::Error>> = loop {
        tokio::select! {
            _ = &mut chat, if chat_running => {
                warn!("Chat client stopped, overlay stays up");
                pipeline.handle_disconnected("chat client stopped");
                chat_running = false;
            }
            joined = &mut server => break match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(format!("Overlay server failed: {}", e).into()),
                Err(e) => Err(format!("Overlay server task failed: {}", e).into()),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break Ok(());
            }
        }
    };

    overlay.buffer().shutdown().await;
    client.disconnect();
    keepalive.abort();
    server.abort();
    result
}
