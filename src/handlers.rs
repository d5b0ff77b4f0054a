use log::{error, info};
use tokio::sync::mpsc;

use crate::backend::avatar::UserDirectory;
use crate::backend::pipeline::ChatPipeline;
use crate::backend::twitch::ChatClientEvent;

/// Feed chat client events into the pipeline until the client goes away
pub async fn handle_chat_events<D: UserDirectory>(
    pipeline: &ChatPipeline<D>,
    mut rx: mpsc::Receiver<ChatClientEvent>,
) {
    while let Some(event) = rx.recv().await {
        handle_chat_event(pipeline, event).await;
    }
    info!("Chat event stream closed");
}

async fn handle_chat_event<D: UserDirectory>(pipeline: &ChatPipeline<D>, event: ChatClientEvent) {
    match event {
        ChatClientEvent::Connected => pipeline.handle_connected(),
        ChatClientEvent::Disconnected(reason) => pipeline.handle_disconnected(&reason),
        ChatClientEvent::Message(message) => {
            if message.is_self {
                return;
            }
            pipeline.handle_message(message).await;
        }
        ChatClientEvent::Error(e) => error!("Chat error: {}", e),
    }
}
