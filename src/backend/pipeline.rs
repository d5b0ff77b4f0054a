use crate::backend::avatar::{AvatarResolver, UserDirectory};
use crate::backend::overlay::{OverlayEvent, WebSocketState};
use crate::backend::render::MessageRenderer;
use crate::backend::twitch::ChatMessageEvent;

pub const WELCOME_BANNER: &str = "🎮 Chat connected - all emotes active";

/// Single consumer turning chat events into overlay updates.
///
/// Messages are handled one at a time, so the overlay shows them in the order
/// the transport delivered them even when one avatar lookup is slow.
pub struct ChatPipeline<D> {
    avatars: AvatarResolver<D>,
    renderer: MessageRenderer,
    overlay: WebSocketState,
}

impl<D: UserDirectory> ChatPipeline<D> {
    pub fn new(avatars: AvatarResolver<D>, renderer: MessageRenderer, overlay: WebSocketState) -> Self {
        Self {
            avatars,
            renderer,
            overlay,
        }
    }

    /// Returns the id given to the rendered message
    pub async fn handle_message(&self, event: ChatMessageEvent) -> u64 {
        let avatar = self.avatars.resolve(&event.login).await;
        let message = self.renderer.render(&event, avatar);
        let id = message.id;
        log::debug!("#{} {}: {}", id, message.username, event.text);
        self.overlay.buffer().append(message).await;
        id
    }

    pub fn handle_connected(&self) {
        log::info!("Chat connected");
        self.overlay.broadcast(OverlayEvent::Connected {
            banner: WELCOME_BANNER.to_string(),
        });
    }

    pub fn handle_disconnected(&self, reason: &str) {
        log::warn!("Chat disconnected: {}", reason);
        self.overlay.broadcast(OverlayEvent::Disconnected {
            reason: reason.to_string(),
        });
    }

    pub fn overlay(&self) -> &WebSocketState {
        &self.overlay
    }
}
