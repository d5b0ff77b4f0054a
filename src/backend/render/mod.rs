//! Chat event → overlay message rendering

mod markup;
mod message;

pub use markup::{
    flatten_placements, render_body, replace_native, replace_words, split_preserving_whitespace,
    NativeEmotePlacement,
};
pub use message::{
    is_highlighted, ColorMode, EntranceAnimation, MessageRenderer, RenderOptions, RenderedMessage,
    Role, PALETTE,
};
