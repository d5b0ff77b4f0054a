use crate::backend::emotes::{native_emote_url, EmoteDescriptor, EmoteStore, ProviderKind};
use crate::backend::twitch::EmotePlacements;

/// One native emote occurrence, character indices inclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeEmotePlacement {
    pub emote_id: String,
    pub start: usize,
    pub end: usize,
}

/// Flatten `id -> spans` into one list, sorted right-most first
pub fn flatten_placements(placements: &EmotePlacements) -> Vec<NativeEmotePlacement> {
    let mut flat: Vec<NativeEmotePlacement> = placements
        .iter()
        .flat_map(|(id, spans)| {
            spans.iter().map(move |span| NativeEmotePlacement {
                emote_id: id.clone(),
                start: span.start,
                end: span.end,
            })
        })
        .collect();
    flat.sort_by(|a, b| b.start.cmp(&a.start));
    flat
}

/// Turn message text into body markup.
///
/// Native placements, when present, are the only substitution performed.
/// Otherwise whole words are matched against the emote store.
pub fn render_body(text: &str, placements: Option<&EmotePlacements>, store: &EmoteStore) -> String {
    match placements {
        Some(placements) if !placements.is_empty() => {
            replace_native(text, &flatten_placements(placements))
        }
        _ => replace_words(text, store),
    }
}

fn native_img(id: &str, alt: &str) -> String {
    format!(
        r#"<img src="{}" alt="{}" class="emote-img">"#,
        native_emote_url(id),
        alt
    )
}

fn provider_img(provider: ProviderKind, emote: &EmoteDescriptor) -> String {
    format!(
        r#"<img src="{}" alt="{}" class="emote-img" title="{} ({})">"#,
        emote.image_url,
        emote.name,
        emote.name,
        provider.label()
    )
}

/// Replace spans right to left so unreplaced indices stay valid.
/// `placements` must be sorted by descending start.
pub fn replace_native(text: &str, placements: &[NativeEmotePlacement]) -> String {
    // Byte offset of every char, plus one past the end
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();

    // Chars at and after `cursor` are already in `pieces`
    let mut cursor = offsets.len() - 1;
    let mut pieces: Vec<String> = Vec::new();

    for placement in placements {
        if placement.start > placement.end || placement.end >= cursor {
            log::debug!(
                "Skipping emote {} span {}-{}: out of range or overlapping",
                placement.emote_id,
                placement.start,
                placement.end
            );
            continue;
        }
        let start = offsets[placement.start];
        let end = offsets[placement.end + 1];
        pieces.push(text[end..offsets[cursor]].to_string());
        pieces.push(native_img(&placement.emote_id, &text[start..end]));
        cursor = placement.start;
    }
    pieces.push(text[..offsets[cursor]].to_string());

    pieces.reverse();
    pieces.concat()
}

/// Split into alternating word / whitespace tokens; concatenating them
/// gives back the input.
pub fn split_preserving_whitespace(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut previous: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        if previous.is_some_and(|was_space| was_space != is_space) {
            tokens.push(&text[start..i]);
            start = i;
        }
        previous = Some(is_space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Replace words that exactly name an emote, first provider in priority wins
pub fn replace_words(text: &str, store: &EmoteStore) -> String {
    split_preserving_whitespace(text)
        .into_iter()
        .map(|token| {
            if token.starts_with(char::is_whitespace) {
                return token.to_string();
            }
            match store.find(token) {
                Some((provider, emote)) => provider_img(provider, emote),
                None => token.to_string(),
            }
        })
        .collect()
}
