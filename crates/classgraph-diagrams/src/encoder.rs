//! Markup encoding for remote PlantUML servers.
//!
//! A PlantUML server accepts the diagram source as a URL path segment:
//! the text is compressed with raw DEFLATE and the bytes are packed 3 → 4
//! into PlantUML's own 64-character alphabet. Trailing groups of 1 or 2 bytes
//! are zero-padded to a full group, so the token length is always a multiple
//! of four.

use std::sync::LazyLock;

use base64::Engine;
use base64::alphabet::Alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};

use crate::consts::{DEFLATE_LEVEL, PLANTUML_ALPHABET};
use crate::format::RenderFormat;

static PLANTUML_ENGINE: LazyLock<GeneralPurpose> = LazyLock::new(|| {
    let alphabet = Alphabet::new(PLANTUML_ALPHABET).unwrap();
    GeneralPurpose::new(
        &alphabet,
        GeneralPurposeConfig::new().with_encode_padding(false),
    )
});

/// Encode diagram markup into a URL-safe PlantUML token.
///
/// Deterministic: the same markup always yields the same token.
#[must_use]
pub fn encode(markup: &str) -> String {
    let compressed = miniz_oxide::deflate::compress_to_vec(markup.as_bytes(), DEFLATE_LEVEL);
    pack(&compressed)
}

/// Build the image URL for `markup` on a PlantUML server.
///
/// ```
/// use classgraph_diagrams::{RenderFormat, remote_url};
///
/// let url = remote_url("https://www.plantuml.com/plantuml/", RenderFormat::Svg, "@startuml\n@enduml\n");
/// assert!(url.starts_with("https://www.plantuml.com/plantuml/svg/"));
/// ```
#[must_use]
pub fn remote_url(server_url: &str, format: RenderFormat, markup: &str) -> String {
    format!(
        "{}/{}/{}",
        server_url.trim_end_matches('/'),
        format.as_str(),
        encode(markup)
    )
}

/// Pack bytes 3 → 4 into the PlantUML alphabet, zero-padding the last group.
fn pack(bytes: &[u8]) -> String {
    let split = bytes.len() - bytes.len() % 3;
    let (body, tail) = bytes.split_at(split);

    let mut token = PLANTUML_ENGINE.encode(body);
    if !tail.is_empty() {
        let mut group = [0u8; 3];
        group[..tail.len()].copy_from_slice(tail);
        PLANTUML_ENGINE.encode_string(group, &mut token);
    }
    token
}
