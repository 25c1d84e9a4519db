/// Naming scheme for the artifact store
///
/// Layout:
/// - `<root>/index.csv`: committed items, one row each
/// - `<root>/video_{seq:02}/`: artifact directory per item id
/// - `<root>/video_{seq:02}/image_{index:02}.{ext}`: acquired media files
use std::fmt;

use url::Url;

const ITEM_ID_PREFIX: &str = "video_";
const MEDIA_FILE_PREFIX: &str = "image_";

/// File name of the index ledger inside the store root
pub const INDEX_FILE_NAME: &str = "index.csv";

/// Extensions kept as-is when sniffed from a media URL
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Extension used when the URL does not carry an allowed one
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Sequential item identifier, rendered as `video_NN`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u64);

impl ItemId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn seq(&self) -> u64 {
        self.0
    }

    /// Parse a directory name of the form `video_<digits>`
    pub fn parse(name: &str) -> Option<Self> {
        let digits = name.strip_prefix(ITEM_ID_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", ITEM_ID_PREFIX, self.0)
    }
}

/// Extension for a media URL, restricted to [`ALLOWED_EXTENSIONS`]
pub fn sniff_extension(url: &str) -> &'static str {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    let candidate = path
        .rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    candidate
        .and_then(|ext| ALLOWED_EXTENSIONS.iter().copied().find(|allowed| *allowed == ext))
        .unwrap_or(DEFAULT_EXTENSION)
}

/// Media file name: image_{index:02}.{ext} (index is 1-based)
pub fn media_file_name(index: usize, url: &str) -> String {
    format!("{}{:02}.{}", MEDIA_FILE_PREFIX, index, sniff_extension(url))
}

/// Stored path relative to the store root: {id}/image_{index:02}.{ext}
pub fn media_relative_path(id: ItemId, index: usize, url: &str) -> String {
    format!("{}/{}", id, media_file_name(index, url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_display() {
        assert_eq!(ItemId::new(1).to_string(), "video_01");
        assert_eq!(ItemId::new(42).to_string(), "video_42");
        assert_eq!(ItemId::new(123).to_string(), "video_123");
    }

    #[test]
    fn test_item_id_parse() {
        assert_eq!(ItemId::parse("video_07"), Some(ItemId::new(7)));
        assert_eq!(ItemId::parse("video_1000"), Some(ItemId::new(1000)));
        assert_eq!(ItemId::parse("video_"), None);
        assert_eq!(ItemId::parse("video_ab"), None);
        assert_eq!(ItemId::parse("video_+3"), None);
        assert_eq!(ItemId::parse("video_01_old"), None);
        assert_eq!(ItemId::parse("images"), None);
    }

    #[test]
    fn test_sniff_extension() {
        assert_eq!(sniff_extension("https://img.example/a/b.PNG"), "png");
        assert_eq!(sniff_extension("https://img.example/a/b.webp?w=300"), "webp");
        assert_eq!(sniff_extension("https://img.example/a/b.jpeg#frag"), "jpeg");
        assert_eq!(sniff_extension("https://img.example/a/b.bmp"), "jpg");
        assert_eq!(sniff_extension("https://img.example/a/noext"), "jpg");
        assert_eq!(sniff_extension("https://img.example/"), "jpg");
        assert_eq!(sniff_extension("not a url.gif?x=1"), "gif");
    }

    #[test]
    fn test_media_relative_path() {
        let id = ItemId::new(3);
        assert_eq!(
            media_relative_path(id, 1, "https://x.example/pic.gif"),
            "video_03/image_01.gif"
        );
        assert_eq!(
            media_relative_path(id, 12, "https://x.example/pic"),
            "video_03/image_12.jpg"
        );
    }
}
