use serde::{Deserialize, Serialize};

/// Where a visual candidate was discovered in the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginKind {
    ImgElement,
    SourceElement,
    VideoPoster,
    SvgElement,
    CanvasElement,
    DataAttribute,
    CssBackground,
}

/// One discovered visual asset. Created during a single extraction pass and
/// never mutated afterwards; `source_url` is unique within a pass once the
/// ranker has deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualCandidate {
    /// Absolute URL, or a data-URI for inline assets
    pub source_url: String,

    pub alt_text: String,

    /// Rendered or intrinsic size; 0 when unknown
    pub width: u32,
    pub height: u32,

    /// Inferred from the extension or data-URI MIME segment; "unknown"
    /// when neither pattern matches
    pub format: String,

    pub origin_kind: OriginKind,

    /// True when `source_url` begins with `data:`
    pub is_inline_data: bool,
}

impl VisualCandidate {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoKind {
    Text,
    Image,
}

/// Logo heuristic result: either an image URL or a piece of branding text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Logo {
    pub kind: LogoKind,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Heading {
    pub text: String,
    /// Heading level, 1 through 6
    pub level: u8,
}

/// Aggregate result of one scrape pass. Constructed once per request,
/// immutable thereafter, and discarded when the request completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub url: String,
    pub title: String,
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,
    pub is_dark: bool,
    pub logo: Option<Logo>,
    /// DOM order, capped at 10
    pub navigation: Vec<NavItem>,
    /// DOM order, capped at 8
    pub headings: Vec<Heading>,
    /// Sorted descending by rendered area, capped at 100
    pub images: Vec<VisualCandidate>,
    /// Candidate count before the cap was applied
    pub total_images_found: usize,
    pub body_text: String,
    pub html_preview: String,
    pub has_search: bool,
    pub has_video: bool,
    /// Full-page PNG capture; kept out of every serialized context
    #[serde(skip)]
    pub screenshot_png: Option<Vec<u8>>,
}

/// Maximum navigation entries retained on a snapshot.
pub const MAX_NAV_ITEMS: usize = 10;
/// Maximum headings retained on a snapshot.
pub const MAX_HEADINGS: usize = 8;
/// Maximum ranked images retained on a snapshot.
pub const MAX_IMAGES: usize = 100;
