pub mod anthropic;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::ScrapeError;
use crate::scrape::reduce::reduce_snapshot;
use crate::scrape::snapshot::PageSnapshot;

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
}

/// Text-in/text-out boundary to the external model. One concrete adapter
/// lives in [`anthropic`]; tests substitute a canned fake.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<LlmResponse, ScrapeError>;

    fn model_name(&self) -> &str;
}

const SYSTEM_PROMPT: &str = "You are an expert web developer who produces \
pixel-accurate standalone HTML replicas of existing websites. Recreate the \
exact visual appearance: layout, spacing, colors, typography. Use semantic \
HTML5 with internal CSS (custom properties, Grid, Flexbox), include hover \
and focus states, and make the page responsive. Respond with ONLY the \
complete HTML document: start with <!DOCTYPE html> and end with </html>, \
with no explanations or markdown formatting.";

const MAX_OUTPUT_TOKENS: u32 = 8000;
const TEMPERATURE: f32 = 0.1;

static HTML_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```html\s*(.*?)```").expect("valid regex"));
static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```\w*\s*(.*?)```").expect("valid regex"));
static DOCTYPE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!DOCTYPE\s+html").expect("valid regex"));

/// Builds the model request from a reduced snapshot and repairs the reply
/// into a guaranteed-wellformed HTML document.
pub struct HtmlSynthesizer<'a> {
    client: &'a dyn LlmClient,
}

impl<'a> HtmlSynthesizer<'a> {
    pub fn new(client: &'a dyn LlmClient) -> Self {
        Self { client }
    }

    pub async fn synthesize(&self, snapshot: &PageSnapshot) -> Result<String, ScrapeError> {
        let context = reduce_snapshot(snapshot);
        let prompt = build_user_prompt(snapshot, &context);

        info!(
            model = self.client.model_name(),
            prompt_chars = prompt.len(),
            "Requesting HTML synthesis"
        );
        let response = self
            .client
            .generate(&prompt, Some(SYSTEM_PROMPT), MAX_OUTPUT_TOKENS, TEMPERATURE)
            .await?;

        if response.text.trim().is_empty() {
            return Err(ScrapeError::Model("model returned an empty reply".to_string()));
        }

        let document = extract_html_document(&response.text);
        debug!(document_chars = document.len(), "Extracted HTML document");
        Ok(document)
    }
}

fn build_user_prompt(snapshot: &PageSnapshot, context: &str) -> String {
    format!(
        "Create a pixel-accurate replica of the website at {url}.\n\n\
         EXTRACTED VISUAL DATA:\n{context}\n\
         REQUIREMENTS:\n\
         1. Use the exact colors: background {bg}, text {text}\n\
         2. Include the major images from the extracted list, with alt text\n\
         3. Reproduce the extracted navigation and headings\n\
         4. Match the original visual hierarchy in a responsive layout\n\n\
         Produce one complete HTML document with embedded CSS.",
        url = snapshot.url,
        context = context,
        bg = snapshot.background_color,
        text = snapshot.text_color,
    )
}

/// Extract the HTML document from a model reply.
///
/// Preference order: a ```html fenced block, any fenced block containing
/// markup, then a literal `<!DOCTYPE html>` marker. Trailing prose after
/// the closing `</html>` is discarded. The result always starts with a
/// DOCTYPE declaration and contains `<html>`, wrapping minimally when the
/// reply omitted structural tags.
pub fn extract_html_document(reply: &str) -> String {
    let mut doc = if let Some(caps) = HTML_FENCE.captures(reply) {
        caps[1].trim().to_string()
    } else if let Some(caps) = ANY_FENCE
        .captures(reply)
        .filter(|caps| caps[1].contains('<'))
    {
        caps[1].trim().to_string()
    } else if let Some(marker) = DOCTYPE_MARKER.find(reply) {
        reply[marker.start()..].trim().to_string()
    } else {
        reply.trim().to_string()
    };

    if let Some(end) = doc.rfind("</html>") {
        doc.truncate(end + "</html>".len());
    }

    if !doc.to_ascii_lowercase().contains("<html") {
        let body = DOCTYPE_MARKER.replace(&doc, "").trim_start_matches('>').trim().to_string();
        doc = format!("<html>\n<body>\n{}\n</body>\n</html>", body);
    }

    if !doc.trim_start().to_ascii_lowercase().starts_with("<!doctype") {
        doc = format!("<!DOCTYPE html>\n{}", doc);
    }

    doc
}
