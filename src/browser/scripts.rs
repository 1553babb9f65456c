//! In-page scripts executed through [`PageDriver::evaluate`].
//!
//! Each constant is a WebDriver script body (wrapped in a function by the
//! client), returning JSON-serializable data. Candidate sources come back
//! raw; URL resolution and format inference happen on the Rust side.
//!
//! [`PageDriver::evaluate`]: crate::browser::PageDriver::evaluate

/// Selector patterns applied as a union when harvesting visual candidates.
/// Ordered: standard media tags first, then SVG/canvas, lazy-load data
/// attributes, class/id substring heuristics, responsive sources, framework
/// and e-commerce containers, ARIA roles, known CDN hostnames.
pub const IMAGE_SELECTORS: &[&str] = &[
    // Standard images
    "img",
    "image",
    "picture img",
    "picture source",
    "figure img",
    // SVG and Canvas
    "svg",
    "canvas",
    "video[poster]",
    // Inline background styles
    "[style*=\"background-image\"]",
    "[style*=\"background:\"]",
    // Lazy loading
    "[data-src]",
    "[data-lazy]",
    "[data-original]",
    "[data-img]",
    "[data-image]",
    "[data-bg]",
    "[data-background]",
    "[data-thumb]",
    // Responsive
    "[srcset]",
    "source[srcset]",
    // Class patterns
    "[class*=\"image\"]",
    "[class*=\"img\"]",
    "[class*=\"photo\"]",
    "[class*=\"picture\"]",
    "[class*=\"thumbnail\"]",
    "[class*=\"avatar\"]",
    "[class*=\"logo\"]",
    "[class*=\"banner\"]",
    "[class*=\"gallery\"]",
    "[class*=\"slider\"]",
    "[class*=\"carousel\"]",
    "[class*=\"product\"]",
    // ID patterns
    "[id*=\"image\"]",
    "[id*=\"img\"]",
    "[id*=\"photo\"]",
    "[id*=\"logo\"]",
    // Framework specific
    "._next img",
    ".gatsby-image",
    ".wp-image",
    // E-commerce
    ".product-image img",
    ".item-image img",
    ".gallery img",
    // ARIA roles
    "[role=\"img\"]",
    "[role=\"image\"]",
    // CDN patterns
    "[src*=\"cloudinary\"]",
    "[src*=\"imgix\"]",
    "[src*=\"amazonaws\"]",
];

/// Returns true when every `<img>` on the page has finished loading.
pub const IMAGES_COMPLETE: &str =
    "return Array.from(document.images).every(function(img) { return img.complete; });";

/// Clicks the first visible consent/close overlay button, if any.
/// Returns whether something was clicked.
pub const DISMISS_OVERLAYS: &str = r#"
var attrSelectors = [
    'button[id*="accept"]', 'button[class*="accept"]', 'button[aria-label*="Accept"]',
    'button[aria-label*="Close"]', 'button[class*="close"]', '[data-dismiss="modal"]'
];
var textPatterns = [
    'accept', 'allow', 'ok', 'got it', 'continue', 'agree',
    'no thanks', 'maybe later', 'yes', 'enter', 'i am over', 'enable'
];
for (var i = 0; i < attrSelectors.length; i++) {
    var el = document.querySelector(attrSelectors[i]);
    if (el && el.offsetParent !== null) { el.click(); return true; }
}
var buttons = document.querySelectorAll('button');
for (var j = 0; j < buttons.length; j++) {
    var text = (buttons[j].innerText || '').trim().toLowerCase();
    if (!text || buttons[j].offsetParent === null) { continue; }
    for (var k = 0; k < textPatterns.length; k++) {
        if (text === textPatterns[k] || text.indexOf(textPatterns[k]) === 0) {
            buttons[j].click();
            return true;
        }
    }
}
return false;
"#;

pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight); return true;";

pub const SCROLL_TO_TOP: &str = "window.scrollTo(0, 0); return true;";

pub const DOCUMENT_HEIGHT: &str = r#"
return Math.max(
    document.body ? document.body.scrollHeight : 0,
    document.documentElement ? document.documentElement.scrollHeight : 0
);
"#;

/// Harvests raw visual candidates from the selector union. A failing
/// selector or element is skipped, never fatal. Emits unresolved sources:
/// `[{src, alt, width, height, kind}]`.
pub fn collect_candidates_script() -> String {
    let selectors = serde_json::to_string(IMAGE_SELECTORS).expect("static selector list");
    format!(
        r#"
var selectors = {selectors};
var found = [];
for (var s = 0; s < selectors.length; s++) {{
    var elements;
    try {{ elements = document.querySelectorAll(selectors[s]); }} catch (e) {{ continue; }}
    for (var i = 0; i < elements.length; i++) {{
        var el = elements[i];
        var src = null, width = 0, height = 0, alt = '', kind = '';
        try {{
            if (el.tagName === 'IMG') {{
                src = el.src || el.getAttribute('data-src') || el.getAttribute('data-lazy') ||
                      el.getAttribute('data-original') || el.getAttribute('data-img') ||
                      el.getAttribute('data-image');
                width = el.naturalWidth || el.width || el.offsetWidth || 0;
                height = el.naturalHeight || el.height || el.offsetHeight || 0;
                alt = el.alt || el.title || '';
                kind = 'img-element';
            }} else if (el.tagName === 'SOURCE') {{
                src = el.srcset ? el.srcset.split(',')[0].trim().split(' ')[0] : el.src;
                width = parseInt(el.getAttribute('width')) || 0;
                height = parseInt(el.getAttribute('height')) || 0;
                alt = 'source-element';
                kind = 'source-element';
            }} else if (el.tagName === 'VIDEO') {{
                src = el.poster;
                width = el.videoWidth || el.width || el.offsetWidth || 0;
                height = el.videoHeight || el.height || el.offsetHeight || 0;
                alt = 'video-thumbnail';
                kind = 'video-poster';
            }} else if (el.tagName === 'svg' || el.tagName === 'SVG') {{
                var svgString = new XMLSerializer().serializeToString(el);
                src = 'data:image/svg+xml;base64,' + btoa(unescape(encodeURIComponent(svgString)));
                width = (el.width && el.width.baseVal ? el.width.baseVal.value : 0) || el.offsetWidth || 0;
                height = (el.height && el.height.baseVal ? el.height.baseVal.value : 0) || el.offsetHeight || 0;
                alt = 'svg-image';
                kind = 'svg-element';
            }} else if (el.tagName === 'CANVAS') {{
                src = el.toDataURL();
                width = el.width || el.offsetWidth || 0;
                height = el.height || el.offsetHeight || 0;
                alt = 'canvas-image';
                kind = 'canvas-element';
            }} else {{
                src = el.getAttribute('data-src') || el.getAttribute('data-lazy') ||
                      el.getAttribute('data-original') || el.getAttribute('data-img') ||
                      el.getAttribute('data-image') || el.getAttribute('data-background');
                width = el.offsetWidth || 0;
                height = el.offsetHeight || 0;
                alt = el.getAttribute('aria-label') || el.getAttribute('title') || '';
                kind = 'data-attribute';
            }}
        }} catch (e) {{ continue; }}
        if (src) {{
            found.push({{ src: src, alt: alt, width: width, height: height, kind: kind }});
        }}
    }}
}}
return found;
"#
    )
}

/// Scans every element's computed `background-image` for `url(...)` refs.
/// Emits the same raw-candidate shape with kind `css-background`.
pub const COLLECT_BACKGROUNDS: &str = r#"
var found = [];
var urlPattern = /url\(["']?([^"')]+)["']?\)/g;
var all = document.querySelectorAll('*');
for (var i = 0; i < all.length; i++) {
    var el = all[i];
    var bg;
    try { bg = window.getComputedStyle(el).backgroundImage; } catch (e) { continue; }
    if (!bg || bg === 'none' || bg.indexOf('url(') === -1) { continue; }
    var match;
    while ((match = urlPattern.exec(bg)) !== null) {
        found.push({
            src: match[1],
            alt: 'background-image',
            width: el.offsetWidth || 0,
            height: el.offsetHeight || 0,
            kind: 'css-background'
        });
    }
}
return found;
"#;

/// Collects page-level style facts, logo heuristic, navigation, headings,
/// a visible-text excerpt and a cleaned-HTML preview.
pub const COLLECT_FACTS: &str = r#"
var bodyStyles = window.getComputedStyle(document.body);
var bgColor = bodyStyles.backgroundColor;
if (!bgColor || bgColor === 'rgba(0, 0, 0, 0)') { bgColor = '#ffffff'; }
var textColor = bodyStyles.color || '#333333';
var isDark = bgColor.indexOf('rgb(0') !== -1 || bgColor.indexOf('#000') !== -1 ||
             bgColor.indexOf('#202124') !== -1 || bgColor.indexOf('rgb(18') !== -1;

// Logo heuristic, fixed priority order
var logo = null;
var logoImageSelectors = [
    'img[alt*="logo" i]', 'img[src*="logo" i]',
    '.logo img', '.brand img', '.site-logo img', '.header-logo img', '.navbar-brand img',
    'nav img'
];
for (var i = 0; i < logoImageSelectors.length; i++) {
    var img;
    try { img = document.querySelector(logoImageSelectors[i]); } catch (e) { continue; }
    if (img && img.src) {
        logo = { kind: 'image', value: img.src };
        break;
    }
}
if (!logo) {
    var textLogoSelectors = ['.logo', '.brand', 'h1', '.site-title'];
    for (var j = 0; j < textLogoSelectors.length; j++) {
        var el = document.querySelector(textLogoSelectors[j]);
        if (el && el.textContent.trim()) {
            logo = { kind: 'text', value: el.textContent.trim() };
            break;
        }
    }
}

// Navigation, DOM order, capped at 10
var navLinks = [];
var navSelectors = ['nav a', '.nav a', 'header a', '.navbar a', '.menu a'];
for (var n = 0; n < navSelectors.length && navLinks.length < 10; n++) {
    var links = document.querySelectorAll(navSelectors[n]);
    for (var l = 0; l < links.length && navLinks.length < 10; l++) {
        var text = links[l].textContent.trim();
        if (text && text.length < 50) {
            navLinks.push({ text: text, href: links[l].href || '#' });
        }
    }
}

// Headings, capped at 8
var headings = [];
var headingEls = document.querySelectorAll('h1, h2, h3');
for (var h = 0; h < headingEls.length && headings.length < 8; h++) {
    var headingText = headingEls[h].textContent.trim();
    if (headingText) {
        headings.push({ text: headingText, level: parseInt(headingEls[h].tagName.substring(1)) });
    }
}

// Cleaned HTML preview: strip script/style/noscript/meta/link
var clone = document.documentElement.cloneNode(true);
var strip = clone.querySelectorAll('script, style, noscript, meta, link');
for (var k = 0; k < strip.length; k++) { strip[k].parentNode.removeChild(strip[k]); }

return {
    url: window.location.href,
    title: document.title,
    backgroundColor: bgColor,
    textColor: textColor,
    fontFamily: bodyStyles.fontFamily,
    isDark: isDark,
    logo: logo,
    navigation: navLinks,
    headings: headings,
    bodyText: (document.body.innerText || '').replace(/\s+/g, ' ').trim().substring(0, 2000),
    htmlPreview: clone.outerHTML.substring(0, 15000),
    hasSearch: !!document.querySelector('input[type="search"], input[name="q"], .search'),
    hasVideo: !!document.querySelector('video')
};
"#;
