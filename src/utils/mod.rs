pub mod logger;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn url_to_snake_case(url: &str) -> String {
    let mut s = url.to_lowercase();
    s = s.replace("https", "");
    s = s.replace("http", "");
    s = s.replace("://", "");
    s = s.replace(|c: char| !c.is_ascii_alphanumeric(), "_");
    while s.contains("__") {
        s = s.replace("__", "_");
    }
    s.trim_matches('_').to_string()
}

/// Write a captured PNG to the screenshot archive directory, returning the
/// path it was saved under.
pub fn archive_screenshot(dir: &str, url: &str, png: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {}", dir))?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let base_name = sanitize_filename::sanitize(url_to_snake_case(url));
    let file_path = Path::new(dir).join(format!("{}_{}.png", base_name, timestamp));

    fs::write(&file_path, png)
        .with_context(|| format!("Failed to write screenshot to {}", file_path.display()))?;

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_to_snake_case() {
        assert_eq!(
            url_to_snake_case("https://example.com/some/path"),
            "example_com_some_path"
        );
        assert_eq!(url_to_snake_case("http://a.b.c///x"), "a_b_c_x");
    }
}
