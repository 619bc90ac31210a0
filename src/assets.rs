//! Static assets embedded into every rendered page
//!
//! The icon and both fonts are read and base64 encoded exactly once, when the
//! bundle is loaded at startup. The resulting stylesheet and icon data URI are
//! immutable afterwards and shared by all requests.

use std::path::{Path, PathBuf};

use base64::Engine as Base64Engine;

use crate::{Error, Result};

/// Icon file, relative to the asset directory
pub const ICON_FILE: &str = "rintaro.webp";
/// Monospace font used for the date, relative to the asset directory
pub const MONO_FONT_FILE: &str = "fonts/RobotoMono-Medium.woff2";
/// Body font, relative to the asset directory
pub const BODY_FONT_FILE: &str = "fonts/NotoSansJp-Bold.woff2";

const LAYOUT_CSS: &str = r#"* {
  margin: 0;
  padding: 0;
}
html,
body {
  width: 100%;
  height: 100%;
  background: #2e3440;
  font-family: "Noto Sans JP", sans-serif;
  font-size: 125%;
  color: #d8dee9;
}
body {
  display: flex;
  justify-content: center;
  align-items: center;
  background: linear-gradient(to right bottom, #b48ead, #81a1c1);
}
#Wrapper {
  margin: 50px;
  grid-gap: 30px;
  border-radius: 30px;
  background: #2e3440;
  box-shadow: 10px 10px 20px rgba(28, 25, 33, 0.4),
    -10px -10px 20px rgba(28, 25, 33, 0.4);
  padding: 50px;
  display: grid;
  grid-template-rows: 280px 100px;
  grid-template-columns: 700px 250px;
  grid-template-areas: "Title Title" "Name Date";
}
#Wrapper #Title {
  font-size: 60px;
  grid-area: Title;
  display: flex;
  justify-content: center;
  align-items: center;
  overflow: hidden;
}
#Wrapper #Title p {
  max-height: 100%;
  overflow-wrap: anywhere;
}
#Wrapper #Name {
  grid-area: Name;
  display: flex;
  flex-direction: row;
  align-items: center;
  gap: 20px;
}
#Wrapper #Name img {
  margin-right: 20px;
  border-radius: 50%;
}
#Wrapper #Date {
  grid-area: Date;
  display: flex;
  align-items: center;
  justify-content: flex-end;
  font-family: "Roboto Mono", monospace;
}
"#;

/// Icon and stylesheet, ready to be inlined into a document.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    icon: String,
    style: String,
}

impl AssetBundle {
    /// Read the icon and fonts from `dir` and build the bundle.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let icon_path = dir.join(ICON_FILE);
        let icon = read_base64(&icon_path)?;
        let mono = read_base64(&dir.join(MONO_FONT_FILE))?;
        let noto = read_base64(&dir.join(BODY_FONT_FILE))?;

        log::debug!("Loaded assets from {}", dir.display());

        Ok(Self::from_encoded(icon_mime(&icon_path), &icon, &mono, &noto))
    }

    /// Build a bundle from already base64-encoded parts.
    pub fn from_encoded(icon_mime: &str, icon_b64: &str, mono_b64: &str, noto_b64: &str) -> Self {
        let icon = format!("data:{};base64,{}", icon_mime, icon_b64);
        let style = format!(
            r#"
@font-face {{
  font-family: "Noto Sans JP";
  font-style: normal;
  font-weight: bold;
  src: url(data:font/woff2;charset=utf-8;base64,{noto}) format("woff2");
  font-display: swap;
}}
@font-face {{
  font-family: "Roboto Mono";
  font-style: normal;
  font-weight: 500;
  src: url(data:font/woff2;charset=utf-8;base64,{mono}) format("woff2");
  font-display: swap;
}}
{layout}"#,
            noto = noto_b64,
            mono = mono_b64,
            layout = LAYOUT_CSS,
        );
        Self { icon, style }
    }

    /// The icon as a `data:` URI
    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// The page stylesheet with both fonts inlined
    pub fn style(&self) -> &str {
        &self.style
    }
}

fn read_base64(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|source| Error::Asset {
        path: PathBuf::from(path),
        source,
    })?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn icon_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("webp") => "image/webp",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
