//! The fixed OGP layout
//!
//! Title, date and author are text content only; maud escapes them, so markup
//! in user input shows up as literal characters in the image.

use maud::{html, PreEscaped, DOCTYPE};

/// Icon edge length in CSS pixels
pub const ICON_SIZE: u32 = 100;

/// Everything the layout needs for one image.
#[derive(Debug, Clone, Copy)]
pub struct OgpInfo<'a> {
    pub title: &'a str,
    pub date: &'a str,
    pub author: &'a str,
    /// Icon as a `data:` URI
    pub icon: &'a str,
    /// Stylesheet inlined into `<head>`
    pub style: &'a str,
}

/// Compose the complete HTML document.
pub fn render(info: &OgpInfo<'_>) -> String {
    html! {
        (DOCTYPE)
        html lang="ja" {
            head {
                meta charset="utf-8";
                style { (PreEscaped(info.style)) }
            }
            body {
                div #Wrapper {
                    div #Title {
                        p { (info.title) }
                    }
                    div #Name {
                        img src=(info.icon) alt="" width=(ICON_SIZE) height=(ICON_SIZE);
                        span { (info.author) }
                    }
                    div #Date {
                        p { (info.date) }
                    }
                }
            }
        }
    }
    .into_string()
}
