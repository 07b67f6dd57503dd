use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::attributes::attribute;
use super::{Stage, StageContext, fill_location};

const TAG_OPEN: &str = "[[image:";

static IMAGE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[image:[^\]]+\]\]").expect("image tag regex"));

/// Parsed `[[image:NAME attr="value" ...]]` tag.
///
/// `width`, `height` and `align` are parsed but have no Markdown rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTag {
    pub filename: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub align: Option<String>,
    pub caption: Option<String>,
    pub link: Option<String>,
}

impl ImageTag {
    /// Returns `None` when the tag has no file name.
    pub fn parse(tag: &str) -> Option<Self> {
        let body = tag.strip_prefix(TAG_OPEN)?;
        let body = body.strip_suffix("]]").unwrap_or(body);
        let filename = body.split(' ').next().unwrap_or("");
        if filename.is_empty() {
            return None;
        }
        Some(Self {
            filename: filename.to_string(),
            width: numeric_attribute(body, "width"),
            height: numeric_attribute(body, "height"),
            align: attribute(body, "align").map(ToString::to_string),
            caption: attribute(body, "caption").map(ToString::to_string),
            link: attribute(body, "link")
                .filter(|link| !link.is_empty())
                .map(ToString::to_string),
        })
    }

    /// Explicit caption, or the file name without its directory.
    pub fn caption(&self) -> &str {
        match &self.caption {
            Some(caption) => caption.as_str(),
            None => self
                .filename
                .rsplit('/')
                .next()
                .unwrap_or(&self.filename),
        }
    }

    pub fn to_markdown(&self, imagelocation: &str) -> String {
        let source = fill_location(imagelocation, &self.filename);
        match &self.link {
            Some(link) => format!("![{}]({source})({link})", self.caption()),
            None => format!("![{}]({source})", self.caption()),
        }
    }
}

pub(super) fn convert_images(buffer: &str, context: &mut StageContext<'_>) -> String {
    let imagelocation = context.options.imagelocation.clone();
    let diagnostics = &mut context.diagnostics;
    IMAGE_TAG
        .replace_all(buffer, |caps: &Captures| {
            let tag = &caps[0];
            diagnostics.record(Stage::Images, tag);
            match ImageTag::parse(tag) {
                Some(image) => image.to_markdown(&imagelocation),
                None => tag.to_string(),
            }
        })
        .into_owned()
}

fn numeric_attribute(tag: &str, name: &str) -> Option<u32> {
    attribute(tag, name)
        .filter(|value| !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit()))
        .and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::{Diagnostics, TranslateOptions};

    #[test]
    fn parse_reads_all_attributes() {
        let image = ImageTag::parse(
            r#"[[image:photos/cat.jpg width="120" height="80" align="right" caption="A cat" link="http://cats.example"]]"#,
        )
        .expect("image");
        assert_eq!(
            image,
            ImageTag {
                filename: "photos/cat.jpg".to_string(),
                width: Some(120),
                height: Some(80),
                align: Some("right".to_string()),
                caption: Some("A cat".to_string()),
                link: Some("http://cats.example".to_string()),
            }
        );
    }

    #[test]
    fn caption_defaults_to_base_filename() {
        let image = ImageTag::parse("[[image:photos/cat.jpg]]").expect("image");
        assert_eq!(image.caption(), "cat.jpg");
        assert_eq!(image.to_markdown("/img/%s"), "![cat.jpg](/img/photos/cat.jpg)");
    }

    #[test]
    fn non_numeric_dimensions_are_absent() {
        let image = ImageTag::parse(r#"[[image:a.png width="wide" height="+4"]]"#).expect("image");
        assert_eq!(image.width, None);
        assert_eq!(image.height, None);
    }

    #[test]
    fn empty_link_renders_without_link_suffix() {
        let image = ImageTag::parse(r#"[[image:a.png link=""]]"#).expect("image");
        assert_eq!(image.to_markdown("%s"), "![a.png](a.png)");
    }

    #[test]
    fn tag_without_filename_is_left_in_place() {
        assert_eq!(ImageTag::parse(r#"[[image: caption="x"]]"#), None);
        let mut context =
            StageContext::new(&TranslateOptions::default(), None, Diagnostics::silent());
        assert_eq!(
            convert_images(r#"[[image: caption="x"]]"#, &mut context),
            r#"[[image: caption="x"]]"#
        );
    }

    #[test]
    fn convert_images_uses_configured_location() {
        let options = TranslateOptions {
            imagelocation: "https://cdn.example/%s".to_string(),
            ..TranslateOptions::default()
        };
        let mut context = StageContext::new(&options, None, Diagnostics::silent());
        assert_eq!(
            convert_images("x [[image:a.png caption=\"A\"]] y", &mut context),
            "x ![A](https://cdn.example/a.png) y"
        );
    }
}
