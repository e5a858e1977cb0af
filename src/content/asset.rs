/// Image reference to URL mapping
use crate::content::ImageRef;

/// Default image CDN
pub const DEFAULT_CDN_URL: &str = "https://cdn.sanity.io";

/// Resolves opaque image references into displayable URLs
///
/// Pure and infallible: references it does not recognise are served from the
/// CDN root unchanged.
#[derive(Debug, Clone)]
pub struct AssetUrlResolver {
    cdn_url: String,
    project_id: String,
    dataset: String,
}

impl AssetUrlResolver {
    pub fn new(
        cdn_url: impl Into<String>,
        project_id: impl Into<String>,
        dataset: impl Into<String>,
    ) -> Self {
        Self {
            cdn_url: cdn_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    /// Resolve a reference to a URL
    pub fn resolve(&self, image: &ImageRef) -> String {
        let reference = image.as_str();

        if reference.starts_with("https://") || reference.starts_with("http://") {
            return reference.to_string();
        }

        match parse_image_asset(reference) {
            Some((asset_id, dimensions, format)) => format!(
                "{}/images/{}/{}/{}-{}.{}",
                self.cdn_url, self.project_id, self.dataset, asset_id, dimensions, format
            ),
            None => format!("{}/{}", self.cdn_url, reference.trim_start_matches('/')),
        }
    }
}

/// `image-<assetId>-<W>x<H>-<format>` -> (assetId, "WxH", format)
fn parse_image_asset(reference: &str) -> Option<(&str, &str, &str)> {
    let body = reference.strip_prefix("image-")?;
    let (rest, format) = body.rsplit_once('-')?;
    let (asset_id, dimensions) = rest.rsplit_once('-')?;

    let (width, height) = dimensions.split_once('x')?;
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if asset_id.is_empty() || format.is_empty() || !numeric(width) || !numeric(height) {
        return None;
    }

    Some((asset_id, dimensions, format))
}
