use std::fmt;

use url::Url;

use crate::{
    error::{ModelError, Result},
    marker::{LATITUDE_RANGE, LONGITUDE_RANGE},
};

/// A remote photo chosen from a search result.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageRef {
    pub remote_url: Url,
    /// Last path segment of `remote_url`, as returned by the API.
    pub basename: String,
    pub title: Option<String>,
}

impl ImageRef {
    pub fn parse(url: &str, title: Option<String>) -> Result<Self> {
        let remote_url = Url::parse(url).map_err(|err| {
            ModelError::InvalidImageUrl(format!("{url}: {err}"))
        })?;
        let basename = remote_url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            remote_url,
            basename,
            title,
        })
    }
}

/// Rectangular lat/lon search region, never wrapping past the valid ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Box of `half_width` x `half_height` degrees centred on the point,
    /// clamped to [-180, 180] x [-90, 90].
    pub fn around(
        latitude: f64,
        longitude: f64,
        half_width: f64,
        half_height: f64,
    ) -> Self {
        Self {
            min_lon: (longitude - half_width).max(LONGITUDE_RANGE.0),
            min_lat: (latitude - half_height).max(LATITUDE_RANGE.0),
            max_lon: (longitude + half_width).min(LONGITUDE_RANGE.1),
            max_lat: (latitude + half_height).min(LATITUDE_RANGE.1),
        }
    }
}

/// `min_lon,min_lat,max_lon,max_lat`, the order the search API expects.
impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_at_the_north_east_corner() {
        let bbox = BoundingBox::around(90.0, 180.0, 1.0, 1.0);
        assert_eq!(bbox.max_lon, 180.0);
        assert_eq!(bbox.max_lat, 90.0);
        assert_eq!(bbox.min_lon, 179.0);
        assert_eq!(bbox.min_lat, 89.0);
    }

    #[test]
    fn clamps_at_the_south_west_corner() {
        let bbox = BoundingBox::around(-89.5, -179.5, 1.0, 1.0);
        assert_eq!(bbox.min_lon, -180.0);
        assert_eq!(bbox.min_lat, -90.0);
        assert_eq!(bbox.max_lon, -178.5);
        assert_eq!(bbox.max_lat, -88.5);
    }

    #[test]
    fn display_uses_lon_lat_order() {
        let bbox = BoundingBox::around(10.0, 20.0, 1.0, 0.5);
        assert_eq!(bbox.to_string(), "19,9.5,21,10.5");
    }

    #[test]
    fn image_ref_takes_the_last_path_segment() {
        let image = ImageRef::parse(
            "https://live.staticflickr.com/65535/53001_abc123_m.jpg",
            Some("Golden Gate".into()),
        )
        .unwrap();
        assert_eq!(image.basename, "53001_abc123_m.jpg");
        assert_eq!(image.title.as_deref(), Some("Golden Gate"));
    }

    #[test]
    fn image_ref_rejects_relative_urls() {
        assert!(ImageRef::parse("/65535/photo.jpg", None).is_err());
    }
}
