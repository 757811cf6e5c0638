use crate::{
    error::{ModelError, Result},
    marker::Coordinate,
};

/// Last-viewed map region: centre plus the visible span in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Viewport {
    pub fn new(
        center: Coordinate,
        latitude_delta: f64,
        longitude_delta: f64,
    ) -> Result<Self> {
        let span_ok = |delta: f64, max: f64| {
            delta.is_finite() && delta > 0.0 && delta <= max
        };
        if !span_ok(latitude_delta, 180.0) || !span_ok(longitude_delta, 360.0)
        {
            return Err(ModelError::InvalidViewport(format!(
                "span {latitude_delta}x{longitude_delta} out of range"
            )));
        }

        Ok(Self {
            center_latitude: center.latitude(),
            center_longitude: center.longitude(),
            latitude_delta,
            longitude_delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_or_oversized_spans() {
        let center = Coordinate::new(0.0, 0.0).unwrap();
        assert!(Viewport::new(center, 0.0, 1.0).is_err());
        assert!(Viewport::new(center, 1.0, 400.0).is_err());
        assert!(Viewport::new(center, 12.5, 20.0).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_a_flat_object() {
        let center = Coordinate::new(48.85, 2.35).unwrap();
        let viewport = Viewport::new(center, 0.5, 0.75).unwrap();
        let json = serde_json::to_value(viewport).unwrap();
        assert_eq!(json["center_latitude"], 48.85);
        assert_eq!(json["longitude_delta"], 0.75);
    }
}
