//! Coordinate-frame interpretation for target components.
//!
//! Only the tags and raw axis values are interpreted here; actual frame
//! conversion and ephemeris lookup are the business of an external
//! coordinate library.

use crate::error::{MsbError, MsbResult};
use crate::program::TargetComponent;

/// Solar-system bodies the downstream coordinate library can look up.
const NAMED_BODIES: &[&str] = &[
    "sun", "moon", "mercury", "venus", "mars", "jupiter", "saturn", "uranus", "neptune", "pluto",
];

/// A target with its frame tag interpreted.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ResolvedTarget {
    pub name: String,
    /// Coordinate type: `RADEC`, `GALACTIC` or `PLANET`.
    pub coordstype: &'static str,
    /// Equinox for equatorial coordinates.
    pub epoch: Option<&'static str>,
    pub axis1: f64,
    pub axis2: f64,
}

/// Interprets a raw target component.
///
/// Three frame families are supported: equatorial/galactic fixed points,
/// orbital elements (`conic`, not implemented) and solar-system body lookup
/// (`named`, only for bodies in the recognized set). Anything else is a
/// structural error in the document.
pub fn resolve_target(component: &TargetComponent) -> MsbResult<ResolvedTarget> {
    let frame = component.frame.as_deref().unwrap_or("J2000");
    match frame.to_ascii_lowercase().as_str() {
        // Bare "1950" in old programs means B1950.
        "j2000" => equatorial(component, "J2000"),
        "b1950" | "1950" => equatorial(component, "B1950"),
        "galactic" => Ok(ResolvedTarget {
            name: component.name.clone(),
            coordstype: "GALACTIC",
            epoch: None,
            axis1: component.axis1,
            axis2: component.axis2,
        }),
        "conic" => Err(MsbError::UnsupportedTarget(format!(
            "orbital elements target '{}'",
            component.name
        ))),
        "named" => {
            if NAMED_BODIES
                .iter()
                .any(|b| component.name.eq_ignore_ascii_case(b))
            {
                Ok(ResolvedTarget {
                    name: component.name.clone(),
                    coordstype: "PLANET",
                    epoch: None,
                    axis1: 0.0,
                    axis2: 0.0,
                })
            } else {
                Err(MsbError::UnsupportedTarget(format!(
                    "unknown solar-system body '{}'",
                    component.name
                )))
            }
        }
        other => Err(MsbError::UnknownCoordFrame(other.to_string())),
    }
}

fn equatorial(component: &TargetComponent, epoch: &'static str) -> MsbResult<ResolvedTarget> {
    Ok(ResolvedTarget {
        name: component.name.clone(),
        coordstype: "RADEC",
        epoch: Some(epoch),
        axis1: component.axis1,
        axis2: component.axis2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(name: &str, frame: Option<&str>) -> TargetComponent {
        TargetComponent {
            name: name.to_string(),
            frame: frame.map(str::to_string),
            axis1: 123.4,
            axis2: -56.7,
        }
    }

    #[test]
    fn test_default_epoch_is_j2000() {
        let t = resolve_target(&component("FS1", None)).unwrap();
        assert_eq!(t.coordstype, "RADEC");
        assert_eq!(t.epoch, Some("J2000"));
    }

    #[test]
    fn test_bare_1950_maps_to_b1950() {
        let t = resolve_target(&component("FS1", Some("1950"))).unwrap();
        assert_eq!(t.epoch, Some("B1950"));
    }

    #[test]
    fn test_named_body_lookup() {
        let t = resolve_target(&component("Mars", Some("named"))).unwrap();
        assert_eq!(t.coordstype, "PLANET");

        let err = resolve_target(&component("Vulcan", Some("named"))).unwrap_err();
        assert!(matches!(err, MsbError::UnsupportedTarget(_)));
    }

    #[test]
    fn test_conic_is_unsupported() {
        let err = resolve_target(&component("Halley", Some("conic"))).unwrap_err();
        assert!(matches!(err, MsbError::UnsupportedTarget(_)));
    }

    #[test]
    fn test_unknown_frame_is_fatal() {
        let err = resolve_target(&component("FS1", Some("hyperbolic"))).unwrap_err();
        assert!(matches!(err, MsbError::UnknownCoordFrame(_)));
    }
}
