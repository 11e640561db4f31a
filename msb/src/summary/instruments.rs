//! Per-instrument extraction of waveband, disperser and mode.
//!
//! The instrument set is closed; each family is one arm of a `match`.
//! Waveband comes either from a filter name or from an explicit central
//! wavelength, whichever the component carries.

use crate::program::{Instrument, InstrumentComponent};

pub const MODE_IMAGING: &str = "imaging";
pub const MODE_SPECTROSCOPY: &str = "spectroscopy";

/// Instrument configuration digested for matching.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InstrumentSummary {
    pub instrument: Instrument,
    pub waveband: Option<String>,
    pub disperser: Option<String>,
    pub pol: bool,
    pub mode: &'static str,
}

impl InstrumentSummary {
    pub fn telescope(&self) -> &'static str {
        self.instrument.telescope()
    }
}

fn waveband_of(component: &InstrumentComponent) -> Option<String> {
    component
        .filter
        .clone()
        .or_else(|| component.central_wavelength.map(|w| w.to_string()))
}

fn polariser_enabled(component: &InstrumentComponent) -> bool {
    component
        .polariser
        .as_deref()
        .map(|p| !p.eq_ignore_ascii_case("none"))
        .unwrap_or(false)
}

/// Digests a raw instrument component.
pub fn summarize_instrument(component: &InstrumentComponent) -> InstrumentSummary {
    let pol = polariser_enabled(component);
    let waveband = waveband_of(component);
    match component.instrument {
        // CGS4 is a pure spectrometer.
        Instrument::Cgs4 => InstrumentSummary {
            instrument: Instrument::Cgs4,
            waveband,
            disperser: component.disperser.clone(),
            pol,
            mode: MODE_SPECTROSCOPY,
        },
        // Michelle switches between camera and spectrometer.
        Instrument::Michelle => {
            let spectroscopy = component
                .camera
                .as_deref()
                .map(|c| c.eq_ignore_ascii_case(MODE_SPECTROSCOPY))
                .unwrap_or(false);
            InstrumentSummary {
                instrument: Instrument::Michelle,
                waveband,
                disperser: if spectroscopy {
                    component.disperser.clone()
                } else {
                    None
                },
                pol,
                mode: if spectroscopy {
                    MODE_SPECTROSCOPY
                } else {
                    MODE_IMAGING
                },
            }
        }
        Instrument::Ufti | Instrument::Ircam | Instrument::Scuba => InstrumentSummary {
            instrument: component.instrument,
            waveband,
            disperser: None,
            pol,
            mode: MODE_IMAGING,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cgs4_wavelength_and_disperser() {
        let mut c = InstrumentComponent::new(Instrument::Cgs4);
        c.central_wavelength = Some(2.2);
        c.disperser = Some("40lpmm".to_string());
        let s = summarize_instrument(&c);
        assert_eq!(s.mode, MODE_SPECTROSCOPY);
        assert_eq!(s.waveband.as_deref(), Some("2.2"));
        assert_eq!(s.disperser.as_deref(), Some("40lpmm"));
        assert_eq!(s.telescope(), "UKIRT");
    }

    #[test]
    fn test_ufti_filter_imaging() {
        let mut c = InstrumentComponent::new(Instrument::Ufti);
        c.filter = Some("K98".to_string());
        let s = summarize_instrument(&c);
        assert_eq!(s.mode, MODE_IMAGING);
        assert_eq!(s.waveband.as_deref(), Some("K98"));
        assert_eq!(s.disperser, None);
    }

    #[test]
    fn test_michelle_camera_selects_mode() {
        let mut c = InstrumentComponent::new(Instrument::Michelle);
        c.camera = Some("spectroscopy".to_string());
        c.filter = Some("N".to_string());
        c.disperser = Some("LowN".to_string());
        let s = summarize_instrument(&c);
        assert_eq!(s.mode, MODE_SPECTROSCOPY);
        assert_eq!(s.disperser.as_deref(), Some("LowN"));

        c.camera = Some("imaging".to_string());
        let s = summarize_instrument(&c);
        assert_eq!(s.mode, MODE_IMAGING);
        assert_eq!(s.disperser, None);
    }

    #[test]
    fn test_polariser_none_is_disabled() {
        let mut c = InstrumentComponent::new(Instrument::Ircam);
        c.polariser = Some("none".to_string());
        assert!(!summarize_instrument(&c).pol);
        c.polariser = Some("prism".to_string());
        assert!(summarize_instrument(&c).pol);
        c.polariser = None;
        assert!(!summarize_instrument(&c).pol);
    }

    #[test]
    fn test_scuba_is_jcmt() {
        let c = InstrumentComponent::new(Instrument::Scuba);
        assert_eq!(summarize_instrument(&c).telescope(), "JCMT");
    }
}
