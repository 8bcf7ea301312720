//! Bleed-trail footprints and their planar extent on the sky.
//! All coordinates are degrees, f64.

use serde::{Deserialize, Serialize};

/// Band label substituted for records that arrive without one.
pub const MISSING_BAND: &str = "None";

/// One bleed-trail record as delivered by the upstream footprint query.
///
/// Provenance fields are optional and only used for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintRecord {
    #[serde(default)]
    pub band: Option<String>,
    pub ra_1: f64,
    pub ra_2: f64,
    pub ra_3: f64,
    pub ra_4: f64,
    pub dec_1: f64,
    pub dec_2: f64,
    pub dec_3: f64,
    pub dec_4: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expnum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ccdnum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rnum: Option<i64>,
}

impl FootprintRecord {
    pub fn new(band: Option<&str>, ra: [f64; 4], dec: [f64; 4]) -> Self {
        Self {
            band: band.map(str::to_owned),
            ra_1: ra[0],
            ra_2: ra[1],
            ra_3: ra[2],
            ra_4: ra[3],
            dec_1: dec[0],
            dec_2: dec[1],
            dec_3: dec[2],
            dec_4: dec[3],
            filename: None,
            expnum: None,
            ccdnum: None,
            rnum: None,
        }
    }

    /// Band label with absent or empty values normalized to [`MISSING_BAND`].
    /// Other labels are used verbatim.
    pub fn band_label(&self) -> &str {
        match self.band.as_deref() {
            Some(b) if !b.is_empty() => b,
            _ => MISSING_BAND,
        }
    }

    pub fn ra_corners(&self) -> [f64; 4] {
        [self.ra_1, self.ra_2, self.ra_3, self.ra_4]
    }

    pub fn dec_corners(&self) -> [f64; 4] {
        [self.dec_1, self.dec_2, self.dec_3, self.dec_4]
    }

    pub fn has_finite_corners(&self) -> bool {
        self.ra_corners()
            .iter()
            .chain(self.dec_corners().iter())
            .all(|v| v.is_finite())
    }
}

/// Fold a corner RA above 180° down by 360°.
///
/// Planar approximation only: keeps trails straddling RA 0° contiguous so
/// their centre and extent are not smeared across the whole sky.
#[inline]
pub fn normalize_ra(ra: f64) -> f64 {
    if ra > 180.0 {
        ra - 360.0
    } else {
        ra
    }
}

/// Axis-aligned extent of one trail, derived once from its four corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub ra_center: f64,
    pub dec_center: f64,
    pub ra_min: f64,
    pub ra_max: f64,
    pub dec_min: f64,
    pub dec_max: f64,
    pub ra_size: f64,
    pub dec_size: f64,
}

impl Footprint {
    pub fn from_corners(ra: [f64; 4], dec: [f64; 4]) -> Self {
        let ra = ra.map(normalize_ra);

        let ra_center = ra.iter().sum::<f64>() / 4.0;
        let dec_center = dec.iter().sum::<f64>() / 4.0;
        let ra_min = ra.iter().cloned().fold(f64::INFINITY, f64::min);
        let ra_max = ra.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let dec_min = dec.iter().cloned().fold(f64::INFINITY, f64::min);
        let dec_max = dec.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        Self {
            ra_center,
            dec_center,
            ra_min,
            ra_max,
            dec_min,
            dec_max,
            ra_size: ra_max - ra_min,
            dec_size: dec_max - dec_min,
        }
    }

    pub fn from_record(record: &FootprintRecord) -> Self {
        Self::from_corners(record.ra_corners(), record.dec_corners())
    }

    /// Axis-aligned box of the given size centred on (ra, dec).
    pub fn from_center_size(ra_center: f64, dec_center: f64, ra_size: f64, dec_size: f64) -> Self {
        let (hr, hd) = (ra_size / 2.0, dec_size / 2.0);
        Self::from_corners(
            [ra_center - hr, ra_center + hr, ra_center + hr, ra_center - hr],
            [dec_center - hd, dec_center - hd, dec_center + hd, dec_center + hd],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalize_ra_only_shifts_above_180() {
        assert_eq!(normalize_ra(180.0), 180.0);
        assert_eq!(normalize_ra(10.0), 10.0);
        assert_abs_diff_eq!(normalize_ra(359.5), -0.5, epsilon = 1e-12);
    }

    #[test]
    fn extent_from_plain_corners() {
        let fp = Footprint::from_corners([10.0, 10.2, 10.2, 10.0], [-20.0, -20.0, -19.9, -19.9]);
        assert_abs_diff_eq!(fp.ra_center, 10.1, epsilon = 1e-12);
        assert_abs_diff_eq!(fp.dec_center, -19.95, epsilon = 1e-12);
        assert_abs_diff_eq!(fp.ra_size, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(fp.dec_size, 0.1, epsilon = 1e-12);
        assert_eq!(fp.ra_min, 10.0);
        assert_eq!(fp.dec_max, -19.9);
    }

    #[test]
    fn trail_across_ra_seam_stays_compact() {
        let fp = Footprint::from_corners([359.99, 0.01, 0.01, 359.99], [5.0, 5.0, 5.01, 5.01]);
        assert_abs_diff_eq!(fp.ra_center, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(fp.ra_min, -0.01, epsilon = 1e-9);
        assert_abs_diff_eq!(fp.ra_size, 0.02, epsilon = 1e-9);
    }

    #[test]
    fn center_size_round_trips() {
        let fp = Footprint::from_center_size(10.0, -20.0, 0.01, 0.02);
        assert_abs_diff_eq!(fp.ra_center, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fp.dec_center, -20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fp.ra_size, 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(fp.dec_size, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn empty_or_missing_band_becomes_none_label() {
        let mut rec = FootprintRecord::new(None, [0.0; 4], [0.0; 4]);
        assert_eq!(rec.band_label(), MISSING_BAND);
        rec.band = Some(String::new());
        assert_eq!(rec.band_label(), MISSING_BAND);
        rec.band = Some(" Y ".into());
        assert_eq!(rec.band_label(), " Y ");
        rec.band = Some("r".into());
        assert_eq!(rec.band_label(), "r");
    }

    #[test]
    fn record_deserializes_without_provenance() {
        let json = r#"{"band":"g","ra_1":1,"ra_2":2,"ra_3":2,"ra_4":1,
                       "dec_1":0,"dec_2":0,"dec_3":1,"dec_4":1,"tilename":"DES0000+0000"}"#;
        let rec: FootprintRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.band_label(), "g");
        assert!(rec.filename.is_none());
        assert!(rec.has_finite_corners());
    }
}
