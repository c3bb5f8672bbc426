//! Apparent topocentric positions from the `celestial` crates.
//!
//! Catalog coordinates are ICRS (J2000). They go through light deflection,
//! annual aberration and IAU 2006/2000A precession-nutation into CIRS, then
//! through Greenwich apparent sidereal time into hour angle and the local
//! horizon. The Sun and planets come from VSOP2013, the Moon from ELP/MPP02.
//! UT1 is taken equal to UTC; the difference stays under a second.

use celestial_coords::{CIRSPosition, CoordinateFrame, ICRSPosition, Location, Vector3};
use celestial_core::constants::AU_KM;
use celestial_ephemeris::moon::ElpMpp02Moon;
use celestial_ephemeris::planets::{
    Vsop2013Jupiter, Vsop2013Mars, Vsop2013Mercury, Vsop2013Neptune, Vsop2013Saturn,
    Vsop2013Uranus, Vsop2013Venus,
};
use celestial_ephemeris::Vsop2013Sun;
use celestial_time::{ToTAI, ToTDB, ToTT, TDB, TT, UTC};
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::trace;

use crate::{
    Coordinates, Equatorial, GeoPosition, Horizontal, HorizontalTransform, Result, SkyError,
    SolarSystemBody,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Default backend for the planner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApparentSky;

impl HorizontalTransform for ApparentSky {
    fn to_horizontal(
        &self,
        coordinates: &Coordinates,
        observer: &GeoPosition,
        time: DateTime<Utc>,
    ) -> Result<Horizontal> {
        observer.validate()?;
        let epoch = Epoch::at(time)?;
        let site =
            Location::from_degrees(observer.latitude, observer.longitude, observer.elevation_m)
                .map_err(library)?;

        let icrs = match coordinates {
            Coordinates::Equatorial(eq) => {
                ICRSPosition::from_degrees(eq.ra_deg, eq.dec_deg).map_err(library)?
            }
            Coordinates::SolarSystem { body } => geocentric(*body, &epoch.tdb)?,
        };

        let cirs = CIRSPosition::from_icrs(&icrs, &epoch.tt).map_err(library)?;
        let mut hour_angle = cirs.to_hour_angle(&site, epoch.delta_t).map_err(library)?;
        if let Some(distance) = icrs.distance() {
            hour_angle.set_distance(distance);
        }
        // Only bodies carry a distance, so stars get no parallax
        let topo = hour_angle
            .to_topocentric()
            .map_err(library)?
            .with_diurnal_parallax();

        let horizontal = Horizontal {
            altitude_deg: topo.elevation().degrees(),
            azimuth_deg: normalize_degrees(topo.azimuth().degrees()),
        };
        trace!(
            "alt {:.3} az {:.3} at {}",
            horizontal.altitude_deg,
            horizontal.azimuth_deg,
            time
        );
        Ok(horizontal)
    }
}

/// Geometric geocentric ICRS direction of a body at `time`.
pub fn body_equatorial(body: SolarSystemBody, time: DateTime<Utc>) -> Result<Equatorial> {
    let epoch = Epoch::at(time)?;
    let icrs = geocentric(body, &epoch.tdb)?;
    Equatorial::new(normalize_degrees(icrs.ra().degrees()), icrs.dec().degrees())
}

struct Epoch {
    tt: TT,
    tdb: TDB,
    /// TT − UT1 in seconds
    delta_t: f64,
}

impl Epoch {
    fn at(time: DateTime<Utc>) -> Result<Self> {
        let utc = UTC::new(time.timestamp(), time.timestamp_subsec_nanos());
        let tt = utc.to_tai().and_then(|tai| tai.to_tt()).map_err(library)?;
        let tdb = tt.to_tdb_greenwich().map_err(library)?;

        let (tt_jd, utc_jd) = (tt.to_julian_date(), utc.to_julian_date());
        let delta_t =
            ((tt_jd.jd1() - utc_jd.jd1()) + (tt_jd.jd2() - utc_jd.jd2())) * SECONDS_PER_DAY;

        Ok(Self { tt, tdb, delta_t })
    }
}

fn geocentric(body: SolarSystemBody, tdb: &TDB) -> Result<ICRSPosition> {
    let position_au = match body {
        SolarSystemBody::Sun => Vsop2013Sun.geocentric_position(tdb),
        SolarSystemBody::Moon => ElpMpp02Moon::new()
            .geocentric_position_icrs(tdb)
            .map(|km| Vector3::new(km[0] / AU_KM, km[1] / AU_KM, km[2] / AU_KM)),
        SolarSystemBody::Mercury => Vsop2013Mercury.geocentric_position(tdb),
        SolarSystemBody::Venus => Vsop2013Venus.geocentric_position(tdb),
        SolarSystemBody::Mars => Vsop2013Mars.geocentric_position(tdb),
        SolarSystemBody::Jupiter => Vsop2013Jupiter.geocentric_position(tdb),
        SolarSystemBody::Saturn => Vsop2013Saturn.geocentric_position(tdb),
        SolarSystemBody::Uranus => Vsop2013Uranus.geocentric_position(tdb),
        SolarSystemBody::Neptune => Vsop2013Neptune.geocentric_position(tdb),
    }
    .map_err(|e| SkyError::Unavailable(format!("{} ephemeris: {}", body, e)))?;

    ICRSPosition::from_position_vector(position_au).map_err(library)
}

fn library(e: impl fmt::Display) -> SkyError {
    SkyError::Unavailable(e.to_string())
}

fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_catalog_coordinates_precessed_to_date() {
        // M42 from Paris; treating the J2000 RA/Dec as coordinates of date
        // lands at alt -9.253 az 87.609 instead
        let m42 = Coordinates::Equatorial(Equatorial::parse("05h35m17.3s", "-05d23m28s").unwrap());
        let t = Utc.with_ymd_and_hms(2025, 10, 19, 21, 0, 0).unwrap();
        let h = ApparentSky.to_horizontal(&m42, &GeoPosition::DEFAULT, t).unwrap();
        assert!(close(h.altitude_deg, -9.451, 0.05), "alt {}", h.altitude_deg);
        assert!(close(h.azimuth_deg, 87.359, 0.05), "az {}", h.azimuth_deg);
    }

    #[test]
    fn test_pole_altitude_tracks_latitude() {
        let pole = Coordinates::Equatorial(Equatorial::new(0.0, 90.0).unwrap());
        let observer = GeoPosition::new(52.0, 13.4).unwrap();
        let t = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let h = ApparentSky.to_horizontal(&pole, &observer, t).unwrap();
        // The J2000 pole sits ~0.13° from the pole of date by 2024
        assert!(close(h.altitude_deg, 52.0, 0.5), "alt {}", h.altitude_deg);
        assert!(h.azimuth_deg < 1.0 || h.azimuth_deg > 359.0, "az {}", h.azimuth_deg);
    }

    #[test]
    fn test_moon_geocentric_position() {
        // 1992-04-12 0h: apparent RA 134.688°, Dec +13.768° (equinox of date)
        let t = Utc.with_ymd_and_hms(1992, 4, 12, 0, 0, 0).unwrap();
        let moon = body_equatorial(SolarSystemBody::Moon, t).unwrap();
        assert!(close(moon.ra_deg, 134.688, 0.3), "ra {}", moon.ra_deg);
        assert!(close(moon.dec_deg, 13.768, 0.3), "dec {}", moon.dec_deg);
    }

    #[test]
    fn test_sun_geocentric_position() {
        // 1992-10-13 0h: apparent RA 198.381°, Dec -7.785° (equinox of date)
        let t = Utc.with_ymd_and_hms(1992, 10, 13, 0, 0, 0).unwrap();
        let sun = body_equatorial(SolarSystemBody::Sun, t).unwrap();
        assert!(close(sun.ra_deg, 198.381, 0.3), "ra {}", sun.ra_deg);
        assert!(close(sun.dec_deg, -7.785, 0.3), "dec {}", sun.dec_deg);
    }

    #[test]
    fn test_moon_parallax_lowers_altitude() {
        // Topocentric Moon sits up to ~1° below the geocentric direction
        let t = Utc.with_ymd_and_hms(1992, 4, 12, 0, 0, 0).unwrap();
        let observer = GeoPosition::new(0.0, 0.0).unwrap();
        let geocentric = Coordinates::Equatorial(body_equatorial(SolarSystemBody::Moon, t).unwrap());
        let moon = Coordinates::SolarSystem {
            body: SolarSystemBody::Moon,
        };
        let as_star = ApparentSky.to_horizontal(&geocentric, &observer, t).unwrap();
        let as_body = ApparentSky.to_horizontal(&moon, &observer, t).unwrap();
        let drop = as_star.altitude_deg - as_body.altitude_deg;
        assert!(drop > 0.0 && drop < 1.1, "parallax {}", drop);
    }

    #[test]
    fn test_delta_t_is_leap_seconds_plus_tt_offset() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let epoch = Epoch::at(t).unwrap();
        assert!(close(epoch.delta_t, 69.184, 1e-3), "delta_t {}", epoch.delta_t);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(-1e-17), 0.0);
    }
}
