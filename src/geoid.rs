//! Geoid undulation, interpolated on a regular latitude / longitude grid.
use log::error;
use nalgebra::Vector3;

use crate::{constants::R2D, prelude::Error};

const MIN_LAT_DEG: f64 = -90.0;
const MAX_LAT_DEG: f64 = 90.0;
const LON_SPAN_DEG: f64 = 360.0;

/// Grid spacings must divide the latitude and longitude spans within this tolerance
const SPACING_TOLERANCE: f64 = 1.0E-9;

/// Smallest number of cells, along either axis, bicubic interpolation requires
const MIN_CELLS: usize = 3;

/// Number of grid cells covering `span`, if `spacing` divides it.
fn cell_count(span: f64, spacing: f64) -> Option<usize> {
    if !spacing.is_finite() || spacing <= 0.0 {
        return None;
    }

    let cells = span / spacing;
    if (cells - cells.round()).abs() > SPACING_TOLERANCE {
        return None;
    }

    let cells = cells.round() as usize;
    if cells < MIN_CELLS {
        None
    } else {
        Some(cells)
    }
}

/// Catmull-Rom interpolation between `p[1]` (x = 0) and `p[2]` (x = 1).
fn cubic(p: [f64; 4], x: f64) -> f64 {
    p[1] + 0.5
        * x
        * (p[2] - p[0]
            + x * (2.0 * p[0] - 5.0 * p[1] + 4.0 * p[2] - p[3]
                + x * (3.0 * (p[1] - p[2]) + p[3] - p[0])))
}

/// [GeoidGrid] stores geoid heights above the WGS84 ellipsoid (m), sampled
/// on a regular grid (the EGM2008 model is distributed at 1° and 15').
///
/// Heights are stored by longitude column: columns start at 0° and wrap
/// around at 360°, each column runs from -90° to +90° included. The height
/// of column `x`, row `y` is `heights[x * n_lat + y]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoidGrid {
    heights: Vec<f32>,
    lat_spacing: f64,
    lon_spacing: f64,
    n_lat: usize,
    n_lon: usize,
}

impl GeoidGrid {
    /// Builds a [GeoidGrid] from its heights (m), with spacings in degrees.
    pub fn new(heights: Vec<f32>, lat_spacing_deg: f64, lon_spacing_deg: f64) -> Result<Self, Error> {
        let lat_cells = cell_count(MAX_LAT_DEG - MIN_LAT_DEG, lat_spacing_deg)
            .ok_or(Error::InvalidGeoidGrid("latitude spacing"))?;

        let n_lon = cell_count(LON_SPAN_DEG, lon_spacing_deg)
            .ok_or(Error::InvalidGeoidGrid("longitude spacing"))?;

        let n_lat = lat_cells + 1;

        if heights.len() != n_lat * n_lon {
            return Err(Error::InvalidGeoidGrid("number of heights"));
        }

        Ok(Self {
            heights,
            lat_spacing: lat_spacing_deg,
            lon_spacing: lon_spacing_deg,
            n_lat,
            n_lon,
        })
    }

    /// Builds a [GeoidGrid] by sampling `height(latitude, longitude)` (degrees).
    pub fn from_fn<F: Fn(f64, f64) -> f32>(
        lat_spacing_deg: f64,
        lon_spacing_deg: f64,
        height: F,
    ) -> Result<Self, Error> {
        let n_lat = cell_count(MAX_LAT_DEG - MIN_LAT_DEG, lat_spacing_deg)
            .ok_or(Error::InvalidGeoidGrid("latitude spacing"))?
            + 1;

        let n_lon = cell_count(LON_SPAN_DEG, lon_spacing_deg)
            .ok_or(Error::InvalidGeoidGrid("longitude spacing"))?;

        let heights = (0..n_lon)
            .flat_map(|x| {
                let lon = x as f64 * lon_spacing_deg;
                (0..n_lat).map(move |y| (MIN_LAT_DEG + y as f64 * lat_spacing_deg, lon))
            })
            .map(|(lat, lon)| height(lat, lon))
            .collect();

        Self::new(heights, lat_spacing_deg, lon_spacing_deg)
    }

    /// Height of column `x` (wrapped around), row `y`.
    fn height(&self, x: isize, y: usize) -> f64 {
        let x = x.rem_euclid(self.n_lon as isize) as usize;
        self.heights[x * self.n_lat + y] as f64
    }

    /// Geoid height above the ellipsoid (m), at geodetic latitude and longitude (rad).
    /// Negative longitudes are shifted by 360°.
    ///
    /// Heights are interpolated bicubically, except in the cells that touch
    /// a pole, where the interpolation is bilinear.
    pub fn offset(&self, lat: f64, lon: f64) -> Result<f64, Error> {
        let lat_deg = lat * R2D;

        let mut lon_deg = lon * R2D;
        if lon_deg < 0.0 {
            lon_deg += LON_SPAN_DEG;
        }

        if !(MIN_LAT_DEG..=MAX_LAT_DEG).contains(&lat_deg)
            || !(0.0..=LON_SPAN_DEG).contains(&lon_deg)
        {
            error!("geoid offset requested at invalid coordinates ({}, {})", lat, lon);
            return Err(Error::InvalidCoordinates);
        }

        let y = (lat_deg - MIN_LAT_DEG) / self.lat_spacing;
        let x = lon_deg / self.lon_spacing;

        let (iy, fy) = (y.floor() as usize, y.fract());
        let (ix, fx) = (x.floor() as isize, x.fract());

        let lat_cells = self.n_lat - 1;

        // north pole: same height whatever the longitude
        if iy >= lat_cells {
            return Ok(self.height(ix, lat_cells));
        }

        if iy > 0 && iy < lat_cells - 1 {
            let column = |x: isize| {
                cubic(
                    [
                        self.height(x, iy - 1),
                        self.height(x, iy),
                        self.height(x, iy + 1),
                        self.height(x, iy + 2),
                    ],
                    fy,
                )
            };

            return Ok(cubic(
                [column(ix - 1), column(ix), column(ix + 1), column(ix + 2)],
                fx,
            ));
        }

        let south_west = self.height(ix, iy);
        let south_east = self.height(ix + 1, iy);
        let north_west = self.height(ix, iy + 1);
        let north_east = self.height(ix + 1, iy + 1);

        Ok((1.0 - fy) * ((1.0 - fx) * south_west + fx * south_east)
            + fy * ((1.0 - fx) * north_west + fx * north_east))
    }

    /// Height above the geoid (m) of geodetic coordinates `(lat [rad], lon [rad], h [m])`.
    pub fn height_above_geoid(&self, llh: &Vector3<f64>) -> Result<f64, Error> {
        Ok(llh[2] - self.offset(llh[0], llh[1])?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{constants::D2R, tests::init_logger};
    use rand::{prelude::*, rngs::SmallRng, SeedableRng};
    use rstest::rstest;

    fn latitude_grid() -> GeoidGrid {
        GeoidGrid::from_fn(1.0, 1.0, |lat, _| (lat * 0.1) as f32).unwrap()
    }

    #[test]
    fn grid_validation() {
        init_logger();

        assert!(GeoidGrid::new(vec![0.0; 181 * 360], 1.0, 1.0).is_ok());
        assert!(GeoidGrid::new(vec![0.0; 721 * 1440], 0.25, 0.25).is_ok());

        assert_eq!(
            GeoidGrid::new(vec![0.0; 180 * 360], 1.0, 1.0),
            Err(Error::InvalidGeoidGrid("number of heights"))
        );
        assert_eq!(
            GeoidGrid::new(vec![0.0; 181 * 360], 0.7, 1.0),
            Err(Error::InvalidGeoidGrid("latitude spacing"))
        );
        assert_eq!(
            GeoidGrid::new(vec![0.0; 181 * 360], 1.0, 0.0),
            Err(Error::InvalidGeoidGrid("longitude spacing"))
        );
        assert_eq!(
            GeoidGrid::from_fn(90.0, 1.0, |_, _| 0.0),
            Err(Error::InvalidGeoidGrid("latitude spacing"))
        );
    }

    #[rstest]
    #[case(0.0, 0.0)]
    #[case(-90.0, 0.0)]
    #[case(90.0, 123.0)]
    #[case(45.3, -180.0)]
    #[case(-12.7, 359.9)]
    fn constant_grid(#[case] lat: f64, #[case] lon: f64) {
        init_logger();
        let grid = GeoidGrid::from_fn(1.0, 1.0, |_, _| 47.5).unwrap();
        let offset = grid.offset(lat * D2R, lon * D2R).unwrap();
        assert!((offset - 47.5).abs() < 1.0E-9, "offset={}", offset);
    }

    #[test]
    fn grid_nodes() {
        init_logger();

        let grid = GeoidGrid::from_fn(1.0, 1.0, |lat, lon| (lat * 0.1 + lon * 0.01) as f32).unwrap();

        let offset = grid.offset(45.0 * D2R, 10.0 * D2R).unwrap();
        assert!((offset - 4.6).abs() < 1.0E-5, "offset={}", offset);

        let offset = grid.offset(-30.0 * D2R, 200.0 * D2R).unwrap();
        assert!((offset - -1.0).abs() < 1.0E-5, "offset={}", offset);
    }

    // linear profiles are reproduced by both interpolations
    #[rstest]
    #[case(12.3)]
    #[case(-45.5)]
    #[case(-89.5)]
    #[case(-88.7)]
    #[case(88.7)]
    #[case(89.6)]
    #[case(90.0)]
    fn latitude_profile(#[case] lat: f64) {
        init_logger();
        let offset = latitude_grid().offset(lat * D2R, 33.3 * D2R).unwrap();
        assert!((offset - lat * 0.1).abs() < 1.0E-5, "lat={} offset={}", lat, offset);
    }

    #[rstest]
    #[case(123.4, 1.234)]
    #[case(-100.0, 2.6)]
    #[case(2.5, 0.025)]
    fn longitude_profile(#[case] lon: f64, #[case] expected: f64) {
        init_logger();
        let grid = GeoidGrid::from_fn(1.0, 1.0, |_, lon| (lon * 0.01) as f32).unwrap();
        let offset = grid.offset(20.0 * D2R, lon * D2R).unwrap();
        assert!((offset - expected).abs() < 1.0E-5, "lon={} offset={}", lon, offset);
    }

    #[test]
    fn longitude_wrap_around() {
        init_logger();

        let grid =
            GeoidGrid::from_fn(1.0, 1.0, |lat, lon| (10.0 * (lon * D2R).cos() + lat * 0.1) as f32)
                .unwrap();

        for lat in [-89.5, -30.2, 0.0, 60.4, 89.5] {
            let west = grid.offset(lat * D2R, -0.5 * D2R).unwrap();
            let east = grid.offset(lat * D2R, 359.5 * D2R).unwrap();
            assert!((west - east).abs() < 1.0E-6, "lat={}", lat);
        }
    }

    #[test]
    fn smooth_surface() {
        init_logger();

        let undulation = |lat: f64, lon: f64| 30.0 * (lat * D2R).sin() * (lon * D2R).cos();

        let grid = GeoidGrid::from_fn(1.0, 1.0, |lat, lon| undulation(lat, lon) as f32).unwrap();

        let mut rng = SmallRng::seed_from_u64(0x6e01d);

        for _ in 0..1000 {
            let lat = rng.random_range(-90.0..90.0);
            let lon = rng.random_range(-180.0..180.0);

            let offset = grid.offset(lat * D2R, lon * D2R).unwrap();
            let error = (offset - undulation(lat, lon)).abs();

            assert!(error < 5.0E-3, "({}, {}): error={}", lat, lon, error);
        }
    }

    #[rstest]
    #[case(90.5, 0.0)]
    #[case(-91.0, 0.0)]
    #[case(0.0, 400.0)]
    #[case(0.0, -400.0)]
    #[case(f64::NAN, 0.0)]
    fn invalid_coordinates(#[case] lat: f64, #[case] lon: f64) {
        init_logger();
        assert_eq!(
            latitude_grid().offset(lat * D2R, lon * D2R),
            Err(Error::InvalidCoordinates)
        );
    }

    #[test]
    fn height_above_geoid() {
        init_logger();
        let grid = GeoidGrid::from_fn(1.0, 1.0, |_, _| 47.0).unwrap();
        let llh = Vector3::new(45.0 * D2R, 10.0 * D2R, 100.0);
        assert!((grid.height_above_geoid(&llh).unwrap() - 53.0).abs() < 1.0E-9);
    }
}
