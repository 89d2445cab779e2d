use geo_types::{coord, Coord};

/// Maps WGS84 longitude/latitude in degrees onto a planar coordinate system in meters.
pub trait Projection {
    fn project(&self, longitude: f64, latitude: f64) -> Coord;
}

struct Ellipsoid {
    a: f64,
    b: f64,
}

impl Ellipsoid {
    fn e2(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.a * self.a)
    }
}

const WGS84: Ellipsoid = Ellipsoid { a: 6_378_137.0, b: 6_356_752.314_245 };
const AIRY_1830: Ellipsoid = Ellipsoid { a: 6_377_563.396, b: 6_356_256.909 };

/// Seven parameter Helmert transform. Translations in meters, scale in ppm, rotations in arc seconds.
struct Helmert {
    tx: f64,
    ty: f64,
    tz: f64,
    s: f64,
    rx: f64,
    ry: f64,
    rz: f64,
}

const WGS84_TO_OSGB36: Helmert = Helmert {
    tx: -446.448,
    ty: 125.157,
    tz: -542.060,
    s: 20.4894,
    rx: -0.1502,
    ry: -0.2470,
    rz: -0.8421,
};

impl Helmert {
    fn apply(&self, [x, y, z]: [f64; 3]) -> [f64; 3] {
        let s = 1.0 + self.s * 1e-6;
        let rx = (self.rx / 3600.0).to_radians();
        let ry = (self.ry / 3600.0).to_radians();
        let rz = (self.rz / 3600.0).to_radians();

        [
            self.tx + s * x - rz * y + ry * z,
            self.ty + rz * x + s * y - rx * z,
            self.tz - ry * x + rx * y + s * z,
        ]
    }
}

fn to_cartesian(ellipsoid: &Ellipsoid, lat: f64, lon: f64) -> [f64; 3] {
    let e2 = ellipsoid.e2();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let nu = ellipsoid.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    [
        nu * cos_lat * lon.cos(),
        nu * cos_lat * lon.sin(),
        (1.0 - e2) * nu * sin_lat,
    ]
}

/// Returns (lat, lon) in radians.
fn from_cartesian(ellipsoid: &Ellipsoid, [x, y, z]: [f64; 3]) -> (f64, f64) {
    let e2 = ellipsoid.e2();
    let p = x.hypot(y);
    let lon = y.atan2(x);

    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let sin_lat = lat.sin();
        let nu = ellipsoid.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (z + e2 * nu * sin_lat).atan2(p);
        let done = (next - lat).abs() < 1e-12;
        lat = next;
        if done {
            break;
        }
    }

    (lat, lon)
}

/// The Ordnance Survey National Grid (EPSG:27700).
#[derive(Debug, Clone, Copy, Default)]
pub struct BritishNationalGrid;

impl BritishNationalGrid {
    const F0: f64 = 0.999_601_271_7;
    const LAT0: f64 = 49.0;
    const LON0: f64 = -2.0;
    const E0: f64 = 400_000.0;
    const N0: f64 = -100_000.0;

    /// Transverse Mercator on the Airy 1830 ellipsoid. Input is OSGB36 latitude/longitude in degrees.
    fn grid_from_osgb36(lat: f64, lon: f64) -> Coord {
        let Ellipsoid { a, b } = AIRY_1830;
        let e2 = AIRY_1830.e2();
        let n = (a - b) / (a + b);
        let (n2, n3) = (n * n, n * n * n);

        let phi = lat.to_radians();
        let phi0 = Self::LAT0.to_radians();
        let d_lambda = (lon - Self::LON0).to_radians();

        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan2 = phi.tan().powi(2);
        let nu = a * Self::F0 / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let rho = a * Self::F0 * (1.0 - e2) / (1.0 - e2 * sin_phi * sin_phi).powf(1.5);
        let eta2 = nu / rho - 1.0;

        let (dp, sp) = (phi - phi0, phi + phi0);
        let m = b * Self::F0 * (
            (1.0 + n + 1.25 * n2 + 1.25 * n3) * dp
            - (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * dp.sin() * sp.cos()
            + (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * dp).sin() * (2.0 * sp).cos()
            - 35.0 / 24.0 * n3 * (3.0 * dp).sin() * (3.0 * sp).cos()
        );

        let cos3 = cos_phi.powi(3);
        let cos5 = cos_phi.powi(5);

        let i = m + Self::N0;
        let ii = nu / 2.0 * sin_phi * cos_phi;
        let iii = nu / 24.0 * sin_phi * cos3 * (5.0 - tan2 + 9.0 * eta2);
        let iiia = nu / 720.0 * sin_phi * cos5 * (61.0 - 58.0 * tan2 + tan2 * tan2);
        let iv = nu * cos_phi;
        let v = nu / 6.0 * cos3 * (nu / rho - tan2);
        let vi = nu / 120.0 * cos5 * (5.0 - 18.0 * tan2 + tan2 * tan2 + 14.0 * eta2 - 58.0 * tan2 * eta2);

        let l = d_lambda;
        coord! {
            x: Self::E0 + iv * l + v * l.powi(3) + vi * l.powi(5),
            y: i + ii * l.powi(2) + iii * l.powi(4) + iiia * l.powi(6),
        }
    }
}

impl Projection for BritishNationalGrid {
    fn project(&self, longitude: f64, latitude: f64) -> Coord {
        let xyz = to_cartesian(&WGS84, latitude.to_radians(), longitude.to_radians());
        let (lat, lon) = from_cartesian(&AIRY_1830, WGS84_TO_OSGB36.apply(xyz));
        Self::grid_from_osgb36(lat.to_degrees(), lon.to_degrees())
    }
}

/// Plate carrée scaled at a reference latitude. Usable anywhere for short distances.
#[derive(Debug, Clone, Copy)]
pub struct Equirectangular {
    pub reference_latitude: f64,
}

impl Equirectangular {
    const EARTH_RADIUS: f64 = 6_371_008.8;

    pub fn new(reference_latitude: f64) -> Self {
        Self { reference_latitude }
    }
}

impl Projection for Equirectangular {
    fn project(&self, longitude: f64, latitude: f64) -> Coord {
        coord! {
            x: Self::EARTH_RADIUS * longitude.to_radians() * self.reference_latitude.to_radians().cos(),
            y: Self::EARTH_RADIUS * latitude.to_radians(),
        }
    }
}

impl<P: Projection + ?Sized> Projection for &P {
    fn project(&self, longitude: f64, latitude: f64) -> Coord {
        (**self).project(longitude, latitude)
    }
}

impl<P: Projection + ?Sized> Projection for Box<P> {
    fn project(&self, longitude: f64, latitude: f64) -> Coord {
        (**self).project(longitude, latitude)
    }
}
