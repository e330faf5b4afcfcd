//! Code-unit conversion factors and the physical constants they need.

/// Solar mass in grams.
pub const SOLAR_MASS_G: f64 = 1.989e33;

/// One year in seconds.
pub const YEAR_S: f64 = 3.1557e7;

/// Conversion factors from code units to CGS at one simulation time.
///
/// Produced by a [`UnitSystem`](crate::traits::UnitSystem); cosmological
/// runs return different factors at different times.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Units {
    /// g/cm^3 per code density unit.
    pub density: f64,
    /// cm per code length unit.
    pub length: f64,
    /// K per code temperature unit.
    pub temperature: f64,
    /// s per code time unit.
    pub time: f64,
    /// cm/s per code velocity unit.
    pub velocity: f64,
}

impl Units {
    /// Unit factors that leave every quantity unchanged.
    pub const IDENTITY: Self = Self {
        density: 1.0,
        length: 1.0,
        temperature: 1.0,
        time: 1.0,
        velocity: 1.0,
    };

    /// Factor converting a particle mass (a density in a cell of the given
    /// code-unit width) to solar masses.
    pub fn mass_to_solar(&self, cell_width: f64) -> f64 {
        let dx = self.length * cell_width;
        dx * dx * dx * self.density / SOLAR_MASS_G
    }

    /// One year expressed in code time units.
    pub fn time_in_years(&self) -> f64 {
        YEAR_S / self.time
    }

    /// Factor converting a photon rate in 1/s to code units.
    pub fn photon_rate_conversion(&self) -> f64 {
        self.time / self.length.powi(3)
    }
}
