//! # Model dataset registry
//!
//! Named geomagnetic model datasets and the directory they are read from.
//!
//! The crate ships no coefficient file. A [`DataRegistry`] resolves each
//! [`ModelDataset`] to file names relative to a data directory, chosen in this order:
//!
//! 1. the directory given to [`DataRegistry::new`],
//! 2. the `MAGMOD_DATA_DIR` environment variable ([`DataRegistry::from_env`]),
//! 3. `<user data dir>/magmod` as reported by [`directories::BaseDirs`].
//!
//! ```rust,no_run
//! use magmod::registry::{DataRegistry, ModelDataset};
//!
//! let registry = DataRegistry::from_env().unwrap();
//! let model = registry.load_model("WMM2015".parse::<ModelDataset>().unwrap()).unwrap();
//! println!("{model}");
//! ```
use std::{fmt, str::FromStr, sync::Arc};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use tracing::{debug, info};

use crate::{
    coefficients::{CombinedSHCoefficients, SHCoefficients},
    field::MagneticModel,
    loaders::{load_emm, load_igrf, load_shc, load_wmm},
    magmod_errors::MagModError,
};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MAGMOD_DATA_DIR";

/// Named model datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelDataset {
    Wmm2010,
    Wmm2015,
    Igrf11,
    Igrf12,
    Sifm,
    Emm2010,
    Chaos5Core,
    Chaos5CoreV4,
    Chaos5Static,
    /// CHAOS-5 core field (V4) combined with its static part
    Chaos5,
    Chaos6Core,
    Chaos6CoreX3,
    Chaos6Static,
    /// CHAOS-6 core field (x3) combined with its static part
    Chaos6,
}

impl ModelDataset {
    pub const ALL: [ModelDataset; 14] = [
        ModelDataset::Wmm2010,
        ModelDataset::Wmm2015,
        ModelDataset::Igrf11,
        ModelDataset::Igrf12,
        ModelDataset::Sifm,
        ModelDataset::Emm2010,
        ModelDataset::Chaos5Core,
        ModelDataset::Chaos5CoreV4,
        ModelDataset::Chaos5Static,
        ModelDataset::Chaos5,
        ModelDataset::Chaos6Core,
        ModelDataset::Chaos6CoreX3,
        ModelDataset::Chaos6Static,
        ModelDataset::Chaos6,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelDataset::Wmm2010 => "WMM2010",
            ModelDataset::Wmm2015 => "WMM2015",
            ModelDataset::Igrf11 => "IGRF11",
            ModelDataset::Igrf12 => "IGRF12",
            ModelDataset::Sifm => "SIFM",
            ModelDataset::Emm2010 => "EMM2010",
            ModelDataset::Chaos5Core => "CHAOS5_CORE",
            ModelDataset::Chaos5CoreV4 => "CHAOS5_CORE_V4",
            ModelDataset::Chaos5Static => "CHAOS5_STATIC",
            ModelDataset::Chaos5 => "CHAOS5",
            ModelDataset::Chaos6Core => "CHAOS6_CORE",
            ModelDataset::Chaos6CoreX3 => "CHAOS6_CORE_X3",
            ModelDataset::Chaos6Static => "CHAOS6_STATIC",
            ModelDataset::Chaos6 => "CHAOS6",
        }
    }

    /// Files of the dataset, relative to the data directory.
    pub fn files(&self) -> &'static [&'static str] {
        match self {
            ModelDataset::Wmm2010 => &["WMM2010.COF"],
            ModelDataset::Wmm2015 => &["WMM2015.COF"],
            ModelDataset::Igrf11 => &["igrf11coeffs.txt"],
            ModelDataset::Igrf12 => &["IGRF12.shc"],
            ModelDataset::Sifm => &["SIFM.shc"],
            ModelDataset::Emm2010 => &["EMM-720_V3p0_static.cof", "EMM-720_V3p0_secvar.cof"],
            ModelDataset::Chaos5Core => &["CHAOS-5_core.shc"],
            ModelDataset::Chaos5CoreV4 => &["CHAOS-5_core_V4.shc"],
            ModelDataset::Chaos5Static => &["CHAOS-5_static.shc"],
            ModelDataset::Chaos5 => &["CHAOS-5_core_V4.shc", "CHAOS-5_static.shc"],
            ModelDataset::Chaos6Core => &["CHAOS-6_core.shc"],
            ModelDataset::Chaos6CoreX3 => &["CHAOS-6-x3_core.shc"],
            ModelDataset::Chaos6Static => &["CHAOS-6_static.shc"],
            ModelDataset::Chaos6 => &["CHAOS-6-x3_core.shc", "CHAOS-6_static.shc"],
        }
    }
}

impl fmt::Display for ModelDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelDataset {
    type Err = MagModError;

    /// Case-insensitive; `-` and `_` are ignored (`"wmm-2015"`, `"CHAOS6_CORE_X3"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalize = |name: &str| -> String {
            name.chars()
                .filter(|c| !matches!(c, '-' | '_' | ' '))
                .map(|c| c.to_ascii_uppercase())
                .collect()
        };
        let key = normalize(s);
        ModelDataset::ALL
            .into_iter()
            .find(|dataset| normalize(dataset.name()) == key)
            .ok_or_else(|| MagModError::UnknownDataset(s.to_string()))
    }
}

/// Resolves and loads [`ModelDataset`]s from a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRegistry {
    base_dir: Utf8PathBuf,
}

impl DataRegistry {
    pub fn new(base_dir: impl Into<Utf8PathBuf>) -> Self {
        DataRegistry {
            base_dir: base_dir.into(),
        }
    }

    /// Registry rooted at `MAGMOD_DATA_DIR`, or at `<user data dir>/magmod` when unset.
    ///
    /// Errors
    /// ------
    /// * [`MagModError::DataDirectory`] if no user data directory exists or its path
    ///   is not valid UTF-8
    pub fn from_env() -> Result<Self, MagModError> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            debug!(%dir, "data directory from {DATA_DIR_ENV}");
            return Ok(DataRegistry::new(dir));
        }

        let base_dirs = BaseDirs::new()
            .ok_or_else(|| MagModError::DataDirectory("no home directory".into()))?;
        let data_dir = Utf8Path::from_path(base_dirs.data_dir()).ok_or_else(|| {
            MagModError::DataDirectory(format!(
                "non UTF-8 path {}",
                base_dirs.data_dir().display()
            ))
        })?;
        Ok(DataRegistry::new(data_dir.join("magmod")))
    }

    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    /// Absolute paths of the files of a dataset.
    pub fn paths(&self, dataset: ModelDataset) -> Vec<Utf8PathBuf> {
        dataset
            .files()
            .iter()
            .map(|file| self.base_dir.join(file))
            .collect()
    }

    /// Load the coefficients of a dataset.
    pub fn load(&self, dataset: ModelDataset) -> Result<Arc<dyn SHCoefficients>, MagModError> {
        let paths = self.paths(dataset);
        info!(%dataset, base_dir = %self.base_dir, "loading model dataset");

        let coeff: Arc<dyn SHCoefficients> = match dataset {
            ModelDataset::Wmm2010 | ModelDataset::Wmm2015 => Arc::new(load_wmm(&paths[0])?),
            ModelDataset::Igrf11 => Arc::new(load_igrf(&paths[0])?),
            ModelDataset::Emm2010 => Arc::new(load_emm(&paths[0], &paths[1])?),
            ModelDataset::Chaos5 | ModelDataset::Chaos6 => {
                Arc::new(CombinedSHCoefficients::new(
                    paths
                        .iter()
                        .map(|path| load_shc(path).map(|c| c.into_shared()))
                        .collect::<Result<Vec<_>, _>>()?,
                )?)
            }
            _ => load_shc(&paths[0])?.into_shared(),
        };
        Ok(coeff)
    }

    /// Load a dataset and wrap it in a [`MagneticModel`] with the default options.
    pub fn load_model(&self, dataset: ModelDataset) -> Result<MagneticModel, MagModError> {
        Ok(MagneticModel::new(self.load(dataset)?))
    }
}
