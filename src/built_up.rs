use log::{info, warn};
use serde::Serialize;
use crate::manager_archive::SurfaceSource;
use crate::region::Region;

/// Area of one 100 m x 100 m pixel in m², the unit built-up surface is given per
const PIXEL_AREA_M2: f64 = 10_000.0;

/// Built-up share of a cell for two epochs
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct BuiltUpComparison {
    pub from_epoch: u32,
    pub to_epoch: u32,
    pub from_percent: Option<f64>,
    pub to_percent: Option<f64>,
    pub change: Option<f64>,
}

/// Converts mean built-up surface per pixel (m²) into percent of area
///
/// # Arguments
///
/// * 'mean_m2' - mean built-up surface per pixel
pub fn built_up_percent(mean_m2: f64) -> f64 {
    mean_m2 / PIXEL_AREA_M2 * 100.0
}

/// Compares built-up share of a region between two epochs.
/// A fetch error or missing image for an epoch gives an absent percentage and change.
///
/// # Arguments
///
/// * 'source' - source of built-up surface images
/// * 'region' - the region (cell) to reduce over
/// * 'from_epoch' - first epoch, e.g. 1975
/// * 'to_epoch' - second epoch, e.g. 2020
pub fn compare_built_up<S: SurfaceSource>(source: &S, region: &Region, from_epoch: u32, to_epoch: u32) -> BuiltUpComparison {
    let percent = |epoch: u32| {
        match source.mean_surface(epoch, region) {
            Ok(mean) => mean.map(built_up_percent),
            Err(e) => {
                warn!("no built-up surface for {}: {}", epoch, e);
                None
            }
        }
    };

    let from_percent = percent(from_epoch);
    let to_percent = percent(to_epoch);
    let change = from_percent.zip(to_percent).map(|(a, b)| b - a);

    info!("built-up surface {}: {:?} %, {}: {:?} %", from_epoch, from_percent, to_epoch, to_percent);

    BuiltUpComparison { from_epoch, to_epoch, from_percent, to_percent, change }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::manager_archive::errors::FetchError;

    struct Epochs(HashMap<u32, f64>);

    impl SurfaceSource for Epochs {
        fn mean_surface(&self, epoch: u32, _region: &Region) -> Result<Option<f64>, FetchError> {
            if epoch == 0 {
                return Err(FetchError::Transport("timeout".to_string()));
            }
            Ok(self.0.get(&epoch).copied())
        }
    }

    fn cell() -> Region {
        Region::cell(-0.133, 51.501, 70.0).unwrap()
    }

    #[test]
    fn percent_of_pixel_area() {
        assert_eq!(built_up_percent(2500.0), 25.0);
        assert_eq!(built_up_percent(0.0), 0.0);
    }

    #[test]
    fn compares_two_epochs() {
        let source = Epochs(HashMap::from([(1975, 1500.0), (2020, 2500.0)]));

        let cmp = compare_built_up(&source, &cell(), 1975, 2020);
        assert_eq!(cmp.from_percent, Some(15.0));
        assert_eq!(cmp.to_percent, Some(25.0));
        assert_eq!(cmp.change, Some(10.0));
    }

    #[test]
    fn missing_epoch_has_no_change() {
        let source = Epochs(HashMap::from([(2020, 2500.0)]));

        let cmp = compare_built_up(&source, &cell(), 1975, 2020);
        assert_eq!(cmp.from_percent, None);
        assert_eq!(cmp.to_percent, Some(25.0));
        assert_eq!(cmp.change, None);

        let cmp = compare_built_up(&source, &cell(), 0, 2020);
        assert_eq!(cmp.change, None);
    }
}
