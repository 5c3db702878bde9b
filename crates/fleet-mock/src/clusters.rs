use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::TurbineStatus;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindFarm {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub turbines: u32,
    pub region: &'static str,
}

/// Major US wind farm locations used for the map view.
pub const WIND_FARMS: [WindFarm; 6] = [
    WindFarm { name: "Texas Panhandle", lat: 35.2, lng: -101.8, turbines: 25, region: "Great Plains" },
    WindFarm { name: "Iowa Corn Belt", lat: 42.0, lng: -93.5, turbines: 18, region: "Midwest" },
    WindFarm { name: "Tehachapi Pass", lat: 35.1, lng: -118.3, turbines: 15, region: "California" },
    WindFarm { name: "Medicine Bow", lat: 41.9, lng: -106.3, turbines: 12, region: "Rocky Mountains" },
    WindFarm { name: "Oklahoma Wind Corridor", lat: 35.5, lng: -98.5, turbines: 20, region: "Great Plains" },
    WindFarm { name: "Illinois Prairie", lat: 40.8, lng: -89.4, turbines: 10, region: "Midwest" },
];

const POSITION_JITTER: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    pub id: u32,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub status: TurbineStatus,
    pub energy_output: f64,
    pub wind_speed: f64,
    pub farm_name: String,
    pub region: String,
}

/// One map point per turbine across [`WIND_FARMS`], ids running on from 1.
pub fn turbine_clusters<R: Rng>(rng: &mut R) -> Vec<ClusterPoint> {
    let mut points = Vec::new();
    let mut id = 1;

    for farm in &WIND_FARMS {
        let prefix: String = farm.name.chars().take(2).collect::<String>().to_uppercase();

        for _ in 0..farm.turbines {
            let status = weighted_status(rng);
            let operational = status == TurbineStatus::Operational;

            points.push(ClusterPoint {
                id,
                name: format!("{}-{:03}", prefix, id),
                lat: farm.lat + rng.random_range(-POSITION_JITTER..=POSITION_JITTER),
                lng: farm.lng + rng.random_range(-POSITION_JITTER..=POSITION_JITTER),
                status,
                energy_output: if operational { rng.random_range(1.5..=3.5) } else { 0.0 },
                wind_speed: rng.random_range(8.0..=20.0),
                farm_name: farm.name.to_string(),
                region: farm.region.to_string(),
            });
            id += 1;
        }
    }

    points
}

// 75% operational, 15% warning, 10% maintenance
fn weighted_status<R: Rng>(rng: &mut R) -> TurbineStatus {
    match rng.random_range(0..100u32) {
        0..=74 => TurbineStatus::Operational,
        75..=89 => TurbineStatus::Warning,
        _ => TurbineStatus::Maintenance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn one_point_per_farm_turbine() {
        let points = turbine_clusters(&mut StdRng::seed_from_u64(11));
        let expected: u32 = WIND_FARMS.iter().map(|farm| farm.turbines).sum();

        assert_eq!(points.len(), expected as usize);
        assert_eq!(points[0].name, "TE-001");
        assert_eq!(points[25].name, "IO-026");
        assert_eq!(points.last().unwrap().farm_name, "Illinois Prairie");
        assert!(points.iter().all(|p| p.status != TurbineStatus::Offline));
    }

    #[test]
    fn points_stay_near_their_farm() {
        let points = turbine_clusters(&mut StdRng::seed_from_u64(5));
        for point in &points {
            let farm = WIND_FARMS.iter().find(|f| f.name == point.farm_name).unwrap();
            assert!((point.lat - farm.lat).abs() <= POSITION_JITTER + 1e-9);
            assert!((point.lng - farm.lng).abs() <= POSITION_JITTER + 1e-9);
            assert!((8.0..=20.0).contains(&point.wind_speed));
            if point.status != TurbineStatus::Operational {
                assert_eq!(point.energy_output, 0.0);
            }
        }
    }
}
