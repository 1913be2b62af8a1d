use std::{
    num::{ParseFloatError, ParseIntError},
    path::Path,
    str::FromStr,
};

use derive_more::Display;
use log::debug;

/// The vertex id of the depot. Clients are numbered `1..n_vertices()`.
pub const DEPOT: usize = 0;

/// Immutable problem data: travel times between all vertices and the
/// release date of every client. Shared (never mutated) by all solutions.
#[derive(Debug, Clone)]
pub struct Instance {
    /// The instance name, taken from the file header
    name: String,
    /// Travel time between every pair of vertices. Not necessarily symmetric.
    times: Vec<Vec<u32>>,
    /// Release date per vertex. The depot is fixed at zero.
    release_dates: Vec<u32>,
}

impl Instance {
    pub fn new(
        name: String,
        times: Vec<Vec<u32>>,
        release_dates: Vec<u32>,
    ) -> Result<Instance, InstanceError> {
        let n = times.len();

        if n < 2 {
            return Err(InstanceError::NoClients);
        }

        if let Some(row) = times.iter().find(|row| row.len() != n) {
            return Err(InstanceError::DimensionMismatch {
                expected: n,
                actual: row.len(),
            });
        }

        if release_dates.len() != n {
            return Err(InstanceError::DimensionMismatch {
                expected: n,
                actual: release_dates.len(),
            });
        }

        if release_dates[DEPOT] != 0 {
            return Err(InstanceError::NonZeroDepotRelease);
        }

        Ok(Instance {
            name,
            times,
            release_dates,
        })
    }

    /// The instance name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of clients (depot excluded)
    pub fn n_clients(&self) -> usize {
        self.release_dates.len() - 1
    }

    /// The number of vertices (clients plus the depot)
    pub fn n_vertices(&self) -> usize {
        self.release_dates.len()
    }

    /// The travel time from vertex `i` to vertex `j`
    pub fn time(&self, i: usize, j: usize) -> u32 {
        self.times[i][j]
    }

    /// The earliest time at which vertex `v` may be visited
    pub fn release_date_of(&self, v: usize) -> u32 {
        self.release_dates[v]
    }

    /// All client ids, in increasing order
    pub fn clients(&self) -> impl Iterator<Item = usize> {
        1..self.n_vertices()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Instance, InstanceError> {
        let contents = std::fs::read_to_string(path)?;
        contents.parse()
    }
}

#[derive(Debug, Display)]
pub enum InstanceError {
    Io(std::io::Error),
    ParseInt(ParseIntError),
    ParseFloat(ParseFloatError),
    #[display(fmt = "instance has no clients")]
    NoClients,
    #[display(fmt = "missing {} section", _0)]
    MissingSection(&'static str),
    #[display(fmt = "unsupported edge weight type {}", _0)]
    UnsupportedEdgeWeights(String),
    #[display(fmt = "malformed coordinate line")]
    MalformedCoordinates,
    #[display(fmt = "expected {} entries, found {}", expected, actual)]
    DimensionMismatch { expected: usize, actual: usize },
    #[display(fmt = "the depot must have release date zero")]
    NonZeroDepotRelease,
}

impl std::error::Error for InstanceError {}

impl From<std::io::Error> for InstanceError {
    fn from(e: std::io::Error) -> Self {
        InstanceError::Io(e)
    }
}

impl From<ParseIntError> for InstanceError {
    fn from(e: ParseIntError) -> Self {
        InstanceError::ParseInt(e)
    }
}

impl From<ParseFloatError> for InstanceError {
    fn from(e: ParseFloatError) -> Self {
        InstanceError::ParseFloat(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Coords,
    Weights,
    ReleaseDates,
}

/// Parses the TSPLIB-style instance format: a `DIMENSION` header, either
/// `NODE_COORD_SECTION` coordinates (`EDGE_WEIGHT_TYPE: EUC_2D`, distances
/// rounded to the nearest integer) or an explicit `EDGE_WEIGHT_SECTION`
/// full matrix, and a `RELEASE_DATES` section with one integer per vertex.
impl FromStr for Instance {
    type Err = InstanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut name = String::from("unnamed");
        let mut dimension = None;
        let mut explicit_weights = false;
        let mut coords: Vec<(f64, f64)> = Vec::new();
        let mut weights: Vec<u32> = Vec::new();
        let mut release_dates: Vec<u32> = Vec::new();
        let mut section = Section::Header;

        for line in s.lines() {
            let line = line.trim();
            if line.is_empty() || line == "EOF" {
                continue;
            }

            // key/value header lines may appear before and between sections
            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "NAME" => name = value.to_string(),
                    "DIMENSION" => dimension = Some(value.parse::<usize>()?),
                    "EDGE_WEIGHT_TYPE" => match value {
                        "EUC_2D" => explicit_weights = false,
                        "EXPLICIT" => explicit_weights = true,
                        other => {
                            return Err(InstanceError::UnsupportedEdgeWeights(other.to_string()))
                        }
                    },
                    "EDGE_WEIGHT_FORMAT" => {
                        if value != "FULL_MATRIX" {
                            return Err(InstanceError::UnsupportedEdgeWeights(value.to_string()));
                        }
                    }
                    // TYPE, COMMENT, DISPLAY_DATA_TYPE, ...
                    _ => (),
                }
                continue;
            }

            match line {
                "NODE_COORD_SECTION" => section = Section::Coords,
                "EDGE_WEIGHT_SECTION" => section = Section::Weights,
                "RELEASE_DATES" | "RELEASE_DATE_SECTION" => section = Section::ReleaseDates,
                _ => {
                    let mut tokens = line.split_whitespace();
                    match section {
                        // coordinate lines are "<id> <x> <y>"
                        Section::Coords => {
                            let _id = tokens.next();
                            let x = tokens.next().ok_or(InstanceError::MalformedCoordinates)?;
                            let y = tokens.next().ok_or(InstanceError::MalformedCoordinates)?;
                            coords.push((x.parse()?, y.parse()?));
                        }
                        Section::Weights => {
                            for token in tokens {
                                weights.push(token.parse()?);
                            }
                        }
                        Section::ReleaseDates => {
                            for token in tokens {
                                release_dates.push(token.parse()?);
                            }
                        }
                        Section::Header => continue,
                    }
                }
            }
        }

        let n = dimension.ok_or(InstanceError::MissingSection("DIMENSION"))?;

        let times = if explicit_weights {
            if weights.len() != n * n {
                return Err(InstanceError::DimensionMismatch {
                    expected: n * n,
                    actual: weights.len(),
                });
            }
            weights.chunks(n).map(|row| row.to_vec()).collect()
        } else {
            if coords.len() != n {
                return Err(InstanceError::DimensionMismatch {
                    expected: n,
                    actual: coords.len(),
                });
            }
            euclidean_times(&coords)
        };

        if release_dates.is_empty() {
            return Err(InstanceError::MissingSection("RELEASE_DATES"));
        }

        let instance = Instance::new(name, times, release_dates)?;
        debug!(
            "parsed instance {} with {} clients",
            instance.name(),
            instance.n_clients()
        );
        Ok(instance)
    }
}

/// Pairwise Euclidean distances, rounded to the nearest integer.
fn euclidean_times(coords: &[(f64, f64)]) -> Vec<Vec<u32>> {
    coords
        .iter()
        .map(|&(xi, yi)| {
            coords
                .iter()
                .map(|&(xj, yj)| {
                    let (dx, dy) = (xi - xj, yi - yj);
                    (dx * dx + dy * dy).sqrt().round() as u32
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPLICIT: &str = "\
NAME: tiny
TYPE: TSPRD
DIMENSION: 3
EDGE_WEIGHT_TYPE: EXPLICIT
EDGE_WEIGHT_FORMAT: FULL_MATRIX
EDGE_WEIGHT_SECTION
0 2 3
2 0 1
3 1 0
RELEASE_DATES
0
5
7
EOF
";

    #[test]
    fn parses_explicit_matrix() {
        let instance: Instance = EXPLICIT.parse().unwrap();

        assert_eq!(instance.name(), "tiny");
        assert_eq!(instance.n_clients(), 2);
        assert_eq!(instance.n_vertices(), 3);
        assert_eq!(instance.time(0, 2), 3);
        assert_eq!(instance.time(2, 1), 1);
        assert_eq!(instance.release_date_of(0), 0);
        assert_eq!(instance.release_date_of(2), 7);
        assert_eq!(instance.clients().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn parses_rounded_euclidean_coords() {
        let text = "\
NAME: coords
DIMENSION: 3
EDGE_WEIGHT_TYPE: EUC_2D
NODE_COORD_SECTION
1 0.0 0.0
2 3.0 4.0
3 1.0 1.0
RELEASE_DATES
0 2 4
";
        let instance: Instance = text.parse().unwrap();

        assert_eq!(instance.time(0, 1), 5);
        // sqrt(2) rounds down to 1
        assert_eq!(instance.time(0, 2), 1);
        assert_eq!(instance.time(1, 1), 0);
    }

    #[test]
    fn rejects_missing_release_dates() {
        let text = "\
DIMENSION: 2
EDGE_WEIGHT_TYPE: EXPLICIT
EDGE_WEIGHT_FORMAT: FULL_MATRIX
EDGE_WEIGHT_SECTION
0 1
1 0
";
        assert!(matches!(
            text.parse::<Instance>(),
            Err(InstanceError::MissingSection("RELEASE_DATES"))
        ));
    }

    #[test]
    fn rejects_nonzero_depot_release_date() {
        let result = Instance::new(
            "bad".to_string(),
            vec![vec![0, 1], vec![1, 0]],
            vec![3, 1],
        );
        assert!(matches!(result, Err(InstanceError::NonZeroDepotRelease)));
    }

    #[test]
    fn rejects_ragged_matrix() {
        let result = Instance::new(
            "ragged".to_string(),
            vec![vec![0, 1], vec![1]],
            vec![0, 1],
        );
        assert!(matches!(
            result,
            Err(InstanceError::DimensionMismatch { .. })
        ));
    }
}
