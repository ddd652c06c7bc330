//! Data preparation for trait heatmaps.
//!
//! Trait values are aligned to a strain list, turned into correlation
//! distances, clustered with single linkage, and the leaves of the merge
//! tree give the order in which traits are drawn.

use super::corr::correlation_distances;
use super::error::HeatmapError;
use super::linkage::{slink, Linkage};
use super::matrix::DistanceMatrix;
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::HashMap;
use std::io::BufRead;

/// Trait values per strain, in input order.
#[derive(Debug, Clone, Default)]
pub struct TraitTable {
    strains: Vec<String>,
    traits: IndexMap<String, Vec<Option<f64>>>,
}

/// Strains holding a value for one trait, with those values.
#[derive(Debug, Clone, PartialEq)]
pub struct StrainValues {
    /// Index of the trait in the clustered list
    pub index: usize,
    pub strains: Vec<String>,
    pub values: Vec<f64>,
}

/// Everything computed for one heatmap.
#[derive(Debug, Clone)]
pub struct HeatmapData {
    pub strainlist: Vec<String>,
    pub trait_names: Vec<String>,
    pub distances: DistanceMatrix,
    pub linkage: Linkage,
    pub order: Vec<usize>,
    pub rows: Vec<StrainValues>,
}

fn parse_value(token: &str) -> Result<Option<f64>, String> {
    match token.trim() {
        "" | "NA" | "x" | "-" => Ok(None),
        s => match s.parse::<f64>() {
            Ok(v) if v.is_nan() => Ok(None),
            Ok(v) if v.is_infinite() => Err(format!("non-finite value '{}'", s)),
            Ok(v) => Ok(Some(v)),
            Err(_) => Err(format!("invalid value '{}'", s)),
        },
    }
}

impl TraitTable {
    pub fn new(strains: Vec<String>) -> Self {
        Self {
            strains,
            traits: IndexMap::new(),
        }
    }

    /// Add a trait. Values align with the table's strains; a shorter row is
    /// padded with missing values.
    pub fn insert(&mut self, name: &str, mut values: Vec<Option<f64>>) -> Result<(), HeatmapError> {
        if self.traits.contains_key(name) {
            return Err(HeatmapError::DuplicateTrait(name.to_string()));
        }
        values.resize(self.strains.len(), None);
        self.traits.insert(name.to_string(), values);
        Ok(())
    }

    /// Parse a tab-separated table.
    ///
    /// The header names the strains after a leading label column; each
    /// following line is a trait name and its values. `NA`, `x`, `-` and
    /// empty cells are missing. Repeated strains and infinite values are
    /// errors.
    ///
    /// # Example
    /// ```
    /// use slink::libs::heatmap::TraitTable;
    /// let text = "trait\tBXD1\tBXD2\nt1\t1.5\tNA\nt2\t2\t3\n";
    /// let table = TraitTable::from_tsv(text.as_bytes()).unwrap();
    /// assert_eq!(table.strains(), &["BXD1", "BXD2"]);
    /// assert_eq!(table.get("t1").unwrap(), &[Some(1.5), None]);
    /// ```
    pub fn from_tsv<R: BufRead>(reader: R) -> Result<Self, HeatmapError> {
        let mut table: Option<TraitTable> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|e| HeatmapError::Parse {
                line: line_no,
                message: e.to_string(),
            })?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
            match table.as_mut() {
                None => {
                    let strains: Vec<String> =
                        fields.iter().skip(1).map(|s| s.trim().to_string()).collect();
                    if let Some(dup) = strains.iter().duplicates().next() {
                        return Err(HeatmapError::DuplicateStrain(dup.clone()));
                    }
                    table = Some(TraitTable::new(strains));
                }
                Some(t) => {
                    if fields.len() - 1 > t.strains.len() {
                        return Err(HeatmapError::Parse {
                            line: line_no,
                            message: format!(
                                "{} values for {} strains",
                                fields.len() - 1,
                                t.strains.len()
                            ),
                        });
                    }
                    let values = fields[1..]
                        .iter()
                        .map(|s| parse_value(s))
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|message| HeatmapError::Parse {
                            line: line_no,
                            message,
                        })?;
                    t.insert(fields[0].trim(), values)?;
                }
            }
        }

        Ok(table.unwrap_or_default())
    }

    pub fn strains(&self) -> &[String] {
        &self.strains
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.traits.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.traits.get(name).map(|v| v.as_slice())
    }

    /// Values of trait `name` in the order of `strainlist`; strains absent
    /// from the table are missing.
    pub fn export_trait_data(&self, name: &str, strainlist: &[String]) -> Option<Vec<Option<f64>>> {
        let values = self.traits.get(name)?;
        let index_of: HashMap<&str, usize> = self
            .strains
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();

        Some(
            strainlist
                .iter()
                .map(|strain| index_of.get(strain.as_str()).and_then(|&i| values[i]))
                .collect(),
        )
    }
}

/// Correlation distance matrix of the aligned trait vectors.
pub fn cluster_traits(vectors: &[Vec<Option<f64>>]) -> Result<DistanceMatrix, HeatmapError> {
    if vectors.is_empty() {
        return Err(HeatmapError::NoTraits);
    }
    Ok(correlation_distances(vectors)?)
}

/// For each trait in `order`, the strains with a value and those values.
pub fn retrieve_strains_and_values(
    order: &[usize],
    strainlist: &[String],
    vectors: &[Vec<Option<f64>>],
) -> Vec<StrainValues> {
    order
        .iter()
        .map(|&index| {
            let (strains, values) = strainlist
                .iter()
                .zip(vectors[index].iter())
                .filter_map(|(strain, value)| value.map(|v| (strain.clone(), v)))
                .unzip();
            StrainValues {
                index,
                strains,
                values,
            }
        })
        .collect()
}

/// Run the whole preparation: align, correlate, cluster, order.
///
/// `strainlist` defaults to the table's own strains.
pub fn heatmap_data(table: &TraitTable, strainlist: Option<&[String]>) -> Result<HeatmapData, HeatmapError> {
    if table.is_empty() {
        return Err(HeatmapError::NoTraits);
    }

    let strainlist: Vec<String> = strainlist.unwrap_or(table.strains()).to_vec();
    let trait_names = table.names();

    let vectors: Vec<Vec<Option<f64>>> = trait_names
        .iter()
        .filter_map(|name| table.export_trait_data(name, &strainlist))
        .collect();

    for (name, vector) in trait_names.iter().zip(vectors.iter()) {
        let present = vector.iter().filter(|v| v.is_some()).count();
        if present < 2 {
            log::warn!("Trait {} has {} values over the strain list", name, present);
        }
    }

    let mut distances = cluster_traits(&vectors)?;
    distances.set_names(trait_names.clone())?;

    let linkage = slink(&distances);
    let order = linkage.order();
    log::info!(
        "Clustered {} traits over {} strains",
        trait_names.len(),
        strainlist.len()
    );

    let rows = retrieve_strains_and_values(&order, &strainlist, &vectors);

    Ok(HeatmapData {
        strainlist,
        trait_names,
        distances,
        linkage,
        order,
        rows,
    })
}

/// A genetic marker or a trait position.
#[derive(Debug, Clone, PartialEq)]
pub struct Locus {
    pub name: String,
    pub chr: String,
    pub mb: f64,
}

/// Read `name<TAB>chr<TAB>mb` lines. A first line whose position is not a
/// number is taken as a header.
pub fn read_loci<R: BufRead>(reader: R) -> Result<Vec<Locus>, HeatmapError> {
    let mut loci = vec![];
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|e| HeatmapError::Parse {
            line: line_no,
            message: e.to_string(),
        })?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(|s| s.trim()).collect();
        if fields.len() < 3 {
            return Err(HeatmapError::Parse {
                line: line_no,
                message: "expected name, chr and mb".to_string(),
            });
        }
        let mb = match fields[2].parse::<f64>() {
            Ok(mb) => mb,
            Err(_) if loci.is_empty() && line_no == 1 => continue,
            Err(_) => {
                return Err(HeatmapError::Parse {
                    line: line_no,
                    message: format!("invalid position '{}'", fields[2]),
                })
            }
        };
        loci.push(Locus {
            name: fields[0].to_string(),
            chr: fields[1].to_string(),
            mb,
        });
    }
    Ok(loci)
}

/// The marker on chromosome `chr` closest to `mb`. The first one wins a tie.
///
/// # Example
/// ```
/// use slink::libs::heatmap::{nearest_marker, Locus};
/// let markers = vec![
///     Locus { name: "rs1".into(), chr: "1".into(), mb: 3.0 },
///     Locus { name: "rs2".into(), chr: "1".into(), mb: 10.0 },
///     Locus { name: "rs3".into(), chr: "2".into(), mb: 5.0 },
/// ];
/// assert_eq!(nearest_marker(&markers, "1", 7.0), Some("rs2"));
/// assert_eq!(nearest_marker(&markers, "X", 7.0), None);
/// ```
pub fn nearest_marker<'a>(markers: &'a [Locus], chr: &str, mb: f64) -> Option<&'a str> {
    let mut best: Option<(&Locus, f64)> = None;
    for marker in markers.iter().filter(|m| m.chr == chr) {
        let distance = (marker.mb - mb).abs();
        match best {
            Some((_, d)) if distance >= d => {}
            _ => best = Some((marker, distance)),
        }
    }
    best.map(|(m, _)| m.name.as_str())
}

/// Nearest marker for each trait; all missing when there are no markers.
pub fn nearest_markers<'a>(traits: &[Locus], markers: &'a [Locus]) -> Vec<Option<&'a str>> {
    if markers.is_empty() {
        return vec![None; traits.len()];
    }
    traits
        .iter()
        .map(|t| {
            let found = nearest_marker(markers, &t.chr, t.mb);
            if found.is_none() {
                log::warn!("No marker on chromosome {} for {}", t.chr, t.name);
            }
            found
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRAITS: &str = "\
trait\tS1\tS2\tS3\tS4\tS5
up\t1\t2\t3\t4\t5
down\t5\t4\t3\t2\t1
up2\t2\t4\t6\t8\t11
flat\t1\tNA\t2\t1\tx
";

    fn strs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_table() {
        let table = TraitTable::from_tsv(TRAITS.as_bytes()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.strains().len(), 5);
        assert_eq!(table.names(), strs(&["up", "down", "up2", "flat"]));
        assert_eq!(
            table.get("flat").unwrap(),
            &[Some(1.0), None, Some(2.0), Some(1.0), None]
        );
    }

    #[test]
    fn parse_short_row_is_padded() {
        let table = TraitTable::from_tsv("t\tA\tB\tC\nx1\t1\n".as_bytes()).unwrap();
        assert_eq!(table.get("x1").unwrap(), &[Some(1.0), None, None]);
    }

    #[test]
    fn parse_errors() {
        let err = TraitTable::from_tsv("t\tA\nx1\t1\t2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, HeatmapError::Parse { line: 2, .. }));

        let err = TraitTable::from_tsv("t\tA\nx1\tabc\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("abc"));

        let err = TraitTable::from_tsv("t\tA\nx1\t1\nx1\t2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, HeatmapError::DuplicateTrait(_)));

        let err = TraitTable::from_tsv("t\tA\tB\tA\nx1\t1\t2\t3\n".as_bytes()).unwrap_err();
        assert!(matches!(err, HeatmapError::DuplicateStrain(ref s) if s == "A"));
    }

    #[test]
    fn infinite_values_are_rejected() {
        for cell in ["inf", "-inf", "Infinity", "1e400"] {
            let text = format!("t\tA\tB\tC\nx\t1\t2\t{}\n", cell);
            let err = TraitTable::from_tsv(text.as_bytes()).unwrap_err();
            assert!(matches!(err, HeatmapError::Parse { line: 2, .. }), "{}", cell);
            assert!(err.to_string().contains("non-finite"));
        }
    }

    #[test]
    fn export_follows_strainlist() {
        let table = TraitTable::from_tsv(TRAITS.as_bytes()).unwrap();
        let exported = table
            .export_trait_data("up", &strs(&["S3", "S9", "S1"]))
            .unwrap();
        assert_eq!(exported, vec![Some(3.0), None, Some(1.0)]);
        assert!(table.export_trait_data("nope", &strs(&["S1"])).is_none());
    }

    #[test]
    fn strains_and_values_skip_missing() {
        let vectors = vec![
            vec![Some(1.0), None, Some(3.0)],
            vec![None, Some(2.0), None],
        ];
        let rows = retrieve_strains_and_values(&[1, 0], &strs(&["A", "B", "C"]), &vectors);
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[0].strains, strs(&["B"]));
        assert_eq!(rows[0].values, vec![2.0]);
        assert_eq!(rows[1].strains, strs(&["A", "C"]));
        assert_eq!(rows[1].values, vec![1.0, 3.0]);
    }

    #[test]
    fn full_pipeline() {
        let table = TraitTable::from_tsv(TRAITS.as_bytes()).unwrap();
        let data = heatmap_data(&table, None).unwrap();

        assert_eq!(data.distances.size(), 4);
        assert_eq!(data.distances.names()[1], "down");
        assert_eq!(data.order.len(), 4);
        // up and up2 correlate best and merge first
        assert_eq!((data.linkage.steps()[0].left, data.linkage.steps()[0].right), (0, 2));

        let mut sorted = data.order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);

        let up = data.rows.iter().find(|r| r.index == 0).unwrap();
        assert_eq!(up.values, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let flat = data.rows.iter().find(|r| r.index == 3).unwrap();
        assert_eq!(flat.strains, strs(&["S1", "S3", "S4"]));
    }

    #[test]
    fn empty_table() {
        let table = TraitTable::from_tsv("trait\tS1\n".as_bytes()).unwrap();
        assert!(matches!(heatmap_data(&table, None), Err(HeatmapError::NoTraits)));
    }

    #[test]
    fn markers() {
        let markers = read_loci("name\tchr\tmb\nm1\t1\t1.0\nm2\t1\t5.0\nm3\t2\t5.0\nm4\t1\t9.0\n".as_bytes())
            .unwrap();
        assert_eq!(markers.len(), 4);
        assert_eq!(nearest_marker(&markers, "1", 3.0), Some("m1"));
        assert_eq!(nearest_marker(&markers, "1", 4.0), Some("m2"));
        assert_eq!(nearest_marker(&markers, "2", 100.0), Some("m3"));

        let traits = vec![
            Locus { name: "t1".into(), chr: "1".into(), mb: 8.0 },
            Locus { name: "t2".into(), chr: "3".into(), mb: 1.0 },
        ];
        assert_eq!(nearest_markers(&traits, &markers), vec![Some("m4"), None]);
        assert_eq!(nearest_markers(&traits, &[]), vec![None, None]);
    }

    #[test]
    fn loci_errors() {
        assert!(read_loci("m1\t1\n".as_bytes()).is_err());
        assert!(read_loci("m1\t1\t1\nm2\t1\tabc\n".as_bytes()).is_err());
    }
}
