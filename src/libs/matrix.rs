use super::error::MatrixError;
use itertools::Itertools;
use std::io::BufRead;

/// A validated distance matrix: square, symmetric, zero diagonal and
/// non-negative.
///
/// Values are stored row-major in a flat vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    names: Vec<String>,
    size: usize,
    data: Vec<f64>,
}

/// Check that `rows` form a distance matrix.
///
/// Checks run in a fixed order and the first failing class is reported:
/// emptiness, row lengths, diagonal, symmetry, sign.
///
/// # Example
/// ```
/// use slink::libs::matrix::validate;
/// use slink::libs::error::MatrixError;
///
/// assert!(validate(&[vec![0.0, 2.0], vec![2.0, 0.0]]).is_ok());
/// assert!(matches!(
///     validate(&[vec![0.0, 1.0], vec![2.0, 0.0]]),
///     Err(MatrixError::AsymmetricMatrix { .. })
/// ));
/// ```
pub fn validate(rows: &[Vec<f64>]) -> Result<(), MatrixError> {
    if rows.is_empty() {
        return Err(MatrixError::Empty("matrix has no rows".to_string()));
    }
    if let Some(row) = rows.iter().position(|r| r.is_empty()) {
        return Err(MatrixError::Empty(format!("row {} is empty", row)));
    }

    let n = rows.len();
    for (row, values) in rows.iter().enumerate() {
        if values.len() != n {
            return Err(MatrixError::LengthMismatch {
                row,
                len: values.len(),
                expected: n,
            });
        }
    }

    for (index, values) in rows.iter().enumerate() {
        // NaN fails here too
        if values[index] != 0.0 {
            return Err(MatrixError::NonZeroDiagonal {
                index,
                value: values[index],
            });
        }
    }

    for i in 0..n {
        for j in (i + 1)..n {
            if rows[i][j] != rows[j][i] {
                return Err(MatrixError::AsymmetricMatrix {
                    i,
                    j,
                    ij: rows[i][j],
                    ji: rows[j][i],
                });
            }
        }
    }

    for (i, values) in rows.iter().enumerate() {
        if let Some(j) = values.iter().position(|&v| v < 0.0) {
            return Err(MatrixError::NegativeDistance {
                i,
                j,
                value: values[j],
            });
        }
    }

    Ok(())
}

/// Validate `rows`, then return the distance between items `i` and `j`.
///
/// # Example
/// ```
/// use slink::libs::matrix::nearest;
/// let m = vec![
///     vec![0.0, 9.0, 3.0],
///     vec![9.0, 0.0, 7.0],
///     vec![3.0, 7.0, 0.0],
/// ];
/// assert_eq!(nearest(&m, 0, 2).unwrap(), 3.0);
/// assert_eq!(nearest(&m, 2, 0).unwrap(), 3.0);
/// ```
pub fn nearest(rows: &[Vec<f64>], i: usize, j: usize) -> Result<f64, MatrixError> {
    validate(rows)?;
    let size = rows.len();
    if i >= size || j >= size {
        return Err(MatrixError::IndexOutOfRange { i, j, size });
    }
    Ok(rows[i][j])
}

impl DistanceMatrix {
    /// Build a matrix from rows. Items are named by their index.
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let names = (0..rows.len()).map(|i| i.to_string()).collect();
        Self::build(names, rows)
    }

    /// Build a matrix from `(name, row)` pairs.
    pub fn from_named_rows(named: Vec<(String, Vec<f64>)>) -> Result<Self, MatrixError> {
        let (names, rows): (Vec<_>, Vec<_>) = named.into_iter().unzip();
        Self::build(names, rows)
    }

    fn build(names: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        validate(&rows)?;
        let size = rows.len();
        let data = rows.into_iter().flatten().collect();
        Ok(Self { names, size, data })
    }

    /// Parse a JSON nested-array literal such as `[[0, 1.5], [1.5, 0]]`.
    ///
    /// A top-level value or a row that is not an array, or a cell that is
    /// not a number, is `NotListOrTuple`.
    ///
    /// # Example
    /// ```
    /// use slink::libs::matrix::DistanceMatrix;
    /// use slink::libs::error::MatrixError;
    ///
    /// let m = DistanceMatrix::from_json("[[0, 5.5], [5.5, 0]]").unwrap();
    /// assert_eq!(m.get(0, 1), 5.5);
    ///
    /// let err = DistanceMatrix::from_json("9").unwrap_err();
    /// assert!(matches!(err, MatrixError::NotListOrTuple(_)));
    /// ```
    pub fn from_json(text: &str) -> Result<Self, MatrixError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| MatrixError::Parse {
                line: e.line(),
                message: e.to_string(),
            })?;

        let outer = value
            .as_array()
            .ok_or_else(|| MatrixError::NotListOrTuple(format!("got {}", value)))?;

        let mut rows = Vec::with_capacity(outer.len());
        for (i, item) in outer.iter().enumerate() {
            let cells = item
                .as_array()
                .ok_or_else(|| MatrixError::NotListOrTuple(format!("row {} is {}", i, item)))?;
            let row = cells
                .iter()
                .map(|cell| {
                    cell.as_f64().ok_or_else(|| {
                        MatrixError::NotListOrTuple(format!("row {} holds {}", i, cell))
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            rows.push(row);
        }

        Self::new(rows)
    }

    /// Parse a relaxed PHYLIP distance matrix.
    ///
    /// The optional first line holds the number of items; every other line is
    /// a name followed by whitespace-separated distances. Empty lines and
    /// lines starting with `#` are skipped.
    ///
    /// # Example
    /// ```
    /// use slink::libs::matrix::DistanceMatrix;
    /// let text = "3\nA 0 2 4\nB 2 0 4\nC 4 4 0\n";
    /// let m = DistanceMatrix::from_phylip(text.as_bytes()).unwrap();
    /// assert_eq!(m.size(), 3);
    /// assert_eq!(m.names()[2], "C");
    /// assert_eq!(m.get(1, 2), 4.0);
    /// ```
    pub fn from_phylip<R: BufRead>(reader: R) -> Result<Self, MatrixError> {
        let mut expected: Option<usize> = None;
        let mut named = vec![];

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|e| MatrixError::Parse {
                line: line_no,
                message: e.to_string(),
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let mut fields = trimmed.split_whitespace();
            // Always present on a non-empty line
            let name = fields.next().unwrap_or_default().to_string();
            let rest: Vec<&str> = fields.collect();

            if named.is_empty() && expected.is_none() && rest.is_empty() {
                if let Ok(n) = name.parse::<usize>() {
                    expected = Some(n);
                    continue;
                }
            }

            let values = rest
                .iter()
                .map(|s| {
                    s.parse::<f64>().map_err(|_| MatrixError::Parse {
                        line: line_no,
                        message: format!("invalid distance '{}'", s),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            named.push((name, values));
        }

        if let Some(n) = expected {
            if n != named.len() {
                return Err(MatrixError::Parse {
                    line: 1,
                    message: format!("header declares {} items, found {} rows", n, named.len()),
                });
            }
        }

        log::debug!("Read a PHYLIP matrix of {} rows", named.len());
        Self::from_named_rows(named)
    }

    /// Serialize to relaxed PHYLIP, tab separated.
    pub fn to_phylip(&self) -> String {
        let mut out = format!("{}\n", self.size);
        for i in 0..self.size {
            out.push_str(&format!("{}\t{}\n", self.names[i], self.row(i).iter().join("\t")));
        }
        out
    }

    /// Number of items
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Replace item names. The count must match the matrix size.
    pub fn set_names(&mut self, names: Vec<String>) -> Result<(), MatrixError> {
        if names.len() != self.size {
            return Err(MatrixError::NameCount {
                found: names.len(),
                expected: self.size,
            });
        }
        self.names = names;
        Ok(())
    }

    /// Distance between items `i` and `j`. Panics when out of range.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.size && j < self.size);
        self.data[i * self.size + j]
    }

    /// Checked distance lookup.
    pub fn nearest(&self, i: usize, j: usize) -> Result<f64, MatrixError> {
        if i >= self.size || j >= self.size {
            return Err(MatrixError::IndexOutOfRange {
                i,
                j,
                size: self.size,
            });
        }
        Ok(self.data[i * self.size + j])
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    /// Copy back into nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.size).map(|i| self.row(i).to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_rows(rows: &[&[i32]]) -> Vec<Vec<f64>> {
        rows.iter()
            .map(|r| r.iter().map(|&v| v as f64).collect())
            .collect()
    }

    fn gn1() -> Vec<Vec<f64>> {
        int_rows(&[
            &[0, 9, 3, 6, 11],
            &[9, 0, 7, 5, 10],
            &[3, 7, 0, 9, 2],
            &[6, 5, 9, 0, 8],
            &[11, 10, 2, 8, 0],
        ])
    }

    #[test]
    fn rejects_non_lists() {
        for text in ["9", "\"some string\"", "5.432", "[1,2,3]", "[\"test\", 7.4]"] {
            let err = DistanceMatrix::from_json(text).unwrap_err();
            assert_eq!(err.kind(), "NotListOrTuple", "{}", text);
        }
    }

    #[test]
    fn rejects_empty() {
        for text in ["[]", "[[],[]]", "[[],[],[]]", "[[0,1,2],[],[1,2,0]]"] {
            let err = DistanceMatrix::from_json(text).unwrap_err();
            assert_eq!(err.kind(), "Empty", "{}", text);
        }
        assert!(matches!(validate(&[]), Err(MatrixError::Empty(_))));
    }

    #[test]
    fn rejects_ragged() {
        let cases: Vec<Vec<Vec<f64>>> = vec![
            int_rows(&[&[0, 1]]),
            int_rows(&[&[0, 1, 2], &[3, 4, 5]]),
            int_rows(&[&[0, 1, 2, 3], &[4, 5, 6], &[7, 8, 9, 0]]),
            int_rows(&[
                &[0, 1, 2, 3, 4],
                &[5, 6, 7, 8, 9],
                &[1, 2, 3, 4, 5],
                &[2, 3],
                &[3, 4, 5, 6, 7],
            ]),
        ];
        for rows in cases {
            assert!(
                matches!(validate(&rows), Err(MatrixError::LengthMismatch { .. })),
                "{:?}",
                rows
            );
        }

        match validate(&int_rows(&[&[0, 1, 2], &[1, 0], &[2, 1, 0]])) {
            Err(MatrixError::LengthMismatch { row, len, expected }) => {
                assert_eq!((row, len, expected), (1, 2, 3));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_non_zero_diagonal() {
        for rows in [int_rows(&[&[1]]), int_rows(&[&[1, 2], &[3, 4]])] {
            assert!(matches!(
                validate(&rows),
                Err(MatrixError::NonZeroDiagonal { index: 0, .. })
            ));
        }
        assert!(matches!(
            validate(&[vec![0.0, 1.0], vec![1.0, f64::NAN]]),
            Err(MatrixError::NonZeroDiagonal { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_asymmetric() {
        let cases = vec![
            int_rows(&[&[0, 1], &[2, 0]]),
            int_rows(&[&[0, 1, 2], &[1, 0, 3], &[9, 7, 0]]),
            int_rows(&[&[0, 1, 2, 3], &[7, 0, 2, 3], &[2, 3, 0, 1], &[8, 9, 5, 0]]),
        ];
        for rows in cases {
            assert!(matches!(
                validate(&rows),
                Err(MatrixError::AsymmetricMatrix { .. })
            ));
        }
    }

    #[test]
    fn rejects_negative() {
        let cases = vec![
            int_rows(&[&[0, -1, 2, 3], &[-1, 0, 3, 4], &[2, 3, 0, 5], &[3, 4, 5, 0]]),
            int_rows(&[&[0, 1, -2, 3], &[1, 0, 3, 4], &[-2, 3, 0, 5], &[3, 4, 5, 0]]),
            int_rows(&[&[0, 1, 2, 3], &[1, 0, -3, 4], &[2, -3, 0, 5], &[3, 4, 5, 0]]),
            int_rows(&[&[0, 1, 2, -3], &[1, 0, 3, 4], &[2, 3, 0, 5], &[-3, 4, 5, 0]]),
            int_rows(&[&[0, 1, 2, 3], &[1, 0, 3, -4], &[2, 3, 0, 5], &[3, -4, 5, 0]]),
            int_rows(&[&[0, 1, 2, 3], &[1, 0, 3, 4], &[2, 3, 0, -5], &[3, 4, -5, 0]]),
        ];
        for rows in cases {
            let err = nearest(&rows, 1, 1).unwrap_err();
            assert_eq!(err.kind(), "NegativeDistance");
            assert!(err.to_string().contains("Distances should be positive"));
        }
    }

    #[test]
    fn nearest_is_a_lookup() {
        let m = gn1();
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(nearest(&m, i, j).unwrap(), m[i][j]);
                assert_eq!(nearest(&m, i, j).unwrap(), nearest(&m, j, i).unwrap());
            }
        }
        assert_eq!(nearest(&m, 2, 4).unwrap(), 2.0);
        assert_eq!(nearest(&m, 3, 0).unwrap(), 6.0);
        assert_eq!(nearest(&m, 1, 1).unwrap(), 0.0);
        assert_eq!(nearest(&m, 0, 4).unwrap(), 11.0);
    }

    #[test]
    fn nearest_with_floats() {
        let m = DistanceMatrix::from_json(
            "[[0,9,5.5,6,11],[9,0,7,5,10],[5.5,7,0,9,2],[6,5,9,0,3],[11,10,2,3,0]]",
        )
        .unwrap();
        assert_eq!(m.nearest(0, 2).unwrap(), 5.5);
        assert_eq!(m.nearest(2, 0).unwrap(), 5.5);
        assert_eq!(m.nearest(3, 4).unwrap(), 3.0);
        assert_eq!(m.nearest(4, 4).unwrap(), 0.0);
    }

    #[test]
    fn nearest_out_of_range() {
        let m = DistanceMatrix::new(gn1()).unwrap();
        assert!(matches!(
            m.nearest(5, 0),
            Err(MatrixError::IndexOutOfRange { size: 5, .. })
        ));
        assert!(nearest(&gn1(), 0, 7).is_err());
    }

    #[test]
    fn phylip_io() {
        let text = "# comment\n4\nA 0 7 11 14\nB 7 0 6 9\n\nC 11 6 0 7\nD 14 9 7 0\n";
        let m = DistanceMatrix::from_phylip(text.as_bytes()).unwrap();
        assert_eq!(m.size(), 4);
        assert_eq!(m.names(), &["A", "B", "C", "D"]);
        assert_eq!(m.get(3, 0), 14.0);

        let out = m.to_phylip();
        assert!(out.starts_with("4\nA\t0\t7\t11\t14\n"));
        let again = DistanceMatrix::from_phylip(out.as_bytes()).unwrap();
        assert_eq!(again, m);
    }

    #[test]
    fn phylip_without_header() {
        let m = DistanceMatrix::from_phylip("A 0 1\nB 1 0\n".as_bytes()).unwrap();
        assert_eq!(m.size(), 2);
    }

    #[test]
    fn phylip_errors() {
        let err = DistanceMatrix::from_phylip("2\nA 0 x\nB 1 0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, MatrixError::Parse { line: 2, .. }));

        let err = DistanceMatrix::from_phylip("3\nA 0 1\nB 1 0\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), "Parse");

        let err = DistanceMatrix::from_phylip("A 0 1\nB 1\n".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), "LengthMismatch");
    }

    #[test]
    fn json_syntax_error() {
        let err = DistanceMatrix::from_json("[[0, 1],").unwrap_err();
        assert_eq!(err.kind(), "Parse");
    }

    #[test]
    fn name_count_must_match() {
        let mut m = DistanceMatrix::new(vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let err = m.set_names(vec!["A".to_string()]).unwrap_err();
        assert_eq!(err, MatrixError::NameCount { found: 1, expected: 2 });
        assert_eq!(err.kind(), "NameCount");
        assert_eq!(err.to_string(), "1 names given for a 2x2 matrix");

        m.set_names(vec!["A".to_string(), "B".to_string()]).unwrap();
        assert_eq!(m.names(), &["A", "B"]);
    }
}
