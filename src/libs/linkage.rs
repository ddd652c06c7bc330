use super::error::MatrixError;
use super::matrix::DistanceMatrix;

/// The nested merge structure produced by agglomerative clustering.
///
/// A leaf holds the index of an item in the distance matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeTree {
    Leaf(usize),
    Merge(Box<MergeTree>, Box<MergeTree>),
}

/// One agglomeration step.
///
/// Cluster ids: items are `0..n`, the k-th step creates cluster `n + k`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub left: usize,
    pub right: usize,
    /// Distance at which the two clusters were joined
    pub height: f64,
    /// Number of items in the new cluster
    pub size: usize,
}

/// Result of single-linkage clustering: the ordered list of merges.
#[derive(Debug, Clone, PartialEq)]
pub struct Linkage {
    n: usize,
    steps: Vec<Step>,
}

/// Cluster a distance matrix with single linkage.
///
/// At each step the closest pair of active clusters is merged, and the
/// distance from the new cluster to any other cluster `k` becomes
/// `min(d(i, k), d(j, k))`. Ties go to the first pair in row-major order.
///
/// # Example
/// ```
/// use slink::libs::matrix::DistanceMatrix;
/// use slink::libs::linkage::slink;
///
/// let m = DistanceMatrix::new(vec![
///     vec![0.0, 2.0, 4.0],
///     vec![2.0, 0.0, 4.0],
///     vec![4.0, 4.0, 0.0],
/// ]).unwrap();
/// let linkage = slink(&m);
/// assert_eq!(linkage.tree().to_nested(), "((0,1),2)");
/// assert_eq!(linkage.order(), vec![0, 1, 2]);
/// ```
pub fn slink(matrix: &DistanceMatrix) -> Linkage {
    let n = matrix.size();
    let mut dist = matrix.to_rows();

    // Slot i holds the cluster that absorbed item i; merged clusters reuse
    // the lower slot.
    let mut alive = vec![true; n];
    let mut id_of: Vec<usize> = (0..n).collect();
    let mut size_of = vec![1usize; n];
    let mut steps = Vec::with_capacity(n.saturating_sub(1));

    for k in 0..n.saturating_sub(1) {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in (0..n).filter(|&i| alive[i]) {
            for j in ((i + 1)..n).filter(|&j| alive[j]) {
                let d = dist[i][j];
                match best {
                    Some((_, _, bd)) if d >= bd => {}
                    _ => best = Some((i, j, d)),
                }
            }
        }

        // n - k >= 2 clusters remain, so a pair always exists
        let Some((i, j, height)) = best else { break };

        for other in (0..n).filter(|&o| alive[o] && o != i && o != j) {
            let d = dist[i][other].min(dist[j][other]);
            dist[i][other] = d;
            dist[other][i] = d;
        }

        let size = size_of[i] + size_of[j];
        log::debug!(
            "Merge {} and {} into {} at {} ({} items)",
            id_of[i],
            id_of[j],
            n + k,
            height,
            size
        );
        steps.push(Step {
            left: id_of[i],
            right: id_of[j],
            height,
            size,
        });

        alive[j] = false;
        id_of[i] = n + k;
        size_of[i] = size;
    }

    Linkage { n, steps }
}

/// Validate `rows` and cluster them.
pub fn slink_rows(rows: Vec<Vec<f64>>) -> Result<Linkage, MatrixError> {
    let matrix = DistanceMatrix::new(rows)?;
    Ok(slink(&matrix))
}

impl Linkage {
    /// Number of clustered items
    pub fn size(&self) -> usize {
        self.n
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Height of a cluster id; zero for items.
    pub fn height(&self, id: usize) -> f64 {
        if id < self.n {
            0.0
        } else {
            self.steps[id - self.n].height
        }
    }

    fn root(&self) -> usize {
        if self.steps.is_empty() {
            0
        } else {
            self.n + self.steps.len() - 1
        }
    }

    /// Assemble the merge tree bottom-up.
    pub fn tree(&self) -> MergeTree {
        let mut nodes: Vec<Option<MergeTree>> = (0..self.n).map(|i| Some(MergeTree::Leaf(i))).collect();

        for step in &self.steps {
            let left = nodes[step.left].take();
            let right = nodes[step.right].take();
            let merged = match (left, right) {
                (Some(l), Some(r)) => Some(MergeTree::Merge(Box::new(l), Box::new(r))),
                _ => None,
            };
            nodes.push(merged);
        }

        nodes
            .pop()
            .flatten()
            .unwrap_or(MergeTree::Leaf(0))
    }

    /// Leaves from left to right: the heatmap row order.
    pub fn order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.n);
        if self.n == 0 {
            return order;
        }

        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            if id < self.n {
                order.push(id);
            } else {
                let step = &self.steps[id - self.n];
                stack.push(step.right);
                stack.push(step.left);
            }
        }
        order
    }

    /// Serialize as a Newick tree with branch lengths taken from merge heights.
    ///
    /// `names` labels the items; indices are used when it is too short.
    ///
    /// # Example
    /// ```
    /// use slink::libs::linkage::slink_rows;
    /// let linkage = slink_rows(vec![
    ///     vec![0.0, 2.0, 4.0],
    ///     vec![2.0, 0.0, 4.0],
    ///     vec![4.0, 4.0, 0.0],
    /// ]).unwrap();
    /// let names = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    /// assert_eq!(linkage.to_newick(&names), "((A:2,B:2):2,C:4);");
    /// ```
    pub fn to_newick(&self, names: &[String]) -> String {
        enum Frame {
            Enter(usize, Option<f64>),
            Text(String),
        }

        if self.n == 0 {
            return ";".to_string();
        }

        let label = |id: usize| match names.get(id) {
            Some(name) => quote_label(name),
            None => id.to_string(),
        };

        let mut out = String::new();
        let mut stack = vec![Frame::Enter(self.root(), None)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Text(s) => out.push_str(&s),
                Frame::Enter(id, parent_height) => {
                    let suffix = match parent_height {
                        Some(h) => format!(":{}", branch_length(h, self.height(id))),
                        None => String::new(),
                    };
                    if id < self.n {
                        out.push_str(&label(id));
                        out.push_str(&suffix);
                    } else {
                        let step = &self.steps[id - self.n];
                        out.push('(');
                        stack.push(Frame::Text(format!("){}", suffix)));
                        stack.push(Frame::Enter(step.right, Some(step.height)));
                        stack.push(Frame::Text(",".to_string()));
                        stack.push(Frame::Enter(step.left, Some(step.height)));
                    }
                }
            }
        }
        out.push(';');
        out
    }

    /// Flat clusters after applying every merge with `height <= threshold`.
    ///
    /// Labels are numbered by the first item of each cluster.
    pub fn cut(&self, threshold: f64) -> Vec<usize> {
        let mut parent: Vec<usize> = (0..self.n).collect();
        let mut rep: Vec<usize> = (0..self.n).collect();

        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        for step in &self.steps {
            let a = rep[step.left];
            rep.push(a);
            if step.height > threshold {
                continue;
            }
            let b = rep[step.right];
            let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
            if ra != rb {
                parent[rb.max(ra)] = ra.min(rb);
            }
        }

        let mut labels = vec![usize::MAX; self.n];
        let mut next = 0;
        let mut label_of_root = vec![usize::MAX; self.n];
        for (item, label) in labels.iter_mut().enumerate() {
            let root = find(&mut parent, item);
            if label_of_root[root] == usize::MAX {
                label_of_root[root] = next;
                next += 1;
            }
            *label = label_of_root[root];
        }
        labels
    }
}

impl MergeTree {
    pub fn is_leaf(&self) -> bool {
        matches!(self, MergeTree::Leaf(_))
    }

    /// Leaves from left to right.
    ///
    /// ```
    /// use slink::libs::linkage::MergeTree::{self, *};
    /// let tree = Merge(
    ///     Box::new(Merge(Box::new(Leaf(0)), Box::new(Leaf(3)))),
    ///     Box::new(Leaf(1)),
    /// );
    /// assert_eq!(tree.leaf_order(), vec![0, 3, 1]);
    /// ```
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut order = vec![];
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                MergeTree::Leaf(i) => order.push(*i),
                MergeTree::Merge(left, right) => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        order
    }

    /// Nested pair notation, e.g. `((0,2),1)`.
    pub fn to_nested(&self) -> String {
        enum Frame<'a> {
            Node(&'a MergeTree),
            Text(&'static str),
        }

        let mut out = String::new();
        let mut stack = vec![Frame::Node(self)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Text(s) => out.push_str(s),
                Frame::Node(MergeTree::Leaf(i)) => out.push_str(&i.to_string()),
                Frame::Node(MergeTree::Merge(left, right)) => {
                    out.push('(');
                    stack.push(Frame::Text(")"));
                    stack.push(Frame::Node(right));
                    stack.push(Frame::Text(","));
                    stack.push(Frame::Node(left));
                }
            }
        }
        out
    }
}

/// Parent height minus child height; equal heights give 0 even when both
/// are infinite.
fn branch_length(parent: f64, child: f64) -> f64 {
    if parent == child {
        0.0
    } else {
        parent - child
    }
}

fn quote_label(name: &str) -> String {
    if name
        .chars()
        .any(|c| c.is_whitespace() || "()[]':;,".contains(c))
    {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}
