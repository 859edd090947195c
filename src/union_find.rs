/// Disjoint-set forest with path compression and union by size.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    /// Creates `n` singleton sets labelled `0..n`.
    pub fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    /// Representative of the set containing `x`, compressing the path walked.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cursor = x;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    /// Merges the sets containing `x` and `y` (smaller set under the larger)
    /// and returns the size of the merged set.
    pub fn union(&mut self, x: usize, y: usize) -> usize {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return self.size[rx];
        }
        let (big, small) = if self.size[rx] >= self.size[ry] {
            (rx, ry)
        } else {
            (ry, rx)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        self.size[big]
    }

    /// Whether `x` and `y` are currently in the same set.
    pub fn connected(&mut self, x: usize, y: usize) -> bool {
        self.find(x) == self.find(y)
    }

    /// Size of the set whose representative is `root`.
    pub fn size_of(&mut self, x: usize) -> usize {
        let root = self.find(x);
        self.size[root]
    }
}

/// Union-find variant used to materialise a dendrogram during single
/// linkage. Each union allocates the next unused label (starting at
/// `n_samples`), so a merge simultaneously records set membership and the
/// identity of the dendrogram node it created: original points are leaves
/// `0..n`, internal nodes are `n..2n-1`.
#[derive(Debug, Clone)]
pub(crate) struct DendrogramUnionFind {
    parent: Vec<Option<usize>>,
    size: Vec<usize>,
    next_label: usize,
}

impl DendrogramUnionFind {
    pub(crate) fn new(n_samples: usize) -> Self {
        let capacity = 2 * n_samples.max(1) - 1;
        let size = (0..capacity).map(|n| usize::from(n < n_samples)).collect();
        DendrogramUnionFind {
            parent: vec![None; capacity],
            size,
            next_label: n_samples,
        }
    }

    /// Merges two set representatives under a freshly allocated label and
    /// returns that label.
    pub(crate) fn union(&mut self, root_a: usize, root_b: usize) -> usize {
        let label = self.next_label;
        self.parent[root_a] = Some(label);
        self.parent[root_b] = Some(label);
        self.size[label] = self.size[root_a] + self.size[root_b];
        self.next_label += 1;
        label
    }

    /// Current representative label of the set containing `x`, with path
    /// compression.
    pub(crate) fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while let Some(up) = self.parent[root] {
            root = up;
        }
        let mut cursor = x;
        while let Some(up) = self.parent[cursor] {
            if up != root {
                self.parent[cursor] = Some(root);
            }
            cursor = up;
        }
        root
    }

    pub(crate) fn size_of(&self, label: usize) -> usize {
        self.size[label]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_merges_and_reports_size() {
        let mut uf = UnionFind::new(5);
        assert_eq!(uf.union(0, 1), 2);
        assert_eq!(uf.union(2, 3), 2);
        assert_eq!(uf.union(1, 3), 4);
        assert!(uf.connected(0, 2));
        assert!(!uf.connected(0, 4));
        assert_eq!(uf.size_of(3), 4);
        assert_eq!(uf.size_of(4), 1);
    }

    #[test]
    fn union_of_same_set_is_idempotent() {
        let mut uf = UnionFind::new(3);
        uf.union(0, 1);
        assert_eq!(uf.union(0, 1), 2);
        assert_eq!(uf.size_of(0), 2);
    }

    #[test]
    fn transitive_connectivity() {
        let mut uf = UnionFind::new(6);
        uf.union(0, 1);
        uf.union(1, 2);
        uf.union(4, 5);
        for (a, b, want) in [(0, 2, true), (2, 3, false), (4, 5, true), (0, 5, false)] {
            assert_eq!(uf.connected(a, b), want, "connected({a}, {b})");
        }
    }

    #[test]
    fn dendrogram_labels_are_sequential() {
        let mut uf = DendrogramUnionFind::new(4);
        // Merging leaves 0 and 1 creates internal node 4.
        assert_eq!(uf.union(0, 1), 4);
        assert_eq!(uf.size_of(4), 2);
        assert_eq!(uf.find(0), 4);
        assert_eq!(uf.find(1), 4);
        // Merging {0,1} with leaf 2 creates node 5 of size 3.
        let root = uf.find(0);
        assert_eq!(uf.union(root, 2), 5);
        assert_eq!(uf.size_of(5), 3);
        assert_eq!(uf.find(1), 5);
        assert_eq!(uf.find(3), 3);
    }
}
