//! Island detection for solving and sleeping.
//!
//! An island is a maximal set of dynamic bodies transitively connected by
//! equations. Static and kinematic bodies never join islands: a ground plane
//! touched by two separate piles must not merge them.
//!
//! # Algorithm
//!
//! Island detection uses a union-find (disjoint-set) data structure:
//!
//! 1. Each dynamic body starts in its own island
//! 2. For each equation between two dynamic bodies, union their islands
//! 3. Number the roots in body order so island ids are deterministic
//!
//! Time complexity: O(n × α(n)) ≈ O(n) where α is the inverse Ackermann function.
//!
//! # Example
//!
//! ```
//! use planar_constraint::Islands;
//!
//! // Bodies 0, 1 and 3 are dynamic; body 2 is static.
//! let dynamic = [true, true, false, true];
//! let islands = Islands::build(&dynamic, [(0, 1), (1, 2), (2, 3)]);
//!
//! assert_eq!(islands.num_islands(), 2);
//! assert_eq!(islands.island_of(0), islands.island_of(1));
//! assert_ne!(islands.island_of(0), islands.island_of(3));
//! assert_eq!(islands.island_of(2), None);
//! ```

/// Disjoint-set forest with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    /// Create `n` singleton sets.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Representative of the set containing `x`.
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]]; // Path compression
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets containing `a` and `b`.
    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        // Union by rank
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// Island membership of every body for one step.
#[derive(Debug, Clone, Default)]
pub struct Islands {
    body_island: Vec<Option<usize>>,
    members: Vec<Vec<usize>>,
}

impl Islands {
    /// Build islands from body dynamics flags and equation body pairs.
    ///
    /// Pairs are body indices; pairs touching a non-dynamic body do not
    /// connect anything.
    #[must_use]
    pub fn build<I>(is_dynamic: &[bool], pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let n = is_dynamic.len();
        let mut uf = UnionFind::new(n);
        for (a, b) in pairs {
            if a < n && b < n && is_dynamic[a] && is_dynamic[b] {
                uf.union(a, b);
            }
        }

        let mut root_to_island: Vec<Option<usize>> = vec![None; n];
        let mut body_island = vec![None; n];
        let mut members: Vec<Vec<usize>> = Vec::new();
        for body in 0..n {
            if !is_dynamic[body] {
                continue;
            }
            let root = uf.find(body);
            let island = if let Some(island) = root_to_island[root] {
                island
            } else {
                let island = members.len();
                members.push(Vec::new());
                root_to_island[root] = Some(island);
                island
            };
            members[island].push(body);
            body_island[body] = Some(island);
        }

        Self {
            body_island,
            members,
        }
    }

    /// Number of islands.
    #[must_use]
    pub fn num_islands(&self) -> usize {
        self.members.len()
    }

    /// Island of a body, `None` for non-dynamic bodies.
    #[must_use]
    pub fn island_of(&self, body: usize) -> Option<usize> {
        self.body_island.get(body).copied().flatten()
    }

    /// Island of an equation between `a` and `b`: that of whichever is dynamic.
    #[must_use]
    pub fn island_of_pair(&self, a: usize, b: usize) -> Option<usize> {
        self.island_of(a).or_else(|| self.island_of(b))
    }

    /// Body indices of one island, in ascending order.
    #[must_use]
    pub fn members(&self, island: usize) -> &[usize] {
        self.members.get(island).map_or(&[], Vec::as_slice)
    }

    /// Iterate over all islands' members.
    pub fn iter(&self) -> impl Iterator<Item = &[usize]> {
        self.members.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(3, 4);
        assert_eq!(uf.find(0), uf.find(1));
        assert_ne!(uf.find(1), uf.find(3));
        uf.union(1, 4);
        assert_eq!(uf.find(0), uf.find(3));
        assert_ne!(uf.find(2), uf.find(0));
    }

    #[test]
    fn test_static_bodies_do_not_merge() {
        let dynamic = [false, true, true];
        let islands = Islands::build(&dynamic, [(0, 1), (0, 2)]);
        assert_eq!(islands.num_islands(), 2);
        assert_eq!(islands.island_of(0), None);
        assert_eq!(islands.island_of_pair(0, 2), islands.island_of(2));
    }

    #[test]
    fn test_singletons_and_members() {
        let dynamic = [true, true, true, true];
        let islands = Islands::build(&dynamic, [(3, 1)]);
        assert_eq!(islands.num_islands(), 3);
        assert_eq!(islands.island_of(0), Some(0));
        assert_eq!(islands.members(1), &[1, 3]);
        assert_eq!(islands.iter().count(), 3);
        assert!(islands.members(10).is_empty());
    }
}
