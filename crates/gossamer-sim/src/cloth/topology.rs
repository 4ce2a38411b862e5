/// Classification of a mass-spring link by neighbor distance on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpringKind {
    /// 1-hop orthogonal neighbor.
    Structural,
    /// 1-hop diagonal neighbor.
    Shear,
    /// 2-hop orthogonal neighbor.
    Bend,
}

impl SpringKind {
    /// Rest length scale relative to the undeformed grid spacing.
    pub fn rest_scale(self) -> f32 {
        match self {
            SpringKind::Structural => 1.0,
            SpringKind::Shear => std::f32::consts::SQRT_2,
            SpringKind::Bend => 2.0,
        }
    }
}

/// A single spring between two grid particles.
#[derive(Debug, Clone, Copy)]
pub struct Spring {
    pub a: (usize, usize),
    pub b: (usize, usize),
    pub rest_length: f32,
    pub kind: SpringKind,
}

/// Builds the fixed cloth topology from the initial grid layout: structural
/// links to orthogonal neighbors, shear links along the diagonals and bend
/// links two hops away. Each unordered pair appears exactly once, so the
/// force loop never double-counts.
pub fn build_springs(resolution: usize, spacing: f32) -> Vec<Spring> {
    const OFFSETS: [(isize, isize, SpringKind); 6] = [
        (1, 0, SpringKind::Structural),
        (0, 1, SpringKind::Structural),
        (1, 1, SpringKind::Shear),
        (1, -1, SpringKind::Shear),
        (2, 0, SpringKind::Bend),
        (0, 2, SpringKind::Bend),
    ];

    let n = resolution as isize;
    let mut springs = Vec::new();

    for i in 0..n {
        for j in 0..n {
            for (di, dj, kind) in OFFSETS {
                let (bi, bj) = (i + di, j + dj);
                if bi < 0 || bj < 0 || bi >= n || bj >= n {
                    continue;
                }

                springs.push(Spring {
                    a: (i as usize, j as usize),
                    b: (bi as usize, bj as usize),
                    rest_length: spacing * kind.rest_scale(),
                    kind,
                });
            }
        }
    }

    springs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_pair_is_duplicated() {
        let springs = build_springs(5, 0.25);
        let mut seen = std::collections::HashSet::new();

        for s in &springs {
            let key = if s.a <= s.b { (s.a, s.b) } else { (s.b, s.a) };
            assert!(seen.insert(key), "duplicate spring {key:?}");
        }
    }

    #[test]
    fn counts_match_grid_combinatorics() {
        let n = 4;
        let springs = build_springs(n, 1.0);

        let structural = springs.iter().filter(|s| s.kind == SpringKind::Structural).count();
        let shear = springs.iter().filter(|s| s.kind == SpringKind::Shear).count();
        let bend = springs.iter().filter(|s| s.kind == SpringKind::Bend).count();

        assert_eq!(structural, 2 * n * (n - 1));
        assert_eq!(shear, 2 * (n - 1) * (n - 1));
        assert_eq!(bend, 2 * n * (n - 2));
    }

    #[test]
    fn rest_lengths_follow_neighbor_type() {
        for s in build_springs(3, 0.5) {
            let expected = 0.5 * s.kind.rest_scale();
            assert!((s.rest_length - expected).abs() < 1e-6);
        }
    }
}
