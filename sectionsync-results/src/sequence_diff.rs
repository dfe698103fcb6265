//! Minimal edit scripts between two sequences.
//!
//! Implements Myers' O(ND) greedy algorithm ("An O(ND) Difference Algorithm
//! and Its Variations", 1986). The result is a full edit script in sequence
//! order: every element of `old` appears exactly once as `Equal` or `Delete`,
//! and every element of `new` exactly once as `Equal` or `Insert`.
//!
//! When several minimal scripts exist, deletions are preferred before
//! insertions at the same position.

/// One step of an edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edit {
    /// `old[old]` and `new[new]` match.
    Equal { old: usize, new: usize },
    /// `old[old]` is not in `new`.
    Delete { old: usize },
    /// `new[new]` is not in `old`.
    Insert { new: usize },
}

/// Diffs two sequences of comparable elements.
pub fn diff<T: PartialEq>(old: &[T], new: &[T]) -> Vec<Edit> {
    diff_with(old, new, |a, b| a == b)
}

/// Diffs two sequences by a key extracted from each element.
pub fn diff_by_key<T, K: PartialEq>(old: &[T], new: &[T], key: impl Fn(&T) -> K) -> Vec<Edit> {
    let old_keys: Vec<K> = old.iter().map(&key).collect();
    let new_keys: Vec<K> = new.iter().map(&key).collect();
    diff(&old_keys, &new_keys)
}

/// Diffs two sequences with a custom equality.
pub fn diff_with<T>(old: &[T], new: &[T], eq: impl Fn(&T, &T) -> bool) -> Vec<Edit> {
    let n = old.len();
    let m = new.len();

    let mut prefix = 0;
    while prefix < n && prefix < m && eq(&old[prefix], &new[prefix]) {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < n - prefix
        && suffix < m - prefix
        && eq(&old[n - 1 - suffix], &new[m - 1 - suffix])
    {
        suffix += 1;
    }

    let mut edits = Vec::with_capacity(n.max(m));
    edits.extend((0..prefix).map(|i| Edit::Equal { old: i, new: i }));
    middle(
        &old[prefix..n - suffix],
        &new[prefix..m - suffix],
        &eq,
        prefix,
        &mut edits,
    );
    edits.extend((0..suffix).map(|i| Edit::Equal {
        old: n - suffix + i,
        new: m - suffix + i,
    }));
    edits
}

/// Indices into `old` removed by an edit script, ascending.
pub fn removals(edits: &[Edit]) -> impl Iterator<Item = usize> + '_ {
    edits.iter().filter_map(|edit| match edit {
        Edit::Delete { old } => Some(*old),
        _ => None,
    })
}

/// Indices into `new` inserted by an edit script, ascending.
pub fn insertions(edits: &[Edit]) -> impl Iterator<Item = usize> + '_ {
    edits.iter().filter_map(|edit| match edit {
        Edit::Insert { new } => Some(*new),
        _ => None,
    })
}

/// Number of non-`Equal` steps in an edit script.
pub fn distance(edits: &[Edit]) -> usize {
    edits
        .iter()
        .filter(|edit| !matches!(edit, Edit::Equal { .. }))
        .count()
}

/// Myers' forward pass with a per-round trace, then backtracking. `base` is
/// the common-prefix length already stripped from both sides.
fn middle<T>(a: &[T], b: &[T], eq: &impl Fn(&T, &T) -> bool, base: usize, out: &mut Vec<Edit>) {
    let n = a.len() as isize;
    let m = b.len() as isize;

    if n == 0 {
        out.extend((0..b.len()).map(|j| Edit::Insert { new: base + j }));
        return;
    }
    if m == 0 {
        out.extend((0..a.len()).map(|i| Edit::Delete { old: base + i }));
        return;
    }

    let max = n + m;
    let offset = max;
    // v[k + offset] = furthest x reached on diagonal k.
    let mut v = vec![0isize; (2 * max + 1) as usize];
    // trace[d] holds diagonals -d..=d of `v` as they were before round d.
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'rounds: for d in 0..=max {
        trace.push(v[(offset - d) as usize..=(offset + d) as usize].to_vec());

        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && eq(&a[x as usize], &b[y as usize]) {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                break 'rounds;
            }
            k += 2;
        }
    }

    let mut reversed = Vec::with_capacity((n + m) as usize);
    let (mut x, mut y) = (n, m);
    for d in (0..trace.len() as isize).rev() {
        if d == 0 {
            while x > 0 && y > 0 {
                x -= 1;
                y -= 1;
                reversed.push(Edit::Equal {
                    old: base + x as usize,
                    new: base + y as usize,
                });
            }
            break;
        }

        let window = &trace[d as usize];
        let at = |k: isize| window[(k + d) as usize];
        let k = x - y;
        let prev_k = if k == -d || (k != d && at(k - 1) < at(k + 1)) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k);
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            x -= 1;
            y -= 1;
            reversed.push(Edit::Equal {
                old: base + x as usize,
                new: base + y as usize,
            });
        }
        if x == prev_x {
            y -= 1;
            reversed.push(Edit::Insert {
                new: base + y as usize,
            });
        } else {
            x -= 1;
            reversed.push(Edit::Delete {
                old: base + x as usize,
            });
        }
    }

    out.extend(reversed.into_iter().rev());
}
