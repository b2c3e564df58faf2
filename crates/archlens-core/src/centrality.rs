//! Structural-importance measures over the simple (deduplicated, loop-free)
//! projection of the dependency graph. Nodes are dense indices `0..n`.

use std::collections::VecDeque;

/// Degree centrality: distinct in- plus out-neighbours over `2 (n - 1)`.
pub fn degree_centrality(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let mut degree = vec![0usize; n];
    for (v, targets) in adjacency.iter().enumerate() {
        degree[v] += targets.len();
        for &w in targets {
            degree[w] += 1;
        }
    }
    let denom = 2.0 * (n - 1) as f64;
    degree.into_iter().map(|d| d as f64 / denom).collect()
}

/// Brandes betweenness centrality for a directed, unweighted graph,
/// normalized by `(n - 1)(n - 2)` so values fall in [0, 1].
pub fn betweenness_centrality(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    let mut centrality = vec![0.0f64; n];
    if n < 3 {
        return centrality;
    }

    let mut stack = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut distance = vec![-1i64; n];
    let mut delta = vec![0.0f64; n];
    let mut queue = VecDeque::with_capacity(n);

    for s in 0..n {
        stack.clear();
        for p in predecessors.iter_mut() {
            p.clear();
        }
        sigma.iter_mut().for_each(|x| *x = 0.0);
        distance.iter_mut().for_each(|x| *x = -1);
        delta.iter_mut().for_each(|x| *x = 0.0);

        sigma[s] = 1.0;
        distance[s] = 0;
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &adjacency[v] {
                if distance[w] < 0 {
                    distance[w] = distance[v] + 1;
                    queue.push_back(w);
                }
                if distance[w] == distance[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    let scale = ((n - 1) * (n - 2)) as f64;
    centrality
        .into_iter()
        .map(|c| (c / scale).clamp(0.0, 1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_middle_node_is_most_between() {
        // 0 -> 1 -> 2
        let adjacency = vec![vec![1], vec![2], vec![]];
        let b = betweenness_centrality(&adjacency);
        assert_eq!(b[0], 0.0);
        assert_eq!(b[2], 0.0);
        // one pair (0,2) routes through 1, out of (n-1)(n-2) = 2 ordered pairs
        assert!((b[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_star_hub() {
        // 1,2,3 -> 0 -> 4
        let adjacency = vec![vec![4], vec![0], vec![0], vec![0], vec![]];
        let b = betweenness_centrality(&adjacency);
        assert!(b[0] > 0.0);
        assert!(b[1..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_degree_centrality() {
        let adjacency = vec![vec![1, 2], vec![], vec![]];
        let d = degree_centrality(&adjacency);
        assert!((d[0] - 0.5).abs() < 1e-12);
        assert!((d[1] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_sizes() {
        assert!(degree_centrality(&[]).is_empty());
        assert_eq!(degree_centrality(&[vec![]]), vec![0.0]);
        assert_eq!(betweenness_centrality(&[vec![1], vec![0]]), vec![0.0, 0.0]);
    }
}
