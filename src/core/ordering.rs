//! Composer ordering
//!
//! Computes the order in which composers run from the artifact types they
//! declare. A composer is picked only when every type it consumes has been
//! produced by an already ordered composer and no composer still pending
//! could produce one of those types. Ties are broken by name so the result
//! does not depend on the input order.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::artifact::ArtifactType;
use crate::error::{ComposeError, UnmetDependency};

/// Something that declares the artifact types it consumes and produces
pub trait Dependent {
    /// Stable name used for tie-breaking and error messages
    fn name(&self) -> &str;

    /// Artifact types this produces
    fn produces(&self) -> &[ArtifactType];

    /// Artifact types this needs before it can run
    fn consumes(&self) -> &[ArtifactType];
}

impl<T: Dependent + ?Sized> Dependent for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn produces(&self) -> &[ArtifactType] {
        (**self).produces()
    }

    fn consumes(&self) -> &[ArtifactType] {
        (**self).consumes()
    }
}

impl<T: Dependent + ?Sized> Dependent for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn produces(&self) -> &[ArtifactType] {
        (**self).produces()
    }

    fn consumes(&self) -> &[ArtifactType] {
        (**self).consumes()
    }
}

/// Order items so that every consumed type is produced earlier
///
/// Returns [`ComposeError::Unsatisfiable`] when a consumed type is never
/// produced or the declarations form a cycle.
pub fn order<T: Dependent>(items: Vec<T>) -> Result<Vec<T>, ComposeError> {
    let mut pending = items;
    pending.sort_by_cached_key(sort_key);

    let mut ordered = Vec::with_capacity(pending.len());
    let mut produced: HashSet<ArtifactType> = HashSet::new();

    while !pending.is_empty() {
        let Some(index) = (0..pending.len()).find(|&i| is_eligible(i, &pending, &produced)) else {
            return Err(ComposeError::Unsatisfiable {
                unmet: unmet_dependencies(&pending, &produced),
            });
        };

        let next = pending.remove(index);
        produced.extend(next.produces().iter().copied());
        ordered.push(next);
    }

    Ok(ordered)
}

fn sort_key<T: Dependent>(item: &T) -> (String, Vec<ArtifactType>, Vec<ArtifactType>) {
    let mut produces = item.produces().to_vec();
    produces.sort_unstable();
    let mut consumes = item.consumes().to_vec();
    consumes.sort_unstable();
    (item.name().to_string(), produces, consumes)
}

fn is_eligible<T: Dependent>(index: usize, pending: &[T], produced: &HashSet<ArtifactType>) -> bool {
    let candidate = &pending[index];
    let consumes = candidate.consumes();

    if !consumes.iter().all(|t| produced.contains(t)) {
        return false;
    }

    // Wait while another pending item could still produce a consumed type
    !pending
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .any(|(_, other)| other.produces().iter().any(|t| consumes.contains(t)))
}

fn unmet_dependencies<T: Dependent>(
    pending: &[T],
    produced: &HashSet<ArtifactType>,
) -> Vec<UnmetDependency> {
    pending
        .iter()
        .map(|item| {
            let mut missing: Vec<ArtifactType> = item
                .consumes()
                .iter()
                .copied()
                .filter(|t| !produced.contains(t))
                .collect();
            missing.sort_unstable();
            missing.dedup();
            UnmetDependency {
                composer: item.name().to_string(),
                missing,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Node {
        name: String,
        produces: Vec<ArtifactType>,
        consumes: Vec<ArtifactType>,
    }

    impl Node {
        fn new(name: &str, produces: &[ArtifactType], consumes: &[ArtifactType]) -> Self {
            Self {
                name: name.to_string(),
                produces: produces.to_vec(),
                consumes: consumes.to_vec(),
            }
        }
    }

    impl Dependent for Node {
        fn name(&self) -> &str {
            &self.name
        }

        fn produces(&self) -> &[ArtifactType] {
            &self.produces
        }

        fn consumes(&self) -> &[ArtifactType] {
            &self.consumes
        }
    }

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    use ArtifactType::{BuildFile, Container, Executable, Release};

    // ============================================
    // Unit Tests
    // ============================================

    #[test]
    fn test_producer_runs_before_consumer() {
        let nodes = vec![
            Node::new("dockerfile", &[Container], &[BuildFile]),
            Node::new("python", &[BuildFile], &[]),
        ];

        let ordered = order(nodes).unwrap();
        assert_eq!(names(&ordered), vec!["python", "dockerfile"]);
    }

    #[test]
    fn test_every_producer_runs_before_consumer() {
        let e = Node::new("e", &[Executable], &[]);
        let r = Node::new("r", &[Release], &[Executable]);

        let ordered = order(vec![e.clone(), r, e]).unwrap();
        assert_eq!(names(&ordered), vec!["e", "e", "r"]);
    }

    #[test]
    fn test_consumer_waits_for_later_named_producer() {
        // "a" sorts first but must wait until both producers are placed
        let nodes = vec![
            Node::new("a", &[Release], &[Executable]),
            Node::new("b", &[Executable], &[]),
            Node::new("c", &[Executable], &[]),
        ];

        let ordered = order(nodes).unwrap();
        assert_eq!(names(&ordered), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_ties_broken_by_name() {
        let nodes = vec![
            Node::new("zeta", &[], &[]),
            Node::new("alpha", &[], &[]),
            Node::new("mid", &[], &[]),
        ];
        let ordered = order(nodes).unwrap();
        assert_eq!(names(&ordered), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_missing_producer_is_unsatisfiable() {
        let nodes = vec![
            Node::new("go", &[Executable], &[]),
            Node::new("dockerfile", &[Container], &[BuildFile]),
        ];

        match order(nodes) {
            Err(ComposeError::Unsatisfiable { unmet }) => {
                assert_eq!(unmet.len(), 1);
                assert_eq!(unmet[0].composer, "dockerfile");
                assert_eq!(unmet[0].missing, vec![BuildFile]);
            }
            other => panic!("Expected Unsatisfiable, got {other:?}"),
        }
    }

    #[test]
    fn test_two_cycle_is_unsatisfiable() {
        let nodes = vec![
            Node::new("a", &[Executable], &[Container]),
            Node::new("b", &[Container], &[Executable]),
        ];

        match order(nodes) {
            Err(ComposeError::Unsatisfiable { unmet }) => {
                let stuck: Vec<_> = unmet.iter().map(|u| u.composer.as_str()).collect();
                assert_eq!(stuck, vec!["a", "b"]);
            }
            other => panic!("Expected Unsatisfiable, got {other:?}"),
        }
    }

    #[test]
    fn test_pending_producer_blocks_otherwise_valid_order() {
        // d, b, a would satisfy every consumer, but b must wait for a
        // (another producer of Executable) and a waits for b's Container
        let nodes = vec![
            Node::new("a", &[Executable], &[Container]),
            Node::new("b", &[Container], &[Executable]),
            Node::new("d", &[Executable], &[]),
        ];

        match order(nodes) {
            Err(ComposeError::Unsatisfiable { unmet }) => {
                let stuck: Vec<_> = unmet.iter().map(|u| u.composer.as_str()).collect();
                assert_eq!(stuck, vec!["a", "b"]);
                assert_eq!(unmet[0].missing, vec![Container]);
                assert!(unmet[1].missing.is_empty());
            }
            other => panic!("Expected Unsatisfiable, got {other:?}"),
        }
    }

    #[test]
    fn test_self_consumption_is_unsatisfiable() {
        let nodes = vec![Node::new("loop", &[BuildFile], &[BuildFile])];
        assert!(order(nodes).is_err());
    }

    #[test]
    fn test_empty_input() {
        let ordered = order(Vec::<Node>::new()).unwrap();
        assert!(ordered.is_empty());
    }

    #[test]
    fn test_orders_shared_pointers() {
        let nodes: Vec<Arc<Node>> = vec![
            Arc::new(Node::new("r", &[Release], &[Executable])),
            Arc::new(Node::new("e", &[Executable], &[])),
        ];
        let ordered = order(nodes).unwrap();
        assert_eq!(ordered[0].name(), "e");
    }

    // ============================================
    // Property Tests
    // ============================================

    /// Acyclic graphs: every node consumes only types ranked strictly below
    /// the lowest type it produces, and only types somebody produces.
    fn acyclic_nodes() -> impl Strategy<Value = Vec<Node>> {
        let node = (
            "[a-f]{1,3}",
            proptest::sample::subsequence(ArtifactType::ALL.to_vec(), 0..=3),
            proptest::sample::subsequence(ArtifactType::ALL.to_vec(), 0..=3),
        );
        proptest::collection::vec(node, 0..10).prop_map(|raw| {
            let all_produced: HashSet<ArtifactType> =
                raw.iter().flat_map(|(_, p, _)| p.iter().copied()).collect();
            raw.into_iter()
                .map(|(name, produces, consumes)| {
                    let floor = produces.iter().min().copied();
                    let consumes = consumes
                        .into_iter()
                        .filter(|t| all_produced.contains(t))
                        .filter(|t| floor.map_or(true, |f| *t < f))
                        .collect();
                    Node {
                        name,
                        produces,
                        consumes,
                    }
                })
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(crate::config::defaults::MIN_PROPTEST_ITERATIONS))]

        /// Every consumed type is produced by some earlier node
        #[test]
        fn prop_order_respects_dependencies(nodes in acyclic_nodes()) {
            let ordered = order(nodes.clone()).expect("acyclic graph must order");
            prop_assert_eq!(ordered.len(), nodes.len());

            let mut produced = HashSet::new();
            for node in &ordered {
                for t in &node.consumes {
                    prop_assert!(produced.contains(t), "{} consumed {} before it was produced", node.name, t);
                }
                produced.extend(node.produces.iter().copied());
            }
        }

        /// All producers of a consumed type are placed before its consumer
        #[test]
        fn prop_order_places_all_producers_first(nodes in acyclic_nodes()) {
            let ordered = order(nodes).expect("acyclic graph must order");
            for (i, consumer) in ordered.iter().enumerate() {
                for (j, producer) in ordered.iter().enumerate() {
                    if i != j && producer.produces.iter().any(|t| consumer.consumes.contains(t)) {
                        prop_assert!(j < i);
                    }
                }
            }
        }

        /// Reordering the input does not change the output
        #[test]
        fn prop_order_is_deterministic(
            nodes in acyclic_nodes(),
            seed in any::<u64>(),
        ) {
            let mut shuffled = nodes.clone();
            // Deterministic Fisher-Yates driven by the seed
            let mut state = seed | 1;
            for i in (1..shuffled.len()).rev() {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let j = usize::try_from(state % (i as u64 + 1)).unwrap();
                shuffled.swap(i, j);
            }

            let a = order(nodes).unwrap();
            let b = order(shuffled).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
