use super::{BBox, Point3};

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    /// Range into `Bvh::order`.
    Leaf { start: usize, end: usize },
    Split { left: usize, right: usize },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    bbox: BBox,
    kind: NodeKind,
}

/// Bounding volume hierarchy over primitive bounding boxes.
///
/// Primitives are identified by their index in the slice handed to [`Bvh::build`].
/// The tree never sees the primitives themselves; distance queries go through a
/// caller-supplied closure.
#[derive(Debug, Clone)]
pub(crate) struct Bvh {
    nodes: Vec<Node>,
    order: Vec<usize>,
}

impl Bvh {
    const LEAF_SIZE: usize = 8;

    #[must_use]
    pub(crate) fn build(bboxes: &[BBox]) -> Option<Self> {
        Self::build_with_leaf_size(bboxes, Self::LEAF_SIZE)
    }

    /// Median split along the longest axis of the primitive centers.
    #[must_use]
    pub(crate) fn build_with_leaf_size(bboxes: &[BBox], leaf_size: usize) -> Option<Self> {
        if bboxes.is_empty() {
            return None;
        }
        let leaf_size = leaf_size.max(1);
        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * bboxes.len() / leaf_size + 1),
            order: (0..bboxes.len()).collect(),
        };

        // (node slot, start, end); slots are reserved before their children are built.
        let mut pending = vec![(bvh.reserve(), 0, bboxes.len())];
        while let Some((slot, start, end)) = pending.pop() {
            let prims = &mut bvh.order[start..end];
            let bbox = enclosing(prims.iter().map(|&p| bboxes[p]));
            if prims.len() <= leaf_size {
                bvh.nodes[slot] = Node {
                    bbox,
                    kind: NodeKind::Leaf { start, end },
                };
                continue;
            }

            let axis = enclosing(prims.iter().map(|&p| BBox::around(bboxes[p].center()))).longest_axis();
            let mid = prims.len() / 2;
            prims.select_nth_unstable_by(mid, |&a, &b| {
                bboxes[a]
                    .center_on(axis)
                    .total_cmp(&bboxes[b].center_on(axis))
                    .then(a.cmp(&b))
            });

            let (left, right) = (bvh.reserve(), bvh.reserve());
            bvh.nodes[slot] = Node {
                bbox,
                kind: NodeKind::Split { left, right },
            };
            pending.push((left, start, start + mid));
            pending.push((right, start + mid, end));
        }
        Some(bvh)
    }

    fn reserve(&mut self) -> usize {
        self.nodes.push(Node {
            bbox: BBox::around(Point3::ORIGIN),
            kind: NodeKind::Leaf { start: 0, end: 0 },
        });
        self.nodes.len() - 1
    }

    /// Primitive closest to `point` and its squared distance.
    ///
    /// `distance_to_prim` returns the squared distance from `point` to a primitive,
    /// or `None` to skip it. Equal distances resolve to the lowest primitive index.
    pub(crate) fn nearest<F>(&self, point: Point3, mut distance_to_prim: F) -> Option<(usize, f64)>
    where
        F: FnMut(usize) -> Option<f64>,
    {
        let mut best: Option<(usize, f64)> = None;
        let within = |d2: f64, best: Option<(usize, f64)>| best.is_none_or(|(_, b)| d2 <= b);

        let mut stack = vec![0usize];
        while let Some(idx) = stack.pop() {
            let node = self.nodes.get(idx)?;
            if !within(node.bbox.distance_squared_to_point(point), best) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, end } => {
                    for &prim in &self.order[start..end] {
                        let Some(d2) = distance_to_prim(prim).filter(|d| d.is_finite()) else {
                            continue;
                        };
                        let better = match best {
                            None => true,
                            Some((b_prim, b_d2)) => d2 < b_d2 || (d2 == b_d2 && prim < b_prim),
                        };
                        if better {
                            best = Some((prim, d2));
                        }
                    }
                }
                NodeKind::Split { left, right } => {
                    let dl = self.nodes[left].bbox.distance_squared_to_point(point);
                    let dr = self.nodes[right].bbox.distance_squared_to_point(point);
                    // Nearer child goes on top.
                    if dl <= dr {
                        stack.extend([right, left]);
                    } else {
                        stack.extend([left, right]);
                    }
                }
            }
        }
        best
    }
}

fn enclosing(mut boxes: impl Iterator<Item = BBox>) -> BBox {
    let first = boxes.next().unwrap_or(BBox::around(Point3::ORIGIN));
    boxes.fold(first, BBox::union)
}
