//! Equispaced Lagrange node lattices in VTK node ordering.
//!
//! Nodes are integer lattice coordinates in `0..=order` along each reference axis. Dividing by
//! the order gives the reference coordinate of the node.

use crate::mesh::CellKind;
use crate::Error;

pub(crate) type Lattice = [usize; 3];

/// lattice nodes of a single cell of the given kind and order
pub(crate) fn lattice_nodes(kind: CellKind, order: usize) -> Result<Vec<Lattice>, Error> {
    if order == 0 {
        return Err(Error::UnsupportedOrder { kind, order });
    }

    let nodes = match kind {
        CellKind::Line => line(order),
        CellKind::Quadrilateral => quadrilateral(order),
        CellKind::Hexahedron => hexahedron(order),
        CellKind::Triangle => triangle(order),
        CellKind::Tetrahedron => {
            if order > 2 {
                return Err(Error::UnsupportedOrder { kind, order });
            }
            tetrahedron(order)
        }
    };

    Ok(nodes)
}

/// number of nodes strictly inside an edge
fn inner(order: usize) -> std::ops::Range<usize> {
    1..order
}

fn line(k: usize) -> Vec<Lattice> {
    let mut nodes = vec![[0, 0, 0], [k, 0, 0]];
    nodes.extend(inner(k).map(|i| [i, 0, 0]));
    nodes
}

fn quadrilateral(k: usize) -> Vec<Lattice> {
    let mut nodes = vec![[0, 0, 0], [k, 0, 0], [k, k, 0], [0, k, 0]];

    nodes.extend(inner(k).map(|i| [i, 0, 0]));
    nodes.extend(inner(k).map(|j| [k, j, 0]));
    nodes.extend(inner(k).map(|i| [i, k, 0]));
    nodes.extend(inner(k).map(|j| [0, j, 0]));

    for j in inner(k) {
        for i in inner(k) {
            nodes.push([i, j, 0]);
        }
    }

    nodes
}

fn hexahedron(k: usize) -> Vec<Lattice> {
    let mut nodes = Vec::with_capacity((k + 1).pow(3));

    for z in [0, k] {
        nodes.extend([[0, 0, z], [k, 0, z], [k, k, z], [0, k, z]]);
    }

    // edges of the bottom and top faces
    for z in [0, k] {
        nodes.extend(inner(k).map(|i| [i, 0, z]));
        nodes.extend(inner(k).map(|j| [k, j, z]));
        nodes.extend(inner(k).map(|i| [i, k, z]));
        nodes.extend(inner(k).map(|j| [0, j, z]));
    }

    // vertical edges
    for (x, y) in [(0, 0), (k, 0), (0, k), (k, k)] {
        nodes.extend(inner(k).map(|z| [x, y, z]));
    }

    // faces normal to x, then y, then z
    for x in [0, k] {
        for z in inner(k) {
            for y in inner(k) {
                nodes.push([x, y, z]);
            }
        }
    }

    for y in [0, k] {
        for z in inner(k) {
            for x in inner(k) {
                nodes.push([x, y, z]);
            }
        }
    }

    for z in [0, k] {
        for y in inner(k) {
            for x in inner(k) {
                nodes.push([x, y, z]);
            }
        }
    }

    for z in inner(k) {
        for y in inner(k) {
            for x in inner(k) {
                nodes.push([x, y, z]);
            }
        }
    }

    nodes
}

/// nodes on the segment from `a` to `b` (exclusive), `k` being the lattice length of the segment
fn edge(a: Lattice, b: Lattice, k: usize) -> impl Iterator<Item = Lattice> {
    inner(k).map(move |step| {
        let mut node = [0; 3];
        for axis in 0..3 {
            // a + (b - a) * step / k, kept in unsigned arithmetic
            node[axis] = (a[axis] * (k - step) + b[axis] * step) / k;
        }
        node
    })
}

fn triangle(k: usize) -> Vec<Lattice> {
    if k == 0 {
        return vec![[0, 0, 0]];
    }

    let corners = [[0, 0, 0], [k, 0, 0], [0, k, 0]];
    let mut nodes = corners.to_vec();

    nodes.extend(edge(corners[0], corners[1], k));
    nodes.extend(edge(corners[1], corners[2], k));
    nodes.extend(edge(corners[2], corners[0], k));

    if k >= 3 {
        nodes.extend(
            triangle(k - 3)
                .into_iter()
                .map(|[i, j, _]| [i + 1, j + 1, 0]),
        );
    }

    nodes
}

fn tetrahedron(k: usize) -> Vec<Lattice> {
    let corners = [[0, 0, 0], [k, 0, 0], [0, k, 0], [0, 0, k]];
    let mut nodes = corners.to_vec();

    for (a, b) in [(0, 1), (1, 2), (2, 0), (0, 3), (1, 3), (2, 3)] {
        nodes.extend(edge(corners[a], corners[b], k));
    }

    nodes
}

/// Integer interpolation weights of every corner at a lattice node, scaled to a common
/// denominator of `order^3`.
pub(crate) fn corner_weights(kind: CellKind, order: usize, node: &Lattice) -> Vec<usize> {
    let dim = kind.dimension();

    if kind.is_simplex() {
        let scale = order * order;
        let mut weights = Vec::with_capacity(dim + 1);
        weights.push((order - node[..dim].iter().sum::<usize>()) * scale);
        weights.extend(node[..dim].iter().map(|n| n * scale));
        weights
    } else {
        let scale = order.pow(3 - dim as u32);
        kind.reference_corners()
            .iter()
            .map(|corner| {
                let numerator: usize = (0..dim)
                    .map(|axis| {
                        if corner[axis] == 1.0 {
                            node[axis]
                        } else {
                            order - node[axis]
                        }
                    })
                    .product();
                numerator * scale
            })
            .collect()
    }
}
