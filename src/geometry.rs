//! Footprint triangulation and prism extrusion.
//!
//! Footprints live in the ground plane: a point (x, z) maps to the world
//! position (x, 0, z). Extrusion sweeps the footprint up the +Y axis.
//! Side faces get their own vertices so the prism renders flat-shaded.

use anyhow::{bail, ensure, Result};
use bevy::mesh::{Indices, Mesh, PrimitiveTopology};
use bevy::prelude::*;

const AREA_EPSILON: f32 = 1e-6;

/// Signed shoelace area of a footprint ring.
pub fn signed_area(points: &[Vec2]) -> f32 {
    let mut doubled = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        doubled += a.x * b.y - b.x * a.y;
    }
    doubled * 0.5
}

fn cross2(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d0 = cross2(b - a, p - a);
    let d1 = cross2(c - b, p - b);
    let d2 = cross2(a - c, p - c);
    d0 >= -AREA_EPSILON && d1 >= -AREA_EPSILON && d2 >= -AREA_EPSILON
}

/// Ear-clipping triangulation of a simple polygon.
///
/// Returns triangles as index triples into `points`, wound in ring order.
/// Fails on degenerate (near-zero area) or self-intersecting input.
pub fn triangulate(points: &[Vec2]) -> Result<Vec<[u32; 3]>> {
    ensure!(points.len() >= 3, "footprint needs at least 3 points, got {}", points.len());
    let area = signed_area(points);
    ensure!(area.abs() > AREA_EPSILON, "footprint is degenerate (zero area)");

    // Work on a ring normalized to positive orientation; emitted triples
    // keep the original point indices.
    let mut ring: Vec<u32> = (0..points.len() as u32).collect();
    if area < 0.0 {
        ring.reverse();
    }

    let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));
    while ring.len() > 3 {
        let mut clipped = false;
        for i in 0..ring.len() {
            let prev = ring[(i + ring.len() - 1) % ring.len()];
            let curr = ring[i];
            let next = ring[(i + 1) % ring.len()];
            let (a, b, c) = (points[prev as usize], points[curr as usize], points[next as usize]);

            // Reflex corners are never ears.
            if cross2(b - a, c - b) <= AREA_EPSILON {
                continue;
            }
            let blocked = ring.iter().any(|&other| {
                other != prev
                    && other != curr
                    && other != next
                    && point_in_triangle(points[other as usize], a, b, c)
            });
            if blocked {
                continue;
            }

            triangles.push([prev, curr, next]);
            ring.remove(i);
            clipped = true;
            break;
        }
        if !clipped {
            bail!("footprint could not be triangulated (self-intersecting?)");
        }
    }
    triangles.push([ring[0], ring[1], ring[2]]);
    Ok(triangles)
}

/// Build a prism mesh by extruding `footprint` from y = 0 up to y = `depth`.
///
/// Layout of the position buffer, with n footprint points:
/// bottom ring `[0, n)`, top ring `[n, 2n)`, then four vertices per side
/// quad. The two rings are shared by the caps only.
pub fn extrude_polygon(footprint: &[Vec2], depth: f32) -> Result<Mesh> {
    ensure!(depth > 0.0, "extrusion depth must be positive, got {depth}");

    // Normalize to positive orientation so cap winding below is fixed.
    let area = signed_area(footprint);
    ensure!(area.abs() > AREA_EPSILON, "footprint is degenerate (zero area)");
    let ring: Vec<Vec2> = if area < 0.0 {
        footprint.iter().rev().copied().collect()
    } else {
        footprint.to_vec()
    };
    let triangles = triangulate(&ring)?;
    let n = ring.len() as u32;

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(ring.len() * 6);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(ring.len() * 6);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(ring.len() * 6);
    let mut indices: Vec<u32> = Vec::new();

    for p in &ring {
        positions.push([p.x, 0.0, p.y]);
        normals.push([0.0, -1.0, 0.0]);
        uvs.push([p.x, p.y]);
    }
    for p in &ring {
        positions.push([p.x, depth, p.y]);
        normals.push([0.0, 1.0, 0.0]);
        uvs.push([p.x, p.y]);
    }

    // A positively-oriented ring in the XZ plane winds toward -Y, so the
    // bottom cap takes the triangles as-is and the top cap flips them.
    for [a, b, c] in &triangles {
        indices.extend([*a, *b, *c]);
        indices.extend([n + a, n + c, n + b]);
    }

    for i in 0..ring.len() {
        let j = (i + 1) % ring.len();
        let bottom_a = Vec3::new(ring[i].x, 0.0, ring[i].y);
        let bottom_b = Vec3::new(ring[j].x, 0.0, ring[j].y);
        let top_a = bottom_a.with_y(depth);
        let top_b = bottom_b.with_y(depth);
        let edge = (bottom_b - bottom_a).normalize_or_zero();
        let normal = Vec3::Y.cross(edge).normalize_or_zero().to_array();
        let edge_len = bottom_a.distance(bottom_b);

        let base = positions.len() as u32;
        positions.extend([
            bottom_a.to_array(),
            bottom_b.to_array(),
            top_a.to_array(),
            top_b.to_array(),
        ]);
        normals.extend([normal; 4]);
        uvs.extend([[0.0, 0.0], [edge_len, 0.0], [0.0, depth], [edge_len, depth]]);
        indices.extend([base, base + 2, base + 3, base, base + 3, base + 1]);
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    Ok(mesh)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
