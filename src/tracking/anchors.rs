//! Semantic anchor extraction from raw face-mesh output
//!
//! The overlay geometry only needs three points: the two ear-side contour
//! points and the top of the head. Their indices are a property of the mesh
//! topology, kept here as a named constant set so a model with a different
//! layout only requires swapping the topology, never touching the math.

use serde::{Deserialize, Serialize};

use crate::tracking::landmarker::FaceMesh;

/// Fixed landmark indices for a face-mesh topology.
///
/// The values are not validated against the model at runtime; if the model
/// version changes its point layout, this mapping must change with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshTopology {
    pub left_ear: usize,
    pub right_ear: usize,
    pub top_of_head: usize,
}

/// The standard 468/478-point face-mesh convention.
pub const FACE_MESH_468: MeshTopology = MeshTopology {
    left_ear: 234,
    right_ear: 454,
    top_of_head: 10,
};

/// A single anchor point in normalized coordinates (0-1 range).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub x: f32,
    pub y: f32,
}

/// The anchors driving the overlay transform for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceAnchors {
    pub left_ear: AnchorPoint,
    pub right_ear: AnchorPoint,
    pub top_of_head: AnchorPoint,
}

impl FaceAnchors {
    /// Ear-to-ear distance in normalized coordinates
    pub fn face_width(&self) -> f32 {
        let dx = self.right_ear.x - self.left_ear.x;
        let dy = self.right_ear.y - self.left_ear.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Horizontal midpoint between the ears
    pub fn center_x(&self) -> f32 {
        (self.left_ear.x + self.right_ear.x) / 2.0
    }
}

/// Extract anchors using the default face-mesh topology.
pub fn extract(mesh: &FaceMesh) -> Option<FaceAnchors> {
    extract_with(mesh, &FACE_MESH_468)
}

/// Extract anchors using an explicit topology.
///
/// Returns `None` when the mesh is smaller than the topology expects, which
/// downstream treats the same as a missed detection.
pub fn extract_with(mesh: &FaceMesh, topology: &MeshTopology) -> Option<FaceAnchors> {
    let point = |idx: usize| {
        mesh.point(idx).map(|p| AnchorPoint { x: p.x, y: p.y })
    };

    Some(FaceAnchors {
        left_ear: point(topology.left_ear)?,
        right_ear: point(topology.right_ear)?,
        top_of_head: point(topology.top_of_head)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::landmarker::{MeshPoint, MESH_POINT_COUNT};

    fn mesh_with(points: &[(usize, f32, f32)]) -> FaceMesh {
        let mut mesh = vec![MeshPoint::default(); MESH_POINT_COUNT];
        for &(idx, x, y) in points {
            mesh[idx] = MeshPoint { x, y, z: 0.0 };
        }
        FaceMesh::new(mesh)
    }

    #[test]
    fn test_extract_reads_fixed_indices() {
        let mesh = mesh_with(&[(234, 0.3, 0.5), (454, 0.7, 0.5), (10, 0.5, 0.2)]);
        let anchors = extract(&mesh).unwrap();

        assert_eq!(anchors.left_ear, AnchorPoint { x: 0.3, y: 0.5 });
        assert_eq!(anchors.right_ear, AnchorPoint { x: 0.7, y: 0.5 });
        assert_eq!(anchors.top_of_head, AnchorPoint { x: 0.5, y: 0.2 });
    }

    #[test]
    fn test_face_width_and_center() {
        let mesh = mesh_with(&[(234, 0.3, 0.5), (454, 0.7, 0.5), (10, 0.5, 0.2)]);
        let anchors = extract(&mesh).unwrap();

        assert!((anchors.face_width() - 0.4).abs() < 1e-6);
        assert!((anchors.center_x() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_short_mesh_is_a_miss() {
        let mesh = FaceMesh::new(vec![MeshPoint::default(); 100]);
        assert!(extract(&mesh).is_none());
    }

    #[test]
    fn test_custom_topology() {
        let mesh = mesh_with(&[(0, 0.1, 0.1), (1, 0.9, 0.1), (2, 0.5, 0.0)]);
        let topology = MeshTopology {
            left_ear: 0,
            right_ear: 1,
            top_of_head: 2,
        };
        let anchors = extract_with(&mesh, &topology).unwrap();
        assert!((anchors.face_width() - 0.8).abs() < 1e-6);
    }
}
