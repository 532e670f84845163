//! In-memory BSP writer for tests.
//!
//! Only compiled for this crate's tests or with the `fixture` feature, so
//! dependent crates can build small maps without checked-in binaries.

#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use glam::Vec3;

use crate::header::{HEADER_SIZE, LUMP_COUNT, LumpKind, MAGIC, VERSION};
use crate::records::{
    Area, AreaPortal, Brush, BrushSide, ContentFlags, Edge, Face, Leaf, LeafBrush, LeafFace,
    Model, NO_STYLE, Node, Plane, SurfaceEdge, SurfaceFlags, TextureInfo,
};

/// Collects records and serializes them into a version 38 BSP file.
#[derive(Debug, Clone, Default)]
pub struct BspWriter {
    pub entities: String,
    pub planes: Vec<Plane>,
    pub vertices: Vec<Vec3>,
    pub visibility: Vec<u8>,
    pub nodes: Vec<Node>,
    pub texture_infos: Vec<TextureInfo>,
    pub faces: Vec<Face>,
    pub lighting: Vec<u8>,
    pub leaves: Vec<Leaf>,
    pub leaf_faces: Vec<LeafFace>,
    pub leaf_brushes: Vec<LeafBrush>,
    pub edges: Vec<Edge>,
    pub surface_edges: Vec<SurfaceEdge>,
    pub models: Vec<Model>,
    pub brushes: Vec<Brush>,
    pub brush_sides: Vec<BrushSide>,
    pub areas: Vec<Area>,
    pub area_portals: Vec<AreaPortal>,
    overrides: Vec<(LumpKind, Vec<u8>)>,
}

impl BspWriter {
    /// Replace a lump's encoded bytes verbatim.
    #[must_use]
    pub fn raw(mut self, kind: LumpKind, bytes: Vec<u8>) -> Self {
        self.overrides.push((kind, bytes));
        self
    }

    /// Add a texture info with axis-aligned S/T projection.
    pub fn add_texture(&mut self, name: &str, flags: SurfaceFlags) -> i16 {
        self.texture_infos.push(TextureInfo {
            s: glam::Vec4::new(1.0, 0.0, 0.0, 0.0),
            t: glam::Vec4::new(0.0, 1.0, 0.0, 0.0),
            flags,
            value: 0,
            name: name.to_owned(),
            next: -1,
        });
        (self.texture_infos.len() - 1) as i16
    }

    /// Add a plane.
    pub fn add_plane(&mut self, normal: Vec3, distance: f32) -> u16 {
        self.planes.push(Plane {
            normal,
            distance,
            kind: 0,
        });
        (self.planes.len() - 1) as u16
    }

    /// Add a face bounded by `points` in winding order.
    ///
    /// Even-numbered boundary edges are stored forwards and odd-numbered
    /// ones backwards, so both surface edge signs are exercised. The face
    /// starts unlit with every style slot unused.
    pub fn add_polygon(&mut self, points: &[Vec3], plane: u16, texture_info: i16) -> usize {
        if self.edges.is_empty() {
            // Edge 0 cannot be referenced with a sign, so it is reserved.
            self.edges.push(Edge { vertices: [0, 0] });
        }

        let base = self.vertices.len();
        self.vertices.extend_from_slice(points);

        let first_edge = self.surface_edges.len() as i32;
        for i in 0..points.len() {
            let a = (base + i) as u16;
            let b = (base + (i + 1) % points.len()) as u16;
            let edge = self.edges.len() as i32;
            if i % 2 == 0 {
                self.edges.push(Edge { vertices: [a, b] });
                self.surface_edges.push(SurfaceEdge(edge));
            } else {
                self.edges.push(Edge { vertices: [b, a] });
                self.surface_edges.push(SurfaceEdge(-edge));
            }
        }

        self.faces.push(Face {
            plane,
            side: 0,
            first_edge,
            edge_count: points.len() as i16,
            texture_info,
            styles: [NO_STYLE; 4],
            light_offset: -1,
        });
        self.faces.len() - 1
    }

    /// Add a model covering faces `first..first + count`.
    pub fn add_model(&mut self, first_face: usize, face_count: usize) -> usize {
        self.models.push(Model {
            mins: Vec3::ZERO,
            maxs: Vec3::ZERO,
            origin: Vec3::ZERO,
            head_node: 0,
            first_face: first_face as i32,
            face_count: face_count as i32,
        });
        self.models.len() - 1
    }

    /// Serialize into a complete file with lumps laid out in directory order.
    #[must_use]
    pub fn finish(&self) -> Vec<u8> {
        let mut payloads: Vec<Vec<u8>> = LumpKind::ALL.iter().map(|&k| self.encode(k)).collect();
        for (kind, bytes) in &self.overrides {
            payloads[kind.index()].clone_from(bytes);
        }

        let mut out = Vec::with_capacity(HEADER_SIZE);
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());

        let mut offset = HEADER_SIZE;
        for payload in &payloads {
            out.extend_from_slice(&(offset as u32).to_le_bytes());
            out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
            offset += payload.len();
        }
        debug_assert_eq!(out.len(), HEADER_SIZE);
        debug_assert_eq!(payloads.len(), LUMP_COUNT);

        for payload in payloads {
            out.extend_from_slice(&payload);
        }
        out
    }

    fn encode(&self, kind: LumpKind) -> Vec<u8> {
        let mut w = Vec::new();
        match kind {
            LumpKind::Entities => {
                if !self.entities.is_empty() {
                    w.extend_from_slice(self.entities.as_bytes());
                    w.push(0);
                }
            }
            LumpKind::Planes => {
                for p in &self.planes {
                    put_vec3(&mut w, p.normal);
                    put(&mut w, &p.distance.to_le_bytes());
                    put(&mut w, &p.kind.to_le_bytes());
                }
            }
            LumpKind::Vertices => {
                for v in &self.vertices {
                    put_vec3(&mut w, *v);
                }
            }
            LumpKind::Visibility => w.clone_from(&self.visibility),
            LumpKind::Nodes => {
                for n in &self.nodes {
                    put(&mut w, &n.plane.to_le_bytes());
                    put(&mut w, &n.children[0].to_le_bytes());
                    put(&mut w, &n.children[1].to_le_bytes());
                    put_i16x3(&mut w, n.mins);
                    put_i16x3(&mut w, n.maxs);
                    put(&mut w, &n.first_face.to_le_bytes());
                    put(&mut w, &n.face_count.to_le_bytes());
                }
            }
            LumpKind::TextureInfo => {
                for t in &self.texture_infos {
                    for v in t.s.to_array().into_iter().chain(t.t.to_array()) {
                        put(&mut w, &v.to_le_bytes());
                    }
                    put(&mut w, &t.flags.bits().to_le_bytes());
                    put(&mut w, &t.value.to_le_bytes());
                    let mut name = [0_u8; 32];
                    let len = t.name.len().min(31);
                    name[..len].copy_from_slice(&t.name.as_bytes()[..len]);
                    put(&mut w, &name);
                    put(&mut w, &t.next.to_le_bytes());
                }
            }
            LumpKind::Faces => {
                for f in &self.faces {
                    put(&mut w, &f.plane.to_le_bytes());
                    put(&mut w, &f.side.to_le_bytes());
                    put(&mut w, &f.first_edge.to_le_bytes());
                    put(&mut w, &f.edge_count.to_le_bytes());
                    put(&mut w, &f.texture_info.to_le_bytes());
                    put(&mut w, &f.styles);
                    put(&mut w, &f.light_offset.to_le_bytes());
                }
            }
            LumpKind::Lighting => w.clone_from(&self.lighting),
            LumpKind::Leaves => {
                for l in &self.leaves {
                    put(&mut w, &l.contents.bits().to_le_bytes());
                    put(&mut w, &l.cluster.to_le_bytes());
                    put(&mut w, &l.area.to_le_bytes());
                    put_i16x3(&mut w, l.mins);
                    put_i16x3(&mut w, l.maxs);
                    put(&mut w, &l.first_leaf_face.to_le_bytes());
                    put(&mut w, &l.leaf_face_count.to_le_bytes());
                    put(&mut w, &l.first_leaf_brush.to_le_bytes());
                    put(&mut w, &l.leaf_brush_count.to_le_bytes());
                }
            }
            LumpKind::LeafFaces => {
                for lf in &self.leaf_faces {
                    put(&mut w, &lf.0.to_le_bytes());
                }
            }
            LumpKind::LeafBrushes => {
                for lb in &self.leaf_brushes {
                    put(&mut w, &lb.0.to_le_bytes());
                }
            }
            LumpKind::Edges => {
                for e in &self.edges {
                    put(&mut w, &e.vertices[0].to_le_bytes());
                    put(&mut w, &e.vertices[1].to_le_bytes());
                }
            }
            LumpKind::SurfaceEdges => {
                for se in &self.surface_edges {
                    put(&mut w, &se.0.to_le_bytes());
                }
            }
            LumpKind::Models => {
                for m in &self.models {
                    put_vec3(&mut w, m.mins);
                    put_vec3(&mut w, m.maxs);
                    put_vec3(&mut w, m.origin);
                    put(&mut w, &m.head_node.to_le_bytes());
                    put(&mut w, &m.first_face.to_le_bytes());
                    put(&mut w, &m.face_count.to_le_bytes());
                }
            }
            LumpKind::Brushes => {
                for b in &self.brushes {
                    put(&mut w, &b.first_side.to_le_bytes());
                    put(&mut w, &b.side_count.to_le_bytes());
                    put(&mut w, &b.contents.bits().to_le_bytes());
                }
            }
            LumpKind::BrushSides => {
                for s in &self.brush_sides {
                    put(&mut w, &s.plane.to_le_bytes());
                    put(&mut w, &s.texture_info.to_le_bytes());
                }
            }
            LumpKind::Pop => {}
            LumpKind::Areas => {
                for a in &self.areas {
                    put(&mut w, &a.portal_count.to_le_bytes());
                    put(&mut w, &a.first_portal.to_le_bytes());
                }
            }
            LumpKind::AreaPortals => {
                for p in &self.area_portals {
                    put(&mut w, &p.portal.to_le_bytes());
                    put(&mut w, &p.other_area.to_le_bytes());
                }
            }
        }
        w
    }
}

fn put(w: &mut Vec<u8>, bytes: &[u8]) {
    w.extend_from_slice(bytes);
}

fn put_vec3(w: &mut Vec<u8>, v: Vec3) {
    for c in v.to_array() {
        w.extend_from_slice(&c.to_le_bytes());
    }
}

fn put_i16x3(w: &mut Vec<u8>, v: [i16; 3]) {
    for c in v {
        w.extend_from_slice(&c.to_le_bytes());
    }
}

/// A single lit 64x64 floor face on the plane `z = 0`, in a one-node tree.
///
/// The face has one light style whose 5x5 samples are a gradient, the
/// worldspawn entity names the sky `unit1_`, and one brush with one side.
#[must_use]
pub fn unit_square() -> BspWriter {
    let mut w = BspWriter {
        entities: "{\n\"classname\" \"worldspawn\"\n\"sky\" \"unit1_\"\n}\n".to_owned(),
        ..BspWriter::default()
    };

    let plane = w.add_plane(Vec3::Z, 0.0);
    let texture = w.add_texture("e1u1/floor3_1", SurfaceFlags::empty());
    let face = w.add_polygon(
        &[
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(64.0, 0.0, 0.0),
            Vec3::new(64.0, 64.0, 0.0),
            Vec3::new(0.0, 64.0, 0.0),
        ],
        plane,
        texture,
    );
    w.faces[face].styles[0] = 0;
    w.faces[face].light_offset = 0;
    w.lighting = (0..25_u8).flat_map(|i| [i, i * 2, i * 3]).collect();

    w.add_model(face, 1);
    w.models[0].maxs = Vec3::new(64.0, 64.0, 0.0);

    w.nodes.push(Node {
        plane: 0,
        children: [-2, -1],
        mins: [0, 0, 0],
        maxs: [64, 64, 0],
        first_face: 0,
        face_count: 1,
    });
    w.leaves.push(Leaf {
        contents: ContentFlags::SOLID,
        cluster: -1,
        area: 0,
        mins: [0, 0, -16],
        maxs: [64, 64, 0],
        first_leaf_face: 0,
        leaf_face_count: 0,
        first_leaf_brush: 0,
        leaf_brush_count: 1,
    });
    w.leaves.push(Leaf {
        contents: ContentFlags::empty(),
        cluster: 0,
        area: 1,
        mins: [0, 0, 0],
        maxs: [64, 64, 64],
        first_leaf_face: 0,
        leaf_face_count: 1,
        first_leaf_brush: 0,
        leaf_brush_count: 0,
    });
    w.leaf_faces.push(LeafFace(0));
    w.leaf_brushes.push(LeafBrush(0));
    w.brushes.push(Brush {
        first_side: 0,
        side_count: 1,
        contents: ContentFlags::SOLID,
    });
    w.brush_sides.push(BrushSide {
        plane,
        texture_info: texture,
    });
    w.areas.push(Area {
        portal_count: 0,
        first_portal: 0,
    });
    w
}
