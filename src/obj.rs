//! Wavefront OBJ loading through `tobj`.
//!
//! Every model in the file becomes one [`Object`]. Faces take their color
//! from the material's diffuse color and, when the material names a diffuse
//! texture that loads, are textured with the mesh's UVs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use image::Rgba;

use crate::colors;
use crate::error::Result;
use crate::face::Face;
use crate::math::{Vec2, Vec3};
use crate::object::Object;
use crate::texture::Texture;

struct MaterialLook {
    color: Rgba<u8>,
    texture: Option<Arc<Texture>>,
}

fn to_channel(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn load_materials(materials: &[tobj::Material], base: &Path) -> Vec<MaterialLook> {
    let mut textures: HashMap<String, Option<Arc<Texture>>> = HashMap::new();
    materials
        .iter()
        .map(|material| {
            let color = material.diffuse.map_or(colors::WHITE, |[r, g, b]| {
                colors::rgb(to_channel(r), to_channel(g), to_channel(b))
            });
            let texture = material.diffuse_texture.as_ref().and_then(|file| {
                textures
                    .entry(file.clone())
                    .or_insert_with(|| match Texture::from_file(base.join(file)) {
                        Ok(texture) => Some(Arc::new(texture)),
                        Err(e) => {
                            log::warn!("skipping texture {file} of material {}: {e}", material.name);
                            None
                        }
                    })
                    .clone()
            });
            MaterialLook { color, texture }
        })
        .collect()
}

/// Loads every model of an OBJ file, triangulated, in its local space.
pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Vec<Object>> {
    let path = path.as_ref();
    let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            log::warn!("no materials for {}: {e}", path.display());
            Vec::new()
        }
    };
    let looks = load_materials(&materials, path.parent().unwrap_or(Path::new(".")));

    let objects: Vec<Object> = models
        .into_iter()
        .map(|model| {
            let mesh = &model.mesh;
            let look = mesh.material_id.and_then(|id| looks.get(id));
            let color = look.map_or(colors::WHITE, |l| l.color);

            let position = |i: u32| {
                let i = i as usize * 3;
                Vec3::new(
                    mesh.positions[i] as f64,
                    mesh.positions[i + 1] as f64,
                    mesh.positions[i + 2] as f64,
                )
            };
            let texcoord = |i: u32| {
                let i = i as usize * 2;
                Vec2::new(mesh.texcoords[i] as f64, mesh.texcoords[i + 1] as f64)
            };
            let has_uvs = mesh.texcoords.len() / 2 == mesh.positions.len() / 3;

            let faces = mesh
                .indices
                .chunks_exact(3)
                .map(|tri| {
                    let face = Face::new([position(tri[0]), position(tri[1]), position(tri[2])], color);
                    match look.and_then(|l| l.texture.clone()) {
                        Some(texture) if has_uvs => face.with_texture(
                            texture,
                            [texcoord(tri[0]), texcoord(tri[1]), texcoord(tri[2])],
                        ),
                        _ => face,
                    }
                })
                .collect();
            Object::new(model.name, faces)
        })
        .collect();

    log::info!(
        "loaded {} objects ({} faces) from {}",
        objects.len(),
        objects.iter().map(Object::face_count).sum::<usize>(),
        path.display()
    );
    Ok(objects)
}
