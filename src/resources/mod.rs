/**
 * This module contains the registries for everything the scene loads up front:
 * textures from image files, material tables and primitive meshes.
 */
pub mod material;
pub mod mesh;
pub mod texture;
