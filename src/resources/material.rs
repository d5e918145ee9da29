use std::collections::HashMap;

use crate::data_structures::material::MaterialRecord;

/// Append-only list of materials with an O(1) tag index.
///
/// Tags are not required to be unique. The first definition of a tag is the one
/// every lookup returns; later ones are kept in definition order but shadowed.
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    records: Vec<MaterialRecord>,
    by_tag: HashMap<String, usize>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, record: MaterialRecord) {
        let index = self.records.len();
        if self.by_tag.contains_key(&record.tag) {
            log::warn!(
                "Material '{}' is already defined, the new definition is shadowed.",
                record.tag
            );
        } else {
            self.by_tag.insert(record.tag.clone(), index);
        }
        self.records.push(record);
    }

    pub fn find(&self, tag: &str) -> Option<&MaterialRecord> {
        self.by_tag.get(tag).map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All definitions, shadowed ones included, in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &MaterialRecord> {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wood(tag: &str, shininess: f32) -> MaterialRecord {
        MaterialRecord::new(
            tag,
            [0.2, 0.15, 0.1],
            0.4,
            [0.6, 0.4, 0.2],
            [0.4, 0.4, 0.4],
            shininess,
        )
    }

    #[test]
    fn find_returns_the_defined_record() {
        let mut materials = MaterialRegistry::new();
        materials.define(wood("box", 64.0));

        let found = materials.find("box").expect("box is defined");
        assert_eq!(found, &wood("box", 64.0));
        assert_eq!(found.ambient_strength, 0.4);
        assert_eq!(found.specular_color, cgmath::Vector3::new(0.4, 0.4, 0.4));
    }

    #[test]
    fn undefined_tag_is_not_found() {
        let mut materials = MaterialRegistry::new();
        assert!(materials.find("box").is_none());
        materials.define(wood("box", 64.0));
        assert!(materials.find("Box").is_none());
    }

    #[test]
    fn first_definition_shadows_later_duplicates() {
        let mut materials = MaterialRegistry::new();
        materials.define(wood("box", 64.0));
        materials.define(wood("box", 8.0));

        assert_eq!(materials.len(), 2);
        assert_eq!(materials.find("box").map(|m| m.shininess), Some(64.0));
        let shininess: Vec<f32> = materials.iter().map(|m| m.shininess).collect();
        assert_eq!(shininess, vec![64.0, 8.0]);
    }
}
