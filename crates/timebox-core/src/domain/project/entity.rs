//! Project entity and its content tree

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::attachment::Adjunto;
use crate::domain::timebox::Timebox;
use crate::error::{Error, Result};

/// Kind of node in a project's content tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Carpeta,
    Documento,
    Video,
    Imagen,
}

impl ContentType {
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Carpeta)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Carpeta => "Carpeta",
            Self::Documento => "Documento",
            Self::Video => "Video",
            Self::Imagen => "Imagen",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node of the content tree
///
/// Only folders own `contenido`; every other kind carries exactly one `adjunto`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub nombre: String,
    pub tipo: ContentType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contenido: Vec<ProjectContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjunto: Option<Adjunto>,
}

impl ProjectContent {
    /// An empty folder
    pub fn folder(nombre: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            nombre: nombre.into(),
            tipo: ContentType::Carpeta,
            contenido: Vec::new(),
            adjunto: None,
        }
    }

    /// A leaf node holding one attachment
    pub fn leaf(nombre: impl Into<String>, tipo: ContentType, adjunto: Adjunto) -> Result<Self> {
        if tipo.is_folder() {
            return Err(Error::InvalidInput(
                "A folder cannot carry an attachment".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            nombre: nombre.into(),
            tipo,
            contenido: Vec::new(),
            adjunto: Some(adjunto),
        })
    }

    pub fn is_folder(&self) -> bool {
        self.tipo.is_folder()
    }

    /// Check the folder/leaf invariant for this node and its descendants
    pub fn validate(&self) -> Result<()> {
        if self.is_folder() {
            if self.adjunto.is_some() {
                return Err(Error::InvalidInput(format!(
                    "Folder '{}' cannot carry an attachment",
                    self.nombre
                )));
            }
            self.contenido.iter().try_for_each(ProjectContent::validate)
        } else {
            if !self.contenido.is_empty() {
                return Err(Error::InvalidInput(format!(
                    "{} '{}' cannot contain other items",
                    self.tipo, self.nombre
                )));
            }
            if self.adjunto.is_none() {
                return Err(Error::InvalidInput(format!(
                    "{} '{}' is missing its attachment",
                    self.tipo, self.nombre
                )));
            }
            Ok(())
        }
    }

    /// Number of nodes in this subtree, including itself
    pub fn count(&self) -> usize {
        1 + self.contenido.iter().map(ProjectContent::count).sum::<usize>()
    }
}

/// A project's reference to one of its timeboxes
///
/// The backend returns either bare ids or populated records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeboxRef {
    Id(String),
    Embedded(Box<Timebox>),
}

impl TimeboxRef {
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Id(id) => Some(id),
            Self::Embedded(timebox) => timebox.id.as_deref(),
        }
    }
}

/// A project with its content tree and timeboxes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub contenido: Vec<ProjectContent>,
    #[serde(default)]
    pub timeboxes: Vec<TimeboxRef>,
}

impl Project {
    pub fn new(nombre: impl Into<String>) -> Self {
        Self {
            nombre: nombre.into(),
            ..Default::default()
        }
    }

    /// Ids of the project's timeboxes
    pub fn timebox_ids(&self) -> Vec<&str> {
        self.timeboxes.iter().filter_map(TimeboxRef::id).collect()
    }

    /// Find a node anywhere in the tree
    pub fn find(&self, content_id: &str) -> Option<&ProjectContent> {
        self.breadcrumbs(content_id).and_then(|path| path.last().copied())
    }

    /// Path from the root to a node, both inclusive
    pub fn breadcrumbs(&self, content_id: &str) -> Option<Vec<&ProjectContent>> {
        fn walk<'a>(
            nodes: &'a [ProjectContent],
            target: &str,
            path: &mut Vec<&'a ProjectContent>,
        ) -> bool {
            for node in nodes {
                path.push(node);
                if node.id == target || walk(&node.contenido, target, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        walk(&self.contenido, content_id, &mut path).then_some(path)
    }

    /// Items directly inside a folder (`None` for the project root)
    pub fn children_of(&self, folder_id: Option<&str>) -> Result<&[ProjectContent]> {
        match folder_id {
            None => Ok(&self.contenido),
            Some(id) => {
                let node = self
                    .find(id)
                    .ok_or_else(|| Error::ContentNotFound(id.to_string()))?;
                if !node.is_folder() {
                    return Err(Error::InvalidInput(format!(
                        "'{}' is a {}, not a folder",
                        node.nombre, node.tipo
                    )));
                }
                Ok(&node.contenido)
            }
        }
    }

    /// Add a node under a folder (`None` for the project root)
    pub fn add_content(&mut self, parent_id: Option<&str>, node: ProjectContent) -> Result<()> {
        node.validate()?;
        let siblings = match parent_id {
            None => &mut self.contenido,
            Some(id) => {
                let parent = find_mut(&mut self.contenido, id)
                    .ok_or_else(|| Error::ContentNotFound(id.to_string()))?;
                if !parent.is_folder() {
                    return Err(Error::InvalidInput(format!(
                        "Only folders can contain items; '{}' is a {}",
                        parent.nombre, parent.tipo
                    )));
                }
                &mut parent.contenido
            }
        };
        siblings.push(node);
        Ok(())
    }

    /// Remove a node (and its subtree) from anywhere in the tree
    pub fn remove_content(&mut self, content_id: &str) -> Option<ProjectContent> {
        fn remove(nodes: &mut Vec<ProjectContent>, target: &str) -> Option<ProjectContent> {
            if let Some(pos) = nodes.iter().position(|n| n.id == target) {
                return Some(nodes.remove(pos));
            }
            nodes
                .iter_mut()
                .find_map(|n| remove(&mut n.contenido, target))
        }
        remove(&mut self.contenido, content_id)
    }

    /// Check the folder/leaf invariant over the whole tree
    pub fn validate_tree(&self) -> Result<()> {
        self.contenido.iter().try_for_each(ProjectContent::validate)
    }
}

fn find_mut<'a>(nodes: &'a mut [ProjectContent], target: &str) -> Option<&'a mut ProjectContent> {
    for node in nodes.iter_mut() {
        if node.id == target {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.contenido, target) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjunto(name: &str) -> Adjunto {
        Adjunto {
            nombre: name.to_string(),
            url: format!("https://files.example.com/{}", name),
            ..Default::default()
        }
    }

    fn sample_project() -> (Project, String, String) {
        let mut project = Project::new("Banca digital");
        let docs = ProjectContent::folder("Documentos");
        let docs_id = docs.id.clone();
        project.add_content(None, docs).unwrap();

        let specs = ProjectContent::folder("Especificaciones");
        let specs_id = specs.id.clone();
        project.add_content(Some(&docs_id), specs).unwrap();

        let leaf = ProjectContent::leaf("alcance.pdf", ContentType::Documento, adjunto("alcance.pdf")).unwrap();
        project.add_content(Some(&specs_id), leaf).unwrap();
        (project, docs_id, specs_id)
    }

    #[test]
    fn test_breadcrumbs() {
        let (project, docs_id, specs_id) = sample_project();
        let leaf_id = project.children_of(Some(&specs_id)).unwrap()[0].id.clone();

        let path = project.breadcrumbs(&leaf_id).unwrap();
        let names: Vec<&str> = path.iter().map(|n| n.nombre.as_str()).collect();
        assert_eq!(names, vec!["Documentos", "Especificaciones", "alcance.pdf"]);

        assert_eq!(project.breadcrumbs(&docs_id).unwrap().len(), 1);
        assert!(project.breadcrumbs("missing").is_none());
    }

    #[test]
    fn test_only_folders_hold_children() {
        let (mut project, _, specs_id) = sample_project();
        let leaf_id = project.children_of(Some(&specs_id)).unwrap()[0].id.clone();

        let err = project
            .add_content(Some(&leaf_id), ProjectContent::folder("Nested"))
            .unwrap_err();
        assert!(err.to_string().contains("Only folders"));

        assert!(project.children_of(Some(&leaf_id)).is_err());
        assert!(matches!(
            project.children_of(Some("nope")),
            Err(Error::ContentNotFound(_))
        ));
    }

    #[test]
    fn test_leaf_requires_attachment() {
        assert!(ProjectContent::leaf("x", ContentType::Carpeta, adjunto("x")).is_err());

        let broken = ProjectContent {
            id: "v1".to_string(),
            nombre: "demo.mp4".to_string(),
            tipo: ContentType::Video,
            contenido: Vec::new(),
            adjunto: None,
        };
        assert!(broken.validate().is_err());
    }

    #[test]
    fn test_remove_content_subtree() {
        let (mut project, docs_id, _) = sample_project();
        assert_eq!(project.contenido[0].count(), 3);

        let removed = project.remove_content(&docs_id).unwrap();
        assert_eq!(removed.nombre, "Documentos");
        assert!(project.contenido.is_empty());
        assert!(project.validate_tree().is_ok());
    }

    #[test]
    fn test_timebox_refs_accept_ids_and_records() {
        let json = serde_json::json!({
            "id": "p1",
            "nombre": "Banca",
            "timeboxes": ["tb-1", { "id": "tb-2", "projectId": "p1" }]
        });
        let project: Project = serde_json::from_value(json).unwrap();
        assert_eq!(project.timebox_ids(), vec!["tb-1", "tb-2"]);
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::json!({
            "id": "p1",
            "nombre": "Banca",
            "contenido": [
                { "id": "c1", "nombre": "Docs", "tipo": "Carpeta", "contenido": [
                    { "id": "c2", "nombre": "a.png", "tipo": "Imagen",
                      "adjunto": { "nombre": "a.png", "url": "https://x/a.png" } }
                ]}
            ]
        });
        let project: Project = serde_json::from_value(json).unwrap();
        assert!(project.validate_tree().is_ok());
        assert!(project.timebox_ids().is_empty());
        assert_eq!(project.find("c2").unwrap().tipo, ContentType::Imagen);
    }
}
