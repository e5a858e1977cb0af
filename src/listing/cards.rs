/// Card rendering for projects and skills
use crate::{
    content::{AssetUrlResolver, Project, Skill},
    listing::ListRecord,
};
use serde::Serialize;

/// Shown in place of a missing project image
pub const PREVIEW_PLACEHOLDER: &str = "Preview Unavailable";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCard {
    pub key: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub image_alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_link: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillCard {
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// First letter of the name, used when there is no icon
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_initial: Option<String>,
    pub tooltip: String,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

impl ListRecord for Project {
    type Card = ProjectCard;
    const KEY_PREFIX: &'static str = "project";

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn labels(&self) -> Vec<&str> {
        self.tags.iter().map(String::as_str).collect()
    }

    fn to_card(&self, key: String, assets: &AssetUrlResolver) -> ProjectCard {
        let image_url = self.image.as_ref().map(|image| assets.resolve(image));
        ProjectCard {
            key,
            title: self.title.clone(),
            description: self.description.clone(),
            placeholder: image_url.is_none().then(|| PREVIEW_PLACEHOLDER.to_string()),
            image_url,
            image_alt: format!("{} preview", self.title),
            preview_link: non_empty(&self.project_link),
            source_link: non_empty(&self.code_link),
            tags: self.tags.clone(),
        }
    }
}

impl ListRecord for Skill {
    type Card = SkillCard;
    const KEY_PREFIX: &'static str = "skill";

    fn record_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn labels(&self) -> Vec<&str> {
        self.category.as_deref().into_iter().collect()
    }

    fn to_card(&self, key: String, assets: &AssetUrlResolver) -> SkillCard {
        let icon_url = self.icon.as_ref().map(|icon| assets.resolve(icon));
        let fallback_initial = icon_url.is_none().then(|| {
            self.name
                .chars()
                .next()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "?".to_string())
        });

        SkillCard {
            key,
            name: self.name.clone(),
            category: self.category.clone(),
            icon_url,
            fallback_initial,
            tooltip: self.category.clone().unwrap_or_else(|| "Skill".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ImageRef;

    fn assets() -> AssetUrlResolver {
        AssetUrlResolver::new("https://cdn.example", "proj", "production")
    }

    #[test]
    fn test_project_card_with_image_and_links() {
        let project = Project {
            id: Some("p1".into()),
            title: "Atlas".into(),
            description: Some("Maps".into()),
            project_link: Some("https://atlas.example".into()),
            code_link: Some("".into()),
            image: Some(ImageRef::new("image-abc-10x10-png")),
            tags: vec!["Web".into()],
        };

        let card = project.to_card("p1".into(), &assets());
        assert_eq!(
            card.image_url.as_deref(),
            Some("https://cdn.example/images/proj/production/abc-10x10.png")
        );
        assert!(card.placeholder.is_none());
        assert_eq!(card.image_alt, "Atlas preview");
        assert_eq!(card.preview_link.as_deref(), Some("https://atlas.example"));
        assert!(card.source_link.is_none());
    }

    #[test]
    fn test_project_card_placeholder() {
        let project = Project {
            id: None,
            title: "Bare".into(),
            description: None,
            project_link: None,
            code_link: None,
            image: None,
            tags: Vec::new(),
        };

        let card = project.to_card("project-0".into(), &assets());
        assert!(card.image_url.is_none());
        assert_eq!(card.placeholder.as_deref(), Some(PREVIEW_PLACEHOLDER));
    }

    #[test]
    fn test_skill_card_fallbacks() {
        let named = Skill {
            id: None,
            name: "Rust".into(),
            description: None,
            icon: None,
            category: None,
        };
        let card = named.to_card("skill-0".into(), &assets());
        assert_eq!(card.fallback_initial.as_deref(), Some("R"));
        assert_eq!(card.tooltip, "Skill");

        let unnamed = Skill {
            name: String::new(),
            category: Some("Tools".into()),
            ..named
        };
        let card = unnamed.to_card("skill-1".into(), &assets());
        assert_eq!(card.fallback_initial.as_deref(), Some("?"));
        assert_eq!(card.tooltip, "Tools");
    }
}
