//! Criteria catalog: the ordered categories and statements of the grid.
//!
//! Loads catalogs from TOML files and validates them. When no file is
//! configured the built-in oral presentation grid is used.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::CriterionKey;

/// Title of the built-in grid.
pub const BUILTIN_TITLE: &str = "Grille d'évaluation de l'exposé oral";

const BUILTIN: &[(&str, &[&str])] = &[
    (
        "CONTENU",
        &[
            "Respect de la consigne et compréhension complète du sujet",
            "Sujet clairement annoncé dès l'introduction",
            "Sujet argumentatif (prise de position explicite)",
            "Arguments clairs, développés et compréhensible",
            "Exemples concrets pour appuyer les arguments",
            "Organisation logique (introduction / développement / conclusion)",
            "Qualité et fiabilité des informations, maîtrise des connaissances",
            "Gestion efficace du temps et équilibre des parties",
        ],
    ),
    (
        "NON VERBALE",
        &[
            "Contact visuel avec le public",
            "Posture stable et adaptée",
            "Interaction avec le public (attention et réponses aux questions)",
            "Gestuelle naturelle et cohérente avec le discours",
            "Gestion du stress (pas de lecture excessive)",
            "Voix audible et articulation claire",
            "Intonation expressive (évite la monotonie)",
        ],
    ),
    (
        "SUPPORT VISUEL",
        &[
            "Page de garde complète (titre, nom, contexte)",
            "Lisibilité (police, taille, contraste)",
            "Contenu synthétique (mots-clés, pas de paragraphes)",
            "Cohérence entre discours oral et support",
            "Support utilisé comme aide, pas comme texte à lire",
        ],
    ),
    (
        "ORIGINALITÉ",
        &[
            "Angle personnel ou approche originale du sujet",
            "Langage approprié au contexte académique",
            "Créativité et valeur ajoutée de la présentation",
        ],
    ),
];

/// A named, ordered group of criterion statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub criteria: Vec<String>,
}

impl Category {
    /// Criteria of this category in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = Criterion<'_>> {
        self.criteria
            .iter()
            .enumerate()
            .map(move |(index, statement)| Criterion {
                category: &self.name,
                index,
                statement,
            })
    }

    pub fn key(&self, index: usize) -> CriterionKey {
        CriterionKey::new(self.name.clone(), index)
    }
}

/// A borrowed view of one criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Criterion<'a> {
    pub category: &'a str,
    pub index: usize,
    pub statement: &'a str,
}

impl Criterion<'_> {
    pub fn key(&self) -> CriterionKey {
        CriterionKey::new(self.category, self.index)
    }

    /// Flat key used by the legacy export layout: `<category>_<statement>`.
    pub fn legacy_key(&self) -> String {
        format!("{}_{}", self.category, self.statement)
    }

    /// Flat remark key used by the legacy export layout.
    pub fn legacy_remark_key(&self) -> String {
        format!("remark_{}_{}", self.category, self.statement)
    }
}

/// The full, ordered grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub title: String,
    pub categories: Vec<Category>,
}

impl Catalog {
    /// The oral presentation grid shipped with oralgrid.
    pub fn builtin() -> Self {
        Self {
            title: BUILTIN_TITLE.to_string(),
            categories: BUILTIN
                .iter()
                .map(|(name, criteria)| Category {
                    name: (*name).to_string(),
                    criteria: criteria.iter().map(|c| (*c).to_string()).collect(),
                })
                .collect(),
        }
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Every criterion, category by category, in catalog order.
    pub fn criteria(&self) -> impl Iterator<Item = Criterion<'_>> {
        self.categories.iter().flat_map(|c| c.iter())
    }

    pub fn criterion(&self, key: &CriterionKey) -> Option<Criterion<'_>> {
        let category = self.category(&key.category)?;
        let statement = category.criteria.get(key.index)?;
        Some(Criterion {
            category: &category.name,
            index: key.index,
            statement,
        })
    }

    /// Total number of criteria.
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.criteria.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog file: {}", path.display()))?;

        Self::from_toml_str(&content, path)
    }

    /// Parse a TOML string into a catalog (useful for testing).
    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self> {
        let parsed: TomlCatalogFile = toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

        Ok(Self {
            title: parsed.catalog.title,
            categories: parsed.categories,
        })
    }

    /// Render the catalog in the same TOML layout [`Catalog::load`] reads.
    pub fn to_toml_string(&self) -> Result<String> {
        let file = TomlCatalogFile {
            catalog: TomlCatalogHeader {
                title: self.title.clone(),
            },
            categories: self.categories.clone(),
        };
        toml::to_string_pretty(&file).context("failed to serialize catalog")
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// On-disk layout of a catalog file.
#[derive(Debug, Serialize, Deserialize)]
struct TomlCatalogFile {
    catalog: TomlCatalogHeader,
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TomlCatalogHeader {
    #[serde(default = "default_title")]
    title: String,
}

fn default_title() -> String {
    "Evaluation grid".to_string()
}

/// A warning from catalog validation.
#[derive(Debug, Clone)]
pub struct CatalogWarning {
    /// The category concerned (if any).
    pub category: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check a catalog for issues that would make results ambiguous.
pub fn validate_catalog(catalog: &Catalog) -> Vec<CatalogWarning> {
    let mut warnings = Vec::new();

    if catalog.categories.is_empty() {
        warnings.push(CatalogWarning {
            category: None,
            message: "catalog defines no categories".into(),
        });
    }

    let mut seen = HashSet::new();
    for category in &catalog.categories {
        if !seen.insert(category.name.as_str()) {
            warnings.push(CatalogWarning {
                category: Some(category.name.clone()),
                message: format!("duplicate category: {}", category.name),
            });
        }
    }

    for category in &catalog.categories {
        if category.name.trim().is_empty() {
            warnings.push(CatalogWarning {
                category: Some(category.name.clone()),
                message: "category name is empty".into(),
            });
        }

        if category.criteria.is_empty() {
            warnings.push(CatalogWarning {
                category: Some(category.name.clone()),
                message: "category has no criteria".into(),
            });
        }

        // Legacy flat keys join category and statement with '_'.
        if category.name.contains('_') {
            warnings.push(CatalogWarning {
                category: Some(category.name.clone()),
                message: "category name contains '_', legacy export keys may be ambiguous".into(),
            });
        }

        let mut statements = HashSet::new();
        for statement in &category.criteria {
            if statement.trim().is_empty() {
                warnings.push(CatalogWarning {
                    category: Some(category.name.clone()),
                    message: "criterion statement is empty".into(),
                });
            } else if !statements.insert(statement.as_str()) {
                warnings.push(CatalogWarning {
                    category: Some(category.name.clone()),
                    message: format!("duplicate criterion: {statement}"),
                });
            }
        }
    }

    warnings
}
