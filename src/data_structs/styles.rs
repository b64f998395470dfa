//! Feature-source and style lookup tables.
//!
//! These tables are produced elsewhere (from configuration or a server
//! request) and only consumed here. The parser uses them to decide which
//! feature set a GFF source belongs to, whether that set has a style (sets
//! without one are not kept when a style table is in force), and which
//! display column a set maps to.
use std::io::Read;

use anyhow::Context as AnyhowContext;
use hashbrown::HashMap;
use serde::{
    Deserialize,
    Serialize,
};

use crate::data_structs::enums::FeatureType;
use crate::quark::Quark;

/// Display style handle. Only the optional `mode` is interpreted by the
/// core: when set it forces the type of every feature in the sets using
/// the style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStyle {
    pub name:        String,
    #[serde(default)]
    pub mode:        Option<FeatureType>,
    #[serde(default)]
    pub description: Option<String>,
}

impl FeatureStyle {
    pub fn new(name: &str) -> Self {
        Self {
            name:        name.to_string(),
            mode:        None,
            description: None,
        }
    }

    pub fn with_mode(
        mut self,
        mode: FeatureType,
    ) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn id(&self) -> Quark { Quark::intern(&self.name.to_lowercase()) }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FeatureStyle>", into = "Vec<FeatureStyle>")]
pub struct StyleTable {
    styles: HashMap<Quark, FeatureStyle>,
}

impl From<Vec<FeatureStyle>> for StyleTable {
    fn from(value: Vec<FeatureStyle>) -> Self { value.into_iter().collect() }
}

impl From<StyleTable> for Vec<FeatureStyle> {
    fn from(value: StyleTable) -> Self {
        let mut styles = value.styles.into_values().collect::<Vec<_>>();
        styles.sort_by(|a, b| a.name.cmp(&b.name));
        styles
    }
}

impl FromIterator<FeatureStyle> for StyleTable {
    fn from_iter<T: IntoIterator<Item = FeatureStyle>>(iter: T) -> Self {
        let mut table = Self::default();
        iter.into_iter()
            .for_each(|style| table.insert(style));
        table
    }
}

impl StyleTable {
    pub fn insert(
        &mut self,
        style: FeatureStyle,
    ) {
        self.styles.insert(style.id(), style);
    }

    pub fn get(
        &self,
        id: Quark,
    ) -> Option<&FeatureStyle> {
        self.styles.get(&id)
    }

    pub fn contains(
        &self,
        id: Quark,
    ) -> bool {
        self.styles.contains_key(&id)
    }

    pub fn len(&self) -> usize { self.styles.len() }

    pub fn is_empty(&self) -> bool { self.styles.is_empty() }

    /// Reads a JSON array of styles.
    pub fn from_json<R: Read>(reader: R) -> anyhow::Result<Self> {
        serde_json::from_reader(reader).context("Could not read style table")
    }
}

/// Mapping of one GFF source onto the feature set and style it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSource {
    /// Source column value as it appears in the GFF.
    pub source:      String,
    /// Feature set the source feeds; defaults to the source itself.
    #[serde(default)]
    pub feature_set: Option<String>,
    /// Style of the set; defaults to the feature-set name.
    #[serde(default)]
    pub style:       Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Feature set and style resolved for one GFF source.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub feature_set_id:   Quark,
    pub feature_set_name: Quark,
    pub style_id:         Quark,
    pub description:      Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<FeatureSource>")]
pub struct FeatureSourceTable {
    by_source: HashMap<Quark, FeatureSource>,
}

impl From<Vec<FeatureSource>> for FeatureSourceTable {
    fn from(value: Vec<FeatureSource>) -> Self {
        let mut table = Self::default();
        value
            .into_iter()
            .for_each(|source| table.insert(source));
        table
    }
}

impl FeatureSourceTable {
    pub fn insert(
        &mut self,
        source: FeatureSource,
    ) {
        self.by_source
            .insert(Quark::intern(&source.source.to_lowercase()), source);
    }

    pub fn len(&self) -> usize { self.by_source.len() }

    pub fn is_empty(&self) -> bool { self.by_source.is_empty() }

    /// Resolves `source` to its feature set and style. Unknown sources feed
    /// a set of their own name styled by that name.
    pub fn resolve(
        &self,
        source: &str,
    ) -> ResolvedSource {
        let entry = Quark::try_from_str(&source.to_lowercase())
            .and_then(|q| self.by_source.get(&q));
        let set_name = entry
            .and_then(|e| e.feature_set.as_deref())
            .unwrap_or(source);
        let style_name = entry
            .and_then(|e| e.style.as_deref())
            .unwrap_or(set_name);

        ResolvedSource {
            feature_set_id:   Quark::intern(&set_name.to_lowercase()),
            feature_set_name: Quark::intern(set_name),
            style_id:         Quark::intern(&style_name.to_lowercase()),
            description:      entry.and_then(|e| e.description.clone()),
        }
    }

    pub fn from_json<R: Read>(reader: R) -> anyhow::Result<Self> {
        serde_json::from_reader(reader)
            .context("Could not read feature source table")
    }
}

/// Feature set to display column mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnMap {
    columns: HashMap<Quark, Quark>,
}

impl ColumnMap {
    pub fn insert(
        &mut self,
        feature_set: &str,
        column: &str,
    ) {
        self.columns.insert(
            Quark::intern(&feature_set.to_lowercase()),
            Quark::intern(&column.to_lowercase()),
        );
    }

    pub fn column_for(
        &self,
        feature_set_id: Quark,
    ) -> Option<Quark> {
        self.columns.get(&feature_set_id).copied()
    }
}
