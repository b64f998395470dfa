use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};

/// Level of a node in the feature hierarchy.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum StructType {
    Context,
    Alignment,
    Block,
    FeatureSet,
    Feature,
}

impl StructType {
    /// The only level that may appear directly below `self`.
    pub fn child_type(&self) -> Option<StructType> {
        match self {
            StructType::Context => Some(StructType::Alignment),
            StructType::Alignment => Some(StructType::Block),
            StructType::Block => Some(StructType::FeatureSet),
            StructType::FeatureSet => Some(StructType::Feature),
            StructType::Feature => None,
        }
    }
}

impl Display for StructType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", match self {
            StructType::Context => "Context",
            StructType::Alignment => "Alignment",
            StructType::Block => "Block",
            StructType::FeatureSet => "FeatureSet",
            StructType::Feature => "Feature",
        })
    }
}

/// Kind of a feature. `Invalid` marks a feature allocated by
/// [`Feature::create_empty`](crate::data_structs::Feature::create_empty)
/// that has not been populated yet.
#[derive(
    Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord, Default,
)]
pub enum FeatureType {
    #[default]
    Invalid,
    Basic,
    Alignment,
    Transcript,
    RawSequence,
    PeptideSequence,
}

impl FeatureType {
    pub fn is_valid(&self) -> bool { *self != FeatureType::Invalid }
}

impl Display for FeatureType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", match self {
            FeatureType::Invalid => "invalid",
            FeatureType::Basic => "basic",
            FeatureType::Alignment => "alignment",
            FeatureType::Transcript => "transcript",
            FeatureType::RawSequence => "raw-sequence",
            FeatureType::PeptideSequence => "peptide-sequence",
        })
    }
}

impl FromStr for FeatureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(FeatureType::Basic),
            "alignment" => Ok(FeatureType::Alignment),
            "transcript" => Ok(FeatureType::Transcript),
            "raw-sequence" | "sequence" => Ok(FeatureType::RawSequence),
            "peptide-sequence" | "peptide" => Ok(FeatureType::PeptideSequence),
            other => Err(format!("unknown feature type '{}'", other)),
        }
    }
}

impl Serialize for FeatureType {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer, {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FeatureType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>, {
        let s = String::deserialize(deserializer)?;
        FeatureType::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(
    Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord, Default,
)]
pub enum Strand {
    /// Forward strand.
    Forward,
    /// Reverse strand.
    Reverse,
    /// No strand.
    #[default]
    None,
}

impl FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "." => Ok(Strand::None),
            other => Err(format!("invalid strand '{}'", other)),
        }
    }
}

impl From<Strand> for Option<bool> {
    fn from(value: Strand) -> Option<bool> {
        match value {
            Strand::Forward => Some(true),
            Strand::Reverse => Some(false),
            Strand::None => None,
        }
    }
}

impl From<Option<bool>> for Strand {
    fn from(value: Option<bool>) -> Strand {
        match value {
            Some(true) => Strand::Forward,
            Some(false) => Strand::Reverse,
            None => Strand::None,
        }
    }
}

impl From<Strand> for char {
    fn from(value: Strand) -> Self {
        match value {
            Strand::Forward => '+',
            Strand::Reverse => '-',
            Strand::None => '.',
        }
    }
}

impl Display for Strand {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", char::from(*self))
    }
}

impl Serialize for Strand {
    fn serialize<S>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer, {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Strand {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>, {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Reading frame offset of a coding feature.
#[derive(
    Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord, Default,
)]
pub enum Phase {
    #[default]
    None,
    Zero,
    One,
    Two,
}

impl Phase {
    pub fn as_offset(&self) -> Option<u8> {
        match self {
            Phase::None => None,
            Phase::Zero => Some(0),
            Phase::One => Some(1),
            Phase::Two => Some(2),
        }
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "." => Ok(Phase::None),
            "0" => Ok(Phase::Zero),
            "1" => Ok(Phase::One),
            "2" => Ok(Phase::Two),
            other => Err(format!("invalid phase '{}'", other)),
        }
    }
}

impl Display for Phase {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self.as_offset() {
            Some(p) => write!(f, "{}", p),
            None => write!(f, "."),
        }
    }
}

/// Sequence class of the target of a homology feature.
#[derive(
    Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord, Default,
)]
pub enum HomolType {
    /// Nucleotide target aligned against nucleotide sequence.
    #[default]
    Nucleotide,
    /// Protein target aligned against the nucleotide reference.
    Protein,
    /// Protein target aligned against the reference translated on the fly.
    Translated,
}

impl HomolType {
    /// Number of reference bases covered by one target residue.
    pub fn residue_width(&self) -> u32 {
        match self {
            HomolType::Nucleotide => 1,
            HomolType::Protein | HomolType::Translated => 3,
        }
    }
}

impl Display for HomolType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", match self {
            HomolType::Nucleotide => "N",
            HomolType::Protein => "P",
            HomolType::Translated => "X",
        })
    }
}

/// Boundary sub-type that can be attached to a basic feature.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, PartialOrd, Ord)]
pub enum BoundaryType {
    CloneEnd,
    FivePrimeSplice,
    ThreePrimeSplice,
}

impl Display for BoundaryType {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", match self {
            BoundaryType::CloneEnd => "clone",
            BoundaryType::FivePrimeSplice => "5'",
            BoundaryType::ThreePrimeSplice => "3'",
        })
    }
}
