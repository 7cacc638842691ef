//! Extraction strategies and per-job policies
//!
//! Every policy parses from its CLI/config token via `FromStr`, failing
//! with the matching taxonomy error so bad tokens surface to the caller
//! unmodified.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::OmexError;

// ============================================================================
// Module Strategy
// ============================================================================

/// How the module is computed from the seed terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStrategy {
    /// Minimal interconnecting signature
    Star,
    /// Seed plus full subclass closure
    Top,
    /// Seed plus full superclass closure
    Bot,
    /// Boundary-based hierarchy traversal, no entailment guarantee
    Mireot,
}

impl ModuleStrategy {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Star => "star",
            Self::Top => "top",
            Self::Bot => "bot",
            Self::Mireot => "mireot",
        }
    }
}

impl std::fmt::Display for ModuleStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModuleStrategy {
    type Err = OmexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "star" => Ok(Self::Star),
            "top" => Ok(Self::Top),
            "bot" => Ok(Self::Bot),
            "mireot" => Ok(Self::Mireot),
            _ => Err(OmexError::InvalidModuleStrategy(s.to_string())),
        }
    }
}

// ============================================================================
// Imports Policy
// ============================================================================

/// Whether imported graphs contribute to the effective axiom set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportsPolicy {
    #[default]
    Include,
    Exclude,
}

impl ImportsPolicy {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Exclude => "exclude",
        }
    }
}

impl std::fmt::Display for ImportsPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImportsPolicy {
    type Err = OmexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            _ => Err(OmexError::InvalidImportsPolicy(s.to_string())),
        }
    }
}

// ============================================================================
// Individuals Policy
// ============================================================================

/// Which class assertions survive in the extracted module
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndividualsPolicy {
    /// Keep every class assertion
    #[default]
    Include,
    /// Keep only individuals whose asserted class is in the module signature
    Minimal,
    /// Keep only individuals referenced by logical class definitions
    Definitions,
    /// Drop all class assertions
    Exclude,
}

impl IndividualsPolicy {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Minimal => "minimal",
            Self::Definitions => "definitions",
            Self::Exclude => "exclude",
        }
    }
}

impl std::fmt::Display for IndividualsPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IndividualsPolicy {
    type Err = OmexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "include" => Ok(Self::Include),
            "minimal" => Ok(Self::Minimal),
            "definitions" => Ok(Self::Definitions),
            "exclude" => Ok(Self::Exclude),
            _ => Err(OmexError::InvalidIndividualsPolicy(s.to_string())),
        }
    }
}

// ============================================================================
// Intermediates Policy
// ============================================================================

/// How aggressively transitional hierarchy nodes are pruned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntermediatesPolicy {
    /// Keep the hierarchy as computed
    #[default]
    All,
    /// Collapse chains, keep branch points
    Minimal,
    /// Keep only requested terms plus hierarchy roots and leaves
    None,
}

impl IntermediatesPolicy {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Minimal => "minimal",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for IntermediatesPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IntermediatesPolicy {
    type Err = OmexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "minimal" => Ok(Self::Minimal),
            "none" => Ok(Self::None),
            _ => Err(OmexError::InvalidIntermediatesPolicy(s.to_string())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
