//! Versioned TOML rule sets describing units, research, buildings and nations.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::Path,
};

use anyhow::{bail, ensure, Context, Result};
use civsim_core::{
    Advance, AdvanceId, CityImprovement, Color, Government, Resource, ResourceId, RuleTunables,
    Rules, UnitConfig, Yield,
};
use civsim_grid_map::ResourceSpec;
use serde::Deserialize;

const SUPPORTED_RULESET_VERSION: u32 = 1;

/// Rule set compiled into the binary.
pub const DEFAULT_RULESET: &str = include_str!("../rules/default.toml");

/// Playable nation listed by a rule set.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Nation {
    /// Display name.
    pub name: String,
    /// Display color as RGB bytes.
    pub color: [u8; 3],
    /// Names handed to founded cities.
    #[serde(default)]
    pub cities: Vec<String>,
    /// Minor nations skip the economy and meet everyone at war.
    #[serde(default)]
    pub minor: bool,
}

impl Nation {
    /// Display color of the nation.
    #[must_use]
    pub const fn color(&self) -> Color {
        Color::from_rgb(self.color[0], self.color[1], self.color[2])
    }
}

/// Parsed rule set ready to start a game.
#[derive(Clone, Debug)]
pub struct Ruleset {
    /// Rules shared by every civilization.
    pub rules: Rules,
    /// Tile yield bonus of every special resource.
    pub resource_bonuses: BTreeMap<ResourceId, ResourceSpec>,
    /// Nations in the order they join a game.
    pub nations: Vec<Nation>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    tunables: RuleTunables,
    #[serde(default)]
    units: Vec<UnitConfig>,
    #[serde(default)]
    advances: Vec<Advance>,
    #[serde(default)]
    improvements: Vec<CityImprovement>,
    #[serde(default)]
    governments: Vec<Government>,
    #[serde(default)]
    resources: Vec<ResourceEntry>,
    #[serde(default)]
    civilizations: Vec<Nation>,
}

#[derive(Debug, Deserialize)]
struct ResourceEntry {
    #[serde(flatten)]
    definition: Resource,
    #[serde(default)]
    bonus: Yield,
}

/// Loads the rule set at `path`, or the built-in one when no path is given.
pub fn load_ruleset(path: Option<&Path>) -> Result<Ruleset> {
    let Some(path) = path else {
        return parse_ruleset(DEFAULT_RULESET).context("built-in rule set is invalid");
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read rule set at {}", path.display()))?;
    parse_ruleset(&contents).with_context(|| format!("invalid rule set {}", path.display()))
}

/// Parses and cross-checks a rule set.
pub fn parse_ruleset(contents: &str) -> Result<Ruleset> {
    let manifest: Manifest = toml::from_str(contents).context("failed to parse rule set")?;
    if manifest.version != SUPPORTED_RULESET_VERSION {
        bail!(
            "unsupported rule set version {}; expected {}",
            manifest.version,
            SUPPORTED_RULESET_VERSION
        );
    }
    ensure!(
        !manifest.governments.is_empty(),
        "rule set must define at least one government"
    );

    let advances = unique_ids("advance", manifest.advances.iter().map(|entry| entry.id))?;
    if advances.contains(&AdvanceId::NONE) {
        bail!("advance id 0 is reserved for \"no advance\"");
    }
    let known_advance = |id: AdvanceId| id.is_none() || advances.contains(&id);
    let resources = unique_ids(
        "resource",
        manifest.resources.iter().map(|entry| entry.definition.id),
    )?;
    let _ = unique_ids("unit", manifest.units.iter().map(|unit| unit.id))?;
    let _ = unique_ids(
        "improvement",
        manifest.improvements.iter().map(|entry| entry.id),
    )?;
    let _ = unique_ids(
        "government",
        manifest.governments.iter().map(|entry| entry.id),
    )?;

    for advance in &manifest.advances {
        if let Some(missing) = advance.prerequisites().find(|id| !known_advance(*id)) {
            bail!(
                "advance `{}` needs undefined advance {}",
                advance.name,
                missing.get()
            );
        }
    }
    for unit in &manifest.units {
        ensure!(
            known_advance(unit.needed_advance),
            "unit `{}` needs undefined advance {}",
            unit.name,
            unit.needed_advance.get()
        );
        if let Some(missing) = unit
            .needed_resources
            .iter()
            .find(|resource| !resources.contains(*resource))
        {
            bail!(
                "unit `{}` needs undefined resource {}",
                unit.name,
                missing.get()
            );
        }
    }
    for improvement in &manifest.improvements {
        ensure!(
            known_advance(improvement.needed_advance),
            "improvement `{}` needs undefined advance {}",
            improvement.name,
            improvement.needed_advance.get()
        );
    }
    for government in &manifest.governments {
        ensure!(
            known_advance(government.needed_advance),
            "government `{}` needs undefined advance {}",
            government.name,
            government.needed_advance.get()
        );
    }

    let mut rules = Rules::new(manifest.tunables);
    let mut resource_bonuses = BTreeMap::new();
    for entry in manifest.resources {
        let _ = resource_bonuses.insert(
            entry.definition.id,
            ResourceSpec {
                needed_advance: entry.definition.needed_advance,
                bonus: entry.bonus,
            },
        );
        rules.insert_resource(entry.definition);
    }
    for unit in manifest.units {
        rules.insert_unit(unit);
    }
    for advance in manifest.advances {
        rules.insert_advance(advance);
    }
    for improvement in manifest.improvements {
        rules.insert_improvement(improvement);
    }
    for government in manifest.governments {
        rules.insert_government(government);
    }

    Ok(Ruleset {
        rules,
        resource_bonuses,
        nations: manifest.civilizations,
    })
}

fn unique_ids<T>(kind: &str, ids: impl Iterator<Item = T>) -> Result<BTreeSet<T>>
where
    T: Ord + Copy + std::fmt::Debug,
{
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            bail!("rule set contains duplicate {kind} id {id:?}");
        }
    }
    Ok(seen)
}
