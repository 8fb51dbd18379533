use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::delay::DelayShape;
use crate::logger;
use crate::types::ConfigChanged;

pub const CONFIG_GROUP: &str = "MagicSplasher";
pub const KEY_NPC_ID: &str = "npcID";
pub const KEY_SPELL: &str = "spell";

/// Combat spells cheap enough to splash with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Spell {
    WindStrike,
    Confuse,
    WaterStrike,
    EarthStrike,
    Weaken,
    FireStrike,
    Curse,
}

impl Spell {
    pub const ALL: [Spell; 7] = [
        Spell::WindStrike,
        Spell::Confuse,
        Spell::WaterStrike,
        Spell::EarthStrike,
        Spell::Weaken,
        Spell::FireStrike,
        Spell::Curse,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Spell::WindStrike => "Wind Strike",
            Spell::Confuse => "Confuse",
            Spell::WaterStrike => "Water Strike",
            Spell::EarthStrike => "Earth Strike",
            Spell::Weaken => "Weaken",
            Spell::FireStrike => "Fire Strike",
            Spell::Curse => "Curse",
        }
    }
}

impl FromStr for Spell {
    type Err = anyhow::Error;

    /// Accepts the display name or the variant name, case and spacing ignored.
    fn from_str(s: &str) -> Result<Self> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace() && *c != '_').collect();
        Spell::ALL
            .into_iter()
            .find(|spell| {
                let name: String = spell.name().chars().filter(|c| !c.is_whitespace()).collect();
                name.eq_ignore_ascii_case(&wanted)
            })
            .ok_or_else(|| anyhow!("unknown spell {:?}", s))
    }
}

/// Tuning values for one run. Never mutated in place; a change builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub npc_id: i32,
    pub spell: Spell,
    /// Reaction delay before confirming an action, in milliseconds
    pub sleep: DelayShape,
    /// Backoff between decisions, in ticks
    pub tick_delay: DelayShape,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            npc_id: -1,
            spell: Spell::WindStrike,
            sleep: DelayShape { weighted: false, min: 60, max: 350, deviation: 10, target: 100 },
            tick_delay: DelayShape { weighted: false, min: 1, max: 3, deviation: 1, target: 2 },
        }
    }
}

impl RunConfig {
    /// Missing file means defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }

    fn with_change(&self, change: &ConfigChanged) -> Result<Option<Self>> {
        let mut next = self.clone();
        match change.key.as_str() {
            KEY_NPC_ID => {
                next.npc_id = change
                    .value
                    .trim()
                    .parse()
                    .with_context(|| format!("bad npc id {:?}", change.value))?;
                logger::debug_p("config", &format!("NPC ID set to {}", next.npc_id));
            }
            KEY_SPELL => {
                next.spell = change.value.parse()?;
                logger::debug_p("config", &format!("Splashing spell set to {}", next.spell.name()));
            }
            _ => return Ok(None),
        }
        Ok(Some(next))
    }
}

/// Holds the live `RunConfig`. Readers get an `Arc` to a complete value;
/// a change swaps the whole `Arc` under the write lock.
#[derive(Debug, Default)]
pub struct ConfigStore {
    current: RwLock<Arc<RunConfig>>,
}

impl ConfigStore {
    pub fn new(config: RunConfig) -> Self {
        Self { current: RwLock::new(Arc::new(config)) }
    }

    pub fn current(&self) -> Arc<RunConfig> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Apply a host config event. Returns Ok(true) when the config changed,
    /// Ok(false) when the event is for another group or key.
    pub fn apply(&self, change: &ConfigChanged) -> Result<bool> {
        if change.group != CONFIG_GROUP {
            return Ok(false);
        }
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        match guard.with_change(change)? {
            Some(next) => {
                *guard = Arc::new(next);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
