use std::str::FromStr;

use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static PASSAGE_DIR: Dir = include_dir!("src/passages");

/// Visual scene a session plays against
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ModeId {
    TreeGrowing,
    EggToBird,
    BrokenGlass,
    NightSunrise,
    TvStatic,
    CarRacing,
}

impl ModeId {
    pub const ALL: [ModeId; 6] = [
        ModeId::TreeGrowing,
        ModeId::EggToBird,
        ModeId::BrokenGlass,
        ModeId::NightSunrise,
        ModeId::TvStatic,
        ModeId::CarRacing,
    ];

    pub fn mode(self) -> &'static Mode {
        // MODES is declared in ALL order
        &MODES[self as usize]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for ModeId {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModeId::ALL
            .into_iter()
            .find(|id| id.to_string() == s)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Medium,
    Hard,
}

pub type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeColors {
    pub primary: Rgb,
    pub secondary: Rgb,
    pub accent: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mode {
    pub id: ModeId,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub difficulty: Difficulty,
    pub starting_state: &'static str,
    pub transformation: &'static str,
    pub colors: ModeColors,
}

pub static MODES: [Mode; 6] = [
    Mode {
        id: ModeId::TreeGrowing,
        name: "Tree Growing",
        description: "Watch a seed sprout into a mighty tree",
        icon: "🌳",
        difficulty: Difficulty::Beginner,
        starting_state: "Bare soil with a tiny seed",
        transformation: "Seed sprouts → sapling → full tree with leaves",
        colors: ModeColors {
            primary: (0x2d, 0x50, 0x16),
            secondary: (0x4a, 0x7c, 0x2c),
            accent: (0x87, 0xa9, 0x6b),
        },
    },
    Mode {
        id: ModeId::EggToBird,
        name: "Egg to Bird",
        description: "Hatch an egg and watch the bird take flight",
        icon: "🥚",
        difficulty: Difficulty::Medium,
        starting_state: "Intact egg in a nest",
        transformation: "Cracks appear → egg breaks → chick emerges → bird takes flight",
        colors: ModeColors {
            primary: (0xf0, 0xe5, 0xd8),
            secondary: (0xb8, 0xd4, 0xe0),
            accent: (0x4a, 0x90, 0xa4),
        },
    },
    Mode {
        id: ModeId::BrokenGlass,
        name: "Broken Glass",
        description: "Heal shattered glass to pristine clarity",
        icon: "💎",
        difficulty: Difficulty::Hard,
        starting_state: "Shattered glass across screen",
        transformation: "Cracks heal from center → glass clears → transparent",
        colors: ModeColors {
            primary: (0x0a, 0x11, 0x28),
            secondary: (0x60, 0xa5, 0xfa),
            accent: (0xdb, 0xea, 0xfe),
        },
    },
    Mode {
        id: ModeId::NightSunrise,
        name: "Night to Sunrise",
        description: "Guide the sun from night to dawn",
        icon: "🌅",
        difficulty: Difficulty::Beginner,
        starting_state: "Dark night sky with stars",
        transformation: "Horizon glows → sun rises → full daylight",
        colors: ModeColors {
            primary: (0x0c, 0x14, 0x45),
            secondary: (0xff, 0x6b, 0x35),
            accent: (0xff, 0xd9, 0x3d),
        },
    },
    Mode {
        id: ModeId::TvStatic,
        name: "TV Static",
        description: "Clear the static to reveal the image",
        icon: "📺",
        difficulty: Difficulty::Medium,
        starting_state: "Full-screen static noise",
        transformation: "Signal stabilizes → image emerges → crystal clear",
        colors: ModeColors {
            primary: (0x12, 0x12, 0x12),
            secondary: (0x80, 0x80, 0x80),
            accent: (0x00, 0xff, 0x00),
        },
    },
    Mode {
        id: ModeId::CarRacing,
        name: "Car Racing",
        description: "Race to the finish line at top speed",
        icon: "🏎️",
        difficulty: Difficulty::Hard,
        starting_state: "Car at starting line",
        transformation: "Car accelerates → scenery blurs → finish line",
        colors: ModeColors {
            primary: (0x1a, 0x1a, 0x2e),
            secondary: (0xe9, 0x45, 0x60),
            accent: (0x0f, 0x34, 0x60),
        },
    },
];

/// A named set of typing passages
#[derive(Deserialize, Clone, Debug)]
pub struct PassageSet {
    pub name: String,
    pub passages: Vec<String>,
}

impl PassageSet {
    /// The passages shipped with the binary
    pub fn classic() -> Result<Self, Box<dyn std::error::Error>> {
        read_passages_from_file("passages.json")
    }

    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.passages.choose(rng).map(String::as_str)
    }
}

fn read_passages_from_file(file_name: &str) -> Result<PassageSet, Box<dyn std::error::Error>> {
    let file = PASSAGE_DIR
        .get_file(file_name)
        .ok_or_else(|| format!("passage file not found: {file_name}"))?;

    let contents = file
        .contents_utf8()
        .ok_or("unable to interpret passage file as a string")?;

    Ok(serde_json::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_catalog_is_in_id_order() {
        for id in ModeId::ALL {
            assert_eq!(id.mode().id, id);
        }
    }

    #[test]
    fn test_mode_id_display_and_parse() {
        assert_eq!(ModeId::TreeGrowing.to_string(), "tree-growing");
        assert_eq!(ModeId::TvStatic.to_string(), "tv-static");

        for id in ModeId::ALL {
            assert_eq!(id.to_string().parse::<ModeId>(), Ok(id));
        }
        assert_eq!(
            "lava-lamp".parse::<ModeId>(),
            Err(UnknownMode("lava-lamp".to_string()))
        );
        assert_eq!(
            UnknownMode("lava-lamp".to_string()).to_string(),
            "unknown mode 'lava-lamp'"
        );
    }

    #[test]
    fn test_mode_id_serde_matches_display() {
        let json = serde_json::to_string(&ModeId::CarRacing).unwrap();
        assert_eq!(json, "\"car-racing\"");

        let back: ModeId = serde_json::from_str("\"night-sunrise\"").unwrap();
        assert_eq!(back, ModeId::NightSunrise);
    }

    #[test]
    fn test_difficulty_display() {
        assert_eq!(ModeId::BrokenGlass.mode().difficulty.to_string(), "hard");
        assert_eq!(ModeId::EggToBird.mode().difficulty.to_string(), "medium");
    }

    #[test]
    fn test_classic_passages() {
        let set = PassageSet::classic().unwrap();

        assert_eq!(set.name, "classic");
        assert_eq!(set.passages.len(), 5);
        assert!(set.passages.iter().all(|p| !p.is_empty() && p.is_ascii()));
    }

    #[test]
    fn test_random_passage_is_from_set() {
        let set = PassageSet::classic().unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..10 {
            let passage = set.random(&mut rng).unwrap();
            assert!(set.passages.iter().any(|p| p == passage));
        }
    }

    #[test]
    fn test_missing_passage_file() {
        assert!(read_passages_from_file("nonexistent.json").is_err());
    }
}
