//! Game modes

use serde::{Deserialize, Serialize};

/// Macro-state of the whole application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Initial loading
    Loading,
    /// Main menu
    Menu,
    /// In-game playing
    Playing,
    /// Game paused
    Paused,
    /// In a cutscene
    Cutscene,
    /// In dialogue/conversation
    Dialogue,
    /// Game over screen
    GameOver,
}

impl Default for GameMode {
    fn default() -> Self {
        Self::Loading
    }
}

impl GameMode {
    /// Whether hostile actors may act in this mode
    pub fn is_active_play(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl std::fmt::Display for GameMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Loading => "loading",
            Self::Menu => "menu",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Cutscene => "cutscene",
            Self::Dialogue => "dialogue",
            Self::GameOver => "game_over",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loading" => Ok(Self::Loading),
            "menu" | "main_menu" => Ok(Self::Menu),
            "playing" | "gameplay" | "play" => Ok(Self::Playing),
            "paused" | "pause" => Ok(Self::Paused),
            "cutscene" => Ok(Self::Cutscene),
            "dialogue" => Ok(Self::Dialogue),
            "game_over" | "gameover" => Ok(Self::GameOver),
            _ => Err(format!("Unknown game mode: {}", s)),
        }
    }
}

/// A change of the current mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    /// Previous mode
    pub from: GameMode,
    /// New mode
    pub to: GameMode,
}

impl ModeChange {
    pub fn new(from: GameMode, to: GameMode) -> Self {
        Self { from, to }
    }

    /// Whether this change ends active play
    pub fn leaves_play(&self) -> bool {
        self.from.is_active_play() && !self.to.is_active_play()
    }

    /// Whether this change starts active play
    pub fn enters_play(&self) -> bool {
        !self.from.is_active_play() && self.to.is_active_play()
    }
}
