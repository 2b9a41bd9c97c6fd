use serde::{Deserialize, Serialize};

use crate::terrain::Terrain;

/// Which screen owns the frame. Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Menu,
    CharacterSelect,
    TerrainSelect { character: u8 },
    Playing { character: u8, theme: Terrain },
    Shop,
    Tutorial,
    ResetConfirm,
    WinScreen,
    Exited,
}

/// Navigation commands raised by screens and the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Nav {
    Play,
    OpenShop,
    OpenTutorial,
    RequestReset,
    ConfirmReset,
    ShowWin,
    SelectCharacter(u8),
    SelectTerrain(Terrain),
    Back,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{nav:?} is not available from {from:?}")]
pub struct NavError {
    pub from: AppMode,
    pub nav: Nav,
}

/// Outcome of an accepted navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: AppMode,
    pub to: AppMode,
    /// The run that just ended must persist its tally before teardown.
    pub save_progress: bool,
    /// All persisted progress must be reset to defaults.
    pub reset_progress: bool,
}

/// Top-level screen controller.
#[derive(Debug, Clone)]
pub struct AppController {
    mode: AppMode,
}

impl Default for AppController {
    fn default() -> Self {
        Self::new()
    }
}

impl AppController {
    pub fn new() -> Self {
        Self {
            mode: AppMode::Menu,
        }
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn apply(&mut self, nav: Nav) -> Result<Transition, NavError> {
        let from = self.mode;
        let to = next_mode(from, nav).ok_or(NavError { from, nav })?;
        self.mode = to;
        let save_progress = matches!(from, AppMode::Playing { .. });
        let reset_progress = from == AppMode::ResetConfirm && nav == Nav::ConfirmReset;
        tracing::debug!(?from, ?to, "App mode transition");
        Ok(Transition {
            from,
            to,
            save_progress,
            reset_progress,
        })
    }
}

fn next_mode(from: AppMode, nav: Nav) -> Option<AppMode> {
    use AppMode::*;

    if nav == Nav::Quit {
        return (from != Exited).then_some(Exited);
    }
    match (from, nav) {
        (Menu, Nav::Play) => Some(CharacterSelect),
        (Menu, Nav::OpenShop) => Some(Shop),
        (Menu, Nav::OpenTutorial) => Some(Tutorial),
        (Menu, Nav::RequestReset) => Some(ResetConfirm),
        (Menu, Nav::ShowWin) => Some(WinScreen),
        (CharacterSelect, Nav::SelectCharacter(character)) => Some(TerrainSelect { character }),
        (TerrainSelect { character }, Nav::SelectTerrain(theme)) => {
            Some(Playing { character, theme })
        },
        (ResetConfirm, Nav::ConfirmReset) => Some(Menu),
        (
            CharacterSelect
            | TerrainSelect { .. }
            | Playing { .. }
            | Shop
            | Tutorial
            | ResetConfirm
            | WinScreen,
            Nav::Back,
        ) => Some(Menu),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_flow_reaches_playing() {
        let mut app = AppController::new();
        app.apply(Nav::Play).unwrap();
        app.apply(Nav::SelectCharacter(2)).unwrap();
        let t = app.apply(Nav::SelectTerrain(Terrain::Desert)).unwrap();
        assert_eq!(
            t.to,
            AppMode::Playing {
                character: 2,
                theme: Terrain::Desert
            }
        );
        assert!(!t.save_progress);
    }

    #[test]
    fn leaving_a_run_requests_save() {
        let mut app = AppController::new();
        app.apply(Nav::Play).unwrap();
        app.apply(Nav::SelectCharacter(0)).unwrap();
        app.apply(Nav::SelectTerrain(Terrain::Forest)).unwrap();
        let back = app.apply(Nav::Back).unwrap();
        assert!(back.save_progress);
        assert_eq!(app.mode(), AppMode::Menu);
    }

    #[test]
    fn quit_from_run_saves_and_exits() {
        let mut app = AppController::new();
        app.apply(Nav::Play).unwrap();
        app.apply(Nav::SelectCharacter(0)).unwrap();
        app.apply(Nav::SelectTerrain(Terrain::Tundra)).unwrap();
        let quit = app.apply(Nav::Quit).unwrap();
        assert!(quit.save_progress);
        assert_eq!(quit.to, AppMode::Exited);
        assert!(app.apply(Nav::Quit).is_err());
    }

    #[test]
    fn invalid_transition_keeps_mode() {
        let mut app = AppController::new();
        let err = app.apply(Nav::SelectTerrain(Terrain::Forest)).unwrap_err();
        assert_eq!(err.from, AppMode::Menu);
        assert_eq!(app.mode(), AppMode::Menu);
        assert!(app.apply(Nav::Back).is_err());
    }

    #[test]
    fn reset_only_on_confirm() {
        let mut app = AppController::new();
        app.apply(Nav::RequestReset).unwrap();
        let back = app.apply(Nav::Back).unwrap();
        assert!(!back.reset_progress);
        app.apply(Nav::RequestReset).unwrap();
        let confirm = app.apply(Nav::ConfirmReset).unwrap();
        assert!(confirm.reset_progress);
        assert_eq!(confirm.to, AppMode::Menu);
    }
}
