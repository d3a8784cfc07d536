use alloc::{borrow::Cow, format};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Short message for the player, rendered by whatever drives the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: Cow<'static, str>,
    pub description: Option<Cow<'static, str>>,
    pub duration_ms: u32,
}

impl Notice {
    const fn new(level: NoticeLevel, title: &'static str, duration_ms: u32) -> Self {
        Self {
            level,
            title: Cow::Borrowed(title),
            description: None,
            duration_ms,
        }
    }

    fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(Cow::Borrowed(description));
        self
    }

    pub(crate) fn game_starting() -> Self {
        Self::new(NoticeLevel::Info, "Game Starting", 3000)
            .describe("Watch carefully for the highlighted image!")
    }

    pub(crate) fn countdown(remaining: u8) -> Self {
        Self {
            title: Cow::Owned(format!("Starting in {remaining}")),
            ..Self::new(NoticeLevel::Info, "", 1000)
        }
    }

    pub(crate) fn game_started() -> Self {
        Self::new(NoticeLevel::Success, "Game Started!", 3000)
            .describe("Find the highlighted image before time runs out!")
    }

    pub(crate) fn no_match() -> Self {
        Self::new(NoticeLevel::Error, "No Match Found", 3000).describe("Try a different description!")
    }

    pub(crate) fn correct() -> Self {
        Self::new(NoticeLevel::Success, "Correct!", 5000).describe("You found the right image!")
    }

    pub(crate) fn not_quite(chances: u8) -> Self {
        Self {
            description: Some(Cow::Owned(format!("{chances} chances left!"))),
            ..Self::new(NoticeLevel::Warning, "Not Quite Right", 3000)
        }
    }

    pub(crate) fn out_of_chances() -> Self {
        Self::new(NoticeLevel::Error, "Game Over", 5000).describe("You've run out of chances!")
    }

    pub(crate) fn out_of_time() -> Self {
        Self::new(NoticeLevel::Error, "Time's Up!", 5000).describe("You've run out of time!")
    }

    pub(crate) fn service_failure() -> Self {
        Self::new(NoticeLevel::Error, "Error", 3000).describe("Something went wrong. Please try again.")
    }
}
