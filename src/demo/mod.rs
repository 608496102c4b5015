//! Web demos: zero-shot emotion scoring (plain and styled) and the locally
//! trained sentiment model, each behind its own axum router.

pub mod emotion;
pub mod labels;
pub mod router;
pub mod server;
pub mod session;
pub mod views;

pub use emotion::{analyze_emotion, EmotionAnalysis, EmotionScorer};
pub use labels::{emoji_for, EMOTION_LABELS, NEUTRAL_LABEL};
pub use router::{
    local_router, styled_router, zero_shot_router, LocalState, StyledState, ZeroShotState,
};
pub use server::{load_emotion_scorer, serve};
pub use session::{DisplayOptions, SessionStore, HISTORY_LIMIT};
pub use views::Views;
