pub mod modernbert;

pub use modernbert::{
    ModernBertEncoderModel, ModernBertModel, ModernBertSize, ZeroShotModernBertModel,
};
