mod settings;

pub use settings::{LogConfig, LogFormat, Settings, SlackConfig, load_settings};
